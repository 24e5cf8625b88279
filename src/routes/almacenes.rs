// routes/almacenes.rs
// Warehouse pages: list, create/edit form pages, delete.

use std::sync::Arc;

use askama::Template;
use axum::{
    extract::{Form, Path, Query, State},
    response::Response,
};
use serde::Deserialize;
use validator::Validate;

use super::helpers::{
    Layout, casilla, fallo_remoto, formato_fecha, layout, mensajes_validacion, no_vacio,
    redirect_con_aviso, render_response, sesion_expirada,
};
use crate::{
    filters::FiltroTexto,
    models::{ActualizarAlmacen, CrearAlmacen},
    session::SessionUser,
    state::{
        AppState, Aviso, claves, create_almacen, delete_almacen, get_almacen, list_almacenes,
        update_almacen,
    },
};

const LISTA: &str = "/almacenes";

#[derive(Template)]
#[template(path = "almacenes/index.html")]
struct AlmacenesTemplate {
    layout: Layout,
    almacenes: Vec<AlmacenRow>,
    q: String,
    errors: Option<String>,
}

struct AlmacenRow {
    id: String,
    nombre: String,
    codigo: String,
    descripcion: String,
    es_principal: bool,
    activo: bool,
    creado: String,
}

#[derive(Template)]
#[template(path = "almacenes/form.html")]
struct AlmacenFormTemplate {
    layout: Layout,
    action: String,
    is_edit: bool,
    nombre: String,
    codigo: String,
    descripcion: String,
    es_principal: bool,
    activo: bool,
    errors: Option<String>,
}

impl AlmacenFormTemplate {
    fn con_error(mut self, errors: String) -> Self {
        self.errors = Some(errors);
        self
    }
}

#[derive(Deserialize, Validate)]
pub struct AlmacenForm {
    #[validate(length(min = 1, max = 100, message = "El nombre es obligatorio (máximo 100 caracteres)"))]
    nombre: String,
    #[validate(length(min = 1, max = 20, message = "El código es obligatorio (máximo 20 caracteres)"))]
    codigo: String,
    #[serde(default)]
    #[validate(length(max = 500, message = "La descripción admite hasta 500 caracteres"))]
    descripcion: String,
    #[serde(default)]
    es_principal: Option<String>,
    #[serde(default)]
    activo: Option<String>,
}

impl AlmacenForm {
    fn limpio(self) -> Self {
        Self {
            nombre: self.nombre.trim().to_string(),
            codigo: self.codigo.trim().to_string(),
            descripcion: self.descripcion.trim().to_string(),
            ..self
        }
    }

    async fn plantilla(
        &self,
        state: &AppState,
        session_user: &SessionUser,
        action: String,
        is_edit: bool,
    ) -> AlmacenFormTemplate {
        AlmacenFormTemplate {
            layout: layout(state, session_user, "almacenes").await,
            action,
            is_edit,
            nombre: self.nombre.clone(),
            codigo: self.codigo.clone(),
            descripcion: self.descripcion.clone(),
            es_principal: casilla(&self.es_principal),
            activo: !is_edit || casilla(&self.activo),
            errors: None,
        }
    }
}

pub async fn almacenes_index(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Query(filtro): Query<FiltroTexto>,
) -> Response {
    let almacenes = state
        .cache
        .get_or_load(session_user.empresa_id(), claves::ALMACENES, || {
            list_almacenes(&state, session_user.access_token())
        })
        .await;
    let (almacenes, errors) = match almacenes {
        Ok(items) => (items, None),
        Err(err) if err.is_unauthorized() => return sesion_expirada(&state, &session_user).await,
        Err(err) => (Arc::new(Vec::new()), Some(err.user_message())),
    };

    let filas = filtro
        .almacenes(almacenes.as_ref().clone())
        .into_iter()
        .map(|a| AlmacenRow {
            creado: a
                .fecha_creacion
                .as_deref()
                .map(formato_fecha)
                .unwrap_or_else(|| "-".to_string()),
            id: a.id,
            nombre: a.nombre,
            codigo: a.codigo,
            descripcion: a.descripcion.unwrap_or_default(),
            es_principal: a.es_principal,
            activo: a.activo,
        })
        .collect();

    render_response(AlmacenesTemplate {
        layout: layout(&state, &session_user, "almacenes").await,
        almacenes: filas,
        q: filtro.q.unwrap_or_default(),
        errors,
    })
}

pub async fn almacenes_new(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
) -> Response {
    render_response(AlmacenFormTemplate {
        layout: layout(&state, &session_user, "almacenes").await,
        action: LISTA.to_string(),
        is_edit: false,
        nombre: String::new(),
        codigo: String::new(),
        descripcion: String::new(),
        es_principal: false,
        activo: true,
        errors: None,
    })
}

pub async fn almacenes_create(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Form(form): Form<AlmacenForm>,
) -> Response {
    let form = form.limpio();
    if let Err(errors) = form.validate() {
        let tpl = form
            .plantilla(&state, &session_user, LISTA.to_string(), false)
            .await;
        return render_response(tpl.con_error(mensajes_validacion(&errors)));
    }

    let payload = CrearAlmacen {
        empresa_id: session_user.empresa_id().to_string(),
        nombre: form.nombre.clone(),
        codigo: form.codigo.clone(),
        descripcion: no_vacio(Some(form.descripcion.clone())),
        es_principal: casilla(&form.es_principal),
    };
    match create_almacen(&state, session_user.access_token(), &payload).await {
        Ok(almacen) => {
            state
                .cache
                .invalidate(session_user.empresa_id(), &[claves::ALMACENES])
                .await;
            redirect_con_aviso(
                &state,
                &session_user,
                LISTA,
                Aviso::exito(format!("Almacén \"{}\" creado", almacen.nombre)),
            )
            .await
        }
        Err(err) if err.is_unauthorized() => sesion_expirada(&state, &session_user).await,
        Err(err) => {
            let tpl = form
                .plantilla(&state, &session_user, LISTA.to_string(), false)
                .await;
            render_response(tpl.con_error(err.user_message()))
        }
    }
}

pub async fn almacenes_edit(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    match get_almacen(&state, session_user.access_token(), &id).await {
        Ok(almacen) => render_response(AlmacenFormTemplate {
            layout: layout(&state, &session_user, "almacenes").await,
            action: format!("{LISTA}/{id}/update"),
            is_edit: true,
            nombre: almacen.nombre,
            codigo: almacen.codigo,
            descripcion: almacen.descripcion.unwrap_or_default(),
            es_principal: almacen.es_principal,
            activo: almacen.activo,
            errors: None,
        }),
        Err(err) => fallo_remoto(&state, &session_user, LISTA, err).await,
    }
}

pub async fn almacenes_update(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Form(form): Form<AlmacenForm>,
) -> Response {
    let form = form.limpio();
    let action = format!("{LISTA}/{id}/update");
    if let Err(errors) = form.validate() {
        let tpl = form.plantilla(&state, &session_user, action, true).await;
        return render_response(tpl.con_error(mensajes_validacion(&errors)));
    }

    let payload = ActualizarAlmacen {
        nombre: form.nombre.clone(),
        codigo: form.codigo.clone(),
        descripcion: no_vacio(Some(form.descripcion.clone())),
        es_principal: casilla(&form.es_principal),
        activo: casilla(&form.activo),
    };
    match update_almacen(&state, session_user.access_token(), &id, &payload).await {
        Ok(almacen) => {
            state
                .cache
                .invalidate(session_user.empresa_id(), &[claves::ALMACENES])
                .await;
            redirect_con_aviso(
                &state,
                &session_user,
                LISTA,
                Aviso::exito(format!("Almacén \"{}\" actualizado", almacen.nombre)),
            )
            .await
        }
        Err(err) if err.is_unauthorized() => sesion_expirada(&state, &session_user).await,
        Err(err) => {
            let tpl = form.plantilla(&state, &session_user, action, true).await;
            render_response(tpl.con_error(err.user_message()))
        }
    }
}

pub async fn almacenes_delete(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    match delete_almacen(&state, session_user.access_token(), &id).await {
        Ok(()) => {
            state
                .cache
                .invalidate(session_user.empresa_id(), &[claves::ALMACENES])
                .await;
            redirect_con_aviso(
                &state,
                &session_user,
                LISTA,
                Aviso::exito("Almacén eliminado"),
            )
            .await
        }
        Err(err) => fallo_remoto(&state, &session_user, LISTA, err).await,
    }
}
