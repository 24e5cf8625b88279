use std::sync::Arc;

use askama::Template;
use axum::{
    extract::{Form, Path, Query, State},
    response::Response,
};
use serde::Deserialize;
use validator::Validate;

use super::helpers::{
    Layout, fallo_remoto, layout, mensajes_validacion, no_vacio, redirect_con_aviso,
    render_response, sesion_expirada,
};
use crate::{
    filters::FiltroTexto,
    models::{CrearProducto, Producto},
    session::SessionUser,
    state::{AppState, Aviso, claves, create_producto, delete_producto, list_productos},
};

#[derive(Template)]
#[template(path = "productos/index.html")]
struct ProductosTemplate {
    layout: Layout,
    productos: Vec<ProductoRow>,
    q: String,
    nombre: String,
    codigo_barra: String,
    errors: Option<String>,
}

struct ProductoRow {
    id: String,
    nombre: String,
    codigo_barra: String,
    activo: bool,
}

#[derive(Deserialize, Validate)]
pub struct ProductoForm {
    #[validate(length(min = 1, max = 100, message = "El nombre es obligatorio (máximo 100 caracteres)"))]
    nombre: String,
    #[serde(default)]
    #[validate(length(max = 50, message = "El código de barras admite hasta 50 caracteres"))]
    codigo_barra: String,
}

async fn pagina(
    state: &AppState,
    session_user: &SessionUser,
    filtro: FiltroTexto,
    form: Option<ProductoForm>,
    errors: Option<String>,
) -> Response {
    let productos = state
        .cache
        .get_or_load(session_user.empresa_id(), claves::PRODUCTOS, || {
            list_productos(state, session_user.access_token())
        })
        .await;
    let (productos, errors) = match productos {
        Ok(items) => (items, errors),
        Err(err) if err.is_unauthorized() => return sesion_expirada(state, session_user).await,
        Err(err) => (Arc::new(Vec::<Producto>::new()), errors.or(Some(err.user_message()))),
    };

    let filas = filtro
        .productos(productos.as_ref().clone())
        .into_iter()
        .map(|p| ProductoRow {
            id: p.id,
            nombre: p.nombre,
            codigo_barra: p.codigo_barra.unwrap_or_default(),
            activo: p.activo,
        })
        .collect();
    let (nombre, codigo_barra) = form
        .map(|f| (f.nombre, f.codigo_barra))
        .unwrap_or_default();

    render_response(ProductosTemplate {
        layout: layout(state, session_user, "productos").await,
        productos: filas,
        q: filtro.q.unwrap_or_default(),
        nombre,
        codigo_barra,
        errors,
    })
}

pub async fn productos_index(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Query(filtro): Query<FiltroTexto>,
) -> Response {
    pagina(&state, &session_user, filtro, None, None).await
}

pub async fn productos_create(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Form(form): Form<ProductoForm>,
) -> Response {
    let form = ProductoForm {
        nombre: form.nombre.trim().to_string(),
        codigo_barra: form.codigo_barra.trim().to_string(),
    };
    if let Err(errors) = form.validate() {
        let message = mensajes_validacion(&errors);
        return pagina(&state, &session_user, FiltroTexto::default(), Some(form), Some(message))
            .await;
    }

    let payload = CrearProducto {
        nombre: form.nombre.clone(),
        codigo_barra: no_vacio(Some(form.codigo_barra.clone())),
    };
    match create_producto(&state, session_user.access_token(), &payload).await {
        Ok(()) => {
            state
                .cache
                .invalidate(session_user.empresa_id(), &[claves::PRODUCTOS])
                .await;
            redirect_con_aviso(
                &state,
                &session_user,
                "/productos",
                Aviso::exito(format!("Producto \"{}\" creado", payload.nombre)),
            )
            .await
        }
        Err(err) if err.is_unauthorized() => sesion_expirada(&state, &session_user).await,
        Err(err) => {
            pagina(
                &state,
                &session_user,
                FiltroTexto::default(),
                Some(form),
                Some(err.user_message()),
            )
            .await
        }
    }
}

pub async fn productos_delete(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    match delete_producto(&state, session_user.access_token(), &id).await {
        Ok(()) => {
            state
                .cache
                .invalidate(
                    session_user.empresa_id(),
                    &[claves::PRODUCTOS, claves::PRODUCTOS_EMPRESA],
                )
                .await;
            redirect_con_aviso(
                &state,
                &session_user,
                "/productos",
                Aviso::exito("Producto eliminado"),
            )
            .await
        }
        Err(err) => fallo_remoto(&state, &session_user, "/productos", err).await,
    }
}
