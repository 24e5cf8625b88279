use std::{collections::HashMap, sync::Arc};

use askama::Template;
use axum::{
    extract::{Form, Path, Query, State},
    response::Response,
};
use serde::Deserialize;
use validator::Validate;

use super::helpers::{
    Layout, SimpleOption, casilla, fallo_remoto, layout, mensajes_validacion, no_vacio,
    redirect_con_aviso, render_response, sesion_expirada,
};
use crate::{
    filters::FiltroTexto,
    models::{ActualizarCategoria, Categoria, CrearCategoria},
    session::SessionUser,
    state::{
        AppState, ApiError, Aviso, claves, create_categoria, delete_categoria, get_categoria,
        list_categorias, update_categoria,
    },
};

const LISTA: &str = "/categorias";

#[derive(Template)]
#[template(path = "categorias/index.html")]
struct CategoriasTemplate {
    layout: Layout,
    categorias: Vec<CategoriaRow>,
    q: String,
    errors: Option<String>,
}

struct CategoriaRow {
    id: String,
    nombre: String,
    padre: String,
    activo: bool,
}

#[derive(Template)]
#[template(path = "categorias/form.html")]
struct CategoriaFormTemplate {
    layout: Layout,
    action: String,
    is_edit: bool,
    nombre: String,
    activo: bool,
    padres: Vec<SimpleOption>,
    errors: Option<String>,
}

#[derive(Deserialize, Validate)]
pub struct CategoriaForm {
    #[validate(length(min = 1, max = 100, message = "El nombre es obligatorio (máximo 100 caracteres)"))]
    nombre: String,
    #[serde(default)]
    categoria_padre_id: Option<String>,
    #[serde(default)]
    activo: Option<String>,
}

async fn categorias(
    state: &AppState,
    session_user: &SessionUser,
) -> Result<Arc<Vec<Categoria>>, ApiError> {
    let empresa = session_user.empresa_id();
    state
        .cache
        .get_or_load(empresa, claves::CATEGORIAS, || {
            list_categorias(state, session_user.access_token(), empresa)
        })
        .await
}

/// A category cannot be its own parent; only one level is offered.
fn opciones_padre(items: &[Categoria], excluir: Option<&str>, actual: &str) -> Vec<SimpleOption> {
    std::iter::once(SimpleOption::new("", "Sin categoría padre", actual))
        .chain(
            items
                .iter()
                .filter(|c| Some(c.id.as_str()) != excluir)
                .map(|c| SimpleOption::new(c.id.clone(), c.nombre.clone(), actual)),
        )
        .collect()
}

struct Valores {
    nombre: String,
    padre: Option<String>,
    activo: bool,
}

async fn formulario(
    state: &AppState,
    session_user: &SessionUser,
    action: String,
    editando: Option<&str>,
    valores: Valores,
    errors: Option<String>,
) -> Response {
    let mut errors = errors;
    let actual = valores.padre.as_deref().unwrap_or_default();
    let padres = match categorias(state, session_user).await {
        Ok(items) => opciones_padre(&items, editando, actual),
        Err(err) => {
            errors.get_or_insert(err.user_message());
            opciones_padre(&[], editando, "")
        }
    };
    render_response(CategoriaFormTemplate {
        layout: layout(state, session_user, "categorias").await,
        action,
        is_edit: editando.is_some(),
        nombre: valores.nombre,
        activo: valores.activo,
        padres,
        errors,
    })
}

pub async fn categorias_index(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Query(filtro): Query<FiltroTexto>,
) -> Response {
    let (items, errors) = match categorias(&state, &session_user).await {
        Ok(items) => (items, None),
        Err(err) if err.is_unauthorized() => return sesion_expirada(&state, &session_user).await,
        Err(err) => (Arc::new(Vec::new()), Some(err.user_message())),
    };
    let nombres: HashMap<&str, &str> = items
        .iter()
        .map(|c| (c.id.as_str(), c.nombre.as_str()))
        .collect();
    let filas = filtro
        .categorias(items.as_ref().clone())
        .into_iter()
        .map(|c| CategoriaRow {
            padre: c
                .categoria_padre_id
                .as_deref()
                .and_then(|id| nombres.get(id).copied())
                .unwrap_or("-")
                .to_string(),
            id: c.id,
            nombre: c.nombre,
            activo: c.activo,
        })
        .collect();

    render_response(CategoriasTemplate {
        layout: layout(&state, &session_user, "categorias").await,
        categorias: filas,
        q: filtro.q.unwrap_or_default(),
        errors,
    })
}

pub async fn categorias_new(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
) -> Response {
    formulario(
        &state,
        &session_user,
        LISTA.to_string(),
        None,
        Valores {
            nombre: String::new(),
            padre: None,
            activo: true,
        },
        None,
    )
    .await
}

pub async fn categorias_create(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Form(form): Form<CategoriaForm>,
) -> Response {
    let nombre = form.nombre.trim().to_string();
    let padre = no_vacio(form.categoria_padre_id.clone());
    let valores = Valores {
        nombre: nombre.clone(),
        padre: padre.clone(),
        activo: true,
    };
    if let Err(errors) = (CategoriaForm { nombre: nombre.clone(), ..form }).validate() {
        let message = mensajes_validacion(&errors);
        return formulario(&state, &session_user, LISTA.to_string(), None, valores, Some(message))
            .await;
    }

    let payload = CrearCategoria {
        nombre: nombre.clone(),
        categoria_padre_id: padre.clone(),
        empresa_id: session_user.empresa_id().to_string(),
    };
    match create_categoria(&state, session_user.access_token(), &payload).await {
        Ok(()) => {
            state
                .cache
                .invalidate(session_user.empresa_id(), &[claves::CATEGORIAS])
                .await;
            redirect_con_aviso(
                &state,
                &session_user,
                LISTA,
                Aviso::exito(format!("Categoría \"{nombre}\" creada")),
            )
            .await
        }
        Err(err) if err.is_unauthorized() => sesion_expirada(&state, &session_user).await,
        Err(err) => {
            formulario(
                &state,
                &session_user,
                LISTA.to_string(),
                None,
                valores,
                Some(err.user_message()),
            )
            .await
        }
    }
}

pub async fn categorias_edit(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    match get_categoria(&state, session_user.access_token(), &id).await {
        Ok(categoria) => {
            formulario(
                &state,
                &session_user,
                format!("{LISTA}/{id}/update"),
                Some(&id),
                Valores {
                    nombre: categoria.nombre,
                    padre: categoria.categoria_padre_id,
                    activo: categoria.activo,
                },
                None,
            )
            .await
        }
        Err(err) => fallo_remoto(&state, &session_user, LISTA, err).await,
    }
}

pub async fn categorias_update(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Form(form): Form<CategoriaForm>,
) -> Response {
    let nombre = form.nombre.trim().to_string();
    let padre = no_vacio(form.categoria_padre_id.clone()).filter(|p| *p != id);
    let activo = casilla(&form.activo);
    let action = format!("{LISTA}/{id}/update");
    let valores = Valores {
        nombre: nombre.clone(),
        padre: padre.clone(),
        activo,
    };
    if let Err(errors) = (CategoriaForm { nombre: nombre.clone(), ..form }).validate() {
        let message = mensajes_validacion(&errors);
        return formulario(&state, &session_user, action, Some(&id), valores, Some(message)).await;
    }

    let payload = ActualizarCategoria {
        nombre: nombre.clone(),
        categoria_padre_id: padre.clone(),
        activo,
    };
    match update_categoria(&state, session_user.access_token(), &id, &payload).await {
        Ok(()) => {
            state
                .cache
                .invalidate(
                    session_user.empresa_id(),
                    &[claves::CATEGORIAS, claves::PRODUCTOS_EMPRESA],
                )
                .await;
            redirect_con_aviso(
                &state,
                &session_user,
                LISTA,
                Aviso::exito(format!("Categoría \"{nombre}\" actualizada")),
            )
            .await
        }
        Err(err) if err.is_unauthorized() => sesion_expirada(&state, &session_user).await,
        Err(err) => {
            formulario(
                &state,
                &session_user,
                action,
                Some(&id),
                valores,
                Some(err.user_message()),
            )
            .await
        }
    }
}

pub async fn categorias_delete(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    match delete_categoria(&state, session_user.access_token(), &id).await {
        Ok(()) => {
            state
                .cache
                .invalidate(session_user.empresa_id(), &[claves::CATEGORIAS])
                .await;
            redirect_con_aviso(
                &state,
                &session_user,
                LISTA,
                Aviso::exito("Categoría eliminada"),
            )
            .await
        }
        Err(err) => fallo_remoto(&state, &session_user, LISTA, err).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parent_options_skip_the_category_itself() {
        let items = vec![
            Categoria {
                id: "a".into(),
                nombre: "Bebidas".into(),
                ..Default::default()
            },
            Categoria {
                id: "b".into(),
                nombre: "Jugos".into(),
                categoria_padre_id: Some("a".into()),
                ..Default::default()
            },
        ];
        let opciones = opciones_padre(&items, Some("b"), "a");
        let valores: Vec<_> = opciones.iter().map(|o| o.value.as_str()).collect();
        assert_eq!(valores, vec!["", "a"]);
        assert!(opciones[1].selected);
    }
}
