use crate::models::{ActualizarCategoria, Categoria, CrearCategoria};

use super::{
    AppState,
    api::{ApiError, decode_item, decode_list},
};

const RECURSO: [&str; 2] = ["api", "Categorias"];

/// Categories may come back without their company; the caller's company
/// fills the gap.
pub async fn list_categorias(
    state: &AppState,
    token: &str,
    empresa_id: &str,
) -> Result<Vec<Categoria>, ApiError> {
    let body = state
        .api
        .get(state.api.endpoint(&RECURSO), token, "Error al obtener categorías")
        .await?;
    let mut categorias: Vec<Categoria> = decode_list(&body)?;
    for categoria in categorias.iter_mut() {
        if categoria.empresa_id.is_empty() {
            categoria.empresa_id = empresa_id.to_string();
        }
        if categoria
            .categoria_padre_id
            .as_deref()
            .is_some_and(|p| p.trim().is_empty())
        {
            categoria.categoria_padre_id = None;
        }
    }
    Ok(categorias)
}

pub async fn get_categoria(state: &AppState, token: &str, id: &str) -> Result<Categoria, ApiError> {
    let body = state
        .api
        .get(
            state.api.endpoint(&[RECURSO[0], RECURSO[1], id]),
            token,
            "Error al obtener la categoría",
        )
        .await?;
    decode_item(&body)?.ok_or(ApiError::EmptyBody)
}

pub async fn create_categoria(
    state: &AppState,
    token: &str,
    payload: &CrearCategoria,
) -> Result<(), ApiError> {
    state
        .api
        .post(
            state.api.endpoint(&RECURSO),
            token,
            payload,
            "Error al guardar categoría",
        )
        .await?;
    Ok(())
}

pub async fn update_categoria(
    state: &AppState,
    token: &str,
    id: &str,
    payload: &ActualizarCategoria,
) -> Result<(), ApiError> {
    state
        .api
        .put(
            state.api.endpoint(&[RECURSO[0], RECURSO[1], id]),
            token,
            payload,
            "Error al guardar categoría",
        )
        .await?;
    Ok(())
}

pub async fn delete_categoria(state: &AppState, token: &str, id: &str) -> Result<(), ApiError> {
    state
        .api
        .delete(
            state.api.endpoint(&[RECURSO[0], RECURSO[1], id]),
            token,
            "Error al eliminar categoría",
        )
        .await?;
    Ok(())
}
