use crate::models::{CrearProducto, Producto};

use super::{
    AppState,
    api::{ApiError, decode_list},
};

const RECURSO: [&str; 2] = ["api", "productos"];

pub async fn list_productos(state: &AppState, token: &str) -> Result<Vec<Producto>, ApiError> {
    let body = state
        .api
        .get(state.api.endpoint(&RECURSO), token, "Error al obtener productos")
        .await?;
    decode_list(&body)
}

pub async fn create_producto(
    state: &AppState,
    token: &str,
    payload: &CrearProducto,
) -> Result<(), ApiError> {
    state
        .api
        .post(
            state.api.endpoint(&RECURSO),
            token,
            payload,
            "Error al guardar producto",
        )
        .await?;
    Ok(())
}

pub async fn delete_producto(state: &AppState, token: &str, id: &str) -> Result<(), ApiError> {
    state
        .api
        .delete(
            state.api.endpoint(&[RECURSO[0], RECURSO[1], id]),
            token,
            "Error al eliminar producto",
        )
        .await?;
    Ok(())
}
