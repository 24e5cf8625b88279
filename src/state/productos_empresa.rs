use crate::models::{ActualizarProductoEmpresa, CrearProductoEmpresa, ProductoEmpresa};

use super::{
    AppState,
    api::{ApiError, decode_list},
};

const RECURSO: [&str; 2] = ["api", "productoEmpresa"];

pub async fn list_productos_empresa(
    state: &AppState,
    token: &str,
) -> Result<Vec<ProductoEmpresa>, ApiError> {
    let body = state
        .api
        .get(
            state.api.endpoint(&RECURSO),
            token,
            "Error al obtener productos de empresa",
        )
        .await?;
    decode_list(&body)
}

pub async fn create_producto_empresa(
    state: &AppState,
    token: &str,
    payload: &CrearProductoEmpresa,
) -> Result<(), ApiError> {
    state
        .api
        .post(
            state.api.endpoint(&RECURSO),
            token,
            payload,
            "Error al guardar producto de empresa",
        )
        .await?;
    Ok(())
}

pub async fn update_producto_empresa(
    state: &AppState,
    token: &str,
    payload: &ActualizarProductoEmpresa,
) -> Result<(), ApiError> {
    state
        .api
        .put(
            state.api.endpoint(&[RECURSO[0], RECURSO[1], payload.id.as_str()]),
            token,
            payload,
            "Error al actualizar producto de empresa",
        )
        .await?;
    Ok(())
}

pub async fn delete_producto_empresa(
    state: &AppState,
    token: &str,
    id: &str,
) -> Result<(), ApiError> {
    state
        .api
        .delete(
            state.api.endpoint(&[RECURSO[0], RECURSO[1], id]),
            token,
            "Error al eliminar producto de empresa",
        )
        .await?;
    Ok(())
}
