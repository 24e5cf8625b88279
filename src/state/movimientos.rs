// Inventory movements are read-only audit records.

use crate::models::MovimientoInventario;

use super::{
    AppState,
    api::{ApiError, decode_item, decode_list},
};

const RECURSO: [&str; 2] = ["api", "movimientosinventario"];

pub async fn list_movimientos(
    state: &AppState,
    token: &str,
) -> Result<Vec<MovimientoInventario>, ApiError> {
    let body = state
        .api
        .get(state.api.endpoint(&RECURSO), token, "Error al obtener movimientos")
        .await?;
    decode_list(&body)
}

pub async fn get_movimiento(
    state: &AppState,
    token: &str,
    id: &str,
) -> Result<MovimientoInventario, ApiError> {
    let body = state
        .api
        .get(
            state.api.endpoint(&[RECURSO[0], RECURSO[1], id]),
            token,
            "Error al obtener movimiento",
        )
        .await?;
    decode_item(&body)?.ok_or(ApiError::EmptyBody)
}

/// Audit trail of one company product.
pub async fn movimientos_por_producto(
    state: &AppState,
    token: &str,
    producto_empresa_id: &str,
) -> Result<Vec<MovimientoInventario>, ApiError> {
    let body = state
        .api
        .get(
            state
                .api
                .endpoint(&[RECURSO[0], RECURSO[1], "producto", producto_empresa_id]),
            token,
            "Error al obtener movimientos por producto",
        )
        .await?;
    decode_list(&body)
}

/// Audit trail of one warehouse.
pub async fn movimientos_por_almacen(
    state: &AppState,
    token: &str,
    almacen_id: &str,
) -> Result<Vec<MovimientoInventario>, ApiError> {
    let body = state
        .api
        .get(
            state
                .api
                .endpoint(&[RECURSO[0], RECURSO[1], "almacen", almacen_id]),
            token,
            "Error al obtener movimientos por almacén",
        )
        .await?;
    decode_list(&body)
}
