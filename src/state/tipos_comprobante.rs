use crate::models::TipoComprobante;

use super::{
    AppState,
    api::{ApiError, decode_list},
};

/// Voucher types; entries without a code cannot be selected and are dropped.
pub async fn list_tipos_comprobante(
    state: &AppState,
    token: &str,
) -> Result<Vec<TipoComprobante>, ApiError> {
    let body = state
        .api
        .get(
            state.api.endpoint(&["api", "TipoComprobantes"]),
            token,
            "Error al obtener tipos de comprobantes",
        )
        .await?;
    let tipos: Vec<TipoComprobante> = decode_list(&body)?;
    Ok(tipos.into_iter().filter(|t| t.codigo.is_some()).collect())
}
