// Voucher endpoints. State transitions (confirm, annul) are validated by the
// API; the console only decides which ones to offer.

use chrono::{NaiveDate, SecondsFormat};
use serde_json::Value;
use tracing::info;

use crate::models::{Comprobante, CrearComprobante};

use super::{
    AppState,
    api::{ApiError, decode_item, decode_list},
};

const RECURSO: [&str; 2] = ["api", "Comprobantes"];

/// Date sent to the API for a day picked in the form: UTC midnight with
/// millisecond precision.
pub fn fecha_iso(dia: NaiveDate) -> String {
    dia.and_hms_opt(0, 0, 0)
        .unwrap_or_default()
        .and_utc()
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Creates a voucher; the API always stores it as a draft. A success without
/// a body has no safe fallback and is reported as an error.
pub async fn create_comprobante(
    state: &AppState,
    token: &str,
    payload: &CrearComprobante,
) -> Result<Option<Comprobante>, ApiError> {
    let body = state
        .api
        .post(
            state.api.endpoint(&RECURSO),
            token,
            payload,
            "Error al crear el comprobante",
        )
        .await?;
    if body.trim().is_empty() {
        return Err(ApiError::EmptyBody);
    }
    serde_json::from_str::<Value>(&body)?;
    let creado = decode_item::<Comprobante>(&body)
        .ok()
        .flatten()
        .filter(|c| !c.id.is_empty());
    info!(
        numero = %payload.numero,
        tipo = payload.tipo_comprobante_codigo,
        "comprobante creado como borrador"
    );
    Ok(creado)
}

pub async fn list_comprobantes(
    state: &AppState,
    token: &str,
) -> Result<Vec<Comprobante>, ApiError> {
    let body = state
        .api
        .get(state.api.endpoint(&RECURSO), token, "Error al obtener comprobantes")
        .await?;
    decode_list(&body)
}

pub async fn get_comprobante(
    state: &AppState,
    token: &str,
    id: &str,
) -> Result<Comprobante, ApiError> {
    let body = state
        .api
        .get(
            state.api.endpoint(&[RECURSO[0], RECURSO[1], id]),
            token,
            "Error al obtener el comprobante",
        )
        .await?;
    decode_item(&body)?.ok_or(ApiError::EmptyBody)
}

pub async fn get_comprobante_por_numero(
    state: &AppState,
    token: &str,
    numero: &str,
) -> Result<Comprobante, ApiError> {
    let body = state
        .api
        .get(
            state
                .api
                .endpoint(&[RECURSO[0], RECURSO[1], "numero", numero]),
            token,
            "No se encontró el comprobante",
        )
        .await?;
    decode_item(&body)?.ok_or(ApiError::EmptyBody)
}

/// DRAFT -> CONFIRMED. The API re-validates the lines before accepting.
pub async fn confirmar_comprobante(
    state: &AppState,
    token: &str,
    id: &str,
) -> Result<(), ApiError> {
    state
        .api
        .put_empty(
            state
                .api
                .endpoint(&[RECURSO[0], RECURSO[1], id, "confirmar"]),
            token,
            "Error al confirmar el comprobante",
        )
        .await?;
    info!(%id, "comprobante confirmado");
    Ok(())
}

/// CONFIRMED -> ANNULLED. The API issues the counter-voucher.
pub async fn anular_comprobante(state: &AppState, token: &str, id: &str) -> Result<(), ApiError> {
    state
        .api
        .put_empty(
            state.api.endpoint(&[RECURSO[0], RECURSO[1], id, "anular"]),
            token,
            "Error al anular el comprobante",
        )
        .await?;
    info!(%id, "comprobante anulado");
    Ok(())
}
