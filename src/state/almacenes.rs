use tracing::info;

use crate::models::{ActualizarAlmacen, Almacen, CrearAlmacen};

use super::{
    AppState,
    api::{ApiError, decode_item, decode_list},
};

const RECURSO: [&str; 2] = ["api", "almacenes"];

pub async fn list_almacenes(state: &AppState, token: &str) -> Result<Vec<Almacen>, ApiError> {
    let body = state
        .api
        .get(state.api.endpoint(&RECURSO), token, "Error al obtener almacenes")
        .await?;
    decode_list(&body)
}

pub async fn get_almacen(state: &AppState, token: &str, id: &str) -> Result<Almacen, ApiError> {
    let body = state
        .api
        .get(
            state.api.endpoint(&[RECURSO[0], RECURSO[1], id]),
            token,
            "Error al obtener el almacén",
        )
        .await?;
    decode_item(&body)?.ok_or(ApiError::EmptyBody)
}

/// There is no safe stand-in for a created warehouse: an empty answer is an
/// error.
pub async fn create_almacen(
    state: &AppState,
    token: &str,
    payload: &CrearAlmacen,
) -> Result<Almacen, ApiError> {
    let body = state
        .api
        .post(
            state.api.endpoint(&RECURSO),
            token,
            payload,
            "Error al crear el almacén",
        )
        .await?;
    let almacen: Almacen = decode_item(&body)?.ok_or(ApiError::EmptyBody)?;
    info!(id = %almacen.id, codigo = %almacen.codigo, "almacén creado");
    Ok(almacen)
}

/// An update answered without a record is taken as applied: the submitted
/// payload is the new state.
pub async fn update_almacen(
    state: &AppState,
    token: &str,
    id: &str,
    payload: &ActualizarAlmacen,
) -> Result<Almacen, ApiError> {
    let body = state
        .api
        .put(
            state.api.endpoint(&[RECURSO[0], RECURSO[1], id]),
            token,
            payload,
            "Error al actualizar el almacén",
        )
        .await?;

    let devuelto = decode_item::<Almacen>(&body).ok().flatten();
    Ok(match devuelto {
        Some(almacen) if !almacen.id.is_empty() => almacen,
        _ => Almacen {
            id: id.to_string(),
            nombre: payload.nombre.clone(),
            codigo: payload.codigo.clone(),
            descripcion: payload.descripcion.clone(),
            es_principal: payload.es_principal,
            activo: payload.activo,
            ..Default::default()
        },
    })
}

pub async fn delete_almacen(state: &AppState, token: &str, id: &str) -> Result<(), ApiError> {
    state
        .api
        .delete(
            state.api.endpoint(&[RECURSO[0], RECURSO[1], id]),
            token,
            "Error al eliminar el almacén",
        )
        .await?;
    info!(%id, "almacén eliminado");
    Ok(())
}
