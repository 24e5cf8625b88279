// routes/movimientos.rs
// Read-only inventory movement pages: full list with filters, per product,
// per warehouse and a single record.

use std::sync::Arc;

use askama::Template;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::helpers::{
    Layout, SimpleOption, fallo_remoto, formato_cantidad, formato_fecha, formato_precio, layout,
    render_response, sesion_expirada,
};
use crate::{
    filters::{FiltroMovimientos, tipos_movimiento},
    models::{Almacen, MovimientoInventario},
    session::SessionUser,
    state::{
        AppState, ApiError, claves, get_movimiento, list_almacenes, list_movimientos,
        movimientos_por_almacen, movimientos_por_producto,
    },
};

pub(crate) struct MovimientoRow {
    pub id: String,
    pub fecha: String,
    pub tipo: String,
    pub entrada: bool,
    pub direccion: String,
    pub producto: String,
    pub sku: String,
    pub almacen: String,
    pub cantidad: String,
    pub costo: String,
    pub total: String,
    pub documento: String,
    pub motivo: String,
    pub usuario: String,
}

impl From<&MovimientoInventario> for MovimientoRow {
    fn from(m: &MovimientoInventario) -> Self {
        let entrada = m.es_entrada();
        Self {
            id: m.id.clone(),
            fecha: formato_fecha(&m.fecha_movimiento),
            tipo: m.tipo_movimiento.clone(),
            entrada,
            direccion: m
                .direccion_nombre
                .clone()
                .unwrap_or_else(|| (if entrada { "Entrada" } else { "Salida" }).to_string()),
            producto: m.producto_nombre.clone(),
            sku: m.sku.clone(),
            almacen: m.almacen_nombre.clone(),
            cantidad: formato_cantidad(m.cantidad),
            costo: m.costo_unitario.map(formato_precio).unwrap_or_default(),
            total: m.valor_total.map(formato_precio).unwrap_or_default(),
            documento: [m.documento_tipo.as_deref(), m.documento_referencia.as_deref()]
                .into_iter()
                .flatten()
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(" "),
            motivo: m.motivo.clone().unwrap_or_default(),
            usuario: m.usuario_nombre.clone(),
        }
    }
}

#[derive(Template)]
#[template(path = "movimientos/index.html")]
struct MovimientosTemplate {
    layout: Layout,
    titulo: String,
    accion: String,
    movimientos: Vec<MovimientoRow>,
    tipos: Vec<SimpleOption>,
    almacenes: Vec<SimpleOption>,
    q: String,
    desde: String,
    hasta: String,
    errors: Option<String>,
}

#[derive(Template)]
#[template(path = "movimientos/show.html")]
struct MovimientoTemplate {
    layout: Layout,
    movimiento: MovimientoRow,
}

enum Alcance {
    Todos,
    Producto(String),
    Almacen(String),
}

impl Alcance {
    fn titulo(&self) -> &'static str {
        match self {
            Alcance::Todos => "Movimientos de inventario",
            Alcance::Producto(_) => "Movimientos del producto",
            Alcance::Almacen(_) => "Movimientos del almacén",
        }
    }

    fn accion(&self) -> String {
        match self {
            Alcance::Todos => "/movimientos".to_string(),
            Alcance::Producto(id) => format!("/movimientos/producto/{id}"),
            Alcance::Almacen(id) => format!("/movimientos/almacen/{id}"),
        }
    }
}

async fn cargar(
    state: &AppState,
    session_user: &SessionUser,
    alcance: &Alcance,
) -> Result<Arc<Vec<MovimientoInventario>>, ApiError> {
    let token = session_user.access_token();
    match alcance {
        Alcance::Todos => {
            state
                .cache
                .get_or_load(session_user.empresa_id(), claves::MOVIMIENTOS, || {
                    list_movimientos(state, token)
                })
                .await
        }
        Alcance::Producto(id) => movimientos_por_producto(state, token, id).await.map(Arc::new),
        Alcance::Almacen(id) => movimientos_por_almacen(state, token, id).await.map(Arc::new),
    }
}

async fn pagina(
    state: Arc<AppState>,
    session_user: SessionUser,
    alcance: Alcance,
    filtro: FiltroMovimientos,
) -> Response {
    let (movimientos, mut errors) = match cargar(&state, &session_user, &alcance).await {
        Ok(items) => (items, None),
        Err(err) if err.is_unauthorized() => return sesion_expirada(&state, &session_user).await,
        Err(err) => (Arc::new(Vec::new()), Some(err.user_message())),
    };

    let almacenes = match state
        .cache
        .get_or_load(session_user.empresa_id(), claves::ALMACENES, || {
            list_almacenes(&state, session_user.access_token())
        })
        .await
    {
        Ok(items) => items,
        Err(err) => {
            errors.get_or_insert(err.user_message());
            Arc::new(Vec::<Almacen>::new())
        }
    };

    let tipo_actual = filtro.tipo.clone().unwrap_or_else(|| "all".to_string());
    let almacen_actual = filtro.almacen.clone().unwrap_or_default();
    let tipos = std::iter::once(SimpleOption::new("all", "Todos", &tipo_actual))
        .chain(
            tipos_movimiento(&movimientos)
                .into_iter()
                .map(|t| SimpleOption::new(t.clone(), t, &tipo_actual)),
        )
        .collect();
    let opciones_almacen = std::iter::once(SimpleOption::new("", "Todos", &almacen_actual))
        .chain(
            almacenes
                .iter()
                .map(|a| SimpleOption::new(a.id.clone(), a.nombre.clone(), &almacen_actual)),
        )
        .collect();

    let filas = filtro
        .aplicar(movimientos.as_ref().clone())
        .iter()
        .map(MovimientoRow::from)
        .collect();

    render_response(MovimientosTemplate {
        layout: layout(&state, &session_user, "movimientos").await,
        titulo: alcance.titulo().to_string(),
        accion: alcance.accion(),
        movimientos: filas,
        tipos,
        almacenes: opciones_almacen,
        q: filtro.q.unwrap_or_default(),
        desde: filtro.desde.unwrap_or_default(),
        hasta: filtro.hasta.unwrap_or_default(),
        errors,
    })
}

pub async fn movimientos_index(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Query(filtro): Query<FiltroMovimientos>,
) -> Response {
    pagina(state, session_user, Alcance::Todos, filtro).await
}

pub async fn movimientos_producto(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(filtro): Query<FiltroMovimientos>,
) -> Response {
    pagina(state, session_user, Alcance::Producto(id), filtro).await
}

pub async fn movimientos_almacen(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(filtro): Query<FiltroMovimientos>,
) -> Response {
    pagina(state, session_user, Alcance::Almacen(id), filtro).await
}

pub async fn movimientos_show(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    match get_movimiento(&state, session_user.access_token(), &id).await {
        Ok(movimiento) => render_response(MovimientoTemplate {
            layout: layout(&state, &session_user, "movimientos").await,
            movimiento: MovimientoRow::from(&movimiento),
        }),
        Err(err) if err.is_unauthorized() => sesion_expirada(&state, &session_user).await,
        Err(ApiError::Remote { status, .. }) if status == StatusCode::NOT_FOUND => {
            StatusCode::NOT_FOUND.into_response()
        }
        Err(err) => fallo_remoto(&state, &session_user, "/movimientos", err).await,
    }
}
