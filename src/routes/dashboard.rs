use std::sync::Arc;

use askama::Template;
use axum::{extract::State, response::Response};

use super::helpers::{Layout, formato_cantidad, layout, render_response, sesion_expirada};
use super::movimientos::MovimientoRow;
use crate::{
    models::ProductoEmpresa,
    session::SessionUser,
    state::{AppState, ResumenDashboard, load_dashboard},
};

#[derive(Template)]
#[template(path = "dashboard.html")]
struct DashboardTemplate {
    layout: Layout,
    total_productos: usize,
    total_categorias: usize,
    sin_stock: usize,
    stock_bajo: usize,
    saludable: usize,
    alertas: Vec<AlertaRow>,
    movimientos: Vec<MovimientoRow>,
    errors: Option<String>,
}

struct AlertaRow {
    producto: String,
    sku: String,
    actual: String,
    reservada: String,
    sin_stock: bool,
}

impl AlertaRow {
    fn new(p: &ProductoEmpresa, sin_stock: bool) -> Self {
        Self {
            producto: p.producto_nombre.clone(),
            sku: p.sku.clone(),
            actual: formato_cantidad(p.cantidad_actual),
            reservada: formato_cantidad(p.cantidad_reservada),
            sin_stock,
        }
    }
}

pub async fn dashboard(session_user: SessionUser, State(state): State<Arc<AppState>>) -> Response {
    let resumen = load_dashboard(
        &state,
        session_user.access_token(),
        session_user.empresa_id(),
    )
    .await;

    let (resumen, errors) = match resumen {
        Ok(resumen) => (Some(resumen), None),
        Err(err) if err.is_unauthorized() => return sesion_expirada(&state, &session_user).await,
        Err(err) => (None, Some(err.user_message())),
    };

    let tpl = match resumen {
        Some(ResumenDashboard {
            total_productos,
            total_categorias,
            stock,
            movimientos_recientes,
        }) => DashboardTemplate {
            layout: layout(&state, &session_user, "dashboard").await,
            total_productos,
            total_categorias,
            sin_stock: stock.sin_stock.len(),
            stock_bajo: stock.stock_bajo.len(),
            saludable: stock.saludable.len(),
            alertas: stock
                .sin_stock
                .iter()
                .map(|p| AlertaRow::new(p, true))
                .chain(stock.stock_bajo.iter().map(|p| AlertaRow::new(p, false)))
                .collect(),
            movimientos: movimientos_recientes.iter().map(MovimientoRow::from).collect(),
            errors,
        },
        None => DashboardTemplate {
            layout: layout(&state, &session_user, "dashboard").await,
            total_productos: 0,
            total_categorias: 0,
            sin_stock: 0,
            stock_bajo: 0,
            saludable: 0,
            alertas: Vec::new(),
            movimientos: Vec::new(),
            errors,
        },
    };
    render_response(tpl)
}
