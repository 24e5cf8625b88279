// routes/mod.rs
// Page handlers and the router that wires them behind the session gate.

use std::sync::Arc;

use askama::Template;
use axum::{
    Router,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};

use crate::{session, state::AppState};

mod helpers;

pub mod almacenes;
pub mod categorias;
pub mod comprobantes;
pub mod dashboard;
pub mod home;
pub mod login;
pub mod logout;
pub mod movimientos;
pub mod productos;
pub mod productos_empresa;
pub mod register;

pub use almacenes::*;
pub use categorias::*;
pub use comprobantes::*;
pub use dashboard::dashboard;
pub use home::home;
pub use login::{login, login_page};
pub use logout::logout;
pub use movimientos::*;
pub use productos::*;
pub use productos_empresa::*;
pub use register::{register, register_page};

pub fn router(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .route("/dashboard", get(dashboard))
        .route("/productos", get(productos_index).post(productos_create))
        .route("/productos/{id}/delete", post(productos_delete))
        .route(
            "/productos-empresa",
            get(productos_empresa_index).post(productos_empresa_create),
        )
        .route("/productos-empresa/new", get(productos_empresa_new))
        .route("/productos-empresa/{id}/edit", get(productos_empresa_edit))
        .route(
            "/productos-empresa/{id}/update",
            post(productos_empresa_update),
        )
        .route(
            "/productos-empresa/{id}/delete",
            post(productos_empresa_delete),
        )
        .route("/categorias", get(categorias_index).post(categorias_create))
        .route("/categorias/new", get(categorias_new))
        .route("/categorias/{id}/edit", get(categorias_edit))
        .route("/categorias/{id}/update", post(categorias_update))
        .route("/categorias/{id}/delete", post(categorias_delete))
        .route("/almacenes", get(almacenes_index).post(almacenes_create))
        .route("/almacenes/new", get(almacenes_new))
        .route("/almacenes/{id}/edit", get(almacenes_edit))
        .route("/almacenes/{id}/update", post(almacenes_update))
        .route("/almacenes/{id}/delete", post(almacenes_delete))
        .route("/movimientos", get(movimientos_index))
        .route("/movimientos/producto/{id}", get(movimientos_producto))
        .route("/movimientos/almacen/{id}", get(movimientos_almacen))
        .route("/movimientos/{id}", get(movimientos_show))
        .route("/comprobantes", get(comprobantes_index))
        .route(
            "/comprobantes/nuevo",
            get(comprobantes_new).post(comprobantes_create),
        )
        .route("/comprobantes/buscar", get(comprobantes_buscar))
        .route("/comprobantes/{id}", get(comprobantes_show))
        .route("/comprobantes/{id}/confirmar", post(comprobantes_confirmar))
        .route("/comprobantes/{id}/anular", post(comprobantes_anular))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            session::require_session,
        ));

    Router::new()
        .route("/", get(home))
        .route("/login", get(login_page).post(login))
        .route("/register", get(register_page).post(register))
        .route("/logout", post(logout))
        .merge(protected)
        .with_state(state)
}

#[derive(Template)]
#[template(path = "perfil_incompleto.html")]
struct PerfilIncompletoTemplate<'a> {
    email: &'a str,
}

/// Page shown to an authenticated account without a profile row.
pub fn perfil_incompleto_response(email: &str) -> Response {
    match (PerfilIncompletoTemplate { email }).render() {
        Ok(html) => (StatusCode::FORBIDDEN, axum::response::Html(html)).into_response(),
        Err(_) => StatusCode::FORBIDDEN.into_response(),
    }
}
