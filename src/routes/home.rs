// routes/home.rs
// GET / -> dashboard when signed in, login otherwise.

use std::sync::Arc;

use axum::{
    extract::State,
    http::HeaderMap,
    response::Redirect,
};

use crate::session::{EstadoSesion, resolve_session};
use crate::state::AppState;

pub async fn home(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Redirect {
    match resolve_session(&state, &headers).await {
        EstadoSesion::Anonima => Redirect::to("/login"),
        _ => Redirect::to("/dashboard"),
    }
}
