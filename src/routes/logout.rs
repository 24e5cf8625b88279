// routes/logout.rs
// POST /logout -> signs out at the provider, drops the session and clears
// the cookie. Public so that accounts without a profile can leave too.

use std::sync::Arc;

use axum::{
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
};
use tracing::info;

use crate::session::{EstadoSesion, clear_session_cookie, resolve_session};
use crate::state::AppState;

pub async fn logout(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let abierta = match resolve_session(&state, &headers).await {
        EstadoSesion::Anonima => None,
        EstadoSesion::Incompleta {
            token,
            credenciales,
        } => Some((token, credenciales)),
        EstadoSesion::Autenticada(data) => {
            state.cache.clear_scope(&data.usuario.empresa_id).await;
            Some((data.token, data.credenciales))
        }
    };

    if let Some((token, credenciales)) = abierta {
        state.auth.sign_out(&credenciales.access_token).await;
        state.sessions.remove(&token).await;
        info!(email = %credenciales.email, "signed out");
    }

    let mut response = Redirect::to("/login").into_response();
    clear_session_cookie(&mut response);
    response
}
