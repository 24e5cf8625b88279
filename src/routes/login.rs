// routes/login.rs
// GET /login renders the form; POST /login signs in with email + password,
// resolves the profile and opens a console session.

use std::sync::Arc;

use askama::Template;
use axum::{
    extract::{Form, Query, State},
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::info;
use validator::Validate;

use super::helpers::{mensajes_validacion, render_response};
use crate::session::{EstadoSesion, resolve_session, set_session_cookie};
use crate::state::AppState;

#[derive(Template)]
#[template(path = "login.html")]
struct LoginTemplate {
    email: String,
    errors: Option<String>,
    registrado: bool,
}

#[derive(Deserialize)]
pub struct LoginQuery {
    #[serde(default)]
    registrado: Option<String>,
}

#[derive(Deserialize, Validate)]
pub struct LoginForm {
    #[validate(email(message = "Ingresa un correo válido"))]
    email: String,
    #[validate(length(min = 1, message = "La contraseña es obligatoria"))]
    password: String,
}

pub async fn login_page(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<LoginQuery>,
) -> Response {
    if let EstadoSesion::Autenticada(_) = resolve_session(&state, &headers).await {
        return Redirect::to("/dashboard").into_response();
    }
    render_response(LoginTemplate {
        email: String::new(),
        errors: None,
        registrado: query.registrado.is_some(),
    })
}

fn login_error(email: &str, message: String) -> Response {
    render_response(LoginTemplate {
        email: email.to_string(),
        errors: Some(message),
        registrado: false,
    })
}

/// Credentials first, then the profile: two awaited steps. A profile that
/// cannot be fetched is treated as missing.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Form(mut form): Form<LoginForm>,
) -> Response {
    form.email = form.email.trim().to_string();
    let email = form.email.clone();
    if let Err(errors) = form.validate() {
        return login_error(&email, mensajes_validacion(&errors));
    }

    let credenciales = match state.auth.sign_in(&email, &form.password).await {
        Ok(credenciales) => credenciales,
        Err(err) => return login_error(&email, err.user_message()),
    };

    let perfil = state.auth.fetch_profile(&credenciales).await;
    if perfil.is_none() {
        info!(%email, "signed in without profile row");
    }
    let token = state.sessions.create(credenciales, perfil).await;

    let mut response = Redirect::to("/dashboard").into_response();
    set_session_cookie(&mut response, &token, state.config.cookie_secure);
    response
}
