// routes/register.rs
// Self-service sign-up: account at the auth provider plus the profile row
// tied to a company picked from the active ones.

use std::sync::Arc;

use askama::Template;
use axum::{
    extract::{Form, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::warn;
use validator::Validate;

use super::helpers::{SimpleOption, mensajes_validacion, render_response};
use crate::models::RegistroUsuario;
use crate::state::AppState;

#[derive(Template)]
#[template(path = "register.html")]
struct RegisterTemplate {
    correo: String,
    nombres: String,
    apellido_paterno: String,
    apellido_materno: String,
    empresas: Vec<SimpleOption>,
    errors: Option<String>,
}

#[derive(Deserialize, Validate)]
pub struct RegisterForm {
    #[validate(email(message = "Ingresa un correo válido"))]
    correo: String,
    #[validate(length(min = 6, message = "La contraseña debe tener al menos 6 caracteres"))]
    password: String,
    #[validate(must_match(other = "password", message = "Las contraseñas no coinciden"))]
    confirmar: String,
    #[validate(length(min = 1, max = 100, message = "El nombre es obligatorio"))]
    nombres: String,
    #[validate(length(min = 1, max = 100, message = "El apellido paterno es obligatorio"))]
    apellido_paterno: String,
    #[serde(default)]
    #[validate(length(max = 100, message = "El apellido materno es demasiado largo"))]
    apellido_materno: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Selecciona una empresa"))]
    empresa_id: String,
}

/// The company list is optional for rendering: a failure leaves it empty
/// and shows the error.
async fn empresas(state: &AppState, actual: &str) -> (Vec<SimpleOption>, Option<String>) {
    match state.auth.list_empresas().await {
        Ok(empresas) => (
            empresas
                .into_iter()
                .map(|e| SimpleOption::new(e.id, e.nombre, actual))
                .collect(),
            None,
        ),
        Err(err) => {
            warn!(error = %err, "company list unavailable");
            (Vec::new(), Some(err.user_message()))
        }
    }
}

pub async fn register_page(State(state): State<Arc<AppState>>) -> Response {
    let (empresas, errors) = empresas(&state, "").await;
    render_response(RegisterTemplate {
        correo: String::new(),
        nombres: String::new(),
        apellido_paterno: String::new(),
        apellido_materno: String::new(),
        empresas,
        errors,
    })
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    Form(form): Form<RegisterForm>,
) -> Response {
    let form = RegisterForm {
        correo: form.correo.trim().to_string(),
        nombres: form.nombres.trim().to_string(),
        apellido_paterno: form.apellido_paterno.trim().to_string(),
        apellido_materno: form.apellido_materno.trim().to_string(),
        ..form
    };

    let fallo = match form.validate() {
        Err(errors) => Some(mensajes_validacion(&errors)),
        Ok(()) => {
            let registro = RegistroUsuario {
                correo: form.correo.clone(),
                password: form.password.clone(),
                nombres: form.nombres.clone(),
                apellido_paterno: form.apellido_paterno.clone(),
                apellido_materno: form.apellido_materno.clone(),
                empresa_id: form.empresa_id.clone(),
            };
            state
                .auth
                .register_usuario(&registro)
                .await
                .err()
                .map(|err| err.user_message())
        }
    };

    match fallo {
        None => Redirect::to("/login?registrado=1").into_response(),
        Some(message) => {
            let (empresas, _) = empresas(&state, &form.empresa_id).await;
            render_response(RegisterTemplate {
                correo: form.correo,
                nombres: form.nombres,
                apellido_paterno: form.apellido_paterno,
                apellido_materno: form.apellido_materno,
                empresas,
                errors: Some(message),
            })
        }
    }
}
