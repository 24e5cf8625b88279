use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use validator::ValidationErrors;

use crate::{
    session::{SessionUser, clear_session_cookie},
    state::{ApiError, AppState, Aviso},
};

pub(crate) fn render<T: Template>(tpl: T) -> Result<Html<String>, StatusCode> {
    tpl.render().map(Html).map_err(|err| {
        tracing::error!(error = %err, "template render failed");
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

pub(crate) fn render_response<T: Template>(tpl: T) -> Response {
    render(tpl)
        .map(IntoResponse::into_response)
        .unwrap_or_else(|status| status.into_response())
}

/// Data every console page hands to `base.html`.
pub(crate) struct Layout {
    pub usuario: String,
    pub seccion: &'static str,
    pub aviso: Option<Aviso>,
}

pub(crate) async fn layout(
    state: &AppState,
    session_user: &SessionUser,
    seccion: &'static str,
) -> Layout {
    Layout {
        usuario: session_user.nombre(),
        seccion,
        aviso: state.sessions.take_aviso(session_user.token()).await,
    }
}

pub(crate) struct SimpleOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

impl SimpleOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>, actual: &str) -> Self {
        let value = value.into();
        let selected = value == actual;
        Self {
            value,
            label: label.into(),
            selected,
        }
    }
}

/// Flashes `aviso` and redirects to `to`.
pub(crate) async fn redirect_con_aviso(
    state: &AppState,
    session_user: &SessionUser,
    to: &str,
    aviso: Aviso,
) -> Response {
    session_user.avisar(state, aviso).await;
    Redirect::to(to).into_response()
}

/// The remote API rejected the access token: the console session is over.
pub(crate) async fn sesion_expirada(state: &AppState, session_user: &SessionUser) -> Response {
    state.sessions.remove(session_user.token()).await;
    let mut response = Redirect::to("/login").into_response();
    clear_session_cookie(&mut response);
    response
}

/// Surfaces a failed remote call as a notification on `to`.
pub(crate) async fn fallo_remoto(
    state: &AppState,
    session_user: &SessionUser,
    to: &str,
    err: ApiError,
) -> Response {
    if err.is_unauthorized() {
        return sesion_expirada(state, session_user).await;
    }
    redirect_con_aviso(state, session_user, to, Aviso::error(err.user_message())).await
}

/// First message of every invalid field, in field order.
pub(crate) fn mensajes_validacion(errors: &ValidationErrors) -> String {
    let mut campos: Vec<_> = errors.field_errors().into_iter().collect();
    campos.sort_by_key(|(campo, _)| *campo);
    campos
        .into_iter()
        .filter_map(|(campo, errores)| {
            errores.first().map(|e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{campo} no es válido"))
            })
        })
        .collect::<Vec<_>>()
        .join(". ")
}

pub(crate) fn no_vacio(valor: Option<String>) -> Option<String> {
    valor.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

/// HTML checkboxes only submit when ticked.
pub(crate) fn casilla(valor: &Option<String>) -> bool {
    matches!(valor.as_deref(), Some("on" | "true" | "1"))
}

pub(crate) fn formato_cantidad(valor: f64) -> String {
    if valor.fract() == 0.0 {
        format!("{valor:.0}")
    } else {
        format!("{valor:.2}")
    }
}

pub(crate) fn formato_precio(valor: f64) -> String {
    format!("$ {valor:.2}")
}

/// `YYYY-MM-DD` part of an API timestamp, or `-`.
pub(crate) fn formato_fecha(valor: &str) -> String {
    crate::filters::fecha_de(valor)
        .map(|d| d.format("%d-%m-%Y").to_string())
        .unwrap_or_else(|| "-".to_string())
}
