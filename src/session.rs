// session.rs
// Session gate: resolves the cookie into an explicit session state, protects
// routes, and offers an extractor to access the signed-in user.

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, HeaderValue, header::COOKIE, header::SET_COOKIE, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use futures::future::BoxFuture;
use tracing::debug;

use crate::models::Usuario;
use crate::routes::perfil_incompleto_response;
use crate::state::{AppState, Aviso, Credenciales, SESSION_TTL_SECONDS};

pub const SESSION_COOKIE_NAME: &str = "session";

#[derive(Clone)]
pub struct SessionData {
    pub token: String,
    pub credenciales: Credenciales,
    pub usuario: Usuario,
}

/// Where a request stands with respect to authentication.
#[derive(Clone)]
pub enum EstadoSesion {
    Anonima,
    /// Signed in, but the account has no profile row. The user may only
    /// sign out.
    Incompleta {
        token: String,
        credenciales: Credenciales,
    },
    Autenticada(SessionData),
}

pub async fn resolve_session(state: &AppState, headers: &HeaderMap) -> EstadoSesion {
    for token in extract_cookies(headers, SESSION_COOKIE_NAME) {
        if let Some(guardada) = state.sessions.find(&token).await {
            return match guardada.perfil {
                Some(usuario) => EstadoSesion::Autenticada(SessionData {
                    token,
                    credenciales: guardada.credenciales,
                    usuario,
                }),
                None => EstadoSesion::Incompleta {
                    token,
                    credenciales: guardada.credenciales,
                },
            };
        }
    }
    EstadoSesion::Anonima
}

pub async fn require_session(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, Response> {
    match resolve_session(&state, request.headers()).await {
        EstadoSesion::Anonima => {
            debug!(path = %request.uri().path(), "anonymous request redirected to login");
            Err(Redirect::to("/login").into_response())
        }
        EstadoSesion::Incompleta { credenciales, .. } => {
            Err(perfil_incompleto_response(&credenciales.email))
        }
        EstadoSesion::Autenticada(data) => {
            request.extensions_mut().insert(data);
            Ok(next.run(request).await)
        }
    }
}

pub struct SessionUser(pub SessionData);

impl SessionUser {
    pub fn usuario(&self) -> &Usuario {
        &self.0.usuario
    }

    pub fn token(&self) -> &str {
        &self.0.token
    }

    pub fn access_token(&self) -> &str {
        &self.0.credenciales.access_token
    }

    pub fn empresa_id(&self) -> &str {
        &self.0.usuario.empresa_id
    }

    pub fn nombre(&self) -> String {
        let nombre = self.0.usuario.nombre_completo();
        if nombre.is_empty() {
            self.0.credenciales.email.clone()
        } else {
            nombre
        }
    }

    /// Queues a notification for the next rendered page.
    pub async fn avisar(&self, state: &AppState, aviso: Aviso) {
        state.sessions.push_aviso(self.token(), aviso).await;
    }
}

#[allow(refining_impl_trait)]
impl<S> FromRequestParts<S> for SessionUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> BoxFuture<'static, Result<Self, Self::Rejection>> {
        let data = parts
            .extensions
            .get::<SessionData>()
            .cloned()
            .ok_or_else(|| Redirect::to("/login").into_response());

        Box::pin(async move {
            match data {
                Ok(session) => Ok(SessionUser(session)),
                Err(resp) => Err(resp),
            }
        })
    }
}

pub fn set_session_cookie(response: &mut Response, token: &str, secure: bool) {
    let secure = if secure { "; Secure" } else { "" };
    if let Ok(header_value) = HeaderValue::from_str(&format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}{}",
        SESSION_COOKIE_NAME, token, SESSION_TTL_SECONDS, secure
    )) {
        response.headers_mut().append(SET_COOKIE, header_value);
    }
}

pub fn clear_session_cookie(response: &mut Response) {
    if let Ok(header_value) = HeaderValue::from_str(&format!(
        "{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0",
        SESSION_COOKIE_NAME
    )) {
        response.headers_mut().append(SET_COOKIE, header_value);
    }
}

pub fn extract_cookies(headers: &HeaderMap, name: &str) -> Vec<String> {
    headers
        .get_all(COOKIE)
        .into_iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| {
            let mut split = pair.trim().splitn(2, '=');
            let key = split.next()?.trim();
            let value = split.next()?.trim();
            if key == name && !value.is_empty() {
                Some(value.to_owned())
            } else {
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_every_cookie_with_the_name() {
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("theme=dark; session=abc"));
        headers.append(COOKIE, HeaderValue::from_static("session=def; session="));
        assert_eq!(extract_cookies(&headers, SESSION_COOKIE_NAME), vec!["abc", "def"]);
        assert!(extract_cookies(&headers, "missing").is_empty());
    }
}
