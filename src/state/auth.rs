// state/auth.rs
// Client for the auth / profile backend: password sign-in, sign-out,
// sign-up and the `Usuarios` / `Empresas` row store.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Url, header::CONTENT_TYPE};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::models::{Empresa, RegistroUsuario, Usuario};

use super::{
    api::{ApiError, decode_list, execute},
    sessions::Credenciales,
};

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    user: AuthUser,
}

#[derive(Deserialize)]
struct AuthUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Clone)]
pub struct AuthClient {
    http: reqwest::Client,
    base: Url,
    api_key: String,
}

impl AuthClient {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        let base =
            Url::parse(base_url).with_context(|| format!("invalid auth url {base_url}"))?;
        if base.cannot_be_a_base() {
            anyhow::bail!("auth url {base_url} cannot be used as a base");
        }
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            http,
            base,
            api_key: api_key.to_string(),
        })
    }

    fn url(&self, segments: &[&str], query: &[(&str, &str)]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        url
    }

    /// Exchanges email and password for an access token.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Credenciales, ApiError> {
        let url = self.url(&["auth", "v1", "token"], &[("grant_type", "password")]);
        let builder = self
            .http
            .post(url)
            .header("apikey", &self.api_key)
            .header(CONTENT_TYPE, "application/json")
            .json(&json!({ "email": email.trim(), "password": password }));
        let body = execute(builder, "Credenciales inválidas").await?;
        if body.trim().is_empty() {
            return Err(ApiError::EmptyBody);
        }
        let token: TokenResponse = serde_json::from_str(&body)?;
        Ok(Credenciales {
            access_token: token.access_token,
            email: token.user.email.unwrap_or_else(|| email.trim().to_string()),
            user_id: token.user.id,
        })
    }

    /// Revokes the access token. Failures are logged and otherwise ignored.
    pub async fn sign_out(&self, access_token: &str) {
        let builder = self
            .http
            .post(self.url(&["auth", "v1", "logout"], &[]))
            .header("apikey", &self.api_key)
            .bearer_auth(access_token);
        if let Err(err) = execute(builder, "Error al cerrar sesión").await {
            warn!(error = %err, "sign-out rejected by auth provider");
        }
    }

    /// Looks up the profile row of an auth user. Any failure counts as "no
    /// profile"; the caller decides what an incomplete account may do.
    pub async fn fetch_profile(&self, credenciales: &Credenciales) -> Option<Usuario> {
        let filtro = format!("eq.{}", credenciales.user_id);
        let url = self.url(
            &["rest", "v1", "Usuarios"],
            &[("select", "*"), ("Id", filtro.as_str())],
        );
        let builder = self
            .http
            .get(url)
            .header("apikey", &self.api_key)
            .bearer_auth(&credenciales.access_token);

        let perfil = match execute(builder, "Error al obtener el perfil").await {
            Ok(body) => decode_list::<Usuario>(&body).map(|rows| rows.into_iter().next()),
            Err(err) => Err(err),
        };
        match perfil {
            Ok(perfil) => perfil,
            Err(err) => {
                warn!(user_id = %credenciales.user_id, error = %err, "profile lookup failed");
                None
            }
        }
    }

    /// Active companies offered on the registration page.
    pub async fn list_empresas(&self) -> Result<Vec<Empresa>, ApiError> {
        let url = self.url(
            &["rest", "v1", "Empresas"],
            &[("select", "Id,Nombre,RutEmpresa"), ("Activo", "eq.true")],
        );
        let builder = self
            .http
            .get(url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key);
        let body = execute(builder, "Error al cargar empresas").await?;
        decode_list(&body)
    }

    /// Signs the user up and inserts the matching `Usuarios` row.
    pub async fn register_usuario(&self, registro: &RegistroUsuario) -> Result<String, ApiError> {
        let correo = registro.correo.trim();
        let builder = self
            .http
            .post(self.url(&["auth", "v1", "signup"], &[]))
            .header("apikey", &self.api_key)
            .header(CONTENT_TYPE, "application/json")
            .json(&json!({
                "email": correo,
                "password": registro.password,
                "data": {
                    "Nombres": registro.nombres,
                    "ApellidoPaterno": registro.apellido_paterno,
                    "ApellidoMaterno": registro.apellido_materno,
                    "EmpresaId": registro.empresa_id,
                }
            }));
        let body = execute(builder, "No se pudo crear el usuario").await?;
        let value: Value = if body.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&body)?
        };

        let user_id = value
            .pointer("/user/id")
            .or_else(|| value.get("id"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ApiError::Remote {
                status: reqwest::StatusCode::BAD_REQUEST,
                message: "No se pudo crear el usuario".to_string(),
            })?;
        let bearer = value
            .get("access_token")
            .and_then(Value::as_str)
            .unwrap_or(self.api_key.as_str())
            .to_string();

        let fila = json!([{
            "Id": user_id,
            "Nombres": registro.nombres,
            "ApellidoPaterno": registro.apellido_paterno,
            "ApellidoMaterno": registro.apellido_materno,
            "Correo": correo,
            "EmpresaId": registro.empresa_id,
        }]);
        let builder = self
            .http
            .post(self.url(&["rest", "v1", "Usuarios"], &[]))
            .header("apikey", &self.api_key)
            .header("Prefer", "return=minimal")
            .header(CONTENT_TYPE, "application/json")
            .bearer_auth(bearer)
            .json(&fila);
        execute(builder, "No se pudo guardar el perfil del usuario").await?;

        info!(%user_id, "user registered");
        Ok(user_id)
    }
}
