// state/api.rs
// HTTP client for the inventory REST API: bearer auth, JSON bodies, error
// body parsing and `{ data }` envelope unwrapping.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Method, RequestBuilder, StatusCode, Url, header::CONTENT_TYPE};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

/// Failure of a remote call. The `Display` text is what the user sees.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("No se pudo contactar al servidor, intenta nuevamente")]
    Transport(#[from] reqwest::Error),
    #[error("{message}")]
    Remote { status: StatusCode, message: String },
    #[error("El servidor no devolvió una respuesta válida")]
    EmptyBody,
    #[error("Respuesta inesperada del servidor")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    pub fn user_message(&self) -> String {
        self.to_string()
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Remote { status, .. } => Some(*status),
            ApiError::Transport(err) => err.status(),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }
}

/// Extracts the message of an error body: `errors` map values joined with
/// `", "`, then `message`-like keys, then `fallback`.
pub fn error_message(body: &str, fallback: &str) -> String {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return fallback.to_string();
    };

    if let Some(errors) = value.get("errors").and_then(Value::as_object) {
        let joined = errors
            .values()
            .flat_map(|v| match v {
                Value::Array(items) => items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect::<Vec<_>>(),
                Value::String(s) => vec![s.clone()],
                _ => Vec::new(),
            })
            .collect::<Vec<_>>()
            .join(", ");
        return if joined.is_empty() {
            "Error de validación".to_string()
        } else {
            joined
        };
    }

    ["message", "Message", "mensaje", "error_description", "msg"]
        .iter()
        .find_map(|key| {
            value
                .get(*key)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|m| !m.is_empty())
        })
        .map(str::to_string)
        .unwrap_or_else(|| fallback.to_string())
}

fn envelope_inner(map: &mut serde_json::Map<String, Value>) -> Option<Value> {
    ["data", "datos", "Data"]
        .iter()
        .find_map(|key| map.remove(*key).filter(|v| !v.is_null()))
}

/// Decodes a collection answered as a bare array, `{ data: [...] }`,
/// `{ datos: [...] }` or any object with one array-valued field.
pub fn decode_list<T: DeserializeOwned>(body: &str) -> Result<Vec<T>, ApiError> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    let value: Value = serde_json::from_str(body)?;
    let items = match value {
        Value::Array(_) => value,
        Value::Object(mut map) => match envelope_inner(&mut map) {
            Some(inner @ Value::Array(_)) => inner,
            Some(_) => Value::Array(Vec::new()),
            None => map
                .into_iter()
                .map(|(_, v)| v)
                .find(Value::is_array)
                .unwrap_or(Value::Array(Vec::new())),
        },
        _ => Value::Array(Vec::new()),
    };
    Ok(serde_json::from_value(items)?)
}

/// Decodes a single record answered as `{ data: {...} }` or bare. An empty
/// body yields `None`.
pub fn decode_item<T: DeserializeOwned>(body: &str) -> Result<Option<T>, ApiError> {
    if body.trim().is_empty() {
        return Ok(None);
    }
    let value: Value = serde_json::from_str(body)?;
    let item = match value {
        Value::Object(mut map) => match envelope_inner(&mut map) {
            Some(inner) => inner,
            None if map.is_empty() => return Ok(None),
            None => Value::Object(map),
        },
        Value::Null => return Ok(None),
        other => other,
    };
    Ok(Some(serde_json::from_value(item)?))
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base = Url::parse(base_url).with_context(|| format!("invalid API url {base_url}"))?;
        if base.cannot_be_a_base() {
            anyhow::bail!("API url {base_url} cannot be used as a base");
        }
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { http, base })
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Appends percent-encoded path segments to the base URL.
    pub fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(&self, method: Method, url: Url, token: &str) -> RequestBuilder {
        self.http
            .request(method, url)
            .bearer_auth(token)
            .header(CONTENT_TYPE, "application/json")
    }

    pub async fn get(&self, url: Url, token: &str, fallback: &str) -> Result<String, ApiError> {
        let builder = self.request(Method::GET, url, token);
        execute(builder, fallback).await
    }

    pub async fn post<B: Serialize + ?Sized>(
        &self,
        url: Url,
        token: &str,
        body: &B,
        fallback: &str,
    ) -> Result<String, ApiError> {
        let builder = self.request(Method::POST, url, token).json(body);
        execute(builder, fallback).await
    }

    pub async fn put<B: Serialize + ?Sized>(
        &self,
        url: Url,
        token: &str,
        body: &B,
        fallback: &str,
    ) -> Result<String, ApiError> {
        let builder = self.request(Method::PUT, url, token).json(body);
        execute(builder, fallback).await
    }

    /// PUT without a body, used by the voucher state transitions.
    pub async fn put_empty(
        &self,
        url: Url,
        token: &str,
        fallback: &str,
    ) -> Result<String, ApiError> {
        let builder = self.request(Method::PUT, url, token);
        execute(builder, fallback).await
    }

    pub async fn delete(&self, url: Url, token: &str, fallback: &str) -> Result<String, ApiError> {
        let builder = self.request(Method::DELETE, url, token);
        execute(builder, fallback).await
    }
}

/// Sends the request and returns the raw body of a 2xx answer. Shared with
/// the auth client.
pub(crate) async fn execute(builder: RequestBuilder, fallback: &str) -> Result<String, ApiError> {
    let (client, request) = builder.build_split();
    let request = request?;
    let method = request.method().clone();
    let path = request.url().path().to_string();

    let response = client.execute(request).await.map_err(|err| {
        warn!(%method, %path, error = %err, "remote call failed");
        ApiError::Transport(err)
    })?;
    let status = response.status();
    let body = response.text().await?;
    debug!(%method, %path, status = status.as_u16(), "remote call");

    if status.is_success() {
        return Ok(body);
    }

    let message = error_message(&body, fallback);
    warn!(%method, %path, status = status.as_u16(), %message, "remote call rejected");
    Err(ApiError::Remote { status, message })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Almacen, Categoria};

    #[test]
    fn error_message_prefers_structured_body() {
        assert_eq!(
            error_message(r#"{"message":"Código duplicado"}"#, "Error al crear el almacén"),
            "Código duplicado"
        );
        assert_eq!(
            error_message(
                r#"{"errors":{"Detalles":["Debe tener detalle"],"Fecha":["Fecha inválida"]}}"#,
                "x"
            ),
            "Debe tener detalle, Fecha inválida"
        );
    }

    #[test]
    fn error_message_falls_back_on_empty_or_garbage() {
        for body in ["", "   ", "<html>502</html>", "{}", r#"{"message":""}"#, "[1,2]"] {
            let msg = error_message(body, "Error al obtener almacenes");
            assert_eq!(msg, "Error al obtener almacenes", "body {body:?}");
        }
    }

    #[test]
    fn lists_accept_every_envelope() {
        let bare: Vec<Almacen> = decode_list(r#"[{"id":"1","nombre":"A"}]"#).unwrap();
        let data: Vec<Almacen> = decode_list(r#"{"data":[{"id":"1","nombre":"A"}]}"#).unwrap();
        let datos: Vec<Almacen> = decode_list(r#"{"datos":[{"id":"1","nombre":"A"}]}"#).unwrap();
        let other: Vec<Categoria> =
            decode_list(r#"{"total":1,"categorias":[{"id":"1","nombre":"A"}]}"#).unwrap();
        assert_eq!(bare, data);
        assert_eq!(data, datos);
        assert_eq!(other[0].nombre, "A");

        let null: Vec<Almacen> = decode_list(r#"{"data":null}"#).unwrap();
        assert!(null.is_empty());
        let empty: Vec<Almacen> = decode_list("").unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn items_unwrap_data_or_use_bare_object() {
        let wrapped: Option<Almacen> = decode_item(r#"{"data":{"id":"9","nombre":"B"}}"#).unwrap();
        let bare: Option<Almacen> = decode_item(r#"{"id":"9","nombre":"B"}"#).unwrap();
        assert_eq!(wrapped, bare);
        assert!(decode_item::<Almacen>("").unwrap().is_none());
        assert!(decode_item::<Almacen>(r#"{"data":null}"#).unwrap().is_none());
    }

    #[test]
    fn endpoint_encodes_segments() {
        let client = ApiClient::new("http://api.local/", Duration::from_secs(1)).unwrap();
        let url = client.endpoint(&["api", "Comprobantes", "numero", "F 001/2"]);
        assert_eq!(
            url.as_str(),
            "http://api.local/api/Comprobantes/numero/F%20001%2F2"
        );
    }
}
