// state module: AppState, initialization, and re-exports of submodules.

use anyhow::Result;
use tracing::info;

use crate::config::Config;

pub mod api;
pub mod auth;
pub mod cache;
pub mod sessions;

mod almacenes;
mod categorias;
mod comprobantes;
mod dashboard;
mod movimientos;
mod productos;
mod productos_empresa;
mod tipos_comprobante;

pub use almacenes::*;
pub use categorias::*;
pub use comprobantes::*;
pub use dashboard::*;
pub use movimientos::*;
pub use productos::*;
pub use productos_empresa::*;
pub use tipos_comprobante::*;

pub use api::{ApiClient, ApiError};
pub use auth::AuthClient;
pub use cache::{QueryCache, claves};
pub use sessions::{Aviso, Credenciales, NivelAviso, SesionGuardada, SessionStore};

pub const SESSION_TTL_SECONDS: u64 = 60 * 60 * 24; // 1 day

pub struct AppState {
    pub config: Config,
    pub api: ApiClient,
    pub auth: AuthClient,
    pub sessions: SessionStore,
    pub cache: QueryCache,
}

pub fn init_state(config: Config) -> Result<AppState> {
    let api = ApiClient::new(&config.api_url, config.http_timeout)?;
    let auth = AuthClient::new(&config.auth_url, &config.auth_key, config.http_timeout)?;
    info!(api = %config.api_url, auth = %config.auth_url, "remote backends configured");

    Ok(AppState {
        api,
        auth,
        sessions: SessionStore::default(),
        cache: QueryCache::new(config.cache_ttl),
        config,
    })
}
