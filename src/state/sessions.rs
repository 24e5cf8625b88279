use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use data_encoding::BASE32_NOPAD;
use rand::RngCore;
use tokio::sync::RwLock;

use crate::models::Usuario;

use super::SESSION_TTL_SECONDS;

/// What the auth provider handed back on sign-in.
#[derive(Debug, Clone, PartialEq)]
pub struct Credenciales {
    pub access_token: String,
    pub user_id: String,
    pub email: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NivelAviso {
    Exito,
    Error,
}

/// One-shot notification shown on the next rendered page.
#[derive(Debug, Clone, PartialEq)]
pub struct Aviso {
    pub nivel: NivelAviso,
    pub mensaje: String,
}

impl Aviso {
    pub fn exito(mensaje: impl Into<String>) -> Self {
        Self {
            nivel: NivelAviso::Exito,
            mensaje: mensaje.into(),
        }
    }

    pub fn error(mensaje: impl Into<String>) -> Self {
        Self {
            nivel: NivelAviso::Error,
            mensaje: mensaje.into(),
        }
    }

    pub fn es_error(&self) -> bool {
        self.nivel == NivelAviso::Error
    }
}

#[derive(Debug, Clone)]
pub struct SesionGuardada {
    pub credenciales: Credenciales,
    pub perfil: Option<Usuario>,
}

struct Registro {
    sesion: SesionGuardada,
    expira: Instant,
    aviso: Option<Aviso>,
}

/// Session table keyed by the cookie token. Lives only in memory; the
/// access token itself belongs to the auth provider.
pub struct SessionStore {
    ttl: Duration,
    registros: RwLock<HashMap<String, Registro>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(Duration::from_secs(SESSION_TTL_SECONDS))
    }
}

fn nuevo_token() -> String {
    let mut token_bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut token_bytes);
    BASE32_NOPAD.encode(&token_bytes)
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            registros: RwLock::new(HashMap::new()),
        }
    }

    pub async fn create(&self, credenciales: Credenciales, perfil: Option<Usuario>) -> String {
        let token = nuevo_token();
        let mut registros = self.registros.write().await;
        registros.retain(|_, r| r.expira > Instant::now());
        registros.insert(
            token.clone(),
            Registro {
                sesion: SesionGuardada {
                    credenciales,
                    perfil,
                },
                expira: Instant::now() + self.ttl,
                aviso: None,
            },
        );
        token
    }

    /// Expired rows are dropped on lookup.
    pub async fn find(&self, token: &str) -> Option<SesionGuardada> {
        {
            let registros = self.registros.read().await;
            match registros.get(token) {
                Some(r) if r.expira > Instant::now() => return Some(r.sesion.clone()),
                Some(_) => {}
                None => return None,
            }
        }
        self.registros.write().await.remove(token);
        None
    }

    pub async fn remove(&self, token: &str) -> Option<SesionGuardada> {
        self.registros
            .write()
            .await
            .remove(token)
            .map(|r| r.sesion)
    }

    pub async fn push_aviso(&self, token: &str, aviso: Aviso) {
        if let Some(r) = self.registros.write().await.get_mut(token) {
            r.aviso = Some(aviso);
        }
    }

    pub async fn take_aviso(&self, token: &str) -> Option<Aviso> {
        self.registros
            .write()
            .await
            .get_mut(token)
            .and_then(|r| r.aviso.take())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credenciales() -> Credenciales {
        Credenciales {
            access_token: "jwt".into(),
            user_id: "u1".into(),
            email: "ana@vostok.cl".into(),
        }
    }

    #[tokio::test]
    async fn create_find_remove() {
        let store = SessionStore::default();
        let token = store.create(credenciales(), None).await;
        assert_eq!(token.len(), 52);

        let found = store.find(&token).await.unwrap();
        assert_eq!(found.credenciales, credenciales());
        assert!(found.perfil.is_none());

        assert!(store.remove(&token).await.is_some());
        assert!(store.find(&token).await.is_none());
    }

    #[tokio::test]
    async fn expired_sessions_are_dropped() {
        let store = SessionStore::new(Duration::ZERO);
        let token = store.create(credenciales(), None).await;
        assert!(store.find(&token).await.is_none());
    }

    #[tokio::test]
    async fn avisos_are_shown_once() {
        let store = SessionStore::default();
        let token = store.create(credenciales(), None).await;
        store.push_aviso(&token, Aviso::exito("Guardado")).await;
        assert_eq!(store.take_aviso(&token).await, Some(Aviso::exito("Guardado")));
        assert!(store.take_aviso(&token).await.is_none());
    }
}
