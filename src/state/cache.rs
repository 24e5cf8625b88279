// state/cache.rs
// Short-lived query cache shared by all pages. Reads go through
// `get_or_load`; successful mutations invalidate the keys they affect so the
// next render of the list fetches fresh data.

use std::{
    any::Any,
    collections::HashMap,
    future::Future,
    sync::Arc,
    time::{Duration, Instant},
};

use tokio::sync::RwLock;
use tracing::debug;

/// Query keys, one per remote collection.
pub mod claves {
    pub const ALMACENES: &str = "almacenes";
    pub const CATEGORIAS: &str = "categorias";
    pub const PRODUCTOS: &str = "productos";
    pub const PRODUCTOS_EMPRESA: &str = "productos-empresa";
    pub const MOVIMIENTOS: &str = "movimientos";
    pub const COMPROBANTES: &str = "comprobantes";
    pub const TIPOS_COMPROBANTE: &str = "tipos-comprobante";
}

struct Entrada {
    guardado: Instant,
    valor: Arc<dyn Any + Send + Sync>,
}

type Clave = (String, String);

#[derive(Default)]
struct Contenido {
    entradas: HashMap<Clave, Entrada>,
    /// Bumped by `invalidate`; a load that saw an older value is not stored.
    generaciones: HashMap<Clave, u64>,
    /// Bumped by `clear_scope`.
    alcances: HashMap<String, u64>,
}

impl Contenido {
    fn generacion(&self, alcance: &str, clave: &Clave) -> (u64, u64) {
        (
            self.alcances.get(alcance).copied().unwrap_or_default(),
            self.generaciones.get(clave).copied().unwrap_or_default(),
        )
    }
}

fn clave_de(alcance: &str, clave: &str) -> Clave {
    (alcance.to_string(), clave.to_string())
}

pub struct QueryCache {
    ttl: Duration,
    contenido: RwLock<Contenido>,
}

impl QueryCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            contenido: RwLock::new(Contenido::default()),
        }
    }

    pub async fn get<T: Send + Sync + 'static>(
        &self,
        alcance: &str,
        clave: &str,
    ) -> Option<Arc<T>> {
        let contenido = self.contenido.read().await;
        let entrada = contenido.entradas.get(&clave_de(alcance, clave))?;
        if entrada.guardado.elapsed() > self.ttl {
            return None;
        }
        entrada.valor.clone().downcast::<T>().ok()
    }

    pub async fn put<T: Send + Sync + 'static>(&self, alcance: &str, clave: &str, valor: Arc<T>) {
        self.contenido.write().await.entradas.insert(
            clave_de(alcance, clave),
            Entrada {
                guardado: Instant::now(),
                valor,
            },
        );
    }

    /// Returns the cached value or runs `load` and stores its success.
    /// Errors are never cached, and neither is a result whose key was
    /// invalidated while `load` ran.
    pub async fn get_or_load<T, E, F, Fut>(
        &self,
        alcance: &str,
        clave: &str,
        load: F,
    ) -> Result<Arc<T>, E>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(hit) = self.get::<T>(alcance, clave).await {
            debug!(alcance, clave, "cache hit");
            return Ok(hit);
        }
        let llave = clave_de(alcance, clave);
        let inicial = self.contenido.read().await.generacion(alcance, &llave);
        let valor = Arc::new(load().await?);

        let mut contenido = self.contenido.write().await;
        if contenido.generacion(alcance, &llave) == inicial {
            contenido.entradas.insert(
                llave,
                Entrada {
                    guardado: Instant::now(),
                    valor: valor.clone(),
                },
            );
        } else {
            debug!(alcance, clave, "invalidated during load, not stored");
        }
        Ok(valor)
    }

    pub async fn invalidate(&self, alcance: &str, claves: &[&str]) {
        let mut contenido = self.contenido.write().await;
        contenido
            .entradas
            .retain(|(a, c), _| !(a == alcance && claves.contains(&c.as_str())));
        for clave in claves {
            *contenido.generaciones.entry(clave_de(alcance, clave)).or_default() += 1;
        }
        debug!(alcance, ?claves, "cache invalidated");
    }

    /// Drops everything stored for one scope, e.g. on sign-out.
    pub async fn clear_scope(&self, alcance: &str) {
        let mut contenido = self.contenido.write().await;
        contenido.entradas.retain(|(a, _), _| a != alcance);
        *contenido.alcances.entry(alcance.to_string()).or_default() += 1;
    }
}
