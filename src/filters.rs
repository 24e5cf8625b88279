// filters.rs
// List filters: every page ANDs a set of independent predicates over the
// collection it fetched. An empty predicate matches everything.

use std::{cmp::Ordering, collections::HashSet};

use chrono::NaiveDate;
use serde::Deserialize;

use crate::models::{
    Almacen, Categoria, Comprobante, MovimientoInventario, Producto, ProductoEmpresa,
};

/// Parses the leading `YYYY-MM-DD` of an API timestamp.
pub fn fecha_de(valor: &str) -> Option<NaiveDate> {
    let valor = valor.trim();
    let dia = valor.get(..10).unwrap_or(valor);
    NaiveDate::parse_from_str(dia, "%Y-%m-%d").ok()
}

fn contiene(campo: &str, aguja: &str) -> bool {
    campo.to_lowercase().contains(aguja)
}

fn normalizar(texto: &Option<String>) -> Option<String> {
    texto
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

/// Inclusive date range. Either bound may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RangoFechas {
    pub desde: Option<NaiveDate>,
    pub hasta: Option<NaiveDate>,
}

impl RangoFechas {
    pub fn new(desde: Option<&str>, hasta: Option<&str>) -> Self {
        Self {
            desde: desde.and_then(fecha_de),
            hasta: hasta.and_then(fecha_de),
        }
    }

    pub fn es_abierto(&self) -> bool {
        self.desde.is_none() && self.hasta.is_none()
    }

    /// Records without a parseable date only pass an open range.
    pub fn incluye(&self, fecha: &str) -> bool {
        if self.es_abierto() {
            return true;
        }
        let Some(dia) = fecha_de(fecha) else {
            return false;
        };
        self.desde.is_none_or(|d| dia >= d) && self.hasta.is_none_or(|h| dia <= h)
    }
}

/// Plain text search used by the catalog pages.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FiltroTexto {
    #[serde(default)]
    pub q: Option<String>,
}

impl FiltroTexto {
    pub fn productos(&self, items: Vec<Producto>) -> Vec<Producto> {
        let Some(q) = normalizar(&self.q) else {
            return items;
        };
        items
            .into_iter()
            .filter(|p| {
                contiene(&p.nombre, &q)
                    || p.codigo_barra.as_deref().is_some_and(|c| contiene(c, &q))
            })
            .collect()
    }

    pub fn productos_empresa(&self, items: Vec<ProductoEmpresa>) -> Vec<ProductoEmpresa> {
        let Some(q) = normalizar(&self.q) else {
            return items;
        };
        items
            .into_iter()
            .filter(|p| {
                contiene(&p.producto_nombre, &q)
                    || contiene(&p.sku, &q)
                    || contiene(&p.categoria_nombre, &q)
            })
            .collect()
    }

    pub fn categorias(&self, items: Vec<Categoria>) -> Vec<Categoria> {
        let Some(q) = normalizar(&self.q) else {
            return items;
        };
        items.into_iter().filter(|c| contiene(&c.nombre, &q)).collect()
    }

    pub fn almacenes(&self, items: Vec<Almacen>) -> Vec<Almacen> {
        let Some(q) = normalizar(&self.q) else {
            return items;
        };
        items
            .into_iter()
            .filter(|a| contiene(&a.nombre, &q) || contiene(&a.codigo, &q))
            .collect()
    }
}

/// Query string of the movements page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FiltroMovimientos {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub tipo: Option<String>,
    #[serde(default)]
    pub desde: Option<String>,
    #[serde(default)]
    pub hasta: Option<String>,
    #[serde(default)]
    pub almacen: Option<String>,
}

impl FiltroMovimientos {
    fn tipo(&self) -> Option<&str> {
        self.tipo
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty() && *t != "all")
    }

    pub fn aplicar(&self, items: Vec<MovimientoInventario>) -> Vec<MovimientoInventario> {
        let q = normalizar(&self.q);
        let tipo = self.tipo();
        let rango = RangoFechas::new(self.desde.as_deref(), self.hasta.as_deref());
        let almacenes = conjunto_almacenes(self.almacen.as_deref());

        items
            .into_iter()
            .filter(|m| {
                q.as_deref().is_none_or(|q| {
                    contiene(&m.producto_nombre, q)
                        || contiene(&m.sku, q)
                        || m.motivo.as_deref().is_some_and(|mo| contiene(mo, q))
                })
            })
            .filter(|m| tipo.is_none_or(|t| m.tipo_movimiento == t))
            .filter(|m| rango.incluye(&m.fecha_movimiento))
            .filter(|m| {
                almacenes.is_empty()
                    || m
                        .almacen_id
                        .as_deref()
                        .is_some_and(|id| almacenes.contains(id))
            })
            .collect()
    }
}

/// Distinct movement types in first-seen order, for the type selector.
pub fn tipos_movimiento(items: &[MovimientoInventario]) -> Vec<String> {
    let mut vistos = HashSet::new();
    items
        .iter()
        .filter(|m| !m.tipo_movimiento.is_empty())
        .filter(|m| vistos.insert(m.tipo_movimiento.clone()))
        .map(|m| m.tipo_movimiento.clone())
        .collect()
}

/// Query string of the vouchers page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FiltroComprobantes {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub tipo: Option<String>,
    #[serde(default)]
    pub estado: Option<String>,
    #[serde(default)]
    pub desde: Option<String>,
    #[serde(default)]
    pub hasta: Option<String>,
    #[serde(default)]
    pub almacen: Option<String>,
}

fn codigo(valor: Option<&str>) -> Option<i32> {
    valor.and_then(|v| v.trim().parse::<i32>().ok())
}

impl FiltroComprobantes {
    /// Filters and sorts by descending number.
    pub fn aplicar(&self, items: Vec<Comprobante>) -> Vec<Comprobante> {
        let q = normalizar(&self.q);
        let tipo = codigo(self.tipo.as_deref());
        let estado = codigo(self.estado.as_deref());
        let rango = RangoFechas::new(self.desde.as_deref(), self.hasta.as_deref());
        let almacenes = conjunto_almacenes(self.almacen.as_deref());

        let mut filtrados: Vec<Comprobante> = items
            .into_iter()
            .filter(|c| {
                q.as_deref().is_none_or(|q| {
                    contiene(&c.numero, q)
                        || c.observacion.as_deref().is_some_and(|o| contiene(o, q))
                })
            })
            .filter(|c| tipo.is_none_or(|t| c.tipo_comprobante_codigo == t))
            .filter(|c| estado.is_none_or(|e| c.estado_comprobante_codigo == e))
            .filter(|c| rango.incluye(&c.fecha))
            .filter(|c| almacenes.is_empty() || toca_almacenes(c, &almacenes))
            .collect();

        ordenar_por_numero_desc(&mut filtrados);
        filtrados
    }
}

fn toca_almacenes(c: &Comprobante, almacenes: &HashSet<String>) -> bool {
    c.detalles.iter().any(|d| {
        [d.almacen_origen_id.as_deref(), d.almacen_destino_id.as_deref()]
            .into_iter()
            .flatten()
            .any(|id| almacenes.contains(id))
    })
}

/// Accepts a comma separated list of warehouse ids.
fn conjunto_almacenes(valor: Option<&str>) -> HashSet<String> {
    valor
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Numeric numbers compare numerically and sort before the rest, which
/// compare lexicographically. Both groups go highest first.
pub fn comparar_numero_desc(a: &str, b: &str) -> Ordering {
    match (a.trim().parse::<i64>(), b.trim().parse::<i64>()) {
        (Ok(x), Ok(y)) => y.cmp(&x),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => b.cmp(a),
    }
}

pub fn ordenar_por_numero_desc(items: &mut [Comprobante]) {
    items.sort_by(|a, b| comparar_numero_desc(&a.numero, &b.numero));
}
