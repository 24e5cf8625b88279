// Dashboard aggregation: three independent fetches and the stock buckets.

use std::sync::Arc;

use crate::models::{Categoria, MovimientoInventario, ProductoEmpresa};

use super::{
    AppState, claves,
    api::ApiError,
    list_categorias, list_movimientos, list_productos_empresa,
};

pub const MOVIMIENTOS_RECIENTES: usize = 5;

/// Every product lands in exactly one bucket.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EstadoStock {
    pub sin_stock: Vec<ProductoEmpresa>,
    pub stock_bajo: Vec<ProductoEmpresa>,
    pub saludable: Vec<ProductoEmpresa>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NivelStock {
    SinStock,
    Bajo,
    Saludable,
}

impl NivelStock {
    pub fn de(producto: &ProductoEmpresa) -> Self {
        if producto.cantidad_actual <= 0.0 {
            NivelStock::SinStock
        } else if producto.cantidad_actual <= producto.cantidad_reservada {
            NivelStock::Bajo
        } else {
            NivelStock::Saludable
        }
    }
}

pub fn clasificar_stock(productos: &[ProductoEmpresa]) -> EstadoStock {
    let mut estado = EstadoStock::default();
    for producto in productos {
        let destino = match NivelStock::de(producto) {
            NivelStock::SinStock => &mut estado.sin_stock,
            NivelStock::Bajo => &mut estado.stock_bajo,
            NivelStock::Saludable => &mut estado.saludable,
        };
        destino.push(producto.clone());
    }
    estado
}

#[derive(Debug, Clone)]
pub struct ResumenDashboard {
    pub total_productos: usize,
    pub total_categorias: usize,
    pub stock: EstadoStock,
    pub movimientos_recientes: Vec<MovimientoInventario>,
}

/// Runs the three queries concurrently through the query cache.
pub async fn load_dashboard(
    state: &AppState,
    token: &str,
    empresa_id: &str,
) -> Result<ResumenDashboard, ApiError> {
    let productos = state
        .cache
        .get_or_load(empresa_id, claves::PRODUCTOS_EMPRESA, || {
            list_productos_empresa(state, token)
        });
    let categorias = state
        .cache
        .get_or_load(empresa_id, claves::CATEGORIAS, || {
            list_categorias(state, token, empresa_id)
        });
    let movimientos = state
        .cache
        .get_or_load(empresa_id, claves::MOVIMIENTOS, || list_movimientos(state, token));

    let (productos, categorias, movimientos): (
        Arc<Vec<ProductoEmpresa>>,
        Arc<Vec<Categoria>>,
        Arc<Vec<MovimientoInventario>>,
    ) = tokio::try_join!(productos, categorias, movimientos)?;

    Ok(ResumenDashboard {
        total_productos: productos.len(),
        total_categorias: categorias.len(),
        stock: clasificar_stock(&productos),
        movimientos_recientes: movimientos
            .iter()
            .take(MOVIMIENTOS_RECIENTES)
            .cloned()
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn producto(sku: &str, actual: f64, reservada: f64) -> ProductoEmpresa {
        ProductoEmpresa {
            id: sku.into(),
            sku: sku.into(),
            cantidad_actual: actual,
            cantidad_reservada: reservada,
            ..Default::default()
        }
    }

    #[test]
    fn buckets_partition_every_product_once() {
        let productos = vec![
            producto("cero", 0.0, 0.0),
            producto("cero-reservado", 0.0, 5.0),
            producto("bajo", 3.0, 5.0),
            producto("justo", 5.0, 5.0),
            producto("sano", 6.0, 5.0),
            producto("sin-reserva", 1.0, 0.0),
        ];
        let estado = clasificar_stock(&productos);

        let skus = |v: &[ProductoEmpresa]| v.iter().map(|p| p.sku.clone()).collect::<Vec<_>>();
        assert_eq!(skus(&estado.sin_stock), vec!["cero", "cero-reservado"]);
        assert_eq!(skus(&estado.stock_bajo), vec!["bajo", "justo"]);
        assert_eq!(skus(&estado.saludable), vec!["sano", "sin-reserva"]);
        assert_eq!(
            estado.sin_stock.len() + estado.stock_bajo.len() + estado.saludable.len(),
            productos.len()
        );
    }
}
