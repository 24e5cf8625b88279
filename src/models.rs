// models.rs
// Canonical shapes for every entity mirrored from the inventory API and the
// auth/profile store. The REST API answers in camelCase while the row store
// answers in PascalCase, so each field accepts both spellings.

use serde::{Deserialize, Serialize};

/// Profile row from the `Usuarios` table. Its absence blocks the console.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Usuario {
    #[serde(alias = "Id")]
    pub id: String,
    #[serde(alias = "Nombres")]
    pub nombres: String,
    #[serde(alias = "ApellidoPaterno", alias = "apellidoPaterno")]
    pub apellido_paterno: Option<String>,
    #[serde(alias = "ApellidoMaterno", alias = "apellidoMaterno")]
    pub apellido_materno: Option<String>,
    #[serde(alias = "Correo", alias = "email")]
    pub correo: String,
    #[serde(alias = "EmpresaId", alias = "empresaId")]
    pub empresa_id: String,
}

impl Usuario {
    pub fn nombre_completo(&self) -> String {
        [
            Some(self.nombres.as_str()),
            self.apellido_paterno.as_deref(),
            self.apellido_materno.as_deref(),
        ]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Empresa {
    #[serde(alias = "Id")]
    pub id: String,
    #[serde(alias = "Nombre")]
    pub nombre: String,
    #[serde(alias = "RutEmpresa", alias = "rutEmpresa")]
    pub rut_empresa: Option<String>,
}

/// Global catalog product.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Producto {
    #[serde(alias = "Id")]
    pub id: String,
    #[serde(alias = "Nombre")]
    pub nombre: String,
    #[serde(alias = "CodigoBarra", alias = "codigoBarras")]
    pub codigo_barra: Option<String>,
    #[serde(alias = "Activo")]
    pub activo: bool,
}

impl Default for Producto {
    fn default() -> Self {
        Self {
            id: String::new(),
            nombre: String::new(),
            codigo_barra: None,
            activo: true,
        }
    }
}

/// Company-scoped catalog entry with its own SKU, price and stock levels.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ProductoEmpresa {
    #[serde(alias = "Id")]
    pub id: String,
    #[serde(alias = "ProductoId")]
    pub producto_id: String,
    #[serde(alias = "ProductoNombre")]
    pub producto_nombre: String,
    #[serde(alias = "CategoriaId")]
    pub categoria_id: String,
    #[serde(alias = "CategoriaNombre")]
    pub categoria_nombre: String,
    #[serde(alias = "Sku", alias = "SKU")]
    pub sku: String,
    #[serde(alias = "Precio")]
    pub precio: f64,
    #[serde(alias = "Activo")]
    pub activo: bool,
    #[serde(alias = "CantidadActual", alias = "stockActual", alias = "StockActual")]
    pub cantidad_actual: f64,
    #[serde(
        alias = "CantidadReservada",
        alias = "stockReservado",
        alias = "StockReservado"
    )]
    pub cantidad_reservada: f64,
}

impl Default for ProductoEmpresa {
    fn default() -> Self {
        Self {
            id: String::new(),
            producto_id: String::new(),
            producto_nombre: String::new(),
            categoria_id: String::new(),
            categoria_nombre: String::new(),
            sku: String::new(),
            precio: 0.0,
            activo: true,
            cantidad_actual: 0.0,
            cantidad_reservada: 0.0,
        }
    }
}

/// Category tree node. Only one parent level is shown by the console.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Categoria {
    #[serde(alias = "Id")]
    pub id: String,
    #[serde(alias = "Nombre")]
    pub nombre: String,
    #[serde(alias = "CategoriaPadreId")]
    pub categoria_padre_id: Option<String>,
    #[serde(alias = "EmpresaId")]
    pub empresa_id: String,
    #[serde(alias = "Activo")]
    pub activo: bool,
}

impl Default for Categoria {
    fn default() -> Self {
        Self {
            id: String::new(),
            nombre: String::new(),
            categoria_padre_id: None,
            empresa_id: String::new(),
            activo: true,
        }
    }
}

/// Warehouse / stock location.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Almacen {
    #[serde(alias = "Id")]
    pub id: String,
    #[serde(alias = "EmpresaId")]
    pub empresa_id: String,
    #[serde(alias = "Nombre")]
    pub nombre: String,
    #[serde(alias = "Codigo")]
    pub codigo: String,
    #[serde(alias = "Descripcion")]
    pub descripcion: Option<String>,
    #[serde(alias = "EsPrincipal")]
    pub es_principal: bool,
    #[serde(alias = "Activo")]
    pub activo: bool,
    #[serde(alias = "FechaCreacion")]
    pub fecha_creacion: Option<String>,
}

/// Read-only audit record of a stock change.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct MovimientoInventario {
    #[serde(alias = "Id")]
    pub id: String,
    #[serde(alias = "FechaMovimiento")]
    pub fecha_movimiento: String,
    #[serde(alias = "TipoMovimiento")]
    pub tipo_movimiento: String,
    #[serde(alias = "Direccion")]
    pub direccion: String,
    #[serde(alias = "DireccionNombre")]
    pub direccion_nombre: Option<String>,
    #[serde(alias = "Cantidad")]
    pub cantidad: f64,
    #[serde(alias = "CostoUnitario")]
    pub costo_unitario: Option<f64>,
    #[serde(alias = "ValorTotal")]
    pub valor_total: Option<f64>,
    #[serde(alias = "DocumentoReferencia")]
    pub documento_referencia: Option<String>,
    #[serde(alias = "DocumentoTipo")]
    pub documento_tipo: Option<String>,
    #[serde(alias = "Motivo")]
    pub motivo: Option<String>,
    #[serde(alias = "ProductoNombre")]
    pub producto_nombre: String,
    #[serde(alias = "Sku", alias = "SKU")]
    pub sku: String,
    #[serde(alias = "AlmacenId")]
    pub almacen_id: Option<String>,
    #[serde(alias = "AlmacenNombre")]
    pub almacen_nombre: String,
    #[serde(alias = "UsuarioNombre")]
    pub usuario_nombre: String,
    #[serde(alias = "FechaCreacion")]
    pub fecha_creacion: Option<String>,
}

impl MovimientoInventario {
    /// Inbound movements are marked with an `E`/`ENTRADA`/`IN` direction.
    pub fn es_entrada(&self) -> bool {
        let dir = self.direccion.trim().to_ascii_uppercase();
        matches!(dir.as_str(), "E" | "ENTRADA" | "IN" | "I" | "1")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct TipoComprobante {
    #[serde(alias = "Id")]
    pub id: String,
    #[serde(alias = "Codigo")]
    pub codigo: Option<i32>,
    #[serde(alias = "Nombre")]
    pub nombre: String,
    #[serde(alias = "AfectaStock")]
    pub afecta_stock: bool,
}

/// Voucher line. Required warehouse refs depend on the parent's type code.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ComprobanteDetalle {
    #[serde(alias = "Id")]
    pub id: Option<String>,
    #[serde(alias = "ProductoEmpresaId")]
    pub producto_empresa_id: Option<String>,
    #[serde(alias = "ProductoEmpresaNombre", alias = "productoNombre")]
    pub producto_empresa_nombre: Option<String>,
    #[serde(alias = "Cantidad")]
    pub cantidad: f64,
    #[serde(alias = "CostoUnitario")]
    pub costo_unitario: Option<f64>,
    #[serde(alias = "AlmacenOrigenId")]
    pub almacen_origen_id: Option<String>,
    #[serde(alias = "AlmacenOrigenNombre")]
    pub almacen_origen_nombre: Option<String>,
    #[serde(alias = "AlmacenDestinoId")]
    pub almacen_destino_id: Option<String>,
    #[serde(alias = "AlmacenDestinoNombre")]
    pub almacen_destino_nombre: Option<String>,
}

/// Voucher. Mutable only through draft -> confirmed -> annulled.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Comprobante {
    #[serde(alias = "Id")]
    pub id: String,
    #[serde(alias = "Numero")]
    pub numero: String,
    #[serde(alias = "Fecha")]
    pub fecha: String,
    #[serde(alias = "TipoComprobanteCodigo")]
    pub tipo_comprobante_codigo: i32,
    #[serde(alias = "TipoComprobanteNombre")]
    pub tipo_comprobante_nombre: Option<String>,
    #[serde(alias = "EstadoComprobanteCodigo")]
    pub estado_comprobante_codigo: i32,
    #[serde(alias = "EstadoComprobanteNombre")]
    pub estado_comprobante_nombre: Option<String>,
    #[serde(alias = "Observacion")]
    pub observacion: Option<String>,
    #[serde(alias = "Detalles")]
    pub detalles: Vec<ComprobanteDetalle>,
    /// Set when this voucher was issued against another one (counter-voucher).
    #[serde(
        alias = "ComprobanteRelacionadoId",
        alias = "comprobanteOrigenId",
        alias = "ComprobanteOrigenId"
    )]
    pub comprobante_relacionado_id: Option<String>,
}

impl Comprobante {
    pub fn es_contracomprobante(&self) -> bool {
        self.comprobante_relacionado_id
            .as_deref()
            .is_some_and(|id| !id.trim().is_empty())
    }
}

// ----- outbound payloads -----

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CrearAlmacen {
    pub empresa_id: String,
    pub nombre: String,
    pub codigo: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descripcion: Option<String>,
    pub es_principal: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActualizarAlmacen {
    pub nombre: String,
    pub codigo: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descripcion: Option<String>,
    pub es_principal: bool,
    pub activo: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CrearCategoria {
    #[serde(rename = "Nombre")]
    pub nombre: String,
    #[serde(rename = "CategoriaPadreId")]
    pub categoria_padre_id: Option<String>,
    #[serde(rename = "EmpresaId")]
    pub empresa_id: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ActualizarCategoria {
    #[serde(rename = "Nombre")]
    pub nombre: String,
    #[serde(rename = "CategoriaPadreId")]
    pub categoria_padre_id: Option<String>,
    #[serde(rename = "Activo")]
    pub activo: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CrearProducto {
    pub nombre: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codigo_barra: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CrearProductoEmpresa {
    pub producto_id: String,
    pub categoria_id: String,
    pub sku: String,
    pub precio: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActualizarProductoEmpresa {
    pub id: String,
    pub categoria_id: String,
    pub sku: String,
    pub precio: f64,
}

/// Voucher creation body. The voucher endpoints expect PascalCase.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct CrearComprobante {
    pub tipo_comprobante_codigo: i32,
    pub numero: String,
    /// RFC 3339 timestamp of the chosen day at UTC midnight.
    pub fecha: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observacion: Option<String>,
    pub detalles: Vec<CrearComprobanteDetalle>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct CrearComprobanteDetalle {
    pub producto_empresa_id: String,
    pub cantidad: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub costo_unitario: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub almacen_origen_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub almacen_destino_id: Option<String>,
}

/// New account data collected by the registration page.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistroUsuario {
    pub correo: String,
    pub password: String,
    pub nombres: String,
    pub apellido_paterno: String,
    pub apellido_materno: String,
    pub empresa_id: String,
}
