// workflow.rs
// Voucher (comprobante) lifecycle: status codes, the per-type warehouse
// requirement table and which actions a voucher offers.

use std::fmt;

use crate::models::Comprobante;

/// Lifecycle state of a voucher. Created vouchers always start as `Borrador`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EstadoComprobante {
    Borrador,
    Confirmado,
    Anulado,
    Desconocido(i32),
}

impl EstadoComprobante {
    pub const BORRADOR: i32 = 1;
    pub const CONFIRMADO: i32 = 2;
    pub const ANULADO: i32 = 3;

    pub fn from_codigo(codigo: i32) -> Self {
        match codigo {
            Self::BORRADOR => EstadoComprobante::Borrador,
            Self::CONFIRMADO => EstadoComprobante::Confirmado,
            Self::ANULADO => EstadoComprobante::Anulado,
            otro => EstadoComprobante::Desconocido(otro),
        }
    }

    pub fn codigo(&self) -> i32 {
        match self {
            EstadoComprobante::Borrador => Self::BORRADOR,
            EstadoComprobante::Confirmado => Self::CONFIRMADO,
            EstadoComprobante::Anulado => Self::ANULADO,
            EstadoComprobante::Desconocido(c) => *c,
        }
    }

    pub fn nombre(&self) -> &'static str {
        match self {
            EstadoComprobante::Borrador => "Borrador",
            EstadoComprobante::Confirmado => "Confirmado",
            EstadoComprobante::Anulado => "Anulado",
            EstadoComprobante::Desconocido(_) => "Sin estado",
        }
    }

    /// Status options for list filters.
    pub fn todos() -> [EstadoComprobante; 3] {
        [
            EstadoComprobante::Borrador,
            EstadoComprobante::Confirmado,
            EstadoComprobante::Anulado,
        ]
    }
}

impl fmt::Display for EstadoComprobante {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.nombre())
    }
}

/// Family a voucher type code belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FamiliaComprobante {
    Ingreso,
    Salida,
    Ajuste,
    Transferencia,
    Documento,
    Otro,
}

impl FamiliaComprobante {
    pub fn de_codigo(codigo: i32) -> Self {
        match codigo {
            10 | 11 => FamiliaComprobante::Ingreso,
            20 | 21 => FamiliaComprobante::Salida,
            30 | 31 => FamiliaComprobante::Ajuste,
            40 => FamiliaComprobante::Transferencia,
            90 => FamiliaComprobante::Documento,
            _ => FamiliaComprobante::Otro,
        }
    }

    pub fn nombre(&self) -> &'static str {
        match self {
            FamiliaComprobante::Ingreso => "INGRESO",
            FamiliaComprobante::Salida => "SALIDA",
            FamiliaComprobante::Ajuste => "AJUSTE",
            FamiliaComprobante::Transferencia => "TRANSFERENCIA",
            FamiliaComprobante::Documento => "DOCUMENTO",
            FamiliaComprobante::Otro => "OTRO",
        }
    }
}

/// Which warehouse fields a voucher line must carry. Only a UX hint; the API
/// validates the real rule when the voucher is confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RequisitosAlmacen {
    pub origen: bool,
    pub destino: bool,
}

impl RequisitosAlmacen {
    pub fn para_tipo(codigo: i32) -> Self {
        match FamiliaComprobante::de_codigo(codigo) {
            FamiliaComprobante::Ingreso => Self {
                origen: false,
                destino: true,
            },
            FamiliaComprobante::Salida => Self {
                origen: true,
                destino: false,
            },
            FamiliaComprobante::Transferencia => Self {
                origen: true,
                destino: true,
            },
            _ => Self::default(),
        }
    }

    /// Same as [`para_tipo`](Self::para_tipo) for a raw form value; anything
    /// that is not a number requires nothing.
    pub fn para_valor(valor: &str) -> Self {
        valor
            .trim()
            .parse::<i32>()
            .map(Self::para_tipo)
            .unwrap_or_default()
    }
}

/// Actions the console offers for one voucher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AccionesComprobante {
    pub confirmar: bool,
    pub anular: bool,
    /// Confirmed counter-voucher: the annul button is shown disabled.
    pub anular_bloqueado: bool,
    /// Drafts show an edit action; there is no edit endpoint behind it yet.
    pub editar: bool,
}

impl AccionesComprobante {
    pub fn para(comprobante: &Comprobante) -> Self {
        let estado = EstadoComprobante::from_codigo(comprobante.estado_comprobante_codigo);
        let contra = comprobante.es_contracomprobante();
        match estado {
            EstadoComprobante::Borrador => Self {
                confirmar: true,
                editar: true,
                ..Self::default()
            },
            EstadoComprobante::Confirmado => Self {
                anular: !contra,
                anular_bloqueado: contra,
                ..Self::default()
            },
            _ => Self::default(),
        }
    }
}
