// routes/comprobantes.rs
// Vouchers: filtered list, creation form with dynamic lines, lookup by
// number, detail page and the confirm / annul transitions.

use std::{collections::HashMap, sync::Arc};

use askama::Template;
use axum::{
    extract::{Form, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use validator::Validate;

use super::helpers::{
    Layout, SimpleOption, fallo_remoto, formato_cantidad, formato_fecha, formato_precio, layout,
    mensajes_validacion, no_vacio, redirect_con_aviso, render_response, sesion_expirada,
};
use crate::{
    filters::FiltroComprobantes,
    models::{
        Almacen, Comprobante, CrearComprobante, CrearComprobanteDetalle, ProductoEmpresa,
        TipoComprobante,
    },
    session::SessionUser,
    state::{
        AppState, ApiError, Aviso, anular_comprobante, claves, confirmar_comprobante,
        create_comprobante, fecha_iso, get_comprobante, get_comprobante_por_numero,
        list_almacenes, list_comprobantes, list_productos_empresa, list_tipos_comprobante,
    },
    workflow::{AccionesComprobante, EstadoComprobante, FamiliaComprobante, RequisitosAlmacen},
};

const LISTA: &str = "/comprobantes";

// ----- shared lookups -----

struct Catalogos {
    tipos: Arc<Vec<TipoComprobante>>,
    productos: Arc<Vec<ProductoEmpresa>>,
    almacenes: Arc<Vec<Almacen>>,
    error: Option<ApiError>,
}

impl Catalogos {
    fn nombre_tipo(&self, codigo: i32) -> Option<&str> {
        self.tipos
            .iter()
            .find(|t| t.codigo == Some(codigo))
            .map(|t| t.nombre.as_str())
    }

    fn opciones_tipo(&self, actual: &str) -> Vec<SimpleOption> {
        self.tipos
            .iter()
            .filter_map(|t| {
                let codigo = t.codigo?;
                Some(SimpleOption::new(
                    codigo.to_string(),
                    format!("{codigo} - {}", t.nombre),
                    actual,
                ))
            })
            .collect()
    }

    fn opciones_producto(&self, actual: &str) -> Vec<SimpleOption> {
        self.productos
            .iter()
            .filter(|p| p.activo)
            .map(|p| {
                SimpleOption::new(
                    p.id.clone(),
                    format!("{} ({})", p.producto_nombre, p.sku),
                    actual,
                )
            })
            .collect()
    }

    fn opciones_almacen(&self, actual: &str, vacia: &str) -> Vec<SimpleOption> {
        std::iter::once(SimpleOption::new("", vacia, actual))
            .chain(
                self.almacenes
                    .iter()
                    .filter(|a| a.activo)
                    .map(|a| SimpleOption::new(a.id.clone(), a.nombre.clone(), actual)),
            )
            .collect()
    }
}

/// Voucher types, company products and warehouses, fetched concurrently.
/// A failure leaves that catalog empty and keeps the first error.
async fn catalogos(state: &AppState, session_user: &SessionUser) -> Catalogos {
    let empresa = session_user.empresa_id();
    let token = session_user.access_token();
    let (tipos, productos, almacenes) = tokio::join!(
        state.cache.get_or_load(empresa, claves::TIPOS_COMPROBANTE, || {
            list_tipos_comprobante(state, token)
        }),
        state.cache.get_or_load(empresa, claves::PRODUCTOS_EMPRESA, || {
            list_productos_empresa(state, token)
        }),
        state
            .cache
            .get_or_load(empresa, claves::ALMACENES, || list_almacenes(state, token)),
    );

    let mut error = None;
    let tipos = tomar(tipos, &mut error);
    let productos = tomar(productos, &mut error);
    let almacenes = tomar(almacenes, &mut error);
    Catalogos {
        tipos,
        productos,
        almacenes,
        error,
    }
}

fn tomar<T>(
    resultado: Result<Arc<Vec<T>>, ApiError>,
    error: &mut Option<ApiError>,
) -> Arc<Vec<T>> {
    resultado.unwrap_or_else(|err| {
        error.get_or_insert(err);
        Arc::new(Vec::new())
    })
}

fn estado_clase(estado: EstadoComprobante) -> &'static str {
    match estado {
        EstadoComprobante::Borrador => "borrador",
        EstadoComprobante::Confirmado => "confirmado",
        EstadoComprobante::Anulado => "anulado",
        EstadoComprobante::Desconocido(_) => "desconocido",
    }
}

struct Cabecera {
    id: String,
    numero: String,
    fecha: String,
    tipo: String,
    familia: &'static str,
    estado: String,
    estado_clase: &'static str,
    observacion: String,
    lineas: usize,
    relacionado: Option<String>,
    acciones: AccionesComprobante,
}

impl Cabecera {
    fn new(c: &Comprobante, catalogos: &Catalogos) -> Self {
        let estado = EstadoComprobante::from_codigo(c.estado_comprobante_codigo);
        let codigo = c.tipo_comprobante_codigo;
        let tipo = c
            .tipo_comprobante_nombre
            .as_deref()
            .filter(|n| !n.is_empty())
            .or_else(|| catalogos.nombre_tipo(codigo))
            .map(|n| format!("{codigo} - {n}"))
            .unwrap_or_else(|| codigo.to_string());
        Self {
            id: c.id.clone(),
            numero: c.numero.clone(),
            fecha: formato_fecha(&c.fecha),
            tipo,
            familia: FamiliaComprobante::de_codigo(codigo).nombre(),
            estado: c
                .estado_comprobante_nombre
                .clone()
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| estado.nombre().to_string()),
            estado_clase: estado_clase(estado),
            observacion: c.observacion.clone().unwrap_or_default(),
            lineas: c.detalles.len(),
            relacionado: c
                .comprobante_relacionado_id
                .clone()
                .filter(|id| !id.trim().is_empty()),
            acciones: AccionesComprobante::para(c),
        }
    }
}

// ----- list -----

#[derive(Template)]
#[template(path = "comprobantes/index.html")]
struct ComprobantesTemplate {
    layout: Layout,
    comprobantes: Vec<Cabecera>,
    tipos: Vec<SimpleOption>,
    estados: Vec<SimpleOption>,
    almacenes: Vec<SimpleOption>,
    q: String,
    desde: String,
    hasta: String,
    errors: Option<String>,
}

pub async fn comprobantes_index(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Query(filtro): Query<FiltroComprobantes>,
) -> Response {
    let lista = state
        .cache
        .get_or_load(session_user.empresa_id(), claves::COMPROBANTES, || {
            list_comprobantes(&state, session_user.access_token())
        })
        .await;
    let (lista, mut errors) = match lista {
        Ok(items) => (items, None),
        Err(err) if err.is_unauthorized() => return sesion_expirada(&state, &session_user).await,
        Err(err) => (Arc::new(Vec::new()), Some(err.user_message())),
    };
    let catalogos = catalogos(&state, &session_user).await;
    if let Some(err) = &catalogos.error {
        errors.get_or_insert(err.user_message());
    }

    let tipo_actual = filtro.tipo.clone().unwrap_or_default();
    let estado_actual = filtro.estado.clone().unwrap_or_default();
    let almacen_actual = filtro.almacen.clone().unwrap_or_default();
    let tipos = std::iter::once(SimpleOption::new("", "Todos", &tipo_actual))
        .chain(catalogos.opciones_tipo(&tipo_actual))
        .collect();
    let estados = std::iter::once(SimpleOption::new("", "Todos", &estado_actual))
        .chain(EstadoComprobante::todos().into_iter().map(|e| {
            SimpleOption::new(e.codigo().to_string(), e.nombre(), &estado_actual)
        }))
        .collect();

    let comprobantes = filtro
        .aplicar(lista.as_ref().clone())
        .iter()
        .map(|c| Cabecera::new(c, &catalogos))
        .collect();

    render_response(ComprobantesTemplate {
        layout: layout(&state, &session_user, "comprobantes").await,
        comprobantes,
        tipos,
        estados,
        almacenes: catalogos.opciones_almacen(&almacen_actual, "Todos"),
        q: filtro.q.unwrap_or_default(),
        desde: filtro.desde.unwrap_or_default(),
        hasta: filtro.hasta.unwrap_or_default(),
        errors,
    })
}

// ----- detail and lookup -----

struct DetalleRow {
    producto: String,
    cantidad: String,
    costo: String,
    origen: String,
    destino: String,
}

#[derive(Template)]
#[template(path = "comprobantes/show.html")]
struct ComprobanteTemplate {
    layout: Layout,
    comprobante: Cabecera,
    detalles: Vec<DetalleRow>,
}

async fn detalle(state: &AppState, session_user: &SessionUser, c: Comprobante) -> Response {
    let catalogos = catalogos(state, session_user).await;
    let productos: HashMap<&str, &ProductoEmpresa> = catalogos
        .productos
        .iter()
        .map(|p| (p.id.as_str(), p))
        .collect();
    let almacenes: HashMap<&str, &str> = catalogos
        .almacenes
        .iter()
        .map(|a| (a.id.as_str(), a.nombre.as_str()))
        .collect();
    let almacen = |nombre: &Option<String>, id: &Option<String>| {
        nombre
            .clone()
            .filter(|n| !n.is_empty())
            .or_else(|| {
                id.as_deref()
                    .and_then(|id| almacenes.get(id))
                    .map(|n| n.to_string())
            })
            .unwrap_or_else(|| "-".to_string())
    };

    let detalles = c
        .detalles
        .iter()
        .map(|d| DetalleRow {
            producto: d
                .producto_empresa_nombre
                .clone()
                .filter(|n| !n.is_empty())
                .or_else(|| {
                    d.producto_empresa_id
                        .as_deref()
                        .and_then(|id| productos.get(id))
                        .map(|p| format!("{} ({})", p.producto_nombre, p.sku))
                })
                .unwrap_or_else(|| "-".to_string()),
            cantidad: formato_cantidad(d.cantidad),
            costo: d.costo_unitario.map(formato_precio).unwrap_or_default(),
            origen: almacen(&d.almacen_origen_nombre, &d.almacen_origen_id),
            destino: almacen(&d.almacen_destino_nombre, &d.almacen_destino_id),
        })
        .collect();

    render_response(ComprobanteTemplate {
        layout: layout(state, session_user, "comprobantes").await,
        comprobante: Cabecera::new(&c, &catalogos),
        detalles,
    })
}

fn no_encontrado(err: &ApiError) -> bool {
    matches!(err, ApiError::EmptyBody) || err.status() == Some(StatusCode::NOT_FOUND)
}

pub async fn comprobantes_show(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    match get_comprobante(&state, session_user.access_token(), &id).await {
        Ok(c) => detalle(&state, &session_user, c).await,
        Err(err) if no_encontrado(&err) => StatusCode::NOT_FOUND.into_response(),
        Err(err) => fallo_remoto(&state, &session_user, LISTA, err).await,
    }
}

#[derive(Template)]
#[template(path = "comprobantes/buscar.html")]
struct BuscarTemplate {
    layout: Layout,
    numero: String,
    errors: Option<String>,
}

#[derive(Deserialize)]
pub struct BuscarQuery {
    #[serde(default)]
    numero: Option<String>,
}

pub async fn comprobantes_buscar(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Query(query): Query<BuscarQuery>,
) -> Response {
    let Some(numero) = no_vacio(query.numero) else {
        return render_response(BuscarTemplate {
            layout: layout(&state, &session_user, "comprobantes").await,
            numero: String::new(),
            errors: None,
        });
    };

    let errors = match get_comprobante_por_numero(&state, session_user.access_token(), &numero)
        .await
    {
        Ok(c) => return detalle(&state, &session_user, c).await,
        Err(err) if err.is_unauthorized() => return sesion_expirada(&state, &session_user).await,
        Err(err) if no_encontrado(&err) => {
            format!("No se encontró el comprobante número {numero}")
        }
        Err(err) => err.user_message(),
    };
    render_response(BuscarTemplate {
        layout: layout(&state, &session_user, "comprobantes").await,
        numero,
        errors: Some(errors),
    })
}

// ----- transitions -----

#[derive(Deserialize)]
pub struct AccionForm {
    #[serde(default)]
    volver: Option<String>,
}

impl AccionForm {
    /// Only pages of this section are valid return targets, and they must be
    /// usable as a `Location` header.
    fn destino(&self, id: &str) -> String {
        self.volver
            .as_deref()
            .filter(|v| v.starts_with(LISTA) && !v.contains("//") && es_visible(v))
            .map(str::to_string)
            .unwrap_or_else(|| {
                if es_visible(id) {
                    format!("{LISTA}/{id}")
                } else {
                    LISTA.to_string()
                }
            })
    }
}

fn es_visible(valor: &str) -> bool {
    valor.bytes().all(|b| b.is_ascii_graphic())
}

async fn invalidar_tras_transicion(state: &AppState, session_user: &SessionUser) {
    state
        .cache
        .invalidate(
            session_user.empresa_id(),
            &[
                claves::COMPROBANTES,
                claves::MOVIMIENTOS,
                claves::PRODUCTOS_EMPRESA,
            ],
        )
        .await;
}

pub async fn comprobantes_confirmar(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Form(form): Form<AccionForm>,
) -> Response {
    let volver = form.destino(&id);
    let token = session_user.access_token();
    let comprobante = match get_comprobante(&state, token, &id).await {
        Ok(c) => c,
        Err(err) => return fallo_remoto(&state, &session_user, &volver, err).await,
    };
    if !AccionesComprobante::para(&comprobante).confirmar {
        return redirect_con_aviso(
            &state,
            &session_user,
            &volver,
            Aviso::error("Solo se pueden confirmar comprobantes en borrador"),
        )
        .await;
    }

    match confirmar_comprobante(&state, token, &id).await {
        Ok(()) => {
            invalidar_tras_transicion(&state, &session_user).await;
            redirect_con_aviso(
                &state,
                &session_user,
                &volver,
                Aviso::exito(format!("Comprobante {} confirmado", comprobante.numero)),
            )
            .await
        }
        Err(err) => fallo_remoto(&state, &session_user, &volver, err).await,
    }
}

pub async fn comprobantes_anular(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Form(form): Form<AccionForm>,
) -> Response {
    let volver = form.destino(&id);
    let token = session_user.access_token();
    let comprobante = match get_comprobante(&state, token, &id).await {
        Ok(c) => c,
        Err(err) => return fallo_remoto(&state, &session_user, &volver, err).await,
    };
    let acciones = AccionesComprobante::para(&comprobante);
    if !acciones.anular {
        let mensaje = if acciones.anular_bloqueado {
            "Un contracomprobante no puede anularse"
        } else {
            "Solo se pueden anular comprobantes confirmados"
        };
        return redirect_con_aviso(&state, &session_user, &volver, Aviso::error(mensaje)).await;
    }

    match anular_comprobante(&state, token, &id).await {
        Ok(()) => {
            invalidar_tras_transicion(&state, &session_user).await;
            redirect_con_aviso(
                &state,
                &session_user,
                &volver,
                Aviso::exito(format!(
                    "Comprobante {} anulado; se generó su contracomprobante",
                    comprobante.numero
                )),
            )
            .await
        }
        Err(err) => fallo_remoto(&state, &session_user, &volver, err).await,
    }
}

// ----- creation form -----

/// One voucher line as typed in the form.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct LineaForm {
    pub producto_empresa_id: String,
    pub cantidad: String,
    pub costo_unitario: String,
    pub almacen_origen_id: String,
    pub almacen_destino_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AccionFormulario {
    Guardar,
    AgregarLinea,
    QuitarLinea(usize),
    Actualizar,
}

/// The new-voucher form. Line fields repeat once per line, in order, so the
/// body is read as plain pairs.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ComprobanteForm {
    pub tipo: String,
    pub numero: String,
    pub fecha: String,
    pub observacion: String,
    pub lineas: Vec<LineaForm>,
    pub accion: AccionFormulario,
}

impl ComprobanteForm {
    fn nuevo() -> Self {
        Self {
            tipo: String::new(),
            numero: String::new(),
            fecha: Local::now().date_naive().format("%Y-%m-%d").to_string(),
            observacion: String::new(),
            lineas: vec![LineaForm::default()],
            accion: AccionFormulario::Actualizar,
        }
    }

    pub(crate) fn desde_pares(pares: Vec<(String, String)>) -> Self {
        let mut form = Self {
            tipo: String::new(),
            numero: String::new(),
            fecha: String::new(),
            observacion: String::new(),
            lineas: Vec::new(),
            accion: AccionFormulario::Guardar,
        };
        let mut columnas: HashMap<String, Vec<String>> = HashMap::new();
        for (clave, valor) in pares {
            match clave.as_str() {
                "tipo" => form.tipo = valor.trim().to_string(),
                "numero" => form.numero = valor.trim().to_string(),
                "fecha" => form.fecha = valor.trim().to_string(),
                "observacion" => form.observacion = valor.trim().to_string(),
                "accion" => {
                    form.accion = match valor.as_str() {
                        "agregar" => AccionFormulario::AgregarLinea,
                        "actualizar" => AccionFormulario::Actualizar,
                        otro => otro
                            .strip_prefix("quitar-")
                            .and_then(|n| n.parse().ok())
                            .map(AccionFormulario::QuitarLinea)
                            .unwrap_or(AccionFormulario::Guardar),
                    }
                }
                columna if columna.starts_with("linea_") => {
                    columnas
                        .entry(columna.to_string())
                        .or_default()
                        .push(valor.trim().to_string());
                }
                _ => {}
            }
        }

        let total = columnas.values().map(Vec::len).max().unwrap_or(0);
        let celda = |nombre: &str, i: usize| {
            columnas
                .get(nombre)
                .and_then(|v| v.get(i))
                .cloned()
                .unwrap_or_default()
        };
        form.lineas = (0..total)
            .map(|i| LineaForm {
                producto_empresa_id: celda("linea_producto", i),
                cantidad: celda("linea_cantidad", i),
                costo_unitario: celda("linea_costo", i),
                almacen_origen_id: celda("linea_origen", i),
                almacen_destino_id: celda("linea_destino", i),
            })
            .collect();
        form
    }

    /// Applies add/remove line actions. A voucher never drops below one line.
    pub(crate) fn aplicar_accion(&mut self) {
        match self.accion {
            AccionFormulario::AgregarLinea => self.lineas.push(LineaForm::default()),
            AccionFormulario::QuitarLinea(i) if self.lineas.len() > 1 && i < self.lineas.len() => {
                self.lineas.remove(i);
            }
            _ => {}
        }
        if self.lineas.is_empty() {
            self.lineas.push(LineaForm::default());
        }
    }

    /// Validates and builds the request body, or returns the messages to
    /// show next to the form.
    pub(crate) fn payload(&self) -> Result<CrearComprobante, String> {
        let cabecera = CabeceraDatos {
            tipo: self.tipo.clone(),
            numero: self.numero.clone(),
            fecha: self.fecha.clone(),
            observacion: self.observacion.clone(),
        };
        let mut fallos = Vec::new();
        if let Err(errors) = cabecera.validate() {
            fallos.push(mensajes_validacion(&errors));
        }
        let tipo = self.tipo.parse::<i32>().ok();
        if !self.tipo.is_empty() && tipo.is_none() {
            fallos.push("El tipo de comprobante no es válido".to_string());
        }
        let dia = NaiveDate::parse_from_str(&self.fecha, "%Y-%m-%d").ok();
        if !self.fecha.is_empty() && dia.is_none() {
            fallos.push("La fecha no es válida".to_string());
        }
        if self.lineas.is_empty() {
            fallos.push("Agrega al menos una línea".to_string());
        }

        let mut detalles = Vec::with_capacity(self.lineas.len());
        for (i, linea) in self.lineas.iter().enumerate() {
            let datos = LineaDatos {
                producto_empresa_id: linea.producto_empresa_id.clone(),
                cantidad: numero(&linea.cantidad).unwrap_or(0.0),
            };
            if let Err(errors) = datos.validate() {
                fallos.push(format!("Línea {}: {}", i + 1, mensajes_validacion(&errors)));
                continue;
            }
            detalles.push(CrearComprobanteDetalle {
                producto_empresa_id: datos.producto_empresa_id,
                cantidad: datos.cantidad,
                costo_unitario: numero(&linea.costo_unitario),
                almacen_origen_id: no_vacio(Some(linea.almacen_origen_id.clone())),
                almacen_destino_id: no_vacio(Some(linea.almacen_destino_id.clone())),
            });
        }

        match (tipo, dia) {
            (Some(tipo), Some(dia)) if fallos.is_empty() => Ok(CrearComprobante {
                tipo_comprobante_codigo: tipo,
                numero: self.numero.clone(),
                fecha: fecha_iso(dia),
                observacion: no_vacio(Some(self.observacion.clone())),
                detalles,
            }),
            _ => Err(fallos.join(". ")),
        }
    }
}

fn numero(valor: &str) -> Option<f64> {
    valor
        .trim()
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

#[derive(Validate)]
struct CabeceraDatos {
    #[validate(length(min = 1, message = "Selecciona el tipo de comprobante"))]
    tipo: String,
    #[validate(length(min = 1, max = 50, message = "El número es obligatorio"))]
    numero: String,
    #[validate(length(min = 1, message = "La fecha es obligatoria"))]
    fecha: String,
    #[validate(length(max = 500, message = "La observación admite hasta 500 caracteres"))]
    observacion: String,
}

#[derive(Validate)]
struct LineaDatos {
    #[validate(length(min = 1, message = "selecciona un producto"))]
    producto_empresa_id: String,
    #[validate(range(min = 0.01, message = "la cantidad debe ser al menos 0.01"))]
    cantidad: f64,
}

struct LineaView {
    indice: usize,
    numero: usize,
    productos: Vec<SimpleOption>,
    cantidad: String,
    costo: String,
    origenes: Vec<SimpleOption>,
    destinos: Vec<SimpleOption>,
    puede_quitar: bool,
}

#[derive(Template)]
#[template(path = "comprobantes/form.html")]
struct ComprobanteFormTemplate {
    layout: Layout,
    tipos: Vec<SimpleOption>,
    numero: String,
    fecha: String,
    observacion: String,
    familia: &'static str,
    requiere_origen: bool,
    requiere_destino: bool,
    lineas: Vec<LineaView>,
    errors: Option<String>,
}

async fn formulario(
    state: &AppState,
    session_user: &SessionUser,
    form: ComprobanteForm,
    errors: Option<String>,
) -> Response {
    let catalogos = catalogos(state, session_user).await;
    let errors = errors.or_else(|| catalogos.error.as_ref().map(ApiError::user_message));
    let requisitos = RequisitosAlmacen::para_valor(&form.tipo);
    let familia = form
        .tipo
        .parse::<i32>()
        .map(|c| FamiliaComprobante::de_codigo(c).nombre())
        .unwrap_or("");
    let puede_quitar = form.lineas.len() > 1;

    let lineas = form
        .lineas
        .iter()
        .enumerate()
        .map(|(i, l)| LineaView {
            indice: i,
            numero: i + 1,
            productos: catalogos.opciones_producto(&l.producto_empresa_id),
            cantidad: l.cantidad.clone(),
            costo: l.costo_unitario.clone(),
            origenes: catalogos.opciones_almacen(&l.almacen_origen_id, "Sin origen"),
            destinos: catalogos.opciones_almacen(&l.almacen_destino_id, "Sin destino"),
            puede_quitar,
        })
        .collect();

    render_response(ComprobanteFormTemplate {
        layout: layout(state, session_user, "comprobantes").await,
        tipos: catalogos.opciones_tipo(&form.tipo),
        numero: form.numero,
        fecha: form.fecha,
        observacion: form.observacion,
        familia,
        requiere_origen: requisitos.origen,
        requiere_destino: requisitos.destino,
        lineas,
        errors,
    })
}

pub async fn comprobantes_new(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
) -> Response {
    formulario(&state, &session_user, ComprobanteForm::nuevo(), None).await
}

pub async fn comprobantes_create(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Form(pares): Form<Vec<(String, String)>>,
) -> Response {
    let mut form = ComprobanteForm::desde_pares(pares);
    if form.accion != AccionFormulario::Guardar {
        form.aplicar_accion();
        return formulario(&state, &session_user, form, None).await;
    }

    let payload = match form.payload() {
        Ok(payload) => payload,
        Err(message) => return formulario(&state, &session_user, form, Some(message)).await,
    };

    match create_comprobante(&state, session_user.access_token(), &payload).await {
        Ok(creado) => {
            state
                .cache
                .invalidate(session_user.empresa_id(), &[claves::COMPROBANTES])
                .await;
            let destino = creado
                .map(|c| format!("{LISTA}/{}", c.id))
                .unwrap_or_else(|| LISTA.to_string());
            session_user
                .avisar(
                    &state,
                    Aviso::exito(format!(
                        "Comprobante {} creado como borrador",
                        payload.numero
                    )),
                )
                .await;
            Redirect::to(&destino).into_response()
        }
        Err(err) if err.is_unauthorized() => sesion_expirada(&state, &session_user).await,
        Err(err) => formulario(&state, &session_user, form, Some(err.user_message())).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn volver(valor: &str) -> AccionForm {
        AccionForm {
            volver: Some(valor.to_string()),
        }
    }

    #[test]
    fn return_target_rejects_foreign_and_header_breaking_values() {
        assert_eq!(volver("/comprobantes?estado=2").destino("v1"), "/comprobantes?estado=2");
        assert_eq!(volver("//evil.example/comprobantes").destino("v1"), "/comprobantes/v1");
        assert_eq!(volver("/comprobantes\nx").destino("v1"), "/comprobantes/v1");
        assert_eq!(volver("/comprobantes/v1 x").destino("v1"), "/comprobantes/v1");
        assert_eq!(volver("/comprobantes/ñ").destino("v1"), "/comprobantes/v1");
        assert_eq!(AccionForm { volver: None }.destino("v\r1"), "/comprobantes");
    }

    fn pares(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn linea(producto: &str, cantidad: &str) -> Vec<(&'static str, String)> {
        vec![
            ("linea_producto", producto.to_string()),
            ("linea_cantidad", cantidad.to_string()),
            ("linea_costo", String::new()),
            ("linea_origen", String::new()),
            ("linea_destino", "a1".to_string()),
        ]
    }

    fn formulario_con(lineas: &[(&str, &str)], accion: &str) -> ComprobanteForm {
        let mut body = pares(&[
            ("tipo", "10"),
            ("numero", " 15 "),
            ("fecha", "2025-03-09"),
            ("observacion", ""),
        ]);
        for (producto, cantidad) in lineas {
            body.extend(linea(producto, cantidad).into_iter().map(|(k, v)| (k.to_string(), v)));
        }
        body.push(("accion".to_string(), accion.to_string()));
        ComprobanteForm::desde_pares(body)
    }

    #[test]
    fn pairs_become_header_and_ordered_lines() {
        let form = formulario_con(&[("pe1", "2"), ("pe2", "0,5")], "guardar");
        assert_eq!(form.numero, "15");
        assert_eq!(form.lineas.len(), 2);
        assert_eq!(form.lineas[1].producto_empresa_id, "pe2");
        assert_eq!(form.accion, AccionFormulario::Guardar);

        let payload = form.payload().unwrap();
        assert_eq!(payload.tipo_comprobante_codigo, 10);
        assert_eq!(payload.fecha, "2025-03-09T00:00:00.000Z");
        assert_eq!(payload.detalles[1].cantidad, 0.5);
        assert_eq!(payload.detalles[0].almacen_destino_id.as_deref(), Some("a1"));
        assert_eq!(payload.detalles[0].almacen_origen_id, None);
    }

    #[test]
    fn line_actions_never_leave_the_form_empty() {
        let mut form = formulario_con(&[("pe1", "1")], "quitar-0");
        assert_eq!(form.accion, AccionFormulario::QuitarLinea(0));
        form.aplicar_accion();
        assert_eq!(form.lineas.len(), 1);

        let mut form = formulario_con(&[("pe1", "1")], "agregar");
        form.aplicar_accion();
        assert_eq!(form.lineas.len(), 2);
        assert_eq!(form.lineas[1], LineaForm::default());

        let mut form = formulario_con(&[("pe1", "1"), ("pe2", "3")], "quitar-0");
        form.aplicar_accion();
        assert_eq!(form.lineas.len(), 1);
        assert_eq!(form.lineas[0].producto_empresa_id, "pe2");
    }

    #[test]
    fn invalid_lines_and_header_are_reported_together() {
        let mut form = formulario_con(&[("", "1"), ("pe2", "0")], "guardar");
        form.numero.clear();
        form.observacion = "x".repeat(501);
        let message = form.payload().unwrap_err();
        assert!(message.contains("El número es obligatorio"), "{message}");
        assert!(message.contains("500 caracteres"), "{message}");
        assert!(message.contains("Línea 1: selecciona un producto"), "{message}");
        assert!(message.contains("Línea 2: la cantidad debe ser al menos 0.01"), "{message}");
    }

    #[test]
    fn quantity_just_above_minimum_is_accepted() {
        let form = formulario_con(&[("pe1", "0.01")], "guardar");
        assert!(form.payload().is_ok());
    }

    #[test]
    fn action_targets_stay_inside_the_section() {
        let propio = AccionForm {
            volver: Some("/comprobantes?estado=2".into()),
        };
        assert_eq!(propio.destino("c1"), "/comprobantes?estado=2");
        let externo = AccionForm {
            volver: Some("https://evil.example/comprobantes".into()),
        };
        assert_eq!(externo.destino("c1"), "/comprobantes/c1");
        assert_eq!(AccionForm { volver: None }.destino("c1"), "/comprobantes/c1");
    }
}
