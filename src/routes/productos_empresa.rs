// routes/productos_empresa.rs
// Company catalog: list with stock level, create/edit form pages, delete.

use std::sync::Arc;

use askama::Template;
use axum::{
    extract::{Form, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use validator::Validate;

use super::helpers::{
    Layout, SimpleOption, fallo_remoto, formato_cantidad, formato_precio, layout,
    mensajes_validacion, redirect_con_aviso, render_response, sesion_expirada,
};
use crate::{
    filters::FiltroTexto,
    models::{ActualizarProductoEmpresa, CrearProductoEmpresa, ProductoEmpresa},
    session::SessionUser,
    state::{
        AppState, ApiError, Aviso, NivelStock, claves, create_producto_empresa,
        delete_producto_empresa, list_categorias, list_productos, list_productos_empresa,
        update_producto_empresa,
    },
};

const LISTA: &str = "/productos-empresa";

#[derive(Template)]
#[template(path = "productos_empresa/index.html")]
struct ProductosEmpresaTemplate {
    layout: Layout,
    productos: Vec<ProductoEmpresaRow>,
    q: String,
    errors: Option<String>,
}

struct ProductoEmpresaRow {
    id: String,
    producto: String,
    sku: String,
    categoria: String,
    precio: String,
    actual: String,
    reservada: String,
    nivel: &'static str,
    nivel_nombre: &'static str,
}

impl From<ProductoEmpresa> for ProductoEmpresaRow {
    fn from(p: ProductoEmpresa) -> Self {
        let (nivel, nivel_nombre) = match NivelStock::de(&p) {
            NivelStock::SinStock => ("sin-stock", "Sin stock"),
            NivelStock::Bajo => ("bajo", "Stock bajo"),
            NivelStock::Saludable => ("saludable", "Saludable"),
        };
        Self {
            id: p.id,
            producto: p.producto_nombre,
            sku: p.sku,
            categoria: p.categoria_nombre,
            precio: formato_precio(p.precio),
            actual: formato_cantidad(p.cantidad_actual),
            reservada: formato_cantidad(p.cantidad_reservada),
            nivel,
            nivel_nombre,
        }
    }
}

#[derive(Template)]
#[template(path = "productos_empresa/form.html")]
struct ProductoEmpresaFormTemplate {
    layout: Layout,
    action: String,
    is_edit: bool,
    producto_nombre: String,
    productos: Vec<SimpleOption>,
    categorias: Vec<SimpleOption>,
    sku: String,
    precio: String,
    errors: Option<String>,
}

#[derive(Deserialize)]
pub struct ProductoEmpresaForm {
    #[serde(default)]
    producto_id: String,
    #[serde(default)]
    categoria_id: String,
    #[serde(default)]
    sku: String,
    #[serde(default)]
    precio: String,
}

#[derive(Validate)]
struct ProductoEmpresaDatos {
    #[validate(length(min = 1, message = "Selecciona una categoría"))]
    categoria_id: String,
    #[validate(length(min = 1, max = 50, message = "El SKU es obligatorio (máximo 50 caracteres)"))]
    sku: String,
    #[validate(range(min = 0.0, message = "El precio debe ser un número mayor o igual a 0"))]
    precio: f64,
}

impl ProductoEmpresaForm {
    /// Unparsable prices become negative so that validation rejects them.
    fn datos(&self) -> ProductoEmpresaDatos {
        ProductoEmpresaDatos {
            categoria_id: self.categoria_id.trim().to_string(),
            sku: self.sku.trim().to_string(),
            precio: self
                .precio
                .trim()
                .replace(',', ".")
                .parse::<f64>()
                .ok()
                .filter(|p| p.is_finite())
                .unwrap_or(-1.0),
        }
    }
}

async fn catalogo(
    state: &AppState,
    session_user: &SessionUser,
) -> Result<Arc<Vec<ProductoEmpresa>>, ApiError> {
    state
        .cache
        .get_or_load(session_user.empresa_id(), claves::PRODUCTOS_EMPRESA, || {
            list_productos_empresa(state, session_user.access_token())
        })
        .await
}

struct Valores {
    producto_id: String,
    producto_nombre: String,
    categoria_id: String,
    sku: String,
    precio: String,
}

async fn formulario(
    state: &AppState,
    session_user: &SessionUser,
    action: String,
    is_edit: bool,
    valores: Valores,
    errors: Option<String>,
) -> Response {
    let empresa = session_user.empresa_id();
    let token = session_user.access_token();
    let (productos, categorias) = tokio::join!(
        state
            .cache
            .get_or_load(empresa, claves::PRODUCTOS, || list_productos(state, token)),
        state.cache.get_or_load(empresa, claves::CATEGORIAS, || {
            list_categorias(state, token, empresa)
        }),
    );

    let mut errors = errors;
    let productos = match productos {
        Ok(items) => items
            .iter()
            .filter(|p| p.activo)
            .map(|p| SimpleOption::new(p.id.clone(), p.nombre.clone(), &valores.producto_id))
            .collect(),
        Err(err) => {
            errors.get_or_insert(err.user_message());
            Vec::new()
        }
    };
    let categorias = match categorias {
        Ok(items) => items
            .iter()
            .map(|c| SimpleOption::new(c.id.clone(), c.nombre.clone(), &valores.categoria_id))
            .collect(),
        Err(err) => {
            errors.get_or_insert(err.user_message());
            Vec::new()
        }
    };

    render_response(ProductoEmpresaFormTemplate {
        layout: layout(state, session_user, "productos-empresa").await,
        action,
        is_edit,
        producto_nombre: valores.producto_nombre,
        productos,
        categorias,
        sku: valores.sku,
        precio: valores.precio,
        errors,
    })
}

pub async fn productos_empresa_index(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Query(filtro): Query<FiltroTexto>,
) -> Response {
    let (productos, errors) = match catalogo(&state, &session_user).await {
        Ok(items) => (items, None),
        Err(err) if err.is_unauthorized() => return sesion_expirada(&state, &session_user).await,
        Err(err) => (Arc::new(Vec::new()), Some(err.user_message())),
    };
    let filas = filtro
        .productos_empresa(productos.as_ref().clone())
        .into_iter()
        .map(ProductoEmpresaRow::from)
        .collect();

    render_response(ProductosEmpresaTemplate {
        layout: layout(&state, &session_user, "productos-empresa").await,
        productos: filas,
        q: filtro.q.unwrap_or_default(),
        errors,
    })
}

pub async fn productos_empresa_new(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
) -> Response {
    formulario(
        &state,
        &session_user,
        LISTA.to_string(),
        false,
        Valores {
            producto_id: String::new(),
            producto_nombre: String::new(),
            categoria_id: String::new(),
            sku: String::new(),
            precio: "0".to_string(),
        },
        None,
    )
    .await
}

pub async fn productos_empresa_create(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Form(form): Form<ProductoEmpresaForm>,
) -> Response {
    let datos = form.datos();
    let producto_id = form.producto_id.trim().to_string();
    let valores = Valores {
        producto_id: producto_id.clone(),
        producto_nombre: String::new(),
        categoria_id: datos.categoria_id.clone(),
        sku: datos.sku.clone(),
        precio: form.precio.trim().to_string(),
    };

    let mut fallos = Vec::new();
    if producto_id.is_empty() {
        fallos.push("Selecciona un producto".to_string());
    }
    if let Err(errors) = datos.validate() {
        fallos.push(mensajes_validacion(&errors));
    }
    if !fallos.is_empty() {
        let message = fallos.join(". ");
        return formulario(&state, &session_user, LISTA.to_string(), false, valores, Some(message))
            .await;
    }

    let payload = CrearProductoEmpresa {
        producto_id,
        categoria_id: datos.categoria_id,
        sku: datos.sku,
        precio: datos.precio,
    };
    match create_producto_empresa(&state, session_user.access_token(), &payload).await {
        Ok(()) => {
            state
                .cache
                .invalidate(session_user.empresa_id(), &[claves::PRODUCTOS_EMPRESA])
                .await;
            redirect_con_aviso(
                &state,
                &session_user,
                LISTA,
                Aviso::exito("Producto agregado al catálogo de la empresa"),
            )
            .await
        }
        Err(err) if err.is_unauthorized() => sesion_expirada(&state, &session_user).await,
        Err(err) => {
            formulario(
                &state,
                &session_user,
                LISTA.to_string(),
                false,
                valores,
                Some(err.user_message()),
            )
            .await
        }
    }
}

pub async fn productos_empresa_edit(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    let productos = match catalogo(&state, &session_user).await {
        Ok(items) => items,
        Err(err) => return fallo_remoto(&state, &session_user, LISTA, err).await,
    };
    let Some(producto) = productos.iter().find(|p| p.id == id) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    formulario(
        &state,
        &session_user,
        format!("{LISTA}/{id}/update"),
        true,
        Valores {
            producto_id: producto.producto_id.clone(),
            producto_nombre: producto.producto_nombre.clone(),
            categoria_id: producto.categoria_id.clone(),
            sku: producto.sku.clone(),
            precio: producto.precio.to_string(),
        },
        None,
    )
    .await
}

pub async fn productos_empresa_update(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Form(form): Form<ProductoEmpresaForm>,
) -> Response {
    let actual = catalogo(&state, &session_user)
        .await
        .ok()
        .and_then(|items| items.iter().find(|p| p.id == id).cloned());
    let (producto_id, producto_nombre) = actual
        .map(|p| (p.producto_id, p.producto_nombre))
        .unwrap_or_default();

    // The product itself cannot change on edit; only its company data.
    let datos = form.datos();
    let action = format!("{LISTA}/{id}/update");
    let valores = Valores {
        producto_id,
        producto_nombre,
        categoria_id: datos.categoria_id.clone(),
        sku: datos.sku.clone(),
        precio: form.precio.trim().to_string(),
    };
    if let Err(errors) = datos.validate() {
        let message = mensajes_validacion(&errors);
        return formulario(&state, &session_user, action, true, valores, Some(message)).await;
    }

    let payload = ActualizarProductoEmpresa {
        id: id.clone(),
        categoria_id: datos.categoria_id,
        sku: datos.sku,
        precio: datos.precio,
    };
    match update_producto_empresa(&state, session_user.access_token(), &payload).await {
        Ok(()) => {
            state
                .cache
                .invalidate(session_user.empresa_id(), &[claves::PRODUCTOS_EMPRESA])
                .await;
            redirect_con_aviso(
                &state,
                &session_user,
                LISTA,
                Aviso::exito("Producto actualizado"),
            )
            .await
        }
        Err(err) if err.is_unauthorized() => sesion_expirada(&state, &session_user).await,
        Err(err) => {
            formulario(&state, &session_user, action, true, valores, Some(err.user_message()))
                .await
        }
    }
}

pub async fn productos_empresa_delete(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    match delete_producto_empresa(&state, session_user.access_token(), &id).await {
        Ok(()) => {
            state
                .cache
                .invalidate(session_user.empresa_id(), &[claves::PRODUCTOS_EMPRESA])
                .await;
            redirect_con_aviso(
                &state,
                &session_user,
                LISTA,
                Aviso::exito("Producto eliminado del catálogo"),
            )
            .await
        }
        Err(err) => fallo_remoto(&state, &session_user, LISTA, err).await,
    }
}
