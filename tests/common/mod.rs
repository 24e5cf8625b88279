#![allow(dead_code)]

use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex},
};

use axum::{
    Router,
    body::{Body, to_bytes},
    extract::State,
    http::{
        HeaderMap, Method, Request, StatusCode, Uri,
        header::{AUTHORIZATION, CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE},
    },
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tower::ServiceExt; // for oneshot

use vostok::{
    config::Config,
    routes,
    state::{AppState, init_state},
};

pub const PASSWORD: &str = "secreto";
pub const ANA: &str = "ana@vostok.cl";
pub const SIN_PERFIL: &str = "sinperfil@vostok.cl";

/// In-memory stand-in for the auth provider and the inventory REST API.
#[derive(Default)]
pub struct Datos {
    pub cuentas: Vec<(String, String, String)>,
    pub perfiles: Vec<Value>,
    pub empresas: Vec<Value>,
    pub tokens: HashSet<String>,
    pub productos: Vec<Value>,
    pub productos_empresa: Vec<Value>,
    pub categorias: Vec<Value>,
    pub almacenes: Vec<Value>,
    pub movimientos: Vec<Value>,
    pub tipos: Vec<Value>,
    pub comprobantes: Vec<Value>,
    /// Request counter keyed by `"METHOD /path"`.
    pub hits: HashMap<String, usize>,
    /// Canned answers keyed by `"METHOD /path"`, served before anything else.
    pub respuestas: HashMap<String, (StatusCode, String)>,
    pub siguiente_id: usize,
}

pub struct FakeBackend {
    pub datos: Mutex<Datos>,
}

impl FakeBackend {
    pub fn hits(&self, clave: &str) -> usize {
        self.datos
            .lock()
            .unwrap()
            .hits
            .get(clave)
            .copied()
            .unwrap_or(0)
    }

    pub fn responder(&self, clave: &str, status: StatusCode, body: &str) {
        self.datos
            .lock()
            .unwrap()
            .respuestas
            .insert(clave.to_string(), (status, body.to_string()));
    }

    /// Every issued access token stops being accepted.
    pub fn expirar_tokens(&self) {
        self.datos.lock().unwrap().tokens.clear();
    }

    pub fn con<R>(&self, f: impl FnOnce(&mut Datos) -> R) -> R {
        f(&mut self.datos.lock().unwrap())
    }
}

fn seed() -> Datos {
    Datos {
        cuentas: vec![
            (ANA.into(), PASSWORD.into(), "u1".into()),
            (SIN_PERFIL.into(), PASSWORD.into(), "u2".into()),
        ],
        perfiles: vec![json!({
            "Id": "u1", "Nombres": "Ana", "ApellidoPaterno": "Rojas",
            "Correo": ANA, "EmpresaId": "e1"
        })],
        empresas: vec![json!({"Id": "e1", "Nombre": "Vostok SpA", "RutEmpresa": "76.123.456-7"})],
        productos: vec![
            json!({"id": "p1", "nombre": "Agua mineral", "codigoBarra": "780001", "activo": true}),
            json!({"id": "p2", "nombre": "Jugo de naranja", "activo": true}),
            json!({"id": "p3", "nombre": "Café molido", "activo": true}),
        ],
        productos_empresa: vec![
            json!({"id": "pe1", "productoId": "p1", "productoNombre": "Agua mineral",
                   "categoriaId": "c1", "categoriaNombre": "Abarrotes", "sku": "AG-1",
                   "precio": 990.0, "activo": true, "cantidadActual": 0.0, "cantidadReservada": 0.0}),
            json!({"id": "pe2", "productoId": "p2", "productoNombre": "Jugo de naranja",
                   "categoriaId": "c1", "categoriaNombre": "Abarrotes", "sku": "JU-1",
                   "precio": 1490.0, "activo": true, "cantidadActual": 3.0, "cantidadReservada": 5.0}),
            json!({"id": "pe3", "productoId": "p3", "productoNombre": "Café molido",
                   "categoriaId": "c1", "categoriaNombre": "Abarrotes", "sku": "CA-1",
                   "precio": 4990.0, "activo": true, "cantidadActual": 20.0, "cantidadReservada": 2.0}),
        ],
        categorias: vec![json!({
            "Id": "c1", "Nombre": "Abarrotes", "EmpresaId": "e1",
            "CategoriaPadreId": null, "Activo": true
        })],
        almacenes: vec![
            json!({"id": "a1", "empresaId": "e1", "nombre": "Bodega central", "codigo": "BC",
                   "esPrincipal": true, "activo": true, "fechaCreacion": "2026-01-05T10:00:00Z"}),
            json!({"id": "a2", "empresaId": "e1", "nombre": "Sala de ventas", "codigo": "SV",
                   "esPrincipal": false, "activo": true, "fechaCreacion": "2026-02-10T10:00:00Z"}),
        ],
        movimientos: vec![
            json!({"id": "m1", "fechaMovimiento": "2026-03-02T12:00:00Z", "tipoMovimiento": "INGRESO",
                   "direccion": "E", "cantidad": 20.0, "costoUnitario": 3000.0, "valorTotal": 60000.0,
                   "productoNombre": "Café molido", "sku": "CA-1", "almacenId": "a1",
                   "almacenNombre": "Bodega central", "usuarioNombre": "Ana Rojas"}),
            json!({"id": "m2", "fechaMovimiento": "2026-03-03T12:00:00Z", "tipoMovimiento": "SALIDA",
                   "direccion": "S", "cantidad": 2.0, "productoNombre": "Jugo de naranja",
                   "sku": "JU-1", "almacenId": "a2", "almacenNombre": "Sala de ventas",
                   "usuarioNombre": "Ana Rojas"}),
        ],
        tipos: vec![
            json!({"id": "t10", "codigo": 10, "nombre": "Ingreso por compra", "afectaStock": true}),
            json!({"id": "t20", "codigo": 20, "nombre": "Salida por venta", "afectaStock": true}),
            json!({"id": "t40", "codigo": 40, "nombre": "Transferencia", "afectaStock": true}),
        ],
        comprobantes: vec![
            comprobante("v1", "101", 10, 1, None),
            comprobante("v2", "102", 20, 2, None),
            comprobante("v3", "103", 10, 3, None),
            comprobante("v4", "104", 20, 2, Some("v3")),
        ],
        siguiente_id: 100,
        ..Datos::default()
    }
}

pub fn comprobante(id: &str, numero: &str, tipo: i32, estado: i32, relacionado: Option<&str>) -> Value {
    json!({
        "Id": id,
        "Numero": numero,
        "Fecha": "2026-03-10T00:00:00.000Z",
        "TipoComprobanteCodigo": tipo,
        "EstadoComprobanteCodigo": estado,
        "Observacion": format!("Comprobante {numero}"),
        "ComprobanteRelacionadoId": relacionado,
        "Detalles": [{
            "ProductoEmpresaId": "pe3", "Cantidad": 1.0,
            "AlmacenDestinoId": "a1"
        }]
    })
}

fn json_response(status: StatusCode, value: Value) -> Response {
    (status, [(CONTENT_TYPE, "application/json")], value.to_string()).into_response()
}

fn campo<'a>(item: &'a Value, nombres: &[&str]) -> Option<&'a Value> {
    nombres.iter().find_map(|n| item.get(*n))
}

fn posicion(items: &[Value], id: &str) -> Option<usize> {
    items
        .iter()
        .position(|i| campo(i, &["id", "Id"]).and_then(Value::as_str) == Some(id))
}

fn no_encontrado() -> Response {
    json_response(StatusCode::NOT_FOUND, json!({"message": "No encontrado"}))
}

fn mezclar(destino: &mut Value, cambios: Value) {
    if let (Some(destino), Value::Object(cambios)) = (destino.as_object_mut(), cambios) {
        for (k, v) in cambios {
            destino.insert(k, v);
        }
    }
}

async fn handle(
    State(fake): State<Arc<FakeBackend>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> Response {
    let path = uri.path().to_string();
    let clave = format!("{method} {path}");
    let mut datos = fake.datos.lock().unwrap();
    *datos.hits.entry(clave.clone()).or_default() += 1;
    if let Some((status, body)) = datos.respuestas.get(&clave).cloned() {
        return (status, body).into_response();
    }

    let segmentos: Vec<String> = path
        .trim_start_matches('/')
        .split('/')
        .map(str::to_string)
        .collect();
    let segmentos: Vec<&str> = segmentos.iter().map(String::as_str).collect();
    let cuerpo: Value = serde_json::from_str(&body).unwrap_or(Value::Null);

    match segmentos.as_slice() {
        ["auth", "v1", rest @ ..] => auth(&mut datos, &method, rest, &cuerpo),
        ["rest", "v1", tabla] => filas(&datos, &method, tabla, uri.query().unwrap_or_default()),
        ["api", rest @ ..] => {
            let bearer = headers
                .get(AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.strip_prefix("Bearer "))
                .unwrap_or_default();
            if !datos.tokens.contains(bearer) {
                return json_response(
                    StatusCode::UNAUTHORIZED,
                    json!({"message": "Token expirado"}),
                );
            }
            api(&mut datos, &method, rest, cuerpo)
        }
        _ => no_encontrado(),
    }
}

fn auth(datos: &mut Datos, method: &Method, rest: &[&str], cuerpo: &Value) -> Response {
    match (method.as_str(), rest) {
        ("POST", ["token"]) => {
            let email = cuerpo["email"].as_str().unwrap_or_default();
            let password = cuerpo["password"].as_str().unwrap_or_default();
            let Some((correo, _, id)) = datos
                .cuentas
                .iter()
                .find(|(c, p, _)| c == email && p == password)
                .cloned()
            else {
                return json_response(
                    StatusCode::BAD_REQUEST,
                    json!({"error": "invalid_grant", "error_description": "Invalid login credentials"}),
                );
            };
            let token = format!("tok-{id}-{}", datos.tokens.len());
            datos.tokens.insert(token.clone());
            json_response(
                StatusCode::OK,
                json!({"access_token": token, "user": {"id": id, "email": correo}}),
            )
        }
        ("POST", ["logout"]) => StatusCode::NO_CONTENT.into_response(),
        ("POST", ["signup"]) => {
            let email = cuerpo["email"].as_str().unwrap_or_default().to_string();
            if datos.cuentas.iter().any(|(c, _, _)| *c == email) {
                return json_response(
                    StatusCode::UNPROCESSABLE_ENTITY,
                    json!({"msg": "User already registered"}),
                );
            }
            datos.siguiente_id += 1;
            let id = format!("u{}", datos.siguiente_id);
            let password = cuerpo["password"].as_str().unwrap_or_default().to_string();
            datos.cuentas.push((email.clone(), password, id.clone()));
            json_response(StatusCode::OK, json!({"user": {"id": id, "email": email}}))
        }
        _ => no_encontrado(),
    }
}

fn filas(datos: &Datos, method: &Method, tabla: &str, query: &str) -> Response {
    match (method.as_str(), tabla) {
        ("GET", "Usuarios") => {
            let id = query
                .split('&')
                .find_map(|p| p.strip_prefix("Id=eq."))
                .unwrap_or_default();
            let filas: Vec<Value> = datos
                .perfiles
                .iter()
                .filter(|p| p["Id"].as_str() == Some(id))
                .cloned()
                .collect();
            json_response(StatusCode::OK, Value::Array(filas))
        }
        ("POST", "Usuarios") => StatusCode::CREATED.into_response(),
        ("GET", "Empresas") => json_response(StatusCode::OK, Value::Array(datos.empresas.clone())),
        _ => no_encontrado(),
    }
}

fn nuevo_id(datos: &mut Datos, prefijo: &str) -> String {
    datos.siguiente_id += 1;
    format!("{prefijo}{}", datos.siguiente_id)
}

fn api(datos: &mut Datos, method: &Method, rest: &[&str], cuerpo: Value) -> Response {
    match (method.as_str(), rest) {
        ("GET", ["productos"]) => json_response(StatusCode::OK, Value::Array(datos.productos.clone())),
        ("POST", ["productos"]) => {
            let mut item = cuerpo;
            let id = nuevo_id(datos, "p");
            mezclar(&mut item, json!({"id": id, "activo": true}));
            datos.productos.push(item.clone());
            json_response(StatusCode::CREATED, item)
        }
        ("DELETE", ["productos", id]) => quitar(&mut datos.productos, id),

        ("GET", ["productoEmpresa"]) => json_response(
            StatusCode::OK,
            json!({"data": datos.productos_empresa.clone()}),
        ),
        ("DELETE", ["productoEmpresa", id]) => quitar(&mut datos.productos_empresa, id),

        ("GET", ["Categorias"]) => {
            json_response(StatusCode::OK, json!({"data": datos.categorias.clone()}))
        }
        ("POST", ["Categorias"]) => {
            let mut item = cuerpo;
            let id = nuevo_id(datos, "c");
            mezclar(&mut item, json!({"Id": id, "Activo": true}));
            datos.categorias.push(item.clone());
            json_response(StatusCode::CREATED, json!({"data": item}))
        }
        ("GET", ["Categorias", id]) => obtener(&datos.categorias, id),
        ("PUT", ["Categorias", id]) => actualizar(&mut datos.categorias, id, cuerpo),
        ("DELETE", ["Categorias", id]) => quitar(&mut datos.categorias, id),

        ("GET", ["almacenes"]) => json_response(StatusCode::OK, Value::Array(datos.almacenes.clone())),
        ("POST", ["almacenes"]) => {
            let codigo = cuerpo["codigo"].as_str().unwrap_or_default();
            if datos
                .almacenes
                .iter()
                .any(|a| a["codigo"].as_str() == Some(codigo))
            {
                return json_response(
                    StatusCode::CONFLICT,
                    json!({"message": format!("Ya existe un almacén con código {codigo}")}),
                );
            }
            let mut item = cuerpo;
            let id = nuevo_id(datos, "a");
            mezclar(&mut item, json!({"id": id, "activo": true}));
            datos.almacenes.push(item.clone());
            json_response(StatusCode::CREATED, json!({"data": item}))
        }
        ("GET", ["almacenes", id]) => obtener(&datos.almacenes, id),
        ("PUT", ["almacenes", id]) => {
            // Answers without a body, like the real endpoint.
            let Some(i) = posicion(&datos.almacenes, id) else {
                return no_encontrado();
            };
            mezclar(&mut datos.almacenes[i], cuerpo);
            StatusCode::NO_CONTENT.into_response()
        }
        ("DELETE", ["almacenes", id]) => quitar(&mut datos.almacenes, id),

        ("GET", ["movimientosinventario"]) => {
            json_response(StatusCode::OK, Value::Array(datos.movimientos.clone()))
        }
        ("GET", ["movimientosinventario", "producto", _]) => {
            json_response(StatusCode::OK, Value::Array(datos.movimientos[..1].to_vec()))
        }
        ("GET", ["movimientosinventario", "almacen", id]) => {
            let filas: Vec<Value> = datos
                .movimientos
                .iter()
                .filter(|m| m["almacenId"].as_str() == Some(*id))
                .cloned()
                .collect();
            json_response(StatusCode::OK, Value::Array(filas))
        }
        ("GET", ["movimientosinventario", id]) => obtener(&datos.movimientos, id),

        ("GET", ["TipoComprobantes"]) => json_response(StatusCode::OK, Value::Array(datos.tipos.clone())),

        ("GET", ["Comprobantes"]) => {
            json_response(StatusCode::OK, Value::Array(datos.comprobantes.clone()))
        }
        ("POST", ["Comprobantes"]) => {
            let mut item = cuerpo;
            let id = nuevo_id(datos, "v");
            mezclar(&mut item, json!({"Id": id, "EstadoComprobanteCodigo": 1}));
            datos.comprobantes.push(item.clone());
            json_response(StatusCode::CREATED, item)
        }
        ("GET", ["Comprobantes", "numero", numero]) => match datos
            .comprobantes
            .iter()
            .find(|c| c["Numero"].as_str() == Some(*numero))
        {
            Some(c) => json_response(StatusCode::OK, c.clone()),
            None => no_encontrado(),
        },
        ("GET", ["Comprobantes", id]) => obtener(&datos.comprobantes, id),
        ("PUT", ["Comprobantes", id, "confirmar"]) => {
            let Some(i) = posicion(&datos.comprobantes, id) else {
                return no_encontrado();
            };
            datos.comprobantes[i]["EstadoComprobanteCodigo"] = json!(2);
            StatusCode::NO_CONTENT.into_response()
        }
        ("PUT", ["Comprobantes", id, "anular"]) => {
            let Some(i) = posicion(&datos.comprobantes, id) else {
                return no_encontrado();
            };
            datos.comprobantes[i]["EstadoComprobanteCodigo"] = json!(3);
            let numero = datos.comprobantes[i]["Numero"].as_str().unwrap_or_default();
            let contra_numero = format!("{numero}-C");
            let contra_id = nuevo_id(datos, "v");
            let contra = comprobante(&contra_id, &contra_numero, 20, 2, Some(id));
            datos.comprobantes.push(contra);
            StatusCode::NO_CONTENT.into_response()
        }

        _ => no_encontrado(),
    }
}

fn obtener(items: &[Value], id: &str) -> Response {
    match posicion(items, id) {
        Some(i) => json_response(StatusCode::OK, json!({"data": items[i].clone()})),
        None => no_encontrado(),
    }
}

fn actualizar(items: &mut [Value], id: &str, cambios: Value) -> Response {
    match posicion(items, id) {
        Some(i) => {
            mezclar(&mut items[i], cambios);
            StatusCode::NO_CONTENT.into_response()
        }
        None => no_encontrado(),
    }
}

fn quitar(items: &mut Vec<Value>, id: &str) -> Response {
    match posicion(items, id) {
        Some(i) => {
            items.remove(i);
            StatusCode::NO_CONTENT.into_response()
        }
        None => no_encontrado(),
    }
}

pub struct TestApp {
    pub app: Router,
    pub state: Arc<AppState>,
    pub fake: Arc<FakeBackend>,
}

/// Starts the fake backend on an ephemeral port and builds the console
/// router pointed at it.
pub async fn spawn_app() -> TestApp {
    let fake = Arc::new(FakeBackend {
        datos: Mutex::new(seed()),
    });
    let backend = Router::new().fallback(handle).with_state(fake.clone());
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind fake backend");
    let addr = listener.local_addr().expect("fake backend address");
    tokio::spawn(async move {
        axum::serve(listener, backend).await.expect("fake backend");
    });

    let config = Config::for_base_url(&format!("http://{addr}"));
    let state = Arc::new(init_state(config).expect("init state"));
    TestApp {
        app: routes::router(state.clone()),
        state,
        fake,
    }
}

impl TestApp {
    pub async fn get(&self, path: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder().method("GET").uri(path);
        if let Some(cookie) = cookie {
            builder = builder.header(COOKIE, cookie);
        }
        self.app
            .clone()
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    pub async fn post_form(&self, path: &str, cookie: Option<&str>, body: &str) -> Response<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(path)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(COOKIE, cookie);
        }
        self.app
            .clone()
            .oneshot(builder.body(Body::from(body.to_string())).unwrap())
            .await
            .unwrap()
    }

    /// Logs in and returns the `session=...` pair to send back.
    pub async fn login(&self, email: &str) -> String {
        let body = format!("email={}&password={PASSWORD}", email.replace('@', "%40"));
        let resp = self.post_form("/login", None, &body).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER, "login should redirect");
        session_cookie(&resp).expect("login sets the session cookie")
    }

    /// Follows one redirect with the same cookie and returns the page body.
    pub async fn follow(&self, resp: Response<Body>, cookie: &str) -> String {
        let to = location(&resp);
        let page = self.get(&to, Some(cookie)).await;
        assert_eq!(page.status(), StatusCode::OK, "GET {to}");
        body_text(page).await
    }
}

pub fn session_cookie(resp: &Response<Body>) -> Option<String> {
    resp.headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next())
        .find(|pair| pair.starts_with("session=") && pair.len() > "session=".len())
        .map(str::to_string)
}

pub fn location(resp: &Response<Body>) -> String {
    resp.headers()
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

pub async fn body_text(resp: Response<Body>) -> String {
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
