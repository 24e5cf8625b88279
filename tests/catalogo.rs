#[path = "common/mod.rs"]
mod common;

use axum::http::StatusCode;

use common::{ANA, body_text, location, spawn_app};

#[tokio::test]
async fn dashboard_counts_and_buckets_stock() {
    let t = spawn_app().await;
    let cookie = t.login(ANA).await;

    let html = body_text(t.get("/dashboard", Some(&cookie)).await).await;
    assert!(html.contains(r#"id="total-productos">3<"#));
    assert!(html.contains(r#"id="total-categorias">1<"#));
    assert!(html.contains(r#"id="sin-stock">1<"#));
    assert!(html.contains(r#"id="stock-bajo">1<"#));
    assert!(html.contains(r#"id="saludable">1<"#));
    // Alerts list the two products that need attention.
    assert!(html.contains("AG-1"));
    assert!(html.contains("JU-1"));
    assert!(html.contains("Café molido"));
}

#[tokio::test]
async fn lists_are_cached_until_a_write() {
    let t = spawn_app().await;
    let cookie = t.login(ANA).await;

    let resp = t.get("/categorias", Some(&cookie)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_text(resp).await.contains("Abarrotes"));
    t.get("/categorias", Some(&cookie)).await;
    assert_eq!(t.fake.hits("GET /api/Categorias"), 1);

    let resp = t
        .post_form("/categorias", Some(&cookie), "nombre=+Bebidas+&categoria_padre_id=")
        .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/categorias");

    let html = t.follow(resp, &cookie).await;
    assert!(html.contains("Bebidas"));
    assert!(html.contains("creada"));
    assert_eq!(t.fake.hits("GET /api/Categorias"), 2);

    t.fake.con(|d| {
        let creada = d.categorias.last().unwrap();
        assert_eq!(creada["Nombre"], "Bebidas");
        assert!(creada["CategoriaPadreId"].is_null());
        assert_eq!(creada["EmpresaId"], "e1");
    });

    // The notice is shown once.
    let html = body_text(t.get("/categorias", Some(&cookie)).await).await;
    assert!(!html.contains("creada"));
}

#[tokio::test]
async fn invalid_category_is_not_sent() {
    let t = spawn_app().await;
    let cookie = t.login(ANA).await;

    let resp = t
        .post_form("/categorias", Some(&cookie), "nombre=+++&categoria_padre_id=c1")
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_text(resp).await.contains("El nombre es obligatorio"));
    assert_eq!(t.fake.hits("POST /api/Categorias"), 0);
}

#[tokio::test]
async fn category_filter_matches_name() {
    let t = spawn_app().await;
    let cookie = t.login(ANA).await;

    let html = body_text(t.get("/categorias?q=abarr", Some(&cookie)).await).await;
    assert!(html.contains("Abarrotes"));
    let html = body_text(t.get("/categorias?q=lacteos", Some(&cookie)).await).await;
    assert!(html.contains("No hay categorías para mostrar"));
}

#[tokio::test]
async fn remote_error_message_is_shown_on_the_form() {
    let t = spawn_app().await;
    let cookie = t.login(ANA).await;

    let resp = t
        .post_form("/almacenes", Some(&cookie), "nombre=Otra+bodega&codigo=BC&descripcion=")
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let html = body_text(resp).await;
    assert!(html.contains("Ya existe un almacén con código BC"));
    assert!(html.contains("Otra bodega"));
}

#[tokio::test]
async fn unreadable_error_body_falls_back_to_generic_message() {
    let t = spawn_app().await;
    let cookie = t.login(ANA).await;
    t.fake.responder(
        "POST /api/almacenes",
        StatusCode::BAD_GATEWAY,
        "<html>Bad gateway</html>",
    );

    let resp = t
        .post_form("/almacenes", Some(&cookie), "nombre=Patio&codigo=PT")
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let html = body_text(resp).await;
    assert!(html.contains("Error al crear el almacén"));
    assert!(!html.contains("Bad gateway"));
}

#[tokio::test]
async fn warehouse_update_without_body_uses_submitted_values() {
    let t = spawn_app().await;
    let cookie = t.login(ANA).await;

    let resp = t.get("/almacenes/a2/edit", Some(&cookie)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_text(resp).await.contains("Sala de ventas"));

    let resp = t
        .post_form(
            "/almacenes/a2/update",
            Some(&cookie),
            "nombre=Sala+norte&codigo=SV&descripcion=Piso+1&activo=on",
        )
        .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    let html = t.follow(resp, &cookie).await;
    assert!(html.contains("Sala norte"));
    assert!(html.contains("actualizado"));

    t.fake.con(|d| {
        let a2 = d.almacenes.iter().find(|a| a["id"] == "a2").unwrap();
        assert_eq!(a2["descripcion"], "Piso 1");
        assert_eq!(a2["esPrincipal"], false);
    });
}

#[tokio::test]
async fn missing_warehouse_redirects_with_notice() {
    let t = spawn_app().await;
    let cookie = t.login(ANA).await;

    let resp = t.get("/almacenes/zz/edit", Some(&cookie)).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/almacenes");
    let html = t.follow(resp, &cookie).await;
    assert!(html.contains("No encontrado"));
}

#[tokio::test]
async fn company_catalog_shows_stock_levels() {
    let t = spawn_app().await;
    let cookie = t.login(ANA).await;

    let html = body_text(t.get("/productos-empresa", Some(&cookie)).await).await;
    assert!(html.contains(r#"class="nivel sin-stock""#));
    assert!(html.contains(r#"class="nivel bajo""#));
    assert!(html.contains(r#"class="nivel saludable""#));
    assert!(html.contains("$ 4990.00"));

    let resp = t.get("/productos-empresa/nada/edit", Some(&cookie)).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn company_product_form_rejects_bad_price() {
    let t = spawn_app().await;
    let cookie = t.login(ANA).await;

    let resp = t
        .post_form(
            "/productos-empresa",
            Some(&cookie),
            "producto_id=p1&categoria_id=c1&sku=AG-2&precio=gratis",
        )
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let html = body_text(resp).await;
    assert!(html.contains("El precio debe ser un número mayor o igual a 0"));
    assert!(html.contains("AG-2"));
}

#[tokio::test]
async fn deleting_a_product_refreshes_both_catalogs() {
    let t = spawn_app().await;
    let cookie = t.login(ANA).await;

    t.get("/productos", Some(&cookie)).await;
    t.get("/productos-empresa", Some(&cookie)).await;

    let resp = t.post_form("/productos/p2/delete", Some(&cookie), "").await;
    assert_eq!(location(&resp), "/productos");
    let html = t.follow(resp, &cookie).await;
    assert!(html.contains("Producto eliminado"));
    assert!(!html.contains("Jugo de naranja"));

    t.get("/productos-empresa", Some(&cookie)).await;
    assert_eq!(t.fake.hits("GET /api/productos"), 2);
    assert_eq!(t.fake.hits("GET /api/productoEmpresa"), 2);
}

#[tokio::test]
async fn movements_filter_by_type_and_warehouse() {
    let t = spawn_app().await;
    let cookie = t.login(ANA).await;

    let html = body_text(t.get("/movimientos?tipo=SALIDA", Some(&cookie)).await).await;
    assert!(html.contains("JU-1"));
    assert!(!html.contains("CA-1"));

    let html = body_text(t.get("/movimientos/almacen/a1", Some(&cookie)).await).await;
    assert!(html.contains("Movimientos del almacén"));
    assert!(html.contains("CA-1"));
    assert!(!html.contains("JU-1"));

    let resp = t.get("/movimientos/m1", Some(&cookie)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_text(resp).await.contains("$ 60000.00"));

    let resp = t.get("/movimientos/zz", Some(&cookie)).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
