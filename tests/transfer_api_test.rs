mod common;

use axum::http::{Method, StatusCode};
use common::TestApp;
use serde_json::json;

struct Fixture {
    app: TestApp,
    product: i64,
    w1: i64,
    w2: i64,
}

/// One product (reorder point 10) with 3 units in W1 and 4 in W2.
async fn fixture() -> Fixture {
    let app = TestApp::new().await;
    let product = app.seed_product("Widget", 10).await.id;
    let w1 = app.seed_warehouse("W1").await.id;
    let w2 = app.seed_warehouse("W2").await.id;
    app.seed_stock(product, w1, 3).await;
    app.seed_stock(product, w2, 4).await;
    Fixture {
        app,
        product,
        w1,
        w2,
    }
}

#[tokio::test]
async fn valid_transfer_moves_stock_and_is_recorded() {
    let f = fixture().await;

    let (status, body) = f
        .app
        .call(
            Method::POST,
            "/api/transfers",
            Some(json!({
                "productId": f.product,
                "fromWarehouseId": f.w1,
                "toWarehouseId": f.w2,
                "quantity": 2
            })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], 1);
    assert_eq!(body["quantity"], 2);
    assert_eq!(body["fromWarehouseId"], f.w1);
    assert!(body["date"].is_string());

    assert_eq!(f.app.quantity(f.product, f.w1).await, 1);
    assert_eq!(f.app.quantity(f.product, f.w2).await, 6);

    let (status, history) = f.app.call(Method::GET, "/api/transfers", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn numeric_strings_are_accepted() {
    let f = fixture().await;

    let (status, body) = f
        .app
        .call(
            Method::POST,
            "/api/transfers",
            Some(json!({
                "productId": f.product.to_string(),
                "fromWarehouseId": f.w2.to_string(),
                "toWarehouseId": f.w1.to_string(),
                "quantity": "4"
            })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["quantity"], 4);
    assert_eq!(f.app.quantity(f.product, f.w2).await, 0);
    assert_eq!(f.app.quantity(f.product, f.w1).await, 7);
}

#[tokio::test]
async fn insufficient_stock_is_rejected_and_nothing_changes() {
    let f = fixture().await;

    let (status, body) = f
        .app
        .call(
            Method::POST,
            "/api/transfers",
            Some(json!({
                "productId": f.product,
                "fromWarehouseId": f.w1,
                "toWarehouseId": f.w2,
                "quantity": 5
            })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "ConflictError");
    assert_eq!(
        body["message"],
        "Insufficient stock in source warehouse (available 3, requested 5)"
    );
    assert!(body["requestId"].is_string());
    assert!(body["timestamp"].is_string());

    assert_eq!(f.app.quantity(f.product, f.w1).await, 3);
    assert_eq!(f.app.quantity(f.product, f.w2).await, 4);
    let (_, history) = f.app.call(Method::GET, "/api/transfers", None).await;
    assert_eq!(history, json!([]));
}

#[tokio::test]
async fn same_warehouse_is_a_validation_error() {
    let f = fixture().await;

    let (status, body) = f
        .app
        .call(
            Method::POST,
            "/api/transfers",
            Some(json!({
                "productId": f.product,
                "fromWarehouseId": f.w1,
                "toWarehouseId": f.w1,
                "quantity": 1
            })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "ValidationError");
    assert_eq!(body["message"], "Source and destination must differ");
}

#[tokio::test]
async fn non_positive_or_fractional_quantities_are_invalid() {
    let f = fixture().await;

    for quantity in [json!(0), json!(-2), json!(1.5), json!("abc")] {
        let (status, body) = f
            .app
            .call(
                Method::POST,
                "/api/transfers",
                Some(json!({
                    "productId": f.product,
                    "fromWarehouseId": f.w1,
                    "toWarehouseId": f.w2,
                    "quantity": quantity
                })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Quantity must be greater than 0");
    }
    assert_eq!(f.app.quantity(f.product, f.w1).await, 3);
}

#[tokio::test]
async fn missing_fields_are_listed() {
    let f = fixture().await;

    let (status, body) = f
        .app
        .call(
            Method::POST,
            "/api/transfers",
            Some(json!({ "productId": f.product })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "ValidationError");
    assert_eq!(
        body["message"],
        "Missing or invalid fields: fromWarehouseId, toWarehouseId, quantity"
    );
}

#[tokio::test]
async fn unknown_references_are_reference_errors() {
    let f = fixture().await;

    let cases = [
        (json!({"productId": 99, "fromWarehouseId": f.w1, "toWarehouseId": f.w2, "quantity": 1}),
         "Product 99 not found"),
        (json!({"productId": f.product, "fromWarehouseId": 99, "toWarehouseId": f.w2, "quantity": 1}),
         "Source warehouse 99 not found"),
        (json!({"productId": f.product, "fromWarehouseId": f.w1, "toWarehouseId": 99, "quantity": 1}),
         "Destination warehouse 99 not found"),
    ];

    for (payload, message) in cases {
        let (status, body) = f.app.call(Method::POST, "/api/transfers", Some(payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "ReferenceError");
        assert_eq!(body["message"], message);
    }
}

#[tokio::test]
async fn transfer_into_empty_warehouse_creates_the_row() {
    let f = fixture().await;
    let w3 = f.app.seed_warehouse("W3").await.id;

    let (status, _) = f
        .app
        .call(
            Method::POST,
            "/api/transfers",
            Some(json!({
                "productId": f.product,
                "fromWarehouseId": f.w2,
                "toWarehouseId": w3,
                "quantity": 4
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, rows) = f
        .app
        .call(Method::GET, &format!("/api/stock?warehouseId={}", w3), None)
        .await;
    assert_eq!(rows.as_array().map(Vec::len), Some(1));
    assert_eq!(rows[0]["quantity"], 4);
    // The emptied source row stays, at zero.
    assert_eq!(f.app.quantity(f.product, f.w2).await, 0);
}

#[tokio::test]
async fn malformed_json_is_rejected_with_error_body() {
    let f = fixture().await;

    let response = f
        .app
        .request(Method::POST, "/api/transfers", None)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = common::response_json(response).await;
    assert_eq!(body["error"], "ValidationError");
}

#[tokio::test]
async fn request_id_is_echoed() {
    let f = fixture().await;
    let request = axum::http::Request::builder()
        .method(Method::GET)
        .uri("/api/transfers")
        .header("x-request-id", "trace-me-42")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = tower::ServiceExt::oneshot(stockpile_api::build_router(f.app.state.clone()), request)
        .await
        .unwrap();
    assert_eq!(
        response.headers().get("x-request-id").unwrap(),
        "trace-me-42"
    );
}
