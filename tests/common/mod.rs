#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use rust_decimal::Decimal;
use serde_json::Value;
use stockpile_api::{
    config::AppConfig,
    events::{self, EventSender},
    models::{Product, StockItem, Warehouse},
    services::{
        catalog::{ProductInput, WarehouseInput},
        ledger::NewStockItem,
    },
    store::RecordStore,
    AppState,
};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

/// Helper harness running the full router over a throwaway data directory.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub data_dir: TempDir,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    pub async fn new() -> Self {
        let data_dir = tempfile::tempdir().expect("failed to create temp data dir");

        let mut cfg = AppConfig::new(
            data_dir.path(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.cors_allow_any_origin = true;

        let store = Arc::new(
            RecordStore::open(data_dir.path())
                .await
                .expect("failed to open test store"),
        );

        let (event_sender, event_rx) = EventSender::channel(256);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let state = AppState::new(store, cfg, event_sender);
        let router = stockpile_api::build_router(state.clone());

        Self {
            router,
            state,
            data_dir,
            _event_task: event_task,
        }
    }

    /// Send a request against the router, with a JSON body when given.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Sends a request and returns the status with the decoded JSON body
    /// (`Value::Null` for an empty body).
    pub async fn call(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let response = self.request(method, uri, body).await;
        let status = response.status();
        (status, response_json(response).await)
    }

    pub async fn seed_product(&self, name: &str, reorder_point: i64) -> Product {
        self.state
            .services
            .products
            .create(ProductInput {
                sku: format!("SKU-{}", name.to_uppercase().replace(' ', "-")),
                name: name.to_string(),
                category: "Test".to_string(),
                unit_cost: Decimal::ONE,
                reorder_point: Some(reorder_point as f64),
            })
            .await
            .expect("seed product for tests")
    }

    pub async fn seed_warehouse(&self, code: &str) -> Warehouse {
        self.state
            .services
            .warehouses
            .create(WarehouseInput {
                code: code.to_string(),
                name: format!("Warehouse {}", code),
                location: "Test".to_string(),
            })
            .await
            .expect("seed warehouse for tests")
    }

    pub async fn seed_stock(&self, product_id: i64, warehouse_id: i64, quantity: i64) -> StockItem {
        self.state
            .services
            .stock
            .create(NewStockItem {
                product_id: Some(product_id as f64),
                warehouse_id: Some(warehouse_id as f64),
                quantity: Some(quantity as f64),
            })
            .await
            .expect("seed stock for tests")
    }

    /// Current quantity of a pair, read straight from the store.
    pub async fn quantity(&self, product_id: i64, warehouse_id: i64) -> i64 {
        self.state
            .services
            .stock
            .quantity(product_id, warehouse_id)
            .await
            .expect("read stock quantity")
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
    }
}

pub async fn response_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("response body is not JSON")
    }
}
