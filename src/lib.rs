//! Stockpile API Library
//!
//! Inventory dashboard backend: products, warehouses, per-warehouse stock,
//! inter-warehouse transfers and low-stock alerts, persisted as flat JSON
//! collections.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod common;
pub mod config;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod health;
pub mod middleware_helpers;
pub mod models;
pub mod openapi;
pub mod services;
pub mod store;
pub mod tracing;

use axum::{response::Json, routing::get, Router};
use chrono::Utc;
use http::HeaderValue;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
};

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<store::RecordStore>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub services: handlers::AppServices,
}

impl AppState {
    pub fn new(
        store: Arc<store::RecordStore>,
        config: config::AppConfig,
        event_sender: events::EventSender,
    ) -> Self {
        let services = handlers::AppServices::new(store.clone(), event_sender.clone(), &config);
        Self {
            store,
            config,
            event_sender,
            services,
        }
    }
}

async fn api_status() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// Every resource route, mounted under `/api`.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/status", get(api_status))
        .merge(handlers::products::product_routes())
        .merge(handlers::warehouses::warehouse_routes())
        .merge(handlers::stock::stock_routes())
        .merge(handlers::transfers::transfer_routes())
        .merge(handlers::alerts::alert_routes())
        .merge(handlers::dashboard::dashboard_routes())
}

/// CORS from config: explicit origins win, then the permissive fallback, else
/// cross-origin requests are refused.
pub fn cors_layer(cfg: &config::AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = cfg
        .cors_origins()
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    if !origins.is_empty() {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    } else if cfg.should_allow_permissive_cors() {
        ::tracing::info!(
            "Using permissive CORS because explicit origins were not configured ({})",
            if cfg.is_development() {
                "development environment"
            } else {
                "explicit override enabled"
            }
        );
        CorsLayer::permissive()
    } else {
        ::tracing::error!("Missing CORS configuration detected; set APP__CORS_ALLOWED_ORIGINS or APP__CORS_ALLOW_ANY_ORIGIN=true");
        CorsLayer::new()
    }
}

/// Full application router: API, health, Swagger UI and the HTTP layers.
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);
    let max_body_size = state.config.max_body_size;

    Router::<AppState>::new()
        .route("/", get(|| async { "stockpile-api up" }))
        .nest("/api", api_routes())
        .nest("/health", health::health_routes())
        .merge(openapi::swagger_ui())
        .fallback(handlers::common::route_not_found)
        // HTTP tracing layer for consistent request/response telemetry
        .layer(crate::tracing::configure_http_tracing())
        .layer(CompressionLayer::new())
        .layer(RequestBodyLimitLayer::new(max_body_size))
        .layer(cors)
        // Ensure every request carries a request id for traceability
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id::request_id_middleware,
        ))
        .with_state(state)
}
