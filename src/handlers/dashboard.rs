use super::common::{method_not_allowed, success_response};
use crate::{errors::ServiceError, AppState};
use axum::{extract::State, response::Response, routing::get, Router};

#[utoipa::path(
    get,
    path = "/api/dashboard/overview",
    responses(
        (status = 200, description = "Headline counts and stock health", body = crate::services::dashboard::Overview),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "dashboard"
)]
pub async fn overview(State(state): State<AppState>) -> Result<Response, ServiceError> {
    Ok(success_response(state.services.dashboard.overview().await?))
}

/// Units held per warehouse
#[utoipa::path(
    get,
    path = "/api/dashboard/warehouses",
    responses(
        (status = 200, description = "One entry per warehouse", body = [crate::services::dashboard::WarehouseStock]),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "dashboard"
)]
pub async fn warehouse_chart(State(state): State<AppState>) -> Result<Response, ServiceError> {
    Ok(success_response(
        state.services.dashboard.warehouse_chart().await?,
    ))
}

/// Stock rows below their reorder point, lowest first
#[utoipa::path(
    get,
    path = "/api/dashboard/low-stock",
    responses(
        (status = 200, description = "Low stock lines", body = [crate::services::dashboard::LowStockLine]),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "dashboard"
)]
pub async fn low_stock(State(state): State<AppState>) -> Result<Response, ServiceError> {
    Ok(success_response(state.services.dashboard.low_stock().await?))
}

pub fn dashboard_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/dashboard/overview",
            get(overview).fallback(method_not_allowed),
        )
        .route(
            "/dashboard/warehouses",
            get(warehouse_chart).fallback(method_not_allowed),
        )
        .route(
            "/dashboard/low-stock",
            get(low_stock).fallback(method_not_allowed),
        )
}
