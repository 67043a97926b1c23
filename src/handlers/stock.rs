use super::common::{created_response, method_not_allowed, success_response, JsonBody, RecordId};
use crate::{
    errors::ServiceError,
    services::ledger::{NewStockItem, StockFilter, StockQuantityUpdate},
    AppState,
};
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    response::Response,
    routing::get,
    Router,
};

/// List stock rows, optionally for one product or warehouse
#[utoipa::path(
    get,
    path = "/api/stock",
    params(StockFilter),
    responses(
        (status = 200, description = "Stock rows", body = [crate::models::StockItem],
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "Invalid filter", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "stock"
)]
pub async fn list_stock(
    State(state): State<AppState>,
    query: Result<Query<StockFilter>, QueryRejection>,
) -> Result<Response, ServiceError> {
    let Query(filter) = query.map_err(|rejection| ServiceError::ValidationError(rejection.body_text()))?;
    let rows = state.services.stock.list(&filter).await?;
    Ok(success_response(rows))
}

/// Get one stock row
#[utoipa::path(
    get,
    path = "/api/stock/{id}",
    params(("id" = i64, Path, description = "Stock row id")),
    responses(
        (status = 200, description = "Stock row found", body = crate::models::StockItem),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "stock"
)]
pub async fn get_stock(
    State(state): State<AppState>,
    RecordId(id): RecordId,
) -> Result<Response, ServiceError> {
    let row = state.services.stock.get(id).await?;
    Ok(success_response(row))
}

/// Record stock for a product in a warehouse. Posting an existing pair adds to
/// its quantity.
#[utoipa::path(
    post,
    path = "/api/stock",
    request_body = NewStockItem,
    responses(
        (status = 201, description = "Stock row created or merged", body = crate::models::StockItem),
        (status = 400, description = "Invalid request or unknown product/warehouse", body = crate::errors::ErrorResponse)
    ),
    tag = "stock"
)]
pub async fn create_stock(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<NewStockItem>,
) -> Result<Response, ServiceError> {
    let row = state.services.stock.create(payload).await?;
    Ok(created_response(row))
}

#[utoipa::path(
    put,
    path = "/api/stock/{id}",
    params(("id" = i64, Path, description = "Stock row id")),
    request_body = StockQuantityUpdate,
    responses(
        (status = 200, description = "Quantity updated", body = crate::models::StockItem),
        (status = 400, description = "Invalid quantity", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "stock"
)]
pub async fn update_stock(
    State(state): State<AppState>,
    RecordId(id): RecordId,
    JsonBody(payload): JsonBody<StockQuantityUpdate>,
) -> Result<Response, ServiceError> {
    let row = state.services.stock.set_quantity(id, payload).await?;
    Ok(success_response(row))
}

#[utoipa::path(
    delete,
    path = "/api/stock/{id}",
    params(("id" = i64, Path, description = "Stock row id")),
    responses(
        (status = 200, description = "Stock row removed", body = crate::models::StockItem),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "stock"
)]
pub async fn delete_stock(
    State(state): State<AppState>,
    RecordId(id): RecordId,
) -> Result<Response, ServiceError> {
    let row = state.services.stock.delete(id).await?;
    Ok(success_response(row))
}

pub fn stock_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/stock",
            get(list_stock)
                .post(create_stock)
                .fallback(method_not_allowed),
        )
        .route(
            "/stock/:id",
            get(get_stock)
                .put(update_stock)
                .delete(delete_stock)
                .fallback(method_not_allowed),
        )
}
