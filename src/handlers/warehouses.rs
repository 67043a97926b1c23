use super::common::{created_response, method_not_allowed, success_response, JsonBody, RecordId};
use crate::{errors::ServiceError, services::catalog::WarehouseInput, AppState};
use axum::{extract::State, response::Response, routing::get, Router};

/// List warehouses
#[utoipa::path(
    get,
    path = "/api/warehouses",
    responses(
        (status = 200, description = "All warehouses", body = [crate::models::Warehouse]),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "warehouses"
)]
pub async fn list_warehouses(State(state): State<AppState>) -> Result<Response, ServiceError> {
    let warehouses = state.services.warehouses.list().await?;
    Ok(success_response(warehouses))
}

#[utoipa::path(
    get,
    path = "/api/warehouses/{id}",
    params(("id" = i64, Path, description = "Warehouse id")),
    responses(
        (status = 200, description = "Warehouse found", body = crate::models::Warehouse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "warehouses"
)]
pub async fn get_warehouse(
    State(state): State<AppState>,
    RecordId(id): RecordId,
) -> Result<Response, ServiceError> {
    let warehouse = state.services.warehouses.get(id).await?;
    Ok(success_response(warehouse))
}

#[utoipa::path(
    post,
    path = "/api/warehouses",
    request_body = WarehouseInput,
    responses(
        (status = 201, description = "Warehouse created", body = crate::models::Warehouse),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse)
    ),
    tag = "warehouses"
)]
pub async fn create_warehouse(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<WarehouseInput>,
) -> Result<Response, ServiceError> {
    let warehouse = state.services.warehouses.create(payload).await?;
    Ok(created_response(warehouse))
}

#[utoipa::path(
    put,
    path = "/api/warehouses/{id}",
    params(("id" = i64, Path, description = "Warehouse id")),
    request_body = WarehouseInput,
    responses(
        (status = 200, description = "Warehouse updated", body = crate::models::Warehouse),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "warehouses"
)]
pub async fn update_warehouse(
    State(state): State<AppState>,
    RecordId(id): RecordId,
    JsonBody(payload): JsonBody<WarehouseInput>,
) -> Result<Response, ServiceError> {
    let warehouse = state.services.warehouses.update(id, payload).await?;
    Ok(success_response(warehouse))
}

/// Delete an empty warehouse
#[utoipa::path(
    delete,
    path = "/api/warehouses/{id}",
    params(("id" = i64, Path, description = "Warehouse id")),
    responses(
        (status = 200, description = "Warehouse deleted", body = crate::models::Warehouse),
        (status = 400, description = "Warehouse still holds stock", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "warehouses"
)]
pub async fn delete_warehouse(
    State(state): State<AppState>,
    RecordId(id): RecordId,
) -> Result<Response, ServiceError> {
    let warehouse = state.services.warehouses.delete(id).await?;
    Ok(success_response(warehouse))
}

pub fn warehouse_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/warehouses",
            get(list_warehouses)
                .post(create_warehouse)
                .fallback(method_not_allowed),
        )
        .route(
            "/warehouses/:id",
            get(get_warehouse)
                .put(update_warehouse)
                .delete(delete_warehouse)
                .fallback(method_not_allowed),
        )
}
