use super::common::{created_response, method_not_allowed, success_response, JsonBody, RecordId};
use crate::{errors::ServiceError, services::catalog::ProductInput, AppState};
use axum::{extract::State, response::Response, routing::get, Router};

/// List products
#[utoipa::path(
    get,
    path = "/api/products",
    responses(
        (status = 200, description = "All products", body = [crate::models::Product]),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub async fn list_products(State(state): State<AppState>) -> Result<Response, ServiceError> {
    let products = state.services.products.list().await?;
    Ok(success_response(products))
}

/// Get a product by id
#[utoipa::path(
    get,
    path = "/api/products/{id}",
    params(("id" = i64, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product found", body = crate::models::Product),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    RecordId(id): RecordId,
) -> Result<Response, ServiceError> {
    let product = state.services.products.get(id).await?;
    Ok(success_response(product))
}

/// Create a product
#[utoipa::path(
    post,
    path = "/api/products",
    request_body = ProductInput,
    responses(
        (status = 201, description = "Product created", body = crate::models::Product),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub async fn create_product(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<ProductInput>,
) -> Result<Response, ServiceError> {
    let product = state.services.products.create(payload).await?;
    Ok(created_response(product))
}

/// Replace a product's fields
#[utoipa::path(
    put,
    path = "/api/products/{id}",
    params(("id" = i64, Path, description = "Product id")),
    request_body = ProductInput,
    responses(
        (status = 200, description = "Product updated", body = crate::models::Product),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub async fn update_product(
    State(state): State<AppState>,
    RecordId(id): RecordId,
    JsonBody(payload): JsonBody<ProductInput>,
) -> Result<Response, ServiceError> {
    let product = state.services.products.update(id, payload).await?;
    Ok(success_response(product))
}

/// Delete a product and its stock rows
#[utoipa::path(
    delete,
    path = "/api/products/{id}",
    params(("id" = i64, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product deleted", body = crate::models::Product),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub async fn delete_product(
    State(state): State<AppState>,
    RecordId(id): RecordId,
) -> Result<Response, ServiceError> {
    let product = state.services.products.delete(id).await?;
    Ok(success_response(product))
}

pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/products",
            get(list_products)
                .post(create_product)
                .fallback(method_not_allowed),
        )
        .route(
            "/products/:id",
            get(get_product)
                .put(update_product)
                .delete(delete_product)
                .fallback(method_not_allowed),
        )
}
