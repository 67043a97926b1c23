use super::common::{created_response, method_not_allowed, success_response, JsonBody};
use crate::{errors::ServiceError, services::transfers::TransferRequest, AppState};
use axum::{extract::State, response::Response, routing::get, Router};
use tracing::info;

/// Transfer history, oldest first
#[utoipa::path(
    get,
    path = "/api/transfers",
    responses(
        (status = 200, description = "Recorded transfers", body = [crate::models::Transfer]),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "transfers"
)]
pub async fn list_transfers(State(state): State<AppState>) -> Result<Response, ServiceError> {
    let transfers = state.services.transfers.list().await?;
    Ok(success_response(transfers))
}

/// Move stock of one product between two warehouses
#[utoipa::path(
    post,
    path = "/api/transfers",
    request_body = TransferRequest,
    responses(
        (status = 201, description = "Transfer applied and recorded", body = crate::models::Transfer,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "Invalid, unknown or insufficient", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "transfers"
)]
pub async fn create_transfer(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<TransferRequest>,
) -> Result<Response, ServiceError> {
    let transfer = state.services.transfers.transfer(payload).await?;
    info!(transfer_id = transfer.id, "Transfer created");
    Ok(created_response(transfer))
}

pub fn transfer_routes() -> Router<AppState> {
    Router::new().route(
        "/transfers",
        get(list_transfers)
            .post(create_transfer)
            .fallback(method_not_allowed),
    )
}
