use super::common::{created_response, method_not_allowed, success_response, JsonBody};
use crate::{
    errors::ServiceError,
    services::alerts::{AlertResolution, NewAlert, SweepOutcome},
    AppState,
};
use axum::{
    extract::State,
    response::Response,
    routing::{get, post},
    Router,
};
use tracing::info;

/// All alerts, resolved ones included
#[utoipa::path(
    get,
    path = "/api/alerts",
    responses(
        (status = 200, description = "Alerts", body = [crate::models::AlertItem]),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "alerts"
)]
pub async fn list_alerts(State(state): State<AppState>) -> Result<Response, ServiceError> {
    let alerts = state.services.alerts.list().await?;
    Ok(success_response(alerts))
}

/// Raise an alert by hand
#[utoipa::path(
    post,
    path = "/api/alerts",
    request_body = NewAlert,
    responses(
        (status = 201, description = "Alert created", body = crate::models::AlertItem),
        (status = 400, description = "Missing fields or unknown status", body = crate::errors::ErrorResponse)
    ),
    tag = "alerts"
)]
pub async fn create_alert(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<NewAlert>,
) -> Result<Response, ServiceError> {
    let alert = state.services.alerts.create_manual(payload).await?;
    Ok(created_response(alert))
}

/// Resolve or reopen an alert. `resolved` defaults to true.
#[utoipa::path(
    patch,
    path = "/api/alerts",
    request_body = AlertResolution,
    responses(
        (status = 200, description = "Alert updated", body = crate::models::AlertItem),
        (status = 400, description = "Missing id", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown alert", body = crate::errors::ErrorResponse)
    ),
    tag = "alerts"
)]
pub async fn update_alert(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<AlertResolution>,
) -> Result<Response, ServiceError> {
    let alert = state.services.alerts.apply_resolution(payload).await?;
    Ok(success_response(alert))
}

/// Run a low-stock sweep
#[utoipa::path(
    post,
    path = "/api/checkLowStock",
    responses(
        (status = 200, description = "Sweep finished", body = SweepOutcome),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "alerts"
)]
pub async fn check_low_stock(State(state): State<AppState>) -> Result<Response, ServiceError> {
    let new_alerts = state.services.alerts.sweep().await?;
    let outcome = SweepOutcome::new(new_alerts);
    info!("{}", outcome.message);
    Ok(success_response(outcome))
}

pub fn alert_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/alerts",
            get(list_alerts)
                .post(create_alert)
                .patch(update_alert)
                .fallback(method_not_allowed),
        )
        .route(
            "/checkLowStock",
            post(check_low_stock).fallback(method_not_allowed),
        )
}
