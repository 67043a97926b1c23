use crate::common::parse_record_id;
use crate::errors::ServiceError;
use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Path, Request},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{de::DeserializeOwned, Serialize};

/// Standard success response
pub fn success_response<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(data)).into_response()
}

/// Standard created response
pub fn created_response<T: Serialize>(data: T) -> Response {
    (StatusCode::CREATED, Json(data)).into_response()
}

/// JSON body whose rejections render as a 400 validation error in the common
/// error shape.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => Err(ServiceError::ValidationError(rejection.body_text())),
        }
    }
}

/// `{id}` path segment parsed as a record id. Accepts anything a number parser
/// does, so `/stock/7` and `/stock/7.0` address the same row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordId(pub i64);

#[async_trait]
impl<S> FromRequestParts<S> for RecordId
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ServiceError::ValidationError(rejection.body_text()))?;
        parse_record_id(&raw)
            .map(RecordId)
            .ok_or_else(|| ServiceError::MissingField(format!("id ({})", raw)))
    }
}

/// Fallback for methods a route does not serve.
pub async fn method_not_allowed() -> ServiceError {
    ServiceError::MethodNotAllowed
}

/// Fallback for unknown paths.
pub async fn route_not_found() -> ServiceError {
    ServiceError::NotFound("Route not found".into())
}
