use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::catalog_api::CatalogApiError;
use crate::domain::aggregates::{CatalogError, OrderError};
use crate::store::StoreError;

/// Error body shared by every route: `{"statusCode": 404, "statusMessage": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    pub status_code: u16,
    pub status_message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status_code: status.as_u16(), status_message: message.into() }
    }

    pub fn bad_request(message: impl Into<String>) -> Self { Self::new(StatusCode::BAD_REQUEST, message) }
    pub fn unauthorized() -> Self { Self::new(StatusCode::UNAUTHORIZED, "Unauthorized") }
    pub fn not_found(message: impl Into<String>) -> Self { Self::new(StatusCode::NOT_FOUND, message) }
    pub fn conflict(message: impl Into<String>) -> Self { Self::new(StatusCode::CONFLICT, message) }
    pub fn method_not_allowed() -> Self { Self::new(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed") }
    pub fn internal(message: impl Into<String>) -> Self { Self::new(StatusCode::INTERNAL_SERVER_ERROR, message) }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => Self::not_found("Not found"),
            StoreError::UniqueViolation(message) => Self::conflict(message),
            StoreError::Backend(message) => {
                tracing::error!(error = %message, "backend query failed");
                Self::internal(message)
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self { Self::bad_request(err.to_string()) }
}

impl From<OrderError> for ApiError {
    fn from(err: OrderError) -> Self { Self::bad_request(err.to_string()) }
}

/// Upstream catalog failures surface as a 500 with a route-specific message.
pub(super) fn upstream(message: &'static str) -> impl FnOnce(CatalogApiError) -> ApiError {
    move |err| {
        tracing::error!(error = %err, "catalog API request failed");
        ApiError::internal(message)
    }
}

pub(super) async fn method_not_allowed() -> ApiError {
    ApiError::method_not_allowed()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_violation_maps_to_conflict() {
        let err: ApiError = StoreError::UniqueViolation("dup".into()).into();
        assert_eq!(err.status_code, 409);
        assert_eq!(err.into_response().status(), StatusCode::CONFLICT);
    }

    #[test]
    fn body_uses_camel_case_keys() {
        let body = serde_json::to_value(ApiError::unauthorized()).unwrap();
        assert_eq!(body, serde_json::json!({"statusCode": 401, "statusMessage": "Unauthorized"}));
    }
}
