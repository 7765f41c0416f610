//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::OrderError;
use order_store::StoreError;

/// API-level error type that maps to HTTP responses.
///
/// Status selection is variant dispatch on the typed store error, not
/// inspection of rendered messages.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request from the client (malformed body, mismatched id).
    BadRequest(String),
    /// Error propagated from the order store.
    Store(StoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Store(err) => store_error_to_response(err),
        };

        if status.is_client_error() {
            tracing::warn!(%status, error = %message, "request failed");
        }

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn store_error_to_response(err: StoreError) -> (StatusCode, String) {
    match &err {
        StoreError::OrderNotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        StoreError::InvalidPagination { .. } | StoreError::InvalidOrder(_) => {
            (StatusCode::BAD_REQUEST, err.to_string())
        }
        StoreError::Conflict(_) | StoreError::Database(_) | StoreError::Migration(_) => {
            tracing::error!(error = %err, "store operation failed");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Store(err)
    }
}

impl From<OrderError> for ApiError {
    fn from(err: OrderError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::OrderId;

    #[test]
    fn not_found_maps_to_404() {
        let resp = ApiError::Store(StoreError::OrderNotFound(OrderId::new(1))).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn invalid_pagination_maps_to_400() {
        let resp =
            ApiError::Store(StoreError::InvalidPagination { skip: -1, count: 10 }).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn conflict_maps_to_500() {
        let resp = ApiError::Store(StoreError::Conflict("boom".to_string())).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn domain_validation_maps_to_400() {
        let err: ApiError = OrderError::InvalidQuantity { quantity: 0 }.into();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
