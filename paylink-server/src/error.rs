//! API error types

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use paylink_core::FieldErrors;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    #[error("Search query must be at least {min} characters")]
    QueryTooShort { min: usize },

    #[error("Payment not found")]
    PaymentNotFound,

    #[error("Client not found")]
    ClientNotFound,

    #[error("Link not found")]
    LinkNotFound,

    /// Verification failure; never says which check failed
    #[error("Link not found or expired")]
    LinkNotFoundOrExpired,

    #[error("Generated link token already exists")]
    TokenCollision,

    #[error("Generated reference id already exists")]
    ReferenceCollision,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<paylink_core::Error> for ApiError {
    fn from(err: paylink_core::Error) -> Self {
        match err {
            paylink_core::Error::Validation(errors) => ApiError::Validation(errors),
            paylink_core::Error::InvalidStatus(s) => ApiError::InvalidStatus(s),
            paylink_core::Error::QueryTooShort { min } => ApiError::QueryTooShort { min },
            paylink_core::Error::InvalidToken => ApiError::LinkNotFoundOrExpired,
        }
    }
}

impl ApiError {
    /// A request part that could not be decoded at all, reported under `part`
    fn undecodable(part: &str, detail: String) -> Self {
        let mut errors = FieldErrors::new();
        errors.add(part, detail);
        ApiError::Validation(errors)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::undecodable("body", rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::undecodable("path", rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::undecodable("query", rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Validation(errors) => {
                let body = json!({
                    "success": false,
                    "reason": "Validation failed",
                    "errors": errors,
                });
                return (StatusCode::BAD_REQUEST, axum::Json(body)).into_response();
            }
            ApiError::InvalidStatus(_) => (
                StatusCode::BAD_REQUEST,
                "Invalid status. Must be one of: pending, verified, rejected",
            ),
            ApiError::QueryTooShort { .. } => (
                StatusCode::BAD_REQUEST,
                "Search query must be at least 3 characters",
            ),
            ApiError::PaymentNotFound => (StatusCode::NOT_FOUND, "Payment not found"),
            ApiError::ClientNotFound => (StatusCode::NOT_FOUND, "Client not found"),
            ApiError::LinkNotFound => (StatusCode::NOT_FOUND, "Link not found"),
            ApiError::LinkNotFoundOrExpired => {
                (StatusCode::NOT_FOUND, "Link not found or expired")
            }
            ApiError::TokenCollision => {
                tracing::warn!("Link token collision");
                (StatusCode::CONFLICT, "Could not create link, please retry")
            }
            ApiError::ReferenceCollision => {
                tracing::warn!("Payment reference collision");
                (StatusCode::CONFLICT, "Could not register payment, please retry")
            }
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        let body = json!({ "success": false, "reason": message });
        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let cases = [
            (ApiError::Validation(FieldErrors::new()), StatusCode::BAD_REQUEST),
            (ApiError::InvalidStatus("x".into()), StatusCode::BAD_REQUEST),
            (ApiError::QueryTooShort { min: 3 }, StatusCode::BAD_REQUEST),
            (ApiError::PaymentNotFound, StatusCode::NOT_FOUND),
            (ApiError::LinkNotFoundOrExpired, StatusCode::NOT_FOUND),
            (ApiError::TokenCollision, StatusCode::CONFLICT),
            (ApiError::Internal("disk I/O error".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn test_malformed_token_reads_as_not_found() {
        let err: ApiError = paylink_core::Error::InvalidToken.into();
        assert!(matches!(err, ApiError::LinkNotFoundOrExpired));
    }
}
