use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{error, warn};

/// Errors surfaced by the HTTP layer
#[derive(Debug)]
pub enum ApiError {
    InvalidInput(String),
    NotFound(String),
    Unavailable(String),
    InternalError(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Unavailable(msg) => write!(f, "Service unavailable: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<shared::Error> for ApiError {
    fn from(err: shared::Error) -> Self {
        match err {
            shared::Error::UnknownNetwork(_) | shared::Error::InvalidWalletAddress(_) => {
                ApiError::InvalidInput(err.to_string())
            }
            shared::Error::WalletNotFound(_) => ApiError::NotFound(err.to_string()),
            shared::Error::Cancelled => ApiError::Unavailable(err.to_string()),
            other => ApiError::InternalError(other.to_string()),
        }
    }
}

/// Error response structure for API responses
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub timestamp: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            ApiError::InvalidInput(msg) => {
                warn!("Invalid input: {}", msg);
                (StatusCode::BAD_REQUEST, "invalid_input", msg.clone())
            }
            ApiError::NotFound(msg) => {
                warn!("Resource not found: {}", msg);
                (StatusCode::NOT_FOUND, "not_found", msg.clone())
            }
            ApiError::Unavailable(msg) => {
                warn!("Service unavailable: {}", msg);
                (StatusCode::SERVICE_UNAVAILABLE, "unavailable", msg.clone())
            }
            ApiError::InternalError(msg) => {
                error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg.clone())
            }
        };

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message,
            timestamp: chrono::Utc::now().to_rfc3339(),
        });

        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ApiError::NotFound("wallet 0xabc".to_string());
        assert_eq!(err.to_string(), "Not found: wallet 0xabc");
    }

    #[test]
    fn test_shared_error_mapping() {
        let cases = [
            (shared::Error::UnknownNetwork("solana".into()), StatusCode::BAD_REQUEST),
            (shared::Error::WalletNotFound("0xabc".into()), StatusCode::NOT_FOUND),
            (shared::Error::Catalog("unreadable".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (shared::Error::Cancelled, StatusCode::SERVICE_UNAVAILABLE),
        ];

        for (err, expected) in cases {
            let response = ApiError::from(err).into_response();
            assert_eq!(response.status(), expected);
        }
    }
}
