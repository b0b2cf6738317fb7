//! Error types for the HTTP layer
//!
//! Every failure leaves the service as a JSON envelope
//! `{"error", "details", "field"?}`.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::auth::AuthError;
use crate::generation::{ImageError, ProviderError};
use crate::ratelimit::{RateDecision, RETRY_AFTER_SECS};

pub const MINUTE_REMAINING_HEADER: &str = "x-ratelimit-minute-remaining";
pub const HOUR_REMAINING_HEADER: &str = "x-ratelimit-hour-remaining";

// == API Error Enum ==
#[derive(Error, Debug)]
pub enum ApiError {
    /// Request body or parameter failed validation
    #[error("Validation error: {message}")]
    Validation {
        field: Option<&'static str>,
        message: String,
    },

    /// Missing, malformed or expired credentials
    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Rate limit exceeded")]
    RateLimited(RateDecision),

    #[error("Invalid host header")]
    UntrustedHost,

    /// Text generation failed upstream
    #[error("Content generation failed: {0}")]
    Generation(String),

    #[error("Image generation failed: {0}")]
    ImageGeneration(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub details: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<&'static str>,
}

impl ApiError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        ApiError::Validation {
            field: Some(field),
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation { .. } | ApiError::UntrustedHost => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Generation(_) | ApiError::ImageGeneration(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn body(&self) -> ErrorBody {
        let (error, details, field) = match self {
            ApiError::Validation { field, message } => {
                ("Validation error".to_string(), message.clone(), *field)
            }
            ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg) => (msg.clone(), msg.clone(), None),
            ApiError::RateLimited(_) => (
                "Rate limit exceeded".to_string(),
                format!("Too many requests, retry after {RETRY_AFTER_SECS} seconds"),
                None,
            ),
            ApiError::UntrustedHost => (
                "Invalid host header".to_string(),
                "Host is not in the trusted host list".to_string(),
                None,
            ),
            ApiError::Generation(details) => {
                ("Content generation failed".to_string(), details.clone(), None)
            }
            ApiError::ImageGeneration(details) => {
                ("Image generation failed".to_string(), details.clone(), None)
            }
            ApiError::Internal(details) => {
                ("Internal Server Error".to_string(), details.clone(), None)
            }
        };
        ErrorBody {
            error,
            details,
            field,
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response = (self.status(), Json(self.body())).into_response();
        let headers = response.headers_mut();

        match &self {
            ApiError::Unauthorized(_) => {
                headers.insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
            }
            ApiError::RateLimited(decision) => {
                headers.insert(header::RETRY_AFTER, HeaderValue::from(RETRY_AFTER_SECS));
                headers.insert(
                    MINUTE_REMAINING_HEADER,
                    HeaderValue::from(decision.minute_remaining),
                );
                headers.insert(HOUR_REMAINING_HEADER, HeaderValue::from(decision.hour_remaining));
            }
            _ => {}
        }

        response
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials | AuthError::InvalidToken | AuthError::TokenExpired => {
                ApiError::Unauthorized(err.to_string())
            }
            AuthError::UserExists(_) => ApiError::Conflict(err.to_string()),
            AuthError::UserNotFound(_) => ApiError::NotFound(err.to_string()),
            AuthError::Inactive | AuthError::AdminRequired => ApiError::Forbidden(err.to_string()),
            AuthError::Hashing(_) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<ProviderError> for ApiError {
    fn from(err: ProviderError) -> Self {
        ApiError::Generation(err.to_string())
    }
}

impl From<ImageError> for ApiError {
    fn from(err: ImageError) -> Self {
        ApiError::ImageGeneration(err.to_string())
    }
}

// == Result Type Alias ==
pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::Value;

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_validation_envelope_has_field() {
        let response = ApiError::validation("topic", "too short").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["error"], "Validation error");
        assert_eq!(body["details"], "too short");
        assert_eq!(body["field"], "topic");
    }

    #[tokio::test]
    async fn test_unauthorized_sets_www_authenticate() {
        let response = ApiError::from(AuthError::TokenExpired).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Bearer");

        let body = body_json(response).await;
        assert!(body.get("field").is_none());
    }

    #[test]
    fn test_rate_limited_headers() {
        let response = ApiError::RateLimited(RateDecision {
            allowed: false,
            minute_remaining: 0,
            hour_remaining: 940,
        })
        .into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "60");
        assert_eq!(response.headers()[MINUTE_REMAINING_HEADER], "0");
        assert_eq!(response.headers()[HOUR_REMAINING_HEADER], "940");
    }

    #[test]
    fn test_auth_error_mapping() {
        assert_eq!(
            ApiError::from(AuthError::UserExists("bob".into())).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(AuthError::UserNotFound("bob".into())).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(ApiError::from(AuthError::Inactive).status(), StatusCode::FORBIDDEN);
        assert_eq!(
            ApiError::from(AuthError::AdminRequired).status(),
            StatusCode::FORBIDDEN
        );
    }

    #[tokio::test]
    async fn test_provider_error_envelope() {
        let response = ApiError::from(ProviderError::Timeout {
            provider: "DeepSeek",
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["error"], "Content generation failed");
        assert_eq!(body["details"], "request to DeepSeek timed out");
    }
}
