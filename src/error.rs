//! Error types for the freightparse service.
//!
//! One enum covers the whole per-request failure taxonomy. Every variant is
//! terminal: nothing is retried internally, and no partial record is ever
//! returned alongside an error. Each variant carries a fixed HTTP status and
//! renders on the wire as `{"detail": "<message>"}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

/// All errors a request handler can surface to the caller.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Neither a valid proxy secret nor a known direct API key was presented.
    #[error("Invalid API key")]
    Unauthorized,

    /// The caller exhausted its sliding-window request budget.
    #[error("Rate limit exceeded. Max {limit} requests per {window_secs}s.")]
    RateLimited { limit: usize, window_secs: u64 },

    /// Malformed request body, out-of-bounds text length, an unreadable or
    /// image-only PDF, or a model reply that does not fit the target schema.
    #[error("{0}")]
    Validation(String),

    /// Upload content type outside the supported set.
    #[error("Unsupported file type: {content_type}. Supported: PDF, PNG, JPEG, WebP, GIF, plain text.")]
    UnsupportedMediaType { content_type: String },

    /// Upload exceeds the 10 MB ceiling. Raised before any parsing attempt.
    #[error("File too large. Max 10 MB.")]
    PayloadTooLarge,

    /// The model backend is not configured (missing credential).
    #[error("{0}")]
    BackendUnavailable(String),

    /// The model call failed, or its reply yielded no recoverable JSON.
    #[error("{0}")]
    Backend(String),
}

impl ApiError {
    /// HTTP status for this error class.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::UnsupportedMediaType { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::BackendUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Backend(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(serde_json::json!({ "detail": self.to_string() }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(ApiError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::RateLimited { limit: 60, window_secs: 60 }.status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            ApiError::Validation("bad".into()).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::UnsupportedMediaType { content_type: "application/zip".into() }.status(),
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        );
        assert_eq!(ApiError::PayloadTooLarge.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(
            ApiError::BackendUnavailable("no key".into()).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(ApiError::Backend("boom".into()).status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn rate_limit_message_names_ceiling_and_window() {
        let e = ApiError::RateLimited { limit: 60, window_secs: 60 };
        let msg = e.to_string();
        assert!(msg.contains("60 requests"), "got: {msg}");
        assert!(msg.contains("60s"), "got: {msg}");
    }

    #[test]
    fn unsupported_type_names_allowed_set() {
        let e = ApiError::UnsupportedMediaType { content_type: "application/zip".into() };
        let msg = e.to_string();
        assert!(msg.contains("application/zip"));
        assert!(msg.contains("PDF"));
    }
}
