//! Error types for the Auth API service.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use ssobroker_auth_core::AuthError;

/// Error body understood by the front-end applications
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    #[serde(rename = "Error")]
    pub error: String,
    #[serde(rename = "ErrorCode")]
    pub error_code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<&'static str>,
}

/// API error type
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{reason}")]
    Unauthenticated {
        reason: String,
        status: Option<&'static str>,
    },

    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl ApiError {
    /// Rejection for a caller without an authenticated, unexpired session
    pub fn unauthenticated(reason: impl Into<String>) -> Self {
        Self::Unauthenticated {
            reason: reason.into(),
            status: Some("Unauthenticated"),
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
            Self::Auth(e) => StatusCode::from_u16(e.status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        }
    }

    fn status_phrase(&self) -> Option<&'static str> {
        match self {
            Self::Unauthenticated { status, .. } => *status,
            Self::Auth(AuthError::NotAuthenticated(_)) => Some("Unauthenticated"),
            _ => None,
        }
    }

    fn is_internal(&self) -> bool {
        match self {
            Self::Auth(e) => e.is_internal(),
            Self::Unauthenticated { .. } => false,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Internal details stay in the log
        let reason = if self.is_internal() {
            tracing::error!(error = ?self, "Internal API error");
            "Internal Server Error".to_string()
        } else {
            tracing::debug!(error = %self, "Request rejected");
            self.to_string()
        };

        let body = ErrorResponse {
            error: reason,
            error_code: status.as_u16(),
            status: self.status_phrase(),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
