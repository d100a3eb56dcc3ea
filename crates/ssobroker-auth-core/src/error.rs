//! Auth errors

use thiserror::Error;

/// Credential and token errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Missing or malformed configuration (secret, lifetime, generator)
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Token lifetime of the wrong type
    #[error("invalid token lifetime: {0}")]
    InvalidLifetime(String),

    /// Expiration value that cannot be interpreted
    #[error("invalid expiration: {0}")]
    InvalidExpiration(String),

    /// Operation requires an authenticated identity
    #[error("not authenticated: {0}")]
    NotAuthenticated(String),

    /// Token could not be signed
    #[error("token encoding failed: {0}")]
    TokenEncoding(String),

    /// Invalid token (malformed, bad signature, etc.)
    #[error("invalid token")]
    InvalidToken,

    /// Token has expired
    #[error("token expired")]
    TokenExpired,

    /// Credential could not be serialized
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl AuthError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotAuthenticated(_) | Self::InvalidToken | Self::TokenExpired => 401,
            Self::InvalidExpiration(_) | Self::InvalidLifetime(_) => 400,
            Self::Configuration(_) | Self::TokenEncoding(_) | Self::Serialization(_) => 500,
        }
    }

    /// Get error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::InvalidLifetime(_) => "INVALID_LIFETIME",
            Self::InvalidExpiration(_) => "INVALID_EXPIRATION",
            Self::NotAuthenticated(_) => "NOT_AUTHENTICATED",
            Self::TokenEncoding(_) => "TOKEN_ENCODING_ERROR",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Whether the error reflects a broken deployment rather than bad input
    pub fn is_internal(&self) -> bool {
        self.status_code() >= 500
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(err: serde_json::Error) -> Self {
        tracing::error!("Credential serialization error: {}", err);
        Self::Serialization(err.to_string())
    }
}
