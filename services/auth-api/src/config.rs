//! Configuration for the Auth API service.

use std::time::Duration;

use ssobroker_auth_core::{AuthError, LoginBypassConfig, ProfileName, TestUserConfig, TokenConfig};

/// Auth API configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub http_port: u16,

    /// Token signing configuration
    pub token: TokenConfig,

    /// Attribute profile of the identity provider
    pub profile: ProfileName,

    /// Base URLs of the front-end applications allowed to use the service
    pub allowed_service_endpoints: Vec<String>,

    /// Name of the cookie carrying the session id
    pub session_cookie_name: String,

    /// How long an idle session is kept
    pub session_ttl: Duration,

    /// Request timeout
    pub request_timeout: Duration,

    /// Static test identity replacing provider logins
    pub login_bypass: LoginBypassConfig,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source
    pub fn from_lookup<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Server
        let http_port = var("HTTP_PORT")
            .unwrap_or_else(|| "8080".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("HTTP_PORT"))?;

        // Token signing
        let secret = var("JWT_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let lifetime: u64 = match var("JWT_LIFETIME") {
            Some(v) => v.parse().map_err(|_| ConfigError::Invalid("JWT_LIFETIME"))?,
            None => ssobroker_auth_core::DEFAULT_TOKEN_LIFETIME,
        };

        let token = TokenConfig::new(secret).with_lifetime(lifetime);
        token.validate()?;

        // Identity provider
        let profile = match var("IDP_PROFILE") {
            Some(v) => v.parse().map_err(|_| ConfigError::Invalid("IDP_PROFILE"))?,
            None => ProfileName::default(),
        };

        let allowed_service_endpoints = var("ALLOWED_SERVICE_ENDPOINTS")
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        // Sessions
        let session_cookie_name =
            var("SESSION_COOKIE_NAME").unwrap_or_else(|| "ssobroker_session".to_string());

        let session_ttl_secs: u64 = var("SESSION_TTL_SECS")
            .unwrap_or_else(|| "28800".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("SESSION_TTL_SECS"))?;

        // Request timeout (default 30 seconds)
        let request_timeout_secs: u64 = var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|| "30".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("REQUEST_TIMEOUT_SECS"))?;

        // Login bypass
        let engaged = match var("DISABLE_SAML_LOGIN") {
            Some(v) => parse_flag(&v).ok_or(ConfigError::Invalid("DISABLE_SAML_LOGIN"))?,
            None => false,
        };
        let login_bypass = LoginBypassConfig {
            engaged,
            testuser: TestUserConfig {
                id: var("TEST_USER_ID"),
                given_name: var("TEST_USER_GIVEN_NAME"),
                family_name: var("TEST_USER_FAMILY_NAME"),
                email: var("TEST_USER_EMAIL"),
                ou: var("TEST_USER_OU"),
                display_name: var("TEST_USER_DISPLAY_NAME"),
                role: var("TEST_USER_ROLE"),
            },
        };

        Ok(Self {
            http_port,
            token,
            profile,
            allowed_service_endpoints,
            session_cookie_name,
            session_ttl: Duration::from_secs(session_ttl_secs),
            request_timeout: Duration::from_secs(request_timeout_secs),
            login_bypass,
        })
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),

    #[error("Auth config error: {0}")]
    Auth(#[from] AuthError),
}
