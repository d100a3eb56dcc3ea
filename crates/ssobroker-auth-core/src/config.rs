//! Configuration types for the broker core

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::AuthError;

/// Default token lifetime in seconds (1 hour)
pub const DEFAULT_TOKEN_LIFETIME: u64 = 3600;

fn default_lifetime() -> u64 {
    DEFAULT_TOKEN_LIFETIME
}

/// Token generator configuration
#[derive(Clone, Deserialize)]
pub struct TokenConfig {
    /// HS256 signing secret, shared with the services that accept the tokens
    pub secret: String,
    /// Default lifetime of generated tokens in seconds
    #[serde(default = "default_lifetime")]
    pub lifetime: u64,
}

impl TokenConfig {
    /// Create a new token config with the default lifetime
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            lifetime: DEFAULT_TOKEN_LIFETIME,
        }
    }

    /// Set the default token lifetime
    pub fn with_lifetime(mut self, lifetime: u64) -> Self {
        self.lifetime = lifetime;
        self
    }

    /// Parse an untyped configuration block such as the `jwt` section of a
    /// JSON config file.
    ///
    /// # Errors
    /// Returns [`AuthError::Configuration`] if the block is not an object, the
    /// secret is missing or empty, or the lifetime is not an integer.
    pub fn from_value(value: &Value) -> Result<Self, AuthError> {
        let obj = match value {
            Value::Object(obj) => obj,
            Value::Null => return Err(missing_secret()),
            _ => {
                return Err(AuthError::Configuration(
                    "token generator config is not an object".to_string(),
                ))
            }
        };

        let secret = match obj.get("secret") {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            _ => return Err(missing_secret()),
        };

        let lifetime = match obj.get("lifetime") {
            None | Some(Value::Null) => DEFAULT_TOKEN_LIFETIME,
            Some(v) => v.as_u64().ok_or_else(|| {
                AuthError::Configuration("wrong type for parameter: lifetime: not an int".to_string())
            })?,
        };

        Ok(Self { secret, lifetime })
    }

    /// Check the invariants that typed construction cannot express
    pub fn validate(&self) -> Result<(), AuthError> {
        if self.secret.is_empty() {
            return Err(missing_secret());
        }
        Ok(())
    }
}

fn missing_secret() -> AuthError {
    AuthError::Configuration("missing or empty parameter: secret".to_string())
}

impl fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenConfig")
            .field("lifetime", &self.lifetime)
            .finish_non_exhaustive()
    }
}

/// Identity substituted for real logins when the provider is bypassed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestUserConfig {
    pub id: Option<String>,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub email: Option<String>,
    pub ou: Option<String>,
    pub display_name: Option<String>,
    pub role: Option<String>,
}

impl TestUserConfig {
    pub fn id(&self) -> &str {
        self.id.as_deref().unwrap_or("testuser")
    }

    pub fn given_name(&self) -> &str {
        self.given_name.as_deref().unwrap_or("Test")
    }

    pub fn family_name(&self) -> &str {
        self.family_name.as_deref().unwrap_or("User")
    }

    pub fn email(&self) -> &str {
        self.email.as_deref().unwrap_or("test.user@example.com")
    }

    pub fn ou(&self) -> &str {
        self.ou.as_deref().unwrap_or("unknown")
    }

    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or("TestUser")
    }

    pub fn role(&self) -> &str {
        self.role.as_deref().unwrap_or("not-set")
    }
}

/// Deployment switch that replaces provider logins with a static identity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginBypassConfig {
    /// Whether the bypass is active
    #[serde(default)]
    pub engaged: bool,
    /// The identity to report while engaged
    #[serde(default)]
    pub testuser: TestUserConfig,
}

impl LoginBypassConfig {
    /// An engaged bypass for the given test identity
    pub fn engaged(testuser: TestUserConfig) -> Self {
        Self {
            engaged: true,
            testuser,
        }
    }
}

/// Built-in identity provider attribute profiles
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProfileName {
    /// ADFS-fronted institutional IdP
    NistAdfs,
    /// Okta-fronted institutional IdP
    #[default]
    NistOkta,
}

impl fmt::Display for ProfileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NistAdfs => write!(f, "nist-adfs"),
            Self::NistOkta => write!(f, "nist-okta"),
        }
    }
}

impl FromStr for ProfileName {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nist-adfs" | "adfs" => Ok(Self::NistAdfs),
            "nist-okta" | "okta" => Ok(Self::NistOkta),
            other => Err(AuthError::Configuration(format!(
                "unknown attribute profile: {other}"
            ))),
        }
    }
}
