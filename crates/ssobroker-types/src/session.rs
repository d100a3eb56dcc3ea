//! Session state shared with the protocol handler
//!
//! The protocol handler owns the session store and writes this state after
//! validating the identity provider's assertion. The broker core only reads it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::RawClaims;

/// Recorded end of the provider session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SessionExpiration {
    /// Epoch time in seconds
    Epoch(f64),
    /// ISO-8601 date-time string (parsed on use)
    Iso(String),
}

impl From<f64> for SessionExpiration {
    fn from(epoch: f64) -> Self {
        Self::Epoch(epoch)
    }
}

impl From<&str> for SessionExpiration {
    fn from(iso: &str) -> Self {
        Self::Iso(iso.to_string())
    }
}

impl From<String> for SessionExpiration {
    fn from(iso: String) -> Self {
        Self::Iso(iso)
    }
}

/// Session state for one browser session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    /// Set once the protocol handshake completed successfully
    #[serde(rename = "samlAuthenticated", default)]
    pub authenticated: bool,
    /// Raw attributes asserted by the identity provider
    #[serde(rename = "samlUserAttrs", default)]
    pub user_attrs: RawClaims,
    /// Name identifier of the authenticated subject
    #[serde(rename = "samlNameId", default, skip_serializing_if = "Option::is_none")]
    pub name_id: Option<String>,
    /// Session index assigned by the provider
    #[serde(
        rename = "samlSessionIndex",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub session_index: Option<String>,
    /// When the provider session ends
    #[serde(
        rename = "samlSessionExpiration",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub expiration: Option<SessionExpiration>,
    /// Protocol bookkeeping not interpreted by the broker
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SessionState {
    /// State recorded after a successful handshake
    pub fn authenticated(user_attrs: RawClaims) -> Self {
        Self {
            authenticated: true,
            user_attrs,
            ..Self::default()
        }
    }

    /// Set the session expiration
    pub fn with_expiration(mut self, expiration: impl Into<SessionExpiration>) -> Self {
        self.expiration = Some(expiration.into());
        self
    }

    /// Set the subject name identifier
    pub fn with_name_id(mut self, name_id: impl Into<String>) -> Self {
        self.name_id = Some(name_id.into());
        self
    }

    /// Name identifier for log messages
    pub fn subject_label(&self) -> &str {
        self.name_id.as_deref().unwrap_or("(unknown)")
    }
}
