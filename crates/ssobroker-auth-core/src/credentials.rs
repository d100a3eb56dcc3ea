//! Canonical credential record for an authenticated (or anonymous) user
//!
//! A [`Credentials`] is built per request from session state, optionally
//! given a token, serialized to JSON for the caller, and dropped.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};
use std::io::Write;

use crate::attributes::FallbackAttributes;
use crate::token::{default_generator, SharedTokenGenerator};
use crate::{AuthError, TestUserConfig};

/// Identity of a user that has not authenticated
pub const UNAUTHENTICATED: &str = "anonymous";

pub const USER_ID: &str = "userId";
pub const USER_EMAIL: &str = "userEmail";
pub const USER_NAME: &str = "userName";
pub const USER_LAST_NAME: &str = "userLastName";
pub const USER_OU: &str = "userOU";
pub const TOKEN: &str = "token";
pub const EXPIRATION_TIME: &str = "expirationTime";

/// Keys that always lead serialized output, in this order
const LEAD_KEYS: [&str; 4] = [USER_ID, USER_EMAIL, USER_NAME, USER_LAST_NAME];

/// Keys that always trail serialized output, in this order
const TRAIL_KEYS: [&str; 2] = [TOKEN, EXPIRATION_TIME];

/// Values reported for the lead attributes until they are assigned
const DEFAULT_ATTRIBUTES: [(&str, &str); 3] = [
    (USER_EMAIL, "not@set"),
    (USER_NAME, "user"),
    (USER_LAST_NAME, "unknown"),
];

/// Identity attributes of a user plus the means to mint a token for them.
///
/// The identity key (`userId`) is fixed at construction. The lead attributes
/// always have a value: removing one restores its default.
#[derive(Debug, Clone)]
pub struct Credentials {
    attrs: FallbackAttributes,
    expires: Option<f64>,
    generator: Option<SharedTokenGenerator>,
}

impl Credentials {
    /// Create credentials for `userid` with the given attributes.
    ///
    /// A `userId` entry among the attributes is ignored. The process default
    /// token generator is bound if one is installed; use
    /// [`with_generator`](Self::with_generator) to bind a specific one.
    pub fn new<I, K>(userid: impl Into<String>, useratts: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let defaults = std::iter::once((USER_ID.to_string(), Value::String(userid.into()))).chain(
            DEFAULT_ATTRIBUTES
                .iter()
                .map(|(k, v)| (k.to_string(), Value::String(v.to_string()))),
        );
        let mut attrs = FallbackAttributes::new(defaults);

        for (key, value) in useratts {
            let key = key.into();
            if key != USER_ID {
                attrs.set(key, value);
            }
        }

        Self {
            attrs,
            expires: None,
            generator: default_generator(),
        }
    }

    /// Credentials for an unauthenticated user: no attributes, no expiration
    pub fn anonymous() -> Self {
        Self::new(UNAUTHENTICATED, Vec::<(String, Value)>::new())
    }

    /// Credentials for the configured test identity, used when provider
    /// logins are bypassed.
    pub fn from_test_user(user: &TestUserConfig) -> Self {
        let attrs = [
            (USER_NAME, user.given_name()),
            (USER_LAST_NAME, user.family_name()),
            (USER_EMAIL, user.email()),
            (USER_OU, user.ou()),
            ("displayName", user.display_name()),
            ("role", user.role()),
            ("winId", user.id()),
        ]
        .into_iter()
        .map(|(k, v)| (k, Value::String(v.to_string())));
        Self::new(user.id(), attrs)
    }

    /// Rebuild credentials from their JSON object form.
    ///
    /// The identity comes from `userId` (anonymous if absent or null; other
    /// non-string values are stringified); everything else becomes an
    /// attribute.
    pub fn from_json(obj: &Map<String, Value>) -> Self {
        let id = match obj.get(USER_ID) {
            Some(Value::String(id)) => id.clone(),
            None | Some(Value::Null) => UNAUTHENTICATED.to_string(),
            Some(other) => other.to_string(),
        };
        Self::new(id, obj.iter().map(|(k, v)| (k.clone(), v.clone())))
    }

    /// Parse credentials from a JSON document
    pub fn from_json_str(json: &str) -> Result<Self, AuthError> {
        let obj: Map<String, Value> = serde_json::from_str(json)?;
        Ok(Self::from_json(&obj))
    }

    /// Set the time (epoch seconds) the authenticated session expires.
    ///
    /// `None` and `0` mean the credentials do not expire.
    ///
    /// # Errors
    /// Returns [`AuthError::InvalidExpiration`] for a non-finite value.
    pub fn with_expiration(mut self, expiration: impl Into<Option<f64>>) -> Result<Self, AuthError> {
        self.expires = match expiration.into() {
            Some(t) if !t.is_finite() => {
                return Err(AuthError::InvalidExpiration(format!(
                    "expiration not a number: {t}"
                )))
            }
            Some(t) if t != 0.0 => Some(t),
            _ => None,
        };
        Ok(self)
    }

    /// Bind a specific token generator
    pub fn with_generator(mut self, generator: SharedTokenGenerator) -> Self {
        self.generator = Some(generator);
        self
    }

    /// The identifier of the user
    pub fn id(&self) -> &str {
        self.attrs
            .get(USER_ID)
            .and_then(Value::as_str)
            .unwrap_or(UNAUTHENTICATED)
    }

    /// False if the identity is the anonymous sentinel
    pub fn is_authenticated(&self) -> bool {
        self.id() != UNAUTHENTICATED
    }

    /// Session expiration in epoch seconds, if set
    pub fn expiration_time(&self) -> Option<f64> {
        self.expires
    }

    /// Session expiration as an ISO-8601 string, or `"(unset)"`
    pub fn expiration(&self) -> String {
        self.expires
            .and_then(|t| DateTime::<Utc>::from_timestamp_millis((t * 1000.0) as i64))
            .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true))
            .unwrap_or_else(|| "(unset)".to_string())
    }

    /// True once the expiration time has been reached
    pub fn expired(&self) -> bool {
        match self.expires {
            Some(t) => t <= now_epoch(),
            None => false,
        }
    }

    fn str_attr(&self, key: &str) -> &str {
        self.attrs.get(key).and_then(Value::as_str).unwrap_or_default()
    }

    /// The `userEmail` attribute
    pub fn email(&self) -> &str {
        self.str_attr(USER_EMAIL)
    }

    pub fn set_email(&mut self, email: impl Into<String>) {
        self.attrs.set(USER_EMAIL, Value::String(email.into()));
    }

    /// The `userName` attribute: the user's given (first) name
    pub fn given_name(&self) -> &str {
        self.str_attr(USER_NAME)
    }

    pub fn set_given_name(&mut self, name: impl Into<String>) {
        self.attrs.set(USER_NAME, Value::String(name.into()));
    }

    /// The `userLastName` attribute: the user's family name
    pub fn family_name(&self) -> &str {
        self.str_attr(USER_LAST_NAME)
    }

    pub fn set_family_name(&mut self, name: impl Into<String>) {
        self.attrs.set(USER_LAST_NAME, Value::String(name.into()));
    }

    /// The token set by [`set_token`](Self::set_token), if any
    pub fn token(&self) -> Option<&str> {
        self.attrs.get(TOKEN).and_then(Value::as_str)
    }

    /// Visible value of an attribute
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attrs.get(key)
    }

    /// Assign an attribute. The identity key cannot be reassigned.
    pub fn set(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        let key = key.into();
        if key == USER_ID {
            tracing::debug!("Ignoring attempt to reassign {}", USER_ID);
            return None;
        }
        self.attrs.set(key, value)
    }

    /// Remove an assigned attribute; a defaulted attribute reverts to its
    /// default.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.attrs.remove(key)
    }

    /// Visible keys in serialization order: identity and lead attributes,
    /// then other attributes as added, then token and expiration.
    pub fn keys(&self) -> Vec<&str> {
        let set: Vec<&str> = self.attrs.keys().collect();
        let mut keys = Vec::with_capacity(set.len());
        keys.extend(LEAD_KEYS.iter().copied().filter(|k| set.contains(k)));
        keys.extend(
            set.iter()
                .copied()
                .filter(|k| !LEAD_KEYS.contains(k) && !TRAIL_KEYS.contains(k)),
        );
        keys.extend(TRAIL_KEYS.iter().copied().filter(|k| set.contains(k)));
        keys
    }

    /// Ordered attribute view used as token claims and JSON output
    pub fn claims(&self) -> Map<String, Value> {
        self.keys()
            .into_iter()
            .filter_map(|k| self.attrs.get(k).map(|v| (k.to_string(), v.clone())))
            .collect()
    }

    /// Generate a token carrying these credentials.
    ///
    /// # Errors
    /// Returns [`AuthError::Configuration`] if no generator is bound.
    pub fn create_token(&self, lifetime: Option<u64>) -> Result<String, AuthError> {
        let generator = self.generator.as_ref().ok_or_else(|| {
            AuthError::Configuration("No token generator is configured".to_string())
        })?;
        generator.generate(self.id(), &self.claims(), lifetime)
    }

    /// Generate a token and store it as the `token` attribute.
    ///
    /// # Errors
    /// Returns [`AuthError::NotAuthenticated`] for anonymous credentials,
    /// leaving them unchanged.
    pub fn set_token(&mut self, lifetime: Option<u64>) -> Result<&str, AuthError> {
        if !self.is_authenticated() {
            return Err(AuthError::NotAuthenticated(format!(
                "token cannot be set for unauthenticated user, {}",
                self.id()
            )));
        }
        let token = self.create_token(lifetime)?;
        self.attrs.set(TOKEN, Value::String(token));
        Ok(self.token().unwrap_or_default())
    }

    /// Export as pretty-printed JSON in serialization order
    pub fn to_json(&self) -> Result<String, AuthError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write pretty-printed JSON to `writer`
    pub fn write_json<W: Write>(&self, writer: W) -> Result<(), AuthError> {
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }
}

impl Default for Credentials {
    fn default() -> Self {
        Self::anonymous()
    }
}

impl PartialEq for Credentials {
    fn eq(&self, other: &Self) -> bool {
        self.claims() == other.claims() && self.expires == other.expires
    }
}

impl Serialize for Credentials {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let keys = self.keys();
        let mut map = serializer.serialize_map(Some(keys.len()))?;
        for key in keys {
            if let Some(value) = self.attrs.get(key) {
                map.serialize_entry(key, value)?;
            }
        }
        map.end()
    }
}

fn now_epoch() -> f64 {
    Utc::now().timestamp_millis() as f64 / 1000.0
}
