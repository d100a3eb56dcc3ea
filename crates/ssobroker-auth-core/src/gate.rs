//! Session authentication gate
//!
//! Per-request entry point: decides from externally managed session state
//! whether the caller is authenticated and builds the matching
//! [`Credentials`].

use chrono::Utc;
use ssobroker_types::SessionState;

use crate::adapter::{expiration_seconds, AttributeAdapter};
use crate::credentials::Credentials;
use crate::token::SharedTokenGenerator;
use crate::{AuthError, LoginBypassConfig};

/// Authentication state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Unauthenticated,
    Authenticated,
}

/// The session's expiration in epoch seconds.
///
/// An epoch expiration of `0` means none was recorded, as it does for
/// [`Credentials`].
///
/// # Errors
/// Returns [`AuthError::InvalidExpiration`] if the stored expiration cannot
/// be interpreted.
pub fn session_expiration(state: &SessionState) -> Result<Option<f64>, AuthError> {
    let Some(expiration) = state.expiration.as_ref() else {
        return Ok(None);
    };
    let expires = expiration_seconds(expiration).map_err(|e| {
        tracing::error!(
            "Session property, samlSessionExpiration, contains unparseable value: {:?}",
            expiration
        );
        e
    })?;
    Ok(Some(expires).filter(|t| *t != 0.0))
}

/// Whether the session's recorded expiration has passed.
///
/// A session without an expiration never expires.
///
/// # Errors
/// Returns [`AuthError::InvalidExpiration`] if the stored expiration cannot
/// be interpreted.
pub fn session_expired(state: &SessionState) -> Result<bool, AuthError> {
    Ok(match session_expiration(state)? {
        Some(expires) => expires <= Utc::now().timestamp_millis() as f64 / 1000.0,
        None => false,
    })
}

/// Whether the session records a successful login that has not expired.
///
/// Never fails: a session whose expiration cannot be interpreted is
/// treated as unauthenticated.
pub fn session_authenticated(state: &SessionState) -> bool {
    if !state.authenticated {
        return false;
    }
    match session_expired(state) {
        Ok(expired) => !expired,
        Err(e) => {
            tracing::error!("Failure to interpret session expiration: {}", e);
            tracing::warn!(
                "Treating session for user {} as unauthenticated",
                state.subject_label()
            );
            false
        }
    }
}

/// Builds credentials for requests from their session state
#[derive(Debug, Clone, Default)]
pub struct SessionGate {
    adapter: AttributeAdapter,
    generator: Option<SharedTokenGenerator>,
    bypass: Option<LoginBypassConfig>,
}

impl SessionGate {
    pub fn new(adapter: AttributeAdapter) -> Self {
        Self {
            adapter,
            generator: None,
            bypass: None,
        }
    }

    /// Bind the generator given to every credential record this gate builds.
    /// Without one, records use the process default.
    pub fn with_generator(mut self, generator: SharedTokenGenerator) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Serve a static test identity instead of consulting sessions when the
    /// bypass is engaged
    pub fn with_bypass(mut self, bypass: LoginBypassConfig) -> Self {
        self.bypass = Some(bypass);
        self
    }

    pub fn adapter(&self) -> &AttributeAdapter {
        &self.adapter
    }

    pub fn bypass_engaged(&self) -> bool {
        self.bypass.as_ref().is_some_and(|b| b.engaged)
    }

    /// The session's expiration in epoch seconds, if recorded
    pub fn expiration(&self, state: &SessionState) -> Result<Option<f64>, AuthError> {
        session_expiration(state)
    }

    pub fn session_expired(&self, state: &SessionState) -> Result<bool, AuthError> {
        session_expired(state)
    }

    pub fn session_authenticated(&self, state: &SessionState) -> bool {
        session_authenticated(state)
    }

    pub fn state(&self, state: &SessionState) -> GateState {
        if session_authenticated(state) {
            GateState::Authenticated
        } else {
            GateState::Unauthenticated
        }
    }

    /// Credentials for the caller owning `state`: the test identity when the
    /// bypass is engaged, the adapted provider identity when authenticated,
    /// otherwise anonymous.
    ///
    /// # Errors
    /// Returns [`AuthError::InvalidExpiration`] only if the expiration
    /// changed between the authentication check and record construction.
    pub fn credentials(&self, state: &SessionState) -> Result<Credentials, AuthError> {
        let creds = match &self.bypass {
            Some(bypass) if bypass.engaged => {
                tracing::debug!("Login bypass engaged; returning test user credentials");
                Credentials::from_test_user(&bypass.testuser)
            }
            _ => match self.state(state) {
                GateState::Authenticated => self
                    .adapter
                    .make_credentials(&state.user_attrs, state.expiration.as_ref())?,
                GateState::Unauthenticated => Credentials::anonymous(),
            },
        };

        Ok(match &self.generator {
            Some(generator) => creds.with_generator(generator.clone()),
            None => creds,
        })
    }
}
