//! Application state

use std::sync::Arc;

use ssobroker_auth_core::{
    AttributeAdapter, AttributeProfile, AuthError, JwtGenerator, SessionGate,
    SharedTokenGenerator,
};

use crate::config::Config;
use crate::session::{MemorySessionStore, SessionStore};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Turns session state into credentials
    pub gate: Arc<SessionGate>,
    /// Generator bound to every credential record the gate builds
    pub generator: SharedTokenGenerator,
    /// Session state written by the protocol handler
    pub sessions: Arc<dyn SessionStore>,
    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Create new application state
    pub fn new(
        config: Config,
        generator: SharedTokenGenerator,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        let adapter = AttributeAdapter::new(AttributeProfile::for_name(config.profile));
        let gate = SessionGate::new(adapter)
            .with_generator(Arc::clone(&generator))
            .with_bypass(config.login_bypass.clone());

        Self {
            gate: Arc::new(gate),
            generator,
            sessions,
            config: Arc::new(config),
        }
    }

    /// State with its own generator and an in-memory session store
    pub fn from_config(config: Config) -> Result<Self, AuthError> {
        let generator: SharedTokenGenerator = Arc::new(JwtGenerator::new(&config.token)?);
        let sessions = Arc::new(MemorySessionStore::new(config.session_ttl));
        Ok(Self::new(config, generator, sessions))
    }

    /// Get request timeout from config
    pub fn request_timeout(&self) -> std::time::Duration {
        self.config.request_timeout
    }
}
