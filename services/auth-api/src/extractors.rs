//! Axum extractors for session credentials

use axum::extract::{FromRef, FromRequestParts};
use axum::http::header;
use axum::http::request::Parts;
use ssobroker_auth_core::Credentials;
use ssobroker_types::SessionState;

use crate::error::ApiError;
use crate::state::AppState;

/// Credentials for the caller, built from its session.
///
/// Callers without a session (or with an unauthenticated one) get anonymous
/// credentials; rejecting them is up to the handler.
#[derive(Debug, Clone)]
pub struct SessionCredentials(pub Credentials);

impl<S> FromRequestParts<S> for SessionCredentials
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);

        let session = match session_id(parts, &app_state.config.session_cookie_name) {
            Some(id) => app_state.sessions.get(&id).await.unwrap_or_else(|| {
                tracing::debug!("No session found for presented session id");
                SessionState::default()
            }),
            None => SessionState::default(),
        };

        let creds = app_state.gate.credentials(&session)?;
        Ok(Self(creds))
    }
}

/// Extract the session id from the session cookie
fn session_id(parts: &Parts, cookie_name: &str) -> Option<String> {
    let cookie_str = parts.headers.get(header::COOKIE)?.to_str().ok()?;

    cookie_str
        .split(';')
        .filter_map(|cookie| cookie.trim().split_once('='))
        .find(|(name, _)| *name == cookie_name)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}
