//! Credential handlers (login info, token info)

use axum::Json;
use ssobroker_auth_core::Credentials;

use crate::error::{ApiError, ApiResult};
use crate::extractors::SessionCredentials;

fn require_authenticated(creds: &Credentials) -> ApiResult<()> {
    if !creds.is_authenticated() || creds.expired() {
        tracing::debug!(user = creds.id(), "Rejecting unauthenticated client");
        return Err(ApiError::unauthenticated("Client is not authenticated"));
    }
    Ok(())
}

/// GET /sso/auth/_logininfo
///
/// Information about the currently logged-in user
pub async fn login_info(
    SessionCredentials(creds): SessionCredentials,
) -> ApiResult<Json<Credentials>> {
    require_authenticated(&creds)?;
    Ok(Json(creds))
}

/// GET /sso/auth/_tokeninfo
///
/// As `_logininfo`, plus a freshly issued token for the user
pub async fn token_info(
    SessionCredentials(mut creds): SessionCredentials,
) -> ApiResult<Json<Credentials>> {
    require_authenticated(&creds)?;
    creds.set_token(None)?;
    tracing::info!(user = creds.id(), "Issued token");
    Ok(Json(creds))
}
