//! SSO Broker Auth API
//!
//! Tells front-end applications who the logged-in user is and issues tokens
//! they can present to other services.
//!
//! ## Endpoints
//!
//! - `GET /sso/auth/_logininfo` - Credentials of the logged-in user
//! - `GET /sso/auth/_tokeninfo` - Credentials plus a signed token
//! - `GET /health` - Liveness probe
//! - `GET /ready` - Readiness probe

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod session;
pub mod state;

use axum::http::{header, HeaderValue, Method};
use axum::routing::get;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::handlers::{health, login_info, ready, token_info};
use crate::state::AppState;

/// Build the HTTP router
pub fn build_router(state: AppState) -> Router {
    let request_timeout = state.request_timeout();
    let cors = cors_layer(state.config.allowed_service_endpoints.clone());

    let sso_routes = Router::new()
        .route("/sso/auth/_logininfo", get(login_info))
        .route("/sso/auth/_tokeninfo", get(token_info));

    // Health routes (no timeout - must always respond quickly)
    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready));

    // Build middleware stack (order matters - outermost first)
    let middleware = ServiceBuilder::new()
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(TimeoutLayer::new(request_timeout));

    Router::new()
        .merge(sso_routes)
        .layer(middleware)
        .merge(health_routes)
        .with_state(state)
}

/// CORS for the registered front-end applications. Session cookies must
/// travel with the request, so credentials are allowed and origins are
/// listed rather than wildcarded.
fn cors_layer(allowed: Vec<String>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(move |origin: &HeaderValue, _| {
            origin
                .to_str()
                .is_ok_and(|origin| is_allowed_origin(origin, &allowed))
        }))
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::ACCEPT, header::AUTHORIZATION, header::CONTENT_TYPE])
}

/// Whether `url` begins with one of the allowed base URLs
pub fn is_allowed_url(url: &str, allowed: &[String]) -> bool {
    allowed.iter().any(|base| url.starts_with(base.as_str()))
}

/// Whether a request origin (scheme, host and port, no path) belongs to one
/// of the allowed base URLs
pub fn is_allowed_origin(origin: &str, allowed: &[String]) -> bool {
    if origin.is_empty() {
        return false;
    }
    is_allowed_url(origin, allowed)
        || allowed.iter().any(|base| {
            base.strip_prefix(origin)
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
        })
}
