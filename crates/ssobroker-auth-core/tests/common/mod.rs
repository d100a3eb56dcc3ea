//! Common test utilities for ssobroker-auth-core integration tests

#![allow(dead_code)]

use std::sync::Arc;

use serde_json::{json, Map, Value};
use ssobroker_auth_core::{JwtGenerator, SharedTokenGenerator, TokenConfig};
use ssobroker_types::RawClaims;

pub const TEST_SECRET: &str = "test-secret-for-integration-tests";

pub const WINID_CLAIM: &str =
    "http://schemas.microsoft.com/ws/2008/06/identity/claims/windowsaccountname";
pub const GIVEN_CLAIM: &str = "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/givenname";
pub const SURNAME_CLAIM: &str = "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/surname";
pub const EMAIL_CLAIM: &str = "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/emailaddress";

pub fn jwt_generator() -> JwtGenerator {
    JwtGenerator::new(&TokenConfig::new(TEST_SECRET)).unwrap()
}

pub fn shared_generator() -> SharedTokenGenerator {
    Arc::new(jwt_generator())
}

/// Claims as asserted by the Okta-fronted provider, list-wrapped
pub fn okta_claims(winid: &str, given: &str, family: &str) -> RawClaims {
    let mut claims = Map::new();
    claims.insert(WINID_CLAIM.to_string(), json!([winid]));
    claims.insert(GIVEN_CLAIM.to_string(), json!([given]));
    claims.insert(SURNAME_CLAIM.to_string(), json!([family]));
    claims.insert(
        EMAIL_CLAIM.to_string(),
        Value::Array(vec![Value::String(format!("{winid}@example.gov"))]),
    );
    claims
}

pub fn now_epoch() -> f64 {
    chrono::Utc::now().timestamp_millis() as f64 / 1000.0
}
