//! Provider attribute adapter
//!
//! Reduces an identity provider's raw claim mapping to the canonical
//! attribute set of a [`Credentials`] record. The provider-specific part is
//! data only: an [`AttributeProfile`] names the claims that feed the
//! identity and each canonical field, plus the literal used when a claim is
//! missing.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde_json::{Map, Value};
use ssobroker_types::{first_value, RawClaims, SessionExpiration};

use crate::credentials::{
    Credentials, EXPIRATION_TIME, TOKEN, USER_EMAIL, USER_ID, USER_LAST_NAME, USER_NAME, USER_OU,
};
use crate::{AuthError, ProfileName};

const MS_CLAIMS: &str = "http://schemas.microsoft.com/ws/2008/06/identity/claims/";
const SOAP_CLAIMS: &str = "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/";

/// Record keys a provider claim may never fill
const RESERVED_KEYS: [&str; 3] = [USER_ID, TOKEN, EXPIRATION_TIME];

fn ms_claim(name: &str) -> String {
    format!("{MS_CLAIMS}{name}")
}

fn soap_claim(name: &str) -> String {
    format!("{SOAP_CLAIMS}{name}")
}

/// Maps one provider claim onto one canonical attribute
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRule {
    pub field: String,
    pub claim: String,
    pub fallback: Value,
}

/// Provider-specific claim table
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeProfile {
    name: String,
    id_claim: String,
    id_fallback: String,
    fields: Vec<FieldRule>,
    consumed: Vec<String>,
}

impl AttributeProfile {
    /// Create a profile reading the identity from `id_claim`
    pub fn new(
        name: impl Into<String>,
        id_claim: impl Into<String>,
        id_fallback: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            id_claim: id_claim.into(),
            id_fallback: id_fallback.into(),
            fields: Vec::new(),
            consumed: Vec::new(),
        }
    }

    /// Map `claim` onto the canonical attribute `field`
    pub fn with_field(
        mut self,
        field: impl Into<String>,
        claim: impl Into<String>,
        fallback: impl Into<Value>,
    ) -> Self {
        self.fields.push(FieldRule {
            field: field.into(),
            claim: claim.into(),
            fallback: fallback.into(),
        });
        self
    }

    /// Mark a claim as recognized without mapping it anywhere
    pub fn with_consumed(mut self, claim: impl Into<String>) -> Self {
        self.consumed.push(claim.into());
        self
    }

    /// Claims asserted by an ADFS-fronted institutional provider
    pub fn nist_adfs() -> Self {
        Self::new("nist-adfs", ms_claim("windowsaccountname"), "unknown")
            .with_field(USER_NAME, soap_claim("givenname"), "unknown")
            .with_field(USER_LAST_NAME, soap_claim("surname"), "unknown")
            .with_field(USER_EMAIL, soap_claim("emailaddress"), "not-set")
            .with_field(USER_OU, soap_claim("nistOU"), "not-set")
    }

    /// Claims asserted by an Okta-fronted institutional provider
    pub fn nist_okta() -> Self {
        Self::new("nist-okta", ms_claim("windowsaccountname"), "unknown")
            .with_field(USER_NAME, soap_claim("givenname"), "unknown")
            .with_field(USER_LAST_NAME, soap_claim("surname"), "unknown")
            .with_field(USER_EMAIL, soap_claim("emailaddress"), "not-set")
            .with_field("winId", ms_claim("windowsaccountname"), "unknown")
            .with_consumed(soap_claim("nameidentifier"))
    }

    pub fn for_name(name: ProfileName) -> Self {
        match name {
            ProfileName::NistAdfs => Self::nist_adfs(),
            ProfileName::NistOkta => Self::nist_okta(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether a claim is interpreted by this profile rather than passed
    /// through
    pub fn is_well_known(&self, claim: &str) -> bool {
        claim == self.id_claim
            || self.fields.iter().any(|rule| rule.claim == claim)
            || self.consumed.iter().any(|c| c == claim)
    }

    fn is_canonical_field(&self, key: &str) -> bool {
        self.fields.iter().any(|rule| rule.field == key)
    }
}

/// Identity and canonical attributes extracted from raw claims
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedIdentity {
    pub user_id: String,
    /// Canonical fields in profile order, then pass-through claims in the
    /// order asserted
    pub attributes: Map<String, Value>,
}

/// Normalizes raw claims according to a profile
#[derive(Debug, Clone)]
pub struct AttributeAdapter {
    profile: AttributeProfile,
}

impl AttributeAdapter {
    pub fn new(profile: AttributeProfile) -> Self {
        Self { profile }
    }

    pub fn profile(&self) -> &AttributeProfile {
        &self.profile
    }

    /// Extract the identity and canonical attributes from `raw`.
    ///
    /// List values are unwrapped to their first element. A missing (or empty)
    /// well-known claim takes the profile's fallback literal. Claims the
    /// profile does not recognize are kept under their original key unless
    /// they collide with a canonical field or a reserved record key
    /// (`userId`, `token`, `expirationTime`).
    pub fn normalize(&self, raw: &RawClaims) -> NormalizedIdentity {
        let user_id = match first_value(raw, &self.profile.id_claim) {
            Some(Value::String(id)) => id.clone(),
            Some(other) => other.to_string(),
            None => self.profile.id_fallback.clone(),
        };

        let mut attributes = Map::new();
        for rule in &self.profile.fields {
            let value = first_value(raw, &rule.claim)
                .cloned()
                .unwrap_or_else(|| rule.fallback.clone());
            attributes.insert(rule.field.clone(), value);
        }

        for name in raw.keys() {
            if self.profile.is_well_known(name) || self.profile.is_canonical_field(name) {
                continue;
            }
            if RESERVED_KEYS.contains(&name.as_str()) {
                tracing::warn!("Ignoring provider claim named after reserved key, {}", name);
                continue;
            }
            match first_value(raw, name) {
                Some(value) => {
                    attributes.insert(name.clone(), value.clone());
                }
                None => tracing::debug!("Dropping empty claim, {}", name),
            }
        }

        NormalizedIdentity {
            user_id,
            attributes,
        }
    }

    /// Build a credential record from raw claims and an optional session
    /// expiration.
    ///
    /// # Errors
    /// Returns [`AuthError::InvalidExpiration`] if a string expiration is not
    /// an ISO-8601 date.
    pub fn make_credentials(
        &self,
        raw: &RawClaims,
        expiration: Option<&SessionExpiration>,
    ) -> Result<Credentials, AuthError> {
        let expires = expiration.map(expiration_seconds).transpose()?;
        let identity = self.normalize(raw);
        Credentials::new(identity.user_id, identity.attributes).with_expiration(expires)
    }
}

impl Default for AttributeAdapter {
    fn default() -> Self {
        Self::new(AttributeProfile::for_name(ProfileName::default()))
    }
}

/// Epoch seconds of a stored session expiration
pub fn expiration_seconds(expiration: &SessionExpiration) -> Result<f64, AuthError> {
    match expiration {
        SessionExpiration::Epoch(t) => Ok(*t),
        SessionExpiration::Iso(s) => parse_iso_expiration(s),
    }
}

/// Formats carrying an explicit UTC offset, tried after RFC 3339
const OFFSET_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%dT%H:%M%z",
];

/// Formats without an offset; read as UTC
const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// Parse an ISO-8601 timestamp into epoch seconds.
///
/// Timestamps without an offset are read as UTC; a bare date means midnight.
/// Seconds and minutes may be omitted from the time.
pub fn parse_iso_expiration(value: &str) -> Result<f64, AuthError> {
    let value = value.trim();
    parse_iso_datetime(value)
        .map(|dt| dt.timestamp_millis() as f64 / 1000.0)
        .ok_or_else(|| AuthError::InvalidExpiration(format!("expiration not an ISO date: {value}")))
}

fn parse_iso_datetime(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Some(dt) = OFFSET_FORMATS
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(value, fmt).ok())
    {
        return Some(dt.with_timezone(&Utc));
    }
    if let Some(dt) = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
    {
        return Some(dt.and_utc());
    }
    // hour-only time: chrono needs at least minutes
    if let Ok(dt) = NaiveDateTime::parse_from_str(&format!("{value}:00"), "%Y-%m-%dT%H:%M") {
        return Some(dt.and_utc());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .map(|d| d.and_time(NaiveTime::MIN).and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> RawClaims {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    fn okta_claims() -> RawClaims {
        raw(json!({
            "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/nameidentifier": ["gurn@nist.gov"],
            "http://schemas.microsoft.com/ws/2008/06/identity/claims/windowsaccountname": ["gjc1"],
            "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/givenname": ["Gurn"],
            "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/surname": ["Cranston"],
            "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/emailaddress": ["gurn.cranston@nist.gov"],
            "http://schemas.microsoft.com/ws/2008/06/identity/claims/role": ["Staff"]
        }))
    }

    #[test]
    fn test_unwraps_list_values() {
        let profile = AttributeProfile::new("test", "ID", "unknown")
            .with_field("userName", "GIVEN", "unknown")
            .with_field("userLastName", "FAMILY", "unknown");
        let adapter = AttributeAdapter::new(profile);

        let identity = adapter.normalize(&raw(json!({"GIVEN": ["Gurn"]})));
        assert_eq!(identity.attributes["userName"], json!("Gurn"));
        assert_eq!(identity.attributes["userLastName"], json!("unknown"));
        assert_eq!(identity.user_id, "unknown");
    }

    #[test]
    fn test_okta_profile() {
        let adapter = AttributeAdapter::new(AttributeProfile::nist_okta());
        let identity = adapter.normalize(&okta_claims());

        assert_eq!(identity.user_id, "gjc1");
        assert_eq!(
            identity.attributes.keys().collect::<Vec<_>>(),
            vec![
                "userName",
                "userLastName",
                "userEmail",
                "winId",
                "http://schemas.microsoft.com/ws/2008/06/identity/claims/role"
            ]
        );
        assert_eq!(identity.attributes["userName"], json!("Gurn"));
        assert_eq!(identity.attributes["userEmail"], json!("gurn.cranston@nist.gov"));
        assert_eq!(identity.attributes["winId"], json!("gjc1"));
    }

    #[test]
    fn test_adfs_profile_plain_values() {
        let adapter = AttributeAdapter::new(AttributeProfile::nist_adfs());
        let claims = raw(json!({
            "http://schemas.microsoft.com/ws/2008/06/identity/claims/windowsaccountname": "gjc1",
            "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/givenname": "Gurn",
            "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/nistOU": "Funny Walks"
        }));
        let identity = adapter.normalize(&claims);

        assert_eq!(identity.user_id, "gjc1");
        assert_eq!(identity.attributes["userName"], json!("Gurn"));
        assert_eq!(identity.attributes["userLastName"], json!("unknown"));
        assert_eq!(identity.attributes["userEmail"], json!("not-set"));
        assert_eq!(identity.attributes["userOU"], json!("Funny Walks"));
        assert_eq!(identity.attributes.len(), 4);
    }

    #[test]
    fn test_missing_claims_use_fallbacks() {
        let adapter = AttributeAdapter::new(AttributeProfile::nist_okta());
        let identity = adapter.normalize(&RawClaims::new());
        assert_eq!(identity.user_id, "unknown");
        assert_eq!(identity.attributes["userName"], json!("unknown"));
        assert_eq!(identity.attributes["userLastName"], json!("unknown"));
        assert_eq!(identity.attributes["userEmail"], json!("not-set"));
        assert_eq!(identity.attributes["winId"], json!("unknown"));
    }

    #[test]
    fn test_empty_lists() {
        let adapter = AttributeAdapter::new(AttributeProfile::nist_okta());
        let claims = raw(json!({
            "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/givenname": [],
            "extra": []
        }));
        let identity = adapter.normalize(&claims);
        assert_eq!(identity.attributes["userName"], json!("unknown"));
        assert!(!identity.attributes.contains_key("extra"));
    }

    #[test]
    fn test_canonical_fields_win_over_pass_through() {
        let adapter = AttributeAdapter::new(AttributeProfile::nist_okta());
        let mut claims = okta_claims();
        claims.insert("userName".to_string(), json!(["Impostor"]));
        let identity = adapter.normalize(&claims);
        assert_eq!(identity.attributes["userName"], json!("Gurn"));
    }

    #[test]
    fn test_make_credentials() {
        let adapter = AttributeAdapter::new(AttributeProfile::nist_okta());
        let expiration = SessionExpiration::Iso("2099-01-01T00:00:00".to_string());
        let crd = adapter
            .make_credentials(&okta_claims(), Some(&expiration))
            .unwrap();

        assert_eq!(crd.id(), "gjc1");
        assert_eq!(crd.given_name(), "Gurn");
        assert_eq!(crd.family_name(), "Cranston");
        assert_eq!(crd.email(), "gurn.cranston@nist.gov");
        assert_eq!(crd.expiration(), "2099-01-01T00:00:00Z");
        assert!(!crd.expired());

        let crd = adapter.make_credentials(&okta_claims(), None).unwrap();
        assert_eq!(crd.expiration_time(), None);
    }

    #[test]
    fn test_make_credentials_bad_expiration() {
        let adapter = AttributeAdapter::default();
        let expiration = SessionExpiration::Iso("next tuesday".to_string());
        assert!(matches!(
            adapter.make_credentials(&okta_claims(), Some(&expiration)),
            Err(AuthError::InvalidExpiration(_))
        ));
    }

    #[test]
    fn test_parse_iso_expiration() {
        assert_eq!(parse_iso_expiration("2023-11-14T22:13:20Z").unwrap(), 1_700_000_000.0);
        assert_eq!(
            parse_iso_expiration("2023-11-14T17:13:20-05:00").unwrap(),
            1_700_000_000.0
        );
        assert_eq!(parse_iso_expiration("2023-11-14T22:13:20").unwrap(), 1_700_000_000.0);
        assert_eq!(parse_iso_expiration("2023-11-14 22:13:20.5").unwrap(), 1_700_000_000.5);
        assert_eq!(parse_iso_expiration("1970-01-02").unwrap(), 86_400.0);
        assert!(parse_iso_expiration("").is_err());
        assert!(parse_iso_expiration("2023-11-14T").is_err());
        assert!(parse_iso_expiration("2023-11-14T22:13:20+").is_err());
        assert!(parse_iso_expiration("2023-13-01").is_err());
    }

    #[test]
    fn test_parse_iso_expiration_reduced_precision() {
        // minute-precision time with an offset
        assert_eq!(parse_iso_expiration("2023-11-14T22:13+00:00").unwrap(), 1_699_999_980.0);
        assert_eq!(parse_iso_expiration("2023-11-14T17:13-05:00").unwrap(), 1_699_999_980.0);
        // hour-only time
        assert_eq!(parse_iso_expiration("2023-11-14T22").unwrap(), 1_699_999_200.0);
        // offset without a colon
        assert_eq!(
            parse_iso_expiration("2023-11-14T22:13:20+0000").unwrap(),
            1_700_000_000.0
        );
        assert_eq!(
            parse_iso_expiration("2099-01-01T00:00+00:00").unwrap(),
            parse_iso_expiration("2099-01-01T00:00:00Z").unwrap()
        );
    }

    #[test]
    fn test_reserved_keys_not_passed_through() {
        let adapter = AttributeAdapter::new(AttributeProfile::nist_okta());
        let mut claims = okta_claims();
        claims.insert("token".to_string(), json!(["idp-supplied"]));
        claims.insert("expirationTime".to_string(), json!([1]));
        claims.insert("userId".to_string(), json!(["someone-else"]));

        let identity = adapter.normalize(&claims);
        assert!(!identity.attributes.contains_key("token"));
        assert!(!identity.attributes.contains_key("expirationTime"));
        assert!(!identity.attributes.contains_key("userId"));

        let crd = adapter.make_credentials(&claims, None).unwrap();
        assert_eq!(crd.id(), "gjc1");
        assert_eq!(crd.token(), None);
        assert_eq!(crd.get("expirationTime"), None);
        let data: Map<String, Value> = serde_json::from_str(&crd.to_json().unwrap()).unwrap();
        assert!(!data.contains_key("token"));
        assert!(!data.contains_key("expirationTime"));
    }

    #[test]
    fn test_profile_selection() {
        assert_eq!(AttributeProfile::for_name(ProfileName::NistAdfs).name(), "nist-adfs");
        assert_eq!(AttributeAdapter::default().profile().name(), "nist-okta");
        assert!(AttributeProfile::nist_okta().is_well_known(
            "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/nameidentifier"
        ));
        assert!(!AttributeProfile::nist_adfs().is_well_known(
            "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/nameidentifier"
        ));
    }
}
