//! Signed token generation (HMAC-SHA256 JWT)

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use crate::{AuthError, TokenConfig};

/// Claim names that are never copied from credential data into a token
const EXCLUDED_CLAIMS: [&str; 2] = ["token", "userId"];

/// Shared handle to a token generator
pub type SharedTokenGenerator = Arc<dyn TokenGenerator>;

/// Encodes a subject and its attributes into a signed, expiring token
pub trait TokenGenerator: Send + Sync + fmt::Debug {
    /// Default number of seconds before a generated token expires
    fn lifetime(&self) -> u64;

    /// Generate a token for `subject` carrying `data` as claims.
    ///
    /// `lifetime` overrides the configured default; `None` or `Some(0)` uses
    /// the default.
    fn generate(
        &self,
        subject: &str,
        data: &Map<String, Value>,
        lifetime: Option<u64>,
    ) -> Result<String, AuthError>;
}

/// JSON Web Token generator signing with HS256
#[derive(Clone)]
pub struct JwtGenerator {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    lifetime: u64,
}

impl JwtGenerator {
    /// Signing algorithm used for every token
    pub const ALGORITHM: Algorithm = Algorithm::HS256;

    /// Create a generator from validated configuration
    ///
    /// # Errors
    /// Returns [`AuthError::Configuration`] if the secret is empty.
    pub fn new(config: &TokenConfig) -> Result<Self, AuthError> {
        config.validate()?;
        let secret = config.secret.as_bytes();
        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            lifetime: config.lifetime,
        })
    }

    /// Create a generator from an untyped configuration block
    pub fn from_value(config: &Value) -> Result<Self, AuthError> {
        Self::new(&TokenConfig::from_value(config)?)
    }

    /// Build the claim set: `data` minus excluded keys, plus `sub` and `exp`.
    fn claimset(
        &self,
        subject: &str,
        data: &Map<String, Value>,
        lifetime: Option<u64>,
    ) -> Result<Map<String, Value>, AuthError> {
        let lifetime = match lifetime {
            Some(secs) if secs > 0 => secs,
            _ => self.lifetime,
        };
        let exp = i64::try_from(lifetime)
            .ok()
            .and_then(|secs| Utc::now().timestamp().checked_add(secs))
            .ok_or_else(|| {
                AuthError::InvalidLifetime(format!("lifetime out of range: {lifetime}"))
            })?;

        let mut claims: Map<String, Value> = data
            .iter()
            .filter(|(k, _)| !EXCLUDED_CLAIMS.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        claims.insert("sub".to_string(), Value::String(subject.to_string()));
        claims.insert("exp".to_string(), Value::from(exp));
        Ok(claims)
    }

    /// Validate a token issued with this generator's secret and return its
    /// claims.
    pub fn verify(&self, token: &str) -> Result<Map<String, Value>, AuthError> {
        let mut validation = Validation::new(Self::ALGORITHM);
        validation.set_required_spec_claims(&["exp", "sub"]);

        let data = decode::<Map<String, Value>>(token, &self.decoding_key, &validation)
            .map_err(|e| {
                tracing::debug!("Token validation failed: {}", e);
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                    _ => AuthError::InvalidToken,
                }
            })?;
        Ok(data.claims)
    }
}

impl TokenGenerator for JwtGenerator {
    fn lifetime(&self) -> u64 {
        self.lifetime
    }

    fn generate(
        &self,
        subject: &str,
        data: &Map<String, Value>,
        lifetime: Option<u64>,
    ) -> Result<String, AuthError> {
        let claims = self.claimset(subject, data, lifetime)?;
        encode(&Header::new(Self::ALGORITHM), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!("Failed to sign token for {}: {}", subject, e);
            AuthError::TokenEncoding(e.to_string())
        })
    }
}

impl fmt::Debug for JwtGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtGenerator")
            .field("algorithm", &Self::ALGORITHM)
            .field("lifetime", &self.lifetime)
            .finish_non_exhaustive()
    }
}

// Process-level default generator. Installed once at startup, read-only
// afterwards; request handling never writes it.
static DEFAULT_GENERATOR: RwLock<Option<SharedTokenGenerator>> = RwLock::new(None);

/// Create a [`JwtGenerator`] from `config` and install it as the process
/// default.
pub fn create_default_generator(config: &TokenConfig) -> Result<SharedTokenGenerator, AuthError> {
    let generator: SharedTokenGenerator = Arc::new(JwtGenerator::new(config)?);
    install_default_generator(Arc::clone(&generator));
    Ok(generator)
}

/// Install `generator` as the process default, returning the previous one
pub fn install_default_generator(generator: SharedTokenGenerator) -> Option<SharedTokenGenerator> {
    let mut slot = DEFAULT_GENERATOR
        .write()
        .unwrap_or_else(PoisonError::into_inner);
    if slot.is_some() {
        tracing::warn!("Replacing the default token generator");
    }
    slot.replace(generator)
}

/// The process default generator, if one was installed
pub fn default_generator() -> Option<SharedTokenGenerator> {
    DEFAULT_GENERATOR
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Remove the process default generator (test isolation)
pub fn clear_default_generator() -> Option<SharedTokenGenerator> {
    DEFAULT_GENERATOR
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .take()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SECRET: &str = "XXX";

    fn generator() -> JwtGenerator {
        JwtGenerator::new(&TokenConfig::new(SECRET)).unwrap()
    }

    fn decode_claims(token: &str) -> Map<String, Value> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp"]);
        decode::<Map<String, Value>>(token, &DecodingKey::from_secret(SECRET.as_bytes()), &validation)
            .unwrap()
            .claims
    }

    #[test]
    fn test_ctor() {
        let gen = generator();
        assert_eq!(gen.lifetime(), 3600);

        let gen = JwtGenerator::new(&TokenConfig::new(SECRET).with_lifetime(600)).unwrap();
        assert_eq!(gen.lifetime(), 600);

        assert!(matches!(
            JwtGenerator::new(&TokenConfig::new("")),
            Err(AuthError::Configuration(_))
        ));
        assert!(matches!(
            JwtGenerator::from_value(&json!({"lifetime": 600})),
            Err(AuthError::Configuration(_))
        ));
    }

    #[test]
    fn test_generate() {
        let gen = generator();
        let mut data = Map::new();
        data.insert("name".into(), json!("Bud"));
        data.insert("color".into(), json!("green"));

        let due = Utc::now().timestamp() + 3600;
        let token = gen.generate("me", &data, None).unwrap();
        let claims = decode_claims(&token);
        assert_eq!(claims["sub"], json!("me"));
        let exp = claims["exp"].as_i64().unwrap();
        assert!(exp > due - 1 && exp < due + 5);
        assert_eq!(claims["name"], json!("Bud"));
        assert_eq!(claims["color"], json!("green"));

        let due = Utc::now().timestamp() + 600;
        let token = gen.generate("you", &data, Some(600)).unwrap();
        let claims = decode_claims(&token);
        assert_eq!(claims["sub"], json!("you"));
        let exp = claims["exp"].as_i64().unwrap();
        assert!(exp > due - 1 && exp < due + 5);
    }

    #[test]
    fn test_generate_strips_reserved_claims() {
        let gen = generator();
        let mut data = Map::new();
        data.insert("userId".into(), json!("someone-else"));
        data.insert("token".into(), json!("stale"));
        data.insert("userEmail".into(), json!("me@example.com"));

        let claims = decode_claims(&gen.generate("me", &data, None).unwrap());
        assert!(!claims.contains_key("userId"));
        assert!(!claims.contains_key("token"));
        assert_eq!(claims["sub"], json!("me"));
        assert_eq!(claims["userEmail"], json!("me@example.com"));
    }

    #[test]
    fn test_zero_lifetime_uses_default() {
        let gen = JwtGenerator::new(&TokenConfig::new(SECRET).with_lifetime(120)).unwrap();
        let due = Utc::now().timestamp() + 120;
        let claims = decode_claims(&gen.generate("me", &Map::new(), Some(0)).unwrap());
        let exp = claims["exp"].as_i64().unwrap();
        assert!(exp > due - 1 && exp < due + 5);
    }

    #[test]
    fn test_out_of_range_lifetime_rejected() {
        let gen = generator();
        assert!(matches!(
            gen.generate("me", &Map::new(), Some(u64::MAX)),
            Err(AuthError::InvalidLifetime(_))
        ));
    }

    #[test]
    fn test_verify_roundtrip() {
        let gen = generator();
        let token = gen.generate("me", &Map::new(), None).unwrap();
        let claims = gen.verify(&token).unwrap();
        assert_eq!(claims["sub"], json!("me"));
    }

    #[test]
    fn test_verify_rejects_wrong_secret() {
        let token = generator().generate("me", &Map::new(), None).unwrap();
        let other = JwtGenerator::new(&TokenConfig::new("YYY")).unwrap();
        assert_eq!(other.verify(&token), Err(AuthError::InvalidToken));
        assert_eq!(other.verify("not.a.token"), Err(AuthError::InvalidToken));
    }

    #[test]
    fn test_verify_expired() {
        let gen = generator();
        let claims = json!({"sub": "me", "exp": Utc::now().timestamp() - 3600});
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        assert_eq!(gen.verify(&token), Err(AuthError::TokenExpired));
    }

    #[test]
    fn test_debug_hides_keys() {
        let debug = format!("{:?}", generator());
        assert!(debug.contains("HS256"));
        assert!(!debug.contains(SECRET));
    }
}
