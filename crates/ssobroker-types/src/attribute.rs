//! Raw identity-provider attribute values

use serde_json::Value;

/// Raw claim mapping as produced by the protocol handler.
///
/// Keys are provider-qualified attribute names (often schema URIs). Order is
/// the order the provider asserted them in. Depending on the provider's wire
/// format a value arrives either plain or wrapped in a list (usually of one
/// element).
pub type RawClaims = serde_json::Map<String, Value>;

/// Look up a raw claim and unwrap it to its effective value: the first
/// element of a list, or the value itself.
///
/// Returns `None` for a missing claim or an empty list.
pub fn first_value<'a>(claims: &'a RawClaims, name: &str) -> Option<&'a Value> {
    match claims.get(name)? {
        Value::Array(values) => values.first(),
        value => Some(value),
    }
}
