//! Two-tier attribute table
//!
//! A defaults table fixed at construction plus an overrides table holding the
//! values actually assigned. Lookups fall through to the defaults, so removing
//! an override restores the default instead of hiding the key.

use serde_json::Value;

/// Attribute table with configured fallback values
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FallbackAttributes {
    defaults: Vec<(String, Value)>,
    overrides: Vec<(String, Value)>,
}

impl FallbackAttributes {
    /// Create a table with the given defaults and no overrides
    pub fn new<I, K>(defaults: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let mut table = Self::default();
        for (key, value) in defaults {
            upsert(&mut table.defaults, key.into(), value);
        }
        table
    }

    /// Visible value for `key`: the override if set, else the default
    pub fn get(&self, key: &str) -> Option<&Value> {
        lookup(&self.overrides, key).or_else(|| lookup(&self.defaults, key))
    }

    /// Like [`get`](Self::get), except that an unset key resolves to
    /// `fallback` rather than the configured default.
    pub fn get_or<'a>(&'a self, key: &str, fallback: &'a Value) -> &'a Value {
        lookup(&self.overrides, key).unwrap_or(fallback)
    }

    /// The configured default for `key`, ignoring overrides
    pub fn default_for(&self, key: &str) -> Option<&Value> {
        lookup(&self.defaults, key)
    }

    /// Whether `key` has been explicitly assigned
    pub fn is_set(&self, key: &str) -> bool {
        lookup(&self.overrides, key).is_some()
    }

    /// Whether `key` is visible (assigned or defaulted)
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Assign a value, returning the previous override
    pub fn set(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        upsert(&mut self.overrides, key.into(), value)
    }

    /// Remove an assigned value, returning it. The key's default (if any)
    /// becomes visible again.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let idx = self.overrides.iter().position(|(k, _)| k == key)?;
        Some(self.overrides.remove(idx).1)
    }

    /// Visible keys: default keys in configured order, then keys that only
    /// exist as overrides, in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.defaults.iter().map(|(k, _)| k.as_str()).chain(
            self.overrides
                .iter()
                .map(|(k, _)| k.as_str())
                .filter(move |k| lookup(&self.defaults, k).is_none()),
        )
    }

    /// Visible key/value pairs in [`keys`](Self::keys) order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.keys().filter_map(move |k| self.get(k).map(|v| (k, v)))
    }

    /// Number of visible keys
    pub fn len(&self) -> usize {
        self.keys().count()
    }

    pub fn is_empty(&self) -> bool {
        self.defaults.is_empty() && self.overrides.is_empty()
    }
}

fn lookup<'a>(table: &'a [(String, Value)], key: &str) -> Option<&'a Value> {
    table.iter().find(|(k, _)| k == key).map(|(_, v)| v)
}

fn upsert(table: &mut Vec<(String, Value)>, key: String, value: Value) -> Option<Value> {
    match table.iter_mut().find(|(k, _)| *k == key) {
        Some((_, slot)) => Some(std::mem::replace(slot, value)),
        None => {
            table.push((key, value));
            None
        }
    }
}
