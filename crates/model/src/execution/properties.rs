use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Flat key/value settings handed over by the host, keys matched case-insensitively.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Properties {
    inner: HashMap<String, String>,
}

impl Properties {
    pub fn new() -> Self {
        Self {
            inner: HashMap::new(),
        }
    }

    pub fn insert(&mut self, key: &str, value: &str) {
        self.inner.insert(key.to_ascii_lowercase(), value.to_string());
    }

    /// Returns the value for `key`; blank values count as unset.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.inner
            .get(&key.to_ascii_lowercase())
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// First non-blank value among `keys`, in order.
    pub fn get_any(&self, keys: &[&str]) -> Option<&str> {
        keys.iter().find_map(|key| self.get(key))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.inner.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Properties
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut props = Properties::new();
        for (key, value) in iter {
            props.insert(key.as_ref(), value.as_ref());
        }
        props
    }
}
