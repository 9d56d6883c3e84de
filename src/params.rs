//! Route parameters captured while resolving a page fragment.
//!
//! # Example
//!
//! ```
//! use stacked_navigator::RouteParams;
//!
//! // Pattern: /message/:id, fragment: /message/42
//! let mut params = RouteParams::new();
//! params.insert("id", "42");
//!
//! assert_eq!(params.get("id"), Some("42"));
//! assert_eq!(params.get_as::<u32>("id"), Some(42));
//! ```

use std::collections::BTreeMap;
use std::fmt;

/// Named values extracted from the dynamic segments of a route pattern.
///
/// Keys are kept sorted so that two parameter sets built in a different order
/// compare and print identically.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteParams {
    params: BTreeMap<String, String>,
}

impl RouteParams {
    /// Create empty route parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a parameter value by key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Get a parameter and parse it as a specific type
    ///
    /// Returns `None` if the parameter doesn't exist or cannot be parsed.
    pub fn get_as<T>(&self, key: &str) -> Option<T>
    where
        T: std::str::FromStr,
    {
        self.params.get(key)?.parse().ok()
    }

    /// Insert or overwrite a parameter.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.params.insert(key.into(), value.into());
    }

    /// Return `true` if the given key is present.
    pub fn contains(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    /// Iterate over all `(key, value)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Return `true` if there are no parameters.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Return the number of parameters.
    pub fn len(&self) -> usize {
        self.params.len()
    }
}

impl<K, V> FromIterator<(K, V)> for RouteParams
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            params: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl fmt::Display for RouteParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (key, value)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}={}", key, value)?;
        }
        f.write_str("}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_access() {
        let params: RouteParams = [("id", "7"), ("slug", "intro")].into_iter().collect();
        assert_eq!(params.get_as::<u64>("id"), Some(7));
        assert_eq!(params.get_as::<u64>("slug"), None);
        assert_eq!(params.get_as::<u64>("missing"), None);
    }

    #[test]
    fn test_insertion_order_does_not_matter() {
        let mut a = RouteParams::new();
        a.insert("x", "1");
        a.insert("y", "2");
        let b: RouteParams = [("y", "2"), ("x", "1")].into_iter().collect();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "{x=1, y=2}");
    }
}
