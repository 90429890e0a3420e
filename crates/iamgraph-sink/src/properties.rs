//! Node and relationship property maps

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Ordered property map
///
/// Insertion order is kept so exports render properties the way they were
/// written.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Properties(IndexMap<String, Value>);

impl Properties {
    /// Create empty map
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert or replace a property
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Get property value
    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Get property as string
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Every entry of `predicate` is present with an equal value
    #[must_use]
    pub fn matches(&self, predicate: &Properties) -> bool {
        predicate
            .iter()
            .all(|(key, value)| self.0.get(key) == Some(value))
    }

    /// Copy entries of `other` that are not set yet
    pub fn fill_from(&mut self, other: &Properties) {
        for (key, value) in other.iter() {
            self.0.entry(key.clone()).or_insert_with(|| value.clone());
        }
    }

    /// Iterate entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Number of entries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// No entries
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Properties {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_keeps_order() {
        let props = Properties::new().with("name", "P1").with("id", "A1").with("arn", "arn:p1");
        let keys: Vec<_> = props.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["name", "id", "arn"]);
    }

    #[test]
    fn matches_subset() {
        let props = Properties::new().with("name", "s3:bucket").with("forPolicy", "P1");

        assert!(props.matches(&Properties::new().with("name", "s3:bucket")));
        assert!(props.matches(&Properties::new()));
        assert!(!props.matches(&Properties::new().with("forPolicy", "P2")));
        assert!(!props.matches(&Properties::new().with("missing", "x")));
    }

    #[test]
    fn fill_from_keeps_existing() {
        let mut props = Properties::new().with("name", "a");
        props.fill_from(&Properties::new().with("name", "b").with("forPolicy", "P1"));

        assert_eq!(props.get_str("name"), Some("a"));
        assert_eq!(props.get_str("forPolicy"), Some("P1"));
    }

    #[test]
    fn collects_from_pairs() {
        let props: Properties = [("a", 1), ("b", 2)].into_iter().collect();
        assert_eq!(props.len(), 2);
        assert_eq!(props.get("b"), Some(&Value::from(2)));
    }
}
