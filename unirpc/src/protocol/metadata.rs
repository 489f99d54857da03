//! Call metadata
// (c) 2026 The unirpc developers

use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// An ordered list of key/value pairs attached to a call.
///
/// Keys are case insensitive; they are stored lower-cased. A key may appear more than once,
/// in which case [`get`](Self::get) returns the first value and [`get_all`](Self::get_all) returns them all
/// in insertion order.
#[derive(Serialize, Deserialize, PartialEq, Eq, Debug, Clone, Default)]
pub struct Metadata {
    entries: Vec<(String, String)>,
}

impl Metadata {
    /// Creates an empty set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a key/value pair
    pub fn add<K: AsRef<str>, V: Into<String>>(&mut self, key: K, value: V) {
        self.entries
            .push((key.as_ref().to_ascii_lowercase(), value.into()));
    }

    /// Builder-style variant of [`add`](Self::add)
    #[must_use]
    pub fn with<K: AsRef<str>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.add(key, value);
        self
    }

    /// Returns the first value for the given key, if any
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    }

    /// Returns every value for the given key, in insertion order
    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> {
        self.pairs()
            .filter(move |(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    }

    /// Iterates over all entries in insertion order
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of entries (not distinct keys)
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Are there no entries?
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Moves all entries of `other` onto the end of this set
    pub fn append(&mut self, other: Metadata) {
        self.entries.extend(other.entries);
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for Metadata {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut md = Self::new();
        for (k, v) in iter {
            md.add(k, v);
        }
        md
    }
}

impl Display for Metadata {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")?;
        for (i, (k, v)) in self.pairs().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{k}: {v:?}")?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod test {
    use super::Metadata;
    use crate::protocol::common::ProtocolMessage;
    use pretty_assertions::assert_eq;

    impl ProtocolMessage for Metadata {}

    #[test]
    fn keys_are_case_insensitive() {
        let md = Metadata::new().with("User-Agent", "test/1.0");
        assert_eq!(md.get("user-agent"), Some("test/1.0"));
        assert_eq!(md.get("USER-AGENT"), Some("test/1.0"));
        assert_eq!(md.pairs().next(), Some(("user-agent", "test/1.0")));
    }

    #[test]
    fn repeated_keys() {
        let md: Metadata = [("a", "1"), ("b", "2"), ("a", "3")].into_iter().collect();
        assert_eq!(md.len(), 3);
        assert_eq!(md.get("a"), Some("1"));
        assert_eq!(md.get_all("a").collect::<Vec<_>>(), vec!["1", "3"]);
        assert_eq!(md.get("c"), None);
    }

    #[test]
    fn append_preserves_order() {
        let mut md = Metadata::new().with("x", "1");
        md.append(Metadata::new().with("y", "2").with("x", "3"));
        assert_eq!(md.to_string(), r#"{x: "1", y: "2", x: "3"}"#);
    }

    #[test]
    fn wire_encoding() {
        let md = Metadata::new().with("k", "v");
        // length 1; string "k"; string "v"
        assert_eq!(md.to_vec().unwrap(), vec![1, 1, b'k', 1, b'v']);
        assert_eq!(Metadata::from_slice(&md.to_vec().unwrap()).unwrap(), md);
    }
}
