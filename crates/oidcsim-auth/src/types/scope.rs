//! Scope sets.
//!
//! A [`ScopeSet`] is an unordered set of opaque scope strings. It is backed by
//! a `BTreeSet` so that materialization for token claims is deterministic.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// The OpenID Connect scope. Its presence triggers ID token issuance.
pub const OPENID_SCOPE: &str = "openid";

/// A set of unique scope strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScopeSet(BTreeSet<String>);

impl ScopeSet {
    /// Creates an empty scope set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a space-delimited scope string (the OAuth 2.0 wire form).
    #[must_use]
    pub fn parse(scope: &str) -> Self {
        scope.split_whitespace().collect()
    }

    /// Adds a scope. Empty strings are ignored.
    pub fn insert(&mut self, scope: impl Into<String>) {
        let scope = scope.into();
        if !scope.is_empty() {
            self.0.insert(scope);
        }
    }

    /// Returns `true` if `scope` is in the set.
    #[must_use]
    pub fn contains(&self, scope: &str) -> bool {
        self.0.contains(scope)
    }

    /// Returns `true` if every scope in `required` is in this set.
    ///
    /// Vacuously true for an empty `required`.
    #[must_use]
    pub fn contains_all(&self, required: &ScopeSet) -> bool {
        required.0.is_subset(&self.0)
    }

    /// Returns `true` if the OpenID Connect scope is present.
    #[must_use]
    pub fn is_openid(&self) -> bool {
        self.contains(OPENID_SCOPE)
    }

    /// Materializes the set in sorted order.
    #[must_use]
    pub fn to_vec(&self) -> Vec<String> {
        self.0.iter().cloned().collect()
    }

    /// Iterates over the scopes in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Number of scopes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for ScopeSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        for scope in iter {
            set.insert(scope);
        }
        set
    }
}

/// Formats as the space-delimited wire form.
impl fmt::Display for ScopeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for scope in &self.0 {
            if !first {
                f.write_str(" ")?;
            }
            f.write_str(scope)?;
            first = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scopes(items: &[&str]) -> ScopeSet {
        items.iter().copied().collect()
    }

    #[test]
    fn test_contains_all_empty_is_vacuous() {
        assert!(ScopeSet::new().contains_all(&ScopeSet::new()));
        assert!(scopes(&["a"]).contains_all(&ScopeSet::new()));
    }

    #[test]
    fn test_contains_all_subset() {
        assert!(!scopes(&["a"]).contains_all(&scopes(&["a", "b"])));
        assert!(scopes(&["a", "b"]).contains_all(&scopes(&["a"])));
        assert!(scopes(&["a", "b"]).contains_all(&scopes(&["b", "a"])));
    }

    #[test]
    fn test_duplicates_and_empty_strings_are_collapsed() {
        let set = scopes(&["openid", "", "openid", "profile"]);
        assert_eq!(set.len(), 2);
        assert!(set.contains("openid"));
        assert!(!set.contains(""));
    }

    #[test]
    fn test_to_vec_is_deterministic() {
        let set = scopes(&["profile", "openid", "email"]);
        assert_eq!(set.to_vec(), vec!["email", "openid", "profile"]);
    }

    #[test]
    fn test_parse_and_display() {
        let set = ScopeSet::parse("  profile openid\topenid ");
        assert_eq!(set.len(), 2);
        assert_eq!(set.to_string(), "openid profile");
        assert!(set.is_openid());
        assert!(ScopeSet::parse("").is_empty());
    }
}
