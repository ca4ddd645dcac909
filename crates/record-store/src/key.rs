//! # Typed Record Keys
//!
//! Every record lives under a [`RecordKey`]: a [`KeyKind`] plus an optional entity id.
//! Keys without an id are singletons (`session`); keys with an id are members of the
//! collection named by their kind (`policy_123` belongs to `policy`).
//!
//! Collection membership is decided by comparing kinds, never by string prefixes, so a
//! kind named `policy` can't accidentally match a record stored under `policyDraft_1`.

use std::borrow::Cow;
use std::fmt::{self, Display};

/// The family a record belongs to (`policy`, `transactions`, `session`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyKind(Cow<'static, str>);

impl KeyKind {
    /// Declares a kind at compile time, e.g. `const POLICY: KeyKind = KeyKind::new("policy");`
    pub const fn new(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Key of a member of this collection.
    pub fn member(&self, id: impl Into<String>) -> RecordKey {
        RecordKey::member(self.clone(), id)
    }
}

impl From<String> for KeyKind {
    fn from(name: String) -> Self {
        Self(Cow::Owned(name))
    }
}

impl Display for KeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Address of a single record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordKey {
    kind: KeyKind,
    id: Option<String>,
}

impl RecordKey {
    /// A record that exists at most once (`session`).
    pub fn single(kind: KeyKind) -> Self {
        Self { kind, id: None }
    }

    /// A member of the `kind` collection (`policy_123`).
    pub fn member(kind: KeyKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: Some(id.into()),
        }
    }

    pub fn kind(&self) -> &KeyKind {
        &self.kind
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Whether this key is a member of the `kind` collection.
    pub fn belongs_to(&self, kind: &KeyKind) -> bool {
        self.id.is_some() && &self.kind == kind
    }
}

impl Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            Some(id) => write!(f, "{}_{}", self.kind, id),
            None => write!(f, "{}", self.kind),
        }
    }
}

/// What a subscriber is interested in: one record, or every member of a collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeySpec {
    Record(RecordKey),
    Collection(KeyKind),
}

impl KeySpec {
    /// Whether a mutation of `key` concerns this spec.
    pub fn matches(&self, key: &RecordKey) -> bool {
        match self {
            KeySpec::Record(expected) => expected == key,
            KeySpec::Collection(kind) => key.belongs_to(kind),
        }
    }
}

impl From<RecordKey> for KeySpec {
    fn from(key: RecordKey) -> Self {
        KeySpec::Record(key)
    }
}

impl From<KeyKind> for KeySpec {
    fn from(kind: KeyKind) -> Self {
        KeySpec::Collection(kind)
    }
}

impl Display for KeySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeySpec::Record(key) => write!(f, "{key}"),
            KeySpec::Collection(kind) => write!(f, "{kind}_*"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POLICY: KeyKind = KeyKind::new("policy");
    const SESSION: KeyKind = KeyKind::new("session");

    #[test]
    fn test_display_matches_templated_names() {
        assert_eq!(POLICY.member("123").to_string(), "policy_123");
        assert_eq!(RecordKey::single(SESSION).to_string(), "session");
        assert_eq!(KeySpec::Collection(POLICY).to_string(), "policy_*");
    }

    #[test]
    fn test_collection_membership_is_by_kind() {
        let spec = KeySpec::Collection(POLICY);
        assert!(spec.matches(&POLICY.member("1")));
        assert!(!spec.matches(&RecordKey::single(POLICY)));
        assert!(!spec.matches(&KeyKind::new("policyDraft").member("1")));
    }

    #[test]
    fn test_record_spec_matches_exact_key_only() {
        let spec = KeySpec::from(POLICY.member("1"));
        assert!(spec.matches(&POLICY.member("1")));
        assert!(!spec.matches(&POLICY.member("10")));
    }
}
