//! Shared utilities and strongly-typed common values for workspace crates.
//!
//! ```rust
//! use cdcommon::{Domain, MetadataMap, SessionId, TraceId};
//!
//! let session = SessionId::from("session-1");
//! let trace = TraceId::new("trace-1");
//! let mut metadata = MetadataMap::new();
//! metadata.insert("channel".to_string(), "repl".to_string());
//!
//! assert_eq!(session.as_str(), "session-1");
//! assert_eq!(trace.to_string(), "trace-1");
//! assert_eq!(Domain::parse("pan"), Some(Domain::TaxId));
//! ```

pub mod future {
    //! Shared async future aliases.
    //!
    //! ```rust
    //! use cdcommon::BoxFuture;
    //!
    //! fn str_len<'a>(value: &'a str) -> BoxFuture<'a, usize> {
    //!     Box::pin(async move { value.len() })
    //! }
    //!
    //! let _future = str_len("hello");
    //! ```

    use std::future::Future;
    use std::pin::Pin;

    pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
}

pub mod context {
    //! Shared metadata and cross-crate identifier newtypes.
    //!
    //! ```rust
    //! use cdcommon::{MetadataMap, SessionId, TraceId};
    //!
    //! let session = SessionId::new("session-42");
    //! let trace = TraceId::from("trace-42");
    //! let mut metadata = MetadataMap::new();
    //! metadata.insert("env".to_string(), "test".to_string());
    //!
    //! assert_eq!(session.to_string(), "session-42");
    //! assert_eq!(trace.as_str(), "trace-42");
    //! ```

    use std::collections::HashMap;
    use std::fmt::{Display, Formatter};

    pub type MetadataMap = HashMap<String, String>;

    #[derive(Debug, Clone, PartialEq, Eq, Hash)]
    pub struct SessionId(String);

    impl SessionId {
        pub fn new(value: impl Into<String>) -> Self {
            Self(value.into())
        }

        pub fn as_str(&self) -> &str {
            self.0.as_str()
        }
    }

    impl Display for SessionId {
        fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
            f.write_str(&self.0)
        }
    }

    impl From<String> for SessionId {
        fn from(value: String) -> Self {
            Self(value)
        }
    }

    impl From<&str> for SessionId {
        fn from(value: &str) -> Self {
            Self(value.to_string())
        }
    }

    #[derive(Debug, Clone, PartialEq, Eq, Hash)]
    pub struct TraceId(String);

    impl TraceId {
        pub fn new(value: impl Into<String>) -> Self {
            Self(value.into())
        }

        pub fn as_str(&self) -> &str {
            self.0.as_str()
        }
    }

    impl Display for TraceId {
        fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
            f.write_str(&self.0)
        }
    }

    impl From<String> for TraceId {
        fn from(value: String) -> Self {
            Self(value)
        }
    }

    impl From<&str> for TraceId {
        fn from(value: &str) -> Self {
            Self(value.to_string())
        }
    }
}

pub mod domain {
    //! The closed set of government-service domains.
    //!
    //! Every domain carries its wire name, the section name used by legacy
    //! record files, and the official portal citizens are redirected to.
    //!
    //! ```rust
    //! use cdcommon::Domain;
    //!
    //! let domain: Domain = "travel_document".parse().expect("known domain");
    //! assert_eq!(domain, Domain::TravelDocument);
    //! assert_eq!(domain.legacy_section(), "passport");
    //! assert_eq!(domain.portal(), "https://www.passportindia.gov.in");
    //! ```

    use std::error::Error;
    use std::fmt::{Display, Formatter};
    use std::str::FromStr;

    use serde::{Deserialize, Serialize};

    #[derive(
        Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
    )]
    #[serde(rename_all = "snake_case")]
    pub enum Domain {
        Identity,
        TaxId,
        TravelDocument,
        Grievance,
    }

    impl Domain {
        pub const ALL: [Domain; 4] = [
            Domain::Identity,
            Domain::TaxId,
            Domain::TravelDocument,
            Domain::Grievance,
        ];

        pub fn as_str(&self) -> &'static str {
            match self {
                Self::Identity => "identity",
                Self::TaxId => "tax_id",
                Self::TravelDocument => "travel_document",
                Self::Grievance => "grievance",
            }
        }

        pub fn legacy_section(&self) -> &'static str {
            match self {
                Self::Identity => "aadhaar",
                Self::TaxId => "pan",
                Self::TravelDocument => "passport",
                Self::Grievance => "grievances",
            }
        }

        /// Human-facing name used in replies.
        pub fn label(&self) -> &'static str {
            match self {
                Self::Identity => "Aadhaar",
                Self::TaxId => "PAN",
                Self::TravelDocument => "passport",
                Self::Grievance => "grievance",
            }
        }

        pub fn authority(&self) -> &'static str {
            match self {
                Self::Identity => "UIDAI",
                Self::TaxId => "the Income Tax e-filing portal",
                Self::TravelDocument => "Passport Seva",
                Self::Grievance => "CPGRAMS",
            }
        }

        pub fn portal(&self) -> &'static str {
            match self {
                Self::Identity => "https://uidai.gov.in",
                Self::TaxId => "https://www.incometax.gov.in",
                Self::TravelDocument => "https://www.passportindia.gov.in",
                Self::Grievance => "https://pgportal.gov.in",
            }
        }

        /// Accepts both wire names and legacy section names.
        pub fn parse(value: &str) -> Option<Self> {
            let value = value.trim();
            Self::ALL.into_iter().find(|domain| {
                domain.as_str().eq_ignore_ascii_case(value)
                    || domain.legacy_section().eq_ignore_ascii_case(value)
            })
        }
    }

    impl Display for Domain {
        fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
            f.write_str(self.as_str())
        }
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct UnknownDomain(pub String);

    impl Display for UnknownDomain {
        fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
            write!(f, "unknown domain '{}'", self.0)
        }
    }

    impl Error for UnknownDomain {}

    impl FromStr for Domain {
        type Err = UnknownDomain;

        fn from_str(value: &str) -> Result<Self, Self::Err> {
            Self::parse(value).ok_or_else(|| UnknownDomain(value.to_string()))
        }
    }
}

pub mod registry {
    //! Generic registry map wrapper used by operation registries.
    //!
    //! ```rust
    //! use cdcommon::Registry;
    //!
    //! let mut registry = Registry::new();
    //! registry.try_insert("alpha".to_string(), 1_u32).expect("first insert");
    //! assert!(registry.try_insert("alpha".to_string(), 2_u32).is_err());
    //!
    //! assert_eq!(registry.get("alpha"), Some(&1));
    //! assert!(registry.contains_key("alpha"));
    //! ```

    use std::borrow::Borrow;
    use std::collections::HashMap;
    use std::hash::Hash;

    #[derive(Debug, Clone)]
    pub struct Registry<K, V> {
        items: HashMap<K, V>,
    }

    impl<K, V> Default for Registry<K, V>
    where
        K: Eq + Hash,
    {
        fn default() -> Self {
            Self {
                items: HashMap::new(),
            }
        }
    }

    impl<K, V> Registry<K, V>
    where
        K: Eq + Hash,
    {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn insert(&mut self, key: K, value: V) -> Option<V> {
            self.items.insert(key, value)
        }

        /// Inserts only when `key` is absent; hands the rejected pair back otherwise.
        pub fn try_insert(&mut self, key: K, value: V) -> Result<(), (K, V)> {
            if self.items.contains_key(&key) {
                return Err((key, value));
            }

            self.items.insert(key, value);
            Ok(())
        }

        pub fn get<Q>(&self, key: &Q) -> Option<&V>
        where
            K: Borrow<Q>,
            Q: Eq + Hash + ?Sized,
        {
            self.items.get(key)
        }

        pub fn contains_key<Q>(&self, key: &Q) -> bool
        where
            K: Borrow<Q>,
            Q: Eq + Hash + ?Sized,
        {
            self.items.contains_key(key)
        }

        pub fn keys(&self) -> impl Iterator<Item = &K> {
            self.items.keys()
        }

        pub fn values(&self) -> impl Iterator<Item = &V> {
            self.items.values()
        }

        pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
            self.items.iter()
        }

        pub fn len(&self) -> usize {
            self.items.len()
        }

        pub fn is_empty(&self) -> bool {
            self.items.is_empty()
        }
    }
}

pub use context::{MetadataMap, SessionId, TraceId};
pub use domain::{Domain, UnknownDomain};
pub use future::BoxFuture;
pub use registry::Registry;

#[cfg(test)]
mod tests {
    use super::{Domain, Registry, SessionId, TraceId};

    #[test]
    fn id_newtypes_round_trip_strings() {
        let session = SessionId::new("session-1");
        let trace = TraceId::from("trace-1");

        assert_eq!(session.as_str(), "session-1");
        assert_eq!(trace.as_str(), "trace-1");
        assert_eq!(session.to_string(), "session-1");
        assert_eq!(trace.to_string(), "trace-1");
    }

    #[test]
    fn domain_parses_wire_and_legacy_names() {
        assert_eq!(Domain::parse("identity"), Some(Domain::Identity));
        assert_eq!(Domain::parse("AADHAAR"), Some(Domain::Identity));
        assert_eq!(Domain::parse("grievances"), Some(Domain::Grievance));
        assert_eq!(Domain::parse(" tax_id "), Some(Domain::TaxId));
        assert_eq!(Domain::parse("driving_licence"), None);

        let error = "voter".parse::<Domain>().expect_err("unknown domain");
        assert!(error.to_string().contains("voter"));
    }

    #[test]
    fn domain_serializes_as_snake_case() {
        let rendered = serde_json::to_string(&Domain::TravelDocument).expect("serialize");
        assert_eq!(rendered, "\"travel_document\"");

        let parsed: Domain = serde_json::from_str("\"tax_id\"").expect("deserialize");
        assert_eq!(parsed, Domain::TaxId);
    }

    #[test]
    fn every_domain_has_a_portal() {
        for domain in Domain::ALL {
            assert!(domain.portal().starts_with("https://"));
            assert!(!domain.label().is_empty());
        }
    }

    #[test]
    fn generic_registry_rejects_duplicate_keys() {
        let mut registry = Registry::new();
        assert!(registry.is_empty());

        registry
            .try_insert("alpha".to_string(), 1_u32)
            .expect("first insert should succeed");
        let (key, value) = registry
            .try_insert("alpha".to_string(), 2_u32)
            .expect_err("duplicate insert should fail");

        assert_eq!(key, "alpha");
        assert_eq!(value, 2);
        assert_eq!(registry.get("alpha"), Some(&1));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.keys().count(), 1);
    }
}
