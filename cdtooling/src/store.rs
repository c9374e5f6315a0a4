//! Read-only record store contract and a JSON-backed in-memory implementation.
//!
//! ```rust
//! use cdcommon::Domain;
//! use cdtooling::{InMemoryRecordStore, RecordStore};
//!
//! let store = InMemoryRecordStore::from_json_str(
//!     r#"{"grievances": {"GRV-2024-001": {"status": "resolved"}}}"#,
//! )
//! .expect("records should load");
//!
//! let record = store.lookup(Domain::Grievance, "GRV-2024-001").expect("record");
//! assert_eq!(record["status"], "resolved");
//! assert!(store.lookup(Domain::Identity, "GRV-2024-001").is_none());
//! ```

use std::collections::HashMap;
use std::path::Path;

use cdcommon::Domain;
use cdprovider::StatusRecord;
use serde_json::Value;

use crate::ToolError;

/// Lookups are pure: the same `(domain, key)` always yields the same answer.
pub trait RecordStore: Send + Sync {
    fn lookup(&self, domain: Domain, key: &str) -> Option<StatusRecord>;
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryRecordStore {
    records: HashMap<Domain, HashMap<String, StatusRecord>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(mut self, domain: Domain, key: impl Into<String>, record: StatusRecord) -> Self {
        self.insert(domain, key, record);
        self
    }

    pub fn insert(&mut self, domain: Domain, key: impl Into<String>, record: StatusRecord) {
        self.records
            .entry(domain)
            .or_default()
            .insert(key.into(), record);
    }

    /// Builds a store from a document keyed by domain section, e.g.
    /// `{"identity": {...}}` or the legacy `{"aadhaar": {...}}`.
    pub fn from_json_value(document: Value) -> Result<Self, ToolError> {
        let Value::Object(sections) = document else {
            return Err(ToolError::record_store(
                "record document must be a JSON object keyed by domain",
            ));
        };

        let mut store = Self::new();
        for (section, entries) in sections {
            let domain = Domain::parse(&section).ok_or_else(|| {
                ToolError::record_store(format!("unknown record section '{section}'"))
            })?;

            let Value::Object(entries) = entries else {
                return Err(ToolError::record_store(format!(
                    "record section '{section}' must be an object"
                )));
            };

            for (key, record) in entries {
                let Value::Object(record) = record else {
                    return Err(ToolError::record_store(format!(
                        "record '{key}' in section '{section}' must be an object"
                    )));
                };
                store.insert(domain, key, record);
            }
        }

        Ok(store)
    }

    pub fn from_json_str(document: &str) -> Result<Self, ToolError> {
        let value = serde_json::from_str(document)
            .map_err(|err| ToolError::record_store(format!("invalid record JSON: {err}")))?;
        Self::from_json_value(value)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ToolError> {
        let path = path.as_ref();
        let document = std::fs::read_to_string(path).map_err(|err| {
            ToolError::record_store(format!("cannot read records from {}: {err}", path.display()))
        })?;
        Self::from_json_str(&document)
    }

    pub fn len(&self) -> usize {
        self.records.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RecordStore for InMemoryRecordStore {
    fn lookup(&self, domain: Domain, key: &str) -> Option<StatusRecord> {
        self.records
            .get(&domain)
            .and_then(|entries| entries.get(key))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use serde_json::json;

    use super::*;
    use crate::ToolErrorKind;

    #[test]
    fn wire_and_legacy_section_names_both_load() {
        let store = InMemoryRecordStore::from_json_value(json!({
            "identity": {"EN-1": {"status": "generated"}},
            "pan": {"ACK-9": {"status": "dispatched"}}
        }))
        .expect("records should load");

        assert_eq!(store.len(), 2);
        assert!(store.lookup(Domain::Identity, "EN-1").is_some());
        assert!(store.lookup(Domain::TaxId, "ACK-9").is_some());
    }

    #[test]
    fn records_are_returned_unchanged() {
        let record = json!({
            "status": "resolved",
            "closed_on": "2024-03-01",
            "history": [{"step": "filed"}, {"step": "closed"}],
            "escalated": false
        });
        let store = InMemoryRecordStore::from_json_value(json!({
            "grievance": {"GRV-2024-001": record.clone()}
        }))
        .expect("records should load");

        let found = store
            .lookup(Domain::Grievance, "GRV-2024-001")
            .expect("record");
        assert_eq!(Value::Object(found), record);
    }

    #[test]
    fn unknown_section_and_non_object_records_fail_loading() {
        let error = InMemoryRecordStore::from_json_value(json!({"voter": {}}))
            .expect_err("unknown section");
        assert_eq!(error.kind, ToolErrorKind::RecordStore);

        let error = InMemoryRecordStore::from_json_value(json!({"passport": {"P1": "ok"}}))
            .expect_err("record must be object");
        assert!(error.message.contains("P1"));

        let error = InMemoryRecordStore::from_json_str("{not json").expect_err("bad json");
        assert!(error.message.contains("invalid record JSON"));
    }

    #[test]
    fn from_path_reads_a_record_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(
            file,
            "{}",
            json!({"passport": {"PSK-42": {"status": "police verification pending"}}})
        )
        .expect("write records");

        let store = InMemoryRecordStore::from_path(file.path()).expect("load");
        let record = store
            .lookup(Domain::TravelDocument, "PSK-42")
            .expect("record");
        assert_eq!(record["status"], "police verification pending");
    }

    #[test]
    fn missing_file_is_a_record_store_error() {
        let error = InMemoryRecordStore::from_path("/nonexistent/civicdesk/records.json")
            .expect_err("missing file");
        assert_eq!(error.kind, ToolErrorKind::RecordStore);
    }
}
