//! Operation descriptors and the built-in status-lookup declarations.
//!
//! ```rust
//! use cdcommon::Domain;
//! use cdtooling::builtin_operations;
//!
//! let operations = builtin_operations();
//! assert_eq!(operations.len(), 4);
//!
//! let grievance = operations
//!     .iter()
//!     .find(|operation| operation.domain == Domain::Grievance)
//!     .expect("grievance operation");
//! assert_eq!(grievance.name, "grievance-status");
//! assert_eq!(grievance.input_key, "grievance_id");
//! ```

use cdcommon::Domain;
use cdprovider::ToolDefinition;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    pub name: String,
    pub domain: Domain,
    pub input_key: String,
    pub description: String,
}

impl Operation {
    pub fn new(
        name: impl Into<String>,
        domain: Domain,
        input_key: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            domain,
            input_key: input_key.into(),
            description: description.into(),
        }
    }

    pub fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            self.name.clone(),
            self.domain,
            self.input_key.clone(),
            self.description.clone(),
        )
    }
}

impl From<ToolDefinition> for Operation {
    fn from(value: ToolDefinition) -> Self {
        Self {
            name: value.name,
            domain: value.domain,
            input_key: value.input_key,
            description: value.description,
        }
    }
}

/// The fixed declaration list every tool server registers at startup.
pub fn builtin_operations() -> Vec<Operation> {
    vec![
        Operation::new(
            "identity-status",
            Domain::Identity,
            "identity_number",
            "Check the status of an Aadhaar enrolment or update request by its reference number.",
        ),
        Operation::new(
            "tax_id-status",
            Domain::TaxId,
            "tax_id_number",
            "Check the status of a PAN application by its acknowledgement number.",
        ),
        Operation::new(
            "travel_document-status",
            Domain::TravelDocument,
            "application_id",
            "Check the status of a passport application by its file or application id.",
        ),
        Operation::new(
            "grievance-status",
            Domain::Grievance,
            "grievance_id",
            "Check the status of a public grievance by its registration id.",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_operations_cover_every_domain_once() {
        let operations = builtin_operations();
        for domain in Domain::ALL {
            let count = operations
                .iter()
                .filter(|operation| operation.domain == domain)
                .count();
            assert_eq!(count, 1, "domain {domain} should have one operation");
        }
    }

    #[test]
    fn definition_round_trips_descriptor_fields() {
        let operation = Operation::new("tax_id-status", Domain::TaxId, "tax_id_number", "PAN");
        let back = Operation::from(operation.definition());
        assert_eq!(back, operation);
    }
}
