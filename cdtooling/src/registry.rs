//! Operation registry for lookup by operation name.
//!
//! Registration is only possible until the registry is sealed; a tool server
//! seals its registry before it accepts the first request.

use cdcommon::Registry;
use cdprovider::ToolDefinition;

use crate::{Operation, ToolError};

#[derive(Debug, Default)]
pub struct OperationRegistry {
    operations: Registry<String, Operation>,
    sealed: bool,
}

impl OperationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, operation: Operation) -> Result<(), ToolError> {
        if self.sealed {
            return Err(ToolError::registration_closed(format!(
                "cannot register '{}' after the server started serving",
                operation.name
            ))
            .with_operation(&operation.name));
        }

        if operation.name.trim().is_empty() || operation.input_key.trim().is_empty() {
            return Err(ToolError::bad_request(
                "operation name and input key must not be empty",
            ));
        }

        self.operations
            .try_insert(operation.name.clone(), operation)
            .map_err(|(name, _)| {
                ToolError::duplicate_operation(format!("operation '{name}' is already registered"))
                    .with_operation(name)
            })
    }

    pub fn seal(&mut self) {
        self.sealed = true;
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub fn get(&self, name: &str) -> Option<&Operation> {
        self.operations.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.operations.contains_key(name)
    }

    /// Registered operations ordered by name.
    pub fn operations(&self) -> Vec<Operation> {
        let mut operations: Vec<Operation> = self.operations.values().cloned().collect();
        operations.sort_by(|left, right| left.name.cmp(&right.name));
        operations
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.operations()
            .iter()
            .map(Operation::definition)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}
