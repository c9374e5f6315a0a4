//! The frozen union of operations discovered across all servers.

use cdcommon::{Domain, Registry};
use cdprovider::ToolDefinition;
use cdtooling::Operation;

use crate::ClientError;

/// An operation together with the server that owns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutedOperation {
    pub operation: Operation,
    pub server: usize,
    pub server_name: String,
}

#[derive(Debug, Clone, Default)]
pub struct OperationSet {
    entries: Registry<String, RoutedOperation>,
}

impl OperationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an operation; a name already owned by another server is fatal.
    pub fn insert(
        &mut self,
        operation: Operation,
        server: usize,
        server_name: impl Into<String>,
    ) -> Result<(), ClientError> {
        let server_name = server_name.into();
        let name = operation.name.clone();
        let routed = RoutedOperation {
            operation,
            server,
            server_name,
        };

        self.entries.try_insert(name, routed).map_err(|(name, rejected)| {
            let existing = self
                .entries
                .get(&name)
                .map(|entry| entry.server_name.as_str())
                .unwrap_or("unknown");
            ClientError::duplicate_operation(format!(
                "operation '{name}' is offered by both '{existing}' and '{}'",
                rejected.server_name
            ))
        })
    }

    pub fn get(&self, name: &str) -> Option<&RoutedOperation> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// All operations, sorted by name.
    pub fn operations(&self) -> Vec<&RoutedOperation> {
        let mut operations: Vec<&RoutedOperation> = self.entries.values().collect();
        operations.sort_by(|left, right| left.operation.name.cmp(&right.operation.name));
        operations
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.operations()
            .into_iter()
            .map(|routed| routed.operation.definition())
            .collect()
    }

    pub fn by_domain(&self, domain: Domain) -> Vec<&Operation> {
        self.operations()
            .into_iter()
            .map(|routed| &routed.operation)
            .filter(|operation| operation.domain == domain)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
