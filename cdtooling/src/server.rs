//! Tool server: a sealed operation registry answering invocation requests
//! from a record store.
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use cdtooling::{InMemoryRecordStore, InvocationRequest, InvocationResponse, ToolServer};
//!
//! let server = ToolServer::builder("gov", Arc::new(InMemoryRecordStore::new()))
//!     .with_builtin_operations()
//!     .expect("builtins register")
//!     .build();
//!
//! let response = server.handle(&InvocationRequest::new("vehicle-status"));
//! assert!(matches!(response, InvocationResponse::UnknownOperation { .. }));
//! ```

use std::sync::Arc;

use cdcommon::Domain;
use cdprovider::{StatusRecord, ToolOutcome};
use serde::{Deserialize, Serialize};

use crate::{
    Arguments, Operation, OperationRegistry, RecordStore, ToolError, builtin_operations,
    validate_arguments,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationRequest {
    #[serde(rename = "name")]
    pub operation_name: String,
    #[serde(default)]
    pub arguments: Arguments,
}

impl InvocationRequest {
    pub fn new(operation_name: impl Into<String>) -> Self {
        Self {
            operation_name: operation_name.into(),
            arguments: Arguments::new(),
        }
    }

    pub fn with_argument(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.arguments.insert(key.into(), value.into());
        self
    }
}

/// Every well-formed request gets exactly one of these back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum InvocationResponse {
    Ok { payload: StatusRecord },
    NotFound { domain: Domain, key: String },
    BadRequest { message: String },
    UnknownOperation { name: String },
}

impl InvocationResponse {
    pub fn status(&self) -> &'static str {
        match self {
            Self::Ok { .. } => "ok",
            Self::NotFound { .. } => "not_found",
            Self::BadRequest { .. } => "bad_request",
            Self::UnknownOperation { .. } => "unknown_operation",
        }
    }
}

impl From<InvocationResponse> for ToolOutcome {
    fn from(value: InvocationResponse) -> Self {
        match value {
            InvocationResponse::Ok { payload } => ToolOutcome::Record { payload },
            InvocationResponse::NotFound { domain, key } => ToolOutcome::NotFound { domain, key },
            InvocationResponse::BadRequest { message } => ToolOutcome::BadRequest { message },
            InvocationResponse::UnknownOperation { name } => ToolOutcome::UnknownOperation { name },
        }
    }
}

pub struct ToolServerBuilder {
    name: String,
    registry: OperationRegistry,
    store: Arc<dyn RecordStore>,
}

impl ToolServerBuilder {
    pub fn register(mut self, operation: Operation) -> Result<Self, ToolError> {
        self.registry.register(operation)?;
        Ok(self)
    }

    pub fn with_builtin_operations(self) -> Result<Self, ToolError> {
        builtin_operations()
            .into_iter()
            .try_fold(self, |builder, operation| builder.register(operation))
    }

    /// Seals the registry; the returned server can no longer gain operations.
    pub fn build(mut self) -> ToolServer {
        self.registry.seal();
        ToolServer {
            name: self.name,
            registry: self.registry,
            store: self.store,
        }
    }
}

pub struct ToolServer {
    name: String,
    registry: OperationRegistry,
    store: Arc<dyn RecordStore>,
}

impl ToolServer {
    pub fn builder(name: impl Into<String>, store: Arc<dyn RecordStore>) -> ToolServerBuilder {
        ToolServerBuilder {
            name: name.into(),
            registry: OperationRegistry::new(),
            store,
        }
    }

    /// Server over the four built-in status operations.
    pub fn with_builtin_operations(
        name: impl Into<String>,
        store: Arc<dyn RecordStore>,
    ) -> Result<Self, ToolError> {
        Ok(Self::builder(name, store).with_builtin_operations()?.build())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn operations(&self) -> Vec<Operation> {
        self.registry.operations()
    }

    pub fn registry(&self) -> &OperationRegistry {
        &self.registry
    }

    pub fn handle(&self, request: &InvocationRequest) -> InvocationResponse {
        let Some(operation) = self.registry.get(&request.operation_name) else {
            return InvocationResponse::UnknownOperation {
                name: request.operation_name.clone(),
            };
        };

        let key = match validate_arguments(operation, &request.arguments) {
            Ok(key) => key,
            Err(error) => {
                return InvocationResponse::BadRequest {
                    message: error.message,
                };
            }
        };

        match self.store.lookup(operation.domain, key) {
            Some(payload) => InvocationResponse::Ok { payload },
            None => InvocationResponse::NotFound {
                domain: operation.domain,
                key: key.to_string(),
            },
        }
    }
}

impl std::fmt::Debug for ToolServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolServer")
            .field("name", &self.name)
            .field("operations", &self.registry.len())
            .finish()
    }
}
