//! Capability layer: operations, the record store, and the tool server.

mod args;
mod error;
mod hooks;
mod operation;
mod registry;
mod runtime;
mod server;
mod store;
mod types;

pub mod prelude {
    pub use crate::{
        InMemoryRecordStore, InvocationRequest, InvocationResponse, LocalToolRuntime, Operation,
        OperationRegistry, RecordStore, ToolError, ToolErrorKind, ToolExecutionContext,
        ToolFuture, ToolRuntime, ToolRuntimeHooks, ToolServer, builtin_operations,
    };
}

pub use args::{Arguments, parse_arguments, validate_arguments};
pub use error::{ToolError, ToolErrorKind};
pub use hooks::{NoopToolRuntimeHooks, ToolRuntimeHooks};
pub use operation::{Operation, builtin_operations};
pub use registry::OperationRegistry;
pub use runtime::{LocalToolRuntime, ToolFuture, ToolRuntime};
pub use server::{InvocationRequest, InvocationResponse, ToolServer, ToolServerBuilder};
pub use store::{InMemoryRecordStore, RecordStore};
pub use types::ToolExecutionContext;
