//! Government-service assistant over Aadhaar, PAN, passport and grievance
//! status systems.
//!
//! This crate wires the workspace together: it loads configuration, starts or
//! connects to tool servers, discovers their operations and runs the
//! conversation loop on top.
//!
//! ```rust
//! use civicdesk::{Domain, Operation, builtin_operations};
//!
//! let operations: Vec<Operation> = builtin_operations();
//! assert_eq!(operations.len(), 4);
//! assert!(operations.iter().any(|operation| operation.domain == Domain::Grievance));
//! ```

mod error;

pub mod config;
pub mod logging;
pub mod prelude;
pub mod prompt;
pub mod runtime;

pub use cdchat;
pub use cdclient;
pub use cdcommon;
pub use cdobserve;
pub use cdprovider;
pub use cdtooling;
pub use cdwire;

pub use cdchat::{
    ChatError, ChatErrorKind, ChatSession, ChatTurnRequest, Classification, ClassifiedAs,
    ConversationLoop, ConversationService, ConversationServiceBuilder, DispatchPolicy,
    KeywordDispatchPolicy, PolicyReasoner, TurnResult, TurnState,
};
pub use cdclient::{ClientError, ClientErrorKind, ClientOptions, ServerEndpoint, ToolClient};
pub use cdcommon::{Domain, SessionId, TraceId};
pub use cdprovider::{
    ApiKeyCredential, ReasoningProvider, SecretString, ToolCall, ToolDefinition, ToolOutcome,
    ToolResult,
};
pub use cdtooling::{InMemoryRecordStore, Operation, RecordStore, ToolServer, builtin_operations};
pub use cdwire::serve_connection;

pub use error::{StartupError, StartupErrorKind};
pub use runtime::{Runtime, build_runtime, build_runtime_with_provider};
