//! Line-delimited JSON-RPC 2.0 transport for tool discovery and invocation.
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use cdtooling::{InMemoryRecordStore, ToolServer};
//! use cdwire::handle_line;
//!
//! let server = ToolServer::with_builtin_operations("gov", Arc::new(InMemoryRecordStore::new()))
//!     .expect("server builds");
//! let response = handle_line(&server, r#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#)
//!     .expect("requests with an id are answered");
//! assert!(response.error.is_none());
//! ```

mod connection;
mod error;
mod messages;
mod server;

pub use connection::Connection;
pub use error::{WireError, WireErrorKind};
pub use messages::{
    CallToolParams, INTERNAL_ERROR, INVALID_PARAMS, INVALID_REQUEST, InitializeResult,
    JSONRPC_VERSION, ListToolsResult, METHOD_NOT_FOUND, PARSE_ERROR, RpcErrorObject, RpcRequest,
    RpcResponse, ServerInfo, ToolDescriptor, method,
};
pub use server::{handle_line, serve_connection};
