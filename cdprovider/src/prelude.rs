//! Common `cdprovider` imports for downstream crates.

pub use crate::{
    ApiKeyCredential, Message, OutputItem, ProviderError, ProviderErrorKind, ProviderFuture,
    ReasoningProvider, ReasoningRequest, ReasoningResponse, Role, SecretString, StatusRecord,
    StopReason, ToolCall, ToolDefinition, ToolOutcome, ToolResult,
};
pub use cdcommon::{BoxFuture, Domain, MetadataMap};
