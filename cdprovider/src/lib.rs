//! Contract between the conversation layer and the reasoning component.

mod credentials;
mod error;
mod model;
mod provider;

pub mod prelude;

pub use credentials::{ApiKeyCredential, SecretString};
pub use error::{ProviderError, ProviderErrorKind};
pub use model::{
    Message, OutputItem, ReasoningRequest, ReasoningRequestBuilder, ReasoningResponse, Role,
    StatusRecord, StopReason, ToolCall, ToolDefinition, ToolOutcome, ToolResult,
};
pub use provider::{ProviderFuture, ReasoningProvider};
