//! Common imports for civicdesk applications.

pub use crate::config::{AppConfig, ServerConfig, TransportKind};
pub use crate::runtime::{Runtime, build_runtime, build_runtime_with_provider};
pub use crate::{
    ChatSession, ChatTurnRequest, ConversationLoop, ConversationService, DispatchPolicy, Domain,
    KeywordDispatchPolicy, Operation, PolicyReasoner, ReasoningProvider, SessionId, StartupError,
    StartupErrorKind, ToolClient, ToolDefinition, ToolOutcome, ToolServer, TurnResult,
};
