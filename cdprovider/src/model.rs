//! Reasoning request, response, and tool-call model types.
//!
//! ```rust
//! use cdprovider::{Message, ProviderErrorKind, ReasoningRequest, Role};
//!
//! let ok = ReasoningRequest::new_validated(vec![Message::new(
//!     Role::User,
//!     "status of grievance GRV-2024-001",
//! )]);
//! assert!(ok.is_ok());
//!
//! let err = ReasoningRequest::new_validated(Vec::new())
//!     .err()
//!     .expect("empty transcript should fail");
//! assert_eq!(err.kind, ProviderErrorKind::InvalidRequest);
//! ```

use std::collections::BTreeMap;

use cdcommon::{Domain, MetadataMap};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::ProviderError;

/// A status record exactly as the record store holds it.
pub type StatusRecord = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// An operation as advertised to the reasoning component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub domain: Domain,
    pub input_key: String,
}

impl ToolDefinition {
    pub fn new(
        name: impl Into<String>,
        domain: Domain,
        input_key: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            domain,
            input_key: input_key.into(),
        }
    }

    /// JSON schema accepting exactly one string property named `input_key`.
    pub fn input_schema(&self) -> Value {
        let mut properties = Map::new();
        properties.insert(
            self.input_key.clone(),
            json!({ "type": "string", "minLength": 1 }),
        );

        json!({
            "type": "object",
            "properties": properties,
            "required": [self.input_key],
            "additionalProperties": false
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: BTreeMap<String, String>,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: BTreeMap::new(),
        }
    }

    pub fn with_argument(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.arguments.insert(key.into(), value.into());
        self
    }
}

/// What became of one requested operation, as seen by the conversation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ToolOutcome {
    Record { payload: StatusRecord },
    NotFound { domain: Domain, key: String },
    BadRequest { message: String },
    UnknownOperation { name: String },
    Unavailable { message: String },
}

impl ToolOutcome {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Record { .. } => "record",
            Self::NotFound { .. } => "not_found",
            Self::BadRequest { .. } => "bad_request",
            Self::UnknownOperation { .. } => "unknown_operation",
            Self::Unavailable { .. } => "unavailable",
        }
    }

    pub fn is_record(&self) -> bool {
        matches!(self, Self::Record { .. })
    }

    /// Contract violations between the dispatcher and a tool server.
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, Self::BadRequest { .. } | Self::UnknownOperation { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub tool_call_id: String,
    pub name: String,
    pub arguments: BTreeMap<String, String>,
    pub outcome: ToolOutcome,
}

impl ToolResult {
    pub fn from_call(call: &ToolCall, outcome: ToolOutcome) -> Self {
        Self {
            tool_call_id: call.id.clone(),
            name: call.name.clone(),
            arguments: call.arguments.clone(),
            outcome,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputItem {
    Message(Message),
    ToolCall(ToolCall),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    EndTurn,
    ToolUse,
    Clarification,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReasoningResponse {
    pub provider: String,
    pub output: Vec<OutputItem>,
    pub stop_reason: StopReason,
}

impl ReasoningResponse {
    pub fn message(provider: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            output: vec![OutputItem::Message(Message::new(Role::Assistant, text))],
            stop_reason: StopReason::EndTurn,
        }
    }

    /// A question back to the user instead of an answer.
    pub fn clarification(provider: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            stop_reason: StopReason::Clarification,
            ..Self::message(provider, text)
        }
    }

    pub fn tool_calls(provider: impl Into<String>, calls: Vec<ToolCall>) -> Self {
        Self {
            provider: provider.into(),
            output: calls.into_iter().map(OutputItem::ToolCall).collect(),
            stop_reason: StopReason::ToolUse,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReasoningRequest {
    pub messages: Vec<Message>,
    pub tools: Vec<ToolDefinition>,
    pub tool_results: Vec<ToolResult>,
    pub metadata: MetadataMap,
}

impl ReasoningRequest {
    pub fn builder() -> ReasoningRequestBuilder {
        ReasoningRequestBuilder::default()
    }

    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            tools: Vec::new(),
            tool_results: Vec::new(),
            metadata: MetadataMap::new(),
        }
    }

    pub fn new_validated(messages: Vec<Message>) -> Result<Self, ProviderError> {
        let request = Self::new(messages);
        request.validate()?;
        Ok(request)
    }

    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_tool_results(mut self, tool_results: Vec<ToolResult>) -> Self {
        self.tool_results = tool_results;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// The newest user utterance in the transcript.
    pub fn latest_user_message(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|message| message.role == Role::User)
            .map(|message| message.content.as_str())
    }

    pub fn validate(&self) -> Result<(), ProviderError> {
        if self.messages.is_empty() {
            return Err(ProviderError::invalid_request(
                "at least one message is required",
            ));
        }

        if self.latest_user_message().is_none() {
            return Err(ProviderError::invalid_request(
                "transcript must contain a user message",
            ));
        }

        for result in &self.tool_results {
            if result.tool_call_id.trim().is_empty() {
                return Err(ProviderError::invalid_request(
                    "tool results must reference a tool call id",
                ));
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReasoningRequestBuilder {
    messages: Vec<Message>,
    tools: Vec<ToolDefinition>,
    tool_results: Vec<ToolResult>,
    metadata: MetadataMap,
}

impl ReasoningRequestBuilder {
    pub fn message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    pub fn messages(mut self, messages: Vec<Message>) -> Self {
        self.messages.extend(messages);
        self
    }

    pub fn tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = tools;
        self
    }

    pub fn tool_results(mut self, tool_results: Vec<ToolResult>) -> Self {
        self.tool_results = tool_results;
        self
    }

    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn build(self) -> Result<ReasoningRequest, ProviderError> {
        let request = ReasoningRequest {
            messages: self.messages,
            tools: self.tools,
            tool_results: self.tool_results,
            metadata: self.metadata,
        };

        request.validate()?;
        Ok(request)
    }
}
