//! Tool registration, invocation, and record-store errors.

use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolErrorKind {
    UnknownOperation,
    BadRequest,
    DuplicateOperation,
    RegistrationClosed,
    RecordStore,
    Timeout,
    Transport,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolError {
    pub kind: ToolErrorKind,
    pub message: String,
    pub retryable: bool,
    pub operation: Option<String>,
    pub tool_call_id: Option<String>,
}

impl ToolError {
    pub fn new(kind: ToolErrorKind, message: impl Into<String>, retryable: bool) -> Self {
        Self {
            kind,
            message: message.into(),
            retryable,
            operation: None,
            tool_call_id: None,
        }
    }

    pub fn unknown_operation(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::UnknownOperation, message, false)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::BadRequest, message, false)
    }

    pub fn duplicate_operation(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::DuplicateOperation, message, false)
    }

    pub fn registration_closed(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::RegistrationClosed, message, false)
    }

    pub fn record_store(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::RecordStore, message, false)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Timeout, message, true)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Transport, message, true)
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Other, message, false)
    }

    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    pub fn with_tool_call_id(mut self, tool_call_id: impl Into<String>) -> Self {
        self.tool_call_id = Some(tool_call_id.into());
        self
    }

    pub fn is_retryable(&self) -> bool {
        self.retryable
    }

    /// Failures of the transport between client and server, as opposed to
    /// contract violations or configuration mistakes.
    pub fn is_transport_failure(&self) -> bool {
        matches!(self.kind, ToolErrorKind::Timeout | ToolErrorKind::Transport)
    }
}

impl Display for ToolError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match (&self.operation, &self.tool_call_id) {
            (Some(operation), Some(tool_call_id)) => write!(
                f,
                "{:?} [operation={}, call_id={}]: {}",
                self.kind, operation, tool_call_id, self.message
            ),
            (Some(operation), None) => {
                write!(f, "{:?} [operation={}]: {}", self.kind, operation, self.message)
            }
            _ => write!(f, "{:?}: {}", self.kind, self.message),
        }
    }
}

impl Error for ToolError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_kinds_are_retryable() {
        let timeout = ToolError::timeout("no reply");
        assert!(timeout.is_retryable());
        assert!(timeout.is_transport_failure());

        let bad = ToolError::bad_request("extra key");
        assert!(!bad.is_retryable());
        assert!(!bad.is_transport_failure());
    }

    #[test]
    fn context_fields_are_included_in_display() {
        let error = ToolError::unknown_operation("missing")
            .with_operation("vehicle-status")
            .with_tool_call_id("call_1");

        let rendered = error.to_string();
        assert!(rendered.contains("vehicle-status"));
        assert!(rendered.contains("call_1"));
    }
}
