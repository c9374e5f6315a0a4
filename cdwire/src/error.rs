//! Transport-level errors.

use std::error::Error;
use std::fmt::{Display, Formatter};

use cdtooling::ToolError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireErrorKind {
    Io,
    Spawn,
    Timeout,
    Closed,
    Protocol,
    Rpc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireError {
    pub kind: WireErrorKind,
    pub message: String,
    pub retryable: bool,
    pub code: Option<i64>,
}

impl WireError {
    pub fn new(kind: WireErrorKind, message: impl Into<String>, retryable: bool) -> Self {
        Self {
            kind,
            message: message.into(),
            retryable,
            code: None,
        }
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(WireErrorKind::Io, message, true)
    }

    pub fn spawn(message: impl Into<String>) -> Self {
        Self::new(WireErrorKind::Spawn, message, false)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(WireErrorKind::Timeout, message, true)
    }

    pub fn closed(message: impl Into<String>) -> Self {
        Self::new(WireErrorKind::Closed, message, true)
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Self::new(WireErrorKind::Protocol, message, false)
    }

    pub fn rpc(code: i64, message: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            ..Self::new(WireErrorKind::Rpc, message, false)
        }
    }

    /// Timeouts and lost connections; everything the single retry applies to.
    pub fn is_transport_failure(&self) -> bool {
        matches!(
            self.kind,
            WireErrorKind::Io | WireErrorKind::Timeout | WireErrorKind::Closed
        )
    }
}

impl Display for WireError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.code {
            Some(code) => write!(f, "{:?} ({code}): {}", self.kind, self.message),
            None => write!(f, "{:?}: {}", self.kind, self.message),
        }
    }
}

impl Error for WireError {}

impl From<std::io::Error> for WireError {
    fn from(value: std::io::Error) -> Self {
        WireError::io(value.to_string())
    }
}

impl From<WireError> for ToolError {
    fn from(value: WireError) -> Self {
        match value.kind {
            WireErrorKind::Timeout => ToolError::timeout(value.to_string()),
            WireErrorKind::Io | WireErrorKind::Closed => ToolError::transport(value.to_string()),
            WireErrorKind::Spawn | WireErrorKind::Protocol | WireErrorKind::Rpc => {
                ToolError::other(value.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use cdtooling::ToolErrorKind;

    use super::*;

    #[test]
    fn transport_failures_map_to_retryable_tool_errors() {
        let timeout: ToolError = WireError::timeout("no reply in 5s").into();
        assert_eq!(timeout.kind, ToolErrorKind::Timeout);
        assert!(timeout.retryable);

        let closed: ToolError = WireError::closed("peer hung up").into();
        assert_eq!(closed.kind, ToolErrorKind::Transport);
        assert!(closed.retryable);

        let rpc: ToolError = WireError::rpc(-32601, "Method not found").into();
        assert!(!rpc.retryable);
    }

    #[test]
    fn rpc_code_is_rendered() {
        let error = WireError::rpc(-32700, "Parse error");
        assert!(error.to_string().contains("-32700"));
        assert!(!error.is_transport_failure());
    }
}
