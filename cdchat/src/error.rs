//! Chat-layer errors and classification.

use std::error::Error;
use std::fmt::{Display, Formatter};

use cdprovider::{ProviderError, ProviderErrorKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatErrorKind {
    InvalidRequest,
    Reasoning,
    Timeout,
    Store,
    Policy,
    Io,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatError {
    pub kind: ChatErrorKind,
    pub message: String,
}

impl ChatError {
    pub fn new(kind: ChatErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::InvalidRequest, message)
    }

    pub fn reasoning(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::Reasoning, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::Timeout, message)
    }

    pub fn store(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::Store, message)
    }

    pub fn policy(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::Policy, message)
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::Io, message)
    }
}

impl Display for ChatError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl Error for ChatError {}

impl From<ProviderError> for ChatError {
    fn from(value: ProviderError) -> Self {
        match value.kind {
            ProviderErrorKind::Timeout => ChatError::timeout(value.to_string()),
            ProviderErrorKind::InvalidRequest => ChatError::invalid_request(value.to_string()),
            _ => ChatError::reasoning(value.to_string()),
        }
    }
}

impl From<regex::Error> for ChatError {
    fn from(value: regex::Error) -> Self {
        ChatError::policy(format!("invalid screening pattern: {value}"))
    }
}

impl From<std::io::Error> for ChatError {
    fn from(value: std::io::Error) -> Self {
        ChatError::io(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_timeouts_stay_timeouts() {
        let error = ChatError::from(ProviderError::timeout("slow"));
        assert_eq!(error.kind, ChatErrorKind::Timeout);

        let error = ChatError::from(ProviderError::unavailable("down"));
        assert_eq!(error.kind, ChatErrorKind::Reasoning);
    }
}
