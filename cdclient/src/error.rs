//! Startup errors raised while connecting to and discovering tool servers.
//!
//! Invocation failures never surface here; they become
//! [`cdprovider::ToolOutcome`] values instead.

use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientErrorKind {
    NoEndpoints,
    Connect,
    Discovery,
    DuplicateOperation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientError {
    pub kind: ClientErrorKind,
    pub message: String,
}

impl ClientError {
    pub fn new(kind: ClientErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn no_endpoints() -> Self {
        Self::new(
            ClientErrorKind::NoEndpoints,
            "at least one tool server must be configured",
        )
    }

    pub fn connect(message: impl Into<String>) -> Self {
        Self::new(ClientErrorKind::Connect, message)
    }

    pub fn discovery(message: impl Into<String>) -> Self {
        Self::new(ClientErrorKind::Discovery, message)
    }

    pub fn duplicate_operation(message: impl Into<String>) -> Self {
        Self::new(ClientErrorKind::DuplicateOperation, message)
    }
}

impl Display for ClientError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl Error for ClientError {}
