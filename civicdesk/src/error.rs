//! Startup failures. Every one of them is fatal: no turn is served.

use std::error::Error;
use std::fmt::{Display, Formatter};

use cdchat::ChatError;
use cdclient::{ClientError, ClientErrorKind};
use cdprovider::ProviderError;
use cdtooling::ToolError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupErrorKind {
    Config,
    Credential,
    Records,
    Connect,
    Discovery,
    DuplicateOperation,
    Service,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartupError {
    pub kind: StartupErrorKind,
    pub message: String,
}

impl StartupError {
    pub fn new(kind: StartupErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(StartupErrorKind::Config, message)
    }

    pub fn credential(message: impl Into<String>) -> Self {
        Self::new(StartupErrorKind::Credential, message)
    }

    pub fn records(message: impl Into<String>) -> Self {
        Self::new(StartupErrorKind::Records, message)
    }

    pub fn service(message: impl Into<String>) -> Self {
        Self::new(StartupErrorKind::Service, message)
    }
}

impl Display for StartupError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl Error for StartupError {}

impl From<ClientError> for StartupError {
    fn from(value: ClientError) -> Self {
        let kind = match value.kind {
            ClientErrorKind::NoEndpoints => StartupErrorKind::Config,
            ClientErrorKind::Connect => StartupErrorKind::Connect,
            ClientErrorKind::Discovery => StartupErrorKind::Discovery,
            ClientErrorKind::DuplicateOperation => StartupErrorKind::DuplicateOperation,
        };
        Self::new(kind, value.message)
    }
}

impl From<ToolError> for StartupError {
    fn from(value: ToolError) -> Self {
        Self::records(value.to_string())
    }
}

impl From<ProviderError> for StartupError {
    fn from(value: ProviderError) -> Self {
        Self::credential(value.message)
    }
}

impl From<ChatError> for StartupError {
    fn from(value: ChatError) -> Self {
        Self::service(value.to_string())
    }
}

impl From<toml::de::Error> for StartupError {
    fn from(value: toml::de::Error) -> Self {
        Self::config(format!("invalid configuration: {value}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_operations_keep_their_kind() {
        let error = StartupError::from(ClientError::duplicate_operation(
            "operation 'grievance-status' offered by both 'a' and 'b'",
        ));

        assert_eq!(error.kind, StartupErrorKind::DuplicateOperation);
        assert!(error.to_string().starts_with("DuplicateOperation: "));
    }
}
