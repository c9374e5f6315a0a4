//! Application configuration: TOML file, then environment overrides.
//!
//! ```rust
//! use civicdesk::config::{AppConfig, TransportKind};
//!
//! let config = AppConfig::from_toml_str(
//!     r#"
//!     records = "data/gov_database.json"
//!     invoke_timeout_ms = 2000
//!
//!     [[servers]]
//!     name = "records"
//!     "#,
//! )
//! .expect("valid config");
//!
//! assert_eq!(config.invoke_timeout_ms, 2000);
//! assert_eq!(config.servers[0].transport, TransportKind::InProcess);
//! assert!(config.validate().is_ok());
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use cdchat::DEFAULT_EXIT_COMMAND;
use cdclient::{ClientOptions, RetryPolicy};
use cdprovider::ApiKeyCredential;
use serde::Deserialize;

use crate::StartupError;

pub const DEFAULT_CONFIG_FILE: &str = "civicdesk.toml";
pub const DEFAULT_RECORDS_PATH: &str = "data/gov_database.json";
pub const API_KEY_ENV: &str = "CIVICDESK_API_KEY";
pub const FALLBACK_API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const RECORDS_ENV: &str = "CIVICDESK_RECORDS";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    Stdio,
    #[default]
    InProcess,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    pub name: String,
    #[serde(default)]
    pub transport: TransportKind,
    pub command: Option<String>,
    #[serde(default)]
    pub args: Vec<String>,
    /// Record file for an in-process server; falls back to the top-level `records`.
    pub records: Option<PathBuf>,
}

impl ServerConfig {
    pub fn in_process(name: impl Into<String>, records: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            transport: TransportKind::InProcess,
            command: None,
            args: Vec::new(),
            records: Some(records.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub api_key: Option<String>,
    /// Extra environment variable to read the credential from, checked first.
    pub api_key_env: Option<String>,
    pub records: PathBuf,
    pub invoke_timeout_ms: u64,
    pub discovery_timeout_ms: u64,
    pub reasoning_timeout_ms: u64,
    pub retry_backoff_ms: u64,
    pub max_invocations_per_turn: usize,
    pub exit_command: String,
    pub servers: Vec<ServerConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_key_env: None,
            records: PathBuf::from(DEFAULT_RECORDS_PATH),
            invoke_timeout_ms: 5_000,
            discovery_timeout_ms: 10_000,
            reasoning_timeout_ms: 30_000,
            retry_backoff_ms: 250,
            max_invocations_per_turn: 4,
            exit_command: DEFAULT_EXIT_COMMAND.to_string(),
            servers: Vec::new(),
        }
    }
}

impl AppConfig {
    pub fn from_toml_str(document: &str) -> Result<Self, StartupError> {
        Ok(toml::from_str(document)?)
    }

    /// Reads `path` when given; otherwise `civicdesk.toml` in the working
    /// directory if present, else the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, StartupError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default.exists() {
                    return Ok(Self::default());
                }
                default
            }
        };

        let document = std::fs::read_to_string(&path).map_err(|error| {
            StartupError::config(format!("cannot read {}: {error}", path.display()))
        })?;
        Self::from_toml_str(&document)
    }

    /// Applies environment overrides through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(records) = lookup(RECORDS_ENV).filter(|value| !value.trim().is_empty()) {
            self.records = PathBuf::from(records);
        }
    }

    /// The reasoning credential, from the environment first and the file last.
    pub fn resolve_credential<F>(&self, lookup: F) -> Result<ApiKeyCredential, StartupError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut candidates: Vec<(String, Option<String>)> = Vec::new();
        if let Some(name) = &self.api_key_env {
            candidates.push((name.clone(), lookup(name)));
        }
        candidates.push((API_KEY_ENV.to_string(), lookup(API_KEY_ENV)));
        candidates.push((FALLBACK_API_KEY_ENV.to_string(), lookup(FALLBACK_API_KEY_ENV)));
        candidates.push(("config file".to_string(), self.api_key.clone()));

        Ok(ApiKeyCredential::first_present(candidates)?)
    }

    pub fn validate(&self) -> Result<(), StartupError> {
        for (field, value) in [
            ("invoke_timeout_ms", self.invoke_timeout_ms),
            ("discovery_timeout_ms", self.discovery_timeout_ms),
            ("reasoning_timeout_ms", self.reasoning_timeout_ms),
        ] {
            if value == 0 {
                return Err(StartupError::config(format!(
                    "{field} must be greater than zero"
                )));
            }
        }

        if self.max_invocations_per_turn == 0 {
            return Err(StartupError::config(
                "max_invocations_per_turn must be at least 1",
            ));
        }

        if self.exit_command.trim().is_empty() {
            return Err(StartupError::config("exit_command must not be empty"));
        }

        let mut names = HashSet::new();
        for server in &self.servers {
            if server.name.trim().is_empty() {
                return Err(StartupError::config("server names must not be empty"));
            }

            if !names.insert(server.name.as_str()) {
                return Err(StartupError::config(format!(
                    "server name '{}' is configured more than once",
                    server.name
                )));
            }

            if server.transport == TransportKind::Stdio
                && server
                    .command
                    .as_deref()
                    .is_none_or(|command| command.trim().is_empty())
            {
                return Err(StartupError::config(format!(
                    "stdio server '{}' needs a command",
                    server.name
                )));
            }
        }

        Ok(())
    }

    /// Configured servers, or one in-process server over `records`.
    pub fn effective_servers(&self) -> Vec<ServerConfig> {
        if self.servers.is_empty() {
            return vec![ServerConfig::in_process("records", self.records.clone())];
        }

        self.servers.clone()
    }

    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            invoke_timeout: Duration::from_millis(self.invoke_timeout_ms),
            discovery_timeout: Duration::from_millis(self.discovery_timeout_ms),
            retry: RetryPolicy::default()
                .with_initial_backoff(Duration::from_millis(self.retry_backoff_ms)),
        }
    }

    pub fn reasoning_timeout(&self) -> Duration {
        Duration::from_millis(self.reasoning_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::StartupErrorKind;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = AppConfig::default();
        assert_eq!(config.invoke_timeout_ms, 5_000);
        assert_eq!(config.discovery_timeout_ms, 10_000);
        assert_eq!(config.reasoning_timeout_ms, 30_000);
        assert_eq!(config.retry_backoff_ms, 250);
        assert_eq!(config.max_invocations_per_turn, 4);
        assert_eq!(config.exit_command, "exit");
        assert_eq!(config.effective_servers().len(), 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn environment_credential_wins_over_file() {
        let config = AppConfig::from_toml_str(r#"api_key = "from-file""#).expect("config");

        let credential = config
            .resolve_credential(env(&[("GEMINI_API_KEY", "from-gemini")]))
            .expect("credential");
        assert_eq!(credential.source(), "GEMINI_API_KEY");
        assert_eq!(credential.secret().expose(), "from-gemini");

        let credential = config.resolve_credential(env(&[])).expect("credential");
        assert_eq!(credential.source(), "config file");
    }

    #[test]
    fn missing_credential_is_fatal() {
        let error = AppConfig::default()
            .resolve_credential(env(&[("CIVICDESK_API_KEY", "  ")]))
            .expect_err("no credential");
        assert_eq!(error.kind, StartupErrorKind::Credential);
    }

    #[test]
    fn records_path_can_be_overridden() {
        let mut config = AppConfig::default();
        config.apply_env(env(&[("CIVICDESK_RECORDS", "/srv/records.json")]));
        assert_eq!(config.records, PathBuf::from("/srv/records.json"));
    }

    #[test]
    fn duplicate_server_names_are_rejected() {
        let config = AppConfig::from_toml_str(
            r#"
            [[servers]]
            name = "records"

            [[servers]]
            name = "records"
            transport = "stdio"
            command = "civicdesk-tools"
            "#,
        )
        .expect("config");

        let error = config.validate().expect_err("duplicate");
        assert_eq!(error.kind, StartupErrorKind::Config);
        assert!(error.message.contains("records"));
    }

    #[test]
    fn stdio_server_needs_a_command() {
        let config = AppConfig::from_toml_str(
            r#"
            [[servers]]
            name = "remote"
            transport = "stdio"
            "#,
        )
        .expect("config");

        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let error = AppConfig::from_toml_str("invoke_timeout = 5").expect_err("unknown field");
        assert_eq!(error.kind, StartupErrorKind::Config);
    }

    #[test]
    fn zero_timeouts_are_rejected() {
        let config = AppConfig {
            reasoning_timeout_ms: 0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn config_file_is_read_from_an_explicit_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("civicdesk.toml");
        std::fs::write(&path, "max_invocations_per_turn = 2\nexit_command = \"quit\"\n")
            .expect("write config");

        let config = AppConfig::load(Some(&path)).expect("config");
        assert_eq!(config.max_invocations_per_turn, 2);
        assert_eq!(config.exit_command, "quit");

        let error = AppConfig::load(Some(&dir.path().join("missing.toml"))).expect_err("missing");
        assert_eq!(error.kind, StartupErrorKind::Config);
    }
}
