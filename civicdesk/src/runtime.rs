//! Startup phase: endpoints, discovery and conversation wiring.
//!
//! Everything the conversation needs is built here once and handed over as
//! immutable shared state; a failure at any step aborts startup.

use std::sync::Arc;
use std::time::Duration;

use cdchat::{
    ChatError, ChatSession, ConversationLoop, ConversationService, DispatchPolicy,
    KeywordDispatchPolicy, PolicyReasoner, TurnHooks, TurnResult, TurnState,
};
use cdclient::{ServerEndpoint, ToolClient};
use cdcommon::SessionId;
use cdobserve::{MetricsObservabilityHooks, SafeToolHooks, SafeTurnHooks, TracingObservabilityHooks};
use cdprovider::{
    ApiKeyCredential, ReasoningProvider, ToolCall, ToolDefinition, ToolOutcome,
};
use cdtooling::{
    InMemoryRecordStore, ToolError, ToolExecutionContext, ToolRuntimeHooks, ToolServer,
};

use crate::config::{AppConfig, ServerConfig, TransportKind};
use crate::{StartupError, prompt::SYSTEM_PROMPT};

pub const REPL_SESSION_ID: &str = "citizen";

pub struct Runtime {
    pub credential: ApiKeyCredential,
    pub client: Arc<ToolClient>,
    pub service: ConversationService,
    pub session: ChatSession,
    pub exit_command: String,
}

impl Runtime {
    pub fn operations(&self) -> Vec<ToolDefinition> {
        self.client.operations().definitions()
    }

    pub fn conversation_loop(&self) -> ConversationLoop {
        ConversationLoop::new(self.service.clone(), self.session.clone())
            .with_exit_command(self.exit_command.clone())
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("credential", &self.credential)
            .field("client", &self.client)
            .field("exit_command", &self.exit_command)
            .finish()
    }
}

/// Builds the runtime with the built-in policy-driven reasoning component.
pub async fn build_runtime(
    config: &AppConfig,
    credential: ApiKeyCredential,
) -> Result<Runtime, StartupError> {
    let policy: Arc<dyn DispatchPolicy> = Arc::new(KeywordDispatchPolicy::new()?);
    let provider = Arc::new(PolicyReasoner::new(Arc::clone(&policy)));
    build_runtime_with_provider(config, credential, provider, policy).await
}

pub async fn build_runtime_with_provider(
    config: &AppConfig,
    credential: ApiKeyCredential,
    provider: Arc<dyn ReasoningProvider>,
    policy: Arc<dyn DispatchPolicy>,
) -> Result<Runtime, StartupError> {
    config.validate()?;

    let endpoints = endpoints(config)?;
    let client = ToolClient::connect(&endpoints, config.client_options())
        .await?
        .with_hooks(Arc::new(SafeToolHooks::new(ObservabilityHooks)));
    let client = Arc::new(client);

    tracing::info!(
        phase = "startup",
        event = "runtime_ready",
        servers = client.server_names().len(),
        operations = client.operations().len(),
        credential_source = credential.source()
    );

    let service = ConversationService::builder(provider, client.clone())
        .policy(policy)
        .hooks(Arc::new(SafeTurnHooks::new(ObservabilityHooks)))
        .max_invocations_per_turn(config.max_invocations_per_turn)
        .reasoning_timeout(config.reasoning_timeout())
        .build()?;

    Ok(Runtime {
        credential,
        client,
        service,
        session: ChatSession::new(REPL_SESSION_ID).with_system_prompt(SYSTEM_PROMPT),
        exit_command: config.exit_command.clone(),
    })
}

/// One endpoint per configured server; in-process servers load their records now.
pub fn endpoints(config: &AppConfig) -> Result<Vec<ServerEndpoint>, StartupError> {
    config
        .effective_servers()
        .iter()
        .map(|server| endpoint(config, server))
        .collect()
}

fn endpoint(config: &AppConfig, server: &ServerConfig) -> Result<ServerEndpoint, StartupError> {
    match server.transport {
        TransportKind::Stdio => {
            let command = server.command.clone().ok_or_else(|| {
                StartupError::config(format!("stdio server '{}' needs a command", server.name))
            })?;
            Ok(ServerEndpoint::stdio(
                server.name.clone(),
                command,
                server.args.clone(),
            ))
        }
        TransportKind::InProcess => {
            let path = server.records.as_ref().unwrap_or(&config.records);
            let store = InMemoryRecordStore::from_path(path).map_err(|error| {
                StartupError::records(format!("{} ({}): {error}", server.name, path.display()))
            })?;
            tracing::info!(
                phase = "startup",
                event = "records_loaded",
                server = %server.name,
                records = store.len()
            );

            let tool_server = ToolServer::with_builtin_operations(server.name.clone(), Arc::new(store))?;
            Ok(ServerEndpoint::in_process(
                server.name.clone(),
                Arc::new(tool_server),
            ))
        }
    }
}

/// Tracing and metrics together, for both invocation and turn events.
#[derive(Debug, Clone, Copy, Default)]
struct ObservabilityHooks;

impl ToolRuntimeHooks for ObservabilityHooks {
    fn on_invocation_start(&self, tool_call: &ToolCall, context: &ToolExecutionContext) {
        TracingObservabilityHooks.on_invocation_start(tool_call, context);
        MetricsObservabilityHooks.on_invocation_start(tool_call, context);
    }

    fn on_retry_scheduled(
        &self,
        tool_call: &ToolCall,
        context: &ToolExecutionContext,
        attempt: u32,
        delay: Duration,
        error: &ToolError,
    ) {
        TracingObservabilityHooks.on_retry_scheduled(tool_call, context, attempt, delay, error);
        MetricsObservabilityHooks.on_retry_scheduled(tool_call, context, attempt, delay, error);
    }

    fn on_invocation_outcome(
        &self,
        tool_call: &ToolCall,
        context: &ToolExecutionContext,
        outcome: &ToolOutcome,
        attempts: u32,
        elapsed: Duration,
    ) {
        TracingObservabilityHooks
            .on_invocation_outcome(tool_call, context, outcome, attempts, elapsed);
        MetricsObservabilityHooks
            .on_invocation_outcome(tool_call, context, outcome, attempts, elapsed);
    }
}

impl TurnHooks for ObservabilityHooks {
    fn on_turn_start(&self, session_id: &SessionId) {
        TracingObservabilityHooks.on_turn_start(session_id);
        MetricsObservabilityHooks.on_turn_start(session_id);
    }

    fn on_state(&self, session_id: &SessionId, state: TurnState) {
        TracingObservabilityHooks.on_state(session_id, state);
        MetricsObservabilityHooks.on_state(session_id, state);
    }

    fn on_turn_composed(&self, session_id: &SessionId, result: &TurnResult, elapsed: Duration) {
        TracingObservabilityHooks.on_turn_composed(session_id, result, elapsed);
        MetricsObservabilityHooks.on_turn_composed(session_id, result, elapsed);
    }

    fn on_turn_failed(&self, session_id: &SessionId, error: &ChatError, elapsed: Duration) {
        TracingObservabilityHooks.on_turn_failed(session_id, error, elapsed);
        MetricsObservabilityHooks.on_turn_failed(session_id, error, elapsed);
    }
}
