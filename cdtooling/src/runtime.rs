//! Tool runtime trait and an in-process server-backed executor.

use std::sync::Arc;
use std::time::Instant;

use cdcommon::BoxFuture;
use cdprovider::{ToolCall, ToolDefinition, ToolOutcome, ToolResult};

use crate::{
    InvocationRequest, NoopToolRuntimeHooks, ToolExecutionContext, ToolRuntimeHooks, ToolServer,
};

pub type ToolFuture<'a, T> = BoxFuture<'a, T>;

/// Invokes operations on behalf of the conversation layer.
///
/// Failures never escape as errors: transport problems, unknown names and
/// contract violations all come back as a [`cdprovider::ToolOutcome`].
pub trait ToolRuntime: Send + Sync {
    fn definitions(&self) -> Vec<ToolDefinition>;

    fn invoke<'a>(
        &'a self,
        tool_call: ToolCall,
        context: ToolExecutionContext,
    ) -> ToolFuture<'a, ToolResult>;
}

/// Calls a [`ToolServer`] directly, without a transport in between.
#[derive(Clone)]
pub struct LocalToolRuntime {
    server: Arc<ToolServer>,
    hooks: Arc<dyn ToolRuntimeHooks>,
}

impl LocalToolRuntime {
    pub fn new(server: Arc<ToolServer>) -> Self {
        Self {
            server,
            hooks: Arc::new(NoopToolRuntimeHooks),
        }
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn ToolRuntimeHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn server(&self) -> Arc<ToolServer> {
        Arc::clone(&self.server)
    }
}

impl ToolRuntime for LocalToolRuntime {
    fn definitions(&self) -> Vec<ToolDefinition> {
        self.server.registry().definitions()
    }

    fn invoke<'a>(
        &'a self,
        tool_call: ToolCall,
        context: ToolExecutionContext,
    ) -> ToolFuture<'a, ToolResult> {
        Box::pin(async move {
            let started = Instant::now();
            self.hooks.on_invocation_start(&tool_call, &context);

            let request = InvocationRequest {
                operation_name: tool_call.name.clone(),
                arguments: tool_call.arguments.clone(),
            };
            let outcome: ToolOutcome = self.server.handle(&request).into();

            self.hooks
                .on_invocation_outcome(&tool_call, &context, &outcome, 1, started.elapsed());
            ToolResult::from_call(&tool_call, outcome)
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use cdcommon::Domain;
    use serde_json::json;

    use super::*;
    use crate::InMemoryRecordStore;

    #[derive(Default)]
    struct RecordingHooks {
        events: Mutex<Vec<String>>,
    }

    impl ToolRuntimeHooks for RecordingHooks {
        fn on_invocation_start(&self, tool_call: &ToolCall, context: &ToolExecutionContext) {
            self.events
                .lock()
                .expect("events lock")
                .push(format!("start:{}:{}", tool_call.name, context.session_id));
        }

        fn on_invocation_outcome(
            &self,
            tool_call: &ToolCall,
            _context: &ToolExecutionContext,
            outcome: &ToolOutcome,
            attempts: u32,
            _elapsed: Duration,
        ) {
            self.events.lock().expect("events lock").push(format!(
                "outcome:{}:{}:{attempts}",
                tool_call.name,
                outcome.kind()
            ));
        }
    }

    fn runtime(hooks: Arc<RecordingHooks>) -> LocalToolRuntime {
        let store = InMemoryRecordStore::from_json_value(json!({
            "grievances": {"GRV-2024-001": {"status": "resolved"}}
        }))
        .expect("records");
        let server = ToolServer::with_builtin_operations("local", Arc::new(store)).expect("server");
        LocalToolRuntime::new(Arc::new(server)).with_hooks(hooks)
    }

    #[tokio::test]
    async fn runtime_invokes_server_and_reports_hooks() {
        let hooks = Arc::new(RecordingHooks::default());
        let runtime = runtime(Arc::clone(&hooks));

        let result = runtime
            .invoke(
                ToolCall::new("call_1", "grievance-status")
                    .with_argument("grievance_id", "GRV-2024-001"),
                ToolExecutionContext::new("session-1"),
            )
            .await;

        assert_eq!(result.tool_call_id, "call_1");
        assert!(result.outcome.is_record());

        let events = hooks.events.lock().expect("events lock").clone();
        assert_eq!(
            events,
            vec![
                "start:grievance-status:session-1".to_string(),
                "outcome:grievance-status:record:1".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn runtime_maps_missing_records_to_not_found() {
        let runtime = runtime(Arc::new(RecordingHooks::default()));

        let result = runtime
            .invoke(
                ToolCall::new("call_2", "identity-status")
                    .with_argument("identity_number", "ABCD1234EFGH"),
                ToolExecutionContext::new("session-2"),
            )
            .await;

        assert_eq!(
            result.outcome,
            ToolOutcome::NotFound {
                domain: Domain::Identity,
                key: "ABCD1234EFGH".to_string()
            }
        );
    }

    #[test]
    fn runtime_exposes_server_definitions() {
        let runtime = runtime(Arc::new(RecordingHooks::default()));
        assert_eq!(runtime.definitions().len(), 4);
    }
}
