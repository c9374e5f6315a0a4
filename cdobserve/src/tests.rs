use std::sync::{Arc, Mutex};
use std::time::Duration;

use cdchat::{ChatError, ClassifiedAs, TurnHooks, TurnResult, TurnState};
use cdcommon::{Domain, SessionId};
use cdprovider::{StatusRecord, ToolCall, ToolOutcome};
use cdtooling::{ToolError, ToolExecutionContext, ToolRuntimeHooks};

use crate::{MetricsObservabilityHooks, SafeToolHooks, SafeTurnHooks, TracingObservabilityHooks};

fn sample_tool_call() -> ToolCall {
    ToolCall::new("call-1", "grievance-status").with_argument("grievance_id", "GRV-2024-001")
}

fn sample_tool_context() -> ToolExecutionContext {
    ToolExecutionContext::new("session-1").with_trace_id("trace-1")
}

fn sample_outcomes() -> Vec<ToolOutcome> {
    vec![
        ToolOutcome::Record {
            payload: StatusRecord::new(),
        },
        ToolOutcome::NotFound {
            domain: Domain::Grievance,
            key: "GRV-2024-999".to_string(),
        },
        ToolOutcome::Unavailable {
            message: "no response".to_string(),
        },
        ToolOutcome::BadRequest {
            message: "missing grievance_id".to_string(),
        },
    ]
}

fn sample_turn_result() -> TurnResult {
    TurnResult {
        session_id: SessionId::from("session-1"),
        reply: "I checked CPGRAMS".to_string(),
        states: vec![
            TurnState::Received,
            TurnState::Classified(ClassifiedAs::Matched),
            TurnState::Composed,
        ],
        invocations: Vec::new(),
    }
}

fn exercise_tool_hooks(hooks: &dyn ToolRuntimeHooks) {
    let tool_error = ToolError::timeout("no response");

    hooks.on_invocation_start(&sample_tool_call(), &sample_tool_context());
    hooks.on_retry_scheduled(
        &sample_tool_call(),
        &sample_tool_context(),
        1,
        Duration::from_millis(250),
        &tool_error,
    );
    for outcome in sample_outcomes() {
        hooks.on_invocation_outcome(
            &sample_tool_call(),
            &sample_tool_context(),
            &outcome,
            2,
            Duration::from_millis(20),
        );
    }
}

fn exercise_turn_hooks(hooks: &dyn TurnHooks) {
    let session = SessionId::from("session-1");

    hooks.on_turn_start(&session);
    hooks.on_state(&session, TurnState::Classified(ClassifiedAs::Sensitive));
    hooks.on_turn_composed(&session, &sample_turn_result(), Duration::from_millis(30));
    hooks.on_turn_failed(
        &session,
        &ChatError::timeout("reasoning timed out"),
        Duration::from_millis(30),
    );
}

#[test]
fn tracing_hooks_smoke_test_all_callbacks() {
    exercise_tool_hooks(&TracingObservabilityHooks);
    exercise_turn_hooks(&TracingObservabilityHooks);
}

#[test]
fn metrics_hooks_smoke_test_all_callbacks() {
    exercise_tool_hooks(&MetricsObservabilityHooks);
    exercise_turn_hooks(&MetricsObservabilityHooks);
}

#[derive(Default, Clone)]
struct RecordingHooks {
    events: Arc<Mutex<Vec<&'static str>>>,
}

impl RecordingHooks {
    fn push(&self, event: &'static str) {
        self.events.lock().expect("events lock").push(event);
    }
}

impl ToolRuntimeHooks for RecordingHooks {
    fn on_invocation_start(&self, _tool_call: &ToolCall, _context: &ToolExecutionContext) {
        self.push("invocation_start");
    }

    fn on_retry_scheduled(
        &self,
        _tool_call: &ToolCall,
        _context: &ToolExecutionContext,
        _attempt: u32,
        _delay: Duration,
        _error: &ToolError,
    ) {
        self.push("retry_scheduled");
    }

    fn on_invocation_outcome(
        &self,
        _tool_call: &ToolCall,
        _context: &ToolExecutionContext,
        _outcome: &ToolOutcome,
        _attempts: u32,
        _elapsed: Duration,
    ) {
        self.push("invocation_outcome");
    }
}

impl TurnHooks for RecordingHooks {
    fn on_turn_start(&self, _session_id: &SessionId) {
        self.push("turn_start");
    }

    fn on_state(&self, _session_id: &SessionId, _state: TurnState) {
        self.push("state");
    }

    fn on_turn_composed(&self, _session_id: &SessionId, _result: &TurnResult, _elapsed: Duration) {
        self.push("turn_composed");
    }

    fn on_turn_failed(&self, _session_id: &SessionId, _error: &ChatError, _elapsed: Duration) {
        self.push("turn_failed");
    }
}

struct PanicHooks;

impl ToolRuntimeHooks for PanicHooks {
    fn on_invocation_start(&self, _tool_call: &ToolCall, _context: &ToolExecutionContext) {
        panic!("start panic");
    }

    fn on_retry_scheduled(
        &self,
        _tool_call: &ToolCall,
        _context: &ToolExecutionContext,
        _attempt: u32,
        _delay: Duration,
        _error: &ToolError,
    ) {
        panic!("retry panic");
    }

    fn on_invocation_outcome(
        &self,
        _tool_call: &ToolCall,
        _context: &ToolExecutionContext,
        _outcome: &ToolOutcome,
        _attempts: u32,
        _elapsed: Duration,
    ) {
        panic!("outcome panic");
    }
}

impl TurnHooks for PanicHooks {
    fn on_turn_start(&self, _session_id: &SessionId) {
        panic!("turn start panic");
    }

    fn on_state(&self, _session_id: &SessionId, _state: TurnState) {
        panic!("state panic");
    }

    fn on_turn_composed(&self, _session_id: &SessionId, _result: &TurnResult, _elapsed: Duration) {
        panic!("composed panic");
    }

    fn on_turn_failed(&self, _session_id: &SessionId, _error: &ChatError, _elapsed: Duration) {
        panic!("failed panic");
    }
}

#[test]
fn safe_tool_hooks_delegate_when_inner_succeeds() {
    let inner = RecordingHooks::default();
    let events = Arc::clone(&inner.events);

    exercise_tool_hooks(&SafeToolHooks::new(inner));

    assert_eq!(
        *events.lock().expect("events lock"),
        vec![
            "invocation_start",
            "retry_scheduled",
            "invocation_outcome",
            "invocation_outcome",
            "invocation_outcome",
            "invocation_outcome",
        ]
    );
}

#[test]
fn safe_turn_hooks_delegate_when_inner_succeeds() {
    let inner = RecordingHooks::default();
    let events = Arc::clone(&inner.events);

    exercise_turn_hooks(&SafeTurnHooks::new(inner));

    assert_eq!(
        *events.lock().expect("events lock"),
        vec!["turn_start", "state", "turn_composed", "turn_failed"]
    );
}

#[test]
fn safe_tool_hooks_swallow_panics() {
    exercise_tool_hooks(&SafeToolHooks::new(PanicHooks));
}

#[test]
fn safe_turn_hooks_swallow_panics() {
    exercise_turn_hooks(&SafeTurnHooks::new(PanicHooks));
}
