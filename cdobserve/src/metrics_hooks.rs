//! Metrics-based observability hooks for invocations and turns.
//!
//! ```rust
//! use cdobserve::MetricsObservabilityHooks;
//! use cdtooling::ToolRuntimeHooks;
//!
//! fn accepts_tool_hooks(_hooks: &dyn ToolRuntimeHooks) {}
//!
//! let hooks = MetricsObservabilityHooks;
//! accepts_tool_hooks(&hooks);
//! ```

use std::time::Duration;

use cdchat::{ChatError, TurnHooks, TurnResult, TurnState};
use cdcommon::SessionId;
use cdprovider::{ToolCall, ToolOutcome};
use cdtooling::{ToolError, ToolExecutionContext, ToolRuntimeHooks};

#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsObservabilityHooks;

impl ToolRuntimeHooks for MetricsObservabilityHooks {
    fn on_invocation_start(&self, tool_call: &ToolCall, _context: &ToolExecutionContext) {
        metrics::counter!(
            "civicdesk_invocation_start_total",
            "operation" => tool_call.name.clone()
        )
        .increment(1);
    }

    fn on_retry_scheduled(
        &self,
        tool_call: &ToolCall,
        _context: &ToolExecutionContext,
        _attempt: u32,
        delay: Duration,
        error: &ToolError,
    ) {
        metrics::counter!(
            "civicdesk_invocation_retry_scheduled_total",
            "operation" => tool_call.name.clone(),
            "error_kind" => format!("{:?}", error.kind)
        )
        .increment(1);
        metrics::histogram!(
            "civicdesk_invocation_retry_delay_seconds",
            "operation" => tool_call.name.clone()
        )
        .record(delay.as_secs_f64());
    }

    fn on_invocation_outcome(
        &self,
        tool_call: &ToolCall,
        _context: &ToolExecutionContext,
        outcome: &ToolOutcome,
        attempts: u32,
        elapsed: Duration,
    ) {
        metrics::counter!(
            "civicdesk_invocation_outcome_total",
            "operation" => tool_call.name.clone(),
            "outcome" => outcome.kind()
        )
        .increment(1);
        metrics::histogram!(
            "civicdesk_invocation_duration_seconds",
            "operation" => tool_call.name.clone(),
            "outcome" => outcome.kind()
        )
        .record(elapsed.as_secs_f64());
        metrics::histogram!(
            "civicdesk_invocation_attempts",
            "operation" => tool_call.name.clone()
        )
        .record(attempts as f64);
    }
}

impl TurnHooks for MetricsObservabilityHooks {
    fn on_turn_start(&self, _session_id: &SessionId) {
        metrics::counter!("civicdesk_turn_start_total").increment(1);
    }

    fn on_state(&self, _session_id: &SessionId, state: TurnState) {
        if let TurnState::Classified(kind) = state {
            metrics::counter!(
                "civicdesk_turn_classified_total",
                "classified_as" => kind.as_str()
            )
            .increment(1);
        }
    }

    fn on_turn_composed(&self, _session_id: &SessionId, result: &TurnResult, elapsed: Duration) {
        metrics::counter!("civicdesk_turn_composed_total").increment(1);
        metrics::histogram!("civicdesk_turn_duration_seconds", "status" => "composed")
            .record(elapsed.as_secs_f64());
        metrics::histogram!("civicdesk_turn_invocations").record(result.invocation_count() as f64);
    }

    fn on_turn_failed(&self, _session_id: &SessionId, error: &ChatError, elapsed: Duration) {
        metrics::counter!(
            "civicdesk_turn_failed_total",
            "error_kind" => format!("{:?}", error.kind)
        )
        .increment(1);
        metrics::histogram!("civicdesk_turn_duration_seconds", "status" => "failed")
            .record(elapsed.as_secs_f64());
    }
}
