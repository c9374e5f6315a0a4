//! Tracing-based observability hooks for invocations and turns.
//!
//! ```rust
//! use cdobserve::TracingObservabilityHooks;
//! use cdchat::TurnHooks;
//!
//! fn accepts_turn_hooks(_hooks: &dyn TurnHooks) {}
//!
//! let hooks = TracingObservabilityHooks;
//! accepts_turn_hooks(&hooks);
//! ```

use std::time::Duration;

use cdchat::{ChatError, TurnHooks, TurnResult, TurnState};
use cdcommon::SessionId;
use cdprovider::{ToolCall, ToolOutcome};
use cdtooling::{ToolError, ToolExecutionContext, ToolRuntimeHooks};

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObservabilityHooks;

impl ToolRuntimeHooks for TracingObservabilityHooks {
    fn on_invocation_start(&self, tool_call: &ToolCall, context: &ToolExecutionContext) {
        tracing::info!(
            phase = "invocation",
            event = "start",
            operation = %tool_call.name,
            tool_call_id = %tool_call.id,
            session_id = %context.session_id,
            trace_id = ?context.trace_id.as_ref().map(|trace_id| trace_id.as_str())
        );
    }

    fn on_retry_scheduled(
        &self,
        tool_call: &ToolCall,
        context: &ToolExecutionContext,
        attempt: u32,
        delay: Duration,
        error: &ToolError,
    ) {
        tracing::warn!(
            phase = "invocation",
            event = "retry_scheduled",
            operation = %tool_call.name,
            session_id = %context.session_id,
            attempt,
            delay_ms = delay.as_millis() as u64,
            error_kind = ?error.kind,
            retryable = error.retryable,
            error = %error
        );
    }

    fn on_invocation_outcome(
        &self,
        tool_call: &ToolCall,
        context: &ToolExecutionContext,
        outcome: &ToolOutcome,
        attempts: u32,
        elapsed: Duration,
    ) {
        let elapsed_ms = elapsed.as_millis() as u64;
        match outcome {
            ToolOutcome::Record { .. } | ToolOutcome::NotFound { .. } => tracing::info!(
                phase = "invocation",
                event = "outcome",
                operation = %tool_call.name,
                session_id = %context.session_id,
                outcome = outcome.kind(),
                attempts,
                elapsed_ms
            ),
            ToolOutcome::Unavailable { message } => tracing::warn!(
                phase = "invocation",
                event = "outcome",
                operation = %tool_call.name,
                session_id = %context.session_id,
                outcome = outcome.kind(),
                attempts,
                elapsed_ms,
                error = %message
            ),
            ToolOutcome::BadRequest { .. } | ToolOutcome::UnknownOperation { .. } => {
                tracing::error!(
                    phase = "invocation",
                    event = "outcome",
                    operation = %tool_call.name,
                    session_id = %context.session_id,
                    outcome = outcome.kind(),
                    attempts,
                    elapsed_ms
                )
            }
        }
    }
}

impl TurnHooks for TracingObservabilityHooks {
    fn on_turn_start(&self, session_id: &SessionId) {
        tracing::info!(phase = "turn", event = "start", session_id = %session_id);
    }

    fn on_state(&self, session_id: &SessionId, state: TurnState) {
        tracing::debug!(
            phase = "turn",
            event = "state",
            session_id = %session_id,
            state = %state.label()
        );
    }

    fn on_turn_composed(&self, session_id: &SessionId, result: &TurnResult, elapsed: Duration) {
        tracing::info!(
            phase = "turn",
            event = "composed",
            session_id = %session_id,
            classified_as = result.classified_as().map(|kind| kind.as_str()).unwrap_or("none"),
            invocations = result.invocation_count(),
            elapsed_ms = elapsed.as_millis() as u64
        );
    }

    fn on_turn_failed(&self, session_id: &SessionId, error: &ChatError, elapsed: Duration) {
        tracing::error!(
            phase = "turn",
            event = "failed",
            session_id = %session_id,
            error_kind = ?error.kind,
            error = %error,
            elapsed_ms = elapsed.as_millis() as u64
        );
    }
}
