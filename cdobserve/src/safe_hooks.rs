use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;

use cdchat::{ChatError, TurnHooks, TurnResult, TurnState};
use cdcommon::SessionId;
use cdprovider::{ToolCall, ToolOutcome};
use cdtooling::{ToolError, ToolExecutionContext, ToolRuntimeHooks};

pub struct SafeToolHooks<H> {
    inner: H,
}

impl<H> SafeToolHooks<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

impl<H> ToolRuntimeHooks for SafeToolHooks<H>
where
    H: ToolRuntimeHooks,
{
    fn on_invocation_start(&self, tool_call: &ToolCall, context: &ToolExecutionContext) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_invocation_start(tool_call, context)
        }));
    }

    fn on_retry_scheduled(
        &self,
        tool_call: &ToolCall,
        context: &ToolExecutionContext,
        attempt: u32,
        delay: Duration,
        error: &ToolError,
    ) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner
                .on_retry_scheduled(tool_call, context, attempt, delay, error)
        }));
    }

    fn on_invocation_outcome(
        &self,
        tool_call: &ToolCall,
        context: &ToolExecutionContext,
        outcome: &ToolOutcome,
        attempts: u32,
        elapsed: Duration,
    ) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner
                .on_invocation_outcome(tool_call, context, outcome, attempts, elapsed)
        }));
    }
}

pub struct SafeTurnHooks<H> {
    inner: H,
}

impl<H> SafeTurnHooks<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

impl<H> TurnHooks for SafeTurnHooks<H>
where
    H: TurnHooks,
{
    fn on_turn_start(&self, session_id: &SessionId) {
        let _ = catch_unwind(AssertUnwindSafe(|| self.inner.on_turn_start(session_id)));
    }

    fn on_state(&self, session_id: &SessionId, state: TurnState) {
        let _ = catch_unwind(AssertUnwindSafe(|| self.inner.on_state(session_id, state)));
    }

    fn on_turn_composed(&self, session_id: &SessionId, result: &TurnResult, elapsed: Duration) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_turn_composed(session_id, result, elapsed)
        }));
    }

    fn on_turn_failed(&self, session_id: &SessionId, error: &ChatError, elapsed: Duration) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_turn_failed(session_id, error, elapsed)
        }));
    }
}
