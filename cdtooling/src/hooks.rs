//! Runtime hooks for operation invocation lifecycle events.
//!
//! ```rust
//! use cdtooling::{NoopToolRuntimeHooks, ToolRuntimeHooks};
//!
//! fn assert_hooks_trait(_hooks: &dyn ToolRuntimeHooks) {}
//!
//! let hooks = NoopToolRuntimeHooks;
//! assert_hooks_trait(&hooks);
//! ```

use std::time::Duration;

use cdprovider::{ToolCall, ToolOutcome};

use crate::{ToolError, ToolExecutionContext};

pub trait ToolRuntimeHooks: Send + Sync {
    fn on_invocation_start(&self, _tool_call: &ToolCall, _context: &ToolExecutionContext) {}

    fn on_retry_scheduled(
        &self,
        _tool_call: &ToolCall,
        _context: &ToolExecutionContext,
        _attempt: u32,
        _delay: Duration,
        _error: &ToolError,
    ) {
    }

    fn on_invocation_outcome(
        &self,
        _tool_call: &ToolCall,
        _context: &ToolExecutionContext,
        _outcome: &ToolOutcome,
        _attempts: u32,
        _elapsed: Duration,
    ) {
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopToolRuntimeHooks;

impl ToolRuntimeHooks for NoopToolRuntimeHooks {}
