//! Turn lifecycle hooks.
//!
//! ```rust
//! use cdchat::{NoopTurnHooks, TurnHooks};
//!
//! fn assert_hooks_trait(_hooks: &dyn TurnHooks) {}
//!
//! assert_hooks_trait(&NoopTurnHooks);
//! ```

use std::time::Duration;

use cdcommon::SessionId;

use crate::{ChatError, TurnResult, TurnState};

pub trait TurnHooks: Send + Sync {
    fn on_turn_start(&self, _session_id: &SessionId) {}

    fn on_state(&self, _session_id: &SessionId, _state: TurnState) {}

    fn on_turn_composed(&self, _session_id: &SessionId, _result: &TurnResult, _elapsed: Duration) {}

    fn on_turn_failed(&self, _session_id: &SessionId, _error: &ChatError, _elapsed: Duration) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTurnHooks;

impl TurnHooks for NoopTurnHooks {}
