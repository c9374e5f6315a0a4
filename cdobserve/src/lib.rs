//! Observability hooks for operation invocations and conversation turns.
//!
//! ```rust
//! use cdobserve::{MetricsObservabilityHooks, SafeToolHooks, SafeTurnHooks, TracingObservabilityHooks};
//!
//! let _tool_hooks = SafeToolHooks::new(TracingObservabilityHooks);
//! let _turn_hooks = SafeTurnHooks::new(MetricsObservabilityHooks);
//! ```

mod metrics_hooks;
mod safe_hooks;
mod tracing_hooks;

pub use metrics_hooks::MetricsObservabilityHooks;
pub use safe_hooks::{SafeToolHooks, SafeTurnHooks};
pub use tracing_hooks::TracingObservabilityHooks;

pub mod prelude {
    pub use crate::{
        MetricsObservabilityHooks, SafeToolHooks, SafeTurnHooks, TracingObservabilityHooks,
    };
}

#[cfg(test)]
mod tests;
