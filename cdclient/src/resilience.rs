//! Retry/backoff policy for operation invocations.

use std::future::Future;
use std::time::Duration;

use cdprovider::ToolCall;
use cdtooling::{ToolError, ToolExecutionContext, ToolRuntimeHooks};

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    /// One retry after a short pause.
    fn default() -> Self {
        Self {
            max_attempts: 2,
            initial_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(2),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    pub fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    pub fn should_retry(&self, attempt: u32, error: &ToolError) -> bool {
        error.retryable && attempt < self.max_attempts
    }

    pub fn backoff_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = (attempt.saturating_sub(1)) as i32;
        let unbounded = self.initial_backoff.as_secs_f64() * self.backoff_multiplier.powi(exponent);
        Duration::from_secs_f64(unbounded.min(self.max_backoff.as_secs_f64()))
    }
}

/// Runs `execute` until it succeeds, fails for good, or the policy gives up.
///
/// Returns the final result together with the number of attempts made.
pub async fn execute_with_retry<T, Op, OpFuture, Sleep, SleepFuture>(
    tool_call: &ToolCall,
    context: &ToolExecutionContext,
    policy: &RetryPolicy,
    hooks: &dyn ToolRuntimeHooks,
    mut execute: Op,
    mut sleep: Sleep,
) -> (Result<T, ToolError>, u32)
where
    Op: FnMut(u32) -> OpFuture,
    OpFuture: Future<Output = Result<T, ToolError>>,
    Sleep: FnMut(Duration) -> SleepFuture,
    SleepFuture: Future<Output = ()>,
{
    let mut attempt = 1;

    loop {
        match execute(attempt).await {
            Ok(value) => return (Ok(value), attempt),
            Err(error) => {
                if policy.should_retry(attempt, &error) {
                    let delay = policy.backoff_for_attempt(attempt);
                    hooks.on_retry_scheduled(tool_call, context, attempt, delay, &error);
                    sleep(delay).await;
                    attempt += 1;
                    continue;
                }

                return (Err(error), attempt);
            }
        }
    }
}
