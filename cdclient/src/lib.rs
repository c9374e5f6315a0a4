//! Tool client: connects to one or more tool servers, discovers their
//! operations once, and routes invocations with a timeout and a single retry.
//!
//! ```rust
//! use std::time::Duration;
//!
//! use cdclient::{ClientOptions, RetryPolicy};
//!
//! let options = ClientOptions::default();
//! assert_eq!(options.invoke_timeout, Duration::from_secs(5));
//! assert_eq!(options.retry, RetryPolicy::default());
//! assert_eq!(options.retry.max_attempts, 2);
//! ```

mod client;
mod endpoint;
mod error;
mod operation_set;
mod resilience;

pub mod prelude {
    pub use crate::{
        ClientError, ClientErrorKind, ClientOptions, EndpointTransport, OperationSet,
        RetryPolicy, ServerEndpoint, ToolClient,
    };
}

pub use client::{ClientOptions, ToolClient};
pub use endpoint::{EndpointTransport, ServerEndpoint};
pub use error::{ClientError, ClientErrorKind};
pub use operation_set::{OperationSet, RoutedOperation};
pub use resilience::{RetryPolicy, execute_with_retry};
