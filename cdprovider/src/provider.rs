//! Reasoning component contract.
//!
//! The reasoning step receives the transcript plus every available operation
//! and answers with either operation requests or a final reply.

use std::future::Future;
use std::pin::Pin;

use crate::{ProviderError, ReasoningRequest, ReasoningResponse};

pub type ProviderFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait ReasoningProvider: Send + Sync {
    fn name(&self) -> &str;

    fn complete<'a>(
        &'a self,
        request: ReasoningRequest,
    ) -> ProviderFuture<'a, Result<ReasoningResponse, ProviderError>>;
}
