//! Bounded remote calls.
//!
//! Every remote call goes through [`bounded`]. A call that outlives its bound
//! is dropped, which cancels the in-flight request, and surfaces as
//! [`DocsealError::Timeout`]. Nothing is retried.

use std::future::Future;
use std::time::Duration;

use docseal_core::DocsealError;

/// Call and write bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Bound on a single read or identity request.
    pub call: Duration,
    /// Bound on a write, from submission through confirmation.
    pub write: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            call: Duration::from_secs(30),
            write: Duration::from_secs(120),
        }
    }
}

pub(crate) async fn bounded<T, F>(operation: &str, limit: Duration, call: F) -> Result<T, DocsealError>
where
    F: Future<Output = Result<T, DocsealError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(operation, ?limit, "remote call timed out and was cancelled");
            Err(DocsealError::Timeout {
                operation: operation.to_string(),
                after: limit,
            })
        }
    }
}
