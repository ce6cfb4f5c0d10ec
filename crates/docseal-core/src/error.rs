//! # Error Types — The docseal Error Taxonomy
//!
//! Every failure a user action can hit maps to exactly one variant of
//! [`DocsealError`]. Library crates convert their internal errors (ABI decode,
//! transport, configuration) into this enum at the boundary so callers match
//! on one type.
//!
//! ## Propagation
//!
//! - Each failure is scoped to the single action that produced it.
//! - Nothing is retried automatically; the user re-triggers the action.
//! - Authorization failures are always re-checked by the ledger itself; a
//!   local pre-check only short-circuits an obviously doomed write.

use std::time::Duration;

use thiserror::Error;

/// Top-level error type for docseal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DocsealError {
    /// The uploaded bytes are not a well-formed document of the expected format.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// No compatible identity provider is reachable, or no identity has been connected.
    #[error("identity provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// The caller lacks the role the operation requires.
    #[error("not authorized: {0}")]
    Authorization(String),

    /// The caller already has an organization record.
    #[error("organization already registered for {identity}")]
    DuplicateRegistration {
        /// The identity that attempted the second registration.
        identity: String,
    },

    /// The digest is already recorded in this issuer's store.
    #[error("document {digest} already issued")]
    DuplicateDigest {
        /// Hex digest of the rejected document.
        digest: String,
    },

    /// A point query found nothing.
    #[error("not found: {0}")]
    NotFound(String),

    /// The document is already revoked. Revocation is one-way.
    #[error("document {digest} already revoked")]
    AlreadyRevoked {
        /// Hex digest of the revoked document.
        digest: String,
    },

    /// Network, provider, or decode failure on a remote call.
    #[error("remote call {operation} failed: {reason}")]
    RemoteCall {
        /// The ledger or service operation that failed.
        operation: String,
        /// Failure reason as reported by the transport or decoder.
        reason: String,
    },

    /// A remote call did not complete within the configured bound and was cancelled.
    #[error("remote call {operation} timed out after {after:?}")]
    Timeout {
        /// The operation that was cancelled.
        operation: String,
        /// The bound that expired.
        after: Duration,
    },
}

impl DocsealError {
    /// Convenience constructor for [`DocsealError::RemoteCall`].
    pub fn remote(operation: impl Into<String>, reason: impl ToString) -> Self {
        Self::RemoteCall {
            operation: operation.into(),
            reason: reason.to_string(),
        }
    }
}
