//! # Ledger Seams
//!
//! The three capabilities every higher-level client is written against.
//! [`EvmLedger`](crate::evm::EvmLedger) implements them over JSON-RPC and
//! [`MockLedger`](crate::mock::MockLedger) implements them in memory.
//!
//! Implementations enforce the contract rules themselves: a write the ledger
//! would reject must fail with the matching [`DocsealError`] variant and
//! leave ledger state untouched. Timeouts are applied by the callers, not
//! here.

use async_trait::async_trait;
use docseal_core::{
    Address, ContentPointer, DocsealError, DocumentDigest, DocumentRecord, OrganizationRecord,
};

/// Issuer registry: one record per owner identity, plus the administrator.
#[async_trait]
pub trait RegistryLedger: Send + Sync {
    /// The administrator identity. Fixed at deployment.
    async fn admin(&self) -> Result<Address, DocsealError>;

    /// Every organization, in registration order.
    async fn organizations(&self) -> Result<Vec<OrganizationRecord>, DocsealError>;

    /// The organization owned by `owner`, if any.
    async fn organization(&self, owner: &Address) -> Result<Option<OrganizationRecord>, DocsealError>;

    /// Create an unverified organization owned by `from`, with a fresh store.
    async fn register_organization(
        &self,
        from: &Address,
        name: &str,
        data: &str,
    ) -> Result<(), DocsealError>;

    /// Mark `organization` verified. Only the administrator may call this.
    async fn set_verified(&self, from: &Address, organization: &Address) -> Result<(), DocsealError>;
}

/// Per-issuer record stores, addressed by store address.
#[async_trait]
pub trait RecordStoreLedger: Send + Sync {
    /// Every record in `store`, in issuance order.
    async fn documents(&self, store: &Address) -> Result<Vec<DocumentRecord>, DocsealError>;

    /// The record for `digest` in `store`, if issued there.
    async fn lookup(
        &self,
        store: &Address,
        digest: &DocumentDigest,
    ) -> Result<Option<DocumentRecord>, DocsealError>;

    /// Record `digest` as issued. Only the store owner may call this.
    async fn issue(
        &self,
        from: &Address,
        store: &Address,
        digest: &DocumentDigest,
        pointer: Option<&ContentPointer>,
    ) -> Result<(), DocsealError>;

    /// Mark `digest` revoked. Only the store owner may call this.
    async fn revoke(
        &self,
        from: &Address,
        store: &Address,
        digest: &DocumentDigest,
    ) -> Result<(), DocsealError>;
}

/// Source of the caller's identity (a wallet or signing node).
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Ask the provider for its accounts. The first one is the caller.
    async fn request_accounts(&self) -> Result<Vec<Address>, DocsealError>;
}
