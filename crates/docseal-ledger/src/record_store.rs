//! # Issuer Record Store Client
//!
//! Bound to one organization's store. Holds a snapshot of that store's
//! records which, like the registry snapshot, is only ever replaced by a
//! full re-read. Every successful write triggers that re-read.

use std::sync::Arc;

use docseal_core::{Address, ContentPointer, DocsealError, DocumentDigest, DocumentRecord, OrganizationRecord};

use crate::deadline::{bounded, Timeouts};
use crate::ledger::{RecordStoreLedger, RegistryLedger};
use crate::session::Session;

pub struct IssuerRecordStoreClient {
    ledger: Arc<dyn RecordStoreLedger>,
    timeouts: Timeouts,
    organization: OrganizationRecord,
    snapshot: Vec<DocumentRecord>,
}

impl std::fmt::Debug for IssuerRecordStoreClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssuerRecordStoreClient")
            .field("organization", &self.organization.identity)
            .field("store", &self.organization.store)
            .field("documents", &self.snapshot.len())
            .finish_non_exhaustive()
    }
}

impl IssuerRecordStoreClient {
    /// Open the store owned by `owner` and load its records.
    ///
    /// # Errors
    ///
    /// `NotFound` when `owner` has no organization record.
    pub async fn open(
        registry: &dyn RegistryLedger,
        ledger: Arc<dyn RecordStoreLedger>,
        owner: &Address,
        timeouts: Timeouts,
    ) -> Result<Self, DocsealError> {
        let organization = bounded("issuers", timeouts.call, registry.organization(owner))
            .await?
            .ok_or_else(|| DocsealError::NotFound(format!("{owner} has not registered an organization")))?;
        Self::for_organization(organization, ledger, timeouts).await
    }

    /// Bind to an already-known organization and load its records.
    pub async fn for_organization(
        organization: OrganizationRecord,
        ledger: Arc<dyn RecordStoreLedger>,
        timeouts: Timeouts,
    ) -> Result<Self, DocsealError> {
        let mut client = Self {
            ledger,
            timeouts,
            organization,
            snapshot: Vec::new(),
        };
        client.list_documents().await?;
        Ok(client)
    }

    pub fn organization(&self) -> &OrganizationRecord {
        &self.organization
    }

    pub fn store(&self) -> Address {
        self.organization.store
    }

    /// Re-read every record in this store.
    pub async fn list_documents(&mut self) -> Result<&[DocumentRecord], DocsealError> {
        let fresh = bounded(
            "getAllCertificates",
            self.timeouts.call,
            self.ledger.documents(&self.organization.store),
        )
        .await?;
        tracing::debug!(store = %self.organization.store, count = fresh.len(), "document list refreshed");
        self.snapshot = fresh;
        Ok(&self.snapshot)
    }

    /// The last successfully read record list.
    pub fn snapshot(&self) -> &[DocumentRecord] {
        &self.snapshot
    }

    /// Records not yet revoked, from the snapshot.
    pub fn active(&self) -> Vec<&DocumentRecord> {
        self.snapshot.iter().filter(|d| !d.revoked).collect()
    }

    pub async fn lookup(&self, digest: &DocumentDigest) -> Result<DocumentRecord, DocsealError> {
        bounded(
            "certificates",
            self.timeouts.call,
            self.ledger.lookup(&self.organization.store, digest),
        )
        .await?
        .ok_or_else(|| DocsealError::NotFound(format!("document {digest} not issued by this store")))
    }

    /// Record `digest` as issued by this organization.
    pub async fn issue(
        &mut self,
        session: &Session,
        digest: &DocumentDigest,
        pointer: Option<ContentPointer>,
    ) -> Result<(), DocsealError> {
        let caller = self.require_owner(session)?;
        bounded(
            "issueCertificate",
            self.timeouts.write,
            self.ledger
                .issue(&caller, &self.organization.store, digest, pointer.as_ref()),
        )
        .await?;
        tracing::info!(store = %self.organization.store, %digest, "document issued");
        self.refresh_after_write().await;
        Ok(())
    }

    /// Mark `digest` revoked. Revocation cannot be undone.
    pub async fn revoke(&mut self, session: &Session, digest: &DocumentDigest) -> Result<(), DocsealError> {
        let caller = self.require_owner(session)?;
        bounded(
            "revokeCertificate",
            self.timeouts.write,
            self.ledger.revoke(&caller, &self.organization.store, digest),
        )
        .await?;
        tracing::info!(store = %self.organization.store, %digest, "document revoked");
        self.refresh_after_write().await;
        Ok(())
    }

    fn require_owner(&self, session: &Session) -> Result<Address, DocsealError> {
        let caller = session.require_identity()?;
        if caller != self.organization.identity {
            return Err(DocsealError::Authorization(format!(
                "{caller} does not own the record store of {}",
                self.organization.name
            )));
        }
        Ok(caller)
    }

    async fn refresh_after_write(&mut self) {
        if let Err(e) = self.list_documents().await {
            tracing::warn!(error = %e, "refresh after write failed; keeping previous snapshot");
        }
    }
}
