//! # Registry Client
//!
//! Caches the administrator and a snapshot of the organization list. The
//! snapshot is replaced wholesale on every successful read, so concurrent
//! refreshes resolve to whichever read completed last. A failed read or write
//! leaves it untouched.
//!
//! Writes are followed by a refresh. If the refresh itself fails the write
//! still stands and the stale snapshot is kept until the next read.

use std::sync::Arc;

use docseal_core::{Address, DocsealError, OrganizationRecord};

use crate::deadline::{bounded, Timeouts};
use crate::ledger::RegistryLedger;
use crate::session::Session;

pub struct RegistryClient {
    ledger: Arc<dyn RegistryLedger>,
    timeouts: Timeouts,
    admin: Option<Address>,
    snapshot: Vec<OrganizationRecord>,
}

impl std::fmt::Debug for RegistryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryClient")
            .field("admin", &self.admin)
            .field("organizations", &self.snapshot.len())
            .finish_non_exhaustive()
    }
}

impl RegistryClient {
    pub fn new(ledger: Arc<dyn RegistryLedger>, timeouts: Timeouts) -> Self {
        Self {
            ledger,
            timeouts,
            admin: None,
            snapshot: Vec::new(),
        }
    }

    /// The administrator identity. Read once, then cached.
    pub async fn get_admin(&mut self) -> Result<Address, DocsealError> {
        if let Some(admin) = self.admin {
            return Ok(admin);
        }
        let admin = bounded("admin", self.timeouts.call, self.ledger.admin()).await?;
        self.admin = Some(admin);
        Ok(admin)
    }

    /// Re-read every organization, in registration order.
    pub async fn list_organizations(&mut self) -> Result<&[OrganizationRecord], DocsealError> {
        let fresh = bounded("getAllIssuers", self.timeouts.call, self.ledger.organizations()).await?;
        tracing::debug!(count = fresh.len(), "organization list refreshed");
        self.snapshot = fresh;
        Ok(&self.snapshot)
    }

    /// The last successfully read organization list.
    pub fn snapshot(&self) -> &[OrganizationRecord] {
        &self.snapshot
    }

    /// Organizations awaiting verification, from the snapshot.
    pub fn pending(&self) -> Vec<&OrganizationRecord> {
        self.snapshot.iter().filter(|o| !o.verified).collect()
    }

    /// Verified organizations, from the snapshot.
    pub fn verified(&self) -> Vec<&OrganizationRecord> {
        self.snapshot.iter().filter(|o| o.verified).collect()
    }

    /// Point lookup of the organization owned by `identity`.
    pub async fn organization_of(
        &self,
        identity: &Address,
    ) -> Result<Option<OrganizationRecord>, DocsealError> {
        bounded("issuers", self.timeouts.call, self.ledger.organization(identity)).await
    }

    /// Register the connected identity as a new, unverified organization.
    pub async fn register_organization(
        &mut self,
        session: &Session,
        name: &str,
        data: &str,
    ) -> Result<(), DocsealError> {
        let identity = session.require_identity()?;
        let name = name.trim();
        let data = data.trim();
        if name.is_empty() || data.is_empty() {
            return Err(DocsealError::MalformedInput(
                "organization name and data are both required".into(),
            ));
        }

        bounded(
            "signUpIssuer",
            self.timeouts.write,
            self.ledger.register_organization(&identity, name, data),
        )
        .await?;
        tracing::info!(%identity, name, "organization registered");

        self.refresh_after_write().await;
        Ok(())
    }

    /// Verify `organization`. The caller must be the administrator.
    ///
    /// A non-administrator is rejected locally and nothing is submitted.
    pub async fn set_verified(
        &mut self,
        session: &Session,
        organization: &Address,
    ) -> Result<(), DocsealError> {
        let caller = session.require_identity()?;
        let admin = self.get_admin().await?;
        if caller != admin {
            return Err(DocsealError::Authorization(format!(
                "{caller} is not the registry administrator"
            )));
        }

        bounded(
            "verifyIssuer",
            self.timeouts.write,
            self.ledger.set_verified(&caller, organization),
        )
        .await?;
        tracing::info!(%organization, "organization verified");

        self.refresh_after_write().await;
        Ok(())
    }

    async fn refresh_after_write(&mut self) {
        if let Err(e) = self.list_organizations().await {
            tracing::warn!(error = %e, "refresh after write failed; keeping previous snapshot");
        }
    }
}
