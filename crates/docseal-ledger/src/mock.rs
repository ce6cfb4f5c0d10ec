//! # In-Memory Ledger
//!
//! [`MockLedger`] enforces the same rules as the deployed contracts, so the
//! clients above it can be exercised without a node: one registration per
//! identity, admin-only verification, owner-only issuance and revocation,
//! unique digests per store, and one-way revocation.
//!
//! Failure injection covers what a real network does to callers: an
//! unreachable store, a registry that stops answering, a write rejected by
//! the provider, a call that never completes, and a missing identity
//! provider.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use docseal_core::{
    Address, ContentPointer, DocsealError, DocumentDigest, DocumentRecord, OrganizationRecord,
};
use parking_lot::Mutex;

use crate::ledger::{IdentityProvider, RecordStoreLedger, RegistryLedger};

#[derive(Debug)]
struct MockStore {
    owner: Address,
    documents: Vec<DocumentRecord>,
}

#[derive(Debug, Default)]
struct MockState {
    organizations: Vec<OrganizationRecord>,
    stores: HashMap<Address, MockStore>,
    accounts: Vec<Address>,
    provider_available: bool,
    unreachable_stores: HashSet<Address>,
    registry_unreachable: bool,
    rejected_write: Option<DocsealError>,
    stalled: bool,
    writes: usize,
    next_store: u64,
}

/// An in-memory registry, record stores, and identity provider.
#[derive(Debug)]
pub struct MockLedger {
    admin: Address,
    state: Mutex<MockState>,
}

impl MockLedger {
    /// A fresh ledger administered by `admin`, whose provider exposes `admin`.
    pub fn new(admin: Address) -> Self {
        Self {
            admin,
            state: Mutex::new(MockState {
                accounts: vec![admin],
                provider_available: true,
                ..MockState::default()
            }),
        }
    }

    /// Switch the identity the provider exposes.
    pub fn set_account(&self, account: Address) {
        self.state.lock().accounts = vec![account];
    }

    /// Make the identity provider disappear.
    pub fn remove_provider(&self) {
        self.state.lock().provider_available = false;
    }

    /// Every read of `store` fails with a remote-call error.
    pub fn make_store_unreachable(&self, store: Address) {
        self.state.lock().unreachable_stores.insert(store);
    }

    /// Every registry read fails with a remote-call error.
    pub fn make_registry_unreachable(&self) {
        self.state.lock().registry_unreachable = true;
    }

    /// The next write fails with `error` and changes nothing.
    pub fn reject_next_write(&self, error: DocsealError) {
        self.state.lock().rejected_write = Some(error);
    }

    /// Every subsequent call hangs until dropped.
    pub fn stall(&self) {
        self.state.lock().stalled = true;
    }

    /// Number of writes that reached the ledger, accepted or not.
    pub fn write_count(&self) -> usize {
        self.state.lock().writes
    }

    async fn gate(&self) {
        let stalled = self.state.lock().stalled;
        if stalled {
            std::future::pending::<()>().await;
        }
    }

    fn registry_read(&self, operation: &str) -> Result<parking_lot::MutexGuard<'_, MockState>, DocsealError> {
        let state = self.state.lock();
        if state.registry_unreachable {
            return Err(DocsealError::remote(operation, "connection refused"));
        }
        Ok(state)
    }

    fn store_read(
        &self,
        operation: &str,
        store: &Address,
    ) -> Result<parking_lot::MutexGuard<'_, MockState>, DocsealError> {
        let state = self.state.lock();
        if state.unreachable_stores.contains(store) {
            return Err(DocsealError::remote(operation, format!("store {store} unreachable")));
        }
        Ok(state)
    }

    /// Count the write and consume any injected rejection.
    fn begin_write(&self) -> Result<parking_lot::MutexGuard<'_, MockState>, DocsealError> {
        let mut state = self.state.lock();
        state.writes += 1;
        match state.rejected_write.take() {
            Some(err) => Err(err),
            None => Ok(state),
        }
    }
}

impl MockState {
    fn allocate_store(&mut self, owner: Address) -> Address {
        self.next_store += 1;
        let mut bytes = [0u8; 20];
        bytes[0] = 0x5e;
        bytes[12..].copy_from_slice(&self.next_store.to_be_bytes());
        let address = Address::from_bytes(bytes);
        self.stores.insert(
            address,
            MockStore {
                owner,
                documents: Vec::new(),
            },
        );
        address
    }

    fn owned_store(&mut self, from: &Address, store: &Address) -> Result<&mut MockStore, DocsealError> {
        let entry = self
            .stores
            .get_mut(store)
            .ok_or_else(|| DocsealError::NotFound(format!("no record store at {store}")))?;
        if entry.owner != *from {
            return Err(DocsealError::Authorization(format!(
                "{from} does not own record store {store}"
            )));
        }
        Ok(entry)
    }
}

#[async_trait]
impl RegistryLedger for MockLedger {
    async fn admin(&self) -> Result<Address, DocsealError> {
        self.gate().await;
        self.registry_read("admin")?;
        Ok(self.admin)
    }

    async fn organizations(&self) -> Result<Vec<OrganizationRecord>, DocsealError> {
        self.gate().await;
        Ok(self.registry_read("getAllIssuers")?.organizations.clone())
    }

    async fn organization(&self, owner: &Address) -> Result<Option<OrganizationRecord>, DocsealError> {
        self.gate().await;
        let state = self.registry_read("issuers")?;
        Ok(state
            .organizations
            .iter()
            .find(|o| o.identity == *owner)
            .cloned())
    }

    async fn register_organization(
        &self,
        from: &Address,
        name: &str,
        data: &str,
    ) -> Result<(), DocsealError> {
        self.gate().await;
        let mut state = self.begin_write()?;
        if state.organizations.iter().any(|o| o.identity == *from) {
            return Err(DocsealError::DuplicateRegistration {
                identity: from.to_string(),
            });
        }
        let store = state.allocate_store(*from);
        state.organizations.push(OrganizationRecord {
            identity: *from,
            name: name.to_string(),
            data: data.to_string(),
            verified: false,
            store,
        });
        Ok(())
    }

    async fn set_verified(&self, from: &Address, organization: &Address) -> Result<(), DocsealError> {
        self.gate().await;
        let mut state = self.begin_write()?;
        if *from != self.admin {
            return Err(DocsealError::Authorization(
                "only the administrator can verify organizations".into(),
            ));
        }
        let record = state
            .organizations
            .iter_mut()
            .find(|o| o.identity == *organization)
            .ok_or_else(|| DocsealError::NotFound(format!("no organization for {organization}")))?;
        record.verified = true;
        Ok(())
    }
}

#[async_trait]
impl RecordStoreLedger for MockLedger {
    async fn documents(&self, store: &Address) -> Result<Vec<DocumentRecord>, DocsealError> {
        self.gate().await;
        let state = self.store_read("getAllCertificates", store)?;
        state
            .stores
            .get(store)
            .map(|s| s.documents.clone())
            .ok_or_else(|| DocsealError::remote("getAllCertificates", format!("no contract at {store}")))
    }

    async fn lookup(
        &self,
        store: &Address,
        digest: &DocumentDigest,
    ) -> Result<Option<DocumentRecord>, DocsealError> {
        self.gate().await;
        let state = self.store_read("certificates", store)?;
        let entry = state
            .stores
            .get(store)
            .ok_or_else(|| DocsealError::remote("certificates", format!("no contract at {store}")))?;
        Ok(entry.documents.iter().find(|d| d.digest == *digest).cloned())
    }

    async fn issue(
        &self,
        from: &Address,
        store: &Address,
        digest: &DocumentDigest,
        pointer: Option<&ContentPointer>,
    ) -> Result<(), DocsealError> {
        self.gate().await;
        let mut state = self.begin_write()?;
        let entry = state.owned_store(from, store)?;
        if entry.documents.iter().any(|d| d.digest == *digest) {
            return Err(DocsealError::DuplicateDigest {
                digest: digest.to_hex(),
            });
        }
        entry.documents.push(DocumentRecord {
            digest: *digest,
            pointer: pointer.cloned(),
            revoked: false,
        });
        Ok(())
    }

    async fn revoke(
        &self,
        from: &Address,
        store: &Address,
        digest: &DocumentDigest,
    ) -> Result<(), DocsealError> {
        self.gate().await;
        let mut state = self.begin_write()?;
        let entry = state.owned_store(from, store)?;
        let record = entry
            .documents
            .iter_mut()
            .find(|d| d.digest == *digest)
            .ok_or_else(|| DocsealError::NotFound(format!("document {digest} not issued by this store")))?;
        if record.revoked {
            return Err(DocsealError::AlreadyRevoked {
                digest: digest.to_hex(),
            });
        }
        record.revoked = true;
        Ok(())
    }
}

#[async_trait]
impl IdentityProvider for MockLedger {
    async fn request_accounts(&self) -> Result<Vec<Address>, DocsealError> {
        self.gate().await;
        let state = self.state.lock();
        if !state.provider_available {
            return Err(DocsealError::ProviderUnavailable(
                "no identity provider detected".into(),
            ));
        }
        Ok(state.accounts.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn who(byte: u8) -> Address {
        Address::from_bytes([byte; 20])
    }

    #[tokio::test]
    async fn stores_are_distinct_per_registration() {
        let ledger = MockLedger::new(who(0xad));
        ledger.register_organization(&who(1), "A", "").await.unwrap();
        ledger.register_organization(&who(2), "B", "").await.unwrap();
        let orgs = ledger.organizations().await.unwrap();
        assert_eq!(orgs.len(), 2);
        assert_ne!(orgs[0].store, orgs[1].store);
        assert!(!orgs[0].store.is_zero());
    }

    #[tokio::test]
    async fn rejected_write_changes_nothing() {
        let ledger = MockLedger::new(who(0xad));
        ledger.reject_next_write(DocsealError::remote("signUpIssuer", "user rejected"));
        assert!(ledger.register_organization(&who(1), "A", "").await.is_err());
        assert!(ledger.organizations().await.unwrap().is_empty());
        assert_eq!(ledger.write_count(), 1);
        ledger.register_organization(&who(1), "A", "").await.unwrap();
        assert_eq!(ledger.organizations().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn only_owner_touches_a_store() {
        let ledger = MockLedger::new(who(0xad));
        ledger.register_organization(&who(1), "A", "").await.unwrap();
        let store = ledger.organizations().await.unwrap()[0].store;
        let d = DocumentDigest::from_bytes([9; 32]);
        let err = ledger.issue(&who(2), &store, &d, None).await.unwrap_err();
        assert!(matches!(err, DocsealError::Authorization(_)));
        ledger.issue(&who(1), &store, &d, None).await.unwrap();
        let err = ledger.revoke(&who(2), &store, &d).await.unwrap_err();
        assert!(matches!(err, DocsealError::Authorization(_)));
    }
}
