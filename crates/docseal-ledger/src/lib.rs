//! # docseal-ledger -- Typed ledger clients for docseal
//!
//! Everything that talks to something remote lives here:
//! - **Registry** of issuer organizations and the administrator identity
//! - **Record stores**, one per organization, holding document records
//! - **Identity** of the caller, from a wallet or signing node
//! - **Verification**, resolving a digest to an issuer verdict
//! - **Pinning** of issued documents to off-ledger content storage
//!
//! ## Architecture
//!
//! Higher-level clients ([`RegistryClient`], [`IssuerRecordStoreClient`],
//! [`VerificationResolver`], [`Session`]) are written against the trait
//! seams in [`ledger`]. [`EvmLedger`] implements those seams over JSON-RPC;
//! [`MockLedger`] implements them in memory. A [`Connection`] wires one
//! implementation into all clients for a session. There is no global
//! connection state.
//!
//! Every remote call is bounded by a timeout and never retried.

pub mod abi;
pub mod config;
pub(crate) mod deadline;
pub mod evm;
pub mod ledger;
pub mod mock;
pub mod pinning;
pub mod record_store;
pub mod registry;
pub mod resolver;
pub mod rpc;
pub mod session;

pub use config::{ConfigError, LedgerConfig};
pub use deadline::Timeouts;
pub use evm::EvmLedger;
pub use ledger::{IdentityProvider, RecordStoreLedger, RegistryLedger};
pub use mock::MockLedger;
pub use pinning::{PinMetadata, PinnedDocument, PinningClient, PinningError};
pub use record_store::IssuerRecordStoreClient;
pub use registry::RegistryClient;
pub use resolver::{IssuerSummary, Verdict, Verification, VerificationResolver};
pub use session::Session;

use std::sync::Arc;

use docseal_core::{Address, DocsealError};

/// One ledger implementation shared by every client of a session.
#[derive(Clone)]
pub struct Connection {
    registry: Arc<dyn RegistryLedger>,
    stores: Arc<dyn RecordStoreLedger>,
    identity: Arc<dyn IdentityProvider>,
    timeouts: Timeouts,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("timeouts", &self.timeouts)
            .finish_non_exhaustive()
    }
}

impl Connection {
    /// Connect to an EVM node as configured.
    pub fn evm(config: &LedgerConfig) -> Result<Self, DocsealError> {
        let ledger = Arc::new(EvmLedger::new(config)?);
        Ok(Self::with_ledger(ledger, config.timeouts()))
    }

    /// Use any implementation of all three seams.
    pub fn with_ledger<L>(ledger: Arc<L>, timeouts: Timeouts) -> Self
    where
        L: RegistryLedger + RecordStoreLedger + IdentityProvider + 'static,
    {
        Self {
            registry: ledger.clone(),
            stores: ledger.clone(),
            identity: ledger,
            timeouts,
        }
    }

    /// A new, unconnected session.
    pub fn session(&self) -> Session {
        Session::new(self.identity.clone(), self.timeouts.call)
    }

    pub fn registry(&self) -> RegistryClient {
        RegistryClient::new(self.registry.clone(), self.timeouts)
    }

    pub fn resolver(&self) -> VerificationResolver {
        VerificationResolver::new(self.registry.clone(), self.stores.clone(), self.timeouts.call)
    }

    /// Open the record store owned by `owner`.
    pub async fn open_store(&self, owner: &Address) -> Result<IssuerRecordStoreClient, DocsealError> {
        IssuerRecordStoreClient::open(self.registry.as_ref(), self.stores.clone(), owner, self.timeouts)
            .await
    }
}
