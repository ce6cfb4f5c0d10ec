//! Caller identity for one session.
//!
//! The connected identity only gates what the caller is offered locally.
//! The ledger re-checks authorization on every write.

use std::sync::Arc;
use std::time::Duration;

use docseal_core::{Address, DocsealError};

use crate::deadline::bounded;
use crate::ledger::IdentityProvider;

/// One user's connection to an identity provider.
pub struct Session {
    provider: Arc<dyn IdentityProvider>,
    call_timeout: Duration,
    identity: Option<Address>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("identity", &self.identity)
            .field("call_timeout", &self.call_timeout)
            .finish_non_exhaustive()
    }
}

impl Session {
    pub fn new(provider: Arc<dyn IdentityProvider>, call_timeout: Duration) -> Self {
        Self {
            provider,
            call_timeout,
            identity: None,
        }
    }

    /// Request accounts from the provider and adopt the first one.
    ///
    /// On failure the previously connected identity, if any, is kept.
    pub async fn connect(&mut self) -> Result<Address, DocsealError> {
        let accounts = bounded(
            "request_accounts",
            self.call_timeout,
            self.provider.request_accounts(),
        )
        .await?;
        let identity = accounts.first().copied().ok_or_else(|| {
            DocsealError::ProviderUnavailable("provider exposed no accounts".into())
        })?;
        tracing::info!(%identity, "identity connected");
        self.identity = Some(identity);
        Ok(identity)
    }

    pub fn identity(&self) -> Option<Address> {
        self.identity
    }

    /// The connected identity, or `ProviderUnavailable` when none is.
    pub fn require_identity(&self) -> Result<Address, DocsealError> {
        self.identity.ok_or_else(|| {
            DocsealError::ProviderUnavailable("no identity connected; connect a wallet first".into())
        })
    }

    /// True when the connected identity is `other`.
    pub fn is(&self, other: &Address) -> bool {
        self.identity.as_ref() == Some(other)
    }

    pub fn disconnect(&mut self) {
        self.identity = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockLedger;

    #[tokio::test]
    async fn connect_adopts_first_account() {
        let me = Address::from_bytes([7; 20]);
        let ledger = Arc::new(MockLedger::new(me));
        let mut session = Session::new(ledger, Duration::from_secs(1));
        assert!(session.require_identity().is_err());
        assert_eq!(session.connect().await.unwrap(), me);
        assert!(session.is(&me));
        session.disconnect();
        assert_eq!(session.identity(), None);
    }

    #[tokio::test]
    async fn failed_connect_keeps_previous_identity() {
        let me = Address::from_bytes([7; 20]);
        let ledger = Arc::new(MockLedger::new(me));
        let mut session = Session::new(ledger.clone(), Duration::from_secs(1));
        session.connect().await.unwrap();
        ledger.remove_provider();
        let err = session.connect().await.unwrap_err();
        assert!(matches!(err, DocsealError::ProviderUnavailable(_)));
        assert_eq!(session.identity(), Some(me));
    }
}
