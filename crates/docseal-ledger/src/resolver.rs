//! # Verification Resolver
//!
//! Answers "who issued this document, and does it still stand?"
//!
//! The organization list is read from the registry, then each organization's
//! store is queried **in registration order**, one at a time, stopping at
//! the first store that holds the digest. When more than one issuer recorded
//! the same digest, the one registered earliest wins.
//!
//! A store that cannot be reached is logged and treated as not holding the
//! digest, so one unreachable issuer never aborts a verification. A registry
//! failure does abort it: without the organization list there is nothing to
//! scan.
//!
//! Verification needs no caller identity.

use std::sync::Arc;
use std::time::Duration;

use docseal_core::{
    hash_document, Address, ContentPointer, DocsealError, DocumentDigest, DocumentRecord,
    OrganizationRecord,
};
use serde::Serialize;

use crate::deadline::bounded;
use crate::ledger::{RecordStoreLedger, RegistryLedger};

/// The issuer a verdict is attributed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssuerSummary {
    pub identity: Address,
    pub name: String,
    pub verified: bool,
    pub store: Address,
}

impl From<&OrganizationRecord> for IssuerSummary {
    fn from(org: &OrganizationRecord) -> Self {
        Self {
            identity: org.identity,
            name: org.name.clone(),
            verified: org.verified,
            store: org.store,
        }
    }
}

/// Outcome of verifying one digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", rename_all = "lowercase")]
pub enum Verdict {
    /// Issued and not revoked.
    Valid {
        issuer: IssuerSummary,
        #[serde(skip_serializing_if = "Option::is_none")]
        pointer: Option<ContentPointer>,
    },
    /// Issued, then revoked. The record and its pointer remain readable.
    Revoked {
        issuer: IssuerSummary,
        #[serde(skip_serializing_if = "Option::is_none")]
        pointer: Option<ContentPointer>,
    },
    /// No reachable store holds the digest.
    Invalid,
}

impl Verdict {
    pub fn issuer(&self) -> Option<&IssuerSummary> {
        match self {
            Verdict::Valid { issuer, .. } | Verdict::Revoked { issuer, .. } => Some(issuer),
            Verdict::Invalid => None,
        }
    }

    pub fn pointer(&self) -> Option<&ContentPointer> {
        match self {
            Verdict::Valid { pointer, .. } | Verdict::Revoked { pointer, .. } => pointer.as_ref(),
            Verdict::Invalid => None,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Verdict::Valid { .. })
    }

    fn classify(org: &OrganizationRecord, record: DocumentRecord) -> Self {
        let issuer = IssuerSummary::from(org);
        if record.revoked {
            Verdict::Revoked {
                issuer,
                pointer: record.pointer,
            }
        } else {
            Verdict::Valid {
                issuer,
                pointer: record.pointer,
            }
        }
    }
}

/// A verdict plus the stores that could not be consulted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verification {
    pub digest: DocumentDigest,
    #[serde(flatten)]
    pub verdict: Verdict,
    /// Stores skipped because they failed to answer. An `Invalid` verdict
    /// with skipped stores is not conclusive.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<Address>,
}

pub struct VerificationResolver {
    registry: Arc<dyn RegistryLedger>,
    stores: Arc<dyn RecordStoreLedger>,
    call_timeout: Duration,
}

impl std::fmt::Debug for VerificationResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerificationResolver")
            .field("call_timeout", &self.call_timeout)
            .finish_non_exhaustive()
    }
}

impl VerificationResolver {
    pub fn new(
        registry: Arc<dyn RegistryLedger>,
        stores: Arc<dyn RecordStoreLedger>,
        call_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            stores,
            call_timeout,
        }
    }

    /// Canonicalize and hash `raw`, then verify the digest.
    pub async fn verify_document(&self, raw: &[u8]) -> Result<Verification, DocsealError> {
        let digest = hash_document(raw)?;
        self.verify(&digest).await
    }

    pub async fn verify(&self, digest: &DocumentDigest) -> Result<Verification, DocsealError> {
        let organizations =
            bounded("getAllIssuers", self.call_timeout, self.registry.organizations()).await?;
        tracing::debug!(%digest, issuers = organizations.len(), "scanning record stores");

        let mut skipped = Vec::new();
        for org in &organizations {
            if org.store.is_zero() {
                continue;
            }
            let found = bounded(
                "certificates",
                self.call_timeout,
                self.stores.lookup(&org.store, digest),
            )
            .await;
            match found {
                Ok(Some(record)) => {
                    let verdict = Verdict::classify(org, record);
                    tracing::info!(%digest, issuer = %org.identity, revoked = !verdict.is_valid(), "digest found");
                    return Ok(Verification {
                        digest: *digest,
                        verdict,
                        skipped,
                    });
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(
                        store = %org.store,
                        issuer = %org.identity,
                        error = %e,
                        "record store unreachable; treating as not found"
                    );
                    skipped.push(org.store);
                }
            }
        }

        Ok(Verification {
            digest: *digest,
            verdict: Verdict::Invalid,
            skipped,
        })
    }
}
