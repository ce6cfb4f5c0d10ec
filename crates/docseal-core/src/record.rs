//! # Ledger Records
//!
//! In-memory copies of what the ledger owns. Nothing here is authoritative:
//! every value is replaced wholesale on the next successful read.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::digest::DocumentDigest;

/// An issuer organization as recorded in the registry.
///
/// Created unverified on sign-up. Only the administrator flips `verified`,
/// and only from `false` to `true`. `store` never changes once assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationRecord {
    /// The owner's identity. Unique key of the registry.
    pub identity: Address,
    /// Display name.
    pub name: String,
    /// Free-form descriptive data supplied at sign-up.
    pub data: String,
    /// Set by the administrator.
    pub verified: bool,
    /// Address of the organization's dedicated record store.
    pub store: Address,
}

/// A document entry in one issuer's record store.
///
/// `revoked` is one-way. Records are never deleted, so a revoked document
/// keeps its pointer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub digest: DocumentDigest,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pointer: Option<ContentPointer>,
    pub revoked: bool,
}

/// A content identifier for an off-ledger copy of a document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentPointer(String);

impl ContentPointer {
    /// Wrap a content identifier. Empty or whitespace-only input means
    /// "no pointer" and yields `None`.
    pub fn new(cid: impl Into<String>) -> Option<Self> {
        let cid = cid.into().trim().to_string();
        if cid.is_empty() {
            None
        } else {
            Some(Self(cid))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Public gateway URL: `https://<host>/ipfs/<pointer>`.
    pub fn gateway_url(&self, gateway_host: &str) -> String {
        let host = gateway_host
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .trim_end_matches('/');
        format!("https://{host}/ipfs/{}", self.0)
    }
}

impl fmt::Display for ContentPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
