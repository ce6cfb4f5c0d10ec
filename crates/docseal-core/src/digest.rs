//! # Document Digest — The Identity of a Document
//!
//! `DocumentDigest` is the SHA-256 of a [`CanonicalDocument`]. It is the only
//! thing ever compared when deciding whether two documents are the same.
//!
//! ## Security Invariant
//!
//! [`digest_document()`] accepts only `&CanonicalDocument`, not raw `&[u8]`.
//! A digest over un-stripped bytes cannot be produced through this API.
//!
//! ## Encodings
//!
//! - [`DocumentDigest::to_hex()`]: 64 lowercase hex digits, no prefix. This is
//!   the form users see and paste back.
//! - [`DocumentDigest::to_prefixed_hex()`]: `0x`-prefixed, the `bytes32` form
//!   used on ledger calls.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::canonical::{canonicalize_pdf, CanonicalDocument};
use crate::error::DocsealError;

/// A 256-bit document digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DocumentDigest([u8; 32]);

impl DocumentDigest {
    /// Wrap raw digest bytes, e.g. a `bytes32` read back from the ledger.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Parse 64 hex digits, with or without a `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, DocsealError> {
        let body = s.strip_prefix("0x").unwrap_or(s);
        if body.len() != 64 {
            return Err(DocsealError::MalformedInput(format!(
                "digest must have 64 hex digits, got {}",
                body.len()
            )));
        }
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(body, &mut bytes)
            .map_err(|e| DocsealError::MalformedInput(format!("invalid digest {s}: {e}")))?;
        Ok(Self(bytes))
    }

    /// Raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Render the digest as a lowercase hex string without prefix.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Render the digest as `0x`-prefixed lowercase hex.
    pub fn to_prefixed_hex(&self) -> String {
        format!("0x{}", self.to_hex())
    }
}

impl fmt::Display for DocumentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for DocumentDigest {
    type Err = DocsealError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl TryFrom<String> for DocumentDigest {
    type Error = DocsealError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::from_hex(&s)
    }
}

impl From<DocumentDigest> for String {
    fn from(d: DocumentDigest) -> Self {
        d.to_hex()
    }
}

/// Compute the SHA-256 digest of a canonical document.
pub fn digest_document(doc: &CanonicalDocument) -> DocumentDigest {
    let hash = Sha256::digest(doc.as_bytes());
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&hash);
    DocumentDigest(bytes)
}

/// Canonicalize raw PDF bytes and digest the result.
pub fn hash_document(raw: &[u8]) -> Result<DocumentDigest, DocsealError> {
    let canonical = canonicalize_pdf(raw)?;
    Ok(digest_document(&canonical))
}
