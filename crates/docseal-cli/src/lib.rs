//! # docseal-cli — CLI Tool for docseal
//!
//! Provides the `docseal` command-line interface over the ledger clients.
//!
//! ## Subcommands
//!
//! - `docseal hash` — Canonical document digest, offline.
//! - `docseal verify` — Resolve a document or digest to an issuer verdict.
//! - `docseal account` — Connect the identity provider and show the caller's role.
//! - `docseal admin` — Review and verify organizations (administrator only).
//! - `docseal issuer` — Sign up, then issue, list, and revoke documents.
//!
//! ## Exit Codes
//!
//! | Code | Meaning |
//! |------|---------|
//! | 0 | Success, or the document is valid |
//! | 1 | Failure, or the document is unknown |
//! | 2 | The document was issued and later revoked |

pub mod account;
pub mod admin;
pub mod context;
pub mod hash;
pub mod issuer;
pub mod verify;

use std::path::Path;

use anyhow::{bail, Context as _, Result};

pub use context::{Context, LedgerOpts};

pub const EXIT_OK: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_REVOKED: u8 = 2;

/// Read a document from disk.
pub fn read_document(path: &Path) -> Result<Vec<u8>> {
    if !path.exists() {
        bail!("file not found: {}", path.display());
    }
    std::fs::read(path).with_context(|| format!("failed to read file: {}", path.display()))
}
