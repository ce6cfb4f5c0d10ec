//! # docseal-core — Foundational Types for docseal
//!
//! This crate is the leaf of the docseal workspace. It defines the document
//! identity pipeline and the record types mirrored from the ledger. Every
//! other crate depends on `docseal-core`; it depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **`CanonicalDocument` newtype.** ALL digest computation flows through
//!    [`canonicalize_pdf()`]. No digest is ever computed over raw upload bytes,
//!    so two exports of the same document that differ only in viewer metadata
//!    always hash identically.
//!
//! 2. **`digest_document()` accepts only `&CanonicalDocument`.** Compile-time
//!    enforcement that the canonicalizer runs before the hasher.
//!
//! 3. **The digest is the document.** `DocumentDigest` is the sole identity of
//!    a document. File names, sizes and timestamps are never compared.
//!
//! 4. **Newtypes for ledger identifiers.** `Address` and `ContentPointer` are
//!    validated at construction. No bare strings cross the ledger boundary.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `docseal-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod address;
pub mod canonical;
pub mod digest;
pub mod error;
pub mod record;

// Re-export primary types for ergonomic imports.
pub use address::Address;
pub use canonical::{canonicalize_pdf, CanonicalDocument, EPOCH_PDF_DATE, STRIPPED_INFO_KEYS};
pub use digest::{digest_document, hash_document, DocumentDigest};
pub use error::DocsealError;
pub use record::{ContentPointer, DocumentRecord, OrganizationRecord};
