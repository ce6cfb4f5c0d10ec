//! # Document Canonicalization — Metadata-Stripped PDF Bytes
//!
//! This module defines `CanonicalDocument`, the sole construction path for
//! bytes used in document digest computation.
//!
//! ## Security Invariant
//!
//! The `CanonicalDocument` newtype has a private inner field. The only way to
//! construct it is through [`canonicalize_pdf()`], which parses the upload,
//! resets the volatile document-information entries, and re-serializes the
//! whole document. Any function requiring canonical bytes for digest
//! computation must accept `&CanonicalDocument`, so the "hashed the raw
//! upload" defect class is structurally impossible.
//!
//! ## Stripping Rules
//!
//! Viewers rewrite the Info dictionary on every save. These entries are reset:
//!
//! | Key | Canonical value |
//! |-----|-----------------|
//! | `Title`, `Author`, `Subject`, `Keywords`, `Producer`, `Creator` | empty string |
//! | `CreationDate`, `ModDate` | the epoch, `D:19700101000000Z` |
//!
//! A document without an Info dictionary gets one. The reset keys are written
//! after every other Info key, in the fixed order of [`STRIPPED_INFO_KEYS`],
//! so the key order of the source file cannot leak into the output. All
//! other objects, including any custom Info keys, are preserved.

use lopdf::{Dictionary, Document, Object, ObjectId};

use crate::error::DocsealError;

/// The epoch in PDF date syntax.
pub const EPOCH_PDF_DATE: &str = "D:19700101000000Z";

/// Info dictionary keys reset by canonicalization, in output order.
pub const STRIPPED_INFO_KEYS: [&str; 8] = [
    "Title",
    "Author",
    "Subject",
    "Keywords",
    "Producer",
    "Creator",
    "CreationDate",
    "ModDate",
];

/// Document bytes produced exclusively by [`canonicalize_pdf()`].
///
/// # Invariants
///
/// - Every key in [`STRIPPED_INFO_KEYS`] is present in the Info dictionary
///   with its canonical value.
/// - The same logical document always yields the same bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalDocument(Vec<u8>);

impl CanonicalDocument {
    /// Access the canonical bytes for digest computation.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns the length of the canonical byte sequence.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the canonical byte sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for CanonicalDocument {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Canonicalize raw PDF bytes.
///
/// # Errors
///
/// Returns [`DocsealError::MalformedInput`] if the bytes do not parse as a PDF
/// or the stripped document cannot be re-serialized.
pub fn canonicalize_pdf(raw: &[u8]) -> Result<CanonicalDocument, DocsealError> {
    let mut doc = Document::load_mem(raw)
        .map_err(|e| DocsealError::MalformedInput(format!("not a readable PDF document: {e}")))?;

    strip_info(&mut doc);

    let mut out = Vec::with_capacity(raw.len());
    doc.save_to(&mut out)
        .map_err(|e| DocsealError::MalformedInput(format!("failed to re-serialize PDF: {e}")))?;
    Ok(CanonicalDocument(out))
}

/// Reset the volatile Info entries, creating the dictionary when absent.
fn strip_info(doc: &mut Document) {
    match doc.trailer.get(b"Info").ok().cloned() {
        Some(Object::Reference(id)) => {
            if let Some(info) = info_dict_mut(doc, id) {
                *info = reset_entries(info);
                return;
            }
        }
        Some(Object::Dictionary(info)) => {
            doc.trailer.set("Info", Object::Dictionary(reset_entries(&info)));
            return;
        }
        _ => {}
    }

    // Missing, dangling, or not a dictionary.
    let id = doc.add_object(reset_entries(&Dictionary::new()));
    doc.trailer.set("Info", id);
}

fn info_dict_mut(doc: &mut Document, id: ObjectId) -> Option<&mut Dictionary> {
    doc.get_object_mut(id).ok()?.as_dict_mut().ok()
}

/// Rebuild an Info dictionary: retained keys in source order, then the reset keys.
fn reset_entries(info: &Dictionary) -> Dictionary {
    let mut out = Dictionary::new();
    for (key, value) in info.iter() {
        if !STRIPPED_INFO_KEYS.iter().any(|k| k.as_bytes() == key.as_slice()) {
            out.set(key.clone(), value.clone());
        }
    }
    for key in STRIPPED_INFO_KEYS {
        let value = match key {
            "CreationDate" | "ModDate" => EPOCH_PDF_DATE,
            _ => "",
        };
        out.set(key, Object::string_literal(value));
    }
    out
}

#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures {
    //! In-memory PDF builder for tests across the workspace.

    use lopdf::{dictionary, Document, Object, Stream};

    /// A one-page PDF with a line of text and optional Info entries.
    #[derive(Debug, Clone, Default)]
    pub struct SamplePdf {
        text: String,
        info: Vec<(String, String)>,
    }

    impl SamplePdf {
        /// A page showing `text`.
        pub fn new(text: impl Into<String>) -> Self {
            Self {
                text: text.into(),
                info: Vec::new(),
            }
        }

        /// Add an Info entry. Entries are written in call order.
        pub fn info(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
            self.info.push((key.into(), value.into()));
            self
        }

        /// Serialize the document.
        pub fn build(&self) -> Vec<u8> {
            let mut doc = Document::with_version("1.5");
            let pages_id = doc.new_object_id();
            let font_id = doc.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => "Helvetica",
            });
            let resources_id = doc.add_object(dictionary! {
                "Font" => dictionary! { "F1" => font_id },
            });
            let escaped = self
                .text
                .replace('\\', "\\\\")
                .replace('(', "\\(")
                .replace(')', "\\)");
            let content = format!("BT /F1 24 Tf 72 720 Td ({escaped}) Tj ET");
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            doc.objects.insert(
                pages_id,
                Object::Dictionary(dictionary! {
                    "Type" => "Pages",
                    "Kids" => vec![page_id.into()],
                    "Count" => 1,
                    "Resources" => resources_id,
                    "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
                }),
            );
            let catalog_id = doc.add_object(dictionary! {
                "Type" => "Catalog",
                "Pages" => pages_id,
            });
            doc.trailer.set("Root", catalog_id);

            if !self.info.is_empty() {
                let mut info = lopdf::Dictionary::new();
                for (k, v) in &self.info {
                    info.set(k.as_str(), Object::string_literal(v.as_str()));
                }
                let info_id = doc.add_object(info);
                doc.trailer.set("Info", info_id);
            }

            let mut out = Vec::new();
            // Writing to a Vec cannot fail.
            let _ = doc.save_to(&mut out);
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::SamplePdf;
    use super::*;

    fn info_of(canonical: &CanonicalDocument) -> Dictionary {
        let doc = Document::load_mem(canonical.as_bytes()).unwrap();
        let id = doc.trailer.get(b"Info").unwrap().as_reference().unwrap();
        doc.get_object(id).unwrap().as_dict().unwrap().clone()
    }

    #[test]
    fn strips_every_volatile_key() {
        let raw = SamplePdf::new("Diploma")
            .info("Title", "Bachelor of Science")
            .info("Author", "Registrar")
            .info("Subject", "Degree")
            .info("Keywords", "degree science")
            .info("Producer", "Acrobat")
            .info("Creator", "Word")
            .info("CreationDate", "D:20240101120000Z")
            .info("ModDate", "D:20240202120000Z")
            .build();

        let canonical = canonicalize_pdf(&raw).unwrap();
        let info = info_of(&canonical);
        for key in ["Title", "Author", "Subject", "Keywords", "Producer", "Creator"] {
            assert_eq!(info.get(key.as_bytes()).unwrap().as_str().unwrap(), b"");
        }
        assert_eq!(
            info.get(b"CreationDate").unwrap().as_str().unwrap(),
            EPOCH_PDF_DATE.as_bytes()
        );
        assert_eq!(
            info.get(b"ModDate").unwrap().as_str().unwrap(),
            EPOCH_PDF_DATE.as_bytes()
        );
    }

    #[test]
    fn creates_info_when_missing() {
        let raw = SamplePdf::new("No metadata").build();
        let canonical = canonicalize_pdf(&raw).unwrap();
        let info = info_of(&canonical);
        assert_eq!(info.len(), STRIPPED_INFO_KEYS.len());
    }

    #[test]
    fn custom_info_keys_survive_and_precede_reset_keys() {
        let raw = SamplePdf::new("Transcript")
            .info("Title", "T")
            .info("Institution", "Example University")
            .build();
        let canonical = canonicalize_pdf(&raw).unwrap();
        let info = info_of(&canonical);
        let keys: Vec<&[u8]> = info.iter().map(|(k, _)| k.as_slice()).collect();
        assert_eq!(keys[0], b"Institution");
        assert_eq!(keys[1], b"Title");
        assert_eq!(
            info.get(b"Institution").unwrap().as_str().unwrap(),
            b"Example University"
        );
    }

    #[test]
    fn page_content_is_preserved() {
        let raw = SamplePdf::new("Preserved text").build();
        let canonical = canonicalize_pdf(&raw).unwrap();
        let doc = Document::load_mem(canonical.as_bytes()).unwrap();
        let pages = doc.get_pages();
        assert_eq!(pages.len(), 1);
        let page_id = *pages.values().next().unwrap();
        let content = doc.get_page_content(page_id).unwrap();
        let text = String::from_utf8_lossy(&content);
        assert!(text.contains("Preserved text"));
    }

    #[test]
    fn source_key_order_does_not_leak() {
        let a = SamplePdf::new("Order")
            .info("Title", "x")
            .info("Author", "y")
            .info("Institution", "U")
            .build();
        let b = SamplePdf::new("Order")
            .info("Author", "q")
            .info("Institution", "U")
            .info("Title", "r")
            .build();
        assert_eq!(canonicalize_pdf(&a).unwrap(), canonicalize_pdf(&b).unwrap());
    }

    #[test]
    fn rejects_non_pdf_input() {
        match canonicalize_pdf(b"definitely not a pdf") {
            Err(DocsealError::MalformedInput(_)) => {}
            other => panic!("expected MalformedInput, got: {other:?}"),
        }
    }

    #[test]
    fn rejects_empty_input() {
        assert!(matches!(
            canonicalize_pdf(&[]),
            Err(DocsealError::MalformedInput(_))
        ));
    }

    #[test]
    fn len_and_is_empty() {
        let canonical = canonicalize_pdf(&SamplePdf::new("x").build()).unwrap();
        assert!(!canonical.is_empty());
        assert_eq!(canonical.len(), canonical.as_bytes().len());
    }
}
