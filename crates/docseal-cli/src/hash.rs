//! # Hash Subcommand
//!
//! Prints the canonical digest of one or more documents. Works offline.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use docseal_core::{hash_document, DocumentDigest};

/// Arguments for the `docseal hash` subcommand.
#[derive(Args, Debug)]
pub struct HashArgs {
    /// Documents to hash.
    #[arg(value_name = "FILE", required = true)]
    pub files: Vec<PathBuf>,
}

/// Execute the hash subcommand.
///
/// Prints `<digest>  <path>` per document. A document that cannot be read
/// or parsed is reported and the rest are still hashed.
pub fn run_hash(args: &HashArgs) -> Result<u8> {
    let mut failed = false;
    for (path, digest) in args.files.iter().zip(hash_files(&args.files)) {
        match digest {
            Ok(digest) => println!("{digest}  {}", path.display()),
            Err(e) => {
                println!("FAIL: {}: {e:#}", path.display());
                failed = true;
            }
        }
    }
    Ok(if failed { crate::EXIT_FAILURE } else { crate::EXIT_OK })
}

/// Digest of each file, in order. One failure does not stop the rest.
pub fn hash_files(paths: &[PathBuf]) -> Vec<Result<DocumentDigest>> {
    paths
        .iter()
        .map(|path| -> Result<DocumentDigest> {
            let raw = crate::read_document(path)?;
            Ok(hash_document(&raw)?)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use docseal_core::canonical::fixtures::SamplePdf;

    #[test]
    fn hash_reports_malformed_document() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.pdf");
        let bad = dir.path().join("bad.pdf");
        std::fs::write(&good, SamplePdf::new("ok").build()).unwrap();
        std::fs::write(&bad, b"not a pdf").unwrap();

        let code = run_hash(&HashArgs {
            files: vec![good.clone()],
        })
        .unwrap();
        assert_eq!(code, crate::EXIT_OK);

        let code = run_hash(&HashArgs {
            files: vec![good, bad],
        })
        .unwrap();
        assert_eq!(code, crate::EXIT_FAILURE);
    }

    #[test]
    fn hash_continues_past_unreadable_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.pdf");
        let good = dir.path().join("good.pdf");
        std::fs::write(&good, SamplePdf::new("still hashed").build()).unwrap();

        let results = hash_files(&[missing.clone(), good.clone()]);
        assert!(results[0].as_ref().unwrap_err().to_string().contains("file not found"));
        assert!(results[1].is_ok());

        let code = run_hash(&HashArgs {
            files: vec![missing, good],
        })
        .unwrap();
        assert_eq!(code, crate::EXIT_FAILURE);
    }
}
