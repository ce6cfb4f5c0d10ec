//! # Verify Subcommand
//!
//! Resolves a document, or a digest computed elsewhere, to an issuer verdict.
//! Needs no identity provider.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Args;

use docseal_core::{hash_document, DocumentDigest};
use docseal_ledger::{Verdict, Verification};

use crate::Context;

/// Arguments for the `docseal verify` subcommand.
#[derive(Args, Debug)]
#[command(group(clap::ArgGroup::new("subject").required(true).args(["file", "digest"])))]
pub struct VerifyArgs {
    /// Document to verify.
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Verify a precomputed digest instead of a file.
    #[arg(long, value_name = "HEX")]
    pub digest: Option<DocumentDigest>,

    /// Print the verdict as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Execute the verify subcommand.
pub async fn run_verify(args: &VerifyArgs, ctx: &Context) -> Result<u8> {
    let digest = match (&args.digest, &args.file) {
        (Some(digest), _) => *digest,
        (None, Some(path)) => {
            let raw = crate::read_document(path)?;
            hash_document(&raw).with_context(|| format!("cannot hash {}", path.display()))?
        }
        (None, None) => anyhow::bail!("either FILE or --digest is required"),
    };

    let verification = ctx
        .connection
        .resolver()
        .verify(&digest)
        .await
        .context("verification failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&verification)?);
    } else {
        print_verification(&verification, ctx);
    }
    Ok(exit_code(&verification.verdict))
}

/// Exit code for a verdict.
pub fn exit_code(verdict: &Verdict) -> u8 {
    match verdict {
        Verdict::Valid { .. } => crate::EXIT_OK,
        Verdict::Revoked { .. } => crate::EXIT_REVOKED,
        Verdict::Invalid => crate::EXIT_FAILURE,
    }
}

fn print_verification(v: &Verification, ctx: &Context) {
    match &v.verdict {
        Verdict::Valid { issuer, .. } => {
            let status = if issuer.verified { "verified" } else { "unverified" };
            println!("VALID: {} issued by {} ({status} issuer {})", v.digest, issuer.name, issuer.identity);
        }
        Verdict::Revoked { issuer, .. } => {
            println!("REVOKED: {} was issued by {} ({}) and has been revoked", v.digest, issuer.name, issuer.identity);
        }
        Verdict::Invalid => {
            println!("INVALID: no issuer has recorded {}", v.digest);
        }
    }
    if let Some(pointer) = v.verdict.pointer() {
        println!("  document: {}", ctx.config.gateway_url(pointer));
    }
    if !v.skipped.is_empty() {
        println!(
            "  WARNING: {} record store(s) could not be reached; the result may be incomplete",
            v.skipped.len()
        );
    }
}
