//! # Issuer Subcommand
//!
//! Organization workflow: sign up with the registry, then issue, list, and
//! revoke documents in the organization's record store.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use clap::{Args, Subcommand};

use docseal_core::{hash_document, ContentPointer, DocsealError, DocumentDigest};
use docseal_ledger::{IssuerRecordStoreClient, PinMetadata, PinningClient, Session};

use crate::Context;

/// Arguments for the `docseal issuer` subcommand.
#[derive(Args, Debug)]
pub struct IssuerArgs {
    #[command(subcommand)]
    pub command: IssuerCommand,
}

#[derive(Subcommand, Debug)]
pub enum IssuerCommand {
    /// Register the connected identity as an organization.
    Signup {
        /// Organization display name.
        #[arg(long)]
        name: String,

        /// Free-form organization details (contact, website, etc.).
        #[arg(long)]
        data: String,
    },

    /// List documents recorded in the organization's store.
    List {
        /// Include revoked documents.
        #[arg(long)]
        all: bool,

        /// Print the records as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Record a document as issued by the organization.
    Issue {
        /// Document to issue.
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Content pointer of a copy already pinned elsewhere.
        #[arg(long, value_name = "CID", conflicts_with = "pin")]
        pointer: Option<String>,

        /// Pin the document to the pinning service and record its pointer.
        #[arg(long)]
        pin: bool,
    },

    /// Revoke a previously issued document.
    Revoke {
        /// Digest of the document to revoke.
        #[arg(value_name = "DIGEST")]
        digest: DocumentDigest,
    },
}

/// Execute the issuer subcommand.
pub async fn run_issuer(args: &IssuerArgs, ctx: &Context) -> Result<u8> {
    let mut session = ctx.connection.session();
    session.connect().await.context("cannot connect identity")?;

    match &args.command {
        IssuerCommand::Signup { name, data } => cmd_signup(&session, ctx, name, data).await,
        IssuerCommand::List { all, json } => cmd_list(&session, ctx, *all, *json).await,
        IssuerCommand::Issue { file, pointer, pin } => {
            cmd_issue(&session, ctx, file, pointer.as_deref(), *pin).await
        }
        IssuerCommand::Revoke { digest } => cmd_revoke(&session, ctx, digest).await,
    }
}

async fn cmd_signup(session: &Session, ctx: &Context, name: &str, data: &str) -> Result<u8> {
    let mut registry = ctx.connection.registry();
    registry
        .register_organization(session, name, data)
        .await
        .context("sign-up failed")?;

    let identity = session.require_identity()?;
    match registry.organization_of(&identity).await {
        Ok(Some(org)) => {
            println!("OK: {} registered, awaiting verification", org.name);
            println!("record store: {}", ctx.config.explorer_address_url(&org.store));
        }
        _ => println!("OK: {} registered, awaiting verification", name.trim()),
    }
    Ok(crate::EXIT_OK)
}

async fn open_own_store(session: &Session, ctx: &Context) -> Result<IssuerRecordStoreClient> {
    let identity = session.require_identity()?;
    ctx.connection
        .open_store(&identity)
        .await
        .context("cannot open the organization's record store")
}

async fn cmd_list(session: &Session, ctx: &Context, all: bool, json: bool) -> Result<u8> {
    let store = open_own_store(session, ctx).await?;
    let records: Vec<_> = if all {
        store.snapshot().iter().collect()
    } else {
        store.active()
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(crate::EXIT_OK);
    }

    println!("{} ({} document(s)):", store.organization().name, records.len());
    println!("record store: {}", ctx.config.explorer_address_url(&store.store()));
    for record in records {
        let state = if record.revoked { "revoked" } else { "active" };
        match &record.pointer {
            Some(pointer) => println!("  {}  {state}  {}", record.digest, ctx.config.gateway_url(pointer)),
            None => println!("  {}  {state}", record.digest),
        }
    }
    Ok(crate::EXIT_OK)
}

async fn cmd_issue(
    session: &Session,
    ctx: &Context,
    file: &Path,
    pointer: Option<&str>,
    pin: bool,
) -> Result<u8> {
    let raw = crate::read_document(file)?;
    let digest = hash_document(&raw).with_context(|| format!("cannot hash {}", file.display()))?;
    let mut store = open_own_store(session, ctx).await?;

    // Reject a known digest before anything is uploaded.
    match store.lookup(&digest).await {
        Ok(_) => {
            return Err(DocsealError::DuplicateDigest {
                digest: digest.to_hex(),
            })
            .with_context(|| format!("failed to issue {digest}"));
        }
        Err(DocsealError::NotFound(_)) => {}
        Err(e) => return Err(e).context("cannot check the record store"),
    }

    let pointer = match (pointer, pin) {
        (Some(cid), _) => Some(
            ContentPointer::new(cid).with_context(|| format!("invalid content pointer: {cid:?}"))?,
        ),
        (None, true) => Some(pin_document(ctx, file, raw, &digest).await?),
        (None, false) => None,
    };

    store
        .issue(session, &digest, pointer.clone())
        .await
        .with_context(|| format!("failed to issue {digest}"))?;

    println!("OK: issued {digest}");
    if let Some(pointer) = &pointer {
        println!("  document: {}", ctx.config.gateway_url(pointer));
    }
    Ok(crate::EXIT_OK)
}

async fn pin_document(
    ctx: &Context,
    file: &Path,
    raw: Vec<u8>,
    digest: &DocumentDigest,
) -> Result<ContentPointer> {
    let client = PinningClient::from_config(&ctx.config)?;
    let file_name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document.pdf".to_string());
    let metadata = PinMetadata::named(file_name.clone()).with("digest", digest.to_prefixed_hex());
    let pinned = client
        .pin_document(&file_name, raw, &metadata)
        .await
        .context("failed to pin document")?;
    tracing::info!(pointer = pinned.pointer.as_str(), size = pinned.size, "document pinned");
    Ok(pinned.pointer)
}

async fn cmd_revoke(session: &Session, ctx: &Context, digest: &DocumentDigest) -> Result<u8> {
    let mut store = open_own_store(session, ctx).await?;
    store
        .revoke(session, digest)
        .await
        .with_context(|| format!("failed to revoke {digest}"))?;
    println!("OK: revoked {digest}");
    Ok(crate::EXIT_OK)
}
