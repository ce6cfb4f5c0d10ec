//! # docseal CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use docseal_cli::account::{run_account, AccountArgs};
use docseal_cli::admin::{run_admin, AdminArgs};
use docseal_cli::hash::{run_hash, HashArgs};
use docseal_cli::issuer::{run_issuer, IssuerArgs};
use docseal_cli::verify::{run_verify, VerifyArgs};
use docseal_cli::{Context, LedgerOpts};

/// docseal: anchor documents on a ledger and verify who issued them.
///
/// Documents are identified by the digest of their canonical form, so
/// re-saving a PDF does not change its identity.
#[derive(Parser, Debug)]
#[command(name = "docseal", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(flatten)]
    ledger: LedgerOpts,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the canonical digest of documents. Works offline.
    Hash(HashArgs),

    /// Check whether a document was issued, and by whom.
    Verify(VerifyArgs),

    /// Connect the identity provider and show the caller's role.
    Account(AccountArgs),

    /// Review and verify registered organizations.
    Admin(AdminArgs),

    /// Sign up as an organization and manage issued documents.
    Issuer(IssuerArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(docseal_cli::EXIT_FAILURE)
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<u8> {
    if let Commands::Hash(args) = &cli.command {
        return run_hash(args);
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let ctx = Context::from_opts(&cli.ledger)?;

    runtime.block_on(async {
        match &cli.command {
            Commands::Hash(args) => run_hash(args),
            Commands::Verify(args) => run_verify(args, &ctx).await,
            Commands::Account(args) => run_account(args, &ctx).await,
            Commands::Admin(args) => run_admin(args, &ctx).await,
            Commands::Issuer(args) => run_issuer(args, &ctx).await,
        }
    })
}
