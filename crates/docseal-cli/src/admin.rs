//! # Admin Subcommand
//!
//! Registry administration: review registered organizations and verify them.
//! Every action first checks that the connected identity is the administrator.

use anyhow::{bail, Context as _, Result};
use clap::{Args, Subcommand};

use docseal_core::{Address, OrganizationRecord};
use docseal_ledger::{RegistryClient, Session};

use crate::Context;

/// Arguments for the `docseal admin` subcommand.
#[derive(Args, Debug)]
pub struct AdminArgs {
    #[command(subcommand)]
    pub command: AdminCommand,
}

#[derive(Subcommand, Debug)]
pub enum AdminCommand {
    /// List organizations awaiting verification and those already verified.
    List {
        /// Print the organizations as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Mark an organization as verified.
    Verify {
        /// Identity of the organization's owner.
        #[arg(value_name = "ADDRESS")]
        organization: Address,
    },
}

/// Execute the admin subcommand.
pub async fn run_admin(args: &AdminArgs, ctx: &Context) -> Result<u8> {
    let (session, mut registry) = connect_admin(ctx).await?;
    match &args.command {
        AdminCommand::List { json } => cmd_list(&mut registry, *json).await,
        AdminCommand::Verify { organization } => {
            cmd_verify(&session, &mut registry, organization).await
        }
    }
}

async fn connect_admin(ctx: &Context) -> Result<(Session, RegistryClient)> {
    let mut session = ctx.connection.session();
    let identity = session.connect().await.context("cannot connect identity")?;
    let mut registry = ctx.connection.registry();
    let admin = registry
        .get_admin()
        .await
        .context("cannot read registry administrator")?;
    if !session.is(&admin) {
        bail!("{identity} is not the registry administrator");
    }
    Ok((session, registry))
}

async fn cmd_list(registry: &mut RegistryClient, json: bool) -> Result<u8> {
    registry
        .list_organizations()
        .await
        .context("cannot list organizations")?;
    let pending = registry.pending();
    let verified = registry.verified();

    if json {
        let body = serde_json::json!({
            "pending": pending,
            "verified": verified,
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(crate::EXIT_OK);
    }

    print_section("Pending verification", &pending);
    println!();
    print_section("Verified", &verified);
    Ok(crate::EXIT_OK)
}

fn print_section(title: &str, orgs: &[&OrganizationRecord]) {
    println!("{title} ({}):", orgs.len());
    if orgs.is_empty() {
        println!("  (none)");
    }
    for org in orgs {
        println!("  {}  {}  {}", org.identity, org.name, org.data);
    }
}

async fn cmd_verify(
    session: &Session,
    registry: &mut RegistryClient,
    organization: &Address,
) -> Result<u8> {
    registry
        .set_verified(session, organization)
        .await
        .with_context(|| format!("failed to verify {organization}"))?;
    println!("OK: {organization} verified");
    Ok(crate::EXIT_OK)
}
