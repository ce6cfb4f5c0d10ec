//! # Account Subcommand
//!
//! Connects the identity provider and reports what the caller can do:
//! administer the registry, manage an organization's store, or sign up.

use anyhow::{Context as _, Result};
use clap::Args;
use serde::Serialize;

use docseal_core::{Address, OrganizationRecord};

use crate::Context;

/// Arguments for the `docseal account` subcommand.
#[derive(Args, Debug)]
pub struct AccountArgs {
    /// Print the account summary as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct AccountSummary {
    identity: Address,
    admin: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    organization: Option<OrganizationRecord>,
}

/// Execute the account subcommand.
pub async fn run_account(args: &AccountArgs, ctx: &Context) -> Result<u8> {
    let mut session = ctx.connection.session();
    let identity = session.connect().await.context("cannot connect identity")?;
    let mut registry = ctx.connection.registry();
    let admin = registry.get_admin().await.context("cannot read registry administrator")?;
    let organization = registry
        .organization_of(&identity)
        .await
        .context("cannot read organization record")?;

    let summary = AccountSummary {
        identity,
        admin: session.is(&admin),
        organization,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(crate::EXIT_OK);
    }

    println!("identity: {}", summary.identity);
    if summary.admin {
        println!("role: registry administrator");
    }
    match &summary.organization {
        Some(org) => {
            let status = if org.verified { "verified" } else { "pending verification" };
            println!("organization: {} ({status})", org.name);
            println!("record store: {}", ctx.config.explorer_address_url(&org.store));
        }
        None if !summary.admin => {
            println!("no organization registered; run `docseal issuer signup` to create one");
        }
        None => {}
    }
    Ok(crate::EXIT_OK)
}
