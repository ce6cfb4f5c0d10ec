//! Ledger configuration and connection setup shared by every networked
//! subcommand.

use anyhow::{Context as _, Result};
use clap::Args;
use url::Url;

use docseal_core::Address;
use docseal_ledger::{Connection, LedgerConfig};

/// Global flags that override the environment.
#[derive(Args, Debug, Clone, Default)]
pub struct LedgerOpts {
    /// JSON-RPC endpoint (overrides DOCSEAL_RPC_URL).
    #[arg(long, global = true, value_name = "URL")]
    pub rpc_url: Option<Url>,

    /// Registry contract address (overrides DOCSEAL_REGISTRY_ADDRESS).
    #[arg(long, global = true, value_name = "ADDRESS")]
    pub registry: Option<Address>,

    /// Per-call timeout in seconds (overrides DOCSEAL_TIMEOUT_SECS).
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout_secs: Option<u64>,
}

impl LedgerOpts {
    /// Environment configuration with the flags applied on top.
    pub fn load(&self) -> Result<LedgerConfig> {
        let mut config = LedgerConfig::from_env_with_registry(self.registry)
            .context("failed to load ledger configuration")?;
        if let Some(url) = &self.rpc_url {
            config.rpc_url = url.clone();
        }
        if let Some(secs) = self.timeout_secs {
            config.timeout_secs = secs;
        }
        Ok(config)
    }
}

/// Everything a networked subcommand needs.
#[derive(Debug, Clone)]
pub struct Context {
    pub config: LedgerConfig,
    pub connection: Connection,
}

impl Context {
    pub fn new(config: LedgerConfig, connection: Connection) -> Self {
        Self { config, connection }
    }

    /// Connect to the configured EVM node.
    pub fn from_opts(opts: &LedgerOpts) -> Result<Self> {
        let config = opts.load()?;
        tracing::debug!(?config, "ledger configuration loaded");
        let connection = Connection::evm(&config).context("failed to set up ledger connection")?;
        Ok(Self::new(config, connection))
    }
}
