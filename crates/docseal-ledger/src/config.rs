//! Ledger client configuration.
//!
//! Everything is read from the environment, with defaults aimed at a local
//! development node. The registry address has no default: it is fixed at
//! deployment and must be supplied.

use std::time::Duration;

use docseal_core::{Address, ContentPointer};
use url::Url;
use zeroize::Zeroizing;

use crate::deadline::Timeouts;

/// Configuration for talking to the ledger and the pinning service.
///
/// Custom `Debug` implementation redacts the `pinning_jwt` field
/// to prevent credential leakage in log output.
#[derive(Clone)]
pub struct LedgerConfig {
    /// JSON-RPC endpoint of the node or wallet bridge.
    pub rpc_url: Url,
    /// Address of the issuer registry contract.
    pub registry: Address,
    /// Bound on a single remote call, in seconds.
    pub timeout_secs: u64,
    /// Bound on a write from submission through confirmation, in seconds.
    pub confirm_timeout_secs: u64,
    /// Interval between transaction receipt polls, in milliseconds.
    pub receipt_poll_ms: u64,
    /// Block explorer base URL for address links.
    pub explorer_url: Url,
    /// Host serving pinned content at `/ipfs/<pointer>`.
    pub gateway_host: String,
    /// Base URL of the pinning service API.
    pub pinning_url: Url,
    /// Bearer token for the pinning service. Pinning is disabled without it.
    pub pinning_jwt: Option<Zeroizing<String>>,
}

impl std::fmt::Debug for LedgerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerConfig")
            .field("rpc_url", &self.rpc_url)
            .field("registry", &self.registry)
            .field("timeout_secs", &self.timeout_secs)
            .field("confirm_timeout_secs", &self.confirm_timeout_secs)
            .field("receipt_poll_ms", &self.receipt_poll_ms)
            .field("explorer_url", &self.explorer_url)
            .field("gateway_host", &self.gateway_host)
            .field("pinning_url", &self.pinning_url)
            .field(
                "pinning_jwt",
                &self.pinning_jwt.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl LedgerConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `DOCSEAL_RPC_URL` (default: `http://127.0.0.1:8545`)
    /// - `DOCSEAL_REGISTRY_ADDRESS` (required)
    /// - `DOCSEAL_TIMEOUT_SECS` (default: 30)
    /// - `DOCSEAL_CONFIRM_TIMEOUT_SECS` (default: 120)
    /// - `DOCSEAL_RECEIPT_POLL_MS` (default: 1000)
    /// - `DOCSEAL_EXPLORER_URL` (default: `https://sepolia.etherscan.io`)
    /// - `DOCSEAL_GATEWAY_HOST` (default: `gateway.pinata.cloud`)
    /// - `DOCSEAL_PINNING_URL` (default: `https://api.pinata.cloud`)
    /// - `DOCSEAL_PINNING_JWT` (optional)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with_registry(None)
    }

    /// Like [`from_env`](Self::from_env), but an explicit `registry` takes
    /// precedence over `DOCSEAL_REGISTRY_ADDRESS`.
    pub fn from_env_with_registry(registry: Option<Address>) -> Result<Self, ConfigError> {
        let registry = match registry {
            Some(registry) => registry,
            None => {
                let raw = std::env::var("DOCSEAL_REGISTRY_ADDRESS")
                    .map_err(|_| ConfigError::MissingRegistry)?;
                Address::parse(&raw).map_err(|e| {
                    ConfigError::InvalidAddress("DOCSEAL_REGISTRY_ADDRESS".into(), e.to_string())
                })?
            }
        };

        Ok(Self {
            rpc_url: env_url("DOCSEAL_RPC_URL", "http://127.0.0.1:8545")?,
            registry,
            timeout_secs: env_u64("DOCSEAL_TIMEOUT_SECS", 30)?,
            confirm_timeout_secs: env_u64("DOCSEAL_CONFIRM_TIMEOUT_SECS", 120)?,
            receipt_poll_ms: env_u64("DOCSEAL_RECEIPT_POLL_MS", 1000)?,
            explorer_url: env_url("DOCSEAL_EXPLORER_URL", "https://sepolia.etherscan.io")?,
            gateway_host: std::env::var("DOCSEAL_GATEWAY_HOST")
                .unwrap_or_else(|_| "gateway.pinata.cloud".to_string()),
            pinning_url: env_url("DOCSEAL_PINNING_URL", "https://api.pinata.cloud")?,
            pinning_jwt: std::env::var("DOCSEAL_PINNING_JWT")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(Zeroizing::new),
        })
    }

    /// A configuration pointing at a local node (for testing).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidUrl` if `rpc_url` cannot be parsed.
    pub fn local(rpc_url: &str, registry: Address) -> Result<Self, ConfigError> {
        let parse = |var: &str, raw: &str| {
            Url::parse(raw).map_err(|e| ConfigError::InvalidUrl(var.to_string(), e.to_string()))
        };
        Ok(Self {
            rpc_url: parse("rpc_url", rpc_url)?,
            registry,
            timeout_secs: 5,
            confirm_timeout_secs: 10,
            receipt_poll_ms: 10,
            explorer_url: parse("explorer_url", "https://sepolia.etherscan.io")?,
            gateway_host: "gateway.pinata.cloud".to_string(),
            pinning_url: parse("pinning_url", "https://api.pinata.cloud")?,
            pinning_jwt: None,
        })
    }

    pub fn timeouts(&self) -> Timeouts {
        Timeouts {
            call: Duration::from_secs(self.timeout_secs),
            write: Duration::from_secs(self.confirm_timeout_secs),
        }
    }

    pub fn receipt_poll_interval(&self) -> Duration {
        Duration::from_millis(self.receipt_poll_ms)
    }

    /// Explorer page for an address: `<explorer>/address/<address>`.
    pub fn explorer_address_url(&self, address: &Address) -> String {
        format!(
            "{}/address/{address}",
            self.explorer_url.as_str().trim_end_matches('/')
        )
    }

    /// Public gateway URL for a content pointer.
    pub fn gateway_url(&self, pointer: &ContentPointer) -> String {
        pointer.gateway_url(&self.gateway_host)
    }
}

fn env_url(var: &str, default: &str) -> Result<Url, ConfigError> {
    let raw = std::env::var(var).unwrap_or_else(|_| default.to_string());
    Url::parse(&raw).map_err(|e| ConfigError::InvalidUrl(var.to_string(), e.to_string()))
}

fn env_u64(var: &str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidNumber(var.to_string(), raw)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("DOCSEAL_REGISTRY_ADDRESS environment variable is required")]
    MissingRegistry,
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
    #[error("invalid address for {0}: {1}")]
    InvalidAddress(String, String),
    #[error("invalid number for {0}: {1}")]
    InvalidNumber(String, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> Address {
        Address::from_bytes([0x42; 20])
    }

    #[test]
    fn local_builds_valid_config() {
        let cfg = LedgerConfig::local("http://127.0.0.1:9545", registry()).unwrap();
        assert_eq!(cfg.rpc_url.as_str(), "http://127.0.0.1:9545/");
        assert_eq!(cfg.timeouts().call, Duration::from_secs(5));
        assert!(cfg.pinning_jwt.is_none());
    }

    #[test]
    fn debug_redacts_jwt() {
        let mut cfg = LedgerConfig::local("http://127.0.0.1:9545", registry()).unwrap();
        cfg.pinning_jwt = Some(Zeroizing::new("super-secret-jwt".into()));
        let rendered = format!("{cfg:?}");
        assert!(!rendered.contains("super-secret-jwt"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn explorer_link_template() {
        let cfg = LedgerConfig::local("http://127.0.0.1:9545", registry()).unwrap();
        assert_eq!(
            cfg.explorer_address_url(&registry()),
            format!("https://sepolia.etherscan.io/address/0x{}", "42".repeat(20))
        );
    }

    #[test]
    fn env_url_uses_default_when_var_absent() {
        let url = env_url("DOCSEAL_NONEXISTENT_VAR_12345", "https://example.com").unwrap();
        assert_eq!(url.as_str(), "https://example.com/");
    }

    #[test]
    fn env_u64_rejects_garbage() {
        std::env::set_var("DOCSEAL_TEST_BAD_NUMBER", "thirty");
        let result = env_u64("DOCSEAL_TEST_BAD_NUMBER", 30);
        std::env::remove_var("DOCSEAL_TEST_BAD_NUMBER");
        assert!(matches!(result, Err(ConfigError::InvalidNumber(_, _))));
    }
}
