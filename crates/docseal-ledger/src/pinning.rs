//! Off-ledger content pinning.
//!
//! Uploads the raw issued document to a Pinata-compatible pinning service
//! and returns the content pointer to record on the ledger. Only the issuer
//! write path uses this; verification never fetches content.
//!
//! ## Endpoint
//!
//! | Method | Path | Body |
//! |--------|------|------|
//! | POST | `pinning/pinFileToIPFS` | multipart: `file`, `pinataMetadata` (JSON) |

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use docseal_core::{ContentPointer, DocsealError};
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use url::Url;
use zeroize::Zeroizing;

use crate::config::LedgerConfig;

const PIN_FILE_PATH: &str = "pinning/pinFileToIPFS";

/// Errors from the pinning service.
#[derive(Debug, thiserror::Error)]
pub enum PinningError {
    /// HTTP transport error.
    #[error("HTTP error calling {endpoint}: {source}")]
    Http {
        endpoint: String,
        source: reqwest::Error,
    },
    /// The service returned a non-2xx status.
    #[error("pinning service {endpoint} returned {status}: {body}")]
    Api {
        endpoint: String,
        status: u16,
        body: String,
    },
    /// Response deserialization failed.
    #[error("failed to deserialize response from {endpoint}: {source}")]
    Deserialization {
        endpoint: String,
        source: reqwest::Error,
    },
    #[error("pinning service returned an empty content identifier")]
    EmptyPointer,
    #[error("DOCSEAL_PINNING_JWT is not set; pinning is disabled")]
    MissingToken,
    #[error("invalid pinning URL: {0}")]
    InvalidUrl(String),
    #[error("cannot encode pin metadata: {0}")]
    Metadata(String),
}

impl From<PinningError> for DocsealError {
    fn from(e: PinningError) -> Self {
        DocsealError::remote(PIN_FILE_PATH, e)
    }
}

/// Descriptive metadata stored alongside the pinned file.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PinMetadata {
    pub name: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub keyvalues: BTreeMap<String, String>,
}

impl PinMetadata {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            keyvalues: BTreeMap::new(),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.keyvalues.insert(key.into(), value.into());
        self
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PinFileResponse {
    ipfs_hash: String,
    pin_size: u64,
    #[serde(default)]
    timestamp: Option<DateTime<Utc>>,
}

/// A successfully pinned document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinnedDocument {
    pub pointer: ContentPointer,
    pub size: u64,
    pub pinned_at: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct PinningClient {
    http: reqwest::Client,
    base_url: Url,
    token: Zeroizing<String>,
}

impl std::fmt::Debug for PinningClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PinningClient")
            .field("base_url", &self.base_url)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

impl PinningClient {
    pub fn new(http: reqwest::Client, base_url: Url, token: Zeroizing<String>) -> Self {
        Self {
            http,
            base_url,
            token,
        }
    }

    /// Build a client from configuration. Fails when no token is configured.
    pub fn from_config(config: &LedgerConfig) -> Result<Self, PinningError> {
        let token = config.pinning_jwt.clone().ok_or(PinningError::MissingToken)?;
        let http = reqwest::Client::builder()
            .timeout(config.timeouts().write)
            .build()
            .map_err(|e| PinningError::Http {
                endpoint: "client_init".into(),
                source: e,
            })?;
        Ok(Self::new(http, config.pinning_url.clone(), token))
    }

    /// Upload `bytes` as `file_name` and return its content pointer.
    pub async fn pin_document(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        metadata: &PinMetadata,
    ) -> Result<PinnedDocument, PinningError> {
        let url = self
            .base_url
            .join(PIN_FILE_PATH)
            .map_err(|e| PinningError::InvalidUrl(e.to_string()))?;
        let endpoint = url.to_string();

        let file = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str("application/pdf")
            .map_err(|e| PinningError::Http {
                endpoint: endpoint.clone(),
                source: e,
            })?;
        let metadata = serde_json::to_string(metadata)
            .map_err(|e| PinningError::Metadata(e.to_string()))?;
        let form = Form::new().part("file", file).text("pinataMetadata", metadata);

        let resp = self
            .http
            .post(url)
            .bearer_auth(self.token.as_str())
            .multipart(form)
            .send()
            .await
            .map_err(|e| PinningError::Http {
                endpoint: endpoint.clone(),
                source: e,
            })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(PinningError::Api {
                endpoint,
                status,
                body,
            });
        }

        let pinned: PinFileResponse = resp
            .json()
            .await
            .map_err(|e| PinningError::Deserialization {
                endpoint: endpoint.clone(),
                source: e,
            })?;
        let pointer = ContentPointer::new(pinned.ipfs_hash).ok_or(PinningError::EmptyPointer)?;
        tracing::info!(%pointer, size = pinned.pin_size, "document pinned");

        Ok(PinnedDocument {
            pointer,
            size: pinned.pin_size,
            pinned_at: pinned.timestamp,
        })
    }
}
