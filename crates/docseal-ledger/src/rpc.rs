//! JSON-RPC 2.0 transport over HTTP.
//!
//! One POST per request. Signing is delegated to the node or wallet behind
//! the endpoint: this crate never holds key material.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde_json::Value;
use url::Url;

/// JSON-RPC error code for "method not found".
pub const METHOD_NOT_FOUND: i64 = -32601;

/// Transport-level and protocol-level RPC failures.
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    /// The endpoint could not be reached at all.
    #[error("cannot reach {endpoint}: {source}")]
    Unreachable {
        endpoint: String,
        source: reqwest::Error,
    },
    /// The endpoint answered with a non-2xx status.
    #[error("{endpoint} returned HTTP {status}")]
    Status { endpoint: String, status: u16 },
    /// The node returned a JSON-RPC error object.
    #[error("{method}: {message} (code {code})")]
    Rpc {
        method: String,
        code: i64,
        message: String,
        data: Option<Value>,
    },
    /// The response was not a well-formed JSON-RPC envelope.
    #[error("invalid response to {method}: {reason}")]
    InvalidResponse { method: String, reason: String },
    /// The request did not complete within its bound.
    #[error("{method} timed out after {after:?}")]
    TimedOut { method: String, after: Duration },
}

impl RpcError {
    /// True when nothing is listening at the endpoint.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, RpcError::Unreachable { .. })
    }
}

/// JSON-RPC client. The HTTP client carries no global timeout; every
/// request is bounded individually.
#[derive(Debug)]
pub struct RpcClient {
    http: reqwest::Client,
    endpoint: Url,
    default_timeout: Duration,
    next_id: AtomicU64,
}

impl RpcClient {
    pub fn new(endpoint: Url, default_timeout: Duration) -> Result<Self, RpcError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| RpcError::Unreachable {
                endpoint: "client_init".into(),
                source: e,
            })?;
        Ok(Self {
            http,
            endpoint,
            default_timeout,
            next_id: AtomicU64::new(1),
        })
    }

    /// Send one request bounded by the default timeout.
    pub async fn request(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        self.request_within(method, params, self.default_timeout).await
    }

    /// Send one request bounded by `limit` and return its `result` member.
    pub async fn request_within(
        &self,
        method: &str,
        params: Value,
        limit: Duration,
    ) -> Result<Value, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = serde_json::json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": id,
        });
        tracing::trace!(method, id, "json-rpc request");

        let resp = self
            .http
            .post(self.endpoint.clone())
            .timeout(limit)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(method, limit, e))?;

        if !resp.status().is_success() {
            return Err(RpcError::Status {
                endpoint: self.endpoint.to_string(),
                status: resp.status().as_u16(),
            });
        }

        let mut envelope: Value = resp.json().await.map_err(|e| {
            if e.is_timeout() {
                self.transport_error(method, limit, e)
            } else {
                RpcError::InvalidResponse {
                    method: method.to_string(),
                    reason: e.to_string(),
                }
            }
        })?;

        if let Some(error) = envelope.get("error") {
            return Err(RpcError::Rpc {
                method: method.to_string(),
                code: error.get("code").and_then(Value::as_i64).unwrap_or(0),
                message: error
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown RPC error")
                    .to_string(),
                data: error.get("data").cloned(),
            });
        }

        match envelope.get_mut("result") {
            Some(result) => Ok(result.take()),
            None => Err(RpcError::InvalidResponse {
                method: method.to_string(),
                reason: "missing 'result' member".into(),
            }),
        }
    }

    fn transport_error(&self, method: &str, limit: Duration, e: reqwest::Error) -> RpcError {
        if e.is_timeout() {
            RpcError::TimedOut {
                method: method.to_string(),
                after: limit,
            }
        } else {
            RpcError::Unreachable {
                endpoint: self.endpoint.to_string(),
                source: e,
            }
        }
    }
}
