//! # EVM JSON-RPC Ledger
//!
//! Implements the registry, record store, and identity seams against an
//! EVM-compatible node.
//!
//! ## How It Works
//!
//! - Reads are `eth_call` against the latest block.
//! - Writes are first simulated with `eth_call` from the caller's identity.
//!   A revert there surfaces with its reason and nothing is submitted. A
//!   clean simulation is submitted with `eth_sendTransaction` and the
//!   receipt is polled until mined. Status `0x0` means the write reverted
//!   on-chain. Every request of a write is bounded by the write timeout, so
//!   a wallet waiting for approval is not cut off by the read bound.
//! - Identity comes from `eth_requestAccounts`, falling back to
//!   `eth_accounts` for nodes that do not implement the former.
//!
//! Signing is delegated to the endpoint. The `from` identity must be an
//! account the node or wallet can sign for.
//!
//! ## Contract Interface
//!
//! ```solidity
//! // Registry
//! function admin() view returns (address);
//! function getAllIssuers() view returns (Issuer[]);      // (address,string,string,bool,address)
//! function issuers(address) view returns (address,string,string,bool,address);
//! function signUpIssuer(string name, string data);
//! function verifyIssuer(address issuer);
//!
//! // Record store, one per issuer
//! function getAllCertificates() view returns (bytes32[]);
//! function certificates(bytes32) view returns (bool);
//! function revokedCertificates(bytes32) view returns (bool);
//! function certificatePointers(bytes32) view returns (string);
//! function issueCertificate(bytes32 digest, string pointer);
//! function revokeCertificate(bytes32 digest);
//! ```

use std::time::Duration;

use async_trait::async_trait;
use docseal_core::{
    Address, ContentPointer, DocsealError, DocumentDigest, DocumentRecord, OrganizationRecord,
};
use serde_json::{json, Value};

use crate::abi::{self, ParamType, Token};
use crate::config::LedgerConfig;
use crate::ledger::{IdentityProvider, RecordStoreLedger, RegistryLedger};
use crate::rpc::{RpcClient, RpcError, METHOD_NOT_FOUND};

const ADMIN: &str = "admin()";
const GET_ALL_ISSUERS: &str = "getAllIssuers()";
const ISSUERS: &str = "issuers(address)";
const SIGN_UP_ISSUER: &str = "signUpIssuer(string,string)";
const VERIFY_ISSUER: &str = "verifyIssuer(address)";
const GET_ALL_CERTIFICATES: &str = "getAllCertificates()";
const CERTIFICATES: &str = "certificates(bytes32)";
const REVOKED_CERTIFICATES: &str = "revokedCertificates(bytes32)";
const CERTIFICATE_POINTERS: &str = "certificatePointers(bytes32)";
const ISSUE_CERTIFICATE: &str = "issueCertificate(bytes32,string)";
const REVOKE_CERTIFICATE: &str = "revokeCertificate(bytes32)";

fn issuer_fields() -> Vec<ParamType> {
    vec![
        ParamType::Address,
        ParamType::String,
        ParamType::String,
        ParamType::Bool,
        ParamType::Address,
    ]
}

/// What a write was trying to do. Used to classify reverts.
#[derive(Debug, Clone, Copy)]
enum Write<'a> {
    Register { identity: &'a Address },
    Verify { organization: &'a Address },
    Issue { digest: &'a DocumentDigest },
    Revoke { digest: &'a DocumentDigest },
}

impl Write<'_> {
    fn operation(&self) -> &'static str {
        match self {
            Write::Register { .. } => SIGN_UP_ISSUER,
            Write::Verify { .. } => VERIFY_ISSUER,
            Write::Issue { .. } => ISSUE_CERTIFICATE,
            Write::Revoke { .. } => REVOKE_CERTIFICATE,
        }
    }
}

/// Ledger access over EVM JSON-RPC.
#[derive(Debug)]
pub struct EvmLedger {
    rpc: RpcClient,
    registry: Address,
    write_timeout: Duration,
    poll_interval: Duration,
}

impl EvmLedger {
    pub fn new(config: &LedgerConfig) -> Result<Self, DocsealError> {
        let timeouts = config.timeouts();
        let rpc = RpcClient::new(config.rpc_url.clone(), timeouts.call)
            .map_err(|e| DocsealError::ProviderUnavailable(e.to_string()))?;
        Ok(Self {
            rpc,
            registry: config.registry,
            write_timeout: timeouts.write,
            poll_interval: config.receipt_poll_interval(),
        })
    }

    /// `eth_call` and decode the return data.
    async fn call(
        &self,
        to: &Address,
        signature: &'static str,
        args: &[Token],
        outputs: &[ParamType],
    ) -> Result<Vec<Token>, DocsealError> {
        let data = format!("0x{}", hex::encode(abi::encode_call(signature, args)));
        let result = self
            .rpc
            .request(
                "eth_call",
                json!([{ "to": to.to_string(), "data": data }, "latest"]),
            )
            .await
            .map_err(|e| read_error(signature, e))?;
        let bytes = hex_result(signature, &result)?;
        abi::decode(outputs, &bytes).map_err(|e| DocsealError::remote(signature, e))
    }

    async fn call_one(
        &self,
        to: &Address,
        signature: &'static str,
        args: &[Token],
        output: ParamType,
    ) -> Result<Token, DocsealError> {
        self.call(to, signature, args, &[output])
            .await?
            .pop()
            .ok_or_else(|| DocsealError::remote(signature, "empty return data"))
    }

    async fn call_bool(
        &self,
        store: &Address,
        signature: &'static str,
        digest: &DocumentDigest,
    ) -> Result<bool, DocsealError> {
        self.call_one(store, signature, &[digest_token(digest)], ParamType::Bool)
            .await?
            .into_bool()
            .ok_or_else(|| DocsealError::remote(signature, "expected bool"))
    }

    /// Revocation flag and pointer of a record known to exist.
    async fn record(
        &self,
        store: &Address,
        digest: &DocumentDigest,
    ) -> Result<DocumentRecord, DocsealError> {
        let revoked = self.call_bool(store, REVOKED_CERTIFICATES, digest).await?;
        let pointer = self
            .call_one(
                store,
                CERTIFICATE_POINTERS,
                &[digest_token(digest)],
                ParamType::String,
            )
            .await?
            .into_string()
            .ok_or_else(|| DocsealError::remote(CERTIFICATE_POINTERS, "expected string"))?;
        Ok(DocumentRecord {
            digest: *digest,
            pointer: ContentPointer::new(pointer),
            revoked,
        })
    }

    /// Simulate, submit, and wait for the receipt.
    async fn transact(
        &self,
        from: &Address,
        to: &Address,
        write: Write<'_>,
        args: &[Token],
    ) -> Result<(), DocsealError> {
        let operation = write.operation();
        let data = format!("0x{}", hex::encode(abi::encode_call(operation, args)));
        let tx = json!({
            "from": from.to_string(),
            "to": to.to_string(),
            "data": data,
        });

        self.rpc
            .request_within("eth_call", json!([tx.clone(), "latest"]), self.write_timeout)
            .await
            .map_err(|e| write_error(write, e))?;

        let hash = self
            .rpc
            .request_within("eth_sendTransaction", json!([tx]), self.write_timeout)
            .await
            .map_err(|e| write_error(write, e))?;
        let hash = hash
            .as_str()
            .ok_or_else(|| DocsealError::remote(operation, "eth_sendTransaction returned non-string result"))?
            .to_string();
        tracing::info!(operation, %from, tx = %hash, "transaction submitted");

        self.await_receipt(operation, &hash).await
    }

    async fn await_receipt(&self, operation: &str, hash: &str) -> Result<(), DocsealError> {
        loop {
            let receipt = self
                .rpc
                .request_within("eth_getTransactionReceipt", json!([hash]), self.write_timeout)
                .await
                .map_err(|e| transport_error(operation, e))?;

            if receipt.is_null() {
                tracing::debug!(operation, tx = %hash, "receipt pending");
                tokio::time::sleep(self.poll_interval).await;
                continue;
            }

            // Receipts from before Byzantium carry no status; mined is all they say.
            let status = receipt.get("status").and_then(Value::as_str);
            if status.is_none() {
                tracing::debug!(operation, tx = %hash, "receipt has no status field");
            }
            if status == Some("0x0") {
                tracing::warn!(operation, tx = %hash, "transaction reverted");
                return Err(DocsealError::remote(
                    operation,
                    format!("transaction {hash} reverted"),
                ));
            }
            tracing::info!(operation, tx = %hash, "transaction confirmed");
            return Ok(());
        }
    }
}

#[async_trait]
impl RegistryLedger for EvmLedger {
    async fn admin(&self) -> Result<Address, DocsealError> {
        self.call_one(&self.registry, ADMIN, &[], ParamType::Address)
            .await?
            .into_address()
            .ok_or_else(|| DocsealError::remote(ADMIN, "expected address"))
    }

    async fn organizations(&self) -> Result<Vec<OrganizationRecord>, DocsealError> {
        let list = self
            .call_one(
                &self.registry,
                GET_ALL_ISSUERS,
                &[],
                ParamType::Array(Box::new(ParamType::Tuple(issuer_fields()))),
            )
            .await?
            .into_array()
            .ok_or_else(|| DocsealError::remote(GET_ALL_ISSUERS, "expected array"))?;

        list.into_iter()
            .map(|entry| {
                entry
                    .into_tuple()
                    .and_then(organization_from_fields)
                    .ok_or_else(|| DocsealError::remote(GET_ALL_ISSUERS, "malformed issuer entry"))
            })
            .collect()
    }

    async fn organization(&self, owner: &Address) -> Result<Option<OrganizationRecord>, DocsealError> {
        let fields = self
            .call(&self.registry, ISSUERS, &[Token::Address(*owner)], &issuer_fields())
            .await?;
        let record = organization_from_fields(fields)
            .ok_or_else(|| DocsealError::remote(ISSUERS, "malformed issuer entry"))?;
        // Mappings return a zeroed struct for unknown keys.
        Ok((!record.store.is_zero()).then_some(record))
    }

    async fn register_organization(
        &self,
        from: &Address,
        name: &str,
        data: &str,
    ) -> Result<(), DocsealError> {
        self.transact(
            from,
            &self.registry,
            Write::Register { identity: from },
            &[Token::String(name.to_string()), Token::String(data.to_string())],
        )
        .await
    }

    async fn set_verified(&self, from: &Address, organization: &Address) -> Result<(), DocsealError> {
        self.transact(
            from,
            &self.registry,
            Write::Verify { organization },
            &[Token::Address(*organization)],
        )
        .await
    }
}

#[async_trait]
impl RecordStoreLedger for EvmLedger {
    async fn documents(&self, store: &Address) -> Result<Vec<DocumentRecord>, DocsealError> {
        let digests = self
            .call_one(
                store,
                GET_ALL_CERTIFICATES,
                &[],
                ParamType::Array(Box::new(ParamType::Bytes32)),
            )
            .await?
            .into_array()
            .ok_or_else(|| DocsealError::remote(GET_ALL_CERTIFICATES, "expected array"))?;

        let mut records = Vec::with_capacity(digests.len());
        for token in digests {
            let bytes = token
                .into_bytes32()
                .ok_or_else(|| DocsealError::remote(GET_ALL_CERTIFICATES, "expected bytes32"))?;
            records.push(self.record(store, &DocumentDigest::from_bytes(bytes)).await?);
        }
        Ok(records)
    }

    async fn lookup(
        &self,
        store: &Address,
        digest: &DocumentDigest,
    ) -> Result<Option<DocumentRecord>, DocsealError> {
        if !self.call_bool(store, CERTIFICATES, digest).await? {
            return Ok(None);
        }
        self.record(store, digest).await.map(Some)
    }

    async fn issue(
        &self,
        from: &Address,
        store: &Address,
        digest: &DocumentDigest,
        pointer: Option<&ContentPointer>,
    ) -> Result<(), DocsealError> {
        let pointer = pointer.map(|p| p.as_str().to_string()).unwrap_or_default();
        self.transact(
            from,
            store,
            Write::Issue { digest },
            &[digest_token(digest), Token::String(pointer)],
        )
        .await
    }

    async fn revoke(
        &self,
        from: &Address,
        store: &Address,
        digest: &DocumentDigest,
    ) -> Result<(), DocsealError> {
        self.transact(from, store, Write::Revoke { digest }, &[digest_token(digest)])
            .await
    }
}

#[async_trait]
impl IdentityProvider for EvmLedger {
    async fn request_accounts(&self) -> Result<Vec<Address>, DocsealError> {
        let accounts = match self.rpc.request("eth_requestAccounts", json!([])).await {
            Ok(v) => v,
            Err(RpcError::Rpc { code, .. }) if code == METHOD_NOT_FOUND => {
                tracing::debug!("eth_requestAccounts unsupported, falling back to eth_accounts");
                self.rpc
                    .request("eth_accounts", json!([]))
                    .await
                    .map_err(identity_error)?
            }
            Err(e) => return Err(identity_error(e)),
        };

        let list = accounts.as_array().ok_or_else(|| {
            DocsealError::ProviderUnavailable("account list is not an array".into())
        })?;
        list.iter()
            .map(|v| {
                v.as_str()
                    .ok_or_else(|| DocsealError::ProviderUnavailable("account is not a string".into()))
                    .and_then(Address::parse)
            })
            .collect()
    }
}

fn digest_token(digest: &DocumentDigest) -> Token {
    Token::Bytes32(*digest.as_bytes())
}

fn organization_from_fields(fields: Vec<Token>) -> Option<OrganizationRecord> {
    let mut fields = fields.into_iter();
    Some(OrganizationRecord {
        identity: fields.next()?.into_address()?,
        name: fields.next()?.into_string()?,
        data: fields.next()?.into_string()?,
        verified: fields.next()?.into_bool()?,
        store: fields.next()?.into_address()?,
    })
}

fn hex_result(operation: &str, result: &Value) -> Result<Vec<u8>, DocsealError> {
    let s = result
        .as_str()
        .ok_or_else(|| DocsealError::remote(operation, "eth_call returned non-string result"))?;
    hex::decode(s.trim_start_matches("0x")).map_err(|e| DocsealError::remote(operation, e))
}

/// Transport failures: an expired bound is a `Timeout`, anything else a `RemoteCall`.
fn transport_error(operation: &str, e: RpcError) -> DocsealError {
    match e {
        RpcError::TimedOut { after, .. } => DocsealError::Timeout {
            operation: operation.to_string(),
            after,
        },
        other => DocsealError::remote(operation, other),
    }
}

fn read_error(operation: &str, e: RpcError) -> DocsealError {
    match e {
        RpcError::Rpc { message, data, .. } => {
            DocsealError::remote(operation, revert_reason(&message, data.as_ref()))
        }
        other => transport_error(operation, other),
    }
}

/// User rejection is `Authorization`, nothing listening is
/// `ProviderUnavailable`, a provider that answers badly is `RemoteCall`.
fn identity_error(e: RpcError) -> DocsealError {
    match e {
        RpcError::Rpc { code: 4001, message, .. } => DocsealError::Authorization(message),
        e if e.is_unreachable() => DocsealError::ProviderUnavailable(e.to_string()),
        other => transport_error("eth_requestAccounts", other),
    }
}

/// Best available human-readable revert reason.
fn revert_reason(message: &str, data: Option<&Value>) -> String {
    data.and_then(Value::as_str)
        .and_then(|s| hex::decode(s.trim_start_matches("0x")).ok())
        .and_then(|bytes| abi::decode_revert_reason(&bytes))
        .unwrap_or_else(|| {
            message
                .trim_start_matches("execution reverted")
                .trim_start_matches(':')
                .trim()
                .to_string()
        })
}

fn write_error(write: Write<'_>, e: RpcError) -> DocsealError {
    match e {
        RpcError::Rpc { message, data, .. } => {
            classify_revert(write, &revert_reason(&message, data.as_ref()))
        }
        other => transport_error(write.operation(), other),
    }
}

/// Map a revert reason to the error the caller can act on.
fn classify_revert(write: Write<'_>, reason: &str) -> DocsealError {
    const DENIED: &[&str] = &[
        "only admin",
        "only owner",
        "only issuer",
        "not authorized",
        "unauthorized",
        "caller is not",
        "not the owner",
    ];
    const DUPLICATE: &[&str] = &["already", "exists"];
    const MISSING: &[&str] = &["not found", "does not exist", "not issued", "not registered"];

    let lower = reason.to_ascii_lowercase();
    let mentions = |needles: &[&str]| needles.iter().any(|n| lower.contains(*n));

    if mentions(DENIED) {
        return DocsealError::Authorization(reason.to_string());
    }
    if mentions(MISSING) {
        let subject = match write {
            Write::Register { identity } => identity.to_string(),
            Write::Verify { organization } => organization.to_string(),
            Write::Issue { digest } | Write::Revoke { digest } => digest.to_hex(),
        };
        return DocsealError::NotFound(format!("{subject}: {reason}"));
    }
    if mentions(DUPLICATE) {
        return match write {
            Write::Register { identity } => DocsealError::DuplicateRegistration {
                identity: identity.to_string(),
            },
            Write::Issue { digest } => DocsealError::DuplicateDigest {
                digest: digest.to_hex(),
            },
            Write::Revoke { digest } => DocsealError::AlreadyRevoked {
                digest: digest.to_hex(),
            },
            Write::Verify { .. } => DocsealError::remote(write.operation(), reason),
        };
    }
    DocsealError::remote(write.operation(), reason)
}
