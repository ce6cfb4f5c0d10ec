//! # Ledger Addresses
//!
//! `Address` identifies both people (the caller's account, the administrator,
//! an organization's owner) and contracts (the registry, each record store).
//!
//! Parsing accepts mixed-case input. The stored form is always lowercase, so
//! identity comparison is case-insensitive and `wallet == admin` checks never
//! trip over checksum casing.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DocsealError;

/// A 20-byte ledger address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address([u8; 20]);

impl Address {
    /// The all-zero address. Registry lookups return it for "no record".
    pub const ZERO: Address = Address([0u8; 20]);

    /// Wrap raw address bytes.
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Parse `0x` followed by 40 hex digits.
    pub fn parse(s: &str) -> Result<Self, DocsealError> {
        let body = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .ok_or_else(|| DocsealError::MalformedInput(format!("address must start with 0x: {s}")))?;
        if body.len() != 40 {
            return Err(DocsealError::MalformedInput(format!(
                "address must have 40 hex digits, got {}: {s}",
                body.len()
            )));
        }
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(body, &mut bytes)
            .map_err(|e| DocsealError::MalformedInput(format!("invalid address {s}: {e}")))?;
        Ok(Self(bytes))
    }

    /// Raw address bytes.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// True for [`Address::ZERO`].
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = DocsealError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Address {
    type Error = DocsealError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Address> for String {
    fn from(a: Address) -> Self {
        a.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_normalizes_to_lowercase() {
        let a = Address::parse("0xAbCdEf0123456789AbCdEf0123456789AbCdEf01").unwrap();
        assert_eq!(a.to_string(), "0xabcdef0123456789abcdef0123456789abcdef01");
    }

    #[test]
    fn mixed_case_inputs_compare_equal() {
        let a = Address::parse("0x23B8109e3B6E054c5b53c32295B91e108958AA1E").unwrap();
        let b = Address::parse("0x23b8109e3b6e054c5b53c32295b91e108958aa1e").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_malformed_addresses() {
        assert!(Address::parse("").is_err());
        assert!(Address::parse("0x").is_err());
        assert!(Address::parse("0x123").is_err());
        assert!(Address::parse("deadbeefdeadbeefdeadbeefdeadbeefdeadbeef").is_err());
        assert!(Address::parse("0xGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGG").is_err());
    }

    #[test]
    fn zero_address() {
        let z = Address::parse("0x0000000000000000000000000000000000000000").unwrap();
        assert!(z.is_zero());
        assert_eq!(z, Address::ZERO);
        assert!(!Address::from_bytes([1u8; 20]).is_zero());
    }

    #[test]
    fn serde_uses_string_form() {
        let a = Address::from_bytes([0xab; 20]);
        let json = serde_json::to_string(&a).unwrap();
        assert_eq!(json, format!("\"0x{}\"", "ab".repeat(20)));
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, a);
        assert!(serde_json::from_str::<Address>("\"0x12\"").is_err());
    }
}
