//! # Contract ABI Codec
//!
//! The subset of the Solidity ABI the registry and record store contracts
//! use: `address`, `bool`, `bytes32`, `string`, dynamic arrays, and tuples.
//!
//! Encoding follows the head/tail layout. Static values occupy one 32-byte
//! word in the head; dynamic values put an offset in the head and their
//! content in the tail. Offsets are relative to the start of the enclosing
//! tuple.
//!
//! Decoding never trusts a length or offset read from the wire. Every read is
//! bounds-checked against the return data, and array lengths are capped by
//! the number of bytes actually present before any allocation.

use docseal_core::Address;
use sha3::{Digest, Keccak256};

const WORD: usize = 32;

/// Errors decoding contract return data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AbiError {
    #[error("return data too short: need {needed} bytes at offset {offset}, have {len}")]
    OutOfBounds {
        offset: usize,
        needed: usize,
        len: usize,
    },
    #[error("{0} does not fit in a machine word")]
    Overflow(&'static str),
    #[error("bool word is neither 0 nor 1")]
    InvalidBool,
    #[error("address word has non-zero padding")]
    InvalidAddress,
    #[error("string is not valid UTF-8")]
    InvalidUtf8,
}

/// A parameter type, used to drive decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamType {
    Address,
    Bool,
    Bytes32,
    String,
    Array(Box<ParamType>),
    Tuple(Vec<ParamType>),
}

impl ParamType {
    fn is_dynamic(&self) -> bool {
        match self {
            ParamType::String | ParamType::Array(_) => true,
            ParamType::Tuple(items) => items.iter().any(ParamType::is_dynamic),
            _ => false,
        }
    }

    /// Bytes this type occupies in the head of its enclosing tuple.
    fn head_len(&self) -> usize {
        match self {
            ParamType::Tuple(items) if !self.is_dynamic() => {
                items.iter().map(ParamType::head_len).sum()
            }
            _ => WORD,
        }
    }
}

/// An ABI value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Address(Address),
    Bool(bool),
    Bytes32([u8; 32]),
    String(String),
    Array(Vec<Token>),
    Tuple(Vec<Token>),
}

impl Token {
    fn is_dynamic(&self) -> bool {
        match self {
            Token::String(_) | Token::Array(_) => true,
            Token::Tuple(items) => items.iter().any(Token::is_dynamic),
            _ => false,
        }
    }

    fn head_len(&self) -> usize {
        match self {
            Token::Tuple(items) if !self.is_dynamic() => items.iter().map(Token::head_len).sum(),
            _ => WORD,
        }
    }

    pub fn into_address(self) -> Option<Address> {
        match self {
            Token::Address(a) => Some(a),
            _ => None,
        }
    }

    pub fn into_bool(self) -> Option<bool> {
        match self {
            Token::Bool(b) => Some(b),
            _ => None,
        }
    }

    pub fn into_bytes32(self) -> Option<[u8; 32]> {
        match self {
            Token::Bytes32(b) => Some(b),
            _ => None,
        }
    }

    pub fn into_string(self) -> Option<String> {
        match self {
            Token::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn into_array(self) -> Option<Vec<Token>> {
        match self {
            Token::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn into_tuple(self) -> Option<Vec<Token>> {
        match self {
            Token::Tuple(items) => Some(items),
            _ => None,
        }
    }
}

/// First four bytes of `keccak256(signature)`.
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = Keccak256::digest(signature.as_bytes());
    let mut out = [0u8; 4];
    out.copy_from_slice(&hash[..4]);
    out
}

/// Selector followed by the encoded arguments.
pub fn encode_call(signature: &str, args: &[Token]) -> Vec<u8> {
    let mut out = selector(signature).to_vec();
    out.extend(encode(args));
    out
}

/// Encode a sequence of values as a tuple.
pub fn encode(tokens: &[Token]) -> Vec<u8> {
    let head_len: usize = tokens.iter().map(Token::head_len).sum();
    let mut head = Vec::with_capacity(head_len);
    let mut tail = Vec::new();
    for token in tokens {
        if token.is_dynamic() {
            head.extend_from_slice(&usize_word(head_len + tail.len()));
            tail.extend(encode_token(token));
        } else {
            head.extend(encode_token(token));
        }
    }
    head.extend(tail);
    head
}

fn encode_token(token: &Token) -> Vec<u8> {
    match token {
        Token::Address(a) => {
            let mut word = [0u8; WORD];
            word[12..].copy_from_slice(a.as_bytes());
            word.to_vec()
        }
        Token::Bool(b) => {
            let mut word = [0u8; WORD];
            word[31] = u8::from(*b);
            word.to_vec()
        }
        Token::Bytes32(b) => b.to_vec(),
        Token::String(s) => {
            let bytes = s.as_bytes();
            let mut out = usize_word(bytes.len()).to_vec();
            out.extend_from_slice(bytes);
            let padding = (WORD - bytes.len() % WORD) % WORD;
            out.resize(out.len() + padding, 0);
            out
        }
        Token::Array(items) => {
            let mut out = usize_word(items.len()).to_vec();
            out.extend(encode(items));
            out
        }
        Token::Tuple(items) => encode(items),
    }
}

fn usize_word(n: usize) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[WORD - 8..].copy_from_slice(&(n as u64).to_be_bytes());
    word
}

/// Decode return data against the declared output types.
pub fn decode(types: &[ParamType], data: &[u8]) -> Result<Vec<Token>, AbiError> {
    decode_tuple(types, data, 0)
}

fn decode_tuple(types: &[ParamType], data: &[u8], base: usize) -> Result<Vec<Token>, AbiError> {
    let mut cursor = base;
    let mut out = Vec::with_capacity(types.len());
    for ty in types {
        if ty.is_dynamic() {
            let relative = read_usize(data, cursor, "offset")?;
            let start = base
                .checked_add(relative)
                .ok_or(AbiError::Overflow("offset"))?;
            out.push(decode_at(ty, data, start)?);
            cursor += WORD;
        } else {
            out.push(decode_at(ty, data, cursor)?);
            cursor += ty.head_len();
        }
    }
    Ok(out)
}

fn decode_at(ty: &ParamType, data: &[u8], at: usize) -> Result<Token, AbiError> {
    match ty {
        ParamType::Address => {
            let word = read_word(data, at)?;
            if word[..12].iter().any(|b| *b != 0) {
                return Err(AbiError::InvalidAddress);
            }
            let mut bytes = [0u8; 20];
            bytes.copy_from_slice(&word[12..]);
            Ok(Token::Address(Address::from_bytes(bytes)))
        }
        ParamType::Bool => {
            let word = read_word(data, at)?;
            if word[..31].iter().any(|b| *b != 0) || word[31] > 1 {
                return Err(AbiError::InvalidBool);
            }
            Ok(Token::Bool(word[31] == 1))
        }
        ParamType::Bytes32 => Ok(Token::Bytes32(*read_word(data, at)?)),
        ParamType::String => {
            let len = read_usize(data, at, "string length")?;
            let bytes = read_slice(data, at + WORD, len)?;
            String::from_utf8(bytes.to_vec())
                .map(Token::String)
                .map_err(|_| AbiError::InvalidUtf8)
        }
        ParamType::Array(inner) => {
            let len = read_usize(data, at, "array length")?;
            // Each element needs at least one head word.
            let available = data.len().saturating_sub(at + WORD) / WORD;
            if len > available {
                return Err(AbiError::OutOfBounds {
                    offset: at + WORD,
                    needed: len.saturating_mul(WORD),
                    len: data.len(),
                });
            }
            let types = vec![(**inner).clone(); len];
            decode_tuple(&types, data, at + WORD).map(Token::Array)
        }
        ParamType::Tuple(items) => decode_tuple(items, data, at).map(Token::Tuple),
    }
}

fn read_slice(data: &[u8], offset: usize, needed: usize) -> Result<&[u8], AbiError> {
    offset
        .checked_add(needed)
        .and_then(|end| data.get(offset..end))
        .ok_or(AbiError::OutOfBounds {
            offset,
            needed,
            len: data.len(),
        })
}

fn read_word(data: &[u8], offset: usize) -> Result<&[u8; WORD], AbiError> {
    let slice = read_slice(data, offset, WORD)?;
    slice.try_into().map_err(|_| AbiError::OutOfBounds {
        offset,
        needed: WORD,
        len: data.len(),
    })
}

fn read_usize(data: &[u8], offset: usize, what: &'static str) -> Result<usize, AbiError> {
    let word = read_word(data, offset)?;
    if word[..WORD - 8].iter().any(|b| *b != 0) {
        return Err(AbiError::Overflow(what));
    }
    let mut tail = [0u8; 8];
    tail.copy_from_slice(&word[WORD - 8..]);
    usize::try_from(u64::from_be_bytes(tail)).map_err(|_| AbiError::Overflow(what))
}

/// Selector of the standard `Error(string)` revert payload.
pub const ERROR_STRING_SELECTOR: [u8; 4] = [0x08, 0xc3, 0x79, 0xa0];

/// Extract the message from an `Error(string)` revert payload.
pub fn decode_revert_reason(data: &[u8]) -> Option<String> {
    let body = data.strip_prefix(&ERROR_STRING_SELECTOR[..])?;
    decode(&[ParamType::String], body)
        .ok()?
        .pop()?
        .into_string()
}
