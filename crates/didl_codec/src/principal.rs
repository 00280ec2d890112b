//! Principals: opaque identity bytes with a checksummed textual form
//!
//! # Textual form
//!
//! ```text
//! base32( crc32(bytes) as 4 big-endian bytes ‖ bytes )
//!   lowercase RFC 4648 alphabet, no padding, dash every 5 characters
//! ```
//!
//! Parsing re-derives the text from the decoded bytes and requires an exact
//! match, so the checksum, the grouping and the case are all validated at once.

use std::fmt;
use std::str::FromStr;

use sha2::{Digest, Sha224};

use crate::{Error, Result};

/// Trailing byte of the anonymous principal
pub const ANONYMOUS_SUFFIX: u8 = 4;

/// Trailing byte of a self-authenticating principal
pub const SELF_AUTHENTICATING_SUFFIX: u8 = 2;

/// Characters per dash-separated group
const GROUP_LEN: usize = 5;

/// Length of the CRC prefix in the textual form
const CHECKSUM_LEN: usize = 4;

const ALPHABET: &[u8; 32] = b"abcdefghijklmnopqrstuvwxyz234567";

/// An identity, stored as raw bytes
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Principal {
    bytes: Vec<u8>,
}

impl Principal {
    /// The anonymous identity `[4]`
    pub fn anonymous() -> Self {
        Self {
            bytes: vec![ANONYMOUS_SUFFIX],
        }
    }

    /// The management canister (no bytes)
    pub fn management_canister() -> Self {
        Self { bytes: Vec::new() }
    }

    /// `sha224(public_key) ‖ [2]`
    pub fn self_authenticating(public_key: &[u8]) -> Self {
        let mut bytes = Sha224::digest(public_key).to_vec();
        bytes.push(SELF_AUTHENTICATING_SUFFIX);
        Self { bytes }
    }

    /// Wrap raw bytes
    pub fn from_slice(bytes: &[u8]) -> Self {
        Self {
            bytes: bytes.to_vec(),
        }
    }

    /// Raw bytes
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// Take the raw bytes
    pub fn into_vec(self) -> Vec<u8> {
        self.bytes
    }

    /// True for the anonymous identity
    pub fn is_anonymous(&self) -> bool {
        self.bytes == [ANONYMOUS_SUFFIX]
    }

    /// Uppercase hex of the raw bytes
    pub fn to_hex(&self) -> String {
        hex::encode_upper(&self.bytes)
    }

    /// Parse the hex form (either case)
    pub fn from_hex(text: &str) -> Result<Self> {
        let bytes = hex::decode(text).map_err(|e| Error::InvalidHex(e.to_string()))?;
        Ok(Self { bytes })
    }

    /// Checksummed, dash-grouped base32 form
    pub fn to_text(&self) -> String {
        let mut payload = Vec::with_capacity(CHECKSUM_LEN + self.bytes.len());
        payload.extend_from_slice(&crc32(&self.bytes).to_be_bytes());
        payload.extend_from_slice(&self.bytes);

        let encoded = base32_encode(&payload);
        let mut text = String::with_capacity(encoded.len() + encoded.len() / GROUP_LEN);
        for (i, c) in encoded.chars().enumerate() {
            if i > 0 && i % GROUP_LEN == 0 {
                text.push('-');
            }
            text.push(c);
        }
        text
    }

    /// Parse the textual form, validating the checksum by round trip
    pub fn from_text(text: &str) -> Result<Self> {
        let compact: String = text
            .chars()
            .filter(|&c| c != '-')
            .map(|c| c.to_ascii_lowercase())
            .collect();
        let decoded = base32_decode(&compact)?;

        let principal = Self::from_slice(decoded.get(CHECKSUM_LEN..).unwrap_or_default());
        let expected = principal.to_text();
        if expected != text {
            return Err(Error::ChecksumMismatch {
                text: text.to_string(),
                expected,
            });
        }
        Ok(principal)
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl FromStr for Principal {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_text(s)
    }
}

impl AsRef<[u8]> for Principal {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl From<Vec<u8>> for Principal {
    fn from(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Principal {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_text())
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Principal {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = <String as serde::Deserialize>::deserialize(deserializer)?;
        Self::from_text(&text).map_err(serde::de::Error::custom)
    }
}

/// IEEE CRC32 (reflected polynomial 0xEDB88320)
pub fn crc32(data: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

fn base32_encode(data: &[u8]) -> String {
    let mut out = String::with_capacity((data.len() * 8).div_ceil(5));
    let mut buffer = 0u32;
    let mut bits = 0u32;
    for &byte in data {
        buffer = (buffer << 8) | u32::from(byte);
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            out.push(ALPHABET[((buffer >> bits) & 0x1f) as usize] as char);
        }
    }
    if bits > 0 {
        out.push(ALPHABET[((buffer << (5 - bits)) & 0x1f) as usize] as char);
    }
    out
}

fn base32_decode(text: &str) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(text.len() * 5 / 8);
    let mut buffer = 0u32;
    let mut bits = 0u32;
    for c in text.chars() {
        buffer = (buffer << 5) | base32_value(c)?;
        bits += 5;
        if bits >= 8 {
            bits -= 8;
            out.push((buffer >> bits) as u8);
        }
        buffer &= (1 << bits) - 1;
    }
    Ok(out)
}

fn base32_value(c: char) -> Result<u32> {
    match c {
        'a'..='z' => Ok(c as u32 - 'a' as u32),
        '2'..='7' => Ok(c as u32 - '2' as u32 + 26),
        '0' => Ok('o' as u32 - 'a' as u32),
        '1' => Ok('i' as u32 - 'a' as u32),
        _ => Err(Error::InvalidBase32(c)),
    }
}
