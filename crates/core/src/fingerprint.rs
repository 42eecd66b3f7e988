//! Content Fingerprinting
//!
//! SHA-256 digests used as cache and identity keys. A fingerprint is a pure
//! function of its input bytes; byte-identical inputs always produce the same
//! fingerprint.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::error::{PipelineError, PipelineResult};

/// A fixed-length content digest identifying a document or intermediate
/// artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// Fingerprint raw document bytes. Empty input is rejected.
    pub fn of_bytes(bytes: &[u8]) -> PipelineResult<Self> {
        if bytes.is_empty() {
            return Err(PipelineError::config("cannot fingerprint empty input"));
        }
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        Ok(Self(hasher.finalize().into()))
    }

    /// Fingerprint a normalized text artifact.
    pub fn of_text(text: &str) -> PipelineResult<Self> {
        Self::of_bytes(text.as_bytes())
    }

    /// The full lowercase hex string.
    pub fn to_hex(&self) -> String {
        let mut s = String::with_capacity(64);
        for byte in &self.0 {
            s.push_str(&format!("{:02x}", byte));
        }
        s
    }

    /// Parse from a 64-character hex string.
    pub fn from_hex(hex: &str) -> Option<Self> {
        if hex.len() != 64 {
            return None;
        }
        let mut bytes = [0u8; 32];
        for (i, chunk) in hex.as_bytes().chunks(2).enumerate() {
            let s = std::str::from_utf8(chunk).ok()?;
            bytes[i] = u8::from_str_radix(s, 16).ok()?;
        }
        Some(Self(bytes))
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for Fingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Fingerprint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Fingerprint::from_hex(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid fingerprint: {}", s)))
    }
}
