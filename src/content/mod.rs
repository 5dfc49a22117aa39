// ABOUTME: Deployment content seam: distributor trait, content hashes, attached streams.
// ABOUTME: The controller-side upload lives behind ContentDistributor; streams close on plan completion.

mod attached;
mod digest;

pub use attached::AttachedContent;
pub use digest::DigestDistributor;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::io::Read;

/// Hash the controller assigned to uploaded deployment content.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ContentHash(Vec<u8>);

impl ContentHash {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Lowercase hex rendering.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }

    pub fn from_hex(hex: &str) -> Result<Self, String> {
        if hex.len() % 2 != 0 {
            return Err(format!("odd-length content hash: {hex}"));
        }
        (0..hex.len())
            .step_by(2)
            .map(|i| {
                u8::from_str_radix(&hex[i..i + 2], 16)
                    .map_err(|_| format!("invalid hex in content hash: {hex}"))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ContentHash").field(&self.to_hex()).finish()
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for ContentHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_hex().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ContentHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        ContentHash::from_hex(&hex).map_err(serde::de::Error::custom)
    }
}

/// Errors raised while distributing deployment content.
#[derive(Debug, thiserror::Error)]
pub enum DistributionError {
    #[error("failed to read deployment content: {0}")]
    Io(#[from] std::io::Error),

    #[error("content rejected by controller: {0}")]
    Rejected(String),
}

/// Uploads deployment content and returns the hash the controller stored it under.
///
/// Called synchronously from the plan builder while `add`/`full_replace`
/// directives are applied, so implementations must be callable from any
/// thread.
pub trait ContentDistributor: Send + Sync {
    /// Upload content for a new deployment unit.
    fn distribute(
        &self,
        name: &str,
        runtime_name: &str,
        content: &mut dyn Read,
    ) -> Result<ContentHash, DistributionError>;

    /// Upload content that will replace an existing unit of the same name.
    fn distribute_replacement(
        &self,
        name: &str,
        runtime_name: &str,
        content: &mut dyn Read,
    ) -> Result<ContentHash, DistributionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_round_trips() {
        let hash = ContentHash::new(vec![0x00, 0xab, 0xff]);
        assert_eq!(hash.to_hex(), "00abff");
        assert_eq!(ContentHash::from_hex("00abff").unwrap(), hash);
    }

    #[test]
    fn from_hex_rejects_odd_length() {
        assert!(ContentHash::from_hex("abc").is_err());
    }

    #[test]
    fn from_hex_rejects_non_hex() {
        assert!(ContentHash::from_hex("zz").is_err());
    }
}
