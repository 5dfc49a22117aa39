// ABOUTME: Local content distributor that only hashes content.
// ABOUTME: Used for dry runs where nothing is uploaded to a controller.

use sha2::{Digest, Sha256};
use std::io::Read;

use super::{ContentDistributor, ContentHash, DistributionError};

/// Computes a SHA-256 digest of the content without uploading it.
#[derive(Debug, Clone, Copy, Default)]
pub struct DigestDistributor;

impl DigestDistributor {
    fn digest(content: &mut dyn Read) -> Result<ContentHash, DistributionError> {
        let mut hasher = Sha256::new();
        let mut buffer = [0u8; 8192];
        loop {
            let read = content.read(&mut buffer)?;
            if read == 0 {
                break;
            }
            hasher.update(&buffer[..read]);
        }
        Ok(ContentHash::new(hasher.finalize().to_vec()))
    }
}

impl ContentDistributor for DigestDistributor {
    fn distribute(
        &self,
        name: &str,
        _runtime_name: &str,
        content: &mut dyn Read,
    ) -> Result<ContentHash, DistributionError> {
        let hash = Self::digest(content)?;
        tracing::debug!(unit = name, hash = %hash, "hashed deployment content");
        Ok(hash)
    }

    fn distribute_replacement(
        &self,
        name: &str,
        runtime_name: &str,
        content: &mut dyn Read,
    ) -> Result<ContentHash, DistributionError> {
        self.distribute(name, runtime_name, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn hashes_content_with_sha256() {
        let mut content = Cursor::new(b"abc".to_vec());
        let hash = DigestDistributor
            .distribute("app.war", "app.war", &mut content)
            .unwrap();
        assert_eq!(
            hash.to_hex(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn replacement_hash_matches_distribution_hash() {
        let a = DigestDistributor
            .distribute("a", "a", &mut Cursor::new(b"same".to_vec()))
            .unwrap();
        let b = DigestDistributor
            .distribute_replacement("a", "a", &mut Cursor::new(b"same".to_vec()))
            .unwrap();
        assert_eq!(a, b);
    }
}
