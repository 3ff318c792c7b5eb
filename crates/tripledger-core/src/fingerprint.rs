//! Content fingerprinting: hashing image bytes for cache keys and IDs

use crate::error::Result;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Number of fingerprint characters kept for receipt identifiers
pub const RECEIPT_ID_LEN: usize = 16;

/// Compute the SHA-256 hex fingerprint of raw image bytes.
///
/// Identical bytes always produce the identical fingerprint. The
/// fingerprint is an opaque cache key, not a security primitive. Empty
/// input hashes the empty byte sequence rather than being rejected.
pub fn fingerprint_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Fingerprint a file on disk by hashing its full contents
pub fn fingerprint_file(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(fingerprint_bytes(&bytes))
}

/// Derive the short receipt identifier from a fingerprint
pub fn receipt_id_from(fingerprint: &str) -> String {
    fingerprint.chars().take(RECEIPT_ID_LEN).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_fingerprint_deterministic() {
        let a = fingerprint_bytes(b"receipt image bytes");
        let b = fingerprint_bytes(b"receipt image bytes");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_fingerprint_differs_for_different_bytes() {
        let a = fingerprint_bytes(b"photo one");
        let b = fingerprint_bytes(b"photo two");
        assert_ne!(a, b);
    }

    #[test]
    fn test_empty_input_is_permitted() {
        assert_eq!(
            fingerprint_bytes(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_receipt_id_is_fingerprint_prefix() {
        let fp = fingerprint_bytes(b"some image");
        let id = receipt_id_from(&fp);
        assert_eq!(id.len(), RECEIPT_ID_LEN);
        assert!(fp.starts_with(&id));
    }

    #[test]
    fn test_fingerprint_file_matches_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("receipt.jpg");
        std::fs::write(&path, b"jpeg-ish bytes").unwrap();
        assert_eq!(
            fingerprint_file(&path).unwrap(),
            fingerprint_bytes(b"jpeg-ish bytes")
        );
    }

    proptest! {
        #[test]
        fn prop_fingerprint_deterministic(bytes in proptest::collection::vec(any::<u8>(), 0..1024)) {
            let a = fingerprint_bytes(&bytes);
            let b = fingerprint_bytes(&bytes);
            prop_assert_eq!(&a, &b);
            prop_assert_eq!(a.len(), 64);
            prop_assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        }
    }
}
