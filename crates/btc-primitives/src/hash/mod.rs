//! Hash function primitives.
//!
//! Provides SHA-256, double SHA-256, RIPEMD-160 and Hash160 as used by
//! Bitcoin for transaction ids, signature digests, Base58Check checksums
//! and address payloads.

use sha2::{Digest, Sha256};
use ripemd::Ripemd160;

/// Compute SHA-256 hash of the input data.
///
/// # Arguments
/// * `data` - Byte slice to hash.
///
/// # Returns
/// A 32-byte SHA-256 digest.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Compute double SHA-256 (SHA-256d) hash of the input data.
///
/// This is the standard Bitcoin hash function used for transaction IDs,
/// signature preimages and Base58Check checksums.
///
/// # Arguments
/// * `data` - Byte slice to hash.
///
/// # Returns
/// A 32-byte double-SHA-256 digest.
pub fn sha256d(data: &[u8]) -> [u8; 32] {
    sha256(&sha256(data))
}

/// Compute RIPEMD-160 hash of the input data.
pub fn ripemd160(data: &[u8]) -> [u8; 20] {
    let mut hasher = Ripemd160::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Compute Hash160: RIPEMD-160(SHA-256(data)).
///
/// Used for P2PKH public key hashes and P2SH script hashes.
pub fn hash160(data: &[u8]) -> [u8; 20] {
    ripemd160(&sha256(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    // (input, sha256, sha256d, ripemd160, hash160)
    const VECTORS: &[(&[u8], &str, &str, &str, &str)] = &[
        (
            b"",
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855",
            "5df6e0e2761359d30a8275058e299fcc0381534545f55cf43e41983f5d4c9456",
            "9c1185a5c5e9fc54612808977ee8f548b2258d31",
            "b472a266d0bd89c13706a4132ccfb16f7c3b9fcb",
        ),
    ];

    #[test]
    fn test_empty_input_vectors() {
        for (data, sha, sha_d, ripemd, h160) in VECTORS {
            assert_eq!(hex::encode(sha256(data)), *sha);
            assert_eq!(hex::encode(sha256d(data)), *sha_d);
            assert_eq!(hex::encode(ripemd160(data)), *ripemd);
            assert_eq!(hex::encode(hash160(data)), *h160);
        }
    }

    #[test]
    fn test_text_vectors() {
        assert_eq!(
            hex::encode(ripemd160(b"I am a test")),
            "09a23f506b4a37cabab8a9e49b541de582fca96b"
        );
        let data = b"this is the data I want to hash";
        assert_eq!(
            hex::encode(sha256d(data)),
            "2209ddda5914a3fbad507ff2284c4b6e559c18a669f9fc3ad3b5826a2a999d58"
        );
        assert_eq!(hex::encode(hash160(data)), "e7fb13ef86fef4203f042fbfc2703fa628301e90");
    }

    #[test]
    fn test_composition() {
        let data = b"compose";
        assert_eq!(sha256d(data), sha256(&sha256(data)));
        assert_eq!(hash160(data), ripemd160(&sha256(data)));
    }
}
