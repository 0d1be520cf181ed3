//! ECDSA signature with DER and compact encodings.
//!
//! Signing uses RFC6979 deterministic nonces and always yields a low-S
//! signature (BIP-0062). DER is the encoding placed in scriptSigs and
//! witnesses; the 65-byte compact form carries a recovery id and is used
//! for signed messages.

use k256::ecdsa::signature::hazmat::PrehashVerifier;
use k256::ecdsa::{self, RecoveryId, VerifyingKey};

use crate::ec::private_key::PrivateKey;
use crate::ec::public_key::PublicKey;
use crate::PrimitivesError;

/// Length of a compact recoverable signature.
pub const COMPACT_LEN: usize = 65;

/// Base value of the compact signature header byte.
const COMPACT_HEADER_BASE: u8 = 27;

/// Header offset marking a compressed public key.
const COMPACT_COMPRESSED_FLAG: u8 = 4;

/// An ECDSA signature over secp256k1.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Signature {
    inner: ecdsa::Signature,
}

impl Signature {
    /// Create a signature from big-endian R and S values.
    ///
    /// # Returns
    /// An error if either value is zero or not below the curve order.
    pub fn new(r: [u8; 32], s: [u8; 32]) -> Result<Self, PrimitivesError> {
        let inner = ecdsa::Signature::from_scalars(r, s)
            .map_err(|e| PrimitivesError::InvalidSignature(e.to_string()))?;
        Ok(Signature { inner })
    }

    /// The R component, big-endian.
    pub fn r(&self) -> [u8; 32] {
        self.inner.split_bytes().0.into()
    }

    /// The S component, big-endian.
    pub fn s(&self) -> [u8; 32] {
        self.inner.split_bytes().1.into()
    }

    /// Parse a strict DER-encoded signature.
    ///
    /// Expected format: `0x30 <len> 0x02 <r_len> <r> 0x02 <s_len> <s>`.
    pub fn from_der(bytes: &[u8]) -> Result<Self, PrimitivesError> {
        let inner = ecdsa::Signature::from_der(bytes)
            .map_err(|e| PrimitivesError::InvalidSignature(format!("malformed DER: {}", e)))?;
        Ok(Signature { inner })
    }

    /// Serialize in DER format, normalizing S to the lower half of the order.
    pub fn to_der(&self) -> Vec<u8> {
        self.low_s().to_der().as_bytes().to_vec()
    }

    /// Sign a 32-byte digest with RFC6979 deterministic nonces.
    pub fn sign(hash: &[u8; 32], priv_key: &PrivateKey) -> Result<Self, PrimitivesError> {
        Self::sign_recoverable(hash, priv_key).map(|(sig, _)| sig)
    }

    /// Sign a 32-byte digest and return the low-S signature and its recovery id.
    ///
    /// The recovery id (0..=3) identifies which of the candidate public keys
    /// produced the signature.
    pub fn sign_recoverable(
        hash: &[u8; 32],
        priv_key: &PrivateKey,
    ) -> Result<(Self, u8), PrimitivesError> {
        let (sig, recovery_id) = priv_key
            .signing_key()
            .sign_prehash_recoverable(hash)
            .map_err(|e| PrimitivesError::InvalidSignature(e.to_string()))?;
        // Negating S mirrors R's point, flipping the y-parity bit.
        let (sig, recovery_id) = match sig.normalize_s() {
            Some(normalized) => (normalized, recovery_id.to_byte() ^ 1),
            None => (sig, recovery_id.to_byte()),
        };
        Ok((Signature { inner: sig }, recovery_id))
    }

    /// Verify this signature against a 32-byte digest and public key.
    ///
    /// High-S signatures are normalized before verification.
    pub fn verify(&self, hash: &[u8; 32], pub_key: &PublicKey) -> bool {
        pub_key
            .verifying_key()
            .verify_prehash(hash, &self.low_s())
            .is_ok()
    }

    /// Serialize as a 65-byte compact signature: header, R, S.
    ///
    /// The header is `27 + recovery_id`, plus 4 when the signer's public key
    /// is compressed.
    pub fn to_compact(&self, recovery_id: u8, compressed: bool) -> [u8; COMPACT_LEN] {
        let mut out = [0u8; COMPACT_LEN];
        out[0] = COMPACT_HEADER_BASE
            + recovery_id
            + if compressed { COMPACT_COMPRESSED_FLAG } else { 0 };
        out[1..33].copy_from_slice(&self.r());
        out[33..65].copy_from_slice(&self.s());
        out
    }

    /// Parse a 65-byte compact signature.
    ///
    /// # Returns
    /// `(signature, recovery_id, compressed)`.
    pub fn from_compact(bytes: &[u8]) -> Result<(Self, u8, bool), PrimitivesError> {
        if bytes.len() != COMPACT_LEN {
            return Err(PrimitivesError::InvalidSignature(format!(
                "compact signature must be {} bytes, got {}",
                COMPACT_LEN,
                bytes.len()
            )));
        }
        let header = bytes[0];
        if !(COMPACT_HEADER_BASE..COMPACT_HEADER_BASE + 8).contains(&header) {
            return Err(PrimitivesError::InvalidSignature(format!(
                "invalid compact header byte {}",
                header
            )));
        }
        let offset = header - COMPACT_HEADER_BASE;
        let compressed = offset >= COMPACT_COMPRESSED_FLAG;
        let recovery_id = offset % COMPACT_COMPRESSED_FLAG;
        let inner = ecdsa::Signature::from_slice(&bytes[1..])
            .map_err(|e| PrimitivesError::InvalidSignature(e.to_string()))?;
        Ok((Signature { inner }, recovery_id, compressed))
    }

    /// Recover the signer's public key from a digest and recovery id.
    pub fn recover_public_key(
        &self,
        hash: &[u8; 32],
        recovery_id: u8,
    ) -> Result<PublicKey, PrimitivesError> {
        let recovery_id = RecoveryId::from_byte(recovery_id)
            .ok_or_else(|| PrimitivesError::InvalidSignature("invalid recovery id".to_string()))?;
        let key = VerifyingKey::recover_from_prehash(hash, &self.inner, recovery_id)
            .map_err(|e| PrimitivesError::InvalidSignature(e.to_string()))?;
        Ok(PublicKey::from_k256_verifying_key(&key))
    }

    fn low_s(&self) -> ecdsa::Signature {
        self.inner.normalize_s().unwrap_or(self.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::{sha256, sha256d};

    fn hex_to_32(s: &str) -> [u8; 32] {
        hex::decode(s).unwrap().try_into().unwrap()
    }

    #[test]
    fn test_der_parsing() {
        let valid = hex::decode(
            "304402204e45e16932b8af514961a1d3a1a25fdf3f4f7732e9d624c6c61548ab5fb8cd41\
             0220181522ec8eca07de4860a4acdd12909d831cc56cbbac4622082221a8768d1d09",
        )
        .unwrap();
        let sig = Signature::from_der(&valid).unwrap();
        assert_eq!(sig.to_der(), valid);

        assert!(Signature::from_der(&[]).is_err());

        let mut bad_magic = valid.clone();
        bad_magic[0] = 0x31;
        assert!(Signature::from_der(&bad_magic).is_err());

        let mut bad_marker = valid.clone();
        bad_marker[2] = 0x03;
        assert!(Signature::from_der(&bad_marker).is_err());
    }

    #[test]
    fn test_der_low_s_normalization() {
        let sig = Signature::new(
            hex_to_32("a196ed0e7ebcbe7b63fe1d8eecbdbde03a67ceba4fc8f6482bdcb9606a911404"),
            hex_to_32("971729c7fa944b465b35250c6570a2f31acbb14b13d1565fab7330dcb2b3dfb1"),
        )
        .unwrap();
        let expected = hex::decode(
            "3045022100a196ed0e7ebcbe7b63fe1d8eecbdbde03a67ceba4fc8f6482bdcb9606a911404\
             022068e8d638056bb4b9a4cadaf39a8f5d0b9fe32b9b9b7749dc145f2db01d826190",
        )
        .unwrap();
        assert_eq!(sig.to_der(), expected);
    }

    #[test]
    fn test_zero_components_rejected() {
        assert!(Signature::new([0u8; 32], [1u8; 32]).is_err());
        assert!(Signature::new([1u8; 32], [0u8; 32]).is_err());
    }

    /// RFC6979 deterministic signing against known secp256k1 vectors.
    #[test]
    fn test_rfc6979() {
        let tests = [
            (
                "cca9fbcc1b41e5a95d369eaa6ddcff73b61a4efaa279cfc6567e8daa39cbaf50",
                "sample",
                "3045022100af340daf02cc15c8d5d08d7735dfe6b98a474ed373bdb5fbecf7571be52b384202205009fb27f37034a9b24b707b7c6b79ca23ddef9e25f7282e8a797efe53a8f124",
            ),
            (
                "0000000000000000000000000000000000000000000000000000000000000001",
                "Satoshi Nakamoto",
                "3045022100934b1ea10a4b3c1757e2b0c017d0b6143ce3c9a7e6a4a49860d7a6ab210ee3d802202442ce9d2b916064108014783e923ec36b49743e2ffa1c4496f01a512aafd9e5",
            ),
            (
                "f8b8af8ce3c7cca5e300d33939540c10d45ce001b8f252bfbc57ba0342904181",
                "Alan Turing",
                "304402207063ae83e7f62bbb171798131b4a0564b956930092b33b07b395615d9ec7e15c022058dfcc1e00a35e1572f366ffe34ba0fc47db1e7189759b9fb233c5b05ab388ea",
            ),
        ];

        for (key_hex, msg, expected_sig_hex) in &tests {
            let priv_key = PrivateKey::from_hex(key_hex).unwrap();
            let hash = sha256(msg.as_bytes());
            let sig = priv_key.sign(&hash).unwrap();
            assert_eq!(hex::encode(sig.to_der()), *expected_sig_hex, "message '{}'", msg);
            assert!(priv_key.pub_key().verify(&hash, &sig));
        }
    }

    #[test]
    fn test_verify_rejects_other_digest() {
        let key = PrivateKey::new();
        let sig = key.sign(&sha256d(b"one")).unwrap();
        assert!(!key.pub_key().verify(&sha256d(b"two"), &sig));
    }

    #[test]
    fn test_compact_recovery() {
        for _ in 0..10 {
            let priv_key = PrivateKey::new();
            let hash = sha256d(b"test data for compact signature");

            let (sig, recovery_id) = priv_key.sign_recoverable(&hash).unwrap();
            let compact = sig.to_compact(recovery_id, true);
            assert_eq!(compact[0], 31 + recovery_id);

            let (parsed, parsed_id, compressed) = Signature::from_compact(&compact).unwrap();
            assert!(compressed);
            assert_eq!(parsed, sig);
            let recovered = parsed.recover_public_key(&hash, parsed_id).unwrap();
            assert_eq!(recovered, priv_key.pub_key());
        }
    }

    #[test]
    fn test_from_compact_rejects_bad_input() {
        assert!(Signature::from_compact(&[0u8; 64]).is_err());
        let mut bad_header = [1u8; 65];
        bad_header[0] = 26;
        assert!(Signature::from_compact(&bad_header).is_err());
    }
}
