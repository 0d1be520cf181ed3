//! secp256k1 private key with Bitcoin-specific functionality.
//!
//! Wraps the k256 signing key and adds WIF import/export against a
//! `Network`'s WIF prefix and RFC6979 deterministic signing.

use k256::ecdsa::SigningKey;
use rand::rngs::OsRng;

use crate::base58;
use crate::ec::public_key::PublicKey;
use crate::ec::signature::Signature;
use crate::network::Network;
use crate::PrimitivesError;

/// Length of a serialized private key in bytes.
const PRIVATE_KEY_BYTES_LEN: usize = 32;

/// Compression flag byte appended to WIF for compressed public keys.
const COMPRESS_MAGIC: u8 = 0x01;

/// A secp256k1 private key used to sign transaction digests.
#[derive(Clone, Debug)]
pub struct PrivateKey {
    inner: SigningKey,
}

impl PrivateKey {
    /// Generate a new random private key using the OS random number generator.
    pub fn new() -> Self {
        PrivateKey {
            inner: SigningKey::random(&mut OsRng),
        }
    }

    /// Create a private key from a raw 32-byte scalar.
    ///
    /// # Returns
    /// `Ok(PrivateKey)` if the bytes are a valid non-zero scalar below the
    /// curve order, or an error otherwise.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PrimitivesError> {
        if bytes.len() != PRIVATE_KEY_BYTES_LEN {
            return Err(PrimitivesError::InvalidPrivateKey(format!(
                "expected {} bytes, got {}",
                PRIVATE_KEY_BYTES_LEN,
                bytes.len()
            )));
        }
        let inner = SigningKey::from_slice(bytes)
            .map_err(|e| PrimitivesError::InvalidPrivateKey(e.to_string()))?;
        Ok(PrivateKey { inner })
    }

    /// Create a private key from a 64-character hex string.
    pub fn from_hex(hex_str: &str) -> Result<Self, PrimitivesError> {
        if hex_str.is_empty() {
            return Err(PrimitivesError::InvalidPrivateKey(
                "private key hex is empty".to_string(),
            ));
        }
        Self::from_bytes(&hex::decode(hex_str)?)
    }

    /// Decode a WIF (Wallet Import Format) string for the given network.
    ///
    /// Accepts the compressed form (key followed by 0x01) and the
    /// uncompressed form (bare key) after the version byte.
    ///
    /// # Arguments
    /// * `wif` - A Base58Check-encoded WIF string.
    /// * `network` - Network whose WIF prefix the key must carry.
    ///
    /// # Returns
    /// `Ok(PrivateKey)` on success; `ChecksumMismatch`, `InvalidWif` or
    /// `WifNetworkMismatch` otherwise.
    pub fn from_wif(wif: &str, network: &Network) -> Result<Self, PrimitivesError> {
        let (prefix, payload) = base58::check_decode_versioned(wif)?;
        match payload.len() {
            33 if payload[32] == COMPRESS_MAGIC => {}
            33 => {
                return Err(PrimitivesError::InvalidWif(
                    "invalid compression flag".to_string(),
                ))
            }
            PRIVATE_KEY_BYTES_LEN => {}
            n => {
                return Err(PrimitivesError::InvalidWif(format!(
                    "invalid key length {}",
                    n
                )))
            }
        }
        if prefix != network.wif_prefix {
            return Err(PrimitivesError::WifNetworkMismatch {
                network: network.name.clone(),
                got: prefix,
            });
        }
        Self::from_bytes(&payload[..PRIVATE_KEY_BYTES_LEN])
    }

    /// Encode the private key as a compressed WIF string for the given network.
    pub fn to_wif(&self, network: &Network) -> String {
        let mut payload = self.to_bytes().to_vec();
        payload.push(COMPRESS_MAGIC);
        base58::check_encode_versioned(network.wif_prefix, &payload)
    }

    /// Serialize the private key as a 32-byte big-endian array.
    pub fn to_bytes(&self) -> [u8; 32] {
        self.inner.to_bytes().into()
    }

    /// Serialize the private key as a lowercase hexadecimal string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Derive the corresponding public key.
    pub fn pub_key(&self) -> PublicKey {
        PublicKey::from_k256_verifying_key(self.inner.verifying_key())
    }

    /// Sign a 32-byte digest using deterministic RFC6979 nonces.
    ///
    /// The result is low-S normalized per BIP-0062.
    pub fn sign(&self, hash: &[u8; 32]) -> Result<Signature, PrimitivesError> {
        Signature::sign(hash, self)
    }

    /// Sign a 32-byte digest and return the signature with its recovery id.
    pub fn sign_recoverable(&self, hash: &[u8; 32]) -> Result<(Signature, u8), PrimitivesError> {
        Signature::sign_recoverable(hash, self)
    }

    pub(crate) fn signing_key(&self) -> &SigningKey {
        &self.inner
    }
}

impl Default for PrivateKey {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for PrivateKey {
    fn eq(&self, other: &Self) -> bool {
        self.to_bytes() == other.to_bytes()
    }
}

impl Eq for PrivateKey {}
