//! Immutable serialization artifacts: signed transactions and preimages.

use btc_primitives::chainhash::{double_hash_h, Hash};
use serde::Serialize;

/// Serialized size and weight of a transaction.
///
/// `size` counts 10 bytes of version, lock time and counts, each input's
/// fixed fields plus its scriptSig (or witness elements when SegWit), each
/// output's value and script, and the 2-byte SegWit marker. `weight` is
/// `size` for SegWit transactions and `size * 4` otherwise.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct TxSize {
    pub size: usize,
    pub weight: usize,
}

impl TxSize {
    pub(crate) fn new(size: usize, is_segwit: bool) -> Self {
        TxSize {
            size,
            weight: if is_segwit { size } else { size * 4 },
        }
    }
}

/// Bytes produced by signing a transaction or building a sighash preimage.
///
/// A signed transaction is the broadcastable form; a preimage is the
/// message whose double SHA-256 is signed for one input. Both carry
/// `hash`, the double SHA-256 of `bytes`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SerializedTransaction {
    bytes: Vec<u8>,
    hash: Hash,
    txid: Hash,
    is_signed: bool,
    size: Option<TxSize>,
}

impl SerializedTransaction {
    /// Wrap a sighash preimage.
    pub(crate) fn preimage(bytes: Vec<u8>) -> Self {
        let hash = double_hash_h(&bytes);
        SerializedTransaction {
            bytes,
            hash,
            txid: hash,
            is_signed: false,
            size: None,
        }
    }

    /// Wrap a signed transaction.
    ///
    /// `stripped` is the serialization without marker, flag and witnesses;
    /// it is `None` for non-SegWit transactions, whose txid is their hash.
    pub(crate) fn signed(bytes: Vec<u8>, stripped: Option<Vec<u8>>, size: TxSize) -> Self {
        let hash = double_hash_h(&bytes);
        let txid = stripped.map_or(hash, |b| double_hash_h(&b));
        SerializedTransaction {
            bytes,
            hash,
            txid,
            is_signed: true,
            size: Some(size),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }

    /// Double SHA-256 of the full serialization. For a SegWit transaction
    /// this is the wtxid.
    pub fn hash(&self) -> &Hash {
        &self.hash
    }

    /// Transaction id: double SHA-256 of the witness-stripped serialization.
    pub fn txid(&self) -> &Hash {
        &self.txid
    }

    /// The 32-byte message an ECDSA signer signs for a preimage.
    pub fn digest(&self) -> [u8; 32] {
        *self.hash.as_bytes()
    }

    /// False for a preimage, true for a broadcastable transaction.
    pub fn is_signed(&self) -> bool {
        self.is_signed
    }

    /// Size and weight of a signed transaction.
    pub fn size(&self) -> Option<TxSize> {
        self.size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weight_rules() {
        assert_eq!(TxSize::new(200, false), TxSize { size: 200, weight: 800 });
        assert_eq!(TxSize::new(200, true), TxSize { size: 200, weight: 200 });
    }

    #[test]
    fn test_preimage_digest_is_sha256d() {
        let pre = SerializedTransaction::preimage(b"hello".to_vec());
        assert!(!pre.is_signed());
        assert_eq!(
            hex::encode(pre.digest()),
            "9595c9df90075148eb06860365df33584b75bff782a510c6cd4883a419833d50"
        );
        assert_eq!(pre.txid(), pre.hash());
    }

    #[test]
    fn test_signed_txid_uses_stripped_bytes() {
        let full = vec![1u8, 0, 1, 2];
        let stripped = vec![1u8, 2];
        let tx = SerializedTransaction::signed(full.clone(), Some(stripped.clone()), TxSize::new(4, true));
        assert!(tx.is_signed());
        assert_eq!(*tx.hash(), double_hash_h(&full));
        assert_eq!(*tx.txid(), double_hash_h(&stripped));
        assert_eq!(tx.to_hex(), "01000102");
    }
}
