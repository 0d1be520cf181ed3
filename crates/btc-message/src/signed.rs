//! Wallet-style message signing and verification.
//!
//! The digest is the double SHA-256 of the network's signed-message prefix
//! and the message, each preceded by its VarInt length. The signature is the
//! 65-byte compact form (header, R, S), base64 encoded.

use base64::Engine;

use btc_primitives::ec::{PrivateKey, PublicKey, Signature};
use btc_primitives::hash::sha256d;
use btc_primitives::util::BtcWriter;
use btc_primitives::Network;

use crate::MessageError;

/// Digest signed for `message` on `network`.
pub fn message_hash(network: &Network, message: &[u8]) -> [u8; 32] {
    let prefix = network.signed_message_prefix.as_bytes();
    let mut writer = BtcWriter::with_capacity(prefix.len() + message.len() + 10);
    writer.write_var_bytes(prefix);
    writer.write_var_bytes(message);
    sha256d(writer.as_bytes())
}

/// Sign `message` with `key`.
///
/// # Returns
/// The base64 compact signature; its header marks the key as compressed.
pub fn sign_message(
    network: &Network,
    message: &[u8],
    key: &PrivateKey,
) -> Result<String, MessageError> {
    let digest = message_hash(network, message);
    let (signature, recovery_id) = key.sign_recoverable(&digest)?;
    let compact = signature.to_compact(recovery_id, true);
    Ok(base64::engine::general_purpose::STANDARD.encode(compact))
}

/// Recover the public key that produced `signature` over `message`.
pub fn recover_public_key(
    network: &Network,
    message: &[u8],
    signature: &str,
) -> Result<PublicKey, MessageError> {
    let compact = base64::engine::general_purpose::STANDARD.decode(signature.trim())?;
    let (signature, recovery_id, _compressed) = Signature::from_compact(&compact)?;
    let digest = message_hash(network, message);
    Ok(signature.recover_public_key(&digest, recovery_id)?)
}

/// Check that `signature` over `message` was made by `public_key`.
///
/// A well-formed signature that recovers to another key, or to no key at
/// all, verifies as `false`. Malformed base64 or compact bytes are errors.
pub fn verify_message(
    network: &Network,
    message: &[u8],
    signature: &str,
    public_key: &PublicKey,
) -> Result<bool, MessageError> {
    let compact = base64::engine::general_purpose::STANDARD.decode(signature.trim())?;
    let (signature, recovery_id, _compressed) = Signature::from_compact(&compact)?;
    let digest = message_hash(network, message);
    match signature.recover_public_key(&digest, recovery_id) {
        Ok(recovered) => Ok(&recovered == public_key),
        Err(_) => Ok(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn priv_key_from_short(b: &[u8]) -> PrivateKey {
        let mut padded = [0u8; 32];
        padded[32 - b.len()..].copy_from_slice(b);
        PrivateKey::from_bytes(&padded).unwrap()
    }

    // Signed by an external wallet implementation.
    const KNOWN_MESSAGE: &str = "rust-bitcoin MessageSignature test";
    const KNOWN_SIGNATURE: &str =
        "IAM2qX24tYx/bdBTIgVLhD8QEAjrPlJpmjB4nZHdRYGIBa4DmVulAcwjPnWe6Q5iEwXH6F0pUCJP/ZeHPWS1h1o=";
    const KNOWN_PUBKEY: &str = "0351537cc127b4fa40b72dea904a34ab60dcd45132708d746b78e6c04172f90afa";

    // -----------------------------------------------------------------------
    // Digest
    // -----------------------------------------------------------------------

    #[test]
    fn test_message_hash() {
        let digest = message_hash(&Network::mainnet(), b"test");
        assert_eq!(
            hex::encode(digest),
            "9ce428d58e8e4caf619dc6fc7b2c2c28f0561654d1f80f322c038ad5e67ff8a6"
        );
        let digest = message_hash(&Network::mainnet(), b"hello world");
        assert_eq!(
            hex::encode(digest),
            "0b6b6ce07bc55ee4aeba0098a5e5d2c8986cab228a54199723f9962316633733"
        );
    }

    #[test]
    fn test_message_hash_uses_network_prefix() {
        let mut custom = Network::mainnet();
        custom.signed_message_prefix = "Other Signed Message:\n".to_string();
        assert_ne!(
            message_hash(&custom, b"test"),
            message_hash(&Network::mainnet(), b"test")
        );
    }

    // -----------------------------------------------------------------------
    // Sign and verify
    // -----------------------------------------------------------------------

    #[test]
    fn test_sign_and_verify() {
        let net = Network::mainnet();
        let key = priv_key_from_short(&[15]);
        let signature = sign_message(&net, b"hello world", &key).unwrap();

        let compact = base64::engine::general_purpose::STANDARD.decode(&signature).unwrap();
        assert_eq!(compact.len(), 65);
        assert!((31..35).contains(&compact[0]), "header: {}", compact[0]);

        assert!(verify_message(&net, b"hello world", &signature, &key.pub_key()).unwrap());
        assert_eq!(recover_public_key(&net, b"hello world", &signature).unwrap(), key.pub_key());
    }

    #[test]
    fn test_signing_is_deterministic() {
        let net = Network::mainnet();
        let key = priv_key_from_short(&[21]);
        assert_eq!(
            sign_message(&net, b"abc", &key).unwrap(),
            sign_message(&net, b"abc", &key).unwrap()
        );
    }

    #[test]
    fn test_verify_wrong_key() {
        let net = Network::mainnet();
        let key = priv_key_from_short(&[15]);
        let other = priv_key_from_short(&[16]);
        let signature = sign_message(&net, b"hello world", &key).unwrap();
        assert!(!verify_message(&net, b"hello world", &signature, &other.pub_key()).unwrap());
    }

    #[test]
    fn test_tampered_message() {
        let net = Network::mainnet();
        let key = priv_key_from_short(&[15]);
        let signature = sign_message(&net, b"hello world", &key).unwrap();
        assert!(!verify_message(&net, b"hello worle", &signature, &key.pub_key()).unwrap());
    }

    #[test]
    fn test_known_signature() {
        let net = Network::mainnet();
        let pubkey = PublicKey::from_hex(KNOWN_PUBKEY).unwrap();
        assert!(verify_message(&net, KNOWN_MESSAGE.as_bytes(), KNOWN_SIGNATURE, &pubkey).unwrap());
        assert!(!verify_message(
            &net,
            b"a different message from what was signed",
            KNOWN_SIGNATURE,
            &pubkey
        )
        .unwrap());
    }

    #[test]
    fn test_malformed_signature() {
        let net = Network::mainnet();
        let pubkey = PublicKey::from_hex(KNOWN_PUBKEY).unwrap();
        let err = verify_message(&net, b"x", "not base64!", &pubkey).unwrap_err();
        assert!(matches!(err, MessageError::Base64(_)));

        let short = base64::engine::general_purpose::STANDARD.encode([31u8; 64]);
        let err = verify_message(&net, b"x", &short, &pubkey).unwrap_err();
        assert!(matches!(err, MessageError::Primitives(_)));
    }
}
