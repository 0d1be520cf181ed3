//! Network parameters.
//!
//! A `Network` carries every chain-specific constant the SDK needs: the
//! Base58 version bytes for P2PKH/P2SH addresses and WIF keys, the Bech32
//! human-readable part and witness version, and the signed-message prefix.
//! Mainnet and testnet3 are built in; other chains can be loaded from JSON.

use serde::{Deserialize, Serialize};

use crate::PrimitivesError;

/// Prefix hashed in front of messages signed with a wallet key.
pub const SIGNED_MESSAGE_PREFIX: &str = "Bitcoin Signed Message:\n";

/// Chain-specific parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Network {
    /// Human-readable network name, used in error messages.
    pub name: String,
    /// Version byte of P2PKH addresses.
    pub p2pkh_prefix: u8,
    /// Version byte of P2SH addresses.
    pub p2sh_prefix: u8,
    /// Version byte of WIF-encoded private keys.
    pub wif_prefix: u8,
    /// Human-readable part of Bech32 addresses.
    pub bech32_hrp: String,
    /// Witness version used for Bech32 addresses.
    #[serde(default)]
    pub bech32_witness_version: u8,
    /// Prefix used by the signed-message digest.
    #[serde(default = "default_signed_message_prefix")]
    pub signed_message_prefix: String,
}

fn default_signed_message_prefix() -> String {
    SIGNED_MESSAGE_PREFIX.to_string()
}

impl Network {
    /// Bitcoin mainnet.
    pub fn mainnet() -> Self {
        Network {
            name: "Bitcoin Mainnet".to_string(),
            p2pkh_prefix: 0x00,
            p2sh_prefix: 0x05,
            wif_prefix: 0x80,
            bech32_hrp: "bc".to_string(),
            bech32_witness_version: 0,
            signed_message_prefix: default_signed_message_prefix(),
        }
    }

    /// Bitcoin testnet3.
    pub fn testnet() -> Self {
        Network {
            name: "Bitcoin Testnet3".to_string(),
            p2pkh_prefix: 0x6f,
            p2sh_prefix: 0xc4,
            wif_prefix: 0xef,
            bech32_hrp: "tb".to_string(),
            bech32_witness_version: 0,
            signed_message_prefix: default_signed_message_prefix(),
        }
    }

    /// Load network parameters from a JSON document.
    ///
    /// `bech32_witness_version` and `signed_message_prefix` may be omitted
    /// and default to 0 and the Bitcoin prefix.
    ///
    /// # Returns
    /// The parsed `Network`, or `InvalidNetwork` if the document is malformed
    /// or two address kinds share a version byte.
    pub fn from_json(json: &str) -> Result<Self, PrimitivesError> {
        let network: Network = serde_json::from_str(json)?;
        if network.p2pkh_prefix == network.p2sh_prefix {
            return Err(PrimitivesError::InvalidNetwork(format!(
                "{}: P2PKH and P2SH prefixes must differ",
                network.name
            )));
        }
        if network.bech32_witness_version > 16 {
            return Err(PrimitivesError::InvalidNetwork(format!(
                "{}: witness version {} out of range",
                network.name, network.bech32_witness_version
            )));
        }
        Ok(network)
    }
}

impl Default for Network {
    fn default() -> Self {
        Self::mainnet()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_networks() {
        let main = Network::mainnet();
        assert_eq!(main.p2pkh_prefix, 0x00);
        assert_eq!(main.p2sh_prefix, 0x05);
        assert_eq!(main.wif_prefix, 0x80);
        assert_eq!(main.bech32_hrp, "bc");

        let test = Network::testnet();
        assert_eq!(test.p2pkh_prefix, 0x6f);
        assert_eq!(test.p2sh_prefix, 0xc4);
        assert_eq!(test.wif_prefix, 0xef);
        assert_eq!(test.bech32_hrp, "tb");
        assert_ne!(main, test);
    }

    #[test]
    fn test_from_json_defaults() {
        let json = r#"{
            "name": "Regtest",
            "p2pkh_prefix": 111,
            "p2sh_prefix": 196,
            "wif_prefix": 239,
            "bech32_hrp": "bcrt"
        }"#;
        let network = Network::from_json(json).unwrap();
        assert_eq!(network.bech32_hrp, "bcrt");
        assert_eq!(network.bech32_witness_version, 0);
        assert_eq!(network.signed_message_prefix, SIGNED_MESSAGE_PREFIX);
    }

    #[test]
    fn test_from_json_roundtrip() {
        let json = serde_json::to_string(&Network::testnet()).unwrap();
        assert_eq!(Network::from_json(&json).unwrap(), Network::testnet());
    }

    #[test]
    fn test_from_json_rejects_bad_config() {
        assert!(Network::from_json("{}").is_err());
        let clash = r#"{"name":"x","p2pkh_prefix":5,"p2sh_prefix":5,"wif_prefix":128,"bech32_hrp":"x"}"#;
        assert!(matches!(
            Network::from_json(clash),
            Err(PrimitivesError::InvalidNetwork(_))
        ));
    }
}
