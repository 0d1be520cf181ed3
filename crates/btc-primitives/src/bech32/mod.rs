//! Bech32 (BIP173) segwit address codec.
//!
//! Thin wrapper over the `bech32` crate's segwit module that speaks in plain
//! `u8` witness versions and `&str` human-readable parts, and checks the
//! decoded HRP against the one a network expects.

use ::bech32::{segwit, Fe32, Hrp};

use crate::PrimitivesError;

/// Separator between the human-readable part and the data part.
pub const SEPARATOR: char = '1';

/// Encode a witness program as a Bech32 segwit address.
///
/// # Arguments
/// * `hrp` - Human-readable part (`"bc"`, `"tb"`, ...).
/// * `witness_version` - Witness version, 0..=16.
/// * `program` - Witness program bytes (20 bytes for P2WPKH, 32 for P2WSH).
///
/// # Returns
/// The lowercase address string.
pub fn encode(hrp: &str, witness_version: u8, program: &[u8]) -> Result<String, PrimitivesError> {
    let hrp = Hrp::parse(hrp).map_err(|e| PrimitivesError::InvalidBech32(e.to_string()))?;
    let version = Fe32::try_from(witness_version)
        .map_err(|e| PrimitivesError::InvalidBech32(e.to_string()))?;
    segwit::encode(hrp, version, program).map_err(|e| PrimitivesError::InvalidBech32(e.to_string()))
}

/// Decode a Bech32 segwit address and verify its checksum and HRP.
///
/// # Arguments
/// * `expected_hrp` - The HRP the address must carry.
/// * `address` - The address string (all lowercase or all uppercase).
///
/// # Returns
/// `(witness_version, program)` on success.
pub fn decode(expected_hrp: &str, address: &str) -> Result<(u8, Vec<u8>), PrimitivesError> {
    let (hrp, version, program) =
        segwit::decode(address).map_err(|e| PrimitivesError::InvalidBech32(e.to_string()))?;
    if hrp.to_lowercase() != expected_hrp.to_lowercase() {
        return Err(PrimitivesError::InvalidBech32(format!(
            "human-readable part \"{}\" does not match \"{}\"",
            hrp.to_lowercase(),
            expected_hrp
        )));
    }
    Ok((version.to_u8(), program))
}

#[cfg(test)]
mod tests {
    use super::*;

    const P2WPKH_PROGRAM: &str = "751e76e8199196d454941c45d1b3a323f1433bd6";

    #[test]
    fn test_encode_p2wpkh_mainnet() {
        let program = hex::decode(P2WPKH_PROGRAM).unwrap();
        assert_eq!(
            encode("bc", 0, &program).unwrap(),
            "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4"
        );
    }

    #[test]
    fn test_encode_p2wpkh_testnet() {
        let program = hex::decode(P2WPKH_PROGRAM).unwrap();
        assert_eq!(
            encode("tb", 0, &program).unwrap(),
            "tb1qw508d6qejxtdg4y5r3zarvary0c5xw7kxpjzsx"
        );
    }

    #[test]
    fn test_decode_uppercase() {
        let (version, program) = decode("bc", "BC1QW508D6QEJXTDG4Y5R3ZARVARY0C5XW7KV8F3T4").unwrap();
        assert_eq!(version, 0);
        assert_eq!(hex::encode(program), P2WPKH_PROGRAM);
    }

    #[test]
    fn test_decode_wrong_hrp() {
        assert!(decode("tb", "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4").is_err());
    }

    #[test]
    fn test_decode_bad_checksum() {
        assert!(decode("bc", "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t5").is_err());
    }

    #[test]
    fn test_encode_bad_version() {
        assert!(encode("bc", 17, &[0u8; 20]).is_err());
    }
}
