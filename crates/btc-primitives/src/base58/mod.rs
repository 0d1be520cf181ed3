//! Base58 and Base58Check encoding.
//!
//! Base58Check appends the first four bytes of SHA-256d(payload) before
//! encoding; it is the string form of legacy addresses and WIF keys.

use crate::PrimitivesError;
use crate::hash::sha256d;

/// Length of the Base58Check checksum suffix.
pub const CHECKSUM_LEN: usize = 4;

fn checksum(data: &[u8]) -> [u8; CHECKSUM_LEN] {
    let digest = sha256d(data);
    [digest[0], digest[1], digest[2], digest[3]]
}

/// Base58 with the Bitcoin alphabet; each leading zero byte becomes '1'.
pub fn encode(data: &[u8]) -> String {
    bs58::encode(data).with_alphabet(bs58::Alphabet::BITCOIN).into_string()
}

pub fn decode(s: &str) -> Result<Vec<u8>, PrimitivesError> {
    bs58::decode(s)
        .with_alphabet(bs58::Alphabet::BITCOIN)
        .into_vec()
        .map_err(|e| PrimitivesError::InvalidBase58(e.to_string()))
}

/// Base58 of `data` followed by its checksum.
pub fn check_encode(data: &[u8]) -> String {
    let mut buf = data.to_vec();
    buf.extend_from_slice(&checksum(data));
    encode(&buf)
}

/// Decode and strip the checksum.
///
/// # Returns
/// The payload, `ChecksumMismatch` if the suffix does not match, or
/// `InvalidBase58` when the string is shorter than a checksum.
pub fn check_decode(s: &str) -> Result<Vec<u8>, PrimitivesError> {
    let mut decoded = decode(s)?;
    let Some(split) = decoded.len().checked_sub(CHECKSUM_LEN) else {
        return Err(PrimitivesError::InvalidBase58(format!(
            "{} bytes is too short for a checksum",
            decoded.len()
        )));
    };
    let suffix = decoded.split_off(split);
    if suffix != checksum(&decoded) {
        return Err(PrimitivesError::ChecksumMismatch);
    }
    Ok(decoded)
}

/// Base58Check of a version byte followed by `payload`, the layout of
/// legacy addresses and WIF keys.
pub fn check_encode_versioned(version: u8, payload: &[u8]) -> String {
    let mut data = Vec::with_capacity(1 + payload.len());
    data.push(version);
    data.extend_from_slice(payload);
    check_encode(&data)
}

/// Inverse of [`check_encode_versioned`].
///
/// # Returns
/// `(version, payload)`; an empty decoded payload is `InvalidBase58`.
pub fn check_decode_versioned(s: &str) -> Result<(u8, Vec<u8>), PrimitivesError> {
    let mut data = check_decode(s)?;
    if data.is_empty() {
        return Err(PrimitivesError::InvalidBase58("missing version byte".to_string()));
    }
    let version = data.remove(0);
    Ok((version, data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base58_single_zero_byte() {
        assert_eq!(encode(&[0x00]), "1");
        assert_eq!(decode("1").unwrap(), vec![0x00]);
    }

    #[test]
    fn test_base58_decoded_address() {
        let input = hex::decode("00010966776006953D5567439E5E39F86A0D273BEED61967F6").unwrap();
        assert_eq!(encode(&input), "16UwLL9Risc3QfPqBUvKofHmBQ7wMtjvM");
        assert_eq!(decode("16UwLL9Risc3QfPqBUvKofHmBQ7wMtjvM").unwrap(), input);
    }

    #[test]
    fn test_base58_leading_zeros() {
        let input = hex::decode("000000287FB4CD").unwrap();
        assert_eq!(encode(&input), "111233QC4");
        assert_eq!(decode("111233QC4").unwrap(), input);
    }

    #[test]
    fn test_base58_decode_invalid_character() {
        assert!(decode("invalid!@#$%").is_err());
        assert!(decode("0OIl").is_err());
    }

    // -- Base58Check --

    #[test]
    fn test_check_decode_known_address() {
        let payload = check_decode("16UwLL9Risc3QfPqBUvKofHmBQ7wMtjvM").unwrap();
        assert_eq!(hex::encode(&payload), "00010966776006953d5567439e5e39f86a0d273bee");
        assert_eq!(check_encode(&payload), "16UwLL9Risc3QfPqBUvKofHmBQ7wMtjvM");
    }

    #[test]
    fn test_check_decode_bad_checksum() {
        let mut encoded = check_encode(&[0x80, 0x01, 0x02, 0x03]).into_bytes();
        let last = encoded.len() - 1;
        encoded[last] = if encoded[last] == b'z' { b'y' } else { b'z' };
        let encoded = String::from_utf8(encoded).unwrap();
        assert!(matches!(check_decode(&encoded), Err(PrimitivesError::ChecksumMismatch)));
    }

    #[test]
    fn test_check_decode_too_short() {
        assert!(matches!(check_decode("1"), Err(PrimitivesError::InvalidBase58(_))));
    }

    #[test]
    fn test_versioned() {
        let (version, payload) = check_decode_versioned("16UwLL9Risc3QfPqBUvKofHmBQ7wMtjvM").unwrap();
        assert_eq!(version, 0x00);
        assert_eq!(hex::encode(&payload), "010966776006953d5567439e5e39f86a0d273bee");
        assert_eq!(
            check_encode_versioned(version, &payload),
            "16UwLL9Risc3QfPqBUvKofHmBQ7wMtjvM"
        );
        assert!(check_decode_versioned(&check_encode(&[])).is_err());
    }
}
