/// Unified error type for all primitives operations.
///
/// Covers errors from hashing, key handling, signatures, the Base58/Bech32
/// codecs, the binary reader and network configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum PrimitivesError {
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    #[error("invalid WIF format: {0}")]
    InvalidWif(String),

    #[error("WIF prefix 0x{got:02x} does not belong to {network}")]
    WifNetworkMismatch { network: String, got: u8 },

    #[error("checksum mismatch")]
    ChecksumMismatch,

    #[error("invalid hex: {0}")]
    InvalidHex(String),

    #[error("invalid hash: {0}")]
    InvalidHash(String),

    #[error("invalid base58: {0}")]
    InvalidBase58(String),

    #[error("invalid bech32: {0}")]
    InvalidBech32(String),

    #[error("invalid network configuration: {0}")]
    InvalidNetwork(String),

    #[error("unexpected end of data")]
    UnexpectedEof,
}

impl From<hex::FromHexError> for PrimitivesError {
    fn from(e: hex::FromHexError) -> Self {
        PrimitivesError::InvalidHex(e.to_string())
    }
}

impl From<serde_json::Error> for PrimitivesError {
    fn from(e: serde_json::Error) -> Self {
        PrimitivesError::InvalidNetwork(e.to_string())
    }
}
