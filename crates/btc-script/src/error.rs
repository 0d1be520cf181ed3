use btc_primitives::PrimitivesError;

/// Error types for script operations.
///
/// Parse errors come from the textual token form; decode errors come from
/// raw script bytes. The two are kept apart so callers can tell malformed
/// grammar from malformed consensus data.
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    /// Malformed textual script, with the 0-based token index.
    #[error("script parse error at token {index}: {reason}")]
    Parse { index: usize, reason: String },

    /// A byte that is neither a push length nor a known opcode.
    #[error("script decode error: unknown opcode 0x{op:02x} at byte {offset}")]
    UnknownOpcode { op: u8, offset: usize },

    /// A push whose declared length runs past the end of the script.
    #[error("script decode error: push at byte {offset} needs {needed} bytes, {available} available")]
    TruncatedPush {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// Push data length outside 1..=0xFFFFFFFF.
    #[error("invalid push data length: {0}")]
    PushDataLength(usize),

    /// Attempted to append a push-range byte as a bare opcode.
    #[error("use push_data for push opcodes: 0x{0:02x}")]
    InvalidOpcodeType(u8),

    /// Opcode byte outside the known table.
    #[error("invalid opcode: 0x{0:02x}")]
    InvalidOpcode(u8),

    /// Hex decoding error.
    #[error("hex decode error: {0}")]
    HexDecode(#[from] hex::FromHexError),

    /// Error from primitives crate.
    #[error("primitives error: {0}")]
    Primitives(#[from] PrimitivesError),
}

impl ScriptError {
    /// True for errors raised while decoding raw script bytes.
    pub fn is_decode_error(&self) -> bool {
        matches!(
            self,
            ScriptError::UnknownOpcode { .. } | ScriptError::TruncatedPush { .. }
        )
    }
}

/// Errors building or decoding a payment address.
#[derive(Debug, thiserror::Error)]
pub enum AddressError {
    /// The version byte or HRP belongs to a different network or kind.
    #[error("{kind} address does not belong to {network}")]
    NetworkMismatch { kind: &'static str, network: String },

    /// The decoded hash is not 160 bits.
    #[error("invalid address hash length: expected 20 bytes, got {0}")]
    HashLength(usize),

    /// The scriptPubKey matches no known payment pattern.
    #[error("unrecognized scriptPubKey: {0}")]
    UnrecognizedScript(String),

    /// A segwit spend needs the public key, but none is attached.
    #[error("public key required for {0}")]
    MissingPublicKey(&'static str),

    /// Base58Check or Bech32 decoding failed.
    #[error("address encoding error: {0}")]
    Encoding(#[from] PrimitivesError),

    /// Building the address script failed.
    #[error("script error: {0}")]
    Script(#[from] ScriptError),
}

/// Errors constructing or signing with a multisig redeem script.
#[derive(Debug, thiserror::Error)]
pub enum MultiSigError {
    /// Threshold or key count outside 1 <= m <= n <= 14.
    #[error("invalid {required}-of-{total} multisig")]
    InvalidThreshold { required: usize, total: usize },

    /// A private key whose public key is not in the redeem script.
    #[error("private key does not belong to this multisig script")]
    UnknownKey,

    /// A private key attached out of the redeem script's public-key order.
    #[error("private key for public key #{position} attached out of order")]
    KeyOrder { position: usize },

    /// More private keys than required signatures.
    #[error("multisig already has {0} signing keys")]
    TooManyKeys(usize),

    /// Fewer private keys than required signatures at signing time.
    #[error("multisig needs {required} signatures, {attached} keys attached")]
    NotEnoughKeys { required: usize, attached: usize },

    #[error("primitives error: {0}")]
    Primitives(#[from] PrimitivesError),

    #[error("script error: {0}")]
    Script(#[from] ScriptError),

    #[error("address error: {0}")]
    Address(#[from] AddressError),
}
