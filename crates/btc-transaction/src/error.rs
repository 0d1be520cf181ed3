use btc_script::{AddressError, MultiSigError, ScriptError};

/// Errors raised while decoding raw transaction bytes.
///
/// Underflow errors carry the name of the decoder stage that ran out of
/// bytes, e.g. `"version bytes"`, `"input # 2"` or `"lock time"`.
#[derive(Debug, thiserror::Error)]
pub enum TransactionDecodeError {
    #[error("incomplete transaction data; ran out of bytes near \"{stage}\"")]
    Underflow { stage: String },

    #[error("invalid transaction version: {0}")]
    InvalidVersion(u32),

    /// Script bytes of input `index` (1-based) do not decode.
    #[error("failed to parse script of input # {index}: {source}")]
    InputScriptParse {
        index: usize,
        #[source]
        source: ScriptError,
    },

    /// Script bytes of output `index` (0-based) do not decode.
    #[error("failed to parse script of output # {index}: {source}")]
    OutputScriptParse {
        index: usize,
        #[source]
        source: ScriptError,
    },

    #[error("{0}")]
    WitnessParse(String),

    /// Bytes left over once the lock time has been read.
    #[error("transaction decoded with {0} excess bytes")]
    Overflow(usize),
}

impl TransactionDecodeError {
    /// Decoder stage named by an underflow error.
    pub fn stage(&self) -> Option<&str> {
        match self {
            TransactionDecodeError::Underflow { stage } => Some(stage),
            _ => None,
        }
    }
}

/// Error types for transaction building, hashing and signing.
#[derive(Debug, thiserror::Error)]
pub enum TransactionError {
    #[error("transaction decode error: {0}")]
    Decode(#[from] TransactionDecodeError),

    /// Signing failed for the input at 0-based `index`.
    #[error("input # {} (index: {index}): {reason}", .index + 1)]
    InputSign { index: usize, reason: String },

    /// Final encoding is missing data it needs, such as witness stacks.
    #[error("transaction encode error: {0}")]
    Encode(String),

    /// The transaction structure is invalid (e.g. no outputs).
    #[error("invalid transaction: {0}")]
    InvalidTransaction(String),

    #[error("script error: {0}")]
    Script(#[from] ScriptError),

    #[error("address error: {0}")]
    Address(#[from] AddressError),

    #[error("multisig error: {0}")]
    MultiSig(#[from] MultiSigError),

    #[error("primitives error: {0}")]
    Primitives(#[from] btc_primitives::PrimitivesError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TransactionError {
    pub(crate) fn input_sign(index: usize, reason: impl Into<String>) -> Self {
        TransactionError::InputSign {
            index,
            reason: reason.into(),
        }
    }
}
