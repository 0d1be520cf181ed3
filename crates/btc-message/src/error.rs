/// Error types for signed-message operations.
#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    /// The signature is not valid base64.
    #[error("invalid base64 signature: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Key handling or compact-signature decoding failed.
    #[error("{0}")]
    Primitives(#[from] btc_primitives::PrimitivesError),
}
