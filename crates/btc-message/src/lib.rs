#![deny(missing_docs)]

//! Bitcoin signed messages.
//!
//! Signs arbitrary text with a wallet key the way Bitcoin wallets do, as a
//! base64 compact recoverable signature over the network's message digest.

mod error;
pub mod signed;

pub use error::MessageError;
pub use signed::{message_hash, recover_public_key, sign_message, verify_message};
