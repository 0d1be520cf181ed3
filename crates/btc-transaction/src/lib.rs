/// Bitcoin transactions: building, decoding, signing and serialization.
///
/// Provides the `Transaction` model with its inputs and outputs, the raw
/// transaction decoder, legacy and BIP143 signature preimages, per-input
/// signing methods and the immutable `SerializedTransaction` result.

pub mod transaction;
pub mod input;
pub mod output;
pub mod sighash;
pub mod decoder;
pub mod serialized;
pub mod dump;

mod error;
pub use error::{TransactionDecodeError, TransactionError};
pub use transaction::Transaction;
pub use input::{SigningMethod, TxInput};
pub use output::TxOutput;
pub use serialized::{SerializedTransaction, TxSize};
