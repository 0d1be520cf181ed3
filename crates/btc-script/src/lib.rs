/// Bitcoin Script assembly, decoding, payment addresses and multisig.
///
/// Provides the opcode table, script chunk parsing, the immutable `Script`
/// type with its `OpCodeBuilder`, the `Address` enum over P2PKH, P2SH,
/// P2SH-P2WPKH and Bech32 P2WPKH, and m-of-n multisig redeem scripts.

pub mod opcodes;
pub mod chunk;
pub mod script;
pub mod address;
pub mod multisig;

mod error;
pub use error::{AddressError, MultiSigError, ScriptError};
pub use script::{OpCodeBuilder, RedeemScriptType, Script};
pub use address::{Address, AddressKind, PaymentAddress};
pub use chunk::ScriptChunk;
pub use multisig::MultiSig;
