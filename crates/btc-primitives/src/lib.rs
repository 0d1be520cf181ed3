/// Bitcoin primitives: hashing, binary encoding, keys and network parameters.
///
/// This crate provides the foundational building blocks for the SDK:
/// - Hash functions (SHA-256, SHA-256d, RIPEMD-160, Hash160)
/// - Chain hash type for transaction identification
/// - Variable-length integers and little-endian readers/writers
/// - Base58Check and Bech32 codecs
/// - secp256k1 keys, WIF and ECDSA signatures
/// - Typed network parameters (mainnet, testnet3, custom)

pub mod hash;
pub mod chainhash;
pub mod util;
pub mod base58;
pub mod bech32;
pub mod ec;
pub mod network;

mod error;
pub use error::PrimitivesError;
pub use network::Network;
