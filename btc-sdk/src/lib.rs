#![deny(missing_docs)]

//! Bitcoin SDK.
//!
//! Re-exports the SDK components for single-crate usage and adds the
//! [`Bitcoin`] facade, which binds them to one network.

pub use btc_message as message;
pub use btc_primitives as primitives;
pub use btc_script as script;
pub use btc_transaction as transaction;

mod node;
pub use node::Bitcoin;
