//! Network-bound entry point.

use std::sync::Arc;

use btc_primitives::ec::{PrivateKey, PublicKey};
use btc_primitives::Network;
use btc_script::{Address, AddressError, MultiSig, MultiSigError};
use btc_transaction::{Transaction, TransactionDecodeError};
use tracing::debug;

/// A network and the objects bound to it.
///
/// Every transaction, address and multisig created here shares the same
/// `Network` parameters.
#[derive(Clone, Debug)]
pub struct Bitcoin {
    network: Arc<Network>,
}

impl Bitcoin {
    /// Bind to `network`.
    pub fn new(network: Network) -> Self {
        debug!(network = %network.name, "bitcoin node created");
        Bitcoin {
            network: Arc::new(network),
        }
    }

    /// Bitcoin mainnet.
    pub fn mainnet() -> Self {
        Self::new(Network::mainnet())
    }

    /// Bitcoin testnet3.
    pub fn testnet() -> Self {
        Self::new(Network::testnet())
    }

    /// The network parameters.
    pub fn network(&self) -> &Network {
        &self.network
    }

    /// An empty version 1 transaction.
    pub fn new_transaction(&self) -> Transaction {
        Transaction::new(Arc::clone(&self.network))
    }

    /// Decode a consensus-serialized transaction.
    pub fn decode_transaction(&self, bytes: &[u8]) -> Result<Transaction, TransactionDecodeError> {
        Transaction::decode(bytes, Arc::clone(&self.network))
    }

    /// Parse a P2PKH, P2SH or Bech32 address string.
    pub fn address(&self, address: &str) -> Result<Address, AddressError> {
        Address::from_string(address, &self.network)
    }

    /// P2PKH address of `public_key`.
    pub fn address_from_public_key(&self, public_key: &PublicKey) -> Address {
        Address::from_public_key(public_key, &self.network)
    }

    /// An m-of-n multisig over `public_keys`.
    pub fn multisig(&self, required: usize, public_keys: &[PublicKey]) -> Result<MultiSig, MultiSigError> {
        MultiSig::new(required, public_keys)
    }

    /// Sign `message` with the network's signed-message prefix.
    pub fn sign_message(&self, message: &[u8], key: &PrivateKey) -> Result<String, btc_message::MessageError> {
        btc_message::sign_message(&self.network, message, key)
    }

    /// Verify a signature made by [`Bitcoin::sign_message`].
    pub fn verify_message(
        &self,
        message: &[u8],
        signature: &str,
        public_key: &PublicKey,
    ) -> Result<bool, btc_message::MessageError> {
        btc_message::verify_message(&self.network, message, signature, public_key)
    }
}

impl Default for Bitcoin {
    fn default() -> Self {
        Self::mainnet()
    }
}
