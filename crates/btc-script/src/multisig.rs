//! m-of-n multisig redeem scripts.
//!
//! A `MultiSig` owns the redeem script `OP_m <pubkey>... OP_n
//! OP_CHECKMULTISIG`, derives its P2SH and P2SH-P2WSH addresses, and holds
//! the private keys that will sign for it. Keys must be attached in the
//! same order as their public keys appear in the script, since
//! `OP_CHECKMULTISIG` matches signatures against keys in a single pass.

use btc_primitives::ec::{PrivateKey, PublicKey};
use btc_primitives::hash::sha256;
use btc_primitives::Network;
use tracing::debug;

use crate::address::Address;
use crate::error::MultiSigError;
use crate::opcodes::*;
use crate::script::{OpCodeBuilder, Script};

/// Upper bound on both `m` and `n`.
pub const MAX_MULTISIG_KEYS: usize = 14;

/// SIGHASH_ALL, appended to every DER signature.
const SIGHASH_ALL: u8 = 0x01;

#[derive(Clone, Debug)]
pub struct MultiSig {
    required: usize,
    public_keys: Vec<PublicKey>,
    redeem_script: Script,
    signing_keys: Vec<(usize, PrivateKey)>,
}

impl MultiSig {
    /// Build an m-of-n redeem script over `public_keys`, in the given order.
    ///
    /// # Returns
    /// `InvalidThreshold` unless `1 <= required <= public_keys.len() <= 14`.
    pub fn new(required: usize, public_keys: &[PublicKey]) -> Result<Self, MultiSigError> {
        let total = public_keys.len();
        if required == 0 || required > total || total > MAX_MULTISIG_KEYS {
            return Err(MultiSigError::InvalidThreshold { required, total });
        }

        let mut builder = OpCodeBuilder::new().small_int(required as u8)?;
        for key in public_keys {
            builder = builder.push_data(&key.to_compressed())?;
        }
        let redeem_script = builder
            .small_int(total as u8)?
            .op(OP_CHECKMULTISIG)?
            .build();

        Ok(MultiSig {
            required,
            public_keys: public_keys.to_vec(),
            redeem_script,
            signing_keys: Vec::new(),
        })
    }

    pub fn required(&self) -> usize {
        self.required
    }

    pub fn total(&self) -> usize {
        self.public_keys.len()
    }

    pub fn public_keys(&self) -> &[PublicKey] {
        &self.public_keys
    }

    pub fn redeem_script(&self) -> &Script {
        &self.redeem_script
    }

    /// P2SH address of the redeem script.
    pub fn p2sh(&self, network: &Network) -> Address {
        Address::from_redeem_script(&self.redeem_script, network)
    }

    /// The version 0 witness program `OP_0 <sha256(redeem_script)>`.
    pub fn witness_program(&self) -> Result<Script, MultiSigError> {
        Ok(Script::witness_program(0, &sha256(self.redeem_script.as_bytes()))?)
    }

    /// P2SH-wrapped P2WSH address; its redeem script is `witness_program()`
    /// and the redeem script of this multisig becomes the witness script.
    pub fn p2sh_p2wsh(&self, network: &Network) -> Result<Address, MultiSigError> {
        Ok(Address::from_redeem_script(&self.witness_program()?, network))
    }

    /// Attach a signing key.
    ///
    /// # Returns
    /// `UnknownKey` if the key is not in the script, `KeyOrder` if it comes
    /// before an already attached key, `TooManyKeys` once `required` keys
    /// are attached.
    pub fn add_private_key(&mut self, key: PrivateKey) -> Result<&mut Self, MultiSigError> {
        if self.signing_keys.len() >= self.required {
            return Err(MultiSigError::TooManyKeys(self.signing_keys.len()));
        }
        let public_key = key.pub_key();
        let position = self
            .public_keys
            .iter()
            .position(|pk| *pk == public_key)
            .ok_or(MultiSigError::UnknownKey)?;
        if let Some((last, _)) = self.signing_keys.last() {
            if position <= *last {
                return Err(MultiSigError::KeyOrder {
                    position: position + 1,
                });
            }
        }
        self.signing_keys.push((position, key));
        Ok(self)
    }

    /// Number of attached signing keys.
    pub fn signing_key_count(&self) -> usize {
        self.signing_keys.len()
    }

    /// Sign a 32-byte digest with every attached key.
    ///
    /// # Returns
    /// DER signatures with the SIGHASH_ALL byte appended, in script order,
    /// or `NotEnoughKeys` if fewer than `required` keys are attached.
    pub fn sign(&self, digest: &[u8; 32]) -> Result<Vec<Vec<u8>>, MultiSigError> {
        if self.signing_keys.len() != self.required {
            return Err(MultiSigError::NotEnoughKeys {
                required: self.required,
                attached: self.signing_keys.len(),
            });
        }
        debug!(
            required = self.required,
            total = self.total(),
            "signing multisig digest"
        );
        self.signing_keys
            .iter()
            .map(|(_, key)| -> Result<Vec<u8>, MultiSigError> {
                let mut sig = key.sign(digest)?.to_der();
                sig.push(SIGHASH_ALL);
                Ok(sig)
            })
            .collect()
    }

    /// Legacy scriptSig `OP_0 <sig>... <redeem_script>`.
    pub fn script_sig(&self, signatures: &[Vec<u8>]) -> Result<Script, MultiSigError> {
        let mut builder = OpCodeBuilder::new().op(OP_0)?;
        for sig in signatures {
            builder = builder.push_data(sig)?;
        }
        Ok(builder.push_data(self.redeem_script.as_bytes())?.build())
    }

    /// Witness stack `<empty> <sig>... <redeem_script>`.
    ///
    /// The leading empty element is the dummy value `OP_CHECKMULTISIG` pops.
    pub fn witness(&self, signatures: &[Vec<u8>]) -> Vec<Vec<u8>> {
        let mut stack = Vec::with_capacity(signatures.len() + 2);
        stack.push(Vec::new());
        stack.extend(signatures.iter().cloned());
        stack.push(self.redeem_script.as_bytes().to_vec());
        stack
    }
}
