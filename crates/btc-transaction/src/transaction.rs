//! Bitcoin transaction model, signer and serializer.
//!
//! A `Transaction` is built by appending inputs and outputs, or decoded
//! from raw bytes. Signing never mutates it: `sign()` resolves every
//! input's scriptSig and witness stack and returns an immutable
//! `SerializedTransaction`.

use std::sync::Arc;

use btc_primitives::chainhash::Hash;
use btc_primitives::ec::PublicKey;
use btc_primitives::util::{BtcWriter, VarInt};
use btc_primitives::Network;
use btc_script::{Address, AddressKind, OpCodeBuilder, PaymentAddress, RedeemScriptType, Script};
use tracing::{debug, trace};

use crate::decoder::{RawTransactionDecoder, SEGWIT_MARKER};
use crate::dump::TransactionDump;
use crate::input::{SigningMethod, TxInput};
use crate::output::TxOutput;
use crate::serialized::{SerializedTransaction, TxSize};
use crate::sighash::{legacy_preimage, segwit_preimage, SIGHASH_ALL_BYTE};
use crate::{TransactionDecodeError, TransactionError};

/// Version of newly created transactions.
pub const DEFAULT_VERSION: u32 = 1;

/// Version, lock time and two 1-byte counts.
const BASE_SIZE: usize = 10;

/// SegWit marker and flag.
const SEGWIT_FLAG_SIZE: usize = 2;

/// A Bitcoin transaction under construction.
///
/// # Wire format
///
/// | Field        | Size                        |
/// |--------------|-----------------------------|
/// | version      | 4 bytes (LE)                |
/// | marker, flag | `00 01`, SegWit only        |
/// | input count  | VarInt                      |
/// | inputs       | variable                    |
/// | output count | VarInt                      |
/// | outputs      | variable                    |
/// | witnesses    | one stack per input, SegWit |
/// | lock_time    | 4 bytes (LE)                |
#[derive(Clone, Debug)]
pub struct Transaction {
    /// Transaction version, 1 or 2.
    pub version: u32,

    /// Block height or timestamp before which the transaction is invalid.
    pub lock_time: u32,

    /// Serialize with the SegWit marker and witness stacks.
    pub is_segwit: bool,

    inputs: Vec<TxInput>,
    outputs: Vec<TxOutput>,
    network: Arc<Network>,
}

/// scriptSig and witness stack of one input after signing.
struct ResolvedInput {
    script_sig: Option<Script>,
    witness: Vec<Vec<u8>>,
}

impl Transaction {
    /// Create an empty version 1 transaction on `network`.
    pub fn new(network: Arc<Network>) -> Self {
        Transaction {
            version: DEFAULT_VERSION,
            lock_time: 0,
            is_segwit: false,
            inputs: Vec::new(),
            outputs: Vec::new(),
            network,
        }
    }

    /// Decode a consensus-serialized transaction.
    pub fn decode(bytes: &[u8], network: Arc<Network>) -> Result<Self, TransactionDecodeError> {
        RawTransactionDecoder::new(bytes).decode(network)
    }

    /// Decode a hex-encoded transaction.
    pub fn from_hex(hex_str: &str, network: Arc<Network>) -> Result<Self, TransactionError> {
        let bytes = hex::decode(hex_str).map_err(btc_primitives::PrimitivesError::from)?;
        Ok(Self::decode(&bytes, network)?)
    }

    pub fn network(&self) -> &Arc<Network> {
        &self.network
    }

    // -----------------------------------------------------------------------
    // Building
    // -----------------------------------------------------------------------

    /// Append an input spending output `index` of `prev_tx_hash`.
    ///
    /// `script_pub_key` and `value` describe the output being spent; both
    /// are needed to sign, and `value` only for SegWit spends.
    pub fn append_input(
        &mut self,
        prev_tx_hash: Hash,
        index: u32,
        script_pub_key: Option<Script>,
        value: Option<u64>,
    ) -> &mut TxInput {
        let input = TxInput::new(prev_tx_hash, index, script_pub_key, value, &self.network);
        self.inputs.push(input);
        let last = self.inputs.len() - 1;
        &mut self.inputs[last]
    }

    /// Append an input spending an output paid to `address`.
    ///
    /// The address supplies the scriptPubKey and, for P2SH forms, the
    /// redeem script.
    pub fn append_input_from_address(
        &mut self,
        prev_tx_hash: Hash,
        index: u32,
        address: Address,
        value: Option<u64>,
    ) -> &mut TxInput {
        let script_pub_key = address.script_pub_key();
        let input = self.append_input(prev_tx_hash, index, Some(script_pub_key), value);
        input.set_address(address);
        input
    }

    /// Append an output paying `value` satoshis to `script_pub_key`.
    pub fn append_output(&mut self, script_pub_key: Script, value: u64) -> &mut TxOutput {
        let output = TxOutput::new(script_pub_key, value, &self.network);
        self.outputs.push(output);
        let last = self.outputs.len() - 1;
        &mut self.outputs[last]
    }

    /// Append an output paying `value` satoshis to `address`.
    pub fn append_output_to_address(&mut self, address: &Address, value: u64) -> &mut TxOutput {
        self.append_output(address.script_pub_key(), value)
    }

    pub fn inputs(&self) -> &[TxInput] {
        &self.inputs
    }

    pub fn input_mut(&mut self, index: usize) -> Option<&mut TxInput> {
        self.inputs.get_mut(index)
    }

    pub fn outputs(&self) -> &[TxOutput] {
        &self.outputs
    }

    /// Size and weight from the scriptSigs and witnesses set so far.
    pub fn size(&self) -> TxSize {
        let inputs: usize = self
            .inputs
            .iter()
            .map(|i| i.size_in_bytes(self.is_segwit, i.script_sig(), i.witness()))
            .sum();
        self.size_with(inputs)
    }

    fn size_with(&self, inputs_size: usize) -> TxSize {
        let outputs_size: usize = self.outputs.iter().map(TxOutput::size_in_bytes).sum();
        let mut size = BASE_SIZE + inputs_size + outputs_size;
        if self.is_segwit {
            size += SEGWIT_FLAG_SIZE;
        }
        TxSize::new(size, self.is_segwit)
    }

    // -----------------------------------------------------------------------
    // Hashing and signing
    // -----------------------------------------------------------------------

    /// Build the preimage whose double SHA-256 is signed for `input_index`.
    ///
    /// BIP143 is used for P2SH-P2WPKH, P2SH-P2WSH and native P2WPKH
    /// inputs, the legacy algorithm for everything else.
    pub fn hash_preimage(&self, input_index: usize) -> Result<SerializedTransaction, TransactionError> {
        let segwit = self
            .inputs
            .get(input_index)
            .map_or(false, TxInput::uses_segwit_preimage);
        let bytes = if segwit {
            segwit_preimage(self, input_index)?
        } else {
            legacy_preimage(self, input_index)?
        };
        let preimage = SerializedTransaction::preimage(bytes);
        trace!(input = input_index, segwit, digest = %hex::encode(preimage.digest()), "sighash preimage");
        Ok(preimage)
    }

    /// Sign every input and serialize the transaction for broadcast.
    ///
    /// # Returns
    /// The signed transaction, or an error when there are no inputs or no
    /// outputs, an input has no signing method, or SegWit witness data is
    /// missing.
    pub fn sign(&self) -> Result<SerializedTransaction, TransactionError> {
        if self.inputs.is_empty() {
            return Err(TransactionError::InvalidTransaction("transaction has no inputs".into()));
        }
        if self.outputs.is_empty() {
            return Err(TransactionError::InvalidTransaction("transaction has no outputs".into()));
        }

        let mut resolved = Vec::with_capacity(self.inputs.len());
        for (n, input) in self.inputs.iter().enumerate() {
            debug!(input = n, prev_tx = %input.prev_tx_hash(), vout = input.index(), "signing input");
            let r = self.resolve_input(n, input)?;
            if r.script_sig.is_none() && r.witness.is_empty() {
                return Err(TransactionError::input_sign(n, "no signature available"));
            }
            resolved.push(r);
        }

        let has_witness = resolved.iter().any(|r| !r.witness.is_empty());
        if self.is_segwit && !has_witness {
            return Err(TransactionError::Encode(
                "SegWit transaction has no witness data for any input".into(),
            ));
        }
        if !self.is_segwit {
            if let Some(n) = resolved.iter().position(|r| !r.witness.is_empty()) {
                return Err(TransactionError::Encode(format!(
                    "input # {} has witness data but the transaction is not flagged SegWit",
                    n + 1
                )));
            }
        }

        let inputs_size = self
            .inputs
            .iter()
            .zip(&resolved)
            .map(|(i, r)| i.size_in_bytes(self.is_segwit, r.script_sig.as_ref(), &r.witness))
            .sum();
        let size = self.size_with(inputs_size);

        let stripped = self.encode(&resolved, false);
        let signed = if self.is_segwit {
            SerializedTransaction::signed(self.encode(&resolved, true), Some(stripped), size)
        } else {
            SerializedTransaction::signed(stripped, None, size)
        };
        debug!(txid = %signed.txid(), bytes = signed.bytes().len(), "transaction signed");
        Ok(signed)
    }

    /// Produce the scriptSig and witness stack for input `n`.
    fn resolve_input(&self, n: usize, input: &TxInput) -> Result<ResolvedInput, TransactionError> {
        let mut witness = input.witness().to_vec();
        let script_sig = match input.signing_method() {
            SigningMethod::Literal(script) => Some(script.clone()),
            SigningMethod::SingleKey(key) => {
                let digest = self.hash_preimage(n)?.digest();
                let mut signature = key.sign(&digest)?.to_der();
                signature.push(SIGHASH_ALL_BYTE);
                create_script_sig(n, input, signature, &key.pub_key(), &mut witness)?
            }
            SigningMethod::MultiSig(multisig) => {
                let digest = self.hash_preimage(n)?.digest();
                let signatures = multisig.sign(&digest)?;
                if input.redeem_script_type() == Some(RedeemScriptType::P2SHP2WSH) {
                    let redeem = input.redeem_script().ok_or_else(|| {
                        TransactionError::input_sign(n, "P2SH-P2WSH input has no redeem script")
                    })?;
                    witness.extend(multisig.witness(&signatures));
                    Some(OpCodeBuilder::new().push_data(redeem.as_bytes())?.build())
                } else {
                    Some(multisig.script_sig(&signatures)?)
                }
            }
            SigningMethod::None => None,
        };
        Ok(ResolvedInput { script_sig, witness })
    }

    /// Serialize with resolved inputs; `with_witness` adds the SegWit
    /// marker and witness stacks.
    fn encode(&self, resolved: &[ResolvedInput], with_witness: bool) -> Vec<u8> {
        let mut writer = BtcWriter::with_capacity(256);
        writer.write_u32_le(self.version);
        if with_witness {
            writer.write_bytes(&SEGWIT_MARKER);
        }
        writer.write_varint(VarInt::from(self.inputs.len()));
        for (input, r) in self.inputs.iter().zip(resolved) {
            input.write_to(&mut writer, r.script_sig.as_ref());
        }
        writer.write_varint(VarInt::from(self.outputs.len()));
        for output in &self.outputs {
            output.write_to(&mut writer);
        }
        if with_witness {
            for r in resolved {
                writer.write_varint(VarInt::from(r.witness.len()));
                for element in &r.witness {
                    writer.write_var_bytes(element);
                }
            }
        }
        writer.write_u32_le(self.lock_time);
        writer.into_bytes()
    }

    // -----------------------------------------------------------------------
    // Inspection
    // -----------------------------------------------------------------------

    /// Serde-serializable view of the transaction.
    ///
    /// # Returns
    /// `InvalidTransaction` if the transaction has no outputs.
    pub fn dump(&self) -> Result<TransactionDump, TransactionError> {
        if self.outputs.is_empty() {
            return Err(TransactionError::InvalidTransaction("transaction has no outputs".into()));
        }
        Ok(TransactionDump::from_transaction(self))
    }

    /// `dump()` rendered as pretty-printed JSON.
    pub fn dump_json(&self) -> Result<String, TransactionError> {
        Ok(serde_json::to_string_pretty(&self.dump()?)?)
    }
}

/// Build the scriptSig for a single-key signature, moving the signature
/// and public key into `witness` for SegWit spends.
///
/// # Returns
/// `None` for native P2WPKH, which has an empty scriptSig.
fn create_script_sig(
    n: usize,
    input: &TxInput,
    signature: Vec<u8>,
    public_key: &PublicKey,
    witness: &mut Vec<Vec<u8>>,
) -> Result<Option<Script>, TransactionError> {
    let (Some(_), Some(address)) = (input.script_pub_key(), input.address()) else {
        return Err(TransactionError::input_sign(
            n,
            "cannot create a scriptSig without a valid scriptPubKey",
        ));
    };

    let script_sig = match address.kind() {
        AddressKind::P2PKH => OpCodeBuilder::new()
            .push_data(&signature)?
            .push_data(&public_key.to_compressed())?
            .build(),
        AddressKind::P2SH | AddressKind::P2SHP2WPKH => {
            let redeem = input.redeem_script().ok_or_else(|| {
                TransactionError::input_sign(n, "cannot create a P2SH scriptSig without a redeem script")
            })?;
            if input.redeem_script_type() == Some(RedeemScriptType::P2SHP2WPKH) {
                witness.push(signature);
                witness.push(public_key.to_compressed().to_vec());
                OpCodeBuilder::new().push_data(redeem.as_bytes())?.build()
            } else {
                OpCodeBuilder::new()
                    .push_data(&signature)?
                    .push_data(redeem.as_bytes())?
                    .build()
            }
        }
        AddressKind::Bech32P2WPKH => {
            witness.push(signature);
            witness.push(public_key.to_compressed().to_vec());
            return Ok(None);
        }
    };
    Ok(Some(script_sig))
}
