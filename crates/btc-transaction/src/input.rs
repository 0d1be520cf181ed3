//! Transaction input spending a previous output.
//!
//! An input carries the outpoint it spends, the scriptPubKey and value of
//! that output when known, the payment address classified from that
//! scriptPubKey, an optional redeem script and the signing method used to
//! produce its scriptSig or witness stack.

use btc_primitives::chainhash::Hash;
use btc_primitives::ec::PrivateKey;
use btc_primitives::util::{BtcWriter, VarInt};
use btc_primitives::Network;
use btc_script::{Address, AddressKind, MultiSig, PaymentAddress, RedeemScriptType, Script};
use tracing::warn;

use crate::TransactionError;

/// Default sequence number indicating a finalized input (no relative lock-time).
pub const DEFAULT_SEQUENCE_NUMBER: u32 = 0xFFFF_FFFF;

/// Bytes every input occupies regardless of its script: 32-byte hash,
/// 4-byte index, 4-byte sequence and a 1-byte script length.
pub const INPUT_FIXED_SIZE: usize = 41;

/// How the scriptSig (and witness) of an input is produced at signing time.
#[derive(Clone, Debug, Default)]
pub enum SigningMethod {
    /// A ready-made scriptSig, written verbatim.
    Literal(Script),
    /// Sign this input's preimage with one key.
    SingleKey(PrivateKey),
    /// Collect signatures from the keys attached to a multisig script.
    MultiSig(MultiSig),
    #[default]
    None,
}

/// A single input in a Bitcoin transaction.
///
/// # Wire format
///
/// | Field         | Size             |
/// |---------------|------------------|
/// | prev_tx_hash  | 32 bytes (wire)  |
/// | index         | 4 bytes (LE)     |
/// | script length | VarInt           |
/// | script_sig    | variable         |
/// | sequence      | 4 bytes (LE)     |
///
/// Witness stacks are written after all outputs when the transaction is
/// flagged SegWit.
#[derive(Clone, Debug)]
pub struct TxInput {
    prev_tx_hash: Hash,
    index: u32,
    script_pub_key: Option<Script>,
    sequence: u32,
    value: Option<u64>,
    address: Option<Address>,
    script_error: Option<String>,
    redeem_script: Option<Script>,
    redeem_script_type: Option<RedeemScriptType>,
    signing_method: SigningMethod,
    witness: Vec<Vec<u8>>,
}

impl TxInput {
    /// Create an input spending output `index` of `prev_tx_hash`.
    ///
    /// When a scriptPubKey is given it is classified into a payment
    /// address. A script that matches no known pattern does not fail the
    /// call; the reason is kept in `script_error()`.
    pub fn new(
        prev_tx_hash: Hash,
        index: u32,
        script_pub_key: Option<Script>,
        value: Option<u64>,
        network: &Network,
    ) -> Self {
        let (address, script_error) = match &script_pub_key {
            Some(script) => classify(script, network),
            None => (None, None),
        };
        TxInput {
            prev_tx_hash,
            index,
            script_pub_key,
            sequence: DEFAULT_SEQUENCE_NUMBER,
            value,
            address,
            script_error,
            redeem_script: None,
            redeem_script_type: None,
            signing_method: SigningMethod::None,
            witness: Vec::new(),
        }
    }

    pub fn prev_tx_hash(&self) -> &Hash {
        &self.prev_tx_hash
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn script_pub_key(&self) -> Option<&Script> {
        self.script_pub_key.as_ref()
    }

    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    /// Satoshi value of the spent output, needed for SegWit preimages.
    pub fn value(&self) -> Option<u64> {
        self.value
    }

    pub fn address(&self) -> Option<&Address> {
        self.address.as_ref()
    }

    /// Why the scriptPubKey could not be classified into an address.
    pub fn script_error(&self) -> Option<&str> {
        self.script_error.as_deref()
    }

    pub fn redeem_script(&self) -> Option<&Script> {
        self.redeem_script.as_ref()
    }

    pub fn redeem_script_type(&self) -> Option<RedeemScriptType> {
        self.redeem_script_type
    }

    pub fn signing_method(&self) -> &SigningMethod {
        &self.signing_method
    }

    /// Witness stack elements accumulated so far.
    pub fn witness(&self) -> &[Vec<u8>] {
        &self.witness
    }

    pub fn has_witness_data(&self) -> bool {
        !self.witness.is_empty()
    }

    /// The literal scriptSig, if one was supplied.
    pub fn script_sig(&self) -> Option<&Script> {
        match &self.signing_method {
            SigningMethod::Literal(script) => Some(script),
            _ => None,
        }
    }

    // -----------------------------------------------------------------------
    // Mutators
    // -----------------------------------------------------------------------

    /// Use `script_sig` verbatim when the transaction is signed.
    pub fn set_script_sig(&mut self, script_sig: Script) -> &mut Self {
        self.signing_method = SigningMethod::Literal(script_sig);
        self
    }

    /// Sign this input with a single private key.
    pub fn set_signing_key(&mut self, key: PrivateKey) -> &mut Self {
        self.signing_method = SigningMethod::SingleKey(key);
        self
    }

    /// Sign this input with the keys attached to `multisig`.
    pub fn set_multisig(&mut self, multisig: MultiSig) -> &mut Self {
        self.signing_method = SigningMethod::MultiSig(multisig);
        self
    }

    pub fn set_signing_method(&mut self, method: SigningMethod) -> &mut Self {
        self.signing_method = method;
        self
    }

    /// Attach the redeem script of a P2SH spend and detect its subtype.
    pub fn set_redeem_script(&mut self, redeem_script: Script) -> &mut Self {
        self.redeem_script_type = RedeemScriptType::detect(&redeem_script);
        self.redeem_script = Some(redeem_script);
        self
    }

    /// Append one element to the witness stack.
    pub fn set_witness_data(&mut self, element: Vec<u8>) -> &mut Self {
        self.witness.push(element);
        self
    }

    pub fn set_sequence(&mut self, sequence: u32) -> &mut Self {
        self.sequence = sequence;
        self
    }

    pub fn set_value(&mut self, value: u64) -> &mut Self {
        self.value = Some(value);
        self
    }

    /// Replace the classified address, e.g. with one carrying its public key.
    ///
    /// The address's redeem script, if any, becomes this input's redeem
    /// script, and a missing scriptPubKey is filled from the address.
    pub fn set_address(&mut self, address: Address) -> &mut Self {
        if let Some(redeem) = address.redeem_script() {
            self.set_redeem_script(redeem.clone());
        }
        if self.script_pub_key.is_none() {
            self.script_pub_key = Some(address.script_pub_key());
        }
        self.script_error = None;
        self.address = Some(address);
        self
    }

    // -----------------------------------------------------------------------
    // Signing helpers
    // -----------------------------------------------------------------------

    /// Script code committed to by the legacy preimage of this input.
    ///
    /// P2PKH spends commit to the scriptPubKey, P2SH spends to the redeem
    /// script. Native SegWit inputs and inputs without a classified
    /// address commit to nothing.
    pub fn script_code(&self, position: usize) -> Result<Option<Script>, TransactionError> {
        let (Some(script_pub_key), Some(address)) = (&self.script_pub_key, &self.address) else {
            return Ok(None);
        };
        match address.kind() {
            AddressKind::P2PKH => Ok(Some(script_pub_key.clone())),
            AddressKind::P2SH | AddressKind::P2SHP2WPKH => match &self.redeem_script {
                Some(redeem) => Ok(Some(redeem.clone())),
                None => Err(TransactionError::input_sign(
                    position,
                    "cannot sign a P2SH input without a redeem script",
                )),
            },
            AddressKind::Bech32P2WPKH => Ok(None),
        }
    }

    /// True when this input is signed with a BIP143 preimage.
    pub fn uses_segwit_preimage(&self) -> bool {
        self.redeem_script_type.is_some()
            || matches!(
                self.address.as_ref().map(Address::kind),
                Some(AddressKind::Bech32P2WPKH)
            )
    }

    /// Size of this input once signed; `script_sig` is the resolved scriptSig.
    pub fn size_in_bytes(&self, is_segwit: bool, script_sig: Option<&Script>, witness: &[Vec<u8>]) -> usize {
        let mut size = INPUT_FIXED_SIZE;
        if is_segwit {
            size += witness.iter().map(|element| 1 + element.len()).sum::<usize>();
        } else if let Some(script) = script_sig {
            size += script.len();
        }
        size
    }

    /// Write the outpoint: wire-order hash and 4-byte index.
    pub(crate) fn write_outpoint(&self, writer: &mut BtcWriter) {
        writer.write_bytes(self.prev_tx_hash.as_bytes());
        writer.write_u32_le(self.index);
    }

    /// Write the full input with `script` as its scriptSig.
    pub(crate) fn write_to(&self, writer: &mut BtcWriter, script: Option<&Script>) {
        self.write_outpoint(writer);
        match script {
            Some(script) => writer.write_var_bytes(script.as_bytes()),
            None => writer.write_varint(VarInt(0)),
        }
        writer.write_u32_le(self.sequence);
    }
}

/// Classify a scriptPubKey, capturing failure as a diagnostic string.
pub(crate) fn classify(script: &Script, network: &Network) -> (Option<Address>, Option<String>) {
    match Address::from_script_pub_key(script, network) {
        Ok(address) => (Some(address), None),
        Err(e) => {
            warn!(script = %script.to_hex(), error = %e, "scriptPubKey not classified");
            (None, Some(e.to_string()))
        }
    }
}
