//! Signature hash preimages for transaction signing.
//!
//! Two digest algorithms are supported, both with SIGHASH_ALL only:
//! the legacy preimage, which re-serializes the transaction with the
//! signing input's script code in place of its scriptSig, and the BIP143
//! preimage used for P2SH-P2WPKH, P2SH-P2WSH and native P2WPKH spends.
//!
//! See <https://github.com/bitcoin/bips/blob/master/bip-0143.mediawiki>

use btc_primitives::hash::sha256d;
use btc_primitives::util::{BtcWriter, VarInt};
use btc_script::{RedeemScriptType, Script};
use tracing::trace;

use crate::input::{SigningMethod, TxInput};
use crate::transaction::Transaction;
use crate::TransactionError;

// -----------------------------------------------------------------------
// Sighash flag constants
// -----------------------------------------------------------------------

/// Sign all inputs and all outputs.
pub const SIGHASH_ALL: u32 = 0x01;

/// SIGHASH_ALL as the single byte appended to DER signatures.
pub const SIGHASH_ALL_BYTE: u8 = SIGHASH_ALL as u8;

// -----------------------------------------------------------------------
// Legacy preimage
// -----------------------------------------------------------------------

/// Build the legacy preimage for `input_index`.
///
/// Every input is written with an empty script except the signing input,
/// which carries its script code (see `TxInput::script_code`). An input
/// without a script code is written with an empty script as well.
///
/// # Returns
/// The raw preimage bytes, ending with the 4-byte SIGHASH_ALL type.
pub fn legacy_preimage(tx: &Transaction, input_index: usize) -> Result<Vec<u8>, TransactionError> {
    let signing_input = checked_input(tx, input_index)?;
    let script_code = signing_input.script_code(input_index)?;

    let mut writer = BtcWriter::with_capacity(256);
    writer.write_u32_le(tx.version);
    writer.write_varint(VarInt::from(tx.inputs().len()));
    for (i, input) in tx.inputs().iter().enumerate() {
        let script = if i == input_index { script_code.as_ref() } else { None };
        input.write_to(&mut writer, script);
    }
    writer.write_varint(VarInt::from(tx.outputs().len()));
    for output in tx.outputs() {
        output.write_to(&mut writer);
    }
    writer.write_u32_le(tx.lock_time);
    writer.write_u32_le(SIGHASH_ALL);

    Ok(writer.into_bytes())
}

// -----------------------------------------------------------------------
// BIP143 preimage
// -----------------------------------------------------------------------

/// Build the BIP143 preimage for `input_index`.
///
/// The preimage consists of:
/// 1. nVersion (4 bytes LE)
/// 2. hashPrevouts (32 bytes)
/// 3. hashSequence (32 bytes)
/// 4. outpoint (32+4 bytes)
/// 5. scriptCode (varint + script)
/// 6. value (8 bytes LE) of the output being spent
/// 7. nSequence (4 bytes LE)
/// 8. hashOutputs (32 bytes)
/// 9. nLocktime (4 bytes LE)
/// 10. sighash type (4 bytes LE)
///
/// # Returns
/// The raw preimage, or `InputSign` when the script code cannot be
/// derived or the spent value is unknown.
pub fn segwit_preimage(tx: &Transaction, input_index: usize) -> Result<Vec<u8>, TransactionError> {
    let input = checked_input(tx, input_index)?;
    let script_code = segwit_script_code(input, input_index)?;
    let value = input.value().ok_or_else(|| {
        TransactionError::input_sign(input_index, "value of the spent output is required for a SegWit preimage")
    })?;

    let mut writer = BtcWriter::with_capacity(256);
    writer.write_u32_le(tx.version);
    writer.write_bytes(&prevouts_hash(tx));
    writer.write_bytes(&sequence_hash(tx));
    input.write_outpoint(&mut writer);
    writer.write_var_bytes(script_code.as_bytes());
    writer.write_u64_le(value);
    writer.write_u32_le(input.sequence());
    writer.write_bytes(&outputs_hash(tx));
    writer.write_u32_le(tx.lock_time);
    writer.write_u32_le(SIGHASH_ALL);

    Ok(writer.into_bytes())
}

/// Script code committed to by the BIP143 preimage of `input`.
///
/// - P2SH-P2WPKH: P2PKH over the key hash inside the redeem script.
/// - P2SH-P2WSH: the multisig redeem script when signing with one,
///   otherwise the input's own redeem script.
/// - Native P2WPKH: P2PKH over the hash160 of the address's public key,
///   or of the signing key when the address carries none.
pub fn segwit_script_code(input: &TxInput, input_index: usize) -> Result<Script, TransactionError> {
    match input.redeem_script_type() {
        Some(RedeemScriptType::P2SHP2WPKH) => {
            let key_hash = input
                .redeem_script()
                .and_then(Script::p2wpkh_hash)
                .ok_or_else(|| TransactionError::input_sign(input_index, "malformed P2SH-P2WPKH redeem script"))?;
            return Ok(Script::p2pkh(&key_hash));
        }
        Some(RedeemScriptType::P2SHP2WSH) => {
            if let SigningMethod::MultiSig(multisig) = input.signing_method() {
                return Ok(multisig.redeem_script().clone());
            }
            return input
                .redeem_script()
                .cloned()
                .ok_or_else(|| TransactionError::input_sign(input_index, "missing P2SH-P2WSH redeem script"));
        }
        None => {}
    }

    if input.uses_segwit_preimage() {
        let key_hash = match (input.address().and_then(|a| a.public_key()), input.signing_method()) {
            (Some(public_key), _) => public_key.hash160(),
            (None, SigningMethod::SingleKey(key)) => key.pub_key().hash160(),
            _ => {
                return Err(TransactionError::input_sign(
                    input_index,
                    "cannot build a Bech32-P2WPKH script code without the address public key",
                ))
            }
        };
        return Ok(Script::p2pkh(&key_hash));
    }

    Err(TransactionError::input_sign(
        input_index,
        format!(
            "cannot create SegWit preimage for input {}-{}",
            &input.prev_tx_hash().to_string()[..8],
            input.index()
        ),
    ))
}

// -----------------------------------------------------------------------
// Internal helper functions
// -----------------------------------------------------------------------

fn checked_input(tx: &Transaction, input_index: usize) -> Result<&TxInput, TransactionError> {
    tx.inputs().get(input_index).ok_or_else(|| {
        TransactionError::InvalidTransaction(format!(
            "input index {} out of range (tx has {} inputs)",
            input_index,
            tx.inputs().len()
        ))
    })
}

/// sha256d of every outpoint, in input order.
fn prevouts_hash(tx: &Transaction) -> [u8; 32] {
    let mut writer = BtcWriter::with_capacity(tx.inputs().len() * 36);
    for input in tx.inputs() {
        input.write_outpoint(&mut writer);
    }
    let hash = sha256d(writer.as_bytes());
    trace!(hash = %hex::encode(hash), "hashPrevouts");
    hash
}

/// sha256d of every input sequence number.
fn sequence_hash(tx: &Transaction) -> [u8; 32] {
    let mut writer = BtcWriter::with_capacity(tx.inputs().len() * 4);
    for input in tx.inputs() {
        writer.write_u32_le(input.sequence());
    }
    let hash = sha256d(writer.as_bytes());
    trace!(hash = %hex::encode(hash), "hashSequence");
    hash
}

/// sha256d of every serialized output.
fn outputs_hash(tx: &Transaction) -> [u8; 32] {
    let mut writer = BtcWriter::new();
    for output in tx.outputs() {
        output.write_to(&mut writer);
    }
    let hash = sha256d(writer.as_bytes());
    trace!(hash = %hex::encode(hash), "hashOutputs");
    hash
}
