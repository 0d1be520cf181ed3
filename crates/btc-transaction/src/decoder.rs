//! Raw transaction decoder.
//!
//! Decoding walks the consensus serialization one stage at a time. Each
//! stage is recorded before its bytes are read so that running out of
//! data reports where the transaction was cut short.

use std::fmt;
use std::sync::Arc;

use btc_primitives::chainhash::Hash;
use btc_primitives::util::BtcReader;
use btc_primitives::{Network, PrimitivesError};
use btc_script::Script;
use tracing::debug;

use crate::transaction::Transaction;
use crate::TransactionDecodeError;

/// Marker and flag bytes that follow the version of a SegWit transaction.
pub const SEGWIT_MARKER: [u8; 2] = [0x00, 0x01];

/// Transaction versions accepted by the decoder.
const VALID_VERSIONS: [u32; 2] = [1, 2];

/// Decoder position, used to tag underflow errors.
///
/// Inputs and witnesses are numbered from 1, outputs from 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Stage {
    Version,
    SegWitFlag,
    Inputs,
    Input(usize),
    Outputs,
    Output(usize),
    Witness(usize),
    LockTime,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Version => f.write_str("version bytes"),
            Stage::SegWitFlag => f.write_str("SegWit flag"),
            Stage::Inputs => f.write_str("inputs"),
            Stage::Input(n) => write!(f, "input # {}", n),
            Stage::Outputs => f.write_str("outputs"),
            Stage::Output(n) => write!(f, "output # {}", n),
            Stage::Witness(n) => write!(f, "witness # {}", n),
            Stage::LockTime => f.write_str("lock time"),
        }
    }
}

/// Stateful decoder over one raw transaction buffer.
pub struct RawTransactionDecoder<'a> {
    reader: BtcReader<'a>,
    stage: Stage,
}

impl<'a> RawTransactionDecoder<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        RawTransactionDecoder {
            reader: BtcReader::new(bytes),
            stage: Stage::Version,
        }
    }

    /// Decode the whole buffer into a transaction bound to `network`.
    ///
    /// # Returns
    /// The transaction, or a `TransactionDecodeError` naming the stage that
    /// failed. Bytes left after the lock time are an `Overflow` error.
    pub fn decode(mut self, network: Arc<Network>) -> Result<Transaction, TransactionDecodeError> {
        let mut tx = Transaction::new(network);

        self.enter(Stage::Version);
        tx.version = self.read(|r| r.read_u32_le())?;
        if !VALID_VERSIONS.contains(&tx.version) {
            return Err(TransactionDecodeError::InvalidVersion(tx.version));
        }

        self.enter(Stage::SegWitFlag);
        if self.reader.peek(2) == Some(&SEGWIT_MARKER[..]) {
            self.read(|r| r.read_bytes(2))?;
            tx.is_segwit = true;
        }

        self.enter(Stage::Inputs);
        let input_count = self.read_count()?;
        for n in 1..=input_count {
            self.enter(Stage::Input(n));
            self.read_input(&mut tx, n)?;
        }

        self.enter(Stage::Outputs);
        let output_count = self.read_count()?;
        for n in 0..output_count {
            self.enter(Stage::Output(n));
            let value = self.read(|r| r.read_u64_le())?;
            let script_bytes = self.read(|r| r.read_var_bytes())?;
            let script = Script::decode(script_bytes)
                .map_err(|source| TransactionDecodeError::OutputScriptParse { index: n, source })?;
            tx.append_output(script, value);
        }

        if tx.is_segwit {
            for n in 1..=tx.inputs().len() {
                self.enter(Stage::Witness(n));
                let element_count = self.read_count()?;
                if element_count == 0 {
                    return Err(TransactionDecodeError::WitnessParse(format!(
                        "expected witness data for input # {}",
                        n
                    )));
                }
                let mut elements = Vec::new();
                for _ in 0..element_count {
                    elements.push(self.read(|r| r.read_var_bytes())?.to_vec());
                }
                if let Some(input) = tx.input_mut(n - 1) {
                    for element in elements {
                        input.set_witness_data(element);
                    }
                }
            }
        }

        self.enter(Stage::LockTime);
        tx.lock_time = self.read(|r| r.read_u32_le())?;

        let excess = self.reader.remaining();
        if excess > 0 {
            return Err(TransactionDecodeError::Overflow(excess));
        }
        Ok(tx)
    }

    fn read_input(&mut self, tx: &mut Transaction, n: usize) -> Result<(), TransactionDecodeError> {
        let prev_tx_hash = Hash::from_bytes(self.read(|r| r.read_bytes(32))?)
            .map_err(|_| self.underflow())?;
        let index = self.read(|r| r.read_u32_le())?;
        let script_bytes = self.read(|r| r.read_var_bytes())?;
        let sequence = self.read(|r| r.read_u32_le())?;

        let mut script_pub_key = None;
        let mut script_sig = None;
        if !script_bytes.is_empty() {
            let script = Script::decode(script_bytes)
                .map_err(|source| TransactionDecodeError::InputScriptParse { index: n, source })?;
            if script.is_p2pkh() || script.is_p2sh() {
                script_pub_key = Some(script);
            } else {
                script_sig = Some(script);
            }
        }

        let input = tx.append_input(prev_tx_hash, index, script_pub_key, None);
        input.set_sequence(sequence);
        if let Some(script) = script_sig {
            input.set_script_sig(script);
        }
        Ok(())
    }

    fn enter(&mut self, stage: Stage) {
        debug!(stage = %stage, offset = self.reader.position(), "decoding");
        self.stage = stage;
    }

    fn underflow(&self) -> TransactionDecodeError {
        TransactionDecodeError::Underflow {
            stage: self.stage.to_string(),
        }
    }

    fn read<T>(
        &mut self,
        f: impl FnOnce(&mut BtcReader<'a>) -> Result<T, PrimitivesError>,
    ) -> Result<T, TransactionDecodeError> {
        f(&mut self.reader).map_err(|_| self.underflow())
    }

    /// Read a VarInt element count; counts beyond the address space can
    /// never be satisfied by the buffer and are reported as underflow.
    fn read_count(&mut self) -> Result<usize, TransactionDecodeError> {
        let count = self.read(|r| r.read_varint())?.value();
        usize::try_from(count).map_err(|_| self.underflow())
    }
}
