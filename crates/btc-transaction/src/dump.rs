//! Serde-serializable inspection view of a transaction.

use btc_primitives::chainhash::Hash;
use btc_script::{Address, PaymentAddress, RedeemScriptType, Script};
use serde::Serialize;

use crate::input::TxInput;
use crate::output::TxOutput;
use crate::serialized::TxSize;
use crate::transaction::Transaction;

/// A 32-bit field shown both as a number and as its wire bytes.
#[derive(Clone, Debug, Serialize)]
pub struct U32Dump {
    pub dec: u32,
    #[serde(rename = "uInt32LE")]
    pub uint32_le: String,
}

impl From<u32> for U32Dump {
    fn from(value: u32) -> Self {
        U32Dump {
            dec: value,
            uint32_le: hex::encode(value.to_le_bytes()),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct ScriptDump {
    /// Space-separated token form.
    pub script: String,
    pub base16: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ScriptDump {
    fn new(script: &Script, address: Option<&Address>, error: Option<&str>) -> Self {
        ScriptDump {
            script: script.to_string(),
            base16: script.to_hex(),
            address: address.map(|a| a.address().to_string()),
            kind: address.map(|a| a.kind().to_string()),
            error: error.map(str::to_string),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct RedeemScriptDump {
    pub script: String,
    pub base16: String,
    #[serde(rename = "type")]
    pub kind: Option<RedeemScriptType>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InputDump {
    pub prev_tx_hash: Hash,
    pub prev_tx_index: U32Dump,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<u64>,
    pub script_pub_key: Option<ScriptDump>,
    pub script_sig: Option<ScriptDump>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redeem_script: Option<RedeemScriptDump>,
    pub seq_no: U32Dump,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub witness: Option<Vec<String>>,
}

impl InputDump {
    fn new(input: &TxInput, is_segwit: bool) -> Self {
        InputDump {
            prev_tx_hash: *input.prev_tx_hash(),
            prev_tx_index: input.index().into(),
            value: input.value(),
            script_pub_key: input
                .script_pub_key()
                .map(|s| ScriptDump::new(s, input.address(), input.script_error())),
            script_sig: input.script_sig().map(|s| ScriptDump::new(s, None, None)),
            redeem_script: input.redeem_script().map(|s| RedeemScriptDump {
                script: s.to_string(),
                base16: s.to_hex(),
                kind: input.redeem_script_type(),
            }),
            seq_no: input.sequence().into(),
            witness: (is_segwit && input.has_witness_data())
                .then(|| input.witness().iter().map(hex::encode).collect()),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputDump {
    pub value: u64,
    pub script_pub_key: ScriptDump,
}

impl OutputDump {
    fn new(output: &TxOutput) -> Self {
        OutputDump {
            value: output.value(),
            script_pub_key: ScriptDump::new(
                output.script_pub_key(),
                output.address(),
                output.script_error(),
            ),
        }
    }
}

/// Everything `Transaction::dump` reports.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDump {
    pub version: U32Dump,
    pub size: TxSize,
    pub is_seg_wit: bool,
    pub inputs: Vec<InputDump>,
    pub outputs: Vec<OutputDump>,
    pub lock_time: U32Dump,
}

impl TransactionDump {
    pub(crate) fn from_transaction(tx: &Transaction) -> Self {
        TransactionDump {
            version: tx.version.into(),
            size: tx.size(),
            is_seg_wit: tx.is_segwit,
            inputs: tx.inputs().iter().map(|i| InputDump::new(i, tx.is_segwit)).collect(),
            outputs: tx.outputs().iter().map(OutputDump::new).collect(),
            lock_time: tx.lock_time.into(),
        }
    }
}
