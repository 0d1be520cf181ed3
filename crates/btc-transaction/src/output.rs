//! Transaction output with satoshi value and locking script.

use btc_primitives::util::BtcWriter;
use btc_primitives::Network;
use btc_script::{Address, Script};

use crate::input::classify;

/// Value (8 bytes) plus a 1-byte script length.
pub const OUTPUT_FIXED_SIZE: usize = 9;

/// A single output in a Bitcoin transaction.
///
/// The payment address is derived from the scriptPubKey on a best-effort
/// basis; an unrecognized script leaves `address()` empty and records the
/// reason in `script_error()`.
///
/// # Wire format
///
/// | Field          | Size           |
/// |----------------|----------------|
/// | value          | 8 bytes (LE)   |
/// | script length  | VarInt         |
/// | script_pub_key | variable       |
#[derive(Clone, Debug)]
pub struct TxOutput {
    value: u64,
    script_pub_key: Script,
    address: Option<Address>,
    script_error: Option<String>,
}

impl TxOutput {
    /// Create an output paying `value` satoshis to `script_pub_key`.
    pub fn new(script_pub_key: Script, value: u64, network: &Network) -> Self {
        let (address, script_error) = classify(&script_pub_key, network);
        TxOutput {
            value,
            script_pub_key,
            address,
            script_error,
        }
    }

    pub fn value(&self) -> u64 {
        self.value
    }

    pub fn script_pub_key(&self) -> &Script {
        &self.script_pub_key
    }

    pub fn address(&self) -> Option<&Address> {
        self.address.as_ref()
    }

    pub fn script_error(&self) -> Option<&str> {
        self.script_error.as_deref()
    }

    pub fn size_in_bytes(&self) -> usize {
        OUTPUT_FIXED_SIZE + self.script_pub_key.len()
    }

    pub(crate) fn write_to(&self, writer: &mut BtcWriter) {
        writer.write_u64_le(self.value);
        writer.write_var_bytes(self.script_pub_key.as_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_wire_bytes() {
        let net = Network::mainnet();
        let out = TxOutput::new(Script::p2sh(&[0xab; 20]), 50_000, &net);
        let mut writer = BtcWriter::new();
        out.write_to(&mut writer);
        let bytes = writer.into_bytes();
        assert_eq!(&bytes[..8], &50_000u64.to_le_bytes());
        assert_eq!(bytes[8], 23);
        assert_eq!(bytes.len(), 8 + 1 + 23);
        assert_eq!(out.size_in_bytes(), 32);
    }

    #[test]
    fn test_output_address_best_effort() {
        let net = Network::testnet();
        let out = TxOutput::new(Script::p2pkh(&[0x01; 20]), 1, &net);
        assert!(out.address().is_some());

        let data = Script::parse("OP_RETURN PUSHDATA(4)[deadbeef]").unwrap();
        let out = TxOutput::new(data, 0, &net);
        assert!(out.address().is_none());
        assert!(out.script_error().unwrap().contains("6a04deadbeef"));
    }
}
