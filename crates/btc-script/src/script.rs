//! Bitcoin Script type and its opcode builder.
//!
//! A `Script` is immutable: it is produced by `OpCodeBuilder::build`, by
//! decoding raw bytes or by parsing the text token form, and it keeps the
//! decoded chunks, the consensus bytes and their hash160 side by side.

use std::fmt;

use btc_primitives::hash::hash160;

use crate::chunk::{decode_script, ScriptChunk};
use crate::opcodes::*;
use crate::ScriptError;

/// Accumulates opcodes and pushes and finalizes them into a `Script`.
///
/// ```
/// use btc_script::{opcodes::*, OpCodeBuilder};
///
/// let script = OpCodeBuilder::new()
///     .op(OP_HASH160).unwrap()
///     .push_data(&[0u8; 20]).unwrap()
///     .op(OP_EQUAL).unwrap()
///     .build();
/// assert!(script.is_p2sh());
/// ```
#[derive(Clone, Debug, Default)]
pub struct OpCodeBuilder {
    chunks: Vec<ScriptChunk>,
}

impl OpCodeBuilder {
    pub fn new() -> Self {
        OpCodeBuilder { chunks: Vec::new() }
    }

    /// Append a bare opcode.
    ///
    /// Push opcodes (0x01..=0x4e) must go through `push_data`; bytes outside
    /// the opcode table are rejected.
    pub fn op(mut self, op: u8) -> Result<Self, ScriptError> {
        if (OP_DATA_1..=OP_PUSHDATA4).contains(&op) {
            return Err(ScriptError::InvalidOpcodeType(op));
        }
        if !is_known(op) {
            return Err(ScriptError::InvalidOpcode(op));
        }
        self.chunks.push(ScriptChunk::opcode(op));
        Ok(self)
    }

    /// Append a small-integer opcode (`OP_0`..`OP_16`).
    pub fn small_int(self, n: u8) -> Result<Self, ScriptError> {
        let op = small_int_opcode(n).ok_or(ScriptError::InvalidOpcode(n))?;
        self.op(op)
    }

    /// Append a data push with the smallest encoding for its length.
    ///
    /// # Returns
    /// `PushDataLength` when `data` is empty.
    pub fn push_data(mut self, data: &[u8]) -> Result<Self, ScriptError> {
        self.chunks.push(ScriptChunk::push(data)?);
        Ok(self)
    }

    /// Finalize into an immutable `Script`.
    pub fn build(self) -> Script {
        Script::from_chunks(self.chunks)
    }
}

/// A Bitcoin script.
#[derive(Clone, PartialEq, Eq)]
pub struct Script {
    chunks: Vec<ScriptChunk>,
    bytes: Vec<u8>,
    hash160: [u8; 20],
}

impl Script {
    // -----------------------------------------------------------------------
    // Constructors
    // -----------------------------------------------------------------------

    /// The empty script.
    pub fn new() -> Self {
        Self::from_chunks(Vec::new())
    }

    fn from_chunks(chunks: Vec<ScriptChunk>) -> Self {
        let mut bytes = Vec::new();
        for chunk in &chunks {
            chunk.write_to(&mut bytes);
        }
        let hash160 = hash160(&bytes);
        Script {
            chunks,
            bytes,
            hash160,
        }
    }

    /// Decode raw script bytes.
    ///
    /// # Returns
    /// The script, or `UnknownOpcode` / `TruncatedPush` for malformed bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self, ScriptError> {
        let chunks = decode_script(bytes)?;
        Ok(Script {
            chunks,
            bytes: bytes.to_vec(),
            hash160: hash160(bytes),
        })
    }

    /// Decode a hex-encoded script.
    pub fn from_hex(hex_str: &str) -> Result<Self, ScriptError> {
        Self::decode(&hex::decode(hex_str)?)
    }

    /// Parse the space-separated text token form.
    ///
    /// # Returns
    /// The script, or `Parse` naming the offending token index. Empty text
    /// is rejected; use `Script::new()` for an empty script.
    pub fn parse(text: &str) -> Result<Self, ScriptError> {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        if tokens.is_empty() {
            return Err(ScriptError::Parse {
                index: 0,
                reason: "script is empty".to_string(),
            });
        }
        let chunks = tokens
            .iter()
            .enumerate()
            .map(|(i, token)| ScriptChunk::from_token(i, token))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_chunks(chunks))
    }

    /// Standard `OP_DUP OP_HASH160 <hash> OP_EQUALVERIFY OP_CHECKSIG`.
    pub fn p2pkh(pub_key_hash: &[u8; 20]) -> Self {
        Self::from_chunks(vec![
            ScriptChunk::opcode(OP_DUP),
            ScriptChunk::opcode(OP_HASH160),
            push20(pub_key_hash),
            ScriptChunk::opcode(OP_EQUALVERIFY),
            ScriptChunk::opcode(OP_CHECKSIG),
        ])
    }

    /// Standard `OP_HASH160 <hash> OP_EQUAL`.
    pub fn p2sh(script_hash: &[u8; 20]) -> Self {
        Self::from_chunks(vec![
            ScriptChunk::opcode(OP_HASH160),
            push20(script_hash),
            ScriptChunk::opcode(OP_EQUAL),
        ])
    }

    /// Version 0 key-hash witness program `OP_0 <hash>`.
    pub fn p2wpkh(pub_key_hash: &[u8; 20]) -> Self {
        Self::from_chunks(vec![ScriptChunk::opcode(OP_0), push20(pub_key_hash)])
    }

    /// Witness program script `OP_n <program>`.
    pub fn witness_program(version: u8, program: &[u8]) -> Result<Self, ScriptError> {
        OpCodeBuilder::new()
            .small_int(version)?
            .push_data(program)
            .map(OpCodeBuilder::build)
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// The consensus-serialized bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn chunks(&self) -> &[ScriptChunk] {
        &self.chunks
    }

    /// RIPEMD160(SHA256(bytes)), computed once at construction.
    pub fn hash160(&self) -> &[u8; 20] {
        &self.hash160
    }

    /// The text token form, as accepted by `Script::parse`.
    pub fn to_tokens(&self) -> Vec<String> {
        self.chunks.iter().map(ScriptChunk::to_token).collect()
    }

    // -----------------------------------------------------------------------
    // Script classification
    // -----------------------------------------------------------------------

    /// Pattern: OP_DUP OP_HASH160 <20 bytes> OP_EQUALVERIFY OP_CHECKSIG
    pub fn is_p2pkh(&self) -> bool {
        let b = &self.bytes;
        b.len() == 25
            && b[0] == OP_DUP
            && b[1] == OP_HASH160
            && b[2] == OP_DATA_20
            && b[23] == OP_EQUALVERIFY
            && b[24] == OP_CHECKSIG
    }

    /// Pattern: OP_HASH160 <20 bytes> OP_EQUAL
    pub fn is_p2sh(&self) -> bool {
        let b = &self.bytes;
        b.len() == 23 && b[0] == OP_HASH160 && b[1] == OP_DATA_20 && b[22] == OP_EQUAL
    }

    /// Pattern: OP_0 <20 bytes>
    pub fn is_p2wpkh_program(&self) -> bool {
        let b = &self.bytes;
        b.len() == 22 && b[0] == OP_0 && b[1] == OP_DATA_20
    }

    /// Pattern: OP_0 <32 bytes>
    pub fn is_p2wsh_program(&self) -> bool {
        let b = &self.bytes;
        b.len() == 34 && b[0] == OP_0 && b[1] == OP_DATA_32
    }

    /// The 20-byte public key hash of a P2PKH script.
    pub fn p2pkh_hash(&self) -> Option<[u8; 20]> {
        if !self.is_p2pkh() {
            return None;
        }
        self.bytes[3..23].try_into().ok()
    }

    /// The 20-byte script hash of a P2SH script.
    pub fn p2sh_hash(&self) -> Option<[u8; 20]> {
        if !self.is_p2sh() {
            return None;
        }
        self.bytes[2..22].try_into().ok()
    }

    /// The 20-byte key hash of a version 0 key-hash witness program.
    pub fn p2wpkh_hash(&self) -> Option<[u8; 20]> {
        if !self.is_p2wpkh_program() {
            return None;
        }
        self.bytes[2..22].try_into().ok()
    }
}

/// Witness subtype of a P2SH redeem script.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum RedeemScriptType {
    /// `OP_0 <20-byte key hash>`
    #[serde(rename = "p2sh-p2wpkh")]
    P2SHP2WPKH,
    /// `OP_0 <32-byte script hash>`
    #[serde(rename = "p2sh-p2wsh")]
    P2SHP2WSH,
}

impl RedeemScriptType {
    /// Classify a redeem script; `None` for plain P2SH.
    pub fn detect(redeem_script: &Script) -> Option<Self> {
        if redeem_script.is_p2wpkh_program() {
            Some(RedeemScriptType::P2SHP2WPKH)
        } else if redeem_script.is_p2wsh_program() {
            Some(RedeemScriptType::P2SHP2WSH)
        } else {
            None
        }
    }
}

impl fmt::Display for RedeemScriptType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RedeemScriptType::P2SHP2WPKH => f.write_str("p2sh-p2wpkh"),
            RedeemScriptType::P2SHP2WSH => f.write_str("p2sh-p2wsh"),
        }
    }
}

fn push20(hash: &[u8; 20]) -> ScriptChunk {
    ScriptChunk {
        op: OP_DATA_20,
        data: Some(hash.to_vec()),
    }
}

impl Default for Script {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Script {
    /// Display the script as space-separated tokens.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_tokens().join(" "))
    }
}

impl fmt::Debug for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Script({})", self.to_hex())
    }
}

impl serde::Serialize for Script {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> serde::Deserialize<'de> for Script {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Script::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
