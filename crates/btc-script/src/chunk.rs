//! Script chunk parsing and encoding.
//!
//! A script chunk is either an opcode or a data push with its associated
//! bytes. This module decodes raw script bytes into chunks, renders chunks
//! as text tokens and parses those tokens back.
//!
//! Token grammar:
//! - opcodes by name: `OP_DUP`, `OP_HASH160`, `OP_2`, ...
//! - direct pushes of 1..=75 bytes: `PUSHDATA(n)[hex]`
//! - extended pushes: `PUSHDATA1[lenhex datahex]`, `PUSHDATA2[..]`,
//!   `PUSHDATA4[..]`, where `lenhex` is the little-endian length field
//!   written directly in front of the data with no separator. A zero
//!   length field is accepted here (`PUSHDATA1[00]`) so every decodable
//!   script renders to text that parses back to the same bytes; the
//!   builder itself never emits an empty push.

use crate::opcodes::*;
use crate::ScriptError;

/// Largest payload a direct push can carry.
pub const MAX_DIRECT_PUSH: usize = OP_DATA_75 as usize;

/// A single parsed element of a Bitcoin script.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScriptChunk {
    /// The opcode byte. For direct pushes (1-75 bytes), this is the length.
    pub op: u8,
    /// The data payload, if this chunk is a push operation.
    pub data: Option<Vec<u8>>,
}

impl ScriptChunk {
    /// A bare opcode chunk.
    pub fn opcode(op: u8) -> Self {
        ScriptChunk { op, data: None }
    }

    /// A push chunk using the smallest encoding for `data`.
    ///
    /// # Returns
    /// `PushDataLength` for empty data or data longer than 0xFFFFFFFF bytes.
    pub fn push(data: &[u8]) -> Result<Self, ScriptError> {
        let op = match data.len() {
            0 => return Err(ScriptError::PushDataLength(0)),
            n if n <= MAX_DIRECT_PUSH => n as u8,
            n if n <= 0xFF => OP_PUSHDATA1,
            n if n <= 0xFFFF => OP_PUSHDATA2,
            n if n as u64 <= 0xFFFF_FFFF => OP_PUSHDATA4,
            n => return Err(ScriptError::PushDataLength(n)),
        };
        Ok(ScriptChunk {
            op,
            data: Some(data.to_vec()),
        })
    }

    /// Append the consensus encoding of this chunk to `buf`.
    pub fn write_to(&self, buf: &mut Vec<u8>) {
        buf.push(self.op);
        if let Some(ref data) = self.data {
            match self.op {
                OP_PUSHDATA1 => buf.push(data.len() as u8),
                OP_PUSHDATA2 => buf.extend_from_slice(&(data.len() as u16).to_le_bytes()),
                OP_PUSHDATA4 => buf.extend_from_slice(&(data.len() as u32).to_le_bytes()),
                _ => {}
            }
            buf.extend_from_slice(data);
        }
    }

    /// Render this chunk as a text token.
    pub fn to_token(&self) -> String {
        match (self.op, &self.data) {
            (OP_DATA_1..=OP_DATA_75, Some(data)) => {
                format!("PUSHDATA({})[{}]", data.len(), hex::encode(data))
            }
            (OP_PUSHDATA1, Some(data)) => {
                format!("PUSHDATA1[{:02x}{}]", data.len(), hex::encode(data))
            }
            (OP_PUSHDATA2, Some(data)) => format!(
                "PUSHDATA2[{}{}]",
                hex::encode((data.len() as u16).to_le_bytes()),
                hex::encode(data)
            ),
            (OP_PUSHDATA4, Some(data)) => format!(
                "PUSHDATA4[{}{}]",
                hex::encode((data.len() as u32).to_le_bytes()),
                hex::encode(data)
            ),
            (op, _) => match opcode_name(op) {
                Some(name) => name.to_string(),
                None => format!("0x{:02x}", op),
            },
        }
    }

    /// Parse a single text token.
    ///
    /// # Arguments
    /// * `index` - Position of the token in the script, reported on error.
    /// * `token` - The token text.
    pub fn from_token(index: usize, token: &str) -> Result<Self, ScriptError> {
        let fail = |reason: String| ScriptError::Parse { index, reason };

        if !token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '(' | ')' | '[' | ']'))
        {
            return Err(fail(format!("illegal character in \"{}\"", token)));
        }

        let upper = token.to_ascii_uppercase();
        if let Some(rest) = upper.strip_prefix("PUSHDATA(") {
            let (len_str, body) = rest
                .split_once(")[")
                .ok_or_else(|| fail("expected PUSHDATA(n)[hex]".to_string()))?;
            let hex_str = body
                .strip_suffix(']')
                .ok_or_else(|| fail("missing closing bracket".to_string()))?;
            let declared: usize = len_str
                .parse()
                .map_err(|_| fail(format!("invalid push length \"{}\"", len_str)))?;
            if declared == 0 || declared > MAX_DIRECT_PUSH {
                return Err(fail(format!("direct push length {} outside 1..=75", declared)));
            }
            if hex_str.len() % 2 != 0 {
                return Err(fail("odd-length hex data".to_string()));
            }
            if hex_str.len() != declared * 2 {
                return Err(fail(format!(
                    "declared {} bytes, got {}",
                    declared,
                    hex_str.len() / 2
                )));
            }
            let data = hex::decode(hex_str).map_err(|e| fail(e.to_string()))?;
            return Ok(ScriptChunk {
                op: declared as u8,
                data: Some(data),
            });
        }

        for (prefix, op, width) in [
            ("PUSHDATA1[", OP_PUSHDATA1, 1usize),
            ("PUSHDATA2[", OP_PUSHDATA2, 2),
            ("PUSHDATA4[", OP_PUSHDATA4, 4),
        ] {
            if let Some(rest) = upper.strip_prefix(prefix) {
                let hex_str = rest
                    .strip_suffix(']')
                    .ok_or_else(|| fail("missing closing bracket".to_string()))?;
                if hex_str.len() % 2 != 0 {
                    return Err(fail("odd-length hex data".to_string()));
                }
                let bytes = hex::decode(hex_str).map_err(|e| fail(e.to_string()))?;
                if bytes.len() < width {
                    return Err(fail(format!("missing {}-byte length field", width)));
                }
                let (len_bytes, data) = bytes.split_at(width);
                let mut le = [0u8; 4];
                le[..width].copy_from_slice(len_bytes);
                let declared = u32::from_le_bytes(le) as usize;
                if declared != data.len() {
                    return Err(fail(format!(
                        "declared {} bytes, got {}",
                        declared,
                        data.len()
                    )));
                }
                return Ok(ScriptChunk {
                    op,
                    data: Some(data.to_vec()),
                });
            }
        }

        match opcode_from_name(&upper) {
            Some(op) if (OP_DATA_1..=OP_PUSHDATA4).contains(&op) => {
                Err(fail(format!("{} requires push data", upper)))
            }
            Some(op) => Ok(ScriptChunk::opcode(op)),
            None => Err(fail(format!("unknown opcode \"{}\"", token))),
        }
    }
}

/// Decode raw script bytes into a vector of `ScriptChunk` values.
///
/// Handles OP_DATA_1..OP_DATA_75 (direct push), OP_PUSHDATA1/2/4
/// (extended push) and every opcode in the table. An empty slice decodes
/// to no chunks.
///
/// # Returns
/// The chunks, `UnknownOpcode` for a byte outside the table, or
/// `TruncatedPush` when a push runs past the end of the script.
pub fn decode_script(bytes: &[u8]) -> Result<Vec<ScriptChunk>, ScriptError> {
    let mut chunks = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let op = bytes[pos];
        let (header, length) = match op {
            OP_DATA_1..=OP_DATA_75 => (1, op as usize),
            OP_PUSHDATA1 | OP_PUSHDATA2 | OP_PUSHDATA4 => {
                let width = match op {
                    OP_PUSHDATA1 => 1,
                    OP_PUSHDATA2 => 2,
                    _ => 4,
                };
                let field = bytes.get(pos + 1..pos + 1 + width).ok_or(
                    ScriptError::TruncatedPush {
                        offset: pos,
                        needed: width,
                        available: bytes.len() - pos - 1,
                    },
                )?;
                let mut le = [0u8; 4];
                le[..width].copy_from_slice(field);
                (1 + width, u32::from_le_bytes(le) as usize)
            }
            _ if is_known(op) => {
                chunks.push(ScriptChunk::opcode(op));
                pos += 1;
                continue;
            }
            _ => return Err(ScriptError::UnknownOpcode { op, offset: pos }),
        };

        let start = pos + header;
        let available = bytes.len() - start;
        if length > available {
            return Err(ScriptError::TruncatedPush {
                offset: pos,
                needed: length,
                available,
            });
        }
        chunks.push(ScriptChunk {
            op,
            data: Some(bytes[start..start + length].to_vec()),
        });
        pos = start + length;
    }

    Ok(chunks)
}

/// Compute the push prefix bytes for a payload of the given length.
///
/// # Returns
/// The prefix to place in front of the data, or `PushDataLength` for a
/// zero or oversized length.
pub fn push_data_prefix(data_len: usize) -> Result<Vec<u8>, ScriptError> {
    if data_len == 0 {
        Err(ScriptError::PushDataLength(0))
    } else if data_len <= MAX_DIRECT_PUSH {
        Ok(vec![data_len as u8])
    } else if data_len <= 0xFF {
        Ok(vec![OP_PUSHDATA1, data_len as u8])
    } else if data_len <= 0xFFFF {
        let mut buf = vec![OP_PUSHDATA2];
        buf.extend_from_slice(&(data_len as u16).to_le_bytes());
        Ok(buf)
    } else if data_len as u64 <= 0xFFFF_FFFF {
        let mut buf = vec![OP_PUSHDATA4];
        buf.extend_from_slice(&(data_len as u32).to_le_bytes());
        Ok(buf)
    } else {
        Err(ScriptError::PushDataLength(data_len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(chunks: &[ScriptChunk]) -> Vec<u8> {
        let mut buf = Vec::new();
        for chunk in chunks {
            chunk.write_to(&mut buf);
        }
        buf
    }

    // -----------------------------------------------------------------------
    // decode_script
    // -----------------------------------------------------------------------

    #[test]
    fn test_decode_script_simple() {
        let script = hex::decode("76a914e2a623699e81b291c0327f408fea765d534baa2a88ac").unwrap();
        let chunks = decode_script(&script).unwrap();
        assert_eq!(chunks.len(), 5);
        assert_eq!(chunks[0], ScriptChunk::opcode(OP_DUP));
        assert_eq!(chunks[2].op, OP_DATA_20);
        assert_eq!(chunks[2].data.as_ref().unwrap().len(), 20);
        assert_eq!(chunks[4], ScriptChunk::opcode(OP_CHECKSIG));
        assert_eq!(encode(&chunks), script);
    }

    #[test]
    fn test_decode_script_empty() {
        assert!(decode_script(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_decode_script_unknown_opcode() {
        let err = decode_script(&[OP_DUP, 0xba]).unwrap_err();
        assert!(matches!(err, ScriptError::UnknownOpcode { op: 0xba, offset: 1 }));
        assert!(err.is_decode_error());
        assert!(decode_script(&[0xff]).is_err());
    }

    #[test]
    fn test_decode_script_truncated_direct_push() {
        let err = decode_script(&[0x05, 0x01, 0x02]).unwrap_err();
        assert!(matches!(
            err,
            ScriptError::TruncatedPush { offset: 0, needed: 5, available: 2 }
        ));
    }

    #[test]
    fn test_decode_script_pushdata1_valid() {
        let mut script = vec![OP_PUSHDATA1, 0x4c];
        script.extend_from_slice(&[0xab; 0x4c]);
        let chunks = decode_script(&script).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].op, OP_PUSHDATA1);
        assert_eq!(chunks[0].data.as_ref().unwrap().len(), 0x4c);
        assert_eq!(encode(&chunks), script);
    }

    #[test]
    fn test_decode_script_pushdata_missing_length() {
        assert!(decode_script(&[OP_PUSHDATA1]).is_err());
        assert!(decode_script(&[OP_PUSHDATA2, 0x01]).is_err());
        assert!(decode_script(&[OP_PUSHDATA4, 0x01, 0x00, 0x00]).is_err());
    }

    #[test]
    fn test_decode_script_pushdata_missing_payload() {
        assert!(decode_script(&[OP_PUSHDATA1, 0x02, 0x00]).is_err());
        assert!(decode_script(&[OP_PUSHDATA2, 0x00, 0x01, 0x00]).is_err());
        assert!(decode_script(&[OP_PUSHDATA4, 0x05, 0x00, 0x00, 0x00, 0x00]).is_err());
    }

    // -----------------------------------------------------------------------
    // push encoding
    // -----------------------------------------------------------------------

    #[test]
    fn test_push_data_prefix_boundaries() {
        assert!(matches!(push_data_prefix(0), Err(ScriptError::PushDataLength(0))));
        assert_eq!(push_data_prefix(1).unwrap(), vec![0x01]);
        assert_eq!(push_data_prefix(75).unwrap(), vec![0x4b]);
        assert_eq!(push_data_prefix(76).unwrap(), vec![OP_PUSHDATA1, 76]);
        assert_eq!(push_data_prefix(255).unwrap(), vec![OP_PUSHDATA1, 0xff]);
        assert_eq!(push_data_prefix(256).unwrap(), vec![OP_PUSHDATA2, 0x00, 0x01]);
        assert_eq!(push_data_prefix(0xFFFF).unwrap(), vec![OP_PUSHDATA2, 0xff, 0xff]);
        assert_eq!(
            push_data_prefix(0x10000).unwrap(),
            vec![OP_PUSHDATA4, 0x00, 0x00, 0x01, 0x00]
        );
    }

    #[test]
    fn test_push_chunk_selects_minimal_op() {
        assert_eq!(ScriptChunk::push(&[1u8; 20]).unwrap().op, 20);
        assert_eq!(ScriptChunk::push(&[1u8; 76]).unwrap().op, OP_PUSHDATA1);
        assert_eq!(ScriptChunk::push(&[1u8; 300]).unwrap().op, OP_PUSHDATA2);
        assert!(ScriptChunk::push(&[]).is_err());
    }

    // -----------------------------------------------------------------------
    // tokens
    // -----------------------------------------------------------------------

    #[test]
    fn test_token_rendering() {
        assert_eq!(ScriptChunk::opcode(OP_DUP).to_token(), "OP_DUP");
        assert_eq!(ScriptChunk::opcode(OP_0).to_token(), "OP_0");
        assert_eq!(
            ScriptChunk::push(&[0xab, 0xcd]).unwrap().to_token(),
            "PUSHDATA(2)[abcd]"
        );
        let chunk = ScriptChunk::push(&[0x11; 76]).unwrap();
        assert_eq!(chunk.to_token(), format!("PUSHDATA1[4c{}]", "11".repeat(76)));
        let chunk = ScriptChunk::push(&[0x22; 256]).unwrap();
        assert_eq!(chunk.to_token(), format!("PUSHDATA2[0001{}]", "22".repeat(256)));
    }

    #[test]
    fn test_token_roundtrip() {
        for chunk in [
            ScriptChunk::opcode(OP_CHECKMULTISIG),
            ScriptChunk::push(&[0x01]).unwrap(),
            ScriptChunk::push(&[0x33; 75]).unwrap(),
            ScriptChunk::push(&[0x44; 200]).unwrap(),
            ScriptChunk::push(&[0x55; 70000]).unwrap(),
        ] {
            assert_eq!(ScriptChunk::from_token(0, &chunk.to_token()).unwrap(), chunk);
        }
    }

    #[test]
    fn test_from_token_rejects_length_mismatch() {
        let err = ScriptChunk::from_token(3, "PUSHDATA(3)[abcd]").unwrap_err();
        assert!(matches!(err, ScriptError::Parse { index: 3, .. }));
        assert!(ScriptChunk::from_token(0, "PUSHDATA(2)[abc]").is_err());
        assert!(ScriptChunk::from_token(0, "PUSHDATA(76)[00]").is_err());
        assert!(ScriptChunk::from_token(0, "PUSHDATA(0)[]").is_err());
        assert!(ScriptChunk::from_token(0, "PUSHDATA1[03abcd]").is_err());
        assert!(ScriptChunk::from_token(0, "PUSHDATA1[01]").is_err());
    }

    #[test]
    fn test_empty_extended_push_tokens() {
        for (bytes, token) in [
            (vec![OP_PUSHDATA1, 0x00], "PUSHDATA1[00]"),
            (vec![OP_PUSHDATA2, 0x00, 0x00], "PUSHDATA2[0000]"),
            (vec![OP_PUSHDATA4, 0x00, 0x00, 0x00, 0x00], "PUSHDATA4[00000000]"),
        ] {
            let chunks = decode_script(&bytes).unwrap();
            assert_eq!(chunks.len(), 1);
            assert_eq!(chunks[0].to_token(), token);

            let parsed = ScriptChunk::from_token(0, token).unwrap();
            assert_eq!(parsed, chunks[0]);
            assert_eq!(encode(&[parsed]), bytes);
        }
    }

    #[test]
    fn test_from_token_rejects_bad_names() {
        assert!(matches!(
            ScriptChunk::from_token(1, "OP_BOGUS"),
            Err(ScriptError::Parse { index: 1, .. })
        ));
        assert!(ScriptChunk::from_token(0, "OP_PUSHDATA1").is_err());
        assert!(ScriptChunk::from_token(0, "OP-DUP").is_err());
        assert_eq!(ScriptChunk::from_token(0, "dup").unwrap().op, OP_DUP);
    }
}
