//! Script chunk parsing and encoding.
//!
//! A script chunk is either an opcode or a data push with its payload.
//! The opcode byte of a data chunk records the push encoding that was
//! used (direct length byte or one of the OP_PUSHDATA forms), so a parsed
//! script re-encodes to exactly the original bytes, non-minimal pushes
//! included.

use crate::opcodes::*;
use crate::ScriptError;

/// A single parsed element of a script.
///
/// Each chunk is either a standalone opcode (like OP_DUP) or a data push
/// carrying the opcode byte and the pushed payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScriptChunk {
    /// The opcode byte. For direct pushes (1-75 bytes) this is the length.
    pub op: u8,
    /// The data payload, if this chunk is a push operation.
    pub data: Option<Vec<u8>>,
}

impl ScriptChunk {
    /// Create an opcode-only chunk.
    ///
    /// # Arguments
    /// * `op` - The opcode byte.
    ///
    /// # Returns
    /// A chunk with no payload.
    pub fn opcode(op: u8) -> Self {
        ScriptChunk { op, data: None }
    }

    /// Create a data chunk with the shortest valid push encoding.
    ///
    /// Empty data maps to OP_0; 1-75 bytes use a direct length byte;
    /// longer payloads use OP_PUSHDATA1/2/4 by size.
    ///
    /// # Arguments
    /// * `data` - The payload bytes.
    ///
    /// # Returns
    /// `Ok(ScriptChunk)`, or `ScriptError::DataTooBig` for payloads the
    /// push encoding cannot represent.
    pub fn push(data: &[u8]) -> Result<Self, ScriptError> {
        let op = match data.len() {
            0 => return Ok(ScriptChunk::opcode(OP_0)),
            n if n < OP_PUSHDATA1 as usize => n as u8,
            n if n < 0x100 => OP_PUSHDATA1,
            n if n < 0x10000 => OP_PUSHDATA2,
            n if n < 0x1_0000_0000 => OP_PUSHDATA4,
            _ => return Err(ScriptError::DataTooBig),
        };
        Ok(ScriptChunk {
            op,
            data: Some(data.to_vec()),
        })
    }

    /// Check whether this chunk carries a data payload.
    ///
    /// # Returns
    /// `true` if the chunk is a push with payload bytes.
    pub fn is_data(&self) -> bool {
        self.data.is_some()
    }

    /// Return the payload bytes of this chunk, if any.
    ///
    /// # Returns
    /// `Some(&[u8])` for data chunks, `None` for opcode-only chunks.
    pub fn payload(&self) -> Option<&[u8]> {
        self.data.as_deref()
    }

    /// Return the encoded byte length of this chunk.
    ///
    /// # Returns
    /// The opcode byte plus any length prefix and payload bytes.
    pub fn encoded_len(&self) -> usize {
        match &self.data {
            None => 1,
            Some(d) => match self.op {
                OP_PUSHDATA1 => 2 + d.len(),
                OP_PUSHDATA2 => 3 + d.len(),
                OP_PUSHDATA4 => 5 + d.len(),
                _ => 1 + d.len(),
            },
        }
    }

    /// Append the wire encoding of this chunk to a byte vector.
    ///
    /// # Arguments
    /// * `out` - The buffer to append to.
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        match &self.data {
            None => out.push(self.op),
            Some(d) => {
                out.push(self.op);
                match self.op {
                    OP_PUSHDATA1 => out.push(d.len() as u8),
                    OP_PUSHDATA2 => out.extend_from_slice(&(d.len() as u16).to_le_bytes()),
                    OP_PUSHDATA4 => out.extend_from_slice(&(d.len() as u32).to_le_bytes()),
                    _ => {}
                }
                out.extend_from_slice(d);
            }
        }
    }

    /// Render this chunk in compact ASM form.
    ///
    /// Data pushes render as bare hex; OP_0 renders as `0` and OP_1NEGATE
    /// as `-1`; other opcodes use their name, unnamed values render as a
    /// bare hex byte.
    ///
    /// # Returns
    /// The ASM token for this chunk.
    pub fn to_asm_string(&self) -> String {
        match &self.data {
            Some(d) => hex::encode(d),
            None => match self.op {
                OP_0 => "0".to_string(),
                OP_1NEGATE => "-1".to_string(),
                op => match opcode_to_string(op) {
                    Some(name) => name.to_string(),
                    None => format!("{:02x}", op),
                },
            },
        }
    }

    /// Render this chunk in verbose string form.
    ///
    /// Data pushes render as `<len> 0x<hex>`, with the OP_PUSHDATA
    /// mnemonic prepended when one was used; opcodes render by name, or
    /// `0x<hex>` for unnamed values.
    ///
    /// # Returns
    /// The verbose token(s) for this chunk.
    pub fn to_verbose_string(&self) -> String {
        match &self.data {
            Some(d) => {
                let payload = format!("{} 0x{}", d.len(), hex::encode(d));
                match self.op {
                    OP_PUSHDATA1 | OP_PUSHDATA2 | OP_PUSHDATA4 => {
                        // PUSHDATA opcodes always have a name.
                        format!("{} {}", opcode_to_string(self.op).unwrap(), payload)
                    }
                    _ => payload,
                }
            }
            None => match opcode_to_string(self.op) {
                Some(name) => name.to_string(),
                None => format!("0x{:02x}", self.op),
            },
        }
    }
}

/// Decode raw script bytes into a vector of `ScriptChunk` values.
///
/// Follows the push-length rules byte by byte: a zero byte is an OP_0
/// chunk, 1-75 reads that many payload bytes, OP_PUSHDATA1/2/4 read a
/// 1/2/4-byte little-endian length followed by the payload, anything
/// else is an opcode-only chunk. Unassigned opcode values decode fine;
/// only a truncated buffer fails.
///
/// # Arguments
/// * `bytes` - The raw script bytes to decode.
///
/// # Returns
/// A vector of parsed chunks, or `ScriptError::InvalidBuffer` if any
/// push runs past the end of the buffer.
pub fn decode_chunks(bytes: &[u8]) -> Result<Vec<ScriptChunk>, ScriptError> {
    let mut chunks = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let op = bytes[pos];
        pos += 1;

        let length = match op {
            OP_0 => {
                chunks.push(ScriptChunk::opcode(op));
                continue;
            }
            OP_PUSHDATA1 => {
                if bytes.len() < pos + 1 {
                    return Err(ScriptError::InvalidBuffer);
                }
                let length = bytes[pos] as usize;
                pos += 1;
                length
            }
            OP_PUSHDATA2 => {
                if bytes.len() < pos + 2 {
                    return Err(ScriptError::InvalidBuffer);
                }
                let length = u16::from_le_bytes([bytes[pos], bytes[pos + 1]]) as usize;
                pos += 2;
                length
            }
            OP_PUSHDATA4 => {
                if bytes.len() < pos + 4 {
                    return Err(ScriptError::InvalidBuffer);
                }
                let length = u32::from_le_bytes([
                    bytes[pos],
                    bytes[pos + 1],
                    bytes[pos + 2],
                    bytes[pos + 3],
                ]) as usize;
                pos += 4;
                length
            }
            op if op < OP_PUSHDATA1 => op as usize,
            _ => {
                chunks.push(ScriptChunk::opcode(op));
                continue;
            }
        };

        if bytes.len() < pos + length {
            return Err(ScriptError::InvalidBuffer);
        }
        chunks.push(ScriptChunk {
            op,
            data: Some(bytes[pos..pos + length].to_vec()),
        });
        pos += length;
    }

    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;

    // -----------------------------------------------------------------------
    // decode_chunks - basic cases
    // -----------------------------------------------------------------------

    /// Decode a script with three direct push chunks and verify count.
    #[test]
    fn test_decode_simple() {
        let bytes = hex::decode("05000102030401ff02abcd").expect("valid hex");
        let parts = decode_chunks(&bytes).expect("should decode");
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].payload().unwrap(), &[0, 1, 2, 3, 4]);
        assert_eq!(parts[1].payload().unwrap(), &[0xff]);
        assert_eq!(parts[2].payload().unwrap(), &[0xab, 0xcd]);
    }

    /// Decode an empty byte slice returns an empty chunk vector.
    #[test]
    fn test_decode_empty() {
        let parts = decode_chunks(&[]).expect("should decode");
        assert!(parts.is_empty());
    }

    /// A zero byte decodes as an OP_0 chunk with no payload.
    #[test]
    fn test_decode_zero_byte() {
        let parts = decode_chunks(&[0x00]).expect("should decode");
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].op, OP_0);
        assert!(parts[0].data.is_none());
    }

    /// Unassigned opcode values decode as opcode-only chunks.
    #[test]
    fn test_decode_unknown_opcode() {
        let parts = decode_chunks(&[0xbd, 0xfe]).expect("should decode");
        assert_eq!(parts.len(), 2);
        assert!(parts.iter().all(|c| c.data.is_none()));
    }

    /// OP_RETURN decodes as a plain opcode chunk; the remainder is parsed
    /// normally.
    #[test]
    fn test_decode_op_return_not_special() {
        let parts = decode_chunks(&[OP_RETURN, 0x02, 0xaa, 0xbb]).expect("should decode");
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].op, OP_RETURN);
        assert!(parts[0].data.is_none());
        assert_eq!(parts[1].payload().unwrap(), &[0xaa, 0xbb]);
    }

    // -----------------------------------------------------------------------
    // decode_chunks - truncation cases
    // -----------------------------------------------------------------------

    /// A truncated direct push fails.
    #[test]
    fn test_decode_truncated_direct_push() {
        // 0x05 says "push 5 bytes" but only 3 follow.
        assert!(decode_chunks(&hex::decode("05000000").unwrap()).is_err());
    }

    /// OP_PUSHDATA1 with a short payload fails.
    #[test]
    fn test_decode_truncated_pushdata1() {
        assert!(decode_chunks(&hex::decode("4c05000000").unwrap()).is_err());
        assert!(decode_chunks(&[OP_PUSHDATA1]).is_err());
    }

    /// OP_PUSHDATA2 missing length bytes fails.
    #[test]
    fn test_decode_truncated_pushdata2() {
        assert!(decode_chunks(&[OP_PUSHDATA2]).is_err());
        assert!(decode_chunks(&[OP_PUSHDATA2, 0x01]).is_err());
    }

    /// OP_PUSHDATA4 missing length bytes fails.
    #[test]
    fn test_decode_truncated_pushdata4() {
        assert!(decode_chunks(&[OP_PUSHDATA4, 0x01, 0x00]).is_err());
    }

    // -----------------------------------------------------------------------
    // Round trip including non-minimal pushes
    // -----------------------------------------------------------------------

    /// A non-minimal OP_PUSHDATA1 push survives a decode/encode round trip.
    #[test]
    fn test_non_minimal_push_roundtrip() {
        // 3 bytes pushed via OP_PUSHDATA1 instead of a direct push.
        let bytes = hex::decode("4c03aabbcc").unwrap();
        let parts = decode_chunks(&bytes).expect("should decode");
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].op, OP_PUSHDATA1);

        let mut out = Vec::new();
        parts[0].encode_into(&mut out);
        assert_eq!(out, bytes);
    }

    /// ScriptChunk::push selects the shortest encoding per size class.
    #[test]
    fn test_push_shortest_encoding() {
        assert_eq!(ScriptChunk::push(&[]).unwrap().op, OP_0);
        assert_eq!(ScriptChunk::push(&[0xaa; 75]).unwrap().op, 75);
        assert_eq!(ScriptChunk::push(&[0xaa; 76]).unwrap().op, OP_PUSHDATA1);
        assert_eq!(ScriptChunk::push(&[0xaa; 255]).unwrap().op, OP_PUSHDATA1);
        assert_eq!(ScriptChunk::push(&[0xaa; 256]).unwrap().op, OP_PUSHDATA2);
        assert_eq!(ScriptChunk::push(&[0xaa; 65536]).unwrap().op, OP_PUSHDATA4);
    }

    /// Encoded length accounts for the push length prefix.
    #[test]
    fn test_encoded_len() {
        assert_eq!(ScriptChunk::opcode(OP_DUP).encoded_len(), 1);
        assert_eq!(ScriptChunk::push(&[0xaa; 5]).unwrap().encoded_len(), 6);
        assert_eq!(ScriptChunk::push(&[0xaa; 80]).unwrap().encoded_len(), 82);
        assert_eq!(ScriptChunk::push(&[0xaa; 300]).unwrap().encoded_len(), 303);
    }

    // -----------------------------------------------------------------------
    // Text forms
    // -----------------------------------------------------------------------

    /// ASM renders data as bare hex and small constants specially.
    #[test]
    fn test_to_asm_string() {
        assert_eq!(ScriptChunk::opcode(OP_0).to_asm_string(), "0");
        assert_eq!(ScriptChunk::opcode(OP_1NEGATE).to_asm_string(), "-1");
        assert_eq!(ScriptChunk::opcode(OP_DUP).to_asm_string(), "OP_DUP");
        assert_eq!(
            ScriptChunk::push(&[0xab; 3]).unwrap().to_asm_string(),
            "ababab"
        );
    }

    /// Verbose form includes lengths and PUSHDATA mnemonics.
    #[test]
    fn test_to_verbose_string() {
        assert_eq!(ScriptChunk::opcode(OP_DUP).to_verbose_string(), "OP_DUP");
        assert_eq!(ScriptChunk::opcode(0xbd).to_verbose_string(), "0xbd");
        assert_eq!(
            ScriptChunk::push(&[0xab; 3]).unwrap().to_verbose_string(),
            "3 0xababab"
        );
        let big = ScriptChunk::push(&[0x11; 80]).unwrap();
        assert!(big
            .to_verbose_string()
            .starts_with("OP_PUSHDATA1 80 0x1111"));
    }
}
