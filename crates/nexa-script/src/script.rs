//! The Script type - an ordered sequence of opcode/push-data chunks.
//!
//! Scripts appear in transaction outputs (locking conditions) and inputs
//! (satisfiers). The type provides binary and textual codecs plus the
//! structural classifiers that sort output scripts into the known shapes:
//! pay-to-public-key-hash, pay-to-public-key-template (well-known
//! template 1), pay-to-script-template, data carrier, and token
//! description.

use std::fmt;
use std::str::FromStr;

use num_bigint::BigInt;
use serde::Deserialize;

use crate::chunk::{decode_chunks, ScriptChunk};
use crate::opcodes::*;
use crate::script_num::encode_int;
use crate::ScriptError;

/// Maximum serialized length of a data-carrier output script.
pub const MAX_DATA_CARRIER_BYTES: usize = 223;

/// A script, represented as a vector of parsed chunks.
///
/// Chunks preserve the push encoding they were parsed with, so
/// `from_bytes` followed by `to_bytes` reproduces the input exactly,
/// non-minimal pushes included. The script owns its chunks; payload
/// buffers are not mutated after parsing.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Script {
    chunks: Vec<ScriptChunk>,
}

impl Script {
    // -----------------------------------------------------------------------
    // Constructors
    // -----------------------------------------------------------------------

    /// Create a new empty script.
    ///
    /// # Returns
    /// An empty `Script` instance.
    pub fn new() -> Self {
        Script { chunks: Vec::new() }
    }

    /// Create a script from already-parsed chunks.
    ///
    /// # Arguments
    /// * `chunks` - The chunk sequence.
    ///
    /// # Returns
    /// A `Script` owning the given chunks.
    pub fn from_chunks(chunks: Vec<ScriptChunk>) -> Self {
        Script { chunks }
    }

    /// Parse a script from raw bytes.
    ///
    /// Unassigned opcode values parse fine; only a push that runs past
    /// the end of the buffer fails.
    ///
    /// # Arguments
    /// * `bytes` - The raw script bytes.
    ///
    /// # Returns
    /// `Ok(Script)`, or `ScriptError::InvalidBuffer` for truncated input.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ScriptError> {
        Ok(Script {
            chunks: decode_chunks(bytes)?,
        })
    }

    /// Parse a script from a hex-encoded string.
    ///
    /// # Arguments
    /// * `hex_str` - A hex string (e.g. "76a914...88ac").
    ///
    /// # Returns
    /// `Ok(Script)`, or an error if the hex or the buffer is invalid.
    pub fn from_hex(hex_str: &str) -> Result<Self, ScriptError> {
        let bytes =
            hex::decode(hex_str).map_err(|e| ScriptError::InvalidHex(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    /// Parse a script from its verbose string form.
    ///
    /// The verbose form is the `Display` output: opcodes by name, data
    /// pushes as `<len> 0x<hex>` with OP_PUSHDATA mnemonics included.
    ///
    /// # Arguments
    /// * `text` - The verbose script string.
    ///
    /// # Returns
    /// `Ok(Script)`, or an error if a token cannot be interpreted.
    pub fn from_string(text: &str) -> Result<Self, ScriptError> {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        let mut chunks = Vec::new();
        let mut i = 0;
        while i < tokens.len() {
            let token = tokens[i];
            if let Some(op) = string_to_opcode(token) {
                if matches!(op, OP_PUSHDATA1 | OP_PUSHDATA2 | OP_PUSHDATA4) {
                    let (len_tok, data_tok) = match (tokens.get(i + 1), tokens.get(i + 2)) {
                        (Some(l), Some(d)) => (*l, *d),
                        _ => {
                            return Err(ScriptError::InvalidScript(format!(
                                "{} missing length or data token",
                                token
                            )))
                        }
                    };
                    let data = Self::parse_data_token(len_tok, data_tok)?;
                    chunks.push(ScriptChunk {
                        op,
                        data: Some(data),
                    });
                    i += 3;
                } else {
                    chunks.push(ScriptChunk::opcode(op));
                    i += 1;
                }
            } else if let Some(hex_op) = token.strip_prefix("0x").and_then(|h| {
                // A bare 0x-prefixed byte is an unnamed opcode.
                if h.len() == 2 {
                    u8::from_str_radix(h, 16).ok()
                } else {
                    None
                }
            }) {
                chunks.push(ScriptChunk::opcode(hex_op));
                i += 1;
            } else if let Ok(length) = token.parse::<u32>() {
                if length == 0 || length >= OP_PUSHDATA1 as u32 {
                    return Err(ScriptError::InvalidScript(format!(
                        "could not determine type of script value: {}",
                        token
                    )));
                }
                let data_tok = tokens.get(i + 1).ok_or_else(|| {
                    ScriptError::InvalidScript("push length missing data token".to_string())
                })?;
                let data = Self::parse_data_token(token, data_tok)?;
                chunks.push(ScriptChunk {
                    op: length as u8,
                    data: Some(data),
                });
                i += 2;
            } else {
                return Err(ScriptError::InvalidScript(format!(
                    "could not determine type of script value: {}",
                    token
                )));
            }
        }
        Ok(Script { chunks })
    }

    /// Parse a `<len>` + `0x<hex>` token pair into payload bytes.
    fn parse_data_token(len_tok: &str, data_tok: &str) -> Result<Vec<u8>, ScriptError> {
        let length: usize = len_tok.parse().map_err(|_| {
            ScriptError::InvalidScript(format!("invalid push length: {}", len_tok))
        })?;
        let hex_str = data_tok.strip_prefix("0x").ok_or_else(|| {
            ScriptError::InvalidScript(format!("push data must start with 0x: {}", data_tok))
        })?;
        let data = hex::decode(hex_str)
            .map_err(|e| ScriptError::InvalidHex(e.to_string()))?;
        if data.len() != length {
            return Err(ScriptError::InvalidScript(format!(
                "push length {} does not match data length {}",
                length,
                data.len()
            )));
        }
        Ok(data)
    }

    /// Parse a script from its compact ASM form.
    ///
    /// Known opcode names are emitted directly, `0` and `-1` map to the
    /// small-constant opcodes, and any other token is treated as hex push
    /// data encoded with the shortest valid push.
    ///
    /// # Arguments
    /// * `asm` - A space-separated ASM string.
    ///
    /// # Returns
    /// `Ok(Script)`, or an error if any token is invalid.
    pub fn from_asm(asm: &str) -> Result<Self, ScriptError> {
        let mut script = Script::new();
        for token in asm.split_whitespace() {
            match token {
                "0" => {
                    script.add_opcode(OP_0);
                }
                "-1" => {
                    script.add_opcode(OP_1NEGATE);
                }
                _ => {
                    if let Some(op) = string_to_opcode(token) {
                        script.add_opcode(op);
                    } else {
                        let data = hex::decode(token)
                            .map_err(|e| ScriptError::InvalidHex(e.to_string()))?;
                        script.add_data(&data)?;
                    }
                }
            }
        }
        Ok(script)
    }

    // -----------------------------------------------------------------------
    // Serialization
    // -----------------------------------------------------------------------

    /// Serialize the script to raw bytes.
    ///
    /// Exact inverse of `from_bytes` for any buffer that parses.
    ///
    /// # Returns
    /// The wire-format script bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.byte_len());
        for chunk in &self.chunks {
            chunk.encode_into(&mut out);
        }
        out
    }

    /// Serialize the script as a lowercase hex string.
    ///
    /// # Returns
    /// A hex representation of the script bytes.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Render the script in compact ASM form.
    ///
    /// Data pushes appear as bare hex, OP_0 as `0`, OP_1NEGATE as `-1`,
    /// and OP_PUSHDATA mnemonics are omitted.
    ///
    /// # Returns
    /// A space-separated ASM string; empty for an empty script.
    pub fn to_asm(&self) -> String {
        let parts: Vec<String> = self
            .chunks
            .iter()
            .map(|c| c.to_asm_string())
            .filter(|s| !s.is_empty())
            .collect();
        parts.join(" ")
    }

    /// Return the serialized byte length of the script.
    ///
    /// # Returns
    /// The number of bytes `to_bytes` would produce.
    pub fn byte_len(&self) -> usize {
        self.chunks.iter().map(|c| c.encoded_len()).sum()
    }

    /// Check if the script has no chunks.
    ///
    /// # Returns
    /// `true` for the empty script.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Return the parsed chunk sequence.
    ///
    /// # Returns
    /// A slice of the script's chunks.
    pub fn chunks(&self) -> &[ScriptChunk] {
        &self.chunks
    }

    // -----------------------------------------------------------------------
    // Building
    // -----------------------------------------------------------------------

    /// Append a data push, wrapped with the shortest valid push opcode.
    ///
    /// # Arguments
    /// * `data` - The payload bytes.
    ///
    /// # Returns
    /// `Ok(&mut Self)` for chaining, or `ScriptError::DataTooBig`.
    pub fn add_data(&mut self, data: &[u8]) -> Result<&mut Self, ScriptError> {
        let chunk = ScriptChunk::push(data)?;
        self.chunks.push(chunk);
        Ok(self)
    }

    /// Prepend a data push, wrapped with the shortest valid push opcode.
    ///
    /// # Arguments
    /// * `data` - The payload bytes.
    ///
    /// # Returns
    /// `Ok(&mut Self)` for chaining, or `ScriptError::DataTooBig`.
    pub fn prepend_data(&mut self, data: &[u8]) -> Result<&mut Self, ScriptError> {
        let chunk = ScriptChunk::push(data)?;
        self.chunks.insert(0, chunk);
        Ok(self)
    }

    /// Append an opcode by value.
    ///
    /// # Arguments
    /// * `op` - The opcode byte.
    ///
    /// # Returns
    /// `&mut Self` for chaining.
    pub fn add_opcode(&mut self, op: u8) -> &mut Self {
        self.chunks.push(ScriptChunk::opcode(op));
        self
    }

    /// Prepend an opcode by value.
    ///
    /// # Arguments
    /// * `op` - The opcode byte.
    ///
    /// # Returns
    /// `&mut Self` for chaining.
    pub fn prepend_opcode(&mut self, op: u8) -> &mut Self {
        self.chunks.insert(0, ScriptChunk::opcode(op));
        self
    }

    /// Append an opcode by name.
    ///
    /// # Arguments
    /// * `name` - The `OP_xxx` name (aliases accepted).
    ///
    /// # Returns
    /// `Ok(&mut Self)` for chaining, or `ScriptError::UnknownOpcode`.
    pub fn add_opcode_name(&mut self, name: &str) -> Result<&mut Self, ScriptError> {
        let op = string_to_opcode(name)
            .ok_or_else(|| ScriptError::UnknownOpcode(name.to_string()))?;
        Ok(self.add_opcode(op))
    }

    /// Append an integer.
    ///
    /// Values in -1..=16 map to their dedicated single opcodes; anything
    /// else is pushed as a minimal script-number buffer.
    ///
    /// # Arguments
    /// * `value` - The integer to append.
    ///
    /// # Returns
    /// `&mut Self` for chaining.
    pub fn add_int(&mut self, value: i64) -> &mut Self {
        match small_int_to_op(value) {
            Some(op) => self.add_opcode(op),
            None => {
                let data = encode_int(value);
                // At most 9 bytes, always a direct push.
                self.chunks.push(ScriptChunk {
                    op: data.len() as u8,
                    data: Some(data),
                });
                self
            }
        }
    }

    /// Prepend an integer, with the same encoding rules as `add_int`.
    ///
    /// # Arguments
    /// * `value` - The integer to prepend.
    ///
    /// # Returns
    /// `&mut Self` for chaining.
    pub fn prepend_int(&mut self, value: i64) -> &mut Self {
        match small_int_to_op(value) {
            Some(op) => self.prepend_opcode(op),
            None => {
                let data = encode_int(value);
                self.chunks.insert(
                    0,
                    ScriptChunk {
                        op: data.len() as u8,
                        data: Some(data),
                    },
                );
                self
            }
        }
    }

    /// Append an arbitrary-precision integer as a minimal script-number push.
    ///
    /// # Arguments
    /// * `value` - The integer to append.
    ///
    /// # Returns
    /// `Ok(&mut Self)` for chaining, or `ScriptError::DataTooBig`.
    pub fn add_bignum(&mut self, value: &BigInt) -> Result<&mut Self, ScriptError> {
        let data = crate::script_num::encode_bignum(value);
        self.add_data(&data)
    }

    /// Append a boolean as its canonical opcode (OP_TRUE / OP_FALSE).
    ///
    /// # Arguments
    /// * `value` - The boolean to append.
    ///
    /// # Returns
    /// `&mut Self` for chaining.
    pub fn add_bool(&mut self, value: bool) -> &mut Self {
        self.add_opcode(if value { OP_TRUE } else { OP_FALSE })
    }

    /// Append another script's chunks to this one.
    ///
    /// # Arguments
    /// * `other` - The script whose chunks to append.
    ///
    /// # Returns
    /// `&mut Self` for chaining.
    pub fn add_script(&mut self, other: &Script) -> &mut Self {
        self.chunks.extend(other.chunks.iter().cloned());
        self
    }

    /// Prepend another script's chunks to this one.
    ///
    /// # Arguments
    /// * `other` - The script whose chunks to prepend.
    ///
    /// # Returns
    /// `&mut Self` for chaining.
    pub fn prepend_script(&mut self, other: &Script) -> &mut Self {
        let mut chunks = other.chunks.clone();
        chunks.append(&mut self.chunks);
        self.chunks = chunks;
        self
    }

    // -----------------------------------------------------------------------
    // Push analysis
    // -----------------------------------------------------------------------

    /// Check whether every chunk is a push (data pushes and small-integer
    /// opcodes only).
    ///
    /// # Returns
    /// `true` if no chunk has an opcode above OP_16.
    pub fn is_push_only(&self) -> bool {
        self.chunks.iter().all(|c| c.op <= OP_16)
    }

    /// Check whether the chunk at `index` uses the shortest possible push
    /// encoding for its payload.
    ///
    /// A single payload byte in 1..=16 always reports non-minimal here
    /// because a dedicated small-integer opcode exists for it; chunks
    /// built from those opcodes carry no payload and report minimal.
    ///
    /// # Arguments
    /// * `index` - The chunk index to check.
    ///
    /// # Returns
    /// `Ok(bool)`, or `ScriptError::IndexOutOfRange`.
    pub fn check_minimal_push(&self, index: usize) -> Result<bool, ScriptError> {
        let chunk = self
            .chunks
            .get(index)
            .ok_or(ScriptError::IndexOutOfRange)?;
        let data = match &chunk.data {
            None => return Ok(true),
            Some(d) => d,
        };
        let minimal = match data.len() {
            0 => chunk.op == OP_0,
            1 if (1..=16).contains(&data[0]) => false,
            n if n <= 75 => chunk.op as usize == n,
            n if n <= 255 => chunk.op == OP_PUSHDATA1,
            n if n <= 65535 => chunk.op == OP_PUSHDATA2,
            _ => true,
        };
        Ok(minimal)
    }

    // -----------------------------------------------------------------------
    // Structural classifiers
    // -----------------------------------------------------------------------

    /// Check for the pay-to-public-key-hash output shape:
    /// `OP_DUP OP_HASH160 <20 bytes> OP_EQUALVERIFY OP_CHECKSIG`.
    ///
    /// # Returns
    /// `true` if the script matches exactly.
    pub fn is_public_key_hash_out(&self) -> bool {
        let c = &self.chunks;
        c.len() == 5
            && c[0] == ScriptChunk::opcode(OP_DUP)
            && c[1] == ScriptChunk::opcode(OP_HASH160)
            && c[2].payload().map(|d| d.len()) == Some(20)
            && c[3] == ScriptChunk::opcode(OP_EQUALVERIFY)
            && c[4] == ScriptChunk::opcode(OP_CHECKSIG)
    }

    /// Check for the pay-to-public-key-hash input shape: a signature push
    /// followed by a public key push (65 bytes with an 0x04/0x06/0x07
    /// prefix, or 33 bytes with an 0x02/0x03 prefix).
    ///
    /// # Returns
    /// `true` if the script matches.
    pub fn is_public_key_hash_in(&self) -> bool {
        let c = &self.chunks;
        if c.len() != 2 {
            return false;
        }
        let sig_ok = c[0].payload().map(|d| !d.is_empty()).unwrap_or(false);
        let key_ok = match c[1].payload() {
            Some(key) if key.len() == 65 => matches!(key[0], 0x04 | 0x06 | 0x07),
            Some(key) if key.len() == 33 => matches!(key[0], 0x02 | 0x03),
            _ => false,
        };
        sig_ok && key_ok
    }

    /// Split off the leading group annotation of a template output.
    ///
    /// The group slot is either a bare OP_0 (ungrouped) or a pair of
    /// pushes: a group identifier of at least 32 bytes and a 2-8 byte
    /// group amount. Returns the chunks after the group slot, or `None`
    /// if the slot is malformed.
    fn template_body(&self) -> Option<&[ScriptChunk]> {
        match self.chunks.first() {
            Some(first) if first.op == OP_0 && first.data.is_none() => Some(&self.chunks[1..]),
            Some(first) => {
                let group_len = first.payload()?.len();
                if group_len < 32 {
                    return None;
                }
                let amount_len = self.chunks.get(1)?.payload()?.len();
                if !(2..=8).contains(&amount_len) {
                    return None;
                }
                Some(&self.chunks[2..])
            }
            None => None,
        }
    }

    /// Check for the pay-to-public-key-template output shape (well-known
    /// template 1): an optional group annotation, the OP_1 template
    /// selector, and a 20-byte constraint hash push.
    ///
    /// # Returns
    /// `true` if the script matches (3 chunks ungrouped, 4 grouped).
    pub fn is_public_key_template_out(&self) -> bool {
        match self.template_body() {
            Some(body) => {
                body.len() == 2
                    && body[0] == ScriptChunk::opcode(OP_1)
                    && body[1].payload().map(|d| d.len()) == Some(20)
            }
            None => false,
        }
    }

    /// Check for the pay-to-public-key-template input shape: a 34-byte
    /// push that itself decodes to a single 33-byte compressed public key
    /// push, followed by a 64-68 byte signature push.
    ///
    /// # Returns
    /// `true` if the script matches.
    pub fn is_public_key_template_in(&self) -> bool {
        let c = &self.chunks;
        if c.len() != 2 {
            return false;
        }
        let constraint_ok = match c[0].payload() {
            Some(constraint) if constraint.len() == 34 => {
                match decode_chunks(constraint) {
                    Ok(inner) => {
                        inner.len() == 1
                            && match inner[0].payload() {
                                Some(key) => key.len() == 33 && matches!(key[0], 0x02 | 0x03),
                                None => false,
                            }
                    }
                    Err(_) => false,
                }
            }
            _ => false,
        };
        let sig_ok = match c[1].payload() {
            Some(sig) => (64..=68).contains(&sig.len()),
            None => false,
        };
        constraint_ok && sig_ok
    }

    /// Check for the generic pay-to-script-template output shape: an
    /// optional group annotation, a 20- or 32-byte template hash push, a
    /// 20-byte constraint hash push or the OP_FALSE no-constraint marker,
    /// and any number of push-only visible arguments.
    ///
    /// The well-known-template selector opcode is not a data push, so a
    /// pay-to-public-key-template output never also matches this shape.
    ///
    /// # Returns
    /// `true` if the script matches.
    pub fn is_script_template_out(&self) -> bool {
        let body = match self.template_body() {
            Some(body) => body,
            None => return false,
        };
        if body.len() < 2 {
            return false;
        }
        let template_ok = matches!(body[0].payload().map(|d| d.len()), Some(20) | Some(32));
        let constraint_ok = (body[1].op == OP_0 && body[1].data.is_none())
            || body[1].payload().map(|d| d.len()) == Some(20);
        template_ok && constraint_ok && body[2..].iter().all(|c| c.op <= OP_16)
    }

    /// Check for the generic pay-to-script-template input shape: a leading
    /// data push (the template script) and a push-only chunk sequence.
    ///
    /// # Returns
    /// `true` if the script matches.
    pub fn is_script_template_in(&self) -> bool {
        match self.chunks.first() {
            Some(first) => first.is_data() && self.is_push_only(),
            None => false,
        }
    }

    /// Check for the data-carrier output shape: a leading OP_RETURN,
    /// a serialized length of at most 223 bytes, and push-only payload
    /// chunks.
    ///
    /// # Returns
    /// `true` if the script matches.
    pub fn is_data_out(&self) -> bool {
        match self.chunks.first() {
            Some(first) => {
                first.op == OP_RETURN
                    && first.data.is_none()
                    && self.byte_len() <= MAX_DATA_CARRIER_BYTES
                    && self.chunks[1..].iter().all(|c| c.op <= OP_16)
            }
            None => false,
        }
    }

    /// Check for the token-description output shape: a data carrier whose
    /// chunk after the OP_RETURN marker is exactly a 4-byte push (the
    /// group identifier type tag), with 2 to 7 chunks in total.
    ///
    /// # Returns
    /// `true` if the script matches.
    pub fn is_token_description_out(&self) -> bool {
        self.is_data_out()
            && (2..=7).contains(&self.chunks.len())
            && self
                .chunks
                .get(1)
                .and_then(|c| c.payload())
                .map(|d| d.len())
                == Some(4)
    }

    // -----------------------------------------------------------------------
    // Data extraction
    // -----------------------------------------------------------------------

    /// Extract the 20-byte public key hash from a P2PKH output script.
    ///
    /// # Returns
    /// The hash bytes, or `ScriptError::NotPublicKeyHashOut` if the script
    /// is not a P2PKH output.
    pub fn get_public_key_hash(&self) -> Result<Vec<u8>, ScriptError> {
        if !self.is_public_key_hash_out() {
            return Err(ScriptError::NotPublicKeyHashOut);
        }
        Ok(self.chunks[2].payload().expect("classified push").to_vec())
    }

    /// Extract the committed template hash from a pay-to-script-template
    /// output (20 or 32 bytes).
    ///
    /// # Returns
    /// The hash bytes, or `ScriptError::NotTemplateOut` if the script is
    /// not a generic template output.
    pub fn get_template_hash(&self) -> Result<Vec<u8>, ScriptError> {
        if !self.is_script_template_out() {
            return Err(ScriptError::NotTemplateOut);
        }
        let body = self.template_body().expect("classified template");
        Ok(body[0].payload().expect("classified push").to_vec())
    }

    /// Extract the committed constraint hash from a template output.
    ///
    /// # Returns
    /// `Ok(Some(hash))` for a real 20-byte constraint commitment,
    /// `Ok(None)` for the no-constraint marker, or
    /// `ScriptError::NotTemplateOut` for non-template scripts.
    pub fn get_constraint_hash(&self) -> Result<Option<Vec<u8>>, ScriptError> {
        if self.is_public_key_template_out() {
            let body = self.template_body().expect("classified template");
            return Ok(Some(body[1].payload().expect("classified push").to_vec()));
        }
        if self.is_script_template_out() {
            let body = self.template_body().expect("classified template");
            return Ok(body[1].payload().map(|d| d.to_vec()));
        }
        Err(ScriptError::NotTemplateOut)
    }

    /// Extract the group annotation from a template output.
    ///
    /// # Returns
    /// `Ok(Some((group_id, amount)))` for grouped outputs, `Ok(None)` for
    /// ungrouped ones, or `ScriptError::NotTemplateOut` for non-template
    /// scripts.
    pub fn get_group_data(&self) -> Result<Option<(Vec<u8>, u64)>, ScriptError> {
        if !self.is_public_key_template_out() && !self.is_script_template_out() {
            return Err(ScriptError::NotTemplateOut);
        }
        let first = &self.chunks[0];
        if first.data.is_none() {
            return Ok(None);
        }
        let group_id = first.payload().expect("classified push").to_vec();
        let amount_bytes = self.chunks[1].payload().expect("classified push");
        let mut amount_le = [0u8; 8];
        amount_le[..amount_bytes.len()].copy_from_slice(amount_bytes);
        Ok(Some((group_id, u64::from_le_bytes(amount_le))))
    }

    /// Extract the group identifier type tag from a token description
    /// output.
    ///
    /// # Returns
    /// The little-endian u32 tag, or `ScriptError::NotTokenDescriptionOut`.
    pub fn get_group_id_type(&self) -> Result<u32, ScriptError> {
        if !self.is_token_description_out() {
            return Err(ScriptError::NotTokenDescriptionOut);
        }
        let tag = self.chunks[1].payload().expect("classified push");
        Ok(u32::from_le_bytes([tag[0], tag[1], tag[2], tag[3]]))
    }
}

impl fmt::Display for Script {
    /// Display the script in its verbose string form.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.chunks.iter().map(|c| c.to_verbose_string()).collect();
        write!(f, "{}", parts.join(" "))
    }
}

impl fmt::Debug for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Script({})", self.to_hex())
    }
}

impl FromStr for Script {
    type Err = ScriptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Script::from_string(s)
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

#[cfg(test)]
mod tests {
    //! Tests for the Script type.
    //!
    //! Covers binary/hex/string/ASM codecs, the structural classifiers
    //! for each known script shape, accessor error behavior, element
    //! appending, and the minimal-push check.

    use super::*;

    const P2PKH_HEX: &str = "76a914f4c03610e60ad15100929cc23da2f3a799af172588ac";

    // -----------------------------------------------------------------------
    // Binary and hex codecs
    // -----------------------------------------------------------------------

    /// A P2PKH output decodes to five chunks and round-trips through hex.
    #[test]
    fn test_from_hex_roundtrip() {
        let script = Script::from_hex(P2PKH_HEX).expect("valid hex should parse");
        assert_eq!(script.chunks().len(), 5);
        assert_eq!(script.to_hex(), P2PKH_HEX);
    }

    /// A truncated push fails with the invalid-buffer parse error.
    #[test]
    fn test_from_bytes_truncated() {
        let err = Script::from_bytes(&[0x05, 0x01]).unwrap_err();
        assert!(matches!(err, ScriptError::InvalidBuffer));
    }

    /// Unassigned opcode values parse without error.
    #[test]
    fn test_from_bytes_unknown_opcodes() {
        let script = Script::from_bytes(&[0xbd, 0xd0, 0xee]).expect("should parse");
        assert_eq!(script.chunks().len(), 3);
        assert_eq!(script.to_bytes(), vec![0xbd, 0xd0, 0xee]);
    }

    /// Non-minimal pushes survive the byte round trip unchanged.
    #[test]
    fn test_non_minimal_roundtrip() {
        let bytes = hex::decode("4c03aabbcc4d0200ddee").unwrap();
        let script = Script::from_bytes(&bytes).expect("should parse");
        assert_eq!(script.to_bytes(), bytes);
    }

    // -----------------------------------------------------------------------
    // Text forms
    // -----------------------------------------------------------------------

    /// ASM output for the P2PKH example matches the reference formatter.
    #[test]
    fn test_to_asm_p2pkh() {
        let script = Script::from_hex(P2PKH_HEX).expect("valid hex");
        assert_eq!(
            script.to_asm(),
            "OP_DUP OP_HASH160 f4c03610e60ad15100929cc23da2f3a799af1725 OP_EQUALVERIFY OP_CHECKSIG"
        );
    }

    /// The verbose form prints data pushes as `<len> 0x<hex>`.
    #[test]
    fn test_display_verbose() {
        let script = Script::from_hex(P2PKH_HEX).expect("valid hex");
        assert_eq!(
            script.to_string(),
            "OP_DUP OP_HASH160 20 0xf4c03610e60ad15100929cc23da2f3a799af1725 OP_EQUALVERIFY OP_CHECKSIG"
        );
    }

    /// The verbose form includes OP_PUSHDATA mnemonics and parses back.
    #[test]
    fn test_verbose_pushdata_roundtrip() {
        let mut script = Script::new();
        script.add_data(&[0x11; 80]).unwrap();
        let text = script.to_string();
        assert!(text.starts_with("OP_PUSHDATA1 80 0x1111"));
        let parsed = Script::from_string(&text).expect("should parse");
        assert_eq!(parsed, script);
    }

    /// Verbose round trip for every chunk flavor.
    #[test]
    fn test_verbose_roundtrip() {
        let mut script = Script::new();
        script
            .add_opcode(OP_DUP)
            .add_opcode(0xbd)
            .add_int(-1)
            .add_int(0);
        script.add_data(&[0xab; 3]).unwrap();
        let parsed = Script::from_string(&script.to_string()).expect("should parse");
        assert_eq!(parsed, script);
    }

    /// ASM parses names, bare hex, and the 0/-1 constants.
    #[test]
    fn test_from_asm() {
        let script = Script::from_asm(
            "OP_DUP OP_HASH160 f4c03610e60ad15100929cc23da2f3a799af1725 OP_EQUALVERIFY OP_CHECKSIG",
        )
        .expect("should parse");
        assert_eq!(script.to_hex(), P2PKH_HEX);

        let constants = Script::from_asm("0 -1 OP_TRUE").expect("should parse");
        assert_eq!(constants.to_bytes(), vec![OP_0, OP_1NEGATE, OP_1]);
    }

    /// Empty strings parse to the empty script in both text forms.
    #[test]
    fn test_empty_text_forms() {
        assert!(Script::from_asm("").expect("should parse").is_empty());
        assert!(Script::from_string("").expect("should parse").is_empty());
        assert_eq!(Script::new().to_asm(), "");
        assert_eq!(Script::new().to_string(), "");
    }

    /// Garbage tokens are rejected.
    #[test]
    fn test_from_string_garbage() {
        assert!(Script::from_string("NOT_AN_OPCODE").is_err());
        assert!(Script::from_string("3 aabbcc").is_err());
        assert!(Script::from_string("3 0xaabb").is_err());
        assert!(Script::from_asm("zzzz").is_err());
    }

    // -----------------------------------------------------------------------
    // Classifiers
    // -----------------------------------------------------------------------

    /// Scenario: the P2PKH example classifies as a P2PKH output only.
    #[test]
    fn test_is_public_key_hash_out() {
        let script = Script::from_hex(P2PKH_HEX).expect("valid hex");
        assert!(script.is_public_key_hash_out());
        assert!(!script.is_public_key_template_out());
        assert!(!script.is_script_template_out());
        assert!(!script.is_data_out());
    }

    /// A P2PKH input is a signature push and a pubkey push.
    #[test]
    fn test_is_public_key_hash_in() {
        let mut script = Script::new();
        script.add_data(&[0x30; 70]).unwrap();
        let mut key = vec![0x02];
        key.extend_from_slice(&[0x11; 32]);
        script.add_data(&key).unwrap();
        assert!(script.is_public_key_hash_in());

        // A 65-byte uncompressed key with a valid prefix also matches.
        let mut script = Script::new();
        script.add_data(&[0x30; 70]).unwrap();
        let mut key = vec![0x04];
        key.extend_from_slice(&[0x11; 64]);
        script.add_data(&key).unwrap();
        assert!(script.is_public_key_hash_in());

        // Wrong prefix byte does not.
        let mut script = Script::new();
        script.add_data(&[0x30; 70]).unwrap();
        let mut key = vec![0x05];
        key.extend_from_slice(&[0x11; 32]);
        script.add_data(&key).unwrap();
        assert!(!script.is_public_key_hash_in());
    }

    /// Ungrouped P2PKT output: OP_FALSE OP_1 <20-byte hash>, 3 chunks.
    #[test]
    fn test_is_public_key_template_out() {
        let mut script = Script::new();
        script.add_opcode(OP_FALSE).add_opcode(OP_1);
        script.add_data(&[0xaa; 20]).unwrap();
        assert!(script.is_public_key_template_out());
        assert_eq!(script.chunks().len(), 3);
        assert_eq!(script.to_hex(), format!("005114{}", "aa".repeat(20)));

        // A generic template classifier must not also match.
        assert!(!script.is_script_template_out());
        assert_eq!(script.get_group_data().unwrap(), None);
    }

    /// Grouped P2PKT output: group id + amount + OP_1 + hash, 4 chunks.
    #[test]
    fn test_is_public_key_template_out_grouped() {
        let mut script = Script::new();
        script.add_data(&[0x22; 32]).unwrap();
        script.add_data(&[0x10, 0x27]).unwrap(); // amount 10000
        script.add_opcode(OP_1);
        script.add_data(&[0xaa; 20]).unwrap();
        assert!(script.is_public_key_template_out());
        assert_eq!(script.chunks().len(), 4);
        assert_eq!(
            script.get_group_data().unwrap(),
            Some((vec![0x22; 32], 10000))
        );
    }

    /// A malformed group amount push breaks the template shape.
    #[test]
    fn test_template_bad_group_amount() {
        let mut script = Script::new();
        script.add_data(&[0x22; 32]).unwrap();
        script.add_data(&[0x01; 9]).unwrap(); // amount push too long
        script.add_opcode(OP_1);
        script.add_data(&[0xaa; 20]).unwrap();
        assert!(!script.is_public_key_template_out());
        assert!(!script.is_script_template_out());
    }

    /// Generic P2ST output with a constraint hash and visible args.
    #[test]
    fn test_is_script_template_out() {
        let mut script = Script::new();
        script.add_opcode(OP_FALSE);
        script.add_data(&[0xbb; 20]).unwrap(); // template hash
        script.add_data(&[0xcc; 20]).unwrap(); // constraint hash
        script.add_data(b"arg").unwrap();
        script.add_int(7);
        assert!(script.is_script_template_out());
        assert!(!script.is_public_key_template_out());
        assert_eq!(script.get_template_hash().unwrap(), vec![0xbb; 20]);
        assert_eq!(script.get_constraint_hash().unwrap(), Some(vec![0xcc; 20]));
    }

    /// Generic P2ST output with the no-constraint marker and a 32-byte
    /// template hash.
    #[test]
    fn test_is_script_template_out_no_constraint() {
        let mut script = Script::new();
        script.add_opcode(OP_FALSE);
        script.add_data(&[0xbb; 32]).unwrap();
        script.add_opcode(OP_FALSE);
        assert!(script.is_script_template_out());
        assert_eq!(script.get_constraint_hash().unwrap(), None);
    }

    /// A non-push visible argument breaks the template shape.
    #[test]
    fn test_script_template_out_non_push_arg() {
        let mut script = Script::new();
        script.add_opcode(OP_FALSE);
        script.add_data(&[0xbb; 20]).unwrap();
        script.add_data(&[0xcc; 20]).unwrap();
        script.add_opcode(OP_DUP);
        assert!(!script.is_script_template_out());
    }

    /// P2ST input: leading template push, all chunks push-only.
    #[test]
    fn test_is_script_template_in() {
        let mut script = Script::new();
        script.add_data(&[0x51, 0x52]).unwrap();
        script.add_data(b"satisfier").unwrap();
        script.add_int(3);
        assert!(script.is_script_template_in());

        let mut script = Script::new();
        script.add_data(&[0x51]).unwrap();
        script.add_opcode(OP_DUP);
        assert!(!script.is_script_template_in());

        let mut script = Script::new();
        script.add_opcode(OP_1);
        assert!(!script.is_script_template_in(), "first chunk must be a data push");
    }

    /// P2PKT input: pushed pubkey-push script plus a signature push.
    #[test]
    fn test_is_public_key_template_in() {
        let mut constraint = vec![0x21, 0x02];
        constraint.extend_from_slice(&[0x11; 32]);
        let mut script = Script::new();
        script.add_data(&constraint).unwrap();
        script.add_data(&[0x55; 64]).unwrap();
        assert!(script.is_public_key_template_in());

        // 68-byte satisfier (signature + sighash bytes) still matches.
        let mut script = Script::new();
        script.add_data(&constraint).unwrap();
        script.add_data(&[0x55; 68]).unwrap();
        assert!(script.is_public_key_template_in());

        // An uncompressed key prefix inside the constraint does not.
        let mut bad = vec![0x21, 0x05];
        bad.extend_from_slice(&[0x11; 32]);
        let mut script = Script::new();
        script.add_data(&bad).unwrap();
        script.add_data(&[0x55; 64]).unwrap();
        assert!(!script.is_public_key_template_in());

        // An over-long signature push does not.
        let mut script = Script::new();
        script.add_data(&constraint).unwrap();
        script.add_data(&[0x55; 69]).unwrap();
        assert!(!script.is_public_key_template_in());
    }

    /// Data carrier: OP_RETURN followed by pushes, within the size cap.
    #[test]
    fn test_is_data_out() {
        let mut script = Script::new();
        script.add_opcode(OP_RETURN);
        script.add_data(b"hello world!!!").unwrap();
        assert!(script.is_data_out());
        assert_eq!(
            script.to_string(),
            "OP_RETURN 14 0x68656c6c6f20776f726c64212121"
        );

        // A non-push chunk after the marker disqualifies it.
        let mut script = Script::new();
        script.add_opcode(OP_RETURN).add_opcode(OP_DUP);
        assert!(!script.is_data_out());
    }

    /// Data carrier over 223 serialized bytes is rejected.
    #[test]
    fn test_is_data_out_size_cap() {
        let mut script = Script::new();
        script.add_opcode(OP_RETURN);
        script.add_data(&[0xaa; 220]).unwrap();
        // 1 (marker) + 2 (OP_PUSHDATA1 + len) + 220 = 223.
        assert_eq!(script.byte_len(), 223);
        assert!(script.is_data_out());

        let mut script = Script::new();
        script.add_opcode(OP_RETURN);
        script.add_data(&[0xaa; 221]).unwrap();
        assert!(!script.is_data_out());
    }

    /// Token description: OP_RETURN, 4-byte tag, then push-only fields.
    #[test]
    fn test_is_token_description_out() {
        let mut script = Script::new();
        script.add_opcode(OP_RETURN);
        script.add_data(&[0x88, 0x13, 0x00, 0x00]).unwrap();
        script.add_data(b"TOK").unwrap();
        script.add_data(b"Token").unwrap();
        assert!(script.is_token_description_out());
        assert_eq!(script.get_group_id_type().unwrap(), 0x1388);

        // A 3-byte tag is not a token description (still a data carrier).
        let mut script = Script::new();
        script.add_opcode(OP_RETURN);
        script.add_data(&[0x88, 0x13, 0x00]).unwrap();
        assert!(script.is_data_out());
        assert!(!script.is_token_description_out());
    }

    /// Token description with more than 7 chunks is rejected.
    #[test]
    fn test_token_description_chunk_cap() {
        let mut script = Script::new();
        script.add_opcode(OP_RETURN);
        script.add_data(&[0x88, 0x13, 0x00, 0x00]).unwrap();
        for _ in 0..6 {
            script.add_data(b"f").unwrap();
        }
        assert_eq!(script.chunks().len(), 8);
        assert!(!script.is_token_description_out());
    }

    /// Classifiers return false, not errors, on malformed scripts.
    #[test]
    fn test_classifiers_tolerate_short_scripts() {
        let empty = Script::new();
        assert!(!empty.is_public_key_hash_out());
        assert!(!empty.is_public_key_template_out());
        assert!(!empty.is_script_template_out());
        assert!(!empty.is_script_template_in());
        assert!(!empty.is_data_out());
        assert!(!empty.is_token_description_out());
    }

    /// Accessors fail loudly when the classifier does not hold.
    #[test]
    fn test_accessors_fail_loudly() {
        let script = Script::from_hex(P2PKH_HEX).unwrap();
        assert!(script.get_template_hash().is_err());
        assert!(script.get_constraint_hash().is_err());
        assert!(script.get_group_id_type().is_err());
        assert_eq!(
            script.get_public_key_hash().unwrap(),
            hex::decode("f4c03610e60ad15100929cc23da2f3a799af1725").unwrap()
        );
        assert!(Script::new().get_public_key_hash().is_err());
    }

    // -----------------------------------------------------------------------
    // Element appending
    // -----------------------------------------------------------------------

    /// Small integers map to their dedicated opcodes.
    #[test]
    fn test_add_int_small() {
        let mut script = Script::new();
        script.add_int(-1).add_int(0).add_int(1).add_int(16);
        assert_eq!(script.to_bytes(), vec![OP_1NEGATE, OP_0, OP_1, OP_16]);
    }

    /// Larger integers push a minimal script-number buffer.
    #[test]
    fn test_add_int_large() {
        let mut script = Script::new();
        script.add_int(17).add_int(-255).add_int(70000);
        assert_eq!(script.to_hex(), "011102ff8003701101");
    }

    /// Arbitrary-precision integers push their sign-magnitude encoding.
    #[test]
    fn test_add_bignum() {
        let mut script = Script::new();
        script.add_bignum(&BigInt::from(129)).unwrap();
        assert_eq!(script.to_hex(), "028100");
    }

    /// Booleans map to the canonical true/false opcodes.
    #[test]
    fn test_add_bool() {
        let mut script = Script::new();
        script.add_bool(true).add_bool(false);
        assert_eq!(script.to_bytes(), vec![OP_1, OP_0]);
    }

    /// Appending a whole script concatenates its chunks.
    #[test]
    fn test_add_script() {
        let tail = Script::from_hex(P2PKH_HEX).unwrap();
        let mut script = Script::new();
        script.add_opcode(OP_NOP).add_script(&tail);
        assert_eq!(script.chunks().len(), 6);
        assert_eq!(script.to_hex(), format!("61{}", P2PKH_HEX));
    }

    /// Prepend inserts at the front in the expected order.
    #[test]
    fn test_prepend() {
        let mut script = Script::new();
        script.add_opcode(OP_CHECKSIG);
        script.prepend_data(&[0xaa; 2]).unwrap();
        script.prepend_opcode(OP_DUP);
        assert_eq!(script.to_hex(), "7602aaaaac");
    }

    /// Push selection by data length, including the over-limit error.
    #[test]
    fn test_add_data_thresholds() {
        let mut script = Script::new();
        script.add_data(&[]).unwrap();
        assert_eq!(script.chunks()[0].op, OP_0);
        script.add_data(&[0xaa; 76]).unwrap();
        assert_eq!(script.chunks()[1].op, OP_PUSHDATA1);
        script.add_data(&[0xaa; 256]).unwrap();
        assert_eq!(script.chunks()[2].op, OP_PUSHDATA2);
        script.add_data(&[0xaa; 65536]).unwrap();
        assert_eq!(script.chunks()[3].op, OP_PUSHDATA4);
    }

    /// Unknown opcode names are rejected.
    #[test]
    fn test_add_opcode_name() {
        let mut script = Script::new();
        script.add_opcode_name("OP_DUP").unwrap();
        script.add_opcode_name("OP_FALSE").unwrap();
        assert_eq!(script.to_bytes(), vec![OP_DUP, OP_0]);
        assert!(script.add_opcode_name("OP_NOPE").is_err());
    }

    // -----------------------------------------------------------------------
    // Minimal push check
    // -----------------------------------------------------------------------

    /// The minimal-push rules, including the small-integer quirk.
    #[test]
    fn test_check_minimal_push() {
        let mut script = Script::new();
        script.add_opcode(OP_0); // 0: no payload -> minimal
        script.add_data(&[0x05]).unwrap(); // 1: single byte 5 -> never minimal
        script.add_data(&[0x20]).unwrap(); // 2: single byte 32 -> minimal direct push
        script.add_data(&[0xaa; 20]).unwrap(); // 3: direct push, op == len
        script.add_data(&[0xaa; 80]).unwrap(); // 4: OP_PUSHDATA1
        assert!(script.check_minimal_push(0).unwrap());
        assert!(!script.check_minimal_push(1).unwrap());
        assert!(script.check_minimal_push(2).unwrap());
        assert!(script.check_minimal_push(3).unwrap());
        assert!(script.check_minimal_push(4).unwrap());
        assert!(script.check_minimal_push(5).is_err());
    }

    /// Non-minimal encodings are detected per size class.
    #[test]
    fn test_check_minimal_push_non_minimal() {
        // 3 bytes via OP_PUSHDATA1 and 20 bytes via OP_PUSHDATA2.
        let script = Script::from_hex("4c03aabbcc4d1400aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa")
            .expect("should parse");
        assert!(!script.check_minimal_push(0).unwrap());
        assert!(!script.check_minimal_push(1).unwrap());
    }

    // -----------------------------------------------------------------------
    // Serde
    // -----------------------------------------------------------------------

    /// Script serializes to a hex JSON string and back.
    #[test]
    fn test_serde_roundtrip() {
        let script = Script::from_hex(P2PKH_HEX).unwrap();
        let json = serde_json::to_string(&script).unwrap();
        assert_eq!(json, format!("\"{}\"", P2PKH_HEX));
        let back: Script = serde_json::from_str(&json).unwrap();
        assert_eq!(back, script);
    }
}
