//! Transaction output with value, locking script, and inferred kind.
//!
//! Outputs carry an explicit type byte on the wire. The kind is inferred
//! from the locking script whenever the script is assigned (template
//! shapes produce template outputs), with an explicit override available
//! for constructing outputs whose kind deliberately differs.

use serde::{Deserialize, Serialize};

use nexa_primitives::util::{TxReader, TxWriter, VarInt};
use nexa_script::Script;

use crate::TransactionError;

/// The output type carried on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    /// A legacy output whose script is evaluated directly.
    Generic = 0,
    /// A script-template output.
    Template = 1,
}

impl OutputKind {
    /// Decode an output kind from its wire byte.
    ///
    /// # Arguments
    /// * `byte` - The type byte.
    ///
    /// # Returns
    /// `Ok(OutputKind)`, or a serialization error for unknown values.
    pub fn from_byte(byte: u8) -> Result<Self, TransactionError> {
        match byte {
            0 => Ok(OutputKind::Generic),
            1 => Ok(OutputKind::Template),
            b => Err(TransactionError::SerializationError(format!(
                "unknown output type byte 0x{:02x}",
                b
            ))),
        }
    }

    /// Return the wire byte for this kind.
    ///
    /// # Returns
    /// The type byte.
    pub fn as_byte(&self) -> u8 {
        *self as u8
    }
}

/// A single transaction output.
///
/// The `value` is in satoshis. The `script` defines the spending
/// conditions and drives the inferred `kind` unless a kind was set
/// explicitly at construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Output {
    /// The number of satoshis locked by this output.
    pub value: u64,
    kind: OutputKind,
    script: Script,
}

impl Output {
    /// Create an output, inferring the kind from the script.
    ///
    /// # Arguments
    /// * `value` - The satoshi value.
    /// * `script` - The locking script.
    ///
    /// # Returns
    /// A new `Output` with the inferred kind.
    pub fn new(value: u64, script: Script) -> Self {
        let kind = Self::infer_kind(&script);
        Output {
            value,
            kind,
            script,
        }
    }

    /// Create an output with an explicit kind override.
    ///
    /// # Arguments
    /// * `value` - The satoshi value.
    /// * `script` - The locking script.
    /// * `kind` - The kind to record regardless of the script shape.
    ///
    /// # Returns
    /// A new `Output`.
    pub fn with_kind(value: u64, script: Script, kind: OutputKind) -> Self {
        Output {
            value,
            kind,
            script,
        }
    }

    /// Infer the output kind from a locking script.
    ///
    /// Template shapes (well-known and generic) are template outputs;
    /// everything else is generic.
    ///
    /// # Arguments
    /// * `script` - The locking script to classify.
    ///
    /// # Returns
    /// The inferred `OutputKind`.
    pub fn infer_kind(script: &Script) -> OutputKind {
        if script.is_public_key_template_out() || script.is_script_template_out() {
            OutputKind::Template
        } else {
            OutputKind::Generic
        }
    }

    /// Return the recorded output kind.
    ///
    /// # Returns
    /// The `OutputKind`.
    pub fn kind(&self) -> OutputKind {
        self.kind
    }

    /// Return the locking script.
    ///
    /// # Returns
    /// A reference to the script.
    pub fn script(&self) -> &Script {
        &self.script
    }

    /// Replace the locking script, re-inferring the kind.
    ///
    /// # Arguments
    /// * `script` - The new locking script.
    pub fn set_script(&mut self, script: Script) {
        self.kind = Self::infer_kind(&script);
        self.script = script;
    }

    /// Deserialize an output from a `TxReader`.
    ///
    /// Reads the type byte, 8-byte LE value, and varint-prefixed script.
    /// The kind comes from the wire, not from re-inference.
    ///
    /// # Arguments
    /// * `reader` - The reader positioned at the start of an encoded output.
    ///
    /// # Returns
    /// `Ok(Output)` on success, or a `TransactionError` for truncated or
    /// malformed data.
    pub fn read_from(reader: &mut TxReader) -> Result<Self, TransactionError> {
        let kind = OutputKind::from_byte(reader.read_u8().map_err(|e| {
            TransactionError::SerializationError(format!("reading output type: {}", e))
        })?)?;

        let value = reader.read_u64_le().map_err(|e| {
            TransactionError::SerializationError(format!("reading output value: {}", e))
        })?;

        let script_len = reader.read_varint().map_err(|e| {
            TransactionError::SerializationError(format!("reading script length: {}", e))
        })?;
        let script_bytes = reader.read_bytes(script_len.value() as usize).map_err(|e| {
            TransactionError::SerializationError(format!("reading locking script: {}", e))
        })?;
        let script = Script::from_bytes(script_bytes).map_err(|e| {
            TransactionError::SerializationError(format!("parsing locking script: {}", e))
        })?;

        Ok(Output {
            value,
            kind,
            script,
        })
    }

    /// Serialize this output into a `TxWriter`.
    ///
    /// # Arguments
    /// * `writer` - The writer to append serialized bytes to.
    pub fn write_to(&self, writer: &mut TxWriter) {
        writer.write_u8(self.kind.as_byte());
        writer.write_u64_le(self.value);
        let script_bytes = self.script.to_bytes();
        writer.write_varint(VarInt::from(script_bytes.len()));
        writer.write_bytes(&script_bytes);
    }

    /// Serialize this output to a byte vector.
    ///
    /// # Returns
    /// The wire-format bytes: type(1) + value(8 LE) + varint script.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = TxWriter::new();
        self.write_to(&mut writer);
        writer.into_bytes()
    }

    /// Return the serialized size of this output in bytes.
    ///
    /// # Returns
    /// The wire-format byte count.
    pub fn serialized_size(&self) -> usize {
        let script_len = self.script.byte_len();
        1 + 8 + VarInt::from(script_len).length() + script_len
    }
}

/// Plain-object projection of an output.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OutputDto {
    #[serde(rename = "type")]
    kind: u8,
    value: String,
    script: Script,
}

impl Serialize for Output {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        OutputDto {
            kind: self.kind.as_byte(),
            value: self.value.to_string(),
            script: self.script.clone(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Output {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let dto = OutputDto::deserialize(deserializer)?;
        let kind = OutputKind::from_byte(dto.kind).map_err(serde::de::Error::custom)?;
        let value = dto
            .value
            .parse::<u64>()
            .map_err(|e| serde::de::Error::custom(format!("invalid output value: {}", e)))?;
        Ok(Output::with_kind(value, dto.script, kind))
    }
}
