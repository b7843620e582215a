//! Transaction input family.
//!
//! An input references the output it spends by a 32-byte outpoint hash
//! and carries the amount, sequence number, and satisfier script. The
//! signing behavior is polymorphic over a closed set of variants chosen
//! by classifying the referenced output's locking script:
//! pay-to-public-key-hash, pay-to-public-key-template, generic script
//! template (with out-of-band template data), or opaque. Opaque inputs
//! serialize and size-estimate like any other but refuse the signing
//! operations with a typed not-implemented error.

use serde::{Deserialize, Serialize};

use nexa_primitives::hash::{hash160, sha256d};
use nexa_primitives::util::{TxReader, TxWriter, VarInt};
use nexa_primitives::{Hash, PrivateKey, PublicKey};
use nexa_script::{builder, Script};

use crate::output::Output;
use crate::signature::TxSignature;
use crate::TransactionError;

/// Default sequence number indicating a finalized input.
pub const DEFAULT_SEQUENCE: u32 = 0xFFFF_FFFF;

/// Fixed wire overhead of an input: type(1) + outpoint(32) + sequence(4)
/// + amount(8).
const INPUT_FIXED_BYTES: usize = 45;

/// Assumed satisfier script size for an unsigned P2PKH input.
const PKH_SCRIPT_SIG_ESTIMATE: usize = 99;

/// Assumed satisfier script size for an unsigned P2PKT input.
const PKT_SCRIPT_SIG_ESTIMATE: usize = 100;

/// The input type carried on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// A spend of an unspent transaction output.
    Utxo = 0,
    /// A read-only reference that proves an output exists without
    /// consuming it.
    ReadOnly = 1,
}

impl InputKind {
    /// Decode an input kind from its wire byte.
    ///
    /// # Arguments
    /// * `byte` - The type byte.
    ///
    /// # Returns
    /// `Ok(InputKind)`, or a serialization error for unknown values.
    pub fn from_byte(byte: u8) -> Result<Self, TransactionError> {
        match byte {
            0 => Ok(InputKind::Utxo),
            1 => Ok(InputKind::ReadOnly),
            b => Err(TransactionError::SerializationError(format!(
                "unknown input type byte 0x{:02x}",
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

/// The signing personality of an input, chosen from the referenced
/// output's script shape.
#[derive(Clone, Debug, PartialEq)]
pub enum InputVariant {
    /// No recognized signing behavior; serialization only.
    Opaque,
    /// Spend of a pay-to-public-key-hash output.
    PublicKeyHash,
    /// Spend of a well-known-template output.
    PublicKeyTemplate,
    /// Spend of a generic script-template output with externally
    /// supplied template data.
    ScriptTemplate {
        /// The template script, validated against the output's
        /// committed template hash.
        template: Script,
        /// The constraint script, or `None` when the output committed
        /// to no constraint.
        constraint: Option<Script>,
        /// The public key the template checks, when the common
        /// single-key gate pattern applies.
        public_key: Option<PublicKey>,
    },
}

/// A single transaction input.
#[derive(Clone, Debug, PartialEq)]
pub struct Input {
    /// The input type.
    pub kind: InputKind,
    /// The 32-byte identity of the output being spent.
    pub outpoint: Hash,
    /// The satoshi value of the output being spent.
    pub amount: u64,
    /// Sequence number. Defaults to `0xFFFFFFFF` (finalized).
    pub sequence: u32,
    /// The satisfier script. Empty until signed.
    pub script_sig: Script,
    /// The referenced output, used for signing and validation context
    /// only. Never serialized into the transaction body.
    pub output: Option<Output>,
    variant: InputVariant,
}

impl Input {
    /// Create an opaque input with no signing behavior.
    ///
    /// # Arguments
    /// * `outpoint` - The outpoint hash of the output being spent.
    /// * `amount` - The satoshi value of the output being spent.
    ///
    /// # Returns
    /// A new opaque `Input`.
    pub fn opaque(outpoint: Hash, amount: u64) -> Self {
        Input {
            kind: InputKind::Utxo,
            outpoint,
            amount,
            sequence: DEFAULT_SEQUENCE,
            script_sig: Script::new(),
            output: None,
            variant: InputVariant::Opaque,
        }
    }

    /// Create an input by classifying the referenced output's script.
    ///
    /// P2PKH and P2PKT outputs select their signing variants directly.
    /// A generic script-template output becomes an opaque input (its
    /// template data must be supplied via `script_template` to sign).
    /// Any other script shape is rejected.
    ///
    /// # Arguments
    /// * `outpoint` - The outpoint hash of the output being spent.
    /// * `amount` - The satoshi value of the output being spent.
    /// * `output` - The referenced output.
    ///
    /// # Returns
    /// `Ok(Input)`, or `TransactionError::InvalidTransaction` for an
    /// unrecognized output script.
    pub fn from_output(
        outpoint: Hash,
        amount: u64,
        output: Output,
    ) -> Result<Self, TransactionError> {
        let script = output.script();
        let variant = if script.is_public_key_hash_out() {
            InputVariant::PublicKeyHash
        } else if script.is_public_key_template_out() {
            InputVariant::PublicKeyTemplate
        } else if script.is_script_template_out() {
            InputVariant::Opaque
        } else {
            return Err(TransactionError::InvalidTransaction(
                "output script matches no known spendable shape".to_string(),
            ));
        };
        Ok(Input {
            kind: InputKind::Utxo,
            outpoint,
            amount,
            sequence: DEFAULT_SEQUENCE,
            script_sig: Script::new(),
            output: Some(output),
            variant,
        })
    }

    /// Create a script-template input with externally supplied template
    /// data, validating it against the hashes committed in the output.
    ///
    /// The template hash commitment is Hash160 for 20-byte commitments
    /// and sha256d for 32-byte ones; the constraint commitment is always
    /// Hash160.
    ///
    /// # Arguments
    /// * `outpoint` - The outpoint hash of the output being spent.
    /// * `amount` - The satoshi value of the output being spent.
    /// * `output` - The referenced script-template output.
    /// * `template` - The template script.
    /// * `constraint` - The constraint script, or `None` when the output
    ///   committed to no constraint.
    /// * `public_key` - The key the template gates on, when known.
    ///
    /// # Returns
    /// `Ok(Input)`, or a descriptive mismatch error.
    pub fn script_template(
        outpoint: Hash,
        amount: u64,
        output: Output,
        template: Script,
        constraint: Option<Script>,
        public_key: Option<PublicKey>,
    ) -> Result<Self, TransactionError> {
        let committed_template = output.script().get_template_hash()?;
        let template_bytes = template.to_bytes();
        let computed: Vec<u8> = match committed_template.len() {
            32 => sha256d(&template_bytes).to_vec(),
            _ => hash160(&template_bytes).to_vec(),
        };
        if computed != committed_template {
            return Err(TransactionError::InvalidTransaction(
                "template script doesn't match the template hash committed in the output"
                    .to_string(),
            ));
        }

        let committed_constraint = output.script().get_constraint_hash()?;
        match (&committed_constraint, &constraint) {
            (Some(committed), Some(script)) => {
                if hash160(&script.to_bytes()).as_slice() != committed.as_slice() {
                    return Err(TransactionError::InvalidTransaction(
                        "constraint script doesn't match the constraint hash committed in the output"
                            .to_string(),
                    ));
                }
            }
            (None, None) => {}
            (Some(_), None) => {
                return Err(TransactionError::InvalidTransaction(
                    "output commits to a constraint script but none was supplied".to_string(),
                ));
            }
            (None, Some(_)) => {
                return Err(TransactionError::InvalidTransaction(
                    "output commits to no constraint but a constraint script was supplied"
                        .to_string(),
                ));
            }
        }

        Ok(Input {
            kind: InputKind::Utxo,
            outpoint,
            amount,
            sequence: DEFAULT_SEQUENCE,
            script_sig: Script::new(),
            output: Some(output),
            variant: InputVariant::ScriptTemplate {
                template,
                constraint,
                public_key,
            },
        })
    }

    /// Return the signing variant of this input.
    ///
    /// # Returns
    /// A reference to the `InputVariant`.
    pub fn variant(&self) -> &InputVariant {
        &self.variant
    }

    /// Return the referenced output, failing when it is absent.
    fn require_output(&self) -> Result<&Output, TransactionError> {
        self.output.as_ref().ok_or_else(|| {
            TransactionError::SigningError("missing source output on input".to_string())
        })
    }

    // -----------------------------------------------------------------
    // Signing contract
    // -----------------------------------------------------------------

    /// Return the subscript hashed into this input's signature digest.
    ///
    /// P2PKH inputs hash the referenced output script verbatim; P2PKT
    /// inputs hash the fixed well-known template; script-template inputs
    /// hash their template script.
    ///
    /// # Returns
    /// The subscript, or `TransactionError::NotImplemented` for opaque
    /// inputs.
    pub fn subscript(&self) -> Result<Script, TransactionError> {
        match &self.variant {
            InputVariant::Opaque => Err(TransactionError::NotImplemented),
            InputVariant::PublicKeyHash => Ok(self.require_output()?.script().clone()),
            InputVariant::PublicKeyTemplate => Ok(builder::well_known_template_1()),
            InputVariant::ScriptTemplate { template, .. } => Ok(template.clone()),
        }
    }

    /// Check whether a private key can satisfy this input.
    ///
    /// # Arguments
    /// * `private_key` - The candidate key.
    ///
    /// # Returns
    /// `Ok(bool)`, or `TransactionError::NotImplemented` for opaque
    /// inputs.
    pub fn can_sign(&self, private_key: &PrivateKey) -> Result<bool, TransactionError> {
        match &self.variant {
            InputVariant::Opaque => Err(TransactionError::NotImplemented),
            InputVariant::PublicKeyHash => {
                let committed = self.require_output()?.script().get_public_key_hash()?;
                let key_hash = hash160(&private_key.public_key().to_compressed());
                Ok(key_hash.as_slice() == committed.as_slice())
            }
            InputVariant::PublicKeyTemplate => {
                let committed = self
                    .require_output()?
                    .script()
                    .get_constraint_hash()?
                    .ok_or_else(|| {
                        TransactionError::SigningError(
                            "template output is missing its constraint hash".to_string(),
                        )
                    })?;
                let constraint = builder::constraint_from_public_key(&private_key.public_key());
                let constraint_hash = hash160(&constraint.to_bytes());
                Ok(constraint_hash.as_slice() == committed.as_slice())
            }
            InputVariant::ScriptTemplate { public_key, .. } => match public_key {
                Some(key) => Ok(key.to_hex() == private_key.public_key().to_hex()),
                None => Ok(false),
            },
        }
    }

    /// Check whether the satisfier script currently carries a complete
    /// authorization. Recomputed from the script bytes on every call.
    ///
    /// # Returns
    /// `Ok(bool)`, or `TransactionError::NotImplemented` for opaque
    /// inputs.
    pub fn is_fully_signed(&self) -> Result<bool, TransactionError> {
        match &self.variant {
            InputVariant::Opaque => Err(TransactionError::NotImplemented),
            InputVariant::PublicKeyHash => Ok(self.script_sig.is_public_key_hash_in()),
            InputVariant::PublicKeyTemplate => Ok(self.script_sig.is_public_key_template_in()),
            InputVariant::ScriptTemplate {
                template,
                constraint,
                ..
            } => {
                if !self.script_sig.is_script_template_in() {
                    return Ok(false);
                }
                let chunks = self.script_sig.chunks();
                let template_ok = chunks
                    .first()
                    .and_then(|c| c.payload())
                    .map(|d| d == template.to_bytes().as_slice())
                    .unwrap_or(false);
                let constraint_ok = match constraint {
                    None => true,
                    Some(constraint) => chunks
                        .get(1)
                        .and_then(|c| c.payload())
                        .map(|d| d == constraint.to_bytes().as_slice())
                        .unwrap_or(false),
                };
                Ok(template_ok && constraint_ok)
            }
        }
    }

    /// Apply a signature, replacing the satisfier script.
    ///
    /// # Arguments
    /// * `signature` - The signature to apply.
    ///
    /// # Returns
    /// `Ok(&mut Self)` for chaining, or `TransactionError::NotImplemented`
    /// for opaque inputs.
    pub fn add_signature(
        &mut self,
        signature: &TxSignature,
    ) -> Result<&mut Self, TransactionError> {
        let script_sig = match &self.variant {
            InputVariant::Opaque => return Err(TransactionError::NotImplemented),
            InputVariant::PublicKeyHash => builder::pay_to_public_key_hash_in(
                &signature.to_tx_format(),
                &signature.public_key,
            )?,
            InputVariant::PublicKeyTemplate => {
                let constraint = builder::constraint_from_public_key(&signature.public_key);
                builder::template_in(None, Some(&constraint), &[&signature.to_tx_format()])?
            }
            InputVariant::ScriptTemplate {
                template,
                constraint,
                ..
            } => builder::template_in(
                Some(template),
                constraint.as_ref(),
                &[&signature.to_tx_format()],
            )?,
        };
        self.script_sig = script_sig;
        Ok(self)
    }

    /// Reset the satisfier script to empty.
    pub fn clear_signature(&mut self) {
        self.script_sig = Script::new();
    }

    /// Estimate this input's serialized size in bytes.
    ///
    /// Signed inputs use their actual satisfier bytes. Unsigned P2PKH
    /// and P2PKT inputs use fixed satisfier size assumptions; unsigned
    /// script-template inputs assume the template and constraint bytes
    /// plus a 65-byte signature push.
    ///
    /// # Returns
    /// The estimated wire size.
    pub fn estimate_size(&self) -> usize {
        let script_len = if !self.script_sig.is_empty() {
            self.script_sig.byte_len()
        } else {
            match &self.variant {
                InputVariant::Opaque => 0,
                InputVariant::PublicKeyHash => PKH_SCRIPT_SIG_ESTIMATE,
                InputVariant::PublicKeyTemplate => PKT_SCRIPT_SIG_ESTIMATE,
                InputVariant::ScriptTemplate {
                    template,
                    constraint,
                    ..
                } => {
                    let constraint_len =
                        constraint.as_ref().map(|c| c.byte_len()).unwrap_or(0);
                    template.byte_len() + constraint_len + 65
                }
            }
        };
        INPUT_FIXED_BYTES + VarInt::from(script_len).length() + script_len
    }

    // -----------------------------------------------------------------
    // Wire codec
    // -----------------------------------------------------------------

    /// Deserialize an input from a `TxReader`.
    ///
    /// Reads the type byte, outpoint, varint-prefixed satisfier script,
    /// sequence number, and amount. The result is an opaque input; the
    /// signing variant is recovered only where output context is
    /// available (plain-object deserialization).
    ///
    /// # Arguments
    /// * `reader` - The reader positioned at the start of an encoded input.
    ///
    /// # Returns
    /// `Ok(Input)` on success, or a `TransactionError` for truncated or
    /// malformed data.
    pub fn read_from(reader: &mut TxReader) -> Result<Self, TransactionError> {
        let kind = InputKind::from_byte(reader.read_u8().map_err(|e| {
            TransactionError::SerializationError(format!("reading input type: {}", e))
        })?)?;

        let outpoint = reader.read_hash().map_err(|e| {
            TransactionError::SerializationError(format!("reading outpoint: {}", e))
        })?;

        let script_len = reader.read_varint().map_err(|e| {
            TransactionError::SerializationError(format!("reading script length: {}", e))
        })?;
        let script_bytes = reader.read_bytes(script_len.value() as usize).map_err(|e| {
            TransactionError::SerializationError(format!("reading satisfier script: {}", e))
        })?;
        let script_sig = Script::from_bytes(script_bytes).map_err(|e| {
            TransactionError::SerializationError(format!("parsing satisfier script: {}", e))
        })?;

        let sequence = reader.read_u32_le().map_err(|e| {
            TransactionError::SerializationError(format!("reading sequence number: {}", e))
        })?;

        let amount = reader.read_u64_le().map_err(|e| {
            TransactionError::SerializationError(format!("reading input amount: {}", e))
        })?;

        Ok(Input {
            kind,
            outpoint,
            amount,
            sequence,
            script_sig,
            output: None,
            variant: InputVariant::Opaque,
        })
    }

    /// Serialize this input into a `TxWriter`.
    ///
    /// # Arguments
    /// * `writer` - The writer to append serialized bytes to.
    /// * `include_script_sig` - When false, the satisfier script field is
    ///   omitted entirely (idem serialization).
    pub fn write_to(&self, writer: &mut TxWriter, include_script_sig: bool) {
        writer.write_u8(self.kind.as_byte());
        writer.write_hash(&self.outpoint);
        if include_script_sig {
            let script_bytes = self.script_sig.to_bytes();
            writer.write_varint(VarInt::from(script_bytes.len()));
            writer.write_bytes(&script_bytes);
        }
        writer.write_u32_le(self.sequence);
        writer.write_u64_le(self.amount);
    }
}

/// Plain-object projection of an input, including the optional output
/// context and template metadata.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InputDto {
    #[serde(rename = "type")]
    kind: u8,
    outpoint: Hash,
    amount: String,
    sequence: u32,
    script_sig: Script,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    output: Option<Output>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    template: Option<Script>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    constraint: Option<Script>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    public_key: Option<String>,
}

impl Serialize for Input {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let (template, constraint, public_key) = match &self.variant {
            InputVariant::ScriptTemplate {
                template,
                constraint,
                public_key,
            } => (
                Some(template.clone()),
                constraint.clone(),
                public_key.as_ref().map(|k| k.to_hex()),
            ),
            _ => (None, None, None),
        };
        InputDto {
            kind: self.kind.as_byte(),
            outpoint: self.outpoint,
            amount: self.amount.to_string(),
            sequence: self.sequence,
            script_sig: self.script_sig.clone(),
            output: self.output.clone(),
            template,
            constraint,
            public_key,
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Input {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let dto = InputDto::deserialize(deserializer)?;
        let kind = InputKind::from_byte(dto.kind).map_err(serde::de::Error::custom)?;
        let amount = dto
            .amount
            .parse::<u64>()
            .map_err(|e| serde::de::Error::custom(format!("invalid input amount: {}", e)))?;
        let public_key = dto
            .public_key
            .map(|hex_key| PublicKey::from_hex(&hex_key))
            .transpose()
            .map_err(serde::de::Error::custom)?;

        // Recover the signing variant from the output context, exactly as
        // at construction time.
        let mut input = match dto.output {
            Some(output) => match dto.template {
                Some(template) => Input::script_template(
                    dto.outpoint,
                    amount,
                    output,
                    template,
                    dto.constraint,
                    public_key,
                )
                .map_err(serde::de::Error::custom)?,
                None => Input::from_output(dto.outpoint, amount, output)
                    .map_err(serde::de::Error::custom)?,
            },
            None => Input::opaque(dto.outpoint, amount),
        };
        input.kind = kind;
        input.sequence = dto.sequence;
        input.script_sig = dto.script_sig;
        Ok(input)
    }
}
