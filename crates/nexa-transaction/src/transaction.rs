//! Core transaction type.
//!
//! A transaction is an ordered set of inputs and outputs with a version
//! and lock time. Beyond the wire codec it carries builder state (fee,
//! fee rate, change bookkeeping) that is not part of the canonical body,
//! and exposes the dual identity hashes: `idem` commits to what is spent
//! and created, `id` additionally commits to the satisfier scripts.

use std::fmt;

use serde::{Deserialize, Serialize};

use nexa_primitives::hash::sha256d;
use nexa_primitives::util::{TxReader, TxWriter, VarInt};
use nexa_primitives::Hash;
use nexa_script::opcodes::OP_INVALIDOPCODE;
use nexa_script::Script;

use crate::input::Input;
use crate::output::Output;
use crate::signature::TxSignature;
use crate::TransactionError;

/// Maximum number of inputs and of outputs in a serializable transaction.
pub const MAX_INPUTS_OUTPUTS: usize = 256;

/// Outputs below this value are considered uneconomical to spend and are
/// rejected at serialization time unless the dust check is disabled.
pub const DUST_THRESHOLD: u64 = 546;

/// Maximum representable output value (2^53 - 1).
pub const MAX_OUTPUT_AMOUNT: u64 = 9_007_199_254_740_991;

/// Fee rate applied when neither a fee nor a fee rate was pinned.
pub const DEFAULT_FEE_PER_BYTE: u64 = 1;

/// Individually disableable checks run by `get_serialization_error`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SerializationChecks {
    /// Skip the output value range check.
    pub disable_output_range: bool,
    /// Skip the input/output count limit check.
    pub disable_count_limit: bool,
    /// Skip the unspent-amount / declared-fee consistency check.
    pub disable_unspent_check: bool,
    /// Skip the dust output check.
    pub disable_dust_outputs: bool,
    /// Skip the full-signedness check.
    pub disable_is_fully_signed: bool,
}

/// A transaction.
///
/// # Wire format
///
/// | Field        | Size                 |
/// |--------------|----------------------|
/// | version      | 1 byte               |
/// | input count  | VarInt               |
/// | inputs       | variable (per input) |
/// | output count | VarInt               |
/// | outputs      | variable (per output)|
/// | lock_time    | 4 bytes (LE)         |
///
/// The fee, fee rate, and change fields are builder state; they are not
/// serialized into the canonical body. Any mutation of inputs, outputs,
/// fee, or change clears all satisfier scripts, because signatures
/// commit to the output set.
#[derive(Clone, Debug, PartialEq)]
pub struct Transaction {
    /// Transaction format version.
    pub version: u8,
    /// Lock time. If non-zero, the transaction is not valid until the
    /// specified block height or timestamp.
    pub lock_time: u32,
    inputs: Vec<Input>,
    outputs: Vec<Output>,
    fee: Option<u64>,
    fee_per_byte: Option<u64>,
    change_index: Option<usize>,
    change_script: Option<Script>,
}

impl Transaction {
    /// Create a new empty transaction with version 0 and lock time 0.
    ///
    /// # Returns
    /// A `Transaction` with no inputs or outputs.
    pub fn new() -> Self {
        Transaction {
            version: 0,
            lock_time: 0,
            inputs: Vec::new(),
            outputs: Vec::new(),
            fee: None,
            fee_per_byte: None,
            change_index: None,
            change_script: None,
        }
    }

    // -----------------------------------------------------------------
    // Field access
    // -----------------------------------------------------------------

    /// Return the ordered inputs.
    pub fn inputs(&self) -> &[Input] {
        &self.inputs
    }

    /// Return the ordered outputs.
    pub fn outputs(&self) -> &[Output] {
        &self.outputs
    }

    /// Return the pinned fee, if any.
    pub fn fee(&self) -> Option<u64> {
        self.fee
    }

    /// Return the pinned fee rate, if any.
    pub fn fee_per_byte(&self) -> Option<u64> {
        self.fee_per_byte
    }

    /// Return the index of the change output, if one exists.
    pub fn change_index(&self) -> Option<usize> {
        self.change_index
    }

    /// Return the configured change script, if any.
    pub fn change_script(&self) -> Option<&Script> {
        self.change_script.as_ref()
    }

    // -----------------------------------------------------------------
    // Mutation (invalidates signatures)
    // -----------------------------------------------------------------

    /// Append an input. Clears all satisfier scripts and recomputes the
    /// change output.
    ///
    /// # Arguments
    /// * `input` - The input to add.
    pub fn add_input(&mut self, input: Input) {
        self.inputs.push(input);
        self.update_change_output();
    }

    /// Append an output. Clears all satisfier scripts and recomputes the
    /// change output.
    ///
    /// # Arguments
    /// * `output` - The output to add.
    pub fn add_output(&mut self, output: Output) {
        self.outputs.push(output);
        self.update_change_output();
    }

    /// Pin an explicit fee. Clears all satisfier scripts and recomputes
    /// the change output.
    ///
    /// # Arguments
    /// * `fee` - The fee in satoshis.
    pub fn set_fee(&mut self, fee: u64) {
        self.fee = Some(fee);
        self.update_change_output();
    }

    /// Pin a fee rate. Clears all satisfier scripts and recomputes the
    /// change output.
    ///
    /// # Arguments
    /// * `fee_per_byte` - The fee rate in satoshis per byte.
    pub fn set_fee_per_byte(&mut self, fee_per_byte: u64) {
        self.fee_per_byte = Some(fee_per_byte);
        self.update_change_output();
    }

    /// Configure the change script. Clears all satisfier scripts and
    /// recomputes the change output.
    ///
    /// # Arguments
    /// * `script` - The locking script change is sent to.
    pub fn set_change_script(&mut self, script: Script) {
        self.change_script = Some(script);
        self.update_change_output();
    }

    /// Reset every input's satisfier script.
    pub fn clear_signatures(&mut self) {
        for input in &mut self.inputs {
            input.clear_signature();
        }
    }

    /// Apply a signature to the input it names. Does not invalidate the
    /// other inputs.
    ///
    /// # Arguments
    /// * `signature` - The signature to apply.
    ///
    /// # Returns
    /// `Ok(())`, or an error for a bad index or an opaque input.
    pub fn apply_signature(&mut self, signature: &TxSignature) -> Result<(), TransactionError> {
        let index = signature.input_index as usize;
        let input = self.inputs.get_mut(index).ok_or_else(|| {
            TransactionError::InvalidTransaction(format!(
                "signature input index {} out of range",
                index
            ))
        })?;
        input.add_signature(signature)?;
        Ok(())
    }

    /// Check whether every input carries a complete authorization.
    ///
    /// # Returns
    /// `Ok(bool)`, or the state error raised by an opaque input.
    pub fn is_fully_signed(&self) -> Result<bool, TransactionError> {
        for input in &self.inputs {
            if !input.is_fully_signed()? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    // -----------------------------------------------------------------
    // Amounts, fee, and change
    // -----------------------------------------------------------------

    /// Sum of all input amounts.
    pub fn total_input_amount(&self) -> u64 {
        self.inputs.iter().map(|i| i.amount).sum()
    }

    /// Sum of all output values.
    pub fn total_output_amount(&self) -> u64 {
        self.outputs.iter().map(|o| o.value).sum()
    }

    /// Input amounts minus output values. Negative when the outputs
    /// overspend the inputs.
    pub fn unspent_amount(&self) -> i64 {
        self.total_input_amount() as i64 - self.total_output_amount() as i64
    }

    /// Estimate the serialized size of this transaction in bytes.
    ///
    /// Unsigned inputs contribute their variant's satisfier estimate;
    /// signed inputs and all outputs contribute their actual bytes.
    ///
    /// # Returns
    /// The estimated wire size.
    pub fn estimated_size(&self) -> usize {
        let mut size = 1 + VarInt::from(self.inputs.len()).length();
        for input in &self.inputs {
            size += input.estimate_size();
        }
        size += VarInt::from(self.outputs.len()).length();
        for output in &self.outputs {
            size += output.serialized_size();
        }
        size + 4
    }

    /// Compute the size-based fee for the pinned (or default) fee rate.
    ///
    /// # Returns
    /// `fee_per_byte x estimated_size` in satoshis.
    pub fn estimate_required_fee(&self) -> u64 {
        self.fee_per_byte.unwrap_or(DEFAULT_FEE_PER_BYTE) * self.estimated_size() as u64
    }

    /// Return the fee this transaction pays.
    ///
    /// A pinned fee wins. Without a change script the whole unspent
    /// remainder is the fee. Otherwise the fee is the size-based
    /// estimate.
    ///
    /// # Returns
    /// The fee in satoshis.
    pub fn get_fee(&self) -> u64 {
        if let Some(fee) = self.fee {
            return fee;
        }
        if self.change_script.is_none() {
            return self.unspent_amount().max(0) as u64;
        }
        self.estimate_required_fee()
    }

    /// Recompute the change output.
    ///
    /// Removes any existing change output, then appends a new one when
    /// the remainder after the fee clears the dust threshold. All
    /// satisfier scripts are cleared first; prior signatures committed
    /// to the old output set.
    fn update_change_output(&mut self) {
        self.clear_signatures();
        if let Some(index) = self.change_index.take() {
            if index < self.outputs.len() {
                self.outputs.remove(index);
            }
        }
        let change_script = match &self.change_script {
            Some(script) => script.clone(),
            None => return,
        };
        let available = self.unspent_amount();
        // Include the change output in the size estimate before deciding
        // whether the remainder can fund it.
        self.outputs.push(Output::new(0, change_script));
        let remainder = available - self.get_fee() as i64;
        if remainder >= DUST_THRESHOLD as i64 {
            let index = self.outputs.len() - 1;
            self.outputs[index].value = remainder as u64;
            self.change_index = Some(index);
        } else {
            self.outputs.pop();
        }
    }

    // -----------------------------------------------------------------
    // Wire codec
    // -----------------------------------------------------------------

    /// Parse a transaction from a hex-encoded string.
    ///
    /// # Arguments
    /// * `hex_str` - A hex string of the raw transaction bytes.
    ///
    /// # Returns
    /// `Ok(Transaction)`, or a `TransactionError` if the hex is invalid
    /// or the bytes do not form a complete transaction.
    pub fn from_hex(hex_str: &str) -> Result<Self, TransactionError> {
        let bytes = hex::decode(hex_str).map_err(|e| {
            TransactionError::SerializationError(format!("invalid hex: {}", e))
        })?;
        Self::from_bytes(&bytes)
    }

    /// Parse a transaction from raw bytes.
    ///
    /// The byte slice must contain exactly one complete transaction with
    /// no trailing data.
    ///
    /// # Arguments
    /// * `bytes` - The raw transaction bytes.
    ///
    /// # Returns
    /// `Ok(Transaction)`, or a `TransactionError` for truncated,
    /// malformed, or over-long input.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TransactionError> {
        let mut reader = TxReader::new(bytes);
        let tx = Self::read_from(&mut reader)?;
        if reader.remaining() != 0 {
            return Err(TransactionError::SerializationError(format!(
                "trailing {} bytes after transaction",
                reader.remaining()
            )));
        }
        Ok(tx)
    }

    /// Deserialize a transaction from a `TxReader`.
    ///
    /// # Arguments
    /// * `reader` - The reader positioned at the start of a serialized
    ///   transaction.
    ///
    /// # Returns
    /// `Ok(Transaction)`, or a `TransactionError` on format errors.
    pub fn read_from(reader: &mut TxReader) -> Result<Self, TransactionError> {
        let version = reader.read_u8().map_err(|e| {
            TransactionError::SerializationError(format!("reading version: {}", e))
        })?;

        let input_count = reader.read_varint().map_err(|e| {
            TransactionError::SerializationError(format!("reading input count: {}", e))
        })?;
        let mut inputs = Vec::with_capacity(input_count.value().min(1024) as usize);
        for _ in 0..input_count.value() {
            inputs.push(Input::read_from(reader)?);
        }

        let output_count = reader.read_varint().map_err(|e| {
            TransactionError::SerializationError(format!("reading output count: {}", e))
        })?;
        let mut outputs = Vec::with_capacity(output_count.value().min(1024) as usize);
        for _ in 0..output_count.value() {
            outputs.push(Output::read_from(reader)?);
        }

        let lock_time = reader.read_u32_le().map_err(|e| {
            TransactionError::SerializationError(format!("reading lock time: {}", e))
        })?;

        Ok(Transaction {
            version,
            lock_time,
            inputs,
            outputs,
            fee: None,
            fee_per_byte: None,
            change_index: None,
            change_script: None,
        })
    }

    /// Serialize the canonical body, with or without satisfier scripts.
    fn serialize_body(&self, include_script_sigs: bool) -> Vec<u8> {
        let mut writer = TxWriter::with_capacity(256);
        writer.write_u8(self.version);
        writer.write_varint(VarInt::from(self.inputs.len()));
        for input in &self.inputs {
            input.write_to(&mut writer, include_script_sigs);
        }
        writer.write_varint(VarInt::from(self.outputs.len()));
        for output in &self.outputs {
            output.write_to(&mut writer);
        }
        writer.write_u32_le(self.lock_time);
        writer.into_bytes()
    }

    /// Serialize this transaction to raw bytes.
    ///
    /// # Returns
    /// The wire-format bytes, satisfier scripts included.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.serialize_body(true)
    }

    /// Serialize this transaction to a hex string.
    ///
    /// # Returns
    /// A lowercase hex encoding of the raw bytes.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Run the serialization checks and serialize on success.
    ///
    /// # Arguments
    /// * `checks` - Which checks to run.
    ///
    /// # Returns
    /// The wire bytes, or the first check violation.
    pub fn checked_serialize(
        &self,
        checks: &SerializationChecks,
    ) -> Result<Vec<u8>, TransactionError> {
        match self.get_serialization_error(checks) {
            Some(err) => Err(err),
            None => Ok(self.to_bytes()),
        }
    }

    // -----------------------------------------------------------------
    // Identity
    // -----------------------------------------------------------------

    /// Compute the idem hash: sha256d over the transaction serialized
    /// with satisfier scripts omitted entirely.
    ///
    /// The idem names "what is spent and created" independently of
    /// authorization, so unsigned and partially signed transactions can
    /// be referenced stably.
    ///
    /// # Returns
    /// The idem `Hash` (displayed reversed).
    pub fn idem(&self) -> Hash {
        Hash::sha256d_of(&self.serialize_body(false))
    }

    /// Compute the id hash: sha256d over the idem digest concatenated
    /// with the satisfier digest.
    ///
    /// The satisfier digest is sha256d over each input's raw satisfier
    /// bytes followed by a fixed terminator byte.
    ///
    /// # Returns
    /// The id `Hash` (displayed reversed).
    pub fn id(&self) -> Hash {
        let idem_digest = sha256d(&self.serialize_body(false));

        let mut satisfiers = Vec::new();
        for input in &self.inputs {
            satisfiers.extend_from_slice(&input.script_sig.to_bytes());
            satisfiers.push(OP_INVALIDOPCODE);
        }
        let satisfier_digest = sha256d(&satisfiers);

        let mut preimage = Vec::with_capacity(64);
        preimage.extend_from_slice(&idem_digest);
        preimage.extend_from_slice(&satisfier_digest);
        Hash::sha256d_of(&preimage)
    }

    // -----------------------------------------------------------------
    // Serialization validity
    // -----------------------------------------------------------------

    /// Run the serialization validity checks and return the first
    /// violation found.
    ///
    /// Checks, in order: output value range, input/output count limits,
    /// unspent-amount consistency (exact match against a pinned fee),
    /// dust outputs (data carriers exempt), and full signedness.
    ///
    /// # Arguments
    /// * `checks` - Which checks to run.
    ///
    /// # Returns
    /// `Some(TransactionError)` describing the first violation, or `None`.
    pub fn get_serialization_error(
        &self,
        checks: &SerializationChecks,
    ) -> Option<TransactionError> {
        if !checks.disable_output_range {
            for (index, output) in self.outputs.iter().enumerate() {
                if output.value > MAX_OUTPUT_AMOUNT {
                    return Some(TransactionError::InvalidTransaction(format!(
                        "output {} value {} is above the maximum",
                        index, output.value
                    )));
                }
            }
        }

        if !checks.disable_count_limit {
            if self.inputs.len() > MAX_INPUTS_OUTPUTS {
                return Some(TransactionError::InvalidTransaction(format!(
                    "{} inputs exceeds the limit of {}",
                    self.inputs.len(),
                    MAX_INPUTS_OUTPUTS
                )));
            }
            if self.outputs.len() > MAX_INPUTS_OUTPUTS {
                return Some(TransactionError::InvalidTransaction(format!(
                    "{} outputs exceeds the limit of {}",
                    self.outputs.len(),
                    MAX_INPUTS_OUTPUTS
                )));
            }
        }

        if !checks.disable_unspent_check {
            let unspent = self.unspent_amount();
            if unspent < 0 {
                return Some(TransactionError::InvalidTransaction(format!(
                    "outputs spend {} more than the inputs provide",
                    -unspent
                )));
            }
            if let Some(fee) = self.fee {
                if unspent as u64 != fee {
                    return Some(TransactionError::InvalidTransaction(format!(
                        "unspent amount {} does not match the declared fee {}",
                        unspent, fee
                    )));
                }
            }
        }

        if !checks.disable_dust_outputs {
            for (index, output) in self.outputs.iter().enumerate() {
                if output.value < DUST_THRESHOLD && !output.script().is_data_out() {
                    return Some(TransactionError::InvalidTransaction(format!(
                        "output {} value {} is below the dust threshold",
                        index, output.value
                    )));
                }
            }
        }

        if !checks.disable_is_fully_signed {
            for (index, input) in self.inputs.iter().enumerate() {
                match input.is_fully_signed() {
                    Err(err) => return Some(err),
                    Ok(false) => {
                        return Some(TransactionError::InvalidTransaction(format!(
                            "input {} is not fully signed",
                            index
                        )));
                    }
                    Ok(true) => {}
                }
            }
        }

        None
    }
}

impl Default for Transaction {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Transaction {
    /// Display the transaction as its hex-encoded serialization.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Plain-object projection of a transaction, including builder state.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransactionDto {
    version: u8,
    inputs: Vec<Input>,
    outputs: Vec<Output>,
    lock_time: u32,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    fee: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    fee_per_byte: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    change_index: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    change_script: Option<Script>,
}

impl Serialize for Transaction {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        TransactionDto {
            version: self.version,
            inputs: self.inputs.clone(),
            outputs: self.outputs.clone(),
            lock_time: self.lock_time,
            fee: self.fee.map(|v| v.to_string()),
            fee_per_byte: self.fee_per_byte.map(|v| v.to_string()),
            change_index: self.change_index.map(|v| v as u32),
            change_script: self.change_script.clone(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Transaction {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        fn parse_amount<E: serde::de::Error>(
            value: Option<String>,
            what: &str,
        ) -> Result<Option<u64>, E> {
            value
                .map(|v| {
                    v.parse::<u64>()
                        .map_err(|e| E::custom(format!("invalid {}: {}", what, e)))
                })
                .transpose()
        }

        let dto = TransactionDto::deserialize(deserializer)?;
        let fee = parse_amount(dto.fee, "fee")?;
        let fee_per_byte = parse_amount(dto.fee_per_byte, "fee rate")?;

        let change_index = dto.change_index.map(|v| v as usize);
        if let Some(index) = change_index {
            let valid = dto
                .outputs
                .get(index)
                .map(|output| Some(output.script()) == dto.change_script.as_ref())
                .unwrap_or(false);
            if !valid {
                return Err(serde::de::Error::custom(
                    "change index does not reference an output with the change script",
                ));
            }
        }

        Ok(Transaction {
            version: dto.version,
            lock_time: dto.lock_time,
            inputs: dto.inputs,
            outputs: dto.outputs,
            fee,
            fee_per_byte,
            change_index,
            change_script: dto.change_script,
        })
    }
}
