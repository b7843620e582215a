//! Selective signature hash computation.
//!
//! A `SighashType` names which inputs and outputs a signature commits
//! to. The digest algorithm hashes four component digests (prevouts,
//! amounts, sequences, outputs) over the selected sets and assembles
//! them with the subscript and lock time into a preimage that is double
//! SHA-256 hashed and byte-reversed.

use std::fmt;
use std::str::FromStr;

use nexa_primitives::hash::sha256d;
use nexa_primitives::util::{TxWriter, VarInt};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use nexa_script::Script;

use crate::transaction::Transaction;
use crate::TransactionError;

// -----------------------------------------------------------------------
// SighashType
// -----------------------------------------------------------------------

/// Which inputs participate in a signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSelection {
    /// All inputs.
    All,
    /// The first `n` inputs.
    FirstN(u8),
    /// Only the input being signed.
    ThisOnly,
}

/// Which outputs participate in a signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputSelection {
    /// All outputs.
    All,
    /// The first `n` outputs.
    FirstN(u8),
    /// Exactly the two outputs at the given indexes, in that order.
    Two(u8, u8),
}

/// A compact encoding of the input/output sets a signature commits to.
///
/// The common ALL/ALL case serializes to the empty byte string, keeping
/// satisfier signatures at their minimum 64 bytes. Any other combination
/// serializes to a control byte (input mode in the high nibble, output
/// mode in the low nibble) followed by the mode parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SighashType {
    /// The input selection mode.
    pub inputs: InputSelection,
    /// The output selection mode.
    pub outputs: OutputSelection,
}

impl SighashType {
    /// Create the default ALL/ALL sighash type.
    ///
    /// # Returns
    /// A `SighashType` committing to all inputs and all outputs.
    pub fn all() -> Self {
        SighashType {
            inputs: InputSelection::All,
            outputs: OutputSelection::All,
        }
    }

    /// Select all inputs.
    ///
    /// # Returns
    /// Self, for chaining.
    pub fn set_all_in(mut self) -> Self {
        self.inputs = InputSelection::All;
        self
    }

    /// Select the first `n` inputs.
    ///
    /// # Arguments
    /// * `n` - The number of leading inputs to commit to.
    ///
    /// # Returns
    /// Self, for chaining.
    pub fn set_first_n_in(mut self, n: u8) -> Self {
        self.inputs = InputSelection::FirstN(n);
        self
    }

    /// Select only the input being signed.
    ///
    /// # Returns
    /// Self, for chaining.
    pub fn set_this_in(mut self) -> Self {
        self.inputs = InputSelection::ThisOnly;
        self
    }

    /// Select all outputs.
    ///
    /// # Returns
    /// Self, for chaining.
    pub fn set_all_out(mut self) -> Self {
        self.outputs = OutputSelection::All;
        self
    }

    /// Select the first `n` outputs.
    ///
    /// # Arguments
    /// * `n` - The number of leading outputs to commit to.
    ///
    /// # Returns
    /// Self, for chaining.
    pub fn set_first_n_out(mut self, n: u8) -> Self {
        self.outputs = OutputSelection::FirstN(n);
        self
    }

    /// Select exactly the two outputs at indexes `a` and `b`.
    ///
    /// # Arguments
    /// * `a` - First output index.
    /// * `b` - Second output index.
    ///
    /// # Returns
    /// Self, for chaining.
    pub fn set_two_out(mut self, a: u8, b: u8) -> Self {
        self.outputs = OutputSelection::Two(a, b);
        self
    }

    /// Check whether this is the default ALL/ALL type.
    ///
    /// # Returns
    /// `true` for ALL inputs and ALL outputs.
    pub fn is_all(&self) -> bool {
        self.inputs == InputSelection::All && self.outputs == OutputSelection::All
    }

    fn input_mode_bits(&self) -> u8 {
        match self.inputs {
            InputSelection::All => 0,
            InputSelection::FirstN(_) => 1,
            InputSelection::ThisOnly => 2,
        }
    }

    fn output_mode_bits(&self) -> u8 {
        match self.outputs {
            OutputSelection::All => 0,
            OutputSelection::FirstN(_) => 1,
            OutputSelection::Two(_, _) => 2,
        }
    }

    /// Serialize this sighash type.
    ///
    /// # Returns
    /// The empty vector for ALL/ALL; otherwise the control byte followed
    /// by the mode parameter bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        if self.is_all() {
            return Vec::new();
        }
        let mut bytes = vec![(self.input_mode_bits() << 4) | self.output_mode_bits()];
        if let InputSelection::FirstN(n) = self.inputs {
            bytes.push(n);
        }
        match self.outputs {
            OutputSelection::FirstN(n) => bytes.push(n),
            OutputSelection::Two(a, b) => {
                bytes.push(a);
                bytes.push(b);
            }
            OutputSelection::All => {}
        }
        bytes
    }

    /// Deserialize a sighash type.
    ///
    /// The empty buffer is the ALL/ALL type. Mode nibbles above the last
    /// valid enumerator and missing or trailing parameter bytes are all
    /// rejected.
    ///
    /// # Arguments
    /// * `bytes` - The serialized sighash type.
    ///
    /// # Returns
    /// `Ok(SighashType)`, or `TransactionError::InvalidSighashType`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TransactionError> {
        if bytes.is_empty() {
            return Ok(SighashType::all());
        }
        fn next_param(
            bytes: &[u8],
            pos: &mut usize,
            what: &str,
        ) -> Result<u8, TransactionError> {
            let byte = bytes.get(*pos).copied().ok_or_else(|| {
                TransactionError::InvalidSighashType(format!("missing {} parameter", what))
            })?;
            *pos += 1;
            Ok(byte)
        }

        let control = bytes[0];
        let mut pos = 1;

        let inputs = match control >> 4 {
            0 => InputSelection::All,
            1 => InputSelection::FirstN(next_param(bytes, &mut pos, "input count")?),
            2 => InputSelection::ThisOnly,
            m => {
                return Err(TransactionError::InvalidSighashType(format!(
                    "input mode {} out of range",
                    m
                )))
            }
        };
        let outputs = match control & 0x0f {
            0 => OutputSelection::All,
            1 => OutputSelection::FirstN(next_param(bytes, &mut pos, "output count")?),
            2 => {
                let a = next_param(bytes, &mut pos, "first output index")?;
                let b = next_param(bytes, &mut pos, "second output index")?;
                OutputSelection::Two(a, b)
            }
            m => {
                return Err(TransactionError::InvalidSighashType(format!(
                    "output mode {} out of range",
                    m
                )))
            }
        };
        if pos != bytes.len() {
            return Err(TransactionError::InvalidSighashType(format!(
                "{} trailing bytes",
                bytes.len() - pos
            )));
        }
        Ok(SighashType { inputs, outputs })
    }
}

impl Default for SighashType {
    fn default() -> Self {
        Self::all()
    }
}

impl fmt::Display for SighashType {
    /// Render the canonical `<IN>|<OUT>` description.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inputs {
            InputSelection::All => write!(f, "ALL")?,
            InputSelection::FirstN(n) => write!(f, "FIRST_{}_IN", n)?,
            InputSelection::ThisOnly => write!(f, "THIS_IN")?,
        }
        write!(f, "|")?;
        match self.outputs {
            OutputSelection::All => write!(f, "ALL_OUT"),
            OutputSelection::FirstN(n) => write!(f, "FIRST_{}_OUT", n),
            OutputSelection::Two(a, b) => write!(f, "{}_{}_OUT", a, b),
        }
    }
}

impl FromStr for SighashType {
    type Err = TransactionError;

    /// Parse the canonical `<IN>|<OUT>` description.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = |part: &str| {
            TransactionError::InvalidSighashType(format!("unrecognized part '{}'", part))
        };
        let (in_part, out_part) = s
            .split_once('|')
            .ok_or_else(|| TransactionError::InvalidSighashType(format!("missing '|' in '{}'", s)))?;

        let inputs = match in_part {
            "ALL" => InputSelection::All,
            "THIS_IN" => InputSelection::ThisOnly,
            _ => {
                let n = in_part
                    .strip_prefix("FIRST_")
                    .and_then(|rest| rest.strip_suffix("_IN"))
                    .and_then(|n| n.parse::<u8>().ok())
                    .ok_or_else(|| bad(in_part))?;
                InputSelection::FirstN(n)
            }
        };
        let outputs = match out_part {
            "ALL_OUT" => OutputSelection::All,
            _ => {
                if let Some(n) = out_part
                    .strip_prefix("FIRST_")
                    .and_then(|rest| rest.strip_suffix("_OUT"))
                    .and_then(|n| n.parse::<u8>().ok())
                {
                    OutputSelection::FirstN(n)
                } else {
                    let pair = out_part.strip_suffix("_OUT").ok_or_else(|| bad(out_part))?;
                    let (a, b) = pair.split_once('_').ok_or_else(|| bad(out_part))?;
                    OutputSelection::Two(
                        a.parse::<u8>().map_err(|_| bad(out_part))?,
                        b.parse::<u8>().map_err(|_| bad(out_part))?,
                    )
                }
            }
        };
        Ok(SighashType { inputs, outputs })
    }
}

impl Serialize for SighashType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for SighashType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// -----------------------------------------------------------------------
// Digest computation
// -----------------------------------------------------------------------

/// Resolve the selected input indexes for a sighash computation.
fn selected_inputs(
    tx: &Transaction,
    input_index: usize,
    selection: InputSelection,
) -> Result<Vec<usize>, TransactionError> {
    let count = tx.inputs().len();
    match selection {
        InputSelection::All => Ok((0..count).collect()),
        InputSelection::FirstN(n) => {
            let n = n as usize;
            if n > count {
                return Err(TransactionError::InvalidTransaction(format!(
                    "sighash selects the first {} inputs but the transaction has {}",
                    n, count
                )));
            }
            Ok((0..n).collect())
        }
        InputSelection::ThisOnly => Ok(vec![input_index]),
    }
}

/// Resolve the selected output indexes for a sighash computation.
fn selected_outputs(
    tx: &Transaction,
    selection: OutputSelection,
) -> Result<Vec<usize>, TransactionError> {
    let count = tx.outputs().len();
    match selection {
        OutputSelection::All => Ok((0..count).collect()),
        OutputSelection::FirstN(n) => {
            let n = n as usize;
            if n > count {
                return Err(TransactionError::InvalidTransaction(format!(
                    "sighash selects the first {} outputs but the transaction has {}",
                    n, count
                )));
            }
            Ok((0..n).collect())
        }
        OutputSelection::Two(a, b) => {
            for index in [a as usize, b as usize] {
                if index >= count {
                    return Err(TransactionError::InvalidTransaction(format!(
                        "sighash output index {} out of range (tx has {} outputs)",
                        index, count
                    )));
                }
            }
            Ok(vec![a as usize, b as usize])
        }
    }
}

/// Compute the signature digest for one input of a transaction.
///
/// The preimage is assembled from four component sha256d digests over
/// the selected sets, in this exact order:
///
/// 1. version byte
/// 2. prevouts digest (type byte + outpoint per selected input)
/// 3. input amounts digest (8-byte LE per selected input)
/// 4. sequence digest (4-byte LE per selected input)
/// 5. varint-prefixed subscript bytes
/// 6. outputs digest (full wire form per selected output)
/// 7. lock time (4-byte LE)
/// 8. varint-prefixed serialized sighash type
///
/// The amounts digest sits before the sequence digest; independent
/// verifiers hash in the same order.
///
/// # Arguments
/// * `tx` - The transaction being signed.
/// * `input_index` - Index of the input being signed.
/// * `sighash_type` - The input/output selection to commit to.
/// * `subscript` - The script bytes hashed into the digest.
///
/// # Returns
/// The 32-byte digest, byte-reversed for presentation, or an error for
/// out-of-range indexes.
pub fn signature_digest(
    tx: &Transaction,
    input_index: usize,
    sighash_type: &SighashType,
    subscript: &Script,
) -> Result<[u8; 32], TransactionError> {
    if input_index >= tx.inputs().len() {
        return Err(TransactionError::InvalidTransaction(format!(
            "input index {} out of range (tx has {} inputs)",
            input_index,
            tx.inputs().len()
        )));
    }

    let input_set = selected_inputs(tx, input_index, sighash_type.inputs)?;
    let output_set = selected_outputs(tx, sighash_type.outputs)?;

    // Component digests over the selected sets, in transaction order.
    let mut prevouts = TxWriter::with_capacity(input_set.len() * 33);
    let mut amounts = TxWriter::with_capacity(input_set.len() * 8);
    let mut sequences = TxWriter::with_capacity(input_set.len() * 4);
    for &i in &input_set {
        let input = &tx.inputs()[i];
        prevouts.write_u8(input.kind.as_byte());
        prevouts.write_hash(&input.outpoint);
        amounts.write_u64_le(input.amount);
        sequences.write_u32_le(input.sequence);
    }
    let mut outputs = TxWriter::new();
    for &i in &output_set {
        tx.outputs()[i].write_to(&mut outputs);
    }

    let mut preimage = TxWriter::with_capacity(256);
    preimage.write_u8(tx.version);
    preimage.write_bytes(&sha256d(prevouts.as_bytes()));
    preimage.write_bytes(&sha256d(amounts.as_bytes()));
    preimage.write_bytes(&sha256d(sequences.as_bytes()));
    let subscript_bytes = subscript.to_bytes();
    preimage.write_varint(VarInt::from(subscript_bytes.len()));
    preimage.write_bytes(&subscript_bytes);
    preimage.write_bytes(&sha256d(outputs.as_bytes()));
    preimage.write_u32_le(tx.lock_time);
    let sighash_bytes = sighash_type.to_bytes();
    preimage.write_varint(VarInt::from(sighash_bytes.len()));
    preimage.write_bytes(&sighash_bytes);

    let mut digest = sha256d(preimage.as_bytes());
    digest.reverse();
    Ok(digest)
}
