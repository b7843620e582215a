//! Transaction signature transport object.
//!
//! Packages a Schnorr signature with the metadata needed to place it
//! into a satisfier script and to re-verify it later: the input index,
//! the signing public key, the subscript the digest committed to, and
//! the sighash type.

use serde::{Deserialize, Serialize};

use nexa_primitives::{DigestOrder, PublicKey, SchnorrSignature};
use nexa_script::Script;

use crate::sighash::{signature_digest, SighashType};
use crate::transaction::Transaction;
use crate::TransactionError;

/// A signature over one transaction input, with its placement metadata.
#[derive(Clone, Debug, PartialEq)]
pub struct TxSignature {
    /// Index of the signed input.
    pub input_index: u32,
    /// The public key the signature verifies against.
    pub public_key: PublicKey,
    /// The subscript hashed into the signed digest.
    pub subscript: Script,
    /// The input/output selection the signature commits to.
    pub sig_type: SighashType,
    /// The raw 64-byte Schnorr signature.
    pub signature: SchnorrSignature,
}

impl TxSignature {
    /// Create a new transaction signature.
    ///
    /// # Arguments
    /// * `input_index` - Index of the signed input.
    /// * `public_key` - The signing public key.
    /// * `subscript` - The subscript the digest committed to.
    /// * `sig_type` - The sighash type.
    /// * `signature` - The raw Schnorr signature.
    ///
    /// # Returns
    /// A new `TxSignature`.
    pub fn new(
        input_index: u32,
        public_key: PublicKey,
        subscript: Script,
        sig_type: SighashType,
        signature: SchnorrSignature,
    ) -> Self {
        TxSignature {
            input_index,
            public_key,
            subscript,
            sig_type,
            signature,
        }
    }

    /// Return the satisfier form of this signature.
    ///
    /// The serialized sighash type is appended after the raw 64 signature
    /// bytes; for the default ALL/ALL type nothing is appended. This
    /// combined buffer is what gets pushed into satisfier scripts.
    ///
    /// # Returns
    /// The 64-68 byte satisfier buffer.
    pub fn to_tx_format(&self) -> Vec<u8> {
        let mut bytes = self.signature.as_bytes().to_vec();
        bytes.extend_from_slice(&self.sig_type.to_bytes());
        bytes
    }

    /// Re-verify this signature against a transaction.
    ///
    /// Recomputes the digest from the stored subscript and sighash type
    /// and checks the Schnorr signature against the stored public key.
    ///
    /// # Arguments
    /// * `tx` - The transaction the signature belongs to.
    ///
    /// # Returns
    /// `Ok(true)` if the signature verifies, `Ok(false)` if it does not,
    /// or an error if the digest cannot be computed.
    pub fn verify(&self, tx: &Transaction) -> Result<bool, TransactionError> {
        let digest = signature_digest(
            tx,
            self.input_index as usize,
            &self.sig_type,
            &self.subscript,
        )?;
        Ok(self
            .public_key
            .verify_schnorr(&digest, &self.signature, DigestOrder::LittleEndian))
    }
}

/// Plain-object projection of a transaction signature.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TxSignatureDto {
    input_index: u32,
    public_key: String,
    subscript: Script,
    sig_type: SighashType,
    signature: String,
}

impl Serialize for TxSignature {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        TxSignatureDto {
            input_index: self.input_index,
            public_key: self.public_key.to_hex(),
            subscript: self.subscript.clone(),
            sig_type: self.sig_type,
            signature: self.signature.to_hex(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for TxSignature {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let dto = TxSignatureDto::deserialize(deserializer)?;
        Ok(TxSignature {
            input_index: dto.input_index,
            public_key: PublicKey::from_hex(&dto.public_key).map_err(serde::de::Error::custom)?,
            subscript: dto.subscript,
            sig_type: dto.sig_type,
            signature: SchnorrSignature::from_hex(&dto.signature)
                .map_err(serde::de::Error::custom)?,
        })
    }
}
