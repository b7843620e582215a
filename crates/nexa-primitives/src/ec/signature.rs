//! 64-byte Schnorr signature wire type.

use std::fmt;

use crate::PrimitivesError;

/// Length of a Schnorr signature in bytes.
pub const SCHNORR_SIGNATURE_LEN: usize = 64;

/// A 64-byte Schnorr signature as carried in satisfier scripts.
///
/// Stored exactly as produced by the signing primitive: the 32-byte R
/// x-coordinate followed by the 32-byte s scalar.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct SchnorrSignature([u8; SCHNORR_SIGNATURE_LEN]);

impl SchnorrSignature {
    /// Create a signature from a raw 64-byte array.
    ///
    /// # Arguments
    /// * `bytes` - The 64 signature bytes.
    ///
    /// # Returns
    /// A new `SchnorrSignature`.
    pub fn new(bytes: [u8; SCHNORR_SIGNATURE_LEN]) -> Self {
        SchnorrSignature(bytes)
    }

    /// Create a signature from a byte slice.
    ///
    /// # Arguments
    /// * `bytes` - A slice that must be exactly 64 bytes.
    ///
    /// # Returns
    /// `Ok(SchnorrSignature)` if the slice is 64 bytes, or an error otherwise.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PrimitivesError> {
        if bytes.len() != SCHNORR_SIGNATURE_LEN {
            return Err(PrimitivesError::InvalidSignature(format!(
                "expected {} bytes, got {}",
                SCHNORR_SIGNATURE_LEN,
                bytes.len()
            )));
        }
        let mut arr = [0u8; SCHNORR_SIGNATURE_LEN];
        arr.copy_from_slice(bytes);
        Ok(SchnorrSignature(arr))
    }

    /// Create a signature from a hex string.
    ///
    /// # Arguments
    /// * `hex_str` - A 128-character hex string.
    ///
    /// # Returns
    /// `Ok(SchnorrSignature)` on success, or an error for invalid input.
    pub fn from_hex(hex_str: &str) -> Result<Self, PrimitivesError> {
        let bytes = hex::decode(hex_str)?;
        Self::from_bytes(&bytes)
    }

    /// Return a reference to the raw signature bytes.
    ///
    /// # Returns
    /// The 64 signature bytes.
    pub fn as_bytes(&self) -> &[u8; SCHNORR_SIGNATURE_LEN] {
        &self.0
    }

    /// Return the signature as a lowercase hex string.
    ///
    /// # Returns
    /// A 128-character hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for SchnorrSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SchnorrSignature({})", self.to_hex())
    }
}

impl fmt::Display for SchnorrSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}
