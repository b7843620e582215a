//! secp256k1 public key with Schnorr verification.

use std::fmt;

use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::schnorr::signature::hazmat::PrehashVerifier;

use crate::ec::signature::SchnorrSignature;
use crate::ec::{order_digest, DigestOrder};
use crate::PrimitivesError;

/// Length of a compressed public key in bytes (prefix + 32-byte x-coordinate).
const COMPRESSED_LEN: usize = 33;

/// Length of an uncompressed public key in bytes (prefix + x + y).
const UNCOMPRESSED_LEN: usize = 65;

/// A secp256k1 public key for signature verification.
///
/// Wraps a k256 `PublicKey` and provides compressed/uncompressed SEC1
/// serialization and Schnorr verification against the key's x-coordinate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublicKey {
    /// The underlying k256 public key.
    inner: k256::PublicKey,
}

impl PublicKey {
    /// Wrap a k256 public key.
    pub(crate) fn from_inner(inner: k256::PublicKey) -> Self {
        PublicKey { inner }
    }

    /// Create a PublicKey from raw SEC1 encoded bytes.
    ///
    /// Accepts both compressed (33-byte) and uncompressed (65-byte) formats.
    ///
    /// # Arguments
    /// * `bytes` - SEC1-encoded public key bytes.
    ///
    /// # Returns
    /// `Ok(PublicKey)` on success, or an error if the bytes are not a valid
    /// curve point.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PrimitivesError> {
        if bytes.is_empty() {
            return Err(PrimitivesError::InvalidPublicKey(
                "pubkey bytes are empty".to_string(),
            ));
        }
        let inner = k256::PublicKey::from_sec1_bytes(bytes)
            .map_err(|e| PrimitivesError::InvalidPublicKey(e.to_string()))?;
        Ok(PublicKey { inner })
    }

    /// Create a PublicKey from a hex-encoded SEC1 string.
    ///
    /// # Arguments
    /// * `hex_str` - A hex string of a compressed (66 chars) or uncompressed
    ///   (130 chars) key.
    ///
    /// # Returns
    /// `Ok(PublicKey)` on success, or an error if the hex or point is invalid.
    pub fn from_hex(hex_str: &str) -> Result<Self, PrimitivesError> {
        let bytes = hex::decode(hex_str)?;
        Self::from_bytes(&bytes)
    }

    /// Serialize the public key in compressed SEC1 format (33 bytes).
    ///
    /// The first byte is 0x02 (even Y) or 0x03 (odd Y), followed by the
    /// 32-byte X coordinate.
    ///
    /// # Returns
    /// A 33-byte array containing the compressed public key.
    pub fn to_compressed(&self) -> [u8; COMPRESSED_LEN] {
        let point = self.inner.to_encoded_point(true);
        let mut out = [0u8; COMPRESSED_LEN];
        out.copy_from_slice(point.as_bytes());
        out
    }

    /// Serialize the public key in uncompressed SEC1 format (65 bytes).
    ///
    /// # Returns
    /// A 65-byte array containing the uncompressed public key.
    pub fn to_uncompressed(&self) -> [u8; UNCOMPRESSED_LEN] {
        let point = self.inner.to_encoded_point(false);
        let mut out = [0u8; UNCOMPRESSED_LEN];
        out.copy_from_slice(point.as_bytes());
        out
    }

    /// Serialize the public key as a lowercase hex string (compressed form).
    ///
    /// # Returns
    /// A 66-character hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_compressed())
    }

    /// Verify a Schnorr signature over a 32-byte digest.
    ///
    /// The digest is normalized per `order` before verification, mirroring
    /// `PrivateKey::sign_schnorr`. Verification is done against the key's
    /// x-coordinate.
    ///
    /// # Arguments
    /// * `digest` - The 32-byte digest that was signed.
    /// * `signature` - The 64-byte Schnorr signature.
    /// * `order` - Byte-order convention for the digest.
    ///
    /// # Returns
    /// `true` if the signature is valid for this key and digest.
    pub fn verify_schnorr(
        &self,
        digest: &[u8; 32],
        signature: &SchnorrSignature,
        order: DigestOrder,
    ) -> bool {
        let message = order_digest(digest, order);
        let x_only = &self.to_compressed()[1..];
        let verifying_key = match k256::schnorr::VerifyingKey::from_bytes(x_only) {
            Ok(vk) => vk,
            Err(_) => return false,
        };
        let sig = match k256::schnorr::Signature::try_from(signature.as_bytes().as_slice()) {
            Ok(sig) => sig,
            Err(_) => return false,
        };
        verifying_key.verify_prehash(&message, &sig).is_ok()
    }
}

impl fmt::Display for PublicKey {
    /// Display the public key as compressed hex.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}
