//! secp256k1 private key with Schnorr signing and WIF serialization.

use k256::schnorr::signature::hazmat::PrehashSigner;
use k256::SecretKey;
use rand::rngs::OsRng;

use crate::ec::public_key::PublicKey;
use crate::ec::signature::SchnorrSignature;
use crate::ec::{order_digest, DigestOrder};
use crate::hash::sha256d;
use crate::PrimitivesError;

/// Length of a serialized private key in bytes.
const PRIVATE_KEY_BYTES_LEN: usize = 32;

/// Mainnet WIF prefix byte.
const MAINNET_PREFIX: u8 = 0x80;

/// Compression flag byte appended to WIF for compressed public keys.
const COMPRESS_MAGIC: u8 = 0x01;

/// A secp256k1 private key for Schnorr signing.
///
/// Wraps a k256 `SecretKey` and provides WIF serialization and digest
/// signing with an explicit byte-order convention.
#[derive(Clone, Debug)]
pub struct PrivateKey {
    /// The underlying k256 secret key.
    inner: SecretKey,
}

impl PrivateKey {
    /// Generate a new random private key using the OS random number generator.
    ///
    /// # Returns
    /// A new randomly generated `PrivateKey`.
    pub fn new() -> Self {
        PrivateKey {
            inner: SecretKey::random(&mut OsRng),
        }
    }

    /// Create a private key from a raw 32-byte scalar.
    ///
    /// # Arguments
    /// * `bytes` - A 32-byte slice representing the private key scalar.
    ///
    /// # Returns
    /// `Ok(PrivateKey)` if the bytes represent a valid non-zero scalar,
    /// or an error otherwise.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PrimitivesError> {
        if bytes.len() != PRIVATE_KEY_BYTES_LEN {
            return Err(PrimitivesError::InvalidPrivateKey(format!(
                "expected {} bytes, got {}",
                PRIVATE_KEY_BYTES_LEN,
                bytes.len()
            )));
        }
        let inner = SecretKey::from_slice(bytes)
            .map_err(|e| PrimitivesError::InvalidPrivateKey(e.to_string()))?;
        Ok(PrivateKey { inner })
    }

    /// Create a private key from a hexadecimal string.
    ///
    /// # Arguments
    /// * `hex_str` - A 64-character hex string representing the 32-byte scalar.
    ///
    /// # Returns
    /// `Ok(PrivateKey)` on success, or an error if the hex or scalar is invalid.
    pub fn from_hex(hex_str: &str) -> Result<Self, PrimitivesError> {
        if hex_str.is_empty() {
            return Err(PrimitivesError::InvalidPrivateKey(
                "private key hex is empty".to_string(),
            ));
        }
        let bytes =
            hex::decode(hex_str).map_err(|e| PrimitivesError::InvalidHex(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    /// Create a private key from a WIF (Wallet Import Format) string.
    ///
    /// Decodes the Base58 string, validates the sha256d checksum, and
    /// extracts the 32-byte scalar.
    ///
    /// # Arguments
    /// * `wif` - A Base58Check-encoded WIF string (compressed or uncompressed).
    ///
    /// # Returns
    /// `Ok(PrivateKey)` on success, or an error if the WIF is malformed or
    /// the checksum fails.
    pub fn from_wif(wif: &str) -> Result<Self, PrimitivesError> {
        let decoded = bs58::decode(wif)
            .into_vec()
            .map_err(|e| PrimitivesError::InvalidWif(e.to_string()))?;

        // 1 prefix + 32 key + [1 compress flag] + 4 checksum.
        match decoded.len() {
            38 => {
                if decoded[33] != COMPRESS_MAGIC {
                    return Err(PrimitivesError::InvalidWif(
                        "invalid compression flag".to_string(),
                    ));
                }
            }
            37 => {}
            n => {
                return Err(PrimitivesError::InvalidWif(format!(
                    "invalid WIF length {}",
                    n
                )));
            }
        }

        if decoded[0] != MAINNET_PREFIX {
            return Err(PrimitivesError::InvalidWif(format!(
                "invalid WIF prefix 0x{:02x}",
                decoded[0]
            )));
        }

        let (payload, checksum) = decoded.split_at(decoded.len() - 4);
        let expected = &sha256d(payload)[..4];
        if checksum != expected {
            return Err(PrimitivesError::InvalidWif("checksum mismatch".to_string()));
        }

        Self::from_bytes(&payload[1..33])
    }

    /// Serialize this private key as a compressed-key WIF string.
    ///
    /// # Returns
    /// A Base58Check WIF string with the compression flag set.
    pub fn to_wif(&self) -> String {
        let mut payload = Vec::with_capacity(38);
        payload.push(MAINNET_PREFIX);
        payload.extend_from_slice(&self.to_bytes());
        payload.push(COMPRESS_MAGIC);
        let checksum = sha256d(&payload);
        payload.extend_from_slice(&checksum[..4]);
        bs58::encode(payload).into_string()
    }

    /// Return the raw 32-byte scalar.
    ///
    /// # Returns
    /// The private key bytes.
    pub fn to_bytes(&self) -> [u8; PRIVATE_KEY_BYTES_LEN] {
        let mut out = [0u8; PRIVATE_KEY_BYTES_LEN];
        out.copy_from_slice(&self.inner.to_bytes());
        out
    }

    /// Return the private key as a lowercase hex string.
    ///
    /// # Returns
    /// A 64-character hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Derive the corresponding public key.
    ///
    /// # Returns
    /// The `PublicKey` for this private key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey::from_inner(self.inner.public_key())
    }

    /// Sign a 32-byte digest with this key using Schnorr.
    ///
    /// The digest is normalized per `order` before the signature math;
    /// sighash digests are signed with `DigestOrder::LittleEndian`.
    ///
    /// # Arguments
    /// * `digest` - The 32-byte digest to sign.
    /// * `order` - Byte-order convention for the digest.
    ///
    /// # Returns
    /// `Ok(SchnorrSignature)` with the 64-byte signature, or an error if
    /// signing fails.
    pub fn sign_schnorr(
        &self,
        digest: &[u8; 32],
        order: DigestOrder,
    ) -> Result<SchnorrSignature, PrimitivesError> {
        let message = order_digest(digest, order);
        let signing_key = k256::schnorr::SigningKey::from_bytes(&self.to_bytes())
            .map_err(|e| PrimitivesError::InvalidPrivateKey(e.to_string()))?;
        let signature = signing_key
            .sign_prehash(&message)
            .map_err(|e| PrimitivesError::InvalidSignature(e.to_string()))?;
        SchnorrSignature::from_bytes(&signature.to_bytes())
    }
}

impl Default for PrivateKey {
    fn default() -> Self {
        Self::new()
    }
}
