/// Error types for primitive operations.
///
/// Covers hash construction, key parsing, Schnorr signing, and binary
/// reader failures.
#[derive(Debug, thiserror::Error)]
pub enum PrimitivesError {
    /// A read ran past the end of the input buffer.
    #[error("unexpected end of data")]
    UnexpectedEof,

    /// Invalid hex string.
    #[error("invalid hex: {0}")]
    InvalidHex(String),

    /// Hex decoding error.
    #[error("hex decode error: {0}")]
    HexDecode(#[from] hex::FromHexError),

    /// A 32-byte hash could not be constructed from the given input.
    #[error("invalid hash: {0}")]
    InvalidHash(String),

    /// The private key bytes do not form a valid secp256k1 scalar.
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    /// The public key bytes do not form a valid secp256k1 point.
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    /// A WIF string failed to decode or its checksum did not match.
    #[error("invalid WIF: {0}")]
    InvalidWif(String),

    /// A Schnorr signature could not be produced or parsed.
    #[error("invalid signature: {0}")]
    InvalidSignature(String),
}

impl From<k256::elliptic_curve::Error> for PrimitivesError {
    fn from(e: k256::elliptic_curve::Error) -> Self {
        PrimitivesError::InvalidPublicKey(e.to_string())
    }
}
