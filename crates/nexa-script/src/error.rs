/// Error types for script operations.
///
/// Covers binary/text parsing errors, push construction failures,
/// classifier accessor misuse, and address validation.
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    /// The script byte buffer is truncated mid-push.
    #[error("invalid script buffer")]
    InvalidBuffer,

    /// Generic invalid script error with a reason.
    #[error("invalid script: {0}")]
    InvalidScript(String),

    /// A textual opcode name is not in the opcode table.
    #[error("unknown opcode name: {0}")]
    UnknownOpcode(String),

    /// Push data exceeds the maximum size a push operation can carry.
    #[error("data too big for a push operation")]
    DataTooBig,

    /// A chunk index is out of range.
    #[error("script index out of range")]
    IndexOutOfRange,

    /// Invalid hex string.
    #[error("invalid hex: {0}")]
    InvalidHex(String),

    /// Hex decoding error.
    #[error("hex decode error: {0}")]
    HexDecode(#[from] hex::FromHexError),

    /// Accessor called on a script that is not a public key hash output.
    #[error("not a public key hash output")]
    NotPublicKeyHashOut,

    /// Accessor called on a script that is not a template output.
    #[error("not a template output")]
    NotTemplateOut,

    /// Accessor called on a script that is not a token description output.
    #[error("not a token description output")]
    NotTokenDescriptionOut,

    /// Invalid address string.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// The script shape has no address form.
    #[error("address not supported: {0}")]
    UnsupportedAddress(String),

    /// A group amount could not be encoded or decoded.
    #[error("invalid group amount: {0}")]
    InvalidGroupAmount(String),

    /// Error from the primitives crate.
    #[error("primitives error: {0}")]
    Primitives(#[from] nexa_primitives::PrimitivesError),
}
