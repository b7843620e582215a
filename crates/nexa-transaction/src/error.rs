/// Error types for transaction operations.
#[derive(Debug, thiserror::Error)]
pub enum TransactionError {
    /// The transaction or one of its fields is out of domain
    /// (bad index, count limit, fee mismatch, hash mismatch).
    #[error("invalid transaction: {0}")]
    InvalidTransaction(String),

    /// An error occurred during binary/hex serialization or deserialization.
    #[error("serialization error: {0}")]
    SerializationError(String),

    /// A sighash type buffer or string could not be decoded.
    #[error("invalid sighash type: {0}")]
    InvalidSighashType(String),

    /// An error occurred during input signing (e.g. missing source output).
    #[error("signing error: {0}")]
    SigningError(String),

    /// A signing operation was invoked on an input kind that does not
    /// implement it (opaque inputs).
    #[error("operation not implemented for this input kind")]
    NotImplemented,

    /// An underlying script error (forwarded from `nexa-script`).
    #[error("script error: {0}")]
    Script(#[from] nexa_script::ScriptError),

    /// An underlying primitives error (forwarded from `nexa-primitives`).
    #[error("primitives error: {0}")]
    Primitives(#[from] nexa_primitives::PrimitivesError),
}
