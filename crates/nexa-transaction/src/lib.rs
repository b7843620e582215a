/// Nexa SDK - Transaction building, signing, and serialization.
///
/// Provides the Transaction type with its wire codec and dual idem/id
/// identity, the polymorphic input family, selective sighash digests,
/// Schnorr transaction signatures, fee/change bookkeeping, and the
/// TransactionBuilder orchestration layer.

pub mod builder;
pub mod input;
pub mod output;
pub mod sighash;
pub mod signature;
pub mod transaction;

mod error;
pub use builder::{TemplateData, TransactionBuilder, Utxo};
pub use error::TransactionError;
pub use input::{Input, InputKind, InputVariant};
pub use output::{Output, OutputKind};
pub use sighash::{InputSelection, OutputSelection, SighashType};
pub use signature::TxSignature;
pub use transaction::{SerializationChecks, Transaction};

#[cfg(test)]
mod tests;
