//! secp256k1 keys and Schnorr signatures.
//!
//! Transaction authorization on this chain uses 64-byte Schnorr signatures
//! over 32-byte sighash digests. `PrivateKey`/`PublicKey` wrap the k256
//! types and add the serializations the SDK needs (hex, WIF, compressed
//! SEC1 points).

mod private_key;
mod public_key;
mod signature;

pub use private_key::PrivateKey;
pub use public_key::PublicKey;
pub use signature::SchnorrSignature;

/// Byte order of a 32-byte digest handed to the Schnorr primitives.
///
/// Sighash digests are presented in reversed (display) order; signing and
/// verification with `LittleEndian` flips them back to raw hash order
/// before the signature math. `BigEndian` signs the bytes as given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestOrder {
    /// Sign/verify the digest bytes exactly as supplied.
    BigEndian,
    /// Reverse the digest bytes before signing/verifying.
    LittleEndian,
}

/// Normalize a digest according to the requested byte order.
pub(crate) fn order_digest(digest: &[u8; 32], order: DigestOrder) -> [u8; 32] {
    match order {
        DigestOrder::BigEndian => *digest,
        DigestOrder::LittleEndian => {
            let mut reversed = *digest;
            reversed.reverse();
            reversed
        }
    }
}
