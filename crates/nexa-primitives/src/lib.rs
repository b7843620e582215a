/// Nexa SDK - Hash, elliptic-curve, and binary serialization primitives.
///
/// Provides the hash functions used by the protocol (SHA-256d, Hash160),
/// the byte-reversed 32-byte chain hash type, secp256k1 keys with Schnorr
/// signing, and the reader/writer pair for wire-format serialization.

pub mod chainhash;
pub mod ec;
pub mod hash;
pub mod util;

mod error;
pub use error::PrimitivesError;
pub use chainhash::Hash;
pub use ec::{DigestOrder, PrivateKey, PublicKey, SchnorrSignature};
