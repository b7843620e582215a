/// Nexa SDK - Script parsing, classification, and construction.
///
/// Provides the chunked Script type with its binary and textual codecs,
/// structural classification into the known output/input shapes
/// (pay-to-public-key-hash, pay-to-public-key-template,
/// pay-to-script-template, data carrier, token description), canonical
/// script builders, and the Base58Check address type.

pub mod address;
pub mod builder;
pub mod chunk;
pub mod opcodes;
pub mod script;
pub mod script_num;

mod error;
pub use address::{Address, AddressType};
pub use chunk::ScriptChunk;
pub use error::ScriptError;
pub use script::Script;
