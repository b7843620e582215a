//! Base58Check addresses.
//!
//! An address names a 20-byte script commitment together with the kind
//! of locking script it expands to: a legacy pay-to-public-key-hash
//! output or a well-known-template output. Conversion to and from
//! locking scripts lives here; the hash itself comes from Hash160 of the
//! public key (P2PKH) or of the constraint script (template).

use std::fmt;
use std::str::FromStr;

use nexa_primitives::hash::{hash160, sha256d};
use nexa_primitives::PublicKey;

use crate::builder;
use crate::{Script, ScriptError};

/// Version byte for pay-to-public-key-hash addresses.
const PUBKEY_HASH_VERSION: u8 = 0x00;

/// Version byte for well-known-template addresses.
const TEMPLATE_VERSION: u8 = 0x08;

/// The kind of locking script an address expands to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressType {
    /// Legacy pay-to-public-key-hash output.
    PublicKeyHash,
    /// Well-known-template (pay-to-public-key-template) output.
    Template,
}

impl AddressType {
    fn version_byte(&self) -> u8 {
        match self {
            AddressType::PublicKeyHash => PUBKEY_HASH_VERSION,
            AddressType::Template => TEMPLATE_VERSION,
        }
    }
}

/// A Base58Check address wrapping a 20-byte script commitment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    /// The 20-byte Hash160 commitment.
    pub hash: [u8; 20],
    /// The locking script kind.
    pub address_type: AddressType,
}

impl Address {
    /// Create an address from a hash and type.
    ///
    /// # Arguments
    /// * `hash` - The 20-byte commitment.
    /// * `address_type` - The locking script kind.
    ///
    /// # Returns
    /// A new `Address`.
    pub fn new(hash: [u8; 20], address_type: AddressType) -> Self {
        Address { hash, address_type }
    }

    /// Derive a template address from a public key.
    ///
    /// The commitment is Hash160 of the constraint script (the key push).
    ///
    /// # Arguments
    /// * `public_key` - The public key to derive from.
    ///
    /// # Returns
    /// The template `Address` for the key.
    pub fn from_public_key(public_key: &PublicKey) -> Self {
        let constraint = builder::constraint_from_public_key(public_key);
        Address {
            hash: hash160(&constraint.to_bytes()),
            address_type: AddressType::Template,
        }
    }

    /// Decode an address from its Base58Check string form.
    ///
    /// # Arguments
    /// * `text` - The address string.
    ///
    /// # Returns
    /// `Ok(Address)` on success, or an error for bad encoding, checksum,
    /// length, or version byte.
    pub fn from_string(text: &str) -> Result<Self, ScriptError> {
        let decoded = bs58::decode(text)
            .into_vec()
            .map_err(|e| ScriptError::InvalidAddress(e.to_string()))?;
        if decoded.len() != 25 {
            return Err(ScriptError::InvalidAddress(format!(
                "invalid length {} for '{}'",
                decoded.len(),
                text
            )));
        }
        let (payload, checksum) = decoded.split_at(21);
        if checksum != &sha256d(payload)[..4] {
            return Err(ScriptError::InvalidAddress(format!(
                "checksum mismatch for '{}'",
                text
            )));
        }
        let address_type = match payload[0] {
            PUBKEY_HASH_VERSION => AddressType::PublicKeyHash,
            TEMPLATE_VERSION => AddressType::Template,
            v => {
                return Err(ScriptError::UnsupportedAddress(format!(
                    "version byte 0x{:02x}",
                    v
                )))
            }
        };
        let mut hash = [0u8; 20];
        hash.copy_from_slice(&payload[1..]);
        Ok(Address { hash, address_type })
    }

    /// Encode this address in Base58Check string form.
    ///
    /// # Returns
    /// The address string.
    pub fn to_base58(&self) -> String {
        let mut payload = Vec::with_capacity(25);
        payload.push(self.address_type.version_byte());
        payload.extend_from_slice(&self.hash);
        let checksum = sha256d(&payload);
        payload.extend_from_slice(&checksum[..4]);
        bs58::encode(payload).into_string()
    }

    /// Expand this address to its locking script.
    ///
    /// # Returns
    /// The P2PKH or P2PKT locking script.
    pub fn to_script(&self) -> Script {
        match self.address_type {
            AddressType::PublicKeyHash => builder::pay_to_public_key_hash_out(&self.hash),
            AddressType::Template => {
                builder::pay_to_public_key_template_out(&self.hash, None)
                    .expect("20-byte constraint hash always fits")
            }
        }
    }

    /// Derive the address form of a locking script.
    ///
    /// Only ungrouped P2PKH and P2PKT outputs have an address form.
    ///
    /// # Arguments
    /// * `script` - The locking script to convert.
    ///
    /// # Returns
    /// `Ok(Address)`, or `ScriptError::UnsupportedAddress` for any other
    /// script shape.
    pub fn from_script(script: &Script) -> Result<Self, ScriptError> {
        if script.is_public_key_hash_out() {
            let hash_bytes = script.get_public_key_hash()?;
            let mut hash = [0u8; 20];
            hash.copy_from_slice(&hash_bytes);
            return Ok(Address {
                hash,
                address_type: AddressType::PublicKeyHash,
            });
        }
        if script.is_public_key_template_out() {
            if script.get_group_data()?.is_some() {
                return Err(ScriptError::UnsupportedAddress(
                    "grouped template outputs have no address form".to_string(),
                ));
            }
            let hash_bytes = script
                .get_constraint_hash()?
                .expect("well-known template always commits a constraint");
            let mut hash = [0u8; 20];
            hash.copy_from_slice(&hash_bytes);
            return Ok(Address {
                hash,
                address_type: AddressType::Template,
            });
        }
        Err(ScriptError::UnsupportedAddress(
            "script is not a P2PKH or template output".to_string(),
        ))
    }
}

impl fmt::Display for Address {
    /// Display the address in Base58Check form.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_base58())
    }
}

impl FromStr for Address {
    type Err = ScriptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Address::from_string(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nexa_primitives::PrivateKey;

    fn test_key() -> PublicKey {
        PrivateKey::from_hex("1e99423a4ed27608a15a2616a2b0e9e52ced330ac530edcc32c8ffc6a526aedd")
            .unwrap()
            .public_key()
    }

    /// Base58 round trip for both address kinds.
    #[test]
    fn test_base58_roundtrip() {
        for address_type in [AddressType::PublicKeyHash, AddressType::Template] {
            let address = Address::new([0x42; 20], address_type);
            let text = address.to_base58();
            let back: Address = text.parse().expect("should parse own encoding");
            assert_eq!(back, address);
        }
    }

    /// A corrupted checksum is rejected.
    #[test]
    fn test_bad_checksum() {
        let mut text = Address::new([0x42; 20], AddressType::Template).to_base58();
        let last = text.pop().unwrap();
        text.push(if last == '1' { '2' } else { '1' });
        assert!(Address::from_string(&text).is_err());
    }

    /// Script round trip for a P2PKH address.
    #[test]
    fn test_p2pkh_script_roundtrip() {
        let address = Address::new([0x42; 20], AddressType::PublicKeyHash);
        let script = address.to_script();
        assert!(script.is_public_key_hash_out());
        assert_eq!(Address::from_script(&script).unwrap(), address);
    }

    /// Script round trip for a template address derived from a key.
    #[test]
    fn test_template_script_roundtrip() {
        let address = Address::from_public_key(&test_key());
        let script = address.to_script();
        assert!(script.is_public_key_template_out());
        assert_eq!(Address::from_script(&script).unwrap(), address);
    }

    /// Scripts without an address form are rejected.
    #[test]
    fn test_from_script_unsupported() {
        let data = crate::builder::data_out(&[b"hello"]).unwrap();
        assert!(Address::from_script(&data).is_err());

        let grouped = crate::builder::pay_to_public_key(
            &test_key(),
            Some(&crate::builder::GroupAnnotation {
                id: vec![0x33; 32],
                amount: 5,
            }),
        )
        .unwrap();
        assert!(Address::from_script(&grouped).is_err());
    }
}
