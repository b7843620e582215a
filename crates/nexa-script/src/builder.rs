//! Canonical script construction.
//!
//! Factory functions for the output and input script shapes the SDK
//! produces: pay-to-public-key-hash, pay-to-public-key-template
//! (well-known template 1), generic pay-to-script-template, data
//! carriers, and token descriptions, plus the shared template unlocking
//! assembler used when satisfying template inputs.

use nexa_primitives::hash::hash160;
use nexa_primitives::PublicKey;

use crate::opcodes::*;
use crate::{Script, ScriptError};

/// Size of a group identifier in bytes.
pub const GROUP_ID_LEN: usize = 32;

/// A (group identifier, group amount) annotation for template outputs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupAnnotation {
    /// The group identifier (at least 32 bytes).
    pub id: Vec<u8>,
    /// The amount of group tokens carried by the output.
    pub amount: u64,
}

/// Encode a group amount as the 2, 4, or 8 byte little-endian push the
/// output format uses.
///
/// # Arguments
/// * `amount` - The group token amount.
///
/// # Returns
/// The little-endian amount bytes.
pub fn encode_group_amount(amount: u64) -> Vec<u8> {
    if amount <= u16::MAX as u64 {
        (amount as u16).to_le_bytes().to_vec()
    } else if amount <= u32::MAX as u64 {
        (amount as u32).to_le_bytes().to_vec()
    } else {
        amount.to_le_bytes().to_vec()
    }
}

/// Append a group annotation (or the ungrouped OP_FALSE marker) to a
/// script under construction.
fn push_group_slot(script: &mut Script, group: Option<&GroupAnnotation>) -> Result<(), ScriptError> {
    match group {
        None => {
            script.add_opcode(OP_FALSE);
        }
        Some(group) => {
            if group.id.len() < GROUP_ID_LEN {
                return Err(ScriptError::InvalidScript(format!(
                    "group id must be at least {} bytes, got {}",
                    GROUP_ID_LEN,
                    group.id.len()
                )));
            }
            script.add_data(&group.id)?;
            script.add_data(&encode_group_amount(group.amount))?;
        }
    }
    Ok(())
}

/// Build a pay-to-public-key-hash locking script.
///
/// Produces `OP_DUP OP_HASH160 <20-byte hash> OP_EQUALVERIFY OP_CHECKSIG`.
///
/// # Arguments
/// * `public_key_hash` - The 20-byte Hash160 of the public key.
///
/// # Returns
/// The 25-byte P2PKH locking script.
pub fn pay_to_public_key_hash_out(public_key_hash: &[u8; 20]) -> Script {
    let mut script = Script::new();
    script.add_opcode(OP_DUP).add_opcode(OP_HASH160);
    script
        .add_data(public_key_hash)
        .expect("20-byte push always fits");
    script.add_opcode(OP_EQUALVERIFY).add_opcode(OP_CHECKSIG);
    script
}

/// Build the constraint script for the well-known public key template:
/// a single push of the compressed public key.
///
/// # Arguments
/// * `public_key` - The public key to constrain spending to.
///
/// # Returns
/// The 34-byte constraint script.
pub fn constraint_from_public_key(public_key: &PublicKey) -> Script {
    let mut script = Script::new();
    script
        .add_data(&public_key.to_compressed())
        .expect("33-byte push always fits");
    script
}

/// Build the well-known template 1 script. It is implicit in
/// pay-to-public-key-template outputs and never transmitted: the
/// constraint (a public key push) lands on the alt stack and the
/// satisfier signature is checked against it.
///
/// # Returns
/// The 2-opcode template script.
pub fn well_known_template_1() -> Script {
    let mut script = Script::new();
    script
        .add_opcode(OP_FROMALTSTACK)
        .add_opcode(OP_CHECKSIGVERIFY);
    script
}

/// Build a pay-to-public-key-template locking script from a constraint
/// hash.
///
/// Produces `<group slot> OP_1 <20-byte constraint hash>`.
///
/// # Arguments
/// * `constraint_hash` - Hash160 of the constraint script.
/// * `group` - Optional group annotation.
///
/// # Returns
/// The P2PKT locking script.
pub fn pay_to_public_key_template_out(
    constraint_hash: &[u8; 20],
    group: Option<&GroupAnnotation>,
) -> Result<Script, ScriptError> {
    let mut script = Script::new();
    push_group_slot(&mut script, group)?;
    script.add_opcode(OP_1);
    script.add_data(constraint_hash)?;
    Ok(script)
}

/// Build a pay-to-public-key-template locking script for a public key.
///
/// The constraint script is the key push produced by
/// `constraint_from_public_key`; its Hash160 is committed in the output.
///
/// # Arguments
/// * `public_key` - The public key to lock to.
/// * `group` - Optional group annotation.
///
/// # Returns
/// The P2PKT locking script.
pub fn pay_to_public_key(
    public_key: &PublicKey,
    group: Option<&GroupAnnotation>,
) -> Result<Script, ScriptError> {
    let constraint = constraint_from_public_key(public_key);
    let constraint_hash = hash160(&constraint.to_bytes());
    pay_to_public_key_template_out(&constraint_hash, group)
}

/// Build a generic pay-to-script-template locking script.
///
/// Produces `<group slot> <template hash> <constraint hash | OP_FALSE>
/// <visible args...>`.
///
/// # Arguments
/// * `template_hash` - The 20- or 32-byte hash committing to the template
///   script.
/// * `constraint_hash` - The 20-byte constraint commitment, or `None` for
///   the no-constraint marker.
/// * `visible_args` - Argument payloads pushed after the hashes.
/// * `group` - Optional group annotation.
///
/// # Returns
/// The P2ST locking script.
pub fn pay_to_script_template_out(
    template_hash: &[u8],
    constraint_hash: Option<&[u8]>,
    visible_args: &[Vec<u8>],
    group: Option<&GroupAnnotation>,
) -> Result<Script, ScriptError> {
    if template_hash.len() != 20 && template_hash.len() != 32 {
        return Err(ScriptError::InvalidScript(format!(
            "template hash must be 20 or 32 bytes, got {}",
            template_hash.len()
        )));
    }
    let mut script = Script::new();
    push_group_slot(&mut script, group)?;
    script.add_data(template_hash)?;
    match constraint_hash {
        Some(hash) => {
            if hash.len() != 20 {
                return Err(ScriptError::InvalidScript(format!(
                    "constraint hash must be 20 bytes, got {}",
                    hash.len()
                )));
            }
            script.add_data(hash)?;
        }
        None => {
            script.add_opcode(OP_FALSE);
        }
    }
    for arg in visible_args {
        script.add_data(arg)?;
    }
    Ok(script)
}

/// Build a pay-to-public-key-hash unlocking script.
///
/// # Arguments
/// * `satisfier` - The signature bytes in transaction format.
/// * `public_key` - The signing public key.
///
/// # Returns
/// The `<satisfier> <pubkey>` unlocking script.
pub fn pay_to_public_key_hash_in(
    satisfier: &[u8],
    public_key: &PublicKey,
) -> Result<Script, ScriptError> {
    let mut script = Script::new();
    script.add_data(satisfier)?;
    script.add_data(&public_key.to_compressed())?;
    Ok(script)
}

/// Assemble a template unlocking script.
///
/// Pushes the template script bytes (omitted for the well-known
/// template), the constraint script bytes (omitted when the output
/// committed to no constraint), and then each satisfier argument.
///
/// # Arguments
/// * `template` - The template script, or `None` for the well-known
///   template.
/// * `constraint` - The constraint script, or `None` when absent.
/// * `satisfier_args` - Satisfier payloads (signatures and template
///   arguments), pushed in order.
///
/// # Returns
/// The push-only unlocking script.
pub fn template_in(
    template: Option<&Script>,
    constraint: Option<&Script>,
    satisfier_args: &[&[u8]],
) -> Result<Script, ScriptError> {
    let mut script = Script::new();
    if let Some(template) = template {
        script.add_data(&template.to_bytes())?;
    }
    if let Some(constraint) = constraint {
        script.add_data(&constraint.to_bytes())?;
    }
    for arg in satisfier_args {
        script.add_data(arg)?;
    }
    Ok(script)
}

/// Build a data-carrier output script.
///
/// Produces `OP_RETURN <push>...`. The serialized script must fit the
/// data-carrier size cap.
///
/// # Arguments
/// * `parts` - The payloads to push after the marker.
///
/// # Returns
/// The data-carrier script, or an error if it exceeds the size cap.
pub fn data_out(parts: &[&[u8]]) -> Result<Script, ScriptError> {
    let mut script = Script::new();
    script.add_opcode(OP_RETURN);
    for part in parts {
        script.add_data(part)?;
    }
    if script.byte_len() > crate::script::MAX_DATA_CARRIER_BYTES {
        return Err(ScriptError::InvalidScript(format!(
            "data carrier script is {} bytes, max {}",
            script.byte_len(),
            crate::script::MAX_DATA_CARRIER_BYTES
        )));
    }
    Ok(script)
}

/// Build a token-description output script.
///
/// Produces `OP_RETURN <4-byte group id type tag> <field>...` with at
/// most five descriptive fields (ticker, name, document URL, document
/// hash, decimals).
///
/// # Arguments
/// * `group_id_type` - The group identifier type tag.
/// * `fields` - Up to five descriptive field payloads.
///
/// # Returns
/// The token-description script, or an error for too many fields or an
/// oversized script.
pub fn token_description_out(
    group_id_type: u32,
    fields: &[&[u8]],
) -> Result<Script, ScriptError> {
    if fields.len() > 5 {
        return Err(ScriptError::InvalidScript(format!(
            "token description allows at most 5 fields, got {}",
            fields.len()
        )));
    }
    let mut script = Script::new();
    script.add_opcode(OP_RETURN);
    script.add_data(&group_id_type.to_le_bytes())?;
    for field in fields {
        script.add_data(field)?;
    }
    if script.byte_len() > crate::script::MAX_DATA_CARRIER_BYTES {
        return Err(ScriptError::InvalidScript(format!(
            "token description script is {} bytes, max {}",
            script.byte_len(),
            crate::script::MAX_DATA_CARRIER_BYTES
        )));
    }
    Ok(script)
}
