//! Tests for the nexa-transaction crate.
//!
//! Covers wire round trips, the idem/id identity split, selective
//! sighash digests, end-to-end building and Schnorr signing, fee and
//! change arithmetic, and the serialization validity checks.

use nexa_primitives::hash::hash160;
use nexa_primitives::{Hash, PrivateKey};
use nexa_script::{builder as script_builder, Address};

use crate::builder::{TemplateData, TransactionBuilder, Utxo};
use crate::input::{Input, InputVariant};
use crate::output::Output;
use crate::sighash::{signature_digest, SighashType};
use crate::transaction::{SerializationChecks, Transaction, DUST_THRESHOLD};
use crate::TransactionError;

const KEY_1: &str = "1e99423a4ed27608a15a2616a2b0e9e52ced330ac530edcc32c8ffc6a526aedd";
const KEY_2: &str = "2b5f1a7c9d4e836052f1b9a87cd340e96f2ad78b15c4e9d30a6b8f12c45de701";
const KEY_3: &str = "3f1c92e85ab7d604319fce2c8d70b1a6549e3db20c17f48a5068d9e21b34ac55";

fn key(hex_key: &str) -> PrivateKey {
    PrivateKey::from_hex(hex_key).expect("valid test key")
}

fn template_address(hex_key: &str) -> Address {
    Address::from_public_key(&key(hex_key).public_key())
}

fn outpoint(tag: &[u8]) -> Hash {
    Hash::sha256d_of(tag)
}

fn pkt_utxo(hex_key: &str, amount: u64, tag: &[u8]) -> Utxo {
    Utxo {
        outpoint: outpoint(tag),
        amount,
        script: script_builder::pay_to_public_key(&key(hex_key).public_key(), None).unwrap(),
        template_data: None,
    }
}

/// A funded, signed single-input transaction paying one output plus
/// change.
fn signed_transaction() -> Transaction {
    let mut builder = TransactionBuilder::new();
    builder
        .from_utxo(pkt_utxo(KEY_1, 1_004_098, b"utxo-1"))
        .unwrap()
        .to_address(&template_address(KEY_2), 99_640)
        .change_to_address(&template_address(KEY_3))
        .fee_per_byte(1);
    builder.sign(&key(KEY_1), SighashType::all()).unwrap();
    builder.into_transaction()
}

// -----------------------------------------------------------------------
// Wire round trips
// -----------------------------------------------------------------------

/// A built transaction survives the hex round trip byte for byte.
#[test]
fn test_hex_roundtrip() {
    let tx = signed_transaction();
    let hex_form = tx.to_hex();
    let parsed = Transaction::from_hex(&hex_form).expect("should parse own serialization");
    assert_eq!(parsed.to_hex(), hex_form);
    assert_eq!(parsed.version, tx.version);
    assert_eq!(parsed.inputs().len(), 1);
    assert_eq!(parsed.outputs().len(), 2);
    assert_eq!(parsed.lock_time, 0);
}

/// Wire parsing rejects trailing bytes, truncation, and bad hex.
#[test]
fn test_from_hex_rejects_malformed() {
    let tx = signed_transaction();
    let hex_form = tx.to_hex();

    assert!(Transaction::from_hex(&format!("{}00", hex_form)).is_err());
    assert!(Transaction::from_hex(&hex_form[..hex_form.len() - 8]).is_err());
    assert!(Transaction::from_hex("not hex").is_err());
    assert!(Transaction::from_bytes(&[]).is_err());
}

/// Wire-parsed inputs are opaque; their satisfier bytes still round trip.
#[test]
fn test_parsed_inputs_are_opaque() {
    let tx = signed_transaction();
    let parsed = Transaction::from_bytes(&tx.to_bytes()).unwrap();
    let input = &parsed.inputs()[0];
    assert_eq!(input.variant(), &InputVariant::Opaque);
    assert_eq!(input.script_sig, tx.inputs()[0].script_sig);
    assert!(matches!(
        input.is_fully_signed(),
        Err(TransactionError::NotImplemented)
    ));
}

// -----------------------------------------------------------------------
// Identity
// -----------------------------------------------------------------------

/// The idem ignores satisfier scripts; the id commits to them.
#[test]
fn test_idem_id_split() {
    let mut builder = TransactionBuilder::new();
    builder
        .from_utxo(pkt_utxo(KEY_1, 1_004_098, b"utxo-1"))
        .unwrap()
        .to_address(&template_address(KEY_2), 99_640)
        .change_to_address(&template_address(KEY_3))
        .fee_per_byte(1);

    let unsigned_idem = builder.transaction().idem();
    let unsigned_id = builder.transaction().id();

    builder.sign(&key(KEY_1), SighashType::all()).unwrap();
    let tx = builder.into_transaction();

    assert_eq!(tx.idem(), unsigned_idem, "idem must not move with signatures");
    assert_ne!(tx.id(), unsigned_id, "id must move with signatures");
    assert_ne!(tx.id(), tx.idem());

    // Both identities are stable across re-serialization.
    let parsed = Transaction::from_bytes(&tx.to_bytes()).unwrap();
    assert_eq!(parsed.idem(), tx.idem());
    assert_eq!(parsed.id(), tx.id());
}

// -----------------------------------------------------------------------
// Sighash digests
// -----------------------------------------------------------------------

/// A one-input transaction with three outputs of the given values, for
/// selective-digest tests.
fn three_output_transaction_with(values: [u64; 3]) -> Transaction {
    let mut tx = Transaction::new();
    tx.add_input(
        Input::from_output(
            outpoint(b"utxo-a"),
            500_000,
            Output::new(
                500_000,
                script_builder::pay_to_public_key(&key(KEY_1).public_key(), None).unwrap(),
            ),
        )
        .unwrap(),
    );
    for (index, value) in values.into_iter().enumerate() {
        tx.add_output(Output::new(
            value,
            template_address(if index == 0 { KEY_2 } else { KEY_3 }).to_script(),
        ));
    }
    tx
}

fn three_output_transaction() -> Transaction {
    three_output_transaction_with([100_000, 150_000, 200_000])
}

/// The digest is a pure function of its inputs.
#[test]
fn test_digest_deterministic() {
    let tx = three_output_transaction();
    let subscript = tx.inputs()[0].subscript().unwrap();
    let sig_type = SighashType::all();
    let first = signature_digest(&tx, 0, &sig_type, &subscript).unwrap();
    let second = signature_digest(&tx, 0, &sig_type, &subscript).unwrap();
    assert_eq!(first, second);
}

/// Outputs outside a TWO selection do not affect the digest; selected
/// outputs do.
#[test]
fn test_digest_selective_outputs() {
    let tx = three_output_transaction();
    let subscript = tx.inputs()[0].subscript().unwrap();
    let sig_type = SighashType::all().set_two_out(0, 1);
    let baseline = signature_digest(&tx, 0, &sig_type, &subscript).unwrap();

    // Changing the unselected third output leaves the digest alone.
    let unselected = three_output_transaction_with([100_000, 150_000, 999_999]);
    let digest = signature_digest(&unselected, 0, &sig_type, &subscript).unwrap();
    assert_eq!(digest, baseline, "unselected output must not change the digest");

    // Changing a selected output must change it.
    let selected = three_output_transaction_with([123_456, 150_000, 200_000]);
    let digest = signature_digest(&selected, 0, &sig_type, &subscript).unwrap();
    assert_ne!(digest, baseline, "selected output must change the digest");

    // The TWO selection commits to order: (1, 0) differs from (0, 1).
    let swapped = SighashType::all().set_two_out(1, 0);
    let digest = signature_digest(&tx, 0, &swapped, &subscript).unwrap();
    assert_ne!(digest, baseline, "output order is part of the digest");
}

/// FIRSTN and TWO selections validate their indexes.
#[test]
fn test_digest_range_checks() {
    let tx = three_output_transaction();
    let subscript = tx.inputs()[0].subscript().unwrap();

    let over_inputs = SighashType::all().set_first_n_in(2);
    assert!(signature_digest(&tx, 0, &over_inputs, &subscript).is_err());

    let over_outputs = SighashType::all().set_two_out(0, 3);
    assert!(signature_digest(&tx, 0, &over_outputs, &subscript).is_err());

    let over_first_n = SighashType::all().set_first_n_out(4);
    assert!(signature_digest(&tx, 0, &over_first_n, &subscript).is_err());

    assert!(signature_digest(&tx, 1, &SighashType::all(), &subscript).is_err());
}

/// The sighash type bytes are committed into the digest.
#[test]
fn test_digest_commits_to_sighash_type() {
    let tx = three_output_transaction();
    let subscript = tx.inputs()[0].subscript().unwrap();
    let all = signature_digest(&tx, 0, &SighashType::all(), &subscript).unwrap();
    let this_in = signature_digest(
        &tx,
        0,
        &SighashType::all().set_this_in(),
        &subscript,
    )
    .unwrap();
    assert_ne!(all, this_in);
}

// -----------------------------------------------------------------------
// End-to-end signing
// -----------------------------------------------------------------------

/// Signatures produced by the builder verify against the transaction.
#[test]
fn test_sign_and_verify() {
    let signing_key = key(KEY_1);
    let mut builder = TransactionBuilder::new();
    builder
        .from_utxo(pkt_utxo(KEY_1, 1_004_098, b"utxo-1"))
        .unwrap()
        .to_address(&template_address(KEY_2), 99_640)
        .change_to_address(&template_address(KEY_3))
        .fee_per_byte(1);
    builder.sign(&signing_key, SighashType::all()).unwrap();
    let tx = builder.into_transaction();

    assert!(tx.is_fully_signed().unwrap());
    let input = &tx.inputs()[0];
    let subscript = input.subscript().unwrap();
    let digest = signature_digest(&tx, 0, &SighashType::all(), &subscript).unwrap();

    // The satisfier's second push is the raw 64-byte signature (ALL/ALL
    // appends no sighash bytes).
    let sig_bytes = input.script_sig.chunks()[1].payload().unwrap();
    assert_eq!(sig_bytes.len(), 64);
    let signature = nexa_primitives::SchnorrSignature::from_bytes(sig_bytes).unwrap();
    assert!(signing_key.public_key().verify_schnorr(
        &digest,
        &signature,
        nexa_primitives::DigestOrder::LittleEndian
    ));
}

/// Multi-input transactions sign with multiple keys; each key only
/// touches its own inputs.
#[test]
fn test_multi_key_signing() {
    let mut builder = TransactionBuilder::new();
    builder
        .from_utxo(pkt_utxo(KEY_1, 600_000, b"utxo-1"))
        .unwrap()
        .from_utxo(pkt_utxo(KEY_2, 400_000, b"utxo-2"))
        .unwrap()
        .to_address(&template_address(KEY_3), 900_000)
        .fee(100_000);

    builder.sign(&key(KEY_1), SighashType::all()).unwrap();
    assert!(builder.transaction().inputs()[0].is_fully_signed().unwrap());
    assert!(!builder.transaction().inputs()[1].is_fully_signed().unwrap());

    builder.sign(&key(KEY_2), SighashType::all()).unwrap();
    let tx = builder.into_transaction();
    assert!(tx.is_fully_signed().unwrap());
    assert_eq!(tx.get_fee(), 100_000);
}

/// Signing through the builder also works for generic script-template
/// inputs with supplied template data.
#[test]
fn test_script_template_end_to_end() {
    let signing_key = key(KEY_1);
    let template = script_builder::well_known_template_1();
    let constraint = script_builder::constraint_from_public_key(&signing_key.public_key());
    let locking_script = script_builder::pay_to_script_template_out(
        &hash160(&template.to_bytes()),
        Some(&hash160(&constraint.to_bytes())),
        &[],
        None,
    )
    .unwrap();

    let mut builder = TransactionBuilder::new();
    builder
        .from_utxo(Utxo {
            outpoint: outpoint(b"st-utxo"),
            amount: 700_000,
            script: locking_script,
            template_data: Some(TemplateData {
                template: template.clone(),
                constraint: Some(constraint.clone()),
                public_key: Some(signing_key.public_key()),
            }),
        })
        .unwrap()
        .to_address(&template_address(KEY_2), 650_000)
        .fee(50_000);
    builder.sign(&signing_key, SighashType::all()).unwrap();
    let tx = builder.into_transaction();

    assert!(tx.is_fully_signed().unwrap());
    // The satisfier leads with the template bytes, then the constraint.
    let chunks = tx.inputs()[0].script_sig.chunks();
    assert_eq!(chunks[0].payload().unwrap(), template.to_bytes().as_slice());
    assert_eq!(chunks[1].payload().unwrap(), constraint.to_bytes().as_slice());
}

// -----------------------------------------------------------------------
// Fee and change
// -----------------------------------------------------------------------

/// Scenario: a 1,004,098 satoshi template input paying 99,640 with a
/// change address at 1 sat/byte yields change 904,239 and fee 219.
#[test]
fn test_change_and_fee_arithmetic() {
    let mut builder = TransactionBuilder::new();
    builder
        .from_utxo(pkt_utxo(KEY_1, 1_004_098, b"utxo-1"))
        .unwrap()
        .to_address(&template_address(KEY_2), 99_640)
        .change_to_address(&template_address(KEY_3))
        .fee_per_byte(1);

    let tx = builder.transaction();
    assert_eq!(tx.estimated_size(), 219);
    assert_eq!(tx.get_fee(), 219);
    assert_eq!(tx.outputs().len(), 2);
    assert_eq!(tx.change_index(), Some(1));
    assert_eq!(tx.outputs()[1].value, 904_239);
    assert_eq!(
        tx.outputs()[1].script(),
        &template_address(KEY_3).to_script()
    );
    assert_eq!(tx.unspent_amount(), 219);
}

/// Without a change script the whole remainder is the fee.
#[test]
fn test_fee_without_change_script() {
    let mut builder = TransactionBuilder::new();
    builder
        .from_utxo(pkt_utxo(KEY_1, 500_000, b"utxo-1"))
        .unwrap()
        .to_address(&template_address(KEY_2), 400_000);
    assert_eq!(builder.transaction().get_fee(), 100_000);
}

/// A remainder below the dust threshold produces no change output.
#[test]
fn test_change_below_dust_is_dropped() {
    let mut builder = TransactionBuilder::new();
    builder
        .from_utxo(pkt_utxo(KEY_1, 100_000, b"utxo-1"))
        .unwrap()
        .to_address(&template_address(KEY_2), 100_000 - 219 - (DUST_THRESHOLD - 1))
        .change_to_address(&template_address(KEY_3))
        .fee_per_byte(1);
    let tx = builder.transaction();
    assert_eq!(tx.change_index(), None);
    assert_eq!(tx.outputs().len(), 1);
}

/// Mutating the output set clears existing signatures.
#[test]
fn test_mutation_clears_signatures() {
    let mut tx = signed_transaction();
    assert!(tx.is_fully_signed().unwrap());
    tx.add_output(Output::new(
        DUST_THRESHOLD,
        template_address(KEY_2).to_script(),
    ));
    assert!(!tx.is_fully_signed().unwrap());
    assert!(tx.inputs()[0].script_sig.is_empty());
}

/// A pinned fee also re-derives change and clears signatures.
#[test]
fn test_set_fee_recomputes_change() {
    let mut tx = signed_transaction();
    let change_before = tx.outputs()[tx.change_index().unwrap()].value;
    tx.set_fee(1_000);
    let change_after = tx.outputs()[tx.change_index().unwrap()].value;
    assert_eq!(change_after, change_before + 219 - 1_000);
    assert!(tx.inputs()[0].script_sig.is_empty());
}

// -----------------------------------------------------------------------
// Serialization validity
// -----------------------------------------------------------------------

/// A fully signed, well-funded transaction passes all checks.
#[test]
fn test_serialization_checks_pass() {
    let tx = signed_transaction();
    assert!(tx
        .get_serialization_error(&SerializationChecks::default())
        .is_none());
    assert!(tx.checked_serialize(&SerializationChecks::default()).is_ok());
}

/// Overspending outputs are the first violation reported.
#[test]
fn test_checks_overspend() {
    let mut tx = Transaction::new();
    tx.add_input(
        Input::from_output(
            outpoint(b"utxo-a"),
            1_000,
            Output::new(
                1_000,
                script_builder::pay_to_public_key(&key(KEY_1).public_key(), None).unwrap(),
            ),
        )
        .unwrap(),
    );
    tx.add_output(Output::new(5_000, template_address(KEY_2).to_script()));
    let err = tx
        .get_serialization_error(&SerializationChecks::default())
        .unwrap();
    assert!(err.to_string().contains("more than the inputs"));

    let relaxed = SerializationChecks {
        disable_unspent_check: true,
        disable_is_fully_signed: true,
        ..Default::default()
    };
    assert!(tx.get_serialization_error(&relaxed).is_none());
}

/// A pinned fee must match the unspent amount exactly.
#[test]
fn test_checks_fee_mismatch() {
    let mut builder = TransactionBuilder::new();
    builder
        .from_utxo(pkt_utxo(KEY_1, 500_000, b"utxo-1"))
        .unwrap()
        .to_address(&template_address(KEY_2), 400_000)
        .fee(50_000);
    builder.sign(&key(KEY_1), SighashType::all()).unwrap();
    let err = builder
        .transaction()
        .get_serialization_error(&SerializationChecks::default())
        .unwrap();
    assert!(err.to_string().contains("does not match the declared fee"));
}

/// Dust outputs are rejected; data carriers are exempt.
#[test]
fn test_checks_dust() {
    let mut builder = TransactionBuilder::new();
    builder
        .from_utxo(pkt_utxo(KEY_1, 500_000, b"utxo-1"))
        .unwrap()
        .to_address(&template_address(KEY_2), 100)
        .add_data(&[b"metadata"])
        .unwrap();
    builder.sign(&key(KEY_1), SighashType::all()).unwrap();
    let tx = builder.transaction();

    let err = tx
        .get_serialization_error(&SerializationChecks::default())
        .unwrap();
    assert!(err.to_string().contains("dust"));

    let relaxed = SerializationChecks {
        disable_dust_outputs: true,
        ..Default::default()
    };
    assert!(tx.get_serialization_error(&relaxed).is_none());
}

/// Unsigned inputs fail the signedness check.
#[test]
fn test_checks_unsigned() {
    let mut builder = TransactionBuilder::new();
    builder
        .from_utxo(pkt_utxo(KEY_1, 500_000, b"utxo-1"))
        .unwrap()
        .to_address(&template_address(KEY_2), 499_000);
    let err = builder
        .transaction()
        .get_serialization_error(&SerializationChecks::default())
        .unwrap();
    assert!(err.to_string().contains("not fully signed"));
}

/// The count limit rejects transactions with more than 256 outputs.
#[test]
fn test_checks_count_limit() {
    let mut tx = Transaction::new();
    for _ in 0..257 {
        tx.add_output(Output::new(
            DUST_THRESHOLD,
            template_address(KEY_2).to_script(),
        ));
    }
    let checks = SerializationChecks {
        disable_unspent_check: true,
        disable_is_fully_signed: true,
        ..Default::default()
    };
    let err = tx.get_serialization_error(&checks).unwrap();
    assert!(err.to_string().contains("exceeds the limit"));
}

// -----------------------------------------------------------------------
// Plain-object serialization
// -----------------------------------------------------------------------

/// The plain-object projection round-trips a full builder transaction,
/// including fee and change state.
#[test]
fn test_plain_object_roundtrip() {
    let tx = signed_transaction();
    let json = serde_json::to_string(&tx).unwrap();
    let back: Transaction = serde_json::from_str(&json).unwrap();
    assert_eq!(back, tx);
    assert_eq!(back.change_index(), tx.change_index());
    assert_eq!(back.fee_per_byte(), Some(1));
    assert_eq!(back.to_hex(), tx.to_hex());
}

/// A change index pointing at the wrong output is rejected.
#[test]
fn test_plain_object_bad_change_index() {
    let tx = signed_transaction();
    let mut value: serde_json::Value = serde_json::from_str(&serde_json::to_string(&tx).unwrap())
        .unwrap();
    value["changeIndex"] = serde_json::json!(0);
    assert!(serde_json::from_value::<Transaction>(value).is_err());
}
