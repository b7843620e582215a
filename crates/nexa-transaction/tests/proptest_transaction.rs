use proptest::prelude::*;

use nexa_primitives::Hash;
use nexa_script::Script;
use nexa_transaction::{
    Input, InputSelection, Output, OutputSelection, SighashType, Transaction,
};

/// Strategy for an arbitrary sighash type.
fn sighash_type_strategy() -> impl Strategy<Value = SighashType> {
    let inputs = prop_oneof![
        Just(InputSelection::All),
        any::<u8>().prop_map(InputSelection::FirstN),
        Just(InputSelection::ThisOnly),
    ];
    let outputs = prop_oneof![
        Just(OutputSelection::All),
        any::<u8>().prop_map(OutputSelection::FirstN),
        (any::<u8>(), any::<u8>()).prop_map(|(a, b)| OutputSelection::Two(a, b)),
    ];
    (inputs, outputs).prop_map(|(inputs, outputs)| SighashType { inputs, outputs })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn sighash_type_bytes_roundtrip(sighash_type in sighash_type_strategy()) {
        let bytes = sighash_type.to_bytes();
        let parsed = SighashType::from_bytes(&bytes).unwrap();
        prop_assert_eq!(parsed, sighash_type);
    }

    #[test]
    fn sighash_type_string_roundtrip(sighash_type in sighash_type_strategy()) {
        let text = sighash_type.to_string();
        let parsed: SighashType = text.parse().unwrap();
        prop_assert_eq!(parsed, sighash_type);
    }

    #[test]
    fn transaction_wire_roundtrip(
        version in any::<u8>(),
        lock_time in any::<u32>(),
        amounts in prop::collection::vec(0u64..=u32::MAX as u64, 0..8),
        values in prop::collection::vec(0u64..=u32::MAX as u64, 0..8),
        seed in any::<u64>(),
    ) {
        let mut tx = Transaction::new();
        tx.version = version;
        tx.lock_time = lock_time;
        for (i, amount) in amounts.iter().enumerate() {
            let outpoint = Hash::sha256d_of(&[seed as u8, i as u8]);
            let mut input = Input::opaque(outpoint, *amount);
            input.sequence = (seed as u32).wrapping_add(i as u32);
            let mut script_sig = Script::new();
            script_sig.add_data(&seed.to_le_bytes()).unwrap();
            input.script_sig = script_sig;
            tx.add_input(input);
        }
        for value in &values {
            let mut script = Script::new();
            script.add_data(&value.to_le_bytes()).unwrap();
            tx.add_output(Output::new(*value, script));
        }

        let bytes = tx.to_bytes();
        let parsed = Transaction::from_bytes(&bytes).unwrap();
        prop_assert_eq!(parsed.to_bytes(), bytes);
        prop_assert_eq!(parsed.version, tx.version);
        prop_assert_eq!(parsed.lock_time, tx.lock_time);
        prop_assert_eq!(parsed.inputs().len(), tx.inputs().len());
        prop_assert_eq!(parsed.outputs().len(), tx.outputs().len());
        // The idem is independent of satisfier scripts by construction.
        prop_assert_eq!(parsed.idem(), tx.idem());
        prop_assert_eq!(parsed.id(), tx.id());
    }
}
