use proptest::prelude::*;

use nexa_script::script_num::{decode_bignum, encode_int};
use nexa_script::Script;
use num_bigint::BigInt;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn script_bytes_roundtrip(data in prop::collection::vec(any::<u8>(), 0..512)) {
        // Not every random buffer is a valid script (pushes may be
        // truncated), but every buffer that parses must round trip.
        if let Ok(script) = Script::from_bytes(&data) {
            prop_assert_eq!(script.to_bytes(), data);
        }
    }

    #[test]
    fn script_hex_roundtrip(data in prop::collection::vec(any::<u8>(), 0..256)) {
        if let Ok(script) = Script::from_bytes(&data) {
            let script2 = Script::from_hex(&script.to_hex()).unwrap();
            prop_assert_eq!(script2, script);
        }
    }

    #[test]
    fn script_push_roundtrip(data in prop::collection::vec(any::<u8>(), 0..300)) {
        let mut script = Script::new();
        script.add_data(&data).unwrap();
        let parsed = Script::from_bytes(&script.to_bytes()).unwrap();
        prop_assert_eq!(parsed.chunks().len(), 1);
        if data.is_empty() {
            prop_assert!(parsed.chunks()[0].payload().is_none());
        } else {
            prop_assert_eq!(parsed.chunks()[0].payload().unwrap(), &data[..]);
        }
    }

    #[test]
    fn script_verbose_string_roundtrip(data in prop::collection::vec(any::<u8>(), 0..128)) {
        if let Ok(script) = Script::from_bytes(&data) {
            let parsed = Script::from_string(&script.to_string()).unwrap();
            prop_assert_eq!(parsed, script);
        }
    }

    #[test]
    fn script_number_roundtrip(val in any::<i64>()) {
        let encoded = encode_int(val);
        prop_assert_eq!(decode_bignum(&encoded), BigInt::from(val));
    }
}
