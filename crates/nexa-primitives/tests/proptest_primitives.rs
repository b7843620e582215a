use proptest::prelude::*;

use nexa_primitives::hash::sha256d;
use nexa_primitives::util::{TxReader, TxWriter, VarInt};
use nexa_primitives::{DigestOrder, Hash, PrivateKey};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn varint_roundtrip(value in any::<u64>()) {
        let bytes = VarInt(value).to_bytes();
        let mut reader = TxReader::new(&bytes);
        prop_assert_eq!(reader.read_varint().unwrap(), VarInt(value));
        prop_assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn hash_hex_roundtrip(bytes in prop::array::uniform32(any::<u8>())) {
        let hash = Hash::new(bytes);
        let parsed = Hash::from_hex(&hash.to_hex()).unwrap();
        prop_assert_eq!(parsed, hash);
    }

    #[test]
    fn writer_reader_roundtrip(
        byte in any::<u8>(),
        word in any::<u32>(),
        quad in any::<u64>(),
        blob in prop::collection::vec(any::<u8>(), 0..64),
    ) {
        let mut writer = TxWriter::new();
        writer.write_u8(byte);
        writer.write_u32_le(word);
        writer.write_u64_le(quad);
        writer.write_varint(VarInt::from(blob.len()));
        writer.write_bytes(&blob);

        let data = writer.into_bytes();
        let mut reader = TxReader::new(&data);
        prop_assert_eq!(reader.read_u8().unwrap(), byte);
        prop_assert_eq!(reader.read_u32_le().unwrap(), word);
        prop_assert_eq!(reader.read_u64_le().unwrap(), quad);
        let len = reader.read_varint().unwrap().value() as usize;
        prop_assert_eq!(reader.read_bytes(len).unwrap(), &blob[..]);
        prop_assert_eq!(reader.remaining(), 0);
    }
}

proptest! {
    // Signing involves curve arithmetic; keep the case count modest.
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn schnorr_sign_verify(seed in prop::collection::vec(any::<u8>(), 8..64)) {
        let digest = sha256d(&seed);
        let key = PrivateKey::new();
        let signature = key.sign_schnorr(&digest, DigestOrder::LittleEndian).unwrap();
        prop_assert!(key.public_key().verify_schnorr(
            &digest,
            &signature,
            DigestOrder::LittleEndian
        ));
    }
}
