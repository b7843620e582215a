//! Script number encoding.
//!
//! Script numbers are minimally-encoded little-endian sign-magnitude
//! buffers: the magnitude bytes in little-endian order, with the sign
//! carried in the high bit of the final byte (an extra byte is appended
//! when the magnitude already uses that bit). Zero encodes as the empty
//! buffer.

use num_bigint::{BigInt, Sign};

/// Encode an arbitrary-precision integer as a script number buffer.
///
/// # Arguments
/// * `value` - The integer to encode.
///
/// # Returns
/// The minimal little-endian sign-magnitude encoding; empty for zero.
pub fn encode_bignum(value: &BigInt) -> Vec<u8> {
    if value.sign() == Sign::NoSign {
        return Vec::new();
    }
    let (sign, mut bytes) = value.to_bytes_le();
    // to_bytes_le yields the magnitude; fold the sign into the top bit.
    let last = *bytes.last().expect("non-zero magnitude");
    if last & 0x80 != 0 {
        bytes.push(if sign == Sign::Minus { 0x80 } else { 0x00 });
    } else if sign == Sign::Minus {
        *bytes.last_mut().expect("non-zero magnitude") = last | 0x80;
    }
    bytes
}

/// Encode a machine integer as a script number buffer.
///
/// # Arguments
/// * `value` - The integer to encode.
///
/// # Returns
/// The minimal little-endian sign-magnitude encoding; empty for zero.
pub fn encode_int(value: i64) -> Vec<u8> {
    encode_bignum(&BigInt::from(value))
}

/// Decode a script number buffer into an arbitrary-precision integer.
///
/// The empty buffer decodes to zero. Non-minimal encodings are accepted;
/// minimality is a policy question for callers.
///
/// # Arguments
/// * `bytes` - The little-endian sign-magnitude buffer.
///
/// # Returns
/// The decoded integer.
pub fn decode_bignum(bytes: &[u8]) -> BigInt {
    if bytes.is_empty() {
        return BigInt::from(0u8);
    }
    let mut magnitude = bytes.to_vec();
    let last = *magnitude.last().expect("non-empty");
    let negative = last & 0x80 != 0;
    *magnitude.last_mut().expect("non-empty") = last & 0x7f;
    let value = BigInt::from_bytes_le(Sign::Plus, &magnitude);
    if negative {
        -value
    } else {
        value
    }
}
