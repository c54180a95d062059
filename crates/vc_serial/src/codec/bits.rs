//! Bit-pattern encoding of floating-point numbers.
//!
//! A double is written as its IEEE-754 bits, reinterpreted as a signed
//! 64-bit integer, printed in base 32 (digits `0-9a-v`, leading `-` for
//! negative patterns) and prefixed with `D`. Floats use the 32-bit pattern
//! and the prefix `F`. Unlike decimal text, this round-trips every value
//! exactly, including `-0.0`, NaN payloads and subnormals.
//!
//! ```
//! use vc_serial::codec::bits;
//!
//! assert_eq!(bits::encode_f64(1.5), "D3vu0000000000");
//! assert_eq!(bits::encode_f64(-0.0), "D-8000000000000");
//! assert_eq!(bits::encode_f32(1.5), "Fvs0000");
//! assert_eq!(bits::decode_f64("3vu0000000000"), Ok(1.5));
//! ```

use alloc::string::String;
use core::fmt;
use core::num::ParseIntError;

/// Radix of the bit-pattern encoding.
pub const RADIX: u32 = 32;

/// Prefix of an encoded `f64`.
pub const F64_PREFIX: char = 'D';

/// Prefix of an encoded `f32`.
pub const F32_PREFIX: char = 'F';

const DIGITS: &[u8; 32] = b"0123456789abcdefghijklmnopqrstuv";

/// Signed base-32 rendering of an integer.
struct Radix32(i64);

impl fmt::Display for Radix32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // 2^64 has 13 digits in base 32.
        let mut buf = [0u8; 13];
        let mut pos = buf.len();
        let mut rest = self.0.unsigned_abs();
        loop {
            pos -= 1;
            buf[pos] = DIGITS[(rest % RADIX as u64) as usize];
            rest /= RADIX as u64;
            if rest == 0 {
                break;
            }
        }
        if self.0 < 0 {
            f.write_str("-")?;
        }
        // The buffer only holds ASCII digits.
        for &digit in &buf[pos..] {
            fmt::Write::write_char(f, digit as char)?;
        }
        Ok(())
    }
}

/// Encodes a double as `D` + base-32 bit pattern.
pub fn encode_f64(value: f64) -> String {
    alloc::format!("{F64_PREFIX}{}", Radix32(value.to_bits() as i64))
}

/// Encodes a float as `F` + base-32 bit pattern.
pub fn encode_f32(value: f32) -> String {
    alloc::format!("{F32_PREFIX}{}", Radix32(value.to_bits() as i32 as i64))
}

/// Decodes the base-32 bit pattern of a double, without its prefix.
pub fn decode_f64(digits: &str) -> Result<f64, ParseIntError> {
    i64::from_str_radix(digits, RADIX).map(|bits| f64::from_bits(bits as u64))
}

/// Decodes the base-32 bit pattern of a float, without its prefix.
pub fn decode_f32(digits: &str) -> Result<f32, ParseIntError> {
    i32::from_str_radix(digits, RADIX).map(|bits| f32::from_bits(bits as u32))
}

// -----------------------------------------------------------------------------
// Tests
