// SPDX-License-Identifier: Apache-2.0
// Copyright © 2021 Will Ross
use paste::paste;

mod num;

pub use self::num::{Coerce, Num};

/// The word size of the sensor in terms of 8-bit bytes.
pub(crate) const WORD_SIZE: usize = (u16::BITS / u8::BITS) as usize;

/// Define addition and subtraction for address enumerations.
#[doc(hidden)]
#[macro_export]
macro_rules! address_enum_ops {
    ($typ:ident) => {
        impl ::core::ops::Add<u16> for $typ {
            type Output = u16;
            fn add(self, other: u16) -> Self::Output {
                self as u16 + other
            }
        }
        impl ::core::ops::Sub<$typ> for $typ {
            type Output = u16;
            fn sub(self, other: $typ) -> Self::Output {
                self as u16 - other as u16
            }
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! expose_member {
    ($name:ident, $typ:ty) => {
        fn $name(&self) -> $typ {
            self.$name
        }
    };
    (&$name:ident, $typ:ty) => {
        fn $name(&self) -> &$typ {
            &self.$name
        }
    };
}

/// This is a very small reimplementation of [bytes::Buf] with just the parts needed for this
/// crate.
///
/// [bytes::Buf]: https://docs.rs/bytes/*/bytes/trait.Buf.html
pub(crate) trait Buffer {
    fn get_u16(&mut self) -> u16;
}

impl Buffer for &[u8] {
    fn get_u16(&mut self) -> u16 {
        let (bytes, rest) = self.split_at(WORD_SIZE);
        *self = rest;
        u16::from_be_bytes([bytes[0], bytes[1]])
    }
}

/// Decode big-endian bytes into 16-bit words.
///
/// Only as many words as fit in both `destination` and `bytes` are written. A trailing odd byte is
/// ignored.
pub(crate) fn words_from_be_bytes(mut bytes: &[u8], destination: &mut [u16]) {
    for word in destination.iter_mut() {
        if bytes.len() < WORD_SIZE {
            break;
        }
        *word = bytes.get_u16();
    }
}

/// Interpret the lowest `num_bits` bits of `value` as a two's-complement signed integer.
///
/// Any bits above `num_bits` are ignored. The value is shifted so the field's sign bit lands in
/// the sign bit of an `i16`, then arithmetically shifted back down to extend the sign.
pub(crate) fn sign_extend(value: u16, num_bits: u32) -> i16 {
    let shift_amount = u16::BITS - num_bits;
    ((value << shift_amount) as i16) >> shift_amount
}

/// Generate the fixed-width sign extension functions.
macro_rules! sign_extenders {
    ($($bits:literal),+) => {
        paste! {
            $(
                #[doc = concat!(
                    "Interpret the low ", stringify!($bits),
                    " bits of `value` as a signed ", stringify!($bits), "-bit integer.\n\n",
                    "Values above 2<sup>", stringify!($bits), " - 1</sup> - 1 wrap to negative ",
                    "numbers. Bits above bit ", stringify!($bits), " are ignored."
                )]
                pub fn [< i $bits _from_bits >](value: u16) -> i16 {
                    sign_extend(value, $bits)
                }
            )+
        }
    };
}

sign_extenders!(4, 6, 8, 10, 16);

#[cfg(test)]
mod test {
    use super::Buffer;

    #[test]
    fn buffer_get_u16() {
        let data = b"\xde\xad\xbe\xef";
        let mut buf = &data[..];
        let v = buf.get_u16();
        assert_eq!(v, 0xdead);
        assert_eq!(buf.len(), 2);
        assert_eq!(buf, &data[2..]);
    }

    #[test]
    fn words_from_be_bytes() {
        let mut words = [0u16; 3];
        super::words_from_be_bytes(b"\xde\xad\xbe\xef\x01", &mut words);
        assert_eq!(words, [0xdead, 0xbeef, 0]);
    }

    /// Check every value of an `n`-bit field against the two's complement definition.
    fn check_exhaustive(n: u32, f: fn(u16) -> i16) {
        let half = 1i32 << (n - 1);
        let full = 1i32 << n;
        for raw in 0..full {
            let expected = if raw > half - 1 { raw - full } else { raw };
            assert_eq!(
                i32::from(f(raw as u16)),
                expected,
                "{}-bit conversion of {:#x}",
                n,
                raw
            );
        }
    }

    #[test]
    fn sign_extension_exhaustive() {
        check_exhaustive(4, super::i4_from_bits);
        check_exhaustive(6, super::i6_from_bits);
        check_exhaustive(8, super::i8_from_bits);
        check_exhaustive(10, super::i10_from_bits);
        check_exhaustive(16, super::i16_from_bits);
    }

    #[test]
    fn sign_extension_boundaries() {
        assert_eq!(super::i6_from_bits(31), 31);
        assert_eq!(super::i6_from_bits(32), -32);
        assert_eq!(super::i6_from_bits(63), -1);
        assert_eq!(super::i4_from_bits(7), 7);
        assert_eq!(super::i4_from_bits(8), -8);
        assert_eq!(super::i8_from_bits(0x7F), 127);
        assert_eq!(super::i8_from_bits(0x80), -128);
        assert_eq!(super::i10_from_bits(511), 511);
        assert_eq!(super::i10_from_bits(512), -512);
        assert_eq!(super::i16_from_bits(0x7FFF), i16::MAX);
        assert_eq!(super::i16_from_bits(0x8000), i16::MIN);
    }

    #[test]
    fn upper_bits_ignored() {
        assert_eq!(super::i8_from_bits(0xF0FF), -1);
        assert_eq!(super::i10_from_bits(0xF3FF), -1);
        assert_eq!(super::i6_from_bits(0xFF1F), 31);
    }
}
