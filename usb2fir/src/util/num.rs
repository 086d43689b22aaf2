// SPDX-License-Identifier: Apache-2.0
// Copyright © 2021 Will Ross

use core::cmp;
use core::ops;

/// A trait for numbers that can be converted into a number used in the [`calculations`] module.
///
/// This is a blend of [`num_traits::NumCast`] in that the conversions do *not* need to be precise,
/// and [`From`] in that the conversions are infallible. Another reason for this trait (and its
/// choice in naming) is to be easier to use than `T::from(value)`, which needs to be disambiguated
/// each time because of the previously mentioned traits.
///
/// [`calculations`]: crate::calculations
pub trait Coerce<T> {
    /// Convert
    fn coerce(value: T) -> Self;
}

impl<T> Coerce<T> for T {
    fn coerce(value: T) -> Self {
        value
    }
}

/// Implement [`Coerce`] for the given primitive types by casting with `as`.
macro_rules! impl_coerce {
    (as $dest:ty, $($source:ty),+) => {
        $(
            impl Coerce<$source> for $dest {
                fn coerce(value: $source) -> Self {
                    value as $dest
                }
            }
        )+
    };
}
impl_coerce!(as f32, u8, i8, u16, i16, i32, u64, f64);
impl_coerce!(as f64, u8, i8, u16, i16, i32, u64, f32);

pub trait Num:
    Copy
    + cmp::PartialEq
    + cmp::PartialOrd
    + core::fmt::Debug
    + num_traits::NumOps
    + ops::AddAssign
    + ops::DivAssign
    + ops::SubAssign
    + Coerce<f64>
    + Coerce<i32>
    + Coerce<i16>
    + Coerce<u16>
    + Coerce<i8>
    + Coerce<u8>
    + Coerce<u64>
{
    /// Positive zero.
    const ZERO: Self;

    /// The number 1.
    const ONE: Self;

    /// Not a number, used to mark pixels that could not be computed.
    const NAN: Self;

    /// The freezing point of water in kelvins (273.15).
    const KELVINS_TO_CELSIUS: Self;

    /// The number 3.3, the nominal supply voltage.
    const THREE_POINT_THREE: Self;

    /// The number 25.0, the reference ambient temperature.
    const TWENTY_FIVE: Self;

    /// The number 2^18.
    ///
    /// This is a scaling factor used when calculating V<sub>PTAT<sub>art</sub></sub>.
    const TWO_RAISED_EIGHTEEN: Self;

    /// A wrapper around [`Coerce`] to allow using a turbofish to disambiguate types.
    fn coerce_from<T>(value: T) -> Self
    where
        Self: Coerce<T>,
    {
        <Self as Coerce<T>>::coerce(value)
    }

    /// 2 raised to the given integer power, computed exactly.
    ///
    /// The EEPROM scale factors are all powers of two, and the conversions have to be exact, so
    /// this goes through an integer shift instead of `exp2`.
    fn pow2(exponent: u8) -> Self {
        Self::coerce_from(1u64 << exponent)
    }

    /// Raise `self` to the given (integer) power.
    fn powi(self, n: i32) -> Self;

    /// Calculate the square root of `self`.
    fn sqrt(self) -> Self;

    /// Calculate the 4th root of `self` as two square roots.
    fn fourth_root(self) -> Self {
        self.sqrt().sqrt()
    }

    /// `true` if the value is neither infinite nor NaN.
    fn is_finite(self) -> bool;
}

/// Implements [`Num`] for the given builtin float type.
macro_rules! impl_num {
    ($typ:ty) => {
        impl Num for $typ {
            const ZERO: Self = 0.0;

            const ONE: Self = 1.0;

            const NAN: Self = <$typ>::NAN;

            const KELVINS_TO_CELSIUS: Self = 273.15;

            const THREE_POINT_THREE: Self = 3.3;

            const TWENTY_FIVE: Self = 25.0;

            const TWO_RAISED_EIGHTEEN: Self = 2u32.pow(18) as Self;

            fn powi(self, n: i32) -> Self {
                <Self as num_traits::Float>::powi(self, n)
            }

            fn sqrt(self) -> Self {
                <Self as num_traits::Float>::sqrt(self)
            }

            fn is_finite(self) -> bool {
                <Self as num_traits::Float>::is_finite(self)
            }
        }
    };
}
impl_num!(f32);
impl_num!(f64);
