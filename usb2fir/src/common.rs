// SPDX-License-Identifier: Apache-2.0
// Copyright © 2021 Will Ross
//! Sensor geometry and the calibration data interface.
//!
//! At first glance the calibration section of the MLX90640 datasheet is intimidating, with pages
//! of formulas. Most of them are manual conversions to signed integers and other bit twiddling
//! that can be written much more clearly. A bit of a decoder ring:
//!
//! * A line similar to
//!   >  If K<sub>Foo</sub> &gt; *(2<sup>n</sup> - 1)* → K<sub>Foo</sub> = K<sub>Foo</sub> - *2<sup>n + 1</sup>*
//!
//!   is converting an unsigned integer to a signed one (see the `i*_from_bits` functions).
//! * Masking a value off with a logical AND, followed by a division by a power of 2, is a right
//!   shift.
//!
//! # Glossary
//! <dl>
//! <dt>
//! α, alpha
//! </dt><dd>
//! Sensitivity coefficient
//! </dd>
//! <dt>
//! CP
//! </dt><dd>
//! Compensation pixel, a shielded pixel used to track the sensor package's own drift.
//! </dd>
//! <dt>
//! ε, emissivity
//! </dt><dd>
//! How much IR radiation a surface emits relative to an ideal black body at the same temperature.
//! </dd>
//! <dt>
//! PTAT
//! </dt><dd>
//! Proportional to ambient temperature
//! </dd>
//! <dt>
//! T<sub>a</sub>
//! </dt><dd>
//! Ambient temperature, really the temperature of the sensor itself.
//! </dd>
//! <dt>
//! T<sub>o</sub>
//! </dt><dd>
//! Object temperature, the temperature an individual pixel has detected.
//! </dd>
//! <dt>
//! TGC
//! </dt><dd>
//! Thermal gradient coefficient, how strongly the compensation pixel is weighted.
//! </dd>
//! <dt>
//! V<sub>DD</sub>
//! </dt><dd>
//! Pixel supply voltage
//! </dd>
//! </dl>
use crate::register::Subpage;

/// The height of the image captured by the sensor.
pub const HEIGHT: usize = 24;

/// The width of the image captured by the sensor.
pub const WIDTH: usize = 32;

/// The total number of pixels the sensor has.
pub const NUM_PIXELS: usize = HEIGHT * WIDTH;

/// The number of temperature ranges (and corner temperatures).
pub const NUM_CORNER_TEMPERATURES: usize = 4;

/// The index of a pixel from its row and column.
///
/// This is the only addressing scheme used in this crate, both for calibration data and for the
/// temperature buffers.
pub const fn pixel_index(row: usize, column: usize) -> usize {
    row * WIDTH + column
}

/// Access to the calibration values needed to turn raw frames into temperatures.
///
/// [`CalibrationParameters`][crate::eeprom::CalibrationParameters] decodes these from the
/// sensor's EEPROM, but any source works. For example calibration could be pre-processed once and
/// then stored somewhere cheaper to load. The method names follow the variable names used in the
/// datasheet formulas.
///
/// The per-pixel methods return slices of exactly [`NUM_PIXELS`] values in row-major order, and
/// the per-range methods return [`NUM_CORNER_TEMPERATURES`] values.
pub trait CalibrationData<F> {
    /// Pixel supply voltage constant (K<sub>V<sub>DD</sub></sub>).
    fn k_v_dd(&self) -> i16;

    /// Constant for pixel supply voltage at 25℃ (V<sub>DD<sub>25</sub></sub>).
    fn v_dd_25(&self) -> i16;

    /// ADC resolution this sensor was calibrated at.
    fn resolution(&self) -> u8;

    /// Voltage proportional to ambient temperature constant (K<sub>V<sub>PTAT</sub></sub>).
    fn k_v_ptat(&self) -> F;

    /// Temperature proportional to ambient temperature constant (K<sub>T<sub>PTAT</sub></sub>).
    fn k_t_ptat(&self) -> F;

    /// Voltage proportional to ambient temperature at 25℃ (V<sub>PTAT<sub>25</sub></sub>).
    fn v_ptat_25(&self) -> F;

    /// Sensitivity proportional to ambient temperature (α<sub>PTAT</sub>).
    fn alpha_ptat(&self) -> F;

    /// The gain constant, written as <var>GAIN</var><sub>EE</sub> in the datasheet.
    fn gain(&self) -> i16;

    /// Sensitivity constant for ambient temperature (K<sub>S<sub>T<sub>a</sub></sub></sub>).
    fn k_s_ta(&self) -> F;

    /// The corner temperatures delimiting the temperature ranges, in ℃.
    ///
    /// The datasheet indexes these starting from 1, everything here is 0-indexed.
    fn corner_temperatures(&self) -> &[i16];

    /// Object temperature sensitivity (K<sub>s<sub>T<sub>o</sub></sub></sub>) for each
    /// temperature range.
    fn k_s_to(&self) -> &[F];

    /// Sensitivity correction for each temperature range (α<sub>correction</sub>(r)).
    fn alpha_correction(&self) -> &[F];

    /// The index of the basic temperature range, the one with α<sub>correction</sub> = 1.
    fn basic_range(&self) -> usize {
        1
    }

    /// Per-pixel offsets (Offset<sub>reference</sub>(i, j)).
    fn offset_reference_pixels(&self) -> &[i32];

    /// The offset of the compensation pixel for the given subpage.
    fn offset_reference_cp(&self, subpage: Subpage) -> i16;

    /// Per-pixel sensitivities (α<sub>pixel</sub>(i, j)).
    fn alpha_pixels(&self) -> &[F];

    /// The sensitivity of the compensation pixel for the given subpage (α<sub>CP</sub>).
    fn alpha_cp(&self, subpage: Subpage) -> F;

    /// Per-pixel supply voltage coefficients (K<sub>V</sub>(i, j)).
    fn k_v_pixels(&self) -> &[F];

    /// Supply voltage coefficient of the compensation pixels (K<sub>V<sub>CP</sub></sub>).
    fn k_v_cp(&self) -> F;

    /// Per-pixel ambient temperature coefficients (K<sub>T<sub>a</sub></sub>(i, j)).
    fn k_ta_pixels(&self) -> &[F];

    /// Ambient temperature coefficient of the compensation pixels (K<sub>T<sub>a</sub>CP</sub>).
    fn k_ta_cp(&self) -> F;

    /// Temperature gradient coefficient (TGC).
    fn temperature_gradient_coefficient(&self) -> F;
}
