// SPDX-License-Identifier: Apache-2.0
// Copyright © 2021 Will Ross
//! Decoding the factory calibration stored in the sensor's EEPROM.
use log::debug;
use num_enum::IntoPrimitive;

use crate::address_enum_ops;
use crate::common::*;
use crate::error::{Error, LibraryError};
use crate::expose_member;
use crate::register::Subpage;
use crate::transport::Transport;
use crate::util::{
    i10_from_bits, i16_from_bits, i4_from_bits, i6_from_bits, i8_from_bits, sign_extend,
    words_from_be_bytes, Num, WORD_SIZE,
};

/// EEPROM addresses used for calibration.
// NOTE: To make it easier to compare against the datasheet, discriminant values should *always* be
// explicitly written out.
#[derive(Clone, Copy, Debug, Eq, PartialEq, PartialOrd, Ord, IntoPrimitive)]
#[repr(u16)]
pub enum EepromAddress {
    /// The start of the EEPROM. The first 16 words are device configuration, not calibration.
    Base = 0x2400,

    /// Covers α<sub>PTAT</sub> and the offset compensation scaling factors (row, column and
    /// remainder).
    OffsetCompensation = 0x2410,

    PixelOffsetAverage = 0x2411,

    /// Six words of packed 4-bit row offsets, four rows per word, lowest nibble first.
    OffsetCompensationRowStart = 0x2412,

    /// Eight words of packed 4-bit column offsets, four columns per word, lowest nibble first.
    OffsetCompensationColumnStart = 0x2418,

    /// Covers the α scaling factor and the pixel α compensation scaling factors.
    SensitivityScale = 0x2420,

    /// α<sub>reference</sub>, the one unsigned value in the calibration block.
    PixelSensitivityAverage = 0x2421,

    PixelSensitivityCompensationRowStart = 0x2422,

    PixelSensitivityCompensationColumnStart = 0x2428,

    Gain = 0x2430,

    Ptat25 = 0x2431,

    /// Covers both K<sub>V<sub>PTAT</sub></sub> and K<sub>T<sub>PTAT</sub></sub>
    PtatConstants = 0x2432,

    /// Covers both K<sub>V<sub>DD</sub></sub> and V<sub>DD<sub>25</sub></sub>
    VddConstants = 0x2433,

    /// Four 4-bit K<sub>V</sub> values, one for each row/column parity.
    AverageVoltageConstants = 0x2434,

    /// K<sub>T<sub>a</sub>RC</sub> for even columns, even rows in the high byte.
    ///
    /// NOTE: this library uses 0-indexing, while the datasheet uses 1-indexing, so even and odd
    /// are swapped compared to the datasheet.
    AmbientTemperatureAverageConstantsEvenColumns = 0x2436,

    /// K<sub>T<sub>a</sub>RC</sub> for odd columns, even rows in the high byte.
    AmbientTemperatureAverageConstantsOddColumns = 0x2437,

    /// Contains scaling factors for K<sub>V</sub> and K<sub>T<sub>a</sub></sub>, as well as the
    /// resolution control calibration.
    VAndTaScale = 0x2438,

    CompensationPixelSensitivity = 0x2439,

    CompensationPixelOffset = 0x243A,

    /// K<sub>V</sub> and K<sub>T<sub>a</sub></sub> for the compensation pixels.
    CompensationPixelConstants = 0x243B,

    /// Covers both K<sub>S<sub>T<sub>a</sub></sub></sub> and the temperature gradient coefficient.
    SensitivityAndGradient = 0x243C,

    /// K<sub>S<sub>T<sub>o</sub></sub></sub> for the first two ranges, first range in the low
    /// byte.
    TemperatureSensitivityRanges12 = 0x243D,

    TemperatureSensitivityRanges34 = 0x243E,

    /// Corner temperature step and multipliers, along with the
    /// K<sub>S<sub>T<sub>o</sub></sub></sub> scale.
    CornerTemperatures = 0x243F,

    /// The start of the per-pixel words, one per pixel in row-major order.
    PixelStart = 0x2440,

    End = 0x273F,
}

address_enum_ops!(EepromAddress);

/// The length of the EEPROM, in 16-bit words.
pub const EEPROM_LENGTH: usize = (EepromAddress::End as usize - EepromAddress::Base as usize) + 1;

/// The length of the EEPROM in bytes, as it comes over the wire.
pub const EEPROM_BYTE_LENGTH: usize = EEPROM_LENGTH * WORD_SIZE;

/// Calibration values decoded from an EEPROM image.
///
/// These are computed once when a sensor is opened, and then only read from. Sharing one
/// `CalibrationParameters` between threads that are each converting their own frames is fine.
#[derive(Clone, Debug, PartialEq)]
pub struct CalibrationParameters<F> {
    k_v_dd: i16,

    v_dd_25: i16,

    resolution: u8,

    k_v_ptat: F,

    k_t_ptat: F,

    v_ptat_25: F,

    alpha_ptat: F,

    gain: i16,

    k_s_ta: F,

    corner_temperatures: [i16; NUM_CORNER_TEMPERATURES],

    k_s_to: [F; NUM_CORNER_TEMPERATURES],

    alpha_correction: [F; NUM_CORNER_TEMPERATURES],

    offset_reference_pixels: [i32; NUM_PIXELS],

    offset_reference_cp: [i16; 2],

    alpha_pixels: [F; NUM_PIXELS],

    alpha_cp: [F; 2],

    k_v_pixels: [F; NUM_PIXELS],

    k_v_cp: F,

    k_ta_pixels: [F; NUM_PIXELS],

    k_ta_cp: F,

    temperature_gradient_coefficient: F,
}

/// Extract four unsigned 4-bit values from a word, most significant first.
fn word_to_u4s(word: u16) -> [u8; 4] {
    [
        (word >> 12) as u8 & 0xF,
        (word >> 8) as u8 & 0xF,
        (word >> 4) as u8 & 0xF,
        word as u8 & 0xF,
    ]
}

/// Unpack signed 4-bit values stored four to a word, starting with the lowest nibble.
fn unpack_i4s<const N: usize>(words: &[u16]) -> [i16; N] {
    let mut values = [0i16; N];
    for (index, value) in values.iter_mut().enumerate() {
        let shift = (index % 4) * 4;
        *value = i4_from_bits(words[index / 4] >> shift);
    }
    values
}

/// Index into a row/column parity pattern.
///
/// The patterns are ordered even row/even column, odd row/even column, even row/odd column, then
/// odd row/odd column. Rows and columns are 0-indexed.
fn chessboard_index(row: usize, column: usize) -> usize {
    (row % 2) + 2 * (column % 2)
}

/// The shared row/column structure of the offset and sensitivity calibration.
///
/// Each pixel starts from an average, then has a scaled per-row value and a scaled per-column
/// value added to it. The per-pixel remainder is left to the caller.
fn bulk_pixel_calibration(
    average: i32,
    rows: &[i16; HEIGHT],
    row_scale: u8,
    columns: &[i16; WIDTH],
    column_scale: u8,
) -> [i32; NUM_PIXELS] {
    let mut pixels = [average; NUM_PIXELS];
    for (row_pixels, row_value) in pixels.chunks_exact_mut(WIDTH).zip(rows) {
        let row_value = i32::from(*row_value) << row_scale;
        for (pixel, column_value) in row_pixels.iter_mut().zip(columns) {
            *pixel += row_value + (i32::from(*column_value) << column_scale);
        }
    }
    pixels
}

/// Sensitivity correction factors for each temperature range.
///
/// The basic range (index 1) is the reference, so its factor is exactly 1.
fn alpha_correction_coefficients<F: Num>(
    corner_temperatures: &[i16; NUM_CORNER_TEMPERATURES],
    k_s_to: &[F; NUM_CORNER_TEMPERATURES],
) -> [F; NUM_CORNER_TEMPERATURES] {
    let ct = corner_temperatures;
    let below_basic = F::ONE / (F::ONE + k_s_to[0] * F::coerce_from(ct[1] - ct[0]));
    let first_extended = F::ONE + k_s_to[2] * F::coerce_from(ct[2]);
    let second_extended = first_extended * (F::ONE + k_s_to[3] * F::coerce_from(ct[3] - ct[2]));
    [below_basic, F::ONE, first_extended, second_extended]
}

impl<F> CalibrationParameters<F>
where
    F: Num,
{
    /// Decode the calibration values from a full EEPROM image.
    ///
    /// `words` must be the entire EEPROM, exactly [`EEPROM_LENGTH`] words starting at
    /// [`EepromAddress::Base`]. Anything else is rejected instead of producing garbage
    /// calibration.
    pub fn from_words(words: &[u16]) -> Result<Self, LibraryError> {
        if words.len() != EEPROM_LENGTH {
            return Err(LibraryError::InvalidData(
                "EEPROM image must be exactly 832 words long",
            ));
        }
        let offset_of = |address: EepromAddress| usize::from(address - EepromAddress::Base);
        let word = |address: EepromAddress| words[offset_of(address)];
        // Supply voltage
        let vdd_constants = word(EepromAddress::VddConstants);
        let k_v_dd = i8_from_bits(vdd_constants >> 8) << 5;
        // The low byte is unsigned, but immediately sent negative by subtracting 256, then
        // multiplied by 2^5, and finally has 2^13 subtracted from it.
        let v_dd_25 = ((vdd_constants & 0xFF) as i16 - 256) * (1 << 5) - (1 << 13);
        // Ambient temperature
        let ptat_constants = word(EepromAddress::PtatConstants);
        let k_v_ptat = F::coerce_from(i6_from_bits(ptat_constants >> 10)) / F::pow2(12);
        let k_t_ptat = F::coerce_from(i10_from_bits(ptat_constants)) / F::pow2(3);
        let v_ptat_25 = F::coerce_from(i16_from_bits(word(EepromAddress::Ptat25)));
        // Offsets. The top nibble of the scale word is α_PTAT, not a scale.
        let [alpha_ptat_raw, offset_row_scale, offset_column_scale, offset_remainder_scale] =
            word_to_u4s(word(EepromAddress::OffsetCompensation));
        let alpha_ptat = F::coerce_from(alpha_ptat_raw) / F::coerce_from(4u8) + F::coerce_from(8u8);
        let rows_start = offset_of(EepromAddress::OffsetCompensationRowStart);
        let columns_start = offset_of(EepromAddress::OffsetCompensationColumnStart);
        let mut offset_reference_pixels = bulk_pixel_calibration(
            i32::from(i16_from_bits(word(EepromAddress::PixelOffsetAverage))),
            &unpack_i4s(&words[rows_start..]),
            offset_row_scale,
            &unpack_i4s(&words[columns_start..]),
            offset_column_scale,
        );
        // Sensitivity
        let [alpha_scale_raw, alpha_row_scale, alpha_column_scale, alpha_remainder_scale] =
            word_to_u4s(word(EepromAddress::SensitivityScale));
        let rows_start = offset_of(EepromAddress::PixelSensitivityCompensationRowStart);
        let columns_start = offset_of(EepromAddress::PixelSensitivityCompensationColumnStart);
        let alpha_numerators = bulk_pixel_calibration(
            i32::from(word(EepromAddress::PixelSensitivityAverage)),
            &unpack_i4s(&words[rows_start..]),
            alpha_row_scale,
            &unpack_i4s(&words[columns_start..]),
            alpha_column_scale,
        );
        // The pixel α scale has 30 added, the compensation pixel one has 27 added.
        let alpha_scale = F::pow2(alpha_scale_raw + 30);
        let alpha_scale_cp = F::pow2(alpha_scale_raw + 27);
        // K_V and K_Ta scales, and the calibrated resolution.
        let [resolution_raw, k_v_scale, k_ta_scale1, k_ta_scale2] =
            word_to_u4s(word(EepromAddress::VAndTaScale));
        // The upper two bits of that nibble are reserved.
        let resolution = resolution_raw & 0x3;
        let k_v_scale = F::pow2(k_v_scale);
        let k_ta_scale1 = F::pow2(k_ta_scale1 + 8);
        let k_v_pattern = word_to_u4s(word(EepromAddress::AverageVoltageConstants))
            .map(|nibble| F::coerce_from(i4_from_bits(u16::from(nibble))) / k_v_scale);
        let k_ta_even_columns = word(EepromAddress::AmbientTemperatureAverageConstantsEvenColumns);
        let k_ta_odd_columns = word(EepromAddress::AmbientTemperatureAverageConstantsOddColumns);
        let k_ta_pattern = [
            i8_from_bits(k_ta_even_columns >> 8),
            i8_from_bits(k_ta_even_columns),
            i8_from_bits(k_ta_odd_columns >> 8),
            i8_from_bits(k_ta_odd_columns),
        ];
        // Per-pixel remainders, everything above is the shared part.
        let pixel_words = &words[offset_of(EepromAddress::PixelStart)..];
        let mut alpha_pixels = [F::ZERO; NUM_PIXELS];
        let mut k_v_pixels = [F::ZERO; NUM_PIXELS];
        let mut k_ta_pixels = [F::ZERO; NUM_PIXELS];
        for (index, pixel_word) in pixel_words.iter().copied().enumerate() {
            let pattern_index = chessboard_index(index / WIDTH, index % WIDTH);
            // Bits 15:10 are the offset remainder, 9:4 the sensitivity remainder, 3:1 K_Ta and
            // bit 0 is the outlier flag.
            let offset_remainder = i32::from(i6_from_bits(pixel_word >> 10));
            offset_reference_pixels[index] += offset_remainder << offset_remainder_scale;
            let alpha_remainder = i32::from(i6_from_bits(pixel_word >> 4));
            let alpha_numerator =
                alpha_numerators[index] + (alpha_remainder << alpha_remainder_scale);
            alpha_pixels[index] = F::coerce_from(alpha_numerator) / alpha_scale;
            k_v_pixels[index] = k_v_pattern[pattern_index];
            // Keep the numerator as an integer for as long as possible.
            let k_ta_remainder = sign_extend((pixel_word >> 1) & 0x7, 3);
            let k_ta_numerator = (i32::from(k_ta_remainder) << k_ta_scale2)
                + i32::from(k_ta_pattern[pattern_index]);
            k_ta_pixels[index] = F::coerce_from(k_ta_numerator) / k_ta_scale1;
        }
        // Compensation pixels
        let cp_sensitivity = word(EepromAddress::CompensationPixelSensitivity);
        let alpha_cp0 = F::coerce_from(i10_from_bits(cp_sensitivity)) / alpha_scale_cp;
        let alpha_cp_ratio = F::coerce_from(i6_from_bits(cp_sensitivity >> 10)) / F::pow2(7);
        let alpha_cp = [alpha_cp0, (F::ONE + alpha_cp_ratio) * alpha_cp0];
        let cp_offset = word(EepromAddress::CompensationPixelOffset);
        let offset_cp0 = i10_from_bits(cp_offset);
        let offset_reference_cp = [offset_cp0, offset_cp0 + i6_from_bits(cp_offset >> 10)];
        let cp_constants = word(EepromAddress::CompensationPixelConstants);
        let k_v_cp = F::coerce_from(i8_from_bits(cp_constants >> 8)) / k_v_scale;
        let k_ta_cp = F::coerce_from(i8_from_bits(cp_constants)) / k_ta_scale1;
        let gain = i16_from_bits(word(EepromAddress::Gain));
        let sensitivity_and_gradient = word(EepromAddress::SensitivityAndGradient);
        let k_s_ta = F::coerce_from(i8_from_bits(sensitivity_and_gradient >> 8)) / F::pow2(13);
        let temperature_gradient_coefficient =
            F::coerce_from(i8_from_bits(sensitivity_and_gradient)) / F::pow2(5);
        // Corner temperatures. Like the resolution, the top two bits of the step are reserved, and
        // the step is in units of 10℃.
        let [step_raw, ct3_multiplier, ct2_multiplier, k_s_to_scale] =
            word_to_u4s(word(EepromAddress::CornerTemperatures));
        let step = i16::from(step_raw & 0x3) * 10;
        let ct2 = i16::from(ct2_multiplier) * step;
        let ct3 = i16::from(ct3_multiplier) * step + ct2;
        // -40 and 0 are fixed.
        let corner_temperatures = [-40i16, 0, ct2, ct3];
        let k_s_to_scale = F::pow2(k_s_to_scale + 8);
        let ranges12 = word(EepromAddress::TemperatureSensitivityRanges12);
        let ranges34 = word(EepromAddress::TemperatureSensitivityRanges34);
        let k_s_to = [ranges12, ranges12 >> 8, ranges34, ranges34 >> 8]
            .map(|raw| F::coerce_from(i8_from_bits(raw)) / k_s_to_scale);
        let alpha_correction = alpha_correction_coefficients(&corner_temperatures, &k_s_to);
        Ok(Self {
            k_v_dd,
            v_dd_25,
            resolution,
            k_v_ptat,
            k_t_ptat,
            v_ptat_25,
            alpha_ptat,
            gain,
            k_s_ta,
            corner_temperatures,
            k_s_to,
            alpha_correction,
            offset_reference_pixels,
            offset_reference_cp,
            alpha_pixels,
            alpha_cp,
            k_v_pixels,
            k_v_cp,
            k_ta_pixels,
            k_ta_cp,
            temperature_gradient_coefficient,
        })
    }

    /// Decode the calibration values from the raw (big-endian) bytes of an EEPROM dump.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, LibraryError> {
        if bytes.len() != EEPROM_BYTE_LENGTH {
            return Err(LibraryError::InvalidData(
                "EEPROM dump must be exactly 1664 bytes long",
            ));
        }
        let mut words = [0u16; EEPROM_LENGTH];
        words_from_be_bytes(bytes, &mut words);
        Self::from_words(&words)
    }

    /// Read the EEPROM through the bridge and decode it.
    pub fn from_transport<T>(transport: &mut T, i2c_address: u8) -> Result<Self, Error<T>>
    where
        T: Transport,
    {
        let mut eeprom_bytes = [0u8; EEPROM_BYTE_LENGTH];
        transport
            .read_memory(i2c_address, EepromAddress::Base.into(), &mut eeprom_bytes)
            .map_err(Error::TransportError)?;
        let calibration = Self::from_bytes(&eeprom_bytes)?;
        debug!(
            "Loaded calibration from {:#04X}: kVdd={}, vdd25={}, gain={}, resolution={}",
            i2c_address,
            calibration.k_v_dd,
            calibration.v_dd_25,
            calibration.gain,
            calibration.resolution
        );
        Ok(calibration)
    }
}

impl<F> CalibrationData<F> for CalibrationParameters<F>
where
    F: Num,
{
    expose_member!(k_v_dd, i16);
    expose_member!(v_dd_25, i16);
    expose_member!(resolution, u8);
    expose_member!(k_v_ptat, F);
    expose_member!(k_t_ptat, F);
    expose_member!(v_ptat_25, F);
    expose_member!(alpha_ptat, F);
    expose_member!(gain, i16);
    expose_member!(k_s_ta, F);

    expose_member!(&corner_temperatures, [i16]);
    expose_member!(&k_s_to, [F]);
    expose_member!(&alpha_correction, [F]);

    expose_member!(&offset_reference_pixels, [i32]);

    fn offset_reference_cp(&self, subpage: Subpage) -> i16 {
        self.offset_reference_cp[subpage as usize]
    }

    expose_member!(&alpha_pixels, [F]);

    fn alpha_cp(&self, subpage: Subpage) -> F {
        self.alpha_cp[subpage as usize]
    }

    expose_member!(&k_v_pixels, [F]);
    expose_member!(k_v_cp, F);
    expose_member!(&k_ta_pixels, [F]);
    expose_member!(k_ta_cp, F);
    expose_member!(temperature_gradient_coefficient, F);
}
