// SPDX-License-Identifier: Apache-2.0
// Copyright © 2021 Will Ross
//! Turning raw frames into temperatures.
//!
//! The process runs once per frame. First the values shared by every pixel are computed from the
//! frame header: supply voltage, ambient temperature, gain and the compensation pixel reading.
//! Then each pixel of the frame's subpage goes through offset, emissivity and gradient
//! compensation, and finally a two-pass solve for the object temperature (once to pick the
//! temperature range, then again with that range's correction).
//!
//! Anything that would make the whole frame meaningless (a gain register of 0, for example) is
//! checked before any output is written. Pixels that fail individually are written as NaN and
//! flagged in the returned [`FrameSummary`].
use bitvec::array::BitArray;
use log::warn;

use crate::common::{CalibrationData, NUM_CORNER_TEMPERATURES, NUM_PIXELS};
use crate::error::LibraryError;
use crate::frame::RawFrame;
use crate::register::{HeaderRegister, Subpage};
use crate::util::{i16_from_bits, Num};

/// How much colder than the sensor the surroundings are assumed to be, in ℃.
///
/// The reflected temperature (T<sub>r</sub>) is taken to be T<sub>a</sub> minus this.
pub const REFLECTED_TEMPERATURE_OFFSET: u8 = 8;

/// One bit per pixel, in the same order as the temperature buffer.
pub type PixelFlags = BitArray<[usize; NUM_PIXELS / usize::BITS as usize]>;

/// The frame-wide results of processing a frame.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameSummary<F> {
    subpage: Subpage,
    supply_voltage: F,
    ambient_temperature: F,
    invalid_pixels: PixelFlags,
}

impl<F> FrameSummary<F>
where
    F: Copy,
{
    /// The subpage that was updated.
    pub fn subpage(&self) -> Subpage {
        self.subpage
    }

    /// The pixel supply voltage (V<sub>DD</sub>) during the frame.
    pub fn supply_voltage(&self) -> F {
        self.supply_voltage
    }

    /// The ambient temperature (T<sub>a</sub>) during the frame, in ℃.
    pub fn ambient_temperature(&self) -> F {
        self.ambient_temperature
    }

    /// Pixels that could not be computed and were written as NaN.
    pub fn invalid_pixels(&self) -> &PixelFlags {
        &self.invalid_pixels
    }
}

fn supply_voltage<F, Clb>(calibration: &Clb, v_dd_pixel: i16) -> Result<F, LibraryError>
where
    F: Num,
    Clb: CalibrationData<F>,
{
    if calibration.k_v_dd() == 0 {
        return Err(LibraryError::NumericDomain("K_Vdd is zero"));
    }
    // Use i32 as the difference can overflow an i16.
    let delta = i32::from(v_dd_pixel) - i32::from(calibration.v_dd_25());
    Ok(F::coerce_from(delta) / F::coerce_from(calibration.k_v_dd()) + F::THREE_POINT_THREE)
}

fn v_ptat_art<F, Clb>(calibration: &Clb, t_a_ptat: i16, t_a_v_be: i16) -> Result<F, LibraryError>
where
    F: Num,
    Clb: CalibrationData<F>,
{
    let t_a_ptat = F::coerce_from(t_a_ptat);
    let denominator = t_a_ptat * calibration.alpha_ptat() + F::coerce_from(t_a_v_be);
    if denominator == F::ZERO {
        return Err(LibraryError::NumericDomain(
            "PTAT and V_BE readings give a zero denominator",
        ));
    }
    Ok(t_a_ptat / denominator * F::TWO_RAISED_EIGHTEEN)
}

fn ambient_temperature<F, Clb>(calibration: &Clb, v_ptat_art: F, v_dd: F) -> Result<F, LibraryError>
where
    F: Num,
    Clb: CalibrationData<F>,
{
    if calibration.k_t_ptat() == F::ZERO {
        return Err(LibraryError::NumericDomain("K_T_PTAT is zero"));
    }
    let numerator = v_ptat_art / (F::ONE + calibration.k_v_ptat() * (v_dd - F::THREE_POINT_THREE))
        - calibration.v_ptat_25();
    let t_a = numerator / calibration.k_t_ptat() + F::TWENTY_FIVE;
    if t_a.is_finite() {
        Ok(t_a)
    } else {
        Err(LibraryError::NumericDomain(
            "Ambient temperature is not a finite number",
        ))
    }
}

/// The fourth-power blackbody term combining ambient and reflected temperatures.
fn t_ar<F: Num>(t_a: F, emissivity: F) -> F {
    let t_r = t_a - F::coerce_from(REFLECTED_TEMPERATURE_OFFSET);
    let t_a_k4 = (t_a + F::KELVINS_TO_CELSIUS).powi(4);
    let t_r_k4 = (t_r + F::KELVINS_TO_CELSIUS).powi(4);
    t_r_k4 - (t_r_k4 - t_a_k4) / emissivity
}

/// Emissivity has to be in (0, 1].
pub(crate) fn check_emissivity<F: Num>(emissivity: F) -> Result<F, LibraryError> {
    if emissivity > F::ZERO && emissivity <= F::ONE {
        Ok(emissivity)
    } else {
        Err(LibraryError::NumericDomain(
            "Emissivity must be greater than 0 and at most 1",
        ))
    }
}

fn frame_gain<F, Clb>(calibration: &Clb, gain_register: i16) -> Result<F, LibraryError>
where
    F: Num,
    Clb: CalibrationData<F>,
{
    if gain_register == 0 {
        return Err(LibraryError::NumericDomain("Gain register is zero"));
    }
    Ok(F::coerce_from(calibration.gain()) / F::coerce_from(gain_register))
}

/// Values that are common to all pixels of a frame.
#[derive(Clone, Copy, Debug, PartialEq)]
struct CommonIrData<F> {
    subpage: Subpage,
    gain: F,
    v_dd: F,
    t_a: F,
    emissivity: F,
    t_ar: F,
    /// The compensation pixel, already offset compensated.
    compensation_pixel: F,
}

impl<F> CommonIrData<F>
where
    F: Num,
{
    fn new<Clb>(calibration: &Clb, emissivity: F, frame: &RawFrame) -> Result<Self, LibraryError>
    where
        Clb: CalibrationData<F>,
    {
        let emissivity = check_emissivity(emissivity)?;
        let header = frame.header();
        let subpage = header.subpage()?;
        let v_dd = supply_voltage(calibration, header.signed(HeaderRegister::PixelSupplyVoltage))?;
        if !v_dd.is_finite() {
            return Err(LibraryError::NumericDomain(
                "Supply voltage is not a finite number",
            ));
        }
        // Labelled V_PTAT in the formulas, but Ta_PTAT in the memory map.
        let v_ptat_art = v_ptat_art(
            calibration,
            header.signed(HeaderRegister::AmbientTemperatureVoltage),
            header.signed(HeaderRegister::AmbientTemperatureVoltageBe),
        )?;
        let t_a = ambient_temperature(calibration, v_ptat_art, v_dd)?;
        let gain = frame_gain(calibration, header.signed(HeaderRegister::Gain))?;
        let compensation_pixel = F::coerce_from(header.signed(HeaderRegister::CompensationPixel))
            - F::coerce_from(calibration.offset_reference_cp(subpage))
                * (F::ONE + calibration.k_ta_cp() * (t_a - F::TWENTY_FIVE))
                * (F::ONE + calibration.k_v_cp() * (v_dd - F::THREE_POINT_THREE));
        Ok(Self {
            subpage,
            gain,
            v_dd,
            t_a,
            emissivity,
            t_ar: t_ar(t_a, emissivity),
            compensation_pixel,
        })
    }
}

/// Pick the temperature range a first-pass temperature falls into.
fn temperature_range<F: Num>(corner_temperatures: &[i16], t_o: F) -> usize {
    corner_temperatures[1..]
        .iter()
        .position(|ct| t_o < F::coerce_from(*ct))
        .unwrap_or(NUM_CORNER_TEMPERATURES - 1)
}

/// Fourth root that refuses negative arguments.
fn checked_fourth_root<F: Num>(value: F) -> Option<F> {
    if value < F::ZERO {
        None
    } else {
        Some(value.fourth_root())
    }
}

/// Solve for the object temperature of one pixel.
///
/// Returns `None` when one of the roots would be of a negative number, or the result is not
/// finite.
fn per_pixel_temperature<F, Clb>(calibration: &Clb, v_ir: F, alpha: F, t_ar: F) -> Option<F>
where
    F: Num,
    Clb: CalibrationData<F>,
{
    let k_s_to = calibration.k_s_to();
    let corner_temperatures = calibration.corner_temperatures();
    let k_s_to_basic = k_s_to[calibration.basic_range()];
    let s_x = checked_fourth_root(alpha.powi(3) * (v_ir + alpha * t_ar))? * k_s_to_basic;
    let first_pass = checked_fourth_root(
        v_ir / (alpha * (F::ONE - k_s_to_basic * F::KELVINS_TO_CELSIUS) + s_x) + t_ar,
    )? - F::KELVINS_TO_CELSIUS;
    let range = temperature_range(corner_temperatures, first_pass);
    let corrected_alpha = alpha
        * calibration.alpha_correction()[range]
        * (F::ONE
            + k_s_to[range] * (first_pass - F::coerce_from(corner_temperatures[range])));
    let t_o = checked_fourth_root(v_ir / corrected_alpha + t_ar)? - F::KELVINS_TO_CELSIUS;
    if t_o.is_finite() {
        Some(t_o)
    } else {
        None
    }
}

/// Make sure a calibration source provides everything the pixel loop indexes into.
fn check_calibration_lengths<F, Clb>(calibration: &Clb) -> Result<(), LibraryError>
where
    Clb: CalibrationData<F>,
{
    let pixels_ok = calibration.offset_reference_pixels().len() >= NUM_PIXELS
        && calibration.alpha_pixels().len() >= NUM_PIXELS
        && calibration.k_v_pixels().len() >= NUM_PIXELS
        && calibration.k_ta_pixels().len() >= NUM_PIXELS;
    let ranges_ok = calibration.corner_temperatures().len() >= NUM_CORNER_TEMPERATURES
        && calibration.k_s_to().len() >= NUM_CORNER_TEMPERATURES
        && calibration.alpha_correction().len() >= NUM_CORNER_TEMPERATURES
        && calibration.basic_range() < NUM_CORNER_TEMPERATURES;
    if pixels_ok && ranges_ok {
        Ok(())
    } else {
        Err(LibraryError::InvalidData(
            "Calibration data is missing pixels or temperature ranges",
        ))
    }
}

/// Convert a raw frame into temperatures (in ℃), written into `destination`.
///
/// Only the pixels of the frame's subpage are written; for subpage 0 that's the even indices, for
/// subpage 1 the odd ones. The rest of `destination` is left as-is, so two consecutive frames are
/// needed to update every pixel. `destination` must hold at least [`NUM_PIXELS`] values.
///
/// If an error is returned, `destination` has not been modified.
pub fn raw_frame_to_temperatures<F, Clb>(
    calibration: &Clb,
    emissivity: F,
    frame: &RawFrame,
    destination: &mut [F],
) -> Result<FrameSummary<F>, LibraryError>
where
    F: Num,
    Clb: CalibrationData<F>,
{
    if destination.len() < NUM_PIXELS {
        return Err(LibraryError::InvalidData(
            "Destination buffer is smaller than the number of pixels",
        ));
    }
    check_calibration_lengths::<F, _>(calibration)?;
    let common = CommonIrData::new(calibration, emissivity, frame)?;
    let tgc = calibration.temperature_gradient_coefficient();
    let t_a_delta = common.t_a - F::TWENTY_FIVE;
    let v_dd_delta = common.v_dd - F::THREE_POINT_THREE;
    // Shared by all pixels, TGC is premultiplied.
    let compensation_pixel_offset = tgc * common.compensation_pixel;
    let alpha_compensation_pixel = tgc * calibration.alpha_cp(common.subpage);
    let alpha_coefficient = F::ONE + calibration.k_s_ta() * t_a_delta;
    let offsets = calibration.offset_reference_pixels();
    let alphas = calibration.alpha_pixels();
    let k_vs = calibration.k_v_pixels();
    let k_tas = calibration.k_ta_pixels();
    let mut invalid_pixels = PixelFlags::default();
    let pixel_indices = (common.subpage as usize..NUM_PIXELS).step_by(2);
    for (index, raw) in pixel_indices.zip(frame.pixels().iter().copied()) {
        let mut v_ir = F::coerce_from(i16_from_bits(raw)) * common.gain;
        v_ir -= F::coerce_from(offsets[index])
            * (F::ONE + k_tas[index] * t_a_delta)
            * (F::ONE + k_vs[index] * v_dd_delta);
        v_ir /= common.emissivity;
        v_ir -= compensation_pixel_offset;
        let alpha = (alphas[index] - alpha_compensation_pixel) * alpha_coefficient;
        destination[index] = match per_pixel_temperature(calibration, v_ir, alpha, common.t_ar) {
            Some(t_o) => t_o,
            None => {
                invalid_pixels.set(index, true);
                F::NAN
            }
        };
    }
    let invalid_count = invalid_pixels.count_ones();
    if invalid_count > 0 {
        warn!(
            "{} pixels in subpage {:?} could not be compensated",
            invalid_count, common.subpage
        );
    }
    Ok(FrameSummary {
        subpage: common.subpage,
        supply_voltage: common.v_dd,
        ambient_temperature: common.t_a,
        invalid_pixels,
    })
}

#[cfg(test)]
mod test {
    use float_cmp::{approx_eq, assert_approx_eq};

    use crate::common::{pixel_index, CalibrationData, NUM_CORNER_TEMPERATURES, NUM_PIXELS};
    use crate::eeprom::CalibrationParameters;
    use crate::error::LibraryError;
    use crate::frame::{FrameHeader, RawFrame, PIXELS_PER_FRAME};
    use crate::register::Subpage;
    use crate::test::{
        datasheet_eeprom_words, datasheet_header_packet, datasheet_pixel_packets, header_packet,
        DATASHEET_PIXEL_WORD,
    };

    use super::{raw_frame_to_temperatures, FrameSummary};

    fn datasheet_calibration() -> CalibrationParameters<f64> {
        CalibrationParameters::from_words(&datasheet_eeprom_words())
            .expect("The datasheet EEPROM should be parseable")
    }

    fn datasheet_frame(subpage: u16) -> RawFrame {
        let header = FrameHeader::from_packet(&datasheet_header_packet(subpage)).unwrap();
        RawFrame::from_packets(header, &datasheet_pixel_packets()).unwrap()
    }

    /// A frame with the datasheet header registers, with some replaced.
    fn frame_with_registers(registers: [u16; 6], pixels: &[u16]) -> RawFrame {
        let header = FrameHeader::from_packet(&header_packet(registers)).unwrap();
        RawFrame::new(header, pixels).unwrap()
    }

    // The worked example in the datasheet: V_DD pix = 0xCCC5, PTAT = 0x06AF, V_BE = 0x4BF2,
    // gain = 0x1881 and every pixel reading 0x0261.

    #[test]
    fn supply_voltage() {
        let clb = datasheet_calibration();
        let v_dd: f64 = super::supply_voltage(&clb, -13115).unwrap();
        assert_approx_eq!(f64, v_dd, 3.3186237373737373, epsilon = 1e-12);
    }

    #[test]
    fn v_ptat_art() {
        let clb = datasheet_calibration();
        let v_ptat_art: f64 = super::v_ptat_art(&clb, 1711, 19442).unwrap();
        assert_approx_eq!(f64, v_ptat_art, 12873.579518383514, epsilon = 1e-8);
    }

    #[test]
    fn ambient_temperature() {
        let clb = datasheet_calibration();
        let t_a = super::ambient_temperature(&clb, 12873.579518383514, 3.3186237373737373);
        assert_approx_eq!(f64, t_a.unwrap(), 39.18442378914584, epsilon = 1e-10);
    }

    #[test]
    fn gain() {
        let clb = datasheet_calibration();
        let gain: f64 = super::frame_gain(&clb, 6273).unwrap();
        assert_approx_eq!(f64, gain, 1.0175354694723417, epsilon = 1e-14);
    }

    #[test]
    fn compensation_pixel() {
        let clb = datasheet_calibration();
        let common = super::CommonIrData::new(&clb, 0.95, &datasheet_frame(1)).unwrap();
        assert_eq!(common.subpage, Subpage::One);
        assert_approx_eq!(f64, common.compensation_pixel, 26.763268133702127, epsilon = 1e-9);
    }

    #[test]
    fn temperature_range() {
        let ct = [-40i16, 0, 160, 320];
        assert_eq!(super::temperature_range(&ct, -50f64), 0);
        assert_eq!(super::temperature_range(&ct, -0.5f64), 0);
        assert_eq!(super::temperature_range(&ct, 0f64), 1);
        assert_eq!(super::temperature_range(&ct, 159.9f64), 1);
        assert_eq!(super::temperature_range(&ct, 160f64), 2);
        assert_eq!(super::temperature_range(&ct, 400f64), 3);
        assert_eq!(super::temperature_range(&ct, f64::NAN), 3);
    }

    #[test]
    fn datasheet_temperatures() {
        let clb = datasheet_calibration();
        let mut temperatures = [0f64; NUM_PIXELS];
        let summary =
            raw_frame_to_temperatures(&clb, 0.95, &datasheet_frame(1), &mut temperatures).unwrap();
        assert_eq!(summary.subpage(), Subpage::One);
        assert_approx_eq!(f64, summary.supply_voltage(), 3.3186237373737373, epsilon = 1e-12);
        assert_approx_eq!(f64, summary.ambient_temperature(), 39.18442378914584, epsilon = 1e-10);
        assert!(!summary.invalid_pixels().any());
        assert_approx_eq!(f64, temperatures[1], 119.67008733786201, epsilon = 1e-6);
        assert_approx_eq!(
            f64,
            temperatures[pixel_index(11, 15)],
            82.30076682865968,
            epsilon = 1e-6
        );
        assert_approx_eq!(f64, temperatures[767], 184.69648259626075, epsilon = 1e-6);
    }

    #[test]
    fn unit_emissivity() {
        let clb = datasheet_calibration();
        let mut temperatures = [0f64; NUM_PIXELS];
        raw_frame_to_temperatures(&clb, 1.0, &datasheet_frame(1), &mut temperatures).unwrap();
        assert_approx_eq!(
            f64,
            temperatures[pixel_index(11, 15)],
            80.0942523139995,
            epsilon = 1e-6
        );
    }

    #[test]
    fn subpage_zero() {
        let clb = datasheet_calibration();
        let mut temperatures = [0f64; NUM_PIXELS];
        let summary =
            raw_frame_to_temperatures(&clb, 0.95, &datasheet_frame(0), &mut temperatures).unwrap();
        assert_eq!(summary.subpage(), Subpage::Zero);
        assert_approx_eq!(f64, temperatures[0], 129.7124644703996, epsilon = 1e-6);
        assert_approx_eq!(f64, temperatures[766], 183.45047504142508, epsilon = 1e-6);
    }

    #[test]
    fn single_precision() {
        let clb = CalibrationParameters::<f32>::from_words(&datasheet_eeprom_words()).unwrap();
        let mut temperatures = [0f32; NUM_PIXELS];
        raw_frame_to_temperatures(&clb, 0.95, &datasheet_frame(1), &mut temperatures).unwrap();
        assert!(approx_eq!(
            f32,
            temperatures[pixel_index(11, 15)],
            82.30077,
            epsilon = 0.01
        ));
    }

    fn check_interlace(subpage: u16) {
        const SENTINEL: f64 = -1234.5;
        let clb = datasheet_calibration();
        let mut temperatures = [SENTINEL; NUM_PIXELS];
        raw_frame_to_temperatures(&clb, 0.95, &datasheet_frame(subpage), &mut temperatures)
            .unwrap();
        for (index, temperature) in temperatures.iter().enumerate() {
            if index % 2 == subpage as usize {
                assert_ne!(
                    temperature.to_bits(),
                    SENTINEL.to_bits(),
                    "pixel {} should have been written",
                    index
                );
            } else {
                assert_eq!(
                    temperature.to_bits(),
                    SENTINEL.to_bits(),
                    "pixel {} should have been left alone",
                    index
                );
            }
        }
    }

    #[test]
    fn interlace_subpage_zero() {
        check_interlace(0);
    }

    #[test]
    fn interlace_subpage_one() {
        check_interlace(1);
    }

    #[test]
    fn deterministic() {
        let clb = datasheet_calibration();
        let frame = datasheet_frame(1);
        let mut first = [0f64; NUM_PIXELS];
        let mut second = [0f64; NUM_PIXELS];
        let first_summary = raw_frame_to_temperatures(&clb, 0.95, &frame, &mut first).unwrap();
        let second_summary = raw_frame_to_temperatures(&clb, 0.95, &frame, &mut second).unwrap();
        assert_eq!(first_summary, second_summary);
        assert!(first
            .iter()
            .zip(second.iter())
            .all(|(a, b)| a.to_bits() == b.to_bits()));
    }

    /// Calibration with no per-pixel offsets or voltage/temperature dependencies, and a
    /// sensitivity of 1 everywhere.
    struct FlatCalibration {
        corner_temperatures: [i16; NUM_CORNER_TEMPERATURES],
        k_s_to: [f64; NUM_CORNER_TEMPERATURES],
        alpha_correction: [f64; NUM_CORNER_TEMPERATURES],
        offsets: [i32; NUM_PIXELS],
        alphas: [f64; NUM_PIXELS],
        zeros: [f64; NUM_PIXELS],
    }

    impl Default for FlatCalibration {
        fn default() -> Self {
            Self {
                corner_temperatures: [-40, 0, 160, 320],
                k_s_to: [0.0; NUM_CORNER_TEMPERATURES],
                alpha_correction: [1.0; NUM_CORNER_TEMPERATURES],
                offsets: [0; NUM_PIXELS],
                alphas: [1.0; NUM_PIXELS],
                zeros: [0.0; NUM_PIXELS],
            }
        }
    }

    impl CalibrationData<f64> for FlatCalibration {
        fn k_v_dd(&self) -> i16 {
            -3168
        }
        fn v_dd_25(&self) -> i16 {
            -13056
        }
        fn resolution(&self) -> u8 {
            2
        }
        fn k_v_ptat(&self) -> f64 {
            0.0
        }
        fn k_t_ptat(&self) -> f64 {
            42.25
        }
        fn v_ptat_25(&self) -> f64 {
            12273.0
        }
        fn alpha_ptat(&self) -> f64 {
            9.0
        }
        fn gain(&self) -> i16 {
            1
        }
        fn k_s_ta(&self) -> f64 {
            0.0
        }
        fn corner_temperatures(&self) -> &[i16] {
            &self.corner_temperatures
        }
        fn k_s_to(&self) -> &[f64] {
            &self.k_s_to
        }
        fn alpha_correction(&self) -> &[f64] {
            &self.alpha_correction
        }
        fn offset_reference_pixels(&self) -> &[i32] {
            &self.offsets
        }
        fn offset_reference_cp(&self, _subpage: Subpage) -> i16 {
            0
        }
        fn alpha_pixels(&self) -> &[f64] {
            &self.alphas
        }
        fn alpha_cp(&self, _subpage: Subpage) -> f64 {
            0.0
        }
        fn k_v_pixels(&self) -> &[f64] {
            &self.zeros
        }
        fn k_v_cp(&self) -> f64 {
            0.0
        }
        fn k_ta_pixels(&self) -> &[f64] {
            &self.zeros
        }
        fn k_ta_cp(&self) -> f64 {
            0.0
        }
        fn temperature_gradient_coefficient(&self) -> f64 {
            0.0
        }
    }

    #[test]
    fn flat_calibration_is_finite() {
        let clb = FlatCalibration::default();
        // Gain of 1, zero pixels, but nonzero PTAT and V_BE to keep the ambient temperature
        // defined.
        let frame = frame_with_registers([0, 0x4BF2, 0, 1, 0x06AF, 0], &[0u16; PIXELS_PER_FRAME]);
        let mut first = [0f64; NUM_PIXELS];
        let summary = raw_frame_to_temperatures(&clb, 0.95, &frame, &mut first).unwrap();
        assert!(!summary.invalid_pixels().any());
        assert!(first.iter().step_by(2).all(|t| t.is_finite()));
        let mut second = [0f64; NUM_PIXELS];
        raw_frame_to_temperatures(&clb, 0.95, &frame, &mut second).unwrap();
        assert!(first
            .iter()
            .zip(second.iter())
            .all(|(a, b)| a.to_bits() == b.to_bits()));
        // With no signal and no k_s_to, every pixel sees the same radiation.
        assert!(first.iter().step_by(2).all(|t| *t == first[0]));
    }

    fn check_untouched_on_error(
        clb: &impl CalibrationData<f64>,
        emissivity: f64,
        frame: &RawFrame,
    ) -> LibraryError {
        const SENTINEL: f64 = 42.0;
        let mut temperatures = [SENTINEL; NUM_PIXELS];
        let err = raw_frame_to_temperatures(clb, emissivity, frame, &mut temperatures)
            .expect_err("The frame should have been rejected");
        assert!(temperatures.iter().all(|t| t.to_bits() == SENTINEL.to_bits()));
        err
    }

    #[test]
    fn zero_gain_register() {
        let frame = frame_with_registers(
            [0, 0x4BF2, 0xFFCA, 0, 0x06AF, 0xCCC5],
            &[DATASHEET_PIXEL_WORD; PIXELS_PER_FRAME],
        );
        let err = check_untouched_on_error(&datasheet_calibration(), 0.95, &frame);
        assert!(matches!(err, LibraryError::NumericDomain(_)));
    }

    #[test]
    fn zero_ptat_denominator() {
        // Every register zero except the gain.
        let frame = frame_with_registers([0, 0, 0, 1, 0, 0], &[0u16; PIXELS_PER_FRAME]);
        let err = check_untouched_on_error(&FlatCalibration::default(), 0.95, &frame);
        assert!(matches!(err, LibraryError::NumericDomain(_)));
    }

    #[test]
    fn invalid_emissivity() {
        let clb = datasheet_calibration();
        let frame = datasheet_frame(0);
        for emissivity in [0.0, -0.5, 1.5, f64::NAN] {
            let err = check_untouched_on_error(&clb, emissivity, &frame);
            assert!(matches!(err, LibraryError::NumericDomain(_)));
        }
    }

    #[test]
    fn invalid_subpage() {
        let frame = frame_with_registers(
            [2, 0x4BF2, 0xFFCA, 0x1881, 0x06AF, 0xCCC5],
            &[DATASHEET_PIXEL_WORD; PIXELS_PER_FRAME],
        );
        let err = check_untouched_on_error(&datasheet_calibration(), 0.95, &frame);
        assert!(matches!(err, LibraryError::InvalidData(_)));
    }

    #[test]
    fn short_destination() {
        let clb = datasheet_calibration();
        let mut temperatures = [0f64; NUM_PIXELS - 1];
        let res = raw_frame_to_temperatures(&clb, 0.95, &datasheet_frame(0), &mut temperatures);
        assert!(matches!(res, Err(LibraryError::InvalidData(_))));
    }

    #[test]
    fn negative_radicand_is_flagged() {
        let clb = datasheet_calibration();
        let mut pixels = [DATASHEET_PIXEL_WORD; PIXELS_PER_FRAME];
        // The most negative reading possible, for the first pixel of subpage 1.
        pixels[0] = 0x8000;
        let frame = frame_with_registers([1, 0x4BF2, 0xFFC8, 0x1881, 0x06AF, 0xCCC5], &pixels);
        let mut temperatures = [0f64; NUM_PIXELS];
        let summary: FrameSummary<f64> =
            raw_frame_to_temperatures(&clb, 0.95, &frame, &mut temperatures).unwrap();
        assert!(temperatures[1].is_nan());
        assert!(summary.invalid_pixels()[1]);
        assert_eq!(summary.invalid_pixels().count_ones(), 1);
        // The rest of the frame is still computed.
        assert_approx_eq!(f64, temperatures[767], 184.69648259626075, epsilon = 1e-6);
        assert!(temperatures
            .iter()
            .skip(3)
            .step_by(2)
            .all(|t| t.is_finite()));
    }
}
