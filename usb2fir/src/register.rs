// SPDX-License-Identifier: Apache-2.0
// Copyright © 2021 Will Ross
use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::error::LibraryError;

/// Identify which subpage a frame covers.
///
/// The sensor only updates half of its pixels each frame, alternating between the two subpages.
#[derive(Clone, Copy, Debug, Eq, PartialEq, PartialOrd, Ord, IntoPrimitive, TryFromPrimitive)]
#[repr(usize)]
pub enum Subpage {
    Zero = 0,
    One = 1,
}

impl Subpage {
    /// Parse the subpage register from a frame header.
    pub(crate) fn from_register(raw_value: u16) -> Result<Self, LibraryError> {
        Self::try_from(raw_value as usize)
            .map_err(|_| LibraryError::InvalidData("Frame header has an invalid subpage"))
    }
}

/// The registers the USB2FIR bridge sends at the start of each frame header packet.
///
/// The discriminant is the index of the 16-bit word within the header packet.
// NOTE: discriminant values should *always* be explicitly written out.
#[derive(Clone, Copy, Debug, Eq, PartialEq, PartialOrd, Ord, IntoPrimitive)]
#[repr(usize)]
pub enum HeaderRegister {
    /// First half of the header marker, always `0xFFFF` on a header packet.
    Id0 = 0,

    /// Second half of the header marker, always `0x0000` on a header packet.
    Id1 = 1,

    /// The subpage the following pixel data belongs to.
    Subpage = 2,

    /// Labelled V<sub>BE</sub> and Ta<sub>V<sub>BE</sub></sub> in the datasheet.
    AmbientTemperatureVoltageBe = 3,

    /// The compensation pixel for the subpage in this frame.
    CompensationPixel = 4,

    /// The current (in the temporal sense, not electrical) gain.
    Gain = 5,

    /// Ambient temperature voltage, labelled T<sub>a<sub>PTAT</sub></sub> in the datasheet.
    AmbientTemperatureVoltage = 6,

    /// The pixel supply voltage, labelled V<sub>DD<sub>pix</sub></sub> in the datasheet.
    PixelSupplyVoltage = 7,
}

/// The number of registers in a frame header.
pub const HEADER_REGISTER_COUNT: usize = 8;

/// The possible refresh rates the sensor supports in burst mode.
///
/// The USB bridge forwards the raw value straight to the sensor's control register, so these
/// map one-to-one onto the MLX90640 refresh rate codes. Higher rates are also limited by how fast
/// the host can drain the bulk endpoint.
#[derive(Clone, Copy, Debug, Eq, PartialEq, PartialOrd, Ord)]
pub enum FrameRate {
    /// 0.5 Hz, one frame every two seconds.
    Half,

    /// 1Hz.
    One,

    /// 2Hz, the sensor's own power-on default.
    Two,

    /// 4Hz, the rate the USB2FIR bridge is normally started at.
    Four,

    /// 8Hz.
    Eight,

    /// 16 Hz.
    Sixteen,

    /// 32Hz.
    ThirtyTwo,

    /// 64Hz.
    SixtyFour,
}

impl FrameRate {
    /// Attempt to create a `FrameRate` from a raw refresh rate code.
    pub fn from_raw(raw_value: u16) -> Result<Self, LibraryError> {
        match raw_value {
            0 => Ok(Self::Half),
            1 => Ok(Self::One),
            2 => Ok(Self::Two),
            3 => Ok(Self::Four),
            4 => Ok(Self::Eight),
            5 => Ok(Self::Sixteen),
            6 => Ok(Self::ThirtyTwo),
            7 => Ok(Self::SixtyFour),
            _ => Err(LibraryError::InvalidData("Invalid frame rate given")),
        }
    }

    /// Map a frame rate variant into the refresh rate code used by the sensor.
    pub fn as_raw(&self) -> u16 {
        match self {
            Self::Half => 0,
            Self::One => 1,
            Self::Two => 2,
            Self::Four => 3,
            Self::Eight => 4,
            Self::Sixteen => 5,
            Self::ThirtyTwo => 6,
            Self::SixtyFour => 7,
        }
    }
}

impl Default for FrameRate {
    fn default() -> Self {
        Self::Four
    }
}
