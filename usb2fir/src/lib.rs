// SPDX-License-Identifier: Apache-2.0
// Copyright © 2021 Will Ross
//! A pure-Rust library for MLX90640 thermal cameras attached through a USB2FIR bridge.
//!
//! The MLX90640 has a large amount of calibration data that must be pre-processed before use, and
//! the raw readings need a somewhat complex process to turn them into temperatures. This crate has
//! two levels of API, a high-level API that handles the calibration data and frame processing for
//! you, and a low-level API if you need to go beyond what the high-level API can do for you.
//!
//! The USB side is abstracted away behind [`UsbControl`][transport::UsbControl], so any USB
//! library (or none at all, for recorded data) can be used. This library is also `no_std`
//! compatible.
//!
//! # High-Level API
//! ```no_run
//! use usb2fir::transport::{Usb2FirBus, UsbControl, DEFAULT_I2C_ADDRESS};
//! use usb2fir::{Error, Usb2FirCamera, Usb2FirDriver};
//!
//! fn stream<U: UsbControl>(usb: U) -> Result<(), Error<Usb2FirBus<U>>> {
//!     let bus = Usb2FirBus::new(usb);
//!     let mut camera: Usb2FirCamera<_> = Usb2FirDriver::new(bus, DEFAULT_I2C_ADDRESS)?;
//!     let mut temperatures = camera.blank_frame(f32::NAN);
//!     // Each frame only covers half of the pixels
//!     camera.update_frame(&mut temperatures)?;
//!     camera.update_frame(&mut temperatures)?;
//!     camera.stop()?;
//!     Ok(())
//! }
//! ```
//! The calibration data is read from the sensor's EEPROM and decoded into
//! [`CalibrationParameters`][eeprom::CalibrationParameters] when the driver is created, and burst
//! mode is started so the bridge streams frames on its own. The temperature buffer starts out as
//! NaN, and is filled in half at a time by each frame.
//!
//! # Low-Level API
//! The low-level API is the foundation for the high-level API, exposed for those cases where a
//! more customized approach is needed. A common example is customizing how the calibration data is
//! loaded, for example from a file instead of the sensor. This can be done by implementing
//! [`CalibrationData`][common::CalibrationData]. Because [`Usb2FirDriver`] is generic over
//! `CalibrationData`, the rest of the high-level API works unchanged.
//!
//! The [`frame`] and [`calculations`] modules can also be used directly, with frames from any
//! source.
//!
//! # Subpages
//! Not all of the image is updated at once. The pixels are split into two [subpages][Subpage],
//! each being measured in turn. This crate indexes pixels as `row * 32 + column`, and subpage 0
//! covers the even indices while subpage 1 covers the odd ones:
//! ```text
//! 0 1 0 1 0 1 0 1
//! 0 1 0 1 0 1 0 1
//! 0 1 0 1 0 1 0 1
//! ```
#![no_std]

#[cfg(not(any(feature = "std", feature = "libm")))]
compile_error!("Either the 'std' or 'libm' feature must be enabled.");

pub mod calculations;
pub mod common;
pub mod driver;
pub mod eeprom;
pub mod error;
pub mod frame;
pub mod register;
#[cfg(test)]
mod test;
pub mod transport;
mod util;

pub use common::CalibrationData;
pub use driver::Usb2FirDriver;
pub use error::{Error, LibraryError};
pub use register::*;
pub use util::{
    i10_from_bits, i16_from_bits, i4_from_bits, i6_from_bits, i8_from_bits, Coerce, Num,
};

/// A driver using the calibration data stored on the sensor.
pub type Usb2FirCamera<T, F = f32> = Usb2FirDriver<T, eeprom::CalibrationParameters<F>, F>;
