// SPDX-License-Identifier: Apache-2.0
// Copyright © 2021 Will Ross
use log::debug;

use crate::calculations::{check_emissivity, raw_frame_to_temperatures, FrameSummary};
use crate::common::{CalibrationData, HEIGHT, NUM_PIXELS, WIDTH};
use crate::eeprom::CalibrationParameters;
use crate::error::{Error, LibraryError};
use crate::frame::{read_frame, DEFAULT_MAX_HEADER_POLLS};
use crate::register::FrameRate;
use crate::transport::Transport;
use crate::util::Num;

/// The emissivity used until another one is chosen.
pub const DEFAULT_EMISSIVITY: f64 = 0.95;

/// A driver for an MLX90640 attached to a USB2FIR bridge.
///
/// The bridge streams frames continuously once burst mode is started, each one covering a single
/// [subpage][crate::Subpage]. This means [`update_frame`][Usb2FirDriver::update_frame] needs to be
/// called twice (once for each subpage) before every pixel of the destination has a temperature.
#[derive(Clone, Debug)]
pub struct Usb2FirDriver<T, Clb, F> {
    /// The bridge the sensor is accessible through.
    transport: T,
    /// The I²C address of the sensor behind the bridge.
    address: u8,
    /// The factory calibration data for this specific sensor.
    calibration: Clb,
    /// The emissivity value to use when calculating pixel temperature.
    emissivity: F,
    /// The rate burst mode was started at.
    frame_rate: FrameRate,
    /// How many packets to look through for a frame header before giving up.
    max_header_polls: usize,
    /// The ambient temperature from the most recent frame.
    ambient_temperature: Option<F>,
    /// The supply voltage from the most recent frame.
    supply_voltage: Option<F>,
}

impl<T, F> Usb2FirDriver<T, CalibrationParameters<F>, F>
where
    T: Transport,
    F: Num,
{
    /// Create a new `Usb2FirDriver`, reading the calibration data from the sensor's EEPROM.
    ///
    /// The sensor on a USB2FIR is normally at [0x33][crate::transport::DEFAULT_I2C_ADDRESS].
    pub fn new(transport: T, address: u8) -> Result<Self, Error<T>> {
        let mut transport = transport;
        let calibration = CalibrationParameters::from_transport(&mut transport, address)?;
        Self::new_with_calibration(transport, address, calibration)
    }
}

impl<T, Clb, F> Usb2FirDriver<T, Clb, F>
where
    T: Transport,
    Clb: CalibrationData<F>,
    F: Num,
{
    /// Create a driver with calibration data that has already been loaded, and start burst mode
    /// at the default frame rate.
    pub fn new_with_calibration(
        transport: T,
        address: u8,
        calibration: Clb,
    ) -> Result<Self, Error<T>> {
        let mut transport = transport;
        let frame_rate = FrameRate::default();
        transport
            .start_burst_mode(address, frame_rate)
            .map_err(Error::TransportError)?;
        debug!(
            "Started burst mode for {:#04X} at {:?}",
            address, frame_rate
        );
        Ok(Self {
            transport,
            address,
            calibration,
            emissivity: F::coerce_from(DEFAULT_EMISSIVITY),
            frame_rate,
            max_header_polls: DEFAULT_MAX_HEADER_POLLS,
            ambient_temperature: None,
            supply_voltage: None,
        })
    }

    /// The calibration data being used for this sensor.
    pub fn calibration(&self) -> &Clb {
        &self.calibration
    }

    /// The frame rate burst mode is running at.
    pub fn frame_rate(&self) -> FrameRate {
        self.frame_rate
    }

    /// Restart burst mode at a different frame rate.
    pub fn set_frame_rate(&mut self, frame_rate: FrameRate) -> Result<(), Error<T>> {
        self.transport
            .stop_burst_mode()
            .map_err(Error::TransportError)?;
        self.transport
            .start_burst_mode(self.address, frame_rate)
            .map_err(Error::TransportError)?;
        debug!(
            "Restarted burst mode for {:#04X} at {:?}",
            self.address, frame_rate
        );
        self.frame_rate = frame_rate;
        Ok(())
    }

    /// Set how many packets [`update_frame`][Usb2FirDriver::update_frame] will read looking for a
    /// frame header.
    ///
    /// The default is [`DEFAULT_MAX_HEADER_POLLS`].
    pub fn set_max_header_polls(&mut self, max_polls: usize) {
        self.max_header_polls = max_polls;
    }

    /// Get the emissivity value that is being used for calculations currently.
    ///
    /// The default emissivity is [0.95][DEFAULT_EMISSIVITY], but it can be
    /// [overridden][Usb2FirDriver::override_emissivity].
    pub fn effective_emissivity(&self) -> F {
        self.emissivity
    }

    /// Override the emissivity value used in temperature calculations.
    ///
    /// Values outside of (0, 1] are rejected, leaving the current value in place.
    pub fn override_emissivity(&mut self, new_value: F) -> Result<(), LibraryError> {
        self.emissivity = check_emissivity(new_value)?;
        Ok(())
    }

    /// Go back to using the default emissivity.
    pub fn use_default_emissivity(&mut self) {
        self.emissivity = F::coerce_from(DEFAULT_EMISSIVITY);
    }

    /// Get the most recent ambient temperature calculation.
    ///
    /// This is `None` until a frame has been processed with
    /// [`update_frame`][Usb2FirDriver::update_frame].
    pub fn ambient_temperature(&self) -> Option<F> {
        self.ambient_temperature
    }

    /// Get the most recent pixel supply voltage calculation.
    pub fn supply_voltage(&self) -> Option<F> {
        self.supply_voltage
    }

    /// The height of the thermal image, in pixels.
    pub fn height(&self) -> usize {
        HEIGHT
    }

    /// The width of the thermal image, in pixels.
    pub fn width(&self) -> usize {
        WIDTH
    }

    /// A full-size temperature buffer with every pixel set to `fill`.
    ///
    /// Handy as the starting point for [`update_frame`][Usb2FirDriver::update_frame], as only half
    /// of the pixels are written by each frame.
    pub fn blank_frame(&self, fill: F) -> [F; NUM_PIXELS] {
        [fill; NUM_PIXELS]
    }

    /// Read the next frame from the bridge and write its temperatures into `destination`.
    ///
    /// Only the pixels for the frame's subpage are written. If an error is returned, `destination`
    /// and the cached ambient temperature and supply voltage are unchanged.
    pub fn update_frame(&mut self, destination: &mut [F]) -> Result<FrameSummary<F>, Error<T>> {
        let frame = read_frame(&mut self.transport, self.max_header_polls)?;
        let summary =
            raw_frame_to_temperatures(&self.calibration, self.emissivity, &frame, destination)?;
        self.ambient_temperature = Some(summary.ambient_temperature());
        self.supply_voltage = Some(summary.supply_voltage());
        Ok(summary)
    }

    /// Stop burst mode and give back the transport.
    pub fn stop(self) -> Result<T, Error<T>> {
        let mut transport = self.transport;
        transport
            .stop_burst_mode()
            .map_err(Error::TransportError)?;
        debug!("Stopped burst mode for {:#04X}", self.address);
        Ok(transport)
    }
}
