// SPDX-License-Identifier: Apache-2.0
// Copyright © 2021 Will Ross
//! Access to the USB2FIR bridge.
//!
//! The bridge sits between the host and the sensor's I²C bus. Calibration data is read with
//! vendor (class) control transfers, while frames are streamed over a bulk endpoint once "burst
//! mode" has been started. Nothing in this module knows about a particular USB library; the
//! [`UsbControl`] trait is the seam to whichever one is in use.
#[cfg(feature = "std")]
extern crate std;

use core::fmt;

use num_enum::IntoPrimitive;

use crate::frame::PACKET_LENGTH;
use crate::register::FrameRate;

/// USB vendor ID of the USB2FIR bridge.
pub const USB2FIR_VID: u16 = 0x04D8;

/// USB product ID of the USB2FIR bridge.
pub const USB2FIR_PID: u16 = 0xEE7D;

/// The bulk IN endpoint frames are streamed on.
pub const BULK_ENDPOINT: u8 = 0x81;

/// How long to wait for a single bulk packet, in milliseconds.
pub const BULK_READ_TIMEOUT_MS: u32 = 1000;

/// Magic value that has to accompany [`Command::StartBootloader`].
pub const BOOTLOADER_MAGIC: u16 = 0x5237;

/// Sent in place of an I²C address to stop burst mode.
pub const BURST_MODE_STOP_ADDRESS: u16 = 0xFF;

/// The default I²C address of the sensor.
pub const DEFAULT_I2C_ADDRESS: u8 = 0x33;

/// Vendor requests understood by the bridge firmware.
// NOTE: discriminant values should *always* be explicitly written out.
#[derive(Clone, Copy, Debug, Eq, PartialEq, IntoPrimitive)]
#[repr(u8)]
pub enum Command {
    GetCapability = 0,
    Echo = 1,
    StartBootloader = 2,
    ReadMemory = 3,
    WriteMemory = 4,
    GetStatus = 5,
    ConfigBurstMode = 6,
}

/// The operations the rest of the crate needs from the bridge.
///
/// All multi-byte values coming out of these methods are big-endian 16-bit words, exactly as the
/// sensor stores them.
pub trait Transport {
    type Error;

    /// Fill `destination` with sensor memory starting at the word address `start_address`.
    fn read_memory(
        &mut self,
        i2c_address: u8,
        start_address: u16,
        destination: &mut [u8],
    ) -> Result<(), Self::Error>;

    /// Read the next packet from the burst mode stream.
    fn read_bulk_packet(&mut self, packet: &mut [u8; PACKET_LENGTH]) -> Result<(), Self::Error>;

    /// Have the bridge start streaming frames from the sensor at `i2c_address`.
    fn start_burst_mode(&mut self, i2c_address: u8, frame_rate: FrameRate)
        -> Result<(), Self::Error>;

    /// Stop streaming frames.
    fn stop_burst_mode(&mut self) -> Result<(), Self::Error>;
}

/// The USB primitives [`Usb2FirBus`] is built on.
///
/// Implementations are expected to have already opened the device and claimed interface 0.
/// Control transfers are class requests; the request type bits are the implementation's
/// responsibility.
pub trait UsbControl {
    type Error;

    /// Perform a device-to-host control transfer, returning the number of bytes received.
    fn control_read(
        &mut self,
        request: Command,
        value: u16,
        index: u16,
        buffer: &mut [u8],
    ) -> Result<usize, Self::Error>;

    /// Perform a host-to-device control transfer, returning the number of bytes sent.
    fn control_write(
        &mut self,
        request: Command,
        value: u16,
        index: u16,
        data: &[u8],
    ) -> Result<usize, Self::Error>;

    /// Read from a bulk endpoint, returning the number of bytes received.
    fn bulk_read(
        &mut self,
        endpoint: u8,
        buffer: &mut [u8],
        timeout_ms: u32,
    ) -> Result<usize, Self::Error>;
}

/// Errors from [`Usb2FirBus`].
#[derive(Clone, Copy, PartialEq)]
pub enum BusError<E> {
    /// The underlying USB implementation failed.
    Usb(E),

    /// The device returned fewer bytes than requested.
    ShortTransfer { expected: usize, actual: usize },
}

impl<E> fmt::Debug for BusError<E>
where
    E: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BusError::Usb(err) => f.debug_tuple("BusError::Usb").field(err).finish(),
            BusError::ShortTransfer { expected, actual } => f
                .debug_struct("BusError::ShortTransfer")
                .field("expected", expected)
                .field("actual", actual)
                .finish(),
        }
    }
}

impl<E> fmt::Display for BusError<E>
where
    E: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BusError::Usb(err) => write!(f, "USB transfer failed: {:?}", err),
            BusError::ShortTransfer { expected, actual } => write!(
                f,
                "short USB transfer, expected {} bytes, got {}",
                expected, actual
            ),
        }
    }
}

#[cfg(feature = "std")]
impl<E> std::error::Error for BusError<E> where E: fmt::Debug {}

/// A [`Transport`] over a USB2FIR bridge.
#[derive(Clone, Debug)]
pub struct Usb2FirBus<U> {
    usb: U,
}

impl<U> Usb2FirBus<U>
where
    U: UsbControl,
{
    pub fn new(usb: U) -> Self {
        Self { usb }
    }

    /// Give back the USB handle.
    pub fn release(self) -> U {
        self.usb
    }

    fn check_length(expected: usize, actual: usize) -> Result<(), BusError<U::Error>> {
        if expected == actual {
            Ok(())
        } else {
            Err(BusError::ShortTransfer { expected, actual })
        }
    }

    /// Send a value to the bridge and return what it echoes back.
    pub fn echo(&mut self, value: u16) -> Result<u16, BusError<U::Error>> {
        let mut buf = [0u8; 2];
        let received = self
            .usb
            .control_read(Command::Echo, value, 0, &mut buf)
            .map_err(BusError::Usb)?;
        Self::check_length(buf.len(), received)?;
        // The bridge's own replies are little-endian, unlike the sensor data.
        Ok(u16::from_le_bytes(buf))
    }

    /// The firmware capability bits, one bit per supported function.
    pub fn capability(&mut self) -> Result<[u8; 4], BusError<U::Error>> {
        let mut buf = [0u8; 4];
        let received = self
            .usb
            .control_read(Command::GetCapability, 0, 0, &mut buf)
            .map_err(BusError::Usb)?;
        Self::check_length(buf.len(), received)?;
        Ok(buf)
    }

    /// The status of the last transaction the bridge performed.
    pub fn status(&mut self) -> Result<u8, BusError<U::Error>> {
        let mut buf = [0u8; 1];
        let received = self
            .usb
            .control_read(Command::GetStatus, 0, 0, &mut buf)
            .map_err(BusError::Usb)?;
        Self::check_length(buf.len(), received)?;
        Ok(buf[0])
    }

    /// Write a block of bytes to sensor memory.
    pub fn write_memory(
        &mut self,
        i2c_address: u8,
        start_address: u16,
        data: &[u8],
    ) -> Result<(), BusError<U::Error>> {
        let sent = self
            .usb
            .control_write(
                Command::WriteMemory,
                u16::from(i2c_address),
                start_address,
                data,
            )
            .map_err(BusError::Usb)?;
        Self::check_length(data.len(), sent)
    }

    /// Restart the bridge into its firmware update bootloader.
    pub fn start_bootloader(&mut self) -> Result<(), BusError<U::Error>> {
        self.usb
            .control_write(Command::StartBootloader, BOOTLOADER_MAGIC, 0, &[])
            .map_err(BusError::Usb)?;
        Ok(())
    }
}

impl<U> Transport for Usb2FirBus<U>
where
    U: UsbControl,
{
    type Error = BusError<U::Error>;

    fn read_memory(
        &mut self,
        i2c_address: u8,
        start_address: u16,
        destination: &mut [u8],
    ) -> Result<(), Self::Error> {
        let received = self
            .usb
            .control_read(
                Command::ReadMemory,
                u16::from(i2c_address),
                start_address,
                destination,
            )
            .map_err(BusError::Usb)?;
        Self::check_length(destination.len(), received)
    }

    fn read_bulk_packet(&mut self, packet: &mut [u8; PACKET_LENGTH]) -> Result<(), Self::Error> {
        let received = self
            .usb
            .bulk_read(BULK_ENDPOINT, &mut packet[..], BULK_READ_TIMEOUT_MS)
            .map_err(BusError::Usb)?;
        Self::check_length(PACKET_LENGTH, received)
    }

    fn start_burst_mode(
        &mut self,
        i2c_address: u8,
        frame_rate: FrameRate,
    ) -> Result<(), Self::Error> {
        self.usb
            .control_write(
                Command::ConfigBurstMode,
                u16::from(i2c_address),
                frame_rate.as_raw(),
                &[],
            )
            .map_err(BusError::Usb)?;
        Ok(())
    }

    fn stop_burst_mode(&mut self) -> Result<(), Self::Error> {
        self.usb
            .control_write(Command::ConfigBurstMode, BURST_MODE_STOP_ADDRESS, 0, &[])
            .map_err(BusError::Usb)?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::{BusError, Command, Transport, Usb2FirBus, BULK_ENDPOINT};
    use crate::frame::PACKET_LENGTH;
    use crate::register::FrameRate;
    use crate::test::{ControlRequest, MockUsb};

    #[test]
    fn read_memory_request() {
        let mut bus = Usb2FirBus::new(MockUsb::with_memory(&[0xde, 0xad, 0xbe, 0xef]));
        let mut buf = [0u8; 4];
        bus.read_memory(0x33, 0x2400, &mut buf).unwrap();
        assert_eq!(buf, [0xde, 0xad, 0xbe, 0xef]);
        let usb = bus.release();
        assert_eq!(
            usb.requests(),
            &[ControlRequest::Read {
                request: Command::ReadMemory,
                value: 0x33,
                index: 0x2400,
                length: 4,
            }]
        );
    }

    #[test]
    fn read_memory_short() {
        let mut bus = Usb2FirBus::new(MockUsb::with_memory(&[0xde, 0xad]));
        let mut buf = [0u8; 4];
        assert_eq!(
            bus.read_memory(0x33, 0x2400, &mut buf),
            Err(BusError::ShortTransfer {
                expected: 4,
                actual: 2
            })
        );
    }

    #[test]
    fn burst_mode_requests() {
        let mut bus = Usb2FirBus::new(MockUsb::default());
        bus.start_burst_mode(0x33, FrameRate::Four).unwrap();
        bus.stop_burst_mode().unwrap();
        let usb = bus.release();
        assert_eq!(
            usb.requests(),
            &[
                ControlRequest::Write {
                    request: Command::ConfigBurstMode,
                    value: 0x33,
                    index: 3,
                    length: 0,
                },
                ControlRequest::Write {
                    request: Command::ConfigBurstMode,
                    value: 0xFF,
                    index: 0,
                    length: 0,
                },
            ]
        );
    }

    #[test]
    fn bulk_packet() {
        let mut packet = [0u8; PACKET_LENGTH];
        packet[0] = 0xAB;
        let mut usb = MockUsb::default();
        usb.push_bulk(packet);
        let mut bus = Usb2FirBus::new(usb);
        let mut received = [0u8; PACKET_LENGTH];
        bus.read_bulk_packet(&mut received).unwrap();
        assert_eq!(received[0], 0xAB);
        assert_eq!(bus.release().bulk_endpoints(), &[BULK_ENDPOINT]);
        // Nothing queued, so the mock returns a zero length read.
        let mut bus = Usb2FirBus::new(MockUsb::default());
        assert!(matches!(
            bus.read_bulk_packet(&mut received),
            Err(BusError::ShortTransfer { actual: 0, .. })
        ));
    }

    #[test]
    fn command_request_codes() {
        assert_eq!(u8::from(Command::GetCapability), 0);
        assert_eq!(u8::from(Command::ReadMemory), 3);
        assert_eq!(u8::from(Command::ConfigBurstMode), 6);
    }

    #[test]
    fn echo_is_little_endian() {
        let mut bus = Usb2FirBus::new(MockUsb::default());
        assert_eq!(bus.echo(0x1234), Ok(0x1234));
    }

    #[test]
    fn bootloader_magic() {
        let mut bus = Usb2FirBus::new(MockUsb::default());
        bus.start_bootloader().unwrap();
        assert_eq!(
            bus.release().requests(),
            &[ControlRequest::Write {
                request: Command::StartBootloader,
                value: 0x5237,
                index: 0,
                length: 0,
            }]
        );
    }
}
