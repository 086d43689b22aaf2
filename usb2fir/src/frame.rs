// SPDX-License-Identifier: Apache-2.0
// Copyright © 2021 Will Ross
//! The burst mode frame stream.
//!
//! Once burst mode is running, the bridge sends one header packet per sensor frame, followed by
//! [`SEGMENT_COUNT`] packets of raw pixel readings for the subpage the sensor just measured. A
//! header packet starts with the words `0xFFFF, 0x0000`, followed by the registers listed in
//! [`HeaderRegister`]. Everything is big-endian.
use log::{trace, warn};

use crate::error::{Error, LibraryError};
use crate::register::{HeaderRegister, Subpage, HEADER_REGISTER_COUNT};
use crate::transport::Transport;
use crate::util::{i16_from_bits, words_from_be_bytes, WORD_SIZE};

/// The size of a single bulk packet, in bytes.
pub const PACKET_LENGTH: usize = 64;

/// The number of 16-bit words in a packet.
pub const WORDS_PER_PACKET: usize = PACKET_LENGTH / WORD_SIZE;

/// The number of pixel packets following each header packet.
pub const SEGMENT_COUNT: usize = 12;

/// The number of pixel readings in one frame, half of the sensor's pixels.
pub const PIXELS_PER_FRAME: usize = SEGMENT_COUNT * WORDS_PER_PACKET;

/// The first two words of every header packet.
pub const HEADER_MARKER: [u16; 2] = [0xFFFF, 0x0000];

/// How many packets to look through for a header before giving up.
///
/// A header is sent every 13 packets, so this is enough to get past a few frames worth of
/// noise.
pub const DEFAULT_MAX_HEADER_POLLS: usize = 64;

/// The registers from a frame header packet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameHeader {
    registers: [u16; HEADER_REGISTER_COUNT],
}

impl FrameHeader {
    /// Create a header from raw register values, indexed by [`HeaderRegister`].
    pub fn new(registers: [u16; HEADER_REGISTER_COUNT]) -> Self {
        Self { registers }
    }

    /// Parse a header packet, returning `None` if the packet does not start with
    /// [`HEADER_MARKER`].
    pub fn from_packet(packet: &[u8; PACKET_LENGTH]) -> Option<Self> {
        let mut registers = [0u16; HEADER_REGISTER_COUNT];
        words_from_be_bytes(&packet[..], &mut registers);
        if registers[..HEADER_MARKER.len()] == HEADER_MARKER {
            Some(Self { registers })
        } else {
            None
        }
    }

    /// The raw value of a register.
    pub fn register(&self, register: HeaderRegister) -> u16 {
        self.registers[usize::from(register)]
    }

    /// A register interpreted as a signed value, which all of the measurement registers are.
    pub fn signed(&self, register: HeaderRegister) -> i16 {
        i16_from_bits(self.register(register))
    }

    /// The subpage the frame's pixels belong to.
    pub fn subpage(&self) -> Result<Subpage, LibraryError> {
        Subpage::from_register(self.register(HeaderRegister::Subpage))
    }
}

/// One frame: the header and the pixel readings for a single subpage.
#[derive(Clone, Debug, PartialEq)]
pub struct RawFrame {
    header: FrameHeader,
    pixels: [u16; PIXELS_PER_FRAME],
}

impl RawFrame {
    /// Create a frame from a header and exactly [`PIXELS_PER_FRAME`] raw pixel readings.
    pub fn new(header: FrameHeader, pixels: &[u16]) -> Result<Self, LibraryError> {
        if pixels.len() != PIXELS_PER_FRAME {
            return Err(LibraryError::InvalidData(
                "A frame needs exactly 384 pixel readings",
            ));
        }
        let mut frame = Self {
            header,
            pixels: [0u16; PIXELS_PER_FRAME],
        };
        frame.pixels.copy_from_slice(pixels);
        Ok(frame)
    }

    /// Assemble a frame from a header and the pixel packets that followed it.
    pub fn from_packets(
        header: FrameHeader,
        segments: &[[u8; PACKET_LENGTH]],
    ) -> Result<Self, LibraryError> {
        if segments.len() != SEGMENT_COUNT {
            return Err(LibraryError::InvalidData(
                "A frame needs exactly 12 pixel packets",
            ));
        }
        let mut pixels = [0u16; PIXELS_PER_FRAME];
        for (words, packet) in pixels.chunks_exact_mut(WORDS_PER_PACKET).zip(segments) {
            words_from_be_bytes(&packet[..], words);
        }
        Ok(Self { header, pixels })
    }

    pub fn header(&self) -> &FrameHeader {
        &self.header
    }

    /// The raw pixel readings, in the order the sensor sent them.
    pub fn pixels(&self) -> &[u16] {
        &self.pixels
    }
}

/// Read the next complete frame from the burst mode stream.
///
/// Packets are discarded until a header is found, at most `max_polls` of them. If no header shows
/// up, [`LibraryError::NoFrame`] is returned and the caller decides whether to try again.
pub fn read_frame<T>(transport: &mut T, max_polls: usize) -> Result<RawFrame, Error<T>>
where
    T: Transport,
{
    let mut packet = [0u8; PACKET_LENGTH];
    let mut header = None;
    for attempt in 0..max_polls {
        transport
            .read_bulk_packet(&mut packet)
            .map_err(Error::TransportError)?;
        match FrameHeader::from_packet(&packet) {
            Some(found) => {
                header = Some(found);
                break;
            }
            None => trace!("Discarding non-header packet {}", attempt),
        }
    }
    let header = match header {
        Some(header) => header,
        None => {
            warn!("No frame header found after {} packets", max_polls);
            return Err(LibraryError::NoFrame(max_polls).into());
        }
    };
    let mut segments = [[0u8; PACKET_LENGTH]; SEGMENT_COUNT];
    for segment in segments.iter_mut() {
        transport
            .read_bulk_packet(segment)
            .map_err(Error::TransportError)?;
    }
    Ok(RawFrame::from_packets(header, &segments)?)
}
