// SPDX-License-Identifier: Apache-2.0
// Copyright © 2021 Will Ross

/// The size of a single bulk packet from the bridge, in bytes.
pub const PACKET_LENGTH: usize = 64;

/// The number of pixel packets following a header packet.
pub const SEGMENT_COUNT: usize = 12;

const WORDS_PER_PACKET: usize = PACKET_LENGTH / 2;

/// The raw pixel reading used in the datasheet's worked example.
pub const DATASHEET_PIXEL_WORD: u16 = 0x0261;

/// Build a header packet from the six registers following the `0xFFFF, 0x0000` marker.
///
/// The registers are, in order: subpage, T<sub>a<sub>V<sub>BE</sub></sub></sub>, compensation
/// pixel, gain, T<sub>a<sub>PTAT</sub></sub> and V<sub>DD<sub>pix</sub></sub>.
pub fn header_packet(registers: [u16; 6]) -> [u8; PACKET_LENGTH] {
    let mut packet = [0u8; PACKET_LENGTH];
    let words = [0xFFFFu16, 0x0000]
        .iter()
        .copied()
        .chain(registers.iter().copied());
    packet
        .chunks_exact_mut(2)
        .zip(words)
        .for_each(|(pair, word)| pair.copy_from_slice(&word.to_be_bytes()));
    packet
}

/// The header packet for the datasheet's worked example RAM dump.
///
/// The worked example gives a compensation pixel reading for each subpage, the rest of the values
/// are shared.
pub fn datasheet_header_packet(subpage: u16) -> [u8; PACKET_LENGTH] {
    let compensation_pixel = match subpage {
        0 => 0xFFCA,
        _ => 0xFFC8,
    };
    header_packet([subpage, 0x4BF2, compensation_pixel, 0x1881, 0x06AF, 0xCCC5])
}

/// Split a subpage worth of pixel words into bulk packets.
pub fn pixel_packets(pixels: &[u16]) -> [[u8; PACKET_LENGTH]; SEGMENT_COUNT] {
    let mut packets = [[0u8; PACKET_LENGTH]; SEGMENT_COUNT];
    for (packet, words) in packets.iter_mut().zip(pixels.chunks(WORDS_PER_PACKET)) {
        packet
            .chunks_exact_mut(2)
            .zip(words.iter())
            .for_each(|(pair, word)| pair.copy_from_slice(&word.to_be_bytes()));
    }
    packets
}

/// Pixel packets where every pixel has the worked example's raw reading.
pub fn datasheet_pixel_packets() -> [[u8; PACKET_LENGTH]; SEGMENT_COUNT] {
    pixel_packets(&[DATASHEET_PIXEL_WORD; WORDS_PER_PACKET * SEGMENT_COUNT])
}
