// SPDX-License-Identifier: Apache-2.0
// Copyright © 2021 Will Ross
#![no_std]

mod eeprom_data;
mod frame_data;

pub use eeprom_data::{
    datasheet_eeprom_bytes, datasheet_eeprom_words, EEPROM_BYTE_LENGTH, EEPROM_LENGTH,
};
pub use frame_data::{
    datasheet_header_packet, datasheet_pixel_packets, header_packet, pixel_packets,
    DATASHEET_PIXEL_WORD, PACKET_LENGTH, SEGMENT_COUNT,
};
