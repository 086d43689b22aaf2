// SPDX-License-Identifier: Apache-2.0
// Copyright © 2021 Will Ross

/// The number of 16-bit words in the MLX90640 EEPROM (0x2400 through 0x273F).
pub const EEPROM_LENGTH: usize = 0x2740 - 0x2400;

/// The size of the EEPROM in 8-bit bytes, as it comes off the USB2FIR bridge.
pub const EEPROM_BYTE_LENGTH: usize = EEPROM_LENGTH * 2;

/// Example MLX90640 EEPROM data from the datasheet (from the worked example).
// Each line is 8 words. The first two lines are empty, as that data is ignored for calibration
// purposes. The next six lines are the shared calibration data.
const DATASHEET_EEPROM_HEADER: &[u8] = b"\
    \x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\
    \x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\
    \x42\x10\xff\xbb\x02\x02\xf2\x02\xf2\xf2\xe2\xe2\xd1\xe1\xb1\xd1\
    \xf1\x0f\xf0\x0f\xe0\xef\xe0\xef\xe1\xe1\xf3\xf2\xf4\x04\xe5\x04\
    \x79\xa6\x2f\x44\xff\xdd\x22\x10\x33\x33\x22\x33\xef\x01\x9a\xcc\
    \xee\xdc\x10\xff\x22\x21\x33\x33\x23\x33\x01\x12\xee\xff\xbb\xdd\
    \x18\xef\x2f\xf1\x59\x52\x9d\x68\x54\x54\x09\x94\x69\x56\x53\x54\
    \x23\x63\xe4\x46\xfb\xb5\x04\x4b\xf0\x20\x97\x97\x97\x97\x28\x89";

/// The per-pixel calibration word used for pixel (12, 16) in the worked example.
const DATASHEET_PIXEL_CALIBRATION: [u8; 2] = [0x08, 0xa0];

/// The datasheet EEPROM as raw big-endian bytes, the way the bridge returns it.
///
/// Every pixel is given the calibration word from the worked example.
pub fn datasheet_eeprom_bytes() -> [u8; EEPROM_BYTE_LENGTH] {
    let mut eeprom_data = [0u8; EEPROM_BYTE_LENGTH];
    let header_length = DATASHEET_EEPROM_HEADER.len();
    eeprom_data[..header_length].copy_from_slice(DATASHEET_EEPROM_HEADER);
    eeprom_data[header_length..]
        .iter_mut()
        .zip(DATASHEET_PIXEL_CALIBRATION.iter().copied().cycle())
        .for_each(|(eeprom_byte, pixel_byte)| *eeprom_byte = pixel_byte);
    eeprom_data
}

/// The datasheet EEPROM as 16-bit words.
pub fn datasheet_eeprom_words() -> [u16; EEPROM_LENGTH] {
    let bytes = datasheet_eeprom_bytes();
    let mut words = [0u16; EEPROM_LENGTH];
    words
        .iter_mut()
        .zip(bytes.chunks_exact(2))
        .for_each(|(word, pair)| *word = u16::from_be_bytes([pair[0], pair[1]]));
    words
}
