
pub(crate) use mock::{ControlRequest, MockTransport, MockUsb};
pub(crate) use usb2fir_test_data::{
    datasheet_eeprom_bytes, datasheet_eeprom_words, datasheet_header_packet,
    datasheet_pixel_packets, header_packet, pixel_packets, DATASHEET_PIXEL_WORD,
};
