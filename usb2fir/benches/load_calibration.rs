use criterion::{criterion_group, criterion_main, Criterion};

use usb2fir::eeprom::CalibrationParameters;
use usb2fir_test_data::{datasheet_eeprom_bytes, datasheet_eeprom_words};

pub fn criterion_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("Calibration Loading");

    group.bench_with_input("words", &datasheet_eeprom_words(), |b, eeprom| {
        b.iter(|| CalibrationParameters::<f32>::from_words(eeprom))
    });
    group.bench_with_input("bytes", &datasheet_eeprom_bytes(), |b, eeprom| {
        b.iter(|| CalibrationParameters::<f32>::from_bytes(eeprom))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
