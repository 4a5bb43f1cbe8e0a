use criterion::{criterion_group, criterion_main, Criterion};
use keylight::calibration::CalibrationState;
use keylight::config::Config;
use keylight::engine::compute_mapping;
use keylight::geometry::{KeyboardLayout, LedRange, LedStrip};
use keylight::mapping::allocate;
use std::hint::black_box;

fn calibrated_state(total_leds: usize) -> CalibrationState {
    let mut state = CalibrationState::new(2, total_leds - 3);
    for key in (0..88).step_by(7) {
        state.key_offsets[key] = if key % 2 == 0 { 1 } else { -1 };
    }
    state
        .with_trim(40, 1, 0)
        .with_override(60, vec![120, 121, 122])
}

fn bench_mapping(c: &mut Criterion) {
    let config = Config::default();
    let plain = CalibrationState::for_strip(config.strip.total_leds);
    let calibrated = calibrated_state(config.strip.total_leds);

    c.bench_function("compute_mapping_plain", |b| {
        b.iter(|| compute_mapping(black_box(&config), black_box(&plain)))
    });

    c.bench_function("compute_mapping_calibrated", |b| {
        b.iter(|| compute_mapping(black_box(&config), black_box(&calibrated)))
    });

    let layout = KeyboardLayout::build(&config.keyboard).unwrap();
    let strip = LedStrip::new(&config.strip, 0).unwrap();
    let range = LedRange::new(0, config.strip.total_leds - 1);
    c.bench_function("allocate_only", |b| {
        b.iter(|| {
            allocate(
                black_box(layout.keys()),
                black_box(&strip),
                range,
                config.allocation.overhang_threshold_mm,
            )
        })
    });
}

criterion_group!(benches, bench_mapping);
criterion_main!(benches);
