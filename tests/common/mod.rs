#![allow(dead_code)]

use keylight::calibration::CalibrationState;
use keylight::config::StripParams;
use keylight::engine::{run_pipeline, PipelineOutput};
use keylight::geometry::{KeyGeometry, KeyboardLayout, LedStrip};

// Sandbox keys. LED footprints are [10i, 10i + 6] mm.
pub const A: usize = 0;
pub const B: usize = 1;
pub const C: usize = 2;

pub fn sandbox_params() -> StripParams {
    StripParams {
        total_leds: 10,
        leds_per_meter: 100.0,
        led_physical_width_mm: 6.0,
        calibrated_pitch_mm: None,
        strip_offset_mm: 0.0,
    }
}

/// A = [0, 21], B = [24, 50], C = [50, 70]. LED 2 (centre 23 mm) straddles the A/B gap.
pub fn sandbox_layout() -> KeyboardLayout {
    KeyboardLayout::from_keys(vec![
        KeyGeometry::new(A, false, 0.0, 21.0),
        KeyGeometry::new(B, true, 24.0, 50.0),
        KeyGeometry::new(C, false, 50.0, 70.0),
    ])
    .expect("sandbox layout is ordered")
}

pub fn sandbox_state() -> CalibrationState {
    CalibrationState::for_strip(10)
}

pub fn run_sandbox(state: &CalibrationState) -> PipelineOutput {
    let layout = sandbox_layout();
    let strip = LedStrip::new(&sandbox_params(), state.start_led).unwrap();
    run_pipeline(layout.keys(), &strip, state, 1.0)
}
