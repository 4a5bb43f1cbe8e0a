// Physical models: key spans along the keyboard and LED footprints along the strip.
// Both share the same axis: millimetres from the left edge of A0.

pub mod keys;
pub mod leds;

pub use self::keys::{BlackKeyPlacement, KeyGeometry, KeyboardLayout};
pub use self::leds::{
    calibrate_pitch, select_pitch, LedPlacement, LedRange, LedStrip, PitchSelection,
    PitchSource,
};
