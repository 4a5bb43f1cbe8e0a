/// Number of keys on a standard piano (A0..C8).
pub const KEY_COUNT: usize = 88;

/// Number of white keys on a standard piano.
pub const WHITE_KEY_COUNT: usize = 52;

/// MIDI note number of key index 0 (A0).
pub const FIRST_MIDI_NOTE: u8 = 21;

/// Pitch used when neither a calibrated pitch nor a usable LEDs-per-meter value exists.
/// Corresponds to a 200 LED/m strip.
pub const FALLBACK_LED_PITCH_MM: f64 = 5.0;

/// Tolerance for geometric comparisons (mm).
pub const GEOMETRY_EPSILON: f64 = 1e-9;

/// Default location of the persisted settings document.
pub const DEFAULT_SETTINGS_PATH: &str = "data/settings.json";
