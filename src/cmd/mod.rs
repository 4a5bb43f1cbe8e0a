pub mod calibrate;
pub mod map;
pub mod sweep;

use keylight::notes;

/// Accepts a key index (`39`) or a note name (`C4`, `F#2`, `Bb0`).
pub fn parse_key(s: &str) -> Result<usize, String> {
    notes::parse_key_ref(s).ok_or_else(|| format!("'{}' is not a key index (0-87) or note name", s))
}
