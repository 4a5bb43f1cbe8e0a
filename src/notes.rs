//! Key index <-> musical note helpers.
//!
//! Key index 0 is A0 (MIDI 21) and index 87 is C8 (MIDI 108).

use crate::consts::{FIRST_MIDI_NOTE, KEY_COUNT};
use std::str::FromStr;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString)]
pub enum PitchClass {
    #[strum(serialize = "C")]
    C,
    #[strum(to_string = "C#", serialize = "Db")]
    CSharp,
    #[strum(serialize = "D")]
    D,
    #[strum(to_string = "D#", serialize = "Eb")]
    DSharp,
    #[strum(serialize = "E")]
    E,
    #[strum(serialize = "F")]
    F,
    #[strum(to_string = "F#", serialize = "Gb")]
    FSharp,
    #[strum(serialize = "G")]
    G,
    #[strum(to_string = "G#", serialize = "Ab")]
    GSharp,
    #[strum(serialize = "A")]
    A,
    #[strum(to_string = "A#", serialize = "Bb")]
    ASharp,
    #[strum(serialize = "B")]
    B,
}

impl PitchClass {
    pub fn from_semitone(semitone: u8) -> Self {
        Self::iter()
            .nth((semitone % 12) as usize)
            .unwrap_or(PitchClass::C)
    }

    pub fn semitone(self) -> u8 {
        self as u8
    }

    pub fn is_black(self) -> bool {
        matches!(
            self,
            PitchClass::CSharp
                | PitchClass::DSharp
                | PitchClass::FSharp
                | PitchClass::GSharp
                | PitchClass::ASharp
        )
    }
}

/// MIDI note number of a key; `None` past C8.
#[inline]
pub fn midi_note(key_index: usize) -> Option<u8> {
    if key_index >= KEY_COUNT {
        return None;
    }
    u8::try_from(key_index).ok()?.checked_add(FIRST_MIDI_NOTE)
}

pub fn key_from_midi(note: u8) -> Option<usize> {
    let idx = note.checked_sub(FIRST_MIDI_NOTE)? as usize;
    (idx < KEY_COUNT).then_some(idx)
}

pub fn pitch_class(key_index: usize) -> PitchClass {
    PitchClass::from_semitone(((key_index % 12 + FIRST_MIDI_NOTE as usize) % 12) as u8)
}

pub fn octave(key_index: usize) -> i64 {
    (key_index.saturating_add(FIRST_MIDI_NOTE as usize) / 12) as i64 - 1
}

pub fn is_black(key_index: usize) -> bool {
    pitch_class(key_index).is_black()
}

/// Scientific pitch name, e.g. "A0", "C#4".
pub fn note_name(key_index: usize) -> String {
    format!("{}{}", pitch_class(key_index), octave(key_index))
}

/// Resolves a user supplied key reference: a key index ("39"), or a note name ("C4", "Bb2").
pub fn parse_key_ref(s: &str) -> Option<usize> {
    let s = s.trim();
    if let Ok(idx) = s.parse::<usize>() {
        return (idx < KEY_COUNT).then_some(idx);
    }

    let split = s.find(|c: char| c.is_ascii_digit() || c == '-')?;
    let (name, oct) = s.split_at(split);
    let pc = PitchClass::from_str(name).ok()?;
    let oct: i32 = oct.parse().ok()?;
    let midi = oct
        .checked_add(1)?
        .checked_mul(12)?
        .checked_add(pc.semitone() as i32)?;
    u8::try_from(midi).ok().and_then(key_from_midi)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyboard_bounds() {
        assert_eq!(note_name(0), "A0");
        assert_eq!(note_name(87), "C8");
        assert_eq!(note_name(39), "C4");
        assert_eq!(midi_note(39), Some(60));
        assert_eq!(midi_note(87), Some(108));
        assert_eq!(octave(87), 8);
    }

    #[test]
    fn test_midi_note_rejects_keys_past_c8() {
        assert_eq!(midi_note(KEY_COUNT), None);
        assert_eq!(midi_note(235), None);
        assert_eq!(midi_note(usize::MAX), None);
        for key in 0..KEY_COUNT {
            assert_eq!(midi_note(key).and_then(key_from_midi), Some(key));
        }
    }

    #[test]
    fn test_semitone_round_trip() {
        for pc in PitchClass::iter() {
            assert_eq!(PitchClass::from_semitone(pc.semitone()), pc);
        }
        assert_eq!(PitchClass::from_semitone(13), PitchClass::CSharp);
    }

    #[test]
    fn test_black_key_count() {
        let blacks = (0..KEY_COUNT).filter(|&k| is_black(k)).count();
        assert_eq!(blacks, 36);
    }

    #[test]
    fn test_parse_key_ref() {
        assert_eq!(parse_key_ref("C4"), Some(39));
        assert_eq!(parse_key_ref("Bb0"), Some(1));
        assert_eq!(parse_key_ref("A#0"), Some(1));
        assert_eq!(parse_key_ref("12"), Some(12));
        assert_eq!(parse_key_ref("88"), None);
        assert_eq!(parse_key_ref("C9"), None);
        assert_eq!(parse_key_ref("H2"), None);
    }
}
