use crate::config::{require_non_negative, require_positive, KeyboardDimensions};
use crate::consts::KEY_COUNT;
use crate::notes::{self, PitchClass};
use crate::{KeylightError, KlResult};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use tracing::debug;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    ValueEnum,
    Display,
    EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BlackKeyPlacement {
    /// Black keys centred on the gap between their white neighbours.
    Centered,
    /// Black keys shifted outwards within their 2/3 group, as on acoustic pianos.
    #[default]
    Staggered,
}

impl BlackKeyPlacement {
    /// Horizontal shift of a black key's centre, as a fraction of the black key width.
    fn shift_fraction(self, pc: PitchClass) -> f64 {
        match self {
            BlackKeyPlacement::Centered => 0.0,
            BlackKeyPlacement::Staggered => match pc {
                PitchClass::CSharp => -0.15,
                PitchClass::DSharp => 0.15,
                PitchClass::FSharp => -0.20,
                PitchClass::GSharp => 0.0,
                PitchClass::ASharp => 0.20,
                _ => 0.0,
            },
        }
    }
}

/// Allocation span of a single key along the strip axis.
///
/// White keys next to a black key are clipped at the black key's edge, so spans of
/// different keys never overlap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KeyGeometry {
    pub key_index: usize,
    pub is_black: bool,
    pub left_edge_mm: f64,
    pub right_edge_mm: f64,
}

impl KeyGeometry {
    pub fn new(key_index: usize, is_black: bool, left_edge_mm: f64, right_edge_mm: f64) -> Self {
        Self {
            key_index,
            is_black,
            left_edge_mm,
            right_edge_mm,
        }
    }

    #[inline]
    pub fn width_mm(&self) -> f64 {
        self.right_edge_mm - self.left_edge_mm
    }

    #[inline]
    pub fn center_mm(&self) -> f64 {
        (self.left_edge_mm + self.right_edge_mm) * 0.5
    }

    #[inline]
    pub fn span(&self) -> (f64, f64) {
        (self.left_edge_mm, self.right_edge_mm)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyboardLayout {
    keys: Vec<KeyGeometry>,
}

impl KeyboardLayout {
    pub fn build(dims: &KeyboardDimensions) -> KlResult<Self> {
        require_positive("white_key_width_mm", dims.white_key_width_mm)?;
        require_positive("black_key_width_mm", dims.black_key_width_mm)?;
        require_non_negative("white_key_gap_mm", dims.white_key_gap_mm)?;

        let ww = dims.white_key_width_mm;
        let bw = dims.black_key_width_mm;
        let gap = dims.white_key_gap_mm;
        let white_pitch = ww + gap;

        // Pass 1: full bodies. White keys sit side by side; a black key is centred on
        // the gap after the preceding white key.
        let mut bodies: Vec<(bool, f64, f64)> = Vec::with_capacity(KEY_COUNT);
        let mut white_ordinal = 0usize;
        for k in 0..KEY_COUNT {
            let pc = notes::pitch_class(k);
            if pc.is_black() {
                let prev_white_right = (white_ordinal - 1) as f64 * white_pitch + ww;
                let center = prev_white_right
                    + gap * 0.5
                    + dims.black_key_placement.shift_fraction(pc) * bw;
                bodies.push((true, center - bw * 0.5, center + bw * 0.5));
            } else {
                let left = white_ordinal as f64 * white_pitch;
                bodies.push((false, left, left + ww));
                white_ordinal += 1;
            }
        }

        // Pass 2: clip white keys at neighbouring black keys.
        let mut keys = Vec::with_capacity(KEY_COUNT);
        for (k, &(is_black, body_left, body_right)) in bodies.iter().enumerate() {
            if is_black {
                keys.push(KeyGeometry::new(k, true, body_left, body_right));
                continue;
            }
            let left = match k.checked_sub(1).map(|p| bodies[p]) {
                Some((true, _, black_right)) => black_right,
                _ => body_left,
            };
            let right = match bodies.get(k + 1) {
                Some(&(true, black_left, _)) => black_left,
                _ => body_right,
            };
            keys.push(KeyGeometry::new(k, false, left, right));
        }

        let layout = Self { keys };
        layout.check_monotonic()?;

        debug!(
            "Keyboard layout built: {:.1} mm wide (white {:.2}, black {:.2}, gap {:.2}, {})",
            layout.width_mm(),
            ww,
            bw,
            gap,
            dims.black_key_placement
        );

        Ok(layout)
    }

    /// Builds a layout from arbitrary key spans. Keys must be sorted by index and have
    /// strictly increasing, non-overlapping spans.
    pub fn from_keys(keys: Vec<KeyGeometry>) -> KlResult<Self> {
        if keys.iter().any(|k| k.key_index >= KEY_COUNT) {
            return Err(KeylightError::InvalidKey(format!(
                "key index must be below {}",
                KEY_COUNT
            )));
        }
        let layout = Self { keys };
        layout.check_monotonic()?;
        Ok(layout)
    }

    fn check_monotonic(&self) -> KlResult<()> {
        for k in &self.keys {
            if !(k.width_mm() > 0.0) {
                return Err(KeylightError::InvalidGeometry(format!(
                    "key {} ({}) has a non-positive span",
                    k.key_index,
                    notes::note_name(k.key_index)
                )));
            }
        }
        for pair in self.keys.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            if b.key_index <= a.key_index
                || b.left_edge_mm <= a.left_edge_mm
                || b.right_edge_mm <= a.right_edge_mm
                || b.left_edge_mm < a.right_edge_mm
            {
                return Err(KeylightError::InvalidGeometry(format!(
                    "key spans are not ordered between keys {} and {}",
                    a.key_index, b.key_index
                )));
            }
        }
        Ok(())
    }

    pub fn keys(&self) -> &[KeyGeometry] {
        &self.keys
    }

    pub fn key(&self, key_index: usize) -> Option<&KeyGeometry> {
        self.keys.iter().find(|k| k.key_index == key_index)
    }

    pub fn left_edge_mm(&self) -> f64 {
        self.keys.first().map_or(0.0, |k| k.left_edge_mm)
    }

    pub fn right_edge_mm(&self) -> f64 {
        self.keys.last().map_or(0.0, |k| k.right_edge_mm)
    }

    pub fn width_mm(&self) -> f64 {
        self.right_edge_mm() - self.left_edge_mm()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_white_keys_touch_black_neighbours() {
        let layout = KeyboardLayout::build(&KeyboardDimensions::default()).unwrap();
        let keys = layout.keys();
        // A0 | A#0 | B0
        assert_eq!(keys[0].right_edge_mm, keys[1].left_edge_mm);
        assert_eq!(keys[1].right_edge_mm, keys[2].left_edge_mm);
        // B0 and C1 are separated by the physical gap.
        assert!((keys[3].left_edge_mm - keys[2].right_edge_mm - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_oversized_black_key_is_rejected() {
        let dims = KeyboardDimensions {
            black_key_width_mm: 60.0,
            ..Default::default()
        };
        assert!(KeyboardLayout::build(&dims).is_err());
    }
}
