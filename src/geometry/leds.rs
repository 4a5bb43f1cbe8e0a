use crate::config::{require_positive, StripParams};
use crate::consts::FALLBACK_LED_PITCH_MM;
use crate::{KeylightError, KlResult};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use strum_macros::Display;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PitchSource {
    Calibrated,
    LedsPerMeter,
    Fallback,
}

/// Which LED pitch was used and why. Reported next to the mapping for display.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PitchSelection {
    pub pitch_mm: f64,
    pub source: PitchSource,
    pub was_adjusted: bool,
    pub calibrated_pitch_mm: Option<f64>,
    pub theoretical_pitch_mm: f64,
}

pub fn select_pitch(leds_per_meter: f64, calibrated_pitch_mm: Option<f64>) -> PitchSelection {
    let lpm_valid = leds_per_meter.is_finite() && leds_per_meter > 0.0;
    let theoretical_pitch_mm = if lpm_valid {
        1000.0 / leds_per_meter
    } else {
        FALLBACK_LED_PITCH_MM
    };

    match calibrated_pitch_mm {
        Some(p) if p.is_finite() && p > 0.0 => {
            return PitchSelection {
                pitch_mm: p,
                source: PitchSource::Calibrated,
                was_adjusted: true,
                calibrated_pitch_mm: Some(p),
                theoretical_pitch_mm,
            };
        }
        Some(p) => warn!("Ignoring invalid calibrated pitch {} mm", p),
        None => {}
    }

    if !lpm_valid {
        warn!(
            "leds_per_meter={} is unusable, falling back to {} mm pitch",
            leds_per_meter, FALLBACK_LED_PITCH_MM
        );
    }

    PitchSelection {
        pitch_mm: theoretical_pitch_mm,
        source: if lpm_valid {
            PitchSource::LedsPerMeter
        } else {
            PitchSource::Fallback
        },
        was_adjusted: false,
        calibrated_pitch_mm: None,
        theoretical_pitch_mm,
    }
}

/// Derives a pitch from a measured distance between the centres of two LEDs.
pub fn calibrate_pitch(measured_span_mm: f64, first_led: usize, last_led: usize) -> Option<f64> {
    if last_led <= first_led || !measured_span_mm.is_finite() || measured_span_mm <= 0.0 {
        return None;
    }
    Some(measured_span_mm / (last_led - first_led) as f64)
}

/// Inclusive LED index range `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedRange {
    pub start: usize,
    pub end: usize,
}

impl LedRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start: start.min(end),
            end: start.max(end),
        }
    }

    #[inline]
    pub fn contains(&self, led: usize) -> bool {
        led >= self.start && led <= self.end
    }

    #[inline]
    pub fn contains_signed(&self, led: i64) -> bool {
        led >= self.start as i64 && led <= self.end as i64
    }

    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }

    pub fn iter(&self) -> RangeInclusive<usize> {
        self.start..=self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LedPlacement {
    pub led_index: usize,
    pub center_mm: f64,
    pub half_width_mm: f64,
}

impl LedPlacement {
    #[inline]
    pub fn left_mm(&self) -> f64 {
        self.center_mm - self.half_width_mm
    }

    #[inline]
    pub fn right_mm(&self) -> f64 {
        self.center_mm + self.half_width_mm
    }

    #[inline]
    pub fn footprint(&self) -> (f64, f64) {
        (self.left_mm(), self.right_mm())
    }
}

/// Positions of every addressable LED along the keyboard axis.
///
/// The anchor LED (normally `start_led`) has its footprint starting at
/// `strip_offset_mm`; the rest follow at the selected pitch in both directions.
#[derive(Debug, Clone, PartialEq)]
pub struct LedStrip {
    pitch: PitchSelection,
    half_width_mm: f64,
    anchor_led: usize,
    anchor_center_mm: f64,
    total_leds: usize,
}

impl LedStrip {
    pub fn new(params: &StripParams, anchor_led: usize) -> KlResult<Self> {
        require_positive("led_physical_width_mm", params.led_physical_width_mm)?;
        if params.total_leds == 0 {
            return Err(KeylightError::InvalidGeometry(
                "total_leds must be greater than zero".to_string(),
            ));
        }
        if !params.strip_offset_mm.is_finite() {
            return Err(KeylightError::InvalidGeometry(
                "strip_offset_mm must be finite".to_string(),
            ));
        }

        let pitch = select_pitch(params.leds_per_meter, params.calibrated_pitch_mm);
        let half_width_mm = params.led_physical_width_mm * 0.5;

        debug!(
            "LED strip: {} LEDs, pitch {:.3} mm ({}), width {:.2} mm, anchor LED {}",
            params.total_leds,
            pitch.pitch_mm,
            pitch.source,
            params.led_physical_width_mm,
            anchor_led
        );

        Ok(Self {
            pitch,
            half_width_mm,
            anchor_led,
            anchor_center_mm: params.strip_offset_mm + half_width_mm,
            total_leds: params.total_leds,
        })
    }

    pub fn pitch(&self) -> &PitchSelection {
        &self.pitch
    }

    pub fn total_leds(&self) -> usize {
        self.total_leds
    }

    #[inline]
    pub fn center_mm(&self, led_index: usize) -> f64 {
        let steps = led_index as f64 - self.anchor_led as f64;
        self.anchor_center_mm + steps * self.pitch.pitch_mm
    }

    pub fn placement(&self, led_index: usize) -> Option<LedPlacement> {
        (led_index < self.total_leds).then(|| LedPlacement {
            led_index,
            center_mm: self.center_mm(led_index),
            half_width_mm: self.half_width_mm,
        })
    }

    /// Placements for every addressable index inside `range`.
    pub fn placements(&self, range: LedRange) -> Vec<LedPlacement> {
        range.iter().filter_map(|i| self.placement(i)).collect()
    }
}
