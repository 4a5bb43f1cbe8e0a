use crate::geometry::BlackKeyPlacement;
use crate::{KeylightError, KlResult};
use clap::{parser::ValueSource, ArgMatches, Args};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Args, Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    #[command(flatten)]
    pub keyboard: KeyboardDimensions,
    #[command(flatten)]
    pub strip: StripParams,
    #[command(flatten)]
    pub allocation: AllocationParams,
}

/// Physical key dimensions. All values in millimetres.
#[derive(Args, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyboardDimensions {
    #[arg(long, default_value_t = 23.5)]
    pub white_key_width_mm: f64,
    #[arg(long, default_value_t = 13.7)]
    pub black_key_width_mm: f64,
    #[arg(long, default_value_t = 1.0)]
    pub white_key_gap_mm: f64,
    #[arg(long, value_enum, default_value_t = BlackKeyPlacement::Staggered)]
    pub black_key_placement: BlackKeyPlacement,
}

impl Default for KeyboardDimensions {
    fn default() -> Self {
        Self {
            white_key_width_mm: 23.5,
            black_key_width_mm: 13.7,
            white_key_gap_mm: 1.0,
            black_key_placement: BlackKeyPlacement::Staggered,
        }
    }
}

#[derive(Args, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StripParams {
    #[arg(long, default_value_t = 200)]
    pub total_leds: usize,
    #[arg(long, default_value_t = 144.0)]
    pub leds_per_meter: f64,
    #[arg(long, default_value_t = 3.5)]
    pub led_physical_width_mm: f64,

    // User-measured pitch; wins over leds_per_meter when set.
    #[arg(long)]
    pub calibrated_pitch_mm: Option<f64>,

    // Offset of the start LED's footprint from the keyboard's left edge.
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pub strip_offset_mm: f64,
}

impl Default for StripParams {
    fn default() -> Self {
        Self {
            total_leds: 200,
            leds_per_meter: 144.0,
            led_physical_width_mm: 3.5,
            calibrated_pitch_mm: None,
            strip_offset_mm: 0.0,
        }
    }
}

#[derive(Args, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AllocationParams {
    #[arg(long, default_value_t = 1.5)]
    pub overhang_threshold_mm: f64,
}

impl Default for AllocationParams {
    fn default() -> Self {
        Self {
            overhang_threshold_mm: 1.5,
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> KlResult<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Rejects physical constants the engine cannot work with.
    /// `leds_per_meter` and `calibrated_pitch_mm` are not checked here: bad values fall
    /// back during pitch selection instead.
    pub fn validate(&self) -> KlResult<()> {
        let k = &self.keyboard;
        require_positive("white_key_width_mm", k.white_key_width_mm)?;
        require_positive("black_key_width_mm", k.black_key_width_mm)?;
        require_non_negative("white_key_gap_mm", k.white_key_gap_mm)?;
        require_positive("led_physical_width_mm", self.strip.led_physical_width_mm)?;
        require_non_negative(
            "overhang_threshold_mm",
            self.allocation.overhang_threshold_mm,
        )?;
        if !self.strip.strip_offset_mm.is_finite() {
            return Err(KeylightError::InvalidGeometry(
                "strip_offset_mm must be finite".to_string(),
            ));
        }
        if self.strip.total_leds == 0 {
            return Err(KeylightError::InvalidGeometry(
                "total_leds must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn merge_from_cli(&mut self, cli: &Config, matches: &ArgMatches) {
        macro_rules! update_if_present {
            ($group:ident, $field:ident) => {
                if matches.value_source(stringify!($field)) == Some(ValueSource::CommandLine) {
                    self.$group.$field = cli.$group.$field.clone();
                }
            };
        }

        update_if_present!(keyboard, white_key_width_mm);
        update_if_present!(keyboard, black_key_width_mm);
        update_if_present!(keyboard, white_key_gap_mm);
        update_if_present!(keyboard, black_key_placement);

        update_if_present!(strip, total_leds);
        update_if_present!(strip, leds_per_meter);
        update_if_present!(strip, led_physical_width_mm);
        update_if_present!(strip, calibrated_pitch_mm);
        update_if_present!(strip, strip_offset_mm);

        update_if_present!(allocation, overhang_threshold_mm);
    }
}

pub(crate) fn require_positive(name: &str, value: f64) -> KlResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(KeylightError::InvalidGeometry(format!(
            "{} must be positive and finite (got {})",
            name, value
        )))
    }
}

pub(crate) fn require_non_negative(name: &str, value: f64) -> KlResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(KeylightError::InvalidGeometry(format!(
            "{} must be non-negative and finite (got {})",
            name, value
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let cfg: Config =
            serde_json::from_str(r#"{ "strip": { "total_leds": 120 } }"#).unwrap();
        assert_eq!(cfg.strip.total_leds, 120);
        assert_eq!(cfg.strip.leds_per_meter, 144.0);
        assert_eq!(cfg.keyboard, KeyboardDimensions::default());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "allocation": { "overhang_threshold_mm": 0.5 } }"#).unwrap();
        let cfg = Config::load_from_file(&path).unwrap();
        assert_eq!(cfg.allocation.overhang_threshold_mm, 0.5);
        assert!(Config::load_from_file(dir.path().join("missing.json")).is_err());
    }

    #[test]
    fn test_rejects_nan_width() {
        let mut cfg = Config::default();
        cfg.keyboard.white_key_width_mm = f64::NAN;
        assert!(matches!(
            cfg.validate(),
            Err(KeylightError::InvalidGeometry(_))
        ));
    }
}
