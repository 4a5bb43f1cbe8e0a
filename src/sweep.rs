use crate::calibration::CalibrationState;
use crate::config::Config;
use crate::engine::run_pipeline;
use crate::geometry::{KeyboardLayout, LedStrip};
use crate::util::CountStats;
use crate::{KeylightError, KlResult};
use rayon::prelude::*;
use serde::Serialize;
use std::cmp::Ordering;
use tracing::info;

/// Geometric quality of the base mapping at one overhang threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepPoint {
    pub threshold_mm: f64,
    pub mapped_keys: usize,
    pub orphaned_leds: usize,
    pub rescued_leds: usize,
    pub avg_leds_per_key: f64,
    pub std_dev_leds_per_key: f64,
}

/// Evenly spaced thresholds from `from` to `to` inclusive.
pub fn threshold_steps(from: f64, to: f64, step: f64) -> KlResult<Vec<f64>> {
    if !(from.is_finite() && to.is_finite() && step.is_finite()) || step <= 0.0 || from < 0.0 {
        return Err(KeylightError::Config(format!(
            "invalid sweep range {}..{} step {}",
            from, to, step
        )));
    }
    let count = ((to - from) / step + 1e-9).floor().max(0.0) as usize;
    Ok((0..=count).map(|i| from + i as f64 * step).collect())
}

/// Evaluates the geometric pipeline (no user calibration) at every threshold in parallel.
pub fn sweep_thresholds(
    config: &Config,
    state: &CalibrationState,
    thresholds: &[f64],
) -> KlResult<Vec<SweepPoint>> {
    config.validate()?;
    let layout = KeyboardLayout::build(&config.keyboard)?;
    let strip = LedStrip::new(&config.strip, state.start_led)?;
    let geometric = CalibrationState::new(state.start_led, state.end_led);

    let points: Vec<SweepPoint> = thresholds
        .par_iter()
        .map(|&threshold_mm| {
            let out = run_pipeline(layout.keys(), &strip, &geometric, threshold_mm);
            let stats = CountStats::from_counts(
                out.rescued
                    .iter()
                    .map(|(_, leds)| leds.len())
                    .filter(|&n| n > 0),
            );
            SweepPoint {
                threshold_mm,
                mapped_keys: out.rescued.mapped_key_count(),
                orphaned_leds: out.allocation.orphaned.len(),
                rescued_leds: out.rescue.len(),
                avg_leds_per_key: stats.mean,
                std_dev_leds_per_key: stats.std_dev,
            }
        })
        .collect();

    info!("Swept {} overhang thresholds", points.len());
    Ok(points)
}

/// Most mapped keys first, then fewest rescued LEDs, then the smallest threshold.
pub fn recommend_threshold(points: &[SweepPoint]) -> Option<&SweepPoint> {
    points.iter().min_by(|a, b| {
        b.mapped_keys
            .cmp(&a.mapped_keys)
            .then(a.rescued_leds.cmp(&b.rescued_leds))
            .then(
                a.threshold_mm
                    .partial_cmp(&b.threshold_mm)
                    .unwrap_or(Ordering::Equal),
            )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_steps_inclusive() {
        let steps = threshold_steps(0.0, 1.0, 0.25).unwrap();
        assert_eq!(steps.len(), 5);
        assert!((steps[4] - 1.0).abs() < 1e-12);
        assert!(threshold_steps(0.0, 1.0, 0.0).is_err());
    }

    #[test]
    fn test_recommendation_prefers_coverage_then_fewer_rescues() {
        let p = |t: f64, mapped: usize, rescued: usize| SweepPoint {
            threshold_mm: t,
            mapped_keys: mapped,
            orphaned_leds: 0,
            rescued_leds: rescued,
            avg_leds_per_key: 0.0,
            std_dev_leds_per_key: 0.0,
        };
        let points = vec![p(0.5, 80, 2), p(1.0, 88, 10), p(1.5, 88, 4), p(2.0, 88, 4)];
        assert_eq!(recommend_threshold(&points).unwrap().threshold_mm, 1.5);
    }
}
