use crate::calibration::{
    apply_calibration, apply_overrides, CalibrationReport, CalibrationState, OverrideReport,
};
use crate::config::Config;
use crate::geometry::{KeyGeometry, KeyboardLayout, LedStrip, PitchSelection};
use crate::mapping::{allocate, rescue_gaps, BaseAllocation, KeyLedMap, RescueReport};
use crate::util::CountStats;
use crate::KlResult;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Counters describing one mapping computation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingDiagnostics {
    pub total_led_count: usize,
    pub assigned_led_count: usize,
    pub mapped_key_count: usize,
    pub unmapped_key_count: usize,
    pub unmapped_keys: Vec<usize>,
    pub avg_leds_per_key: f64,
    pub min_leds_per_key: usize,
    pub max_leds_per_key: usize,
    pub std_dev_leds_per_key: f64,
    pub consecutive_coverage_count: usize,

    pub orphaned_led_count: usize,
    pub uncovered_led_count: usize,
    pub rescued_from_previous: usize,
    pub rescued_from_next: usize,

    pub dropped_out_of_range: usize,
    pub conflicts_resolved: usize,
    pub rejected_trims: usize,

    pub overrides_applied: usize,
    pub override_leds_dropped: usize,
    pub override_overlaps: usize,
}

/// Everything a pipeline run produces, stage by stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineOutput {
    pub allocation: BaseAllocation,
    /// Base mapping after gap rescue.
    pub rescued: KeyLedMap,
    pub rescue: RescueReport,
    pub calibration: CalibrationReport,
    pub overrides: OverrideReport,
    pub mapping: KeyLedMap,
}

impl PipelineOutput {
    pub fn diagnostics(&self, total_leds: usize) -> MappingDiagnostics {
        let m = &self.mapping;
        let stats = CountStats::from_counts(
            m.iter()
                .map(|(_, leds)| leds.len())
                .filter(|&n| n > 0),
        );
        let unmapped_keys = m.unmapped_keys();

        MappingDiagnostics {
            total_led_count: total_leds,
            assigned_led_count: m.assigned_led_count(),
            mapped_key_count: m.mapped_key_count(),
            unmapped_key_count: unmapped_keys.len(),
            unmapped_keys,
            avg_leds_per_key: stats.mean,
            min_leds_per_key: stats.min,
            max_leds_per_key: stats.max,
            std_dev_leds_per_key: stats.std_dev,
            consecutive_coverage_count: m.consecutive_coverage_count(),
            orphaned_led_count: self.allocation.orphaned.len(),
            uncovered_led_count: self.allocation.uncovered.len(),
            rescued_from_previous: self.rescue.from_previous(),
            rescued_from_next: self.rescue.from_next(),
            dropped_out_of_range: self.calibration.dropped_out_of_range,
            conflicts_resolved: self.calibration.conflicts.len(),
            rejected_trims: self.calibration.rejected_trims.len(),
            overrides_applied: self.overrides.applied.len(),
            override_leds_dropped: self.overrides.dropped_indices,
            override_overlaps: self.overrides.overlaps.len(),
        }
    }
}

/// Runs allocation, rescue, calibration and overrides over an arbitrary sorted key set.
pub fn run_pipeline(
    keys: &[KeyGeometry],
    strip: &LedStrip,
    state: &CalibrationState,
    overhang_threshold_mm: f64,
) -> PipelineOutput {
    let allocation = allocate(keys, strip, state.range(), overhang_threshold_mm);

    let mut rescued = allocation.mapping.clone();
    let rescue = rescue_gaps(&mut rescued, keys, strip);

    let (mut mapping, calibration) = apply_calibration(&rescued, state);
    let overrides = apply_overrides(&mut mapping, state, strip.total_leds());

    PipelineOutput {
        allocation,
        rescued,
        rescue,
        calibration,
        overrides,
        mapping,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingResult {
    /// Final key -> LED mapping.
    pub mapping: KeyLedMap,
    /// Geometric mapping after gap rescue, before user calibration.
    pub base: KeyLedMap,
    pub pitch: PitchSelection,
    pub diagnostics: MappingDiagnostics,
    #[serde(skip)]
    pub stages: PipelineOutput,
}

/// Computes the effective mapping for one configuration and calibration snapshot.
///
/// Fails only on unusable physical constants; every other anomaly is absorbed and
/// counted in the diagnostics.
pub fn compute_mapping(config: &Config, state: &CalibrationState) -> KlResult<MappingResult> {
    config.validate()?;

    let layout = KeyboardLayout::build(&config.keyboard)?;
    let strip = LedStrip::new(&config.strip, state.start_led)?;

    let stages = run_pipeline(
        layout.keys(),
        &strip,
        state,
        config.allocation.overhang_threshold_mm,
    );
    let diagnostics = stages.diagnostics(strip.total_leds());

    debug!("Mapping diagnostics: {:?}", diagnostics);
    info!(
        "Mapped {}/{} keys onto {} LEDs ({:.2} per key, {} contiguous pairs)",
        diagnostics.mapped_key_count,
        layout.keys().len(),
        diagnostics.assigned_led_count,
        diagnostics.avg_leds_per_key,
        diagnostics.consecutive_coverage_count
    );

    Ok(MappingResult {
        mapping: stages.mapping.clone(),
        base: stages.rescued.clone(),
        pitch: *strip.pitch(),
        diagnostics,
        stages,
    })
}
