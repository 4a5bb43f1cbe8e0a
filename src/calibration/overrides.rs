use crate::calibration::state::CalibrationState;
use crate::consts::KEY_COUNT;
use crate::mapping::KeyLedMap;
use serde::Serialize;
use tracing::{debug, warn};

/// Another key still holding LEDs that an override also claims. Informational only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverrideOverlap {
    pub key_index: usize,
    pub neighbor_key: usize,
    pub shared_leds: Vec<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverrideReport {
    pub applied: Vec<usize>,
    /// Override entries beyond the strip or outside `[start_led, end_led]`.
    pub dropped_indices: usize,
    pub overlaps: Vec<OverrideOverlap>,
}

/// Replaces the list of every key that has a manual override. Overrides are taken
/// verbatim apart from indices beyond the strip or outside the usable range;
/// neighbours are not reallocated.
pub fn apply_overrides(
    mapping: &mut KeyLedMap,
    state: &CalibrationState,
    total_leds: usize,
) -> OverrideReport {
    let mut report = OverrideReport::default();
    let range = state.range();

    for key in 0..KEY_COUNT {
        let Some(leds) = &state.key_led_overrides[key] else {
            continue;
        };

        let mut kept = Vec::with_capacity(leds.len());
        for &led in leds {
            if led >= total_leds || !range.contains(led) {
                report.dropped_indices += 1;
            } else if !kept.contains(&led) {
                kept.push(led);
            }
        }

        if kept.len() < leds.len() {
            warn!(
                "Key {}: override lists {} LED(s) outside [{}, {}] of the {}-LED strip",
                key,
                leds.len() - kept.len(),
                range.start,
                range.end,
                total_leds
            );
        }
        if kept.is_empty() {
            warn!("Key {}: override has no addressable LEDs; ignoring it", key);
            continue;
        }

        mapping.set_exact(key, kept);
        report.applied.push(key);
    }

    let mut overlaps = Vec::new();
    for &key in &report.applied {
        let own = mapping.leds(key);
        for (other, leds) in mapping.iter() {
            if other == key {
                continue;
            }
            let shared: Vec<usize> = leds.iter().copied().filter(|l| own.contains(l)).collect();
            if !shared.is_empty() {
                overlaps.push(OverrideOverlap {
                    key_index: key,
                    neighbor_key: other,
                    shared_leds: shared,
                });
            }
        }
    }
    report.overlaps = overlaps;

    if !report.applied.is_empty() {
        debug!(
            "Overrides: {} applied, {} entries dropped, {} overlaps with other keys",
            report.applied.len(),
            report.dropped_indices,
            report.overlaps.len()
        );
    }

    report
}
