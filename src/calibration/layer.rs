use crate::calibration::state::CalibrationState;
use crate::consts::KEY_COUNT;
use crate::mapping::KeyLedMap;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// An LED claimed by two keys after offsets were applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedConflict {
    pub led_index: usize,
    pub winner: usize,
    pub loser: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalibrationReport {
    pub shifted_keys: usize,
    pub trimmed_keys: usize,
    /// Shifted indices that fell outside `[start_led, end_led]`.
    pub dropped_out_of_range: usize,
    pub conflicts: Vec<LedConflict>,
    /// Keys whose trim would have removed every LED.
    pub rejected_trims: Vec<usize>,
}

/// Applies offsets, then trims, to every key of the rescued base mapping.
///
/// Order per key: shift by `global_offset + key_offsets[k]`, drop indices outside the
/// usable range, settle LEDs claimed twice, then trim. A key with a non-zero offset of
/// its own keeps an LED it moved onto; otherwise the lower key index keeps it.
pub fn apply_calibration(base: &KeyLedMap, state: &CalibrationState) -> (KeyLedMap, CalibrationReport) {
    let range = state.range();
    let mut report = CalibrationReport::default();
    let mut shifted = KeyLedMap::empty();

    for (key, leds) in base.iter() {
        let shift = state.net_offset(key);
        if shift == 0 {
            shifted.set(key, leds.to_vec());
            continue;
        }
        report.shifted_keys += 1;

        let mut moved = Vec::with_capacity(leds.len());
        for &led in leds {
            let target = led as i64 + shift;
            if range.contains_signed(target) {
                moved.push(target as usize);
            } else {
                report.dropped_out_of_range += 1;
            }
        }
        if moved.len() < leds.len() {
            warn!(
                "Key {}: offset {} pushed {} LED(s) outside [{}, {}]",
                key,
                shift,
                leds.len() - moved.len(),
                range.start,
                range.end
            );
        }
        shifted.set(key, moved);
    }

    resolve_conflicts(&mut shifted, state, &mut report);

    for key in 0..KEY_COUNT {
        let trim = state.key_led_trims[key];
        if trim.is_zero() {
            continue;
        }
        let leds = shifted.leds(key);
        if leds.is_empty() {
            continue;
        }
        if trim.left.saturating_add(trim.right) >= leds.len() {
            warn!(
                "Key {}: trim {{left: {}, right: {}}} would remove all {} LED(s); keeping untrimmed",
                key,
                trim.left,
                trim.right,
                leds.len()
            );
            report.rejected_trims.push(key);
            continue;
        }
        let kept = leds[trim.left..leds.len() - trim.right].to_vec();
        shifted.set(key, kept);
        report.trimmed_keys += 1;
    }

    debug!(
        "Calibration: {} shifted, {} trimmed, {} dropped, {} conflicts, {} rejected trims",
        report.shifted_keys,
        report.trimmed_keys,
        report.dropped_out_of_range,
        report.conflicts.len(),
        report.rejected_trims.len()
    );

    (shifted, report)
}

fn resolve_conflicts(mapping: &mut KeyLedMap, state: &CalibrationState, report: &mut CalibrationReport) {
    let shared: BTreeMap<usize, Vec<usize>> = mapping.shared_leds();
    for (led, holders) in shared {
        // Holders are in ascending key order; `min_by_key` keeps the first on ties.
        let Some(&winner) = holders
            .iter()
            .min_by_key(|&&k| (state.key_offsets[k] == 0, k))
        else {
            continue;
        };
        for &loser in holders.iter().filter(|&&k| k != winner) {
            mapping.remove(loser, led);
            report.conflicts.push(LedConflict {
                led_index: led,
                winner,
                loser,
            });
            warn!(
                "LED {} claimed by keys {} and {} after offsets; key {} keeps it",
                led, winner, loser, winner
            );
        }
    }
}
