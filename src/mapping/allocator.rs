use crate::consts::GEOMETRY_EPSILON;
use crate::geometry::{KeyGeometry, LedPlacement, LedRange, LedStrip};
use crate::mapping::types::KeyLedMap;
use crate::util::{overhang_mm, overlap_mm};
use serde::Serialize;
use tracing::debug;

/// Result of intersecting key spans with LED footprints.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseAllocation {
    pub mapping: KeyLedMap,
    /// LEDs that touched at least one key but exceeded the overhang threshold for all.
    pub orphaned: Vec<usize>,
    /// LEDs whose footprint intersects no key span at all.
    pub uncovered: Vec<usize>,
}

/// A key an LED footprint intersects, with the quality numbers used for selection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub key_index: usize,
    pub overlap_mm: f64,
    pub overhang_mm: f64,
}

/// Every key whose span intersects `led`. `keys` must be sorted by position.
pub fn candidates(keys: &[KeyGeometry], led: &LedPlacement) -> Vec<Candidate> {
    let footprint = led.footprint();
    // First key whose right edge lies past the LED's left edge.
    let first = keys.partition_point(|k| k.right_edge_mm <= footprint.0);

    keys[first..]
        .iter()
        .take_while(|k| k.left_edge_mm < footprint.1)
        .filter_map(|k| {
            let overlap = overlap_mm(footprint, k.span());
            (overlap > GEOMETRY_EPSILON).then(|| Candidate {
                key_index: k.key_index,
                overlap_mm: overlap,
                overhang_mm: overhang_mm(footprint, k.span()),
            })
        })
        .collect()
}

/// Picks the accepting key with the greatest overlap; ties keep the lower key index.
pub fn select_owner(candidates: &[Candidate], overhang_threshold_mm: f64) -> Option<usize> {
    let mut best: Option<&Candidate> = None;
    for c in candidates
        .iter()
        .filter(|c| c.overhang_mm <= overhang_threshold_mm + GEOMETRY_EPSILON)
    {
        match best {
            Some(b)
                if c.overlap_mm > b.overlap_mm + GEOMETRY_EPSILON
                    || (c.overlap_mm >= b.overlap_mm - GEOMETRY_EPSILON
                        && c.key_index < b.key_index) =>
            {
                best = Some(c)
            }
            None => best = Some(c),
            _ => {}
        }
    }
    best.map(|c| c.key_index)
}

/// Builds the base mapping for `range`, keeping only LEDs whose overhang is within
/// `overhang_threshold_mm`.
pub fn allocate(
    keys: &[KeyGeometry],
    strip: &LedStrip,
    range: LedRange,
    overhang_threshold_mm: f64,
) -> BaseAllocation {
    let mut mapping = KeyLedMap::empty();
    let mut orphaned = Vec::new();
    let mut uncovered = Vec::new();

    for led in strip.placements(range) {
        let cands = candidates(keys, &led);
        if cands.is_empty() {
            uncovered.push(led.led_index);
            continue;
        }
        match select_owner(&cands, overhang_threshold_mm) {
            Some(key) => mapping.push(key, led.led_index),
            None => orphaned.push(led.led_index),
        }
    }

    let empty_keys: Vec<usize> = keys
        .iter()
        .map(|k| k.key_index)
        .filter(|&k| mapping.leds(k).is_empty())
        .collect();

    debug!(
        "Base allocation: {} keys mapped, {} orphaned, {} uncovered, empty keys {:?}",
        keys.len() - empty_keys.len(),
        orphaned.len(),
        uncovered.len(),
        empty_keys
    );

    BaseAllocation {
        mapping,
        orphaned,
        uncovered,
    }
}
