use crate::consts::GEOMETRY_EPSILON;
use crate::geometry::{KeyGeometry, LedStrip};
use crate::mapping::types::KeyLedMap;
use serde::Serialize;
use std::collections::HashSet;
use strum_macros::Display;
use tracing::debug;

/// Which bounding key an orphan LED was handed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RescueSide {
    /// The lower-index key of the pair.
    Previous,
    /// The higher-index key of the pair.
    Next,
}

/// Decides which of two bounding keys an orphan LED belongs to, by centre-to-edge
/// distance. Equal distances go to the previous (lower index) key.
pub fn rescue_side(
    led_center_mm: f64,
    prev_right_edge_mm: f64,
    next_left_edge_mm: f64,
) -> RescueSide {
    let to_prev = (led_center_mm - prev_right_edge_mm).abs();
    let to_next = (next_left_edge_mm - led_center_mm).abs();
    if to_next < to_prev - GEOMETRY_EPSILON {
        RescueSide::Next
    } else {
        RescueSide::Previous
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RescueEvent {
    pub led_index: usize,
    pub key_index: usize,
    pub side: RescueSide,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RescueReport {
    pub events: Vec<RescueEvent>,
}

impl RescueReport {
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn from_previous(&self) -> usize {
        self.count(RescueSide::Previous)
    }

    pub fn from_next(&self) -> usize {
        self.count(RescueSide::Next)
    }

    fn count(&self, side: RescueSide) -> usize {
        self.events.iter().filter(|e| e.side == side).count()
    }
}

/// Hands every unassigned LED lying between two consecutive mapped keys to the nearer
/// of the two, so their LED ranges become contiguous.
///
/// Keys without LEDs are skipped over: the pair is formed by the nearest mapped keys
/// on either side. Running this on an already rescued mapping changes nothing.
pub fn rescue_gaps(mapping: &mut KeyLedMap, keys: &[KeyGeometry], strip: &LedStrip) -> RescueReport {
    let assigned: HashSet<usize> = mapping.iter().flat_map(|(_, leds)| leds.iter().copied()).collect();
    let mapped: Vec<&KeyGeometry> = keys
        .iter()
        .filter(|k| !mapping.leds(k.key_index).is_empty())
        .collect();

    let mut report = RescueReport::default();

    for pair in mapped.windows(2) {
        let (prev, next) = (pair[0], pair[1]);
        let (Some(hi), Some(lo)) = (mapping.max_led(prev.key_index), mapping.min_led(next.key_index))
        else {
            continue;
        };
        if lo <= hi + 1 {
            continue;
        }

        // Distances only ever shrink towards `next` as the LED index grows, so once a
        // gap LED goes to `next` the rest of the gap follows.
        let mut side = RescueSide::Previous;
        for led in (hi + 1)..lo {
            if assigned.contains(&led) {
                continue;
            }
            if side == RescueSide::Previous {
                side = rescue_side(strip.center_mm(led), prev.right_edge_mm, next.left_edge_mm);
            }
            let key_index = match side {
                RescueSide::Previous => prev.key_index,
                RescueSide::Next => next.key_index,
            };
            mapping.push(key_index, led);
            report.events.push(RescueEvent {
                led_index: led,
                key_index,
                side,
            });
        }
    }

    if !report.is_empty() {
        debug!(
            "Gap rescue: {} LEDs reassigned ({} to previous key, {} to next key)",
            report.len(),
            report.from_previous(),
            report.from_next()
        );
    }

    report
}
