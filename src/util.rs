use serde::{Deserialize, Serialize};

/// Length of the intersection of two closed intervals, 0 when disjoint.
#[inline]
pub fn overlap_mm(a: (f64, f64), b: (f64, f64)) -> f64 {
    (a.1.min(b.1) - a.0.max(b.0)).max(0.0)
}

/// Length of `led` lying outside `key` (both ends combined).
#[inline]
pub fn overhang_mm(led: (f64, f64), key: (f64, f64)) -> f64 {
    (key.0 - led.0).max(0.0) + (led.1 - key.1).max(0.0)
}

/// Summary of LEDs-per-key counts over the keys that received at least one LED.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountStats {
    pub samples: usize,
    pub min: usize,
    pub max: usize,
    pub mean: f64,
    pub std_dev: f64,
}

impl CountStats {
    pub fn from_counts<I: IntoIterator<Item = usize>>(counts: I) -> Self {
        let counts: Vec<usize> = counts.into_iter().collect();
        if counts.is_empty() {
            return Self::default();
        }

        let n = counts.len() as f64;
        let sum: usize = counts.iter().sum();
        let mean = sum as f64 / n;
        let variance = counts
            .iter()
            .map(|&c| {
                let d = c as f64 - mean;
                d * d
            })
            .sum::<f64>()
            / n;

        Self {
            samples: counts.len(),
            min: counts.iter().copied().min().unwrap_or(0),
            max: counts.iter().copied().max().unwrap_or(0),
            mean,
            std_dev: variance.sqrt(),
        }
    }
}
