use crate::consts::KEY_COUNT;
use serde::Serialize;
use std::collections::BTreeMap;

/// Key index -> ordered, deduplicated LED indices. Always holds exactly 88 slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct KeyLedMap {
    keys: Vec<Vec<usize>>,
}

impl Default for KeyLedMap {
    fn default() -> Self {
        Self::empty()
    }
}

impl KeyLedMap {
    pub fn empty() -> Self {
        Self {
            keys: vec![Vec::new(); KEY_COUNT],
        }
    }

    /// Builds a map from `(key_index, leds)` pairs; unlisted keys stay empty and
    /// out-of-range key indices are ignored.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (usize, Vec<usize>)>,
    {
        let mut map = Self::empty();
        for (key, leds) in entries {
            if key < KEY_COUNT {
                map.set(key, leds);
            }
        }
        map
    }

    #[inline]
    pub fn leds(&self, key: usize) -> &[usize] {
        self.keys.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Replaces a key's list, sorting and removing duplicates.
    pub fn set(&mut self, key: usize, mut leds: Vec<usize>) {
        leds.sort_unstable();
        leds.dedup();
        self.keys[key] = leds;
    }

    /// Replaces a key's list verbatim (order kept). Used for manual overrides.
    pub fn set_exact(&mut self, key: usize, leds: Vec<usize>) {
        self.keys[key] = leds;
    }

    pub fn push(&mut self, key: usize, led: usize) {
        let list = &mut self.keys[key];
        if let Err(pos) = list.binary_search(&led) {
            list.insert(pos, led);
        }
    }

    pub fn remove(&mut self, key: usize, led: usize) -> bool {
        let list = &mut self.keys[key];
        match list.iter().position(|&l| l == led) {
            Some(pos) => {
                list.remove(pos);
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &[usize])> {
        self.keys.iter().enumerate().map(|(k, v)| (k, v.as_slice()))
    }

    pub fn min_led(&self, key: usize) -> Option<usize> {
        self.leds(key).iter().copied().min()
    }

    pub fn max_led(&self, key: usize) -> Option<usize> {
        self.leds(key).iter().copied().max()
    }

    /// First key (lowest index) holding `led`.
    pub fn owner_of(&self, led: usize) -> Option<usize> {
        self.keys.iter().position(|v| v.contains(&led))
    }

    pub fn mapped_key_count(&self) -> usize {
        self.keys.iter().filter(|v| !v.is_empty()).count()
    }

    pub fn unmapped_keys(&self) -> Vec<usize> {
        (0..KEY_COUNT).filter(|&k| self.keys[k].is_empty()).collect()
    }

    /// Number of distinct LEDs assigned to any key.
    pub fn assigned_led_count(&self) -> usize {
        let mut all: Vec<usize> = self.keys.iter().flatten().copied().collect();
        all.sort_unstable();
        all.dedup();
        all.len()
    }

    /// Adjacent key pairs (k, k+1) whose LED ranges touch with no gap.
    pub fn consecutive_coverage_count(&self) -> usize {
        (0..KEY_COUNT - 1)
            .filter(|&k| match (self.max_led(k), self.min_led(k + 1)) {
                (Some(hi), Some(lo)) => hi + 1 == lo,
                _ => false,
            })
            .count()
    }

    /// LEDs held by more than one key, with their holders.
    pub fn shared_leds(&self) -> BTreeMap<usize, Vec<usize>> {
        let mut holders: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (key, leds) in self.iter() {
            for &led in leds {
                holders.entry(led).or_default().push(key);
            }
        }
        holders.retain(|_, keys| keys.len() > 1);
        holders
    }

    pub fn to_btree(&self) -> BTreeMap<usize, Vec<usize>> {
        self.iter()
            .filter(|(_, leds)| !leds.is_empty())
            .map(|(k, leds)| (k, leds.to_vec()))
            .collect()
    }
}
