use crate::consts::KEY_COUNT;
use crate::geometry::LedRange;
use crate::notes;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, warn};

/// Number of LEDs to drop from each end of a key's list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyTrim {
    pub left: usize,
    pub right: usize,
}

impl KeyTrim {
    pub fn new(left: usize, right: usize) -> Self {
        Self { left, right }
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.left == 0 && self.right == 0
    }
}

/// Canonical, validated calibration snapshot consumed by the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationState {
    pub start_led: usize,
    pub end_led: usize,
    /// Legacy uniform shift; 0 for the modern schema. Added to every per-key offset.
    pub global_offset: i32,
    pub key_offsets: [i32; KEY_COUNT],
    pub key_led_trims: [KeyTrim; KEY_COUNT],
    pub key_led_overrides: [Option<Vec<usize>>; KEY_COUNT],
}

impl CalibrationState {
    pub fn new(start_led: usize, end_led: usize) -> Self {
        let range = LedRange::new(start_led, end_led);
        Self {
            start_led: range.start,
            end_led: range.end,
            global_offset: 0,
            key_offsets: [0; KEY_COUNT],
            key_led_trims: [KeyTrim::default(); KEY_COUNT],
            key_led_overrides: std::array::from_fn(|_| None),
        }
    }

    /// Full-strip range with no adjustments.
    pub fn for_strip(total_leds: usize) -> Self {
        Self::new(0, total_leds.saturating_sub(1))
    }

    pub fn range(&self) -> LedRange {
        LedRange::new(self.start_led, self.end_led)
    }

    pub fn with_global_offset(mut self, offset: i32) -> Self {
        self.global_offset = offset;
        self
    }

    pub fn with_offset(mut self, key: usize, offset: i32) -> Self {
        self.key_offsets[key] = offset;
        self
    }

    pub fn with_trim(mut self, key: usize, left: usize, right: usize) -> Self {
        self.key_led_trims[key] = KeyTrim::new(left, right);
        self
    }

    pub fn with_override(mut self, key: usize, leds: Vec<usize>) -> Self {
        self.key_led_overrides[key] = Some(leds);
        self
    }

    /// Total shift applied to `key`: legacy global offset plus the key's own offset.
    #[inline]
    pub fn net_offset(&self, key: usize) -> i64 {
        self.global_offset as i64 + self.key_offsets[key] as i64
    }

    pub fn has_override(&self, key: usize) -> bool {
        self.key_led_overrides[key].is_some()
    }
}

/// The two persisted calibration layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationSchema {
    /// Older documents carrying a single `global_offset` applied to every key.
    Legacy { global_offset: i32 },
    /// `start_led`/`end_led` plus per-key offsets only.
    Modern,
}

/// Calibration as persisted by the settings store: loosely typed, string keyed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawCalibration {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_led: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_led: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global_offset: Option<Value>,
    pub key_offsets: Map<String, Value>,
    pub key_led_trims: Map<String, Value>,
    pub key_led_overrides: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizationReport {
    pub warnings: Vec<String>,
}

impl NormalizationReport {
    fn warn(&mut self, msg: String) {
        warn!("{}", msg);
        self.warnings.push(msg);
    }

    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

impl RawCalibration {
    pub fn schema(&self) -> CalibrationSchema {
        match &self.global_offset {
            Some(v) => CalibrationSchema::Legacy {
                global_offset: parse_int(v)
                    .and_then(|g| i32::try_from(g).ok())
                    .unwrap_or(0),
            },
            None => CalibrationSchema::Modern,
        }
    }

    /// Resolves the persisted form into a canonical state. Malformed entries are skipped
    /// and reported; this never fails.
    pub fn normalize(&self, total_leds: usize) -> (CalibrationState, NormalizationReport) {
        let mut report = NormalizationReport::default();
        let last = total_leds.saturating_sub(1);

        let start = self.bound("start_led", self.start_led.as_ref(), 0, &mut report);
        let end = self.bound("end_led", self.end_led.as_ref(), last, &mut report);
        let (start, end) = clamp_range(start, end, last, &mut report);
        let mut state = CalibrationState::new(start, end);

        match self.schema() {
            CalibrationSchema::Legacy { global_offset } => {
                if self.global_offset.as_ref().and_then(parse_int).is_none() {
                    report.warn(format!(
                        "global_offset {} is not an integer; using 0",
                        self.global_offset.as_ref().map_or(Value::Null, Clone::clone)
                    ));
                } else if global_offset != 0 {
                    info!(
                        "Legacy calibration schema: global_offset {} is added to every per-key offset",
                        global_offset
                    );
                }
                state.global_offset = global_offset;
            }
            CalibrationSchema::Modern => {}
        }

        for (raw_key, value) in &self.key_offsets {
            let Some(key) = resolve_key("key_offsets", raw_key, &mut report) else {
                continue;
            };
            match parse_int(value).and_then(|v| i32::try_from(v).ok()) {
                Some(offset) => state.key_offsets[key] = offset,
                None => report.warn(format!(
                    "key_offsets[{}] = {} is not an integer; ignoring",
                    raw_key, value
                )),
            }
        }

        for (raw_key, value) in &self.key_led_trims {
            let Some(key) = resolve_key("key_led_trims", raw_key, &mut report) else {
                continue;
            };
            match parse_trim(value) {
                Some(trim) => state.key_led_trims[key] = trim,
                None => report.warn(format!(
                    "key_led_trims[{}] = {} is not a pair of non-negative integers; ignoring",
                    raw_key, value
                )),
            }
        }

        for (raw_key, value) in &self.key_led_overrides {
            let Some(key) = resolve_key("key_led_overrides", raw_key, &mut report) else {
                continue;
            };
            if let Some(leds) = parse_override(raw_key, value, &mut report) {
                state.key_led_overrides[key] = Some(leds);
            }
        }

        (state, report)
    }

    fn bound(
        &self,
        name: &str,
        value: Option<&Value>,
        default: usize,
        report: &mut NormalizationReport,
    ) -> usize {
        let Some(v) = value else {
            return default;
        };
        match parse_int(v).and_then(|i| usize::try_from(i).ok()) {
            Some(b) => b,
            None => {
                report.warn(format!(
                    "{} = {} is not a non-negative integer; using {}",
                    name, v, default
                ));
                default
            }
        }
    }

    pub fn set_range(&mut self, start_led: usize, end_led: usize) {
        self.start_led = Some(Value::from(start_led));
        self.end_led = Some(Value::from(end_led));
    }

    pub fn set_offset(&mut self, key: usize, offset: i32) {
        remove_key_entries(&mut self.key_offsets, key);
        self.key_offsets.insert(key.to_string(), Value::from(offset));
    }

    pub fn remove_offset(&mut self, key: usize) -> bool {
        remove_key_entries(&mut self.key_offsets, key)
    }

    pub fn set_trim(&mut self, key: usize, trim: KeyTrim) {
        remove_key_entries(&mut self.key_led_trims, key);
        self.key_led_trims
            .insert(key.to_string(), serde_json::json!({ "left": trim.left, "right": trim.right }));
    }

    pub fn remove_trim(&mut self, key: usize) -> bool {
        remove_key_entries(&mut self.key_led_trims, key)
    }

    pub fn set_override(&mut self, key: usize, leds: &[usize]) {
        remove_key_entries(&mut self.key_led_overrides, key);
        self.key_led_overrides
            .insert(key.to_string(), Value::from(leds.to_vec()));
    }

    pub fn remove_override(&mut self, key: usize) -> bool {
        remove_key_entries(&mut self.key_led_overrides, key)
    }
}

/// Integer value from a JSON number or numeric string. Fractions are rejected.
pub fn parse_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn parse_non_negative(value: &Value) -> Option<usize> {
    parse_int(value).and_then(|i| usize::try_from(i).ok())
}

fn parse_trim(value: &Value) -> Option<KeyTrim> {
    match value {
        Value::Object(obj) => {
            let side = |name: &str| match obj.get(name) {
                None | Some(Value::Null) => Some(0),
                Some(v) => parse_non_negative(v),
            };
            Some(KeyTrim::new(side("left")?, side("right")?))
        }
        Value::Array(items) if items.len() == 2 => Some(KeyTrim::new(
            parse_non_negative(&items[0])?,
            parse_non_negative(&items[1])?,
        )),
        _ => None,
    }
}

fn parse_override(raw_key: &str, value: &Value, report: &mut NormalizationReport) -> Option<Vec<usize>> {
    let Value::Array(items) = value else {
        report.warn(format!(
            "key_led_overrides[{}] = {} is not a list; ignoring",
            raw_key, value
        ));
        return None;
    };

    let mut leds = Vec::with_capacity(items.len());
    for item in items {
        match parse_non_negative(item) {
            Some(led) if leds.contains(&led) => report.warn(format!(
                "key_led_overrides[{}] lists LED {} more than once; keeping the first",
                raw_key, led
            )),
            Some(led) => leds.push(led),
            None => report.warn(format!(
                "key_led_overrides[{}] entry {} is not a valid LED index; skipping",
                raw_key, item
            )),
        }
    }

    if leds.is_empty() {
        report.warn(format!(
            "key_led_overrides[{}] has no usable LEDs; ignoring",
            raw_key
        ));
        return None;
    }
    Some(leds)
}

fn resolve_key(section: &str, raw_key: &str, report: &mut NormalizationReport) -> Option<usize> {
    let key = notes::parse_key_ref(raw_key);
    if key.is_none() {
        report.warn(format!(
            "{}: '{}' is not a key index (0..{}) or note name; ignoring",
            section,
            raw_key,
            KEY_COUNT - 1
        ));
    }
    key
}

fn clamp_range(
    start: usize,
    end: usize,
    last: usize,
    report: &mut NormalizationReport,
) -> (usize, usize) {
    let (mut start, mut end) = (start, end);
    if end > last {
        report.warn(format!("end_led {} exceeds the strip; clamping to {}", end, last));
        end = last;
    }
    if start > last {
        report.warn(format!("start_led {} exceeds the strip; clamping to {}", start, last));
        start = last;
    }
    if start > end {
        report.warn(format!("start_led {} is after end_led {}; swapping", start, end));
        std::mem::swap(&mut start, &mut end);
    }
    (start, end)
}

/// Removes every entry whose key resolves to `key` (index or note-name spelling).
fn remove_key_entries(map: &mut Map<String, Value>, key: usize) -> bool {
    let before = map.len();
    map.retain(|k, _| notes::parse_key_ref(k) != Some(key));
    map.len() != before
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_int_variants() {
        assert_eq!(parse_int(&json!(3)), Some(3));
        assert_eq!(parse_int(&json!(-2)), Some(-2));
        assert_eq!(parse_int(&json!(4.0)), Some(4));
        assert_eq!(parse_int(&json!(" 7 ")), Some(7));
        assert_eq!(parse_int(&json!(1.5)), None);
        assert_eq!(parse_int(&json!("abc")), None);
        assert_eq!(parse_int(&json!(null)), None);
        assert_eq!(parse_int(&json!([1])), None);
    }

    #[test]
    fn test_parse_trim_shapes() {
        assert_eq!(parse_trim(&json!({"left": 1, "right": 2})), Some(KeyTrim::new(1, 2)));
        assert_eq!(parse_trim(&json!({"right": 2})), Some(KeyTrim::new(0, 2)));
        assert_eq!(parse_trim(&json!([3, 0])), Some(KeyTrim::new(3, 0)));
        assert_eq!(parse_trim(&json!({"left": -1, "right": 0})), None);
        assert_eq!(parse_trim(&json!("1,2")), None);
    }

    #[test]
    fn test_setters_replace_note_name_spelling() {
        let mut raw = RawCalibration::default();
        raw.key_offsets.insert("C4".to_string(), json!(2));
        raw.set_offset(39, 5);
        assert_eq!(raw.key_offsets.len(), 1);
        assert_eq!(raw.key_offsets["39"], json!(5));
        assert!(raw.remove_offset(39));
        assert!(!raw.remove_offset(39));
    }
}
