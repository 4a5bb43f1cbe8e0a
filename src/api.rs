use crate::calibration::KeyTrim;
use crate::config::Config;
use crate::engine::{compute_mapping, MappingDiagnostics, MappingResult};
use crate::geometry::{calibrate_pitch, PitchSelection};
use crate::settings::SettingsStore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tracing::info;

/// The global state required to run keylight services.
#[derive(Default)]
pub struct KeylightState {
    pub store: Mutex<Option<Arc<SettingsStore>>>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MappingResponse {
    pub total_led_count: usize,
    /// Effective mapping; keys without LEDs are omitted.
    pub mapping: BTreeMap<usize, Vec<usize>>,
    /// Geometric mapping before user calibration.
    pub base: BTreeMap<usize, Vec<usize>>,
    pub pitch: PitchSelection,
    pub diagnostics: MappingDiagnostics,
    pub warnings: Vec<String>,
}

impl MappingResponse {
    pub fn new(total_led_count: usize, result: MappingResult, warnings: Vec<String>) -> Self {
        Self {
            total_led_count,
            mapping: result.mapping.to_btree(),
            base: result.base.to_btree(),
            pitch: result.pitch,
            diagnostics: result.diagnostics,
            warnings,
        }
    }
}

fn store(state: &KeylightState) -> Result<Arc<SettingsStore>, String> {
    let guard = state.store.lock().map_err(|e| e.to_string())?;
    guard
        .as_ref()
        .cloned()
        .ok_or_else(|| "Settings not loaded. Load settings first.".to_string())
}

/// Service: Open (or create) the settings file backing all other services.
pub fn load_settings(state: &KeylightState, path: &str) -> Result<String, String> {
    let store = SettingsStore::open(path).map_err(|e| e.to_string())?;
    let mut guard = state.store.lock().map_err(|e| e.to_string())?;
    *guard = Some(Arc::new(store));
    info!("API: settings loaded from {}", path);
    Ok("Settings Loaded Successfully".to_string())
}

/// Service: Compute the effective mapping from the current settings.
pub fn query_mapping(state: &KeylightState) -> Result<MappingResponse, String> {
    let store = store(state)?;
    let (config, calibration, report) = store.snapshot().map_err(|e| e.to_string())?;
    let result = compute_mapping(&config, &calibration).map_err(|e| e.to_string())?;

    Ok(MappingResponse::new(
        config.strip.total_leds,
        result,
        report.warnings,
    ))
}

pub fn get_config(state: &KeylightState) -> Result<Config, String> {
    let store = store(state)?;
    let doc = store.document().map_err(|e| e.to_string())?;
    Ok(doc.config)
}

pub fn update_config(state: &KeylightState, config: Config) -> Result<(), String> {
    store(state)?.set_config(config).map_err(|e| e.to_string())
}

pub fn set_key_offset(state: &KeylightState, key: usize, offset: i32) -> Result<(), String> {
    store(state)?
        .set_key_offset(key, offset)
        .map_err(|e| e.to_string())
}

pub fn delete_key_offset(state: &KeylightState, key: usize) -> Result<(), String> {
    store(state)?.delete_key_offset(key).map_err(|e| e.to_string())
}

pub fn set_key_trim(
    state: &KeylightState,
    key: usize,
    left: usize,
    right: usize,
) -> Result<(), String> {
    store(state)?
        .set_key_trim(key, KeyTrim::new(left, right))
        .map_err(|e| e.to_string())
}

pub fn delete_key_trim(state: &KeylightState, key: usize) -> Result<(), String> {
    store(state)?.delete_key_trim(key).map_err(|e| e.to_string())
}

pub fn set_key_override(state: &KeylightState, key: usize, leds: Vec<usize>) -> Result<(), String> {
    store(state)?
        .set_key_override(key, &leds)
        .map_err(|e| e.to_string())
}

pub fn clear_key_override(state: &KeylightState, key: usize) -> Result<(), String> {
    store(state)?
        .clear_key_override(key)
        .map_err(|e| e.to_string())
}

/// Service: Add or remove one LED from a key. A key without an override starts
/// from the LEDs it currently lights.
pub fn toggle_key_led(state: &KeylightState, key: usize, led: usize) -> Result<Vec<usize>, String> {
    let store = store(state)?;
    let (config, calibration, _) = store.snapshot().map_err(|e| e.to_string())?;
    let result = compute_mapping(&config, &calibration).map_err(|e| e.to_string())?;
    store
        .toggle_override_led(key, led, result.mapping.leds(key))
        .map_err(|e| e.to_string())
}

pub fn set_led_range(state: &KeylightState, start_led: usize, end_led: usize) -> Result<(), String> {
    store(state)?
        .set_led_range(start_led, end_led)
        .map_err(|e| e.to_string())
}

/// Service: Store a pitch measured as the centre-to-centre span between two LEDs.
pub fn calibrate_led_pitch(
    state: &KeylightState,
    measured_span_mm: f64,
    first_led: usize,
    last_led: usize,
) -> Result<f64, String> {
    let pitch = calibrate_pitch(measured_span_mm, first_led, last_led).ok_or_else(|| {
        format!(
            "Cannot derive a pitch from {} mm between LEDs {} and {}",
            measured_span_mm, first_led, last_led
        )
    })?;
    let store = store(state)?;
    let mut config = store.document().map_err(|e| e.to_string())?.config;
    config.strip.calibrated_pitch_mm = Some(pitch);
    store.set_config(config).map_err(|e| e.to_string())?;
    Ok(pitch)
}
