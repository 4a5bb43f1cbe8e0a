use keylight::api::{self, KeylightState};
use keylight::calibration::KeyTrim;
use keylight::config::Config;
use keylight::settings::{SettingsDocument, SettingsEvent, SettingsStore};
use keylight::KeylightError;
use std::fs;
use tempfile::TempDir;

fn temp_store() -> (TempDir, SettingsStore) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let store = SettingsStore::open(dir.path().join("data").join("settings.json")).unwrap();
    (dir, store)
}

#[test]
fn test_missing_file_starts_from_defaults() {
    let (_dir, store) = temp_store();
    let doc = store.document().unwrap();
    assert_eq!(doc, SettingsDocument::default());
    assert!(!store.path().unwrap().exists());
}

#[test]
fn test_mutations_persist_to_disk() {
    let (_dir, store) = temp_store();
    store.set_key_offset(39, 2).unwrap();
    store.set_key_trim(40, KeyTrim::new(1, 0)).unwrap();
    store.set_key_override(41, &[100, 101, 100]).unwrap();
    store.set_led_range(5, 190).unwrap();

    let reopened = SettingsStore::open(store.path().unwrap()).unwrap();
    let (_, state, report) = reopened.snapshot().unwrap();
    assert!(report.is_clean());
    assert_eq!(state.key_offsets[39], 2);
    assert_eq!(state.key_led_trims[40], KeyTrim::new(1, 0));
    assert_eq!(state.key_led_overrides[41], Some(vec![100, 101]));
    assert_eq!((state.start_led, state.end_led), (5, 190));

    let text = fs::read_to_string(store.path().unwrap()).unwrap();
    assert!(text.contains("\"key_offsets\""));
}

#[test]
fn test_deletes_remove_entries() {
    let (_dir, store) = temp_store();
    store.set_key_offset(10, -1).unwrap();
    store.set_key_trim(10, KeyTrim::new(0, 1)).unwrap();
    store.set_key_override(10, &[3]).unwrap();

    store.delete_key_offset(10).unwrap();
    store.delete_key_trim(10).unwrap();
    store.clear_key_override(10).unwrap();

    let doc = store.document().unwrap();
    assert!(doc.calibration.key_offsets.is_empty());
    assert!(doc.calibration.key_led_trims.is_empty());
    assert!(doc.calibration.key_led_overrides.is_empty());
}

#[test]
fn test_subscribers_receive_events_in_order() {
    let (_dir, store) = temp_store();
    let rx = store.subscribe();

    store.set_key_offset(1, 3).unwrap();
    store.delete_key_offset(1).unwrap();
    store.set_key_trim(2, KeyTrim::new(0, 0)).unwrap();
    store.set_key_override(3, &[]).unwrap();
    store.set_config(Config::default()).unwrap();

    let events: Vec<SettingsEvent> = rx.try_iter().collect();
    assert_eq!(
        events,
        vec![
            SettingsEvent::OffsetChanged { key: 1, value: Some(3) },
            SettingsEvent::OffsetChanged { key: 1, value: None },
            SettingsEvent::TrimChanged { key: 2, trim: None },
            SettingsEvent::OverrideChanged { key: 3, leds: None },
            SettingsEvent::ConfigChanged,
        ]
    );
}

#[test]
fn test_invalid_input_is_rejected_without_side_effects() {
    let (_dir, store) = temp_store();
    let rx = store.subscribe();

    assert!(matches!(
        store.set_key_offset(200, 1),
        Err(KeylightError::InvalidKey(_))
    ));
    let mut bad = Config::default();
    bad.strip.total_leds = 0;
    assert!(store.set_config(bad).is_err());

    assert!(rx.try_recv().is_err());
    assert!(!store.path().unwrap().exists());
}

#[test]
fn test_toggle_seeds_from_current_leds() {
    let (_dir, store) = temp_store();
    let leds = store.toggle_override_led(20, 50, &[47, 48, 49]).unwrap();
    assert_eq!(leds, vec![47, 48, 49, 50]);

    // Existing override is used from now on; the seed is ignored.
    let leds = store.toggle_override_led(20, 48, &[1, 2]).unwrap();
    assert_eq!(leds, vec![47, 49, 50]);
}

#[test]
fn test_failed_save_leaves_store_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let not_a_dir = dir.path().join("blocker");
    fs::write(&not_a_dir, "plain file").unwrap();

    let store = SettingsStore::open(not_a_dir.join("settings.json")).unwrap();
    let rx = store.subscribe();

    assert!(matches!(
        store.set_key_offset(5, 3),
        Err(KeylightError::Io(_))
    ));
    let (_, state, _) = store.snapshot().unwrap();
    assert_eq!(state.key_offsets[5], 0);
    assert_eq!(store.document().unwrap(), SettingsDocument::default());
    assert!(rx.try_recv().is_err());
}

#[test]
fn test_concurrent_toggles_keep_every_led() {
    let store = SettingsStore::in_memory(SettingsDocument::default());
    std::thread::scope(|s| {
        for led in 100..116 {
            let store = &store;
            s.spawn(move || store.toggle_override_led(30, led, &[]).unwrap());
        }
    });

    let (_, state, _) = store.snapshot().unwrap();
    let mut leds = state.key_led_overrides[30].clone().unwrap();
    leds.sort_unstable();
    assert_eq!(leds, (100..116).collect::<Vec<_>>());
}

#[test]
fn test_toggling_last_led_clears_override() {
    let (_dir, store) = temp_store();
    store.set_key_override(12, &[40]).unwrap();
    let rx = store.subscribe();

    assert!(store.toggle_override_led(12, 40, &[]).unwrap().is_empty());
    let (_, state, _) = store.snapshot().unwrap();
    assert!(!state.has_override(12));
    assert_eq!(
        rx.try_recv().unwrap(),
        SettingsEvent::OverrideChanged { key: 12, leds: None }
    );
}

#[test]
fn test_snapshot_reports_bad_persisted_entries() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    fs::write(
        &path,
        r#"{ "config": { "strip": { "total_leds": 50 } },
             "calibration": { "end_led": 80, "key_offsets": { "2": "abc" } } }"#,
    )
    .unwrap();

    let store = SettingsStore::open(&path).unwrap();
    let (config, state, report) = store.snapshot().unwrap();
    assert_eq!(config.strip.total_leds, 50);
    assert_eq!(state.end_led, 49);
    assert_eq!(report.warnings.len(), 2);
}

#[test]
fn test_unreadable_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    fs::write(&path, "{ not json").unwrap();
    assert!(matches!(
        SettingsStore::open(&path),
        Err(KeylightError::Json(_))
    ));
}

// --- API ---

#[test]
fn test_api_requires_loaded_settings() {
    let state = KeylightState::default();
    assert!(api::query_mapping(&state).is_err());
}

#[test]
fn test_api_query_and_mutate() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    let state = KeylightState::default();
    api::load_settings(&state, path.to_str().unwrap()).unwrap();

    let before = api::query_mapping(&state).unwrap();
    assert_eq!(before.total_led_count, 200);
    assert_eq!(before.mapping.len(), 88);
    assert_eq!(before.mapping, before.base);

    let key_leds = before.mapping[&39].clone();
    api::set_key_offset(&state, 39, 1).unwrap();
    let after = api::query_mapping(&state).unwrap();
    let shifted: Vec<usize> = key_leds.iter().map(|l| l + 1).collect();
    assert_eq!(after.mapping[&39], shifted);
    assert_eq!(after.diagnostics.conflicts_resolved, 1);

    let toggled = api::toggle_key_led(&state, 0, 150).unwrap();
    assert_eq!(toggled.last(), Some(&150));
    assert_eq!(api::query_mapping(&state).unwrap().mapping[&0], toggled);

    let pitch = api::calibrate_led_pitch(&state, 700.0, 0, 100).unwrap();
    assert_eq!(pitch, 7.0);
    assert_eq!(api::get_config(&state).unwrap().strip.calibrated_pitch_mm, Some(7.0));

    let json = serde_json::to_value(api::query_mapping(&state).unwrap()).unwrap();
    assert!(json.get("totalLedCount").is_some());
    assert_eq!(json["pitch"]["source"], "calibrated");
}

#[test]
fn test_api_update_config_validates() {
    let dir = tempfile::tempdir().unwrap();
    let state = KeylightState::default();
    api::load_settings(&state, dir.path().join("s.json").to_str().unwrap()).unwrap();

    let mut config = api::get_config(&state).unwrap();
    config.strip.total_leds = 150;
    api::update_config(&state, config).unwrap();
    assert_eq!(api::query_mapping(&state).unwrap().total_led_count, 150);

    let mut bad = api::get_config(&state).unwrap();
    bad.keyboard.black_key_width_mm = -1.0;
    assert!(api::update_config(&state, bad).is_err());
    assert_eq!(api::get_config(&state).unwrap().strip.total_leds, 150);
}
