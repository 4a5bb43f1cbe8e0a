use keylight::config::{KeyboardDimensions, StripParams};
use keylight::consts::{FALLBACK_LED_PITCH_MM, KEY_COUNT, WHITE_KEY_COUNT};
use keylight::geometry::{
    calibrate_pitch, select_pitch, BlackKeyPlacement, KeyGeometry, KeyboardLayout, LedStrip,
    PitchSource,
};
use keylight::notes;
use keylight::KeylightError;
use rstest::rstest;

fn default_layout() -> KeyboardLayout {
    KeyboardLayout::build(&KeyboardDimensions::default()).unwrap()
}

// --- KEYS ---

#[test]
fn test_layout_has_88_ordered_keys() {
    let layout = default_layout();
    let keys = layout.keys();
    assert_eq!(keys.len(), KEY_COUNT);
    assert_eq!(keys.iter().filter(|k| !k.is_black).count(), WHITE_KEY_COUNT);

    for pair in keys.windows(2) {
        assert!(pair[0].right_edge_mm <= pair[1].left_edge_mm);
        assert!(pair[0].left_edge_mm < pair[1].left_edge_mm);
    }
    for (i, k) in keys.iter().enumerate() {
        assert_eq!(k.key_index, i);
        assert_eq!(k.is_black, notes::is_black(i));
        assert!(k.width_mm() > 0.0);
    }
}

#[test]
fn test_keyboard_width_matches_white_keys() {
    let layout = default_layout();
    // 52 white keys of 23.5 mm separated by 51 gaps of 1 mm.
    let expected = 52.0 * 23.5 + 51.0 * 1.0;
    assert!((layout.width_mm() - expected).abs() < 1e-9);
    assert_eq!(layout.left_edge_mm(), 0.0);
}

#[test]
fn test_black_keys_keep_full_width() {
    let layout = default_layout();
    for k in layout.keys().iter().filter(|k| k.is_black) {
        assert!((k.width_mm() - 13.7).abs() < 1e-9, "key {}", k.key_index);
    }
}

// C#4 (40) and F#4 (45) move left, D#4 (42) and A#4 (49) move right, G#4 (47) stays.
#[rstest]
#[case(40, -0.15)]
#[case(42, 0.15)]
#[case(45, -0.20)]
#[case(47, 0.0)]
#[case(49, 0.20)]
fn test_staggered_shift(#[case] key: usize, #[case] fraction: f64) {
    let staggered = default_layout();
    let centered = KeyboardLayout::build(&KeyboardDimensions {
        black_key_placement: BlackKeyPlacement::Centered,
        ..Default::default()
    })
    .unwrap();

    let shift = staggered.key(key).unwrap().center_mm() - centered.key(key).unwrap().center_mm();
    assert!((shift - fraction * 13.7).abs() < 1e-9, "shift {}", shift);
}

#[test]
fn test_centered_black_key_sits_on_gap() {
    let layout = KeyboardLayout::build(&KeyboardDimensions {
        black_key_placement: BlackKeyPlacement::Centered,
        ..Default::default()
    })
    .unwrap();
    // A#0 between A0 (0..23.5) and B0 (24.5..48).
    assert!((layout.key(1).unwrap().center_mm() - 24.0).abs() < 1e-9);
}

#[rstest]
#[case(0.0, 13.7, 1.0)]
#[case(23.5, -1.0, 1.0)]
#[case(23.5, 13.7, -0.5)]
#[case(f64::NAN, 13.7, 1.0)]
#[case(23.5, f64::INFINITY, 1.0)]
fn test_invalid_dimensions(#[case] ww: f64, #[case] bw: f64, #[case] gap: f64) {
    let dims = KeyboardDimensions {
        white_key_width_mm: ww,
        black_key_width_mm: bw,
        white_key_gap_mm: gap,
        ..Default::default()
    };
    assert!(matches!(
        KeyboardLayout::build(&dims),
        Err(KeylightError::InvalidGeometry(_))
    ));
}

#[test]
fn test_black_key_wider_than_white_pitch_is_rejected() {
    let dims = KeyboardDimensions {
        black_key_width_mm: 40.0,
        ..Default::default()
    };
    assert!(KeyboardLayout::build(&dims).is_err());
}

#[test]
fn test_from_keys_rejects_overlap() {
    let keys = vec![
        KeyGeometry::new(0, false, 0.0, 10.0),
        KeyGeometry::new(1, true, 9.0, 20.0),
    ];
    assert!(matches!(
        KeyboardLayout::from_keys(keys),
        Err(KeylightError::InvalidGeometry(_))
    ));
}

#[test]
fn test_from_keys_rejects_unknown_key() {
    let keys = vec![KeyGeometry::new(88, false, 0.0, 10.0)];
    assert!(matches!(
        KeyboardLayout::from_keys(keys),
        Err(KeylightError::InvalidKey(_))
    ));
}

// --- LEDS ---

#[rstest]
#[case(144.0, None, 1000.0 / 144.0, PitchSource::LedsPerMeter)]
#[case(144.0, Some(7.1), 7.1, PitchSource::Calibrated)]
#[case(0.0, Some(7.1), 7.1, PitchSource::Calibrated)]
#[case(144.0, Some(-1.0), 1000.0 / 144.0, PitchSource::LedsPerMeter)]
#[case(0.0, None, FALLBACK_LED_PITCH_MM, PitchSource::Fallback)]
#[case(f64::NAN, Some(0.0), FALLBACK_LED_PITCH_MM, PitchSource::Fallback)]
fn test_pitch_precedence(
    #[case] lpm: f64,
    #[case] calibrated: Option<f64>,
    #[case] expected: f64,
    #[case] source: PitchSource,
) {
    let sel = select_pitch(lpm, calibrated);
    assert!((sel.pitch_mm - expected).abs() < 1e-12);
    assert_eq!(sel.source, source);
    assert_eq!(sel.was_adjusted, source == PitchSource::Calibrated);
}

#[test]
fn test_calibrate_pitch_from_span() {
    assert_eq!(calibrate_pitch(700.0, 0, 100), Some(7.0));
    assert_eq!(calibrate_pitch(700.0, 100, 100), None);
    assert_eq!(calibrate_pitch(-1.0, 0, 100), None);
}

#[test]
fn test_led_centres_follow_pitch_and_offset() {
    let params = StripParams {
        total_leds: 100,
        leds_per_meter: 100.0,
        led_physical_width_mm: 4.0,
        calibrated_pitch_mm: None,
        strip_offset_mm: 5.0,
    };
    let strip = LedStrip::new(&params, 0).unwrap();
    assert!((strip.center_mm(0) - 7.0).abs() < 1e-9);
    assert!((strip.center_mm(10) - 107.0).abs() < 1e-9);

    let p = strip.placement(10).unwrap();
    assert!((p.left_mm() - 105.0).abs() < 1e-9);
    assert!((p.right_mm() - 109.0).abs() < 1e-9);
    assert!(strip.placement(100).is_none());
}

#[test]
fn test_strip_rejects_zero_width_leds() {
    let params = StripParams {
        led_physical_width_mm: 0.0,
        ..Default::default()
    };
    assert!(LedStrip::new(&params, 0).is_err());
}
