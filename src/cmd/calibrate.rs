use crate::cmd::parse_key;
use clap::Args;
use keylight::calibration::KeyTrim;
use keylight::engine::compute_mapping;
use keylight::geometry::{calibrate_pitch, select_pitch};
use keylight::notes;
use keylight::settings::SettingsStore;
use keylight::{KeylightError, KlResult};

#[derive(Args, Debug, Clone)]
pub struct OffsetArgs {
    #[arg(value_parser = parse_key)]
    pub key: usize,

    /// Shift in LED positions; omit together with --clear to remove.
    #[arg(allow_hyphen_values = true)]
    pub value: Option<i32>,

    #[arg(long, default_value_t = false)]
    pub clear: bool,
}

#[derive(Args, Debug, Clone)]
pub struct TrimArgs {
    #[arg(value_parser = parse_key)]
    pub key: usize,

    /// LEDs dropped from the low-index end.
    #[arg(default_value_t = 0)]
    pub left: usize,

    /// LEDs dropped from the high-index end.
    #[arg(default_value_t = 0)]
    pub right: usize,
}

#[derive(Args, Debug, Clone)]
pub struct OverrideArgs {
    #[arg(value_parser = parse_key)]
    pub key: usize,

    /// Exact LED list, e.g. `12,13,14`.
    #[arg(value_delimiter = ',', num_args = 0..)]
    pub leds: Vec<usize>,

    /// Add or remove a single LED instead of replacing the list.
    #[arg(long, conflicts_with = "leds")]
    pub toggle: Option<usize>,

    #[arg(long, default_value_t = false)]
    pub clear: bool,
}

#[derive(Args, Debug, Clone)]
pub struct RangeArgs {
    pub start_led: usize,
    pub end_led: usize,
}

#[derive(Args, Debug, Clone)]
pub struct PitchArgs {
    /// Measured distance between the centres of --first and --last.
    #[arg(long, requires_all = ["first", "last"])]
    pub span_mm: Option<f64>,

    #[arg(long)]
    pub first: Option<usize>,

    #[arg(long)]
    pub last: Option<usize>,

    /// Forget the calibrated pitch and go back to LEDs per metre.
    #[arg(long, default_value_t = false, conflicts_with = "span_mm")]
    pub clear: bool,
}

fn print_key(store: &SettingsStore, key: usize) -> KlResult<()> {
    let (config, state, _) = store.snapshot()?;
    let result = compute_mapping(&config, &state)?;
    let leds = result.mapping.leds(key);
    println!(
        "🎹 Key {} ({}) -> {:?} [base {:?}]",
        key,
        notes::note_name(key),
        leds,
        result.base.leds(key)
    );
    Ok(())
}

pub fn run_offset(args: &OffsetArgs, store: &SettingsStore) -> KlResult<()> {
    match (args.value, args.clear) {
        (_, true) | (Some(0), false) => store.delete_key_offset(args.key)?,
        (Some(v), false) => store.set_key_offset(args.key, v)?,
        (None, false) => {
            let (_, state, _) = store.snapshot()?;
            println!(
                "Key {} offset: {:+}",
                args.key,
                state.net_offset(args.key)
            );
        }
    }
    print_key(store, args.key)
}

pub fn run_trim(args: &TrimArgs, store: &SettingsStore) -> KlResult<()> {
    store.set_key_trim(args.key, KeyTrim::new(args.left, args.right))?;
    print_key(store, args.key)
}

pub fn run_override(args: &OverrideArgs, store: &SettingsStore) -> KlResult<()> {
    if args.clear {
        store.clear_key_override(args.key)?;
    } else if let Some(led) = args.toggle {
        let (config, state, _) = store.snapshot()?;
        let current = compute_mapping(&config, &state)?;
        store.toggle_override_led(args.key, led, current.mapping.leds(args.key))?;
    } else {
        store.set_key_override(args.key, &args.leds)?;
    }
    print_key(store, args.key)
}

pub fn run_range(args: &RangeArgs, store: &SettingsStore) -> KlResult<()> {
    let (config, _, _) = store.snapshot()?;
    let last = config.strip.total_leds.saturating_sub(1);
    if args.start_led.max(args.end_led) > last {
        return Err(KeylightError::Config(format!(
            "LED range {}..{} exceeds the {}-LED strip",
            args.start_led, args.end_led, config.strip.total_leds
        )));
    }
    store.set_led_range(args.start_led, args.end_led)?;
    let (_, state, _) = store.snapshot()?;
    println!("📏 LED range set to {}..={}", state.start_led, state.end_led);
    Ok(())
}

pub fn run_pitch(args: &PitchArgs, store: &SettingsStore) -> KlResult<()> {
    let mut config = store.document()?.config;

    if args.clear {
        config.strip.calibrated_pitch_mm = None;
        store.set_config(config.clone())?;
    } else if let (Some(span), Some(first), Some(last)) = (args.span_mm, args.first, args.last) {
        let pitch = calibrate_pitch(span, first, last).ok_or_else(|| {
            KeylightError::Config(format!(
                "cannot derive a pitch from {} mm between LEDs {} and {}",
                span, first, last
            ))
        })?;
        config.strip.calibrated_pitch_mm = Some(pitch);
        store.set_config(config.clone())?;
    }

    let selection = select_pitch(config.strip.leds_per_meter, config.strip.calibrated_pitch_mm);
    println!(
        "📐 LED pitch: {:.4} mm ({}, nominal {:.4} mm)",
        selection.pitch_mm, selection.source, selection.theoretical_pitch_mm
    );
    Ok(())
}
