use comfy_table::presets::ASCII_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use keylight::calibration::CalibrationState;
use keylight::consts::KEY_COUNT;
use keylight::engine::{MappingDiagnostics, MappingResult};
use keylight::geometry::{PitchSelection, PitchSource};
use keylight::notes;
use keylight::sweep::SweepPoint;

fn format_leds(leds: &[usize]) -> String {
    if leds.is_empty() {
        return "-".to_string();
    }
    leds.iter()
        .map(|l| l.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

pub fn print_mapping_table(result: &MappingResult, state: &CalibrationState) {
    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.add_row(vec![
        Cell::new("Key").add_attribute(Attribute::Bold),
        Cell::new("Note").add_attribute(Attribute::Bold),
        Cell::new("Base"),
        Cell::new("Offset"),
        Cell::new("Trim"),
        Cell::new("LEDs").fg(Color::Cyan),
        Cell::new("#"),
    ]);

    for i in [0, 3, 6] {
        if let Some(col) = table.column_mut(i) {
            col.set_cell_alignment(CellAlignment::Right);
        }
    }

    for key in 0..KEY_COUNT {
        let leds = result.mapping.leds(key);
        let trim = state.key_led_trims[key];
        let offset = state.net_offset(key);

        let leds_cell = if state.has_override(key) {
            Cell::new(format!("{} (override)", format_leds(leds))).fg(Color::Yellow)
        } else if leds.is_empty() {
            Cell::new(format_leds(leds)).fg(Color::Red)
        } else {
            Cell::new(format_leds(leds))
        };

        let note = notes::note_name(key);
        let note_cell = if notes::is_black(key) {
            Cell::new(note).add_attribute(Attribute::Italic)
        } else {
            Cell::new(note)
        };

        table.add_row(vec![
            Cell::new(key),
            note_cell,
            Cell::new(format_leds(result.base.leds(key))),
            Cell::new(if offset == 0 {
                String::new()
            } else {
                format!("{:+}", offset)
            }),
            Cell::new(if trim.is_zero() {
                String::new()
            } else {
                format!("{}/{}", trim.left, trim.right)
            }),
            leds_cell,
            Cell::new(leds.len()),
        ]);
    }
    println!("\n{}", table);
}

pub fn print_diagnostics(d: &MappingDiagnostics, pitch: &PitchSelection) {
    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    let pitch_note = match pitch.source {
        PitchSource::Calibrated => format!(
            "{:.3} mm (calibrated, nominal {:.3})",
            pitch.pitch_mm, pitch.theoretical_pitch_mm
        ),
        PitchSource::LedsPerMeter => format!("{:.3} mm (from LEDs per metre)", pitch.pitch_mm),
        PitchSource::Fallback => format!("{:.3} mm (fallback)", pitch.pitch_mm),
    };

    let coverage_cell = if d.unmapped_key_count == 0 {
        Cell::new(format!("{}/{}", d.mapped_key_count, KEY_COUNT)).fg(Color::Green)
    } else {
        Cell::new(format!(
            "{}/{} (missing: {})",
            d.mapped_key_count,
            KEY_COUNT,
            format_leds(&d.unmapped_keys)
        ))
        .fg(Color::Red)
    };

    let rows: Vec<(&str, Cell)> = vec![
        ("LED pitch", Cell::new(pitch_note)),
        ("Keys mapped", coverage_cell),
        (
            "LEDs assigned",
            Cell::new(format!("{}/{}", d.assigned_led_count, d.total_led_count)),
        ),
        (
            "LEDs per key",
            Cell::new(format!(
                "avg {:.2}  min {}  max {}  sd {:.2}",
                d.avg_leds_per_key, d.min_leds_per_key, d.max_leds_per_key, d.std_dev_leds_per_key
            )),
        ),
        (
            "Contiguous neighbours",
            Cell::new(d.consecutive_coverage_count),
        ),
        (
            "Orphaned / uncovered LEDs",
            Cell::new(format!("{} / {}", d.orphaned_led_count, d.uncovered_led_count)),
        ),
        (
            "Rescued (prev / next)",
            Cell::new(format!("{} / {}", d.rescued_from_previous, d.rescued_from_next)),
        ),
        (
            "Dropped out of range",
            Cell::new(d.dropped_out_of_range),
        ),
        ("Conflicts resolved", Cell::new(d.conflicts_resolved)),
        ("Trims rejected", Cell::new(d.rejected_trims)),
        (
            "Overrides (applied / dropped / overlaps)",
            Cell::new(format!(
                "{} / {} / {}",
                d.overrides_applied, d.override_leds_dropped, d.override_overlaps
            )),
        ),
    ];

    for (label, cell) in rows {
        table.add_row(vec![Cell::new(label).add_attribute(Attribute::Bold), cell]);
    }
    println!("\n{}", table);
}

pub fn print_warnings(warnings: &[String]) {
    if warnings.is_empty() {
        return;
    }
    println!("\n⚠️  Ignored calibration entries ({}):", warnings.len());
    for w in warnings {
        println!("   - {}", w);
    }
}

pub fn print_sweep_report(points: &[SweepPoint], recommended: Option<&SweepPoint>) {
    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.add_row(vec![
        Cell::new("Threshold (mm)").add_attribute(Attribute::Bold),
        Cell::new("Keys").fg(Color::Cyan),
        Cell::new("Orphans"),
        Cell::new("Rescued"),
        Cell::new("Avg LEDs"),
        Cell::new("SD"),
    ]);

    for i in 0..=5 {
        if let Some(col) = table.column_mut(i) {
            col.set_cell_alignment(CellAlignment::Right);
        }
    }

    for p in points {
        let is_best = recommended.is_some_and(|r| r.threshold_mm == p.threshold_mm);
        let threshold = Cell::new(format!("{:.2}", p.threshold_mm));
        let threshold = if is_best {
            threshold.fg(Color::Green).add_attribute(Attribute::Bold)
        } else {
            threshold
        };
        let keys = Cell::new(format!("{}/{}", p.mapped_keys, KEY_COUNT));
        let keys = if p.mapped_keys == KEY_COUNT {
            keys.fg(Color::Green)
        } else {
            keys.fg(Color::Red)
        };

        table.add_row(vec![
            threshold,
            keys,
            Cell::new(p.orphaned_leds),
            Cell::new(p.rescued_leds),
            Cell::new(format!("{:.2}", p.avg_leds_per_key)),
            Cell::new(format!("{:.2}", p.std_dev_leds_per_key)),
        ]);
    }
    println!("\n{}", table);

    if let Some(best) = recommended {
        println!(
            "\n🏆 Recommended overhang threshold: {:.2} mm ({} keys, {} rescued LEDs)",
            best.threshold_mm, best.mapped_keys, best.rescued_leds
        );
    }
}
