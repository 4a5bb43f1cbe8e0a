use crate::engine::MappingResult;
use crate::notes;
use crate::KlResult;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Serialize)]
struct MappingRow {
    key_index: usize,
    note: String,
    midi_note: Option<u8>,
    is_black: bool,
    led_count: usize,
    first_led: Option<usize>,
    last_led: Option<usize>,
    leds: String,
}

/// Writes one CSV row per key. `leds` is a `;`-separated list in mapping order.
pub fn write_mapping_csv<W: Write>(writer: W, result: &MappingResult) -> KlResult<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for (key, leds) in result.mapping.iter() {
        wtr.serialize(MappingRow {
            key_index: key,
            note: notes::note_name(key),
            midi_note: notes::midi_note(key),
            is_black: notes::is_black(key),
            led_count: leds.len(),
            first_led: leds.first().copied(),
            last_led: leds.last().copied(),
            leds: leds
                .iter()
                .map(|l| l.to_string())
                .collect::<Vec<_>>()
                .join(";"),
        })?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn export_mapping_csv<P: AsRef<Path>>(path: P, result: &MappingResult) -> KlResult<()> {
    let file = File::create(path)?;
    write_mapping_csv(file, result)
}
