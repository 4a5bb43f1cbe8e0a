use crate::reports;
use clap::Args;
use keylight::api::MappingResponse;
use keylight::calibration::{CalibrationState, NormalizationReport};
use keylight::config::Config;
use keylight::engine::compute_mapping;
use keylight::export::export_mapping_csv;
use keylight::KlResult;
use std::path::PathBuf;

#[derive(Args, Debug, Clone)]
pub struct MapArgs {
    #[command(flatten)]
    pub config: Config,

    /// Print the mapping response as JSON instead of tables.
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Also write one CSV row per key to this path.
    #[arg(long)]
    pub csv: Option<PathBuf>,
}

pub fn run(
    args: &MapArgs,
    config: &Config,
    state: &CalibrationState,
    report: &NormalizationReport,
) -> KlResult<()> {
    let result = compute_mapping(config, state)?;

    if args.json {
        let response =
            MappingResponse::new(config.strip.total_leds, result.clone(), report.warnings.clone());
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        reports::print_mapping_table(&result, state);
        reports::print_diagnostics(&result.diagnostics, &result.pitch);
        reports::print_warnings(&report.warnings);
    }

    if let Some(path) = &args.csv {
        export_mapping_csv(path, &result)?;
        eprintln!("💾 Wrote mapping CSV to {}", path.display());
    }
    Ok(())
}
