use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser, Subcommand};
use keylight::calibration::{CalibrationState, NormalizationReport};
use keylight::config::Config;
use keylight::consts::DEFAULT_SETTINGS_PATH;
use keylight::settings::SettingsStore;
use keylight::KlResult;
use std::process;
use tracing::Level;

mod cmd;
mod reports;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(global = true, short, long, default_value = DEFAULT_SETTINGS_PATH)]
    settings: String,

    #[arg(global = true, long, default_value_t = false)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compute and display the key -> LED mapping.
    Map(cmd::map::MapArgs),
    /// Compare mapping quality across overhang thresholds.
    Sweep(cmd::sweep::SweepArgs),
    /// Shift a key's LEDs by whole positions.
    Offset(cmd::calibrate::OffsetArgs),
    /// Drop LEDs from either end of a key.
    Trim(cmd::calibrate::TrimArgs),
    /// Pin a key to an exact LED list.
    Override(cmd::calibrate::OverrideArgs),
    /// Restrict the usable LED range.
    Range(cmd::calibrate::RangeArgs),
    /// Show or calibrate the LED pitch.
    Pitch(cmd::calibrate::PitchArgs),
}

fn main() {
    // 1. Parse raw matches (to distinguish user input from defaults)
    let matches = Cli::command().get_matches();
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_max_level(if cli.debug { Level::DEBUG } else { Level::WARN })
        .init();

    // 2. Load settings
    let store = SettingsStore::open(&cli.settings).unwrap_or_else(|e| {
        eprintln!("❌ Cannot load settings '{}': {}", cli.settings, e);
        process::exit(1);
    });

    // 3. Execute
    let outcome = match &cli.command {
        Commands::Map(args) => {
            let sub_matches = matches.subcommand_matches("map");
            resolve(&store, &args.config, sub_matches)
                .and_then(|(config, state, report)| cmd::map::run(args, &config, &state, &report))
        }
        Commands::Sweep(args) => {
            let sub_matches = matches.subcommand_matches("sweep");
            resolve(&store, &args.config, sub_matches)
                .and_then(|(config, state, _)| cmd::sweep::run(args, &config, &state))
        }
        Commands::Offset(args) => cmd::calibrate::run_offset(args, &store),
        Commands::Trim(args) => cmd::calibrate::run_trim(args, &store),
        Commands::Override(args) => cmd::calibrate::run_override(args, &store),
        Commands::Range(args) => cmd::calibrate::run_range(args, &store),
        Commands::Pitch(args) => cmd::calibrate::run_pitch(args, &store),
    };

    if let Err(e) = outcome {
        eprintln!("\n❌ {}", e);
        process::exit(1);
    }
}

/// Settings-file configuration with explicit command-line arguments layered on top.
fn resolve(
    store: &SettingsStore,
    cli_config: &Config,
    sub_matches: Option<&ArgMatches>,
) -> KlResult<(Config, CalibrationState, NormalizationReport)> {
    let doc = store.document()?;
    let mut config = doc.config;
    if let Some(m) = sub_matches {
        config.merge_from_cli(cli_config, m);
    }
    let (state, report) = doc.calibration.normalize(config.strip.total_leds);
    Ok((config, state, report))
}
