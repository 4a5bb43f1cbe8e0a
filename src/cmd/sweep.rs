use crate::reports;
use clap::Args;
use keylight::calibration::CalibrationState;
use keylight::config::Config;
use keylight::sweep::{recommend_threshold, sweep_thresholds, threshold_steps};
use keylight::KlResult;

#[derive(Args, Debug, Clone)]
pub struct SweepArgs {
    #[command(flatten)]
    pub config: Config,

    #[arg(long, default_value_t = 0.0)]
    pub from: f64,

    #[arg(long, default_value_t = 4.0)]
    pub to: f64,

    #[arg(long, default_value_t = 0.25)]
    pub step: f64,
}

pub fn run(args: &SweepArgs, config: &Config, state: &CalibrationState) -> KlResult<()> {
    let thresholds = threshold_steps(args.from, args.to, args.step)?;
    println!(
        "🔍 Sweeping {} overhang thresholds ({:.2}..{:.2} mm)",
        thresholds.len(),
        args.from,
        args.to
    );

    let points = sweep_thresholds(config, state, &thresholds)?;
    reports::print_sweep_report(&points, recommend_threshold(&points));
    Ok(())
}
