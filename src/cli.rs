use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};

use crate::{PlannerError, PlannerResult, sweep::MAX_SWEEP_TRIALS};

pub fn parse_args() -> Cli {
    Cli::parse()
}

/// Capacity and API rate-limit planner for multi-step LLM workflows
#[derive(Parser, Debug, Clone)]
#[command(name = "planner")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Compute throughput, required parallelism and rate limits
    Plan {
        #[command(flatten)]
        params: ParamArgs,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Repeat the traffic estimate over consecutive seeds and summarise peaks
    Sweep {
        #[command(flatten)]
        params: ParamArgs,

        /// Number of seeded trials to run
        #[arg(
            long,
            default_value_t = 100,
            env = "PLANNER_TRIALS",
            value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_SWEEP_TRIALS))
        )]
        trials: u32,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
}

/// Planning parameters. Anything left unset falls back to the scenario file,
/// then to the built-in defaults.
#[derive(Args, Debug, Clone, Default, PartialEq)]
pub struct ParamArgs {
    /// TOML scenario file with [workload], [capacity] and [traffic] tables
    #[arg(long, value_name = "PATH", env = "PLANNER_SCENARIO")]
    pub scenario: Option<PathBuf>,

    /// Think-and-act steps per session (default: 10)
    #[arg(long, value_name = "STEPS", env = "PLANNER_STEPS_PER_SESSION")]
    pub steps_per_session: Option<u32>,

    /// Seconds per step (default: 30)
    #[arg(long, value_name = "SECONDS", env = "PLANNER_SECONDS_PER_STEP")]
    pub seconds_per_step: Option<u32>,

    /// Tokens consumed per step (default: 3000)
    #[arg(long, value_name = "TOKENS", env = "PLANNER_TOKENS_PER_STEP")]
    pub tokens_per_step: Option<u32>,

    /// Safety buffer percentage, 0-100 (default: 20)
    #[arg(long, value_name = "PCT", env = "PLANNER_SAFETY_BUFFER_PCT")]
    pub safety_buffer_pct: Option<u32>,

    /// Available concurrent workers (default: 100)
    #[arg(long, value_name = "WORKERS", env = "PLANNER_PARALLELISM")]
    pub available_parallelism: Option<u32>,

    /// Target emails per hour (default: 10000)
    #[arg(long, value_name = "EMAILS", env = "PLANNER_TARGET_PER_HOUR")]
    pub target_emails_per_hour: Option<u32>,

    /// Spike scaler, 1.0-10.0; enables the traffic estimate
    #[arg(long, value_name = "FACTOR", env = "PLANNER_SPIKE_SCALER")]
    pub spike_scaler: Option<f64>,

    /// Seed for the traffic generator (random when unset)
    #[arg(long, value_name = "SEED", env = "PLANNER_SEED")]
    pub seed: Option<u64>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

pub struct Console {
    bar: ProgressBar,
}

pub fn console_with_label(total: u64, label: &str) -> PlannerResult<Console> {
    let bar = ProgressBar::new(total);
    let style = ProgressStyle::with_template("{prefix} [{bar:40.cyan/blue}] {pos}/{len}")
        .map_err(|err| PlannerError::Render(err.to_string()))?
        .progress_chars("##-");
    bar.set_style(style);
    bar.set_prefix(label.to_string());

    Ok(Console { bar })
}

pub fn progress(console: &Console) {
    console.bar.inc(1);
}

pub fn finish(console: &Console) {
    console.bar.finish_and_clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_accepts_overrides() {
        let cli = Cli::try_parse_from([
            "planner",
            "plan",
            "--steps-per-session",
            "4",
            "--spike-scaler",
            "2.5",
            "--format",
            "json",
        ])
        .unwrap();
        let Commands::Plan { params, format } = cli.command else {
            panic!("expected plan command");
        };
        assert_eq!(params.steps_per_session, Some(4));
        assert_eq!(params.spike_scaler, Some(2.5));
        assert_eq!(format, OutputFormat::Json);
    }

    #[test]
    fn sweep_defaults_to_hundred_trials() {
        let cli = Cli::try_parse_from(["planner", "sweep", "--seed", "7"]).unwrap();
        let Commands::Sweep { params, trials, .. } = cli.command else {
            panic!("expected sweep command");
        };
        assert_eq!(trials, 100);
        assert_eq!(params.seed, Some(7));
    }

    #[test]
    fn sweep_trials_are_bounded() {
        assert!(Cli::try_parse_from(["planner", "sweep", "--trials", "0"]).is_err());
        assert!(Cli::try_parse_from(["planner", "sweep", "--trials", "4000000000"]).is_err());
        assert!(Cli::try_parse_from(["planner", "sweep", "--trials", "1000000"]).is_ok());
    }

    #[test]
    fn command_is_required() {
        assert!(Cli::try_parse_from(["planner"]).is_err());
    }
}
