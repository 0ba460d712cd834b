use std::error::Error;

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use planner::{
    PlannerResult,
    cli::{self, Commands, OutputFormat, ParamArgs},
    config, report, sweep, traffic,
};

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = cli::parse_args();
    let outcome = match args.command {
        Commands::Plan { params, format } => run_plan(&params, format),
        Commands::Sweep {
            params,
            trials,
            format,
        } => run_sweep(&params, trials, format),
    };

    match outcome {
        Ok(output) => {
            print!("{output}");
            Ok(())
        }
        Err(error) => {
            tracing::error!(error = %error, "planning failed");
            Err(Box::new(error))
        }
    }
}

fn run_plan(params: &ParamArgs, format: OutputFormat) -> PlannerResult<String> {
    let scenario = config::resolve(params)?;
    let mut rng = traffic::seeded_rng(scenario.seed);
    let plan = planner::plan(&scenario.inputs, &mut rng);

    match format {
        OutputFormat::Table => Ok(report::render_plan(&plan)),
        OutputFormat::Json => report::render_json(&plan).map(|json| json + "\n"),
    }
}

fn run_sweep(params: &ParamArgs, trials: u32, format: OutputFormat) -> PlannerResult<String> {
    let scenario = config::resolve(params)?;
    let console = cli::console_with_label(u64::from(trials), "trials")?;
    let summary = sweep::run_sweep(
        &scenario.inputs,
        trials,
        scenario.seed.unwrap_or_default(),
        || cli::progress(&console),
    );
    cli::finish(&console);
    let summary = summary?;

    match format {
        OutputFormat::Table => Ok(report::render_sweep(&summary)),
        OutputFormat::Json => report::render_json(&summary).map(|json| json + "\n"),
    }
}
