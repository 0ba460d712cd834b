//! Scenario loading and merging of planning parameters.
//!
//! Precedence, highest first: command-line flags and `PLANNER_*` environment
//! variables, the optional TOML scenario file, then the built-in defaults.

use std::{fs, path::Path};

use serde::Deserialize;
use tracing::{debug, instrument};

use crate::{PlannerError, PlannerResult, cli::ParamArgs, inputs::PlanningInputs};

pub const DEFAULT_STEPS_PER_SESSION: u32 = 10;
pub const DEFAULT_SECONDS_PER_STEP: u32 = 30;
pub const DEFAULT_TOKENS_PER_STEP: u32 = 3000;
pub const DEFAULT_SAFETY_BUFFER_PCT: u32 = 20;
pub const DEFAULT_AVAILABLE_PARALLELISM: u32 = 100;
pub const DEFAULT_TARGET_EMAILS_PER_HOUR: u32 = 10_000;

/// Workload assumptions table.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct WorkloadSection {
    pub steps_per_session: Option<u32>,
    pub seconds_per_step: Option<u32>,
    pub tokens_per_step: Option<u32>,
    pub safety_buffer_pct: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CapacitySection {
    pub available_parallelism: Option<u32>,
    pub target_emails_per_hour: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TrafficSection {
    pub spike_scaler: Option<f64>,
    pub seed: Option<u64>,
}

/// Parsed scenario document. Every table and key is optional.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ScenarioFile {
    #[serde(default)]
    pub workload: WorkloadSection,
    #[serde(default)]
    pub capacity: CapacitySection,
    #[serde(default)]
    pub traffic: TrafficSection,
}

impl ScenarioFile {
    pub fn from_toml_str(raw: &str) -> PlannerResult<Self> {
        toml::from_str(raw)
            .map_err(|err| PlannerError::Config(format!("invalid scenario document: {err}")))
    }

    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path) -> PlannerResult<Self> {
        let raw = fs::read_to_string(path).map_err(|err| {
            PlannerError::Io(format!("failed to read scenario {}: {err}", path.display()))
        })?;
        Self::from_toml_str(&raw)
    }
}

/// Validated inputs plus the generator seed, ready for a planning run.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedScenario {
    pub inputs: PlanningInputs,
    pub seed: Option<u64>,
}

/// Loads the scenario file named in `args`, if any, and merges it.
pub fn resolve(args: &ParamArgs) -> PlannerResult<ResolvedScenario> {
    let scenario = match &args.scenario {
        Some(path) => ScenarioFile::load(path)?,
        None => ScenarioFile::default(),
    };
    merge(args, &scenario)
}

/// Applies flag > file > default precedence and validates the result.
pub fn merge(args: &ParamArgs, scenario: &ScenarioFile) -> PlannerResult<ResolvedScenario> {
    let workload = &scenario.workload;
    let capacity = &scenario.capacity;
    let traffic = &scenario.traffic;

    let inputs = PlanningInputs::new(
        args.steps_per_session
            .or(workload.steps_per_session)
            .unwrap_or(DEFAULT_STEPS_PER_SESSION),
        args.seconds_per_step
            .or(workload.seconds_per_step)
            .unwrap_or(DEFAULT_SECONDS_PER_STEP),
        args.tokens_per_step
            .or(workload.tokens_per_step)
            .unwrap_or(DEFAULT_TOKENS_PER_STEP),
        args.safety_buffer_pct
            .or(workload.safety_buffer_pct)
            .unwrap_or(DEFAULT_SAFETY_BUFFER_PCT),
        args.spike_scaler.or(traffic.spike_scaler),
        args.available_parallelism
            .or(capacity.available_parallelism)
            .unwrap_or(DEFAULT_AVAILABLE_PARALLELISM),
        args.target_emails_per_hour
            .or(capacity.target_emails_per_hour)
            .unwrap_or(DEFAULT_TARGET_EMAILS_PER_HOUR),
    )?;
    let seed = args.seed.or(traffic.seed);
    debug!(?inputs, ?seed, "scenario resolved");

    Ok(ResolvedScenario { inputs, seed })
}
