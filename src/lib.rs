//! Capacity planning for multi-step LLM workflows.
//!
//! The crate turns workload assumptions (steps per session, seconds and tokens
//! per step), available concurrency and a target throughput into provisioning
//! figures: required parallelism, requests per minute and tokens per minute,
//! plus a synthetic per-minute traffic curve used to estimate peak demand.

pub mod capacity;
pub mod cli;
pub mod config;
pub mod inputs;
pub mod limits;
pub mod report;
pub mod sweep;
pub mod traffic;

use rand::Rng;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, instrument};

use capacity::CapacityResult;
use inputs::PlanningInputs;
use limits::TpmRequirement;
use traffic::{TrafficAggregate, TrafficCurve};

/// Errors surfaced by the input-collection and presentation layers.
///
/// The calculators themselves are total over validated input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlannerError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("I/O failure: {0}")]
    Io(String),
    #[error("render failure: {0}")]
    Render(String),
}

pub type PlannerResult<T> = Result<T, PlannerError>;

/// Traffic-shaped output, present only when a spike scaler was supplied.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrafficReport {
    pub curve: TrafficCurve,
    pub aggregate: TrafficAggregate,
    pub tpm: TpmRequirement,
}

/// Everything one planning run produces.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanReport {
    pub inputs: PlanningInputs,
    pub capacity: CapacityResult,
    pub traffic: Option<TrafficReport>,
}

/// Runs the calculator and, when a spike scaler is set, the traffic estimator.
///
/// The whole pipeline is recomputed on every call; nothing is cached.
#[instrument(skip_all, fields(target_emails = inputs.target_emails_per_hour))]
pub fn plan<R: Rng + ?Sized>(inputs: &PlanningInputs, rng: &mut R) -> PlanReport {
    let capacity = capacity::compute_capacity(inputs);
    let traffic = inputs.spike_scaler.map(|spike_scaler| {
        let (curve, aggregate) = traffic::estimate_traffic(inputs, spike_scaler, rng);
        let tpm = limits::required_tpm(&capacity, inputs, spike_scaler);
        TrafficReport {
            curve,
            aggregate,
            tpm,
        }
    });
    debug!(
        meets_target = capacity.meets_target,
        shaped = traffic.is_some(),
        "plan computed"
    );

    PlanReport {
        inputs: inputs.clone(),
        capacity,
        traffic,
    }
}
