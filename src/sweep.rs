//! Repeated traffic estimates over consecutive seeds.
//!
//! A single curve is one random draw; the sweep shows how far its peak moves
//! between draws so a TPM limit can be picked from a percentile instead.

use serde::Serialize;
use tracing::{debug, instrument};

use crate::{
    PlannerError, PlannerResult,
    capacity,
    inputs::{MIN_SPIKE_SCALER, PlanningInputs},
    limits::{self, TpmRequirement},
    traffic::{self, SpikeRegime},
};

pub const SWEEP_PERCENTILE: f64 = 0.95;
pub const MAX_SWEEP_TRIALS: u32 = 1_000_000;

/// Min, mean, 95th percentile and max of one metric across trials.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Spread {
    pub min: f64,
    pub mean: f64,
    pub p95: f64,
    pub max: f64,
}

impl Spread {
    /// Nearest-rank summary; `values` must not be empty.
    fn from_values(mut values: Vec<f64>) -> Self {
        values.sort_by(f64::total_cmp);
        let count = values.len();
        let rank = ((SWEEP_PERCENTILE * count as f64).ceil() as usize).clamp(1, count);
        Self {
            min: values[0],
            mean: values.iter().sum::<f64>() / count as f64,
            p95: values[rank - 1],
            max: values[count - 1],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepSummary {
    pub trials: u32,
    pub base_seed: u64,
    pub spike_scaler: f64,
    pub regime: SpikeRegime,
    pub peak_tpm: Spread,
    pub peak_to_average_ratio: Spread,
    /// Scalar estimate for the same inputs, for comparison with the spread.
    pub tpm: TpmRequirement,
}

/// Runs `trials` estimates seeded `base_seed`, `base_seed + 1`, ...
///
/// Falls back to the lowest spike scaler when the inputs carry none.
/// `on_trial` fires once per completed trial.
#[instrument(skip_all, fields(trials = trials, base_seed = base_seed))]
pub fn run_sweep<F: FnMut()>(
    inputs: &PlanningInputs,
    trials: u32,
    base_seed: u64,
    mut on_trial: F,
) -> PlannerResult<SweepSummary> {
    if !(1..=MAX_SWEEP_TRIALS).contains(&trials) {
        return Err(PlannerError::InvalidInput(format!(
            "trials {trials} outside 1..={MAX_SWEEP_TRIALS}"
        )));
    }
    let spike_scaler = inputs.spike_scaler.unwrap_or(MIN_SPIKE_SCALER);

    let mut peaks = Vec::with_capacity(trials as usize);
    let mut ratios = Vec::with_capacity(trials as usize);
    for trial in 0..trials {
        let mut rng = traffic::seeded_rng(Some(base_seed.wrapping_add(u64::from(trial))));
        let (_, aggregate) = traffic::estimate_traffic(inputs, spike_scaler, &mut rng);
        peaks.push(aggregate.peak_tpm);
        ratios.push(aggregate.peak_to_average_ratio);
        on_trial();
    }

    let capacity = capacity::compute_capacity(inputs);
    let summary = SweepSummary {
        trials,
        base_seed,
        spike_scaler,
        regime: SpikeRegime::from_scaler(spike_scaler),
        peak_tpm: Spread::from_values(peaks),
        peak_to_average_ratio: Spread::from_values(ratios),
        tpm: limits::required_tpm(&capacity, inputs, spike_scaler),
    };
    debug!(p95_peak_tpm = summary.peak_tpm.p95, "sweep finished");
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spread_uses_nearest_rank() {
        let spread = Spread::from_values((1..=20).map(f64::from).rev().collect());
        assert_eq!(spread.min, 1.0);
        assert_eq!(spread.max, 20.0);
        assert_eq!(spread.p95, 19.0);
        assert_eq!(spread.mean, 10.5);
    }

    #[test]
    fn single_value_spread_is_flat() {
        let spread = Spread::from_values(vec![3.0]);
        assert_eq!(spread.min, 3.0);
        assert_eq!(spread.p95, 3.0);
        assert_eq!(spread.max, 3.0);
    }
}
