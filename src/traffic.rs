//! Synthetic per-minute traffic shaping and peak TPM estimation.
//!
//! One hour of load is modelled as a sinusoid plus Gaussian noise around the
//! flat base rate, scaled by the spike scaler and then normalised so that the
//! hour never carries more volume than the target. Spikier settings move
//! volume between minutes instead of adding to it.

use std::f64::consts::TAU;

use rand::{Rng, SeedableRng, rngs::StdRng};
use rand_distr::StandardNormal;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::capacity::MINUTES_PER_HOUR;
use crate::inputs::PlanningInputs;

pub const MINUTES_PER_CURVE: u32 = 60;

/// No minute may drop below this share of the base rate before normalisation.
pub const MIN_TRAFFIC_SHARE: f64 = 0.1;

pub const LOW_SPIKE_CEILING: f64 = 1.5;
pub const MEDIUM_SPIKE_CEILING: f64 = 3.0;

/// Spike-shape tier selected from the spike scaler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SpikeRegime {
    Low,
    Medium,
    High,
}

impl SpikeRegime {
    /// Tier upper bounds are inclusive: 1.5 is low, 3.0 is medium.
    pub fn from_scaler(spike_scaler: f64) -> Self {
        if spike_scaler <= LOW_SPIKE_CEILING {
            Self::Low
        } else if spike_scaler <= MEDIUM_SPIKE_CEILING {
            Self::Medium
        } else {
            Self::High
        }
    }

    /// Sinusoid period in minutes.
    pub fn period_minutes(self) -> f64 {
        match self {
            Self::Low => 30.0,
            Self::Medium => 20.0,
            Self::High => 15.0,
        }
    }

    /// Sinusoid amplitude relative to the base rate.
    pub fn amplitude(self) -> f64 {
        match self {
            Self::Low => 0.2,
            Self::Medium => 0.5,
            Self::High => 0.8,
        }
    }

    /// Standard deviation of the additive noise term.
    pub fn noise_std_dev(self) -> f64 {
        match self {
            Self::Low => 0.1,
            Self::Medium => 0.2,
            Self::High => 0.3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// Multiplicative shape factor for one minute.
    fn shape_factor<R: Rng + ?Sized>(self, minute: u32, rng: &mut R) -> f64 {
        let phase = TAU * f64::from(minute) / self.period_minutes();
        let noise: f64 = rng.sample(StandardNormal);
        1.0 + self.amplitude() * phase.sin() + self.noise_std_dev() * noise
    }
}

/// Emails arriving during one minute of the hour.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrafficSample {
    pub minute: u32,
    pub emails: f64,
}

/// One hour of synthetic load.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrafficCurve {
    pub regime: SpikeRegime,
    pub base_traffic_per_minute: f64,
    /// Uniform factor applied to fit the target volume; 1.0 if untouched.
    pub normalization_factor: f64,
    pub samples: Vec<TrafficSample>,
}

impl TrafficCurve {
    pub fn total_emails(&self) -> f64 {
        self.samples.iter().map(|sample| sample.emails).sum()
    }

    pub fn peak_emails(&self) -> f64 {
        self.samples
            .iter()
            .map(|sample| sample.emails)
            .fold(0.0, f64::max)
    }
}

/// Token demand derived from a traffic curve.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrafficAggregate {
    pub average_tpm: f64,
    pub peak_tpm: f64,
    pub peak_to_average_ratio: f64,
    /// Busiest minute's step count, one request per step.
    pub peak_rpm: f64,
}

/// Generator for the noise term: seeded when reproducibility matters.
pub fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

/// Builds the traffic curve for `spike_scaler` and aggregates its token demand.
///
/// All randomness comes from `rng`; pass a seeded generator for
/// reproducible curves.
#[instrument(skip_all, fields(spike_scaler = spike_scaler))]
pub fn estimate_traffic<R: Rng + ?Sized>(
    inputs: &PlanningInputs,
    spike_scaler: f64,
    rng: &mut R,
) -> (TrafficCurve, TrafficAggregate) {
    let curve = shape_curve(inputs, spike_scaler, rng);
    let aggregate = aggregate_curve(&curve, inputs);
    debug!(
        regime = curve.regime.label(),
        normalization_factor = curve.normalization_factor,
        average_tpm = aggregate.average_tpm,
        peak_tpm = aggregate.peak_tpm,
        "traffic estimated"
    );
    (curve, aggregate)
}

fn shape_curve<R: Rng + ?Sized>(
    inputs: &PlanningInputs,
    spike_scaler: f64,
    rng: &mut R,
) -> TrafficCurve {
    let target = f64::from(inputs.target_emails_per_hour);
    let base_traffic_per_minute = target / MINUTES_PER_HOUR;
    let floor = base_traffic_per_minute * MIN_TRAFFIC_SHARE;
    let regime = SpikeRegime::from_scaler(spike_scaler);

    let raw: Vec<f64> = (0..MINUTES_PER_CURVE)
        .map(|minute| {
            let shaped = base_traffic_per_minute * regime.shape_factor(minute, rng) * spike_scaler;
            shaped.max(floor)
        })
        .collect();

    let (traffic, normalization_factor) = normalize(raw, target);
    let samples = traffic
        .into_iter()
        .zip(0..MINUTES_PER_CURVE)
        .map(|(emails, minute)| TrafficSample { minute, emails })
        .collect();

    TrafficCurve {
        regime,
        base_traffic_per_minute,
        normalization_factor,
        samples,
    }
}

/// Rescales `traffic` so its sum does not exceed `target`.
///
/// The factor is walked down one ulp at a time until the rounded sum fits.
fn normalize(traffic: Vec<f64>, target: f64) -> (Vec<f64>, f64) {
    let total: f64 = traffic.iter().sum();
    if total <= target {
        return (traffic, 1.0);
    }

    let mut factor = target / total;
    loop {
        let scaled: Vec<f64> = traffic.iter().map(|value| value * factor).collect();
        if scaled.iter().sum::<f64>() <= target {
            return (scaled, factor);
        }
        factor = f64::from_bits(factor.to_bits() - 1);
    }
}

fn aggregate_curve(curve: &TrafficCurve, inputs: &PlanningInputs) -> TrafficAggregate {
    let steps = f64::from(inputs.steps_per_session);
    let tokens = f64::from(inputs.tokens_per_step);

    let per_minute_steps: Vec<f64> = curve
        .samples
        .iter()
        .map(|sample| sample.emails * steps)
        .collect();
    let per_minute_tpm: Vec<f64> = per_minute_steps.iter().map(|s| s * tokens).collect();

    let average_tpm = per_minute_tpm.iter().sum::<f64>() / per_minute_tpm.len() as f64;
    let peak_tpm = per_minute_tpm.iter().copied().fold(0.0, f64::max);
    let peak_rpm = per_minute_steps.iter().copied().fold(0.0, f64::max);

    TrafficAggregate {
        average_tpm,
        peak_tpm,
        peak_to_average_ratio: peak_tpm / average_tpm,
        peak_rpm,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regime_boundaries_resolve_downward() {
        assert_eq!(SpikeRegime::from_scaler(1.0), SpikeRegime::Low);
        assert_eq!(SpikeRegime::from_scaler(1.5), SpikeRegime::Low);
        assert_eq!(SpikeRegime::from_scaler(1.51), SpikeRegime::Medium);
        assert_eq!(SpikeRegime::from_scaler(3.0), SpikeRegime::Medium);
        assert_eq!(SpikeRegime::from_scaler(3.01), SpikeRegime::High);
        assert_eq!(SpikeRegime::from_scaler(10.0), SpikeRegime::High);
    }

    #[test]
    fn regimes_get_coarser_as_spikes_rise() {
        let tiers = [SpikeRegime::Low, SpikeRegime::Medium, SpikeRegime::High];
        for pair in tiers.windows(2) {
            assert!(pair[0].period_minutes() > pair[1].period_minutes());
            assert!(pair[0].amplitude() < pair[1].amplitude());
            assert!(pair[0].noise_std_dev() < pair[1].noise_std_dev());
        }
    }

    #[test]
    fn normalize_leaves_small_totals_alone() {
        let (traffic, factor) = normalize(vec![1.0, 2.0, 3.0], 10.0);
        assert_eq!(traffic, vec![1.0, 2.0, 3.0]);
        assert_eq!(factor, 1.0);
    }

    #[test]
    fn normalize_rescales_to_target() {
        let (traffic, factor) = normalize(vec![10.0, 30.0], 20.0);
        assert_eq!(factor, 0.5);
        assert_eq!(traffic, vec![5.0, 15.0]);
    }

    #[test]
    fn normalize_never_rounds_over_target() {
        let traffic: Vec<f64> = (1..=60).map(|i| f64::from(i) / 7.0 + 0.1).collect();
        let (scaled, _) = normalize(traffic, 1.0 / 3.0);
        assert!(scaled.iter().sum::<f64>() <= 1.0 / 3.0);
    }
}
