//! Throughput and concurrency calculator.

use serde::Serialize;
use tracing::debug;

use crate::inputs::PlanningInputs;

pub const SECONDS_PER_HOUR: f64 = 3600.0;
pub const MINUTES_PER_HOUR: f64 = 60.0;

/// Derived throughput, concurrency and steady-state rate figures.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapacityResult {
    /// Sessions one worker completes per hour, running steps serially.
    pub sessions_per_hour_per_worker: f64,
    pub achievable_emails_per_hour_raw: f64,
    /// Achievable throughput after the safety buffer shrinks it.
    pub achievable_emails_per_hour: f64,
    pub required_parallelism_raw: f64,
    /// Workers to provision for the target, buffer included.
    pub required_parallelism: u64,
    pub sessions_per_minute: f64,
    pub steps_per_minute: f64,
    /// One LLM request per step.
    pub requests_per_minute: u64,
    pub tokens_per_minute_raw: f64,
    pub tokens_per_minute_steady: u64,
    pub total_latency_per_session_seconds: u64,
    pub meets_target: bool,
}

/// Computes capacity figures for the given inputs.
///
/// The buffer divides achievable throughput but multiplies required
/// parallelism. Both formulas are kept as-is even though they are not exact
/// inverses of each other.
pub fn compute_capacity(inputs: &PlanningInputs) -> CapacityResult {
    let steps = f64::from(inputs.steps_per_session);
    let target = f64::from(inputs.target_emails_per_hour);
    let buffer = inputs.buffer_multiplier();

    let session_seconds = u64::from(inputs.steps_per_session) * u64::from(inputs.seconds_per_step);
    let sessions_per_hour_per_worker = SECONDS_PER_HOUR / session_seconds as f64;

    let achievable_emails_per_hour_raw =
        f64::from(inputs.available_parallelism) * sessions_per_hour_per_worker;
    let achievable_emails_per_hour = achievable_emails_per_hour_raw / buffer;

    let required_parallelism_raw = target / sessions_per_hour_per_worker;
    let required_parallelism = ceil_count(required_parallelism_raw * buffer);

    let sessions_per_minute = target / MINUTES_PER_HOUR;
    let steps_per_minute = sessions_per_minute * steps;
    let tokens_per_minute_raw = steps_per_minute * f64::from(inputs.tokens_per_step);

    let result = CapacityResult {
        sessions_per_hour_per_worker,
        achievable_emails_per_hour_raw,
        achievable_emails_per_hour,
        required_parallelism_raw,
        required_parallelism,
        sessions_per_minute,
        steps_per_minute,
        requests_per_minute: ceil_count(steps_per_minute),
        tokens_per_minute_raw,
        tokens_per_minute_steady: ceil_count(tokens_per_minute_raw),
        total_latency_per_session_seconds: session_seconds,
        meets_target: achievable_emails_per_hour >= target,
    };
    debug!(
        sessions_per_hour_per_worker,
        achievable_emails_per_hour,
        required_parallelism,
        "capacity computed"
    );
    result
}

/// Rounds a provisioning figure up so it never under-counts.
pub(crate) fn ceil_count(value: f64) -> u64 {
    value.ceil() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(parallelism: u32, target: u32, buffer: u32) -> PlanningInputs {
        PlanningInputs::new(10, 30, 3000, buffer, None, parallelism, target).unwrap()
    }

    #[test]
    fn one_worker_runs_twelve_sessions_an_hour() {
        let result = compute_capacity(&inputs(1, 12, 0));
        assert_eq!(result.sessions_per_hour_per_worker, 12.0);
        assert_eq!(result.total_latency_per_session_seconds, 300);
    }

    #[test]
    fn unbuffered_requirement_matches_target_exactly() {
        let result = compute_capacity(&inputs(10, 120, 0));
        assert_eq!(result.required_parallelism, 10);
        assert!(result.meets_target);
    }

    #[test]
    fn fractional_requirement_rounds_up() {
        let result = compute_capacity(&inputs(1, 13, 0));
        assert_eq!(result.required_parallelism, 2);
        assert!(!result.meets_target);
    }

    #[test]
    fn ceil_count_keeps_whole_numbers() {
        assert_eq!(ceil_count(4.0), 4);
        assert_eq!(ceil_count(4.000_1), 5);
    }
}
