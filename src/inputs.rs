//! Validated planning parameters.

use serde::Serialize;

use crate::{PlannerError, PlannerResult};

pub const MAX_SAFETY_BUFFER_PCT: u32 = 100;
pub const MIN_SPIKE_SCALER: f64 = 1.0;
pub const MAX_SPIKE_SCALER: f64 = 10.0;

/// Provisioning counts are `u64`; anything at or above 2^64 would saturate.
const MAX_PROVISIONED_COUNT: f64 = u64::MAX as f64;

/// Workload and capacity assumptions for one planning run.
///
/// Construct through [`PlanningInputs::new`] so every bound is checked once at
/// the edge; the calculators assume valid values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanningInputs {
    pub steps_per_session: u32,
    pub seconds_per_step: u32,
    pub tokens_per_step: u32,
    pub safety_buffer_pct: u32,
    pub spike_scaler: Option<f64>,
    pub available_parallelism: u32,
    pub target_emails_per_hour: u32,
}

impl PlanningInputs {
    pub fn new(
        steps_per_session: u32,
        seconds_per_step: u32,
        tokens_per_step: u32,
        safety_buffer_pct: u32,
        spike_scaler: Option<f64>,
        available_parallelism: u32,
        target_emails_per_hour: u32,
    ) -> PlannerResult<Self> {
        let inputs = Self {
            steps_per_session,
            seconds_per_step,
            tokens_per_step,
            safety_buffer_pct,
            spike_scaler,
            available_parallelism,
            target_emails_per_hour,
        };
        inputs.validate()?;
        Ok(inputs)
    }

    /// Checks every field against its documented range.
    pub fn validate(&self) -> PlannerResult<()> {
        require_positive("steps_per_session", self.steps_per_session)?;
        require_positive("seconds_per_step", self.seconds_per_step)?;
        require_positive("tokens_per_step", self.tokens_per_step)?;
        require_positive("available_parallelism", self.available_parallelism)?;
        require_positive("target_emails_per_hour", self.target_emails_per_hour)?;
        if self.safety_buffer_pct > MAX_SAFETY_BUFFER_PCT {
            return Err(PlannerError::InvalidInput(format!(
                "safety_buffer_pct {} outside 0..={}",
                self.safety_buffer_pct, MAX_SAFETY_BUFFER_PCT
            )));
        }
        if let Some(spike_scaler) = self.spike_scaler {
            if !(MIN_SPIKE_SCALER..=MAX_SPIKE_SCALER).contains(&spike_scaler) {
                return Err(PlannerError::InvalidInput(format!(
                    "spike_scaler {spike_scaler} outside {MIN_SPIKE_SCALER}..={MAX_SPIKE_SCALER}"
                )));
            }
        }
        self.check_provisioning_range()
    }

    /// Rejects inputs whose rounded-up provisioning figures would not fit in
    /// a `u64`; a saturated count would under-state the requirement.
    fn check_provisioning_range(&self) -> PlannerResult<()> {
        let target = f64::from(self.target_emails_per_hour);
        let steps = f64::from(self.steps_per_session);
        let buffer = self.buffer_multiplier();
        let spike_scaler = self.spike_scaler.unwrap_or(MIN_SPIKE_SCALER);

        let tokens_per_minute = target / 60.0 * steps * f64::from(self.tokens_per_step);
        let parallelism = target * steps * f64::from(self.seconds_per_step) / 3600.0 * buffer;
        let figures = [
            ("tokens per minute", tokens_per_minute * buffer * spike_scaler),
            ("required parallelism", parallelism),
        ];
        for (figure, value) in figures {
            if value >= MAX_PROVISIONED_COUNT {
                return Err(PlannerError::InvalidInput(format!(
                    "{figure} {value:e} exceeds the largest representable count"
                )));
            }
        }
        Ok(())
    }

    /// Multiplier `1 + buffer/100` shared by the capacity and TPM formulas.
    pub fn buffer_multiplier(&self) -> f64 {
        1.0 + f64::from(self.safety_buffer_pct) / 100.0
    }
}

fn require_positive(field: &str, value: u32) -> PlannerResult<()> {
    if value == 0 {
        return Err(PlannerError::InvalidInput(format!(
            "{field} must be at least 1"
        )));
    }
    Ok(())
}
