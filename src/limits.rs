use serde::Serialize;

use crate::capacity::{CapacityResult, ceil_count};
use crate::inputs::PlanningInputs;

/// Scalar TPM provisioning estimate with buffer and spike headroom.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TpmRequirement {
    pub tpm_with_buffer: f64,
    pub tpm_with_spikes: f64,
    pub tpm_needed: u64,
}

/// Compute the TPM limit to request from the API provider.
/// - steady-state TPM x (1 + buffer) x spike scaler
/// - never below the cost of a single step
///
/// Independent of the traffic curve; the two estimates may disagree.
pub fn required_tpm(
    capacity: &CapacityResult,
    inputs: &PlanningInputs,
    spike_scaler: f64,
) -> TpmRequirement {
    let tpm_with_buffer = capacity.tokens_per_minute_raw * inputs.buffer_multiplier();
    let tpm_with_spikes = tpm_with_buffer * spike_scaler;
    let tpm_needed = ceil_count(tpm_with_spikes).max(u64::from(inputs.tokens_per_step));

    TpmRequirement {
        tpm_with_buffer,
        tpm_with_spikes,
        tpm_needed,
    }
}
