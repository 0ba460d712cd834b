//! Terminal and JSON rendering of planning results.

use comfy_table::{CellAlignment, Table, presets::UTF8_FULL};
use serde::Serialize;

use crate::{
    PlanReport, PlannerError, PlannerResult, TrafficReport,
    capacity::CapacityResult,
    inputs::PlanningInputs,
    sweep::{Spread, SweepSummary},
    traffic::TrafficCurve,
};

pub const CHART_ROWS: usize = 12;

const GLOSSARY: &str = "\
- Parallelism is the number of workflow sessions that can run concurrently.
- Emails/hour is the throughput reachable with the available parallelism.
- Total latency per session is the wall-clock time to process one email.
- RPM assumes one LLM call per step; multiply if a step makes more calls.
- TPM is the aggregate token throughput needed across the API project.
- Safety buffer accounts for variance, retries and short spikes.
";

/// Serialises any result record as pretty JSON.
pub fn render_json<T: Serialize>(value: &T) -> PlannerResult<String> {
    serde_json::to_string_pretty(value).map_err(|err| PlannerError::Render(err.to_string()))
}

/// Full human-readable report for one planning run.
pub fn render_plan(report: &PlanReport) -> String {
    let capacity = &report.capacity;
    let inputs = &report.inputs;
    let mut out = String::new();

    out.push_str("Results\n");
    out.push_str(&metric_table(&[
        (
            "Achievable emails/hour",
            format_float(capacity.achievable_emails_per_hour, 0),
        ),
        (
            "Target emails/hour",
            format_count(u64::from(inputs.target_emails_per_hour)),
        ),
    ]));
    out.push('\n');
    out.push_str(&banner(capacity, inputs));
    out.push('\n');
    out.push_str(&metric_table(&[
        (
            "Required parallelism",
            format_count(capacity.required_parallelism),
        ),
        (
            "Tokens per minute needed",
            format!("{} TPM", format_count(capacity.tokens_per_minute_steady)),
        ),
        (
            "Total latency per session",
            format!("{:.1}s", capacity.total_latency_per_session_seconds as f64),
        ),
    ]));

    out.push_str("\nAPI rate planning\n");
    out.push_str(&metric_table(&[
        ("Steps per minute", format_float(capacity.steps_per_minute, 2)),
        (
            "Requests per minute (1 request/step)",
            format!("{} RPM", format_count(capacity.requests_per_minute)),
        ),
        (
            "Tokens per minute",
            format!("{} TPM", format_count(capacity.tokens_per_minute_steady)),
        ),
    ]));

    out.push_str("\nWhat these numbers mean\n");
    out.push_str(GLOSSARY);

    out.push_str("\nAdditional analysis\n");
    out.push_str(&metric_table(&[
        (
            "Sessions per hour per worker",
            format_float(capacity.sessions_per_hour_per_worker, 2),
        ),
        (
            "Available parallelism",
            format!(
                "{} concurrent workers",
                format_count(u64::from(inputs.available_parallelism))
            ),
        ),
        (
            "Target throughput",
            format!(
                "{} emails/hour",
                format_count(u64::from(inputs.target_emails_per_hour))
            ),
        ),
        ("Safety buffer", format!("{}%", inputs.safety_buffer_pct)),
    ]));

    if let Some(traffic) = &report.traffic {
        out.push_str("\nTraffic pattern\n");
        out.push_str(&traffic_table(traffic));
        out.push('\n');
        out.push_str(&render_chart(&traffic.curve, CHART_ROWS));
    }
    out
}

/// Success or warning line driven by `meets_target`.
pub fn banner(capacity: &CapacityResult, inputs: &PlanningInputs) -> String {
    if capacity.meets_target {
        "✅ You have sufficient parallelism to meet your target!\n".to_string()
    } else {
        format!(
            "⚠️ You need {} concurrent workers to meet your target (you have {})\n",
            format_count(capacity.required_parallelism),
            format_count(u64::from(inputs.available_parallelism)),
        )
    }
}

fn traffic_table(traffic: &TrafficReport) -> String {
    let aggregate = &traffic.aggregate;
    let tpm = &traffic.tpm;
    metric_table(&[
        ("Spike regime", traffic.curve.regime.label().to_string()),
        (
            "Base traffic per minute",
            format_float(traffic.curve.base_traffic_per_minute, 2),
        ),
        ("Average TPM (curve)", format_float(aggregate.average_tpm, 0)),
        ("Peak TPM (curve)", format_float(aggregate.peak_tpm, 0)),
        (
            "Peak to average",
            format!("{:.2}x", aggregate.peak_to_average_ratio),
        ),
        ("Peak RPM (curve)", format_float(aggregate.peak_rpm, 0)),
        ("TPM with buffer", format_float(tpm.tpm_with_buffer, 0)),
        ("TPM with spikes", format_float(tpm.tpm_with_spikes, 0)),
        ("TPM needed", format!("{} TPM", format_count(tpm.tpm_needed))),
    ])
}

/// Human-readable summary of a sweep.
pub fn render_sweep(summary: &SweepSummary) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Metric", "Min", "Mean", "P95", "Max"]);
    table.add_row(spread_row("Peak TPM", &summary.peak_tpm, 0));
    table.add_row(spread_row(
        "Peak to average",
        &summary.peak_to_average_ratio,
        2,
    ));
    for index in 1..5 {
        if let Some(column) = table.column_mut(index) {
            column.set_cell_alignment(CellAlignment::Right);
        }
    }

    format!(
        "Sweep: {} trials from seed {} (spike scaler {:.2}, {} regime)\n{table}\nScalar TPM needed: {} TPM\n",
        summary.trials,
        summary.base_seed,
        summary.spike_scaler,
        summary.regime.label(),
        format_count(summary.tpm.tpm_needed),
    )
}

fn spread_row(label: &str, spread: &Spread, decimals: usize) -> Vec<String> {
    vec![
        label.to_string(),
        format_float(spread.min, decimals),
        format_float(spread.mean, decimals),
        format_float(spread.p95, decimals),
        format_float(spread.max, decimals),
    ]
}

fn metric_table(rows: &[(&str, String)]) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Metric", "Value"]);
    for (label, value) in rows {
        table.add_row(vec![label.to_string(), value.clone()]);
    }
    if let Some(column) = table.column_mut(1) {
        column.set_cell_alignment(CellAlignment::Right);
    }
    format!("{table}\n")
}

/// Plots the per-minute samples (`*`) over the flat base rate (`-`).
///
/// One column per minute; each column holds exactly one `*`.
pub fn render_chart(curve: &TrafficCurve, rows: usize) -> String {
    let rows = rows.max(2);
    let top = curve.peak_emails().max(curve.base_traffic_per_minute);
    let level = |value: f64| -> usize {
        if top <= 0.0 {
            0
        } else {
            ((value / top) * (rows - 1) as f64).round() as usize
        }
    };
    let base_level = level(curve.base_traffic_per_minute);
    let levels: Vec<usize> = curve
        .samples
        .iter()
        .map(|sample| level(sample.emails))
        .collect();

    let mut out = String::from("Emails per minute\n");
    for row in (0..rows).rev() {
        let axis = if row == rows - 1 {
            format_float(top, 1)
        } else if row == base_level {
            format_float(curve.base_traffic_per_minute, 1)
        } else if row == 0 {
            "0".to_string()
        } else {
            String::new()
        };
        out.push_str(&format!("{axis:>10} |"));
        for &sample_level in &levels {
            let glyph = if sample_level == row {
                '*'
            } else if base_level == row {
                '-'
            } else {
                ' '
            };
            out.push(glyph);
        }
        out.push('\n');
    }
    out.push_str(&format!("{:>10} +{}\n", "", "-".repeat(levels.len())));
    out.push_str(&format!(
        "{:>10}  minute 0 .. {}\n",
        "",
        levels.len().saturating_sub(1)
    ));
    out
}

/// Whole number with thousands separators, e.g. `5,000,000`.
pub fn format_count(value: u64) -> String {
    group_thousands(&value.to_string())
}

/// Fixed-point number with thousands separators in the integer part.
pub fn format_float(value: f64, decimals: usize) -> String {
    let formatted = format!("{:.*}", decimals, value.abs());
    let (integer, fraction) = match formatted.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (formatted.as_str(), None),
    };
    let sign = if value < 0.0 && formatted.chars().any(|c| matches!(c, '1'..='9')) {
        "-"
    } else {
        ""
    };
    match fraction {
        Some(fraction) => format!("{sign}{}.{fraction}", group_thousands(integer)),
        None => format!("{sign}{}", group_thousands(integer)),
    }
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_get_separators() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1667), "1,667");
        assert_eq!(format_count(5_000_000), "5,000,000");
    }

    #[test]
    fn floats_keep_requested_precision() {
        assert_eq!(format_float(1666.666_666, 2), "1,666.67");
        assert_eq!(format_float(12.0, 2), "12.00");
        assert_eq!(format_float(999.6, 0), "1,000");
        assert_eq!(format_float(-1234.5, 1), "-1,234.5");
    }
}
