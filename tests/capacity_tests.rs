use planner::{capacity::compute_capacity, inputs::PlanningInputs};

fn baseline() -> PlanningInputs {
    PlanningInputs::new(10, 30, 3000, 20, None, 100, 10_000).expect("valid baseline")
}

#[test]
fn baseline_scenario_matches_worked_example() {
    let result = compute_capacity(&baseline());
    assert_eq!(result.sessions_per_hour_per_worker, 12.0);
    assert_eq!(result.achievable_emails_per_hour_raw, 1200.0);
    assert_eq!(result.achievable_emails_per_hour, 1000.0);
    assert!(!result.meets_target);
    assert_eq!(result.required_parallelism, 1000);
    assert_eq!(result.requests_per_minute, 1667);
    assert_eq!(result.tokens_per_minute_steady, 5_000_000);
    assert_eq!(result.total_latency_per_session_seconds, 300);
    assert!((result.steps_per_minute - 1666.666_666_666_666_5).abs() < 1e-9);
}

#[test]
fn achievable_throughput_follows_buffered_formula() {
    for steps in [1, 3, 10, 25] {
        for seconds in [1, 7, 30] {
            for buffer in [0, 5, 20, 37, 100] {
                for parallelism in [1, 9, 100, 2500] {
                    let inputs =
                        PlanningInputs::new(steps, seconds, 500, buffer, None, parallelism, 1000)
                            .expect("valid inputs");
                    let result = compute_capacity(&inputs);
                    let per_worker = 3600.0 / f64::from(steps * seconds);
                    let expected = f64::from(parallelism) * per_worker
                        / (1.0 + f64::from(buffer) / 100.0);
                    assert_eq!(result.achievable_emails_per_hour, expected);
                    assert_eq!(
                        result.meets_target,
                        result.achievable_emails_per_hour >= 1000.0
                    );
                }
            }
        }
    }
}

#[test]
fn required_parallelism_is_smallest_sufficient_count() {
    for steps in [1, 4, 10] {
        for seconds in [1, 13, 30] {
            for buffer in [0, 15, 20, 100] {
                for target in [1, 99, 10_000, 1_000_000] {
                    let inputs =
                        PlanningInputs::new(steps, seconds, 100, buffer, None, 1, target)
                            .expect("valid inputs");
                    let result = compute_capacity(&inputs);
                    let needed = result.required_parallelism_raw * inputs.buffer_multiplier();
                    let provisioned = result.required_parallelism as f64;
                    assert!(provisioned >= needed);
                    assert!(provisioned - 1.0 < needed);
                }
            }
        }
    }
}

#[test]
fn equal_achievable_and_target_meets_target() {
    // 36 s sessions give 100 sessions per worker-hour.
    let inputs = PlanningInputs::new(1, 36, 100, 0, None, 10, 1000).expect("valid inputs");
    let result = compute_capacity(&inputs);
    assert_eq!(result.achievable_emails_per_hour, 1000.0);
    assert!(result.meets_target);
}

#[test]
fn buffer_shrinks_achievable_and_inflates_requirement() {
    let unbuffered = compute_capacity(
        &PlanningInputs::new(10, 30, 3000, 0, None, 100, 10_000).expect("valid inputs"),
    );
    let buffered = compute_capacity(&baseline());
    assert!(buffered.achievable_emails_per_hour < unbuffered.achievable_emails_per_hour);
    assert!(buffered.required_parallelism > unbuffered.required_parallelism);
    assert_eq!(unbuffered.required_parallelism, 834);
}

#[test]
fn repeated_runs_are_identical() {
    let inputs = baseline();
    assert_eq!(compute_capacity(&inputs), compute_capacity(&inputs));
}

#[test]
fn largest_accepted_inputs_never_under_round() {
    let inputs = PlanningInputs::new(1, 1, u32::MAX, 100, Some(10.0), 1, u32::MAX)
        .expect("largest in-range inputs");
    let result = compute_capacity(&inputs);
    assert!(result.tokens_per_minute_steady as f64 >= result.tokens_per_minute_raw);
    assert!(result.requests_per_minute as f64 >= result.steps_per_minute);
    assert!(
        result.required_parallelism as f64
            >= result.required_parallelism_raw * inputs.buffer_multiplier()
    );

    let tpm = planner::limits::required_tpm(&result, &inputs, 10.0);
    assert!(tpm.tpm_needed as f64 >= tpm.tpm_with_spikes);
}

#[test]
fn saturating_inputs_are_rejected() {
    let err = PlanningInputs::new(u32::MAX, u32::MAX, u32::MAX, 0, None, 1, u32::MAX)
        .expect_err("figures overflow u64");
    assert!(format!("{err}").contains("exceeds"));
}
