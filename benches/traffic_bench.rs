use criterion::{Criterion, criterion_group, criterion_main};

use planner::{inputs::PlanningInputs, plan, traffic::seeded_rng};

fn bench_plan(c: &mut Criterion) {
    let mut group = c.benchmark_group("plan");
    for &spike in &[1.0, 2.0, 6.0] {
        let inputs = PlanningInputs::new(10, 30, 3000, 20, Some(spike), 100, 10_000)
            .expect("valid inputs");
        group.bench_function(format!("spike_{spike}"), |b| {
            let mut rng = seeded_rng(Some(42));
            b.iter(|| plan(&inputs, &mut rng))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_plan);
criterion_main!(benches);
