//! Lookout Operations Benchmarks
//!
//! Benchmarks for scenario parsing, probe expression building and the
//! poller's per-tick overhead.
//!
//! Run with: `cargo bench --bench lookout_ops`

#![allow(clippy::unwrap_used)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use lookout::{path_expression, PollOutcome, Poller, Scenario, Truthy, WaitOptions};
use serde_json::json;
use std::convert::Infallible;

const SHORT_SCENARIO: &str = r#"
version: "1.0"
name: "boot"
steps:
  - action: navigate
    url: "http://localhost:8080"
  - action: wait_for
    path: window.game.ready
"#;

fn generate_scenario(presses: usize) -> String {
    let mut yaml = String::from("version: \"1.0\"\nsteps:\n  - action: navigate\n    url: /\n");
    for i in 0..presses {
        let key = ["ArrowLeft", "ArrowRight", "Space"][i % 3];
        yaml.push_str(&format!("  - action: press\n    key: {key}\n"));
        yaml.push_str(&format!(
            "  - action: eval\n    path: window.game.player.position.x\n    label: x{i}\n"
        ));
    }
    yaml
}

fn bench_scenario_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenario_parsing");

    let inputs = vec![
        ("short", SHORT_SCENARIO.to_string()),
        ("presses_10", generate_scenario(10)),
        ("presses_100", generate_scenario(100)),
    ];

    for (name, yaml) in inputs {
        group.bench_with_input(BenchmarkId::from_parameter(name), &yaml, |bench, y| {
            bench.iter(|| {
                let scenario = Scenario::from_yaml(black_box(y)).unwrap();
                black_box(scenario);
            });
        });
    }

    group.finish();
}

fn bench_path_expression(c: &mut Criterion) {
    let mut group = c.benchmark_group("path_expression");

    for path in [
        "game.ready",
        "window.game.stateManager.currentState",
        "window.game.level.entities.12.body.velocity.y",
    ] {
        group.bench_with_input(BenchmarkId::from_parameter(path), &path, |bench, p| {
            bench.iter(|| black_box(path_expression(black_box(p)).unwrap()));
        });
    }

    group.finish();
}

fn bench_poll_immediate(c: &mut Criterion) {
    let poller = Poller::new(WaitOptions::new().with_timeout(1_000));

    c.bench_function("poll_satisfied_first_tick", |bench| {
        bench.iter(|| {
            let mut condition = || Ok::<_, Infallible>(black_box(true));
            let outcome = poller.poll(&mut condition).unwrap();
            assert!(matches!(outcome, PollOutcome::Satisfied(_)));
        });
    });

    c.bench_function("poll_zero_timeout", |bench| {
        let zero = Poller::new(WaitOptions::new().with_timeout(0));
        bench.iter(|| {
            let mut condition = || Ok::<_, Infallible>(black_box(json!(0)));
            black_box(zero.poll(&mut condition).unwrap());
        });
    });
}

fn bench_truthiness(c: &mut Criterion) {
    let values = vec![
        json!(null),
        json!(0),
        json!(""),
        json!("playing"),
        json!({"x": 1.5, "y": -2.0}),
    ];

    c.bench_function("json_truthiness", |bench| {
        bench.iter(|| {
            let count = values.iter().filter(|v| black_box(v).is_truthy()).count();
            black_box(count);
        });
    });
}

criterion_group!(
    benches,
    bench_scenario_parsing,
    bench_path_expression,
    bench_poll_immediate,
    bench_truthiness
);
criterion_main!(benches);
