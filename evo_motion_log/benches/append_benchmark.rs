//! Motion log latency benchmarks.
//!
//! Append runs inside the RT cycle, so its cost must stay flat regardless of
//! capacity or fill level. Target: append ≤ 100ns, drain ≤ 200ns.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use evo_motion_log::sim::SimulatedMotion;
use evo_motion_log::{LogKind, LogRecord, MotionLog};
use std::hint::black_box;

fn bench_append_full_log(c: &mut Criterion) {
    let mut group = c.benchmark_group("motion_log_append");
    for capacity in [16usize, 1_000, 10_000] {
        let mut log = MotionLog::new(LogKind::AllFollowingError, capacity).expect("init");
        let record = LogRecord::all_following_error(0.0, [0.01, -0.02, 0.005]);
        // Pre-fill so every measured append overwrites.
        for _ in 0..capacity {
            log.append(record).unwrap();
        }

        group.bench_with_input(BenchmarkId::from_parameter(capacity), &record, |b, r| {
            b.iter(|| log.append(black_box(*r)).unwrap());
        });
    }
    group.finish();
}

fn bench_sample_and_append(c: &mut Criterion) {
    let mut log = MotionLog::new(LogKind::TrajectoryVelocity, 1_000).expect("init");
    let mut sim = SimulatedMotion::default();
    let mut t = 0.0;

    c.bench_function("motion_log_sample_and_append_traj_vel", |b| {
        b.iter(|| {
            t += 0.001;
            let record = sim.sample(LogKind::TrajectoryVelocity, 0, t);
            log.append(black_box(record)).unwrap();
        });
    });
}

fn bench_append_then_drain(c: &mut Criterion) {
    let mut log = MotionLog::new(LogKind::AxisPosition, 1_000).expect("init");
    let record = LogRecord::axis_position(0.0, 1.0, 0.999);

    c.bench_function("motion_log_append_drain_pair", |b| {
        b.iter(|| {
            log.append(black_box(record)).unwrap();
            black_box(log.drain());
        });
    });
}

fn bench_drain_batch(c: &mut Criterion) {
    let mut log = MotionLog::new(LogKind::AxisPosition, 1_000).expect("init");
    let record = LogRecord::axis_position(0.0, 1.0, 0.999);

    c.bench_function("motion_log_drain_batch_256", |b| {
        b.iter(|| {
            let (mut producer, mut consumer) = log.split();
            for _ in 0..256 {
                producer.append(record).unwrap();
            }
            black_box(consumer.drain_batch::<256>());
        });
    });
}

criterion_group!(
    benches,
    bench_append_full_log,
    bench_sample_and_append,
    bench_append_then_drain,
    bench_drain_batch
);
criterion_main!(benches);
