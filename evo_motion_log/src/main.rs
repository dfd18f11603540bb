//! # EVO Motion Log
//!
//! Runs one logging session against simulated motion: an RT producer thread
//! appends one record per control cycle while a monitoring consumer drains
//! at its own interval. Reports throughput and overwrite counts on exit.

use clap::Parser;
use evo_common::prelude::{ConfigError, LogLevel};
use evo_motion_log::config::MotionLogConfig;
use evo_motion_log::rt::{
    CyclePacer, CycleStats, RtError, monotonic_now, rt_setup, timespec_diff_ns, timespec_seconds,
};
use evo_motion_log::sim::SimulatedMotion;
use evo_motion_log::{LogConsumer, LogError, LogKind, LogProducer, LogRecord, MotionLog};
use std::path::PathBuf;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

/// Records pulled per consumer batch.
const DRAIN_BATCH: usize = 256;

/// EVO Motion Log: RT telemetry logging session
#[derive(Parser, Debug)]
#[command(name = "evo_motion_log")]
#[command(author = "RTS007")]
#[command(version)]
#[command(about = "Lock-free telemetry log for the RT motion control loop")]
struct Args {
    /// Path to the motion log configuration TOML.
    #[arg(long, default_value = "config/motion_log.toml")]
    config: PathBuf,

    /// Override the configured record kind (e.g. `all_following_error`).
    #[arg(long)]
    kind: Option<LogKind>,

    /// Override the configured capacity.
    #[arg(long)]
    capacity: Option<usize>,

    /// Number of producer cycles to run.
    #[arg(long, default_value_t = 5000)]
    cycles: u64,

    /// CPU core to pin the producer thread to (default: 1).
    #[arg(long, default_value_t = 1)]
    cpu_core: usize,

    /// SCHED_FIFO priority (default: 80).
    #[arg(long, default_value_t = 80)]
    rt_priority: i32,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Error)]
enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Log(#[from] LogError),
    #[error(transparent)]
    Rt(#[from] RtError),
    #[error("failed to spawn producer thread: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("producer thread panicked")]
    ProducerPanicked,
}

/// Clears the running flag when the producer exits, including by panic.
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Consumer-side totals.
#[derive(Debug, Default)]
struct DrainSummary {
    drained: u64,
    passes: u64,
    last: Option<LogRecord>,
}

fn main() {
    let args = Args::parse();
    let config = MotionLogConfig::load_validated(&args.config);
    let level = config
        .as_ref()
        .map(|c| c.shared.log_level)
        .unwrap_or_default();
    setup_tracing(&args, level);

    info!("EVO Motion Log v{} starting...", env!("CARGO_PKG_VERSION"));

    let result = config
        .map_err(AppError::from)
        .and_then(|config| run(&args, config));
    if let Err(e) = result {
        error!("FATAL: {e}");
        process::exit(1);
    }

    info!("EVO Motion Log shutdown complete");
}

fn run(args: &Args, mut config: MotionLogConfig) -> Result<(), AppError> {
    if let Some(kind) = args.kind {
        config.log.kind = kind;
    }
    if let Some(capacity) = args.capacity {
        config.log.capacity = capacity;
    }
    config.validate()?;

    let kind = config.log.kind;
    info!(
        service = %config.shared.service_name,
        %kind,
        capacity = config.log.capacity,
        cycle_time_us = config.cycle.cycle_time_us,
        drain_interval_ms = config.cycle.drain_interval_ms,
        "Config OK"
    );
    if kind.is_single_axis() {
        info!(axis = config.log.axis, "Logging single axis");
    }
    if let Some(trigger) = &config.trigger {
        info!(
            trigger_type = %trigger.trigger_type,
            variable = %trigger.variable,
            threshold = trigger.threshold,
            "Trigger configured (evaluated by the session driver)"
        );
    }

    let mut log = MotionLog::new(kind, config.log.capacity)?;
    let running = AtomicBool::new(true);
    let drain_interval = Duration::from_millis(config.cycle.drain_interval_ms);

    let (stats, summary) = {
        let (producer, consumer) = log.split();
        std::thread::scope(|s| -> Result<(CycleStats, DrainSummary), AppError> {
            let rt = std::thread::Builder::new()
                .name("motion-log-rt".into())
                .spawn_scoped(s, || {
                    let _running = RunningGuard(&running);
                    produce(producer, &config, args)
                })?;

            let summary = consume(consumer, drain_interval, &running);
            let stats = rt.join().map_err(|_| AppError::ProducerPanicked)??;
            Ok((stats, summary))
        })?
    };

    report(&log, &stats, &summary);
    Ok(())
}

/// RT producer: one record per cycle for `args.cycles` cycles.
fn produce(
    mut producer: LogProducer<'_>,
    config: &MotionLogConfig,
    args: &Args,
) -> Result<CycleStats, AppError> {
    rt_setup(args.cpu_core, args.rt_priority)?;
    info!(
        cpu_core = args.cpu_core,
        rt_priority = args.rt_priority,
        "RT setup complete, entering producer loop"
    );

    let kind = producer.kind();
    let axis = config.log.axis;
    let mut sim = SimulatedMotion::default();
    let mut pacer = CyclePacer::start(config.cycle.cycle_time_us)?;
    let budget_ns = pacer.cycle_ns();
    let mut stats = CycleStats::new();

    for _ in 0..args.cycles {
        let cycle_start = monotonic_now()?;
        let record = sim.sample(kind, axis, timespec_seconds(&cycle_start));
        producer.append(record)?;
        let cycle_end = monotonic_now()?;

        stats.record(timespec_diff_ns(&cycle_end, &cycle_start), budget_ns);
        pacer.wait()?;
    }

    Ok(stats)
}

/// Monitoring consumer: drain everything available every interval until the
/// producer stops, then take one final pass.
fn consume(mut consumer: LogConsumer<'_>, interval: Duration, running: &AtomicBool) -> DrainSummary {
    let mut summary = DrainSummary::default();

    loop {
        let finished = !running.load(Ordering::Acquire);

        loop {
            let batch = consumer.drain_batch::<DRAIN_BATCH>();
            if batch.is_empty() {
                break;
            }
            summary.drained += batch.len() as u64;
            summary.last = batch.last().copied();
        }
        summary.passes += 1;

        let status = consumer.status();
        debug!(
            drained = summary.drained,
            appended = status.appended,
            overwritten = status.overwritten,
            "Drain pass complete"
        );

        if finished {
            break;
        }
        std::thread::sleep(interval);
    }

    summary
}

fn report(log: &MotionLog, stats: &CycleStats, summary: &DrainSummary) {
    let status = log.status();
    info!(
        kind = %status.kind,
        appended = status.appended,
        drained = summary.drained,
        overwritten = status.overwritten,
        passes = summary.passes,
        "Session complete"
    );
    info!(
        cycles = stats.cycle_count,
        avg_ns = stats.avg_cycle_ns(),
        min_ns = stats.min_cycle_ns,
        max_ns = stats.max_cycle_ns,
        overruns = stats.overruns,
        "Producer timing"
    );
    if let Some(last) = summary.last {
        info!(time = last.time, sample = ?last.sample, "Last drained record");
    }

    if summary.drained + status.overwritten != status.appended {
        warn!(
            appended = status.appended,
            drained = summary.drained,
            overwritten = status.overwritten,
            "Drain accounting mismatch"
        );
    }
    if stats.overruns > 0 {
        warn!(overruns = stats.overruns, "Producer cycle overruns detected");
    }
}

/// Setup tracing subscriber from CLI arguments and configured level.
///
/// `RUST_LOG` takes precedence over both.
fn setup_tracing(args: &Args, configured: LogLevel) {
    let level = if args.verbose {
        LogLevel::Debug
    } else {
        configured
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consumer_stops_when_producer_panics() {
        let mut log = MotionLog::new(LogKind::AxisPosition, 8).unwrap();
        let running = AtomicBool::new(true);
        let (mut producer, consumer) = log.split();

        let summary = std::thread::scope(|s| {
            let rt = s.spawn(|| {
                let _running = RunningGuard(&running);
                producer
                    .append(LogRecord::axis_position(0.0, 1.0, 1.0))
                    .unwrap();
                panic!("producer fault");
            });

            let summary = consume(consumer, Duration::from_millis(1), &running);
            assert!(rt.join().is_err());
            summary
        });

        assert!(!running.load(Ordering::Acquire));
        assert_eq!(summary.drained, 1);
        assert_eq!(summary.last.map(|r| r.time), Some(0.0));
    }

    #[test]
    fn running_guard_clears_flag_on_normal_exit() {
        let running = AtomicBool::new(true);
        {
            let _running = RunningGuard(&running);
            assert!(running.load(Ordering::Acquire));
        }
        assert!(!running.load(Ordering::Acquire));
    }

    #[test]
    fn cli_overrides_parse() {
        let args = Args::try_parse_from([
            "evo_motion_log",
            "--kind",
            "trajectory_velocity",
            "--capacity",
            "64",
            "--cycles",
            "10",
        ])
        .unwrap();
        assert_eq!(args.kind, Some(LogKind::TrajectoryVelocity));
        assert_eq!(args.capacity, Some(64));
        assert_eq!(args.cycles, 10);
        assert!(Args::try_parse_from(["evo_motion_log", "--kind", "spindle"]).is_err());
    }
}
