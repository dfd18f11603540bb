//! # EVO Motion Log
//!
//! Fixed-capacity telemetry log for the RT motion control loop. The control
//! cycle appends one timestamped sample per cycle; a monitoring task drains
//! the oldest samples at its own pace. Neither side blocks and nothing is
//! allocated after construction.
//!
//! ## Components
//!
//! - [`record`]: [`LogRecord`], a timestamp plus a [`Sample`] enum, one
//!   variant per [`LogKind`].
//! - [`buffer`]: [`MotionLog`], the circular log, plus the
//!   [`LogProducer`] / [`LogConsumer`] SPSC handles.
//! - [`config`]: TOML session configuration.
//! - [`trigger`]: trigger vocabulary carried by the session configuration.
//! - [`rt`]: monotonic timestamps, cycle pacing, RT thread setup.
//! - [`sim`]: synthetic motion for running a log without hardware.
//!
//! ## Usage
//!
//! ```rust
//! use evo_motion_log::{LogKind, LogRecord, MotionLog};
//!
//! # fn main() -> Result<(), evo_motion_log::LogError> {
//! let mut log = MotionLog::new(LogKind::AxisPosition, 3)?;
//! for t in 1..=5 {
//!     log.append(LogRecord::axis_position(t as f64, 0.0, 0.0))?;
//! }
//!
//! // Oldest two were overwritten.
//! let times: Vec<f64> = std::iter::from_fn(|| log.drain()).map(|r| r.time).collect();
//! assert_eq!(times, [3.0, 4.0, 5.0]);
//! # Ok(())
//! # }
//! ```
//!
//! ## Thread Safety
//!
//! - [`MotionLog::split`] hands out exactly one producer and one consumer.
//!   Both are `Send` and may run on different threads.
//! - [`MotionLog::initialize`] takes `&mut self` and therefore cannot race
//!   either handle.

pub mod buffer;
pub mod config;
pub mod error;
pub mod record;
pub mod rt;
pub mod sim;
pub mod trigger;

pub use buffer::{LogConsumer, LogProducer, LogStatus, MotionLog};
pub use config::MotionLogConfig;
pub use error::{LogError, LogResult};
pub use record::{Cartesian, LogKind, LogRecord, Sample};
pub use trigger::{TriggerType, TriggerVariable};
