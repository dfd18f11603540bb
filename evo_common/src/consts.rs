//! System-wide constants for the EVO motion log.
//!
//! Single source of truth for log sizing and timing limits.
//! Imported by all crates; no duplication permitted.

use static_assertions::const_assert;

/// Hard maximum number of log slots.
///
/// Physical storage is always sized to this, regardless of the active
/// capacity, so a log fits a statically sized shared memory region.
pub const MOTION_LOG_MAX: usize = 10_000;

/// Number of tracked axes logged together by the multi-axis record kinds.
pub const LOG_NUM_AXES: usize = 3;

/// Default active log capacity when none is configured.
pub const DEFAULT_LOG_CAPACITY: usize = 1_000;

/// CPU cache line size in bytes.
///
/// Log slots are aligned to this to keep producer and consumer
/// from sharing lines.
pub const CACHE_LINE_SIZE: usize = 64;

/// Default system cycle time in microseconds (1 kHz = 1000 µs).
pub const CYCLE_TIME_US: u64 = 1000;

/// Longest accepted cycle time in microseconds (1 Hz).
pub const MAX_CYCLE_TIME_US: u64 = 1_000_000;

/// Default consumer drain interval in milliseconds.
pub const DRAIN_INTERVAL_MS: u64 = 50;

const_assert!(LOG_NUM_AXES > 0);
const_assert!(DEFAULT_LOG_CAPACITY <= MOTION_LOG_MAX);
const_assert!(CACHE_LINE_SIZE.is_power_of_two());
const_assert!(CYCLE_TIME_US <= MAX_CYCLE_TIME_US);
