//! Prelude module for common re-exports.
//!
//! ```rust
//! use evo_common::prelude::*;
//! ```

// ─── Logging ────────────────────────────────────────────────────────
pub use crate::config::LogLevel;

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, SharedConfig};

// ─── System Constants ───────────────────────────────────────────────
pub use crate::consts::{CYCLE_TIME_US, LOG_NUM_AXES, MOTION_LOG_MAX};
