//! Motion log session configuration.
//!
//! Loaded from TOML through [`evo_common::config::ConfigLoader`]. Optional
//! tables and fields fall back to the workspace defaults.
//!
//! ```toml
//! [shared]
//! log_level = "info"
//! service_name = "evo-motion-log"
//!
//! [log]
//! kind = "all_following_error"
//! capacity = 2000
//!
//! [cycle]
//! cycle_time_us = 1000
//! drain_interval_ms = 50
//!
//! [trigger]
//! trigger_type = "over"
//! variable = "following_error"
//! threshold = 0.05
//! ```

use std::path::Path;

use evo_common::config::{ConfigError, ConfigLoader, SharedConfig};
use evo_common::consts::{
    CYCLE_TIME_US, DEFAULT_LOG_CAPACITY, DRAIN_INTERVAL_MS, LOG_NUM_AXES, MAX_CYCLE_TIME_US,
    MOTION_LOG_MAX,
};
use serde::{Deserialize, Serialize};

use crate::record::LogKind;
use crate::trigger::{TriggerType, TriggerVariable};

// ─── Top-Level Config ───────────────────────────────────────────────

/// Top-level motion log configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MotionLogConfig {
    /// Fields common to every EVO service.
    pub shared: SharedConfig,

    /// What to log.
    pub log: LogSessionConfig,

    /// Producer/consumer pacing.
    #[serde(default)]
    pub cycle: CycleConfig,

    /// Session start condition, reported only.
    #[serde(default)]
    pub trigger: Option<TriggerConfig>,
}

impl MotionLogConfig {
    /// Load and validate a configuration file.
    pub fn load_validated(path: &Path) -> Result<Self, ConfigError> {
        let config = Self::load(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate all sections.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        self.log.validate().map_err(ConfigError::ValidationError)?;
        self.cycle.validate().map_err(ConfigError::ValidationError)?;
        if let Some(trigger) = &self.trigger {
            trigger.validate().map_err(ConfigError::ValidationError)?;
        }
        Ok(())
    }
}

// ─── Log Session ────────────────────────────────────────────────────

/// Kind and size of one logging session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSessionConfig {
    /// Record kind accepted by the log.
    pub kind: LogKind,

    /// Active capacity (default: 1000).
    #[serde(default = "default_capacity")]
    pub capacity: usize,

    /// Axis sampled by single-axis kinds (default: 0).
    #[serde(default)]
    pub axis: usize,
}

fn default_capacity() -> usize {
    DEFAULT_LOG_CAPACITY
}

impl LogSessionConfig {
    /// Validate parameter bounds.
    pub fn validate(&self) -> Result<(), String> {
        if self.capacity == 0 || self.capacity > MOTION_LOG_MAX {
            return Err(format!(
                "log.capacity {} out of range [1, {}]",
                self.capacity, MOTION_LOG_MAX
            ));
        }
        if self.axis >= LOG_NUM_AXES {
            return Err(format!(
                "log.axis {} out of range [0, {}]",
                self.axis,
                LOG_NUM_AXES - 1
            ));
        }
        Ok(())
    }
}

// ─── Cycle ──────────────────────────────────────────────────────────

/// Producer cycle time and consumer polling interval.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CycleConfig {
    /// Producer cycle time in microseconds (default: 1000 = 1ms).
    #[serde(default = "default_cycle_time_us")]
    pub cycle_time_us: u64,

    /// Consumer drain interval in milliseconds (default: 50).
    #[serde(default = "default_drain_interval_ms")]
    pub drain_interval_ms: u64,
}

fn default_cycle_time_us() -> u64 {
    CYCLE_TIME_US
}
fn default_drain_interval_ms() -> u64 {
    DRAIN_INTERVAL_MS
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            cycle_time_us: CYCLE_TIME_US,
            drain_interval_ms: DRAIN_INTERVAL_MS,
        }
    }
}

impl CycleConfig {
    /// Validate parameter bounds.
    pub fn validate(&self) -> Result<(), String> {
        if self.cycle_time_us == 0 || self.cycle_time_us > MAX_CYCLE_TIME_US {
            return Err(format!(
                "cycle.cycle_time_us {} out of range [1, {}]",
                self.cycle_time_us, MAX_CYCLE_TIME_US
            ));
        }
        if self.drain_interval_ms == 0 {
            return Err("cycle.drain_interval_ms must be > 0".to_string());
        }
        Ok(())
    }
}

// ─── Trigger ────────────────────────────────────────────────────────

/// Trigger description handed to the session driver.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TriggerConfig {
    /// How the session starts.
    #[serde(default)]
    pub trigger_type: TriggerType,

    /// Watched quantity.
    #[serde(default)]
    pub variable: TriggerVariable,

    /// Threshold for non-manual triggers.
    #[serde(default)]
    pub threshold: f64,
}

impl TriggerConfig {
    /// Validate parameter bounds.
    ///
    /// The threshold is ignored for manual triggers.
    pub fn validate(&self) -> Result<(), String> {
        if !self.trigger_type.uses_threshold() {
            return Ok(());
        }
        if !self.threshold.is_finite() {
            return Err(format!("trigger.threshold {} is not finite", self.threshold));
        }
        if self.trigger_type == TriggerType::Delta && self.threshold == 0.0 {
            return Err("trigger.threshold must be non-zero for delta triggers".to_string());
        }
        Ok(())
    }
}
