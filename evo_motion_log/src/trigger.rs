//! Trigger vocabulary for logging sessions.
//!
//! These enums name when a session is meant to start capturing and which
//! quantity gates it. They are carried in the session configuration and
//! reported at startup; evaluating a trigger is the job of the component
//! that drives the producer, not of the log.

use core::fmt;

use serde::{Deserialize, Serialize};

/// How a logging session is started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum TriggerType {
    /// Started by an explicit operator command.
    #[default]
    Manual = 0,
    /// Started when the watched variable changes by more than the threshold.
    Delta = 1,
    /// Started when the watched variable rises above the threshold.
    Over = 2,
    /// Started when the watched variable falls below the threshold.
    Under = 3,
}

impl TriggerType {
    /// True if this trigger type compares against a threshold.
    #[inline]
    pub const fn uses_threshold(self) -> bool {
        !matches!(self, Self::Manual)
    }
}

/// Quantity a non-manual trigger watches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum TriggerVariable {
    /// Axis following error.
    #[default]
    FollowingError = 0,
    /// Output voltage.
    Voltage = 1,
    /// Axis position.
    Position = 2,
    /// Axis velocity.
    Velocity = 3,
}

impl fmt::Display for TriggerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Manual => "manual",
            Self::Delta => "delta",
            Self::Over => "over",
            Self::Under => "under",
        })
    }
}

impl fmt::Display for TriggerVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::FollowingError => "following_error",
            Self::Voltage => "voltage",
            Self::Position => "position",
            Self::Velocity => "velocity",
        })
    }
}
