//! Log record model.
//!
//! A [`LogRecord`] is one timestamped sample of exactly one [`LogKind`].
//! The payload is a [`Sample`] enum, so the kind is derived from the variant
//! and can never disagree with the fields that are present.
//!
//! | Code | Kind                       | Payload                                  |
//! |------|----------------------------|------------------------------------------|
//! | 1    | `AxisPosition`             | output, input (single axis)              |
//! | 2    | `AllInputPositions`        | `[f64; LOG_NUM_AXES]` actual positions   |
//! | 3    | `AllOutputPositions`       | `[f64; LOG_NUM_AXES]` commanded outputs  |
//! | 4    | `Command`                  | command code, command number             |
//! | 5    | `AxisVelocity`             | commanded, actual velocity (single axis) |
//! | 6    | `AllFollowingError`        | `[f64; LOG_NUM_AXES]` following error    |
//! | 7    | `TrajectoryPosition`       | Cartesian position                       |
//! | 8    | `TrajectoryVelocity`       | Cartesian velocity diff + magnitude      |
//! | 9    | `TrajectoryAcceleration`   | Cartesian acceleration diff + magnitude  |
//! | 10   | `PositionVoltage`          | measured position, output voltage        |
//!
//! The numeric codes are stable and match the historical log type
//! enumeration used by motion-log consumers.

use core::fmt;
use core::str::FromStr;

use evo_common::consts::{CACHE_LINE_SIZE, LOG_NUM_AXES};
use serde::{Deserialize, Serialize};
use static_assertions::const_assert;

/// Per-axis sample array used by the multi-axis kinds.
pub type AxisArray = [f64; LOG_NUM_AXES];

/// Kind of sample held by a log record.
///
/// A [`MotionLog`](crate::MotionLog) accepts exactly one kind per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum LogKind {
    /// Single axis commanded/actual position, per cycle.
    AxisPosition = 1,
    /// All axes actual input position, per cycle.
    AllInputPositions = 2,
    /// All axes commanded output position, per cycle.
    AllOutputPositions = 3,
    /// Command type and sequence number, per new command.
    Command = 4,
    /// Single axis commanded/actual velocity.
    AxisVelocity = 5,
    /// All axes following error.
    AllFollowingError = 6,
    /// Cartesian position at trajectory rate.
    TrajectoryPosition = 7,
    /// Cartesian velocity differences at trajectory rate.
    TrajectoryVelocity = 8,
    /// Cartesian acceleration differences at trajectory rate.
    TrajectoryAcceleration = 9,
    /// Measured position and resulting output voltage.
    PositionVoltage = 10,
}

impl LogKind {
    /// All kinds in code order.
    pub const ALL: [LogKind; 10] = [
        Self::AxisPosition,
        Self::AllInputPositions,
        Self::AllOutputPositions,
        Self::Command,
        Self::AxisVelocity,
        Self::AllFollowingError,
        Self::TrajectoryPosition,
        Self::TrajectoryVelocity,
        Self::TrajectoryAcceleration,
        Self::PositionVoltage,
    ];

    /// Convert from raw `u8` code. Returns `None` for invalid values.
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::AxisPosition),
            2 => Some(Self::AllInputPositions),
            3 => Some(Self::AllOutputPositions),
            4 => Some(Self::Command),
            5 => Some(Self::AxisVelocity),
            6 => Some(Self::AllFollowingError),
            7 => Some(Self::TrajectoryPosition),
            8 => Some(Self::TrajectoryVelocity),
            9 => Some(Self::TrajectoryAcceleration),
            10 => Some(Self::PositionVoltage),
            _ => None,
        }
    }

    /// Stable numeric code.
    #[inline]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Snake-case name, identical to the serde/TOML spelling.
    pub const fn name(self) -> &'static str {
        match self {
            Self::AxisPosition => "axis_position",
            Self::AllInputPositions => "all_input_positions",
            Self::AllOutputPositions => "all_output_positions",
            Self::Command => "command",
            Self::AxisVelocity => "axis_velocity",
            Self::AllFollowingError => "all_following_error",
            Self::TrajectoryPosition => "trajectory_position",
            Self::TrajectoryVelocity => "trajectory_velocity",
            Self::TrajectoryAcceleration => "trajectory_acceleration",
            Self::PositionVoltage => "position_voltage",
        }
    }

    /// True for kinds that sample a single selected axis.
    #[inline]
    pub const fn is_single_axis(self) -> bool {
        matches!(
            self,
            Self::AxisPosition | Self::AxisVelocity | Self::PositionVoltage
        )
    }
}

impl fmt::Display for LogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LogKind {
    type Err = String;

    /// Parse the snake-case name, e.g. `"all_following_error"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| format!("unknown log kind '{s}'"))
    }
}

/// Cartesian 3-vector. Component storage only.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[repr(C)]
pub struct Cartesian {
    /// X component.
    pub x: f64,
    /// Y component.
    pub y: f64,
    /// Z component.
    pub z: f64,
}

impl Cartesian {
    /// Create a vector from components.
    #[inline]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Kind-specific payload of a log record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sample {
    /// Commanded output and actual input position of the logged axis.
    AxisPosition {
        /// Commanded output position.
        output: f64,
        /// Actual input position.
        input: f64,
    },
    /// Actual input position of every tracked axis.
    AllInputPositions {
        /// Per-axis actual position.
        input: AxisArray,
    },
    /// Commanded output position of every tracked axis.
    AllOutputPositions {
        /// Per-axis commanded position.
        output: AxisArray,
    },
    /// A new motion command.
    Command {
        /// Command code.
        command: i32,
        /// Command sequence number.
        command_num: i32,
    },
    /// Commanded and actual velocity of the logged axis.
    AxisVelocity {
        /// Commanded velocity.
        cmd_vel: f64,
        /// Actual velocity.
        act_vel: f64,
    },
    /// Following error of every tracked axis.
    AllFollowingError {
        /// Per-axis following error (commanded − actual).
        ferror: AxisArray,
    },
    /// Calculated Cartesian position.
    TrajectoryPosition {
        /// Cartesian position.
        pos: Cartesian,
    },
    /// Differenced Cartesian velocity.
    TrajectoryVelocity {
        /// Velocity difference vector.
        vel: Cartesian,
        /// Vector magnitude.
        mag: f64,
    },
    /// Differenced Cartesian acceleration.
    TrajectoryAcceleration {
        /// Acceleration difference vector.
        acc: Cartesian,
        /// Vector magnitude.
        mag: f64,
    },
    /// Measured position and the output voltage it produced.
    PositionVoltage {
        /// Measured position.
        pos: f64,
        /// Output voltage.
        voltage: f64,
    },
}

impl Sample {
    /// Kind tag of this payload.
    #[inline]
    pub const fn kind(&self) -> LogKind {
        match self {
            Self::AxisPosition { .. } => LogKind::AxisPosition,
            Self::AllInputPositions { .. } => LogKind::AllInputPositions,
            Self::AllOutputPositions { .. } => LogKind::AllOutputPositions,
            Self::Command { .. } => LogKind::Command,
            Self::AxisVelocity { .. } => LogKind::AxisVelocity,
            Self::AllFollowingError { .. } => LogKind::AllFollowingError,
            Self::TrajectoryPosition { .. } => LogKind::TrajectoryPosition,
            Self::TrajectoryVelocity { .. } => LogKind::TrajectoryVelocity,
            Self::TrajectoryAcceleration { .. } => LogKind::TrajectoryAcceleration,
            Self::PositionVoltage { .. } => LogKind::PositionVoltage,
        }
    }
}

/// One timestamped telemetry sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogRecord {
    /// Sample time in seconds.
    pub time: f64,
    /// Kind-specific payload.
    pub sample: Sample,
}

// One record plus its slot stamp must fit a cache line.
const_assert!(core::mem::size_of::<LogRecord>() + core::mem::size_of::<u64>() <= CACHE_LINE_SIZE);

impl LogRecord {
    /// Bind a timestamp to a payload.
    #[inline]
    pub const fn new(time: f64, sample: Sample) -> Self {
        Self { time, sample }
    }

    /// Kind tag of this record.
    #[inline]
    pub const fn kind(&self) -> LogKind {
        self.sample.kind()
    }

    /// Commanded output and measured input position of one axis.
    #[inline]
    pub const fn axis_position(time: f64, output: f64, input: f64) -> Self {
        Self::new(time, Sample::AxisPosition { output, input })
    }

    /// Measured input position of every tracked axis.
    #[inline]
    pub const fn all_input_positions(time: f64, input: AxisArray) -> Self {
        Self::new(time, Sample::AllInputPositions { input })
    }

    /// Commanded output position of every tracked axis.
    #[inline]
    pub const fn all_output_positions(time: f64, output: AxisArray) -> Self {
        Self::new(time, Sample::AllOutputPositions { output })
    }

    /// Motion command code and its serial number.
    #[inline]
    pub const fn command(time: f64, command: i32, command_num: i32) -> Self {
        Self::new(time, Sample::Command { command, command_num })
    }

    /// Commanded and actual velocity of one axis.
    #[inline]
    pub const fn axis_velocity(time: f64, cmd_vel: f64, act_vel: f64) -> Self {
        Self::new(time, Sample::AxisVelocity { cmd_vel, act_vel })
    }

    /// Following error of every tracked axis.
    #[inline]
    pub const fn all_following_error(time: f64, ferror: AxisArray) -> Self {
        Self::new(time, Sample::AllFollowingError { ferror })
    }

    /// Cartesian trajectory position.
    #[inline]
    pub const fn trajectory_position(time: f64, pos: Cartesian) -> Self {
        Self::new(time, Sample::TrajectoryPosition { pos })
    }

    /// Cartesian trajectory velocity and its magnitude.
    #[inline]
    pub const fn trajectory_velocity(time: f64, vel: Cartesian, mag: f64) -> Self {
        Self::new(time, Sample::TrajectoryVelocity { vel, mag })
    }

    /// Cartesian trajectory acceleration and its magnitude.
    #[inline]
    pub const fn trajectory_acceleration(time: f64, acc: Cartesian, mag: f64) -> Self {
        Self::new(time, Sample::TrajectoryAcceleration { acc, mag })
    }

    /// Position and output voltage of one axis.
    #[inline]
    pub const fn position_voltage(time: f64, pos: f64, voltage: f64) -> Self {
        Self::new(time, Sample::PositionVoltage { pos, voltage })
    }
}
