//! Simulated motion source for exercising a log without hardware.
//!
//! Each tracked axis follows `amplitude · sin(ω·t + phase)`; the "actual"
//! position lags the command by a fixed servo delay, which gives a
//! non-zero following error. Cartesian quantities treat axes 0..3 as X/Y/Z.

use evo_common::consts::LOG_NUM_AXES;

use crate::record::{AxisArray, Cartesian, LogKind, LogRecord};

/// Servo lag between commanded and actual position [s].
const SERVO_DELAY_S: f64 = 0.002;

/// Volts per unit of following error.
const VOLTS_PER_UNIT: f64 = 10.0;

/// Synthetic sinusoidal motion on every tracked axis.
#[derive(Debug, Clone)]
pub struct SimulatedMotion {
    amplitude: AxisArray,
    omega: AxisArray,
    phase: AxisArray,
    last_vel: Option<(f64, Cartesian)>,
    last_acc_vel: Option<(f64, Cartesian)>,
    command_num: i32,
}

impl Default for SimulatedMotion {
    fn default() -> Self {
        Self::new([10.0, 5.0, 2.0], [1.0, 2.0, 0.5])
    }
}

impl SimulatedMotion {
    /// Create a source with per-axis amplitude and angular frequency.
    pub fn new(amplitude: AxisArray, omega: AxisArray) -> Self {
        let mut phase = [0.0; LOG_NUM_AXES];
        for (i, p) in phase.iter_mut().enumerate() {
            *p = i as f64 * core::f64::consts::FRAC_PI_3;
        }
        Self {
            amplitude,
            omega,
            phase,
            last_vel: None,
            last_acc_vel: None,
            command_num: 0,
        }
    }

    fn commanded(&self, axis: usize, t: f64) -> f64 {
        self.amplitude[axis] * (self.omega[axis] * t + self.phase[axis]).sin()
    }

    fn velocity(&self, axis: usize, t: f64) -> f64 {
        self.amplitude[axis] * self.omega[axis] * (self.omega[axis] * t + self.phase[axis]).cos()
    }

    fn per_axis(&self, f: impl Fn(usize) -> f64) -> AxisArray {
        core::array::from_fn(f)
    }

    fn cartesian(&self, t: f64) -> Cartesian {
        Cartesian::new(self.commanded(0, t), self.commanded(1, t), self.commanded(2, t))
    }

    /// Differenced Cartesian velocity since the previous call.
    fn velocity_diff(last: &mut Option<(f64, Cartesian)>, t: f64, pos: Cartesian) -> Cartesian {
        let vel = match *last {
            Some((t0, p0)) if t > t0 => {
                let dt = t - t0;
                Cartesian::new((pos.x - p0.x) / dt, (pos.y - p0.y) / dt, (pos.z - p0.z) / dt)
            }
            _ => Cartesian::default(),
        };
        *last = Some((t, pos));
        vel
    }

    /// Build one record of `kind` at time `t`, sampling `axis` for
    /// single-axis kinds.
    pub fn sample(&mut self, kind: LogKind, axis: usize, t: f64) -> LogRecord {
        let actual_t = t - SERVO_DELAY_S;
        match kind {
            LogKind::AxisPosition => {
                LogRecord::axis_position(t, self.commanded(axis, t), self.commanded(axis, actual_t))
            }
            LogKind::AllInputPositions => {
                LogRecord::all_input_positions(t, self.per_axis(|i| self.commanded(i, actual_t)))
            }
            LogKind::AllOutputPositions => {
                LogRecord::all_output_positions(t, self.per_axis(|i| self.commanded(i, t)))
            }
            LogKind::Command => {
                self.command_num = self.command_num.wrapping_add(1);
                LogRecord::command(t, self.command_num % 8, self.command_num)
            }
            LogKind::AxisVelocity => {
                LogRecord::axis_velocity(t, self.velocity(axis, t), self.velocity(axis, actual_t))
            }
            LogKind::AllFollowingError => LogRecord::all_following_error(
                t,
                self.per_axis(|i| self.commanded(i, t) - self.commanded(i, actual_t)),
            ),
            LogKind::TrajectoryPosition => LogRecord::trajectory_position(t, self.cartesian(t)),
            LogKind::TrajectoryVelocity => {
                let pos = self.cartesian(t);
                let vel = Self::velocity_diff(&mut self.last_vel, t, pos);
                LogRecord::trajectory_velocity(t, vel, magnitude(vel))
            }
            LogKind::TrajectoryAcceleration => {
                let pos = self.cartesian(t);
                let vel = Self::velocity_diff(&mut self.last_acc_vel, t, pos);
                let acc = Cartesian::new(
                    -vel.x * self.omega[0],
                    -vel.y * self.omega[1],
                    -vel.z * self.omega[2],
                );
                LogRecord::trajectory_acceleration(t, acc, magnitude(acc))
            }
            LogKind::PositionVoltage => {
                let actual = self.commanded(axis, actual_t);
                let ferror = self.commanded(axis, t) - actual;
                LogRecord::position_voltage(t, actual, ferror * VOLTS_PER_UNIT)
            }
        }
    }
}

fn magnitude(v: Cartesian) -> f64 {
    (v.x * v.x + v.y * v.y + v.z * v.z).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Sample;

    #[test]
    fn every_kind_produces_matching_record() {
        let mut sim = SimulatedMotion::default();
        for kind in LogKind::ALL {
            let record = sim.sample(kind, 1, 0.25);
            assert_eq!(record.kind(), kind);
            assert_eq!(record.time, 0.25);
        }
    }

    #[test]
    fn following_error_is_command_minus_actual() {
        let mut sim = SimulatedMotion::default();
        let pos = sim.sample(LogKind::AxisPosition, 0, 1.0);
        let ferr = sim.sample(LogKind::AllFollowingError, 0, 1.0);
        match (pos.sample, ferr.sample) {
            (Sample::AxisPosition { output, input }, Sample::AllFollowingError { ferror }) => {
                assert!((ferror[0] - (output - input)).abs() < 1e-12);
            }
            other => panic!("unexpected payloads {other:?}"),
        }
    }

    #[test]
    fn first_velocity_diff_is_zero() {
        let mut sim = SimulatedMotion::default();
        let first = sim.sample(LogKind::TrajectoryVelocity, 0, 0.0);
        assert!(matches!(
            first.sample,
            Sample::TrajectoryVelocity { mag, .. } if mag == 0.0
        ));
        let second = sim.sample(LogKind::TrajectoryVelocity, 0, 0.01);
        assert!(matches!(
            second.sample,
            Sample::TrajectoryVelocity { mag, .. } if mag > 0.0
        ));
    }

    #[test]
    fn command_numbers_increase() {
        let mut sim = SimulatedMotion::default();
        let a = sim.sample(LogKind::Command, 0, 0.0);
        let b = sim.sample(LogKind::Command, 0, 0.001);
        match (a.sample, b.sample) {
            (Sample::Command { command_num: n1, .. }, Sample::Command { command_num: n2, .. }) => {
                assert_eq!(n2, n1 + 1);
            }
            other => panic!("unexpected payloads {other:?}"),
        }
    }
}
