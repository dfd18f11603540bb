//! RT producer support: timestamp source, cycle pacing, thread setup.
//!
//! ## RT Setup Sequence
//! 1. `mlockall(MCL_CURRENT | MCL_FUTURE)`: lock all pages.
//! 2. Prefault stack pages.
//! 3. `sched_setaffinity`: pin to isolated CPU core.
//! 4. `sched_setscheduler(SCHED_FIFO, prio)`: RT priority.
//!
//! Steps 1, 3 and 4 are no-ops without the `rt` feature.
//!
//! ## Pacing
//! Absolute-time sleep on `CLOCK_MONOTONIC` for drift-free cycles
//! (`clock_nanosleep(TIMER_ABSTIME)` with `rt`, `std::thread::sleep`
//! otherwise).

use nix::sys::time::TimeSpec;
use nix::time::{ClockId, clock_gettime};
use thiserror::Error;

/// Bytes of stack touched by [`prefault_stack`].
const PREFAULT_STACK_BYTES: usize = 256 * 1024;

const NANOS_PER_SEC: i64 = 1_000_000_000;

/// Errors during RT setup or cycle pacing.
#[derive(Debug, Error)]
pub enum RtError {
    /// An RT system call failed.
    #[error("RT setup error: {0}")]
    Setup(String),

    /// Reading or sleeping on the monotonic clock failed.
    #[error("clock error: {0}")]
    Clock(#[from] nix::Error),
}

// ─── Clock ──────────────────────────────────────────────────────────

/// Current `CLOCK_MONOTONIC` time.
#[inline]
pub fn monotonic_now() -> Result<TimeSpec, RtError> {
    Ok(clock_gettime(ClockId::CLOCK_MONOTONIC)?)
}

/// Convert a TimeSpec to floating-point seconds.
#[inline]
pub fn timespec_seconds(ts: &TimeSpec) -> f64 {
    ts.tv_sec() as f64 + ts.tv_nsec() as f64 * 1e-9
}

/// Add nanoseconds to a TimeSpec.
fn timespec_add_ns(ts: TimeSpec, ns: i64) -> TimeSpec {
    let total = ts.tv_nsec() + ns;
    let secs = ts.tv_sec() + total.div_euclid(NANOS_PER_SEC);
    let nanos = total.rem_euclid(NANOS_PER_SEC);
    TimeSpec::new(secs, nanos)
}

/// Compute the difference (a - b) in nanoseconds.
#[inline]
pub fn timespec_diff_ns(a: &TimeSpec, b: &TimeSpec) -> i64 {
    (a.tv_sec() - b.tv_sec()) * NANOS_PER_SEC + (a.tv_nsec() - b.tv_nsec())
}

// ─── Cycle Pacing ───────────────────────────────────────────────────

/// Absolute-deadline cycle pacer.
#[derive(Debug)]
pub struct CyclePacer {
    cycle_ns: i64,
    next_wake: TimeSpec,
}

impl CyclePacer {
    /// Start pacing from now.
    ///
    /// Fails if the cycle time is zero or does not fit in nanoseconds.
    pub fn start(cycle_time_us: u64) -> Result<Self, RtError> {
        let cycle_ns = i64::try_from(cycle_time_us)
            .ok()
            .and_then(|us| us.checked_mul(1000))
            .filter(|&ns| ns > 0)
            .ok_or_else(|| RtError::Setup(format!("invalid cycle time {cycle_time_us} us")))?;

        Ok(Self {
            cycle_ns,
            next_wake: monotonic_now()?,
        })
    }

    /// Cycle budget in nanoseconds.
    pub fn cycle_ns(&self) -> i64 {
        self.cycle_ns
    }

    /// Sleep until the next cycle boundary.
    ///
    /// If the boundary has already passed the call returns immediately and
    /// the schedule is not shifted, so later cycles catch up.
    pub fn wait(&mut self) -> Result<(), RtError> {
        self.next_wake = timespec_add_ns(self.next_wake, self.cycle_ns);

        #[cfg(feature = "rt")]
        {
            use nix::time::{ClockNanosleepFlags, clock_nanosleep};
            let _ = clock_nanosleep(
                ClockId::CLOCK_MONOTONIC,
                ClockNanosleepFlags::TIMER_ABSTIME,
                &self.next_wake,
            );
        }

        #[cfg(not(feature = "rt"))]
        {
            let remaining = timespec_diff_ns(&self.next_wake, &monotonic_now()?);
            if remaining > 0 {
                std::thread::sleep(std::time::Duration::from_nanos(remaining as u64));
            }
        }

        Ok(())
    }
}

// ─── Cycle Statistics ───────────────────────────────────────────────

/// O(1) per-cycle timing statistics for the producer.
#[derive(Debug, Clone)]
pub struct CycleStats {
    /// Total cycles executed.
    pub cycle_count: u64,
    /// Minimum cycle work duration [ns].
    pub min_cycle_ns: i64,
    /// Maximum cycle work duration [ns].
    pub max_cycle_ns: i64,
    /// Running sum for average computation.
    pub sum_cycle_ns: i64,
    /// Cycles whose work exceeded the budget.
    pub overruns: u64,
}

impl CycleStats {
    /// Create a new zeroed stats instance.
    pub const fn new() -> Self {
        Self {
            cycle_count: 0,
            min_cycle_ns: i64::MAX,
            max_cycle_ns: 0,
            sum_cycle_ns: 0,
            overruns: 0,
        }
    }

    /// Record a cycle duration. O(1), no allocation.
    #[inline]
    pub fn record(&mut self, duration_ns: i64, budget_ns: i64) {
        self.cycle_count += 1;
        self.min_cycle_ns = self.min_cycle_ns.min(duration_ns);
        self.max_cycle_ns = self.max_cycle_ns.max(duration_ns);
        self.sum_cycle_ns += duration_ns;
        if duration_ns > budget_ns {
            self.overruns += 1;
        }
    }

    /// Average cycle time [ns] (returns 0 if no cycles).
    #[inline]
    pub fn avg_cycle_ns(&self) -> i64 {
        if self.cycle_count == 0 {
            0
        } else {
            self.sum_cycle_ns / self.cycle_count as i64
        }
    }
}

impl Default for CycleStats {
    fn default() -> Self {
        Self::new()
    }
}

// ─── RT Setup ───────────────────────────────────────────────────────

/// Lock all current and future memory pages.
#[cfg(feature = "rt")]
fn rt_mlockall() -> Result<(), RtError> {
    use nix::sys::mman::{MlockallFlags, mlockall};
    mlockall(MlockallFlags::MCL_CURRENT | MlockallFlags::MCL_FUTURE)
        .map_err(|e| RtError::Setup(format!("mlockall failed: {e}")))
}

#[cfg(not(feature = "rt"))]
fn rt_mlockall() -> Result<(), RtError> {
    Ok(())
}

/// Touch a block of stack so the RT loop never faults it in.
fn prefault_stack() {
    let mut buf = [0u8; PREFAULT_STACK_BYTES];
    for byte in buf.iter_mut() {
        // SAFETY: `byte` is a valid exclusive reference into `buf`.
        unsafe { core::ptr::write_volatile(byte, 0xFF) };
    }
    core::hint::black_box(&buf);
}

/// Pin the current thread to a specific CPU core.
#[cfg(feature = "rt")]
fn rt_set_affinity(cpu: usize) -> Result<(), RtError> {
    use nix::sched::{CpuSet, sched_setaffinity};
    use nix::unistd::Pid;

    let mut cpuset = CpuSet::new();
    cpuset
        .set(cpu)
        .map_err(|e| RtError::Setup(format!("CpuSet::set({cpu}) failed: {e}")))?;
    sched_setaffinity(Pid::from_raw(0), &cpuset)
        .map_err(|e| RtError::Setup(format!("sched_setaffinity failed: {e}")))
}

#[cfg(not(feature = "rt"))]
fn rt_set_affinity(_cpu: usize) -> Result<(), RtError> {
    Ok(())
}

/// Set SCHED_FIFO with the given RT priority.
#[cfg(feature = "rt")]
fn rt_set_scheduler(priority: i32) -> Result<(), RtError> {
    let param = libc::sched_param {
        sched_priority: priority,
    };
    // SAFETY: `param` is a valid sched_param; pid 0 is the calling thread.
    let ret = unsafe { libc::sched_setscheduler(0, libc::SCHED_FIFO, &param) };
    if ret != 0 {
        let err = std::io::Error::last_os_error();
        return Err(RtError::Setup(format!(
            "sched_setscheduler(SCHED_FIFO, {priority}) failed: {err}"
        )));
    }
    Ok(())
}

#[cfg(not(feature = "rt"))]
fn rt_set_scheduler(_priority: i32) -> Result<(), RtError> {
    Ok(())
}

/// Prepare the calling thread to act as the RT producer.
///
/// Must be called from the producer thread before its first append.
pub fn rt_setup(cpu_core: usize, rt_priority: i32) -> Result<(), RtError> {
    rt_mlockall()?;
    prefault_stack();
    rt_set_affinity(cpu_core)?;
    rt_set_scheduler(rt_priority)?;
    Ok(())
}
