//! Fixed-capacity SPSC motion log.
//!
//! [`MotionLog`] owns a slot arena sized to [`MOTION_LOG_MAX`] at
//! construction and never allocates again. The active capacity is a logical
//! window over the first `capacity` slots.
//!
//! ## Lock-Free Protocol
//!
//! ```text
//!            producer (RT)                      consumer (non-RT)
//!   head ──► total records appended      tail ──► next position to drain
//!
//!   slot[pos % capacity].stamp
//!       2·pos + 1   write of `pos` in progress
//!       2·pos + 2   `pos` committed
//! ```
//!
//! - `head` is written only by the producer, `tail` only by the consumer.
//!   The producer never reads `tail` and never waits.
//! - Append: stamp odd → payload → stamp even (Release) → `head = pos + 1`
//!   (Release). A drain therefore never sees a slot before it is committed.
//! - When `head − tail > capacity` the oldest positions were overwritten.
//!   The consumer skips them and counts them in [`MotionLog::overwritten`].
//! - Drain copies the payload between two stamp checks. If the producer
//!   laps the slot during the copy the stamps differ, the copy is discarded
//!   and counted as overwritten. A torn record is never returned.
//!
//! Logical `start = max(tail, head − capacity) mod capacity`,
//! `end = head mod capacity`, `count = head − max(tail, head − capacity)`.

use core::cell::UnsafeCell;
use core::mem::MaybeUninit;
use core::sync::atomic::{AtomicU64, Ordering, fence};

use evo_common::consts::{CACHE_LINE_SIZE, MOTION_LOG_MAX};
use static_assertions::const_assert_eq;
use tracing::{debug, info};

use crate::error::{LogError, LogResult};
use crate::record::{LogKind, LogRecord};

/// Stamp of a slot that has never been written in this session.
const EMPTY_STAMP: u64 = 0;

#[inline]
const fn write_stamp(pos: u64) -> u64 {
    pos * 2 + 1
}

#[inline]
const fn commit_stamp(pos: u64) -> u64 {
    pos * 2 + 2
}

/// One record slot, cache-line aligned.
#[repr(C, align(64))]
struct Slot {
    stamp: AtomicU64,
    record: UnsafeCell<MaybeUninit<LogRecord>>,
}

const_assert_eq!(core::mem::size_of::<Slot>(), CACHE_LINE_SIZE);

impl Slot {
    fn empty() -> Self {
        Self {
            stamp: AtomicU64::new(EMPTY_STAMP),
            record: UnsafeCell::new(MaybeUninit::uninit()),
        }
    }
}

/// Position counter on its own cache line.
#[repr(C, align(64))]
struct Cursor(AtomicU64);

impl Cursor {
    const fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    #[inline]
    fn load(&self, order: Ordering) -> u64 {
        self.0.load(order)
    }

    #[inline]
    fn store(&self, value: u64, order: Ordering) {
        self.0.store(value, order);
    }

    fn reset(&mut self) {
        *self.0.get_mut() = 0;
    }
}

/// Point-in-time view of the log counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogStatus {
    /// Configured record kind.
    pub kind: LogKind,
    /// Active capacity.
    pub capacity: usize,
    /// Index of the oldest unread record.
    pub start: usize,
    /// Index of the next write slot.
    pub end: usize,
    /// Records currently held.
    pub count: usize,
    /// Records appended since the last initialize.
    pub appended: u64,
    /// Records lost to overwrite-oldest since the last initialize.
    pub overwritten: u64,
}

/// Fixed-capacity circular telemetry log for one record kind.
///
/// `initialize` needs `&mut self`, so it cannot run while a
/// [`LogProducer`] / [`LogConsumer`] pair from [`split`](Self::split) is alive.
pub struct MotionLog {
    head: Cursor,
    tail: Cursor,
    overwritten: Cursor,
    kind: LogKind,
    capacity: usize,
    slots: Box<[Slot]>,
}

// SAFETY: slot payloads are written only by the single producer and read
// only by the single consumer under the stamp protocol. `split` and the
// `&mut self` entry points guarantee at most one of each.
unsafe impl Sync for MotionLog {}

impl MotionLog {
    /// Allocate the full slot arena and initialize the first session.
    ///
    /// This is the only allocation the log performs.
    pub fn new(kind: LogKind, capacity: usize) -> LogResult<Self> {
        validate_capacity(capacity)?;

        let slots: Box<[Slot]> = (0..MOTION_LOG_MAX).map(|_| Slot::empty()).collect();
        let mut log = Self {
            head: Cursor::new(),
            tail: Cursor::new(),
            overwritten: Cursor::new(),
            kind,
            capacity,
            slots,
        };
        log.initialize(kind, capacity)?;
        Ok(log)
    }

    /// Start a new logging session.
    ///
    /// Discards every held record and resets all counters. On error the
    /// current session is left untouched.
    pub fn initialize(&mut self, kind: LogKind, capacity: usize) -> LogResult<()> {
        validate_capacity(capacity)?;

        for slot in self.slots.iter_mut() {
            *slot.stamp.get_mut() = EMPTY_STAMP;
        }
        self.head.reset();
        self.tail.reset();
        self.overwritten.reset();
        self.kind = kind;
        self.capacity = capacity;

        info!(%kind, capacity, "Motion log initialized");
        Ok(())
    }

    /// Append a record, overwriting the oldest one when full.
    pub fn append(&mut self, record: LogRecord) -> LogResult<()> {
        self.produce(record)
    }

    /// Remove and return the oldest unread record.
    pub fn drain(&mut self) -> Option<LogRecord> {
        self.consume()
    }

    /// Split into producer and consumer handles for concurrent use.
    pub fn split(&mut self) -> (LogProducer<'_>, LogConsumer<'_>) {
        let log: &MotionLog = self;
        (LogProducer { log }, LogConsumer { log })
    }

    /// Configured record kind.
    #[inline]
    pub fn kind(&self) -> LogKind {
        self.kind
    }

    /// Active capacity.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Physical slot count, independent of the active capacity.
    #[inline]
    pub fn max_capacity(&self) -> usize {
        self.slots.len()
    }

    /// Records currently held.
    pub fn count(&self) -> usize {
        self.status().count
    }

    /// Index of the oldest unread record.
    pub fn start(&self) -> usize {
        self.status().start
    }

    /// Index of the next write slot.
    pub fn end(&self) -> usize {
        self.status().end
    }

    /// True if no record is available.
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// True if the next append overwrites the oldest record.
    pub fn is_full(&self) -> bool {
        self.count() == self.capacity
    }

    /// Records appended since the last initialize.
    pub fn appended(&self) -> u64 {
        self.head.load(Ordering::Acquire)
    }

    /// Records lost to overwrite-oldest since the last initialize,
    /// including evictions the consumer has not stepped over yet.
    pub fn overwritten(&self) -> u64 {
        self.status().overwritten
    }

    /// Consistent snapshot of all counters.
    pub fn status(&self) -> LogStatus {
        // tail first: a later head load can only be larger.
        let tail = self.tail.load(Ordering::Acquire);
        let head = self.head.load(Ordering::Acquire).max(tail);
        let oldest = self.oldest(tail, head);
        let cap = self.capacity as u64;

        LogStatus {
            kind: self.kind,
            capacity: self.capacity,
            start: (oldest % cap) as usize,
            end: (head % cap) as usize,
            count: (head - oldest) as usize,
            appended: head,
            overwritten: self.overwritten.load(Ordering::Relaxed) + (oldest - tail),
        }
    }

    #[inline]
    fn oldest(&self, tail: u64, head: u64) -> u64 {
        tail.max(head.saturating_sub(self.capacity as u64))
    }

    #[inline]
    fn slot(&self, pos: u64) -> &Slot {
        &self.slots[(pos % self.capacity as u64) as usize]
    }

    /// Producer side. Callers must be the only producer.
    #[inline]
    fn produce(&self, record: LogRecord) -> LogResult<()> {
        let found = record.kind();
        if found != self.kind {
            return Err(LogError::KindMismatch {
                expected: self.kind,
                found,
            });
        }

        let pos = self.head.load(Ordering::Relaxed);
        let slot = self.slot(pos);

        slot.stamp.store(write_stamp(pos), Ordering::Relaxed);
        fence(Ordering::Release);
        // SAFETY: sole producer. A consumer copying this slot concurrently
        // sees the odd stamp and discards its copy.
        unsafe { slot.record.get().write_volatile(MaybeUninit::new(record)) };
        slot.stamp.store(commit_stamp(pos), Ordering::Release);

        self.head.store(pos + 1, Ordering::Release);
        Ok(())
    }

    /// Consumer side. Callers must be the only consumer.
    fn consume(&self) -> Option<LogRecord> {
        let initial_tail = self.tail.load(Ordering::Relaxed);
        let mut tail = initial_tail;
        let mut lost = 0u64;

        let record = loop {
            let head = self.head.load(Ordering::Acquire);
            if tail >= head {
                break None;
            }

            let pos = self.oldest(tail, head);
            lost += pos - tail;
            tail = pos + 1;

            if let Some(record) = self.read_slot(pos) {
                break Some(record);
            }
            // Slot was reclaimed while copying.
            lost += 1;
        };

        if tail != initial_tail {
            self.tail.store(tail, Ordering::Release);
        }
        if lost > 0 {
            self.overwritten.0.fetch_add(lost, Ordering::Relaxed);
            debug!(lost, kind = %self.kind, "Motion log records overwritten before drain");
        }
        record
    }

    fn read_slot(&self, pos: u64) -> Option<LogRecord> {
        let slot = self.slot(pos);
        let expected = commit_stamp(pos);

        if slot.stamp.load(Ordering::Acquire) != expected {
            return None;
        }
        // SAFETY: position `pos` was committed. A concurrent overwrite is
        // caught by the stamp re-check before the copy is used.
        let copy = unsafe { slot.record.get().read_volatile() };
        fence(Ordering::Acquire);
        if slot.stamp.load(Ordering::Relaxed) != expected {
            return None;
        }
        // SAFETY: stamp unchanged across the copy, so it is the committed record.
        Some(unsafe { copy.assume_init() })
    }

    fn consume_batch<const N: usize>(&self) -> heapless::Vec<LogRecord, N> {
        let mut batch = heapless::Vec::new();
        while !batch.is_full() {
            let Some(record) = self.consume() else { break };
            if batch.push(record).is_err() {
                break;
            }
        }
        batch
    }
}

impl core::fmt::Debug for MotionLog {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MotionLog")
            .field("status", &self.status())
            .finish()
    }
}

fn validate_capacity(capacity: usize) -> LogResult<()> {
    if capacity == 0 || capacity > MOTION_LOG_MAX {
        return Err(LogError::InvalidCapacity {
            requested: capacity,
            max: MOTION_LOG_MAX,
        });
    }
    Ok(())
}

/// Producer handle. Append never blocks and never allocates.
#[derive(Debug)]
pub struct LogProducer<'a> {
    log: &'a MotionLog,
}

impl LogProducer<'_> {
    /// Append a record, overwriting the oldest one when full.
    #[inline]
    pub fn append(&mut self, record: LogRecord) -> LogResult<()> {
        self.log.produce(record)
    }

    /// Configured record kind.
    #[inline]
    pub fn kind(&self) -> LogKind {
        self.log.kind
    }
}

/// Consumer handle. Drain never blocks; poll it at any cadence.
#[derive(Debug)]
pub struct LogConsumer<'a> {
    log: &'a MotionLog,
}

impl LogConsumer<'_> {
    /// Remove and return the oldest unread record.
    #[inline]
    pub fn drain(&mut self) -> Option<LogRecord> {
        self.log.consume()
    }

    /// Drain up to `N` records, oldest first, without heap allocation.
    pub fn drain_batch<const N: usize>(&mut self) -> heapless::Vec<LogRecord, N> {
        self.log.consume_batch()
    }

    /// Counter snapshot.
    pub fn status(&self) -> LogStatus {
        self.log.status()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn axis_pos(t: f64) -> LogRecord {
        LogRecord::axis_position(t, t * 10.0, t * 10.0 - 0.5)
    }

    fn times(log: &mut MotionLog) -> Vec<f64> {
        std::iter::from_fn(|| log.drain()).map(|r| r.time).collect()
    }

    #[test]
    fn stamps_are_odd_while_writing_and_even_when_committed() {
        for pos in [0u64, 1, 9_999, 1 << 40] {
            assert_eq!(write_stamp(pos) % 2, 1);
            assert_eq!(commit_stamp(pos) % 2, 0);
            assert!(commit_stamp(pos) > write_stamp(pos));
            assert_ne!(commit_stamp(pos), EMPTY_STAMP);
        }
    }

    #[test]
    fn slot_and_cursor_are_cache_line_sized() {
        assert_eq!(core::mem::size_of::<Slot>(), CACHE_LINE_SIZE);
        assert_eq!(core::mem::align_of::<Cursor>(), CACHE_LINE_SIZE);
    }

    #[test]
    fn new_allocates_full_arena() {
        let log = MotionLog::new(LogKind::AxisPosition, 3).unwrap();
        assert_eq!(log.capacity(), 3);
        assert_eq!(log.max_capacity(), MOTION_LOG_MAX);
        assert!(log.is_empty());
        assert_eq!(log.start(), 0);
        assert_eq!(log.end(), 0);
    }

    #[test]
    fn capacity_bounds() {
        assert!(matches!(
            MotionLog::new(LogKind::Command, 0),
            Err(LogError::InvalidCapacity { requested: 0, .. })
        ));
        assert!(matches!(
            MotionLog::new(LogKind::Command, MOTION_LOG_MAX + 1),
            Err(LogError::InvalidCapacity { .. })
        ));
        assert!(MotionLog::new(LogKind::Command, 1).is_ok());
        assert!(MotionLog::new(LogKind::Command, MOTION_LOG_MAX).is_ok());
    }

    #[test]
    fn failed_initialize_keeps_session() {
        let mut log = MotionLog::new(LogKind::AxisPosition, 4).unwrap();
        log.append(axis_pos(1.0)).unwrap();

        assert!(log.initialize(LogKind::Command, 0).is_err());
        assert_eq!(log.kind(), LogKind::AxisPosition);
        assert_eq!(log.capacity(), 4);
        assert_eq!(log.count(), 1);
    }

    #[test]
    fn overwrite_keeps_last_capacity_records() {
        let mut log = MotionLog::new(LogKind::AxisPosition, 3).unwrap();
        for t in 1..=5 {
            log.append(axis_pos(t as f64)).unwrap();
        }
        assert!(log.is_full());
        assert_eq!(log.start(), log.end());
        assert_eq!(log.overwritten(), 2);

        assert_eq!(times(&mut log), vec![3.0, 4.0, 5.0]);
        assert!(log.drain().is_none());
        assert_eq!(log.overwritten(), 2);
    }

    #[test]
    fn end_equals_start_plus_count_mod_capacity() {
        let mut log = MotionLog::new(LogKind::AxisPosition, 5).unwrap();
        for i in 0..23 {
            log.append(axis_pos(i as f64)).unwrap();
            if i % 3 == 0 {
                log.drain();
            }
            let s = log.status();
            assert!(s.count <= s.capacity);
            assert_eq!(s.end, (s.start + s.count) % s.capacity);
        }
    }

    #[test]
    fn kind_mismatch_leaves_counters() {
        let mut log = MotionLog::new(LogKind::AxisVelocity, 4).unwrap();
        log.append(LogRecord::axis_velocity(0.1, 1.0, 0.9)).unwrap();
        let before = log.status();

        let err = log.append(LogRecord::command(0.2, 3, 1)).unwrap_err();
        assert_eq!(
            err,
            LogError::KindMismatch {
                expected: LogKind::AxisVelocity,
                found: LogKind::Command,
            }
        );
        assert_eq!(log.status(), before);
    }

    #[test]
    fn drain_batch_respects_bound() {
        let mut log = MotionLog::new(LogKind::AxisPosition, 10).unwrap();
        for t in 0..7 {
            log.append(axis_pos(t as f64)).unwrap();
        }
        let (_producer, mut consumer) = log.split();

        let first = consumer.drain_batch::<4>();
        assert_eq!(first.len(), 4);
        assert_eq!(first[0].time, 0.0);
        assert_eq!(first[3].time, 3.0);

        let rest = consumer.drain_batch::<4>();
        assert_eq!(rest.len(), 3);
        assert_eq!(rest[2].time, 6.0);
        assert!(consumer.drain_batch::<4>().is_empty());
    }

    #[test]
    fn full_batch_consumes_nothing_extra() {
        let mut log = MotionLog::new(LogKind::AxisPosition, 10).unwrap();
        for t in 0..3 {
            log.append(axis_pos(t as f64)).unwrap();
        }
        let (_producer, mut consumer) = log.split();

        assert!(consumer.drain_batch::<0>().is_empty());
        assert_eq!(consumer.status().count, 3);

        let exact = consumer.drain_batch::<3>();
        assert_eq!(exact.len(), 3);
        assert_eq!(consumer.status().count, 0);
        assert_eq!(consumer.status().overwritten, 0);
    }

    #[test]
    fn reinitialize_discards_and_switches_kind() {
        let mut log = MotionLog::new(LogKind::AxisPosition, 3).unwrap();
        for t in 0..5 {
            log.append(axis_pos(t as f64)).unwrap();
        }
        log.drain();

        log.initialize(LogKind::TrajectoryPosition, 2).unwrap();
        assert_eq!(log.status().count, 0);
        assert_eq!(log.appended(), 0);
        assert_eq!(log.overwritten(), 0);
        assert!(log.drain().is_none());
        assert!(log.append(axis_pos(9.0)).is_err());

        let rec = LogRecord::trajectory_position(9.0, crate::record::Cartesian::new(1.0, 0.0, 0.0));
        log.append(rec).unwrap();
        assert_eq!(log.drain(), Some(rec));
    }
}
