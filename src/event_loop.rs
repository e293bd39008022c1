//! Event loop primitives: one-shot timers, idle slots and the wall clock
//!
//! Everything here is driven from the loop thread; deadlines are monotonic.

use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tracing::trace;

/// Handle of an armed one-shot timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(u64);

/// Timer classes; at most one of each is outstanding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Minute-boundary redraw
    Tick,
    /// Show transition before a capture flush
    Drawing,
    /// Delay after a language change
    Settle,
    /// Exit after a background settings update
    AutoClose,
}

#[derive(Debug, Clone, Copy)]
struct Timer {
    id: TimerId,
    kind: TimerKind,
    deadline: Instant,
    delay: Duration,
}

#[derive(Debug, Default)]
pub struct TimerQueue {
    timers: Vec<Timer>,
    next_id: u64,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm a one-shot timer firing `delay` after `now`
    pub fn add(&mut self, kind: TimerKind, delay: Duration, now: Instant) -> TimerId {
        self.next_id += 1;
        let id = TimerId(self.next_id);
        self.timers.push(Timer {
            id,
            kind,
            deadline: now + delay,
            delay,
        });
        trace!(id = id.0, kind = ?kind, delay_ms = delay.as_millis() as u64, "Timer armed");
        id
    }

    /// Cancel a timer; returns false if it already fired or was canceled
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.timers.len();
        self.timers.retain(|t| t.id != id);
        let removed = self.timers.len() != before;
        if removed {
            trace!(id = id.0, "Timer canceled");
        }
        removed
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.timers.iter().any(|t| t.id == id)
    }

    /// Pending timers of `kind` with their requested delays
    pub fn pending(&self, kind: TimerKind) -> Vec<(TimerId, Duration)> {
        self.timers
            .iter()
            .filter(|t| t.kind == kind)
            .map(|t| (t.id, t.delay))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.iter().map(|t| t.deadline).min()
    }

    /// Remove and return every timer due at `now`, earliest first
    pub fn pop_expired(&mut self, now: Instant) -> Vec<(TimerId, TimerKind)> {
        let mut due: Vec<Timer> = Vec::new();
        self.timers.retain(|t| {
            if t.deadline <= now {
                due.push(*t);
                false
            } else {
                true
            }
        });
        due.sort_by_key(|t| (t.deadline, t.id));
        due.into_iter().map(|t| (t.id, t.kind)).collect()
    }
}

/// Work deferred to the next idle slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleTask {
    /// Rasterise and write the capture dump
    FlushCapture,
}

#[derive(Debug, Default)]
pub struct IdleQueue {
    tasks: VecDeque<IdleTask>,
}

impl IdleQueue {
    pub fn push(&mut self, task: IdleTask) {
        if !self.tasks.contains(&task) {
            self.tasks.push_back(task);
        }
    }

    pub fn pop(&mut self) -> Option<IdleTask> {
        self.tasks.pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn clear(&mut self) {
        self.tasks.clear();
    }
}

/// Source of wall-clock time for rendering and tick alignment
pub trait WallClock {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl WallClock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Settable clock for tests
#[cfg(test)]
#[derive(Debug, Clone)]
pub struct FixedClock(pub std::rc::Rc<std::cell::Cell<DateTime<Utc>>>);

#[cfg(test)]
impl FixedClock {
    pub fn at(time: DateTime<Utc>) -> Self {
        Self(std::rc::Rc::new(std::cell::Cell::new(time)))
    }

    pub fn set(&self, time: DateTime<Utc>) {
        self.0.set(time);
    }
}

#[cfg(test)]
impl WallClock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pop_expired_in_deadline_order() {
        let start = Instant::now();
        let mut timers = TimerQueue::new();
        let late = timers.add(TimerKind::Tick, Duration::from_secs(30), start);
        let early = timers.add(TimerKind::Drawing, Duration::from_millis(150), start);
        let _future = timers.add(TimerKind::AutoClose, Duration::from_secs(90), start);

        assert_eq!(timers.next_deadline(), Some(start + Duration::from_millis(150)));

        let fired = timers.pop_expired(start + Duration::from_secs(60));
        assert_eq!(fired, vec![(early, TimerKind::Drawing), (late, TimerKind::Tick)]);
        assert_eq!(timers.len(), 1);
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let start = Instant::now();
        let mut timers = TimerQueue::new();
        let id = timers.add(TimerKind::Settle, Duration::from_secs(1), start);
        assert!(timers.is_pending(id));
        assert!(timers.cancel(id));
        assert!(!timers.cancel(id));
        assert!(timers.pop_expired(start + Duration::from_secs(5)).is_empty());
    }

    #[test]
    fn test_pending_reports_delay() {
        let mut timers = TimerQueue::new();
        let id = timers.add(TimerKind::Tick, Duration::from_secs(42), Instant::now());
        assert_eq!(timers.pending(TimerKind::Tick), vec![(id, Duration::from_secs(42))]);
        assert!(timers.pending(TimerKind::Drawing).is_empty());
    }

    #[test]
    fn test_idle_queue_deduplicates() {
        let mut idle = IdleQueue::default();
        idle.push(IdleTask::FlushCapture);
        idle.push(IdleTask::FlushCapture);
        assert_eq!(idle.pop(), Some(IdleTask::FlushCapture));
        assert!(idle.is_empty());
    }
}
