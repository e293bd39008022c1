//! Minute-aligned tick scheduling
//!
//! The scheduler only tracks state and the pending handle; the loop owns the timer queue.

use std::time::{Duration, Instant};
use tracing::debug;

use crate::event_loop::{TimerId, TimerKind, TimerQueue};

/// Delay until the next minute boundary, in whole seconds (1..=60)
pub fn next_minute_delay(second: u32) -> Duration {
    Duration::from_secs(u64::from(60 - second.min(59)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickState {
    Idle,
    Armed,
    Suspended,
}

/// What a fired tick asks the caller to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickAction {
    Render,
    /// Re-armed, but the display is off
    SkipRender,
    /// Not the current handle
    Stale,
}

#[derive(Debug)]
pub struct TickScheduler {
    state: TickState,
    pending: Option<TimerId>,
}

impl Default for TickScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl TickScheduler {
    pub fn new() -> Self {
        Self {
            state: TickState::Idle,
            pending: None,
        }
    }

    pub fn state(&self) -> TickState {
        self.state
    }

    pub fn pending(&self) -> Option<TimerId> {
        self.pending
    }

    pub fn is_display_on(&self) -> bool {
        self.state != TickState::Suspended
    }

    /// Arm the first tick
    pub fn start(&mut self, timers: &mut TimerQueue, second: u32, now: Instant) {
        self.rearm(timers, second, now);
        if self.state == TickState::Idle {
            self.state = TickState::Armed;
        }
    }

    /// Cancel the pending tick (if any) and arm a new one at the next minute boundary
    pub fn rearm(&mut self, timers: &mut TimerQueue, second: u32, now: Instant) -> TimerId {
        if let Some(old) = self.pending.take() {
            timers.cancel(old);
        }
        let delay = next_minute_delay(second);
        let id = timers.add(TimerKind::Tick, delay, now);
        debug!(delay_secs = delay.as_secs(), "Tick armed");
        self.pending = Some(id);
        id
    }

    /// Handle a fired tick timer; always re-arms when `id` is current
    pub fn on_fire(&mut self, timers: &mut TimerQueue, id: TimerId, second: u32, now: Instant) -> TickAction {
        if self.pending != Some(id) {
            debug!(?id, "Ignoring stale tick");
            return TickAction::Stale;
        }
        // The fired handle may still be queued; rearm cancels it
        self.rearm(timers, second, now);

        match self.state {
            TickState::Suspended => TickAction::SkipRender,
            _ => {
                self.state = TickState::Armed;
                TickAction::Render
            }
        }
    }

    /// Display went off; the pending tick stays armed
    pub fn display_off(&mut self) {
        self.state = TickState::Suspended;
    }

    /// Display came back; re-arm to the next boundary
    pub fn display_on(&mut self, timers: &mut TimerQueue, second: u32, now: Instant) {
        self.state = TickState::Armed;
        self.rearm(timers, second, now);
    }

    /// Cancel the pending tick and go idle
    pub fn stop(&mut self, timers: &mut TimerQueue) {
        if let Some(id) = self.pending.take() {
            timers.cancel(id);
        }
        self.state = TickState::Idle;
    }
}
