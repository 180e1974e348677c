/*
timer.rs

Copyright 2025 The Cogniplay developers

This file is part of Cogniplay.

Cogniplay is free software: you can redistribute it and/or modify it under the
terms of the GNU General Public License as published by the Free Software
Foundation, either version 3 of the License, or (at your option) any later
version.

Cogniplay is distributed in the hope that it will be useful, but WITHOUT ANY
WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR
A PARTICULAR PURPOSE. See the GNU General Public License for more details.

You should have received a copy of the GNU General Public License along with
Cogniplay. If not, see <https://www.gnu.org/licenses/>.

SPDX-License-Identifier: GPL-3.0-or-later
*/

//! Level countdown.
//!
//! The remaining time is never decremented. It is recomputed from the time elapsed since the
//! level started and from the penalty accumulated by wrong answers (see [`remaining`]). Late or
//! missed ticks therefore do not make the countdown drift, and a penalty shows up at the next
//! tick.
//!
//! [`LevelTimer`] holds the countdown of one level and reports the expiry exactly once.
//! [`Ticker`] runs a background thread that polls a shared [`LevelTimer`] at a fixed period and
//! publishes [`TimerEvent`] objects through an [`async_channel`] channel. The returned
//! [`TickerHandle`] cancels the thread. Polling and publishing happen while holding the timer
//! lock, so once [`TickerHandle::cancel`] (or [`SharedTimer::cancel`]) returns, no other event
//! is published.

use async_channel::Sender;
use log::debug;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Default tick period.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Remaining seconds for a level, clamped at zero.
pub fn remaining(level_start: Instant, base_limit_secs: u64, penalty_secs: u64, now: Instant) -> u64 {
    let elapsed: u64 = now.saturating_duration_since(level_start).as_secs();
    base_limit_secs
        .saturating_sub(elapsed)
        .saturating_sub(penalty_secs)
}

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    origin: Instant,
    offset: Arc<Mutex<Duration>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    /// Create a [`ManualClock`] object.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock().unwrap_or_else(PoisonError::into_inner);
        *offset += by;
    }

    pub fn advance_secs(&self, secs: u64) {
        self.advance(Duration::from_secs(secs));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + *self.offset.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Event published at each tick.
///
/// The epoch identifies the level entry that produced the event, so that a consumer can drop
/// events coming from a level that is already over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// Remaining time after the tick.
    Tick { epoch: u64, remaining: u64 },

    /// The time is over. Published once per level.
    Expired { epoch: u64 },
}

impl TimerEvent {
    pub fn epoch(&self) -> u64 {
        match self {
            TimerEvent::Tick { epoch, .. } | TimerEvent::Expired { epoch } => *epoch,
        }
    }
}

/// Countdown of one level.
#[derive(Debug, Clone)]
pub struct LevelTimer {
    epoch: u64,
    start: Instant,
    limit_secs: u64,
    penalty_secs: u64,
    expired: bool,
    cancelled: bool,
}

impl LevelTimer {
    /// Create a [`LevelTimer`] object started at `start`.
    pub fn new(epoch: u64, start: Instant, limit_secs: u64) -> Self {
        Self {
            epoch,
            start,
            limit_secs,
            penalty_secs: 0,
            expired: false,
            cancelled: false,
        }
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn start(&self) -> Instant {
        self.start
    }

    pub fn limit_secs(&self) -> u64 {
        self.limit_secs
    }

    /// Accumulated penalty.
    pub fn penalty_secs(&self) -> u64 {
        self.penalty_secs
    }

    /// Add a penalty. The next computation of the remaining time reflects it.
    pub fn add_penalty(&mut self, secs: u64) {
        self.penalty_secs = self.penalty_secs.saturating_add(secs);
    }

    /// Whole seconds elapsed since the level started.
    pub fn elapsed_secs(&self, now: Instant) -> u64 {
        now.saturating_duration_since(self.start).as_secs()
    }

    /// Remaining seconds, clamped at zero.
    pub fn remaining(&self, now: Instant) -> u64 {
        if self.expired {
            return 0;
        }
        remaining(self.start, self.limit_secs, self.penalty_secs, now)
    }

    pub fn is_expired(&self) -> bool {
        self.expired
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Whether the timer still produces events.
    pub fn is_running(&self) -> bool {
        !self.expired && !self.cancelled
    }

    /// Recompute the remaining time.
    ///
    /// Return [`TimerEvent::Expired`] the first time the remaining time is zero, and None once the
    /// timer is expired or cancelled.
    pub fn poll(&mut self, now: Instant) -> Option<TimerEvent> {
        if !self.is_running() {
            return None;
        }
        let remaining: u64 = self.remaining(now);
        if remaining == 0 {
            self.expired = true;
            debug!("Timer {} expired", self.epoch);
            return Some(TimerEvent::Expired { epoch: self.epoch });
        }
        Some(TimerEvent::Tick {
            epoch: self.epoch,
            remaining,
        })
    }

    /// Stop the timer. Return whether it was running. Cancelling twice does nothing.
    pub fn cancel(&mut self) -> bool {
        let was_running: bool = self.is_running();
        self.cancelled = true;
        was_running
    }
}

/// [`LevelTimer`] shared between the game controller and a [`Ticker`] thread.
#[derive(Debug)]
pub struct SharedTimer {
    timer: Mutex<LevelTimer>,
    wake: Condvar,
}

impl SharedTimer {
    /// Create a [`SharedTimer`] object.
    pub fn new(timer: LevelTimer) -> Arc<Self> {
        Arc::new(Self {
            timer: Mutex::new(timer),
            wake: Condvar::new(),
        })
    }

    /// Lock the timer.
    pub fn lock(&self) -> MutexGuard<'_, LevelTimer> {
        self.timer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cancel the timer and wake up the ticker thread.
    pub fn cancel(&self) -> bool {
        let was_running: bool = self.lock().cancel();
        self.wake.notify_all();
        was_running
    }
}

/// Background thread that ticks a [`SharedTimer`].
pub struct Ticker;

impl Ticker {
    /// Start ticking the timer every `period`, publishing the events to `sender`.
    ///
    /// The thread stops after publishing [`TimerEvent::Expired`], when the timer is cancelled, or
    /// when the channel is closed.
    pub fn spawn(
        timer: Arc<SharedTimer>,
        clock: Arc<dyn Clock>,
        period: Duration,
        sender: Sender<TimerEvent>,
    ) -> TickerHandle {
        let shared: Arc<SharedTimer> = Arc::clone(&timer);
        let thread: JoinHandle<()> = thread::spawn(move || {
            let mut guard: MutexGuard<'_, LevelTimer> = shared.lock();
            loop {
                guard = shared
                    .wake
                    .wait_timeout_while(guard, period, |t| !t.is_cancelled())
                    .unwrap_or_else(PoisonError::into_inner)
                    .0;
                let Some(event) = guard.poll(clock.now()) else {
                    break;
                };
                if sender.try_send(event).is_err() {
                    debug!("Timer {}: channel closed", guard.epoch());
                    break;
                }
                if matches!(event, TimerEvent::Expired { .. }) {
                    break;
                }
            }
        });
        TickerHandle {
            timer,
            thread: Some(thread),
        }
    }
}

/// Cancellation handle of a [`Ticker`] thread. Dropping the handle cancels the thread.
pub struct TickerHandle {
    timer: Arc<SharedTimer>,
    thread: Option<JoinHandle<()>>,
}

impl TickerHandle {
    /// Cancel the timer and wait for the thread to stop. Calling it again does nothing.
    pub fn cancel(&mut self) {
        self.timer.cancel();
        if let Some(thread) = self.thread.take()
            && thread.join().is_err()
        {
            debug!("Ticker thread panicked");
        }
    }

    /// Whether the thread is still attached to the handle.
    pub fn is_active(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Drop for TickerHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn remaining_is_recomputed_from_elapsed_time() {
        let start = Instant::now();
        assert_eq!(remaining(start, 60, 0, start), 60);
        assert_eq!(remaining(start, 60, 0, start + Duration::from_millis(1999)), 59);
        assert_eq!(remaining(start, 60, 10, start + Duration::from_secs(5)), 45);
        assert_eq!(remaining(start, 60, 50, start + Duration::from_secs(20)), 0);
        // A clock that reads before the start counts as no time elapsed
        assert_eq!(remaining(start + Duration::from_secs(3), 60, 0, start), 60);
    }

    #[test]
    fn penalty_shows_at_next_poll() {
        let clock = ManualClock::new();
        let mut timer = LevelTimer::new(1, clock.now(), 30);
        clock.advance_secs(2);
        assert_eq!(timer.poll(clock.now()), Some(TimerEvent::Tick { epoch: 1, remaining: 28 }));
        timer.add_penalty(8);
        assert_eq!(timer.poll(clock.now()), Some(TimerEvent::Tick { epoch: 1, remaining: 20 }));
    }

    #[test]
    fn expiry_fires_once() {
        let clock = ManualClock::new();
        let mut timer = LevelTimer::new(4, clock.now(), 3);
        clock.advance_secs(10);
        assert_eq!(timer.poll(clock.now()), Some(TimerEvent::Expired { epoch: 4 }));
        assert_eq!(timer.poll(clock.now()), None);
        assert!(timer.is_expired());
        assert_eq!(timer.remaining(clock.now()), 0);
    }

    #[test]
    fn cancel_is_idempotent() {
        let clock = ManualClock::new();
        let mut timer = LevelTimer::new(1, clock.now(), 3);
        assert!(timer.cancel());
        assert!(!timer.cancel());
        clock.advance_secs(10);
        assert_eq!(timer.poll(clock.now()), None);
        assert!(!timer.is_expired());
    }

    #[test]
    fn ticker_publishes_ticks_then_expiry() {
        let clock = ManualClock::new();
        let shared = SharedTimer::new(LevelTimer::new(7, clock.now(), 2));
        let (sender, receiver) = async_channel::unbounded();
        clock.advance_secs(1);
        let mut handle = Ticker::spawn(
            Arc::clone(&shared),
            Arc::new(clock.clone()),
            Duration::from_millis(5),
            sender,
        );
        assert_eq!(
            receiver.recv_blocking(),
            Ok(TimerEvent::Tick { epoch: 7, remaining: 1 })
        );
        clock.advance_secs(1);
        let mut expired = 0;
        while let Ok(event) = receiver.recv_blocking() {
            if let TimerEvent::Expired { epoch } = event {
                assert_eq!(epoch, 7);
                expired += 1;
            }
        }
        // The channel closes when the thread stops after the expiry
        assert_eq!(expired, 1);
        handle.cancel();
        handle.cancel();
        assert!(!handle.is_active());
    }

    #[test]
    fn cancelled_ticker_never_publishes_expiry() {
        let clock = ManualClock::new();
        let shared = SharedTimer::new(LevelTimer::new(1, clock.now(), 5));
        let (sender, receiver) = async_channel::unbounded();
        let mut handle = Ticker::spawn(
            Arc::clone(&shared),
            Arc::new(clock.clone()),
            Duration::from_millis(2),
            sender,
        );
        handle.cancel();
        clock.advance_secs(60);
        thread::sleep(Duration::from_millis(20));
        while let Ok(event) = receiver.try_recv() {
            assert!(matches!(event, TimerEvent::Tick { .. }));
        }
        assert!(receiver.is_closed());
        drop(handle);
    }

    proptest! {
        #[test]
        fn remaining_drops_with_each_penalty(limit in 1u64..600, penalty in 1u64..30, wrong in 0u64..40) {
            let start = Instant::now();
            let before = remaining(start, limit, wrong * penalty, start);
            let after = remaining(start, limit, (wrong + 1) * penalty, start);
            if before > 0 {
                prop_assert!(after < before);
            } else {
                prop_assert_eq!(after, 0);
            }
        }
    }
}
