//! Operator control state for the movement loop.
//!
//! Shared atomic state used by the mover loop and the operator REST
//! API. The operator can pause/resume, change the tick interval, and
//! trigger a clean shutdown -- all without stopping the process. The
//! loop always finishes the tick in flight before honoring a stop.
//!
//! # Architecture
//!
//! All mutable control fields use [`std::sync::atomic`] types wrapped in
//! [`std::sync::Arc`] by callers, so they can be shared between the loop
//! task and HTTP handler tasks without locks on the hot path.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, Notify};

/// Reason why the mover loop ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoverEndReason {
    /// An operator issued a stop command.
    OperatorStop,
    /// Reached the configured `max_ticks` limit.
    MaxTicksReached,
}

/// Shared operator control state.
#[derive(Debug)]
pub struct OperatorState {
    /// Whether the loop is currently paused.
    paused: AtomicBool,

    /// Notification used to wake the loop when resumed.
    resume_notify: Notify,

    /// Whether a stop has been requested.
    stop_requested: AtomicBool,

    /// Current tick interval in milliseconds (runtime-adjustable).
    tick_interval_ms: AtomicU64,

    /// Ticks completed since start.
    ticks_completed: AtomicU64,

    /// Wall-clock time when the loop was created.
    started_at: DateTime<Utc>,

    /// Maximum number of ticks (0 = unlimited).
    max_ticks: u64,

    /// Reason the loop ended, if it has.
    end_reason: Mutex<Option<MoverEndReason>>,
}

impl OperatorState {
    /// Create a new operator state.
    ///
    /// `max_ticks = 0` means the loop runs until stopped; a nonzero
    /// bound is mainly for tests and bounded demo runs.
    pub fn new(tick_interval_ms: u64, max_ticks: u64) -> Self {
        Self {
            paused: AtomicBool::new(false),
            resume_notify: Notify::new(),
            stop_requested: AtomicBool::new(false),
            tick_interval_ms: AtomicU64::new(tick_interval_ms),
            ticks_completed: AtomicU64::new(0),
            started_at: Utc::now(),
            max_ticks,
            end_reason: Mutex::new(None),
        }
    }

    // -----------------------------------------------------------------------
    // Pause / Resume
    // -----------------------------------------------------------------------

    /// Check whether the loop is paused.
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    /// Pause the loop. It will sleep until resumed.
    pub fn pause(&self) {
        self.paused.store(true, Ordering::Release);
    }

    /// Resume the loop and wake it.
    pub fn resume(&self) {
        self.paused.store(false, Ordering::Release);
        self.resume_notify.notify_one();
    }

    /// Wait until the loop is no longer paused.
    ///
    /// Returns immediately if not paused. Otherwise blocks until
    /// [`resume`](Self::resume) is called -- or a stop is requested,
    /// which must be able to take down a paused loop.
    pub async fn wait_if_paused(&self) {
        while self.paused.load(Ordering::Acquire) && !self.is_stop_requested() {
            self.resume_notify.notified().await;
        }
    }

    // -----------------------------------------------------------------------
    // Stop
    // -----------------------------------------------------------------------

    /// Request a clean stop: the loop finishes the tick in flight and
    /// exits before the next one.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
        // A paused loop must still observe the stop.
        self.resume_notify.notify_one();
    }

    /// Check whether a stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    /// Record the reason the loop ended.
    pub async fn set_end_reason(&self, reason: MoverEndReason) {
        let mut guard = self.end_reason.lock().await;
        *guard = Some(reason);
    }

    /// Get the reason the loop ended, if it has.
    pub async fn end_reason(&self) -> Option<MoverEndReason> {
        self.end_reason.lock().await.clone()
    }

    // -----------------------------------------------------------------------
    // Tick speed and progress
    // -----------------------------------------------------------------------

    /// Get the current tick interval in milliseconds.
    pub fn tick_interval_ms(&self) -> u64 {
        self.tick_interval_ms.load(Ordering::Acquire)
    }

    /// Set the tick interval in milliseconds. Must be at least 100ms.
    ///
    /// Returns the previous interval on success, or `None` if the value
    /// was rejected (below 100ms).
    pub fn set_tick_interval_ms(&self, ms: u64) -> Option<u64> {
        if ms < 100 {
            return None;
        }
        let prev = self.tick_interval_ms.swap(ms, Ordering::AcqRel);
        Some(prev)
    }

    /// Record one completed tick.
    pub fn record_tick(&self) {
        self.ticks_completed.fetch_add(1, Ordering::AcqRel);
    }

    /// Ticks completed since start.
    pub fn ticks_completed(&self) -> u64 {
        self.ticks_completed.load(Ordering::Acquire)
    }

    // -----------------------------------------------------------------------
    // Boundaries
    // -----------------------------------------------------------------------

    /// Check whether the tick limit has been reached.
    ///
    /// Returns `true` if `max_ticks > 0` and `current_tick >= max_ticks`.
    pub const fn tick_limit_reached(&self, current_tick: u64) -> bool {
        self.max_ticks > 0 && current_tick >= self.max_ticks
    }

    /// Get the configured max ticks.
    pub const fn max_ticks(&self) -> u64 {
        self.max_ticks
    }

    /// Return the wall-clock start time.
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Return elapsed seconds since start.
    pub fn elapsed_seconds(&self) -> u64 {
        let elapsed = Utc::now()
            .signed_duration_since(self.started_at)
            .num_seconds();
        // `num_seconds` can be negative if clocks are weird; treat as 0.
        u64::try_from(elapsed.max(0)).unwrap_or(u64::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_state_is_running() {
        let state = OperatorState::new(1000, 0);
        assert!(!state.is_paused());
        assert!(!state.is_stop_requested());
        assert_eq!(state.ticks_completed(), 0);
    }

    #[test]
    fn pause_and_resume() {
        let state = OperatorState::new(1000, 0);
        state.pause();
        assert!(state.is_paused());
        state.resume();
        assert!(!state.is_paused());
    }

    #[test]
    fn stop_request() {
        let state = OperatorState::new(1000, 0);
        assert!(!state.is_stop_requested());
        state.request_stop();
        assert!(state.is_stop_requested());
    }

    #[test]
    fn set_tick_interval() {
        let state = OperatorState::new(1000, 0);
        assert_eq!(state.tick_interval_ms(), 1000);
        let prev = state.set_tick_interval_ms(2000);
        assert_eq!(prev, Some(1000));
        assert_eq!(state.tick_interval_ms(), 2000);
    }

    #[test]
    fn reject_sub_100ms_interval() {
        let state = OperatorState::new(1000, 0);
        let result = state.set_tick_interval_ms(50);
        assert!(result.is_none());
        assert_eq!(state.tick_interval_ms(), 1000);
    }

    #[test]
    fn tick_limit_zero_means_unlimited() {
        let state = OperatorState::new(1000, 0);
        assert!(!state.tick_limit_reached(999_999));
    }

    #[test]
    fn tick_limit_reached() {
        let state = OperatorState::new(1000, 100);
        assert!(!state.tick_limit_reached(99));
        assert!(state.tick_limit_reached(100));
        assert!(state.tick_limit_reached(101));
    }

    #[tokio::test]
    async fn stop_wakes_a_paused_loop() {
        use std::sync::Arc;

        let state = Arc::new(OperatorState::new(0, 0));
        state.pause();

        let waiter = Arc::clone(&state);
        let handle = tokio::spawn(async move {
            waiter.wait_if_paused().await;
        });

        state.request_stop();
        assert!(handle.await.is_ok());
    }

    #[tokio::test]
    async fn resume_wakes_a_paused_loop() {
        use std::sync::Arc;

        let state = Arc::new(OperatorState::new(0, 0));
        state.pause();

        let waiter = Arc::clone(&state);
        let handle = tokio::spawn(async move {
            waiter.wait_if_paused().await;
        });

        state.resume();
        assert!(handle.await.is_ok());
    }
}
