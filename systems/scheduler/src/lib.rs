#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Timing primitives for the advisor's event loop.
//!
//! Two suspensions exist in the whole system: a trailing-edge debounce
//! that coalesces telemetry bursts into one recompute, and a fixed-cadence
//! ticker that re-evaluates live extrapolations while anything is tracked
//! and the consuming surface is visible. Both are plain state machines
//! advanced by caller-supplied timestamps; neither owns a timer handle or
//! reads a clock.

use std::time::Duration;

use skill_advisor_core::Timestamp;

/// Trailing-edge debounce that batches rapid event bursts.
///
/// Each trigger cancels the pending window and restarts the full delay;
/// the debounce fires once, when a window elapses with no further
/// triggers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecomputeDebounce {
    delay: Duration,
    deadline: Option<Timestamp>,
}

impl RecomputeDebounce {
    /// Creates a debounce with the provided coalescing delay.
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    /// Records an event, cancelling any pending window and restarting the
    /// full delay from `now`.
    pub fn trigger(&mut self, now: Timestamp) {
        self.deadline = Some(now.saturating_add(self.delay));
    }

    /// Reports whether a window is pending.
    #[must_use]
    pub const fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Fires if the pending window has elapsed, disarming the debounce.
    pub fn fire(&mut self, now: Timestamp) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

/// Fixed-cadence ticker gated on "has active work AND is observed."
///
/// The ticker runs only while both gate conditions hold; closing the gate
/// stops it and discards its phase, so reopening starts a fresh cadence
/// rather than delivering a backlog of missed ticks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LiveTicker {
    cadence: Duration,
    next_due: Option<Timestamp>,
}

impl LiveTicker {
    /// Creates a stopped ticker with the provided cadence.
    #[must_use]
    pub const fn new(cadence: Duration) -> Self {
        Self {
            cadence,
            next_due: None,
        }
    }

    /// Applies the gate conditions, starting or stopping the lifecycle.
    pub fn set_gate(&mut self, has_work: bool, visible: bool, now: Timestamp) {
        let open = has_work && visible && !self.cadence.is_zero();
        if open {
            if self.next_due.is_none() {
                self.next_due = Some(now.saturating_add(self.cadence));
            }
        } else {
            self.next_due = None;
        }
    }

    /// Reports whether the ticker lifecycle is currently running.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.next_due.is_some()
    }

    /// Counts the ticks due by `now`, advancing the cadence past them.
    pub fn poll(&mut self, now: Timestamp) -> u32 {
        let Some(mut due) = self.next_due else {
            return 0;
        };

        let mut ticks = 0;
        while now >= due {
            ticks += 1;
            due = due.saturating_add(self.cadence);
        }
        self.next_due = Some(due);
        ticks
    }
}
