// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Coalescing of change notifications into one drain per update cycle.
//!
//! Mutations arm the scheduler; the host runs [`Tree::drain`](crate::Tree::drain)
//! once after its current batch of synchronous work. Arming is idempotent, and
//! requests made while a drain is running arm the following cycle instead of
//! being folded into (or lost from) the running one.

/// Result of asking for a drain.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ScheduleStatus {
    /// This request armed a new drain.
    Scheduled,
    /// A drain was already armed for the upcoming cycle.
    AlreadyScheduled,
}

/// Host primitive that runs a callback once after the current update cycle.
///
/// The tree invokes [`Defer::defer`] exactly once each time it becomes newly
/// armed. The host is expected to call [`Tree::drain`](crate::Tree::drain) at
/// its next opportunity.
pub trait Defer {
    /// Arrange for a drain to run after the current update cycle.
    fn defer(&mut self);
}

impl<F: FnMut()> Defer for F {
    fn defer(&mut self) {
        self();
    }
}

/// Arm/drain state machine.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct Scheduler {
    armed: bool,
    draining: bool,
    rearm: bool,
}

impl Scheduler {
    /// Arm a drain. The caller notifies the host only for
    /// [`ScheduleStatus::Scheduled`] outside of a drain.
    pub(crate) fn request(&mut self) -> ScheduleStatus {
        if self.draining {
            if self.rearm {
                ScheduleStatus::AlreadyScheduled
            } else {
                self.rearm = true;
                ScheduleStatus::Scheduled
            }
        } else if self.armed {
            ScheduleStatus::AlreadyScheduled
        } else {
            self.armed = true;
            ScheduleStatus::Scheduled
        }
    }

    pub(crate) fn is_armed(&self) -> bool {
        self.armed || self.rearm
    }

    pub(crate) fn is_draining(&self) -> bool {
        self.draining
    }

    /// Enter a drain. Returns `false` when nothing is armed or a drain is
    /// already running.
    pub(crate) fn begin(&mut self) -> bool {
        if self.draining || !self.armed {
            return false;
        }
        self.draining = true;
        true
    }

    /// Leave a drain. Returns `true` when requests made during the drain armed
    /// the next cycle, in which case the host must be notified.
    pub(crate) fn finish(&mut self) -> bool {
        debug_assert!(self.draining, "finish without begin");
        self.draining = false;
        self.armed = self.rearm;
        self.rearm = false;
        self.armed
    }
}
