//! Per-slot state machine.

/// Lifecycle of one [`crate::slot::WorkerSlot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkerState {
    /// Process spawned, kernel load not yet confirmed.
    Initializing,
    /// Kernel loaded; ready to accept a job.
    Idle,
    /// A job is currently dispatched to this slot.
    Busy,
    /// Kernel load failed, or the process crashed/timed out. Permanent for
    /// this slot instance; a replacement slot is spawned in its place.
    Dead,
    /// Shutting down: refuses new jobs, finishes any current job, then exits.
    Draining,
}

impl WorkerState {
    /// Whether a job may be dispatched to a slot in this state.
    pub const fn accepts_jobs(self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Legal transitions, enforced by [`crate::slot::WorkerSlot`] rather than
    /// left implicit — an illegal transition is a bug, not a runtime error.
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Initializing, Self::Idle)
                | (Self::Initializing, Self::Dead)
                | (Self::Idle, Self::Busy)
                | (Self::Idle, Self::Draining)
                | (Self::Idle, Self::Dead)
                | (Self::Busy, Self::Idle)
                | (Self::Busy, Self::Dead)
                | (Self::Busy, Self::Draining)
                | (Self::Draining, Self::Dead)
        )
    }
}
