// src/engine/core.rs

//! Pure decision logic of the control loop.
//!
//! Each tick the async shell (`engine::runtime::ControlLoop`) observes the
//! supervisor and the queue, asks [`decide`] what to do, and carries it out.
//! Keeping the decision free of processes and channels lets it be tested
//! exhaustively.

use crate::process::Phase;

/// What the control loop saw at the start of a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observation {
    pub phase: Phase,
    pub alive: bool,
    pub queue_empty: bool,
}

/// What the control loop should do this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// A reload is swapping workers; leave the queue alone.
    Wait,
    /// Nothing to do.
    Idle,
    /// The worker ended on its own with nothing queued: stop and finish.
    UnsupervisedExit,
    /// Take one command off the queue and dispatch it.
    Dispatch,
}

/// Decide the next step.
///
/// A worker paused by command is suspended, not dead, so liveness is not
/// consulted while paused; queued commands (RESUME in particular) are still
/// dispatched.
pub fn decide(obs: Observation) -> Decision {
    match obs {
        Observation {
            phase: Phase::Reloading,
            ..
        } => Decision::Wait,
        Observation {
            phase: Phase::Paused,
            queue_empty: true,
            ..
        } => Decision::Idle,
        Observation {
            alive: true,
            queue_empty: true,
            ..
        } => Decision::Idle,
        Observation {
            alive: false,
            queue_empty: true,
            ..
        } => Decision::UnsupervisedExit,
        Observation {
            queue_empty: false, ..
        } => Decision::Dispatch,
    }
}
