// src/process/state.rs

//! Shared view of the supervised worker.
//!
//! The supervisor is the only writer, and only while it holds its lifecycle
//! lock. Anyone holding an `Arc<ProcessState>` may read it at any time; reads
//! are advisory snapshots.

use std::sync::atomic::{AtomicU8, AtomicU32, AtomicU64, Ordering};

/// Lifecycle phase of the supervised worker.
///
/// `running` and `paused` are projections of the phase, so `paused ⇒ running`
/// cannot be violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Phase {
    Stopped = 0,
    Running = 1,
    /// Suspended by a PAUSE command.
    Paused = 2,
    /// A reload is swapping workers; the control loop must not dispatch.
    Reloading = 3,
}

impl Phase {
    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => Phase::Running,
            2 => Phase::Paused,
            3 => Phase::Reloading,
            _ => Phase::Stopped,
        }
    }
}

/// Plain copy of the (pid, running, paused) triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateSnapshot {
    pub pid: Option<u32>,
    pub running: bool,
    pub paused: bool,
}

#[derive(Debug, Default)]
pub struct ProcessState {
    phase: AtomicU8,
    /// 0 means "no worker".
    pid: AtomicU32,
    generation: AtomicU64,
}

impl ProcessState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        Phase::from_u8(self.phase.load(Ordering::Acquire))
    }

    pub fn pid(&self) -> Option<u32> {
        match self.pid.load(Ordering::Acquire) {
            0 => None,
            pid => Some(pid),
        }
    }

    pub fn is_running(&self) -> bool {
        self.phase() != Phase::Stopped
    }

    pub fn is_paused(&self) -> bool {
        matches!(self.phase(), Phase::Paused | Phase::Reloading)
    }

    /// Number of workers successfully spawned so far.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            pid: self.pid(),
            running: self.is_running(),
            paused: self.is_paused(),
        }
    }

    pub(crate) fn set_phase(&self, phase: Phase) {
        self.phase.store(phase as u8, Ordering::Release);
    }

    pub(crate) fn mark_started(&self, pid: u32) {
        self.pid.store(pid, Ordering::Release);
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.set_phase(Phase::Running);
    }

    pub(crate) fn mark_stopped(&self) {
        self.set_phase(Phase::Stopped);
        self.pid.store(0, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_state_has_no_worker() {
        let state = ProcessState::new();
        assert_eq!(
            state.snapshot(),
            StateSnapshot {
                pid: None,
                running: false,
                paused: false
            }
        );
        assert_eq!(state.generation(), 0);
    }

    #[test]
    fn paused_phases_imply_running() {
        let state = ProcessState::new();
        state.mark_started(42);
        for phase in [Phase::Paused, Phase::Reloading] {
            state.set_phase(phase);
            assert!(state.is_paused());
            assert!(state.is_running());
        }
        state.set_phase(Phase::Running);
        assert!(!state.is_paused());
    }

    #[test]
    fn stopping_clears_pid_but_keeps_generation() {
        let state = ProcessState::new();
        state.mark_started(7);
        state.mark_started(8);
        state.mark_stopped();
        assert_eq!(state.pid(), None);
        assert!(!state.is_running());
        assert_eq!(state.generation(), 2);
    }
}
