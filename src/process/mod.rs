// src/process/mod.rs

//! Worker process supervision.
//!
//! - [`launcher`] creates worker processes (`WorkerLauncher`, `CommandLauncher`).
//! - [`signal`] delivers job-control and termination signals to worker groups.
//! - [`state`] is the shared `(pid, running, paused)` record.
//! - [`supervisor`] owns the worker and implements the lifecycle operations,
//!   including the safe reload protocol.

pub mod launcher;
pub mod signal;
pub mod state;
pub mod supervisor;

pub use launcher::{CommandLauncher, WorkerLauncher};
pub use signal::{SignalError, WorkerSignal};
pub use state::{Phase, ProcessState, StateSnapshot};
pub use supervisor::{
    DEFAULT_STOP_GRACE, ProcessSupervisor, ReloadOutcome, SupervisorOptions, WorkerExit,
};
