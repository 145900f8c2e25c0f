// src/engine/mod.rs

//! Control engine for respawn.
//!
//! This module ties together:
//! - the command queue (`queue`)
//! - the pure per-tick decision (`core`)
//! - the control loop that applies commands to the supervisor (`runtime`)
//! - the file reloader that feeds RELOAD commands from the watcher
//!   (`file_reloader`)

use crate::process::WorkerExit;

/// Why a control loop finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// A STOP command was dispatched.
    Stopped,
    /// The worker ended with no command pending; carries its result if it
    /// was reaped.
    WorkerExited(Option<WorkerExit>),
}

/// Outcome of a single control-loop tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Finished(LoopExit),
}

pub mod core;
pub mod file_reloader;
pub mod queue;
pub mod runtime;

pub use self::core::{Decision, Observation, decide};
pub use file_reloader::FileReloader;
pub use queue::{CommandQueue, CommandSender};
pub use runtime::{ControlLoop, DEFAULT_TICK, LoopOptions};
