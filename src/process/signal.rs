// src/process/signal.rs

//! OS signalling for worker process groups.
//!
//! Workers are spawned as process group leaders, so every signal is sent to
//! the whole group with `killpg`. Shell-wrapped workers (`sh -c "..."`) and
//! anything they fork are suspended, resumed and terminated together.

use thiserror::Error;

/// Failure to deliver a signal to a worker.
#[derive(Debug, Error)]
pub enum SignalError {
    /// The target is already gone. Callers treat this as success when the
    /// goal was to end the worker.
    #[error("process {0} no longer exists")]
    Gone(u32),

    #[error("failed to send {signal} to process {pid}: {source}")]
    Os {
        pid: u32,
        signal: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("{0} is not supported on this platform")]
    Unsupported(&'static str),
}

/// Lifecycle signals the supervisor sends to a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerSignal {
    Suspend,
    Resume,
    Terminate,
    Kill,
}

impl WorkerSignal {
    pub fn name(self) -> &'static str {
        match self {
            WorkerSignal::Suspend => "SIGSTOP",
            WorkerSignal::Resume => "SIGCONT",
            WorkerSignal::Terminate => "SIGTERM",
            WorkerSignal::Kill => "SIGKILL",
        }
    }
}

/// Send `sig` to the process group led by `pid`.
#[cfg(unix)]
pub fn send(pid: u32, sig: WorkerSignal) -> Result<(), SignalError> {
    use nix::errno::Errno;
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    let signal = match sig {
        WorkerSignal::Suspend => Signal::SIGSTOP,
        WorkerSignal::Resume => Signal::SIGCONT,
        WorkerSignal::Terminate => Signal::SIGTERM,
        WorkerSignal::Kill => Signal::SIGKILL,
    };

    match killpg(Pid::from_raw(pid as i32), signal) {
        Ok(()) => Ok(()),
        Err(Errno::ESRCH) => Err(SignalError::Gone(pid)),
        Err(errno) => Err(SignalError::Os {
            pid,
            signal: sig.name(),
            source: errno.into(),
        }),
    }
}

/// Job-control signals do not exist here; the supervisor falls back to
/// `Child::start_kill` for termination and reports suspend/resume as
/// unsupported.
#[cfg(not(unix))]
pub fn send(_pid: u32, sig: WorkerSignal) -> Result<(), SignalError> {
    Err(SignalError::Unsupported(sig.name()))
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn signalling_a_missing_group_reports_gone() {
        // Above the kernel's pid_max, so never a live group.
        let pid = 99_999_999;
        match send(pid, WorkerSignal::Terminate) {
            Err(SignalError::Gone(p)) => assert_eq!(p, pid),
            other => panic!("expected Gone, got {other:?}"),
        }
    }

    #[test]
    fn suspend_and_resume_a_live_group() {
        use std::os::unix::process::CommandExt;

        let mut child = std::process::Command::new("sleep")
            .arg("5")
            .process_group(0)
            .spawn()
            .expect("spawn sleep");
        let pid = child.id();

        send(pid, WorkerSignal::Suspend).unwrap();
        send(pid, WorkerSignal::Resume).unwrap();
        send(pid, WorkerSignal::Kill).unwrap();

        let status = child.wait().unwrap();
        assert!(!status.success());
    }
}
