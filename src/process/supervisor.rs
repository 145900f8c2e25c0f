// src/process/supervisor.rs

//! Ownership and lifecycle of the supervised worker process.
//!
//! Every operation that changes the worker (or inspects it through the child
//! handle) runs under one `tokio::sync::Mutex`, so lifecycle transitions never
//! overlap. The `(pid, running, paused)` triple is mirrored into a shared
//! [`ProcessState`] for lock-free observers.

use std::fmt;
use std::process::ExitStatus;
use std::sync::Arc;
use std::time::Duration;

use tokio::process::Child;
use tokio::sync::{Mutex, watch};
use tracing::{debug, error, info, warn};

use crate::errors::{RespawnError, Result};

use super::launcher::WorkerLauncher;
use super::signal::{self, SignalError, WorkerSignal};
use super::state::{Phase, ProcessState};

/// How long `stop` waits after SIGTERM before escalating to SIGKILL.
pub const DEFAULT_STOP_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy)]
pub struct SupervisorOptions {
    pub stop_grace: Duration,
}

impl Default for SupervisorOptions {
    fn default() -> Self {
        Self {
            stop_grace: DEFAULT_STOP_GRACE,
        }
    }
}

/// Result of a worker, published once it has been reaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerExit {
    pub pid: u32,
    pub status: ExitStatus,
}

impl WorkerExit {
    pub fn code(&self) -> Option<i32> {
        self.status.code()
    }
}

/// How a reload ended.
///
/// `RolledBack` is only reachable from a safe reload; `Lost` means no worker
/// is running afterwards and the control loop will observe an exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadOutcome {
    /// There was no previous worker; a fresh one was started.
    Started { pid: u32 },
    Replaced { old_pid: u32, new_pid: u32 },
    RolledBack { pid: u32 },
    Lost,
}

/// A spawned child plus what we know about its exit.
struct Worker {
    pid: u32,
    child: Child,
    exited: bool,
    status: Option<ExitStatus>,
    published: bool,
}

impl Worker {
    fn new(pid: u32, child: Child) -> Self {
        Self {
            pid,
            child,
            exited: false,
            status: None,
            published: false,
        }
    }

    /// Non-blocking liveness check; reaps the child if it has exited.
    fn alive(&mut self) -> bool {
        if self.exited {
            return false;
        }
        match self.child.try_wait() {
            Ok(None) => true,
            Ok(Some(status)) => {
                self.record(status);
                false
            }
            Err(e) => {
                warn!(pid = self.pid, error = %e, "failed to query worker status; treating as exited");
                self.exited = true;
                false
            }
        }
    }

    fn record(&mut self, status: ExitStatus) {
        self.exited = true;
        self.status = Some(status);
    }

    fn signal(&self, sig: WorkerSignal) -> std::result::Result<(), SignalError> {
        signal::send(self.pid, sig)
    }

    async fn reap(&mut self) {
        if self.exited {
            return;
        }
        match self.child.wait().await {
            Ok(status) => self.record(status),
            Err(e) => {
                warn!(pid = self.pid, error = %e, "failed to reap worker");
                self.exited = true;
            }
        }
    }

    /// End whatever the exited leader left behind in its process group.
    fn sweep_group(&self) {
        for sig in [WorkerSignal::Terminate, WorkerSignal::Kill] {
            match self.signal(sig) {
                Ok(()) => debug!(pid = self.pid, signal = sig.name(), "signalled leftover group members"),
                Err(SignalError::Gone(_)) => return,
                Err(e) => {
                    debug!(pid = self.pid, error = %e, "failed to signal leftover group members");
                    return;
                }
            }
        }
    }

    /// SIGKILL the worker's group and reap it. Already-gone is success.
    async fn kill(&mut self) {
        if self.exited {
            self.sweep_group();
            return;
        }
        match self.signal(WorkerSignal::Kill) {
            Ok(()) | Err(SignalError::Gone(_)) => {}
            Err(e) => {
                debug!(pid = self.pid, error = %e, "group kill failed; killing worker directly");
                if let Err(e) = self.child.start_kill() {
                    debug!(pid = self.pid, error = %e, "direct kill failed; worker already exited");
                }
            }
        }
        self.reap().await;
    }
}

/// Owns exactly one worker process at a time.
pub struct ProcessSupervisor<L: WorkerLauncher> {
    launcher: L,
    options: SupervisorOptions,
    state: Arc<ProcessState>,
    worker: Mutex<Option<Worker>>,
    exits: watch::Sender<Option<WorkerExit>>,
}

impl<L: WorkerLauncher> fmt::Debug for ProcessSupervisor<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessSupervisor")
            .field("worker", &self.launcher.describe())
            .field("state", &self.state.snapshot())
            .finish_non_exhaustive()
    }
}

impl<L: WorkerLauncher> ProcessSupervisor<L> {
    pub fn new(launcher: L, options: SupervisorOptions) -> Self {
        let (exits, _) = watch::channel(None);
        Self {
            launcher,
            options,
            state: Arc::new(ProcessState::new()),
            worker: Mutex::new(None),
            exits,
        }
    }

    pub fn launcher(&self) -> &L {
        &self.launcher
    }

    /// Shared handle to the lifecycle flags.
    pub fn state(&self) -> Arc<ProcessState> {
        Arc::clone(&self.state)
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn pid(&self) -> Option<u32> {
        self.state.pid()
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    pub fn is_paused(&self) -> bool {
        self.state.is_paused()
    }

    pub fn generation(&self) -> u64 {
        self.state.generation()
    }

    /// Result of the most recently reaped worker, if any.
    pub fn last_exit(&self) -> Option<WorkerExit> {
        *self.exits.borrow()
    }

    /// Result channel: yields each worker's [`WorkerExit`] as it is reaped.
    pub fn subscribe_exit(&self) -> watch::Receiver<Option<WorkerExit>> {
        self.exits.subscribe()
    }

    /// Spawn the worker.
    ///
    /// A spawn failure is returned to the caller; nothing is retried.
    pub async fn startup(&self) -> Result<u32> {
        let mut guard = self.worker.lock().await;

        if let Some(current) = guard.as_mut() {
            if current.alive() {
                warn!(pid = current.pid, "startup requested while a worker is running; ignoring");
                return Ok(current.pid);
            }
            self.publish_exit(current);
        }

        debug!(worker = %self.launcher.describe(), "starting worker");
        let worker = self.spawn()?;
        let pid = worker.pid;
        *guard = Some(worker);
        self.state.mark_started(pid);

        info!(pid, worker = %self.launcher.describe(), "worker started");
        Ok(pid)
    }

    /// Terminate the worker: SIGTERM, wait up to the grace period, then
    /// SIGKILL. Calling this with no worker only resets the flags.
    pub async fn stop(&self) -> Result<()> {
        let mut guard = self.worker.lock().await;
        let paused = self.state.is_paused();

        match guard.take() {
            Some(mut worker) => {
                debug!(pid = worker.pid, "stopping worker");
                self.terminate(&mut worker, paused).await;
                self.publish_exit(&mut worker);
                info!(pid = worker.pid, status = ?worker.status, "worker stopped");
            }
            None => debug!("stop requested with no worker; nothing to terminate"),
        }

        self.state.mark_stopped();
        Ok(())
    }

    /// Suspend the worker (SIGSTOP).
    pub async fn pause(&self) -> Result<()> {
        let mut guard = self.worker.lock().await;
        let worker = guard.as_mut().ok_or(RespawnError::NotRunning("pause"))?;
        if !self.state.is_running() || !worker.alive() {
            return Err(RespawnError::NotRunning("pause"));
        }

        if self.state.phase() == Phase::Paused {
            debug!(pid = worker.pid, "worker already paused");
            return Ok(());
        }

        worker.signal(WorkerSignal::Suspend)?;
        self.state.set_phase(Phase::Paused);
        info!(pid = worker.pid, "worker paused");
        Ok(())
    }

    /// Resume a paused worker (SIGCONT).
    pub async fn resume(&self) -> Result<()> {
        let guard = self.worker.lock().await;

        if self.state.phase() != Phase::Paused {
            debug!("resume requested but worker is not paused");
            return Ok(());
        }
        let worker = guard.as_ref().ok_or(RespawnError::NotRunning("resume"))?;

        match worker.signal(WorkerSignal::Resume) {
            Ok(()) => info!(pid = worker.pid, "worker resumed"),
            Err(SignalError::Gone(pid)) => {
                debug!(pid, "paused worker vanished; clearing paused flag");
            }
            Err(e) => return Err(e.into()),
        }
        self.state.set_phase(Phase::Running);
        Ok(())
    }

    /// Restart the worker in place.
    ///
    /// Running → Reloading → Running | RolledBack | Lost. With `safely`, the
    /// old worker is only suspended while the replacement spawns, and is
    /// resumed if that spawn fails. Without it, the old worker is killed
    /// first and a failed spawn leaves nothing running.
    pub async fn reload(&self, safely: bool) -> Result<ReloadOutcome> {
        let mut guard = self.worker.lock().await;
        self.state.set_phase(Phase::Reloading);
        info!(safely, "reloading worker");

        let mut previous = guard.take();
        if previous.as_mut().is_some_and(|old| !old.alive()) {
            if let Some(mut old) = previous.take() {
                debug!(pid = old.pid, "previous worker had already exited");
                old.sweep_group();
                self.publish_exit(&mut old);
            }
        }

        let mut killed_pid = None;
        if let Some(mut old) = previous.take() {
            if safely {
                match old.signal(WorkerSignal::Suspend) {
                    Ok(()) => debug!(pid = old.pid, "previous worker suspended"),
                    Err(e) => warn!(
                        pid = old.pid,
                        error = %e,
                        "could not suspend previous worker; it keeps running during reload"
                    ),
                }
                previous = Some(old);
            } else {
                old.kill().await;
                self.publish_exit(&mut old);
                debug!(pid = old.pid, "previous worker killed");
                killed_pid = Some(old.pid);
            }
        }

        let outcome = match self.spawn() {
            Ok(fresh) => {
                let new_pid = fresh.pid;
                let outcome = match (previous.take(), killed_pid) {
                    (Some(mut old), _) => {
                        old.kill().await;
                        self.publish_exit(&mut old);
                        ReloadOutcome::Replaced {
                            old_pid: old.pid,
                            new_pid,
                        }
                    }
                    (None, Some(old_pid)) => ReloadOutcome::Replaced { old_pid, new_pid },
                    (None, None) => ReloadOutcome::Started { pid: new_pid },
                };
                *guard = Some(fresh);
                self.state.mark_started(new_pid);
                info!(?outcome, "reload succeeded");
                outcome
            }
            Err(e) => {
                error!(error = %e, "failed to spawn replacement worker");
                match previous.take() {
                    Some(old) if safely => {
                        if let Err(e) = old.signal(WorkerSignal::Resume) {
                            warn!(pid = old.pid, error = %e, "failed to resume previous worker");
                        }
                        let pid = old.pid;
                        *guard = Some(old);
                        self.state.set_phase(Phase::Running);
                        info!(pid, "reload rolled back; previous worker resumed");
                        ReloadOutcome::RolledBack { pid }
                    }
                    _ => {
                        self.state.mark_stopped();
                        error!("reload left no worker running");
                        ReloadOutcome::Lost
                    }
                }
            }
        };

        Ok(outcome)
    }

    /// True iff a worker is tracked and has not exited. Never fails.
    pub async fn is_alive(&self) -> bool {
        let mut guard = self.worker.lock().await;
        match guard.as_mut() {
            Some(worker) => {
                let alive = worker.alive();
                if !alive {
                    self.publish_exit(worker);
                }
                alive
            }
            None => false,
        }
    }

    fn spawn(&self) -> Result<Worker> {
        let child = self.launcher.launch().map_err(|source| RespawnError::Spawn {
            worker: self.launcher.describe(),
            source,
        })?;
        let pid = child.id().ok_or_else(|| RespawnError::Spawn {
            worker: self.launcher.describe(),
            source: std::io::Error::other("worker exited before its pid was read"),
        })?;
        Ok(Worker::new(pid, child))
    }

    async fn terminate(&self, worker: &mut Worker, paused: bool) {
        if !worker.alive() {
            debug!(pid = worker.pid, "worker already exited");
            worker.sweep_group();
            return;
        }

        match worker.signal(WorkerSignal::Terminate) {
            Ok(()) => {}
            Err(SignalError::Gone(pid)) => {
                debug!(pid, "worker gone before SIGTERM");
                worker.reap().await;
                return;
            }
            Err(e) => {
                warn!(pid = worker.pid, error = %e, "graceful termination failed; killing worker");
                worker.kill().await;
                return;
            }
        }

        // A stopped process only acts on SIGTERM once continued.
        if paused {
            if let Err(e) = worker.signal(WorkerSignal::Resume) {
                debug!(pid = worker.pid, error = %e, "failed to continue worker for termination");
            }
        }

        let waited = tokio::time::timeout(self.options.stop_grace, worker.child.wait()).await;
        match waited {
            Ok(Ok(status)) => worker.record(status),
            Ok(Err(e)) => {
                warn!(pid = worker.pid, error = %e, "failed to wait for worker");
                worker.kill().await;
            }
            Err(_) => {
                warn!(
                    pid = worker.pid,
                    grace_ms = self.options.stop_grace.as_millis() as u64,
                    "worker did not exit within grace period; killing"
                );
                worker.kill().await;
            }
        }
    }

    fn publish_exit(&self, worker: &mut Worker) {
        if worker.published {
            return;
        }
        if let Some(status) = worker.status {
            worker.published = true;
            debug!(pid = worker.pid, %status, "worker exit recorded");
            self.exits.send_replace(Some(WorkerExit {
                pid: worker.pid,
                status,
            }));
        }
    }
}
