// src/engine/runtime.rs

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::errors::Result;
use crate::process::{ProcessSupervisor, WorkerLauncher};
use crate::types::Command;

use super::core::{Decision, Observation, decide};
use super::queue::{CommandQueue, CommandSender};
use super::{Flow, LoopExit};

/// Pause between control-loop ticks.
pub const DEFAULT_TICK: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, Copy)]
pub struct LoopOptions {
    pub tick: Duration,
    /// Passed to every `reload` the loop dispatches.
    pub safe_reload: bool,
}

impl Default for LoopOptions {
    fn default() -> Self {
        Self {
            tick: DEFAULT_TICK,
            safe_reload: true,
        }
    }
}

/// Drives a [`ProcessSupervisor`] from a [`CommandQueue`].
///
/// This is the IO shell around [`decide`]: it observes the supervisor,
/// applies the decision, and maps commands onto supervisor operations. Only
/// a failing STARTUP is returned as an error; every other failed command is
/// logged and the loop carries on.
pub struct ControlLoop<L: WorkerLauncher> {
    supervisor: Arc<ProcessSupervisor<L>>,
    queue: CommandQueue,
    options: LoopOptions,
    primed: bool,
}

impl<L: WorkerLauncher> fmt::Debug for ControlLoop<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControlLoop")
            .field("supervisor", &self.supervisor)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<L: WorkerLauncher> ControlLoop<L> {
    pub fn new(supervisor: Arc<ProcessSupervisor<L>>, queue: CommandQueue, options: LoopOptions) -> Self {
        Self {
            supervisor,
            queue,
            options,
            primed: false,
        }
    }

    pub fn supervisor(&self) -> &Arc<ProcessSupervisor<L>> {
        &self.supervisor
    }

    pub fn options(&self) -> &LoopOptions {
        &self.options
    }

    pub fn sender(&self) -> CommandSender {
        self.queue.sender()
    }

    pub fn enqueue(&self, command: Command) {
        self.queue.push(command);
    }

    /// Queue the initial STARTUP, once.
    pub(crate) fn prime(&mut self) {
        if !self.primed {
            self.queue.push(Command::Startup);
            self.primed = true;
        }
    }

    /// Run until STOP is dispatched or the worker exits on its own.
    pub async fn run(mut self) -> Result<LoopExit> {
        self.prime();
        info!("control loop started");

        loop {
            match self.tick().await? {
                Flow::Continue => tokio::time::sleep(self.options.tick).await,
                Flow::Finished(exit) => {
                    info!(?exit, "control loop finished");
                    return Ok(exit);
                }
            }
        }
    }

    /// Run the loop as a background Tokio task.
    pub fn spawn(self) -> JoinHandle<Result<LoopExit>> {
        tokio::spawn(self.run())
    }

    /// One iteration: observe, decide, act.
    pub async fn tick(&mut self) -> Result<Flow> {
        let observation = Observation {
            phase: self.supervisor.phase(),
            alive: self.supervisor.is_alive().await,
            queue_empty: self.queue.is_empty(),
        };

        match decide(observation) {
            Decision::Wait | Decision::Idle => Ok(Flow::Continue),
            Decision::UnsupervisedExit => {
                info!(
                    worker = %self.supervisor.launcher().describe(),
                    "worker exited without a pending command; shutting down"
                );
                self.supervisor.stop().await?;
                Ok(Flow::Finished(LoopExit::WorkerExited(
                    self.supervisor.last_exit(),
                )))
            }
            Decision::Dispatch => match self.queue.pop() {
                Some(command) => self.dispatch(command).await,
                None => Ok(Flow::Continue),
            },
        }
    }

    async fn dispatch(&mut self, command: Command) -> Result<Flow> {
        debug!(%command, "dispatching command");

        match command {
            Command::Startup => {
                self.supervisor.startup().await?;
            }
            Command::Pause => {
                if let Err(e) = self.supervisor.pause().await {
                    warn!(%command, error = %e, "command failed");
                }
            }
            Command::Resume => {
                if let Err(e) = self.supervisor.resume().await {
                    warn!(%command, error = %e, "command failed");
                }
            }
            Command::Reload => match self.supervisor.reload(self.options.safe_reload).await {
                Ok(outcome) => debug!(?outcome, "reload dispatched"),
                Err(e) => error!(%command, error = %e, "command failed"),
            },
            Command::Stop => {
                self.supervisor.stop().await?;
                return Ok(Flow::Finished(LoopExit::Stopped));
            }
        }

        Ok(Flow::Continue)
    }
}
