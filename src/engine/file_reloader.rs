// src/engine/file_reloader.rs

//! Glue between the change stream and the control loop.

use std::fmt;
use std::path::PathBuf;

use tokio::task::JoinHandle;
use tracing::info;

use crate::errors::Result;
use crate::process::WorkerLauncher;
use crate::types::Command;
use crate::watch::path_utils::display_path;
use crate::watch::{ChangeBatch, ChangeStream, StopSignal};

use super::queue::CommandSender;
use super::runtime::ControlLoop;
use super::{Flow, LoopExit};

/// A [`ControlLoop`] that also turns debounced file changes into RELOAD
/// commands.
///
/// One batch yields at most one RELOAD: only the first change is logged and
/// the rest of the window is considered covered by that reload.
pub struct FileReloader<L: WorkerLauncher> {
    control: ControlLoop<L>,
    changes: ChangeStream,
    stop: StopSignal,
    display_root: PathBuf,
}

impl<L: WorkerLauncher> fmt::Debug for FileReloader<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileReloader")
            .field("control", &self.control)
            .field("changes", &self.changes)
            .finish_non_exhaustive()
    }
}

impl<L: WorkerLauncher> FileReloader<L> {
    /// `stop` must be the signal `changes` was created with; it is raised
    /// when the control loop finishes.
    pub fn new(control: ControlLoop<L>, changes: ChangeStream, stop: StopSignal) -> Self {
        let display_root = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            control,
            changes,
            stop,
            display_root,
        }
    }

    pub fn sender(&self) -> CommandSender {
        self.control.sender()
    }

    pub fn control(&self) -> &ControlLoop<L> {
        &self.control
    }

    /// Run until STOP is dispatched or the worker exits on its own.
    ///
    /// Once the change stream ends (stop signal raised from outside) this
    /// keeps going as a plain control loop.
    pub async fn run(mut self) -> Result<LoopExit> {
        self.control.prime();
        info!("file reloader started");

        let result = loop {
            match self.control.tick().await {
                Ok(Flow::Continue) => {}
                Ok(Flow::Finished(exit)) => break Ok(exit),
                Err(e) => break Err(e),
            }

            if self.changes.is_finished() {
                tokio::time::sleep(self.control.options().tick).await;
            } else if let Some(batch) = self.changes.next_batch().await {
                self.handle_batch(&batch);
            }
        };

        self.stop.raise();
        info!(?result, "file reloader finished");
        result
    }

    pub fn spawn(self) -> JoinHandle<Result<LoopExit>> {
        tokio::spawn(self.run())
    }

    fn handle_batch(&self, batch: &ChangeBatch) {
        let Some(first) = batch.first() else {
            return;
        };

        info!(
            kind = %first.kind,
            path = %display_path(&self.display_root, &first.path),
            coalesced = batch.len() - 1,
            "change detected; reloading"
        );
        self.control.enqueue(Command::Reload);
    }
}
