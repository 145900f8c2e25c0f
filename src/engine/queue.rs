// src/engine/queue.rs

//! FIFO command queue feeding the control loop.
//!
//! Producers (the file reloader, the embedding caller, the stdin reader) hold
//! cheap [`CommandSender`] clones. The control loop owns the [`CommandQueue`]
//! and only ever takes from it without blocking.

use anyhow::anyhow;
use tokio::sync::mpsc;
use tracing::trace;

use crate::errors::Result;
use crate::types::Command;

/// Producer handle for a [`CommandQueue`].
#[derive(Debug, Clone)]
pub struct CommandSender {
    tx: mpsc::UnboundedSender<Command>,
}

impl CommandSender {
    /// Enqueue `command`. Fails only once the owning queue has been dropped.
    pub fn send(&self, command: Command) -> Result<()> {
        self.tx
            .send(command)
            .map_err(|e| anyhow!("command queue closed; dropped {}", e.0).into())
    }
}

/// Unbounded, insertion-ordered queue of [`Command`]s.
#[derive(Debug)]
pub struct CommandQueue {
    tx: mpsc::UnboundedSender<Command>,
    rx: mpsc::UnboundedReceiver<Command>,
    /// Command taken off the channel by `peek` but not yet popped.
    head: Option<Command>,
}

impl Default for CommandQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandQueue {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx, head: None }
    }

    pub fn sender(&self) -> CommandSender {
        CommandSender {
            tx: self.tx.clone(),
        }
    }

    /// Enqueue from the owning side. Cannot fail: the queue holds its own
    /// receiver.
    pub fn push(&self, command: Command) {
        trace!(%command, "command enqueued");
        let _ = self.tx.send(command);
    }

    pub fn peek(&mut self) -> Option<Command> {
        if self.head.is_none() {
            self.head = self.rx.try_recv().ok();
        }
        self.head
    }

    pub fn is_empty(&mut self) -> bool {
        self.peek().is_none()
    }

    pub fn pop(&mut self) -> Option<Command> {
        self.head.take().or_else(|| self.rx.try_recv().ok())
    }
}
