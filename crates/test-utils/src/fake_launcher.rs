use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use respawn::process::{CommandLauncher, WorkerLauncher};
use tokio::process::Child;

/// A launcher that:
/// - delegates to a real `CommandLauncher`
/// - fails the next `n` launches on request
/// - counts every launch attempt.
///
/// Clones share their counters, so a test can keep one handle while the
/// supervisor owns another.
#[derive(Debug, Clone)]
pub struct FlakyLauncher {
    inner: CommandLauncher,
    failures_left: Arc<AtomicUsize>,
    attempts: Arc<AtomicUsize>,
}

impl FlakyLauncher {
    pub fn new(inner: CommandLauncher) -> Self {
        Self {
            inner,
            failures_left: Arc::new(AtomicUsize::new(0)),
            attempts: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Make the next `n` launches fail.
    pub fn fail_next(&self, n: usize) {
        self.failures_left.store(n, Ordering::SeqCst);
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl WorkerLauncher for FlakyLauncher {
    fn launch(&self) -> io::Result<Child> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        let injected = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            return Err(io::Error::other("injected launch failure"));
        }

        self.inner.launch()
    }

    fn describe(&self) -> String {
        format!("flaky({})", self.inner.describe())
    }
}
