// src/watch/source.rs

//! Debounced stream of filtered filesystem changes.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use notify::{Config, Event, PollWatcher, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

use crate::errors::Result;
use crate::watch::event::ChangeEvent;
use crate::watch::filter::ChangeFilter;
use crate::watch::path_utils::{normalize, outermost_roots};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(1_600);
pub const DEFAULT_STEP: Duration = Duration::from_millis(50);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(200);
pub const DEFAULT_POLL_DELAY: Duration = Duration::from_millis(300);

/// Changes coalesced over one debounce window.
///
/// Ordered so duplicates collapse and "the first event" is deterministic.
pub type ChangeBatch = BTreeSet<ChangeEvent>;

#[derive(Debug, Clone)]
pub struct WatchOptions {
    /// Window over which changes are coalesced, measured from the first
    /// change seen in a batch.
    pub debounce: Duration,
    /// Poll granularity; a raised stop signal is noticed within one step.
    pub step: Duration,
    /// With no changes for this long, an empty batch is yielded.
    pub timeout: Duration,
    /// Use a polling watcher instead of native notifications.
    pub force_polling: bool,
    /// Scan interval of the polling watcher.
    pub poll_delay: Duration,
    pub recursive: bool,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            step: DEFAULT_STEP,
            timeout: DEFAULT_TIMEOUT,
            force_polling: false,
            poll_delay: DEFAULT_POLL_DELAY,
            recursive: true,
        }
    }
}

/// Cooperative cancellation flag shared between the watcher and its owner.
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Configured but not yet started watch over one or more roots.
#[derive(Debug)]
pub struct ChangeSource {
    roots: Vec<PathBuf>,
    filter: Arc<ChangeFilter>,
    options: WatchOptions,
}

impl ChangeSource {
    /// Roots are made absolute and roots nested in other roots are dropped.
    /// With no roots at all the working directory is watched.
    pub fn new<I, P>(roots: I, filter: ChangeFilter, options: WatchOptions) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let mut roots: Vec<PathBuf> = roots
            .into_iter()
            .map(|p| normalize(&p.into()))
            .collect();
        if roots.is_empty() {
            warn!("no watch roots given; watching the working directory");
            roots.push(normalize(&PathBuf::from(".")));
        }

        Self {
            roots: outermost_roots(roots),
            filter: Arc::new(filter),
            options,
        }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    pub fn filter(&self) -> &ChangeFilter {
        &self.filter
    }

    /// Start watching and turn this source into its (single-use) stream.
    ///
    /// If native notifications cannot be set up (e.g. the inotify watch
    /// limit is exhausted) the polling watcher is used instead.
    pub fn stream(self, stop: StopSignal) -> Result<ChangeStream> {
        let (event_tx, event_rx) = mpsc::unbounded_channel::<Event>();

        let (watcher, polling) = if self.options.force_polling {
            (self.start_watcher(&event_tx, true)?, true)
        } else {
            with_polling_fallback(
                || self.start_watcher(&event_tx, false),
                || self.start_watcher(&event_tx, true),
            )?
        };
        info!(
            roots = ?self.roots,
            polling,
            recursive = self.options.recursive,
            "file watcher started"
        );

        Ok(ChangeStream {
            _watcher: watcher,
            events: event_rx,
            filter: self.filter,
            options: self.options,
            stop,
            finished: false,
        })
    }

    fn start_watcher(
        &self,
        event_tx: &mpsc::UnboundedSender<Event>,
        polling: bool,
    ) -> notify::Result<Box<dyn Watcher + Send>> {
        let tx = event_tx.clone();
        // Runs on the notify thread; only forwards.
        let handler = move |res: notify::Result<Event>| match res {
            Ok(event) => {
                // The receiver is gone once the stream is dropped.
                let _ = tx.send(event);
            }
            Err(err) => warn!(error = %err, "file watch error"),
        };

        let mut watcher: Box<dyn Watcher + Send> = if polling {
            let config = Config::default().with_poll_interval(self.options.poll_delay);
            Box::new(PollWatcher::new(handler, config)?)
        } else {
            Box::new(RecommendedWatcher::new(handler, Config::default())?)
        };

        let mode = if self.options.recursive {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };
        for root in &self.roots {
            watcher.watch(root, mode)?;
        }
        Ok(watcher)
    }
}

/// Try `native`; on failure log it and use `polling`. The flag in the result
/// says whether polling is in effect.
fn with_polling_fallback<W>(
    native: impl FnOnce() -> notify::Result<W>,
    polling: impl FnOnce() -> notify::Result<W>,
) -> notify::Result<(W, bool)> {
    match native() {
        Ok(watcher) => Ok((watcher, false)),
        Err(err) => {
            warn!(error = %err, "native file watching unavailable; falling back to polling");
            polling().map(|watcher| (watcher, true))
        }
    }
}

/// Infinite sequence of change batches; ends only when the stop signal is
/// raised. Dropping it stops the underlying watcher.
pub struct ChangeStream {
    _watcher: Box<dyn Watcher + Send>,
    events: mpsc::UnboundedReceiver<Event>,
    filter: Arc<ChangeFilter>,
    options: WatchOptions,
    stop: StopSignal,
    finished: bool,
}

impl std::fmt::Debug for ChangeStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeStream")
            .field("options", &self.options)
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

impl ChangeStream {
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Wait for the next batch.
    ///
    /// - `Some(non-empty)`: changes seen during one debounce window.
    /// - `Some(empty)`: nothing happened within the watch timeout.
    /// - `None`: the stop signal was raised; every later call returns `None`.
    pub async fn next_batch(&mut self) -> Option<ChangeBatch> {
        let mut batch = ChangeBatch::new();
        let started = Instant::now();
        let mut window_end: Option<Instant> = None;

        loop {
            if self.finished || self.stop.is_raised() {
                if !self.finished {
                    debug!(pending = batch.len(), "stop signal observed; change stream finished");
                    self.finished = true;
                }
                return None;
            }

            tokio::time::sleep(self.options.step).await;
            self.drain_into(&mut batch);

            let now = Instant::now();
            match window_end {
                None if !batch.is_empty() => {
                    trace!(debounce_ms = self.options.debounce.as_millis() as u64, "debounce window opened");
                    window_end = Some(now + self.options.debounce);
                }
                None if now.duration_since(started) >= self.options.timeout => {
                    return Some(batch);
                }
                None => {}
                Some(end) if now >= end => {
                    debug!(changes = batch.len(), "debounce window closed");
                    return Some(batch);
                }
                Some(_) => {}
            }
        }
    }

    fn drain_into(&mut self, batch: &mut ChangeBatch) {
        while let Ok(event) = self.events.try_recv() {
            for change in ChangeEvent::from_notify(event) {
                if self.filter.accepts(&change) {
                    trace!(kind = %change.kind, path = ?change.path, "accepted change");
                    batch.insert(change);
                } else {
                    trace!(kind = %change.kind, path = ?change.path, "ignored change");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_signal_is_shared_between_clones() {
        let stop = StopSignal::new();
        let observer = stop.clone();
        assert!(!observer.is_raised());
        stop.raise();
        assert!(observer.is_raised());
    }

    #[test]
    fn native_watch_failure_falls_back_to_polling() {
        let (watcher, polling) = with_polling_fallback(
            || Err(notify::Error::generic("inotify watch limit reached")),
            || Ok("poller"),
        )
        .unwrap();
        assert_eq!(watcher, "poller");
        assert!(polling);
    }

    #[test]
    fn native_watch_is_kept_when_it_works() {
        let mut polled = false;
        let (watcher, polling) = with_polling_fallback(|| Ok("native"), || {
            polled = true;
            Ok("poller")
        })
        .unwrap();
        assert_eq!(watcher, "native");
        assert!(!polling);
        assert!(!polled);
    }

    #[test]
    fn defaults_match_documented_values() {
        let opts = WatchOptions::default();
        assert_eq!(opts.debounce, Duration::from_millis(1600));
        assert_eq!(opts.step, Duration::from_millis(50));
        assert_eq!(opts.timeout, Duration::from_millis(200));
        assert!(opts.recursive);
        assert!(!opts.force_polling);
    }
}
