use std::path::PathBuf;

use respawn::config::ConfigFile;
use respawn::watch::{FilterOptions, WatchOptions};
use std::time::Duration;

/// Builder for `ConfigFile` to simplify test setup.
#[derive(Debug, Default)]
pub struct ConfigFileBuilder {
    config: ConfigFile,
}

impl ConfigFileBuilder {
    pub fn new(program: &str) -> Self {
        let mut config = ConfigFile::default();
        config.worker.program = program.to_string();
        Self { config }
    }

    pub fn arg(mut self, arg: &str) -> Self {
        self.config.worker.args.push(arg.to_string());
        self
    }

    pub fn watch_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.watch.paths.push(path.into());
        self
    }

    pub fn include(mut self, pattern: &str) -> Self {
        self.config.watch.include.push(pattern.to_string());
        self
    }

    pub fn exclude(mut self, pattern: &str) -> Self {
        self.config.watch.exclude.push(pattern.to_string());
        self
    }

    pub fn timings(mut self, debounce_ms: u64, step_ms: u64, timeout_ms: u64) -> Self {
        self.config.watch.debounce_ms = debounce_ms;
        self.config.watch.step_ms = step_ms;
        self.config.watch.timeout_ms = timeout_ms;
        self
    }

    pub fn stop_grace_ms(mut self, ms: u64) -> Self {
        self.config.worker.stop_grace_ms = ms;
        self
    }

    pub fn unsafe_reload(mut self) -> Self {
        self.config.reload.safe = false;
        self
    }

    /// Unvalidated; run `validate_config` when the test needs it.
    pub fn build(self) -> ConfigFile {
        self.config
    }
}

/// Watch options tuned for tests: short windows, fast steps.
pub fn fast_watch(debounce_ms: u64) -> WatchOptions {
    WatchOptions {
        debounce: Duration::from_millis(debounce_ms),
        step: Duration::from_millis(20),
        timeout: Duration::from_millis(100),
        ..WatchOptions::default()
    }
}

/// Filter options including only `pattern`, with the default `*.rs` dropped.
pub fn only(pattern: &str) -> FilterOptions {
    FilterOptions::default().include(pattern).exclude("*.rs")
}
