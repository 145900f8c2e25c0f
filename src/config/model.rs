// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::engine::{DEFAULT_TICK, LoopOptions};
use crate::process::{CommandLauncher, DEFAULT_STOP_GRACE, SupervisorOptions};
use crate::watch::source::{DEFAULT_DEBOUNCE, DEFAULT_POLL_DELAY, DEFAULT_STEP, DEFAULT_TIMEOUT};
use crate::watch::{FilterOptions, WatchOptions};

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [worker]
/// program = "cargo"
/// args = ["run", "--bin", "server"]
/// stop_grace_ms = 3000
///
/// [watch]
/// paths = ["src", "templates"]
/// include = ["*.html"]
/// exclude = ["target"]
///
/// [reload]
/// safe = true
/// ```
///
/// All sections are optional and have reasonable defaults. The worker
/// program may instead come from the command line.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub worker: WorkerSection,

    #[serde(default)]
    pub watch: WatchSection,

    #[serde(default)]
    pub reload: ReloadSection,
}

/// `[worker]` section: what to run and how to stop it.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkerSection {
    #[serde(default)]
    pub program: String,

    #[serde(default)]
    pub args: Vec<String>,

    /// Working directory of the worker; inherits ours when unset.
    #[serde(default)]
    pub cwd: Option<PathBuf>,

    /// Extra environment variables for the worker.
    #[serde(default)]
    pub env: BTreeMap<String, String>,

    /// How long a stopped worker gets to exit before it is killed.
    #[serde(default = "default_stop_grace_ms")]
    pub stop_grace_ms: u64,
}

fn default_stop_grace_ms() -> u64 {
    DEFAULT_STOP_GRACE.as_millis() as u64
}

impl Default for WorkerSection {
    fn default() -> Self {
        Self {
            program: String::new(),
            args: Vec::new(),
            cwd: None,
            env: BTreeMap::new(),
            stop_grace_ms: default_stop_grace_ms(),
        }
    }
}

/// `[watch]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WatchSection {
    /// Set to `false` to supervise without watching.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Roots to watch; the working directory when empty.
    #[serde(default)]
    pub paths: Vec<PathBuf>,

    #[serde(default)]
    pub include: Vec<String>,

    /// Globs, directories or absolute file paths.
    #[serde(default)]
    pub exclude: Vec<String>,

    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    #[serde(default = "default_step_ms")]
    pub step_ms: u64,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default)]
    pub force_polling: bool,

    #[serde(default = "default_poll_delay_ms")]
    pub poll_delay_ms: u64,

    #[serde(default = "default_true")]
    pub recursive: bool,
}

fn default_true() -> bool {
    true
}

fn default_debounce_ms() -> u64 {
    DEFAULT_DEBOUNCE.as_millis() as u64
}

fn default_step_ms() -> u64 {
    DEFAULT_STEP.as_millis() as u64
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT.as_millis() as u64
}

fn default_poll_delay_ms() -> u64 {
    DEFAULT_POLL_DELAY.as_millis() as u64
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            enabled: true,
            paths: Vec::new(),
            include: Vec::new(),
            exclude: Vec::new(),
            debounce_ms: default_debounce_ms(),
            step_ms: default_step_ms(),
            timeout_ms: default_timeout_ms(),
            force_polling: false,
            poll_delay_ms: default_poll_delay_ms(),
            recursive: true,
        }
    }
}

/// `[reload]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReloadSection {
    /// Keep the old worker (paused) until the new one has spawned.
    #[serde(default = "default_true")]
    pub safe: bool,

    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
}

fn default_tick_ms() -> u64 {
    DEFAULT_TICK.as_millis() as u64
}

impl Default for ReloadSection {
    fn default() -> Self {
        Self {
            safe: true,
            tick_ms: default_tick_ms(),
        }
    }
}

impl ConfigFile {
    pub fn launcher(&self) -> CommandLauncher {
        let worker = &self.worker;
        let mut launcher = CommandLauncher::new(&worker.program).args(&worker.args);
        if let Some(cwd) = &worker.cwd {
            launcher = launcher.current_dir(cwd);
        }
        for (key, value) in &worker.env {
            launcher = launcher.env(key, value);
        }
        launcher
    }

    pub fn supervisor_options(&self) -> SupervisorOptions {
        SupervisorOptions {
            stop_grace: Duration::from_millis(self.worker.stop_grace_ms),
        }
    }

    pub fn filter_options(&self) -> FilterOptions {
        FilterOptions {
            includes: self.watch.include.clone(),
            excludes: self.watch.exclude.clone(),
            exclude_dirs: Vec::new(),
        }
    }

    pub fn watch_options(&self) -> WatchOptions {
        let watch = &self.watch;
        WatchOptions {
            debounce: Duration::from_millis(watch.debounce_ms),
            step: Duration::from_millis(watch.step_ms),
            timeout: Duration::from_millis(watch.timeout_ms),
            force_polling: watch.force_polling,
            poll_delay: Duration::from_millis(watch.poll_delay_ms),
            recursive: watch.recursive,
        }
    }

    pub fn loop_options(&self) -> LoopOptions {
        LoopOptions {
            tick: Duration::from_millis(self.reload.tick_ms),
            safe_reload: self.reload.safe,
        }
    }
}
