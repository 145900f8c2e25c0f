// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `respawn`.
///
/// Every option here overrides the matching field of the config file.
#[derive(Debug, Clone, Default, Parser)]
#[command(
    name = "respawn",
    version,
    about = "Run a worker process and restart it when its sources change.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Respawn.toml` in the current working directory, if present.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory to watch (repeatable). Defaults to the working directory.
    #[arg(long = "watch", value_name = "PATH")]
    pub watch: Vec<PathBuf>,

    /// Additional include glob (repeatable).
    #[arg(long, value_name = "GLOB")]
    pub include: Vec<String>,

    /// Additional exclude glob, directory or file (repeatable).
    #[arg(long, value_name = "GLOB")]
    pub exclude: Vec<String>,

    /// Debounce window in milliseconds.
    #[arg(long, value_name = "MS")]
    pub debounce_ms: Option<u64>,

    /// Watcher poll step in milliseconds.
    #[arg(long, value_name = "MS")]
    pub step_ms: Option<u64>,

    /// Idle watch timeout in milliseconds.
    #[arg(long, value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Poll the filesystem instead of using native notifications.
    #[arg(long)]
    pub force_polling: bool,

    /// Only watch the top level of each watch directory.
    #[arg(long)]
    pub no_recursive: bool,

    /// Supervise the worker without watching for changes.
    #[arg(long)]
    pub no_watch: bool,

    /// Stop the old worker before the new one is known to start.
    #[arg(long)]
    pub unsafe_reload: bool,

    /// Read `pause`, `resume`, `reload` and `stop` commands from stdin.
    #[arg(long)]
    pub stdin_control: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `RESPAWN_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Resolve and print the effective configuration, then exit.
    #[arg(long)]
    pub dry_run: bool,

    /// Worker program and its arguments.
    #[arg(last = true, value_name = "PROGRAM")]
    pub command: Vec<String>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
