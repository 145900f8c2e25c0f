// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod logging;
pub mod process;
pub mod types;
pub mod watch;
pub mod worker;

use std::sync::Arc;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::{ConfigFile, load_or_default, validate_config};
use crate::engine::{CommandQueue, CommandSender, ControlLoop, FileReloader, LoopExit};
use crate::process::ProcessSupervisor;
use crate::types::Command;
use crate::watch::{ChangeFilter, ChangeSource, StopSignal};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading (file + CLI overrides)
/// - supervisor / command queue / control loop
/// - (optional) file watcher feeding RELOAD commands
/// - Ctrl-C handling and the optional stdin control channel
pub async fn run(args: CliArgs) -> Result<LoopExit> {
    let mut cfg = load_or_default(args.config.as_deref())?;
    apply_cli_overrides(&mut cfg, &args);
    validate_config(&cfg)?;

    if args.dry_run {
        print_dry_run(&cfg)?;
        return Ok(LoopExit::Stopped);
    }

    let supervisor = Arc::new(ProcessSupervisor::new(
        cfg.launcher(),
        cfg.supervisor_options(),
    ));
    let control = ControlLoop::new(supervisor, CommandQueue::new(), cfg.loop_options());
    let stop = StopSignal::new();

    // Ctrl-C → stop watching, then stop the worker.
    {
        let sender = control.sender();
        let stop = stop.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for Ctrl+C");
                return;
            }
            info!("Ctrl+C received; shutting down");
            stop.raise();
            let _ = sender.send(Command::Stop);
        });
    }

    if args.stdin_control {
        tokio::spawn(read_stdin_commands(control.sender()));
    }

    let exit = if cfg.watch.enabled {
        let filter = ChangeFilter::new(&cfg.filter_options())?;
        let source = ChangeSource::new(cfg.watch.paths.clone(), filter, cfg.watch_options());
        let changes = source.stream(stop.clone())?;
        FileReloader::new(control, changes, stop).run().await?
    } else {
        control.run().await?
    };

    Ok(exit)
}

/// Command-line values take precedence over the config file.
fn apply_cli_overrides(cfg: &mut ConfigFile, args: &CliArgs) {
    if let Some((program, rest)) = args.command.split_first() {
        cfg.worker.program = program.clone();
        cfg.worker.args = rest.to_vec();
    }

    let watch = &mut cfg.watch;
    if !args.watch.is_empty() {
        watch.paths = args.watch.clone();
    }
    watch.include.extend(args.include.iter().cloned());
    watch.exclude.extend(args.exclude.iter().cloned());
    if let Some(ms) = args.debounce_ms {
        watch.debounce_ms = ms;
    }
    if let Some(ms) = args.step_ms {
        watch.step_ms = ms;
    }
    if let Some(ms) = args.timeout_ms {
        watch.timeout_ms = ms;
    }
    watch.force_polling |= args.force_polling;
    if args.no_recursive {
        watch.recursive = false;
    }
    if args.no_watch {
        watch.enabled = false;
    }

    if args.unsafe_reload {
        cfg.reload.safe = false;
    }
}

/// Forward `pause`, `resume`, `reload`, `stop` lines from stdin.
async fn read_stdin_commands(sender: CommandSender) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                match line.parse::<Command>() {
                    Ok(command) => {
                        debug!(%command, "command from stdin");
                        if sender.send(command).is_err() {
                            return;
                        }
                    }
                    Err(e) => warn!(input = line, error = %e, "ignoring stdin line"),
                }
            }
            Ok(None) => {
                debug!("stdin closed; control channel finished");
                return;
            }
            Err(e) => {
                warn!(error = %e, "failed to read stdin");
                return;
            }
        }
    }
}

/// Print the effective configuration without starting anything.
fn print_dry_run(cfg: &ConfigFile) -> Result<()> {
    println!("respawn dry-run");
    println!("  worker: {} {}", cfg.worker.program, cfg.worker.args.join(" "));
    if let Some(ref cwd) = cfg.worker.cwd {
        println!("  cwd: {}", cwd.display());
    }
    for (key, value) in &cfg.worker.env {
        println!("  env: {key}={value}");
    }
    println!("  stop_grace_ms: {}", cfg.worker.stop_grace_ms);
    println!("  reload.safe: {}", cfg.reload.safe);
    println!();

    if !cfg.watch.enabled {
        println!("watch: disabled");
        return Ok(());
    }

    let filter = ChangeFilter::new(&cfg.filter_options())?;
    let source = ChangeSource::new(cfg.watch.paths.clone(), filter, cfg.watch_options());
    let watch = &cfg.watch;
    println!("watch:");
    for root in source.roots() {
        println!("  - {}", root.display());
    }
    println!("  include: {:?}", source.filter().include_patterns());
    println!("  exclude: {:?}", source.filter().exclude_patterns());
    if !source.filter().exclude_dirs().is_empty() {
        println!("  exclude dirs: {:?}", source.filter().exclude_dirs());
    }
    println!(
        "  debounce_ms: {}, step_ms: {}, timeout_ms: {}",
        watch.debounce_ms, watch.step_ms, watch.timeout_ms
    );
    println!(
        "  polling: {}, recursive: {}",
        watch.force_polling, watch.recursive
    );

    debug!("dry-run complete (no execution)");
    Ok(())
}
