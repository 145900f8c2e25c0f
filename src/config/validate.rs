// src/config/validate.rs

use globset::Glob;

use crate::config::model::ConfigFile;
use crate::errors::{RespawnError, Result};

/// Check the invariants the runtime relies on.
pub fn validate_config(cfg: &ConfigFile) -> Result<()> {
    validate_worker(cfg)?;
    validate_timings(cfg)?;
    validate_patterns(cfg)?;
    Ok(())
}

fn validate_worker(cfg: &ConfigFile) -> Result<()> {
    if cfg.worker.program.trim().is_empty() {
        return Err(RespawnError::ConfigError(
            "no worker program: set [worker].program or pass it after `--`".to_string(),
        ));
    }
    if cfg.worker.stop_grace_ms == 0 {
        return Err(RespawnError::ConfigError(
            "[worker].stop_grace_ms must be > 0".to_string(),
        ));
    }
    Ok(())
}

fn validate_timings(cfg: &ConfigFile) -> Result<()> {
    let watch = &cfg.watch;

    if watch.step_ms == 0 {
        return Err(RespawnError::ConfigError(
            "[watch].step_ms must be > 0".to_string(),
        ));
    }
    if watch.debounce_ms < watch.step_ms {
        return Err(RespawnError::ConfigError(format!(
            "[watch].debounce_ms ({}) must be >= step_ms ({})",
            watch.debounce_ms, watch.step_ms
        )));
    }
    if watch.timeout_ms < watch.step_ms {
        return Err(RespawnError::ConfigError(format!(
            "[watch].timeout_ms ({}) must be >= step_ms ({})",
            watch.timeout_ms, watch.step_ms
        )));
    }
    Ok(())
}

fn validate_patterns(cfg: &ConfigFile) -> Result<()> {
    for pattern in cfg.watch.include.iter().chain(&cfg.watch.exclude) {
        Glob::new(pattern).map_err(|e| {
            RespawnError::ConfigError(format!("invalid pattern `{pattern}`: {e}"))
        })?;
    }
    Ok(())
}
