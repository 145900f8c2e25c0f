// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::ConfigFile;
use crate::config::validate::validate_config;
use crate::errors::{RespawnError, Result};

pub const DEFAULT_CONFIG_FILE: &str = "Respawn.toml";

/// Read and deserialize a configuration file.
///
/// This does **not** validate; the worker program in particular may still
/// come from the command line. Use [`load_and_validate`] for a standalone
/// file.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|e| {
        RespawnError::ConfigError(format!("cannot read config `{}`: {e}", path.display()))
    })?;

    let config: ConfigFile = toml::from_str(&contents)?;
    debug!(path = %path.display(), "config loaded");

    Ok(config)
}

/// Load a configuration file from path and run validation.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let config = load_from_path(path)?;
    validate_config(&config)?;
    Ok(config)
}

/// Load the config named on the command line, else `Respawn.toml` if it
/// exists, else built-in defaults.
///
/// An explicitly named file must exist.
pub fn load_or_default(explicit: Option<&Path>) -> Result<ConfigFile> {
    match explicit {
        Some(path) => load_from_path(path),
        None => {
            let path = default_config_path();
            if path.is_file() {
                load_from_path(&path)
            } else {
                debug!("no config file; using defaults");
                Ok(ConfigFile::default())
            }
        }
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from(DEFAULT_CONFIG_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_explicit_file_is_a_config_error() {
        let err = load_or_default(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(matches!(err, RespawnError::ConfigError(_)));
    }

    #[test]
    fn sections_default_when_absent() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[worker]\nprogram = \"server\"").unwrap();

        let cfg = load_and_validate(file.path()).unwrap();
        assert_eq!(cfg.worker.program, "server");
        assert_eq!(cfg.worker.stop_grace_ms, 5_000);
        assert_eq!(cfg.watch.debounce_ms, 1_600);
        assert!(cfg.watch.enabled);
        assert!(cfg.reload.safe);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[watch]\ndebounse_ms = 10").unwrap();

        let err = load_from_path(file.path()).unwrap_err();
        assert!(matches!(err, RespawnError::TomlError(_)));
    }
}
