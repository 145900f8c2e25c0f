// src/config/mod.rs

//! Configuration loading and validation for respawn.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`) and map it onto the
//!   runtime option structs.
//! - Load a config file from disk (`loader.rs`).
//! - Validate timings, patterns and the worker command (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{DEFAULT_CONFIG_FILE, load_and_validate, load_from_path, load_or_default};
pub use model::{ConfigFile, ReloadSection, WatchSection, WorkerSection};
pub use validate::validate_config;
