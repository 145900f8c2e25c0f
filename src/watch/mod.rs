// src/watch/mod.rs

//! File watching and change detection.
//!
//! This module is responsible for:
//! - Deciding which filesystem changes matter (`filter`, memoized via `cache`).
//! - Wiring up a cross-platform filesystem watcher (`notify`) and coalescing
//!   its events into debounced batches (`source`).
//!
//! It knows nothing about processes; turning batches into reload commands is
//! the job of `engine::file_reloader`.

pub mod cache;
pub mod event;
pub mod filter;
pub mod path_utils;
pub mod source;

pub use event::ChangeEvent;
pub use filter::{ChangeFilter, DEFAULT_EXCLUDES, DEFAULT_INCLUDES, FilterOptions};
pub use source::{ChangeBatch, ChangeSource, ChangeStream, StopSignal, WatchOptions};
