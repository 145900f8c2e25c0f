// src/watch/filter.rs

//! Relevance filter for filesystem changes.
//!
//! A change is accepted when its path matches an include pattern and is not
//! excluded by a directory, an exact file, or an exclude pattern.
//!
//! Patterns are matched from the right, like a path suffix:
//! - no `/` (e.g. `*.rs`): matched against the file name;
//! - relative with `/` (e.g. `src/*.rs`): matched against any trailing run of
//!   path components;
//! - absolute: matched against the whole path.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use globset::{Glob, GlobBuilder, GlobSet, GlobSetBuilder};
use tracing::{debug, warn};

use crate::errors::Result;
use crate::watch::cache::DecisionCache;
use crate::watch::event::ChangeEvent;
use crate::watch::path_utils::normalize;

/// Source files by extension.
pub const DEFAULT_INCLUDES: &[&str] = &["*.rs"];

/// Hidden files, compiled/cache artifacts, swap files and backups.
pub const DEFAULT_EXCLUDES: &[&str] = &[".*", "*.py[cod]", "*.o", "*.rlib", "*.sw?", "*~", "~*"];

/// Caller overrides applied on top of the defaults.
///
/// Naming a default pattern in the opposite list removes it: an include of
/// `.*` drops the hidden-file exclude, an exclude of `*.rs` drops the default
/// include. An exclude that names an existing directory excludes everything
/// beneath it; an absolute exclude that is not a directory excludes exactly
/// that file.
#[derive(Debug, Clone, Default)]
pub struct FilterOptions {
    pub includes: Vec<String>,
    pub excludes: Vec<String>,
    pub exclude_dirs: Vec<PathBuf>,
}

impl FilterOptions {
    pub fn include(mut self, pattern: impl Into<String>) -> Self {
        self.includes.push(pattern.into());
        self
    }

    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.excludes.push(pattern.into());
        self
    }

    pub fn exclude_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.exclude_dirs.push(dir.into());
        self
    }
}

struct PatternSet {
    patterns: Vec<String>,
    names: GlobSet,
    paths: GlobSet,
}

impl PatternSet {
    fn build(patterns: Vec<String>) -> Result<Self> {
        let mut names = GlobSetBuilder::new();
        let mut paths = GlobSetBuilder::new();

        for pat in &patterns {
            if pat.contains('/') {
                let anchored = if Path::new(pat).is_absolute() {
                    pat.clone()
                } else {
                    format!("**/{pat}")
                };
                paths.add(GlobBuilder::new(&anchored).literal_separator(true).build()?);
            } else {
                names.add(Glob::new(pat)?);
            }
        }

        Ok(Self {
            patterns,
            names: names.build()?,
            paths: paths.build()?,
        })
    }

    fn is_match(&self, path: &Path) -> bool {
        path.file_name().is_some_and(|name| self.names.is_match(name)) || self.paths.is_match(path)
    }
}

/// Decides whether a change is relevant enough to reload the worker.
pub struct ChangeFilter {
    includes: PatternSet,
    excludes: PatternSet,
    exclude_dirs: Vec<PathBuf>,
    exclude_files: HashSet<PathBuf>,
    cache: Mutex<DecisionCache>,
}

impl fmt::Debug for ChangeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeFilter")
            .field("includes", &self.includes.patterns)
            .field("excludes", &self.excludes.patterns)
            .field("exclude_dirs", &self.exclude_dirs)
            .finish_non_exhaustive()
    }
}

impl ChangeFilter {
    /// Build a filter from the defaults plus `options`, resolving relative
    /// directory excludes against the working directory.
    pub fn new(options: &FilterOptions) -> Result<Self> {
        let cwd = std::env::current_dir()?;
        Self::with_base(options, &cwd)
    }

    /// Like [`ChangeFilter::new`] but resolves relative excludes against `base`.
    pub fn with_base(options: &FilterOptions, base: &Path) -> Result<Self> {
        let mut includes: Vec<String> = DEFAULT_INCLUDES
            .iter()
            .filter(|d| !options.excludes.iter().any(|e| e == *d))
            .map(|d| d.to_string())
            .collect();
        for pat in &options.includes {
            if !includes.contains(pat) {
                includes.push(pat.clone());
            }
        }

        let mut excludes: Vec<String> = DEFAULT_EXCLUDES
            .iter()
            .filter(|d| !options.includes.iter().any(|i| i == *d))
            .map(|d| d.to_string())
            .collect();

        let mut exclude_dirs: Vec<PathBuf> = options
            .exclude_dirs
            .iter()
            .map(|dir| normalize(&base.join(dir)))
            .collect();
        let mut exclude_files: HashSet<PathBuf> = self_exclusions().into_iter().collect();

        for entry in &options.excludes {
            let path = Path::new(entry);
            let resolved = base.join(path);
            if resolved.is_dir() {
                exclude_dirs.push(normalize(&resolved));
            } else if path.is_absolute() {
                exclude_files.insert(normalize(path));
            } else if !excludes.contains(entry) {
                excludes.push(entry.clone());
            }
        }

        if includes.is_empty() {
            warn!("no include patterns left; no change will ever trigger a reload");
        }
        debug!(?includes, ?excludes, ?exclude_dirs, "built change filter");

        Ok(Self {
            includes: PatternSet::build(includes)?,
            excludes: PatternSet::build(excludes)?,
            exclude_dirs,
            exclude_files,
            cache: Mutex::new(DecisionCache::default()),
        })
    }

    pub fn include_patterns(&self) -> &[String] {
        &self.includes.patterns
    }

    pub fn exclude_patterns(&self) -> &[String] {
        &self.excludes.patterns
    }

    pub fn exclude_dirs(&self) -> &[PathBuf] {
        &self.exclude_dirs
    }

    pub fn accepts(&self, event: &ChangeEvent) -> bool {
        self.accepts_path(&event.path)
    }

    /// Memoized by the input path; the answer for a path never changes for
    /// the lifetime of the filter.
    pub fn accepts_path(&self, path: &Path) -> bool {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(hit) = cache.get(path) {
            return hit;
        }
        let accepted = self.decide(&normalize(path));
        cache.insert(path.to_path_buf(), accepted);
        accepted
    }

    fn decide(&self, path: &Path) -> bool {
        if !self.includes.is_match(path) {
            return false;
        }
        if self
            .exclude_dirs
            .iter()
            .any(|dir| path != dir && path.starts_with(dir))
        {
            return false;
        }
        if self.exclude_files.contains(path) {
            return false;
        }
        !self.excludes.is_match(path)
    }
}

/// Paths that must never trigger a reload: this very source file and the
/// running executable. A rebuild of the supervisor itself would otherwise
/// reload forever.
fn self_exclusions() -> Vec<PathBuf> {
    let mut paths = vec![Path::new(env!("CARGO_MANIFEST_DIR")).join(file!())];
    if let Ok(exe) = std::env::current_exe() {
        paths.push(exe);
    }
    paths.iter().map(|p| normalize(p)).collect()
}
