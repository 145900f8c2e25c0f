// src/watch/path_utils.rs

//! Utility functions for path handling in the watcher.

use std::path::{Path, PathBuf};

/// Resolve `path` to an absolute form.
///
/// Existing paths are canonicalized (symlinks resolved). Paths that no longer
/// exist, which is normal for deletions, are made absolute lexically against
/// the working directory instead.
pub fn normalize(path: &Path) -> PathBuf {
    if let Ok(canon) = path.canonicalize() {
        return canon;
    }
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Convert a path into a string relative to `root`, with forward slashes.
///
/// - First we try a direct `strip_prefix(root)`.
/// - If that fails (e.g. due to symlinks or different absolute prefixes),
///   we canonicalize both paths and try again.
///
/// Returns `None` if the path cannot be related to `root`.
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    if let Ok(rel) = path.strip_prefix(root) {
        return Some(rel.to_string_lossy().replace('\\', "/"));
    }

    // macOS reports /private/var/... for /var/... and similar.
    if let (Ok(root_canon), Ok(path_canon)) = (root.canonicalize(), path.canonicalize()) {
        if let Ok(rel) = path_canon.strip_prefix(&root_canon) {
            return Some(rel.to_string_lossy().replace('\\', "/"));
        }
    }

    None
}

/// Display form of `path` for logs: relative to `root` when possible.
pub fn display_path(root: &Path, path: &Path) -> String {
    relative_str(root, path).unwrap_or_else(|| path.display().to_string())
}

/// Drop roots that live inside another root; watching the outer one already
/// covers them.
pub fn outermost_roots(roots: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut kept: Vec<PathBuf> = Vec::with_capacity(roots.len());
    for root in roots.iter() {
        let nested = roots
            .iter()
            .any(|other| other != root && root.starts_with(other));
        if !nested && !kept.contains(root) {
            kept.push(root.clone());
        }
    }
    kept
}
