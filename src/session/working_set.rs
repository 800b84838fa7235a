//! Discovery of the files a session operates on.

use super::SessionConfig;
use crate::error::Result;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Component, Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

const GLOB_CHARS: [char; 4] = ['*', '?', '[', '{'];

/// Collects the working set described by `config`, sorted by path.
///
/// A root naming an existing file yields just that file. A directory is
/// walked recursively. Anything else is treated as a glob pattern walked
/// from its literal prefix.
pub(crate) fn discover(config: &SessionConfig) -> Result<Vec<PathBuf>> {
    let root = &config.root;
    if root.is_file() {
        return Ok(vec![root.clone()]);
    }

    let include = build_glob_set(&config.include)?;
    let exclude = build_glob_set(&config.exclude)?;

    let (base, pattern) = if root.is_dir() {
        (root.clone(), None)
    } else {
        let pattern = Glob::new(&root.to_string_lossy())?.compile_matcher();
        (literal_prefix(root), Some(pattern))
    };

    let mut files = Vec::new();
    for entry in WalkDir::new(&base).into_iter().filter_map(|e| e.ok()) {
        let path = entry.path();
        if !entry.file_type().is_file() {
            continue;
        }

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        if !config.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)) {
            continue;
        }

        if let Some(pattern) = &pattern
            && !pattern.is_match(path)
        {
            continue;
        }

        let rel_path = path.strip_prefix(&base).unwrap_or(path);
        if !config.include.is_empty() && !include.is_match(rel_path) {
            continue;
        }
        if !config.exclude.is_empty() && exclude.is_match(rel_path) {
            continue;
        }

        files.push(path.to_path_buf());
    }

    files.sort();
    debug!(root = %root.display(), count = files.len(), "discovered working set");
    Ok(files)
}

/// The leading components of `pattern` that contain no glob syntax.
fn literal_prefix(pattern: &Path) -> PathBuf {
    let mut prefix = PathBuf::new();
    for component in pattern.components() {
        if let Component::Normal(part) = component
            && part.to_string_lossy().contains(GLOB_CHARS)
        {
            break;
        }
        prefix.push(component);
    }
    if prefix.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        prefix
    }
}

fn build_glob_set(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}
