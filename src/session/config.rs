//! Session configuration.

use crate::diff::DEFAULT_CONTEXT;
use crate::error::{EditError, Result};
use globset::Glob;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Settings for a [`Session`](super::Session).
///
/// `root` may name a single file, a directory walked recursively, or a glob
/// pattern such as `src/**/*.py`.
///
/// ```rust
/// use pyedit::session::SessionConfig;
///
/// let config = SessionConfig::new("src")
///     .exclude("**/migrations/**")
///     .extension("pyi")
///     .dry_run(true);
/// assert_eq!(config.extensions, vec!["py", "pyi"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub root: PathBuf,
    pub dry_run: bool,
    /// Globs a file must match, relative to the walked directory.
    pub include: Vec<String>,
    /// Globs that remove files from the working set.
    pub exclude: Vec<String>,
    /// File extensions without the dot.
    pub extensions: Vec<String>,
    /// Context lines around each diff hunk.
    pub context_lines: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            dry_run: false,
            include: Vec::new(),
            exclude: Vec::new(),
            extensions: vec!["py".to_string()],
            context_lines: DEFAULT_CONTEXT,
        }
    }
}

impl SessionConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Loads a configuration from a JSON file. Missing fields take their
    /// defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn include(mut self, pattern: impl Into<String>) -> Self {
        self.include.push(pattern.into());
        self
    }

    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.exclude.push(pattern.into());
        self
    }

    pub fn extension(mut self, ext: impl Into<String>) -> Self {
        let ext = ext.into().trim_start_matches('.').to_string();
        if !self.extensions.contains(&ext) {
            self.extensions.push(ext);
        }
        self
    }

    pub fn context_lines(mut self, lines: usize) -> Self {
        self.context_lines = lines;
        self
    }

    /// Checks that the globs compile and at least one extension is set.
    pub fn validate(&self) -> Result<()> {
        if self.extensions.is_empty() {
            return Err(EditError::InvalidConfig(
                "at least one file extension is required".to_string(),
            ));
        }
        for pattern in self.include.iter().chain(&self.exclude) {
            Glob::new(pattern)?;
        }
        Ok(())
    }
}
