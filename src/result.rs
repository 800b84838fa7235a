//! Error-as-value results returned by every editing operation.
//!
//! Operations never return `Err` to their caller. A failure is an
//! [`EditResult`] with `success == false` and an [`ErrorInfo`] describing
//! what went wrong; the original error is kept so callers that prefer `?`
//! can opt in with [`EditResult::raise_if_error`].

use crate::diff::combine_diffs;
use crate::error::{EditError, ErrorKind, Result};
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Outcome of a single operation.
#[derive(Debug, Clone, Serialize)]
pub struct EditResult {
    pub success: bool,
    pub message: String,
    pub files_changed: Vec<PathBuf>,
    /// Payload for read operations (source text, listings, counts).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    /// Combined unified diff of all changes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff: Option<String>,
    /// Per-file unified diffs.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub diffs: IndexMap<PathBuf, String>,
    /// Present on failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

/// Details of a failed operation.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorInfo {
    pub kind: ErrorKind,
    pub operation: String,
    pub target: String,
    #[serde(skip)]
    pub cause: Option<Arc<EditError>>,
}

impl EditResult {
    /// A successful result.
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            files_changed: Vec::new(),
            data: None,
            diff: None,
            diffs: IndexMap::new(),
            error: None,
        }
    }

    /// A successful result for an operation that found nothing to do.
    pub fn unchanged(message: impl Into<String>) -> Self {
        Self::ok(message)
    }

    /// A failed result without an underlying error.
    pub fn failure(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(ErrorInfo {
                kind,
                operation: String::new(),
                target: String::new(),
                cause: None,
            }),
            ..Self::ok(message)
        }
    }

    /// A failed result wrapping `error`.
    pub fn from_error(error: EditError) -> Self {
        let kind = error.kind();
        let message = error.to_string();
        Self {
            success: false,
            error: Some(ErrorInfo {
                kind,
                operation: String::new(),
                target: String::new(),
                cause: Some(Arc::new(error)),
            }),
            ..Self::ok(message)
        }
    }

    /// The failure returned when a target kind declines an operation.
    pub fn unsupported(operation: &str, kind: &str) -> Self {
        Self::from_error(EditError::Unsupported {
            operation: operation.to_string(),
            kind: kind.to_string(),
        })
        .for_operation(operation, kind)
    }

    /// Records the operation and target on a failed result.
    pub fn for_operation(mut self, operation: &str, target: impl fmt::Display) -> Self {
        if let Some(info) = self.error.as_mut() {
            info.operation = operation.to_string();
            info.target = target.to_string();
        }
        self
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if !self.files_changed.contains(&path) {
            self.files_changed.push(path);
        }
        self
    }

    pub fn with_data(mut self, data: impl Into<serde_json::Value>) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Adds a per-file diff and refreshes the combined diff.
    pub fn with_diff(mut self, path: impl Into<PathBuf>, diff: impl Into<String>) -> Self {
        self.diffs.insert(path.into(), diff.into());
        self.diff = Some(combine_diffs(&self.diffs));
        self
    }

    pub fn is_error(&self) -> bool {
        !self.success
    }

    pub fn kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(|e| e.kind)
    }

    /// Returns the diff for one file, or the combined diff.
    pub fn get_diff(&self, path: Option<&Path>) -> Option<&str> {
        match path {
            Some(path) => self.diffs.get(path).map(String::as_str),
            None => self.diff.as_deref(),
        }
    }

    /// The payload as text, for operations that return source.
    pub fn data_str(&self) -> Option<&str> {
        self.data.as_ref().and_then(|d| d.as_str())
    }

    /// Re-raises a failure as an error.
    pub fn raise_if_error(&self) -> Result<()> {
        if self.success {
            return Ok(());
        }
        let (kind, cause) = match &self.error {
            Some(info) => (info.kind, info.cause.clone()),
            None => (ErrorKind::Other, None),
        };
        Err(EditError::Raised {
            kind,
            message: self.message.clone(),
            cause,
        })
    }

    /// Converts into a `Result`, keeping successful values.
    pub fn into_result(self) -> Result<Self> {
        self.raise_if_error()?;
        Ok(self)
    }
}

impl From<EditError> for EditResult {
    fn from(error: EditError) -> Self {
        Self::from_error(error)
    }
}

impl fmt::Display for EditResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Aggregate of results from a batch operation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchResult {
    pub results: Vec<EditResult>,
}

impl BatchResult {
    pub fn new(results: Vec<EditResult>) -> Self {
        Self { results }
    }

    pub fn push(&mut self, result: EditResult) {
        self.results.push(result);
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, EditResult> {
        self.results.iter()
    }

    /// True when every result succeeded.
    pub fn success(&self) -> bool {
        self.results.iter().all(|r| r.success)
    }

    /// True when at least one result succeeded.
    pub fn partial_success(&self) -> bool {
        self.results.iter().any(|r| r.success)
    }

    /// True when no result succeeded.
    pub fn all_failed(&self) -> bool {
        self.results.iter().all(|r| !r.success)
    }

    pub fn succeeded(&self) -> Vec<&EditResult> {
        self.results.iter().filter(|r| r.success).collect()
    }

    pub fn failed(&self) -> Vec<&EditResult> {
        self.results.iter().filter(|r| !r.success).collect()
    }

    /// Every changed file, deduplicated, in first-seen order.
    pub fn files_changed(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = Vec::new();
        for path in self.results.iter().flat_map(|r| &r.files_changed) {
            if !files.contains(path) {
                files.push(path.clone());
            }
        }
        files
    }

    /// Per-file diffs merged across results; later results win.
    pub fn diffs(&self) -> IndexMap<PathBuf, String> {
        let mut merged = IndexMap::new();
        for result in &self.results {
            merged.extend(result.diffs.iter().map(|(p, d)| (p.clone(), d.clone())));
        }
        merged
    }

    /// Combined diff across results, if any result carried one.
    pub fn diff(&self) -> Option<String> {
        let diffs = self.diffs();
        (!diffs.is_empty()).then(|| combine_diffs(&diffs))
    }

    pub fn diff_for(&self, path: &Path) -> Option<String> {
        self.diffs().shift_remove(path)
    }

    /// Re-raises the first failure.
    pub fn raise_if_error(&self) -> Result<()> {
        self.results.iter().try_for_each(EditResult::raise_if_error)
    }
}

impl FromIterator<EditResult> for BatchResult {
    fn from_iter<I: IntoIterator<Item = EditResult>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl IntoIterator for BatchResult {
    type Item = EditResult;
    type IntoIter = std::vec::IntoIter<EditResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.into_iter()
    }
}

impl<'a> IntoIterator for &'a BatchResult {
    type Item = &'a EditResult;
    type IntoIter = std::slice::Iter<'a, EditResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}

impl fmt::Display for BatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} succeeded, {} failed, {} file(s) changed",
            self.succeeded().len(),
            self.failed().len(),
            self.files_changed().len()
        )
    }
}
