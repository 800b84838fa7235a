//! Unified diff generation for previews and results.

use indexmap::IndexMap;
use similar::{ChangeTag, TextDiff};
use std::borrow::Cow;
use std::fmt::Write;
use std::path::{Path, PathBuf};

/// Default number of context lines around each hunk.
pub const DEFAULT_CONTEXT: usize = 3;

/// Generates a unified diff between two file contents.
///
/// Returns an empty string when the contents are equal. A missing trailing
/// newline on either side is normalized so the diff never carries a
/// "no newline at end of file" marker.
pub fn generate_diff(original: &str, modified: &str, path: &Path) -> String {
    generate_diff_with_context(original, modified, path, DEFAULT_CONTEXT)
}

/// Same as [`generate_diff`] with an explicit context radius.
pub fn generate_diff_with_context(
    original: &str,
    modified: &str,
    path: &Path,
    context: usize,
) -> String {
    if original == modified {
        return String::new();
    }

    let original = with_trailing_newline(original);
    let modified = with_trailing_newline(modified);
    let diff = TextDiff::from_lines(original.as_ref(), modified.as_ref());

    diff.unified_diff()
        .context_radius(context)
        .header(
            &format!("a/{}", path.display()),
            &format!("b/{}", path.display()),
        )
        .to_string()
}

/// Concatenates per-file diffs in map order, skipping empty entries.
pub fn combine_diffs(diffs: &IndexMap<PathBuf, String>) -> String {
    diffs
        .values()
        .filter(|d| !d.is_empty())
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("\n")
}

fn with_trailing_newline(text: &str) -> Cow<'_, str> {
    if text.is_empty() || text.ends_with('\n') {
        Cow::Borrowed(text)
    } else {
        Cow::Owned(format!("{text}\n"))
    }
}

/// Represents a summary of changes.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DiffSummary {
    pub files_changed: usize,
    pub insertions: usize,
    pub deletions: usize,
}

impl DiffSummary {
    /// Creates a summary from original and modified content.
    pub fn from_diff(original: &str, modified: &str) -> Self {
        let diff = TextDiff::from_lines(original, modified);
        let mut insertions = 0;
        let mut deletions = 0;

        for change in diff.iter_all_changes() {
            match change.tag() {
                ChangeTag::Insert => insertions += 1,
                ChangeTag::Delete => deletions += 1,
                ChangeTag::Equal => {}
            }
        }

        Self {
            files_changed: usize::from(insertions > 0 || deletions > 0),
            insertions,
            deletions,
        }
    }

    /// Creates a summary by counting the lines of an already rendered diff.
    pub fn from_unified(diff: &str) -> Self {
        let mut summary = Self::default();
        for line in diff.lines() {
            if line.starts_with("+++") {
                summary.files_changed += 1;
            } else if line.starts_with('+') {
                summary.insertions += 1;
            } else if line.starts_with('-') && !line.starts_with("---") {
                summary.deletions += 1;
            }
        }
        summary
    }

    /// Combines two summaries.
    pub fn merge(&mut self, other: &DiffSummary) {
        self.files_changed += other.files_changed;
        self.insertions += other.insertions;
        self.deletions += other.deletions;
    }
}

impl std::fmt::Display for DiffSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} file(s) changed, {} insertions(+), {} deletions(-)",
            self.files_changed, self.insertions, self.deletions
        )
    }
}

/// Colorizes an already rendered unified diff for terminal display.
pub fn colorize(diff: &str) -> String {
    const RED: &str = "\x1b[31m";
    const GREEN: &str = "\x1b[32m";
    const CYAN: &str = "\x1b[36m";
    const RESET: &str = "\x1b[0m";

    let mut output = String::with_capacity(diff.len());
    for line in diff.lines() {
        let color = if line.starts_with("---") || line.starts_with("+++") || line.starts_with("@@")
        {
            CYAN
        } else if line.starts_with('-') {
            RED
        } else if line.starts_with('+') {
            GREEN
        } else {
            ""
        };

        if color.is_empty() {
            let _ = writeln!(output, "{line}");
        } else {
            let _ = writeln!(output, "{color}{line}{RESET}");
        }
    }
    output
}
