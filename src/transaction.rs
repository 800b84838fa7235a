//! Buffered multi-file changes committed or discarded as a unit.
//!
//! A [`TransactionManager`] collects one [`PendingChange`] per path. Changes
//! are written in the order their paths were first touched; if any write
//! fails, every file already written is restored to its original content
//! and a single failure is returned.

use crate::diff::{DEFAULT_CONTEXT, combine_diffs, generate_diff_with_context};
use crate::error::{EditError, ErrorKind};
use crate::result::{BatchResult, EditResult};
use indexmap::IndexMap;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// A not-yet-written edit to one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingChange {
    pub path: PathBuf,
    /// Content before the first change in this transaction.
    pub original_content: String,
    pub new_content: String,
    /// Labels of every merged operation, joined with `", "`.
    pub operation: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionState {
    Open,
    Committed,
    RolledBack,
}

#[derive(Debug)]
pub struct TransactionManager {
    pending: IndexMap<PathBuf, PendingChange>,
    state: TransactionState,
    dry_run: bool,
    context_lines: usize,
}

impl TransactionManager {
    pub fn new(dry_run: bool) -> Self {
        Self {
            pending: IndexMap::new(),
            state: TransactionState::Open,
            dry_run,
            context_lines: DEFAULT_CONTEXT,
        }
    }

    pub fn with_context_lines(mut self, context_lines: usize) -> Self {
        self.context_lines = context_lines;
        self
    }

    pub fn state(&self) -> TransactionState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == TransactionState::Open
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Number of files with pending changes.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn pending(&self) -> impl Iterator<Item = &PendingChange> {
        self.pending.values()
    }

    pub fn pending_files(&self) -> Vec<PathBuf> {
        self.pending.keys().cloned().collect()
    }

    pub fn get(&self, path: &Path) -> Option<&PendingChange> {
        self.pending.get(path)
    }

    fn diff(&self, original: &str, new: &str, path: &Path) -> String {
        generate_diff_with_context(original, new, path, self.context_lines)
    }

    fn finalized_error(&self) -> EditError {
        EditError::AlreadyFinalized(
            match self.state {
                TransactionState::Committed => "Transaction already committed",
                TransactionState::RolledBack => "Transaction was rolled back",
                TransactionState::Open => "Transaction already finalized",
            }
            .to_string(),
        )
    }

    /// Records a change without touching disk.
    ///
    /// A second change to the same path keeps the first original content,
    /// takes the new content and appends the operation label.
    pub fn add_change(
        &mut self,
        path: impl Into<PathBuf>,
        original: &str,
        new_content: &str,
        operation: &str,
    ) -> EditResult {
        let path = path.into();
        if !self.is_open() {
            return EditResult::from_error(EditError::AlreadyFinalized(
                "Transaction already finalized".to_string(),
            ))
            .for_operation(operation, path.display());
        }

        match self.pending.get_mut(&path) {
            Some(existing) => {
                existing.new_content = new_content.to_string();
                existing.operation = format!("{}, {operation}", existing.operation);
            }
            None => {
                self.pending.insert(
                    path.clone(),
                    PendingChange {
                        path: path.clone(),
                        original_content: original.to_string(),
                        new_content: new_content.to_string(),
                        operation: operation.to_string(),
                    },
                );
            }
        }
        debug!(path = %path.display(), operation, "buffered change");

        let diff = self.diff(original, new_content, &path);
        EditResult::ok(format!("[PENDING] {operation}"))
            .with_file(path.clone())
            .with_diff(path, diff)
    }

    /// Returns the pending content of `path`, else its content on disk.
    pub fn current_content(&self, path: &Path) -> Option<String> {
        match self.pending.get(path) {
            Some(change) => Some(change.new_content.clone()),
            None => fs::read_to_string(path).ok(),
        }
    }

    /// Combined diff of every pending change.
    pub fn preview(&self) -> String {
        combine_diffs(&self.pending_diffs())
    }

    fn pending_diffs(&self) -> IndexMap<PathBuf, String> {
        self.pending
            .iter()
            .map(|(path, change)| {
                (
                    path.clone(),
                    self.diff(&change.original_content, &change.new_content, path),
                )
            })
            .collect()
    }

    /// Writes every pending change, restoring already-written files if any
    /// write fails.
    pub fn commit(&mut self) -> BatchResult {
        if !self.is_open() {
            return BatchResult::new(vec![EditResult::from_error(self.finalized_error())]);
        }
        self.state = TransactionState::Committed;

        if self.pending.is_empty() {
            return BatchResult::new(vec![EditResult::ok("No changes to commit")]);
        }

        if self.dry_run {
            let diffs = self.pending_diffs();
            let mut result =
                EditResult::ok(format!("[DRY RUN] Would apply {} changes", self.pending.len()));
            for (path, diff) in diffs {
                result = result.with_file(path.clone()).with_diff(path, diff);
            }
            info!(files = self.pending.len(), "dry-run commit");
            return BatchResult::new(vec![result]);
        }

        let mut written: Vec<&PendingChange> = Vec::new();
        let mut results = Vec::new();
        for change in self.pending.values() {
            if let Err(source) = fs::write(&change.path, &change.new_content) {
                let error = EditError::WriteFailed {
                    path: change.path.clone(),
                    source,
                };
                warn!(path = %change.path.display(), %error, "commit failed, restoring written files");
                for done in &written {
                    if let Err(e) = fs::write(&done.path, &done.original_content) {
                        warn!(path = %done.path.display(), error = %e, "restore failed");
                    }
                }
                self.state = TransactionState::RolledBack;
                let message = format!("Transaction failed, rolled back: {error}");
                let mut failed = EditResult::from_error(error).for_operation("commit", "transaction");
                failed.message = message;
                return BatchResult::new(vec![failed]);
            }

            written.push(change);
            let diff = self.diff(&change.original_content, &change.new_content, &change.path);
            results.push(
                EditResult::ok(format!("Applied: {}", change.operation))
                    .with_file(change.path.clone())
                    .with_diff(change.path.clone(), diff),
            );
        }

        info!(files = results.len(), "transaction committed");
        BatchResult::new(results)
    }

    /// Discards every pending change without touching disk.
    pub fn rollback(&mut self) -> EditResult {
        match self.state {
            TransactionState::Committed => {
                return EditResult::failure(
                    ErrorKind::AlreadyFinalized,
                    "Cannot rollback: transaction already committed",
                );
            }
            TransactionState::RolledBack => {
                return EditResult::from_error(self.finalized_error());
            }
            TransactionState::Open => {}
        }

        let count = self.pending.len();
        self.pending.clear();
        self.state = TransactionState::RolledBack;
        info!(count, "transaction rolled back");
        EditResult::ok(format!("Rolled back {count} pending changes")).with_data(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, PathBuf, PathBuf) {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.py");
        let b = dir.path().join("b.py");
        fs::write(&a, "a = 1\n").unwrap();
        fs::write(&b, "b = 1\n").unwrap();
        (dir, a, b)
    }

    #[test]
    fn test_add_change_is_pending_only() {
        let (_dir, a, _) = setup();
        let mut tx = TransactionManager::new(false);
        let result = tx.add_change(&a, "a = 1\n", "a = 2\n", "edit a");
        assert!(result.success);
        assert_eq!(result.message, "[PENDING] edit a");
        assert!(result.diff.as_deref().unwrap().contains("+a = 2"));
        assert_eq!(fs::read_to_string(&a).unwrap(), "a = 1\n");
        assert_eq!(tx.current_content(&a).as_deref(), Some("a = 2\n"));
    }

    #[test]
    fn test_repeat_edit_merges() {
        let (_dir, a, _) = setup();
        let mut tx = TransactionManager::new(false);
        tx.add_change(&a, "a = 1\n", "a = 2\n", "first");
        tx.add_change(&a, "a = 2\n", "a = 3\n", "second");

        assert_eq!(tx.len(), 1);
        let change = tx.get(&a).unwrap();
        assert_eq!(change.original_content, "a = 1\n");
        assert_eq!(change.new_content, "a = 3\n");
        assert_eq!(change.operation, "first, second");
    }

    #[test]
    fn test_commit_writes_in_order() {
        let (_dir, a, b) = setup();
        let mut tx = TransactionManager::new(false);
        tx.add_change(&b, "b = 1\n", "b = 2\n", "edit b");
        tx.add_change(&a, "a = 1\n", "a = 2\n", "edit a");

        let batch = tx.commit();
        assert!(batch.success());
        assert_eq!(batch.files_changed(), vec![b.clone(), a.clone()]);
        assert_eq!(batch.results[0].message, "Applied: edit b");
        assert_eq!(fs::read_to_string(&a).unwrap(), "a = 2\n");
        assert_eq!(tx.state(), TransactionState::Committed);
    }

    #[test]
    fn test_failed_write_restores_written_files() {
        let (dir, a, b) = setup();
        let c = dir.path().join("c.py");
        fs::create_dir(&c).unwrap();

        let mut tx = TransactionManager::new(false);
        tx.add_change(&a, "a = 1\n", "a = 2\n", "edit a");
        tx.add_change(&b, "b = 1\n", "b = 2\n", "edit b");
        tx.add_change(&c, "", "c = 2\n", "edit c");

        let batch = tx.commit();
        assert_eq!(batch.len(), 1);
        assert!(batch.all_failed());
        assert!(batch.results[0].message.starts_with("Transaction failed, rolled back:"));
        assert_eq!(batch.results[0].kind(), Some(ErrorKind::WriteFailed));
        assert_eq!(fs::read_to_string(&a).unwrap(), "a = 1\n");
        assert_eq!(fs::read_to_string(&b).unwrap(), "b = 1\n");
    }

    #[test]
    fn test_dry_run_commit_touches_nothing() {
        let (_dir, a, b) = setup();
        let mut tx = TransactionManager::new(true);
        tx.add_change(&a, "a = 1\n", "a = 2\n", "edit a");
        tx.add_change(&b, "b = 1\n", "b = 2\n", "edit b");

        let batch = tx.commit();
        assert_eq!(batch.len(), 1);
        let result = &batch.results[0];
        assert_eq!(result.message, "[DRY RUN] Would apply 2 changes");
        assert_eq!(result.diffs.len(), 2);
        assert!(result.diff.as_deref().unwrap().contains("+b = 2"));
        assert_eq!(fs::read_to_string(&a).unwrap(), "a = 1\n");
    }

    #[test]
    fn test_finalized_transactions_refuse_work() {
        let (_dir, a, _) = setup();
        let mut tx = TransactionManager::new(false);
        assert_eq!(tx.commit().results[0].message, "No changes to commit");

        let again = tx.commit();
        assert_eq!(again.results[0].message, "Transaction already committed");
        assert_eq!(again.results[0].kind(), Some(ErrorKind::AlreadyFinalized));
        assert!(tx.add_change(&a, "", "x", "late").is_error());
        assert_eq!(
            tx.rollback().message,
            "Cannot rollback: transaction already committed"
        );
    }

    #[test]
    fn test_rollback_discards() {
        let (_dir, a, _) = setup();
        let mut tx = TransactionManager::new(false);
        tx.add_change(&a, "a = 1\n", "a = 2\n", "edit a");
        let result = tx.rollback();
        assert_eq!(result.message, "Rolled back 1 pending changes");
        assert!(tx.is_empty());
        assert_eq!(fs::read_to_string(&a).unwrap(), "a = 1\n");
        assert_eq!(tx.commit().results[0].message, "Transaction was rolled back");
        assert!(tx.rollback().is_error());
    }
}
