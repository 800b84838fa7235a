//! The editing session: working set, navigation and the write path.
//!
//! Every mutating operation ends in [`Session::write_change`], which either
//! buffers the change into the open transaction, reports what a dry run
//! would have written, or writes the file.
//!
//! ```rust,no_run
//! use pyedit::prelude::*;
//!
//! let session = Session::open("src")?;
//! let result = session
//!     .find_class("User")
//!     .add_attribute("email", Some("str"), Some("\"\""));
//! println!("{}", result.message);
//! # Ok::<(), pyedit::error::EditError>(())
//! ```

mod config;
mod working_set;

pub use config::SessionConfig;

use crate::cst::{ElementPath, SourceTree};
use crate::diff::generate_diff_with_context;
use crate::error::{EditError, Result};
use crate::mover::{FileChange, MoveRequest, ProjectMover};
use crate::resolver::{ElementKind, TargetResolver};
use crate::result::{BatchResult, EditResult};
use crate::target::{Target, TargetList};
use crate::transaction::{PendingChange, TransactionManager, TransactionState};
use crate::transform::{AddImport, RemoveImport, Transformed, Transformer};
use regex::Regex;
use serde::Serialize;
use std::cell::{Cell, OnceCell, RefCell};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// One line matched by [`Session::search`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineMatch {
    pub file: PathBuf,
    /// 1-based.
    pub line: usize,
    pub text: String,
}

pub struct Session {
    config: SessionConfig,
    files: OnceCell<Vec<PathBuf>>,
    transaction: RefCell<Option<(u64, TransactionManager)>>,
    next_transaction: Cell<u64>,
    mover: Option<Box<dyn ProjectMover>>,
}

impl Session {
    pub fn new(config: SessionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            files: OnceCell::new(),
            transaction: RefCell::new(None),
            next_transaction: Cell::new(0),
            mover: None,
        })
    }

    /// Opens a session over a file, a directory or a glob pattern.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        Self::new(SessionConfig::new(root))
    }

    /// Installs the collaborator used by move operations.
    pub fn with_mover(mut self, mover: Box<dyn ProjectMover>) -> Self {
        self.mover = Some(mover);
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn is_dry_run(&self) -> bool {
        self.config.dry_run
    }

    /// The directory that relative destinations are resolved against.
    pub fn base_dir(&self) -> PathBuf {
        let root = &self.config.root;
        if root.is_dir() {
            root.clone()
        } else if root.is_file() {
            root.parent().map(Path::to_path_buf).unwrap_or_default()
        } else {
            root.components()
                .take_while(|c| !c.as_os_str().to_string_lossy().contains(['*', '?', '[', '{']))
                .collect()
        }
    }

    /// The working set, discovered on first use.
    pub fn files(&self) -> Result<&[PathBuf]> {
        if let Some(files) = self.files.get() {
            return Ok(files);
        }
        let found = working_set::discover(&self.config)?;
        Ok(self.files.get_or_init(|| found))
    }

    pub fn resolver(&self) -> TargetResolver<'_> {
        TargetResolver::new(self)
    }

    /// Reads `path`, seeing changes buffered in the open transaction.
    pub fn read(&self, path: &Path) -> Result<String> {
        if let Some(content) = self.pending_content(path) {
            return Ok(content);
        }
        Ok(fs::read_to_string(path)?)
    }

    /// Like [`read`](Self::read), but a missing file reads as `None`.
    pub fn read_optional(&self, path: &Path) -> Result<Option<String>> {
        if let Some(content) = self.pending_content(path) {
            return Ok(Some(content));
        }
        match fs::read_to_string(path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn pending_content(&self, path: &Path) -> Option<String> {
        let slot = self.transaction.borrow();
        let (_, tx) = slot.as_ref()?;
        if !tx.is_open() {
            return None;
        }
        tx.get(path).map(|change| change.new_content.clone())
    }

    pub fn parse(&self, path: &Path) -> Result<SourceTree> {
        SourceTree::parse_named(self.read(path)?, path)
    }

    /// The first class named `name` in the working set.
    pub fn find_class(&self, name: &str) -> Target<'_> {
        Target::resolve(self, ElementPath::class(name))
    }

    /// The first module-level function named `name` in the working set.
    pub fn find_function(&self, name: &str) -> Target<'_> {
        Target::resolve(self, ElementPath::function(name))
    }

    /// Every module-level class whose name matches `pattern`.
    pub fn find_classes(&self, pattern: &str) -> TargetList<'_> {
        self.find_all(ElementKind::Class, pattern)
    }

    /// Every module-level function whose name matches `pattern`.
    pub fn find_functions(&self, pattern: &str) -> TargetList<'_> {
        self.find_all(ElementKind::Function, pattern)
    }

    fn find_all(&self, kind: ElementKind, pattern: &str) -> TargetList<'_> {
        let found = Regex::new(pattern)
            .map_err(EditError::from)
            .and_then(|regex| self.resolver().find_all(kind, &regex));
        match found {
            Ok(found) => found
                .into_iter()
                .map(|(file, path)| Target::bound(self, path, file))
                .collect(),
            Err(error) => {
                debug!(pattern, %error, "search failed");
                TargetList::default()
            }
        }
    }

    /// A handle on one file.
    pub fn file(&self, path: impl Into<PathBuf>) -> Target<'_> {
        Target::file(self, path.into())
    }

    /// Lines in the working set matching `pattern`.
    pub fn search(&self, pattern: &str) -> Result<Vec<LineMatch>> {
        let regex = Regex::new(pattern)?;
        let mut matches = Vec::new();
        for file in self.files()? {
            let Ok(text) = self.read(file) else {
                continue;
            };
            for (index, line) in text.lines().enumerate() {
                if regex.is_match(line) {
                    matches.push(LineMatch {
                        file: file.clone(),
                        line: index + 1,
                        text: line.to_string(),
                    });
                }
            }
        }
        Ok(matches)
    }

    /// Runs `transformer` over one file and writes the result.
    pub fn transform_file(&self, path: &Path, transformer: &dyn Transformer) -> EditResult {
        let label = transformer.describe();
        match self.try_transform(path, transformer) {
            Ok((original, out)) => self.finish(path, &original, out, &label),
            Err(error) => EditResult::from_error(error).for_operation(&label, path.display()),
        }
    }

    fn try_transform(&self, path: &Path, transformer: &dyn Transformer) -> Result<(String, Transformed)> {
        let original = self.read(path)?;
        let tree = SourceTree::parse_named(original.clone(), path)?;
        let out = transformer.apply(&tree)?;
        Ok((original, out))
    }

    fn finish(&self, path: &Path, original: &str, out: Transformed, label: &str) -> EditResult {
        if !out.changed {
            debug!(path = %path.display(), label, "no change");
            return EditResult::unchanged(format!("No changes needed for {label}"));
        }
        self.write_change(path, original, out.tree.serialize(), label)
    }

    /// Adds an import statement to `path`.
    pub fn add_import(&self, path: &Path, statement: &str) -> EditResult {
        self.transform_file(path, &AddImport::new(statement))
    }

    /// Removes module-level imports of `path` matching `pattern`.
    pub fn remove_import(&self, path: &Path, pattern: &str) -> EditResult {
        match RemoveImport::new(pattern) {
            Ok(transformer) => self.transform_file(path, &transformer),
            Err(error) => EditResult::from_error(error).for_operation("remove import", path.display()),
        }
    }

    /// Commits one file's new content.
    ///
    /// Inside an open transaction the change is buffered. Otherwise a dry
    /// run only reports the diff, and a real run writes the file.
    pub fn write_change(&self, path: &Path, original: &str, new_content: &str, label: &str) -> EditResult {
        if let Some((_, tx)) = self.transaction.borrow_mut().as_mut()
            && tx.is_open()
        {
            return tx.add_change(path, original, new_content, label);
        }

        let diff = generate_diff_with_context(original, new_content, path, self.config.context_lines);
        if self.config.dry_run {
            info!(path = %path.display(), label, "dry run");
            return EditResult::ok(format!("[DRY RUN] Would apply: {label}"))
                .with_file(path)
                .with_diff(path, diff);
        }

        if let Err(source) = fs::write(path, new_content) {
            let error = EditError::WriteFailed {
                path: path.to_path_buf(),
                source,
            };
            return EditResult::from_error(error).for_operation(label, path.display());
        }
        info!(path = %path.display(), label, "written");
        EditResult::ok(format!("Applied: {label}"))
            .with_file(path)
            .with_diff(path, diff)
    }

    /// Moves a module-level definition through the installed project mover.
    pub fn move_element(&self, file: &Path, element: &ElementPath, destination: &str) -> EditResult {
        let label = format!("move {element} to {destination}");
        let Some(mover) = &self.mover else {
            return EditResult::from_error(EditError::Mover(
                "no project mover is configured".to_string(),
            ))
            .for_operation("move", element);
        };

        let request = MoveRequest {
            file: file.to_path_buf(),
            element: element.clone(),
            destination: destination.to_string(),
        };
        let changes = match mover.plan_move(self, &request) {
            Ok(changes) => changes,
            Err(error) => return EditResult::from_error(error).for_operation("move", element),
        };

        let mut combined = EditResult::ok(format!("Moved {element} to {destination}"));
        if !self.is_dry_run() && !self.in_transaction() {
            return self.commit_together(changes, &label, combined);
        }

        for change in changes {
            let result = self.write_change(&change.path, &change.original, &change.new_content, &label);
            if result.is_error() {
                return result;
            }
            if self.is_dry_run() && !self.in_transaction() {
                combined.message = format!("[DRY RUN] Would apply: {label}");
            }
            for (path, diff) in result.diffs {
                combined = combined.with_file(path.clone()).with_diff(path, diff);
            }
        }
        combined
    }

    /// Writes related file changes all or nothing.
    fn commit_together(&self, changes: Vec<FileChange>, label: &str, mut combined: EditResult) -> EditResult {
        let mut tx = TransactionManager::new(false).with_context_lines(self.config.context_lines);
        for change in &changes {
            tx.add_change(&change.path, &change.original, &change.new_content, label);
        }
        let batch = tx.commit();
        if let Some(failed) = batch.failed().first() {
            return (*failed).clone();
        }
        for (path, diff) in batch.diffs() {
            combined = combined.with_file(path.clone()).with_diff(path, diff);
        }
        combined
    }

    pub(crate) fn in_transaction(&self) -> bool {
        self.transaction
            .borrow()
            .as_ref()
            .is_some_and(|(_, tx)| tx.is_open())
    }

    /// Starts routing writes into a transaction.
    ///
    /// Only one transaction may be open at a time. Dropping the returned
    /// guard without committing rolls it back.
    pub fn begin_transaction(&self) -> Result<Transaction<'_>> {
        let mut slot = self.transaction.borrow_mut();
        if let Some((_, tx)) = slot.as_ref()
            && tx.is_open()
        {
            return Err(EditError::NestedTransaction);
        }

        let id = self.next_transaction.get() + 1;
        self.next_transaction.set(id);
        let manager =
            TransactionManager::new(self.config.dry_run).with_context_lines(self.config.context_lines);
        *slot = Some((id, manager));
        debug!(id, "transaction started");
        Ok(Transaction { session: self, id })
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("config", &self.config)
            .field("files", &self.files.get().map(Vec::len))
            .field("in_transaction", &self.in_transaction())
            .field("mover", &self.mover.is_some())
            .finish()
    }
}

/// An open transaction on a [`Session`].
///
/// While the guard is alive every write through the session is buffered.
pub struct Transaction<'s> {
    session: &'s Session,
    id: u64,
}

impl Transaction<'_> {
    fn with_manager<T>(&self, f: impl FnOnce(&mut TransactionManager) -> T) -> Option<T> {
        let mut slot = self.session.transaction.borrow_mut();
        match slot.as_mut() {
            Some((id, tx)) if *id == self.id => Some(f(tx)),
            _ => None,
        }
    }

    fn detached() -> EditError {
        EditError::AlreadyFinalized("Transaction already finalized".to_string())
    }

    /// Writes every buffered change, restoring written files on failure.
    pub fn commit(&mut self) -> BatchResult {
        self.with_manager(TransactionManager::commit)
            .unwrap_or_else(|| BatchResult::new(vec![EditResult::from_error(Self::detached())]))
    }

    /// Discards every buffered change.
    pub fn rollback(&mut self) -> EditResult {
        self.with_manager(TransactionManager::rollback)
            .unwrap_or_else(|| EditResult::from_error(Self::detached()))
    }

    /// Combined diff of the buffered changes.
    pub fn preview(&self) -> String {
        self.with_manager(|tx| tx.preview()).unwrap_or_default()
    }

    pub fn pending_files(&self) -> Vec<PathBuf> {
        self.with_manager(|tx| tx.pending_files()).unwrap_or_default()
    }

    /// The buffered change for `path`, if any.
    pub fn pending_change(&self, path: &Path) -> Option<PendingChange> {
        self.with_manager(|tx| tx.get(path).cloned()).flatten()
    }

    /// Number of files with buffered changes.
    pub fn len(&self) -> usize {
        self.with_manager(|tx| tx.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn state(&self) -> TransactionState {
        self.with_manager(|tx| tx.state())
            .unwrap_or(TransactionState::RolledBack)
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        let Ok(mut slot) = self.session.transaction.try_borrow_mut() else {
            return;
        };
        if let Some((id, tx)) = slot.as_mut()
            && *id == self.id
        {
            if tx.is_open() {
                let discarded = tx.len();
                tx.rollback();
                debug!(id, discarded, "uncommitted transaction dropped");
            }
            *slot = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::transform::{AddClassAttribute, Rename};
    use tempfile::TempDir;

    fn setup() -> (TempDir, Session) {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("models.py"), "class User:\n    pass\n").unwrap();
        fs::write(
            dir.path().join("views.py"),
            "import os\n\n\ndef index():\n    return os.getcwd()\n",
        )
        .unwrap();
        let session = Session::open(dir.path()).unwrap();
        (dir, session)
    }

    #[test]
    fn test_transform_file_writes() {
        let (dir, session) = setup();
        let path = dir.path().join("models.py");
        let add = AddClassAttribute::new("User", "id").annotation("int");

        let result = session.transform_file(&path, &add);
        assert!(result.success, "{}", result.message);
        assert!(result.message.starts_with("Applied: "));
        assert_eq!(result.files_changed, vec![path.clone()]);
        assert_eq!(fs::read_to_string(&path).unwrap(), "class User:\n    id: int\n");

        let again = session.transform_file(&path, &add);
        assert!(again.success);
        assert!(again.message.starts_with("No changes needed"));
        assert!(again.files_changed.is_empty());
    }

    #[test]
    fn test_transform_failure_is_a_value() {
        let (dir, session) = setup();
        let path = dir.path().join("models.py");
        let result = session.transform_file(&path, &Rename::new(ElementPath::class("Missing"), "X"));
        assert!(result.is_error());
        assert_eq!(result.kind(), Some(ErrorKind::NotFound));
        assert_eq!(result.message, "Class 'Missing' not found");
    }

    #[test]
    fn test_dry_run_leaves_disk_alone() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("models.py");
        fs::write(&path, "class User:\n    pass\n").unwrap();
        let session = Session::new(SessionConfig::new(dir.path()).dry_run(true)).unwrap();

        let result = session.transform_file(&path, &Rename::new(ElementPath::class("User"), "Account"));
        assert!(result.success);
        assert!(result.message.starts_with("[DRY RUN] Would apply: "));
        assert!(result.diff.as_deref().unwrap().contains("+class Account:"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "class User:\n    pass\n");
    }

    #[test]
    fn test_transaction_buffers_and_reads_through() {
        let (dir, session) = setup();
        let path = dir.path().join("models.py");
        let mut tx = session.begin_transaction().unwrap();

        let result = session.transform_file(&path, &Rename::new(ElementPath::class("User"), "Account"));
        assert!(result.message.starts_with("[PENDING] "));
        assert_eq!(fs::read_to_string(&path).unwrap(), "class User:\n    pass\n");
        assert!(session.read(&path).unwrap().contains("class Account"));
        assert_eq!(tx.pending_files(), vec![path.clone()]);

        let batch = tx.commit();
        assert!(batch.success());
        assert_eq!(fs::read_to_string(&path).unwrap(), "class Account:\n    pass\n");
    }

    #[test]
    fn test_nested_transaction_rejected_and_drop_rolls_back() {
        let (dir, session) = setup();
        let path = dir.path().join("models.py");
        {
            let _tx = session.begin_transaction().unwrap();
            assert!(matches!(
                session.begin_transaction(),
                Err(EditError::NestedTransaction)
            ));
            session.transform_file(&path, &Rename::new(ElementPath::class("User"), "Account"));
        }
        assert_eq!(fs::read_to_string(&path).unwrap(), "class User:\n    pass\n");
        assert!(session.begin_transaction().is_ok());
    }

    #[test]
    fn test_search() {
        let (_dir, session) = setup();
        let matches = session.search(r"\bos\b").unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].line, 1);
        assert_eq!(matches[1].text, "    return os.getcwd()");
    }

    #[test]
    fn test_move_without_mover_fails() {
        let (dir, session) = setup();
        let result = session.move_element(
            &dir.path().join("views.py"),
            &ElementPath::function("index"),
            "pages",
        );
        assert!(result.is_error());
        assert!(result.message.contains("no project mover"));
    }
}
