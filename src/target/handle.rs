//! State shared by element targets.

use crate::cst::ElementPath;
use crate::error::{EditError, Result};
use crate::resolver::Resolution;
use crate::result::EditResult;
use crate::session::Session;
use crate::transform::{Rename, Transformer, locate};
use std::cell::{Cell, RefCell};
use std::path::PathBuf;
use tracing::debug;

/// Addresses one named element and memoizes where it lives.
///
/// The file stays bound once resolved, so a renamed or moved element keeps
/// resolving. The line is forgotten after every change made through the
/// handle; changes made elsewhere are not noticed.
#[derive(Debug, Clone)]
pub(crate) struct Handle<'s> {
    session: &'s Session,
    path: RefCell<ElementPath>,
    file: RefCell<Option<PathBuf>>,
    line: Cell<Option<usize>>,
}

impl<'s> Handle<'s> {
    pub(crate) fn new(session: &'s Session, path: ElementPath, file: Option<PathBuf>) -> Self {
        Self {
            session,
            path: RefCell::new(path),
            file: RefCell::new(file),
            line: Cell::new(None),
        }
    }

    pub(crate) fn resolved(session: &'s Session, path: ElementPath, at: Resolution) -> Self {
        let handle = Self::new(session, path, Some(at.file));
        handle.line.set(Some(at.line));
        handle
    }

    pub(crate) fn session(&self) -> &'s Session {
        self.session
    }

    pub(crate) fn path(&self) -> ElementPath {
        self.path.borrow().clone()
    }

    pub(crate) fn resolve(&self) -> Result<Resolution> {
        let bound = self.file.borrow().clone();
        if let (Some(file), Some(line)) = (&bound, self.line.get()) {
            return Ok(Resolution {
                file: file.clone(),
                line,
            });
        }
        let at = self
            .session
            .resolver()
            .resolve(&self.path.borrow(), bound.as_deref())?;
        *self.file.borrow_mut() = Some(at.file.clone());
        self.line.set(Some(at.line));
        Ok(at)
    }

    pub(crate) fn file(&self) -> Result<PathBuf> {
        if let Some(file) = self.file.borrow().clone() {
            return Ok(file);
        }
        Ok(self.resolve()?.file)
    }

    pub(crate) fn exists(&self) -> bool {
        self.line.set(None);
        self.resolve().is_ok()
    }

    pub(crate) fn line(&self) -> Option<usize> {
        self.resolve().ok().map(|at| at.line)
    }

    /// Whether a successful write is visible to later reads.
    fn writes_through(&self) -> bool {
        !self.session.is_dry_run() || self.session.in_transaction()
    }

    pub(crate) fn fail(&self, operation: &str, error: EditError) -> EditResult {
        EditResult::from_error(error).for_operation(operation, self.path())
    }

    /// Runs `transformer` on the element's file.
    pub(crate) fn apply(&self, transformer: &dyn Transformer) -> EditResult {
        let file = match self.file() {
            Ok(file) => file,
            Err(error) => return self.fail(&transformer.describe(), error),
        };
        let result = self.session.transform_file(&file, transformer);
        if result.success && !result.files_changed.is_empty() {
            self.line.set(None);
        }
        result
    }

    /// Renames the element and, once the new name is visible, re-points
    /// the handle at it.
    pub(crate) fn rename(&self, new_name: &str) -> EditResult {
        let old = self.path();
        let result = self.apply(&Rename::new(old.clone(), new_name));
        if result.success && !result.files_changed.is_empty() && self.writes_through() {
            *self.path.borrow_mut() = old.renamed(new_name);
            debug!(from = %old, to = new_name, "handle renamed");
        }
        result
    }

    /// Moves the element and follows it to its new file.
    pub(crate) fn move_to(&self, destination: &str) -> EditResult {
        let file = match self.file() {
            Ok(file) => file,
            Err(error) => return self.fail("move", error),
        };
        let result = self
            .session
            .move_element(&file, &self.path(), destination);
        if result.success && self.writes_through()
            && let Some(new_file) = result.files_changed.last()
        {
            *self.file.borrow_mut() = Some(new_file.clone());
            self.line.set(None);
        }
        result
    }

    /// The element's source text including decorators.
    pub(crate) fn content(&self) -> EditResult {
        let path = self.path();
        let text = self.file().and_then(|file| {
            let tree = self.session.parse(&file)?;
            Ok(locate(&tree, &path)?.text().to_string())
        });
        match text {
            Ok(text) => EditResult::ok(format!("Content of {path}")).with_data(text),
            Err(error) => self.fail("get_content", error),
        }
    }
}
