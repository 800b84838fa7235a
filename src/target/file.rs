//! Targets addressing a whole module.

use super::capability::{ContentSource, MatchEditable, ModuleEditable, Navigable};
use super::{Target, TargetKind, TargetList};
use crate::cst::{ElementPath, SourceTree};
use crate::error::{EditError, Result};
use crate::resolver::ElementKind;
use crate::result::EditResult;
use crate::session::Session;
use crate::transform::{AddDefinition, DefinitionSpec, InsertAtMatch, MatchPosition, MatchScope};
use regex::Regex;
use std::path::{Path, PathBuf};

/// One source file of the session.
#[derive(Debug, Clone)]
pub struct FileTarget<'s> {
    session: &'s Session,
    path: PathBuf,
}

impl<'s> FileTarget<'s> {
    pub(crate) fn new(session: &'s Session, path: PathBuf) -> Self {
        Self { session, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn fail(&self, operation: &str, error: EditError) -> EditResult {
        EditResult::from_error(error).for_operation(operation, self.path.display())
    }

    fn child(&self, operation: &str, path: ElementPath) -> Target<'s> {
        match self.session.resolver().resolve(&path, Some(&self.path)) {
            Ok(at) => Target::at(self.session, path, at),
            Err(error) => Target::failed(operation, &path, error),
        }
    }

    fn children(&self, operation: &str, kind: ElementKind, pattern: &str) -> TargetList<'s> {
        let found = Regex::new(pattern)
            .map_err(EditError::from)
            .and_then(|regex| self.session.resolver().find_in(&self.path, kind, &regex));
        match found {
            Ok(paths) => paths
                .into_iter()
                .map(|path| Target::bound(self.session, path, self.path.clone()))
                .collect(),
            Err(error) => std::iter::once(Target::error(self.fail(operation, error))).collect(),
        }
    }

    fn add_definition(&self, spec: DefinitionSpec) -> EditResult {
        self.session
            .transform_file(&self.path, &AddDefinition::to_module(spec))
    }

    fn try_rewrite(&self, content: &str) -> Result<EditResult> {
        SourceTree::parse_named(content, &self.path)?;
        let original = self.session.read_optional(&self.path)?.unwrap_or_default();
        let label = format!("rewrite {}", self.path.display());
        if original == content {
            return Ok(EditResult::unchanged(format!("No changes needed for {label}")));
        }
        Ok(self
            .session
            .write_change(&self.path, &original, content, &label))
    }
}

impl<'s> Navigable<'s> for FileTarget<'s> {
    fn kind(&self) -> TargetKind {
        TargetKind::File
    }

    fn find_class(&self, name: &str) -> Target<'s> {
        self.child("find_class", ElementPath::class(name))
    }

    fn find_function(&self, name: &str) -> Target<'s> {
        self.child("find_function", ElementPath::function(name))
    }

    fn find_classes(&self, pattern: &str) -> TargetList<'s> {
        self.children("find_classes", ElementKind::Class, pattern)
    }

    fn find_functions(&self, pattern: &str) -> TargetList<'s> {
        self.children("find_functions", ElementKind::Function, pattern)
    }
}

impl MatchEditable for FileTarget<'_> {
    fn insert_at_match(&self, pattern: &str, code: &str, position: MatchPosition) -> EditResult {
        match InsertAtMatch::new(MatchScope::Module, pattern, code, position) {
            Ok(transformer) => self.session.transform_file(&self.path, &transformer),
            Err(error) => self.fail("insert at match", error),
        }
    }
}

impl ModuleEditable for FileTarget<'_> {
    fn add_import(&self, statement: &str) -> EditResult {
        self.session.add_import(&self.path, statement)
    }

    fn remove_import(&self, pattern: &str) -> EditResult {
        self.session.remove_import(&self.path, pattern)
    }

    fn add_class(&self, spec: DefinitionSpec) -> EditResult {
        self.add_definition(spec)
    }

    fn add_function(&self, spec: DefinitionSpec) -> EditResult {
        self.add_definition(spec)
    }

    fn rewrite(&self, content: &str) -> EditResult {
        self.try_rewrite(content)
            .unwrap_or_else(|error| self.fail("rewrite", error))
    }
}

impl ContentSource for FileTarget<'_> {
    fn exists(&self) -> bool {
        matches!(self.session.read_optional(&self.path), Ok(Some(_)))
    }

    fn file_path(&self) -> Option<PathBuf> {
        Some(self.path.clone())
    }

    fn line_number(&self) -> Option<usize> {
        Some(1)
    }

    fn get_content(&self) -> EditResult {
        match self.session.read(&self.path) {
            Ok(text) => EditResult::ok(format!("Content of {}", self.path.display())).with_data(text),
            Err(error) => self.fail("get_content", error),
        }
    }
}
