//! Moving definitions between modules.
//!
//! Moves are delegated to a [`ProjectMover`] installed on the session. The
//! mover only plans the new content of each affected file; the session
//! writes the plan through its normal write path, so a move inside a
//! transaction is buffered and a dry-run move touches nothing.

use crate::cst::{ElementPath, SourceTree};
use crate::error::{EditError, Result};
use crate::session::Session;
use crate::transform::{
    AddDefinition, AddImport, DefinitionSpec, DeleteDefinition, Transformer, dedent, locate,
};
use std::path::{Path, PathBuf};
use tracing::debug;

/// What to move and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRequest {
    pub file: PathBuf,
    pub element: ElementPath,
    /// A dotted module name (`app.models`) or a path ending in `.py`.
    pub destination: String,
}

/// The planned new content of one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    pub path: PathBuf,
    /// Empty when the file does not exist yet.
    pub original: String,
    pub new_content: String,
}

/// Plans a move of a definition to another module.
pub trait ProjectMover {
    fn plan_move(&self, session: &Session, request: &MoveRequest) -> Result<Vec<FileChange>>;
}

/// Moves module-level classes and functions by cutting them from their
/// file and appending them to the destination module.
///
/// References in other files are not rewritten. With
/// [`with_reexport`](Self::with_reexport) the source module imports the
/// moved name back from its new home.
#[derive(Debug, Clone, Default)]
pub struct ModuleMover {
    reexport: bool,
}

impl ModuleMover {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reexport(mut self) -> Self {
        self.reexport = true;
        self
    }

    /// Resolves `destination` against `base` into a file path and the
    /// dotted module name used for the re-export import.
    fn destination(base: &Path, destination: &str) -> (PathBuf, String) {
        if destination.ends_with(".py") || destination.contains('/') {
            let path = base.join(destination);
            let module = destination
                .trim_end_matches(".py")
                .trim_start_matches("./")
                .replace('/', ".");
            (path, module)
        } else {
            let mut path = base.to_path_buf();
            for part in destination.split('.') {
                path.push(part);
            }
            path.set_extension("py");
            (path, destination.to_string())
        }
    }
}

impl ProjectMover for ModuleMover {
    fn plan_move(&self, session: &Session, request: &MoveRequest) -> Result<Vec<FileChange>> {
        if matches!(request.element, ElementPath::Method { .. }) {
            return Err(EditError::Mover(format!(
                "'{}' is a method; only module-level definitions can be moved",
                request.element
            )));
        }

        let original = session.read(&request.file)?;
        let tree = SourceTree::parse_named(original.clone(), &request.file)?;
        let definition = locate(&tree, &request.element)?;
        let code = dedent(tree.text_of(definition.outer()));

        let (dest_path, module) = Self::destination(&session.base_dir(), &request.destination);
        if dest_path == request.file {
            return Err(EditError::Mover(format!(
                "'{}' is already defined in {}",
                request.element,
                dest_path.display()
            )));
        }

        let dest_original = session.read_optional(&dest_path)?.unwrap_or_default();
        let dest_tree = SourceTree::parse_named(dest_original.clone(), &dest_path)?;
        if dest_tree.locate(&request.element).is_some() {
            return Err(EditError::AlreadyExists(format!(
                "'{}' already exists in {}",
                request.element,
                dest_path.display()
            )));
        }

        let added = AddDefinition::to_module(DefinitionSpec::parse(&code)?).apply(&dest_tree)?;
        let mut remaining = DeleteDefinition::new(request.element.clone()).apply(&tree)?.tree;
        if self.reexport {
            let import = format!("from {module} import {}", request.element.name());
            remaining = AddImport::new(import).apply(&remaining)?.tree;
        }
        debug!(element = %request.element, destination = %dest_path.display(), "planned move");

        Ok(vec![
            FileChange {
                path: request.file.clone(),
                original,
                new_content: remaining.into_text(),
            },
            FileChange {
                path: dest_path,
                original: dest_original,
                new_content: added.tree.into_text(),
            },
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    const SOURCE: &str = "\
import os


def helper():
    return os.sep


def main():
    return helper()
";

    fn setup() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let app = dir.path().join("app.py");
        fs::write(&app, SOURCE).unwrap();
        (dir, app)
    }

    #[test]
    fn test_destination_forms() {
        let base = Path::new("/project");
        assert_eq!(
            ModuleMover::destination(base, "pkg.utils"),
            (PathBuf::from("/project/pkg/utils.py"), "pkg.utils".to_string())
        );
        assert_eq!(
            ModuleMover::destination(base, "pkg/utils.py"),
            (PathBuf::from("/project/pkg/utils.py"), "pkg.utils".to_string())
        );
    }

    #[test]
    fn test_move_function_to_new_module() {
        let (dir, app) = setup();
        let session = Session::open(dir.path())
            .unwrap()
            .with_mover(Box::new(ModuleMover::new().with_reexport()));

        let result = session.move_element(&app, &ElementPath::function("helper"), "utils");
        assert!(result.success, "{}", result.message);
        assert_eq!(result.files_changed.len(), 2);

        assert_eq!(
            fs::read_to_string(&app).unwrap(),
            "import os\nfrom utils import helper\n\n\ndef main():\n    return helper()\n"
        );
        assert_eq!(
            fs::read_to_string(dir.path().join("utils.py")).unwrap(),
            "def helper():\n    return os.sep\n"
        );
    }

    #[test]
    fn test_move_onto_existing_name_fails() {
        let (dir, app) = setup();
        fs::write(dir.path().join("utils.py"), "def helper():\n    pass\n").unwrap();
        let session = Session::open(dir.path())
            .unwrap()
            .with_mover(Box::new(ModuleMover::new()));

        let result = session.move_element(&app, &ElementPath::function("helper"), "utils");
        assert_eq!(result.kind(), Some(ErrorKind::AlreadyExists));
        assert_eq!(fs::read_to_string(&app).unwrap(), SOURCE);
    }

    #[test]
    fn test_failed_destination_write_keeps_source() {
        let (dir, app) = setup();
        let session = Session::open(dir.path())
            .unwrap()
            .with_mover(Box::new(ModuleMover::new()));

        let result = session.move_element(&app, &ElementPath::function("helper"), "pkg.utils");
        assert!(result.is_error());
        assert_eq!(result.kind(), Some(ErrorKind::WriteFailed));
        assert_eq!(fs::read_to_string(&app).unwrap(), SOURCE);
        assert!(!dir.path().join("pkg").exists());
    }

    #[test]
    fn test_methods_cannot_move() {
        let (dir, app) = setup();
        let session = Session::open(dir.path())
            .unwrap()
            .with_mover(Box::new(ModuleMover::new()));
        let result = session.move_element(&app, &ElementPath::method("A", "b"), "utils");
        assert!(result.is_error());
    }
}
