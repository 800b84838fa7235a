//! Addressable handles over files and named definitions.
//!
//! A [`Target`] is obtained from a [`Session`] lookup and exposes every
//! operation any target kind supports. The call is dispatched to the
//! concrete kind through its capability traits; a kind that does not
//! support the operation answers with an `Unsupported` failure. Lookups
//! that fail yield [`Target::Error`], which absorbs the rest of a chain:
//!
//! ```rust,no_run
//! use pyedit::prelude::*;
//!
//! let session = Session::open("src")?;
//! let result = session.find_class("Missing").find_method("x").rename("y");
//! assert!(result.is_error());
//! assert_eq!(result.message, "Class 'Missing' not found");
//! # Ok::<(), pyedit::error::EditError>(())
//! ```

mod capability;
mod element;
mod error;
mod file;
mod handle;
mod list;

pub use capability::{
    AttributeHost, BodyEditable, ContentSource, Decoratable, Deletable, MatchEditable,
    ModuleEditable, Movable, Navigable, Renameable, SignatureEditable,
};
pub use element::{ClassTarget, FunctionTarget, MethodTarget};
pub use error::ErrorTarget;
pub use file::FileTarget;
pub use list::TargetList;

use crate::cst::ElementPath;
use crate::error::EditError;
use crate::resolver::Resolution;
use crate::result::EditResult;
use crate::session::Session;
use crate::transform::{BodyPosition, DefinitionSpec, DunderKind, ParameterSpec};
use handle::Handle;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// The concrete kind behind a [`Target`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TargetKind {
    File,
    Class,
    Method,
    Function,
    Error,
}

impl TargetKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::File => "FileTarget",
            Self::Class => "ClassTarget",
            Self::Method => "MethodTarget",
            Self::Function => "FunctionTarget",
            Self::Error => "ErrorTarget",
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone)]
pub enum Target<'s> {
    File(FileTarget<'s>),
    Class(ClassTarget<'s>),
    Method(MethodTarget<'s>),
    Function(FunctionTarget<'s>),
    Error(ErrorTarget),
}

macro_rules! dispatch {
    ($self:ident, $capability:ident, $operation:literal, $method:ident($($arg:expr),*)) => {
        match $self.$capability() {
            Some(target) => target.$method($($arg),*),
            None => $self.unsupported($operation),
        }
    };
}

impl<'s> Target<'s> {
    /// Looks `path` up across the session's working set.
    pub(crate) fn resolve(session: &'s Session, path: ElementPath) -> Self {
        match session.resolver().resolve(&path, None) {
            Ok(at) => Self::at(session, path, at),
            Err(error) => Self::failed("find", &path, error),
        }
    }

    /// A target whose file and line are already known.
    pub(crate) fn at(session: &'s Session, path: ElementPath, at: Resolution) -> Self {
        Self::element(Handle::resolved(session, path, at))
    }

    /// A target bound to a file; its line resolves on first use.
    pub(crate) fn bound(session: &'s Session, path: ElementPath, file: PathBuf) -> Self {
        Self::element(Handle::new(session, path, Some(file)))
    }

    pub(crate) fn file(session: &'s Session, path: PathBuf) -> Self {
        Self::File(FileTarget::new(session, path))
    }

    fn element(handle: Handle<'s>) -> Self {
        match handle.path() {
            ElementPath::Class(_) => Self::Class(ClassTarget::new(handle)),
            ElementPath::Method { .. } => Self::Method(MethodTarget::new(handle)),
            ElementPath::Function(_) => Self::Function(FunctionTarget::new(handle)),
        }
    }

    pub fn error(failure: EditResult) -> Self {
        Self::Error(ErrorTarget::new(failure))
    }

    pub(crate) fn failed(operation: &str, path: &ElementPath, error: EditError) -> Self {
        Self::error(EditResult::from_error(error).for_operation(operation, path))
    }

    pub(crate) fn unsupported_navigation(operation: &str, kind: TargetKind) -> Self {
        Self::error(EditResult::unsupported(operation, kind.label()))
    }

    pub fn kind(&self) -> TargetKind {
        self.navigable().kind()
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// The addressed element, for class, method and function targets.
    pub fn element_path(&self) -> Option<ElementPath> {
        match self {
            Self::Class(t) => Some(t.path()),
            Self::Method(t) => Some(t.path()),
            Self::Function(t) => Some(t.path()),
            Self::File(_) | Self::Error(_) => None,
        }
    }

    /// The element name, or the file name for file targets.
    pub fn name(&self) -> Option<String> {
        match self {
            Self::File(t) => t
                .path()
                .file_name()
                .map(|n| n.to_string_lossy().into_owned()),
            _ => self.element_path().map(|p| p.name().to_string()),
        }
    }

    fn unsupported(&self, operation: &str) -> EditResult {
        EditResult::unsupported(operation, self.kind().label())
    }

    fn navigable(&self) -> &dyn Navigable<'s> {
        match self {
            Self::File(t) => t,
            Self::Class(t) => t,
            Self::Method(t) => t,
            Self::Function(t) => t,
            Self::Error(t) => t,
        }
    }

    fn content_source(&self) -> &dyn ContentSource {
        match self {
            Self::File(t) => t,
            Self::Class(t) => t,
            Self::Method(t) => t,
            Self::Function(t) => t,
            Self::Error(t) => t,
        }
    }

    fn renameable(&self) -> Option<&dyn Renameable> {
        match self {
            Self::Class(t) => Some(t),
            Self::Method(t) => Some(t),
            Self::Function(t) => Some(t),
            Self::Error(t) => Some(t),
            Self::File(_) => None,
        }
    }

    fn decoratable(&self) -> Option<&dyn Decoratable> {
        match self {
            Self::Class(t) => Some(t),
            Self::Method(t) => Some(t),
            Self::Function(t) => Some(t),
            Self::Error(t) => Some(t),
            Self::File(_) => None,
        }
    }

    fn signature_editable(&self) -> Option<&dyn SignatureEditable> {
        match self {
            Self::Method(t) => Some(t),
            Self::Function(t) => Some(t),
            Self::Error(t) => Some(t),
            Self::File(_) | Self::Class(_) => None,
        }
    }

    fn body_editable(&self) -> Option<&dyn BodyEditable> {
        match self {
            Self::Class(t) => Some(t),
            Self::Method(t) => Some(t),
            Self::Function(t) => Some(t),
            Self::Error(t) => Some(t),
            Self::File(_) => None,
        }
    }

    fn match_editable(&self) -> Option<&dyn MatchEditable> {
        match self {
            Self::File(t) => Some(t),
            Self::Class(t) => Some(t),
            Self::Method(t) => Some(t),
            Self::Function(t) => Some(t),
            Self::Error(t) => Some(t),
        }
    }

    fn attribute_host(&self) -> Option<&dyn AttributeHost> {
        match self {
            Self::Class(t) => Some(t),
            Self::Error(t) => Some(t),
            _ => None,
        }
    }

    fn deletable(&self) -> Option<&dyn Deletable> {
        match self {
            Self::Class(t) => Some(t),
            Self::Method(t) => Some(t),
            Self::Function(t) => Some(t),
            Self::Error(t) => Some(t),
            Self::File(_) => None,
        }
    }

    fn movable(&self) -> Option<&dyn Movable> {
        match self {
            Self::Class(t) => Some(t),
            Self::Function(t) => Some(t),
            Self::Error(t) => Some(t),
            Self::File(_) | Self::Method(_) => None,
        }
    }

    fn module_editable(&self) -> Option<&dyn ModuleEditable> {
        match self {
            Self::File(t) => Some(t),
            Self::Error(t) => Some(t),
            _ => None,
        }
    }

    pub fn find_class(&self, name: &str) -> Target<'s> {
        self.navigable().find_class(name)
    }

    pub fn find_function(&self, name: &str) -> Target<'s> {
        self.navigable().find_function(name)
    }

    pub fn find_method(&self, name: &str) -> Target<'s> {
        self.navigable().find_method(name)
    }

    pub fn find_classes(&self, pattern: &str) -> TargetList<'s> {
        self.navigable().find_classes(pattern)
    }

    pub fn find_functions(&self, pattern: &str) -> TargetList<'s> {
        self.navigable().find_functions(pattern)
    }

    pub fn find_methods(&self, pattern: &str) -> TargetList<'s> {
        self.navigable().find_methods(pattern)
    }

    pub fn exists(&self) -> bool {
        self.content_source().exists()
    }

    pub fn file_path(&self) -> Option<PathBuf> {
        self.content_source().file_path()
    }

    pub fn line_number(&self) -> Option<usize> {
        self.content_source().line_number()
    }

    pub fn get_content(&self) -> EditResult {
        self.content_source().get_content()
    }

    pub fn rename(&self, new_name: &str) -> EditResult {
        dispatch!(self, renameable, "rename", rename(new_name))
    }

    pub fn add_decorator(&self, decorator: &str) -> EditResult {
        dispatch!(self, decoratable, "add_decorator", add_decorator(decorator))
    }

    pub fn remove_decorator(&self, name: &str) -> EditResult {
        dispatch!(self, decoratable, "remove_decorator", remove_decorator(name))
    }

    pub fn add_parameter(&self, spec: ParameterSpec) -> EditResult {
        dispatch!(self, signature_editable, "add_parameter", add_parameter(spec))
    }

    pub fn remove_parameter(&self, name: &str) -> EditResult {
        dispatch!(self, signature_editable, "remove_parameter", remove_parameter(name))
    }

    pub fn set_return_type(&self, annotation: &str) -> EditResult {
        dispatch!(self, signature_editable, "set_return_type", set_return_type(annotation))
    }

    pub fn convert_to_async(&self) -> EditResult {
        dispatch!(self, signature_editable, "convert_to_async", convert_to_async())
    }

    pub fn convert_to_sync(&self) -> EditResult {
        dispatch!(self, signature_editable, "convert_to_sync", convert_to_sync())
    }

    pub fn convert_to_classmethod(&self) -> EditResult {
        match self {
            Self::Method(t) => t.convert_to_classmethod(),
            Self::Error(t) => t.failure(),
            _ => self.unsupported("convert_to_classmethod"),
        }
    }

    pub fn insert_statement(&self, code: &str, position: BodyPosition) -> EditResult {
        dispatch!(self, body_editable, "insert_statement", insert_statement(code, position))
    }

    pub fn insert_before_match(&self, pattern: &str, code: &str) -> EditResult {
        dispatch!(self, match_editable, "insert_before_match", insert_before_match(pattern, code))
    }

    pub fn insert_after_match(&self, pattern: &str, code: &str) -> EditResult {
        dispatch!(self, match_editable, "insert_after_match", insert_after_match(pattern, code))
    }

    pub fn replace_match(&self, pattern: &str, code: &str) -> EditResult {
        dispatch!(self, match_editable, "replace_match", replace_match(pattern, code))
    }

    pub fn add_attribute(&self, name: &str, annotation: Option<&str>, value: Option<&str>) -> EditResult {
        dispatch!(self, attribute_host, "add_attribute", add_attribute(name, annotation, value))
    }

    pub fn remove_attribute(&self, name: &str) -> EditResult {
        dispatch!(self, attribute_host, "remove_attribute", remove_attribute(name))
    }

    pub fn add_method(&self, spec: DefinitionSpec) -> EditResult {
        dispatch!(self, attribute_host, "add_method", add_method(spec))
    }

    pub fn generate_dunder(&self, kind: DunderKind, overwrite: bool) -> EditResult {
        dispatch!(self, attribute_host, "generate_dunder", generate_dunder(kind, overwrite))
    }

    pub fn generate_init(&self) -> EditResult {
        self.generate_dunder(DunderKind::Init, false)
    }

    pub fn generate_repr(&self) -> EditResult {
        self.generate_dunder(DunderKind::Repr, false)
    }

    pub fn generate_eq(&self) -> EditResult {
        self.generate_dunder(DunderKind::Eq, false)
    }

    pub fn generate_hash(&self) -> EditResult {
        self.generate_dunder(DunderKind::Hash, false)
    }

    pub fn delete(&self) -> EditResult {
        dispatch!(self, deletable, "delete", delete())
    }

    pub fn move_to(&self, destination: &str) -> EditResult {
        dispatch!(self, movable, "move_to", move_to(destination))
    }

    pub fn add_import(&self, statement: &str) -> EditResult {
        dispatch!(self, module_editable, "add_import", add_import(statement))
    }

    pub fn remove_import(&self, pattern: &str) -> EditResult {
        dispatch!(self, module_editable, "remove_import", remove_import(pattern))
    }

    pub fn add_class(&self, spec: DefinitionSpec) -> EditResult {
        dispatch!(self, module_editable, "add_class", add_class(spec))
    }

    pub fn add_function(&self, spec: DefinitionSpec) -> EditResult {
        dispatch!(self, module_editable, "add_function", add_function(spec))
    }

    pub fn rewrite(&self, content: &str) -> EditResult {
        dispatch!(self, module_editable, "rewrite", rewrite(content))
    }
}

impl fmt::Display for Target<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(t) => write!(f, "{}({})", self.kind(), t.path().display()),
            Self::Error(t) => write!(f, "{}({})", self.kind(), t.message()),
            _ => match self.element_path() {
                Some(path) => write!(f, "{}({path})", self.kind()),
                None => write!(f, "{}", self.kind()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::transform::ParameterPosition;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    const MODELS: &str = "\
class User:
    \"\"\"A user.\"\"\"

    def greet(self, name):
        return f\"hi {name}\"

    @staticmethod
    def build():
        return User()


def helper(x):
    return x
";

    fn setup() -> (TempDir, Session) {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("models.py"), MODELS).unwrap();
        let session = Session::open(dir.path()).unwrap();
        (dir, session)
    }

    #[test]
    fn test_lookup_kinds() {
        let (dir, session) = setup();
        let user = session.find_class("User");
        assert_eq!(user.kind(), TargetKind::Class);
        assert_eq!(user.file_path(), Some(dir.path().join("models.py")));
        assert_eq!(user.line_number(), Some(1));

        let greet = user.find_method("greet");
        assert_eq!(greet.kind(), TargetKind::Method);
        assert_eq!(greet.line_number(), Some(4));

        assert_eq!(session.find_function("helper").kind(), TargetKind::Function);
        assert_eq!(user.find_methods("^g").len(), 1);
    }

    #[test]
    fn test_error_target_chain() {
        let (_dir, session) = setup();
        let result = session.find_class("Missing").find_method("x").rename("y");
        assert!(result.is_error());
        assert_eq!(result.kind(), Some(ErrorKind::NotFound));
        assert_eq!(result.message, "Class 'Missing' not found");

        let missing = session.find_class("User").find_method("missing");
        assert!(missing.is_error());
        assert!(!missing.exists());
        assert_eq!(
            missing.add_decorator("cache").message,
            "Method 'missing' not found in class 'User'"
        );
    }

    #[test]
    fn test_unsupported_operation() {
        let (_dir, session) = setup();
        let result = session.find_function("helper").add_attribute("x", None, None);
        assert_eq!(result.kind(), Some(ErrorKind::Unsupported));
        assert_eq!(
            result.message,
            "Operation 'add_attribute' not supported for FunctionTarget"
        );

        let result = session.find_class("User").add_parameter(ParameterSpec::new("x"));
        assert_eq!(result.kind(), Some(ErrorKind::Unsupported));
    }

    #[test]
    fn test_rename_updates_handle() {
        let (dir, session) = setup();
        let greet = session.find_class("User").find_method("greet");
        assert!(greet.rename("welcome").success);
        assert_eq!(greet.name().as_deref(), Some("welcome"));

        let result = greet.add_parameter(
            ParameterSpec::new("loud")
                .annotation("bool")
                .default_value("False")
                .position(ParameterPosition::End),
        );
        assert!(result.success, "{}", result.message);
        let text = fs::read_to_string(dir.path().join("models.py")).unwrap();
        assert!(text.contains("def welcome(self, name, loud: bool = False):"));
    }

    #[test]
    fn test_convert_to_classmethod() {
        let (dir, session) = setup();
        let build = session.find_class("User").find_method("build");
        assert!(build.convert_to_classmethod().success);
        let text = fs::read_to_string(dir.path().join("models.py")).unwrap();
        assert!(text.contains("    @classmethod\n    def build(cls):"));

        let helper = session.find_function("helper");
        assert_eq!(
            helper.convert_to_classmethod().kind(),
            Some(ErrorKind::Unsupported)
        );
    }

    #[test]
    fn test_file_target() {
        let (dir, session) = setup();
        let file = session.file(dir.path().join("models.py"));
        assert!(file.exists());
        assert_eq!(file.find_classes(".*").len(), 1);
        assert_eq!(file.find_function("helper").kind(), TargetKind::Function);

        assert!(file.add_import("import os").success);
        let content = file.get_content();
        assert!(content.data_str().unwrap().starts_with("import os\n"));

        let bad = file.rewrite("def broken(:\n");
        assert_eq!(bad.kind(), Some(ErrorKind::TransformFailed));
        assert_eq!(file.rename("x").kind(), Some(ErrorKind::Unsupported));
    }

    #[test]
    fn test_get_content() {
        let (_dir, session) = setup();
        let build = session.find_class("User").find_method("build");
        let result = build.get_content();
        assert_eq!(
            result.data_str(),
            Some("@staticmethod\n    def build():\n        return User()")
        );
    }
}
