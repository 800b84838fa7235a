//! The target returned by failed navigation.

use super::capability::{
    AttributeHost, BodyEditable, ContentSource, Decoratable, Deletable, MatchEditable,
    ModuleEditable, Movable, Navigable, Renameable, SignatureEditable,
};
use super::{Target, TargetKind, TargetList};
use crate::result::EditResult;
use crate::transform::{BodyPosition, DefinitionSpec, DunderKind, MatchPosition, ParameterSpec};
use std::path::PathBuf;

/// Carries the failure of the lookup that produced it.
///
/// Navigation returns the same error target, and every other operation
/// returns the stored failure, so a chain of calls reports the first
/// failure and nothing else.
#[derive(Debug, Clone)]
pub struct ErrorTarget {
    failure: EditResult,
}

impl ErrorTarget {
    pub fn new(failure: EditResult) -> Self {
        Self { failure }
    }

    /// The stored failure.
    pub fn failure(&self) -> EditResult {
        self.failure.clone()
    }

    pub fn message(&self) -> &str {
        &self.failure.message
    }
}

impl<'s> Navigable<'s> for ErrorTarget {
    fn kind(&self) -> TargetKind {
        TargetKind::Error
    }

    fn find_class(&self, _name: &str) -> Target<'s> {
        Target::Error(self.clone())
    }

    fn find_function(&self, _name: &str) -> Target<'s> {
        Target::Error(self.clone())
    }

    fn find_method(&self, _name: &str) -> Target<'s> {
        Target::Error(self.clone())
    }

    fn find_classes(&self, _pattern: &str) -> TargetList<'s> {
        std::iter::once(Target::Error(self.clone())).collect()
    }

    fn find_functions(&self, _pattern: &str) -> TargetList<'s> {
        std::iter::once(Target::Error(self.clone())).collect()
    }

    fn find_methods(&self, _pattern: &str) -> TargetList<'s> {
        std::iter::once(Target::Error(self.clone())).collect()
    }
}

impl Renameable for ErrorTarget {
    fn rename(&self, _new_name: &str) -> EditResult {
        self.failure()
    }
}

impl Decoratable for ErrorTarget {
    fn add_decorator(&self, _decorator: &str) -> EditResult {
        self.failure()
    }

    fn remove_decorator(&self, _name: &str) -> EditResult {
        self.failure()
    }
}

impl SignatureEditable for ErrorTarget {
    fn add_parameter(&self, _spec: ParameterSpec) -> EditResult {
        self.failure()
    }

    fn remove_parameter(&self, _name: &str) -> EditResult {
        self.failure()
    }

    fn set_return_type(&self, _annotation: &str) -> EditResult {
        self.failure()
    }

    fn convert_to_async(&self) -> EditResult {
        self.failure()
    }

    fn convert_to_sync(&self) -> EditResult {
        self.failure()
    }
}

impl BodyEditable for ErrorTarget {
    fn insert_statement(&self, _code: &str, _position: BodyPosition) -> EditResult {
        self.failure()
    }
}

impl MatchEditable for ErrorTarget {
    fn insert_at_match(&self, _pattern: &str, _code: &str, _position: MatchPosition) -> EditResult {
        self.failure()
    }
}

impl AttributeHost for ErrorTarget {
    fn add_attribute(&self, _name: &str, _annotation: Option<&str>, _value: Option<&str>) -> EditResult {
        self.failure()
    }

    fn remove_attribute(&self, _name: &str) -> EditResult {
        self.failure()
    }

    fn add_method(&self, _spec: DefinitionSpec) -> EditResult {
        self.failure()
    }

    fn generate_dunder(&self, _kind: DunderKind, _overwrite: bool) -> EditResult {
        self.failure()
    }
}

impl Deletable for ErrorTarget {
    fn delete(&self) -> EditResult {
        self.failure()
    }
}

impl Movable for ErrorTarget {
    fn move_to(&self, _destination: &str) -> EditResult {
        self.failure()
    }
}

impl ModuleEditable for ErrorTarget {
    fn add_import(&self, _statement: &str) -> EditResult {
        self.failure()
    }

    fn remove_import(&self, _pattern: &str) -> EditResult {
        self.failure()
    }

    fn add_class(&self, _spec: DefinitionSpec) -> EditResult {
        self.failure()
    }

    fn add_function(&self, _spec: DefinitionSpec) -> EditResult {
        self.failure()
    }

    fn rewrite(&self, _content: &str) -> EditResult {
        self.failure()
    }
}

impl ContentSource for ErrorTarget {
    fn exists(&self) -> bool {
        false
    }

    fn file_path(&self) -> Option<PathBuf> {
        None
    }

    fn line_number(&self) -> Option<usize> {
        None
    }

    fn get_content(&self) -> EditResult {
        self.failure()
    }
}
