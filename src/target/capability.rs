//! Operations a target kind may support.
//!
//! Each trait groups one family of operations. A concrete target implements
//! the families it supports; [`Target`](super::Target) dispatches through
//! them and answers with an `Unsupported` failure for the rest.

use super::{Target, TargetKind, TargetList};
use crate::result::EditResult;
use crate::transform::{BodyPosition, DefinitionSpec, DunderKind, MatchPosition, ParameterSpec};
use std::path::PathBuf;

/// Lookup of nested elements.
///
/// A lookup that fails yields an error target, so chained calls report the
/// first failure. Kinds without a given kind of child answer with an
/// `Unsupported` error target, or an empty list.
pub trait Navigable<'s> {
    fn kind(&self) -> TargetKind;

    fn find_class(&self, _name: &str) -> Target<'s> {
        Target::unsupported_navigation("find_class", self.kind())
    }

    fn find_function(&self, _name: &str) -> Target<'s> {
        Target::unsupported_navigation("find_function", self.kind())
    }

    fn find_method(&self, _name: &str) -> Target<'s> {
        Target::unsupported_navigation("find_method", self.kind())
    }

    fn find_classes(&self, _pattern: &str) -> TargetList<'s> {
        TargetList::default()
    }

    fn find_functions(&self, _pattern: &str) -> TargetList<'s> {
        TargetList::default()
    }

    fn find_methods(&self, _pattern: &str) -> TargetList<'s> {
        TargetList::default()
    }
}

pub trait Renameable {
    /// Renames the definition. Call sites are not updated.
    fn rename(&self, new_name: &str) -> EditResult;
}

pub trait Decoratable {
    /// Adds `@decorator` unless a decorator of the same name exists.
    fn add_decorator(&self, decorator: &str) -> EditResult;
    fn remove_decorator(&self, name: &str) -> EditResult;
}

pub trait SignatureEditable {
    fn add_parameter(&self, spec: ParameterSpec) -> EditResult;
    fn remove_parameter(&self, name: &str) -> EditResult;
    fn set_return_type(&self, annotation: &str) -> EditResult;
    fn convert_to_async(&self) -> EditResult;
    fn convert_to_sync(&self) -> EditResult;
}

pub trait BodyEditable {
    fn insert_statement(&self, code: &str, position: BodyPosition) -> EditResult;
}

/// Edits anchored on the first statement matching a regex.
pub trait MatchEditable {
    fn insert_at_match(&self, pattern: &str, code: &str, position: MatchPosition) -> EditResult;

    fn insert_before_match(&self, pattern: &str, code: &str) -> EditResult {
        self.insert_at_match(pattern, code, MatchPosition::Before)
    }

    fn insert_after_match(&self, pattern: &str, code: &str) -> EditResult {
        self.insert_at_match(pattern, code, MatchPosition::After)
    }

    fn replace_match(&self, pattern: &str, code: &str) -> EditResult {
        self.insert_at_match(pattern, code, MatchPosition::Replace)
    }
}

pub trait AttributeHost {
    fn add_attribute(&self, name: &str, annotation: Option<&str>, value: Option<&str>) -> EditResult;
    fn remove_attribute(&self, name: &str) -> EditResult;
    fn add_method(&self, spec: DefinitionSpec) -> EditResult;
    fn generate_dunder(&self, kind: DunderKind, overwrite: bool) -> EditResult;
}

pub trait Deletable {
    fn delete(&self) -> EditResult;
}

pub trait Movable {
    /// Moves the definition to a dotted module or a `.py` path.
    fn move_to(&self, destination: &str) -> EditResult;
}

pub trait ModuleEditable {
    fn add_import(&self, statement: &str) -> EditResult;
    fn remove_import(&self, pattern: &str) -> EditResult;
    fn add_class(&self, spec: DefinitionSpec) -> EditResult;
    fn add_function(&self, spec: DefinitionSpec) -> EditResult;
    /// Replaces the whole file; the new content must parse.
    fn rewrite(&self, content: &str) -> EditResult;
}

pub trait ContentSource {
    fn exists(&self) -> bool;
    fn file_path(&self) -> Option<PathBuf>;
    /// 1-based line of the definition, counting decorators.
    fn line_number(&self) -> Option<usize>;
    /// The source text, carried in the result's `data`.
    fn get_content(&self) -> EditResult;
}
