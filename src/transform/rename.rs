//! Renaming of definitions.

use super::{Transformed, Transformer, check_identifier, locate};
use crate::cst::{Definition, ElementPath, SourceTree, TextEdit};
use crate::error::{EditError, Result};

/// Renames a class, function or method definition.
///
/// Only the definition's name changes; call sites and imports are left
/// untouched.
#[derive(Debug, Clone)]
pub struct Rename {
    path: ElementPath,
    new_name: String,
}

impl Rename {
    pub fn new(path: ElementPath, new_name: impl Into<String>) -> Self {
        Self {
            path,
            new_name: new_name.into(),
        }
    }
}

impl Transformer for Rename {
    fn describe(&self) -> String {
        format!("rename {} to {}", self.path, self.new_name)
    }

    fn apply(&self, tree: &SourceTree) -> Result<Transformed> {
        check_identifier(&self.new_name)?;
        let def = locate(tree, &self.path)?;
        if def.name() == self.new_name {
            return Ok(Transformed::unchanged(tree));
        }

        let name_node = match def {
            Definition::Class(c) => c.name_node(),
            Definition::Function(f) => f.name_node(),
        }
        .ok_or_else(|| EditError::transform(format!("'{}' has no name", self.path)))?;

        Transformed::edited(
            tree,
            vec![TextEdit::replace(name_node.byte_range(), self.new_name.clone())],
        )
    }
}
