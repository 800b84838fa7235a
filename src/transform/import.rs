//! Module-level import edits.

use super::{Transformed, Transformer, check_snippet, insert_after, statement_lines};
use crate::cst::{SourceTree, TextEdit};
use crate::error::{EditError, Result};
use regex::Regex;

/// Adds an import statement to the module.
///
/// The statement goes after the last module-level import, otherwise after
/// the module docstring, otherwise at the top. An identical import is not
/// added twice.
#[derive(Debug, Clone)]
pub struct AddImport {
    statement: String,
}

impl AddImport {
    pub fn new(statement: impl Into<String>) -> Self {
        Self {
            statement: statement.into().trim().to_string(),
        }
    }
}

impl Transformer for AddImport {
    fn describe(&self) -> String {
        format!("add import '{}'", self.statement)
    }

    fn apply(&self, tree: &SourceTree) -> Result<Transformed> {
        let parsed = SourceTree::parse(self.statement.as_str())
            .map_err(|e| EditError::transform(format!("invalid import: {e}")))?;
        if !matches!(parsed.module().statements().as_slice(), [only] if only.is_import()) {
            return Err(EditError::transform(format!(
                "'{}' is not a single import statement",
                self.statement
            )));
        }

        let module = tree.module();
        let statements = module.statements();
        let imports: Vec<_> = statements.iter().filter(|s| s.is_import()).collect();
        if imports.iter().any(|s| s.text() == self.statement) {
            return Ok(Transformed::unchanged(tree));
        }

        let line = format!("{}\n", self.statement);
        let anchor = imports
            .iter()
            .rev()
            .find(|s| s.kind() != "future_import_statement")
            .or_else(|| imports.last())
            .map(|s| s.node())
            .or_else(|| module.docstring().map(|d| d.node()));
        let edit = match anchor {
            Some(node) => insert_after(tree, node, &line, false)?,
            None => TextEdit::insert(0, line),
        };
        Transformed::edited(tree, vec![edit])
    }
}

/// Removes module-level import statements whose text matches a regex.
#[derive(Debug, Clone)]
pub struct RemoveImport {
    pattern: Regex,
}

impl RemoveImport {
    pub fn new(pattern: &str) -> Result<Self> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
        })
    }
}

impl Transformer for RemoveImport {
    fn describe(&self) -> String {
        format!("remove imports matching /{}/", self.pattern)
    }

    fn apply(&self, tree: &SourceTree) -> Result<Transformed> {
        let edits = tree
            .module()
            .statements()
            .iter()
            .filter(|s| s.is_import() && self.pattern.is_match(s.text()))
            .map(|s| statement_lines(tree, s.node()).map(TextEdit::delete))
            .collect::<Result<Vec<_>>>()?;
        Transformed::edited(tree, edits)
    }
}
