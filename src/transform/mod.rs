//! Structural mutations over a [`SourceTree`].
//!
//! Every transformer is single-purpose: it locates one definition, computes
//! byte-range edits and returns the re-parsed tree together with a flag
//! saying whether anything changed. "Add" transformers are idempotent and
//! report `changed == false` when the element is already present.
//!
//! ```rust
//! use pyedit::cst::{ElementPath, SourceTree};
//! use pyedit::transform::{AddParameter, ParameterPosition, Transformer};
//!
//! let tree = SourceTree::parse("class Job:\n    def run(self, x):\n        pass\n")?;
//! let add = AddParameter::new(ElementPath::method("Job", "run"), "timeout")
//!     .annotation("int")
//!     .default_value("30")
//!     .position(ParameterPosition::End);
//!
//! let out = add.apply(&tree)?;
//! assert!(out.changed);
//! assert!(out.tree.serialize().contains("def run(self, x, timeout: int = 30):"));
//! # Ok::<(), pyedit::error::EditError>(())
//! ```

mod asyncness;
mod attribute;
mod body;
mod decorator;
mod definition;
mod dunder;
mod import;
mod parameter;
mod rename;

pub use asyncness::{ConvertToAsync, ConvertToSync};
pub use attribute::{AddClassAttribute, RemoveClassAttribute};
pub use body::{BodyPosition, InsertAtMatch, InsertStatement, MatchPosition, MatchScope};
pub use decorator::{AddDecorator, RemoveDecorator, StaticToClassMethod};
pub use definition::{AddDefinition, DefinitionSpec, DeleteDefinition, FunctionSpec};
pub use dunder::{ClassAttribute, DunderKind, GenerateDunder, extract_attributes};
pub use import::{AddImport, RemoveImport};
pub use parameter::{
    AddParameter, ParameterPosition, ParameterSpec, RemoveParameter, SetReturnType,
};
pub use rename::Rename;

use crate::cst::{Block, ClassDef, Definition, ElementPath, FunctionDef, SourceTree, TextEdit};
use crate::error::{EditError, Result};
use std::ops::Range;
use tree_sitter::Node;

/// A single-purpose mutation of a source tree.
pub trait Transformer: Send + Sync {
    /// Returns a short description, used as the operation label.
    fn describe(&self) -> String;

    /// Applies the mutation, returning the new tree.
    fn apply(&self, tree: &SourceTree) -> Result<Transformed>;
}

/// The output of a [`Transformer`].
#[derive(Debug, Clone)]
pub struct Transformed {
    pub tree: SourceTree,
    /// False when the tree was already in the requested state.
    pub changed: bool,
}

impl Transformed {
    pub fn unchanged(tree: &SourceTree) -> Self {
        Self {
            tree: tree.clone(),
            changed: false,
        }
    }

    /// Applies `edits`; an empty edit list means no change.
    pub fn edited(tree: &SourceTree, edits: Vec<TextEdit>) -> Result<Self> {
        if edits.is_empty() {
            return Ok(Self::unchanged(tree));
        }
        let new_tree = tree.apply_edits(edits)?;
        let changed = new_tree.serialize() != tree.serialize();
        Ok(Self {
            tree: new_tree,
            changed,
        })
    }
}

/// Runs several transformers in sequence.
#[derive(Default)]
pub struct Pipeline {
    transformers: Vec<Box<dyn Transformer>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a transformer.
    pub fn then<T: Transformer + 'static>(mut self, transformer: T) -> Self {
        self.transformers.push(Box::new(transformer));
        self
    }

    pub fn len(&self) -> usize {
        self.transformers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transformers.is_empty()
    }
}

impl Transformer for Pipeline {
    fn describe(&self) -> String {
        self.transformers
            .iter()
            .map(|t| t.describe())
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn apply(&self, tree: &SourceTree) -> Result<Transformed> {
        let mut current = Transformed::unchanged(tree);
        for transformer in &self.transformers {
            let next = transformer.apply(&current.tree)?;
            current = Transformed {
                changed: current.changed || next.changed,
                tree: next.tree,
            };
        }
        Ok(current)
    }
}

pub(crate) fn not_found(path: &ElementPath) -> EditError {
    EditError::NotFound(match path {
        ElementPath::Class(name) => format!("Class '{name}' not found"),
        ElementPath::Function(name) => format!("Function '{name}' not found"),
        ElementPath::Method { class, name } => {
            format!("Method '{name}' not found in class '{class}'")
        }
    })
}

pub(crate) fn locate<'t>(tree: &'t SourceTree, path: &ElementPath) -> Result<Definition<'t>> {
    tree.locate(path).ok_or_else(|| not_found(path))
}

pub(crate) fn locate_class<'t>(tree: &'t SourceTree, name: &str) -> Result<ClassDef<'t>> {
    tree.find_class(name)
        .ok_or_else(|| not_found(&ElementPath::class(name)))
}

pub(crate) fn locate_function<'t>(
    tree: &'t SourceTree,
    path: &ElementPath,
) -> Result<FunctionDef<'t>> {
    match locate(tree, path)? {
        Definition::Function(func) => Ok(func),
        Definition::Class(_) => Err(EditError::transform(format!(
            "'{path}' is a class, not a function"
        ))),
    }
}

/// The body of a definition, rejecting bodies written on the header line.
pub(crate) fn editable_body<'t>(def: &Definition<'t>) -> Result<Block<'t>> {
    let body = def
        .body()
        .ok_or_else(|| EditError::transform(format!("'{}' has no body", def.name())))?;
    if body.is_inline() {
        return Err(EditError::transform(format!(
            "'{}' has its body on the header line",
            def.name()
        )));
    }
    Ok(body)
}

/// Validates a Python identifier.
pub(crate) fn check_identifier(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = chars
        .next()
        .is_some_and(|c| c == '_' || c.is_alphabetic())
        && chars.all(|c| c == '_' || c.is_alphanumeric());
    if valid {
        Ok(())
    } else {
        Err(EditError::transform(format!("'{name}' is not a valid identifier")))
    }
}

/// Removes the common leading whitespace of all non-blank lines.
///
/// Only ASCII spaces and tabs count as margin.
pub(crate) fn dedent(code: &str) -> String {
    let margin = code
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(leading_blanks)
        .min()
        .unwrap_or(0);
    code.lines()
        .map(|l| &l[margin.min(leading_blanks(l))..])
        .collect::<Vec<_>>()
        .join("\n")
}

fn leading_blanks(line: &str) -> usize {
    line.bytes().take_while(|b| matches!(b, b' ' | b'\t')).count()
}

/// Dedents `code` and re-indents every non-blank line with `indent`.
/// The result always ends with a newline.
pub(crate) fn indent_code(code: &str, indent: &str) -> String {
    let mut out = String::new();
    for line in dedent(code.trim_end_matches('\n')).lines() {
        if !line.trim().is_empty() {
            out.push_str(indent);
            out.push_str(line);
        }
        out.push('\n');
    }
    out
}

/// Rejects snippets that do not parse on their own.
pub(crate) fn check_snippet(code: &str) -> Result<()> {
    SourceTree::parse(dedent(code))
        .map(|_| ())
        .map_err(|e| EditError::transform(format!("invalid code snippet: {e}")))
}

/// The block's only statement, when it is `pass`.
fn sole_pass<'t>(block: &Block<'t>) -> Option<Node<'t>> {
    let statements = block.statements();
    match statements.as_slice() {
        [only] if only.kind() == "pass_statement" => Some(only.node()),
        _ => None,
    }
}

/// The full lines occupied by a statement, provided no other code shares
/// them.
pub(crate) fn statement_lines(tree: &SourceTree, node: Node<'_>) -> Result<Range<usize>> {
    let start = tree.line_start(node.start_byte());
    let content_end = tree.trim_end(node.end_byte());
    let end = tree.line_end(content_end);
    let before = &tree.serialize()[start..node.start_byte()];
    let after = tree.serialize()[content_end..end].trim();
    if !before.trim().is_empty() || !(after.is_empty() || after.starts_with('#')) {
        return Err(EditError::transform(format!(
            "statement at line {} shares its line with other code",
            node.start_position().row + 1
        )));
    }
    Ok(start..end)
}

/// Inserts already indented `lines` at the start of a body, after its
/// docstring. A lone `pass` is replaced.
pub(crate) fn insert_at_start(
    tree: &SourceTree,
    block: &Block<'_>,
    lines: &str,
    blank_after_docstring: bool,
) -> Result<TextEdit> {
    if let Some(pass) = sole_pass(block) {
        return Ok(TextEdit::replace(statement_lines(tree, pass)?, lines));
    }
    if let Some(doc) = block.docstring() {
        let (offset, prefix) = tree.after_line(doc.node().end_byte());
        let blank = if blank_after_docstring { "\n" } else { "" };
        return Ok(TextEdit::insert(offset, format!("{prefix}{blank}{lines}")));
    }
    let first = block
        .statements()
        .into_iter()
        .next()
        .ok_or_else(|| EditError::transform("empty body"))?;
    Ok(TextEdit::insert(tree.line_start(first.node().start_byte()), lines))
}

/// Inserts already indented `lines` after the last statement of a body.
/// A lone `pass` is replaced.
pub(crate) fn insert_at_end(
    tree: &SourceTree,
    block: &Block<'_>,
    lines: &str,
    blank_before: bool,
) -> Result<TextEdit> {
    if let Some(pass) = sole_pass(block) {
        return Ok(TextEdit::replace(statement_lines(tree, pass)?, lines));
    }
    insert_after(tree, block.node(), lines, blank_before)
}

/// Inserts `lines` on the line after `node` ends.
pub(crate) fn insert_after(
    tree: &SourceTree,
    node: Node<'_>,
    lines: &str,
    blank_before: bool,
) -> Result<TextEdit> {
    let (offset, prefix) = tree.after_line(node.end_byte());
    let blank = if blank_before { "\n" } else { "" };
    Ok(TextEdit::insert(offset, format!("{prefix}{blank}{lines}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedent_and_indent() {
        assert_eq!(dedent("    a\n      b\n\n    c"), "a\n  b\n\nc");
        assert_eq!(indent_code("x = 1\nif x:\n    y = 2\n", "  "), "  x = 1\n  if x:\n      y = 2\n");
    }

    #[test]
    fn test_dedent_ignores_non_ascii_whitespace() {
        assert_eq!(dedent("  x = 1\n \u{a0}"), "x = 1\n\u{a0}");
        assert_eq!(dedent("\u{a0}\u{a0}x\n  y"), "\u{a0}\u{a0}x\n  y");

        let tree = SourceTree::parse("def f():\n    pass\n").unwrap();
        let result = InsertStatement::new(ElementPath::function("f"), "  x = 1\n \u{a0}").apply(&tree);
        if let Ok(out) = result {
            assert!(out.tree.serialize().starts_with("def f():\n"));
        }
    }

    #[test]
    fn test_check_identifier() {
        assert!(check_identifier("_private1").is_ok());
        assert!(check_identifier("1abc").is_err());
        assert!(check_identifier("a-b").is_err());
        assert!(check_identifier("").is_err());
    }

    #[test]
    fn test_check_snippet() {
        assert!(check_snippet("x = (\n").is_err());
        assert!(check_snippet("x = compute()\nprint(x)").is_ok());
        assert!(check_snippet("def (:").is_err());
    }

    #[test]
    fn test_statement_lines_rejects_shared_line() {
        let tree = SourceTree::parse("a = 1; b = 2\nc = 3  # note\n").unwrap();
        let stmts = tree.module().statements();
        assert!(statement_lines(&tree, stmts[0].node()).is_err());
        assert_eq!(statement_lines(&tree, stmts[2].node()).unwrap(), 13..27);
    }

    #[test]
    fn test_pipeline_accumulates_changes() {
        let tree = SourceTree::parse("class A:\n    pass\n").unwrap();
        let pipeline = Pipeline::new()
            .then(AddClassAttribute::new("A", "x").annotation("int").value("0"))
            .then(Rename::new(ElementPath::class("A"), "B"));
        assert_eq!(pipeline.len(), 2);
        let out = pipeline.apply(&tree).unwrap();
        assert!(out.changed);
        assert_eq!(out.tree.serialize(), "class B:\n    x: int = 0\n");
        assert!(pipeline.describe().contains("rename"));
    }
}
