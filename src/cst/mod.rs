//! Format-preserving concrete syntax trees for Python source.
//!
//! A [`SourceTree`] owns the exact source text together with the tree-sitter
//! tree parsed from it. Serializing an untouched tree returns the original
//! text byte-for-byte. Mutations are expressed as byte-range [`TextEdit`]s
//! that are spliced into the text, after which the result is reparsed so
//! every edit is checked for syntactic validity.
//!
//! ```rust
//! use pyedit::cst::{SourceTree, TextEdit};
//!
//! let tree = SourceTree::parse("class User:\n    pass\n")?;
//! let class = tree.find_class("User").unwrap();
//! let name = class.name_node().unwrap();
//!
//! let renamed = tree.apply_edits(vec![TextEdit::replace(name.byte_range(), "Account")])?;
//! assert_eq!(renamed.serialize(), "class Account:\n    pass\n");
//! # Ok::<(), pyedit::error::EditError>(())
//! ```

mod nodes;
mod position;
mod visitor;

pub use nodes::{
    Assignment, Block, ClassDef, Decorator, Definition, FunctionDef, ParamKind, Parameter,
    ParameterList, Statement,
};
pub use position::{ClassPosition, FunctionPosition, PositionIndex};
pub use visitor::{Scope, ScopeKind, ScopeStack, ScopedVisitor, Walk};

use crate::error::{EditError, Result};
use crate::lang::{Language, Python};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;
use std::path::Path;
use streaming_iterator::StreamingIterator;
use tree_sitter::{Node, QueryCursor, Tree};

/// Parsed Python source that serializes back to its exact text.
#[derive(Clone)]
pub struct SourceTree {
    text: String,
    tree: Tree,
}

impl SourceTree {
    /// Parses source text, rejecting text that contains syntax errors.
    pub fn parse(text: impl Into<String>) -> Result<Self> {
        Self::parse_named(text, Path::new("<source>"))
    }

    /// Parses source text read from `path`; the path is only used in errors.
    pub fn parse_named(text: impl Into<String>, path: &Path) -> Result<Self> {
        let text = text.into();
        let tree = Python.parse(&text)?;
        let root = tree.root_node();

        if root.has_error() {
            let line = first_error(root).map_or(1, |n| n.start_position().row + 1);
            return Err(EditError::Parse {
                path: path.to_path_buf(),
                message: format!("syntax error at line {line}"),
            });
        }

        Ok(Self { text, tree })
    }

    /// Returns the source text.
    pub fn serialize(&self) -> &str {
        &self.text
    }

    /// Consumes the tree, returning its source text.
    pub fn into_text(self) -> String {
        self.text
    }

    /// Returns the root `module` node.
    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    /// Returns the source text covered by `node`.
    pub fn text_of(&self, node: Node<'_>) -> &str {
        &self.text[node.byte_range()]
    }

    /// Returns the module body.
    pub fn module(&self) -> Block<'_> {
        Block::new(self, self.root())
    }

    /// Module-level class definitions in source order, including those
    /// nested in compound statements such as `if TYPE_CHECKING:`.
    pub fn classes(&self) -> Vec<ClassDef<'_>> {
        self.module_level()
            .into_iter()
            .filter_map(|def| match def {
                Definition::Class(class) => Some(class),
                Definition::Function(_) => None,
            })
            .collect()
    }

    /// Module-level function definitions in source order.
    pub fn functions(&self) -> Vec<FunctionDef<'_>> {
        self.module_level()
            .into_iter()
            .filter_map(|def| match def {
                Definition::Function(func) => Some(func),
                Definition::Class(_) => None,
            })
            .collect()
    }

    fn module_level(&self) -> Vec<Definition<'_>> {
        let mut defs = Vec::new();
        ScopedVisitor::new(self).walk(|_, def| {
            defs.push(def);
            Walk::SkipChildren
        });
        defs
    }

    /// Finds a class by name.
    ///
    /// Plain names match module-level classes only. Dotted names such as
    /// `Outer.Inner` address nested classes by their exact scope path.
    pub fn find_class(&self, name: &str) -> Option<ClassDef<'_>> {
        let (scope, leaf) = split_qualified(name);
        let mut found = None;
        ScopedVisitor::new(self).walk(|scopes, def| {
            if let Definition::Class(class) = def
                && class.name() == leaf
                && scopes.matches_path(ScopeKind::Class, &scope)
            {
                found = Some(class);
                return Walk::Stop;
            }
            Walk::Continue
        });
        found
    }

    /// Finds a module-level function by name.
    pub fn find_function(&self, name: &str) -> Option<FunctionDef<'_>> {
        self.functions().into_iter().find(|f| f.name() == name)
    }

    /// Finds a method defined directly in the body of the named class.
    pub fn find_method(&self, class: &str, name: &str) -> Option<FunctionDef<'_>> {
        self.find_class(class)?.find_method(name)
    }

    /// Finds the definition addressed by an [`ElementPath`].
    pub fn locate(&self, path: &ElementPath) -> Option<Definition<'_>> {
        match path {
            ElementPath::Class(name) => self.find_class(name).map(Definition::Class),
            ElementPath::Function(name) => self.find_function(name).map(Definition::Function),
            ElementPath::Method { class, name } => {
                self.find_method(class, name).map(Definition::Function)
            }
        }
    }

    /// Applies non-overlapping edits and reparses the result.
    ///
    /// Edits that start at the same offset are applied in the order given.
    pub fn apply_edits(&self, edits: Vec<TextEdit>) -> Result<SourceTree> {
        let mut ordered: Vec<(usize, TextEdit)> = edits.into_iter().enumerate().collect();
        ordered.sort_by_key(|(idx, edit)| (edit.range.start, *idx));

        let mut last_end = 0;
        for (_, edit) in &ordered {
            if edit.range.start < last_end || edit.range.end > self.text.len() {
                return Err(EditError::transform(format!(
                    "overlapping or out-of-bounds edit at byte {}",
                    edit.range.start
                )));
            }
            last_end = edit.range.end;
        }

        let mut text = self.text.clone();
        for (_, edit) in ordered.iter().rev() {
            text.replace_range(edit.range.clone(), &edit.new_text);
        }

        SourceTree::parse(text).map_err(|e| {
            EditError::transform(format!("edit produced invalid source: {e}"))
        })
    }

    /// Returns the byte offset of the start of the line containing `byte`.
    pub fn line_start(&self, byte: usize) -> usize {
        self.text[..byte].rfind('\n').map_or(0, |i| i + 1)
    }

    /// Returns the byte offset just past the newline ending the line that
    /// contains `byte`, or the end of the text on the last line.
    pub fn line_end(&self, byte: usize) -> usize {
        self.text[byte..]
            .find('\n')
            .map_or(self.text.len(), |i| byte + i + 1)
    }

    /// Moves `byte` back over any whitespace that precedes it.
    pub fn trim_end(&self, byte: usize) -> usize {
        let bytes = self.text.as_bytes();
        let mut end = byte;
        while end > 0 && bytes[end - 1].is_ascii_whitespace() {
            end -= 1;
        }
        end
    }

    /// Returns an insertion offset for new lines placed after the line
    /// holding the last non-blank character before `byte`, plus the prefix
    /// needed when that line has no terminating newline.
    pub fn after_line(&self, byte: usize) -> (usize, &'static str) {
        let end = self.line_end(self.trim_end(byte));
        if end == self.text.len() && !self.text.ends_with('\n') {
            (end, "\n")
        } else {
            (end, "")
        }
    }

    /// Returns the whitespace that precedes `node` on its first line.
    pub fn indent_of(&self, node: Node<'_>) -> &str {
        let start = self.line_start(node.start_byte());
        let prefix = &self.text[start..node.start_byte()];
        if prefix.chars().all(char::is_whitespace) {
            prefix
        } else {
            ""
        }
    }

    /// Runs a tree-sitter query under `within` and returns the nodes bound
    /// to `capture`, in document order.
    pub fn captures<'t>(
        &'t self,
        pattern: &str,
        capture: &str,
        within: Node<'t>,
    ) -> Result<Vec<Node<'t>>> {
        let query = Python.query(pattern)?;
        let Some(index) = query.capture_index_for_name(capture) else {
            return Ok(Vec::new());
        };

        let mut cursor = QueryCursor::new();
        let mut nodes = Vec::new();
        let mut matches = cursor.matches(&query, within, self.text.as_bytes());
        while let Some(query_match) = matches.next() {
            for cap in query_match.captures {
                if cap.index == index {
                    nodes.push(cap.node);
                }
            }
        }

        nodes.sort_by_key(|n| n.start_byte());
        nodes.dedup_by_key(|n| n.id());
        Ok(nodes)
    }

    /// Builds the class and function position table for this tree.
    pub fn positions(&self) -> PositionIndex {
        PositionIndex::build(self)
    }
}

impl fmt::Debug for SourceTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceTree")
            .field("len", &self.text.len())
            .field("root", &self.tree.root_node().to_sexp())
            .finish()
    }
}

fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    let children: Vec<_> = node.children(&mut cursor).collect();
    children
        .into_iter()
        .filter(|c| c.has_error() || c.is_missing())
        .find_map(first_error)
}

fn split_qualified(name: &str) -> (Vec<&str>, &str) {
    let mut parts: Vec<&str> = name.split('.').collect();
    let leaf = parts.pop().unwrap_or(name);
    (parts, leaf)
}

/// A byte-range replacement in a source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    pub range: Range<usize>,
    pub new_text: String,
}

impl TextEdit {
    /// Replaces `range` with `text`.
    pub fn replace(range: Range<usize>, text: impl Into<String>) -> Self {
        Self {
            range,
            new_text: text.into(),
        }
    }

    /// Inserts `text` at `offset`.
    pub fn insert(offset: usize, text: impl Into<String>) -> Self {
        Self::replace(offset..offset, text)
    }

    /// Deletes `range`.
    pub fn delete(range: Range<usize>) -> Self {
        Self::replace(range, String::new())
    }
}

/// Addresses a named definition inside a module.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ElementPath {
    /// A class; dotted names address nested classes.
    Class(String),
    /// A module-level function.
    Function(String),
    /// A method defined directly in a class body.
    Method { class: String, name: String },
}

impl ElementPath {
    pub fn class(name: impl Into<String>) -> Self {
        Self::Class(name.into())
    }

    pub fn function(name: impl Into<String>) -> Self {
        Self::Function(name.into())
    }

    pub fn method(class: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Method {
            class: class.into(),
            name: name.into(),
        }
    }

    /// The unqualified name of the addressed element.
    pub fn name(&self) -> &str {
        match self {
            Self::Class(name) => name.rsplit('.').next().unwrap_or(name),
            Self::Function(name) | Self::Method { name, .. } => name,
        }
    }

    /// Returns a copy addressing the same element under a new name.
    pub fn renamed(&self, new_name: &str) -> Self {
        match self {
            Self::Class(name) => match name.rsplit_once('.') {
                Some((outer, _)) => Self::Class(format!("{outer}.{new_name}")),
                None => Self::Class(new_name.to_string()),
            },
            Self::Function(_) => Self::Function(new_name.to_string()),
            Self::Method { class, .. } => Self::method(class.clone(), new_name),
        }
    }

    /// Human-readable kind, as used in messages.
    pub fn kind_label(&self) -> &'static str {
        match self {
            Self::Class(_) => "Class",
            Self::Function(_) => "Function",
            Self::Method { .. } => "Method",
        }
    }
}

impl fmt::Display for ElementPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Class(name) | Self::Function(name) => f.write_str(name),
            Self::Method { class, name } => write!(f, "{class}.{name}"),
        }
    }
}
