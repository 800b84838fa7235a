//! Statement insertion into bodies.

use super::{
    Transformed, Transformer, check_snippet, editable_body, indent_code, insert_after,
    insert_at_end, insert_at_start, locate, statement_lines,
};
use crate::cst::{Block, ElementPath, SourceTree, Statement, TextEdit};
use crate::error::{EditError, Result};
use regex::Regex;
use std::fmt;

/// Where [`InsertStatement`] places its code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BodyPosition {
    /// First statement, after any docstring.
    Start,
    #[default]
    End,
}

/// Inserts code at the start or end of a function, method or class body.
#[derive(Debug, Clone)]
pub struct InsertStatement {
    target: ElementPath,
    code: String,
    position: BodyPosition,
}

impl InsertStatement {
    pub fn new(target: ElementPath, code: impl Into<String>) -> Self {
        Self {
            target,
            code: code.into(),
            position: BodyPosition::End,
        }
    }

    pub fn position(mut self, position: BodyPosition) -> Self {
        self.position = position;
        self
    }
}

impl Transformer for InsertStatement {
    fn describe(&self) -> String {
        format!("insert statement into {}", self.target)
    }

    fn apply(&self, tree: &SourceTree) -> Result<Transformed> {
        check_snippet(&self.code)?;
        let def = locate(tree, &self.target)?;
        let body = editable_body(&def)?;
        let lines = indent_code(&self.code, body.indent());
        let edit = match self.position {
            BodyPosition::Start => insert_at_start(tree, &body, &lines, false)?,
            BodyPosition::End => insert_at_end(tree, &body, &lines, false)?,
        };
        Transformed::edited(tree, vec![edit])
    }
}

/// What [`InsertAtMatch`] does at the matching statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPosition {
    Before,
    After,
    Replace,
}

/// The body searched by [`InsertAtMatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchScope {
    Module,
    Class(String),
    Function(String),
    Method { class: String, name: String },
}

impl MatchScope {
    fn element(&self) -> Option<ElementPath> {
        match self {
            Self::Module => None,
            Self::Class(name) => Some(ElementPath::class(name.clone())),
            Self::Function(name) => Some(ElementPath::function(name.clone())),
            Self::Method { class, name } => Some(ElementPath::method(class.clone(), name.clone())),
        }
    }
}

impl From<ElementPath> for MatchScope {
    fn from(path: ElementPath) -> Self {
        match path {
            ElementPath::Class(name) => Self::Class(name),
            ElementPath::Function(name) => Self::Function(name),
            ElementPath::Method { class, name } => Self::Method { class, name },
        }
    }
}

impl fmt::Display for MatchScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.element() {
            Some(path) => write!(f, "{} '{path}'", path.kind_label().to_lowercase()),
            None => f.write_str("module"),
        }
    }
}

/// Inserts code before or after, or in place of, the first statement whose
/// source matches a regex.
///
/// Statements are visited in source order. The blocks of a compound
/// statement are searched before the compound statement itself is tested;
/// nested class and function definitions are never searched.
#[derive(Debug, Clone)]
pub struct InsertAtMatch {
    scope: MatchScope,
    pattern: Regex,
    code: String,
    position: MatchPosition,
}

impl InsertAtMatch {
    pub fn new(
        scope: impl Into<MatchScope>,
        pattern: &str,
        code: impl Into<String>,
        position: MatchPosition,
    ) -> Result<Self> {
        Ok(Self {
            scope: scope.into(),
            pattern: Regex::new(pattern)?,
            code: code.into(),
            position,
        })
    }

    fn first_match<'t>(&self, block: &Block<'t>) -> Option<Statement<'t>> {
        for statement in block.statements() {
            if statement.definition().is_some() {
                continue;
            }
            for nested in statement.nested_blocks() {
                if let Some(found) = self.first_match(&nested) {
                    return Some(found);
                }
            }
            if self.pattern.is_match(statement.text()) {
                return Some(statement);
            }
        }
        None
    }
}

impl Transformer for InsertAtMatch {
    fn describe(&self) -> String {
        let verb = match self.position {
            MatchPosition::Before => "insert before",
            MatchPosition::After => "insert after",
            MatchPosition::Replace => "replace",
        };
        format!("{verb} /{}/ in {}", self.pattern, self.scope)
    }

    fn apply(&self, tree: &SourceTree) -> Result<Transformed> {
        check_snippet(&self.code)?;
        let block = match self.scope.element() {
            Some(path) => editable_body(&locate(tree, &path)?)?,
            None => tree.module(),
        };
        let statement = self.first_match(&block).ok_or_else(|| {
            EditError::NotFound(format!(
                "No statement matching '{}' in {}",
                self.pattern, self.scope
            ))
        })?;

        let node = statement.node();
        let lines = indent_code(&self.code, tree.indent_of(node));
        let edit = match self.position {
            MatchPosition::Before => {
                let range = statement_lines(tree, node)?;
                TextEdit::insert(range.start, lines)
            }
            MatchPosition::After => insert_after(tree, node, &lines, false)?,
            MatchPosition::Replace => TextEdit::replace(statement_lines(tree, node)?, lines),
        };
        Transformed::edited(tree, vec![edit])
    }
}
