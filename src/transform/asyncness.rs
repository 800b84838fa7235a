//! Conversions between `def` and `async def`.

use super::{Transformed, Transformer, locate_function};
use crate::cst::{ElementPath, SourceTree, TextEdit};
use crate::error::{EditError, Result};
use tree_sitter::Node;

/// Makes a function or method `async`.
#[derive(Debug, Clone)]
pub struct ConvertToAsync {
    target: ElementPath,
}

impl ConvertToAsync {
    pub fn new(target: ElementPath) -> Self {
        Self { target }
    }
}

impl Transformer for ConvertToAsync {
    fn describe(&self) -> String {
        format!("convert {} to async", self.target)
    }

    fn apply(&self, tree: &SourceTree) -> Result<Transformed> {
        let func = locate_function(tree, &self.target)?;
        if func.is_async() {
            return Ok(Transformed::unchanged(tree));
        }
        let def = func
            .def_keyword()
            .ok_or_else(|| EditError::transform(format!("'{}' has no def keyword", self.target)))?;
        Transformed::edited(tree, vec![TextEdit::insert(def.start_byte(), "async ")])
    }
}

/// Makes an `async` function synchronous.
///
/// `await` expressions that belong to the function are unwrapped to their
/// operand; awaits inside nested functions and lambdas are left alone. By
/// default `async for` and `async with` statements lose their `async` too.
#[derive(Debug, Clone)]
pub struct ConvertToSync {
    target: ElementPath,
    statements: bool,
}

impl ConvertToSync {
    pub fn new(target: ElementPath) -> Self {
        Self {
            target,
            statements: true,
        }
    }

    /// Whether `async for` / `async with` are rewritten as well.
    pub fn statements(mut self, statements: bool) -> Self {
        self.statements = statements;
        self
    }
}

impl Transformer for ConvertToSync {
    fn describe(&self) -> String {
        format!("convert {} to sync", self.target)
    }

    fn apply(&self, tree: &SourceTree) -> Result<Transformed> {
        let func = locate_function(tree, &self.target)?;
        let Some(keyword) = func.async_keyword() else {
            return Ok(Transformed::unchanged(tree));
        };
        let def = func
            .def_keyword()
            .ok_or_else(|| EditError::transform(format!("'{}' has no def keyword", self.target)))?;

        let mut edits = vec![TextEdit::delete(keyword.start_byte()..def.start_byte())];
        let Some(body) = func.body() else {
            return Transformed::edited(tree, edits);
        };

        let mut owned = OwnNodes::default();
        owned.collect(body.node());
        for node in owned.awaits {
            edits.push(TextEdit::replace(node.byte_range(), unwrap_await(tree, node)));
        }
        if self.statements {
            for keyword in owned.async_keywords {
                if let Some(next) = keyword.next_sibling() {
                    edits.push(TextEdit::delete(keyword.start_byte()..next.start_byte()));
                }
            }
        }
        Transformed::edited(tree, edits)
    }
}

/// Outermost `await` expressions and `async` statement keywords that belong
/// to one function scope.
#[derive(Default)]
struct OwnNodes<'t> {
    awaits: Vec<Node<'t>>,
    async_keywords: Vec<Node<'t>>,
}

impl<'t> OwnNodes<'t> {
    fn collect(&mut self, node: Node<'t>) {
        let mut cursor = node.walk();
        let children: Vec<Node<'t>> = node.children(&mut cursor).collect();
        for child in children {
            match child.kind() {
                "function_definition" | "class_definition" | "lambda" => {}
                "await" => self.awaits.push(child),
                "async"
                    if matches!(
                        node.kind(),
                        "for_statement" | "with_statement" | "for_in_clause"
                    ) =>
                {
                    self.async_keywords.push(child);
                }
                _ => self.collect(child),
            }
        }
    }
}

/// Text of an await's operand with any awaits inside it unwrapped as well.
fn unwrap_await(tree: &SourceTree, node: Node<'_>) -> String {
    let Some(operand) = node.named_child(0) else {
        return String::new();
    };
    if operand.kind() == "await" {
        return unwrap_await(tree, operand);
    }

    let mut inner = OwnNodes::default();
    inner.collect(operand);
    let base = operand.start_byte();
    let mut text = tree.text_of(operand).to_string();
    for nested in inner.awaits.iter().rev() {
        let range = nested.start_byte() - base..nested.end_byte() - base;
        text.replace_range(range, &unwrap_await(tree, *nested));
    }
    text
}
