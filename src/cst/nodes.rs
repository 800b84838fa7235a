//! Typed views over tree-sitter nodes.
//!
//! Each view borrows the [`SourceTree`] it came from, so names and text are
//! returned as slices of the original source.

use super::SourceTree;
use tree_sitter::Node;

fn named_children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|c| c.kind() != "comment")
        .collect()
}

fn start_line(node: Node<'_>) -> usize {
    node.start_position().row + 1
}

fn end_line(node: Node<'_>) -> usize {
    node.end_position().row + 1
}

/// The decorated wrapper of a definition, or the definition itself.
fn outer_node(node: Node<'_>) -> Node<'_> {
    match node.parent() {
        Some(parent) if parent.kind() == "decorated_definition" => parent,
        _ => node,
    }
}

fn decorators_of<'t>(tree: &'t SourceTree, node: Node<'t>) -> Vec<Decorator<'t>> {
    let outer = outer_node(node);
    if outer.id() == node.id() {
        return Vec::new();
    }
    named_children(outer)
        .into_iter()
        .filter(|c| c.kind() == "decorator")
        .map(|node| Decorator { tree, node })
        .collect()
}

/// A class or function definition.
#[derive(Clone, Copy)]
pub enum Definition<'t> {
    Class(ClassDef<'t>),
    Function(FunctionDef<'t>),
}

impl<'t> Definition<'t> {
    /// Wraps a `class_definition`, `function_definition` or
    /// `decorated_definition` node.
    pub fn from_node(tree: &'t SourceTree, node: Node<'t>) -> Option<Self> {
        match node.kind() {
            "class_definition" => Some(Self::Class(ClassDef { tree, node })),
            "function_definition" => Some(Self::Function(FunctionDef { tree, node })),
            "decorated_definition" => node
                .child_by_field_name("definition")
                .and_then(|inner| Self::from_node(tree, inner)),
            _ => None,
        }
    }

    pub fn name(&self) -> &'t str {
        match self {
            Self::Class(c) => c.name(),
            Self::Function(f) => f.name(),
        }
    }

    /// The definition node without decorators.
    pub fn node(&self) -> Node<'t> {
        match self {
            Self::Class(c) => c.node(),
            Self::Function(f) => f.node(),
        }
    }

    /// The definition node including its decorators.
    pub fn outer(&self) -> Node<'t> {
        outer_node(self.node())
    }

    pub fn body(&self) -> Option<Block<'t>> {
        match self {
            Self::Class(c) => c.body(),
            Self::Function(f) => f.body(),
        }
    }

    pub fn decorators(&self) -> Vec<Decorator<'t>> {
        match self {
            Self::Class(c) => c.decorators(),
            Self::Function(f) => f.decorators(),
        }
    }

    /// First line, counting decorators.
    pub fn start_line(&self) -> usize {
        start_line(self.outer())
    }

    pub fn end_line(&self) -> usize {
        end_line(self.outer())
    }

    /// Source text including decorators.
    pub fn text(&self) -> &'t str {
        match self {
            Self::Class(c) => c.text(),
            Self::Function(f) => f.text(),
        }
    }
}

/// A `class` definition.
#[derive(Clone, Copy)]
pub struct ClassDef<'t> {
    tree: &'t SourceTree,
    node: Node<'t>,
}

impl<'t> ClassDef<'t> {
    pub fn node(&self) -> Node<'t> {
        self.node
    }

    pub fn name_node(&self) -> Option<Node<'t>> {
        self.node.child_by_field_name("name")
    }

    pub fn name(&self) -> &'t str {
        self.name_node().map_or("", |n| self.tree.text_of(n))
    }

    /// The base class list including parentheses, if any.
    pub fn bases(&self) -> Option<&'t str> {
        self.node
            .child_by_field_name("superclasses")
            .map(|n| self.tree.text_of(n))
    }

    pub fn body(&self) -> Option<Block<'t>> {
        self.node
            .child_by_field_name("body")
            .map(|node| Block::new(self.tree, node))
    }

    pub fn decorators(&self) -> Vec<Decorator<'t>> {
        decorators_of(self.tree, self.node)
    }

    /// Methods defined directly in the class body.
    pub fn methods(&self) -> Vec<FunctionDef<'t>> {
        self.body()
            .map(|b| b.statements())
            .unwrap_or_default()
            .into_iter()
            .filter_map(|s| match s.definition() {
                Some(Definition::Function(f)) => Some(f),
                _ => None,
            })
            .collect()
    }

    pub fn find_method(&self, name: &str) -> Option<FunctionDef<'t>> {
        self.methods().into_iter().find(|m| m.name() == name)
    }

    /// Class-level assignments directly in the body.
    pub fn assignments(&self) -> Vec<Assignment<'t>> {
        self.body()
            .map(|b| b.statements())
            .unwrap_or_default()
            .into_iter()
            .filter_map(|s| s.assignment())
            .collect()
    }

    pub fn start_line(&self) -> usize {
        start_line(outer_node(self.node))
    }

    pub fn end_line(&self) -> usize {
        end_line(self.node)
    }

    pub fn text(&self) -> &'t str {
        self.tree.text_of(outer_node(self.node))
    }
}

/// A `def` or `async def` definition.
#[derive(Clone, Copy)]
pub struct FunctionDef<'t> {
    tree: &'t SourceTree,
    node: Node<'t>,
}

impl<'t> FunctionDef<'t> {
    pub fn node(&self) -> Node<'t> {
        self.node
    }

    pub fn name_node(&self) -> Option<Node<'t>> {
        self.node.child_by_field_name("name")
    }

    pub fn name(&self) -> &'t str {
        self.name_node().map_or("", |n| self.tree.text_of(n))
    }

    pub fn parameters(&self) -> Option<ParameterList<'t>> {
        self.node
            .child_by_field_name("parameters")
            .map(|node| ParameterList {
                tree: self.tree,
                node,
            })
    }

    /// The return annotation node, without the arrow.
    pub fn return_type(&self) -> Option<Node<'t>> {
        self.node.child_by_field_name("return_type")
    }

    pub fn body(&self) -> Option<Block<'t>> {
        self.node
            .child_by_field_name("body")
            .map(|node| Block::new(self.tree, node))
    }

    pub fn decorators(&self) -> Vec<Decorator<'t>> {
        decorators_of(self.tree, self.node)
    }

    pub fn has_decorator(&self, name: &str) -> bool {
        self.decorators().iter().any(|d| d.name() == Some(name))
    }

    /// The `async` keyword token, when present.
    pub fn async_keyword(&self) -> Option<Node<'t>> {
        let mut cursor = self.node.walk();
        let keyword = self
            .node
            .children(&mut cursor)
            .find(|c| c.kind() == "async");
        keyword
    }

    pub fn is_async(&self) -> bool {
        self.async_keyword().is_some()
    }

    /// The `def` keyword token.
    pub fn def_keyword(&self) -> Option<Node<'t>> {
        let mut cursor = self.node.walk();
        let keyword = self.node.children(&mut cursor).find(|c| c.kind() == "def");
        keyword
    }

    pub fn start_line(&self) -> usize {
        start_line(outer_node(self.node))
    }

    pub fn end_line(&self) -> usize {
        end_line(self.node)
    }

    pub fn text(&self) -> &'t str {
        self.tree.text_of(outer_node(self.node))
    }
}

/// An indented block of statements, or the module body.
#[derive(Clone, Copy)]
pub struct Block<'t> {
    tree: &'t SourceTree,
    node: Node<'t>,
}

impl<'t> Block<'t> {
    pub(crate) fn new(tree: &'t SourceTree, node: Node<'t>) -> Self {
        Self { tree, node }
    }

    pub fn node(&self) -> Node<'t> {
        self.node
    }

    pub fn statements(&self) -> Vec<Statement<'t>> {
        named_children(self.node)
            .into_iter()
            .map(|node| Statement {
                tree: self.tree,
                node,
            })
            .collect()
    }

    /// The leading docstring statement, if the block starts with one.
    pub fn docstring(&self) -> Option<Statement<'t>> {
        self.statements().into_iter().next().filter(|s| s.is_docstring())
    }

    /// Indentation of the statements in this block.
    pub fn indent(&self) -> &'t str {
        self.statements()
            .first()
            .map_or("", |s| self.tree.indent_of(s.node))
    }

    /// True when the body shares a line with its header, as in
    /// `class A: pass`.
    pub fn is_inline(&self) -> bool {
        let Some(first) = self.statements().into_iter().next() else {
            return false;
        };
        let line_start = self.tree.line_start(first.node.start_byte());
        !self.tree.serialize()[line_start..first.node.start_byte()]
            .chars()
            .all(char::is_whitespace)
    }
}

/// A single statement inside a block.
#[derive(Clone, Copy)]
pub struct Statement<'t> {
    tree: &'t SourceTree,
    node: Node<'t>,
}

impl<'t> Statement<'t> {
    pub fn node(&self) -> Node<'t> {
        self.node
    }

    pub fn kind(&self) -> &'static str {
        self.node.kind()
    }

    pub fn text(&self) -> &'t str {
        self.tree.text_of(self.node)
    }

    pub fn start_line(&self) -> usize {
        start_line(self.node)
    }

    pub fn end_line(&self) -> usize {
        end_line(self.node)
    }

    /// A bare string expression statement.
    pub fn is_docstring(&self) -> bool {
        if self.node.kind() != "expression_statement" {
            return false;
        }
        let children = named_children(self.node);
        children.len() == 1 && matches!(children[0].kind(), "string" | "concatenated_string")
    }

    pub fn is_import(&self) -> bool {
        matches!(
            self.node.kind(),
            "import_statement" | "import_from_statement" | "future_import_statement"
        )
    }

    pub fn definition(&self) -> Option<Definition<'t>> {
        Definition::from_node(self.tree, self.node)
    }

    pub fn assignment(&self) -> Option<Assignment<'t>> {
        if self.node.kind() != "expression_statement" {
            return None;
        }
        named_children(self.node)
            .into_iter()
            .find(|c| c.kind() == "assignment")
            .map(|node| Assignment {
                tree: self.tree,
                node,
                statement: self.node,
            })
    }

    /// Blocks nested in a compound statement (`if`, `for`, `try`, ...).
    ///
    /// Definitions are separate scopes and yield no blocks.
    pub fn nested_blocks(&self) -> Vec<Block<'t>> {
        if self.definition().is_some() {
            return Vec::new();
        }
        let mut blocks = Vec::new();
        collect_blocks(self.node, &mut blocks);
        blocks
            .into_iter()
            .map(|node| Block::new(self.tree, node))
            .collect()
    }
}

fn collect_blocks<'t>(node: Node<'t>, out: &mut Vec<Node<'t>>) {
    for child in named_children(node) {
        match child.kind() {
            "block" => out.push(child),
            "class_definition" | "function_definition" | "decorated_definition" => {}
            _ => collect_blocks(child, out),
        }
    }
}

/// An assignment such as `x = 1`, `x: int` or `self.x: int = 1`.
#[derive(Clone, Copy)]
pub struct Assignment<'t> {
    tree: &'t SourceTree,
    node: Node<'t>,
    statement: Node<'t>,
}

impl<'t> Assignment<'t> {
    /// The enclosing expression statement.
    pub fn statement(&self) -> Node<'t> {
        self.statement
    }

    /// Plain names bound by this assignment, including chained targets.
    pub fn target_names(&self) -> Vec<&'t str> {
        let mut names = Vec::new();
        let mut current = Some(self.node);
        while let Some(node) = current {
            if let Some(left) = node.child_by_field_name("left") {
                match left.kind() {
                    "identifier" => names.push(self.tree.text_of(left)),
                    "pattern_list" | "tuple_pattern" => names.extend(
                        named_children(left)
                            .into_iter()
                            .filter(|c| c.kind() == "identifier")
                            .map(|c| self.tree.text_of(c)),
                    ),
                    _ => {}
                }
            }
            current = node
                .child_by_field_name("right")
                .filter(|r| r.kind() == "assignment");
        }
        names
    }

    /// The single plain name bound by this assignment.
    pub fn name(&self) -> Option<&'t str> {
        self.node
            .child_by_field_name("left")
            .filter(|l| l.kind() == "identifier")
            .map(|l| self.tree.text_of(l))
    }

    /// The attribute name for `self.<name> = ...` targets.
    pub fn self_attribute(&self) -> Option<&'t str> {
        let left = self.node.child_by_field_name("left")?;
        if left.kind() != "attribute" {
            return None;
        }
        let object = left.child_by_field_name("object")?;
        if self.tree.text_of(object) != "self" {
            return None;
        }
        left.child_by_field_name("attribute")
            .map(|a| self.tree.text_of(a))
    }

    pub fn annotation(&self) -> Option<&'t str> {
        self.node
            .child_by_field_name("type")
            .map(|n| self.tree.text_of(n))
    }

    /// The assigned value; for chained assignments, the final value.
    pub fn value(&self) -> Option<&'t str> {
        let mut right = self.node.child_by_field_name("right")?;
        while right.kind() == "assignment" {
            right = right.child_by_field_name("right")?;
        }
        Some(self.tree.text_of(right))
    }
}

/// A decorator line such as `@dataclass(frozen=True)`.
#[derive(Clone, Copy)]
pub struct Decorator<'t> {
    tree: &'t SourceTree,
    node: Node<'t>,
}

impl<'t> Decorator<'t> {
    pub fn node(&self) -> Node<'t> {
        self.node
    }

    /// The decorator expression, without the `@`.
    pub fn expression(&self) -> Option<Node<'t>> {
        named_children(self.node).into_iter().next()
    }

    /// The text after the `@`.
    pub fn text(&self) -> &'t str {
        self.expression().map_or("", |e| self.tree.text_of(e))
    }

    /// The decorator name used for deduplication: the bare or dotted name,
    /// or for calls the name of the called function.
    pub fn name(&self) -> Option<&'t str> {
        let expr = self.expression()?;
        let target = if expr.kind() == "call" {
            expr.child_by_field_name("function")?
        } else {
            expr
        };
        match target.kind() {
            "identifier" | "attribute" => Some(self.tree.text_of(target)),
            _ => None,
        }
    }

    /// Byte range of the full source lines occupied by this decorator.
    pub fn line_range(&self) -> std::ops::Range<usize> {
        let end = self
            .expression()
            .map_or(self.node.end_byte(), |e| e.end_byte());
        self.tree.line_start(self.node.start_byte())..self.tree.line_end(end)
    }
}

/// Kind of an entry in a parameter list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Positional,
    /// The `/` marker.
    PositionalSeparator,
    /// `*args`.
    VarPositional,
    /// The bare `*` marker.
    KeywordSeparator,
    KeywordOnly,
    /// `**kwargs`.
    VarKeyword,
}

/// One entry of a parameter list.
#[derive(Clone, Copy)]
pub struct Parameter<'t> {
    pub node: Node<'t>,
    pub kind: ParamKind,
    pub name: Option<&'t str>,
    pub text: &'t str,
}

/// The parenthesized parameter list of a function.
#[derive(Clone, Copy)]
pub struct ParameterList<'t> {
    tree: &'t SourceTree,
    node: Node<'t>,
}

impl<'t> ParameterList<'t> {
    pub fn node(&self) -> Node<'t> {
        self.node
    }

    pub fn is_multiline(&self) -> bool {
        self.node.start_position().row != self.node.end_position().row
    }

    pub fn params(&self) -> Vec<Parameter<'t>> {
        let mut seen_star = false;
        named_children(self.node)
            .into_iter()
            .map(|node| {
                let kind = match node.kind() {
                    "positional_separator" => ParamKind::PositionalSeparator,
                    "keyword_separator" => {
                        seen_star = true;
                        ParamKind::KeywordSeparator
                    }
                    _ if splat_kind(node) == Some("list_splat_pattern") => {
                        seen_star = true;
                        ParamKind::VarPositional
                    }
                    _ if splat_kind(node) == Some("dictionary_splat_pattern") => {
                        ParamKind::VarKeyword
                    }
                    _ if seen_star => ParamKind::KeywordOnly,
                    _ => ParamKind::Positional,
                };
                Parameter {
                    node,
                    kind,
                    name: self.param_name(node),
                    text: self.tree.text_of(node),
                }
            })
            .collect()
    }

    pub fn find(&self, name: &str) -> Option<Parameter<'t>> {
        self.params().into_iter().find(|p| p.name == Some(name))
    }

    fn param_name(&self, node: Node<'t>) -> Option<&'t str> {
        match node.kind() {
            "identifier" => Some(self.tree.text_of(node)),
            "default_parameter" | "typed_default_parameter" => node
                .child_by_field_name("name")
                .filter(|n| n.kind() == "identifier")
                .map(|n| self.tree.text_of(n)),
            "typed_parameter" => named_children(node)
                .into_iter()
                .next()
                .and_then(|inner| self.param_name(inner)),
            "list_splat_pattern" | "dictionary_splat_pattern" => named_children(node)
                .into_iter()
                .next()
                .map(|n| self.tree.text_of(n)),
            _ => None,
        }
    }
}

fn splat_kind(node: Node<'_>) -> Option<&'static str> {
    match node.kind() {
        kind @ ("list_splat_pattern" | "dictionary_splat_pattern") => Some(kind),
        "typed_parameter" => named_children(node).into_iter().next().and_then(|c| {
            matches!(c.kind(), "list_splat_pattern" | "dictionary_splat_pattern")
                .then_some(c.kind())
        }),
        _ => None,
    }
}
