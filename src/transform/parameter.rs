//! Parameter list and return annotation edits.
//!
//! Parameter lists are re-rendered as a whole after every insertion or
//! removal so that separators stay correct. Single-line lists are written
//! with `", "`. Multi-line lists keep one entry per line, their trailing
//! comma and their comments.

use super::{Transformed, Transformer, check_identifier, locate_function};
use crate::cst::{ElementPath, ParamKind, ParameterList, SourceTree, TextEdit};
use crate::error::{EditError, Result};
use tree_sitter::Node;

/// Where [`AddParameter`] places the new parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParameterPosition {
    /// First, or right after a leading `self`/`cls`.
    Start,
    /// Last positional parameter, before `*`, `*args` and `**kwargs`.
    #[default]
    End,
}

#[derive(Debug, Clone)]
struct Entry {
    text: String,
    kind: ParamKind,
    name: Option<String>,
    has_default: bool,
    comment: Option<String>,
}

#[derive(Debug, Clone)]
enum Item {
    Param(Entry),
    Comment(String),
}

/// Layout of an existing parameter list.
#[derive(Debug)]
struct ParamLayout {
    items: Vec<Item>,
    multiline: bool,
    /// The first entry starts its own line, as in `def f(\n    a,\n)`.
    own_line: bool,
    indent: String,
    /// Column of the first entry for aligned lists, as in `def f(a,\n      b)`.
    align: String,
    trailing_comma: bool,
    close_indent: Option<String>,
}

impl ParamLayout {
    fn read(tree: &SourceTree, list: ParameterList<'_>) -> Self {
        let node = list.node();
        let mut cursor = node.walk();
        let children: Vec<Node<'_>> = node.children(&mut cursor).collect();

        let mut params = list.params().into_iter();
        let mut items = Vec::new();
        let mut last_param_row = None;
        let mut last_param_idx = None;
        let mut first_entry = None;
        let mut close = None;

        for (idx, child) in children.iter().enumerate() {
            match child.kind() {
                "(" | "," => {}
                ")" => close = Some(*child),
                "comment" => {
                    first_entry.get_or_insert(*child);
                    let text = tree.text_of(*child).to_string();
                    match items.last_mut() {
                        Some(Item::Param(entry))
                            if entry.comment.is_none()
                                && last_param_row == Some(child.start_position().row) =>
                        {
                            entry.comment = Some(text);
                        }
                        _ => items.push(Item::Comment(text)),
                    }
                }
                _ if child.is_named() => {
                    let Some(param) = params.next() else { continue };
                    first_entry.get_or_insert(*child);
                    last_param_row = Some(child.end_position().row);
                    last_param_idx = Some(idx);
                    items.push(Item::Param(Entry {
                        text: param.text.to_string(),
                        kind: param.kind,
                        name: param.name.map(str::to_string),
                        has_default: matches!(
                            param.node.kind(),
                            "default_parameter" | "typed_default_parameter"
                        ),
                        comment: None,
                    }));
                }
                _ => {}
            }
        }

        let trailing_comma = last_param_idx
            .is_some_and(|last| children[last + 1..].iter().any(|c| c.kind() == ","));

        let leading = |n: Node<'_>| -> (bool, String) {
            let start = tree.line_start(n.start_byte());
            let prefix = &tree.serialize()[start..n.start_byte()];
            if prefix.trim().is_empty() {
                (true, prefix.to_string())
            } else {
                (false, " ".repeat(prefix.chars().count()))
            }
        };

        let (own_line, indent) = first_entry.map_or((false, String::new()), leading);
        let close_indent = close.and_then(|c| match leading(c) {
            (true, indent) => Some(indent),
            (false, _) => None,
        });

        Self {
            items,
            multiline: list.is_multiline(),
            own_line,
            align: if own_line { String::new() } else { indent.clone() },
            indent,
            trailing_comma,
            close_indent,
        }
    }

    fn param_slots(&self) -> Vec<usize> {
        self.items
            .iter()
            .enumerate()
            .filter(|(_, item)| matches!(item, Item::Param(_)))
            .map(|(i, _)| i)
            .collect()
    }

    fn params(&self) -> impl Iterator<Item = &Entry> {
        self.items.iter().filter_map(|item| match item {
            Item::Param(entry) => Some(entry),
            Item::Comment(_) => None,
        })
    }

    fn insert_param(&mut self, ordinal: usize, entry: Entry) {
        let slots = self.param_slots();
        let at = match slots.get(ordinal) {
            Some(&slot) => slot,
            None => slots.last().map_or(self.items.len(), |&last| last + 1),
        };
        self.items.insert(at, Item::Param(entry));
    }

    fn remove_param(&mut self, ordinal: usize) -> Option<Entry> {
        let slot = *self.param_slots().get(ordinal)?;
        match self.items.remove(slot) {
            Item::Param(entry) => Some(entry),
            Item::Comment(_) => None,
        }
    }

    fn kind_at(&self, ordinal: usize) -> Option<ParamKind> {
        self.params().nth(ordinal).map(|e| e.kind)
    }

    fn render(&self) -> String {
        let last_param = self.param_slots().last().copied();
        if last_param.is_none() && self.items.is_empty() {
            return "()".to_string();
        }

        if !self.multiline {
            let texts: Vec<&str> = self.params().map(|e| e.text.as_str()).collect();
            return format!("({})", texts.join(", "));
        }

        let mut lines = Vec::new();
        for (i, item) in self.items.iter().enumerate() {
            let line = match item {
                Item::Param(entry) => {
                    let comma = if Some(i) != last_param || self.trailing_comma {
                        ","
                    } else {
                        ""
                    };
                    match &entry.comment {
                        Some(comment) => format!("{}{comma}  {comment}", entry.text),
                        None => format!("{}{comma}", entry.text),
                    }
                }
                Item::Comment(comment) => comment.clone(),
            };
            lines.push(line);
        }
        let ends_in_comment = match self.items.last() {
            Some(Item::Comment(_)) => true,
            Some(Item::Param(entry)) => entry.comment.is_some(),
            None => false,
        };

        let mut out = String::from("(");
        if self.own_line {
            for line in &lines {
                out.push('\n');
                out.push_str(&self.indent);
                out.push_str(line);
            }
        } else {
            out.push_str(&lines.join(format!("\n{}", self.align).as_str()));
        }

        match &self.close_indent {
            Some(indent) => {
                out.push('\n');
                out.push_str(indent);
            }
            None if ends_in_comment => {
                out.push('\n');
                if !self.own_line {
                    out.push_str(&self.align);
                }
            }
            None => {}
        }
        out.push(')');
        out
    }
}

fn render_param(name: &str, annotation: Option<&str>, default: Option<&str>) -> String {
    match (annotation, default) {
        (Some(ann), Some(default)) => format!("{name}: {ann} = {default}"),
        (Some(ann), None) => format!("{name}: {ann}"),
        (None, Some(default)) => format!("{name}={default}"),
        (None, None) => name.to_string(),
    }
}

fn parameter_list<'t>(tree: &'t SourceTree, target: &ElementPath) -> Result<ParameterList<'t>> {
    locate_function(tree, target)?
        .parameters()
        .ok_or_else(|| EditError::transform(format!("'{target}' has no parameter list")))
}

/// A parameter to add: name, optional annotation and default, and where
/// it goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterSpec {
    pub name: String,
    pub annotation: Option<String>,
    pub default: Option<String>,
    pub position: ParameterPosition,
}

impl ParameterSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            annotation: None,
            default: None,
            position: ParameterPosition::End,
        }
    }

    pub fn annotation(mut self, annotation: impl Into<String>) -> Self {
        self.annotation = Some(annotation.into());
        self
    }

    pub fn default_value(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn position(mut self, position: ParameterPosition) -> Self {
        self.position = position;
        self
    }

    /// Source text of the parameter.
    pub fn render(&self) -> String {
        render_param(
            &self.name,
            self.annotation.as_deref(),
            self.default.as_deref(),
        )
    }
}

/// Adds a parameter to a function or method signature.
#[derive(Debug, Clone)]
pub struct AddParameter {
    target: ElementPath,
    spec: ParameterSpec,
}

impl AddParameter {
    pub fn new(target: ElementPath, name: impl Into<String>) -> Self {
        Self::with_spec(target, ParameterSpec::new(name))
    }

    pub fn with_spec(target: ElementPath, spec: ParameterSpec) -> Self {
        Self { target, spec }
    }

    pub fn annotation(mut self, annotation: impl Into<String>) -> Self {
        self.spec = self.spec.annotation(annotation);
        self
    }

    pub fn default_value(mut self, default: impl Into<String>) -> Self {
        self.spec = self.spec.default_value(default);
        self
    }

    pub fn position(mut self, position: ParameterPosition) -> Self {
        self.spec = self.spec.position(position);
        self
    }
}

impl Transformer for AddParameter {
    fn describe(&self) -> String {
        format!("add parameter {} to {}", self.spec.name, self.target)
    }

    fn apply(&self, tree: &SourceTree) -> Result<Transformed> {
        check_identifier(&self.spec.name)?;
        let list = parameter_list(tree, &self.target)?;
        if list.find(&self.spec.name).is_some() {
            return Ok(Transformed::unchanged(tree));
        }

        let mut layout = ParamLayout::read(tree, list);
        let entries: Vec<&Entry> = layout.params().collect();
        let ordinal = match self.spec.position {
            ParameterPosition::Start => {
                let has_receiver = entries.first().is_some_and(|e| {
                    e.kind == ParamKind::Positional
                        && matches!(e.name.as_deref(), Some("self" | "cls"))
                });
                let ordinal = usize::from(has_receiver);
                if self.spec.default.is_some()
                    && let Some(required) = entries[ordinal..]
                        .iter()
                        .find(|e| e.kind == ParamKind::Positional && !e.has_default)
                {
                    return Err(EditError::transform(format!(
                        "parameter '{}' has a default and cannot precede required parameter '{}'",
                        self.spec.name,
                        required.name.as_deref().unwrap_or_default()
                    )));
                }
                ordinal
            }
            ParameterPosition::End => {
                let end = entries
                    .iter()
                    .position(|e| {
                        matches!(
                            e.kind,
                            ParamKind::KeywordSeparator | ParamKind::VarPositional | ParamKind::VarKeyword
                        )
                    })
                    .unwrap_or(entries.len());
                // a required parameter goes before the first defaulted one
                let first_defaulted = entries[..end]
                    .iter()
                    .position(|e| e.kind == ParamKind::Positional && e.has_default);
                match first_defaulted {
                    Some(index) if self.spec.default.is_none() => index,
                    _ => end,
                }
            }
        };

        layout.insert_param(
            ordinal,
            Entry {
                text: self.spec.render(),
                kind: ParamKind::Positional,
                name: Some(self.spec.name.clone()),
                has_default: self.spec.default.is_some(),
                comment: None,
            },
        );

        Transformed::edited(
            tree,
            vec![TextEdit::replace(list.node().byte_range(), layout.render())],
        )
    }
}

/// Removes a parameter from a function or method signature.
///
/// Removing `*args` while keyword-only parameters remain leaves a bare `*`
/// in its place; a bare `*` with nothing after it is dropped.
#[derive(Debug, Clone)]
pub struct RemoveParameter {
    target: ElementPath,
    name: String,
}

impl RemoveParameter {
    pub fn new(target: ElementPath, name: impl Into<String>) -> Self {
        Self {
            target,
            name: name.into(),
        }
    }
}

impl Transformer for RemoveParameter {
    fn describe(&self) -> String {
        format!("remove parameter {} from {}", self.name, self.target)
    }

    fn apply(&self, tree: &SourceTree) -> Result<Transformed> {
        let list = parameter_list(tree, &self.target)?;
        let mut layout = ParamLayout::read(tree, list);
        let Some(ordinal) = layout
            .params()
            .position(|e| e.name.as_deref() == Some(self.name.as_str()))
        else {
            return Ok(Transformed::unchanged(tree));
        };

        let Some(removed) = layout.remove_param(ordinal) else {
            return Ok(Transformed::unchanged(tree));
        };

        let keyword_only_follow = layout
            .params()
            .skip(ordinal)
            .any(|e| e.kind == ParamKind::KeywordOnly);
        if removed.kind == ParamKind::VarPositional && keyword_only_follow {
            layout.insert_param(
                ordinal,
                Entry {
                    text: "*".to_string(),
                    kind: ParamKind::KeywordSeparator,
                    name: None,
                    has_default: false,
                    comment: removed.comment,
                },
            );
        }

        // a bare `*` needs a keyword-only parameter after it
        let star = layout
            .params()
            .position(|e| e.kind == ParamKind::KeywordSeparator);
        if let Some(star) = star
            && layout.kind_at(star + 1) != Some(ParamKind::KeywordOnly)
        {
            layout.remove_param(star);
        }
        if layout.kind_at(0) == Some(ParamKind::PositionalSeparator) {
            layout.remove_param(0);
        }

        Transformed::edited(
            tree,
            vec![TextEdit::replace(list.node().byte_range(), layout.render())],
        )
    }
}

/// Sets or replaces the return annotation of a function or method.
#[derive(Debug, Clone)]
pub struct SetReturnType {
    target: ElementPath,
    annotation: String,
}

impl SetReturnType {
    pub fn new(target: ElementPath, annotation: impl Into<String>) -> Self {
        Self {
            target,
            annotation: annotation.into(),
        }
    }
}

impl Transformer for SetReturnType {
    fn describe(&self) -> String {
        format!("set return type of {} to {}", self.target, self.annotation)
    }

    fn apply(&self, tree: &SourceTree) -> Result<Transformed> {
        let func = locate_function(tree, &self.target)?;
        let edit = match func.return_type() {
            Some(existing) if tree.text_of(existing) == self.annotation => {
                return Ok(Transformed::unchanged(tree));
            }
            Some(existing) => TextEdit::replace(existing.byte_range(), self.annotation.clone()),
            None => {
                let params = func.parameters().ok_or_else(|| {
                    EditError::transform(format!("'{}' has no parameter list", self.target))
                })?;
                TextEdit::insert(params.node().end_byte(), format!(" -> {}", self.annotation))
            }
        };
        Transformed::edited(tree, vec![edit])
    }
}

/// Renders a parameter list with an extra leading parameter; used when a
/// method gains a receiver.
pub(super) fn prepend_parameter(
    tree: &SourceTree,
    list: ParameterList<'_>,
    name: &str,
) -> TextEdit {
    let mut layout = ParamLayout::read(tree, list);
    layout.insert_param(
        0,
        Entry {
            text: name.to_string(),
            kind: ParamKind::Positional,
            name: Some(name.to_string()),
            has_default: false,
            comment: None,
        },
    );
    TextEdit::replace(list.node().byte_range(), layout.render())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn method() -> ElementPath {
        ElementPath::method("C", "m")
    }

    fn class_with(signature: &str) -> SourceTree {
        SourceTree::parse(format!("class C:\n    def m{signature}:\n        pass\n")).unwrap()
    }

    fn signature_of(tree: &SourceTree) -> String {
        let text = tree.serialize();
        let start = text.find("def m").unwrap() + 5;
        let end = text[start..].find(":\n        pass").unwrap() + start;
        text[start..end].to_string()
    }

    fn add(signature: &str, add: AddParameter) -> String {
        let out = add.apply(&class_with(signature)).unwrap();
        signature_of(&out.tree)
    }

    fn remove(signature: &str, name: &str) -> String {
        let out = RemoveParameter::new(method(), name)
            .apply(&class_with(signature))
            .unwrap();
        signature_of(&out.tree)
    }

    #[test]
    fn test_add_at_end_with_annotation_and_default() {
        let result = add(
            "(self, x)",
            AddParameter::new(method(), "timeout")
                .annotation("int")
                .default_value("30"),
        );
        assert_eq!(result, "(self, x, timeout: int = 30)");
    }

    #[test]
    fn test_add_renderings() {
        assert_eq!(add("(self, x)", AddParameter::new(method(), "y")), "(self, x, y)");
        assert_eq!(
            add("(self)", AddParameter::new(method(), "count").annotation("int")),
            "(self, count: int)"
        );
        assert_eq!(
            add("(self)", AddParameter::new(method(), "flag").default_value("False")),
            "(self, flag=False)"
        );
    }

    #[test]
    fn test_add_at_start_after_receiver() {
        let start = |sig| {
            add(
                sig,
                AddParameter::new(method(), "z").position(ParameterPosition::Start),
            )
        };
        assert_eq!(start("(self, x, y)"), "(self, z, x, y)");
        assert_eq!(start("(cls)"), "(cls, z)");
        assert_eq!(start("(x)"), "(z, x)");
        assert_eq!(start("()"), "(z)");
    }

    #[test]
    fn test_add_at_end_before_variadics() {
        let end = |sig| add(sig, AddParameter::new(method(), "z"));
        assert_eq!(end("(self, a, *args, **kwargs)"), "(self, a, z, *args, **kwargs)");
        assert_eq!(end("(self, a, *, key)"), "(self, a, z, *, key)");
        assert_eq!(end("(self, **kwargs)"), "(self, z, **kwargs)");
        assert_eq!(end("(self, a, /)"), "(self, a, /, z)");
    }

    #[test]
    fn test_required_parameter_goes_before_defaults() {
        let end = |sig| add(sig, AddParameter::new(method(), "z"));
        assert_eq!(end("(self, a=1)"), "(self, z, a=1)");
        assert_eq!(end("(self, a, b: int = 2, *args)"), "(self, a, z, b: int = 2, *args)");
        assert_eq!(end("(self, a, *, key=3)"), "(self, a, z, *, key=3)");
        assert_eq!(
            add("(self, a=1)", AddParameter::new(method(), "z").default_value("0")),
            "(self, a=1, z=0)"
        );
    }

    #[test]
    fn test_defaulted_parameter_cannot_precede_required() {
        let tree = class_with("(self, x)");
        let err = AddParameter::new(method(), "y")
            .default_value("1")
            .position(ParameterPosition::Start)
            .apply(&tree)
            .unwrap_err();
        assert!(matches!(err, EditError::TransformFailed { .. }));
        assert!(err.to_string().contains("cannot precede required parameter 'x'"));

        assert_eq!(
            add(
                "(self, x=0)",
                AddParameter::new(method(), "y")
                    .default_value("1")
                    .position(ParameterPosition::Start)
            ),
            "(self, y=1, x=0)"
        );
    }

    #[test]
    fn test_add_existing_is_noop() {
        let tree = class_with("(self, x)");
        let out = AddParameter::new(method(), "x").apply(&tree).unwrap();
        assert!(!out.changed);
        assert_eq!(out.tree.serialize(), tree.serialize());
    }

    #[test]
    fn test_add_to_multiline_list_keeps_layout() {
        let tree = SourceTree::parse(
            "def f(\n    a,  # first\n    b,\n):\n    pass\n",
        )
        .unwrap();
        let out = AddParameter::new(ElementPath::function("f"), "c")
            .default_value("None")
            .apply(&tree)
            .unwrap();
        assert_eq!(
            out.tree.serialize(),
            "def f(\n    a,  # first\n    b,\n    c=None,\n):\n    pass\n"
        );
    }

    #[test]
    fn test_add_to_aligned_list() {
        let tree = SourceTree::parse("def f(a,\n      b):\n    pass\n").unwrap();
        let out = AddParameter::new(ElementPath::function("f"), "c")
            .apply(&tree)
            .unwrap();
        assert_eq!(out.tree.serialize(), "def f(a,\n      b,\n      c):\n    pass\n");
    }

    #[test]
    fn test_remove_positional() {
        assert_eq!(remove("(self, x, y, z)", "y"), "(self, x, z)");
        assert_eq!(remove("(self, x)", "x"), "(self)");
        assert_eq!(remove("(x)", "x"), "()");
    }

    #[test]
    fn test_remove_variadics_and_keyword_only() {
        assert_eq!(remove("(self, *args, key=1)", "args"), "(self, *, key=1)");
        assert_eq!(remove("(self, *args, **kwargs)", "kwargs"), "(self, *args)");
        assert_eq!(remove("(self, *, key)", "key"), "(self)");
        assert_eq!(remove("(self, *, key, **kw)", "key"), "(self, **kw)");
        assert_eq!(remove("(a, /, b)", "a"), "(b)");
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let tree = class_with("(self, x)");
        let out = RemoveParameter::new(method(), "nope").apply(&tree).unwrap();
        assert!(!out.changed);
    }

    #[test]
    fn test_remove_from_multiline_list() {
        let tree = SourceTree::parse(
            "def f(\n    a,\n    b,  # drop me\n    c\n):\n    pass\n",
        )
        .unwrap();
        let out = RemoveParameter::new(ElementPath::function("f"), "b")
            .apply(&tree)
            .unwrap();
        assert_eq!(out.tree.serialize(), "def f(\n    a,\n    c\n):\n    pass\n");
    }

    #[test]
    fn test_set_return_type() {
        let tree = class_with("(self)");
        let out = SetReturnType::new(method(), "int").apply(&tree).unwrap();
        assert!(out.tree.serialize().contains("def m(self) -> int:"));

        let out = SetReturnType::new(method(), "str").apply(&out.tree).unwrap();
        assert!(out.tree.serialize().contains("def m(self) -> str:"));

        let again = SetReturnType::new(method(), "str").apply(&out.tree).unwrap();
        assert!(!again.changed);
    }
}
