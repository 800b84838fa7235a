//! Generation of `__init__`, `__repr__`, `__eq__` and `__hash__` from class
//! attributes.

use super::{
    Transformed, Transformer, editable_body, indent_code, insert_after, insert_at_end,
    insert_at_start, locate_class, statement_lines,
};
use crate::cst::{ClassDef, Definition, SourceTree, TextEdit};
use crate::error::Result;
use serde::Serialize;
use std::fmt;

/// An attribute used to generate dunder methods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassAttribute {
    pub name: String,
    pub annotation: Option<String>,
    pub default: Option<String>,
}

impl ClassAttribute {
    fn parameter(&self) -> String {
        match (&self.annotation, &self.default) {
            (Some(ann), Some(default)) => format!("{}: {ann} = {default}", self.name),
            (Some(ann), None) => format!("{}: {ann}", self.name),
            (None, Some(default)) => format!("{}={default}", self.name),
            (None, None) => self.name.clone(),
        }
    }
}

/// Collects the attributes of a class.
///
/// Class-level assignments come first, in source order. Top-level
/// `self.<name> = ...` assignments in `__init__` follow unless a class-level
/// attribute of the same name exists. An `__init__` assignment that copies
/// one of its parameters carries no default.
pub fn extract_attributes(class: &ClassDef<'_>) -> Vec<ClassAttribute> {
    let mut attributes: Vec<ClassAttribute> = Vec::new();
    for assignment in class.assignments() {
        for name in assignment.target_names() {
            if attributes.iter().all(|a| a.name != name) {
                attributes.push(ClassAttribute {
                    name: name.to_string(),
                    annotation: assignment.annotation().map(str::to_string),
                    default: assignment.value().map(str::to_string),
                });
            }
        }
    }

    let Some(init) = class.find_method("__init__") else {
        return attributes;
    };
    let params: Vec<&str> = init
        .parameters()
        .map(|p| p.params().into_iter().filter_map(|p| p.name).collect())
        .unwrap_or_default();

    let statements = init.body().map(|b| b.statements()).unwrap_or_default();
    for assignment in statements.iter().filter_map(|s| s.assignment()) {
        let Some(name) = assignment.self_attribute() else {
            continue;
        };
        if attributes.iter().any(|a| a.name == name) {
            continue;
        }
        let default = assignment
            .value()
            .filter(|value| !params.contains(value))
            .map(str::to_string);
        attributes.push(ClassAttribute {
            name: name.to_string(),
            annotation: assignment.annotation().map(str::to_string),
            default,
        });
    }
    attributes
}

/// Which dunder method to generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DunderKind {
    Init,
    Repr,
    Eq,
    Hash,
}

impl DunderKind {
    pub const ALL: [DunderKind; 4] = [Self::Init, Self::Repr, Self::Eq, Self::Hash];

    pub fn method_name(&self) -> &'static str {
        match self {
            Self::Init => "__init__",
            Self::Repr => "__repr__",
            Self::Eq => "__eq__",
            Self::Hash => "__hash__",
        }
    }

    /// Source of the method at column zero.
    pub fn render(&self, attributes: &[ClassAttribute]) -> String {
        match self {
            Self::Init => render_init(attributes),
            Self::Repr => {
                let fields: Vec<String> = attributes
                    .iter()
                    .map(|a| format!("{0}={{self.{0}!r}}", a.name))
                    .collect();
                format!(
                    "def __repr__(self) -> str:\n    return f\"{{self.__class__.__name__}}({})\"\n",
                    fields.join(", ")
                )
            }
            Self::Eq if attributes.is_empty() => {
                "def __eq__(self, other: object) -> bool:\n    return isinstance(other, self.__class__)\n"
                    .to_string()
            }
            Self::Eq => {
                let comparisons: Vec<String> = attributes
                    .iter()
                    .map(|a| format!("self.{0} == other.{0}", a.name))
                    .collect();
                format!(
                    "def __eq__(self, other: object) -> bool:\n    if not isinstance(other, self.__class__):\n        return NotImplemented\n    return {}\n",
                    comparisons.join(" and ")
                )
            }
            Self::Hash if attributes.is_empty() => {
                "def __hash__(self) -> int:\n    return hash(())\n".to_string()
            }
            Self::Hash => {
                let fields: Vec<String> =
                    attributes.iter().map(|a| format!("self.{}", a.name)).collect();
                format!(
                    "def __hash__(self) -> int:\n    return hash(({},))\n",
                    fields.join(", ")
                )
            }
        }
    }
}

impl fmt::Display for DunderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.method_name())
    }
}

fn render_init(attributes: &[ClassAttribute]) -> String {
    if attributes.is_empty() {
        return "def __init__(self) -> None:\n    pass\n".to_string();
    }

    let mut params = vec!["self".to_string()];
    // a required parameter after a defaulted one is only legal keyword-only
    let misordered = attributes
        .iter()
        .skip_while(|a| a.default.is_none())
        .any(|a| a.default.is_none());
    if misordered {
        params.push("*".to_string());
    }
    params.extend(attributes.iter().map(ClassAttribute::parameter));

    let mut code = format!("def __init__({}) -> None:\n", params.join(", "));
    for attribute in attributes {
        code.push_str(&format!("    self.{0} = {0}\n", attribute.name));
    }
    code
}

/// Adds a generated dunder method to a class.
///
/// An existing method of the same name is left alone unless `overwrite` is
/// set, in which case it is replaced in place.
#[derive(Debug, Clone)]
pub struct GenerateDunder {
    class: String,
    kind: DunderKind,
    overwrite: bool,
}

impl GenerateDunder {
    pub fn new(class: impl Into<String>, kind: DunderKind) -> Self {
        Self {
            class: class.into(),
            kind,
            overwrite: false,
        }
    }

    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }
}

impl Transformer for GenerateDunder {
    fn describe(&self) -> String {
        format!("generate {} for {}", self.kind, self.class)
    }

    fn apply(&self, tree: &SourceTree) -> Result<Transformed> {
        let class = locate_class(tree, &self.class)?;
        let body = editable_body(&Definition::Class(class))?;
        let code = self.kind.render(&extract_attributes(&class));
        let lines = indent_code(&code, body.indent());

        if let Some(existing) = class.find_method(self.kind.method_name()) {
            if !self.overwrite {
                return Ok(Transformed::unchanged(tree));
            }
            let range = statement_lines(tree, Definition::Function(existing).outer())?;
            return Transformed::edited(tree, vec![TextEdit::replace(range, lines)]);
        }

        if self.kind != DunderKind::Init {
            return Transformed::edited(tree, vec![insert_at_end(tree, &body, &lines, true)?]);
        }

        // __init__ goes after the docstring and leading class attributes
        let statements = body.statements();
        let anchor = statements
            .iter()
            .enumerate()
            .take_while(|(i, s)| (*i == 0 && s.is_docstring()) || s.assignment().is_some())
            .last()
            .map(|(_, s)| s.node());
        let edit = match anchor {
            Some(node) => insert_after(tree, node, &lines, true)?,
            None if statements.len() == 1 && statements[0].kind() == "pass_statement" => {
                insert_at_start(tree, &body, &lines, false)?
            }
            None => insert_at_start(tree, &body, &format!("{lines}\n"), false)?,
        };
        Transformed::edited(tree, vec![edit])
    }
}
