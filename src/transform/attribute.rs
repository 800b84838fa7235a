//! Class attribute insertion and removal.

use super::{
    Transformed, Transformer, check_identifier, editable_body, insert_at_start, locate_class,
    statement_lines,
};
use crate::cst::{Definition, SourceTree, TextEdit};
use crate::error::Result;

/// Adds `name: annotation = value` to a class body.
///
/// The attribute goes right after the class docstring, separated by a
/// blank line, or first in the body when there is no docstring. A class
/// that already binds the name is left unchanged.
#[derive(Debug, Clone)]
pub struct AddClassAttribute {
    class: String,
    name: String,
    annotation: Option<String>,
    value: Option<String>,
}

impl AddClassAttribute {
    pub fn new(class: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            name: name.into(),
            annotation: None,
            value: None,
        }
    }

    pub fn annotation(mut self, annotation: impl Into<String>) -> Self {
        self.annotation = Some(annotation.into());
        self
    }

    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    fn render(&self) -> String {
        match (&self.annotation, &self.value) {
            (Some(ann), Some(value)) => format!("{}: {ann} = {value}", self.name),
            (Some(ann), None) => format!("{}: {ann}", self.name),
            (None, Some(value)) => format!("{} = {value}", self.name),
            (None, None) => format!("{} = None", self.name),
        }
    }
}

impl Transformer for AddClassAttribute {
    fn describe(&self) -> String {
        format!("add attribute {} to {}", self.name, self.class)
    }

    fn apply(&self, tree: &SourceTree) -> Result<Transformed> {
        check_identifier(&self.name)?;
        let class = locate_class(tree, &self.class)?;
        let exists = class
            .assignments()
            .iter()
            .any(|a| a.target_names().contains(&self.name.as_str()));
        if exists {
            return Ok(Transformed::unchanged(tree));
        }

        let body = editable_body(&Definition::Class(class))?;
        let line = format!("{}{}\n", body.indent(), self.render());
        let edit = insert_at_start(tree, &body, &line, true)?;
        Transformed::edited(tree, vec![edit])
    }
}

/// Removes class-level assignments binding a name.
///
/// Both annotated and plain assignments are removed. A body left empty
/// becomes `pass`.
#[derive(Debug, Clone)]
pub struct RemoveClassAttribute {
    class: String,
    name: String,
}

impl RemoveClassAttribute {
    pub fn new(class: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            name: name.into(),
        }
    }
}

impl Transformer for RemoveClassAttribute {
    fn describe(&self) -> String {
        format!("remove attribute {} from {}", self.name, self.class)
    }

    fn apply(&self, tree: &SourceTree) -> Result<Transformed> {
        let class = locate_class(tree, &self.class)?;
        let Some(body) = class.body() else {
            return Ok(Transformed::unchanged(tree));
        };

        let statements = body.statements();
        let doomed: Vec<_> = statements
            .iter()
            .filter(|s| {
                s.assignment()
                    .is_some_and(|a| a.target_names().contains(&self.name.as_str()))
            })
            .collect();
        if doomed.is_empty() {
            return Ok(Transformed::unchanged(tree));
        }

        let empties_body = doomed.len() == statements.len();
        let mut edits = Vec::new();
        for (i, stmt) in doomed.iter().enumerate() {
            let range = statement_lines(tree, stmt.node())?;
            if empties_body && i == 0 {
                edits.push(TextEdit::replace(range, format!("{}pass\n", body.indent())));
            } else {
                edits.push(TextEdit::delete(range));
            }
        }
        Transformed::edited(tree, edits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn add(source: &str, attr: AddClassAttribute) -> Transformed {
        attr.apply(&SourceTree::parse(source).unwrap()).unwrap()
    }

    #[test]
    fn test_add_after_docstring() {
        let out = add(
            "class User:\n    \"\"\"A user.\"\"\"\n",
            AddClassAttribute::new("User", "email").annotation("str").value("\"\""),
        );
        assert!(out.changed);
        assert_eq!(
            out.tree.serialize(),
            "class User:\n    \"\"\"A user.\"\"\"\n\n    email: str = \"\"\n"
        );
    }

    #[test]
    fn test_add_before_first_statement_without_docstring() {
        let out = add(
            "class User:\n    name: str\n\n    def greet(self):\n        pass\n",
            AddClassAttribute::new("User", "age").annotation("int").value("0"),
        );
        assert_eq!(
            out.tree.serialize(),
            "class User:\n    age: int = 0\n    name: str\n\n    def greet(self):\n        pass\n"
        );
    }

    #[test]
    fn test_add_replaces_lone_pass() {
        let out = add(
            "class Empty:\n    pass\n",
            AddClassAttribute::new("Empty", "flag").value("False"),
        );
        assert_eq!(out.tree.serialize(), "class Empty:\n    flag = False\n");
    }

    #[test]
    fn test_add_is_idempotent() {
        let source = "class User:\n    \"\"\"A user.\"\"\"\n";
        let attr = AddClassAttribute::new("User", "email").annotation("str");
        let first = add(source, attr.clone());
        let second = attr.apply(&first.tree).unwrap();
        assert!(!second.changed);
        assert_eq!(second.tree.serialize(), first.tree.serialize());
    }

    #[test]
    fn test_add_to_inline_body_fails() {
        let tree = SourceTree::parse("class A: pass\n").unwrap();
        assert!(AddClassAttribute::new("A", "x").apply(&tree).is_err());
    }

    #[test]
    fn test_remove_annotated_and_plain() {
        let tree = SourceTree::parse(
            "class Config:\n    debug: bool = False\n    level = 3\n    debug = True\n",
        )
        .unwrap();
        let out = RemoveClassAttribute::new("Config", "debug").apply(&tree).unwrap();
        assert_eq!(out.tree.serialize(), "class Config:\n    level = 3\n");
    }

    #[test]
    fn test_remove_last_attribute_leaves_pass() {
        let tree = SourceTree::parse("class Config:\n    debug = True\n\nx = 1\n").unwrap();
        let out = RemoveClassAttribute::new("Config", "debug").apply(&tree).unwrap();
        assert_eq!(out.tree.serialize(), "class Config:\n    pass\n\nx = 1\n");
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let tree = SourceTree::parse("class Config:\n    level = 3\n").unwrap();
        let out = RemoveClassAttribute::new("Config", "debug").apply(&tree).unwrap();
        assert!(!out.changed);
    }
}
