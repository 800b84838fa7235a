//! Decorator edits.

use super::parameter::prepend_parameter;
use super::{Transformed, Transformer, locate, locate_function};
use crate::cst::{ElementPath, SourceTree, TextEdit};
use crate::error::{EditError, Result};

/// Name used to compare decorators: the dotted name, or for calls the name
/// of the called function.
fn decorator_name(text: &str) -> &str {
    let text = text.trim().trim_start_matches('@').trim_start();
    match text.find('(') {
        Some(paren) => text[..paren].trim_end(),
        None => text,
    }
}

/// Prepends a decorator to a definition.
///
/// A decorator with the same name is never added twice, even when its
/// arguments differ.
#[derive(Debug, Clone)]
pub struct AddDecorator {
    target: ElementPath,
    decorator: String,
}

impl AddDecorator {
    /// `decorator` is the text after the `@`; a leading `@` is accepted.
    pub fn new(target: ElementPath, decorator: impl Into<String>) -> Self {
        let decorator = decorator.into();
        Self {
            target,
            decorator: decorator.trim().trim_start_matches('@').to_string(),
        }
    }
}

impl Transformer for AddDecorator {
    fn describe(&self) -> String {
        format!("add decorator @{} to {}", self.decorator, self.target)
    }

    fn apply(&self, tree: &SourceTree) -> Result<Transformed> {
        let name = decorator_name(&self.decorator);
        if name.is_empty() {
            return Err(EditError::transform("empty decorator"));
        }
        let def = locate(tree, &self.target)?;
        if def.decorators().iter().any(|d| d.name() == Some(name)) {
            return Ok(Transformed::unchanged(tree));
        }

        let outer = def.outer();
        let indent = tree.indent_of(outer);
        Transformed::edited(
            tree,
            vec![TextEdit::insert(
                outer.start_byte(),
                format!("@{}\n{indent}", self.decorator),
            )],
        )
    }
}

/// Removes every decorator with the given name.
#[derive(Debug, Clone)]
pub struct RemoveDecorator {
    target: ElementPath,
    name: String,
}

impl RemoveDecorator {
    pub fn new(target: ElementPath, name: impl Into<String>) -> Self {
        Self {
            target,
            name: name.into(),
        }
    }
}

impl Transformer for RemoveDecorator {
    fn describe(&self) -> String {
        format!("remove decorator @{} from {}", self.name, self.target)
    }

    fn apply(&self, tree: &SourceTree) -> Result<Transformed> {
        let name = decorator_name(&self.name);
        let def = locate(tree, &self.target)?;
        let edits = def
            .decorators()
            .iter()
            .filter(|d| d.name() == Some(name))
            .map(|d| TextEdit::delete(d.line_range()))
            .collect();
        Transformed::edited(tree, edits)
    }
}

/// Turns a `@staticmethod` into a `@classmethod` taking `cls`.
#[derive(Debug, Clone)]
pub struct StaticToClassMethod {
    target: ElementPath,
}

impl StaticToClassMethod {
    pub fn new(target: ElementPath) -> Self {
        Self { target }
    }
}

impl Transformer for StaticToClassMethod {
    fn describe(&self) -> String {
        format!("convert {} to classmethod", self.target)
    }

    fn apply(&self, tree: &SourceTree) -> Result<Transformed> {
        let method = locate_function(tree, &self.target)?;
        if method.has_decorator("classmethod") {
            return Ok(Transformed::unchanged(tree));
        }
        let decorators = method.decorators();
        let Some(expr) = decorators
            .iter()
            .find(|d| d.name() == Some("staticmethod"))
            .and_then(|d| d.expression())
        else {
            return Err(EditError::transform(format!(
                "'{}' is not a static method",
                self.target
            )));
        };

        let params = method
            .parameters()
            .ok_or_else(|| EditError::transform(format!("'{}' has no parameters", self.target)))?;
        Transformed::edited(
            tree,
            vec![
                TextEdit::replace(expr.byte_range(), "classmethod"),
                prepend_parameter(tree, params, "cls"),
            ],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SOURCE: &str = "\
class Service:
    @dataclass(frozen=True)
    def a(self):
        pass

    def b(self):
        return 1

    @staticmethod
    def make(x, y):
        return x + y
";

    #[test]
    fn test_decorator_name() {
        assert_eq!(decorator_name("@lru_cache(maxsize=2)"), "lru_cache");
        assert_eq!(decorator_name("pytest.mark.slow"), "pytest.mark.slow");
    }

    #[test]
    fn test_add_decorator_prepends_with_indent() {
        let tree = SourceTree::parse(SOURCE).unwrap();
        let out = AddDecorator::new(ElementPath::method("Service", "b"), "@property")
            .apply(&tree)
            .unwrap();
        assert!(out.changed);
        assert!(out.tree.serialize().contains("\n    @property\n    def b(self):\n"));

        let out = AddDecorator::new(ElementPath::method("Service", "a"), "cache")
            .apply(&tree)
            .unwrap();
        assert!(
            out.tree
                .serialize()
                .contains("    @cache\n    @dataclass(frozen=True)\n    def a(self):")
        );
    }

    #[test]
    fn test_add_decorator_dedups_by_name() {
        let tree = SourceTree::parse(SOURCE).unwrap();
        let out = AddDecorator::new(ElementPath::method("Service", "a"), "dataclass")
            .apply(&tree)
            .unwrap();
        assert!(!out.changed);
        assert_eq!(out.tree.serialize(), SOURCE);
    }

    #[test]
    fn test_add_decorator_to_class() {
        let tree = SourceTree::parse("class A:\n    pass\n").unwrap();
        let out = AddDecorator::new(ElementPath::class("A"), "dataclass")
            .apply(&tree)
            .unwrap();
        assert_eq!(out.tree.serialize(), "@dataclass\nclass A:\n    pass\n");
    }

    #[test]
    fn test_remove_decorator() {
        let tree = SourceTree::parse(SOURCE).unwrap();
        let out = RemoveDecorator::new(ElementPath::method("Service", "a"), "dataclass")
            .apply(&tree)
            .unwrap();
        assert!(out.tree.serialize().starts_with("class Service:\n    def a(self):\n"));

        let missing = RemoveDecorator::new(ElementPath::method("Service", "b"), "property")
            .apply(&tree)
            .unwrap();
        assert!(!missing.changed);
    }

    #[test]
    fn test_static_to_classmethod() {
        let tree = SourceTree::parse(SOURCE).unwrap();
        let out = StaticToClassMethod::new(ElementPath::method("Service", "make"))
            .apply(&tree)
            .unwrap();
        assert!(
            out.tree
                .serialize()
                .contains("    @classmethod\n    def make(cls, x, y):\n")
        );

        let again = StaticToClassMethod::new(ElementPath::method("Service", "make"))
            .apply(&out.tree)
            .unwrap();
        assert!(!again.changed);

        let err = StaticToClassMethod::new(ElementPath::method("Service", "b"))
            .apply(&tree)
            .unwrap_err();
        assert!(err.to_string().contains("not a static method"));
    }
}
