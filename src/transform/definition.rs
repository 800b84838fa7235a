//! Adding and deleting whole definitions.

use super::{
    Transformed, Transformer, check_identifier, dedent, editable_body, indent_code,
    insert_at_end, locate, locate_class, statement_lines,
};
use crate::cst::{Block, Definition, ElementPath, SourceTree, TextEdit};
use crate::error::{EditError, Result};

/// Source of a class or function definition to be added.
///
/// Built either from complete source with [`DefinitionSpec::parse`] or with
/// the builder constructors:
///
/// ```rust
/// use pyedit::transform::DefinitionSpec;
///
/// let spec = DefinitionSpec::function("area")
///     .params("self")
///     .returns("float")
///     .decorator("property")
///     .body("return self.w * self.h");
/// assert_eq!(
///     spec.code(),
///     "@property\ndef area(self) -> float:\n    return self.w * self.h\n"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinitionSpec {
    name: String,
    code: String,
}

/// Builder for function definitions.
#[derive(Debug, Clone, Default)]
pub struct FunctionSpec {
    name: String,
    params: String,
    returns: Option<String>,
    decorators: Vec<String>,
    is_async: bool,
    body: Option<String>,
}

impl FunctionSpec {
    pub fn params(mut self, params: impl Into<String>) -> Self {
        self.params = params.into();
        self
    }

    pub fn returns(mut self, annotation: impl Into<String>) -> Self {
        self.returns = Some(annotation.into());
        self
    }

    pub fn decorator(mut self, decorator: impl Into<String>) -> Self {
        self.decorators.push(decorator.into());
        self
    }

    pub fn asynchronous(mut self) -> Self {
        self.is_async = true;
        self
    }

    /// Finishes the builder with the given body.
    pub fn body(mut self, body: impl Into<String>) -> DefinitionSpec {
        self.body = Some(body.into());
        self.build()
    }

    pub fn build(self) -> DefinitionSpec {
        let mut code = String::new();
        for decorator in &self.decorators {
            code.push('@');
            code.push_str(decorator.trim_start_matches('@'));
            code.push('\n');
        }
        if self.is_async {
            code.push_str("async ");
        }
        code.push_str(&format!("def {}({})", self.name, self.params));
        if let Some(returns) = &self.returns {
            code.push_str(&format!(" -> {returns}"));
        }
        code.push_str(":\n");
        code.push_str(&indent_code(self.body.as_deref().unwrap_or("pass"), "    "));
        DefinitionSpec {
            name: self.name,
            code,
        }
    }
}

impl DefinitionSpec {
    /// Parses complete definition source, such as `def f():\n    pass`.
    pub fn parse(code: &str) -> Result<Self> {
        let code = dedent(code);
        let tree = SourceTree::parse(code.as_str())
            .map_err(|e| EditError::transform(format!("invalid definition: {e}")))?;
        let statements = tree.module().statements();
        let name = match statements.as_slice() {
            [only] => only.definition().map(|d| d.name().to_string()),
            _ => None,
        }
        .ok_or_else(|| {
            EditError::transform("definition source must hold exactly one class or function")
        })?;

        let mut code = code.trim_end().to_string();
        code.push('\n');
        Ok(Self { name, code })
    }

    pub fn function(name: impl Into<String>) -> FunctionSpec {
        FunctionSpec {
            name: name.into(),
            ..FunctionSpec::default()
        }
    }

    /// A class with the given base list (without parentheses) and body.
    pub fn class(name: impl Into<String>, bases: Option<&str>, body: &str) -> Self {
        let name = name.into();
        let header = match bases {
            Some(bases) if !bases.is_empty() => format!("class {name}({bases}):\n"),
            _ => format!("class {name}:\n"),
        };
        let body = if body.trim().is_empty() { "pass" } else { body };
        Self {
            code: header + &indent_code(body, "    "),
            name,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The definition source at column zero, ending with a newline.
    pub fn code(&self) -> &str {
        &self.code
    }
}

fn defines(block: &Block<'_>, name: &str) -> bool {
    block
        .statements()
        .iter()
        .filter_map(|s| s.definition())
        .any(|d| d.name() == name)
}

/// Appends a definition to a class body or to the module.
///
/// Adding a definition whose name already exists in the container is a
/// no-op.
#[derive(Debug, Clone)]
pub struct AddDefinition {
    class: Option<String>,
    spec: DefinitionSpec,
}

impl AddDefinition {
    pub fn to_class(class: impl Into<String>, spec: DefinitionSpec) -> Self {
        Self {
            class: Some(class.into()),
            spec,
        }
    }

    pub fn to_module(spec: DefinitionSpec) -> Self {
        Self { class: None, spec }
    }
}

impl Transformer for AddDefinition {
    fn describe(&self) -> String {
        match &self.class {
            Some(class) => format!("add {} to class {class}", self.spec.name),
            None => format!("add {} to module", self.spec.name),
        }
    }

    fn apply(&self, tree: &SourceTree) -> Result<Transformed> {
        check_identifier(&self.spec.name)?;

        let Some(class) = &self.class else {
            if tree.classes().iter().any(|c| c.name() == self.spec.name)
                || tree.find_function(&self.spec.name).is_some()
            {
                return Ok(Transformed::unchanged(tree));
            }
            let text = tree.serialize();
            if text.trim().is_empty() {
                return Transformed::edited(
                    tree,
                    vec![TextEdit::replace(0..text.len(), self.spec.code.clone())],
                );
            }
            let (offset, prefix) = tree.after_line(text.len());
            return Transformed::edited(
                tree,
                vec![TextEdit::replace(
                    offset..text.len(),
                    format!("{prefix}\n\n{}", self.spec.code),
                )],
            );
        };

        let body = editable_body(&Definition::Class(locate_class(tree, class)?))?;
        if defines(&body, &self.spec.name) {
            return Ok(Transformed::unchanged(tree));
        }
        let lines = indent_code(&self.spec.code, body.indent());
        Transformed::edited(tree, vec![insert_at_end(tree, &body, &lines, true)?])
    }
}

/// Deletes a class, function or method together with its decorators.
///
/// Blank lines directly above the definition go with it. A definition that
/// was the only statement of its block is replaced by `pass`.
#[derive(Debug, Clone)]
pub struct DeleteDefinition {
    target: ElementPath,
}

impl DeleteDefinition {
    pub fn new(target: ElementPath) -> Self {
        Self { target }
    }
}

impl Transformer for DeleteDefinition {
    fn describe(&self) -> String {
        format!("delete {}", self.target)
    }

    fn apply(&self, tree: &SourceTree) -> Result<Transformed> {
        let def = locate(tree, &self.target)?;
        let outer = def.outer();
        let range = statement_lines(tree, outer)?;

        if let Some(parent) = outer.parent().filter(|p| p.kind() == "block")
            && Block::new(tree, parent).statements().len() == 1
        {
            let pass = format!("{}pass\n", tree.indent_of(outer));
            return Transformed::edited(tree, vec![TextEdit::replace(range, pass)]);
        }

        let text = tree.serialize();
        let mut start = range.start;
        while start > 0 {
            let previous = tree.line_start(start - 1);
            if !text[previous..start].trim().is_empty() {
                break;
            }
            start = previous;
        }
        Transformed::edited(tree, vec![TextEdit::delete(start..range.end)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SOURCE: &str = "\
import os


class Shape:
    \"\"\"A shape.\"\"\"

    def area(self):
        return 0

    @property
    def name(self):
        return 'shape'


def helper():
    pass
";

    #[test]
    fn test_parse_spec() {
        let spec = DefinitionSpec::parse("    def run(self):\n        return 1\n\n").unwrap();
        assert_eq!(spec.name(), "run");
        assert_eq!(spec.code(), "def run(self):\n    return 1\n");

        assert!(DefinitionSpec::parse("x = 1").is_err());
        assert!(DefinitionSpec::parse("def a(): pass\ndef b(): pass").is_err());
    }

    #[test]
    fn test_builder_specs() {
        let spec = DefinitionSpec::function("fetch")
            .params("url")
            .asynchronous()
            .build();
        assert_eq!(spec.code(), "async def fetch(url):\n    pass\n");

        let class = DefinitionSpec::class("Point", Some("Base"), "x: int = 0");
        assert_eq!(class.code(), "class Point(Base):\n    x: int = 0\n");
    }

    #[test]
    fn test_add_method_to_class() {
        let tree = SourceTree::parse(SOURCE).unwrap();
        let spec = DefinitionSpec::function("scale")
            .params("self, factor")
            .body("return factor");
        let out = AddDefinition::to_class("Shape", spec).apply(&tree).unwrap();
        assert!(out.tree.serialize().contains(
            "        return 'shape'\n\n    def scale(self, factor):\n        return factor\n\n\ndef helper"
        ));
    }

    #[test]
    fn test_add_existing_method_is_noop() {
        let tree = SourceTree::parse(SOURCE).unwrap();
        let spec = DefinitionSpec::function("area").params("self").build();
        let out = AddDefinition::to_class("Shape", spec).apply(&tree).unwrap();
        assert!(!out.changed);
    }

    #[test]
    fn test_add_method_replaces_pass() {
        let tree = SourceTree::parse("class A:\n    pass\n").unwrap();
        let spec = DefinitionSpec::parse("def m(self):\n    return 1").unwrap();
        let out = AddDefinition::to_class("A", spec).apply(&tree).unwrap();
        assert_eq!(out.tree.serialize(), "class A:\n    def m(self):\n        return 1\n");
    }

    #[test]
    fn test_add_to_module() {
        let tree = SourceTree::parse("import os\n\n\n").unwrap();
        let spec = DefinitionSpec::class("Config", None, "");
        let out = AddDefinition::to_module(spec).apply(&tree).unwrap();
        assert_eq!(out.tree.serialize(), "import os\n\n\nclass Config:\n    pass\n");

        let empty = SourceTree::parse("").unwrap();
        let spec = DefinitionSpec::function("main").build();
        let out = AddDefinition::to_module(spec).apply(&empty).unwrap();
        assert_eq!(out.tree.serialize(), "def main():\n    pass\n");
    }

    #[test]
    fn test_delete_method_with_decorator() {
        let tree = SourceTree::parse(SOURCE).unwrap();
        let out = DeleteDefinition::new(ElementPath::method("Shape", "name"))
            .apply(&tree)
            .unwrap();
        assert!(
            out.tree
                .serialize()
                .contains("        return 0\n\n\ndef helper():\n")
        );
        assert!(!out.tree.serialize().contains("@property"));
    }

    #[test]
    fn test_delete_last_method_leaves_pass() {
        let tree = SourceTree::parse("class A:\n    def m(self):\n        pass\n").unwrap();
        let out = DeleteDefinition::new(ElementPath::method("A", "m"))
            .apply(&tree)
            .unwrap();
        assert_eq!(out.tree.serialize(), "class A:\n    pass\n");
    }

    #[test]
    fn test_delete_function_and_class() {
        let tree = SourceTree::parse(SOURCE).unwrap();
        let out = DeleteDefinition::new(ElementPath::function("helper"))
            .apply(&tree)
            .unwrap();
        assert!(out.tree.serialize().ends_with("        return 'shape'\n"));

        let out = DeleteDefinition::new(ElementPath::class("Shape"))
            .apply(&tree)
            .unwrap();
        assert_eq!(out.tree.serialize(), "import os\n\n\ndef helper():\n    pass\n");

        let err = DeleteDefinition::new(ElementPath::class("Missing"))
            .apply(&tree)
            .unwrap_err();
        assert!(matches!(err, EditError::NotFound(_)));
    }
}
