//! Python language support.

use super::Language;
use tree_sitter::Language as TsLanguage;

/// The Python language.
pub struct Python;

impl Language for Python {
    fn name(&self) -> &'static str {
        "python"
    }

    fn grammar(&self) -> TsLanguage {
        tree_sitter_python::LANGUAGE.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_python_parses_module() {
        let tree = Python.parse("class A:\n    pass\n").unwrap();
        assert_eq!(tree.root_node().kind(), "module");
        assert!(!tree.root_node().has_error());
        assert_eq!(Python.name(), "python");
    }

    #[test]
    fn test_query_compiles_against_grammar() {
        assert!(Python.query("(class_definition name: (identifier) @name)").is_ok());
        assert!(Python.query("(no_such_node)").is_err());
    }
}
