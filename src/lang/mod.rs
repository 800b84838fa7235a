//! Language abstraction over tree-sitter grammars.

mod python;

pub use python::Python;

use crate::error::{EditError, Result};
use std::path::Path;
use tree_sitter::{Language as TsLanguage, Parser, Query, Tree};

/// A language the engine can parse into a concrete syntax tree.
pub trait Language: Send + Sync {
    /// Returns the name of the language.
    fn name(&self) -> &'static str;

    /// Returns the tree-sitter language grammar.
    fn grammar(&self) -> TsLanguage;

    /// Parses source code into a tree-sitter tree.
    fn parse(&self, source: &str) -> Result<Tree> {
        let mut parser = Parser::new();
        parser
            .set_language(&self.grammar())
            .map_err(|e| EditError::Parse {
                path: Path::new("<source>").to_path_buf(),
                message: format!("Failed to load the {} grammar: {e}", self.name()),
            })?;

        parser.parse(source, None).ok_or_else(|| EditError::Parse {
            path: Path::new("<source>").to_path_buf(),
            message: format!("Failed to parse {} source", self.name()),
        })
    }

    /// Creates a tree-sitter query for this language.
    fn query(&self, pattern: &str) -> Result<Query> {
        Ok(Query::new(&self.grammar(), pattern)?)
    }
}
