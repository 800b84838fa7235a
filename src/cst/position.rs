//! Line tables for the definitions in a module.

use super::{Definition, ScopedVisitor, SourceTree, Walk};
use serde::Serialize;

/// A function or method with its 1-based line span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionPosition {
    pub name: String,
    pub start_line: usize,
    pub end_line: usize,
    pub is_async: bool,
}

/// A class with its 1-based line span and direct methods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassPosition {
    /// Dotted name for nested classes.
    pub name: String,
    pub start_line: usize,
    pub end_line: usize,
    pub methods: Vec<FunctionPosition>,
}

/// Classes (at any nesting level outside functions) and module-level
/// functions of one module. Functions nested in other functions are not
/// indexed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PositionIndex {
    pub classes: Vec<ClassPosition>,
    pub functions: Vec<FunctionPosition>,
}

impl PositionIndex {
    pub fn build(tree: &SourceTree) -> Self {
        let mut index = Self::default();
        ScopedVisitor::new(tree).walk(|scopes, def| match def {
            Definition::Class(class) => {
                index.classes.push(ClassPosition {
                    name: scopes.qualified(class.name()),
                    start_line: class.start_line(),
                    end_line: class.end_line(),
                    methods: class
                        .methods()
                        .into_iter()
                        .map(|m| FunctionPosition {
                            name: m.name().to_string(),
                            start_line: m.start_line(),
                            end_line: m.end_line(),
                            is_async: m.is_async(),
                        })
                        .collect(),
                });
                Walk::Continue
            }
            Definition::Function(func) => {
                if scopes.is_module_level() {
                    index.functions.push(FunctionPosition {
                        name: func.name().to_string(),
                        start_line: func.start_line(),
                        end_line: func.end_line(),
                        is_async: func.is_async(),
                    });
                }
                Walk::SkipChildren
            }
        });
        index
    }

    pub fn class(&self, name: &str) -> Option<&ClassPosition> {
        self.classes.iter().find(|c| c.name == name)
    }

    pub fn function(&self, name: &str) -> Option<&FunctionPosition> {
        self.functions.iter().find(|f| f.name == name)
    }

    pub fn method(&self, class: &str, name: &str) -> Option<&FunctionPosition> {
        self.class(class)?.methods.iter().find(|m| m.name == name)
    }
}
