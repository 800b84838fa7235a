//! Scope-tracking traversal of class and function definitions.

use super::{Definition, SourceTree};
use tree_sitter::Node;

/// What the walk should do after visiting a definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Walk {
    /// Descend into the definition's body.
    Continue,
    /// Do not descend into this definition's body.
    SkipChildren,
    /// End the walk.
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Class,
    Function,
}

/// One enclosing definition.
#[derive(Debug, Clone)]
pub struct Scope<'t> {
    pub kind: ScopeKind,
    pub name: &'t str,
    pub node: Node<'t>,
}

/// The definitions enclosing the node being visited, outermost first.
#[derive(Debug, Clone, Default)]
pub struct ScopeStack<'t> {
    scopes: Vec<Scope<'t>>,
}

impl<'t> ScopeStack<'t> {
    pub fn is_module_level(&self) -> bool {
        self.scopes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    pub fn innermost(&self) -> Option<&Scope<'t>> {
        self.scopes.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Scope<'t>> {
        self.scopes.iter()
    }

    /// Number of enclosing scopes of `kind` named `name`.
    pub fn depth_of(&self, kind: ScopeKind, name: &str) -> usize {
        self.scopes
            .iter()
            .filter(|s| s.kind == kind && s.name == name)
            .count()
    }

    /// True when the enclosing scopes are exactly `path`, all of `kind`.
    pub fn matches_path(&self, kind: ScopeKind, path: &[&str]) -> bool {
        self.scopes.len() == path.len()
            && self
                .scopes
                .iter()
                .zip(path)
                .all(|(scope, name)| scope.kind == kind && scope.name == *name)
    }

    /// Dotted names of the enclosing scopes.
    pub fn qualified(&self, leaf: &str) -> String {
        let mut parts: Vec<&str> = self.scopes.iter().map(|s| s.name).collect();
        parts.push(leaf);
        parts.join(".")
    }
}

/// Walks every class and function definition in source order.
///
/// Definitions are found inside compound statements as well (`if`, `try`,
/// `with`, ...). The callback receives the enclosing scopes and the
/// definition, and decides whether to descend into its body.
pub struct ScopedVisitor<'t> {
    tree: &'t SourceTree,
}

impl<'t> ScopedVisitor<'t> {
    pub fn new(tree: &'t SourceTree) -> Self {
        Self { tree }
    }

    pub fn walk<F>(&self, mut visit: F)
    where
        F: FnMut(&ScopeStack<'t>, Definition<'t>) -> Walk,
    {
        let mut scopes = ScopeStack::default();
        self.walk_node(self.tree.root(), &mut scopes, &mut visit);
    }

    /// Collects every definition with its qualified name.
    pub fn collect(&self) -> Vec<(String, Definition<'t>)> {
        let mut found = Vec::new();
        self.walk(|scopes, def| {
            found.push((scopes.qualified(def.name()), def));
            Walk::Continue
        });
        found
    }

    /// Returns false once the walk has been stopped.
    fn walk_node<F>(&self, node: Node<'t>, scopes: &mut ScopeStack<'t>, visit: &mut F) -> bool
    where
        F: FnMut(&ScopeStack<'t>, Definition<'t>) -> Walk,
    {
        let mut cursor = node.walk();
        let children: Vec<Node<'t>> = node.named_children(&mut cursor).collect();

        for child in children {
            if child.kind() == "decorated_definition" {
                // decorators cannot contain definitions; go straight to the target
                let Some(inner) = child.child_by_field_name("definition") else {
                    continue;
                };
                if !self.visit_definition(inner, scopes, visit) {
                    return false;
                }
            } else if matches!(child.kind(), "class_definition" | "function_definition") {
                if !self.visit_definition(child, scopes, visit) {
                    return false;
                }
            } else if !self.walk_node(child, scopes, visit) {
                return false;
            }
        }
        true
    }

    fn visit_definition<F>(
        &self,
        node: Node<'t>,
        scopes: &mut ScopeStack<'t>,
        visit: &mut F,
    ) -> bool
    where
        F: FnMut(&ScopeStack<'t>, Definition<'t>) -> Walk,
    {
        let Some(def) = Definition::from_node(self.tree, node) else {
            return true;
        };

        match visit(scopes, def) {
            Walk::Stop => false,
            Walk::SkipChildren => true,
            Walk::Continue => {
                let Some(body) = node.child_by_field_name("body") else {
                    return true;
                };
                scopes.scopes.push(Scope {
                    kind: match def {
                        Definition::Class(_) => ScopeKind::Class,
                        Definition::Function(_) => ScopeKind::Function,
                    },
                    name: def.name(),
                    node,
                });
                let keep_going = self.walk_node(body, scopes, visit);
                scopes.scopes.pop();
                keep_going
            }
        }
    }
}
