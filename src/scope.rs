//! Scope descriptors and resolution.
//!
//! A scope restricts a selector's search to a sub-region of the tree: the
//! whole file, one class, one top-level function, or one method inside a
//! class. Resolution is intentionally narrow so a rule targeting a method
//! never accidentally matches a free function of the same name.

use crate::ast::{NodeId, SyntaxTree};

/// Sub-region of the tree a selector is confined to. At most one
/// class+method nesting level is expressible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeDescriptor {
    Global,
    Class(String),
    /// A function defined at the top level of the file. Functions nested in
    /// other functions or methods are unreachable by this form.
    Function(String),
    Method { class: String, method: String },
}

impl ScopeDescriptor {
    /// Resolve the descriptor to the node anchoring the scope, or `None` if
    /// the named scope does not exist in this tree.
    pub fn resolve(&self, tree: &SyntaxTree) -> Option<NodeId> {
        match self {
            ScopeDescriptor::Global => Some(tree.root()),
            ScopeDescriptor::Class(name) => find_class(tree, name),
            ScopeDescriptor::Function(name) => find_top_level_function(tree, name),
            ScopeDescriptor::Method { class, method } => {
                let class_node = find_class(tree, class)?;
                find_method_in_class(tree, class_node, method)
            }
        }
    }
}

/// First class definition (depth-first) with a matching name.
fn find_class(tree: &SyntaxTree, name: &str) -> Option<NodeId> {
    tree.walk(tree.root()).find(|id| {
        tree.kind(*id) == "class_definition"
            && tree
                .child_by_field(*id, "name")
                .is_some_and(|n| tree.text(n) == name)
    })
}

/// Look through a decorator wrapper to the definition it carries. The
/// grammar wraps `@dec def f(): ...` in a `decorated_definition` node, but a
/// decorated def is still a plain body statement for scope purposes.
fn unwrap_decorated(tree: &SyntaxTree, id: NodeId) -> NodeId {
    if tree.kind(id) == "decorated_definition" {
        if let Some(inner) = tree.child_by_field(id, "definition") {
            return inner;
        }
    }
    id
}

fn is_named_function(tree: &SyntaxTree, id: NodeId, name: &str) -> bool {
    tree.kind(id) == "function_definition"
        && tree
            .child_by_field(id, "name")
            .is_some_and(|n| tree.text(n) == name)
}

/// Search only the top-level statements of the file.
fn find_top_level_function(tree: &SyntaxTree, name: &str) -> Option<NodeId> {
    tree.children(tree.root())
        .iter()
        .map(|id| unwrap_decorated(tree, *id))
        .find(|id| is_named_function(tree, *id, name))
}

/// Search only the immediate body of the class. Finding the class without
/// the method is still not-found; there is no fallback to an outer function.
fn find_method_in_class(tree: &SyntaxTree, class_node: NodeId, method: &str) -> Option<NodeId> {
    let body = tree.child_by_field(class_node, "body")?;
    tree.children(body)
        .iter()
        .map(|id| unwrap_decorated(tree, *id))
        .find(|id| is_named_function(tree, *id, method))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::PythonParser;

    fn tree_of(source: &str) -> SyntaxTree {
        let mut parser = PythonParser::new().unwrap();
        let parsed = parser.parse_with_source(source).unwrap();
        let mut tree = SyntaxTree::from_parsed(&parsed);
        tree.annotate();
        tree
    }

    const SOURCE: &str = "\
def update():
    pass

class Hero:
    def __init__(self):
        self.hp = 10

    def update(self):
        pass

def helper():
    def inner():
        pass
";

    #[test]
    fn global_resolves_to_root() {
        let tree = tree_of(SOURCE);
        assert_eq!(ScopeDescriptor::Global.resolve(&tree), Some(tree.root()));
    }

    #[test]
    fn class_scope_finds_first_class() {
        let tree = tree_of(SOURCE);
        let node = ScopeDescriptor::Class("Hero".to_string())
            .resolve(&tree)
            .unwrap();
        assert_eq!(tree.kind(node), "class_definition");
    }

    #[test]
    fn missing_class_is_not_found() {
        let tree = tree_of(SOURCE);
        assert!(ScopeDescriptor::Class("Villain".to_string())
            .resolve(&tree)
            .is_none());
    }

    #[test]
    fn method_scope_stays_inside_the_class() {
        let tree = tree_of(SOURCE);
        let node = ScopeDescriptor::Method {
            class: "Hero".to_string(),
            method: "update".to_string(),
        }
        .resolve(&tree)
        .unwrap();

        // The method inside Hero, not the free function of the same name.
        let span = tree.span(node);
        assert!(span.line > 4, "resolved the free function instead");
    }

    #[test]
    fn method_missing_in_class_has_no_fallback() {
        let tree = tree_of(SOURCE);
        let result = ScopeDescriptor::Method {
            class: "Hero".to_string(),
            method: "helper".to_string(),
        }
        .resolve(&tree);
        assert!(result.is_none());
    }

    #[test]
    fn function_scope_is_top_level_only() {
        let tree = tree_of(SOURCE);
        assert!(ScopeDescriptor::Function("helper".to_string())
            .resolve(&tree)
            .is_some());
        // Nested functions are unreachable by this form.
        assert!(ScopeDescriptor::Function("inner".to_string())
            .resolve(&tree)
            .is_none());
        // Methods are unreachable too.
        assert!(ScopeDescriptor::Function("__init__".to_string())
            .resolve(&tree)
            .is_none());
    }

    #[test]
    fn decorated_method_is_found() {
        let tree = tree_of(
            "class Hero:\n    @staticmethod\n    def helper():\n        pass\n",
        );
        let node = ScopeDescriptor::Method {
            class: "Hero".to_string(),
            method: "helper".to_string(),
        }
        .resolve(&tree)
        .unwrap();
        assert_eq!(tree.kind(node), "function_definition");
    }

    #[test]
    fn decorated_top_level_function_is_found() {
        let tree = tree_of(
            "import functools\n\n@functools.cache\ndef solve():\n    pass\n",
        );
        let node = ScopeDescriptor::Function("solve".to_string())
            .resolve(&tree)
            .unwrap();
        assert_eq!(tree.kind(node), "function_definition");
    }

    #[test]
    fn resolution_is_deterministic() {
        let tree = tree_of(SOURCE);
        let scope = ScopeDescriptor::Class("Hero".to_string());
        assert_eq!(scope.resolve(&tree), scope.resolve(&tree));
    }
}
