//! Selector library: scope-aware node-extraction strategies.
//!
//! Every selector shares one shape: narrow the search to a scope first
//! (empty result if the scope is not found), then populate matches with a
//! fixed pre-order walk of the subtree, so results are deterministic and
//! reproducible across runs.

use crate::ast::{dotted_name, NodeId, SyntaxTree};
use crate::scope::ScopeDescriptor;

/// Name operand of a selector: a literal string, or `*` meaning "any".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamePattern {
    Any,
    Exact(String),
}

impl NamePattern {
    pub fn parse(raw: &str) -> Self {
        if raw == "*" {
            NamePattern::Any
        } else {
            NamePattern::Exact(raw.to_string())
        }
    }

    pub fn matches(&self, candidate: &str) -> bool {
        match self {
            NamePattern::Any => true,
            NamePattern::Exact(name) => name == candidate,
        }
    }

    /// The literal name, when the pattern is not a wildcard.
    pub fn literal(&self) -> Option<&str> {
        match self {
            NamePattern::Any => None,
            NamePattern::Exact(name) => Some(name),
        }
    }
}

/// Which literal constants a [`Selector::Literal`] extracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralKind {
    Number,
    String,
}

impl LiteralKind {
    fn matches_node_kind(self, kind: &str) -> bool {
        match self {
            LiteralKind::Number => matches!(kind, "integer" | "float"),
            LiteralKind::String => kind == "string",
        }
    }
}

/// Node-extraction strategy, one variant per supported selector type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// Function and method definitions, by declared name.
    FunctionDef {
        name: NamePattern,
        scope: Option<ScopeDescriptor>,
    },
    /// Class definitions, by declared name.
    ClassDef {
        name: NamePattern,
        scope: Option<ScopeDescriptor>,
    },
    /// Import statements, direct or `from` form, by target module name.
    /// Importing a submodule satisfies a parent-module target: `os.path`
    /// matches a target of `os`, but not the other way around.
    Import {
        module: NamePattern,
        scope: Option<ScopeDescriptor>,
    },
    /// Call expressions, by fully-qualified callee name. Calls whose callee
    /// is not a pure name/attribute chain are excluded.
    Call {
        name: NamePattern,
        scope: Option<ScopeDescriptor>,
    },
    /// Simple and annotated assignments, by fully-qualified target name.
    /// A multi-target assignment matches once per qualifying target.
    Assignment {
        target: NamePattern,
        scope: Option<ScopeDescriptor>,
    },
    /// Read-context name and attribute references.
    Usage {
        name: NamePattern,
        scope: Option<ScopeDescriptor>,
    },
    /// Number or string constants. A constant that is the sole statement of
    /// its enclosing suite (documentation text) is excluded.
    Literal {
        kind: LiteralKind,
        scope: Option<ScopeDescriptor>,
    },
    /// Any node whose kind is in the configured set. Kind names are resolved
    /// against [`resolve_node_kinds`] at compile time.
    AstNode {
        kinds: Vec<&'static str>,
        scope: Option<ScopeDescriptor>,
    },
}

impl Selector {
    /// Extract the ordered sequence of matching nodes.
    pub fn select(&self, tree: &SyntaxTree) -> Vec<NodeId> {
        let Some(root) = self.scope_root(tree) else {
            return Vec::new();
        };

        match self {
            Selector::FunctionDef { name, .. } => {
                select_definitions(tree, root, "function_definition", name)
            }
            Selector::ClassDef { name, .. } => {
                select_definitions(tree, root, "class_definition", name)
            }
            Selector::Import { module, .. } => select_imports(tree, root, module),
            Selector::Call { name, .. } => select_calls(tree, root, name),
            Selector::Assignment { target, .. } => select_assignments(tree, root, target),
            Selector::Usage { name, .. } => select_usages(tree, root, name),
            Selector::Literal { kind, .. } => select_literals(tree, root, *kind),
            Selector::AstNode { kinds, .. } => tree
                .walk(root)
                .filter(|id| kinds.contains(&tree.kind(*id)))
                .collect(),
        }
    }

    fn scope_root(&self, tree: &SyntaxTree) -> Option<NodeId> {
        match self.scope() {
            None => Some(tree.root()),
            Some(scope) => scope.resolve(tree),
        }
    }

    pub fn scope(&self) -> Option<&ScopeDescriptor> {
        match self {
            Selector::FunctionDef { scope, .. }
            | Selector::ClassDef { scope, .. }
            | Selector::Import { scope, .. }
            | Selector::Call { scope, .. }
            | Selector::Assignment { scope, .. }
            | Selector::Usage { scope, .. }
            | Selector::Literal { scope, .. }
            | Selector::AstNode { scope, .. } => scope.as_ref(),
        }
    }

    /// The concrete name the selector was looking for, if any. Used to ask
    /// the suggestion engine for a "did you mean" hint after zero matches.
    pub fn target_name(&self) -> Option<&str> {
        match self {
            Selector::FunctionDef { name, .. }
            | Selector::ClassDef { name, .. }
            | Selector::Call { name, .. }
            | Selector::Usage { name, .. } => name.literal(),
            Selector::Import { module, .. } => module.literal(),
            Selector::Assignment { target, .. } => target.literal(),
            Selector::Literal { .. } | Selector::AstNode { .. } => None,
        }
    }
}

fn select_definitions(
    tree: &SyntaxTree,
    root: NodeId,
    def_kind: &str,
    name: &NamePattern,
) -> Vec<NodeId> {
    tree.walk(root)
        .filter(|id| {
            tree.kind(*id) == def_kind
                && tree
                    .child_by_field(*id, "name")
                    .is_some_and(|n| name.matches(tree.text(n)))
        })
        .collect()
}

/// Exact module match, or segment-boundary prefix match: importing
/// `os.path` satisfies a target of `os`.
fn module_matches(pattern: &NamePattern, module: &str) -> bool {
    match pattern {
        NamePattern::Any => true,
        NamePattern::Exact(target) => {
            module == target
                || (module.len() > target.len()
                    && module.starts_with(target.as_str())
                    && module.as_bytes()[target.len()] == b'.')
        }
    }
}

fn select_imports(tree: &SyntaxTree, root: NodeId, module: &NamePattern) -> Vec<NodeId> {
    let mut found = Vec::new();
    for id in tree.walk(root) {
        match tree.kind(id) {
            "import_statement" => {
                // `import a.b, c` - one match per statement is enough.
                let hit = tree.children(id).iter().any(|child| {
                    let name_node = match tree.kind(*child) {
                        "dotted_name" => Some(*child),
                        "aliased_import" => tree.child_by_field(*child, "name"),
                        _ => None,
                    };
                    name_node.is_some_and(|n| module_matches(module, tree.text(n)))
                });
                if hit {
                    found.push(id);
                }
            }
            "import_from_statement" => {
                // Relative imports (`from . import x`) have no resolvable
                // module name and never match.
                let hit = tree
                    .child_by_field(id, "module_name")
                    .filter(|n| tree.kind(*n) == "dotted_name")
                    .is_some_and(|n| module_matches(module, tree.text(n)));
                if hit {
                    found.push(id);
                }
            }
            _ => {}
        }
    }
    found
}

fn select_calls(tree: &SyntaxTree, root: NodeId, name: &NamePattern) -> Vec<NodeId> {
    tree.walk(root)
        .filter(|id| {
            tree.kind(*id) == "call"
                && tree
                    .child_by_field(*id, "function")
                    .and_then(|callee| dotted_name(tree, callee))
                    .is_some_and(|full| name.matches(&full))
        })
        .collect()
}

/// Expand an assignment's left-hand side into individual targets, looking
/// through tuple/list unpacking.
pub(crate) fn assignment_targets(tree: &SyntaxTree, assignment: NodeId) -> Vec<NodeId> {
    let Some(left) = tree.child_by_field(assignment, "left") else {
        return Vec::new();
    };
    match tree.kind(left) {
        "pattern_list" | "tuple_pattern" | "list_pattern" => tree.children(left).to_vec(),
        _ => vec![left],
    }
}

fn select_assignments(tree: &SyntaxTree, root: NodeId, target: &NamePattern) -> Vec<NodeId> {
    let mut found = Vec::new();
    for id in tree.walk(root) {
        if tree.kind(id) != "assignment" {
            continue;
        }
        for target_node in assignment_targets(tree, id) {
            if dotted_name(tree, target_node).is_some_and(|full| target.matches(&full)) {
                found.push(id);
            }
        }
    }
    found
}

/// A name or attribute node is a usage candidate unless it is a declaration
/// name, a parameter, part of an import, or the member half of a dot chain.
fn is_usage_candidate(tree: &SyntaxTree, id: NodeId) -> bool {
    match tree.kind(id) {
        "identifier" => {
            if tree.field(id) == Some("attribute") {
                return false;
            }
            if tree.field(id) == Some("name") {
                if let Some(parent) = tree.parent(id) {
                    if matches!(
                        tree.kind(parent),
                        "function_definition" | "class_definition" | "keyword_argument"
                    ) {
                        return false;
                    }
                }
            }
            let mut current = tree.parent(id);
            while let Some(node) = current {
                if matches!(
                    tree.kind(node),
                    "parameters" | "lambda_parameters" | "import_statement" | "import_from_statement"
                ) {
                    return false;
                }
                current = tree.parent(node);
            }
            true
        }
        "attribute" => true,
        _ => false,
    }
}

/// Write/store context: the node is (possibly through unpacking patterns)
/// the assignment target, a loop variable, or a `with ... as` binding.
fn is_store_context(tree: &SyntaxTree, id: NodeId) -> bool {
    let mut current = id;
    while let Some(parent) = tree.parent(current) {
        match tree.kind(parent) {
            "assignment" | "augmented_assignment" | "for_statement" => {
                return tree.field(current) == Some("left");
            }
            "as_pattern_target" => return true,
            "pattern_list" | "tuple_pattern" | "list_pattern" => current = parent,
            _ => return false,
        }
    }
    false
}

fn select_usages(tree: &SyntaxTree, root: NodeId, name: &NamePattern) -> Vec<NodeId> {
    tree.walk(root)
        .filter(|id| {
            is_usage_candidate(tree, *id)
                && !is_store_context(tree, *id)
                && dotted_name(tree, *id).is_some_and(|full| name.matches(&full))
        })
        .collect()
}

/// F-strings share the `string` grammar kind but carry `interpolation`
/// children; they are runtime expressions, not constants.
pub(crate) fn is_fstring(tree: &SyntaxTree, id: NodeId) -> bool {
    tree.kind(id) == "string"
        && tree
            .children(id)
            .iter()
            .any(|child| tree.kind(*child) == "interpolation")
}

/// The sole-statement-of-a-suite idiom for inline documentation text.
fn is_doc_constant(tree: &SyntaxTree, id: NodeId) -> bool {
    let Some(statement) = tree.parent(id) else {
        return false;
    };
    if tree.kind(statement) != "expression_statement" {
        return false;
    }
    let Some(suite) = tree.parent(statement) else {
        return false;
    };
    matches!(tree.kind(suite), "block" | "module") && tree.children(suite).len() == 1
}

fn select_literals(tree: &SyntaxTree, root: NodeId, kind: LiteralKind) -> Vec<NodeId> {
    tree.walk(root)
        .filter(|id| {
            kind.matches_node_kind(tree.kind(*id))
                && !is_fstring(tree, *id)
                && !is_doc_constant(tree, *id)
        })
        .collect()
}

/// Registry mapping rule-file kind names to grammar node kinds. Unknown
/// names resolve to nothing, so a rule written against a newer registry
/// silently produces no matches instead of failing the load.
const KIND_REGISTRY: &[(&str, &[&str])] = &[
    ("for", &["for_statement"]),
    ("while", &["while_statement"]),
    ("if", &["if_statement"]),
    ("try", &["try_statement"]),
    ("with", &["with_statement"]),
    ("assert", &["assert_statement"]),
    ("raise", &["raise_statement"]),
    ("lambda", &["lambda"]),
    ("global", &["global_statement"]),
    ("nonlocal", &["nonlocal_statement"]),
    ("break", &["break_statement"]),
    ("continue", &["continue_statement"]),
    ("match", &["match_statement"]),
    ("function_def", &["function_definition"]),
    ("class_def", &["class_definition"]),
    ("import", &["import_statement", "import_from_statement"]),
    ("call", &["call"]),
    (
        "comprehension",
        &[
            "list_comprehension",
            "set_comprehension",
            "dictionary_comprehension",
            "generator_expression",
        ],
    ),
];

/// Resolve configured kind names against the registry. Grammar kind names
/// that appear as registry values are also accepted verbatim; anything else
/// is silently ignored.
pub fn resolve_node_kinds(names: &[String]) -> Vec<&'static str> {
    let mut kinds = Vec::new();
    for name in names {
        if let Some((_, resolved)) = KIND_REGISTRY.iter().find(|(key, _)| *key == name.as_str()) {
            for kind in *resolved {
                if !kinds.contains(kind) {
                    kinds.push(*kind);
                }
            }
            continue;
        }
        if let Some(kind) = KIND_REGISTRY
            .iter()
            .flat_map(|(_, values)| values.iter().copied())
            .find(|kind| *kind == name.as_str())
        {
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
        }
    }
    kinds
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

    #[test]
    fn function_def_by_name() {
        let tree = tree_of("def solve():\n    pass\n\ndef other():\n    pass\n");
        let selector = Selector::FunctionDef {
            name: NamePattern::parse("solve"),
            scope: None,
        };
        assert_eq!(selector.select(&tree).len(), 1);
    }

    #[test]
    fn function_def_wildcard() {
        let tree = tree_of("def a():\n    pass\n\ndef b():\n    pass\n");
        let selector = Selector::FunctionDef {
            name: NamePattern::parse("*"),
            scope: None,
        };
        assert_eq!(selector.select(&tree).len(), 2);
    }

    #[test]
    fn missing_scope_yields_empty() {
        let tree = tree_of("def solve():\n    pass\n");
        let selector = Selector::FunctionDef {
            name: NamePattern::parse("*"),
            scope: Some(ScopeDescriptor::Class("Nope".to_string())),
        };
        assert!(selector.select(&tree).is_empty());
    }

    #[test]
    fn scoped_selection_stays_in_scope() {
        let tree = tree_of(
            "def free():\n    pass\n\nclass Hero:\n    def free(self):\n        pass\n",
        );
        let selector = Selector::FunctionDef {
            name: NamePattern::parse("free"),
            scope: Some(ScopeDescriptor::Class("Hero".to_string())),
        };
        assert_eq!(selector.select(&tree).len(), 1);
    }

    #[test]
    fn import_exact_and_submodule() {
        let tree = tree_of("import os.path\nfrom json import loads\n");
        let os = Selector::Import {
            module: NamePattern::parse("os"),
            scope: None,
        };
        assert_eq!(os.select(&tree).len(), 1, "os.path satisfies target os");

        let json = Selector::Import {
            module: NamePattern::parse("json"),
            scope: None,
        };
        assert_eq!(json.select(&tree).len(), 1);

        // Prefix matching is not symmetric.
        let os_path = Selector::Import {
            module: NamePattern::parse("os.path.sep"),
            scope: None,
        };
        assert!(os_path.select(&tree).is_empty());
    }

    #[test]
    fn import_prefix_must_be_segment_boundary() {
        let tree = tree_of("import osmium\n");
        let selector = Selector::Import {
            module: NamePattern::parse("os"),
            scope: None,
        };
        assert!(selector.select(&tree).is_empty());
    }

    #[test]
    fn aliased_import_matches_real_name() {
        let tree = tree_of("import numpy as np\n");
        let selector = Selector::Import {
            module: NamePattern::parse("numpy"),
            scope: None,
        };
        assert_eq!(selector.select(&tree).len(), 1);
    }

    #[test]
    fn relative_import_never_matches() {
        let tree = tree_of("from . import utils\n");
        let selector = Selector::Import {
            module: NamePattern::parse("utils"),
            scope: None,
        };
        assert!(selector.select(&tree).is_empty());
    }

    #[test]
    fn call_by_dotted_name() {
        let tree = tree_of("arcade.run()\nprint('x')\n");
        let selector = Selector::Call {
            name: NamePattern::parse("arcade.run"),
            scope: None,
        };
        assert_eq!(selector.select(&tree).len(), 1);
    }

    #[test]
    fn call_with_non_chain_callee_is_excluded() {
        let tree = tree_of("factory()()\n");
        let selector = Selector::Call {
            name: NamePattern::parse("*"),
            scope: None,
        };
        // Only the inner call has a pure name chain callee.
        assert_eq!(selector.select(&tree).len(), 1);
    }

    #[test]
    fn assignment_simple_and_annotated() {
        let tree = tree_of("x = 5\ny: int = 6\n");
        let x = Selector::Assignment {
            target: NamePattern::parse("x"),
            scope: None,
        };
        assert_eq!(x.select(&tree).len(), 1);

        let y = Selector::Assignment {
            target: NamePattern::parse("y"),
            scope: None,
        };
        assert_eq!(y.select(&tree).len(), 1);
    }

    #[test]
    fn assignment_attribute_target() {
        let tree = tree_of("class H:\n    def __init__(self):\n        self.hp = 3\n");
        let selector = Selector::Assignment {
            target: NamePattern::parse("self.hp"),
            scope: None,
        };
        assert_eq!(selector.select(&tree).len(), 1);
    }

    #[test]
    fn unpacking_matches_per_target() {
        let tree = tree_of("a, b = 1, 2\n");
        let a = Selector::Assignment {
            target: NamePattern::parse("a"),
            scope: None,
        };
        assert_eq!(a.select(&tree).len(), 1);

        let any = Selector::Assignment {
            target: NamePattern::parse("*"),
            scope: None,
        };
        // One assignment node, two qualifying targets.
        assert_eq!(any.select(&tree).len(), 2);
    }

    #[test]
    fn usage_reads_only() {
        let tree = tree_of("x = 1\ny = x\nx = y\n");
        let selector = Selector::Usage {
            name: NamePattern::parse("x"),
            scope: None,
        };
        // `x` is read once (y = x); both `x = ...` are stores.
        assert_eq!(selector.select(&tree).len(), 1);
    }

    #[test]
    fn usage_attribute_read() {
        let tree = tree_of(
            "class H:\n    def tick(self):\n        self.hp = self.hp - 1\n",
        );
        let selector = Selector::Usage {
            name: NamePattern::parse("self.hp"),
            scope: None,
        };
        // Right-hand side read only; the target is a store.
        assert_eq!(selector.select(&tree).len(), 1);
    }

    #[test]
    fn usage_ignores_parameters_and_def_names() {
        let tree = tree_of("def f(x):\n    return x\n");
        let x = Selector::Usage {
            name: NamePattern::parse("x"),
            scope: None,
        };
        assert_eq!(x.select(&tree).len(), 1);

        let f = Selector::Usage {
            name: NamePattern::parse("f"),
            scope: None,
        };
        assert!(f.select(&tree).is_empty());
    }

    #[test]
    fn literal_numbers_and_strings() {
        let tree = tree_of("x = 5\ny = 2.5\nz = 'hi'\n");
        let numbers = Selector::Literal {
            kind: LiteralKind::Number,
            scope: None,
        };
        assert_eq!(numbers.select(&tree).len(), 2);

        let strings = Selector::Literal {
            kind: LiteralKind::String,
            scope: None,
        };
        assert_eq!(strings.select(&tree).len(), 1);
    }

    #[test]
    fn fstrings_are_not_string_constants() {
        let tree = tree_of("print(f\"hello {1 + 1}\")\nname = 'plain'\n");
        let selector = Selector::Literal {
            kind: LiteralKind::String,
            scope: None,
        };
        // Only the plain string; the f-string is an expression.
        assert_eq!(selector.select(&tree).len(), 1);
    }

    #[test]
    fn doc_text_is_excluded() {
        let tree = tree_of("def f():\n    \"documentation\"\n");
        let selector = Selector::Literal {
            kind: LiteralKind::String,
            scope: None,
        };
        assert!(selector.select(&tree).is_empty());
    }

    #[test]
    fn doc_text_next_to_code_is_not_excluded() {
        let tree = tree_of("def f():\n    \"documentation\"\n    return 'value'\n");
        let selector = Selector::Literal {
            kind: LiteralKind::String,
            scope: None,
        };
        // Two statements in the suite, so neither string is doc text.
        assert_eq!(selector.select(&tree).len(), 2);
    }

    #[test]
    fn ast_node_by_kind() {
        let tree = tree_of("for i in range(3):\n    pass\nwhile True:\n    pass\n");
        let selector = Selector::AstNode {
            kinds: resolve_node_kinds(&["for".to_string(), "while".to_string()]),
            scope: None,
        };
        assert_eq!(selector.select(&tree).len(), 2);
    }

    #[test]
    fn unknown_kind_names_resolve_to_nothing() {
        assert!(resolve_node_kinds(&["flux_capacitor".to_string()]).is_empty());
    }

    #[test]
    fn grammar_kind_names_pass_through() {
        let kinds = resolve_node_kinds(&["for_statement".to_string()]);
        assert_eq!(kinds, vec!["for_statement"]);
    }

    #[test]
    fn selection_order_is_source_order() {
        let tree = tree_of("def b():\n    pass\n\ndef a():\n    pass\n");
        let selector = Selector::FunctionDef {
            name: NamePattern::parse("*"),
            scope: None,
        };
        let tree_ref = &tree;
        let names: Vec<_> = selector
            .select(tree_ref)
            .into_iter()
            .map(|id| {
                let name = tree_ref.child_by_field(id, "name").unwrap();
                tree_ref.text(name).to_string()
            })
            .collect();
        assert_eq!(names, vec!["b", "a"]);
    }
}
