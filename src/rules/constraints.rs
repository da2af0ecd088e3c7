//! Constraint library: predicate strategies over selected node sets.
//!
//! Constraints are immutable configuration plus a pure `check`; nothing is
//! carried across calls. Where a check cannot statically resolve a value it
//! skips that node rather than failing the rule - these are idiom-based
//! heuristics, not type analysis.

use crate::ast::{dotted_name, NodeId, SyntaxTree};
use crate::rules::selectors::{assignment_targets, is_fstring};
use std::collections::HashSet;

/// Primitive value types recognized by [`Constraint::MustBeType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveType {
    Int,
    Float,
    Str,
    Bool,
    List,
    Dict,
}

impl PrimitiveType {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "int" => Some(PrimitiveType::Int),
            "float" => Some(PrimitiveType::Float),
            "str" => Some(PrimitiveType::Str),
            "bool" => Some(PrimitiveType::Bool),
            "list" => Some(PrimitiveType::List),
            "dict" => Some(PrimitiveType::Dict),
            _ => None,
        }
    }

    /// Canonical constructor name: `x = list()` counts as a list.
    pub fn constructor_name(self) -> &'static str {
        match self {
            PrimitiveType::Int => "int",
            PrimitiveType::Float => "float",
            PrimitiveType::Str => "str",
            PrimitiveType::Bool => "bool",
            PrimitiveType::List => "list",
            PrimitiveType::Dict => "dict",
        }
    }
}

/// A value from the rule file's allowed-value list.
#[derive(Debug, Clone, PartialEq)]
pub enum AllowedValue {
    Num(f64),
    Str(String),
    Bool(bool),
}

/// Comparison mode for [`Constraint::MustHaveArgs`].
#[derive(Debug, Clone, PartialEq)]
pub enum ArgSpec {
    /// Declared parameter names must equal (in order) or contain the
    /// configured names.
    Names { names: Vec<String>, exact: bool },
    /// Declared parameter count must equal the configured count.
    Count(usize),
}

/// Predicate over a selector's output, one variant per constraint type.
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    /// `count(nodes) == expected` if configured, else `count(nodes) > 0`.
    IsRequired { expected_count: Option<usize> },
    /// `count(nodes) == 0`.
    IsForbidden,
    /// Exactly one class definition whose declared bases include the
    /// configured parent (by dotted name).
    MustInheritFrom { parent_name: String },
    /// Every assigned value must statically resolve to the expected
    /// primitive type, or be a direct call of its constructor.
    MustBeType { expected: PrimitiveType },
    /// Every resolved node name must be in the allowed set.
    NameMustBeIn { allowed: HashSet<String> },
    /// Every node must be a literal whose value is in the allowed set.
    ValueMustBeIn { allowed: Vec<AllowedValue> },
    /// Every node must be a function definition with matching parameters.
    MustHaveArgs { spec: ArgSpec },
}

impl Constraint {
    pub fn check(&self, tree: &SyntaxTree, nodes: &[NodeId]) -> bool {
        match self {
            Constraint::IsRequired { expected_count } => match expected_count {
                Some(count) => nodes.len() == *count,
                None => !nodes.is_empty(),
            },
            Constraint::IsForbidden => nodes.is_empty(),
            Constraint::MustInheritFrom { parent_name } => {
                check_inheritance(tree, nodes, parent_name)
            }
            Constraint::MustBeType { expected } => check_value_types(tree, nodes, *expected),
            Constraint::NameMustBeIn { allowed } => check_names(tree, nodes, allowed),
            Constraint::ValueMustBeIn { allowed } => check_values(tree, nodes, allowed),
            Constraint::MustHaveArgs { spec } => check_args(tree, nodes, spec),
        }
    }
}

fn check_inheritance(tree: &SyntaxTree, nodes: &[NodeId], parent_name: &str) -> bool {
    // Meaningful only for exactly one found class.
    let [node] = nodes else {
        return false;
    };
    if tree.kind(*node) != "class_definition" {
        return false;
    }
    let Some(bases) = tree.child_by_field(*node, "superclasses") else {
        return false;
    };
    tree.children(bases)
        .iter()
        .any(|base| dotted_name(tree, *base).is_some_and(|full| full == parent_name))
}

/// Outcome of statically typing an assigned value expression.
enum StaticType {
    /// Resolved to one of the recognized primitives.
    Prim(PrimitiveType),
    /// Resolved to a literal outside the recognized set (None, tuple, set).
    Other,
    /// Not statically resolvable; the node is skipped.
    Unknown,
}

fn static_literal_type(tree: &SyntaxTree, value: NodeId) -> StaticType {
    match tree.kind(value) {
        "integer" => StaticType::Prim(PrimitiveType::Int),
        "float" => StaticType::Prim(PrimitiveType::Float),
        "string" | "concatenated_string" => StaticType::Prim(PrimitiveType::Str),
        "true" | "false" => StaticType::Prim(PrimitiveType::Bool),
        "list" | "list_comprehension" => StaticType::Prim(PrimitiveType::List),
        "dictionary" | "dictionary_comprehension" => StaticType::Prim(PrimitiveType::Dict),
        "none" | "tuple" | "set" => StaticType::Other,
        "unary_operator" => match tree.child_by_field(value, "argument") {
            Some(arg) => match tree.kind(arg) {
                "integer" => StaticType::Prim(PrimitiveType::Int),
                "float" => StaticType::Prim(PrimitiveType::Float),
                _ => StaticType::Unknown,
            },
            None => StaticType::Unknown,
        },
        _ => StaticType::Unknown,
    }
}

fn check_value_types(tree: &SyntaxTree, nodes: &[NodeId], expected: PrimitiveType) -> bool {
    for node in nodes {
        // Only assignments carry a value operand; others are skipped.
        if tree.kind(*node) != "assignment" {
            continue;
        }
        // Bare annotations (`x: int`) have no value.
        let Some(value) = tree.child_by_field(*node, "right") else {
            continue;
        };

        // A direct constructor call of the expected type passes outright.
        if tree.kind(value) == "call" {
            let matches_constructor = tree
                .child_by_field(value, "function")
                .and_then(|callee| dotted_name(tree, callee))
                .is_some_and(|full| full == expected.constructor_name());
            if matches_constructor {
                continue;
            }
            // Any other call is not statically resolvable; skip the node.
            continue;
        }

        match static_literal_type(tree, value) {
            StaticType::Prim(actual) if actual == expected => {}
            StaticType::Prim(_) | StaticType::Other => return false,
            StaticType::Unknown => {}
        }
    }
    true
}

/// Resolved names of a node: declaration name, assignment targets, or a
/// plain dotted reference. Empty when unresolvable.
fn resolved_names(tree: &SyntaxTree, node: NodeId) -> Vec<String> {
    match tree.kind(node) {
        "function_definition" | "class_definition" => tree
            .child_by_field(node, "name")
            .map(|n| vec![tree.text(n).to_string()])
            .unwrap_or_default(),
        "assignment" => assignment_targets(tree, node)
            .into_iter()
            .filter_map(|target| dotted_name(tree, target))
            .collect(),
        "identifier" | "attribute" => dotted_name(tree, node).into_iter().collect(),
        _ => Vec::new(),
    }
}

fn check_names(tree: &SyntaxTree, nodes: &[NodeId], allowed: &HashSet<String>) -> bool {
    for node in nodes {
        // Unresolvable names are skipped, not failed.
        for name in resolved_names(tree, *node) {
            if !allowed.contains(&name) {
                return false;
            }
        }
    }
    true
}

/// Static value of a literal constant node. `None` for non-literals.
fn literal_value(tree: &SyntaxTree, node: NodeId) -> Option<AllowedValue> {
    match tree.kind(node) {
        "integer" => parse_python_int(tree.text(node)).map(AllowedValue::Num),
        "float" => tree.text(node).replace('_', "").parse::<f64>().ok().map(AllowedValue::Num),
        // F-strings carry interpolations; there is no static value to compare.
        "string" if !is_fstring(tree, node) => {
            Some(AllowedValue::Str(string_contents(tree, node)))
        }
        "true" => Some(AllowedValue::Bool(true)),
        "false" => Some(AllowedValue::Bool(false)),
        _ => None,
    }
}

fn parse_python_int(raw: &str) -> Option<f64> {
    let text = raw.replace('_', "");
    let lower = text.to_ascii_lowercase();
    let parsed = if let Some(hex) = lower.strip_prefix("0x") {
        i64::from_str_radix(hex, 16).ok()
    } else if let Some(oct) = lower.strip_prefix("0o") {
        i64::from_str_radix(oct, 8).ok()
    } else if let Some(bin) = lower.strip_prefix("0b") {
        i64::from_str_radix(bin, 2).ok()
    } else {
        text.parse::<i64>().ok()
    };
    parsed.map(|value| value as f64).or_else(|| text.parse::<f64>().ok())
}

/// Inner text of a string literal, with the common escapes decoded.
fn string_contents(tree: &SyntaxTree, node: NodeId) -> String {
    let mut contents = String::new();
    for child in tree
        .children(node)
        .iter()
        .filter(|c| tree.kind(**c) == "string_content")
    {
        push_content(tree, *child, &mut contents);
    }
    contents
}

fn push_content(tree: &SyntaxTree, content: NodeId, out: &mut String) {
    let span = tree.span(content);
    let source = tree.source();
    let mut cursor = span.byte_start;
    // Plain text runs are the gaps between escape_sequence children.
    for escape in tree
        .children(content)
        .iter()
        .filter(|c| tree.kind(**c) == "escape_sequence")
    {
        let escape_span = tree.span(*escape);
        out.push_str(&source[cursor..escape_span.byte_start]);
        match tree.text(*escape) {
            "\\n" => out.push('\n'),
            "\\t" => out.push('\t'),
            "\\\\" => out.push('\\'),
            "\\'" => out.push('\''),
            "\\\"" => out.push('"'),
            other => out.push_str(other),
        }
        cursor = escape_span.byte_end;
    }
    out.push_str(&source[cursor..span.byte_end]);
}

fn check_values(tree: &SyntaxTree, nodes: &[NodeId], allowed: &[AllowedValue]) -> bool {
    // An empty allowed set passes only when nothing was selected.
    if allowed.is_empty() {
        return nodes.is_empty();
    }
    nodes.iter().all(|node| {
        // Non-literal nodes always fail.
        literal_value(tree, *node).is_some_and(|value| allowed.contains(&value))
    })
}

/// Declared parameter names of a function definition, in order.
fn parameter_names(tree: &SyntaxTree, def: NodeId) -> Vec<String> {
    let Some(parameters) = tree.child_by_field(def, "parameters") else {
        return Vec::new();
    };
    let mut names = Vec::new();
    for param in tree.children(parameters) {
        let name = match tree.kind(*param) {
            "identifier" => Some(tree.text(*param).to_string()),
            "default_parameter" | "typed_default_parameter" => tree
                .child_by_field(*param, "name")
                .map(|n| tree.text(n).to_string()),
            "typed_parameter" | "list_splat_pattern" | "dictionary_splat_pattern" => tree
                .children(*param)
                .iter()
                .find(|child| tree.kind(**child) == "identifier")
                .map(|n| tree.text(*n).to_string()),
            _ => None,
        };
        if let Some(name) = name {
            names.push(name);
        }
    }
    names
}

/// True if the function's defining parent is a class body. A decorator
/// wraps the def in a `decorated_definition` node; look through it.
fn is_method(tree: &SyntaxTree, def: NodeId) -> bool {
    let mut owner = tree.parent(def);
    if let Some(wrapper) = owner {
        if tree.kind(wrapper) == "decorated_definition" {
            owner = tree.parent(wrapper);
        }
    }
    owner
        .and_then(|body| tree.parent(body))
        .is_some_and(|class| tree.kind(class) == "class_definition")
}

fn check_args(tree: &SyntaxTree, nodes: &[NodeId], spec: &ArgSpec) -> bool {
    // An empty selection vacuously passes.
    for node in nodes {
        if tree.kind(*node) != "function_definition" {
            return false;
        }
        let mut params = parameter_names(tree, *node);
        // The instance/class receiver convention: drop the first declared
        // parameter of a method before comparison.
        if is_method(tree, *node) && !params.is_empty() {
            params.remove(0);
        }
        let ok = match spec {
            ArgSpec::Names { names, exact } => {
                if *exact {
                    params == *names
                } else {
                    names.iter().all(|name| params.contains(name))
                }
            }
            ArgSpec::Count(count) => params.len() == *count,
        };
        if !ok {
            return false;
        }
    }
    true
}
