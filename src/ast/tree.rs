//! Arena-backed syntax tree for one parsed Python file.
//!
//! The tree-sitter CST is lowered into a flat node table indexed by
//! [`NodeId`]. Parent links are plain indices, never owning pointers, so the
//! child->parent / parent->children cycle carries no ownership. Only named
//! grammar nodes are kept; punctuation and keywords are dropped.

use crate::ast::parser::ParsedSource;

/// Index of a node in the arena. Non-owning; valid only for the tree that
/// produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Source position of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub byte_start: usize,
    pub byte_end: usize,
    /// 1-based line of the node's first byte.
    pub line: usize,
    /// 1-based column of the node's first byte.
    pub column: usize,
}

#[derive(Debug)]
struct NodeData {
    kind: &'static str,
    /// Grammar field by which the parent references this node
    /// (e.g. "name", "left", "function").
    field: Option<&'static str>,
    span: Span,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

/// Immutable parsed representation of one file, plus the single mutable
/// annotation pass that fills in parent back-references.
pub struct SyntaxTree {
    source: String,
    nodes: Vec<NodeData>,
    annotated: bool,
}

impl SyntaxTree {
    /// Lower a tree-sitter parse into the arena. Parent links start empty;
    /// call [`SyntaxTree::annotate`] before any ancestry-dependent query.
    pub fn from_parsed(parsed: &ParsedSource<'_>) -> Self {
        let mut nodes = Vec::new();
        build(parsed.root_node(), None, &mut nodes);
        Self {
            source: parsed.source.to_string(),
            nodes,
            annotated: false,
        }
    }

    /// Fill in parent back-references. Idempotent; no failure modes.
    pub fn annotate(&mut self) {
        for index in 0..self.nodes.len() {
            let id = NodeId(index as u32);
            let children = self.nodes[index].children.clone();
            for child in children {
                self.nodes[child.index()].parent = Some(id);
            }
        }
        self.annotated = true;
    }

    pub fn is_annotated(&self) -> bool {
        self.annotated
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn kind(&self, id: NodeId) -> &'static str {
        self.nodes[id.index()].kind
    }

    pub fn field(&self, id: NodeId) -> Option<&'static str> {
        self.nodes[id.index()].field
    }

    pub fn span(&self, id: NodeId) -> Span {
        self.nodes[id.index()].span
    }

    pub fn text(&self, id: NodeId) -> &str {
        let span = self.nodes[id.index()].span;
        &self.source[span.byte_start..span.byte_end]
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.index()].children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].parent
    }

    /// First child referenced by the given grammar field.
    pub fn child_by_field(&self, id: NodeId, field: &str) -> Option<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .find(|child| self.field(*child) == Some(field))
    }

    /// All children referenced by the given grammar field.
    pub fn children_by_field<'a>(
        &'a self,
        id: NodeId,
        field: &'a str,
    ) -> impl Iterator<Item = NodeId> + 'a {
        self.children(id)
            .iter()
            .copied()
            .filter(move |child| self.field(*child) == Some(field))
    }

    /// Fixed pre-order walk of the subtree rooted at `start`, including
    /// `start` itself. Deterministic and reproducible.
    pub fn walk(&self, start: NodeId) -> Walk<'_> {
        Walk {
            tree: self,
            stack: vec![start],
        }
    }

    /// True if `ancestor` lies on the parent chain of `id` (strictly above).
    /// Requires annotation.
    pub fn has_ancestor(&self, id: NodeId, ancestor: NodeId) -> bool {
        let mut current = self.parent(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Pre-order traversal over the arena.
pub struct Walk<'a> {
    tree: &'a SyntaxTree,
    stack: Vec<NodeId>,
}

impl Iterator for Walk<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        for child in self.tree.children(id).iter().rev() {
            self.stack.push(*child);
        }
        Some(id)
    }
}

fn build(
    node: tree_sitter::Node<'_>,
    field: Option<&'static str>,
    nodes: &mut Vec<NodeData>,
) -> NodeId {
    let start = node.start_position();
    let id = NodeId(nodes.len() as u32);
    nodes.push(NodeData {
        kind: node.kind(),
        field,
        span: Span {
            byte_start: node.start_byte(),
            byte_end: node.end_byte(),
            line: start.row + 1,
            column: start.column + 1,
        },
        children: Vec::new(),
        parent: None,
    });

    let mut children = Vec::new();
    let mut index = 0u32;
    while let Some(child) = node.child(index as usize) {
        if child.is_named() {
            let child_field = node.field_name_for_child(index);
            children.push(build(child, child_field, nodes));
        }
        index += 1;
    }
    nodes[id.index()].children = children;
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::parser::PythonParser;

    fn tree_of(source: &str) -> SyntaxTree {
        let mut parser = PythonParser::new().unwrap();
        let parsed = parser.parse_with_source(source).unwrap();
        let mut tree = SyntaxTree::from_parsed(&parsed);
        tree.annotate();
        tree
    }

    #[test]
    fn root_is_module() {
        let tree = tree_of("x = 1\n");
        assert_eq!(tree.kind(tree.root()), "module");
        assert!(tree.parent(tree.root()).is_none());
    }

    #[test]
    fn annotate_fills_parents() {
        let tree = tree_of("def f():\n    return 1\n");
        for id in tree.walk(tree.root()) {
            if id != tree.root() {
                assert!(tree.parent(id).is_some(), "node {:?} has no parent", id);
            }
        }
    }

    #[test]
    fn annotate_is_idempotent() {
        let mut parser = PythonParser::new().unwrap();
        let parsed = parser.parse_with_source("x = 1\n").unwrap();
        let mut tree = SyntaxTree::from_parsed(&parsed);
        tree.annotate();
        let parents: Vec<_> = (0..tree.len())
            .map(|i| tree.parent(NodeId(i as u32)))
            .collect();
        tree.annotate();
        let again: Vec<_> = (0..tree.len())
            .map(|i| tree.parent(NodeId(i as u32)))
            .collect();
        assert_eq!(parents, again);
    }

    #[test]
    fn field_names_survive_lowering() {
        let tree = tree_of("def solve(a, b):\n    pass\n");
        let def = tree
            .walk(tree.root())
            .find(|id| tree.kind(*id) == "function_definition")
            .unwrap();
        let name = tree.child_by_field(def, "name").unwrap();
        assert_eq!(tree.text(name), "solve");
        assert_eq!(tree.kind(name), "identifier");
    }

    #[test]
    fn walk_is_pre_order() {
        let tree = tree_of("a = 1\nb = 2\n");
        let kinds: Vec<_> = tree.walk(tree.root()).map(|id| tree.kind(id)).collect();
        assert_eq!(kinds[0], "module");
        // First statement is visited fully before the second.
        let first_a = kinds.iter().position(|k| *k == "expression_statement");
        assert!(first_a.is_some());
    }

    #[test]
    fn spans_are_one_based() {
        let tree = tree_of("x = 1\n");
        let span = tree.span(tree.root());
        assert_eq!(span.line, 1);
        assert_eq!(span.column, 1);
    }
}
