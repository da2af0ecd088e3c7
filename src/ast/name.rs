//! Dotted-chain name builder.
//!
//! Canonicalizes a chain of attribute accesses rooted at a simple name into
//! one dotted string, e.g. the expression `self.player.x` becomes
//! `"self.player.x"`. Anything that is not a pure identifier/attribute chain
//! (calls, subscripts, parenthesized expressions) yields `None`.

use crate::ast::tree::{NodeId, SyntaxTree};

/// Build the fully-qualified dotted name for an identifier or attribute
/// chain. Returns `None` if the node is not a pure name/attribute chain.
pub fn dotted_name(tree: &SyntaxTree, node: NodeId) -> Option<String> {
    let mut parts = Vec::new();
    let mut current = node;

    loop {
        match tree.kind(current) {
            "identifier" => {
                parts.push(tree.text(current));
                break;
            }
            "attribute" => {
                let attr = tree.child_by_field(current, "attribute")?;
                parts.push(tree.text(attr));
                current = tree.child_by_field(current, "object")?;
            }
            _ => return None,
        }
    }

    parts.reverse();
    Some(parts.join("."))
}
