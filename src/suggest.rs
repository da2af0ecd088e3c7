//! "Did you mean" suggestion engine.
//!
//! Invoked only after a selector returns zero matches, and only to enrich
//! the failure message - a suggestion never changes the boolean verdict.
//! Candidate names are harvested from the scope the selector searched, then
//! ranked by edit distance and normalized similarity.

use crate::ast::{dotted_name, NodeId, SyntaxTree};
use crate::scope::ScopeDescriptor;
use log::debug;

/// A near-miss candidate for a name that was not found.
#[derive(Debug, Clone, PartialEq)]
pub struct Suggestion {
    pub candidate: String,
    /// Normalized similarity in [0, 1].
    pub confidence: f64,
    /// Levenshtein distance from the target.
    pub distance: usize,
    pub message: String,
}

/// Fuzzy-correction engine with fixed acceptance thresholds.
pub struct SuggestionEngine {
    max_distance: usize,
    min_confidence: f64,
}

impl SuggestionEngine {
    pub fn new() -> Self {
        Self {
            max_distance: 2,
            min_confidence: 0.7,
        }
    }

    /// Find the best near-miss for `target` among the names present in the
    /// searched scope. Returns `None` when no candidate clears the
    /// confidence bar (or the scope itself does not exist).
    pub fn suggest(
        &self,
        target: &str,
        scope: Option<&ScopeDescriptor>,
        tree: &SyntaxTree,
    ) -> Option<Suggestion> {
        let root = match scope {
            None => tree.root(),
            Some(descriptor) => descriptor.resolve(tree)?,
        };

        let mut best: Option<(String, usize, f64)> = None;
        for candidate in harvest_names(tree, root) {
            if candidate == target {
                continue;
            }
            let distance = strsim::levenshtein(target, &candidate);
            let confidence = strsim::normalized_levenshtein(target, &candidate);
            let better = match &best {
                None => true,
                Some((_, best_distance, best_confidence)) => {
                    distance < *best_distance
                        || (distance == *best_distance && confidence > *best_confidence)
                }
            };
            if better {
                best = Some((candidate, distance, confidence));
            }
        }

        let (candidate, distance, confidence) = best?;
        if distance > self.max_distance || confidence < self.min_confidence {
            debug!(
                "no suggestion for '{target}': best candidate '{candidate}' \
                 (distance {distance}, confidence {confidence:.2}) below threshold"
            );
            return None;
        }

        let message = format!("'{target}' not found; did you mean '{candidate}'?");
        Some(Suggestion {
            candidate,
            confidence,
            distance,
            message,
        })
    }
}

impl Default for SuggestionEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Every name a rule author could plausibly have meant: definition names,
/// assignment targets, read references, and parameter names.
fn harvest_names(tree: &SyntaxTree, root: NodeId) -> Vec<String> {
    let mut names = Vec::new();
    let mut push = |name: String, names: &mut Vec<String>| {
        if !names.contains(&name) {
            names.push(name);
        }
    };

    for id in tree.walk(root) {
        match tree.kind(id) {
            "function_definition" | "class_definition" => {
                if let Some(name) = tree.child_by_field(id, "name") {
                    push(tree.text(name).to_string(), &mut names);
                }
            }
            "assignment" => {
                for target in crate::rules::selectors::assignment_targets(tree, id) {
                    if let Some(full) = dotted_name(tree, target) {
                        push(full, &mut names);
                    }
                }
            }
            "attribute" => {
                if let Some(full) = dotted_name(tree, id) {
                    push(full, &mut names);
                }
            }
            "identifier" => {
                // Skip the member half of dot chains; the full chain is
                // harvested from the attribute node.
                if tree.field(id) != Some("attribute") {
                    push(tree.text(id).to_string(), &mut names);
                }
            }
            _ => {}
        }
    }
    names
}
