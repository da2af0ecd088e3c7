//! Rule model: compiled, immutable validation rules.
//!
//! Two rule shapes exist: opaque built-in checks (syntax validity, external
//! style checker) and selector+constraint compositions. Rules are compiled
//! once at load time and shared read-only across the whole run.

pub mod constraints;
pub mod selectors;

pub use constraints::{AllowedValue, ArgSpec, Constraint, PrimitiveType};
pub use selectors::{resolve_node_kinds, LiteralKind, NamePattern, Selector};

use crate::linter::StyleCheckParams;

/// One compiled validation rule.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    /// Unique within one rule file.
    pub id: i64,
    /// Authored failure message; never empty.
    pub message: String,
    pub kind: RuleKind,
}

/// What the rule actually checks.
#[derive(Debug, Clone)]
pub enum RuleKind {
    /// The source file must parse. A prerequisite: later structural checks
    /// are meaningless without it, so failure always aborts the run.
    Syntax,
    /// External style checker over a scratch copy of the source.
    LinterStyle { params: StyleCheckParams },
    /// Selector + constraint composition.
    Check {
        selector: Selector,
        constraint: Constraint,
        is_critical: bool,
    },
}

impl CompiledRule {
    /// A failing critical rule halts the entire run.
    pub fn is_critical(&self) -> bool {
        match &self.kind {
            RuleKind::Syntax => true,
            RuleKind::LinterStyle { .. } => false,
            RuleKind::Check { is_critical, .. } => *is_critical,
        }
    }
}
