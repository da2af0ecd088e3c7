//! pyrubric: rule-driven static validation for Python source files
//!
//! Validates a Python submission against a JSON rule library. Rules come in
//! two shapes: opaque built-in checks (syntax validity, external style
//! checker) and selector/constraint compositions, where a [`Selector`]
//! extracts nodes from the parsed tree and a [`Constraint`] is a predicate
//! over that node set.
//!
//! # Architecture
//!
//! The source is parsed with tree-sitter and lowered into an arena-indexed
//! [`SyntaxTree`] with parent back-references. The configuration compiler
//! turns raw JSON records into typed, immutable rules once at load time;
//! the [`Validator`] then runs them in file order with critical-failure and
//! stop-on-first-fail short-circuits.
//!
//! # Example
//!
//! ```no_run
//! use pyrubric::{load_from_str, Validator};
//!
//! let rules = load_from_str(r#"{"validation_rules": [
//!     {"rule_id": 1, "type": "check_syntax", "message": "file must parse"}
//! ]}"#)?;
//!
//! let verdict = Validator::new(rules).run("def main():\n    pass\n")?;
//! assert!(verdict.passed());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod ast;
pub mod config;
pub mod engine;
pub mod linter;
pub mod rules;
pub mod scope;
pub mod suggest;

// Re-exports
pub use ast::{dotted_name, NodeId, ParseError, PythonParser, Span, SyntaxTree};
pub use config::{load_from_path, load_from_str, CompileError, ConfigError};
pub use engine::{EngineError, FailedRule, Outcome, Validator, Verdict};
pub use linter::{LinterError, StyleCheckParams, StyleChecker, StyleReport};
pub use rules::{CompiledRule, Constraint, RuleKind, Selector};
pub use scope::ScopeDescriptor;
pub use suggest::{Suggestion, SuggestionEngine};
