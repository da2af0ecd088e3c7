//! Rule-execution orchestrator.
//!
//! One run processes one source file through one ordered rule list,
//! synchronously. Per-rule evaluation never raises past this module: a
//! constraint that cannot resolve something skips it, an external-tool
//! failure degrades only that rule, and a source that does not parse
//! surfaces as a failing syntax rule rather than an error.

use crate::ast::{ParseError, PythonParser, SyntaxTree};
use crate::linter::StyleChecker;
use crate::rules::{CompiledRule, RuleKind, Selector};
use crate::suggest::SuggestionEngine;
use log::{debug, info, warn};
use thiserror::Error;

/// Rule id reported when the source fails to parse and no syntax rule is
/// configured to carry the failure.
const SYNTHETIC_SYNTAX_RULE_ID: i64 = 0;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("parser initialization failed: {0}")]
    Parser(#[from] ParseError),
}

/// Terminal state of a validation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Every rule ran and passed.
    Passed,
    /// At least one rule failed; the run completed (or stop-on-first-fail
    /// cut it short).
    Failed,
    /// A critical rule failed and the remaining rules never ran.
    AbortedCritical,
}

/// One failed rule, in evaluation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedRule {
    pub id: i64,
    pub message: String,
}

/// Result of one validation run.
#[derive(Debug, Clone)]
pub struct Verdict {
    pub outcome: Outcome,
    pub failures: Vec<FailedRule>,
}

impl Verdict {
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failed_ids(&self) -> Vec<i64> {
        self.failures.iter().map(|failure| failure.id).collect()
    }
}

/// Runs a compiled rule list against one source file.
pub struct Validator {
    rules: Vec<CompiledRule>,
    stop_on_first_fail: bool,
    style_checker: StyleChecker,
    suggestions: SuggestionEngine,
}

impl Validator {
    pub fn new(rules: Vec<CompiledRule>) -> Self {
        Self {
            rules,
            stop_on_first_fail: false,
            style_checker: StyleChecker::new(),
            suggestions: SuggestionEngine::new(),
        }
    }

    /// Abort on the first failure of any rule, critical or not.
    pub fn with_stop_on_first_fail(mut self, stop: bool) -> Self {
        self.stop_on_first_fail = stop;
        self
    }

    pub fn with_style_checker(mut self, checker: StyleChecker) -> Self {
        self.style_checker = checker;
        self
    }

    /// Run every rule against `source`, in file order, and produce a
    /// definite verdict. Rules are never retried or reordered.
    pub fn run(&self, source: &str) -> Result<Verdict, EngineError> {
        let mut parser = PythonParser::new()?;
        let parsed = match parser.parse_with_source(source) {
            Ok(parsed) if !parsed.has_errors() => parsed,
            _ => return Ok(self.syntax_failure_verdict()),
        };

        let mut tree = SyntaxTree::from_parsed(&parsed);
        tree.annotate();

        let mut failures = Vec::new();
        let mut outcome = Outcome::Passed;
        for rule in &self.rules {
            let passed = self.evaluate(rule, source, &tree, &mut failures);
            debug!(
                "rule {} {}",
                rule.id,
                if passed { "passed" } else { "failed" }
            );
            if passed {
                continue;
            }
            if rule.is_critical() {
                info!("critical rule {} failed, aborting run", rule.id);
                outcome = Outcome::AbortedCritical;
                break;
            }
            if self.stop_on_first_fail {
                info!("rule {} failed, stopping on first fail", rule.id);
                outcome = Outcome::Failed;
                break;
            }
        }

        if outcome == Outcome::Passed && !failures.is_empty() {
            outcome = Outcome::Failed;
        }
        Ok(Verdict { outcome, failures })
    }

    /// Evaluate one rule, appending to `failures` on failure.
    fn evaluate(
        &self,
        rule: &CompiledRule,
        source: &str,
        tree: &SyntaxTree,
        failures: &mut Vec<FailedRule>,
    ) -> bool {
        match &rule.kind {
            // The source parsed or we would not be here.
            RuleKind::Syntax => true,
            RuleKind::LinterStyle { params } => {
                match self.style_checker.check(source, params) {
                    Ok(report) if report.issue_count == 0 => true,
                    Ok(report) => {
                        debug!(
                            "style checker reported {} issue(s):\n{}",
                            report.issue_count, report.report
                        );
                        failures.push(FailedRule {
                            id: rule.id,
                            message: rule.message.clone(),
                        });
                        false
                    }
                    Err(error) => {
                        warn!("style checker failed for rule {}: {error}", rule.id);
                        failures.push(FailedRule {
                            id: rule.id,
                            message: rule.message.clone(),
                        });
                        false
                    }
                }
            }
            RuleKind::Check {
                selector,
                constraint,
                ..
            } => {
                let nodes = selector.select(tree);
                if constraint.check(tree, &nodes) {
                    true
                } else {
                    failures.push(FailedRule {
                        id: rule.id,
                        message: self.failure_message(rule, selector, tree, nodes.is_empty()),
                    });
                    false
                }
            }
        }
    }

    /// Enrich an empty-selection failure with a near-miss suggestion. The
    /// suggestion only decorates the message; the verdict is already fixed.
    fn failure_message(
        &self,
        rule: &CompiledRule,
        selector: &Selector,
        tree: &SyntaxTree,
        selection_was_empty: bool,
    ) -> String {
        if !selection_was_empty {
            return rule.message.clone();
        }
        let Some(target) = selector.target_name() else {
            return rule.message.clone();
        };
        match self.suggestions.suggest(target, selector.scope(), tree) {
            Some(suggestion) => {
                info!(
                    "rule {}: suggestion for '{target}': '{}' (confidence {:.2})",
                    rule.id, suggestion.candidate, suggestion.confidence
                );
                format!("{} ({})", rule.message, suggestion.message)
            }
            None => rule.message.clone(),
        }
    }

    /// The source did not parse. The configured syntax rule carries the
    /// failure; without one, a synthetic rule id 0 does.
    fn syntax_failure_verdict(&self) -> Verdict {
        let failure = self
            .rules
            .iter()
            .find(|rule| matches!(rule.kind, RuleKind::Syntax))
            .map(|rule| FailedRule {
                id: rule.id,
                message: rule.message.clone(),
            })
            .unwrap_or_else(|| FailedRule {
                id: SYNTHETIC_SYNTAX_RULE_ID,
                message: "source file failed to parse".to_string(),
            });
        warn!("source failed to parse, rule {} fails", failure.id);
        Verdict {
            outcome: Outcome::AbortedCritical,
            failures: vec![failure],
        }
    }
}
