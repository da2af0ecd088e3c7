//! Configuration compiler: raw rule records to typed, immutable rules.
//!
//! Runs once at load time and performs no I/O. Dispatch is by the required
//! `type` discriminator on rule, selector, and constraint records; an
//! unrecognized tag fails the whole load naming the tag and the rule id.

use crate::config::schema::{RawConstraint, RawRule, RawScope, RawSelector, RuleFile};
use crate::linter::StyleCheckParams;
use crate::rules::{
    resolve_node_kinds, AllowedValue, ArgSpec, CompiledRule, Constraint, LiteralKind, NamePattern,
    PrimitiveType, RuleKind, Selector,
};
use crate::scope::ScopeDescriptor;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("rule {rule_id}: unknown rule type '{tag}'")]
    UnknownRuleTag { rule_id: i64, tag: String },

    #[error("rule {rule_id}: unknown selector type '{tag}'")]
    UnknownSelectorTag { rule_id: i64, tag: String },

    #[error("rule {rule_id}: unknown constraint type '{tag}'")]
    UnknownConstraintTag { rule_id: i64, tag: String },

    #[error("rule {rule_id}: {record} missing required field '{field}'")]
    MissingField {
        rule_id: i64,
        record: &'static str,
        field: &'static str,
    },

    #[error("rule {rule_id}: invalid value for '{field}': {message}")]
    InvalidValue {
        rule_id: i64,
        field: &'static str,
        message: String,
    },
}

/// Compile every rule in the file, preserving file order.
pub fn compile(file: &RuleFile) -> Result<Vec<CompiledRule>, CompileError> {
    file.validation_rules.iter().map(compile_rule).collect()
}

fn compile_rule(raw: &RawRule) -> Result<CompiledRule, CompileError> {
    let kind = match (&raw.kind, &raw.check) {
        (Some(tag), _) => match tag.as_str() {
            "check_syntax" => RuleKind::Syntax,
            "check_linter_style" => RuleKind::LinterStyle {
                params: StyleCheckParams {
                    ignore: raw.params.ignore.clone().unwrap_or_default(),
                    select: raw.params.select.clone().unwrap_or_default(),
                },
            },
            _ => {
                return Err(CompileError::UnknownRuleTag {
                    rule_id: raw.rule_id,
                    tag: tag.clone(),
                })
            }
        },
        (None, Some(check)) => RuleKind::Check {
            selector: compile_selector(raw.rule_id, &check.selector)?,
            constraint: compile_constraint(raw.rule_id, &check.constraint)?,
            is_critical: raw.is_critical,
        },
        (None, None) => {
            return Err(CompileError::MissingField {
                rule_id: raw.rule_id,
                record: "rule",
                field: "type",
            })
        }
    };

    Ok(CompiledRule {
        id: raw.rule_id,
        message: raw.message.clone(),
        kind,
    })
}

fn compile_selector(rule_id: i64, raw: &RawSelector) -> Result<Selector, CompileError> {
    let scope = compile_scope(rule_id, raw.in_scope.as_ref())?;
    let name = || NamePattern::parse(raw.name.as_deref().unwrap_or("*"));

    let selector = match raw.kind.as_str() {
        "function_def" => Selector::FunctionDef {
            name: name(),
            scope,
        },
        "class_def" => Selector::ClassDef {
            name: name(),
            scope,
        },
        "import_statement" => Selector::Import {
            module: name(),
            scope,
        },
        "function_call" => Selector::Call {
            name: name(),
            scope,
        },
        "assignment" => Selector::Assignment {
            target: name(),
            scope,
        },
        "usage" => Selector::Usage {
            name: name(),
            scope,
        },
        "literal" => {
            let kind = match raw.literal_type.as_deref() {
                Some("number") => LiteralKind::Number,
                Some("string") => LiteralKind::String,
                Some(other) => {
                    return Err(CompileError::InvalidValue {
                        rule_id,
                        field: "literal_type",
                        message: format!("expected 'number' or 'string', got '{other}'"),
                    })
                }
                None => {
                    return Err(CompileError::MissingField {
                        rule_id,
                        record: "selector",
                        field: "literal_type",
                    })
                }
            };
            Selector::Literal { kind, scope }
        }
        "ast_node" => {
            let names = raw
                .node_type
                .clone()
                .ok_or(CompileError::MissingField {
                    rule_id,
                    record: "selector",
                    field: "node_type",
                })?
                .into_vec();
            Selector::AstNode {
                kinds: resolve_node_kinds(&names),
                scope,
            }
        }
        other => {
            return Err(CompileError::UnknownSelectorTag {
                rule_id,
                tag: other.to_string(),
            })
        }
    };
    Ok(selector)
}

fn compile_constraint(rule_id: i64, raw: &RawConstraint) -> Result<Constraint, CompileError> {
    let constraint = match raw.kind.as_str() {
        "is_required" => Constraint::IsRequired {
            expected_count: raw.count,
        },
        "is_forbidden" => Constraint::IsForbidden,
        "must_inherit_from" => Constraint::MustInheritFrom {
            parent_name: raw.parent_name.clone().ok_or(CompileError::MissingField {
                rule_id,
                record: "constraint",
                field: "parent_name",
            })?,
        },
        "must_be_type" => {
            let tag = raw.expected_type.as_deref().ok_or(CompileError::MissingField {
                rule_id,
                record: "constraint",
                field: "expected_type",
            })?;
            let expected = PrimitiveType::parse(tag).ok_or_else(|| CompileError::InvalidValue {
                rule_id,
                field: "expected_type",
                message: format!("unknown type tag '{tag}'"),
            })?;
            Constraint::MustBeType { expected }
        }
        "name_must_be_in" => Constraint::NameMustBeIn {
            allowed: raw
                .allowed_names
                .clone()
                .ok_or(CompileError::MissingField {
                    rule_id,
                    record: "constraint",
                    field: "allowed_names",
                })?
                .into_iter()
                .collect(),
        },
        "value_must_be_in" => {
            let values = raw.allowed_values.clone().ok_or(CompileError::MissingField {
                rule_id,
                record: "constraint",
                field: "allowed_values",
            })?;
            let allowed = values
                .iter()
                .map(|value| compile_allowed_value(rule_id, value))
                .collect::<Result<Vec<_>, _>>()?;
            Constraint::ValueMustBeIn { allowed }
        }
        "must_have_args" => {
            let spec = match (&raw.names, raw.count) {
                (Some(names), _) => ArgSpec::Names {
                    names: names.clone(),
                    exact: raw.exact_match.unwrap_or(true),
                },
                (None, Some(count)) => ArgSpec::Count(count),
                (None, None) => {
                    return Err(CompileError::MissingField {
                        rule_id,
                        record: "constraint",
                        field: "names",
                    })
                }
            };
            Constraint::MustHaveArgs { spec }
        }
        other => {
            return Err(CompileError::UnknownConstraintTag {
                rule_id,
                tag: other.to_string(),
            })
        }
    };
    Ok(constraint)
}

fn compile_allowed_value(
    rule_id: i64,
    value: &serde_json::Value,
) -> Result<AllowedValue, CompileError> {
    match value {
        serde_json::Value::Number(number) => number
            .as_f64()
            .map(AllowedValue::Num)
            .ok_or_else(|| CompileError::InvalidValue {
                rule_id,
                field: "allowed_values",
                message: format!("number {number} is not representable"),
            }),
        serde_json::Value::String(text) => Ok(AllowedValue::Str(text.clone())),
        serde_json::Value::Bool(flag) => Ok(AllowedValue::Bool(*flag)),
        other => Err(CompileError::InvalidValue {
            rule_id,
            field: "allowed_values",
            message: format!("unsupported value {other}"),
        }),
    }
}

fn compile_scope(
    rule_id: i64,
    raw: Option<&RawScope>,
) -> Result<Option<ScopeDescriptor>, CompileError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    match raw {
        RawScope::Literal(text) if text == "global" => Ok(Some(ScopeDescriptor::Global)),
        RawScope::Literal(text) => Err(CompileError::InvalidValue {
            rule_id,
            field: "in_scope",
            message: format!("expected 'global' or a scope object, got '{text}'"),
        }),
        RawScope::Compound {
            class,
            method,
            function,
        } => match (class, method, function) {
            (Some(class), Some(method), None) => Ok(Some(ScopeDescriptor::Method {
                class: class.clone(),
                method: method.clone(),
            })),
            (Some(class), None, None) => Ok(Some(ScopeDescriptor::Class(class.clone()))),
            (None, None, Some(function)) => {
                Ok(Some(ScopeDescriptor::Function(function.clone())))
            }
            _ => Err(CompileError::InvalidValue {
                rule_id,
                field: "in_scope",
                message: "scope object must be {class}, {class, method} or {function}"
                    .to_string(),
            }),
        },
    }
}
