use serde::Deserialize;
use std::fmt;

/// Top-level rule file. Unrecognized keys anywhere in the document are
/// ignored so rule files can carry forward-compatible extensions.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct RuleFile {
    #[serde(default)]
    pub validation_rules: Vec<RawRule>,
}

impl RuleFile {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if self.validation_rules.is_empty() {
            issues.push(ValidationIssue::EmptyRuleList);
        }

        let mut seen_ids = Vec::new();
        for rule in &self.validation_rules {
            if seen_ids.contains(&rule.rule_id) {
                issues.push(ValidationIssue::DuplicateRuleId { rule_id: rule.rule_id });
            } else {
                seen_ids.push(rule.rule_id);
            }

            if rule.message.trim().is_empty() {
                issues.push(ValidationIssue::MissingField {
                    rule_id: rule.rule_id,
                    field: "message",
                });
            }

            match (&rule.kind, &rule.check) {
                (None, None) => issues.push(ValidationIssue::InvalidCombo {
                    rule_id: rule.rule_id,
                    message: "rule must contain either 'type' or 'check'".to_string(),
                }),
                (Some(_), Some(_)) => issues.push(ValidationIssue::InvalidCombo {
                    rule_id: rule.rule_id,
                    message: "rule cannot contain both 'type' and 'check'".to_string(),
                }),
                _ => {}
            }

            if let Some(check) = &rule.check {
                if check.selector.kind.trim().is_empty() {
                    issues.push(ValidationIssue::MissingField {
                        rule_id: rule.rule_id,
                        field: "check.selector.type",
                    });
                }
                if check.constraint.kind.trim().is_empty() {
                    issues.push(ValidationIssue::MissingField {
                        rule_id: rule.rule_id,
                        field: "check.constraint.type",
                    });
                }
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }
}

/// One raw rule record, either short form (`type` present) or full form
/// (`check` present). Which shape applies is decided at compile time.
#[derive(Debug, Deserialize, Clone)]
pub struct RawRule {
    pub rule_id: i64,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    pub message: String,
    #[serde(default)]
    pub params: RawStyleParams,
    #[serde(default)]
    pub check: Option<RawCheck>,
    #[serde(default)]
    pub is_critical: bool,
}

/// Parameters for the linter-style short rule.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct RawStyleParams {
    #[serde(default)]
    pub ignore: Option<Vec<String>>,
    #[serde(default)]
    pub select: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RawCheck {
    pub selector: RawSelector,
    pub constraint: RawConstraint,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RawSelector {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub node_type: Option<StringOrList>,
    #[serde(default)]
    pub literal_type: Option<String>,
    #[serde(default)]
    pub in_scope: Option<RawScope>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RawConstraint {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub count: Option<usize>,
    #[serde(default)]
    pub parent_name: Option<String>,
    #[serde(default)]
    pub expected_type: Option<String>,
    #[serde(default)]
    pub allowed_names: Option<Vec<String>>,
    #[serde(default)]
    pub allowed_values: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    pub names: Option<Vec<String>>,
    #[serde(default)]
    pub exact_match: Option<bool>,
}

/// `in_scope` is either the literal string "global" or an object with
/// `class`/`method` or `function` keys.
#[derive(Debug, Deserialize, Clone)]
#[serde(untagged)]
pub enum RawScope {
    Literal(String),
    Compound {
        #[serde(default, rename = "class")]
        class: Option<String>,
        #[serde(default)]
        method: Option<String>,
        #[serde(default)]
        function: Option<String>,
    },
}

/// Accepts `"for_loop"` and `["for_loop", "while_loop"]` alike.
#[derive(Debug, Deserialize, Clone)]
#[serde(untagged)]
pub enum StringOrList {
    One(String),
    Many(Vec<String>),
}

impl StringOrList {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            StringOrList::One(value) => vec![value],
            StringOrList::Many(values) => values,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone)]
pub enum ValidationIssue {
    EmptyRuleList,
    DuplicateRuleId { rule_id: i64 },
    MissingField { rule_id: i64, field: &'static str },
    InvalidCombo { rule_id: i64, message: String },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::EmptyRuleList => write!(f, "rule file contains no rules"),
            ValidationIssue::DuplicateRuleId { rule_id } => {
                write!(f, "rule id {rule_id} appears more than once")
            }
            ValidationIssue::MissingField { rule_id, field } => {
                write!(f, "rule {rule_id} missing required field '{field}'")
            }
            ValidationIssue::InvalidCombo { rule_id, message } => {
                write!(f, "rule {rule_id} has invalid configuration: {message}")
            }
        }
    }
}
