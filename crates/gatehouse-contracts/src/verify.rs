//! Argument schema and verification report types.
//!
//! Operations can declare an `ArgumentSchema`. Before an approved action is
//! invoked, its arguments are checked against it; a failing report stops
//! the batch before any side effect happens.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Constraints on the arguments of one operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArgumentSchema {
    /// JSON Schema document for the argument object. `Null` disables the
    /// structural check.
    #[serde(default)]
    pub json_schema: Value,
    /// Additional rules evaluated after structural validation.
    #[serde(default)]
    pub rules: Vec<ArgumentRule>,
}

impl ArgumentSchema {
    pub fn from_json_schema(json_schema: Value) -> Self {
        Self {
            json_schema,
            rules: Vec::new(),
        }
    }

    pub fn with_rule(mut self, rule: ArgumentRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// True when there is nothing to check.
    pub fn is_empty(&self) -> bool {
        self.json_schema.is_null() && self.rules.is_empty()
    }
}

/// A single named rule applied to an argument object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArgumentRule {
    /// Referenced in failure reports.
    pub rule_id: String,
    pub description: String,
    pub rule_type: ArgumentRuleType,
}

/// Rule kinds understood by the verifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ArgumentRuleType {
    /// The argument at `field_path` (dotted) must be present and non-null.
    RequiredField { field_path: String },

    /// If present, the argument at `field_path` must equal one of `allowed`.
    AllowedValues {
        field_path: String,
        allowed: Vec<Value>,
    },

    /// If present and a string, the argument must not contain `pattern`.
    ForbiddenPattern { field_path: String, pattern: String },

    /// Delegate to a function registered with the verifier under this name.
    Custom { function_name: String },
}

/// Outcome of checking one argument object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationReport {
    pub passed: bool,
    /// Empty on pass.
    pub failures: Vec<VerificationFailure>,
}

impl VerificationReport {
    pub fn pass() -> Self {
        Self {
            passed: true,
            failures: Vec::new(),
        }
    }

    /// One-line summary of every failure, e.g. for an error reason.
    pub fn summary(&self) -> String {
        self.failures
            .iter()
            .map(|f| format!("[{}] {}", f.rule_id, f.message))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationFailure {
    pub rule_id: String,
    pub message: String,
}
