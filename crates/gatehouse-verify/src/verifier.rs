//! Argument verifier for Gatehouse operations.
//!
//! `SchemaArgumentVerifier` implements the `ArgumentVerifier` trait from
//! `gatehouse-core`. An argument object is checked in two phases:
//!
//! 1. **Structural**: validated against `ArgumentSchema::json_schema` with the
//!    `jsonschema` crate. A null schema means no structural constraint.
//! 2. **Semantic**: each `ArgumentRule` is evaluated in order. All failures
//!    are collected so the approver's log shows the full set at once.
//!
//! Custom rules delegate to named functions registered with `register_rule`,
//! so operation-specific checks live with the operations that need them.

use std::collections::HashMap;

use serde_json::Value;
use tracing::{debug, warn};

use gatehouse_contracts::{
    error::GatehouseResult,
    verify::{ArgumentRuleType, ArgumentSchema, VerificationFailure, VerificationReport},
};
use gatehouse_core::traits::ArgumentVerifier;

/// A caller-supplied argument check.
///
/// Receives the full argument object. Returns `Some(message)` on failure.
pub type CustomRuleFn = Box<dyn Fn(&Value) -> Option<String> + Send + Sync>;

pub struct SchemaArgumentVerifier {
    custom_rules: HashMap<String, CustomRuleFn>,
}

impl SchemaArgumentVerifier {
    pub fn new() -> Self {
        Self {
            custom_rules: HashMap::new(),
        }
    }

    /// Register a custom check under `name`, the `function_name` used by
    /// `ArgumentRuleType::Custom`. Re-registering a name replaces it.
    pub fn register_rule(&mut self, name: impl Into<String>, f: CustomRuleFn) {
        self.custom_rules.insert(name.into(), f);
    }

    /// Builder form of `register_rule`.
    pub fn with_rule(mut self, name: impl Into<String>, f: CustomRuleFn) -> Self {
        self.register_rule(name, f);
        self
    }

    pub fn has_rule(&self, name: &str) -> bool {
        self.custom_rules.contains_key(name)
    }

    // ── Internal helpers ──────────────────────────────────────────────────────

    /// Resolve a dotted path such as `"address.city"`. Missing segments and
    /// JSON `null` both resolve to `None`.
    fn resolve_path<'v>(value: &'v Value, path: &str) -> Option<&'v Value> {
        let mut current = value;
        for segment in path.split('.') {
            match current.get(segment) {
                Some(v) if !v.is_null() => current = v,
                _ => return None,
            }
        }
        Some(current)
    }

    fn structural_failures(arguments: &Value, json_schema: &Value) -> Vec<VerificationFailure> {
        if json_schema.is_null() {
            return Vec::new();
        }

        match jsonschema::validator_for(json_schema) {
            Ok(validator) => validator
                .iter_errors(arguments)
                .map(|error| {
                    let message = format!("JSON Schema violation at {}: {}", error.instance_path, error);
                    warn!(%message, "structural argument failure");
                    VerificationFailure {
                        rule_id: "json-schema".to_string(),
                        message,
                    }
                })
                .collect(),
            Err(e) => {
                // A broken schema is an operation bug; fail closed.
                let message = format!("invalid JSON Schema document: {e}");
                warn!(%message, "argument schema compilation failure");
                vec![VerificationFailure {
                    rule_id: "json-schema".to_string(),
                    message,
                }]
            }
        }
    }

    fn evaluate_rule(&self, arguments: &Value, rule_type: &ArgumentRuleType) -> Option<String> {
        match rule_type {
            ArgumentRuleType::RequiredField { field_path } => match Self::resolve_path(arguments, field_path) {
                None => Some(format!("required argument '{field_path}' is missing or null")),
                Some(_) => None,
            },

            ArgumentRuleType::AllowedValues { field_path, allowed } => {
                // Optional arguments are only constrained when supplied.
                let actual = Self::resolve_path(arguments, field_path)?;
                if allowed.contains(actual) {
                    None
                } else {
                    Some(format!(
                        "argument '{field_path}' has value {actual} which is not in the allowed set"
                    ))
                }
            }

            ArgumentRuleType::ForbiddenPattern { field_path, pattern } => {
                let text = Self::resolve_path(arguments, field_path)?.as_str()?;
                if text.contains(pattern.as_str()) {
                    Some(format!("argument '{field_path}' contains forbidden pattern '{pattern}'"))
                } else {
                    None
                }
            }

            ArgumentRuleType::Custom { function_name } => match self.custom_rules.get(function_name.as_str()) {
                Some(f) => f(arguments),
                None => Some(format!(
                    "no custom rule registered for function name '{function_name}'"
                )),
            },
        }
    }
}

impl Default for SchemaArgumentVerifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ArgumentVerifier for SchemaArgumentVerifier {
    fn verify(&self, arguments: &Value, schema: &ArgumentSchema) -> GatehouseResult<VerificationReport> {
        let mut failures = Self::structural_failures(arguments, &schema.json_schema);

        for rule in &schema.rules {
            debug!(rule_id = %rule.rule_id, description = %rule.description, "evaluating argument rule");

            if let Some(message) = self.evaluate_rule(arguments, &rule.rule_type) {
                warn!(rule_id = %rule.rule_id, %message, "argument rule failed");
                failures.push(VerificationFailure {
                    rule_id: rule.rule_id.clone(),
                    message,
                });
            }
        }

        let passed = failures.is_empty();
        debug!(passed, failure_count = failures.len(), "argument verification complete");

        Ok(VerificationReport { passed, failures })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
