//! Candidate actions and the execution history used for deduplication.
//!
//! A `CandidateAction` is what the proposer suggests. Once it has run, it is
//! recorded as an `ActionRecord` inside the workflow's `ActionContext`. The
//! context refuses to hold two records with the same normalized form, which
//! is what keeps a non-idempotent operation from running twice.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A named operation with arguments, as suggested by the action proposer.
///
/// `id` is an opaque correlation token. It never participates in equality
/// or deduplication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateAction {
    /// Registry name of the operation (e.g. "search_users").
    pub name: String,
    /// Argument map passed to the operation verbatim.
    #[serde(default)]
    pub arguments: Map<String, Value>,
    /// Correlation token. Generated when the proposer does not supply one.
    #[serde(default = "generate_action_id")]
    pub id: String,
}

fn generate_action_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

impl CandidateAction {
    /// Build a candidate with a freshly generated id.
    pub fn new(name: impl Into<String>, arguments: Map<String, Value>) -> Self {
        Self {
            name: name.into(),
            arguments,
            id: generate_action_id(),
        }
    }

    /// The normalized record this action would produce once executed.
    pub fn to_record(&self) -> ActionRecord {
        ActionRecord::new(self.name.clone(), &self.arguments)
    }
}

/// Lower-case every object key (recursively) and sort by key.
///
/// Arrays keep their order; scalars are returned unchanged. When two keys
/// collide after lower-casing, the one sorting last in the original map wins.
pub fn normalize_value(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            normalize_parameters(map)
                .into_iter()
                .collect::<Map<String, Value>>(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(normalize_value).collect()),
        other => other.clone(),
    }
}

/// Normalize a top-level argument map into a sorted, lower-cased map.
pub fn normalize_parameters(arguments: &Map<String, Value>) -> BTreeMap<String, Value> {
    arguments
        .iter()
        .map(|(key, value)| (key.to_lowercase(), normalize_value(value)))
        .collect()
}

/// One executed action, stored in normalized form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionRecord {
    pub name: String,
    /// Lower-cased, key-sorted parameters.
    #[serde(default)]
    pub parameters: BTreeMap<String, Value>,
    /// When the action was recorded (UTC).
    pub timestamp: DateTime<Utc>,
}

impl ActionRecord {
    pub fn new(name: impl Into<String>, arguments: &Map<String, Value>) -> Self {
        Self {
            name: name.into(),
            parameters: normalize_parameters(arguments),
            timestamp: Utc::now(),
        }
    }

    /// Structural equality on name and normalized parameters.
    ///
    /// Timestamps are ignored: the same call made at two different times is
    /// still the same side effect.
    pub fn is_duplicate_of(&self, other: &ActionRecord) -> bool {
        self.name == other.name && self.parameters == other.parameters
    }
}

/// Durable execution history carried across chained iterations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionContext {
    /// Stringified results, in execution order.
    #[serde(default)]
    pub previous_results: Vec<String>,
    /// Executed actions. Never holds two duplicates.
    #[serde(default)]
    pub already_executed: Vec<ActionRecord>,
}

impl ActionContext {
    /// True if an equivalent action has already been executed.
    pub fn contains(&self, record: &ActionRecord) -> bool {
        self.already_executed
            .iter()
            .any(|existing| existing.is_duplicate_of(record))
    }

    /// True if `action` would duplicate an executed action.
    pub fn has_executed(&self, action: &CandidateAction) -> bool {
        self.contains(&action.to_record())
    }

    /// Set-add a record. Returns false, leaving the context untouched, when
    /// an equivalent record is already present.
    pub fn record(&mut self, record: ActionRecord) -> bool {
        if self.contains(&record) {
            return false;
        }
        self.already_executed.push(record);
        true
    }

    /// Append an observed result.
    pub fn push_result(&mut self, result: impl Into<String>) {
        self.previous_results.push(result.into());
    }

    pub fn is_empty(&self) -> bool {
        self.previous_results.is_empty() && self.already_executed.is_empty()
    }

    /// Render the history as plain text for inclusion in a proposer prompt.
    ///
    /// Returns an empty string when nothing has been executed yet.
    pub fn summary(&self) -> String {
        if self.is_empty() {
            return String::new();
        }

        let mut out = String::from("Already executed actions:\n");
        for record in &self.already_executed {
            let params = serde_json::to_string(&record.parameters).unwrap_or_default();
            out.push_str(&format!("- {} {}\n", record.name, params));
        }

        out.push_str("Previous results:\n");
        for (idx, result) in self.previous_results.iter().enumerate() {
            out.push_str(&format!("{}. {}\n", idx + 1, result));
        }
        out
    }
}
