//! Parsing proposer output into candidate actions.
//!
//! Language-model proposers answer with text. The accepted shapes are a
//! single JSON object `{"name": .., "arguments": {..}}` (`parameters` is
//! accepted as an alias), an array of such objects, or `null`/empty text for
//! "no action". A surrounding Markdown code fence is stripped first.

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use gatehouse_contracts::{
    action::{ActionContext, CandidateAction},
    error::{GatehouseError, GatehouseResult},
};

use crate::traits::ActionProposer;

#[derive(Debug, Deserialize)]
struct RawToolCall {
    name: String,
    #[serde(default, alias = "parameters")]
    arguments: Value,
    #[serde(default)]
    id: Option<String>,
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop an optional language tag on the opening fence line.
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    body.trim_end().trim_end_matches("```").trim()
}

fn into_candidate(value: Value) -> GatehouseResult<CandidateAction> {
    let raw: RawToolCall = serde_json::from_value(value).map_err(|e| GatehouseError::ProposalFailed {
        reason: format!("malformed tool call: {e}"),
    })?;

    if raw.name.trim().is_empty() {
        return Err(GatehouseError::ProposalFailed {
            reason: "tool call has an empty name".to_string(),
        });
    }

    let arguments = match raw.arguments {
        Value::Null => Default::default(),
        Value::Object(map) => map,
        other => {
            return Err(GatehouseError::ProposalFailed {
                reason: format!("arguments for '{}' must be an object, got {other}", raw.name),
            })
        }
    };

    let mut candidate = CandidateAction::new(raw.name.trim(), arguments);
    if let Some(id) = raw.id {
        candidate.id = id;
    }
    Ok(candidate)
}

/// Parse proposer text into an ordered list of candidates.
pub fn parse_candidates(raw: &str) -> GatehouseResult<Vec<CandidateAction>> {
    let body = strip_code_fence(raw);
    if body.is_empty() {
        return Ok(Vec::new());
    }

    let value: Value = serde_json::from_str(body).map_err(|e| GatehouseError::ProposalFailed {
        reason: format!("proposer output is not JSON: {e}"),
    })?;

    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => items.into_iter().map(into_candidate).collect(),
        obj @ Value::Object(_) => Ok(vec![into_candidate(obj)?]),
        other => Err(GatehouseError::ProposalFailed {
            reason: format!("expected a tool call object or array, got {other}"),
        }),
    }
}

/// Signature of a text-producing proposal backend.
///
/// Receives the query and the rendered action context (empty on the first
/// cycle) and returns raw model text.
pub type CompletionFn = Box<dyn Fn(&str, &str) -> GatehouseResult<String> + Send + Sync>;

/// An `ActionProposer` over any text backend, parsing its output with
/// [`parse_candidates`].
pub struct TextProposer {
    complete: CompletionFn,
}

impl TextProposer {
    pub fn new(
        complete: impl Fn(&str, &str) -> GatehouseResult<String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            complete: Box::new(complete),
        }
    }
}

impl ActionProposer for TextProposer {
    fn propose(&self, query: &str, context: &ActionContext) -> GatehouseResult<Vec<CandidateAction>> {
        let text = (self.complete)(query, &context.summary())?;
        match parse_candidates(&text) {
            Ok(candidates) => {
                debug!(count = candidates.len(), "parsed proposer output");
                Ok(candidates)
            }
            Err(e) => {
                warn!(error = %e, output = %text, "unparsable proposer output");
                Err(e)
            }
        }
    }
}
