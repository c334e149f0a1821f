//! A deterministic keyword proposer standing in for a language model.
//!
//! It answers with the same JSON text a model would (`{"name", "arguments"}`
//! objects, or `null`) and reads the rendered action context the same way a
//! model prompt would, so the whole text → `parse_candidates` path is
//! exercised.
//!
//! Understood requests:
//!
//! - "list N users" / "show N users"            → `search_users {size: N}`
//! - "list roles"                               → `get_roles {}`
//! - "roles of user N"                          → `get_roles_by_user_id {user_id: N}`
//! - "details of user N"                        → `get_user_by_id {user_id: N}`
//! - "find <name> and set their job title to <title>"
//!     cycle 1 → `search_users {search: <name>, size: 1}`
//!     cycle 2 → `update_user {user_id: <found id>, job_title: <title>}`
//!     cycle 3 → `null`
//! - "set the job title of user N to <title>"   → `update_user {user_id: N, job_title: <title>}`

use serde_json::{json, Value};
use tracing::debug;

use gatehouse_contracts::error::GatehouseResult;
use gatehouse_core::proposal::TextProposer;

use crate::operations::{GET_ROLES, GET_ROLES_BY_USER_ID, GET_USER_BY_ID, SEARCH_USERS, UPDATE_USER};

const TITLE_MARKER: &str = " job title to ";

/// First run of ASCII digits in `text`.
fn first_number(text: &str) -> Option<u64> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let digits: String = text[start..].chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

/// The id on the first `User ID: N` line of the previous results.
fn discovered_user_id(context: &str) -> Option<u64> {
    let results = &context[context.find("Previous results:")?..];
    let line = results.lines().find(|l| l.contains("User ID:"))?;
    first_number(&line[line.find("User ID:")?..])
}

/// Split "find <name> and set their job title to <title>".
fn parse_retitle(query: &str) -> Option<(String, String)> {
    let lower = query.to_ascii_lowercase();
    let title_at = lower.find(TITLE_MARKER)?;
    let find_at = lower.find("find ")?;
    if find_at >= title_at {
        return None;
    }

    let name_part = &query[find_at + "find ".len()..title_at];
    let name = ["and set their", "and change their", "then set their", "then change their", "and make their"]
        .iter()
        .filter_map(|sep| name_part.to_ascii_lowercase().find(sep))
        .min()
        .map(|cut| &name_part[..cut])
        .unwrap_or(name_part)
        .trim()
        .trim_end_matches(',')
        .to_string();

    let title = query[title_at + TITLE_MARKER.len()..]
        .trim()
        .trim_end_matches('.')
        .trim_matches('"')
        .to_string();

    if name.is_empty() || title.is_empty() {
        None
    } else {
        Some((name, title))
    }
}

/// Split "set the job title of user N to <title>".
fn parse_direct_retitle(query: &str) -> Option<(u64, String)> {
    let lower = query.to_ascii_lowercase();
    let marker = " to ";
    let head_end = lower.find("job title")?;
    let user_at = lower[head_end..].find("user ")? + head_end;
    let to_at = lower[user_at..].find(marker)? + user_at;
    let user_id = first_number(&lower[user_at..to_at])?;

    let title = query[to_at + marker.len()..]
        .trim()
        .trim_end_matches('.')
        .trim_matches('"')
        .to_string();
    (!title.is_empty()).then_some((user_id, title))
}

fn call(name: &str, arguments: Value) -> Value {
    json!({ "name": name, "arguments": arguments })
}

/// Produce the proposer's raw answer for `query` given the rendered context.
pub fn plan(query: &str, context: &str) -> String {
    let lower = query.to_lowercase();

    let answer = if let Some((name, title)) = parse_retitle(query) {
        if context.contains(UPDATE_USER) {
            Value::Null
        } else if let Some(user_id) = discovered_user_id(context) {
            call(UPDATE_USER, json!({ "user_id": user_id, "job_title": title }))
        } else if context.contains(SEARCH_USERS) {
            // Searched already and found nobody.
            Value::Null
        } else {
            call(SEARCH_USERS, json!({ "search": name, "size": 1 }))
        }
    } else if let Some((user_id, title)) = parse_direct_retitle(query) {
        call(UPDATE_USER, json!({ "user_id": user_id, "job_title": title }))
    } else if lower.contains("role") && lower.contains("user") {
        match first_number(&lower) {
            Some(user_id) => call(GET_ROLES_BY_USER_ID, json!({ "user_id": user_id })),
            None => Value::Null,
        }
    } else if lower.contains("role") {
        call(GET_ROLES, json!({}))
    } else if lower.contains("user") && (lower.contains("list") || lower.contains("show")) {
        let size = first_number(&lower).unwrap_or(5);
        call(SEARCH_USERS, json!({ "size": size }))
    } else if lower.contains("user") {
        match first_number(&lower) {
            Some(user_id) => call(GET_USER_BY_ID, json!({ "user_id": user_id })),
            None => Value::Null,
        }
    } else {
        Value::Null
    };

    let text = answer.to_string();
    debug!(query, answer = %text, "keyword proposer answered");
    text
}

/// The keyword proposer as an `ActionProposer`.
pub fn keyword_proposer() -> TextProposer {
    TextProposer::new(|query, context| -> GatehouseResult<String> { Ok(plan(query, context)) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatehouse_contracts::action::{ActionContext, CandidateAction};
    use gatehouse_core::{parse_candidates, traits::ActionProposer};

    #[test]
    fn test_list_users() {
        let candidates = parse_candidates(&plan("Please list 2 users", "")).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].name, SEARCH_USERS);
        assert_eq!(candidates[0].arguments.get("size"), Some(&json!(2)));
    }

    #[test]
    fn test_role_and_user_lookups() {
        let roles = parse_candidates(&plan("what roles does user 1207 have?", "")).unwrap();
        assert_eq!(roles[0].name, GET_ROLES_BY_USER_ID);
        assert_eq!(roles[0].arguments.get("user_id"), Some(&json!(1207)));

        assert_eq!(parse_candidates(&plan("list roles", "")).unwrap()[0].name, GET_ROLES);
        assert_eq!(parse_candidates(&plan("details of user 1196", "")).unwrap()[0].name, GET_USER_BY_ID);
    }

    #[test]
    fn test_unrelated_query_has_no_actions() {
        assert!(parse_candidates(&plan("what's the weather in Lyon?", "")).unwrap().is_empty());
    }

    #[test]
    fn test_retitle_parsing() {
        assert_eq!(
            parse_retitle("Find Jane Doe and set their job title to Lead Technician."),
            Some(("Jane Doe".to_string(), "Lead Technician".to_string()))
        );
        assert_eq!(parse_retitle("set the job title to X"), None);
    }

    #[test]
    fn test_direct_retitle() {
        let candidates = parse_candidates(&plan("Set the job title of user 1207 to Senior Inspector.", "")).unwrap();
        assert_eq!(candidates[0].name, UPDATE_USER);
        assert_eq!(candidates[0].arguments.get("user_id"), Some(&json!(1207)));
        assert_eq!(candidates[0].arguments.get("job_title"), Some(&json!("Senior Inspector")));

        assert_eq!(parse_direct_retitle("set the job title to X"), None);
    }

    #[test]
    fn test_retitle_chain_reads_context() {
        let query = "find Jane Doe and set their job title to Lead Technician";
        let proposer = keyword_proposer();

        let first = proposer.propose(query, &ActionContext::default()).unwrap();
        assert_eq!(first[0].name, SEARCH_USERS);
        assert_eq!(first[0].arguments.get("search"), Some(&json!("Jane Doe")));

        let mut context = ActionContext::default();
        context.record(first[0].to_record());
        context.push_result("User ID: 1201\nName: Jane Doe\n");
        let second = proposer.propose(query, &context).unwrap();
        assert_eq!(second[0].name, UPDATE_USER);
        assert_eq!(second[0].arguments.get("user_id"), Some(&json!(1201)));
        assert_eq!(second[0].arguments.get("job_title"), Some(&json!("Lead Technician")));

        context.record(second[0].to_record());
        context.push_result("Updated user with ID: 1201");
        assert!(proposer.propose(query, &context).unwrap().is_empty());
    }

    #[test]
    fn test_retitle_stops_when_nobody_found() {
        let query = "find Nobody Here and set their job title to CEO";
        let mut context = ActionContext::default();
        context.record(CandidateAction::new(SEARCH_USERS, Default::default()).to_record());
        context.push_result("No users found.");
        assert!(keyword_proposer().propose(query, &context).unwrap().is_empty());
    }
}
