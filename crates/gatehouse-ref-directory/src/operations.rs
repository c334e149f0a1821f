//! Directory operations exposed to the workflow engine.
//!
//! Read operations (`search_users`, `get_user_by_id`, `get_roles`,
//! `get_roles_by_user_id`) and the one write (`update_user`) all go through
//! the approval gate like any other action. Each returns the formatted text
//! the approver and the proposer see.

use std::sync::Arc;

use serde_json::{json, Map, Value};

use gatehouse_contracts::{
    error::{GatehouseError, GatehouseResult},
    verify::{ArgumentRule, ArgumentRuleType, ArgumentSchema},
};
use gatehouse_core::registry::{FnOperation, OperationRegistry};
use gatehouse_verify::SchemaArgumentVerifier;

use crate::mock_data::{format_roles, format_user, format_users, Directory, UserUpdate};

pub const SEARCH_USERS: &str = "search_users";
pub const GET_USER_BY_ID: &str = "get_user_by_id";
pub const UPDATE_USER: &str = "update_user";
pub const GET_ROLES: &str = "get_roles";
pub const GET_ROLES_BY_USER_ID: &str = "get_roles_by_user_id";

/// Custom rule: an update must change at least one field.
pub const UPDATE_HAS_CHANGES: &str = "update-has-changes";

// ── Argument helpers ──────────────────────────────────────────────────────────

/// Read an unsigned integer argument. Numeric strings are accepted since
/// proposers often quote ids.
fn u64_arg(args: &Map<String, Value>, key: &str, operation: &str) -> GatehouseResult<Option<u64>> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n.as_u64().map(Some).ok_or_else(|| invalid(operation, key)),
        Some(Value::String(s)) => s.trim().parse().map(Some).map_err(|_| invalid(operation, key)),
        Some(_) => Err(invalid(operation, key)),
    }
}

fn str_arg<'a>(args: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    args.get(key).and_then(Value::as_str)
}

fn invalid(operation: &str, key: &str) -> GatehouseError {
    GatehouseError::InvalidArguments {
        name: operation.to_string(),
        reason: format!("'{key}' must be a non-negative integer"),
    }
}

fn required_user_id(args: &Map<String, Value>, operation: &str) -> GatehouseResult<u64> {
    u64_arg(args, "user_id", operation)?.ok_or_else(|| GatehouseError::InvalidArguments {
        name: operation.to_string(),
        reason: "'user_id' is required".to_string(),
    })
}

// ── Schemas ───────────────────────────────────────────────────────────────────

fn search_users_schema() -> ArgumentSchema {
    ArgumentSchema::from_json_schema(json!({
        "type": "object",
        "properties": {
            "size": { "type": ["integer", "string"] },
            "search": { "type": "string" }
        }
    }))
}

fn user_id_schema() -> ArgumentSchema {
    ArgumentSchema::from_json_schema(json!({
        "type": "object",
        "properties": {
            "user_id": { "type": ["integer", "string"] }
        },
        "required": ["user_id"]
    }))
}

fn update_user_schema() -> ArgumentSchema {
    ArgumentSchema::from_json_schema(json!({
        "type": "object",
        "properties": {
            "user_id": { "type": "integer", "minimum": 1 },
            "first_name": { "type": "string", "minLength": 1 },
            "last_name": { "type": "string", "minLength": 1 },
            "user_name": { "type": "string", "minLength": 1 },
            "email": { "type": "string" },
            "job_title": { "type": "string", "minLength": 1 },
            "type": { "type": "string" },
            "supervisor": { "type": "boolean" }
        },
        "required": ["user_id"],
        "additionalProperties": false
    }))
    .with_rule(ArgumentRule {
        rule_id: "user-type-values".to_string(),
        description: "type must be USER or WORKER".to_string(),
        rule_type: ArgumentRuleType::AllowedValues {
            field_path: "type".to_string(),
            allowed: vec![json!("USER"), json!("WORKER")],
        },
    })
    .with_rule(ArgumentRule {
        rule_id: "no-markup-in-title".to_string(),
        description: "job titles are plain text".to_string(),
        rule_type: ArgumentRuleType::ForbiddenPattern {
            field_path: "job_title".to_string(),
            pattern: "<".to_string(),
        },
    })
    .with_rule(ArgumentRule {
        rule_id: "update-not-empty".to_string(),
        description: "an update must change at least one field".to_string(),
        rule_type: ArgumentRuleType::Custom {
            function_name: UPDATE_HAS_CHANGES.to_string(),
        },
    })
}

// ── Registration ──────────────────────────────────────────────────────────────

/// Build a registry with every directory operation bound to `directory`.
pub fn directory_registry(directory: Arc<Directory>) -> OperationRegistry {
    let mut registry = OperationRegistry::new();

    let dir = Arc::clone(&directory);
    registry.register(
        FnOperation::new(
            SEARCH_USERS,
            "Search active users to find their details and IDs. Arguments: size (default 5), search (name, user name or email).",
            move |args| {
                let size = u64_arg(args, "size", SEARCH_USERS)?.unwrap_or(5) as usize;
                let users = dir.search_users(size, str_arg(args, "search"))?;
                Ok(Value::String(format_users(&users)))
            },
        )
        .with_schema(search_users_schema()),
    );

    let dir = Arc::clone(&directory);
    registry.register(
        FnOperation::new(GET_USER_BY_ID, "Retrieve the details of one user by user_id.", move |args| {
            let user_id = required_user_id(args, GET_USER_BY_ID)?;
            match dir.user_by_id(user_id)? {
                Some(user) => Ok(Value::String(format_user(&user))),
                None => Err(GatehouseError::OperationFailed {
                    name: GET_USER_BY_ID.to_string(),
                    reason: format!("no user with ID {user_id}"),
                }),
            }
        })
        .with_schema(user_id_schema()),
    );

    let dir = Arc::clone(&directory);
    registry.register(
        FnOperation::new(
            UPDATE_USER,
            "Update fields of a user (first_name, last_name, user_name, email, job_title, type, supervisor) by user_id.",
            move |args| {
                let user_id = required_user_id(args, UPDATE_USER)?;
                let update: UserUpdate =
                    serde_json::from_value(Value::Object(args.clone())).map_err(|e| {
                        GatehouseError::InvalidArguments {
                            name: UPDATE_USER.to_string(),
                            reason: e.to_string(),
                        }
                    })?;
                let updated = dir.update_user(user_id, &update)?;
                Ok(Value::String(format!("Updated user with ID: {}", updated.id)))
            },
        )
        .with_schema(update_user_schema()),
    );

    let dir = Arc::clone(&directory);
    registry.register(FnOperation::new(
        GET_ROLES,
        "List roles to find role IDs. Arguments: search, size (default 25).",
        move |args| {
            let size = u64_arg(args, "size", GET_ROLES)?.unwrap_or(25) as usize;
            let roles = dir.roles(str_arg(args, "search").unwrap_or(""), size);
            Ok(Value::String(format_roles(&roles)))
        },
    ));

    let dir = directory;
    registry.register(
        FnOperation::new(GET_ROLES_BY_USER_ID, "List the roles assigned to a user by user_id.", move |args| {
            let user_id = required_user_id(args, GET_ROLES_BY_USER_ID)?;
            Ok(Value::String(format_roles(&dir.roles_for_user(user_id))))
        })
        .with_schema(user_id_schema()),
    );

    registry
}

/// A verifier carrying the custom rules the directory schemas reference.
pub fn directory_verifier() -> SchemaArgumentVerifier {
    SchemaArgumentVerifier::new().with_rule(
        UPDATE_HAS_CHANGES,
        Box::new(|args: &Value| {
            let changes = args
                .as_object()
                .map(|m| m.keys().filter(|k| k.as_str() != "user_id").count())
                .unwrap_or(0);
            if changes == 0 {
                Some("update_user needs at least one field to change".to_string())
            } else {
                None
            }
        }),
    )
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use gatehouse_core::{executor::ActionExecutor, traits::ArgumentVerifier};
    use gatehouse_contracts::{action::CandidateAction, workflow::WorkflowState};

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    fn executor() -> (ActionExecutor, Arc<Directory>) {
        let directory = Arc::new(Directory::seeded());
        let executor = ActionExecutor::new(
            directory_registry(Arc::clone(&directory)),
            Box::new(directory_verifier()),
        );
        (executor, directory)
    }

    #[test]
    fn test_registry_exposes_all_operations() {
        let (executor, _) = executor();
        assert_eq!(
            executor.registry().names(),
            vec![GET_ROLES, GET_ROLES_BY_USER_ID, GET_USER_BY_ID, SEARCH_USERS, UPDATE_USER]
        );
    }

    #[test]
    fn test_search_users_respects_size_and_filter() {
        let (executor, _) = executor();

        let two = executor
            .invoke(&CandidateAction::new(SEARCH_USERS, args(json!({ "size": 2 }))))
            .unwrap();
        let text = two.as_str().unwrap();
        assert_eq!(text.matches("User ID:").count(), 2);
        assert!(text.contains("User ID: 1226"), "newest user first: {text}");

        let jane = executor
            .invoke(&CandidateAction::new(SEARCH_USERS, args(json!({ "search": "jane doe" }))))
            .unwrap();
        assert!(jane.as_str().unwrap().starts_with("User ID: 1201"));

        let none = executor
            .invoke(&CandidateAction::new(SEARCH_USERS, args(json!({ "search": "nobody" }))))
            .unwrap();
        assert_eq!(none, json!("No users found."));
    }

    #[test]
    fn test_update_user_changes_directory() {
        let (executor, directory) = executor();
        let result = executor
            .invoke(&CandidateAction::new(
                UPDATE_USER,
                args(json!({ "user_id": 1201, "job_title": "Lead Technician" })),
            ))
            .unwrap();

        assert_eq!(result, json!("Updated user with ID: 1201"));
        let jane = directory.user_by_id(1201).unwrap().unwrap();
        assert_eq!(jane.job_title, "Lead Technician");
        assert!(jane.updated_on.is_some());
    }

    #[test]
    fn test_update_user_rejects_bad_arguments_before_touching_directory() {
        let (executor, directory) = executor();

        for bad in [
            json!({ "user_id": 1201 }),
            json!({ "user_id": 1201, "type": "ROBOT" }),
            json!({ "user_id": 1201, "job_title": "<b>Boss</b>" }),
            json!({ "user_id": "1201", "job_title": "Boss" }),
            json!({ "user_id": 1201, "salary": 10 }),
        ] {
            let err = executor
                .invoke(&CandidateAction::new(UPDATE_USER, args(bad.clone())))
                .unwrap_err();
            assert!(
                matches!(err, GatehouseError::InvalidArguments { .. }),
                "expected InvalidArguments for {bad}, got {err:?}"
            );
        }

        assert_eq!(directory.user_by_id(1201).unwrap().unwrap().job_title, "Field Technician");
    }

    #[test]
    fn test_update_unknown_user_fails() {
        let (executor, _) = executor();
        let err = executor
            .invoke(&CandidateAction::new(UPDATE_USER, args(json!({ "user_id": 9, "job_title": "X" }))))
            .unwrap_err();
        assert!(matches!(err, GatehouseError::OperationFailed { .. }));
    }

    #[test]
    fn test_role_lookups() {
        let (executor, _) = executor();

        let roles = executor
            .invoke(&CandidateAction::new(GET_ROLES_BY_USER_ID, args(json!({ "user_id": "1207" }))))
            .unwrap();
        let text = roles.as_str().unwrap();
        assert!(text.contains("Inspector") && text.contains("Technician"));

        let all = executor.invoke(&CandidateAction::new(GET_ROLES, Map::new())).unwrap();
        assert_eq!(all.as_str().unwrap().matches("Role ID:").count(), 4);

        let user = executor
            .invoke(&CandidateAction::new(GET_USER_BY_ID, args(json!({ "user_id": 1196 }))))
            .unwrap();
        assert!(user.as_str().unwrap().contains("Amara Okafor"));
    }

    #[test]
    fn test_executor_records_directory_result() {
        let (executor, _) = executor();
        let mut state = WorkflowState::new("list 1 user", false);
        executor
            .execute(&mut state, &CandidateAction::new(SEARCH_USERS, args(json!({ "size": 1 }))))
            .unwrap();
        assert!(state.tool_response.starts_with("search_users: User ID: 1226"));
    }

    #[test]
    fn test_custom_update_rule() {
        let verifier = directory_verifier();
        let report = verifier.verify(&json!({ "user_id": 1 }), &update_user_schema()).unwrap();
        assert!(!report.passed);
        assert!(report.failures.iter().any(|f| f.rule_id == "update-not-empty"));
    }
}
