//! # gatehouse-core
//!
//! The approval-gated workflow runtime.
//!
//! This crate provides:
//! - The collaborator traits (`ActionProposer`, `Operation`, `ArgumentVerifier`,
//!   `CheckpointStore`, `EventSink`)
//! - The `OperationRegistry` and `ActionExecutor` that dispatch approved actions
//! - The `WorkflowEngine` that drives identify → approve → execute cycles
//!
//! ## Usage
//!
//! ```rust,ignore
//! use gatehouse_core::{WorkflowEngine, EngineConfig, ActionExecutor, OperationRegistry};
//! ```

pub mod engine;
pub mod executor;
pub mod gate;
pub mod lock;
pub mod proposal;
pub mod registry;
pub mod sink;
pub mod traits;

pub use engine::{EngineConfig, WorkflowEngine, DEFAULT_MAX_CHAIN_ITERATIONS};
pub use executor::ActionExecutor;
pub use gate::{ApprovalDecision, ApprovalGate};
pub use proposal::{parse_candidates, TextProposer};
pub use registry::{FnOperation, OperationRegistry};
pub use sink::{CollectingSink, NullSink};

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use gatehouse_contracts::{
        action::{ActionContext, CandidateAction},
        error::{GatehouseError, GatehouseResult},
        verify::{ArgumentSchema, VerificationReport},
        workflow::{ThreadId, WorkflowState},
    };

    use crate::{
        executor::{stringify_result, ActionExecutor},
        gate::ApprovalGate,
        lock::ThreadLocks,
        proposal::{parse_candidates, TextProposer},
        registry::{FnOperation, OperationRegistry},
        traits::{ActionProposer, ArgumentVerifier},
    };

    struct PassVerifier;

    impl ArgumentVerifier for PassVerifier {
        fn verify(&self, _arguments: &Value, _schema: &ArgumentSchema) -> GatehouseResult<VerificationReport> {
            Ok(VerificationReport::pass())
        }
    }

    // ── Proposal parsing ─────────────────────────────────────────────────────

    #[test]
    fn test_parses_a_single_tool_call() {
        let candidates = parse_candidates(r#"{"name": "search_users", "arguments": {"size": 2}}"#).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].name, "search_users");
        assert_eq!(candidates[0].arguments.get("size"), Some(&json!(2)));
    }

    #[test]
    fn test_parses_an_array_and_the_parameters_alias() {
        let raw = r#"[
            {"name": "get_user_by_id", "parameters": {"user_id": 3}},
            {"name": "get_roles_by_user_id", "arguments": {"user_id": 3}, "id": "call-2"}
        ]"#;
        let candidates = parse_candidates(raw).unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].arguments.get("user_id"), Some(&json!(3)));
        assert_eq!(candidates[1].id, "call-2");
    }

    #[test]
    fn test_strips_markdown_fences() {
        let raw = "```json\n{\"name\": \"get_roles\", \"arguments\": {}}\n```";
        let candidates = parse_candidates(raw).unwrap();
        assert_eq!(candidates[0].name, "get_roles");
    }

    #[test]
    fn test_empty_and_null_mean_no_action() {
        assert!(parse_candidates("").unwrap().is_empty());
        assert!(parse_candidates("  null ").unwrap().is_empty());
        assert!(parse_candidates("[]").unwrap().is_empty());
    }

    #[test]
    fn test_missing_arguments_default_to_empty() {
        let candidates = parse_candidates(r#"{"name": "get_roles"}"#).unwrap();
        assert!(candidates[0].arguments.is_empty());
    }

    #[test]
    fn test_rejects_malformed_output() {
        for raw in [
            "I think you should search the users",
            r#"{"arguments": {}}"#,
            r#"{"name": "  ", "arguments": {}}"#,
            r#"{"name": "x", "arguments": [1, 2]}"#,
            "42",
        ] {
            match parse_candidates(raw) {
                Err(GatehouseError::ProposalFailed { .. }) => {}
                other => panic!("expected ProposalFailed for {raw:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_text_proposer_passes_context_summary() {
        let proposer = TextProposer::new(|query, context| {
            assert_eq!(query, "list users");
            if context.is_empty() {
                Ok(r#"{"name": "search_users", "arguments": {"size": 10}}"#.to_string())
            } else {
                Ok("null".to_string())
            }
        });

        let first = proposer.propose("list users", &ActionContext::default()).unwrap();
        assert_eq!(first.len(), 1);

        let mut context = ActionContext::default();
        context.record(first[0].to_record());
        context.push_result("3 users");
        assert!(proposer.propose("list users", &context).unwrap().is_empty());
    }

    // ── Registry and executor ────────────────────────────────────────────────

    #[test]
    fn test_registry_lookup_and_describe() {
        let mut registry = OperationRegistry::new();
        registry.register(FnOperation::new("get_roles", "List every role", |_| Ok(json!([]))));

        assert!(registry.contains("get_roles"));
        assert_eq!(registry.describe("get_roles"), "List every role");
        assert!(registry.describe("nope").contains("nope"));
        assert_eq!(registry.names(), vec!["get_roles".to_string()]);

        match registry.lookup("nope") {
            Err(GatehouseError::UnknownAction { name }) => assert_eq!(name, "nope"),
            other => panic!("expected UnknownAction, got {:?}", other.map(|op| op.name().to_string())),
        }
    }

    #[test]
    fn test_non_string_results_are_rendered_as_json() {
        assert_eq!(stringify_result(&json!("plain")), "plain");
        assert_eq!(stringify_result(&json!({"id": 1})), r#"{"id":1}"#);
        assert_eq!(stringify_result(&json!([1, 2])), "[1,2]");
    }

    #[test]
    fn test_executor_records_success_and_leaves_state_on_failure() {
        let mut registry = OperationRegistry::new();
        registry.register(FnOperation::new("ok", "succeeds", |args| {
            Ok(json!(format!("got {}", args.len())))
        }));
        registry.register(FnOperation::new("boom", "fails", |_| {
            Err(GatehouseError::OperationFailed {
                name: "boom".to_string(),
                reason: "down".to_string(),
            })
        }));
        let executor = ActionExecutor::new(registry, Box::new(PassVerifier));
        let mut state = WorkflowState::new("q", false);

        let ok = CandidateAction::new("ok", Default::default());
        assert_eq!(executor.execute(&mut state, &ok).unwrap(), "got 0");
        assert_eq!(state.tool_response, "ok: got 0");
        assert!(state.action_context.has_executed(&ok));

        let before = state.clone();
        let boom = CandidateAction::new("boom", Default::default());
        assert!(executor.execute(&mut state, &boom).is_err());
        assert_eq!(state.tool_response, before.tool_response);
        assert_eq!(state.action_context.already_executed.len(), 1);
        assert_eq!(state.action_context.previous_results, before.action_context.previous_results);
    }

    // ── Gate ─────────────────────────────────────────────────────────────────

    #[test]
    fn test_gate_requires_a_pending_suspension() {
        let gate = ApprovalGate::default();
        let registry = OperationRegistry::new();
        let thread_id = ThreadId::from("gate");
        let mut state = WorkflowState::new("q", false);

        assert!(matches!(
            gate.apply_decision(&thread_id, &mut state, true),
            Err(GatehouseError::NotAwaitingApproval { .. })
        ));

        state.pending_actions = vec![CandidateAction::new("x", Default::default())];
        let payload = gate.request_approval(&mut state, &registry);
        assert_eq!(payload.actions.len(), 1);
        assert!(state.is_awaiting_approval());

        gate.apply_decision(&thread_id, &mut state, true).unwrap();
        assert!(state.user_approved);
        assert!(!state.requires_approval);
        assert!(state.actions_to_review.is_none());
    }

    // ── Thread locks ─────────────────────────────────────────────────────────

    #[test]
    fn test_thread_lock_is_exclusive_and_released_on_drop() {
        let locks = ThreadLocks::new();
        let a = ThreadId::from("a");
        let b = ThreadId::from("b");

        let guard = locks.acquire(&a).unwrap();
        assert!(locks.is_held(&a));
        assert!(matches!(locks.acquire(&a), Err(GatehouseError::ResumeConflict { .. })));
        assert!(locks.acquire(&b).is_ok());

        drop(guard);
        assert!(!locks.is_held(&a));
        assert!(locks.acquire(&a).is_ok());
    }
}
