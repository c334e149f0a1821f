//! The Gatehouse workflow engine: the approval-gated action state machine.
//!
//! The engine runs one workflow per thread id through these states:
//!
//!   Start → IdentifyActions | ChainedIdentifyActions → ApprovalGate
//!         → ExecuteApproved | UserRejected → [ChainedIdentifyActions] → Terminal
//!
//! Every state-function returns a `StepResult`. `Continue` hands control to
//! the transition function (`route`); `Suspend` checkpoints the state and
//! returns to the caller; `Terminal` sets the final response, checkpoints,
//! and returns. A suspended workflow is picked up again by `resume`, possibly
//! on another engine instance sharing the same checkpoint store.
//!
//! Operations are never invoked twice with the same normalized arguments
//! within one workflow: candidates are filtered against the executed set
//! before approval, and re-checked immediately before invocation.

use tracing::{debug, info, info_span, warn};

use gatehouse_contracts::{
    action::ActionRecord,
    error::{GatehouseError, GatehouseResult},
    event::{StepEvent, StepStatus},
    sentinel::{self, ALREADY_COMPLETED, CANCELLED_BY_USER, EXECUTION_FAILED, NO_RELEVANT_INFORMATION, PROPOSAL_FAILED},
    workflow::{ReviewPayload, ThreadId, WorkflowState},
};

use crate::{
    executor::ActionExecutor,
    gate::{ApprovalDecision, ApprovalGate, DEFAULT_APPROVAL_QUESTION},
    lock::ThreadLocks,
    traits::{ActionProposer, CheckpointStore, EventSink},
};

/// Chained cycles allowed before the circuit breaker ends the workflow.
pub const DEFAULT_MAX_CHAIN_ITERATIONS: u32 = 5;

/// Tunables for one engine instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Upper bound on chained identify cycles.
    pub max_chain_iterations: u32,
    /// Question placed at the top of every review payload.
    pub approval_question: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_chain_iterations: DEFAULT_MAX_CHAIN_ITERATIONS,
            approval_question: DEFAULT_APPROVAL_QUESTION.to_string(),
        }
    }
}

/// The state-functions of the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Node {
    IdentifyActions,
    ChainedIdentifyActions,
    ExecuteApproved,
    UserRejected,
}

impl Node {
    pub fn name(self) -> &'static str {
        match self {
            Self::IdentifyActions => "identify_actions",
            Self::ChainedIdentifyActions => "chained_identify_actions",
            Self::ExecuteApproved => "execute_approved",
            Self::UserRejected => "user_rejected",
        }
    }
}

/// What a state-function asks the driver to do next.
///
/// The state itself is mutated in place, so `Continue` carries no payload.
#[derive(Debug, Clone, PartialEq)]
pub enum StepResult {
    /// Consult the transition function.
    Continue,
    /// Checkpoint and surface the payload to the approver.
    Suspend(ReviewPayload),
    /// Finish with this response.
    Terminal(String),
}

/// Output of the transition function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// `final_response` is set.
    Terminal,
    /// Single-shot, nothing pending, and a cycle already ran.
    Exhausted,
    Next(Node),
}

/// The transition function, evaluated after every continuing step.
pub fn route(state: &WorkflowState) -> Transition {
    if state.final_response.is_some() {
        Transition::Terminal
    } else if !state.chained && state.pending_actions.is_empty() && state.iteration_count > 0 {
        Transition::Exhausted
    } else if state.chained {
        Transition::Next(Node::ChainedIdentifyActions)
    } else {
        Transition::Next(Node::IdentifyActions)
    }
}

/// Drives approval-gated workflows.
///
/// Construct one engine per process with all collaborators injected; it is
/// `Send + Sync` and can serve many thread ids concurrently.
pub struct WorkflowEngine {
    proposer: Box<dyn ActionProposer>,
    executor: ActionExecutor,
    store: Box<dyn CheckpointStore>,
    sink: Box<dyn EventSink>,
    gate: ApprovalGate,
    config: EngineConfig,
    locks: ThreadLocks,
}

impl WorkflowEngine {
    pub fn new(
        proposer: Box<dyn ActionProposer>,
        executor: ActionExecutor,
        store: Box<dyn CheckpointStore>,
        sink: Box<dyn EventSink>,
        config: EngineConfig,
    ) -> Self {
        let gate = ApprovalGate::new(config.approval_question.clone());
        Self {
            proposer,
            executor,
            store,
            sink,
            gate,
            config,
            locks: ThreadLocks::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Start a workflow for `query` under `thread_id`.
    ///
    /// Runs until the first suspension or the terminal response and returns
    /// the last emitted event. Submitting again with the same thread id,
    /// query and mode does not start over: a suspended workflow re-surfaces
    /// its review payload, a finished one returns its terminal event.
    ///
    /// # Errors
    ///
    /// `StateMachineError` if the thread id already belongs to a different
    /// query or mode; `ResumeConflict` if another entry for the thread is
    /// running, here or in another process sharing the store; checkpoint and
    /// event delivery failures.
    pub fn submit(&self, thread_id: &ThreadId, query: &str, chained: bool) -> GatehouseResult<StepEvent> {
        let span = info_span!("workflow", thread_id = %thread_id);
        let _enter = span.enter();
        let _guard = self.locks.acquire(thread_id)?;
        let _claim = self.store.claim(thread_id)?;

        if let Some(existing) = self.store.try_load(thread_id)? {
            if existing.query != query {
                return Err(GatehouseError::StateMachineError {
                    reason: format!("thread '{thread_id}' already holds a different request"),
                });
            }
            if existing.chained != chained {
                return Err(GatehouseError::StateMachineError {
                    reason: format!(
                        "thread '{thread_id}' was started with chained = {}",
                        existing.chained
                    ),
                });
            }
            info!(thread_id = %thread_id, "request already known, continuing from checkpoint");
            return self.continue_from(thread_id, existing);
        }

        info!(thread_id = %thread_id, chained, "workflow started");
        let state = WorkflowState::new(query, chained);
        self.store.save(thread_id, &state)?;

        let node = if chained {
            Node::ChainedIdentifyActions
        } else {
            Node::IdentifyActions
        };
        self.drive(thread_id, state, node)
    }

    /// Deliver the approver's decision for a suspended workflow.
    ///
    /// Resuming a workflow that already finished returns its terminal event
    /// again without executing anything.
    ///
    /// # Errors
    ///
    /// `CheckpointNotFound` for unknown thread ids, `NotAwaitingApproval`
    /// when the workflow is not suspended at the gate, `ResumeConflict` when
    /// another resume of the same thread is in flight.
    pub fn resume(&self, thread_id: &ThreadId, approve: bool) -> GatehouseResult<StepEvent> {
        let span = info_span!("workflow", thread_id = %thread_id);
        let _enter = span.enter();
        let _guard = self.locks.acquire(thread_id)?;
        let _claim = self.store.claim(thread_id)?;

        let mut state = self.store.load(thread_id)?;
        if state.is_finished() {
            info!(thread_id = %thread_id, "workflow already finished, replaying terminal event");
            return self.replay(thread_id, &state);
        }

        self.gate.apply_decision(thread_id, &mut state, approve)?;
        self.store.save(thread_id, &state)?;

        let node = if approve {
            Node::ExecuteApproved
        } else {
            Node::UserRejected
        };
        self.drive(thread_id, state, node)
    }

    /// `resume` driven by a decision value from the transport adapter.
    pub fn decide(&self, decision: &ApprovalDecision) -> GatehouseResult<StepEvent> {
        self.resume(&decision.thread_id, decision.approve)
    }

    /// Continue a workflow from whatever its checkpoint says, e.g. after a
    /// crash between a resume and the end of its execution.
    pub fn recover(&self, thread_id: &ThreadId) -> GatehouseResult<StepEvent> {
        let span = info_span!("workflow", thread_id = %thread_id);
        let _enter = span.enter();
        let _guard = self.locks.acquire(thread_id)?;
        let _claim = self.store.claim(thread_id)?;

        let state = self.store.load(thread_id)?;
        self.continue_from(thread_id, state)
    }

    /// Current checkpointed state of a workflow.
    pub fn state(&self, thread_id: &ThreadId) -> GatehouseResult<WorkflowState> {
        self.store.load(thread_id)
    }

    // ── Driver ───────────────────────────────────────────────────────────────

    fn continue_from(&self, thread_id: &ThreadId, mut state: WorkflowState) -> GatehouseResult<StepEvent> {
        if state.is_finished() || state.is_awaiting_approval() {
            return self.replay(thread_id, &state);
        }

        // Pending actions with the gate already resolved: the decision was
        // consumed but its step never completed.
        if !state.pending_actions.is_empty() {
            let node = if state.user_approved {
                Node::ExecuteApproved
            } else {
                Node::UserRejected
            };
            warn!(thread_id = %thread_id, step = node.name(), "recovering interrupted step");
            return self.drive(thread_id, state, node);
        }

        match route(&state) {
            Transition::Next(node) => self.drive(thread_id, state, node),
            Transition::Terminal => self.terminate(thread_id, &state, "recover"),
            Transition::Exhausted => {
                state.finish(NO_RELEVANT_INFORMATION);
                self.terminate(thread_id, &state, "recover")
            }
        }
    }

    fn drive(&self, thread_id: &ThreadId, mut state: WorkflowState, mut node: Node) -> GatehouseResult<StepEvent> {
        loop {
            debug!(
                thread_id = %thread_id,
                step = node.name(),
                iteration = state.iteration_count,
                "running state function"
            );

            let result = match node {
                Node::IdentifyActions => self.identify_actions(&mut state),
                Node::ChainedIdentifyActions => self.chained_identify_actions(&mut state),
                Node::ExecuteApproved => self.execute_approved(thread_id, &mut state)?,
                Node::UserRejected => self.user_rejected(&mut state),
            };

            match result {
                StepResult::Continue => {
                    let event = StepEvent::from_state(thread_id, node.name(), StepStatus::InProgress, &state);
                    self.sink.emit(&event)?;

                    match route(&state) {
                        Transition::Next(next) => node = next,
                        Transition::Terminal => return self.terminate(thread_id, &state, node.name()),
                        Transition::Exhausted => {
                            state.finish(NO_RELEVANT_INFORMATION);
                            return self.terminate(thread_id, &state, node.name());
                        }
                    }
                }
                StepResult::Suspend(payload) => return self.suspend(thread_id, &state, node, &payload),
                StepResult::Terminal(response) => {
                    state.finish(response);
                    return self.terminate(thread_id, &state, node.name());
                }
            }
        }
    }

    fn suspend(
        &self,
        thread_id: &ThreadId,
        state: &WorkflowState,
        node: Node,
        payload: &ReviewPayload,
    ) -> GatehouseResult<StepEvent> {
        // The checkpoint must exist before anyone can observe the suspension.
        self.store.save(thread_id, state)?;

        info!(
            thread_id = %thread_id,
            step = node.name(),
            actions = payload.actions.len(),
            iteration = state.iteration_count,
            "workflow suspended awaiting approval"
        );

        let event = StepEvent::from_state(thread_id, node.name(), StepStatus::AwaitingApproval, state);
        self.sink.emit(&event)?;
        Ok(event)
    }

    fn terminate(&self, thread_id: &ThreadId, state: &WorkflowState, step: &str) -> GatehouseResult<StepEvent> {
        let response = state.final_response.clone().unwrap_or_default();
        let status = sentinel::status_for(&response);

        self.store.save(thread_id, state)?;

        info!(
            thread_id = %thread_id,
            step,
            status = ?status,
            executed = state.action_context.already_executed.len(),
            "workflow finished"
        );

        let event = StepEvent::from_state(thread_id, step, status, state);
        self.sink.emit(&event)?;
        Ok(event)
    }

    fn replay(&self, thread_id: &ThreadId, state: &WorkflowState) -> GatehouseResult<StepEvent> {
        let status = match &state.final_response {
            Some(response) => sentinel::status_for(response),
            None => StepStatus::AwaitingApproval,
        };
        let event = StepEvent::from_state(thread_id, "replay", status, state);
        self.sink.emit(&event)?;
        Ok(event)
    }

    // ── State functions ──────────────────────────────────────────────────────

    fn identify_actions(&self, state: &mut WorkflowState) -> StepResult {
        state.iteration_count += 1;

        let candidates = match self.proposer.propose(&state.query, &state.action_context) {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!(error = %e, "action proposal failed");
                return StepResult::Terminal(PROPOSAL_FAILED.to_string());
            }
        };

        if candidates.is_empty() {
            info!("proposer returned no actions");
            state.requires_approval = false;
            return StepResult::Terminal(NO_RELEVANT_INFORMATION.to_string());
        }

        let proposed = candidates.len();
        let mut seen: Vec<ActionRecord> = Vec::new();
        let mut fresh = Vec::new();
        for candidate in candidates {
            let record = candidate.to_record();
            if state.action_context.contains(&record) || seen.iter().any(|s| s.is_duplicate_of(&record)) {
                debug!(action = %candidate.name, "dropping duplicate candidate");
                continue;
            }
            seen.push(record);
            fresh.push(candidate);
        }

        if fresh.is_empty() {
            info!(proposed, "every proposed action was already executed");
            return StepResult::Terminal(ALREADY_COMPLETED.to_string());
        }

        debug!(proposed, kept = fresh.len(), "candidates identified");
        state.pending_actions = fresh;
        StepResult::Suspend(self.gate.request_approval(state, self.executor.registry()))
    }

    fn chained_identify_actions(&self, state: &mut WorkflowState) -> StepResult {
        state.iteration_count += 1;

        if state.iteration_count > self.config.max_chain_iterations {
            warn!(
                iteration = state.iteration_count,
                max = self.config.max_chain_iterations,
                "chain iteration limit reached"
            );
            return StepResult::Terminal(state.accumulated_or(NO_RELEVANT_INFORMATION));
        }

        let candidates = match self.proposer.propose(&state.query, &state.action_context) {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!(error = %e, iteration = state.iteration_count, "action proposal failed");
                return StepResult::Terminal(PROPOSAL_FAILED.to_string());
            }
        };

        // One action per cycle: the next proposal must see this one's result.
        let Some(candidate) = candidates.into_iter().next() else {
            info!(iteration = state.iteration_count, "proposer has nothing further to do");
            return StepResult::Terminal(state.accumulated_or(NO_RELEVANT_INFORMATION));
        };

        if state.action_context.has_executed(&candidate) {
            info!(
                action = %candidate.name,
                iteration = state.iteration_count,
                "proposer repeated an executed action, ending chain"
            );
            return StepResult::Terminal(state.accumulated_or(NO_RELEVANT_INFORMATION));
        }

        state.pending_actions = vec![candidate];
        StepResult::Suspend(self.gate.request_approval(state, self.executor.registry()))
    }

    fn execute_approved(&self, thread_id: &ThreadId, state: &mut WorkflowState) -> GatehouseResult<StepResult> {
        if !state.user_approved {
            state.requires_approval = false;
            state.pending_actions.clear();
            return Ok(StepResult::Terminal(CANCELLED_BY_USER.to_string()));
        }

        let batch = state.pending_actions.clone();
        for action in &batch {
            if state.action_context.has_executed(action) {
                warn!(action = %action.name, "action already executed, not invoking again");
                continue;
            }

            match self.executor.execute(state, action) {
                // Checkpoint after each side effect so a crash mid-batch
                // cannot lead to the same action running twice.
                Ok(_) => self.store.save(thread_id, state)?,
                Err(e) => {
                    warn!(action = %action.name, error = %e, "action failed, abandoning batch");
                    state.pending_actions.clear();
                    state.clear_approval();
                    return Ok(StepResult::Terminal(EXECUTION_FAILED.to_string()));
                }
            }
        }

        state.pending_actions.clear();
        state.clear_approval();

        if state.chained {
            Ok(StepResult::Continue)
        } else {
            Ok(StepResult::Terminal(state.accumulated_or(NO_RELEVANT_INFORMATION)))
        }
    }

    fn user_rejected(&self, state: &mut WorkflowState) -> StepResult {
        info!(actions = state.pending_actions.len(), "proposed actions rejected");
        state.pending_actions.clear();
        state.clear_approval();
        StepResult::Terminal(CANCELLED_BY_USER.to_string())
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
