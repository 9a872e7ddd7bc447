//! Workflow execution context
//!
//! The mutable state threaded through one user request's planning loop.
//! Steps are strictly sequential within a workflow, so the context has a
//! single writer at any time; `completed_steps` is an append-only audit
//! trail and `gathered_data` is a last-write-wins accumulator whose keys
//! only the planner and reevaluator interpret.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::plan::Plan;
use super::step::{StepRecord, StepResult};
use crate::domain::conversation::ConversationTurn;

/// Default hard cap on planning iterations
pub const DEFAULT_MAX_STEPS: u32 = 10;

/// Immutable per-request identity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserContext {
    pub session_id: String,
    pub user_id: String,
}

impl UserContext {
    pub fn new(session_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            user_id: user_id.into(),
        }
    }
}

/// Mutable state for one user request's processing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowContext {
    /// The user's raw input, immutable
    original_request: String,

    user: UserContext,

    /// Recent conversation turns supplied by the context gatherer
    #[serde(default)]
    conversation: Vec<ConversationTurn>,

    /// Number of steps executed so far
    current_step: u32,

    /// Hard iteration cap
    max_steps: u32,

    /// Append-only audit trail, ordered by execution
    completed_steps: Vec<StepRecord>,

    /// Free-form accumulator; later writes to a key overwrite earlier ones
    gathered_data: HashMap<String, Value>,

    /// Advisory plan of remaining work, replaceable at any time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    plan: Option<Plan>,
}

impl WorkflowContext {
    pub fn new(original_request: impl Into<String>, user: UserContext) -> Self {
        Self {
            original_request: original_request.into(),
            user,
            conversation: Vec::new(),
            current_step: 0,
            max_steps: DEFAULT_MAX_STEPS,
            completed_steps: Vec::new(),
            gathered_data: HashMap::new(),
            plan: None,
        }
    }

    // Builder methods

    pub fn with_max_steps(mut self, max_steps: u32) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn with_conversation(mut self, turns: Vec<ConversationTurn>) -> Self {
        self.conversation = turns;
        self
    }

    // Getters

    pub fn original_request(&self) -> &str {
        &self.original_request
    }

    pub fn user(&self) -> &UserContext {
        &self.user
    }

    pub fn conversation(&self) -> &[ConversationTurn] {
        &self.conversation
    }

    pub fn current_step(&self) -> u32 {
        self.current_step
    }

    pub fn max_steps(&self) -> u32 {
        self.max_steps
    }

    pub fn completed_steps(&self) -> &[StepRecord] {
        &self.completed_steps
    }

    pub fn gathered_data(&self) -> &HashMap<String, Value> {
        &self.gathered_data
    }

    pub fn plan(&self) -> Option<&Plan> {
        self.plan.as_ref()
    }

    /// Whether the step budget is spent
    pub fn budget_exhausted(&self) -> bool {
        self.current_step >= self.max_steps
    }

    /// The step number the next executed step will carry
    pub fn next_step_number(&self) -> u32 {
        self.current_step + 1
    }

    /// Result of the most recently executed step
    pub fn latest_result(&self) -> Option<&StepResult> {
        self.completed_steps.last().and_then(|r| r.result.as_ref())
    }

    /// Append a finished step record and advance the step counter.
    /// This is the only way history grows; records are never reordered
    /// or mutated afterwards.
    pub fn record_step(&mut self, record: StepRecord) {
        debug_assert!(record.status.is_terminal());
        self.current_step += 1;
        self.completed_steps.push(record);
    }

    /// Write a value into the accumulator (last-write-wins)
    pub fn insert_data(&mut self, key: impl Into<String>, value: Value) {
        self.gathered_data.insert(key.into(), value);
    }

    pub fn data(&self, key: &str) -> Option<&Value> {
        self.gathered_data.get(key)
    }

    /// Replace the advisory plan
    pub fn set_plan(&mut self, plan: Plan) {
        self.plan = Some(plan);
    }

    /// Drop the advisory plan
    pub fn clear_plan(&mut self) {
        self.plan = None;
    }

    /// Mutable access to the advisory plan
    pub fn plan_mut(&mut self) -> Option<&mut Plan> {
        self.plan.as_mut()
    }
}
