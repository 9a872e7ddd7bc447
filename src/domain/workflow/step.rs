//! Planned steps, execution records and step results

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::draft::DraftId;

/// The single next unit of work selected by the planner
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NextStep {
    /// Target agent name
    pub agent: String,

    /// Optional operation hint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,

    /// Structured parameters for the agent
    #[serde(default)]
    pub parameters: Map<String, Value>,

    /// Natural-language summary of the step for logging and composition
    pub description: String,
}

impl NextStep {
    pub fn new(agent: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            agent: agent.into(),
            operation: None,
            parameters: Map::new(),
            description: description.into(),
        }
    }

    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: Value) -> Self {
        self.parameters.insert(key.into(), value);
        self
    }

    pub fn with_parameters(mut self, parameters: Map<String, Value>) -> Self {
        self.parameters = parameters;
        self
    }
}

/// Lifecycle of a step record. Completed and Failed are terminal: a retry
/// is a new record, never a mutation of an old one.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Planned,
    Executing,
    Completed,
    Failed,
}

impl StepStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Normalized result of one executed step
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StepResult {
    pub success: bool,

    /// Machine-readable payload from the agent
    #[serde(default)]
    pub data: Value,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Natural-language summary used for response composition
    pub summary: String,
}

impl StepResult {
    pub fn success(summary: impl Into<String>, data: Value) -> Self {
        Self {
            success: true,
            data,
            error: None,
            summary: summary.into(),
        }
    }

    pub fn failure(summary: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: Value::Null,
            error: Some(error.into()),
            summary: summary.into(),
        }
    }

    /// Id of a draft the step created, if any
    pub fn draft_id(&self) -> Option<DraftId> {
        self.data
            .get("draft_id")
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}

/// One planned-and-executed unit in the workflow audit trail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    /// Position in the completed-steps sequence, starting at 1
    pub step_number: u32,

    pub agent: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,

    #[serde(default)]
    pub parameters: Map<String, Value>,

    pub description: String,

    pub status: StepStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<StepResult>,
}

impl StepRecord {
    /// Create a record for a freshly planned step
    pub fn planned(step_number: u32, step: &NextStep) -> Self {
        Self {
            step_number,
            agent: step.agent.clone(),
            operation: step.operation.clone(),
            parameters: step.parameters.clone(),
            description: step.description.clone(),
            status: StepStatus::Planned,
            result: None,
        }
    }

    pub fn mark_executing(&mut self) {
        self.status = StepStatus::Executing;
    }

    /// Attach the result and move to the matching terminal status
    pub fn finish(&mut self, result: StepResult) {
        self.status = if result.success {
            StepStatus::Completed
        } else {
            StepStatus::Failed
        };
        self.result = Some(result);
    }

    pub fn is_successful(&self) -> bool {
        self.status == StepStatus::Completed
    }
}
