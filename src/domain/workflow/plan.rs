//! Advisory plans
//!
//! A plan is a forecast of remaining work, not a commitment: the
//! reevaluator may replace, truncate or extend it after any step.

use serde::{Deserialize, Serialize};

/// One intended future step, described loosely enough for the planner to
/// refine it when its turn comes
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlannedStep {
    /// Intended target agent
    pub agent: String,

    /// What the step should accomplish
    pub description: String,
}

impl PlannedStep {
    pub fn new(agent: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            agent: agent.into(),
            description: description.into(),
        }
    }
}

/// Ordered advisory list of intended future steps
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Plan {
    steps: Vec<PlannedStep>,
}

impl Plan {
    pub fn new(steps: Vec<PlannedStep>) -> Self {
        Self { steps }
    }

    pub fn with_step(mut self, step: PlannedStep) -> Self {
        self.steps.push(step);
        self
    }

    pub fn steps(&self) -> &[PlannedStep] {
        &self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Next intended step without consuming it
    pub fn peek(&self) -> Option<&PlannedStep> {
        self.steps.first()
    }

    /// Consume and return the next intended step
    pub fn advance(&mut self) -> Option<PlannedStep> {
        if self.steps.is_empty() {
            None
        } else {
            Some(self.steps.remove(0))
        }
    }

    /// Drop all remaining steps
    pub fn truncate(&mut self) {
        self.steps.clear();
    }
}
