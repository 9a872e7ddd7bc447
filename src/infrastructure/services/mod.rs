//! Infrastructure services

mod orchestrator;

pub use orchestrator::{OrchestrationOutcome, Orchestrator};
