//! Sub-agent contract and capability descriptors

mod agent;
mod descriptor;

pub use agent::{AgentContext, AgentRequest, AgentResponse, DraftProposal, SubAgent};
pub use descriptor::{AgentDescriptor, OperationDescriptor};

#[cfg(test)]
pub use agent::mock::MockAgent;
