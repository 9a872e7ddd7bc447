//! Agent registry infrastructure

mod registry;

pub use registry::AgentRegistry;
