//! Agent runtime for executing role agents with dependency injection
//!
//! This crate provides the runtime infrastructure for executing agents:
//! the AgentExecutor for the LLM tool loop, the AgentRuntime that builds
//! agents around a shared completion client, and the RoleAgent itself.

pub mod agents;
pub mod executor;
pub mod runtime;

// Re-export key types
pub use agents::{AgentProfile, RoleAgent};
pub use executor::{AgentExecutor, AgentExecutorBuilder, ExecutorConfig, ExecutorOutcome};
pub use runtime::{AgentRuntime, AgentRuntimeBuilder, RuntimeConfig};
