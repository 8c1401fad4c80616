//! Concrete agent implementations
//!
//! - RoleAgent: role-scoped agent that runs the LLM tool loop for each assignment

pub mod role;

pub use role::{AgentProfile, RoleAgent};
