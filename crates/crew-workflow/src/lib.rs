//! Workflow assembly and execution for decisioncrew
//!
//! This crate turns a pair of YAML documents into a running pipeline of
//! role agents:
//!
//! - [`loader`]: locate and read `agents.yaml` / `tasks.yaml`
//! - [`definition`]: typed agent and task declarations
//! - [`template`]: `{placeholder}` rendering of task instructions
//! - [`graph`]: context resolution, cycle check and execution order
//! - [`executor`]: sequential execution and the final result policy
//! - [`workflow`] and [`crews`]: the assembled workflow and its two facades

pub mod crews;
pub mod definition;
pub mod executor;
pub mod graph;
pub mod loader;
pub mod template;
pub mod workflow;

// Re-export for convenience
pub use crews::{IntelligenceCrew, WargamesCrew, intelligence_tools, wargames_tools};
pub use definition::{AgentDefinition, FieldValidation, TaskDefinition};
pub use executor::{ResultPolicy, SequentialExecutor, TaskOutput, WorkflowRun};
pub use graph::{RuntimeTask, TaskGraph};
pub use loader::{ConfigLoader, WorkflowConfig};
pub use workflow::{Workflow, WorkflowBuilder, WorkflowOptions};
