//! Tool management for decisioncrew
//!
//! Tools are the external capabilities (web search, page lookup, ...) an agent
//! may invoke through the model. Workflows reference them by symbolic name;
//! a [`ToolRegistry`] maps those names to implementations.

pub mod registry;
pub mod tool;

#[cfg(feature = "web")]
pub mod web;

pub use registry::{ToolRegistry, ToolRegistryBuilder};
pub use tool::{Tool, required_str};

#[cfg(feature = "web")]
pub use web::{SerperSearchTool, WebsiteSearchTool};
