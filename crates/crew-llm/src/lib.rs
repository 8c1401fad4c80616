//! Model-completion layer for decisioncrew
//!
//! This crate is the seam between the workflow engine and a language model.
//! It includes:
//!
//! - Message types for a conversation with the model
//! - Completion request/response types
//! - Tool definitions for function calling, with schema validation
//! - The [`LLMProvider`] trait every completion client implements
//! - A scripted [`MockProvider`] for deterministic tests
//! - An OpenAI-compatible client (behind the `openai` feature)

pub mod completion;
pub mod error;
pub mod messages;
pub mod mock;
pub mod provider;
pub mod tools;

// Re-export main types
pub use completion::{CompletionRequest, CompletionResponse, StopReason, TokenUsage};
pub use error::{LLMError, Result};
pub use messages::{ContentBlock, Message, MessageContent, Role};
pub use mock::{MockProvider, MockResponse};
pub use provider::LLMProvider;
pub use tools::ToolDefinition;

// Provider implementations (feature-gated)
#[cfg(feature = "openai")]
pub mod providers;
