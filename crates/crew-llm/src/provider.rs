//! LLM provider trait definition

use crate::{CompletionRequest, CompletionResponse, Result, ToolDefinition};
use async_trait::async_trait;

/// Trait for LLM providers
///
/// A provider is the model-completion capability shared by every agent of a
/// workflow. It is created once and handed around as `Arc<dyn LLMProvider>`.
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Generate a completion from the LLM
    ///
    /// # Arguments
    ///
    /// * `request` - The completion request with messages, tools, and parameters
    ///
    /// # Returns
    ///
    /// The completion response with the assistant's message and metadata
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;

    /// Get the provider name (e.g., "openai", "mock")
    fn name(&self) -> &str;

    /// Check that a set of tools can be offered to this provider
    ///
    /// Called once per agent while the workflow is being assembled, so a bad
    /// capability schema fails the build instead of the first request.
    fn validate_tools(&self, tools: &[ToolDefinition]) -> Result<()> {
        tools.iter().try_for_each(ToolDefinition::validate)
    }
}
