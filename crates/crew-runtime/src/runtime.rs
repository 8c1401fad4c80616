//! Runtime for building agents with dependency injection
//!
//! The AgentRuntime holds the completion client shared by every agent of a
//! workflow and turns agent profiles into ready-to-run [`RoleAgent`]s.

use crew_core::{Error, Result};
use crew_llm::LLMProvider;
use crew_tools::ToolRegistry;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::agents::{AgentProfile, RoleAgent};
use crate::executor::{AgentExecutor, ExecutorConfig};

/// Configuration for the agent runtime
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Model every agent talks to
    pub model: String,

    /// Maximum tool-loop iterations per task
    pub max_iterations: usize,

    /// Max tokens per completion
    pub max_tokens: usize,

    /// Sampling temperature
    pub temperature: Option<f32>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        let executor = ExecutorConfig::default();
        Self {
            model: executor.model,
            max_iterations: executor.max_iterations,
            max_tokens: executor.max_tokens,
            temperature: executor.temperature,
        }
    }
}

/// Runtime for building agents with dependency injection
///
/// # Example
///
/// ```no_run
/// use crew_runtime::{AgentProfile, AgentRuntime};
/// use crew_tools::ToolRegistry;
///
/// # fn example(provider: std::sync::Arc<dyn crew_llm::LLMProvider>) -> crew_core::Result<()> {
/// let runtime = AgentRuntime::builder().provider(provider).model("gpt-4o").build()?;
///
/// let profile = AgentProfile::new("Analyst", "Find signals", "Ten years in OSINT")
///     .with_tools(["serper_dev_tool"]);
/// let agent = runtime.build_agent("analyst", &profile, &ToolRegistry::new())?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct AgentRuntime {
    provider: Arc<dyn LLMProvider>,
    config: RuntimeConfig,
}

impl AgentRuntime {
    /// Create a new agent runtime
    pub fn new(provider: Arc<dyn LLMProvider>, config: RuntimeConfig) -> Self {
        Self { provider, config }
    }

    /// Create a new runtime builder
    pub fn builder() -> AgentRuntimeBuilder {
        AgentRuntimeBuilder::new()
    }

    /// Get a reference to the LLM provider
    pub fn provider(&self) -> &Arc<dyn LLMProvider> {
        &self.provider
    }

    /// Get a reference to the runtime configuration
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Build a role agent from its profile
    ///
    /// Declared tools are looked up one at a time in `registry`; names the
    /// registry does not know are skipped with a warning. The agent gets its
    /// own registry holding only the tools that resolved.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Build`] if the role is blank or the completion
    /// client rejects one of the resolved tool definitions.
    pub fn build_agent(
        &self,
        name: &str,
        profile: &AgentProfile,
        registry: &ToolRegistry,
    ) -> Result<RoleAgent> {
        if profile.role.trim().is_empty() {
            return Err(Error::Build(format!("agent '{name}' has a blank role")));
        }

        let tools: ToolRegistry = profile
            .tools
            .iter()
            .filter_map(|tool| {
                let found = registry.get(tool);
                if found.is_none() {
                    warn!(agent = %name, tool = %tool, "Unknown tool, skipping");
                }
                found
            })
            .collect();

        let executor = AgentExecutor::builder()
            .provider(self.provider.clone())
            .tools(tools)
            .config(ExecutorConfig {
                max_iterations: self.config.max_iterations,
                model: self.config.model.clone(),
                system_prompt: Some(profile.system_prompt()),
                max_tokens: self.config.max_tokens,
                temperature: self.config.temperature,
            })
            .build()?;

        self.provider
            .validate_tools(&executor.tool_definitions())
            .map_err(|e| Error::Build(format!("agent '{name}': {e}")))?;

        debug!(agent = %name, role = %profile.role, tools = ?executor.tools().names(), "Agent built");
        Ok(RoleAgent::new(name, profile.clone(), executor))
    }
}

/// Builder for AgentRuntime
pub struct AgentRuntimeBuilder {
    provider: Option<Arc<dyn LLMProvider>>,
    config: RuntimeConfig,
}

impl AgentRuntimeBuilder {
    /// Create a new runtime builder
    pub fn new() -> Self {
        Self {
            provider: None,
            config: RuntimeConfig::default(),
        }
    }

    /// Set the LLM provider
    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Set the runtime configuration
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the model
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    /// Set the max iterations
    pub fn max_iterations(mut self, max: usize) -> Self {
        self.config.max_iterations = max;
        self
    }

    /// Build the runtime
    ///
    /// # Errors
    ///
    /// Returns an error if the provider is not set
    pub fn build(self) -> Result<AgentRuntime> {
        let provider = self
            .provider
            .ok_or_else(|| Error::Build("runtime has no LLM provider".to_string()))?;

        Ok(AgentRuntime::new(provider, self.config))
    }
}

impl Default for AgentRuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use crew_core::ErrorKind;
    use crew_llm::MockProvider;
    use crew_tools::Tool;
    use serde_json::{Value, json};
    use tracing_test::traced_test;

    struct NamedTool(&'static str);

    #[async_trait]
    impl Tool for NamedTool {
        async fn execute(&self, _params: Value) -> Result<String> {
            Ok(String::new())
        }

        fn name(&self) -> &str {
            self.0
        }

        fn description(&self) -> &str {
            "test tool"
        }

        fn input_schema(&self) -> Value {
            json!({"type": "object", "properties": {}})
        }
    }

    fn runtime() -> AgentRuntime {
        AgentRuntime::builder()
            .provider(Arc::new(MockProvider::new()))
            .model("test-model")
            .build()
            .unwrap()
    }

    fn registry() -> ToolRegistry {
        ToolRegistry::builder()
            .register(Arc::new(NamedTool("serper_dev_tool")))
            .register(Arc::new(NamedTool("website_search_tool")))
            .build()
    }

    #[test]
    fn test_runtime_config_default() {
        let config = RuntimeConfig::default();
        assert_eq!(config.max_iterations, 10);
        assert_eq!(config.model, "gpt-4o");
    }

    #[traced_test]
    #[test]
    fn test_unknown_tools_are_dropped() {
        let profile = AgentProfile::new("Analyst", "Goal", "Story")
            .with_tools(["serper_dev_tool", "db_query_tool"]);
        let agent = runtime().build_agent("analyst", &profile, &registry()).unwrap();

        assert_eq!(agent.tool_names(), vec!["serper_dev_tool"]);
        assert_eq!(agent.executor().config().model, "test-model");
        assert!(logs_contain("Unknown tool"));
        assert!(logs_contain("db_query_tool"));
    }

    #[test]
    fn test_blank_role_is_build_error() {
        let profile = AgentProfile::new("  ", "Goal", "Story");
        let err = runtime().build_agent("analyst", &profile, &registry()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Build);
    }

    #[test]
    fn test_rejected_tool_definition_is_build_error() {
        let bad = ToolRegistry::builder()
            .register(Arc::new(NamedTool("bad tool name")))
            .build();
        let profile = AgentProfile::new("Analyst", "Goal", "Story").with_tools(["bad tool name"]);

        let err = runtime().build_agent("analyst", &profile, &bad).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Build);
        assert!(err.to_string().contains("analyst"));
    }

    #[test]
    fn test_builder_requires_provider() {
        assert!(AgentRuntime::builder().build().is_err());
    }
}
