//! Agent executor for running agent loops
//!
//! The AgentExecutor implements the core agent loop pattern:
//! 1. Call LLM with conversation history and the agent's tools
//! 2. Check stop reason
//! 3. If tool use requested, execute tools and loop back
//! 4. If completed, return final response

use crew_core::{Error, Result};
use crew_llm::{
    CompletionRequest, ContentBlock, LLMProvider, Message, StopReason, TokenUsage, ToolDefinition,
};
use crew_tools::ToolRegistry;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Configuration for agent execution
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Maximum number of iterations (prevents infinite loops)
    pub max_iterations: usize,

    /// Model to use
    pub model: String,

    /// System prompt
    pub system_prompt: Option<String>,

    /// Max tokens per completion
    pub max_tokens: usize,

    /// Temperature
    pub temperature: Option<f32>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            model: "gpt-4o".to_string(),
            system_prompt: None,
            max_tokens: 4096,
            temperature: Some(0.7),
        }
    }
}

/// Final answer of one executor run
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutorOutcome {
    /// Text the model finished with
    pub text: String,
    /// Number of completions requested
    pub iterations: usize,
    /// Tokens used across all completions
    pub usage: TokenUsage,
}

/// Executes an agent loop: LLM → tool calls → execution → loop back
///
/// The executor owns the agent's own tool set, so the model is only ever
/// offered the tools that agent was configured with.
pub struct AgentExecutor {
    provider: Arc<dyn LLMProvider>,
    tools: ToolRegistry,
    config: ExecutorConfig,
}

impl AgentExecutor {
    /// Create a new agent executor
    pub fn new(provider: Arc<dyn LLMProvider>, tools: ToolRegistry, config: ExecutorConfig) -> Self {
        Self {
            provider,
            tools,
            config,
        }
    }

    /// Create a builder
    pub fn builder() -> AgentExecutorBuilder {
        AgentExecutorBuilder::new()
    }

    /// The executor configuration
    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Tools offered to the model
    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Tool definitions advertised to the model, sorted by name
    pub fn tool_definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .list_tools()
            .iter()
            .map(|tool| ToolDefinition::new(tool.name(), tool.description(), tool.input_schema()))
            .collect()
    }

    /// Execute the agent loop with a user message and return the final text
    pub async fn run(&self, user_message: impl Into<String>) -> Result<String> {
        self.run_detailed(user_message).await.map(|outcome| outcome.text)
    }

    /// Execute the agent loop and report iterations and token usage
    pub async fn run_detailed(&self, user_message: impl Into<String>) -> Result<ExecutorOutcome> {
        let mut conversation = vec![Message::user(user_message)];
        let tools = self.tool_definitions();
        let mut usage = TokenUsage::default();

        for iteration in 1..=self.config.max_iterations {
            debug!(
                iteration,
                max_iterations = self.config.max_iterations,
                tool_count = tools.len(),
                "Agent iteration started"
            );

            let mut builder = CompletionRequest::builder(&self.config.model)
                .messages(conversation.clone())
                .max_tokens(self.config.max_tokens)
                .tools(tools.clone());
            if let Some(system) = &self.config.system_prompt {
                builder = builder.system(system.clone());
            }
            if let Some(temperature) = self.config.temperature {
                builder = builder.temperature(temperature);
            }

            let response = self.provider.complete(builder.build()).await?;
            usage += response.usage;

            debug!(
                stop_reason = ?response.stop_reason,
                input_tokens = response.usage.input_tokens,
                output_tokens = response.usage.output_tokens,
                "LLM response received"
            );

            conversation.push(response.message.clone());

            match response.stop_reason {
                StopReason::EndTurn | StopReason::StopSequence => {
                    let text = response.message.text().unwrap_or_default().to_string();
                    info!(
                        iterations = iteration,
                        response_length = text.len(),
                        total_tokens = usage.total(),
                        "Agent completed"
                    );
                    return Ok(ExecutorOutcome {
                        text,
                        iterations: iteration,
                        usage,
                    });
                }

                StopReason::ToolUse => {
                    let tool_results = self.execute_tools(&response.message).await;
                    if tool_results.is_empty() {
                        return Err(Error::Processing(
                            "model requested tool use without naming a tool".to_string(),
                        ));
                    }
                    conversation.extend(tool_results);
                }

                StopReason::MaxTokens => {
                    warn!(max_tokens = self.config.max_tokens, "Hit max tokens in LLM response");
                    let text = response.message.text().unwrap_or_default();
                    if text.is_empty() {
                        return Err(Error::Processing(
                            "response truncated due to token limit".to_string(),
                        ));
                    }
                    return Ok(ExecutorOutcome {
                        text: text.to_string(),
                        iterations: iteration,
                        usage,
                    });
                }
            }
        }

        warn!(max_iterations = self.config.max_iterations, "Max iterations reached, stopping");
        Err(Error::Processing(format!(
            "no final answer after {} iterations",
            self.config.max_iterations
        )))
    }

    /// Execute tool calls from an assistant message
    ///
    /// Tool failures are reported back to the model as error results rather
    /// than aborting the loop.
    async fn execute_tools(&self, message: &Message) -> Vec<Message> {
        let mut results = Vec::new();

        for block in message.tool_uses() {
            let ContentBlock::ToolUse { id, name, input } = block else {
                continue;
            };

            let Some(tool) = self.tools.get(name) else {
                warn!(tool = %name, "Model requested a tool this agent does not have");
                results.push(Message::tool_error(id.clone(), format!("Error: unknown tool '{name}'")));
                continue;
            };

            let input_preview: String = input.to_string().chars().take(200).collect();
            info!(tool = %name, tool_id = %id, input_preview = %input_preview, "Executing tool");

            let started = Instant::now();
            match tool.execute(input.clone()).await {
                Ok(output) => {
                    debug!(
                        tool = %name,
                        duration_ms = started.elapsed().as_millis(),
                        result_length = output.len(),
                        "Tool execution succeeded"
                    );
                    results.push(Message::tool_result(id.clone(), output));
                }
                Err(e) => {
                    warn!(
                        tool = %name,
                        duration_ms = started.elapsed().as_millis(),
                        error = %e,
                        "Tool execution failed"
                    );
                    results.push(Message::tool_error(id.clone(), format!("Error: {e}")));
                }
            }
        }

        results
    }
}

/// Builder for AgentExecutor
pub struct AgentExecutorBuilder {
    provider: Option<Arc<dyn LLMProvider>>,
    tools: ToolRegistry,
    config: ExecutorConfig,
}

impl AgentExecutorBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            provider: None,
            tools: ToolRegistry::new(),
            config: ExecutorConfig::default(),
        }
    }

    /// Set the LLM provider
    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Set the tools offered to the model
    pub fn tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = tools;
        self
    }

    /// Set the full configuration
    pub fn config(mut self, config: ExecutorConfig) -> Self {
        self.config = config;
        self
    }

    /// Set maximum iterations
    pub fn max_iterations(mut self, max: usize) -> Self {
        self.config.max_iterations = max;
        self
    }

    /// Set the model
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    /// Set the system prompt
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    /// Set max tokens
    pub fn max_tokens(mut self, max_tokens: usize) -> Self {
        self.config.max_tokens = max_tokens;
        self
    }

    /// Set temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.config.temperature = Some(temperature);
        self
    }

    /// Build the executor
    pub fn build(self) -> Result<AgentExecutor> {
        let provider = self
            .provider
            .ok_or_else(|| Error::Build("executor has no LLM provider".to_string()))?;

        Ok(AgentExecutor::new(provider, self.tools, self.config))
    }
}

impl Default for AgentExecutorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use crew_llm::{MockProvider, MockResponse};
    use crew_tools::Tool;
    use serde_json::{Value, json};

    struct Lookup;

    #[async_trait]
    impl Tool for Lookup {
        async fn execute(&self, params: Value) -> Result<String> {
            let query = crew_tools::required_str(&params, "query")?;
            Ok(format!("found: {query}"))
        }

        fn name(&self) -> &str {
            "lookup"
        }

        fn description(&self) -> &str {
            "Look something up"
        }

        fn input_schema(&self) -> Value {
            json!({"type": "object", "properties": {"query": {"type": "string"}}})
        }
    }

    fn executor(provider: Arc<MockProvider>) -> AgentExecutor {
        AgentExecutor::builder()
            .provider(provider)
            .tools(ToolRegistry::builder().register(Arc::new(Lookup)).build())
            .model("test-model")
            .max_iterations(3)
            .system_prompt("You are a tester")
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder() {
        let builder = AgentExecutorBuilder::new()
            .model("test-model")
            .max_iterations(5)
            .system_prompt("Test prompt");

        assert_eq!(builder.config.model, "test-model");
        assert_eq!(builder.config.max_iterations, 5);
        assert_eq!(builder.config.system_prompt, Some("Test prompt".to_string()));
    }

    #[test]
    fn test_builder_requires_provider() {
        let err = AgentExecutorBuilder::new().build().err().unwrap();
        assert_eq!(err.kind(), crew_core::ErrorKind::Build);
    }

    #[tokio::test]
    async fn test_direct_answer() {
        let provider = Arc::new(MockProvider::new().with_response(MockResponse::text("done")));
        let outcome = executor(provider.clone()).run_detailed("hi").await.unwrap();

        assert_eq!(outcome.text, "done");
        assert_eq!(outcome.iterations, 1);

        let request = &provider.requests()[0];
        assert_eq!(request.system.as_deref(), Some("You are a tester"));
        assert_eq!(request.tools.as_ref().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn test_tool_loop_feeds_result_back() {
        let provider = Arc::new(
            MockProvider::new()
                .with_response(MockResponse::tool_call("lookup", json!({"query": "ports"})))
                .with_response(MockResponse::text("summary")),
        );
        let outcome = executor(provider.clone()).run_detailed("go").await.unwrap();

        assert_eq!(outcome.text, "summary");
        assert_eq!(outcome.iterations, 2);
        assert_eq!(outcome.usage.total(), 30);

        let second = &provider.requests()[1];
        let last = second.messages.last().unwrap();
        assert!(matches!(
            &last.content,
            Some(crew_llm::MessageContent::Blocks(blocks))
                if matches!(&blocks[0], ContentBlock::ToolResult { content, is_error, .. }
                    if content == "found: ports" && is_error.is_none())
        ));
    }

    #[tokio::test]
    async fn test_unknown_tool_is_reported_to_model() {
        let provider = Arc::new(
            MockProvider::new()
                .with_response(MockResponse::tool_call("db_query_tool", json!({})))
                .with_response(MockResponse::text("recovered")),
        );
        let text = executor(provider).run("go").await.unwrap();
        assert_eq!(text, "recovered");
    }

    #[tokio::test]
    async fn test_max_iterations_is_an_error() {
        let provider = Arc::new(MockProvider::from_fn(|_| {
            MockResponse::tool_call("lookup", json!({"query": "again"}))
        }));
        let err = executor(provider.clone()).run("loop").await.unwrap_err();

        assert!(err.to_string().contains("3 iterations"));
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn test_provider_error_propagates() {
        let provider = Arc::new(MockProvider::new().with_response(MockResponse::error("rate limited")));
        let err = executor(provider).run("go").await.unwrap_err();
        assert_eq!(err.kind(), crew_core::ErrorKind::Processing);
        assert!(err.to_string().contains("rate limited"));
    }
}
