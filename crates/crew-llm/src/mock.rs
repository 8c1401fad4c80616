//! Scripted LLM provider for deterministic testing
//!
//! [`MockProvider`] answers completions from a queue of [`MockResponse`]s, or
//! from a closure that inspects each request. Every request is recorded so
//! tests can assert on what the agents sent.
//!
//! # Example
//!
//! ```
//! use crew_llm::{MockProvider, MockResponse};
//! use serde_json::json;
//!
//! let provider = MockProvider::new()
//!     .with_response(MockResponse::tool_call("serper_dev_tool", json!({"query": "ports"})))
//!     .with_response(MockResponse::text("Final answer"));
//! assert_eq!(provider.remaining(), 2);
//! ```

use crate::{
    CompletionRequest, CompletionResponse, ContentBlock, LLMError, LLMProvider, Message, Result,
    StopReason, TokenUsage,
};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A single scripted reply
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Plain text completion ending the turn
    Text(String),
    /// A request to call one tool
    ToolCall {
        name: String,
        input: serde_json::Value,
    },
    /// A provider failure
    Error(String),
}

impl MockResponse {
    /// Create a text response
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text(content.into())
    }

    /// Create a tool-call response
    pub fn tool_call(name: impl Into<String>, input: serde_json::Value) -> Self {
        Self::ToolCall {
            name: name.into(),
            input,
        }
    }

    /// Create a failing response
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(message.into())
    }
}

type Responder = Box<dyn Fn(&CompletionRequest) -> MockResponse + Send + Sync>;

/// Provider that replays scripted responses
pub struct MockProvider {
    queue: Mutex<VecDeque<MockResponse>>,
    responder: Option<Responder>,
    requests: Mutex<Vec<CompletionRequest>>,
    call_ids: AtomicUsize,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockProvider {
    /// Create a provider with an empty script
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            responder: None,
            requests: Mutex::new(Vec::new()),
            call_ids: AtomicUsize::new(0),
        }
    }

    /// Create a provider that computes every reply from the request
    ///
    /// Queued responses, if any, still take precedence.
    pub fn from_fn<F>(responder: F) -> Self
    where
        F: Fn(&CompletionRequest) -> MockResponse + Send + Sync + 'static,
    {
        Self {
            responder: Some(Box::new(responder)),
            ..Self::new()
        }
    }

    /// Append a response to the script
    pub fn with_response(self, response: MockResponse) -> Self {
        self.lock_queue().push_back(response);
        self
    }

    /// Number of queued responses not yet consumed
    pub fn remaining(&self) -> usize {
        self.lock_queue().len()
    }

    /// All requests received so far
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    /// Number of completions requested so far
    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or_default()
    }

    fn lock_queue(&self) -> std::sync::MutexGuard<'_, VecDeque<MockResponse>> {
        // A poisoned queue only happens after a panicking test; keep its data.
        self.queue
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn next_response(&self, request: &CompletionRequest) -> Result<MockResponse> {
        if let Some(response) = self.lock_queue().pop_front() {
            return Ok(response);
        }
        match &self.responder {
            Some(responder) => Ok(responder(request)),
            None => Err(LLMError::ProviderError(
                "mock provider has no scripted response left".to_string(),
            )),
        }
    }
}

#[async_trait]
impl LLMProvider for MockProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let response = self.next_response(&request)?;
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }

        let usage = TokenUsage {
            input_tokens: 10,
            output_tokens: 5,
        };

        match response {
            MockResponse::Text(text) => Ok(CompletionResponse {
                message: Message::assistant(text),
                stop_reason: StopReason::EndTurn,
                usage,
            }),
            MockResponse::ToolCall { name, input } => {
                let id = format!("call_{}", self.call_ids.fetch_add(1, Ordering::Relaxed));
                Ok(CompletionResponse {
                    message: Message::assistant_blocks(vec![ContentBlock::ToolUse {
                        id,
                        name,
                        input,
                    }]),
                    stop_reason: StopReason::ToolUse,
                    usage,
                })
            }
            MockResponse::Error(message) => Err(LLMError::RequestFailed(message)),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(text: &str) -> CompletionRequest {
        CompletionRequest::builder("mock-model")
            .add_message(Message::user(text))
            .build()
    }

    #[tokio::test]
    async fn test_scripted_responses_in_order() {
        let provider = MockProvider::new()
            .with_response(MockResponse::text("first"))
            .with_response(MockResponse::error("boom"));

        let first = provider.complete(request("a")).await.unwrap();
        assert_eq!(first.text(), Some("first"));
        assert_eq!(first.stop_reason, StopReason::EndTurn);

        let second = provider.complete(request("b")).await;
        assert!(matches!(second, Err(LLMError::RequestFailed(msg)) if msg == "boom"));

        assert_eq!(provider.call_count(), 2);
        assert_eq!(provider.remaining(), 0);
    }

    #[tokio::test]
    async fn test_exhausted_script_fails() {
        let provider = MockProvider::new();
        assert!(provider.complete(request("a")).await.is_err());
    }

    #[tokio::test]
    async fn test_responder_sees_request() {
        let provider = MockProvider::from_fn(|req| {
            MockResponse::text(format!("echo: {}", req.last_user_text().unwrap_or_default()))
        });

        let response = provider.complete(request("ping")).await.unwrap();
        assert_eq!(response.text(), Some("echo: ping"));
        assert_eq!(provider.requests()[0].model, "mock-model");
    }

    #[tokio::test]
    async fn test_tool_call_response() {
        let provider = MockProvider::new().with_response(MockResponse::tool_call(
            "serper_dev_tool",
            serde_json::json!({"query": "q"}),
        ));

        let response = provider.complete(request("a")).await.unwrap();
        assert_eq!(response.stop_reason, StopReason::ToolUse);
        assert!(response.message.has_tool_uses());
    }
}
