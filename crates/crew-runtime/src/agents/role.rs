//! Role-scoped agent (wraps AgentExecutor)

use crate::executor::AgentExecutor;
use async_trait::async_trait;
use crew_core::{Agent, Assignment, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Who an agent is and what it may use
///
/// Built from one entry of a workflow's agents document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentProfile {
    /// Job title the model is asked to play
    pub role: String,
    /// What the agent is trying to achieve
    pub goal: String,
    /// Background that shapes the agent's answers
    pub backstory: String,
    /// Whether the agent may hand work to other agents
    #[serde(default)]
    pub allow_delegation: bool,
    /// Log full outputs at info level
    #[serde(default = "default_verbose")]
    pub verbose: bool,
    /// Declared tool names, in declaration order
    #[serde(default)]
    pub tools: Vec<String>,
}

fn default_verbose() -> bool {
    true
}

impl AgentProfile {
    /// Create a profile with default flags and no tools
    pub fn new(
        role: impl Into<String>,
        goal: impl Into<String>,
        backstory: impl Into<String>,
    ) -> Self {
        Self {
            role: role.into(),
            goal: goal.into(),
            backstory: backstory.into(),
            allow_delegation: false,
            verbose: true,
            tools: Vec::new(),
        }
    }

    /// Declare the tools this agent wants
    pub fn with_tools<I, S>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tools = tools.into_iter().map(Into::into).collect();
        self
    }

    /// System prompt carrying role, backstory and goal
    pub fn system_prompt(&self) -> String {
        let mut prompt = format!(
            "You are {}.\n{}\n\nYour personal goal is: {}",
            self.role, self.backstory, self.goal
        );
        if !self.allow_delegation {
            prompt.push_str("\n\nComplete the task yourself; do not hand it to anyone else.");
        }
        prompt
    }
}

/// Build the user message for one assignment
pub fn assignment_prompt(assignment: &Assignment) -> String {
    let mut prompt = format!(
        "Current Task: {}\n\nThis is the expected criteria for your final answer: {}\n\
         You MUST return the actual complete content as the final answer, not a summary.",
        assignment.description, assignment.expected_output
    );
    if let Some(context) = assignment.context_text() {
        prompt.push_str("\n\nThis is the context you're working with:\n");
        prompt.push_str(&context);
    }
    prompt
}

/// An agent bound to a role, its own tools and the shared completion client
pub struct RoleAgent {
    name: String,
    profile: AgentProfile,
    executor: AgentExecutor,
}

impl RoleAgent {
    /// Create a role agent from an executor already configured with the
    /// profile's system prompt and tools
    pub fn new(name: impl Into<String>, profile: AgentProfile, executor: AgentExecutor) -> Self {
        Self {
            name: name.into(),
            profile,
            executor,
        }
    }

    /// The agent's profile
    pub fn profile(&self) -> &AgentProfile {
        &self.profile
    }

    /// Names of the tools that survived resolution
    pub fn tool_names(&self) -> Vec<&str> {
        self.executor.tools().names()
    }

    /// The underlying executor
    pub fn executor(&self) -> &AgentExecutor {
        &self.executor
    }
}

impl std::fmt::Debug for RoleAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoleAgent")
            .field("name", &self.name)
            .field("role", &self.profile.role)
            .field("tools", &self.tool_names())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Agent for RoleAgent {
    async fn perform(&self, assignment: &Assignment) -> Result<String> {
        let output = self.executor.run(assignment_prompt(assignment)).await?;

        if self.profile.verbose {
            info!(agent = %self.name, task = %assignment.task, output = %output, "Agent answered");
        } else {
            debug!(agent = %self.name, task = %assignment.task, output_length = output.len(), "Agent answered");
        }
        Ok(output)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn role(&self) -> &str {
        &self.profile.role
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crew_llm::{MockProvider, MockResponse};
    use std::sync::Arc;

    fn profile() -> AgentProfile {
        AgentProfile::new("Analyst", "Find signals", "Ten years in OSINT")
    }

    #[test]
    fn test_system_prompt() {
        let prompt = profile().system_prompt();
        assert!(prompt.starts_with("You are Analyst."));
        assert!(prompt.contains("Ten years in OSINT"));
        assert!(prompt.contains("Your personal goal is: Find signals"));
    }

    #[test]
    fn test_assignment_prompt_includes_context() {
        let assignment = Assignment::new("summarize", "Summarize it", "A paragraph")
            .with_context("research", "raw notes");
        let prompt = assignment_prompt(&assignment);

        assert!(prompt.starts_with("Current Task: Summarize it"));
        assert!(prompt.contains("A paragraph"));
        assert!(prompt.contains("[research]\nraw notes"));

        let bare = assignment_prompt(&Assignment::new("t", "Do it", "Done"));
        assert!(!bare.contains("context you're working with"));
    }

    #[tokio::test]
    async fn test_perform_sends_profile_and_assignment() {
        let provider = Arc::new(MockProvider::new().with_response(MockResponse::text("report")));
        let profile = profile();
        let executor = AgentExecutor::builder()
            .provider(provider.clone())
            .system_prompt(profile.system_prompt())
            .build()
            .unwrap();
        let agent = RoleAgent::new("analyst", profile, executor);

        let out = agent
            .perform(&Assignment::new("research", "Research ports", "Notes"))
            .await
            .unwrap();

        assert_eq!(out, "report");
        assert_eq!(agent.role(), "Analyst");
        let request = &provider.requests()[0];
        assert!(request.system.as_deref().unwrap().contains("You are Analyst."));
        assert!(request.last_user_text().unwrap().contains("Research ports"));
    }
}
