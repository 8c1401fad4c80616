//! Core Agent trait definition

use crate::Result;
use async_trait::async_trait;

/// Output of an upstream task handed to a dependent task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextEntry {
    /// Name of the task that produced the output
    pub task: String,
    /// The task's textual output
    pub output: String,
}

/// One unit of work handed to an agent
///
/// An assignment carries everything an agent needs to execute a task: the
/// rendered instruction, a description of the expected output, and the
/// outputs of the tasks it depends on, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct Assignment {
    /// Name of the task being executed
    pub task: String,
    /// Rendered task instruction
    pub description: String,
    /// What a good answer looks like
    pub expected_output: String,
    /// Outputs of context tasks
    pub context: Vec<ContextEntry>,
}

impl Assignment {
    /// Create an assignment with no context
    pub fn new(
        task: impl Into<String>,
        description: impl Into<String>,
        expected_output: impl Into<String>,
    ) -> Self {
        Self {
            task: task.into(),
            description: description.into(),
            expected_output: expected_output.into(),
            context: Vec::new(),
        }
    }

    /// Attach the output of an upstream task
    pub fn with_context(mut self, task: impl Into<String>, output: impl Into<String>) -> Self {
        self.context.push(ContextEntry {
            task: task.into(),
            output: output.into(),
        });
        self
    }

    /// Concatenate the context outputs, each under its task name
    pub fn context_text(&self) -> Option<String> {
        if self.context.is_empty() {
            return None;
        }
        let text = self
            .context
            .iter()
            .map(|entry| format!("[{}]\n{}", entry.task, entry.output))
            .collect::<Vec<_>>()
            .join("\n\n");
        Some(text)
    }
}

/// Core trait that all agents must implement
///
/// Agents are role-bound executors: the workflow engine hands them an
/// [`Assignment`] and expects the task's textual output back.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Execute one assignment and return its output
    async fn perform(&self, assignment: &Assignment) -> Result<String>;

    /// Get the agent's name (unique within a workflow)
    fn name(&self) -> &str;

    /// Get the agent's role
    fn role(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoAgent;

    #[async_trait]
    impl Agent for EchoAgent {
        async fn perform(&self, assignment: &Assignment) -> Result<String> {
            Ok(format!("{}:{}", self.name(), assignment.description))
        }

        fn name(&self) -> &str {
            "echo"
        }

        fn role(&self) -> &str {
            "Echo"
        }
    }

    #[test]
    fn test_context_text_empty() {
        let assignment = Assignment::new("gather", "Collect facts", "A list");
        assert!(assignment.context_text().is_none());
    }

    #[test]
    fn test_context_text_keeps_order() {
        let assignment = Assignment::new("report", "Write it up", "A report")
            .with_context("gather", "facts")
            .with_context("analyze", "analysis");

        assert_eq!(
            assignment.context_text().unwrap(),
            "[gather]\nfacts\n\n[analyze]\nanalysis"
        );
    }

    #[tokio::test]
    async fn test_agent_trait_object() {
        let agent: Box<dyn Agent> = Box::new(EchoAgent);
        let output = agent
            .perform(&Assignment::new("t", "hello", ""))
            .await
            .unwrap();
        assert_eq!(output, "echo:hello");
        assert_eq!(agent.role(), "Echo");
    }
}
