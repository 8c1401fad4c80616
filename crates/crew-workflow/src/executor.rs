//! Sequential execution of a task graph

use crate::graph::TaskGraph;
use crew_core::{Assignment, Error, Result};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{error, info};

/// How the final result of a run is derived from the task outputs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultPolicy {
    /// Output of the last task in execution order
    #[default]
    LastTask,
    /// Every task's output under a `## <task>` heading
    Concatenate,
}

/// Output of one executed task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskOutput {
    /// Task name
    pub task: String,
    /// Name of the agent that performed it
    pub agent: String,
    /// The agent's answer
    pub output: String,
    /// Wall-clock time the task took
    pub duration: Duration,
}

/// Result of a completed workflow run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowRun {
    /// Outputs in execution order
    pub outputs: Vec<TaskOutput>,
    /// Final textual result chosen by the [`ResultPolicy`]
    pub final_result: String,
}

impl WorkflowRun {
    /// Output of a task by name
    pub fn output(&self, task: &str) -> Option<&str> {
        self.outputs
            .iter()
            .find(|o| o.task == task)
            .map(|o| o.output.as_str())
    }

    /// Names of the executed tasks, in order
    pub fn task_names(&self) -> Vec<&str> {
        self.outputs.iter().map(|o| o.task.as_str()).collect()
    }

    /// Total time spent in tasks
    pub fn total_duration(&self) -> Duration {
        self.outputs.iter().map(|o| o.duration).sum()
    }
}

/// Runs tasks one at a time in topological order
#[derive(Debug, Clone, Copy, Default)]
pub struct SequentialExecutor {
    policy: ResultPolicy,
}

impl SequentialExecutor {
    /// Create an executor with the given result policy
    pub fn new(policy: ResultPolicy) -> Self {
        Self { policy }
    }

    /// The result policy in use
    pub fn policy(&self) -> ResultPolicy {
        self.policy
    }

    /// Execute every task of the graph
    ///
    /// Each task receives the outputs of its context tasks, which have always
    /// run already. The first failing task stops the run.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Run`] naming the failed task.
    pub async fn execute(&self, graph: &TaskGraph) -> Result<WorkflowRun> {
        let mut outputs: Vec<Option<TaskOutput>> = vec![None; graph.len()];
        let mut finished: Vec<TaskOutput> = Vec::with_capacity(graph.len());

        for &index in graph.order() {
            let task = &graph.tasks()[index];
            let mut assignment = Assignment::new(&task.name, &task.description, &task.expected_output);
            for &dep in &task.context {
                if let Some(done) = &outputs[dep] {
                    assignment = assignment.with_context(&done.task, &done.output);
                }
            }

            info!(task = %task.name, agent = %task.agent.name(), context = assignment.context.len(), "Task started");
            let started = Instant::now();

            let output = task.agent.perform(&assignment).await.map_err(|e| {
                error!(task = %task.name, agent = %task.agent.name(), error = %e, "Task failed");
                Error::Run {
                    task: task.name.clone(),
                    message: e.to_string(),
                }
            })?;

            let duration = started.elapsed();
            info!(
                task = %task.name,
                duration_ms = duration.as_millis(),
                output_length = output.len(),
                "Task completed"
            );

            let done = TaskOutput {
                task: task.name.clone(),
                agent: task.agent.name().to_string(),
                output,
                duration,
            };
            outputs[index] = Some(done.clone());
            finished.push(done);
        }

        let final_result = match self.policy {
            ResultPolicy::LastTask => finished.last().map(|o| o.output.clone()).unwrap_or_default(),
            ResultPolicy::Concatenate => finished
                .iter()
                .map(|o| format!("## {}\n\n{}", o.task, o.output))
                .collect::<Vec<_>>()
                .join("\n\n"),
        };

        Ok(WorkflowRun {
            outputs: finished,
            final_result,
        })
    }
}
