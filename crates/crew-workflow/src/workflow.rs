//! Workflow assembly and execution
//!
//! A [`Workflow`] is built once from its configuration documents: the agent
//! and task declarations are parsed, every agent is constructed and the task
//! graph is wired and checked for cycles, so configuration and build errors
//! surface before any task runs. Each call to [`Workflow::run`] then renders
//! the task instructions for its inputs and executes them.

use crate::definition::{self, AgentDefinition, FieldValidation, TaskDefinition};
use crate::executor::{ResultPolicy, SequentialExecutor, WorkflowRun};
use crate::graph::TaskGraph;
use crate::loader::ConfigLoader;
use crew_core::{Agent, Error, Inputs, Result};
use crew_runtime::AgentRuntime;
use crew_tools::ToolRegistry;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Options controlling how a workflow is assembled and what it returns
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkflowOptions {
    /// Treatment of missing agent and task fields
    pub validation: FieldValidation,
    /// How the final result is derived
    pub result_policy: ResultPolicy,
}

impl WorkflowOptions {
    /// Lenient validation, last-task result
    pub fn lenient() -> Self {
        Self::default()
    }

    /// Strict validation, last-task result
    pub fn strict() -> Self {
        Self {
            validation: FieldValidation::Strict,
            ..Self::default()
        }
    }

    /// Override the validation mode
    pub fn with_validation(mut self, validation: FieldValidation) -> Self {
        self.validation = validation;
        self
    }

    /// Override the result policy
    pub fn with_result_policy(mut self, policy: ResultPolicy) -> Self {
        self.result_policy = policy;
        self
    }
}

/// An assembled workflow ready to run
///
/// # Example
///
/// ```no_run
/// use crew_workflow::{ConfigLoader, Workflow, WorkflowOptions};
/// use crew_core::Inputs;
/// use crew_runtime::AgentRuntime;
/// use crew_tools::ToolRegistry;
/// use std::sync::Arc;
///
/// # async fn example(runtime: AgentRuntime) -> crew_core::Result<()> {
/// let workflow = Workflow::builder("osint")
///     .loader(ConfigLoader::new("config/workflows"))
///     .runtime(runtime)
///     .tools(Arc::new(ToolRegistry::new()))
///     .options(WorkflowOptions::lenient())
///     .build()?;
///
/// let run = workflow.run(&Inputs::new().with_topic("Baltic shipping")).await?;
/// println!("{}", run.final_result);
/// # Ok(())
/// # }
/// ```
pub struct Workflow {
    id: String,
    agents: HashMap<String, Arc<dyn Agent>>,
    agent_definitions: Vec<AgentDefinition>,
    tasks: Vec<TaskDefinition>,
    graph: TaskGraph,
    options: WorkflowOptions,
}

impl Workflow {
    /// Start building a workflow
    pub fn builder(id: impl Into<String>) -> WorkflowBuilder {
        WorkflowBuilder::new(id)
    }

    /// Workflow identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Options the workflow was built with
    pub fn options(&self) -> WorkflowOptions {
        self.options
    }

    /// Parsed agent declarations that were built, in declaration order
    pub fn agent_definitions(&self) -> &[AgentDefinition] {
        &self.agent_definitions
    }

    /// Parsed task declarations, in declaration order
    pub fn task_definitions(&self) -> &[TaskDefinition] {
        &self.tasks
    }

    /// Look up a built agent
    pub fn agent(&self, name: &str) -> Option<&Arc<dyn Agent>> {
        self.agents.get(name)
    }

    /// The validated task graph, instructions unrendered
    pub fn graph(&self) -> &TaskGraph {
        &self.graph
    }

    /// Render the task graph for a set of inputs without running it
    pub fn plan(&self, inputs: &Inputs) -> TaskGraph {
        self.graph.render(inputs)
    }

    /// Render the tasks for `inputs` and execute them in order
    pub async fn run(&self, inputs: &Inputs) -> Result<WorkflowRun> {
        let graph = self.plan(inputs);
        info!(workflow = %self.id, tasks = graph.len(), "Workflow run started");

        let run = SequentialExecutor::new(self.options.result_policy)
            .execute(&graph)
            .await?;

        info!(
            workflow = %self.id,
            duration_ms = run.total_duration().as_millis(),
            "Workflow run completed"
        );
        Ok(run)
    }
}

impl std::fmt::Debug for Workflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut agents: Vec<&str> = self.agents.keys().map(String::as_str).collect();
        agents.sort_unstable();
        f.debug_struct("Workflow")
            .field("id", &self.id)
            .field("agents", &agents)
            .field("tasks", &self.tasks.iter().map(|t| t.name.as_str()).collect::<Vec<_>>())
            .field("options", &self.options)
            .finish()
    }
}

/// Builder for [`Workflow`]
pub struct WorkflowBuilder {
    id: String,
    loader: Option<ConfigLoader>,
    runtime: Option<AgentRuntime>,
    tools: Arc<ToolRegistry>,
    options: WorkflowOptions,
}

impl WorkflowBuilder {
    /// Create a builder for the workflow `id`
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            loader: None,
            runtime: None,
            tools: Arc::new(ToolRegistry::new()),
            options: WorkflowOptions::default(),
        }
    }

    /// Where to read configuration from
    pub fn loader(mut self, loader: ConfigLoader) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Runtime holding the shared completion client
    pub fn runtime(mut self, runtime: AgentRuntime) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Tools agents may declare
    pub fn tools(mut self, tools: Arc<ToolRegistry>) -> Self {
        self.tools = tools;
        self
    }

    /// Assembly options
    pub fn options(mut self, options: WorkflowOptions) -> Self {
        self.options = options;
        self
    }

    /// Load the configuration, build every agent and wire the task graph
    ///
    /// # Errors
    ///
    /// - loader errors ([`Error::NotFound`], [`Error::Malformed`], [`Error::Empty`])
    /// - [`Error::Malformed`] for missing fields under strict validation
    /// - [`Error::Build`] if an agent cannot be constructed
    /// - [`Error::Config`] if no agent or no task could be built
    /// - [`Error::Config`] if task context forms a cycle
    pub fn build(self) -> Result<Workflow> {
        let loader = self
            .loader
            .ok_or_else(|| Error::Config(format!("workflow '{}' has no config loader", self.id)))?;
        let runtime = self
            .runtime
            .ok_or_else(|| Error::Config(format!("workflow '{}' has no agent runtime", self.id)))?;

        let config = loader.load(&self.id)?;
        let agent_definitions = definition::parse_agents(&config.agents, self.options.validation)?;
        let tasks = definition::parse_tasks(&config.tasks, self.options.validation)?;

        let mut agents: HashMap<String, Arc<dyn Agent>> = HashMap::with_capacity(agent_definitions.len());
        for def in &agent_definitions {
            let agent = runtime.build_agent(&def.name, &def.profile, &self.tools)?;
            agents.insert(def.name.clone(), Arc::new(agent));
        }

        if agents.is_empty() {
            return Err(Error::Config("no valid agents".to_string()));
        }

        let graph = TaskGraph::build(&tasks, &agents)?;

        debug!(workflow = %self.id, agents = agents.len(), tasks = graph.len(), "Workflow assembled");
        Ok(Workflow {
            id: self.id,
            agents,
            agent_definitions,
            tasks,
            graph,
            options: self.options,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::{AGENTS_DOCUMENT, TASKS_DOCUMENT};
    use crew_core::ErrorKind;
    use crew_llm::{MockProvider, MockResponse};
    use std::fs;
    use tempfile::TempDir;

    fn fixture(agents: &str, tasks: &str) -> TempDir {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("demo");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(AGENTS_DOCUMENT), agents).unwrap();
        fs::write(dir.join(TASKS_DOCUMENT), tasks).unwrap();
        root
    }

    fn runtime(provider: MockProvider) -> AgentRuntime {
        AgentRuntime::builder().provider(Arc::new(provider)).build().unwrap()
    }

    fn build(root: &TempDir, provider: MockProvider, options: WorkflowOptions) -> Result<Workflow> {
        Workflow::builder("demo")
            .loader(ConfigLoader::new(root.path()))
            .runtime(runtime(provider))
            .options(options)
            .build()
    }

    #[test]
    fn test_build_requires_loader() {
        let err = Workflow::builder("demo")
            .runtime(runtime(MockProvider::new()))
            .build()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn test_all_agents_skipped_is_config_error() {
        let root = fixture("a: text\nb: 3\n", "t:\n  description: D\n  agent: a\n");
        let err = build(&root, MockProvider::new(), WorkflowOptions::lenient()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
        assert!(err.to_string().contains("no valid agents"));
    }

    #[test]
    fn test_strict_options_apply() {
        let root = fixture("a:\n  goal: G\n  backstory: B\n", "t:\n  description: D\n  agent: a\n");
        let err = build(&root, MockProvider::new(), WorkflowOptions::strict()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Malformed);

        let workflow = build(&root, MockProvider::new(), WorkflowOptions::lenient()).unwrap();
        assert_eq!(workflow.agent_definitions()[0].profile.role, "Agent a Role Missing");
        assert_eq!(workflow.agent("a").unwrap().role(), "Agent a Role Missing");
    }

    #[test]
    fn test_ghost_only_tasks_fail_the_build() {
        let root = fixture("a:\n  role: R\n  goal: G\n  backstory: B\n", "t:\n  description: D\n  agent: ghost\n");
        let err = build(&root, MockProvider::new(), WorkflowOptions::lenient()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
        assert!(err.to_string().contains("no valid tasks"));
    }

    #[test]
    fn test_cyclic_context_fails_the_build() {
        let root = fixture(
            "a:\n  role: R\n  goal: G\n  backstory: B\n",
            "x:\n  description: X\n  agent: a\n  context: [y]\ny:\n  description: Y\n  agent: a\n  context: [x]\n",
        );
        let err = build(&root, MockProvider::new(), WorkflowOptions::lenient()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
        assert!(err.to_string().contains("x -> y -> x"));
    }

    #[tokio::test]
    async fn test_run_renders_inputs() {
        let root = fixture(
            "a:\n  role: R\n  goal: G\n  backstory: B\n",
            "t:\n  description: Look into {topic}\n  expected_output: Notes\n  agent: a\n",
        );
        let provider = MockProvider::from_fn(|req| {
            MockResponse::text(req.last_user_text().unwrap_or_default().lines().next().unwrap_or_default())
        });
        let workflow = build(&root, provider, WorkflowOptions::default()).unwrap();
        assert_eq!(workflow.graph().tasks()[0].description, "Look into {topic}");

        let run = workflow.run(&Inputs::new().with_topic("ports")).await.unwrap();
        assert_eq!(run.final_result, "Current Task: Look into ports");
        let run = workflow.run(&Inputs::new().with_topic("canals")).await.unwrap();
        assert_eq!(run.final_result, "Current Task: Look into canals");
    }
}
