//! The two workflow families: intelligence analysis and wargames
//!
//! Each facade fixes its parameter names, tool registry and default
//! validation mode, and logs failures before handing them back.

use crate::executor::WorkflowRun;
use crate::loader::ConfigLoader;
use crate::workflow::{Workflow, WorkflowOptions};
use crew_core::{Inputs, Result};
use crew_runtime::AgentRuntime;
use crew_tools::{SerperSearchTool, ToolRegistry, WebsiteSearchTool};
use std::sync::{Arc, LazyLock};
use tracing::{error, info};

/// Workflow id of the wargames family
pub const WARGAMES_WORKFLOW: &str = "wargames";
/// Preferred intelligence workflow when the caller does not pick one
pub const PREFERRED_WORKFLOW: &str = "combined";
/// Fallback intelligence workflow
pub const FALLBACK_WORKFLOW: &str = "osint";

static INTELLIGENCE_TOOLS: LazyLock<Arc<ToolRegistry>> = LazyLock::new(|| {
    Arc::new(
        ToolRegistry::builder()
            .register(Arc::new(SerperSearchTool::new()))
            .register(Arc::new(WebsiteSearchTool::new()))
            .build(),
    )
});

/// Tools available to intelligence agents, shared by every crew
pub fn intelligence_tools() -> Arc<ToolRegistry> {
    Arc::clone(&INTELLIGENCE_TOOLS)
}

/// Tools available to wargames agents (none)
pub fn wargames_tools() -> Arc<ToolRegistry> {
    Arc::new(ToolRegistry::new())
}

/// Intelligence analysis on a single topic
#[derive(Debug)]
pub struct IntelligenceCrew {
    workflow: Workflow,
}

impl IntelligenceCrew {
    /// Build the crew for `workflow_id` with lenient validation
    pub fn new(workflow_id: &str, loader: ConfigLoader, runtime: AgentRuntime) -> Result<Self> {
        Self::with_options(workflow_id, loader, runtime, WorkflowOptions::lenient())
    }

    /// Build the crew with explicit options
    pub fn with_options(
        workflow_id: &str,
        loader: ConfigLoader,
        runtime: AgentRuntime,
        options: WorkflowOptions,
    ) -> Result<Self> {
        Self::with_tools(workflow_id, loader, runtime, options, intelligence_tools())
    }

    /// Build the crew with a custom tool registry
    pub fn with_tools(
        workflow_id: &str,
        loader: ConfigLoader,
        runtime: AgentRuntime,
        options: WorkflowOptions,
        tools: Arc<ToolRegistry>,
    ) -> Result<Self> {
        let workflow = Workflow::builder(workflow_id)
            .loader(loader)
            .runtime(runtime)
            .tools(tools)
            .options(options)
            .build()
            .inspect_err(|e| {
                error!(workflow = %workflow_id, kind = ?e.kind(), error = %e, "Failed to assemble crew");
            })?;
        Ok(Self { workflow })
    }

    /// Workflows a user may pick, sorted, excluding the wargames family
    pub fn available(loader: &ConfigLoader) -> Result<Vec<String>> {
        loader.available_workflows(&[WARGAMES_WORKFLOW])
    }

    /// Workflow to use when none was requested
    ///
    /// Prefers `combined`, then `osint`, then the first available one.
    pub fn default_workflow(available: &[String]) -> Option<&str> {
        let has = |id: &str| available.iter().any(|a| a.as_str() == id);
        if has(PREFERRED_WORKFLOW) {
            Some(PREFERRED_WORKFLOW)
        } else if has(FALLBACK_WORKFLOW) {
            Some(FALLBACK_WORKFLOW)
        } else {
            available.first().map(String::as_str)
        }
    }

    /// The assembled workflow
    pub fn workflow(&self) -> &Workflow {
        &self.workflow
    }

    /// Analyse `topic`
    pub async fn run(&self, topic: &str) -> Result<WorkflowRun> {
        info!(workflow = %self.workflow.id(), topic = %topic, "Intelligence crew started");
        self.workflow
            .run(&Inputs::new().with_topic(topic))
            .await
            .inspect_err(|e| {
                error!(workflow = %self.workflow.id(), kind = ?e.kind(), error = %e, "Crew execution failed");
            })
    }
}

/// Wargame a user action against prior intelligence
#[derive(Debug)]
pub struct WargamesCrew {
    workflow: Workflow,
}

impl WargamesCrew {
    /// Build the crew with strict validation
    pub fn new(loader: ConfigLoader, runtime: AgentRuntime) -> Result<Self> {
        Self::with_options(loader, runtime, WorkflowOptions::strict())
    }

    /// Build the crew with explicit options
    pub fn with_options(loader: ConfigLoader, runtime: AgentRuntime, options: WorkflowOptions) -> Result<Self> {
        let workflow = Workflow::builder(WARGAMES_WORKFLOW)
            .loader(loader)
            .runtime(runtime)
            .tools(wargames_tools())
            .options(options)
            .build()
            .inspect_err(|e| {
                error!(workflow = WARGAMES_WORKFLOW, kind = ?e.kind(), error = %e, "Failed to assemble wargames");
            })?;
        Ok(Self { workflow })
    }

    /// The assembled workflow
    pub fn workflow(&self) -> &Workflow {
        &self.workflow
    }

    /// Play out `user_action` given `intelligence_context`
    pub async fn run(&self, intelligence_context: &str, user_action: &str) -> Result<WorkflowRun> {
        info!(workflow = WARGAMES_WORKFLOW, action = %user_action, "Wargames crew started");
        let inputs = Inputs::new()
            .with_intelligence_context(intelligence_context)
            .with_user_action(user_action);
        self.workflow.run(&inputs).await.inspect_err(|e| {
            error!(workflow = WARGAMES_WORKFLOW, kind = ?e.kind(), error = %e, "Wargames execution failed");
        })
    }
}
