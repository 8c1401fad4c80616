//! Task graph construction, cycle detection and execution order

use crate::definition::TaskDefinition;
use crate::template;
use crew_core::{Agent, Error, Inputs, Result};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, warn};

/// A task ready to run: rendered instruction, bound agent, resolved context
#[derive(Clone)]
pub struct RuntimeTask {
    /// Unique task name
    pub name: String,
    /// Instruction, rendered once the graph is rendered for a run
    pub description: String,
    /// What a good answer looks like
    pub expected_output: String,
    /// Agent performing the task
    pub agent: Arc<dyn Agent>,
    /// Indices of context tasks in declaration order of the `context` field
    pub context: Vec<usize>,
}

impl std::fmt::Debug for RuntimeTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeTask")
            .field("name", &self.name)
            .field("agent", &self.agent.name())
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

/// The materialized tasks of one run and the order to execute them in
#[derive(Debug, Clone)]
pub struct TaskGraph {
    tasks: Vec<RuntimeTask>,
    order: Vec<usize>,
}

impl TaskGraph {
    /// Build the graph from parsed task definitions
    ///
    /// Instructions are kept as unrendered templates until [`TaskGraph::render`].
    /// Tasks whose agent does not resolve are dropped with a warning, as are
    /// context names that do not resolve to a built task.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if no task could be built
    /// - [`Error::Config`] if the context edges contain a cycle
    pub fn build(definitions: &[TaskDefinition], agents: &HashMap<String, Arc<dyn Agent>>) -> Result<Self> {
        let mut tasks: Vec<RuntimeTask> = Vec::with_capacity(definitions.len());
        let mut declared_context: Vec<&[String]> = Vec::with_capacity(definitions.len());

        for def in definitions {
            let Some(agent) = def.agent.as_deref().and_then(|name| agents.get(name)) else {
                warn!(task = %def.name, agent = ?def.agent, "Task agent not found, skipping task");
                continue;
            };

            tasks.push(RuntimeTask {
                name: def.name.clone(),
                description: def.description.clone(),
                expected_output: def.expected_output.clone(),
                agent: Arc::clone(agent),
                context: Vec::new(),
            });
            declared_context.push(&def.context);
        }

        if tasks.is_empty() {
            return Err(Error::Config("no valid tasks".to_string()));
        }

        let index: HashMap<String, usize> = tasks
            .iter()
            .enumerate()
            .map(|(i, task)| (task.name.clone(), i))
            .collect();

        for (task, names) in tasks.iter_mut().zip(declared_context) {
            for name in names {
                match index.get(name) {
                    Some(&dep) if !task.context.contains(&dep) => task.context.push(dep),
                    Some(_) => debug!(task = %task.name, context = %name, "Duplicate context entry"),
                    None => warn!(task = %task.name, context = %name, "Context task not found, dropping"),
                }
            }
        }

        if let Some(cycle) = find_cycle(&tasks) {
            let names: Vec<&str> = cycle.iter().map(|&i| tasks[i].name.as_str()).collect();
            return Err(Error::Config(format!(
                "circular context dependency: {}",
                names.join(" -> ")
            )));
        }

        let order = topological_order(&tasks);
        debug!(
            tasks = tasks.len(),
            order = ?order.iter().map(|&i| tasks[i].name.as_str()).collect::<Vec<_>>(),
            "Task graph built"
        );
        Ok(Self { tasks, order })
    }

    /// Copy of the graph with every instruction rendered for `inputs`
    ///
    /// A template with unsupplied placeholders is kept unrendered.
    pub fn render(&self, inputs: &Inputs) -> Self {
        let tasks = self
            .tasks
            .iter()
            .map(|task| {
                let description = template::render(&task.description, inputs).unwrap_or_else(|missing| {
                    warn!(
                        task = %task.name,
                        placeholder = ?missing.0,
                        "Missing template inputs, using the unrendered instruction"
                    );
                    task.description.clone()
                });
                RuntimeTask {
                    description,
                    ..task.clone()
                }
            })
            .collect();

        Self {
            tasks,
            order: self.order.clone(),
        }
    }

    /// Tasks in declaration order
    pub fn tasks(&self) -> &[RuntimeTask] {
        &self.tasks
    }

    /// Look up a task by name
    pub fn get(&self, name: &str) -> Option<&RuntimeTask> {
        self.tasks.iter().find(|task| task.name == name)
    }

    /// Number of tasks
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Always false for a built graph
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Indices of tasks in execution order
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// Tasks in execution order
    pub fn execution_order(&self) -> impl Iterator<Item = &RuntimeTask> {
        self.order.iter().map(|&i| &self.tasks[i])
    }

    /// Names of a task's context tasks
    pub fn context_names(&self, task: &RuntimeTask) -> Vec<&str> {
        task.context
            .iter()
            .map(|&i| self.tasks[i].name.as_str())
            .collect()
    }
}

/// Find one cycle among the context edges, as a path of task indices
fn find_cycle(tasks: &[RuntimeTask]) -> Option<Vec<usize>> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Unvisited,
        OnStack,
        Done,
    }

    fn visit(node: usize, tasks: &[RuntimeTask], marks: &mut [Mark], stack: &mut Vec<usize>) -> Option<Vec<usize>> {
        marks[node] = Mark::OnStack;
        stack.push(node);

        for &dep in &tasks[node].context {
            match marks[dep] {
                Mark::OnStack => {
                    let start = stack.iter().position(|&n| n == dep).unwrap_or(0);
                    let mut cycle = stack[start..].to_vec();
                    cycle.push(dep);
                    return Some(cycle);
                }
                Mark::Unvisited => {
                    if let Some(cycle) = visit(dep, tasks, marks, stack) {
                        return Some(cycle);
                    }
                }
                Mark::Done => {}
            }
        }

        stack.pop();
        marks[node] = Mark::Done;
        None
    }

    let mut marks = vec![Mark::Unvisited; tasks.len()];
    let mut stack = Vec::new();
    (0..tasks.len()).find_map(|start| {
        if marks[start] == Mark::Unvisited {
            visit(start, tasks, &mut marks, &mut stack)
        } else {
            None
        }
    })
}

/// Kahn's algorithm, always picking the earliest-declared ready task
///
/// Assumes the graph is acyclic.
fn topological_order(tasks: &[RuntimeTask]) -> Vec<usize> {
    let mut in_degree: Vec<usize> = tasks.iter().map(|task| task.context.len()).collect();
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); tasks.len()];
    for (i, task) in tasks.iter().enumerate() {
        for &dep in &task.context {
            dependents[dep].push(i);
        }
    }

    let mut ready: BTreeSet<usize> = (0..tasks.len()).filter(|&i| in_degree[i] == 0).collect();
    let mut order = Vec::with_capacity(tasks.len());

    while let Some(node) = ready.pop_first() {
        order.push(node);
        for &dependent in &dependents[node] {
            in_degree[dependent] -= 1;
            if in_degree[dependent] == 0 {
                ready.insert(dependent);
            }
        }
    }
    order
}
