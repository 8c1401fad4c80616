//! Typed agent and task declarations parsed from config documents

use crate::loader::Document;
use crew_core::{Error, Result};
use crew_runtime::AgentProfile;
use serde_yaml::{Mapping, Value};
use tracing::warn;

/// Expected output used when a task does not declare one
pub const DEFAULT_EXPECTED_OUTPUT: &str = "Default Expected Output";

/// How to treat missing required fields
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FieldValidation {
    /// Missing fields are a [`Error::Malformed`] error
    Strict,
    /// Missing fields get placeholder values
    #[default]
    Lenient,
}

/// One entry of `agents.yaml`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentDefinition {
    /// Unique agent name (the document key)
    pub name: String,
    /// Role, goal, backstory, flags and declared tools
    pub profile: AgentProfile,
}

/// One entry of `tasks.yaml`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDefinition {
    /// Unique task name (the document key)
    pub name: String,
    /// Instruction template with `{placeholder}`s
    pub description: String,
    /// What a good answer looks like
    pub expected_output: String,
    /// Name of the agent that performs the task
    pub agent: Option<String>,
    /// Names of the tasks whose outputs this task consumes
    pub context: Vec<String>,
}

/// Parse every entry of an agents document
///
/// Entries that are not mappings are skipped with a warning.
pub fn parse_agents(document: &Document, validation: FieldValidation) -> Result<Vec<AgentDefinition>> {
    let mut agents = Vec::with_capacity(document.len());
    for (name, value) in document {
        let Some(fields) = value.as_mapping() else {
            warn!(agent = %name, "Agent entry is not a mapping, skipping");
            continue;
        };
        agents.push(parse_agent(name, fields, validation)?);
    }
    Ok(agents)
}

fn parse_agent(name: &str, fields: &Mapping, validation: FieldValidation) -> Result<AgentDefinition> {
    let owner = format!("agent '{name}'");
    let text_field = |key: &str, placeholder: &str| -> Result<String> {
        match optional_str(fields, key, &owner)? {
            Some(value) => Ok(value),
            None if validation == FieldValidation::Strict => {
                Err(Error::Malformed(format!("{owner} is missing '{key}'")))
            }
            None => {
                warn!(agent = %name, field = key, "Agent field missing, using placeholder");
                Ok(format!("Agent {name} {placeholder} Missing"))
            }
        }
    };

    let profile = AgentProfile {
        role: text_field("role", "Role")?,
        goal: text_field("goal", "Goal")?,
        backstory: text_field("backstory", "Backstory")?,
        allow_delegation: optional_bool(fields, "allow_delegation", &owner)?.unwrap_or(false),
        verbose: optional_bool(fields, "verbose", &owner)?.unwrap_or(true),
        tools: string_list(fields, "tools", &owner)?,
    };

    Ok(AgentDefinition {
        name: name.to_string(),
        profile,
    })
}

/// Parse every entry of a tasks document
///
/// Entries that are not mappings or have no `description` are skipped with
/// a warning.
pub fn parse_tasks(document: &Document, validation: FieldValidation) -> Result<Vec<TaskDefinition>> {
    let mut tasks = Vec::with_capacity(document.len());
    for (name, value) in document {
        let Some(fields) = value.as_mapping() else {
            warn!(task = %name, "Task entry is not a mapping, skipping");
            continue;
        };
        if let Some(task) = parse_task(name, fields, validation)? {
            tasks.push(task);
        }
    }
    Ok(tasks)
}

fn parse_task(name: &str, fields: &Mapping, validation: FieldValidation) -> Result<Option<TaskDefinition>> {
    let owner = format!("task '{name}'");

    let Some(description) = optional_str(fields, "description", &owner)? else {
        warn!(task = %name, "Task has no description, skipping");
        return Ok(None);
    };

    let expected_output = match optional_str(fields, "expected_output", &owner)? {
        Some(value) => value,
        None if validation == FieldValidation::Strict => {
            return Err(Error::Malformed(format!("{owner} is missing 'expected_output'")));
        }
        None => DEFAULT_EXPECTED_OUTPUT.to_string(),
    };

    let context = match fields.get("context") {
        Some(Value::String(single)) => vec![single.clone()],
        _ => string_list(fields, "context", &owner)?,
    };

    Ok(Some(TaskDefinition {
        name: name.to_string(),
        description,
        expected_output,
        agent: optional_str(fields, "agent", &owner)?,
        context,
    }))
}

fn optional_str(fields: &Mapping, key: &str, owner: &str) -> Result<Option<String>> {
    match fields.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(Error::Malformed(format!(
            "{owner}: '{key}' must be a string, found {}",
            kind_of(other)
        ))),
    }
}

fn optional_bool(fields: &Mapping, key: &str, owner: &str) -> Result<Option<bool>> {
    match fields.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(other) => Err(Error::Malformed(format!(
            "{owner}: '{key}' must be true or false, found {}",
            kind_of(other)
        ))),
    }
}

fn string_list(fields: &Mapping, key: &str, owner: &str) -> Result<Vec<String>> {
    match fields.get(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Sequence(items)) => items
            .iter()
            .map(|item| {
                item.as_str().map(str::to_string).ok_or_else(|| {
                    Error::Malformed(format!(
                        "{owner}: '{key}' entries must be strings, found {}",
                        kind_of(item)
                    ))
                })
            })
            .collect(),
        Some(other) => Err(Error::Malformed(format!(
            "{owner}: '{key}' must be a list of names, found {}",
            kind_of(other)
        ))),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::parse_document;
    use crew_core::ErrorKind;
    use tracing_test::traced_test;

    fn agents(yaml: &str, validation: FieldValidation) -> Result<Vec<AgentDefinition>> {
        parse_agents(&parse_document(yaml, "agents.yaml").unwrap(), validation)
    }

    fn tasks(yaml: &str, validation: FieldValidation) -> Result<Vec<TaskDefinition>> {
        parse_tasks(&parse_document(yaml, "tasks.yaml").unwrap(), validation)
    }

    #[test]
    fn test_agent_defaults() {
        let parsed = agents(
            "analyst:\n  role: Analyst\n  goal: Find signals\n  backstory: Veteran\n",
            FieldValidation::Strict,
        )
        .unwrap();

        let profile = &parsed[0].profile;
        assert_eq!(parsed[0].name, "analyst");
        assert!(!profile.allow_delegation);
        assert!(profile.verbose);
        assert!(profile.tools.is_empty());
    }

    #[test]
    fn test_lenient_placeholders() {
        let parsed = agents(
            "scout:\n  tools: [serper_dev_tool, db_query_tool]\n",
            FieldValidation::Lenient,
        )
        .unwrap();

        let profile = &parsed[0].profile;
        assert_eq!(profile.role, "Agent scout Role Missing");
        assert_eq!(profile.goal, "Agent scout Goal Missing");
        assert_eq!(profile.backstory, "Agent scout Backstory Missing");
        assert_eq!(profile.tools, vec!["serper_dev_tool", "db_query_tool"]);
    }

    #[test]
    fn test_strict_missing_role() {
        let err = agents("scout:\n  goal: G\n  backstory: B\n", FieldValidation::Strict).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Malformed);
        assert!(err.to_string().contains("role"));
    }

    #[test]
    fn test_wrong_types_are_malformed_in_both_modes() {
        for validation in [FieldValidation::Strict, FieldValidation::Lenient] {
            let err = agents("scout:\n  role: [a, b]\n", validation).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Malformed);

            let err = agents("scout:\n  role: R\n  goal: G\n  backstory: B\n  verbose: loud\n", validation)
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Malformed);
        }
    }

    #[traced_test]
    #[test]
    fn test_non_mapping_entries_are_skipped() {
        let parsed = agents("broken: just text\nok:\n  role: R\n", FieldValidation::Lenient).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].name, "ok");

        assert!(logs_contain("Agent entry is not a mapping"));

        let parsed = tasks("broken: 3\nok:\n  description: D\n", FieldValidation::Lenient).unwrap();
        assert_eq!(parsed.len(), 1);
        assert!(logs_contain("Task entry is not a mapping"));
    }

    #[test]
    fn test_task_without_description_is_skipped() {
        let parsed = tasks(
            "nodesc:\n  agent: a\nfine:\n  description: Do it\n  agent: a\n",
            FieldValidation::Strict,
        );
        // strict still needs expected_output on the surviving task
        assert_eq!(parsed.unwrap_err().kind(), ErrorKind::Malformed);

        let parsed = tasks("nodesc:\n  agent: a\nfine:\n  description: Do it\n", FieldValidation::Lenient).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].name, "fine");
        assert_eq!(parsed[0].expected_output, DEFAULT_EXPECTED_OUTPUT);
        assert_eq!(parsed[0].agent, None);
    }

    #[test]
    fn test_context_forms() {
        let parsed = tasks(
            "a:\n  description: A\n  context: research\nb:\n  description: B\n  context: [x, y]\n",
            FieldValidation::Lenient,
        )
        .unwrap();
        assert_eq!(parsed[0].context, vec!["research"]);
        assert_eq!(parsed[1].context, vec!["x", "y"]);

        let err = tasks("a:\n  description: A\n  context: 5\n", FieldValidation::Lenient).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Malformed);
    }
}
