//! Locating and reading workflow configuration documents
//!
//! A workflow lives in `<root>/<id>/` and consists of two YAML documents,
//! `agents.yaml` and `tasks.yaml`, each a mapping from a unique name to that
//! entry's fields.

use crew_core::{Error, Result};
use serde_yaml::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// File name of the agents document
pub const AGENTS_DOCUMENT: &str = "agents.yaml";
/// File name of the tasks document
pub const TASKS_DOCUMENT: &str = "tasks.yaml";

/// Top-level entries of a config document, in declaration order
pub type Document = Vec<(String, Value)>;

/// Both documents of one workflow
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    /// Workflow identifier (directory name)
    pub id: String,
    /// Entries of `agents.yaml`
    pub agents: Document,
    /// Entries of `tasks.yaml`
    pub tasks: Document,
}

/// Reads workflow configuration from a directory tree
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    root: PathBuf,
}

impl ConfigLoader {
    /// Create a loader rooted at the workflows directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The workflows directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory of one workflow
    pub fn workflow_dir(&self, id: &str) -> PathBuf {
        self.root.join(id)
    }

    /// Load both documents of a workflow
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] if the workflow directory or either document is missing
    /// - [`Error::Malformed`] if a document is not valid YAML
    /// - [`Error::Empty`] if a document is empty, null, or not a mapping
    pub fn load(&self, id: &str) -> Result<WorkflowConfig> {
        let dir = self.workflow_dir(id);
        if !dir.is_dir() {
            return Err(Error::NotFound(format!(
                "workflow directory '{}' does not exist",
                dir.display()
            )));
        }

        let agents = load_document(&dir, AGENTS_DOCUMENT, id)?;
        let tasks = load_document(&dir, TASKS_DOCUMENT, id)?;
        debug!(workflow = %id, agents = agents.len(), tasks = tasks.len(), "Workflow config loaded");

        Ok(WorkflowConfig {
            id: id.to_string(),
            agents,
            tasks,
        })
    }

    /// Workflow identifiers found under the root, sorted, minus `exclude`
    pub fn available_workflows(&self, exclude: &[&str]) -> Result<Vec<String>> {
        let entries = fs::read_dir(&self.root).map_err(|e| {
            Error::NotFound(format!(
                "workflows directory '{}' is not readable: {e}",
                self.root.display()
            ))
        })?;

        let mut ids: Vec<String> = entries
            .filter_map(std::result::Result::ok)
            .filter(|entry| entry.path().is_dir())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|id| !exclude.contains(&id.as_str()))
            .collect();
        ids.sort();
        Ok(ids)
    }
}

fn load_document(dir: &Path, file: &str, id: &str) -> Result<Document> {
    let path = dir.join(file);
    if !path.is_file() {
        return Err(Error::NotFound(format!("{file} for workflow '{id}'")));
    }
    let text = fs::read_to_string(&path)
        .map_err(|e| Error::NotFound(format!("{file} for workflow '{id}' is not readable: {e}")))?;
    parse_document(&text, &format!("{file} of workflow '{id}'"))
}

/// Parse one config document into its ordered top-level entries
///
/// `label` names the document in error messages.
pub fn parse_document(text: &str, label: &str) -> Result<Document> {
    if text.trim().is_empty() {
        return Err(Error::Empty(format!("{label} is empty")));
    }

    let value: Value = serde_yaml::from_str(text)
        .map_err(|e| Error::Malformed(format!("{label} is not valid YAML: {e}")))?;

    let mapping = match value {
        Value::Mapping(mapping) if !mapping.is_empty() => mapping,
        Value::Mapping(_) | Value::Null => {
            return Err(Error::Empty(format!("{label} has no entries")));
        }
        _ => return Err(Error::Empty(format!("{label} is not a mapping of named entries"))),
    };

    let mut entries = Vec::with_capacity(mapping.len());
    for (key, value) in mapping {
        match key_to_string(&key) {
            Some(name) => entries.push((name, value)),
            None => warn!(document = %label, key = ?key, "Skipping entry with a non-scalar name"),
        }
    }
    Ok(entries)
}

fn key_to_string(key: &Value) -> Option<String> {
    match key {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crew_core::ErrorKind;
    use tempfile::TempDir;

    fn workflow(agents: Option<&str>, tasks: Option<&str>) -> (TempDir, ConfigLoader) {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("osint");
        fs::create_dir_all(&dir).unwrap();
        if let Some(agents) = agents {
            fs::write(dir.join(AGENTS_DOCUMENT), agents).unwrap();
        }
        if let Some(tasks) = tasks {
            fs::write(dir.join(TASKS_DOCUMENT), tasks).unwrap();
        }
        let loader = ConfigLoader::new(root.path());
        (root, loader)
    }

    #[test]
    fn test_load_preserves_declaration_order() {
        let (_root, loader) = workflow(
            Some("zulu:\n  role: Z\nalpha:\n  role: A\n"),
            Some("second:\n  description: B\nfirst:\n  description: A\n"),
        );
        let config = loader.load("osint").unwrap();

        let agent_names: Vec<_> = config.agents.iter().map(|(n, _)| n.as_str()).collect();
        let task_names: Vec<_> = config.tasks.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(agent_names, vec!["zulu", "alpha"]);
        assert_eq!(task_names, vec!["second", "first"]);
    }

    #[test]
    fn test_missing_directory() {
        let (_root, loader) = workflow(Some("a: {}"), Some("t: {}"));
        let err = loader.load("combined").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.to_string().contains("combined"));
    }

    #[test]
    fn test_missing_document_is_named() {
        let (_root, loader) = workflow(Some("a:\n  role: R\n"), None);
        let err = loader.load("osint").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.to_string().contains(TASKS_DOCUMENT));
    }

    #[test]
    fn test_malformed_yaml() {
        let (_root, loader) = workflow(Some("a: [unclosed\n"), Some("t: {}"));
        let err = loader.load("osint").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Malformed);
        assert!(err.to_string().contains(AGENTS_DOCUMENT));
    }

    #[test]
    fn test_empty_documents() {
        for text in ["", "   \n", "null", "{}", "- a\n- b\n", "just a string"] {
            let err = parse_document(text, "agents.yaml").unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Empty, "input {text:?}");
        }
    }

    #[test]
    fn test_scalar_keys_are_stringified() {
        let doc = parse_document("1:\n  role: One\ntrue:\n  role: Yes\n? [a, b]\n: x\n", "agents.yaml").unwrap();
        let names: Vec<_> = doc.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["1", "true"]);
    }

    #[test]
    fn test_available_workflows() {
        let root = tempfile::tempdir().unwrap();
        for id in ["osint", "wargames", "combined"] {
            fs::create_dir_all(root.path().join(id)).unwrap();
        }
        fs::write(root.path().join("README.md"), "not a workflow").unwrap();

        let loader = ConfigLoader::new(root.path());
        assert_eq!(
            loader.available_workflows(&["wargames"]).unwrap(),
            vec!["combined", "osint"]
        );
        assert_eq!(loader.available_workflows(&[]).unwrap().len(), 3);
    }
}
