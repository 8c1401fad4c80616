//! Settings read from the environment

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Directory holding one sub-directory per workflow
pub const WORKFLOWS_DIR_VAR: &str = "DECISIONCREW_WORKFLOWS_DIR";
/// Model every agent talks to
pub const MODEL_VAR: &str = "MODEL_NAME";
/// Tool-loop iteration cap per task
pub const MAX_ITERATIONS_VAR: &str = "DECISIONCREW_MAX_ITERATIONS";

const DEFAULT_WORKFLOWS_DIR: &str = "config/workflows";
const DEFAULT_MODEL: &str = "gpt-4o";
const DEFAULT_MAX_ITERATIONS: usize = 10;

/// Errors raised while reading settings
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("Invalid value for {var}: '{value}' ({reason})")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Runtime settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Root of the workflow configuration tree
    pub workflows_dir: PathBuf,
    /// Model name passed to the completion client
    pub model: String,
    /// Maximum tool-loop iterations per task
    pub max_iterations: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            workflows_dir: PathBuf::from(DEFAULT_WORKFLOWS_DIR),
            model: DEFAULT_MODEL.to_string(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl Settings {
    /// Read settings from the process environment
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read settings through an arbitrary variable lookup
    ///
    /// Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());
        let mut settings = Self::default();

        if let Some(dir) = get(WORKFLOWS_DIR_VAR) {
            settings.workflows_dir = PathBuf::from(dir);
        }
        if let Some(model) = get(MODEL_VAR) {
            settings.model = model;
        }
        if let Some(raw) = get(MAX_ITERATIONS_VAR) {
            settings.max_iterations = match raw.trim().parse::<usize>() {
                Ok(0) => {
                    return Err(SettingsError::Invalid {
                        var: MAX_ITERATIONS_VAR,
                        value: raw,
                        reason: "must be at least 1".to_string(),
                    });
                }
                Ok(n) => n,
                Err(e) => {
                    return Err(SettingsError::Invalid {
                        var: MAX_ITERATIONS_VAR,
                        value: raw,
                        reason: e.to_string(),
                    });
                }
            };
        }

        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.model, "gpt-4o");
        assert_eq!(settings.workflows_dir, PathBuf::from("config/workflows"));
    }

    #[test]
    fn test_overrides() {
        let settings = Settings::from_lookup(lookup(&[
            (WORKFLOWS_DIR_VAR, "/srv/workflows"),
            (MODEL_VAR, "gpt-4o-mini"),
            (MAX_ITERATIONS_VAR, " 4 "),
        ]))
        .unwrap();

        assert_eq!(settings.workflows_dir, PathBuf::from("/srv/workflows"));
        assert_eq!(settings.model, "gpt-4o-mini");
        assert_eq!(settings.max_iterations, 4);
    }

    #[test]
    fn test_blank_values_fall_back() {
        let settings = Settings::from_lookup(lookup(&[(MODEL_VAR, "  ")])).unwrap();
        assert_eq!(settings.model, "gpt-4o");
    }

    #[test]
    fn test_invalid_iterations() {
        for bad in ["zero", "0", "-1"] {
            let err = Settings::from_lookup(lookup(&[(MAX_ITERATIONS_VAR, bad)])).unwrap_err();
            assert!(err.to_string().contains(MAX_ITERATIONS_VAR));
        }
    }
}
