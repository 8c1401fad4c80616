//! Error types for decisioncrew

use thiserror::Error;

/// Result type alias for decisioncrew
pub type Result<T> = std::result::Result<T, Error>;

/// Prefix used when an error is flattened into display text
///
/// Only the outermost boundary (the CLI) should produce marked strings.
pub const ERROR_MARKER: &str = "An error occurred";

/// Error type for workflow assembly and execution
#[derive(Error, Debug)]
pub enum Error {
    /// A workflow directory or config document does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// A config document could not be parsed, or a required field is missing
    #[error("Malformed configuration: {0}")]
    Malformed(String),

    /// A config document parsed to nothing
    #[error("Empty configuration: {0}")]
    Empty(String),

    /// The workflow as a whole is unusable (no agents, no tasks, cycles)
    #[error("Configuration error: {0}")]
    Config(String),

    /// The model layer rejected an agent's parameters
    #[error("Agent build failed: {0}")]
    Build(String),

    /// A task failed during the sequential run
    #[error("Task '{task}' failed: {message}")]
    Run {
        /// Name of the task that failed
        task: String,
        /// Underlying failure message
        message: String,
    },

    /// Agent or tool processing failed
    #[error("Agent processing failed: {0}")]
    Processing(String),
}

/// Discriminant of [`Error`], useful for callers that branch on the category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    Malformed,
    Empty,
    Config,
    Build,
    Run,
    Processing,
}

impl Error {
    /// Get the category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Malformed(_) => ErrorKind::Malformed,
            Self::Empty(_) => ErrorKind::Empty,
            Self::Config(_) => ErrorKind::Config,
            Self::Build(_) => ErrorKind::Build,
            Self::Run { .. } => ErrorKind::Run,
            Self::Processing(_) => ErrorKind::Processing,
        }
    }

    /// Whether the error was raised while assembling the workflow (before any task ran)
    pub fn is_build_time(&self) -> bool {
        !matches!(self.kind(), ErrorKind::Run | ErrorKind::Processing)
    }

    /// Render the error with the legacy marker prefix
    ///
    /// `scope` names what was executing, e.g. `"crew"` or `"wargames"`.
    pub fn to_marked_string(&self, scope: &str) -> String {
        format!("{ERROR_MARKER} during {scope} execution: {self}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(Error::NotFound("x".into()).kind(), ErrorKind::NotFound);
        assert_eq!(Error::Empty("x".into()).kind(), ErrorKind::Empty);
        assert_eq!(
            Error::Run {
                task: "t".into(),
                message: "boom".into()
            }
            .kind(),
            ErrorKind::Run
        );
    }

    #[test]
    fn test_build_time_classification() {
        assert!(Error::Config("no valid tasks".into()).is_build_time());
        assert!(Error::Build("bad schema".into()).is_build_time());
        assert!(!Error::Processing("timeout".into()).is_build_time());
    }

    #[test]
    fn test_marked_string() {
        let err = Error::Run {
            task: "summarize".into(),
            message: "model unavailable".into(),
        };
        let text = err.to_marked_string("crew");
        assert!(text.starts_with(ERROR_MARKER));
        assert_eq!(
            text,
            "An error occurred during crew execution: Task 'summarize' failed: model unavailable"
        );
    }
}
