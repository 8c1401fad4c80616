//! Core abstractions for decisioncrew
//!
//! This crate defines the types shared by every layer of the workflow engine:
//! the [`Agent`] trait that tasks are executed against, the [`Inputs`] map of
//! run-time parameters, and the [`Error`] taxonomy.

pub mod agent;
pub mod error;
pub mod inputs;

pub use agent::{Agent, Assignment, ContextEntry};
pub use error::{ERROR_MARKER, Error, ErrorKind, Result};
pub use inputs::Inputs;
