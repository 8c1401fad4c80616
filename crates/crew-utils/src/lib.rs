//! Shared utilities for decisioncrew
//!
//! This crate provides functionality used across the workspace: logging
//! setup and settings read from the environment.

pub mod config;
pub mod logging;

pub use config::{Settings, SettingsError};
pub use logging::init_tracing;
