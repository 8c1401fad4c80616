//! Run-time parameters for a workflow invocation
//!
//! `Inputs` is a flat string map whose entries are substituted into task
//! instruction templates (`{topic}`, `{user_action}`, ...).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Well-known input keys used by the bundled workflows
pub mod keys {
    /// Free-text research question for intelligence workflows
    pub const TOPIC: &str = "topic";
    /// Intelligence report a wargame is grounded in
    pub const INTELLIGENCE_CONTEXT: &str = "intelligence_context";
    /// Move the user wants simulated in a wargame
    pub const USER_ACTION: &str = "user_action";
}

/// Named string values supplied to a workflow run
///
/// # Example
///
/// ```
/// use crew_core::Inputs;
///
/// let inputs = Inputs::new()
///     .with_topic("Regional energy security")
///     .with("region", "Baltic");
///
/// assert_eq!(inputs.topic(), Some("Regional energy security"));
/// assert_eq!(inputs.get("region"), Some("Baltic"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Inputs {
    values: BTreeMap<String, String>,
}

impl Inputs {
    /// Create an empty set of inputs
    pub fn new() -> Self {
        Self::default()
    }

    // =========== Builder Methods ===========

    /// Add an arbitrary named value
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Set the research topic
    pub fn with_topic(self, topic: impl Into<String>) -> Self {
        self.with(keys::TOPIC, topic)
    }

    /// Set the intelligence context for a wargame
    pub fn with_intelligence_context(self, context: impl Into<String>) -> Self {
        self.with(keys::INTELLIGENCE_CONTEXT, context)
    }

    /// Set the user action for a wargame
    pub fn with_user_action(self, action: impl Into<String>) -> Self {
        self.with(keys::USER_ACTION, action)
    }

    // =========== Common Accessors ===========

    /// Get the research topic
    pub fn topic(&self) -> Option<&str> {
        self.get(keys::TOPIC)
    }

    /// Get the intelligence context
    pub fn intelligence_context(&self) -> Option<&str> {
        self.get(keys::INTELLIGENCE_CONTEXT)
    }

    /// Get the user action
    pub fn user_action(&self) -> Option<&str> {
        self.get(keys::USER_ACTION)
    }

    // =========== Generic Key-Value Operations ===========

    /// Insert a value, replacing any previous value for the key
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Get a value by key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Check if a key exists
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Iterate over all entries in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Get the number of entries
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if there are no entries
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Merge another set of inputs into this one (other values override)
    pub fn merge(&mut self, other: Inputs) {
        self.values.extend(other.values);
    }
}

impl<K, V> FromIterator<(K, V)> for Inputs
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut inputs = Self::new();
        for (k, v) in iter {
            inputs.insert(k, v);
        }
        inputs
    }
}
