use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An opaque model configuration handed to `Program::forward` at call time.
///
/// The core never interprets these fields — concrete LM plumbing (provider,
/// model name, temperature, ...) lives in the external LM client collaborator
/// (spec §1, §6). The sampler just round-robins through a provided list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ModelConfig {
    pub name: String,
    pub params: Vec<(String, String)>,
}

impl ModelConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self::new("default")
    }
}

/// Arbitrary structured metadata attached to a trajectory; always carries
/// `exec_id` (spec §4.2).
pub type Metadata = HashMap<String, Value>;
