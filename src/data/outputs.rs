use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The result of `Program::forward` — a field -> value mapping, mirroring
/// [`super::Example`]'s `data` shape (spec §6: `forward(inputs) -> outputs`).
///
/// Grounded on the teacher's `data::prediction::Prediction`, minus the
/// `lm_usage` field: LM call accounting belongs to the external LM client
/// collaborator (spec §1, out of scope), not the core data model.
#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq)]
pub struct Outputs {
    pub data: HashMap<String, Value>,
}

impl Outputs {
    pub fn new(data: HashMap<String, Value>) -> Self {
        Self { data }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }
}

impl From<HashMap<String, Value>> for Outputs {
    fn from(data: HashMap<String, Value>) -> Self {
        Self { data }
    }
}
