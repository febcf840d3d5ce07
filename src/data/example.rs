use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A record with a `data` mapping of field -> value and a set of `input_keys`
/// marking which fields are inputs; remaining fields are labels (spec §3).
///
/// Immutable once constructed, and structurally equal on `(data, input_keys)`.
/// Grounded on the teacher's untyped `data::example::Example` (the "wire
/// format" example type used by its data loaders), generalized with JSON
/// values instead of strings so labels can carry non-string data.
#[derive(Serialize, Deserialize, Default, Debug, Clone)]
pub struct Example {
    pub data: HashMap<String, Value>,
    pub input_keys: Vec<String>,
}

impl PartialEq for Example {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data && self.same_input_keys(other)
    }
}

impl Example {
    pub fn new(data: HashMap<String, Value>, input_keys: Vec<String>) -> Self {
        Self { data, input_keys }
    }

    fn same_input_keys(&self, other: &Self) -> bool {
        let mut a = self.input_keys.clone();
        let mut b = other.input_keys.clone();
        a.sort();
        b.sort();
        a == b
    }

    /// Fields in `data` that are not in `input_keys` — the labels.
    pub fn output_keys(&self) -> Vec<String> {
        self.data
            .keys()
            .filter(|key| !self.input_keys.contains(key))
            .cloned()
            .collect()
    }

    /// Just the input fields, as a fresh mapping — what gets passed to
    /// `Program::forward`.
    pub fn inputs(&self) -> HashMap<String, Value> {
        self.input_keys
            .iter()
            .filter_map(|key| self.data.get(key).map(|v| (key.clone(), v.clone())))
            .collect()
    }

    /// Just the label fields, as a fresh mapping.
    pub fn labels(&self) -> HashMap<String, Value> {
        self.output_keys()
            .into_iter()
            .filter_map(|key| self.data.get(&key).map(|v| (key.clone(), v.clone())))
            .collect()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Returns a copy with `input_field` truncated to at most `max_len` chars
    /// if it is a string longer than that. Used by `AppendDemo` (spec §4.4.1)
    /// to avoid pathological prompts.
    pub fn with_truncated_field(&self, field: &str, max_len: usize) -> Self {
        let mut data = self.data.clone();
        if let Some(Value::String(s)) = data.get(field) {
            if s.chars().count() > max_len {
                let truncated: String = s.chars().take(max_len).collect();
                data.insert(field.to_string(), Value::String(truncated));
            }
        }
        Self {
            data,
            input_keys: self.input_keys.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn inputs_and_labels_partition_data() {
        let example = Example::new(
            HashMap::from([
                ("question".to_string(), json!("2+2")),
                ("answer".to_string(), json!("4")),
            ]),
            vec!["question".to_string()],
        );

        assert_eq!(example.inputs().len(), 1);
        assert_eq!(example.labels().len(), 1);
        assert_eq!(example.inputs().get("question"), Some(&json!("2+2")));
        assert_eq!(example.labels().get("answer"), Some(&json!("4")));
    }

    #[test]
    fn equality_is_structural_and_order_independent_on_input_keys() {
        let a = Example::new(
            HashMap::from([("x".to_string(), json!(1)), ("y".to_string(), json!(2))]),
            vec!["x".to_string(), "y".to_string()],
        );
        let b = Example::new(
            HashMap::from([("x".to_string(), json!(1)), ("y".to_string(), json!(2))]),
            vec!["y".to_string(), "x".to_string()],
        );
        assert_eq!(a, b);
    }

    #[test]
    fn truncate_long_string_field() {
        let example = Example::new(
            HashMap::from([("question".to_string(), json!("a".repeat(10)))]),
            vec!["question".to_string()],
        );
        let truncated = example.with_truncated_field("question", 3);
        assert_eq!(truncated.get("question"), Some(&json!("aaa")));
    }
}
