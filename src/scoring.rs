//! Scoring functions compare a program's outputs against an example's
//! labels to produce the `f32` score every trajectory carries (spec §3, §6).

use std::sync::Arc;

use crate::data::{Example, Outputs};

pub type ScoringFn = Arc<dyn Fn(&Example, &Outputs) -> f32 + Send + Sync>;

/// Scores 1.0 if `outputs[field]` equals the example's label for `field`
/// exactly (by JSON value equality), else 0.0.
pub fn exact_match(field: impl Into<String>) -> ScoringFn {
    let field = field.into();
    Arc::new(move |example, outputs| {
        let expected = example.get(&field);
        let actual = outputs.get(&field);
        match (expected, actual) {
            (Some(expected), Some(actual)) if expected == actual => 1.0,
            _ => 0.0,
        }
    })
}

/// Scores 1.0 if the expected label, as a string, appears as a substring of
/// the output field (case-folded). Falls back to [`exact_match`] semantics
/// when either side isn't a JSON string.
pub fn contains_match(field: impl Into<String>) -> ScoringFn {
    let field = field.into();
    Arc::new(move |example, outputs| {
        let expected = example.get(&field);
        let actual = outputs.get(&field);
        match (expected, actual) {
            (Some(serde_json::Value::String(expected)), Some(serde_json::Value::String(actual))) => {
                if actual.to_lowercase().contains(&expected.to_lowercase()) {
                    1.0
                } else {
                    0.0
                }
            }
            (Some(expected), Some(actual)) if expected == actual => 1.0,
            _ => 0.0,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn example_and_outputs(expected: &str, actual: &str) -> (Example, Outputs) {
        let example = Example::new(
            HashMap::from([("answer".to_string(), serde_json::json!(expected))]),
            vec![],
        );
        let outputs = Outputs::new(HashMap::from([(
            "answer".to_string(),
            serde_json::json!(actual),
        )]));
        (example, outputs)
    }

    #[test]
    fn exact_match_requires_equality() {
        let scorer = exact_match("answer");
        let (example, outputs) = example_and_outputs("42", "42");
        assert_eq!(scorer(&example, &outputs), 1.0);
        let (example, outputs) = example_and_outputs("42", "43");
        assert_eq!(scorer(&example, &outputs), 0.0);
    }

    #[test]
    fn contains_match_is_case_insensitive_substring() {
        let scorer = contains_match("answer");
        let (example, outputs) = example_and_outputs("paris", "The answer is Paris.");
        assert_eq!(scorer(&example, &outputs), 1.0);
    }

    #[test]
    fn contains_match_falls_back_to_exact_for_non_strings() {
        let scorer = contains_match("answer");
        let example = Example::new(
            HashMap::from([("answer".to_string(), serde_json::json!(42))]),
            vec![],
        );
        let outputs = Outputs::new(HashMap::from([("answer".to_string(), serde_json::json!(42))]));
        assert_eq!(scorer(&example, &outputs), 1.0);
    }
}
