use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use super::{FeedbackAdvisor, Strategy};
use crate::data::Bucket;
use crate::error::{StrategyOutcome, StrategyResult};
use crate::program::{OptimizedProgram, Program};

/// A trajectory description shorter than this can't carry enough signal for
/// the feedback prompt to be worth sending (spec §4.4.2).
pub const MIN_DESCRIPTION_LEN: usize = 50;

/// Asks an LM to turn the contrast between a bucket's successes and
/// failures into a refined instruction (spec §4.4.2).
///
/// Grounded on the teacher's `COPRO::score_candidate` save/restore-around-a-
/// risky-call shape (`optimizer/copro.rs`) for "do something that can fail
/// mid-flight, recover cleanly" — here the risky call is the feedback LM
/// request rather than a scoring pass.
pub struct AppendRule {
    advisor: Arc<dyn FeedbackAdvisor>,
}

impl AppendRule {
    pub fn new(advisor: Arc<dyn FeedbackAdvisor>) -> Self {
        Self { advisor }
    }

    fn build_prompt(&self, current_instruction: &str, bucket: &Bucket) -> String {
        let descriptions: Vec<String> = bucket.trajectories().iter().map(|t| t.describe()).collect();
        format!(
            "Current instruction:\n{current_instruction}\n\n\
             The following trajectories were produced by this instruction on the same \
             input, with varying success. Propose a revised instruction that keeps what \
             works and fixes what doesn't.\n\n{}\n\n\
             Respond with a JSON object of the form {{\"instruction\": \"...\"}}.",
            descriptions.join("\n---\n")
        )
    }

    fn parse_response(&self, response: &str) -> Result<String, String> {
        let parsed: Value = serde_json::from_str(response.trim())
            .map_err(|e| format!("could not parse response as JSON: {e}"))?;
        let instruction = parsed
            .get("instruction")
            .and_then(Value::as_str)
            .ok_or_else(|| "response is valid JSON but missing a string 'instruction' field (invalid format)".to_string())?;
        if instruction.trim().is_empty() {
            return Err("response instruction field is empty (invalid content)".to_string());
        }
        Ok(instruction.to_string())
    }
}

#[async_trait]
impl Strategy for AppendRule {
    fn name(&self) -> &str {
        "append_rule"
    }

    fn is_applicable(&self, _program: &Arc<dyn Program>, bucket: &Bucket) -> bool {
        bucket.successful_count > 0
            && bucket.failed_count > 0
            && bucket
                .trajectories()
                .iter()
                .all(|t| t.describe().len() >= MIN_DESCRIPTION_LEN)
    }

    async fn apply(
        &self,
        program: &Arc<dyn Program>,
        bucket: &Bucket,
    ) -> StrategyResult<Arc<dyn Program>> {
        if bucket.successful_count == 0 || bucket.failed_count == 0 {
            return Ok(StrategyOutcome::Skip(
                "bucket lacks both a success and a failure to contrast".into(),
            ));
        }

        let current_instruction = match program.instruction() {
            Some(instruction) => instruction,
            None => {
                if program.with_instruction(String::new()).is_none() {
                    return Ok(StrategyOutcome::Skip("program has no instruction slot".into()));
                }
                String::new()
            }
        };

        for trajectory in bucket.trajectories() {
            if trajectory.describe().len() < MIN_DESCRIPTION_LEN {
                return Ok(StrategyOutcome::Skip(
                    "trajectory description too short to build a feedback prompt (response format unusable)".into(),
                ));
            }
        }

        let prompt = self.build_prompt(&current_instruction, bucket);

        let response = match self.advisor.propose_rule(&prompt).await {
            Ok(response) => response,
            Err(crate::error::ExecutionError::Timeout(_)) => {
                return Ok(StrategyOutcome::Skip("feedback advisor call timed out".into()));
            }
            Err(err) => {
                return Ok(StrategyOutcome::Skip(format!(
                    "feedback advisor call failed: {err} (invalid response)"
                )));
            }
        };

        let new_instruction = match self.parse_response(&response) {
            Ok(instruction) => instruction,
            Err(reason) => return Ok(StrategyOutcome::Skip(reason)),
        };

        let new_program = OptimizedProgram::wrap(program.clone(), Some(new_instruction), None);
        Ok(StrategyOutcome::Applied(new_program))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Example, ModelConfig, Outputs, Trajectory};
    use crate::error::ExecutionError;
    use std::collections::HashMap;
    use std::time::Duration;

    struct FixedAdvisor(String);

    #[async_trait]
    impl FeedbackAdvisor for FixedAdvisor {
        async fn propose_rule(&self, _prompt: &str) -> Result<String, ExecutionError> {
            Ok(self.0.clone())
        }
    }

    struct InstructedProgram {
        instruction: String,
    }

    #[async_trait]
    impl Program for InstructedProgram {
        async fn forward(
            &self,
            _inputs: &Example,
            _model_config: &ModelConfig,
        ) -> Result<Outputs, ExecutionError> {
            Ok(Outputs::default())
        }

        fn instruction(&self) -> Option<String> {
            Some(self.instruction.clone())
        }

        fn with_instruction(&self, instruction: String) -> Option<Arc<dyn Program>> {
            Some(Arc::new(InstructedProgram { instruction }))
        }

        fn with_demos(&self, _demos: Vec<Example>) -> Option<Arc<dyn Program>> {
            None
        }
    }

    fn example(tag: &str) -> Example {
        Example::new(
            HashMap::from([("q".to_string(), serde_json::json!(tag))]),
            vec!["q".to_string()],
        )
    }

    fn mixed_bucket() -> Bucket {
        Bucket::new(vec![
            Trajectory::success(
                0,
                example("ok"),
                Outputs::new(HashMap::from([("a".to_string(), serde_json::json!("4"))])),
                0.9,
                Duration::from_millis(5),
                ModelConfig::default(),
                0,
            ),
            Trajectory::failed(
                0,
                example("bad"),
                ExecutionError::ProgramCall("wrong answer".into()),
                Duration::from_millis(5),
                ModelConfig::default(),
                1,
            ),
        ])
        .unwrap()
    }

    #[tokio::test]
    async fn applies_instruction_from_well_formed_response() {
        let bucket = mixed_bucket();
        let program: Arc<dyn Program> = Arc::new(InstructedProgram {
            instruction: "solve the problem".into(),
        });
        let strategy = AppendRule::new(Arc::new(FixedAdvisor(
            r#"{"instruction": "show your work before answering"}"#.into(),
        )));

        assert!(strategy.is_applicable(&program, &bucket));
        let outcome = strategy.apply(&program, &bucket).await.unwrap();
        let new_program = outcome.into_applied().expect("should apply");
        assert_eq!(
            new_program.instruction().as_deref(),
            Some("show your work before answering")
        );
    }

    #[tokio::test]
    async fn rejects_malformed_response() {
        let bucket = mixed_bucket();
        let program: Arc<dyn Program> = Arc::new(InstructedProgram {
            instruction: "solve the problem".into(),
        });
        let strategy = AppendRule::new(Arc::new(FixedAdvisor("not json at all".into())));

        let outcome = strategy.apply(&program, &bucket).await.unwrap();
        match outcome {
            StrategyOutcome::Skip(reason) => assert!(reason.contains("parse")),
            StrategyOutcome::Applied(_) => panic!("malformed response should not apply"),
        }
    }
}
