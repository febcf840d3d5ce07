use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use dspex::data::{Example, ModelConfig, Outputs};
use dspex::error::ExecutionError;
use dspex::program::Program;
use dspex::scoring::exact_match;
use dspex::strategy::{AppendDemo, AppendRule, FeedbackAdvisor, StrategyRegistry};
use dspex::teleprompter::{Teleprompter, TeleprompterOptions};

/// Doubles its input when told to ("double" in the instruction), otherwise
/// just adds one — wrong for every input but 1, which is exactly enough
/// disagreement for a bucket to be viable without any randomness involved.
struct ArithmeticProgram {
    instruction: Option<String>,
    demos: Vec<Example>,
}

impl ArithmeticProgram {
    fn new(instruction: impl Into<String>) -> Self {
        Self {
            instruction: Some(instruction.into()),
            demos: Vec::new(),
        }
    }
}

#[async_trait]
impl Program for ArithmeticProgram {
    async fn forward(&self, inputs: &Example, _model_config: &ModelConfig) -> Result<Outputs, ExecutionError> {
        let x = inputs.get("x").and_then(|v| v.as_i64()).unwrap_or(0);
        let doubling = self.instruction.as_deref().map(|i| i.contains("double")).unwrap_or(false);
        let y = if doubling { x * 2 } else { x + 1 };
        Ok(Outputs::new(HashMap::from([("y".to_string(), json!(y))])))
    }

    fn instruction(&self) -> Option<String> {
        self.instruction.clone()
    }

    fn demos(&self) -> Option<Vec<Example>> {
        Some(self.demos.clone())
    }

    fn with_instruction(&self, instruction: String) -> Option<Arc<dyn Program>> {
        Some(Arc::new(Self {
            instruction: Some(instruction),
            demos: self.demos.clone(),
        }))
    }

    fn with_demos(&self, demos: Vec<Example>) -> Option<Arc<dyn Program>> {
        Some(Arc::new(Self {
            instruction: self.instruction.clone(),
            demos,
        }))
    }
}

struct FixedAdvisor(&'static str);

#[async_trait]
impl FeedbackAdvisor for FixedAdvisor {
    async fn propose_rule(&self, _prompt: &str) -> Result<String, ExecutionError> {
        Ok(self.0.to_string())
    }
}

fn trainset() -> Vec<Example> {
    (1..=6)
        .map(|x| {
            Example::new(
                HashMap::from([
                    ("x".to_string(), json!(x)),
                    ("y".to_string(), json!(x * 2)),
                ]),
                vec!["x".to_string()],
            )
        })
        .collect()
}

#[tokio::test]
async fn compile_discovers_the_doubling_instruction() {
    let student: Arc<dyn Program> = Arc::new(ArithmeticProgram::new("add one to the input"));
    let teacher: Arc<dyn Program> = Arc::new(ArithmeticProgram::new("double the input"));

    let advisor = Arc::new(FixedAdvisor(
        r#"{"instruction": "double the input, don't just add one"}"#,
    ));
    let strategies = StrategyRegistry::new(vec![Arc::new(AppendDemo), Arc::new(AppendRule::new(advisor))]);

    let options = TeleprompterOptions::builder()
        .seed(42)
        .max_iterations(5)
        .examples_per_iteration(6)
        .programs_per_iteration(2)
        .build();
    let teleprompter = Teleprompter::new(options);

    let optimized = teleprompter
        .compile(student, teacher, trainset(), exact_match("y"), strategies)
        .await
        .expect("compile should succeed with a non-empty trainset");

    let instruction = optimized.instruction().unwrap_or_default();
    assert!(
        instruction.contains("double"),
        "expected the optimized instruction to mention doubling, got: {instruction}"
    );
}

#[tokio::test]
async fn compile_rejects_an_empty_trainset() {
    let student: Arc<dyn Program> = Arc::new(ArithmeticProgram::new("add one"));
    let strategies = StrategyRegistry::new(vec![]);
    let teleprompter = Teleprompter::new(TeleprompterOptions::builder().build());

    let result = teleprompter
        .compile(student.clone(), student, vec![], exact_match("y"), strategies)
        .await;

    assert!(matches!(result, Err(dspex::TeleprompterError::EmptyTrainset)));
}
