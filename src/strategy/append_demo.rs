use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use super::Strategy;
use crate::data::{Bucket, Example};
use crate::error::{StrategyOutcome, StrategyResult};
use crate::program::{OptimizedProgram, Program};

/// Minimum score a trajectory must clear to be promoted to a demo.
pub const MIN_DEMO_SCORE: f32 = 0.7;
/// Demo fields longer than this (in chars) are truncated before being
/// appended to a program's demo set.
pub const DEMO_INPUT_FIELD_MAXLEN: usize = 100_000;
/// A program never carries more than this many demos.
pub const MAX_DEMOS: usize = 4;

/// Promotes the best trajectory in a bucket to a few-shot demo on the
/// program, when that trajectory is good enough to imitate (spec §4.4.1).
///
/// Grounded on the teacher's `Demo<S>` (`predictors/predict.rs`) as the
/// shape a demo takes — an input/output pair attached to a predictor —
/// generalized to the untyped `Example` this crate's `Program` works with.
pub struct AppendDemo;

#[async_trait]
impl Strategy for AppendDemo {
    fn name(&self) -> &str {
        "append_demo"
    }

    fn is_applicable(&self, program: &Arc<dyn Program>, bucket: &Bucket) -> bool {
        let demo_count = program.demos().map(|d| d.len()).unwrap_or(0);
        demo_count < MAX_DEMOS
            && bucket
                .best()
                .map(|t| t.success && t.score >= MIN_DEMO_SCORE)
                .unwrap_or(false)
    }

    async fn apply(
        &self,
        program: &Arc<dyn Program>,
        bucket: &Bucket,
    ) -> StrategyResult<Arc<dyn Program>> {
        let mut demos = program.demos().unwrap_or_default();
        if demos.len() >= MAX_DEMOS {
            return Ok(StrategyOutcome::Skip(format!(
                "program already carries {} demos, at capacity {MAX_DEMOS}",
                demos.len()
            )));
        }

        let Some(best) = bucket.best() else {
            return Ok(StrategyOutcome::Skip("bucket has no trajectories".into()));
        };
        if !best.success || best.score < MIN_DEMO_SCORE {
            return Ok(StrategyOutcome::Skip(format!(
                "best trajectory score {:.3} below threshold {MIN_DEMO_SCORE}",
                best.score
            )));
        }
        let Some(outputs) = &best.outputs else {
            return Ok(StrategyOutcome::Skip("best trajectory has no outputs".into()));
        };

        if program.demos().is_none() && program.with_demos(Vec::new()).is_none() {
            return Ok(StrategyOutcome::Skip("program has no demo slot".into()));
        }

        let mut data: HashMap<String, serde_json::Value> = best.example.inputs();
        for (key, value) in &outputs.data {
            data.insert(key.clone(), value.clone());
        }
        let mut demo = Example::new(data, best.example.input_keys.clone());
        for field in &demo.input_keys.clone() {
            demo = demo.with_truncated_field(field, DEMO_INPUT_FIELD_MAXLEN);
        }

        demos.push(demo);

        let new_program = OptimizedProgram::wrap(program.clone(), None, Some(demos));
        Ok(StrategyOutcome::Applied(new_program))
    }
}
