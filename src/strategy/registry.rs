use std::sync::Arc;

use async_trait::async_trait;

use super::Strategy;
use crate::data::Bucket;
use crate::error::{StrategyOutcome, StrategyResult};
use crate::program::Program;

/// An ordered list of strategies tried in sequence against a viable bucket;
/// the first one that returns `Applied` wins (spec §4.4: "first-applicable").
///
/// `names()` is an introspection helper beyond the base contract — useful
/// for telemetry and tests that want to assert which strategies are wired
/// in without hardcoding a list (grounded on the teacher's
/// `optimizer::predictor_names` helper, `optimizer/mod.rs`).
pub struct StrategyRegistry {
    strategies: Vec<Arc<dyn Strategy>>,
}

impl StrategyRegistry {
    pub fn new(strategies: Vec<Arc<dyn Strategy>>) -> Self {
        Self { strategies }
    }

    pub fn names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Tries each applicable strategy in order, returning the first
    /// `Applied` outcome. If every applicable strategy skips or errors,
    /// returns the last `Skip` reason seen (or a generic one if none were
    /// even applicable).
    pub async fn apply_first(
        &self,
        program: &Arc<dyn Program>,
        bucket: &Bucket,
    ) -> StrategyResult<Arc<dyn Program>> {
        let mut last_skip = "no applicable strategy for this bucket".to_string();

        for strategy in &self.strategies {
            if !strategy.is_applicable(program, bucket) {
                continue;
            }
            match strategy.apply(program, bucket).await? {
                StrategyOutcome::Applied(new_program) => {
                    return Ok(StrategyOutcome::Applied(new_program));
                }
                StrategyOutcome::Skip(reason) => last_skip = reason,
            }
        }

        Ok(StrategyOutcome::Skip(last_skip))
    }
}

#[async_trait]
impl Strategy for StrategyRegistry {
    fn name(&self) -> &str {
        "registry"
    }

    fn is_applicable(&self, program: &Arc<dyn Program>, bucket: &Bucket) -> bool {
        self.strategies.iter().any(|s| s.is_applicable(program, bucket))
    }

    async fn apply(
        &self,
        program: &Arc<dyn Program>,
        bucket: &Bucket,
    ) -> StrategyResult<Arc<dyn Program>> {
        self.apply_first(program, bucket).await
    }
}
