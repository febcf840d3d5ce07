//! Strategies turn a viable bucket into a new candidate program (spec §4.4).
//!
//! Grounded on the teacher's `COPRO::score_candidate`, which saves and
//! restores predictor state around a scoring attempt — the same
//! save/try/restore shape this module's strategies use around the "try to
//! build a new program, fall back cleanly on `Skip`/`Error`" contract.

mod append_demo;
mod append_rule;
mod feedback_advisor;
mod registry;

pub use append_demo::AppendDemo;
pub use append_rule::AppendRule;
pub use feedback_advisor::FeedbackAdvisor;
pub use registry::StrategyRegistry;

use std::sync::Arc;

use async_trait::async_trait;

use crate::data::Bucket;
use crate::error::StrategyResult;
use crate::program::Program;

/// A named transformation from a viable bucket to a new candidate program.
#[async_trait]
pub trait Strategy: Send + Sync {
    fn name(&self) -> &str;

    /// Whether this strategy is worth trying against `program`/`bucket` at
    /// all, before paying for `apply`'s (possibly LM-calling) work.
    fn is_applicable(&self, program: &Arc<dyn Program>, bucket: &Bucket) -> bool;

    async fn apply(
        &self,
        program: &Arc<dyn Program>,
        bucket: &Bucket,
    ) -> StrategyResult<Arc<dyn Program>>;
}
