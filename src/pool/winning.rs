use std::collections::VecDeque;
use std::sync::Arc;

use crate::program::Program;

/// Programs that crossed the winning threshold, most recent first.
pub const WINNING_CAP: usize = 20;
/// Minimum score for a program to be recorded as a winner.
pub const WINNING_THRESHOLD: f32 = 0.5;

/// A bounded, recency-ordered record of programs that scored at least
/// [`WINNING_THRESHOLD`] (spec §4.3). Used to seed the final result and to
/// give later strategies something proven to build on.
#[derive(Default)]
pub struct WinningPrograms {
    entries: VecDeque<(Arc<dyn Program>, f32)>,
}

impl WinningPrograms {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::new(),
        }
    }

    /// Records `program` if `score` clears the winning threshold. Newest
    /// winners sit at the front; once at capacity, the oldest winner is
    /// dropped regardless of its score.
    pub fn record(&mut self, program: Arc<dyn Program>, score: f32) {
        if score < WINNING_THRESHOLD {
            return;
        }
        self.entries.push_front((program, score));
        self.entries.truncate(WINNING_CAP);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn best(&self) -> Option<&Arc<dyn Program>> {
        self.entries
            .iter()
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(program, _)| program)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Arc<dyn Program>, f32)> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Example, ModelConfig, Outputs};
    use crate::error::ExecutionError;
    use async_trait::async_trait;

    struct StubProgram;

    #[async_trait]
    impl Program for StubProgram {
        async fn forward(
            &self,
            _inputs: &Example,
            _model_config: &ModelConfig,
        ) -> Result<Outputs, ExecutionError> {
            Ok(Outputs::default())
        }

        fn with_instruction(&self, _instruction: String) -> Option<Arc<dyn Program>> {
            None
        }

        fn with_demos(&self, _demos: Vec<Example>) -> Option<Arc<dyn Program>> {
            None
        }
    }

    #[test]
    fn below_threshold_is_not_recorded() {
        let mut winners = WinningPrograms::new();
        winners.record(Arc::new(StubProgram), 0.49);
        assert!(winners.is_empty());
    }

    #[test]
    fn capacity_drops_oldest_first() {
        let mut winners = WinningPrograms::new();
        for _ in 0..(WINNING_CAP + 5) {
            winners.record(Arc::new(StubProgram), 0.9);
        }
        assert_eq!(winners.len(), WINNING_CAP);
    }
}
