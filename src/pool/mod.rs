//! The candidate pool the teleprompter searches over (spec §4.3).
//!
//! Grounded on the teacher's `ParetoFrontier` (`optimizer/pareto.rs`) for the
//! shape of "keep a growing candidate set with cached per-candidate scores,
//! prune by a policy, sample from what's left" — generalized here to plain
//! average-score ranking rather than per-example Pareto dominance, since the
//! spec's pool model is simpler than GEPA's.

mod winning;

pub use winning::WinningPrograms;

use std::sync::Arc;

use crate::program::Program;

/// Pool never grows past this many programs before a prune is forced.
pub const POOL_HARD_LIMIT: usize = 50;
/// Target size a prune reduces the pool to.
pub const POOL_KEEP: usize = 30;

/// Holds every candidate program considered so far, plus every score
/// recorded against each one. Index 0 is always the baseline program handed
/// to `ProgramPool::new` — it is never pruned, regardless of its score
/// (spec §4.3: "the baseline is always retained").
pub struct ProgramPool {
    programs: Vec<Arc<dyn Program>>,
    scores: Vec<Vec<f32>>,
}

impl ProgramPool {
    pub fn new(baseline: Arc<dyn Program>) -> Self {
        Self {
            programs: vec![baseline],
            scores: vec![Vec::new()],
        }
    }

    pub fn len(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }

    pub fn program(&self, index: usize) -> Option<&Arc<dyn Program>> {
        self.programs.get(index)
    }

    pub fn programs(&self) -> &[Arc<dyn Program>] {
        &self.programs
    }

    pub fn indices(&self) -> std::ops::Range<usize> {
        0..self.programs.len()
    }

    /// Adds a new candidate program, returning its index.
    pub fn add_candidate(&mut self, program: Arc<dyn Program>) -> usize {
        self.programs.push(program);
        self.scores.push(Vec::new());
        self.programs.len() - 1
    }

    /// Records a trajectory score against a pool member.
    pub fn record_score(&mut self, index: usize, score: f32) {
        if let Some(history) = self.scores.get_mut(index) {
            history.push(score);
        }
    }

    /// Average of every score recorded for `index`. A program with no
    /// recorded scores yet contributes `0.0` — it has not earned anything,
    /// it just hasn't been tried (spec §4.3 / softmax note).
    pub fn avg_score(&self, index: usize) -> f32 {
        match self.scores.get(index) {
            Some(history) if !history.is_empty() => {
                history.iter().sum::<f32>() / history.len() as f32
            }
            _ => 0.0,
        }
    }

    pub fn should_prune(&self) -> bool {
        self.programs.len() > POOL_HARD_LIMIT
    }

    /// Reduces the pool to `keep` programs: the baseline (index 0) plus the
    /// `keep - 1` highest-average-score non-baseline programs, ties broken
    /// by lower original index. Indices are renumbered to the new positions;
    /// the baseline is always renumbered to 0 (spec §4.3).
    pub fn prune(&mut self, keep: usize) {
        if self.programs.len() <= keep {
            return;
        }

        let baseline_program = self.programs[0].clone();
        let baseline_scores = self.scores[0].clone();

        let mut rest: Vec<(usize, Arc<dyn Program>, Vec<f32>)> = (1..self.programs.len())
            .map(|i| (i, self.programs[i].clone(), self.scores[i].clone()))
            .collect();

        rest.sort_by(|a, b| {
            let score_a = Self::avg_of(&a.2);
            let score_b = Self::avg_of(&b.2);
            score_b
                .partial_cmp(&score_a)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });

        let keep_rest = keep.saturating_sub(1);
        rest.truncate(keep_rest);
        rest.sort_by_key(|(i, _, _)| *i);

        let mut programs = vec![baseline_program];
        let mut scores = vec![baseline_scores];
        for (_, program, history) in rest {
            programs.push(program);
            scores.push(history);
        }

        self.programs = programs;
        self.scores = scores;
    }

    fn avg_of(history: &[f32]) -> f32 {
        if history.is_empty() {
            0.0
        } else {
            history.iter().sum::<f32>() / history.len() as f32
        }
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
    fn baseline_survives_prune_regardless_of_score() {
        let mut pool = ProgramPool::new(Arc::new(StubProgram));
        pool.record_score(0, 0.0);

        for _ in 0..10 {
            let idx = pool.add_candidate(Arc::new(StubProgram));
            pool.record_score(idx, 0.9);
        }

        pool.prune(5);
        assert_eq!(pool.len(), 5);
        assert_eq!(pool.avg_score(0), 0.0);
    }

    #[test]
    fn unscored_candidate_has_zero_average() {
        let mut pool = ProgramPool::new(Arc::new(StubProgram));
        let idx = pool.add_candidate(Arc::new(StubProgram));
        assert_eq!(pool.avg_score(idx), 0.0);
    }

    #[test]
    fn prune_keeps_highest_scoring_non_baseline_candidates() {
        let mut pool = ProgramPool::new(Arc::new(StubProgram));
        let low = pool.add_candidate(Arc::new(StubProgram));
        pool.record_score(low, 0.1);
        let high = pool.add_candidate(Arc::new(StubProgram));
        pool.record_score(high, 0.9);

        pool.prune(2);
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.avg_score(1), 0.9);
    }
}
