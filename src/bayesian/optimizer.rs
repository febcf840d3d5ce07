use std::collections::HashSet;
use std::future::Future;

use bon::Builder;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use super::acquisition::{Acquisition, expected_improvement, probability_of_improvement, upper_confidence_bound};
use super::search_space::{Configuration, Observation, SearchSpace};
use super::surrogate::Surrogate;
use crate::error::TeleprompterError;

/// Options for [`BayesianOptimizer`], following the teacher's
/// `#[derive(Builder)]` + `#[builder(default = ...)]` option-struct shape
/// (`optimizer/mipro.rs`).
#[derive(Builder)]
pub struct BayesianOptions {
    #[builder(default = Acquisition::ExpectedImprovement)]
    pub acquisition: Acquisition,

    /// The spec's `exploration_weight` — only consulted by
    /// `UpperConfidenceBound`; ignored by EI/PI.
    #[builder(default = 2.0)]
    pub exploration_weight: f64,

    #[builder(default = 0.01)]
    pub xi: f64,

    #[builder(default = 0.3)]
    pub length_scale: f64,

    /// The surrogate's `kernel_variance` factor: predicted variance is
    /// `kernel_variance * (1 - max_i k_i)`.
    #[builder(default = 1.0)]
    pub kernel_variance: f64,

    /// How many configurations `initialize` samples before any surrogate
    /// fitting happens.
    #[builder(default = 5)]
    pub num_initial_samples: usize,

    #[builder(default = 20)]
    pub candidates_per_iteration: usize,

    /// Optimization stops once the best observed score hasn't improved by
    /// at least this much for a full iteration.
    #[builder(default = 0.01)]
    pub convergence_threshold: f64,

    pub seed: Option<u64>,
}

/// Drives Bayesian search over a [`SearchSpace`]: fit a [`Surrogate`] to the
/// observations so far, score a batch of candidate configurations with the
/// configured acquisition function, and hand back the best-scoring one for
/// the caller to actually sample a trajectory from (spec §4.5).
///
/// No teacher file implements this; the driver shape (builder-configured
/// struct with a `step`-like method advancing one iteration) follows
/// `MIPROv2`/`GEPA`'s own optimizer loops.
pub struct BayesianOptimizer {
    options: BayesianOptions,
    surrogate: Surrogate,
    observations: Vec<Observation>,
    rng: StdRng,
    best_score: f64,
    stalled_iterations: u32,
}

impl BayesianOptimizer {
    pub fn new(options: BayesianOptions) -> Self {
        let rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let surrogate = Surrogate::new(options.length_scale, options.kernel_variance);
        Self {
            options,
            surrogate,
            observations: Vec::new(),
            rng,
            best_score: f64::MIN,
            stalled_iterations: 0,
        }
    }

    pub fn record_observation(&mut self, observation: Observation) {
        let score = observation.score as f64;
        self.observations.push(observation);
        self.surrogate.update(self.observations.clone());

        if score > self.best_score + self.options.convergence_threshold {
            self.best_score = score;
            self.stalled_iterations = 0;
        } else {
            self.stalled_iterations += 1;
        }
    }

    pub fn has_converged(&self, patience: u32) -> bool {
        self.stalled_iterations >= patience
    }

    pub fn num_observations(&self) -> usize {
        self.observations.len()
    }

    fn score(&self, config: &Configuration) -> f64 {
        let (mean, variance) = self.surrogate.predict(&config.features);
        let std_dev = variance.sqrt();

        match self.options.acquisition {
            Acquisition::ExpectedImprovement => {
                expected_improvement(mean, std_dev, self.best_score_or_zero(), self.options.xi)
            }
            Acquisition::UpperConfidenceBound => {
                upper_confidence_bound(mean, std_dev, self.options.exploration_weight)
            }
            Acquisition::ProbabilityOfImprovement => {
                probability_of_improvement(mean, std_dev, self.best_score_or_zero(), self.options.xi)
            }
        }
    }

    fn best_score_or_zero(&self) -> f64 {
        if self.best_score == f64::MIN { 0.0 } else { self.best_score }
    }

    /// Scores every candidate in `candidates` and returns the index of the
    /// one the acquisition function ranks highest, ties broken by lowest
    /// index for determinism under a fixed seed.
    pub fn select_best(&self, candidates: &[Configuration]) -> Option<usize> {
        candidates
            .iter()
            .map(|c| self.score(c))
            .enumerate()
            .fold(None, |best, (idx, score)| match best {
                Some((best_idx, best_score)) if score <= best_score => Some((best_idx, best_score)),
                _ => Some((idx, score)),
            })
            .map(|(idx, _)| idx)
    }

    /// One instruction plus a random, distinct-ids subset of `demo_candidate_ids`
    /// whose size is uniform in `1..=max_demo_subset` (0 if there are no demo
    /// candidates at all).
    fn sample_configuration(
        &mut self,
        space: &SearchSpace,
        num_instructions: usize,
        demo_candidate_ids: &[usize],
        max_demo_subset: usize,
    ) -> Configuration {
        let instruction_id = self.rng.gen_range(0..num_instructions.max(1));
        let upper = max_demo_subset.min(demo_candidate_ids.len());
        let demo_count = if upper == 0 { 0 } else { self.rng.gen_range(1..=upper) };
        let mut demo_ids: Vec<usize> = demo_candidate_ids
            .choose_multiple(&mut self.rng, demo_count)
            .copied()
            .collect();
        demo_ids.sort_unstable();
        space.encode(instruction_id, demo_ids)
    }

    /// Draws up to `candidates_per_iteration` random configurations, each a
    /// random subset of `demo_candidate_ids` (not a deterministic prefix),
    /// excluding any `(instruction_id, demo_ids)` pair already observed.
    /// Falls back to a single uniform-random candidate (duplicates allowed)
    /// if every draw collides with an existing observation (spec §4.5 step 2).
    pub fn propose_candidates(
        &mut self,
        space: &SearchSpace,
        num_instructions: usize,
        demo_candidate_ids: &[usize],
        max_demos: usize,
    ) -> Vec<Configuration> {
        let observed: HashSet<(usize, Vec<usize>)> = self
            .observations
            .iter()
            .map(|obs| (obs.configuration.instruction_id, obs.configuration.demo_ids.clone()))
            .collect();

        let target = self.options.candidates_per_iteration.max(1);
        let max_attempts = target * 10;
        let mut candidates = Vec::with_capacity(target);
        let mut attempts = 0;

        while candidates.len() < target && attempts < max_attempts {
            attempts += 1;
            let config = self.sample_configuration(space, num_instructions, demo_candidate_ids, max_demos);
            if observed.contains(&(config.instruction_id, config.demo_ids.clone())) {
                continue;
            }
            candidates.push(config);
        }

        if candidates.is_empty() {
            candidates.push(self.sample_configuration(space, num_instructions, demo_candidate_ids, max_demos));
        }

        candidates
    }

    /// Spec §4.5 step 1: sample `num_initial_samples` configurations
    /// uniformly at random (instruction plus a demo subset of size uniform
    /// in `1..=min(4, |demos|)`), evaluate each, drop failed evaluations,
    /// and fail with [`TeleprompterError::NoInitialObservations`] if none
    /// succeed.
    pub async fn initialize<F, Fut>(
        &mut self,
        space: &SearchSpace,
        num_instructions: usize,
        demo_candidate_ids: &[usize],
        evaluate: F,
    ) -> Result<(), TeleprompterError>
    where
        F: Fn(Configuration) -> Fut,
        Fut: Future<Output = Option<f32>>,
    {
        const INITIAL_DEMO_SUBSET_CAP: usize = 4;

        let mut succeeded = 0usize;
        for _ in 0..self.options.num_initial_samples {
            let config = self.sample_configuration(space, num_instructions, demo_candidate_ids, INITIAL_DEMO_SUBSET_CAP);
            if let Some(score) = evaluate(config.clone()).await {
                self.record_observation(Observation::new(config, score));
                succeeded += 1;
            }
        }

        if succeeded == 0 {
            return Err(TeleprompterError::NoInitialObservations);
        }
        Ok(())
    }

    /// Spec §4.5's full outer procedure: initialize if there are no
    /// observations yet, then alternate proposing candidates, picking the
    /// best by acquisition score, evaluating it, and recording the
    /// observation, until `max_iterations` or `convergence_patience` is hit.
    /// Returns the best configuration observed.
    pub async fn run<F, Fut>(
        &mut self,
        space: &SearchSpace,
        num_instructions: usize,
        demo_candidate_ids: &[usize],
        max_demos: usize,
        max_iterations: usize,
        convergence_patience: u32,
        evaluate: F,
    ) -> Result<Configuration, TeleprompterError>
    where
        F: Fn(Configuration) -> Fut,
        Fut: Future<Output = Option<f32>>,
    {
        if self.observations.is_empty() {
            self.initialize(space, num_instructions, demo_candidate_ids, &evaluate).await?;
        }

        let mut iteration = 0usize;
        while iteration < max_iterations && !self.has_converged(convergence_patience) {
            let candidates = self.propose_candidates(space, num_instructions, demo_candidate_ids, max_demos);
            let Some(best_idx) = self.select_best(&candidates) else {
                break;
            };
            let candidate = candidates[best_idx].clone();
            if let Some(score) = evaluate(candidate.clone()).await {
                self.record_observation(Observation::new(candidate, score));
            }
            iteration += 1;
        }

        self.best_observation()
            .map(|obs| obs.configuration.clone())
            .ok_or(TeleprompterError::NoInitialObservations)
    }

    fn best_observation(&self) -> Option<&Observation> {
        self.observations
            .iter()
            .fold(None, |best: Option<&Observation>, obs| match best {
                Some(current) if current.score >= obs.score => Some(current),
                _ => Some(obs),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_best_picks_highest_acquisition_score() {
        let options = BayesianOptions::builder().seed(7).build();
        let mut optimizer = BayesianOptimizer::new(options);
        let space = SearchSpace::new(3, 2, 3);

        optimizer.record_observation(Observation::new(space.encode(0, vec![]), 0.3));

        let candidates = vec![space.encode(0, vec![]), space.encode(2, vec![0, 1])];
        let best = optimizer.select_best(&candidates);
        assert!(best.is_some());
    }

    #[test]
    fn convergence_is_detected_after_stalled_iterations() {
        let options = BayesianOptions::builder().seed(1).convergence_threshold(0.05).build();
        let mut optimizer = BayesianOptimizer::new(options);
        let space = SearchSpace::new(2, 1, 1);

        optimizer.record_observation(Observation::new(space.encode(0, vec![]), 0.5));
        for _ in 0..3 {
            optimizer.record_observation(Observation::new(space.encode(0, vec![]), 0.5));
        }

        assert!(optimizer.has_converged(3));
    }

    #[test]
    fn propose_candidates_excludes_already_observed_pairs() {
        let options = BayesianOptions::builder().seed(3).candidates_per_iteration(5).build();
        let mut optimizer = BayesianOptimizer::new(options);
        let space = SearchSpace::new(1, 2, 2);

        // Only one possible configuration exists in this tiny space (single
        // instruction, demo subset size fixed at its only valid value by
        // `max_demos=2` with 2 candidate ids) before it's been observed...
        let only_config = space.encode(0, vec![0, 1]);
        optimizer.record_observation(Observation::new(only_config.clone(), 0.4));

        // ...so every fresh draw collides and propose_candidates must fall
        // back to returning a (duplicate) random candidate instead of an
        // empty list.
        let candidates = optimizer.propose_candidates(&space, 1, &[0, 1], 2);
        assert!(!candidates.is_empty());
    }

    #[tokio::test]
    async fn initialize_fails_when_every_evaluation_fails() {
        let options = BayesianOptions::builder().seed(5).num_initial_samples(3).build();
        let mut optimizer = BayesianOptimizer::new(options);
        let space = SearchSpace::new(2, 4, 4);

        let result = optimizer
            .initialize(&space, 2, &[0, 1, 2, 3], |_config| async { None })
            .await;

        assert!(matches!(result, Err(TeleprompterError::NoInitialObservations)));
        assert_eq!(optimizer.num_observations(), 0);
    }

    #[tokio::test]
    async fn initialize_records_every_successful_evaluation() {
        let options = BayesianOptions::builder().seed(6).num_initial_samples(4).build();
        let mut optimizer = BayesianOptimizer::new(options);
        let space = SearchSpace::new(2, 4, 4);

        optimizer
            .initialize(&space, 2, &[0, 1, 2, 3], |_config| async { Some(0.5) })
            .await
            .expect("at least one evaluation succeeds");

        assert_eq!(optimizer.num_observations(), 4);
    }

    #[tokio::test]
    async fn run_drives_initialization_and_iteration_to_a_result() {
        let options = BayesianOptions::builder()
            .seed(9)
            .num_initial_samples(2)
            .candidates_per_iteration(3)
            .build();
        let mut optimizer = BayesianOptimizer::new(options);
        let space = SearchSpace::new(2, 4, 4);

        let best = optimizer
            .run(&space, 2, &[0, 1, 2, 3], 4, 5, 2, |config| async move {
                Some(if config.instruction_id == 1 { 0.9 } else { 0.1 })
            })
            .await
            .expect("run should produce a best configuration");

        assert!(optimizer.num_observations() >= 2);
        let _ = best;
    }
}
