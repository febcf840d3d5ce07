//! The outer search loop: sample trajectories, bucket them, try strategies
//! on viable buckets, track the winning pool, and use a Bayesian optimizer
//! to bias which pool member gets sampled next once there's enough signal
//! to do so (spec §4.1).

use std::sync::Arc;
use std::time::Duration;

use bon::Builder;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde_json::json;

use crate::bayesian::{BayesianOptimizer, BayesianOptions, Observation, SearchSpace};
use crate::data::{Example, ModelConfig};
use crate::error::{StrategyOutcome, TeleprompterError};
use crate::pool::{POOL_HARD_LIMIT, POOL_KEEP, ProgramPool, WinningPrograms};
use crate::program::Program;
use crate::sampler::{SampleRequest, TrajectorySampler};
use crate::scoring::ScoringFn;
use crate::strategy::StrategyRegistry;
use crate::telemetry::{self, events};

/// Configuration for a single [`Teleprompter::compile`] run, following the
/// teacher's `#[derive(Builder)]` option-struct convention
/// (`optimizer/mipro.rs`, `optimizer/gepa.rs`).
#[derive(Builder)]
pub struct TeleprompterOptions {
    #[builder(default = 20)]
    pub max_iterations: usize,

    /// How many trainset examples get sampled each iteration.
    #[builder(default = 8)]
    pub examples_per_iteration: usize,

    /// How many distinct pool programs get run against those examples each
    /// iteration. Running more than one program against the same examples
    /// is what gives buckets their score variance — a single program run
    /// against an example only once can never disagree with itself
    /// (spec §4.2: buckets group trajectories across both examples and
    /// configurations).
    #[builder(default = 3)]
    pub programs_per_iteration: usize,

    #[builder(default = 3)]
    pub num_threads: usize,

    #[builder(default = Duration::from_secs(60))]
    pub call_timeout: Duration,

    #[builder(default = vec![ModelConfig::default()])]
    pub model_configs: Vec<ModelConfig>,

    /// Softmax temperature for source-program selection (spec
    /// `temperature_for_sampling`).
    #[builder(default = 1.0)]
    pub softmax_temperature: f32,

    #[builder(default = 0.05)]
    pub min_gap: f32,

    #[builder(default = 0.0)]
    pub min_score_threshold: f32,

    #[builder(default = 1.0)]
    pub max_score_threshold: f32,

    /// Observations needed before the Bayesian optimizer takes over program
    /// selection from plain softmax.
    #[builder(default = 3)]
    pub bayesian_warmup: usize,

    /// Cap on how many strategy-produced candidates a single step merges
    /// into the pool (spec `num_candidates`: "candidates proposed per step
    /// (bucketed)"). When more viable buckets produce candidates than this
    /// in one step, the highest-scoring ones are kept via
    /// `temperature_for_candidates`-weighted softmax selection.
    #[builder(default = 10)]
    pub num_candidates: usize,

    /// Softmax temperature used to choose which candidates survive when a
    /// step proposes more than `num_candidates` (spec
    /// `temperature_for_candidates`: "softmax temperature inside strategy
    /// application").
    #[builder(default = 1.0)]
    pub temperature_for_candidates: f32,

    /// Score delta below which the outer convergence counter ticks (spec
    /// `min_improvement_threshold`). This counter is independent of the
    /// Bayesian optimizer's own convergence tracking, which only applies to
    /// BEACON-mode search (spec §4.5) — the outer loop tracks improvement
    /// in the step's best observed score directly.
    #[builder(default = 0.01)]
    pub min_improvement_threshold: f32,

    #[builder(default = 3)]
    pub convergence_patience: u32,

    #[builder(default = BayesianOptions::builder().build())]
    pub bayesian_options: BayesianOptions,

    /// Opaque token propagated to every telemetry event this run emits
    /// (spec `correlation_id`). A fresh one is minted when not supplied.
    pub correlation_id: Option<String>,

    pub seed: Option<u64>,
}

/// Drives the search described in spec §4.1: repeatedly select a pool
/// program, sample trajectories against a slice of the trainset, bucket
/// them by example, try the strategy registry against every viable bucket,
/// fold any new candidates into the pool, and track both a Bayesian
/// surrogate over pool configurations and a bounded set of winning
/// programs. Stops at `max_iterations` or once the outer convergence
/// counter reaches `convergence_patience`.
pub struct Teleprompter {
    options: TeleprompterOptions,
}

impl Teleprompter {
    pub fn new(options: TeleprompterOptions) -> Self {
        Self { options }
    }

    /// `teacher` generates the bootstrap trajectories used to seed the pool
    /// with its first non-baseline candidate, before the main loop starts;
    /// pass the same program as `student` when there's no separate stronger
    /// model to bootstrap from.
    pub async fn compile(
        &self,
        student: Arc<dyn Program>,
        teacher: Arc<dyn Program>,
        trainset: Vec<Example>,
        scoring_fn: ScoringFn,
        strategies: StrategyRegistry,
    ) -> Result<Arc<dyn Program>, TeleprompterError> {
        if trainset.is_empty() {
            return Err(TeleprompterError::EmptyTrainset);
        }

        let correlation_id = self
            .options
            .correlation_id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        telemetry::emit(events::TELEPROMPTER_START, &correlation_id, json!({}), json!({"trainset_size": trainset.len()}));

        let mut rng = match self.options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let sampler = TrajectorySampler::new(self.options.num_threads, self.options.model_configs.clone())
            .with_timeout(self.options.call_timeout);

        let mut pool = ProgramPool::new(student.clone());
        let mut winners = WinningPrograms::new();
        let search_space = SearchSpace::new(POOL_HARD_LIMIT, 4, POOL_HARD_LIMIT);
        let mut bayes = BayesianOptimizer::new(self.options.bayesian_options_clone());

        self.bootstrap(&sampler, &teacher, &trainset, &scoring_fn, &strategies, &mut pool, &mut winners)
            .await?;

        let mut running_best_score = f32::MIN;
        let mut convergence_counter: u32 = 0;

        let mut iteration = 0usize;
        while iteration < self.options.max_iterations {
            let program_indices = self.select_program_indices(&pool, &bayes, &search_space, &mut rng);
            let examples = sample_examples(&trainset, self.options.examples_per_iteration, &mut rng);

            let mut requests = Vec::with_capacity(program_indices.len() * examples.len());
            for &index in &program_indices {
                let program = pool
                    .program(index)
                    .cloned()
                    .ok_or_else(|| TeleprompterError::PoolInvariantViolation("selected index out of range".into()))?;
                for example in &examples {
                    requests.push(SampleRequest {
                        program_index: index,
                        program: program.clone(),
                        example: example.clone(),
                    });
                }
            }

            let buckets = sampler.sample(requests, scoring_fn.clone()).await;

            let mut iteration_best_score: Option<f32> = None;
            let mut proposed_candidates: Vec<(Arc<dyn Program>, f32)> = Vec::new();

            for bucket in &buckets {
                for trajectory in bucket.trajectories() {
                    pool.record_score(trajectory.program_index, trajectory.score);
                    if let Some(program) = pool.program(trajectory.program_index) {
                        winners.record(program.clone(), trajectory.score);
                    }
                }
                iteration_best_score = Some(iteration_best_score.map_or(bucket.max_score, |s: f32| s.max(bucket.max_score)));

                if !self.is_viable(bucket) {
                    continue;
                }

                let Some(best_trajectory) = bucket.best() else {
                    continue;
                };
                let Some(base_program) = pool.program(best_trajectory.program_index).cloned() else {
                    continue;
                };

                match strategies.apply_first(&base_program, bucket).await {
                    Ok(StrategyOutcome::Applied(new_program)) => {
                        proposed_candidates.push((new_program, bucket.max_score));
                    }
                    Ok(StrategyOutcome::Skip(_reason)) => {}
                    Err(_err) => {}
                }
            }

            // spec §4.1 opts.num_candidates: bound how many of this step's
            // proposed candidates actually merge into the pool; when more
            // were proposed, keep the highest-scoring ones via
            // temperature_for_candidates-weighted softmax.
            let accepted_candidates = select_candidates(
                proposed_candidates,
                self.options.num_candidates,
                self.options.temperature_for_candidates,
                &mut rng,
            );

            for (new_program, score) in accepted_candidates {
                let new_index = pool.add_candidate(new_program.clone());
                pool.record_score(new_index, score);
                winners.record(new_program.clone(), score);

                let config = search_space.encode(new_index, new_program.demos().map(|d| (0..d.len()).collect()).unwrap_or_default());
                bayes.record_observation(Observation::new(config, score));

                telemetry::emit(
                    events::STRATEGY_APPLIED,
                    &correlation_id,
                    json!({"score": score}),
                    json!({"pool_index": new_index}),
                );
            }

            telemetry::emit(
                events::TELEPROMPTER_ITERATION,
                &correlation_id,
                json!({"best_score": iteration_best_score.unwrap_or(0.0)}),
                json!({"iteration": iteration, "pool_size": pool.len()}),
            );

            if pool.should_prune() {
                pool.prune(POOL_KEEP);
            }

            // spec §4.1 step 8: the outer loop's own convergence counter,
            // tracked over the step's best observed score — separate from
            // the Bayesian optimizer's internal stall counter, which only
            // governs BEACON-mode search (spec §4.5's Open Question split).
            let step_best = iteration_best_score.unwrap_or(0.0);
            if step_best > running_best_score + self.options.min_improvement_threshold {
                running_best_score = step_best;
                convergence_counter = 0;
            } else {
                convergence_counter += 1;
            }

            if convergence_counter >= self.options.convergence_patience {
                break;
            }

            iteration += 1;
        }

        let best = winners
            .best()
            .cloned()
            .unwrap_or_else(|| self.best_in_pool(&pool));

        telemetry::emit(events::TELEPROMPTER_STOP, &correlation_id, json!({}), json!({"iterations_run": iteration}));

        Ok(best)
    }

    async fn bootstrap(
        &self,
        sampler: &TrajectorySampler,
        teacher: &Arc<dyn Program>,
        trainset: &[Example],
        scoring_fn: &ScoringFn,
        strategies: &StrategyRegistry,
        pool: &mut ProgramPool,
        winners: &mut WinningPrograms,
    ) -> Result<(), TeleprompterError> {
        let baseline = pool
            .program(0)
            .cloned()
            .ok_or_else(|| TeleprompterError::PoolInvariantViolation("pool has no baseline".into()))?;

        // Run both teacher and baseline against every trainset example so
        // each bucket has at least two trajectories to compare — a single
        // program run once per example can never disagree with itself.
        let mut requests = Vec::with_capacity(trainset.len() * 2);
        for example in trainset {
            requests.push(SampleRequest {
                program_index: 0,
                program: baseline.clone(),
                example: example.clone(),
            });
            requests.push(SampleRequest {
                program_index: 1,
                program: teacher.clone(),
                example: example.clone(),
            });
        }

        let buckets = sampler.sample(requests, scoring_fn.clone()).await;

        for bucket in &buckets {
            if !self.is_viable(bucket) {
                continue;
            }

            if let Ok(StrategyOutcome::Applied(new_program)) = strategies.apply_first(&baseline, bucket).await {
                let index = pool.add_candidate(new_program.clone());
                pool.record_score(index, bucket.max_score);
                winners.record(new_program, bucket.max_score);
            }
        }

        Ok(())
    }

    fn is_viable(&self, bucket: &crate::data::Bucket) -> bool {
        bucket.len() >= 2
            && bucket.successful_count >= 1
            && bucket.max_to_min_gap >= self.options.min_gap
            && bucket.max_score >= self.options.min_score_threshold
            && bucket.max_score <= self.options.max_score_threshold
    }

    /// Picks which pool programs to run this iteration: the best-scoring
    /// programs so far (exploitation) plus one program chosen by softmax —
    /// or, once enough observations exist, by the Bayesian optimizer's
    /// acquisition ranking — over the rest (exploration). Index 0, the
    /// baseline, is always included (spec §4.1 step 2).
    fn select_program_indices(
        &self,
        pool: &ProgramPool,
        bayes: &BayesianOptimizer,
        search_space: &SearchSpace,
        rng: &mut StdRng,
    ) -> Vec<usize> {
        let all: Vec<usize> = pool.indices().collect();
        if all.len() <= self.options.programs_per_iteration {
            return all;
        }

        let mut by_score = all.clone();
        by_score.sort_by(|&a, &b| {
            pool.avg_score(b)
                .partial_cmp(&pool.avg_score(a))
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let exploit_count = self.options.programs_per_iteration.saturating_sub(1);
        let mut chosen: Vec<usize> = by_score.iter().take(exploit_count).copied().collect();

        let remaining: Vec<usize> = all.iter().copied().filter(|i| !chosen.contains(i)).collect();
        if let Some(&fallback) = remaining.first() {
            let explore_pick = if bayes.num_observations() >= self.options.bayesian_warmup {
                let configs: Vec<_> = remaining
                    .iter()
                    .map(|&i| {
                        let demo_count = pool.program(i).and_then(|p| p.demos()).map(|d| d.len()).unwrap_or(0);
                        search_space.encode(i, (0..demo_count).collect())
                    })
                    .collect();
                bayes.select_best(&configs).map(|idx| remaining[idx]).unwrap_or(fallback)
            } else {
                crate::sampler::softmax_select(&remaining, |i| pool.avg_score(i), self.options.softmax_temperature, rng)
            };
            chosen.push(explore_pick);
        }

        if !chosen.contains(&0) {
            if chosen.len() >= self.options.programs_per_iteration.max(1) {
                chosen.pop();
            }
            chosen.push(0);
        }

        chosen
    }

    fn best_in_pool(&self, pool: &ProgramPool) -> Arc<dyn Program> {
        let best_index = pool
            .indices()
            .max_by(|&a, &b| pool.avg_score(a).partial_cmp(&pool.avg_score(b)).unwrap_or(std::cmp::Ordering::Equal))
            .unwrap_or(0);
        pool.program(best_index).cloned().expect("pool is never empty")
    }
}

impl TeleprompterOptions {
    fn bayesian_options_clone(&self) -> BayesianOptions {
        BayesianOptions::builder()
            .acquisition(self.bayesian_options.acquisition)
            .exploration_weight(self.bayesian_options.exploration_weight)
            .xi(self.bayesian_options.xi)
            .length_scale(self.bayesian_options.length_scale)
            .kernel_variance(self.bayesian_options.kernel_variance)
            .num_initial_samples(self.bayesian_options.num_initial_samples)
            .candidates_per_iteration(self.bayesian_options.candidates_per_iteration)
            .convergence_threshold(self.bayesian_options.convergence_threshold)
            .maybe_seed(self.bayesian_options.seed)
            .build()
    }
}

/// Caps `candidates` to `cap` entries, keeping the highest-scoring ones via
/// score-aware softmax selection without replacement when there are more
/// candidates than `cap` (spec `num_candidates` / `temperature_for_candidates`).
fn select_candidates(
    candidates: Vec<(Arc<dyn Program>, f32)>,
    cap: usize,
    temperature: f32,
    rng: &mut StdRng,
) -> Vec<(Arc<dyn Program>, f32)> {
    if candidates.len() <= cap {
        return candidates;
    }

    let mut remaining: Vec<usize> = (0..candidates.len()).collect();
    let mut chosen = Vec::with_capacity(cap);
    for _ in 0..cap {
        if remaining.is_empty() {
            break;
        }
        let pick = crate::sampler::softmax_select(&remaining, |i| candidates[i].1, temperature, rng);
        remaining.retain(|&i| i != pick);
        chosen.push(pick);
    }

    chosen.into_iter().map(|i| candidates[i].clone()).collect()
}

fn sample_examples(trainset: &[Example], count: usize, rng: &mut StdRng) -> Vec<Example> {
    use rand::seq::SliceRandom;
    let mut indices: Vec<usize> = (0..trainset.len()).collect();
    indices.shuffle(rng);
    indices
        .into_iter()
        .take(count.min(trainset.len()).max(1))
        .map(|i| trainset[i].clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::time::Duration as StdDuration;

    fn program(score: f32) -> (Arc<dyn Program>, f32) {
        struct Stub;

        #[async_trait::async_trait]
        impl Program for Stub {
            async fn forward(
                &self,
                _inputs: &Example,
                _model_config: &ModelConfig,
            ) -> Result<crate::data::Outputs, crate::error::ExecutionError> {
                Ok(crate::data::Outputs::default())
            }

            fn with_instruction(&self, _instruction: String) -> Option<Arc<dyn Program>> {
                None
            }

            fn with_demos(&self, _demos: Vec<Example>) -> Option<Arc<dyn Program>> {
                None
            }
        }

        (Arc::new(Stub), score)
    }

    #[test]
    fn select_candidates_keeps_everything_under_the_cap() {
        let mut rng = StdRng::seed_from_u64(1);
        let candidates = vec![program(0.1), program(0.9)];
        let kept = select_candidates(candidates, 5, 1.0, &mut rng);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn select_candidates_caps_to_the_requested_count() {
        let mut rng = StdRng::seed_from_u64(1);
        let candidates = vec![program(0.1), program(0.9), program(0.5), program(0.3)];
        let kept = select_candidates(candidates, 2, 0.5, &mut rng);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn sample_examples_never_returns_empty_for_a_nonempty_trainset() {
        let mut rng = StdRng::seed_from_u64(1);
        let trainset = vec![Example::new(HashMap::new(), vec![])];
        let sampled = sample_examples(&trainset, 0, &mut rng);
        assert_eq!(sampled.len(), 1);
    }

    #[test]
    fn unused_duration_import_marker() {
        // keeps `StdDuration` referenced if future tests need explicit durations
        let _ = StdDuration::from_secs(0);
    }
}
