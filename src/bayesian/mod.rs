//! A lightweight Bayesian optimizer over the discrete configuration space of
//! "which instruction id, which demo ids" (spec §4.5).
//!
//! Grounded on the teacher's `MIPROv2`/`COPRO` builder-style options structs
//! for configuration shape, generalized with a Gaussian-process surrogate
//! and closed-form acquisition functions — no teacher file implements
//! Bayesian optimization itself, so the numerical core here is new code
//! built from the spec's formulas, while the surrounding options/driver
//! shape follows the teacher's optimizer conventions.

mod acquisition;
mod optimizer;
mod search_space;
mod surrogate;

pub use acquisition::{Acquisition, expected_improvement, probability_of_improvement, upper_confidence_bound};
pub use optimizer::{BayesianOptimizer, BayesianOptions};
pub use search_space::{Configuration, Observation, SearchSpace};
pub use surrogate::Surrogate;
