//! Error taxonomy for the teleprompter (spec §7).
//!
//! Internal helpers return `anyhow::Result` — the teacher's convention for
//! plumbing that doesn't need a typed error. The two boundary-facing types
//! here are what callers actually match on: [`TeleprompterError`] for
//! `compile` failures, and [`StrategyOutcome`] for the `Ok/Skip/Error`
//! contract every [`crate::strategy::Strategy`] implements.

use thiserror::Error;

/// Errors that can surface from [`crate::teleprompter::Teleprompter::compile`].
///
/// Only the catastrophic/boundary cases in spec §7 get a variant here.
/// Per-example and per-strategy failures are recovered locally (sentinel
/// trajectories, `Skip` outcomes) and never reach this type.
#[derive(Debug, Error)]
pub enum TeleprompterError {
    #[error("trainset is empty")]
    EmptyTrainset,

    #[error("bayesian warmup produced no valid scored observations")]
    NoInitialObservations,

    #[error("internal pool invariant violated: {0}")]
    PoolInvariantViolation(String),

    #[error("no optimizable programs found")]
    NoOptimizablePrograms,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// A single scoring/execution failure, embedded in a [`crate::data::Trajectory`]
/// rather than propagated (spec §7: `trajectory_failed`, `scoring_failed`).
#[derive(Debug, Error, Clone)]
pub enum ExecutionError {
    #[error("program call failed: {0}")]
    ProgramCall(String),

    #[error("call timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("scoring function failed: {0}")]
    Scoring(String),
}

/// The `{ok, new_program} | {skip, reason} | {error, reason}` contract every
/// strategy's `apply` returns (spec §4.4).
#[derive(Debug, Error)]
pub enum StrategyError {
    #[error("{0}")]
    Failed(String),
}

pub type StrategyResult<T> = Result<StrategyOutcome<T>, StrategyError>;

/// Outcome of `Strategy::apply`. `Skip` is not an error — the driver just
/// tries the next strategy — so it is a variant here, not an `Err`.
#[derive(Debug)]
pub enum StrategyOutcome<T> {
    Applied(T),
    Skip(String),
}

impl<T> StrategyOutcome<T> {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }

    pub fn into_applied(self) -> Option<T> {
        match self {
            Self::Applied(value) => Some(value),
            Self::Skip(_) => None,
        }
    }
}
