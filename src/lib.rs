//! Concurrent trajectory search and prompt/demo optimization for programs
//! that call a language model.
//!
//! A [`Program`](program::Program) is a capability set — "has a forward",
//! optionally "has an instruction" or "has demos" — rather than a fixed
//! concrete type. [`Teleprompter::compile`](teleprompter::Teleprompter::compile)
//! runs trainset examples through a growing [`ProgramPool`](pool::ProgramPool),
//! groups the results into [`Bucket`](data::Bucket)s, and on every bucket worth
//! improving tries a registered [`Strategy`](strategy::Strategy) — append a
//! demo, or ask an LM to rewrite the instruction from a success/failure
//! contrast — to produce a new candidate. A [`BayesianOptimizer`](bayesian::BayesianOptimizer)
//! takes over candidate selection from plain softmax sampling once there's
//! enough score history to be worth trusting.
//!
//! # The mental model
//!
//! | Layer | Concept | Key types |
//! |-------|---------|-----------|
//! | **Data** | field -> value records, and what happened when a program saw one | [`Example`](data::Example), [`Trajectory`](data::Trajectory), [`Bucket`](data::Bucket) |
//! | **Programs** | the thing being optimized | [`Program`](program::Program), [`Predict`](program::Predict), [`OptimizedProgram`](program::OptimizedProgram) |
//! | **Search** | which program runs next, and how many at once | [`ProgramPool`](pool::ProgramPool), [`TrajectorySampler`](sampler::TrajectorySampler) |
//! | **Improvement** | turning a bucket into a new candidate | [`Strategy`](strategy::Strategy), [`AppendDemo`](strategy::AppendDemo), [`AppendRule`](strategy::AppendRule) |
//! | **Selection** | picking the next program to try | [`BayesianOptimizer`](bayesian::BayesianOptimizer) |
//!
//! # Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//! use dspex::data::Example;
//! use dspex::program::Program;
//! use dspex::scoring::exact_match;
//! use dspex::strategy::StrategyRegistry;
//! use dspex::teleprompter::{Teleprompter, TeleprompterOptions};
//!
//! # async fn example(student: Arc<dyn Program>, trainset: Vec<Example>) -> anyhow::Result<()> {
//! let teleprompter = Teleprompter::new(TeleprompterOptions::builder().seed(7).build());
//! let strategies = StrategyRegistry::new(vec![]);
//!
//! let optimized = teleprompter
//!     .compile(student.clone(), student, trainset, exact_match("answer"), strategies)
//!     .await?;
//! # let _ = optimized;
//! # Ok(())
//! # }
//! ```
//!
//! # What's out of scope
//!
//! The wire protocol to an actual LM ([`program::LmClient`],
//! [`strategy::FeedbackAdvisor`]), signature/prompt formatting
//! ([`program::SignatureInfo`]), and resource-schema validation are all
//! external collaborator traits this crate defines but never implements —
//! that plumbing lives in whatever crate actually talks to a model.
//!
//! # Crate organization
//!
//! - `data` — the field-mapping data model: `Example`, `Outputs`,
//!   `Trajectory`, `Bucket`.
//! - `program` — the `Program` capability set and its external collaborator
//!   traits.
//! - `pool` — candidate pool management and the winning-programs record.
//! - `sampler` — softmax selection and the concurrent trajectory sampler.
//! - `strategy` — bucket-to-candidate transformations.
//! - `bayesian` — the Bayesian optimizer used for candidate selection.
//! - `scoring` — built-in scoring functions.
//! - `teleprompter` — the outer search loop tying everything together.
//! - `error` — the error taxonomy.
//! - `telemetry` — tracing setup and stable event names.

pub mod bayesian;
pub mod data;
pub mod error;
pub mod pool;
pub mod program;
pub mod sampler;
pub mod scoring;
pub mod strategy;
pub mod telemetry;
pub mod teleprompter;

pub use error::TeleprompterError;
pub use program::Program;
pub use teleprompter::{Teleprompter, TeleprompterOptions};
