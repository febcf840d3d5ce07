//! The program abstraction the teleprompter optimizes.
//!
//! A `Program` is treated as a *capability set* rather than a concrete type:
//! "has a forward", "optionally has an instruction", "optionally has demos".
//! The teleprompter never branches on which concrete struct it's holding — it
//! asks each `Arc<dyn Program>` what it can do and works with the answer
//! (spec, Design Notes). This mirrors the teacher's untyped `LegacyPredict` +
//! `MetaSignature` split rather than its newer generic, facet-typed `Predict<S>`
//! system, which ties the program shape to concrete signature types the core
//! has no business knowing about.

mod lm_client;
mod optimized;
mod predict;
mod signature;

pub use lm_client::LmClient;
pub use optimized::OptimizedProgram;
pub use predict::Predict;
pub use signature::SignatureInfo;

use std::sync::Arc;

use async_trait::async_trait;

use crate::data::{Example, ModelConfig, Outputs};
use crate::error::ExecutionError;

/// Capability set implemented by anything the teleprompter can optimize.
///
/// `instruction`/`demos` return `None` for programs that don't expose an
/// optimizable surface (e.g. a fixed external tool wrapper) — such programs
/// are still valid pool members, they just never get selected by a strategy
/// that needs an instruction or demo slot to write into (spec §4.4).
#[async_trait]
pub trait Program: Send + Sync {
    /// `model_config` is chosen by the caller (typically the trajectory
    /// sampler, round-robining across a configured list — spec §4.2); the
    /// program forwards it to its `LmClient` unchanged.
    async fn forward(
        &self,
        inputs: &Example,
        model_config: &ModelConfig,
    ) -> Result<Outputs, ExecutionError>;

    fn instruction(&self) -> Option<String> {
        None
    }

    fn demos(&self) -> Option<Vec<Example>> {
        None
    }

    /// Returns a new program with `instruction` as its instruction.
    /// `None` if this program has no instruction slot to rewrite.
    fn with_instruction(&self, instruction: String) -> Option<Arc<dyn Program>>;

    /// Returns a new program with `demos` as its demo set.
    /// `None` if this program has no demo slot to rewrite.
    fn with_demos(&self, demos: Vec<Example>) -> Option<Arc<dyn Program>>;

    fn signature(&self) -> Option<&dyn SignatureInfo> {
        None
    }
}
