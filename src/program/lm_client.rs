use async_trait::async_trait;

use crate::data::{Example, ModelConfig, Outputs};
use crate::error::ExecutionError;

/// The wire boundary to an actual language model call.
///
/// An external collaborator (spec §1, §6): the core never constructs
/// prompts, parses completions, or talks to a network. `Predict::forward`
/// and the `AppendRule` strategy's feedback step both go through this trait
/// so the core stays testable with deterministic fakes, the same role the
/// teacher's `LM`/adapter pair plays for `LegacyPredict`.
#[async_trait]
pub trait LmClient: Send + Sync {
    async fn client_call(
        &self,
        inputs: &Example,
        instruction: Option<&str>,
        demos: &[Example],
        model_config: &ModelConfig,
    ) -> Result<Outputs, ExecutionError>;
}
