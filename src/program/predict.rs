use std::sync::Arc;

use async_trait::async_trait;

use super::{LmClient, Program, SignatureInfo};
use crate::data::{Example, ModelConfig, Outputs};
use crate::error::ExecutionError;

/// The bare program: a signature plus an LM client, with an optional
/// instruction override and demo set layered on top of whatever the
/// signature provides by default.
///
/// Grounded on the teacher's `LegacyPredict`, minus tool support (not named
/// anywhere in the optimization surface this crate implements) and minus the
/// tracing graph / node-recording machinery (a separate tracing subsystem
/// out of scope here — this crate's own `telemetry` module covers the
/// teleprompter's own events).
pub struct Predict {
    signature: Arc<dyn SignatureInfo>,
    lm_client: Arc<dyn LmClient>,
    instruction_override: Option<String>,
    demos: Vec<Example>,
}

impl Predict {
    pub fn new(signature: Arc<dyn SignatureInfo>, lm_client: Arc<dyn LmClient>) -> Self {
        Self {
            signature,
            lm_client,
            instruction_override: None,
            demos: Vec::new(),
        }
    }
}

#[async_trait]
impl Program for Predict {
    #[tracing::instrument(name = "dspex.predict.forward", level = "debug", skip(self, inputs))]
    async fn forward(
        &self,
        inputs: &Example,
        model_config: &ModelConfig,
    ) -> Result<Outputs, ExecutionError> {
        self.lm_client
            .client_call(
                inputs,
                self.instruction().as_deref(),
                &self.demos,
                model_config,
            )
            .await
    }

    fn instruction(&self) -> Option<String> {
        self.instruction_override
            .clone()
            .or_else(|| self.signature.instructions())
    }

    fn demos(&self) -> Option<Vec<Example>> {
        Some(self.demos.clone())
    }

    fn with_instruction(&self, instruction: String) -> Option<Arc<dyn Program>> {
        Some(Arc::new(Self {
            signature: self.signature.clone(),
            lm_client: self.lm_client.clone(),
            instruction_override: Some(instruction),
            demos: self.demos.clone(),
        }))
    }

    fn with_demos(&self, demos: Vec<Example>) -> Option<Arc<dyn Program>> {
        Some(Arc::new(Self {
            signature: self.signature.clone(),
            lm_client: self.lm_client.clone(),
            instruction_override: self.instruction_override.clone(),
            demos,
        }))
    }

    fn signature(&self) -> Option<&dyn SignatureInfo> {
        Some(self.signature.as_ref())
    }
}
