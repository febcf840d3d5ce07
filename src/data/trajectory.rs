use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::{Example, ModelConfig, Outputs};
use crate::error::ExecutionError;

/// One execution record of a `(program, example)` pair (spec §3).
///
/// Created only by [`crate::sampler::TrajectorySampler`]; never mutated
/// afterward. `program_index` refers to a position in the pool snapshot the
/// sampler was given for the step that produced this trajectory — it is not
/// stable across steps, since the pool may be pruned and renumbered between
/// steps (spec §4.3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trajectory {
    pub program_index: usize,
    pub example: Example,
    pub outputs: Option<Outputs>,
    pub score: f32,
    pub success: bool,
    pub error: Option<String>,
    pub duration_ms: u64,
    pub model_config: ModelConfig,
    pub exec_id: u64,
}

impl Trajectory {
    pub fn success(
        program_index: usize,
        example: Example,
        outputs: Outputs,
        score: f32,
        duration: Duration,
        model_config: ModelConfig,
        exec_id: u64,
    ) -> Self {
        Self {
            program_index,
            example,
            outputs: Some(outputs),
            score: score.clamp(0.0, 1.0),
            success: true,
            error: None,
            duration_ms: duration.as_millis() as u64,
            model_config,
            exec_id,
        }
    }

    /// Builds a failed trajectory (spec §7: `trajectory_failed`). Score is
    /// always 0 for a failure, regardless of what the metric might otherwise
    /// have produced — there is no prediction to score.
    pub fn failed(
        program_index: usize,
        example: Example,
        error: ExecutionError,
        duration: Duration,
        model_config: ModelConfig,
        exec_id: u64,
    ) -> Self {
        Self {
            program_index,
            example,
            outputs: None,
            score: 0.0,
            success: false,
            error: Some(error.to_string()),
            duration_ms: duration.as_millis() as u64,
            model_config,
            exec_id,
        }
    }

    pub fn metadata(&self) -> Value {
        json!({ "exec_id": self.exec_id })
    }

    /// A human-readable description used by strategies (e.g. `AppendRule`'s
    /// feedback prompt, which requires descriptions of at least 50 chars —
    /// spec §4.4.2). Always well over that floor for any real example.
    pub fn describe(&self) -> String {
        let outputs_repr = self
            .outputs
            .as_ref()
            .map(|o| serde_json::to_string(&o.data).unwrap_or_default())
            .unwrap_or_else(|| "<no output>".to_string());

        format!(
            "inputs={:?} outputs={} score={:.3} success={}{}",
            self.example.inputs(),
            outputs_repr,
            self.score,
            self.success,
            self.error
                .as_ref()
                .map(|e| format!(" error={e}"))
                .unwrap_or_default()
        )
    }
}
