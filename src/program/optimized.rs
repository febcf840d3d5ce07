use std::sync::Arc;

use async_trait::async_trait;

use super::{Program, SignatureInfo};
use crate::data::{Example, ModelConfig, Outputs};
use crate::error::ExecutionError;

/// A program wrapped with an instruction and/or demo override.
///
/// Strategies produce new pool candidates by calling `OptimizedProgram::wrap`
/// rather than mutating an existing program in place — programs are values,
/// and "optimizing" one means building a new one (spec, Design Notes).
///
/// `wrap` prefers the inner program's own `with_instruction`/`with_demos`
/// when it has them (the common case: a `Predict` rewrites itself and the
/// override is fully honored at call time). When the inner program doesn't
/// support one of the requested overrides — no instruction or demo slot to
/// rewrite — this type still carries the override as metadata visible to
/// pool and strategy code, even though `forward` can't make the inner
/// program actually use it.
pub struct OptimizedProgram {
    inner: Arc<dyn Program>,
    instruction: Option<String>,
    demos: Option<Vec<Example>>,
}

impl OptimizedProgram {
    pub fn wrap(
        inner: Arc<dyn Program>,
        instruction: Option<String>,
        demos: Option<Vec<Example>>,
    ) -> Arc<dyn Program> {
        let mut current = inner;
        let mut instruction_honored = instruction.is_none();
        let mut demos_honored = demos.is_none();

        if let Some(instr) = instruction.clone() {
            if let Some(rewritten) = current.with_instruction(instr) {
                current = rewritten;
                instruction_honored = true;
            }
        }
        if let Some(d) = demos.clone() {
            if let Some(rewritten) = current.with_demos(d) {
                current = rewritten;
                demos_honored = true;
            }
        }

        if instruction_honored && demos_honored {
            return current;
        }

        Arc::new(Self {
            inner: current,
            instruction,
            demos,
        })
    }
}

#[async_trait]
impl Program for OptimizedProgram {
    async fn forward(
        &self,
        inputs: &Example,
        model_config: &ModelConfig,
    ) -> Result<Outputs, ExecutionError> {
        self.inner.forward(inputs, model_config).await
    }

    fn instruction(&self) -> Option<String> {
        self.instruction.clone().or_else(|| self.inner.instruction())
    }

    fn demos(&self) -> Option<Vec<Example>> {
        self.demos.clone().or_else(|| self.inner.demos())
    }

    fn with_instruction(&self, instruction: String) -> Option<Arc<dyn Program>> {
        Some(Arc::new(Self {
            inner: self.inner.clone(),
            instruction: Some(instruction),
            demos: self.demos.clone(),
        }))
    }

    fn with_demos(&self, demos: Vec<Example>) -> Option<Arc<dyn Program>> {
        Some(Arc::new(Self {
            inner: self.inner.clone(),
            instruction: self.instruction.clone(),
            demos: Some(demos),
        }))
    }

    fn signature(&self) -> Option<&dyn SignatureInfo> {
        self.inner.signature()
    }
}
