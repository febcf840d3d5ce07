use async_trait::async_trait;

use crate::error::ExecutionError;

/// The LM call `AppendRule` makes to turn a bucket's trajectories into a new
/// instruction. A separate external collaborator from [`crate::program::LmClient`]
/// (spec §1, §6): this one takes a free-form prompt and returns free-form
/// text, rather than structured program inputs/outputs.
#[async_trait]
pub trait FeedbackAdvisor: Send + Sync {
    async fn propose_rule(&self, prompt: &str) -> Result<String, ExecutionError>;
}
