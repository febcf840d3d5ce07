//! Selecting which pool programs run next, and running them concurrently to
//! produce trajectories (spec §4.2, §4.3, §5).

mod softmax;
mod trajectory_sampler;

pub use softmax::softmax_select;
pub use trajectory_sampler::{SampleRequest, TrajectorySampler};
