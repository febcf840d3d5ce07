//! The core data model: `Example`/`Outputs` as the field-mapping records
//! programs operate on, `Trajectory` as one execution of a `(program,
//! example)` pair, and `Bucket` as a group of trajectories sharing an
//! example (spec §3).

mod bucket;
mod example;
mod model_config;
mod outputs;
mod trajectory;

pub use bucket::{Bucket, group_into_buckets};
pub use example::Example;
pub use model_config::{Metadata, ModelConfig};
pub use outputs::Outputs;
pub use trajectory::Trajectory;
