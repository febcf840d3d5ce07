//! Structured logging and the telemetry-event surface (spec §6, §7).
//!
//! Grounded on `utils/telemetry.rs` in the teacher: a `tracing_subscriber`
//! init routine that honors `RUST_LOG`, is idempotent, and defaults to a
//! crate-local filter. The spec's `telemetry_emit(event_path, measurements,
//! metadata)` collaborator is rendered as [`emit`], a thin wrapper over a
//! `tracing::info!` event carrying the dotted event path plus structured
//! fields. A no-op sink is automatically satisfied: with no subscriber
//! installed, `tracing` events are simply dropped.

use std::sync::OnceLock;

use serde_json::Value;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "dspex=debug";
static TRACING_INITIALIZED: OnceLock<()> = OnceLock::new();

#[derive(Debug, Error)]
pub enum TelemetryInitError {
    #[error("invalid tracing filter directive `{directive}`: {source}")]
    InvalidFilter {
        directive: String,
        source: tracing_subscriber::filter::ParseError,
    },
    #[error("failed to install tracing subscriber: {0}")]
    SetGlobalDefault(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Installs a process-global `tracing` subscriber for DSPEx.
///
/// Idempotent: repeated calls after the first successful init are no-ops.
/// Uses `RUST_LOG` when present, falling back to `dspex=debug`.
pub fn init_tracing() -> Result<(), TelemetryInitError> {
    if TRACING_INITIALIZED.get().is_some() {
        return Ok(());
    }

    let filter = resolve_filter()?;
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    let _ = TRACING_INITIALIZED.set(());
    Ok(())
}

fn resolve_filter() -> Result<EnvFilter, TelemetryInitError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(DEFAULT_FILTER).map_err(|source| {
            TelemetryInitError::InvalidFilter {
                directive: DEFAULT_FILTER.to_string(),
                source,
            }
        }),
    }
}

/// The stable telemetry event names from spec §6, as dotted paths.
pub mod events {
    pub const TELEPROMPTER_START: &str = "teleprompter.start";
    pub const TELEPROMPTER_STOP: &str = "teleprompter.stop";
    pub const TELEPROMPTER_ITERATION: &str = "teleprompter.iteration";
    pub const STRATEGY_APPLIED: &str = "teleprompter.strategy.applied";
    pub const CANDIDATE_SCORED: &str = "teleprompter.candidate.scored";
    pub const BAYESIAN_START: &str = "bayesian.start";
    pub const BAYESIAN_STOP: &str = "bayesian.stop";
    pub const BAYESIAN_ITERATION: &str = "bayesian.iteration";
}

/// Emits one telemetry event. Never raises — a failed emission is simply
/// dropped, matching the spec's "no-op sink is a valid implementation."
///
/// `measurements` and `metadata` are rendered as JSON for structured
/// capture by any `tracing` layer that wants them (e.g. `tracing-opentelemetry`);
/// plain `fmt` subscribers show them inline.
pub fn emit(event_path: &str, correlation_id: &str, measurements: Value, metadata: Value) {
    tracing::info!(
        event = event_path,
        correlation_id = correlation_id,
        measurements = %measurements,
        metadata = %metadata,
        "telemetry event"
    );
}
