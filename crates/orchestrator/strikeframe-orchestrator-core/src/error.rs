use thiserror::Error;

/// Rejections from the orchestrator's public entry points.
///
/// Problems found mid-playback (a missing animation inside a sequence, an
/// unknown VFX id) are logged and skipped instead; only calls a host makes
/// directly fail.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum OrchestratorError {
    #[error("unknown sequence '{0}'")]
    UnknownSequence(String),
    #[error("unknown animation '{0}'")]
    UnknownAnimation(String),
    #[error("actor '{0}' is not on the board")]
    UnknownActor(String),
    #[error("invalid tick delta {0} ms")]
    InvalidDelta(f32),
}
