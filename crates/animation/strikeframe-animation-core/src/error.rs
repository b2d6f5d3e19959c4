//! Error types raised while loading definitions.
//!
//! Playback itself never fails: missing references and unresolvable targets
//! are recovered where they happen. Only malformed data is rejected, and only
//! at load time.

use serde::{Deserialize, Serialize};

/// Reasons a stored definition cannot be turned into a typed definition.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum DefinitionError {
    /// The document is not valid JSON or does not match the stored shape.
    #[error("Parse error: {reason}")]
    Parse { reason: String },

    /// Unknown easing family or direction.
    #[error("Unknown ease: {name}")]
    UnknownEase { name: String },

    /// Easing arguments that are not numbers, or more than the family accepts.
    #[error("Invalid ease arguments in {name}: {reason}")]
    EaseArguments { name: String, reason: String },

    /// A string slow-motion token other than the known shorthands.
    #[error("Unknown slowmo token: {token}")]
    UnknownSlowmo { token: String },

    /// A color that is neither a number nor a `#rrggbb`/`0xrrggbb` string.
    #[error("Invalid color: {value}")]
    InvalidColor { value: String },

    #[error("Unknown color grade: {name}")]
    UnknownColorGrade { name: String },

    #[error("Animation {id} has no keyframes")]
    EmptyKeyframes { id: String },

    #[error("Invalid duration {value} in {context}")]
    InvalidDuration { context: String, value: f32 },

    /// A sequence step that names no recognised kind, or names two.
    #[error("Invalid step {index} in sequence {sequence}: {reason}")]
    InvalidStep {
        sequence: String,
        index: usize,
        reason: String,
    },

    /// A bundle entry whose `id` disagrees with its key.
    #[error("Bundle key {key} does not match entry id {id}")]
    IdMismatch { key: String, id: String },
}

impl DefinitionError {
    /// Get error category for logging
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::Parse { .. } => "serialization",
            Self::UnknownEase { .. } | Self::EaseArguments { .. } => "easing",
            Self::UnknownSlowmo { .. }
            | Self::InvalidColor { .. }
            | Self::UnknownColorGrade { .. } => "trigger",
            Self::EmptyKeyframes { .. } | Self::InvalidDuration { .. } => "keyframe",
            Self::InvalidStep { .. } => "sequence",
            Self::IdMismatch { .. } => "bundle",
        }
    }
}

impl From<serde_json::Error> for DefinitionError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse {
            reason: err.to_string(),
        }
    }
}

/// Result type for definition loading.
pub type Result<T> = core::result::Result<T, DefinitionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories() {
        let err = DefinitionError::UnknownEase {
            name: "wobble".into(),
        };
        assert_eq!(err.category(), "easing");
        assert_eq!(err.to_string(), "Unknown ease: wobble");

        let err = DefinitionError::EmptyKeyframes { id: "a".into() };
        assert_eq!(err.category(), "keyframe");
    }

    #[test]
    fn json_errors_convert() {
        let err: DefinitionError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, DefinitionError::Parse { .. }));
    }
}
