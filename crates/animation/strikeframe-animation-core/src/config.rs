//! Core configuration for strikeframe-animation-core.

use serde::{Deserialize, Serialize};

use crate::interp::Ease;

/// Defaults applied while loading definitions and while playing them back.
///
/// Every field has a default so a partial JSON document can override only what
/// it names.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Duration used when a keyframe after the first omits `duration`.
    pub default_keyframe_ms: f32,
    pub default_ease: Ease,
    pub default_dash_ease: Ease,
    /// Gap kept between two bodies when a dash has no explicit `dashOffset`.
    pub dash_padding: f32,
    /// Shortest a dash segment may play, whatever its keyframe says.
    pub min_dash_ms: f32,
    /// Half-width assumed for an actor whose provider reports none.
    pub body_half_width: f32,
    /// Trailing return-to-base interpolation.
    pub return_ms: f32,
    pub return_ease: Ease,
    pub hop: HopReturn,
}

/// Shape of the hop used when a return-to-base covers a long distance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HopReturn {
    /// Distances at or below this use a plain interpolation.
    pub threshold: f32,
    /// Hop duration relative to `return_ms`, capped by `max_ms`.
    pub duration_factor: f32,
    pub max_ms: f32,
    pub base_height: f32,
    pub height_per_px: f32,
    pub max_height: f32,
}

impl Default for HopReturn {
    fn default() -> Self {
        Self {
            threshold: 100.0,
            duration_factor: 1.2,
            max_ms: 250.0,
            base_height: 40.0,
            height_per_px: 0.1,
            max_height: 80.0,
        }
    }
}

impl HopReturn {
    pub fn height_for(&self, distance: f32) -> f32 {
        (self.base_height + distance * self.height_per_px).min(self.max_height)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_keyframe_ms: 100.0,
            default_ease: Ease::power(2, crate::interp::EaseDir::Out),
            default_dash_ease: Ease::power(2, crate::interp::EaseDir::InOut),
            dash_padding: 10.0,
            min_dash_ms: 150.0,
            body_half_width: 50.0,
            return_ms: 120.0,
            return_ease: Ease::power(3, crate::interp::EaseDir::Out),
            hop: HopReturn::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg: Config =
            serde_json::from_str(r#"{ "return_ms": 90, "default_ease": "sine.inOut" }"#).unwrap();
        assert_eq!(cfg.return_ms, 90.0);
        assert_eq!(cfg.default_ease.to_string(), "sine.inOut");
        assert_eq!(cfg.dash_padding, 10.0);
        assert_eq!(cfg.min_dash_ms, 150.0);
        assert_eq!(cfg.hop.threshold, 100.0);
    }

    #[test]
    fn hop_height_is_capped() {
        let hop = HopReturn::default();
        assert_eq!(hop.height_for(100.0), 50.0);
        assert_eq!(hop.height_for(1000.0), 80.0);
    }
}
