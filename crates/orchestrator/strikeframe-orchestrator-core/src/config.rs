//! Engine-wide configuration: feature toggles, dilation and camera limits,
//! effect defaults and the nested animation `Config`.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use strikeframe_animation_core::Config as AnimationConfig;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Global playback multiplier applied after time dilation.
    pub speed: f32,

    pub enable_vfx: bool,
    pub enable_shake: bool,
    pub enable_hitstop: bool,
    pub enable_slowmo: bool,
    pub enable_camera: bool,
    pub enable_color_grade: bool,
    pub enable_afterimage: bool,

    pub slowmo: SlowmoConfig,
    pub camera: CameraConfig,
    pub tint_ms: f32,
    pub color_grade_ms: f32,
    pub shatter: ShatterDefaults,
    pub projectile: ProjectileDefaults,

    /// Afterimage colors by side.
    pub ally_afterimage_color: u32,
    pub opponent_afterimage_color: u32,

    /// Seed for choosing between alternative animations; entropy when unset.
    pub seed: Option<u64>,

    pub animation: AnimationConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            speed: 1.0,
            enable_vfx: true,
            enable_shake: true,
            enable_hitstop: true,
            enable_slowmo: true,
            enable_camera: true,
            enable_color_grade: true,
            enable_afterimage: true,
            slowmo: SlowmoConfig::default(),
            camera: CameraConfig::default(),
            tint_ms: 30.0,
            color_grade_ms: 150.0,
            shatter: ShatterDefaults::default(),
            projectile: ProjectileDefaults::default(),
            ally_afterimage_color: 0x60a5fa,
            opponent_afterimage_color: 0xef4444,
            seed: None,
            animation: AnimationConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Merge a partial JSON document over the defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("failed to parse engine config")
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read engine config at {}", path.display()))?;
        Self::from_json_str(&text).with_context(|| format!("in {}", path.display()))
    }

    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlowmoConfig {
    pub min_scale: f32,
    pub max_scale: f32,
    /// The `"impact"` preset.
    pub impact_scale: f32,
    pub impact_ms: f32,
    /// Duration for the numeric shorthand without `slowmoDuration`.
    pub scale_ms: f32,
    /// Duration for the `{scale}` object form without `duration`.
    pub window_ms: f32,
}

impl Default for SlowmoConfig {
    fn default() -> Self {
        Self {
            min_scale: 0.1,
            max_scale: 2.0,
            impact_scale: 0.15,
            impact_ms: 80.0,
            scale_ms: 300.0,
            window_ms: 500.0,
        }
    }
}

impl SlowmoConfig {
    pub fn clamp(&self, scale: f32) -> f32 {
        scale.clamp(self.min_scale, self.max_scale)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub min_zoom: f32,
    pub max_zoom: f32,
    pub zoom_ms: f32,
    pub focus_ms: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            min_zoom: 0.5,
            max_zoom: 2.0,
            zoom_ms: 200.0,
            focus_ms: 150.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShatterDefaults {
    pub grid: u32,
    pub force: f32,
    pub gravity: f32,
    pub life_ms: f32,
    pub hide: bool,
    pub hide_time_ms: f32,
}

impl Default for ShatterDefaults {
    fn default() -> Self {
        Self {
            grid: 10,
            force: 12.0,
            gravity: 0.35,
            life_ms: 500.0,
            hide: true,
            hide_time_ms: 150.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileDefaults {
    pub kind: String,
    pub piercing: bool,
    pub target_all: bool,
    pub reverse: bool,
    /// Pixels per 60 Hz frame.
    pub speed: f32,
    pub on_hit_each: bool,
    pub damage: f32,
    pub shake: f32,
    /// How long a flight keeps going after its last target, in ms.
    pub exit_ms: f32,
}

impl Default for ProjectileDefaults {
    fn default() -> Self {
        Self {
            kind: "chakram".to_string(),
            piercing: true,
            target_all: true,
            reverse: false,
            speed: 25.0,
            on_hit_each: true,
            damage: 4.0,
            shake: 6.0,
            exit_ms: 200.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = EngineConfig::from_json_str(
            r#"{ "speed": 1.5, "slowmo": { "impact_ms": 120 }, "animation": { "return_ms": 90 } }"#,
        )
        .unwrap();
        assert_eq!(cfg.speed, 1.5);
        assert_eq!(cfg.slowmo.impact_ms, 120.0);
        assert_eq!(cfg.slowmo.impact_scale, 0.15);
        assert_eq!(cfg.animation.return_ms, 90.0);
        assert_eq!(cfg.animation.dash_padding, 10.0);
        assert!(cfg.enable_color_grade);
    }

    #[test]
    fn slowmo_scale_is_clamped() {
        let s = SlowmoConfig::default();
        assert_eq!(s.clamp(0.01), 0.1);
        assert_eq!(s.clamp(5.0), 2.0);
        assert_eq!(s.clamp(0.5), 0.5);
    }

    #[test]
    fn malformed_config_reports_context() {
        let err = EngineConfig::from_json_str("{ speed: }").unwrap_err();
        assert!(format!("{err:#}").contains("engine config"));
    }

    #[test]
    fn seeded_rng_is_repeatable() {
        use rand::Rng;
        let cfg = EngineConfig {
            seed: Some(42),
            ..EngineConfig::default()
        };
        let a: u32 = cfg.rng().gen();
        let b: u32 = cfg.rng().gen();
        assert_eq!(a, b);
    }
}
