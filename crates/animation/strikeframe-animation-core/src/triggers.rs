//! Side effects attached to keyframes.
//!
//! Each keyframe carries its triggers as a list of closed variants, checked
//! when the definition is loaded. The interpolator reports them when the
//! keyframe is entered; dispatching them is the orchestrator's job.

use serde::{Deserialize, Serialize};

/// Where a VFX spawns relative to the acting instance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VfxTarget {
    #[default]
    #[serde(rename = "self")]
    SelfActor,
    Target,
}

#[derive(Clone, Debug, PartialEq)]
pub struct VfxTrigger {
    pub id: String,
    pub target: VfxTarget,
}

/// Time-dilation request.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SlowmoSpec {
    /// Numeric shorthand; duration comes from `slowmoDuration` or the
    /// configured default for this form.
    Scale { scale: f32, duration_ms: Option<f32> },
    /// `{scale, duration}` object form.
    Window { scale: f32, duration_ms: Option<f32> },
    /// The configured impact preset.
    Impact,
    /// Restore rate 1 immediately.
    Reset,
}

/// Sprite break-apart parameters; unset fields take the configured defaults.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShatterSpec {
    pub grid: Option<u32>,
    pub force: Option<f32>,
    pub gravity: Option<f32>,
    pub life: Option<f32>,
    pub hide: Option<bool>,
    pub hide_time: Option<f32>,
    /// Role to shatter; the opposing actor when absent.
    pub target: Option<String>,
    pub color: Option<u32>,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TintSpec {
    pub color: u32,
    pub duration_ms: Option<f32>,
}

/// Named full-screen palette override.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorGrade {
    Hit,
    Critical,
    Power,
    Shadow,
    Heal,
    Reset,
}

impl ColorGrade {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "hit" => Some(Self::Hit),
            "critical" => Some(Self::Critical),
            "power" => Some(Self::Power),
            "shadow" => Some(Self::Shadow),
            "heal" => Some(Self::Heal),
            "reset" | "none" => Some(Self::Reset),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColorTrigger {
    pub grade: ColorGrade,
    pub duration_ms: Option<f32>,
}

/// Camera move. Any field may be absent; a move with neither zoom nor focus
/// is a no-op.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CameraSpec {
    pub zoom: Option<f32>,
    /// `"self"`, `"target"`, or a role name.
    pub focus: Option<String>,
    pub duration_ms: Option<f32>,
}

/// Named status change. `value` defaults to 1 when authored as a bare name.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatusEffect {
    pub name: String,
    pub value: f32,
    pub target: Option<String>,
}

/// Gameplay event forwarded verbatim, e.g. `draw` or `energy`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameEvent {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: f32,
}

/// Mechanical effect delivered to the combat sink.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GameplayEffect {
    Damage { amount: f32, target: Option<String> },
    Buff(StatusEffect),
    Debuff(StatusEffect),
    Event(GameEvent),
}

impl GameplayEffect {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Damage { .. } => "damage",
            Self::Buff(_) => "buff",
            Self::Debuff(_) => "debuff",
            Self::Event(_) => "event",
        }
    }
}

/// One side effect, fired at most once per playback instance.
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub enum Trigger {
    Vfx(VfxTrigger),
    Hitstop { ms: f32 },
    Shake { magnitude: f32 },
    Shatter(ShatterSpec),
    Camera(CameraSpec),
    Color(ColorTrigger),
    Slowmo(SlowmoSpec),
    Afterimage,
    Tint(TintSpec),
    Effect(GameplayEffect),
}

impl Trigger {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Vfx(_) => "vfx",
            Self::Hitstop { .. } => "hitstop",
            Self::Shake { .. } => "shake",
            Self::Shatter(_) => "shatter",
            Self::Camera(_) => "camera",
            Self::Color(_) => "color",
            Self::Slowmo(_) => "slowmo",
            Self::Afterimage => "afterimage",
            Self::Tint(_) => "tint",
            Self::Effect(effect) => effect.name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vfx_target_uses_stored_names() {
        let t: VfxTarget = serde_json::from_str("\"self\"").unwrap();
        assert_eq!(t, VfxTarget::SelfActor);
        let t: VfxTarget = serde_json::from_str("\"target\"").unwrap();
        assert_eq!(t, VfxTarget::Target);
    }

    #[test]
    fn grade_names() {
        assert_eq!(ColorGrade::parse("critical"), Some(ColorGrade::Critical));
        assert_eq!(ColorGrade::parse("none"), Some(ColorGrade::Reset));
        assert_eq!(ColorGrade::parse("sepia"), None);
    }

    #[test]
    fn effect_names_flow_into_trigger_names() {
        let t = Trigger::Effect(GameplayEffect::Damage {
            amount: 3.0,
            target: None,
        });
        assert_eq!(t.name(), "damage");
        assert_eq!(Trigger::Afterimage.name(), "afterimage");
    }
}
