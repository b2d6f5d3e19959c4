//! Canonical definition model.
//!
//! These types are built by `stored.rs` from the JSON bundle; every optional
//! field and string shorthand has already been checked and parsed, so
//! playback code never re-validates.

use serde::{Deserialize, Serialize};

use crate::error::{DefinitionError, Result};
use crate::interp::Ease;
use crate::pose::{Point, PoseTarget};
use crate::triggers::{GameplayEffect, Trigger};

/// Role a dash moves towards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DashTarget {
    /// Whatever actor the playback is aimed at (`true`, `"enemy"`, `"target"`).
    Opponent,
    /// A named role.
    Role(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct DashSpec {
    pub target: DashTarget,
    /// Extra gap kept between the two bodies.
    pub padding: Option<f32>,
    /// Exact stop distance from the target, replacing the body-width rule.
    /// Negative values stop past the target.
    pub offset: Option<f32>,
    /// Curve for the position channels of this segment.
    pub ease: Option<Ease>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Keyframe {
    pub pose: PoseTarget,
    pub duration_ms: f32,
    pub ease: Ease,
    pub dash: Option<DashSpec>,
    /// Fired in order when the keyframe is entered.
    pub triggers: Vec<Trigger>,
}

impl Keyframe {
    pub fn new(pose: PoseTarget, duration_ms: f32, ease: Ease) -> Self {
        Self {
            pose,
            duration_ms,
            ease,
            dash: None,
            triggers: Vec::new(),
        }
    }

    /// No pose delta and no dash: the keyframe only spends time.
    pub fn is_timing_only(&self) -> bool {
        self.pose.is_empty() && self.dash.is_none()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AnimationDefinition {
    pub id: String,
    pub name: String,
    /// Actor tag this animation is authored for ("player", "enemy", ...).
    pub target: Option<String>,
    pub priority: i32,
    /// Authored nominal duration; playback uses the keyframe sum.
    pub nominal_ms: Option<f32>,
    pub return_to_base: bool,
    pub keyframes: Vec<Keyframe>,
}

impl AnimationDefinition {
    /// Sum of keyframe durations.
    pub fn total_duration_ms(&self) -> f32 {
        self.keyframes.iter().map(|k| k.duration_ms).sum()
    }

    /// Structural checks shared by stored and synthetic definitions.
    pub fn validate(&self) -> Result<()> {
        if self.keyframes.is_empty() {
            return Err(DefinitionError::EmptyKeyframes {
                id: self.id.clone(),
            });
        }
        for (i, kf) in self.keyframes.iter().enumerate() {
            if !kf.duration_ms.is_finite() || kf.duration_ms < 0.0 {
                return Err(DefinitionError::InvalidDuration {
                    context: format!("{} keyframe {i}", self.id),
                    value: kf.duration_ms,
                });
            }
        }
        Ok(())
    }
}

/// A single animation id or a list of alternatives picked at random.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AnimRef {
    One(String),
    OneOf(Vec<String>),
}

impl AnimRef {
    /// Choose an id given a random index source; `pick(n)` returns `0..n`.
    pub fn choose(&self, pick: impl FnOnce(usize) -> usize) -> Option<&str> {
        match self {
            AnimRef::One(id) => Some(id),
            AnimRef::OneOf(ids) if ids.is_empty() => None,
            AnimRef::OneOf(ids) => ids.get(pick(ids.len()).min(ids.len() - 1)).map(String::as_str),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AnimStep {
    pub anim: AnimRef,
    pub wait: bool,
    /// Pause before the animation starts.
    pub delay_ms: f32,
    /// Delivered when the animation reaches Done.
    pub effects: Vec<GameplayEffect>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DelayStep {
    pub ms: f32,
}

/// Projectile parameters; unset fields take the configured defaults.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectileSpec {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub piercing: Option<bool>,
    pub target_all: Option<bool>,
    pub reverse: Option<bool>,
    /// Pixels per 60 Hz frame.
    pub speed: Option<f32>,
    pub on_hit_each: Option<bool>,
    pub damage: Option<f32>,
    pub shake: Option<f32>,
    pub hit_vfx: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProjectileStep {
    pub spec: ProjectileSpec,
    pub wait: bool,
    pub delay_ms: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EventStep {
    pub delay_ms: f32,
    pub effects: Vec<GameplayEffect>,
}

/// One sequence step.
#[derive(Clone, Debug, PartialEq)]
pub enum Step {
    Anim(AnimStep),
    Delay(DelayStep),
    Projectile(ProjectileStep),
    Event(EventStep),
}

impl Step {
    pub fn kind(&self) -> &'static str {
        match self {
            Step::Anim(_) => "anim",
            Step::Delay(_) => "delay",
            Step::Projectile(_) => "projectile",
            Step::Event(_) => "event",
        }
    }

    /// Time spent before the step does anything.
    pub fn pre_delay_ms(&self) -> f32 {
        match self {
            Step::Anim(s) => s.delay_ms,
            Step::Delay(s) => s.ms,
            Step::Projectile(s) => s.delay_ms,
            Step::Event(s) => s.delay_ms,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SequenceDefinition {
    pub id: String,
    pub name: String,
    /// Tag of the initiating actor; animations authored for this tag play on
    /// the initiator, everything else on the target.
    pub actor: String,
    pub return_to_base: bool,
    pub steps: Vec<Step>,
}

/// Particle payload owner. Particles are opaque to the engine.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VfxDefinition {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub shake: Option<f32>,
    #[serde(default)]
    pub hitstop: Option<f32>,
    #[serde(default)]
    pub duration: Option<f32>,
    #[serde(default)]
    pub offset: Point,
    #[serde(default)]
    pub particles: Vec<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interp::EaseDir;

    fn kf(duration_ms: f32) -> Keyframe {
        Keyframe::new(PoseTarget::default(), duration_ms, Ease::power(2, EaseDir::Out))
    }

    #[test]
    fn total_is_keyframe_sum() {
        let def = AnimationDefinition {
            id: "a".into(),
            name: "a".into(),
            target: None,
            priority: 0,
            nominal_ms: Some(999.0),
            return_to_base: false,
            keyframes: vec![kf(0.0), kf(80.0), kf(45.0)],
        };
        assert_eq!(def.total_duration_ms(), 125.0);
        assert!(def.validate().is_ok());
        assert!(def.keyframes[1].is_timing_only());
    }

    #[test]
    fn validate_rejects_negative_durations() {
        let def = AnimationDefinition {
            id: "bad".into(),
            name: String::new(),
            target: None,
            priority: 0,
            nominal_ms: None,
            return_to_base: false,
            keyframes: vec![kf(-1.0)],
        };
        assert!(matches!(
            def.validate(),
            Err(DefinitionError::InvalidDuration { .. })
        ));
    }

    #[test]
    fn anim_ref_choice_is_bounded() {
        let r = AnimRef::OneOf(vec!["a".into(), "b".into()]);
        assert_eq!(r.choose(|_| 1), Some("b"));
        assert_eq!(r.choose(|_| 7), Some("b"));
        assert_eq!(AnimRef::One("x".into()).choose(|_| 0), Some("x"));
        assert_eq!(AnimRef::OneOf(vec![]).choose(|_| 0), None);
    }

    #[test]
    fn vfx_definition_defaults() {
        let v: VfxDefinition =
            serde_json::from_str(r#"{ "id": "hit", "shake": 5, "particles": [{"type":"flash"}] }"#)
                .unwrap();
        assert_eq!(v.offset, Point::ZERO);
        assert_eq!(v.shake, Some(5.0));
        assert_eq!(v.particles.len(), 1);
    }
}
