use serde::Deserialize;
use serde_json::{Map, Value as JsonValue};

use crate::config::Config;
use crate::data::{
    AnimRef, AnimStep, AnimationDefinition, DashSpec, DashTarget, DelayStep, EventStep, Keyframe,
    ProjectileSpec, ProjectileStep, SequenceDefinition, Step, VfxDefinition,
};
use crate::error::{DefinitionError, Result};
use crate::interp::Ease;
use crate::pose::PoseTarget;
use crate::triggers::{
    CameraSpec, ColorGrade, ColorTrigger, GameEvent, GameplayEffect, ShatterSpec, SlowmoSpec,
    StatusEffect, TintSpec, Trigger, VfxTarget, VfxTrigger,
};

/// Typed content of one stored bundle.
#[derive(Clone, Debug, Default)]
pub struct Bundle {
    pub animations: Vec<AnimationDefinition>,
    pub sequences: Vec<SequenceDefinition>,
    pub vfx: Vec<VfxDefinition>,
    /// Keys of entries that failed to parse and were left out.
    pub skipped: Vec<String>,
}

/// Public API: parse a single stored animation (keyframe list) into the
/// canonical AnimationDefinition (data.rs).
///
/// Notes:
/// - Durations are milliseconds. A keyframe after the first that omits
///   `duration` gets `cfg.default_keyframe_ms`; the first defaults to 0.
/// - Easing names are parsed here, once.
/// - Trigger fields become `Trigger` variants in dispatch order: vfx,
///   hitstop, shake, shatter, camera, color, slowmo, afterimage, tint, then
///   gameplay effects (damage, buff, debuff, event).
/// - `comment` and unknown fields are ignored.
pub fn parse_animation_json(s: &str, cfg: &Config) -> Result<AnimationDefinition> {
    let raw: StoredAnimation = serde_json::from_str(s)?;
    animation_from_raw(raw, None, cfg)
}

/// Public API: parse a single stored sequence (`"type": "sequence"`).
pub fn parse_sequence_json(s: &str) -> Result<SequenceDefinition> {
    let raw: StoredSequence = serde_json::from_str(s)?;
    sequence_from_raw(raw, None)
}

/// Public API: parse a bundle of the shape
/// `{ "animations": { id: animation | sequence }, "vfx": { id: vfx } }`.
///
/// Only a document that is not a bundle at all is an error. An entry that
/// fails to parse is logged, listed in `Bundle::skipped` and left out; the
/// rest of the bundle still loads.
pub fn parse_bundle_json(s: &str, cfg: &Config) -> Result<Bundle> {
    let raw: StoredBundle = serde_json::from_str(s)?;
    let mut bundle = Bundle::default();

    for (key, entry) in raw.animations {
        let is_sequence = entry.get("type").and_then(JsonValue::as_str) == Some("sequence");
        let parsed = if is_sequence {
            serde_json::from_value::<StoredSequence>(entry)
                .map_err(DefinitionError::from)
                .and_then(|seq| sequence_from_raw(seq, Some(&key)))
                .map(|seq| bundle.sequences.push(seq))
        } else {
            serde_json::from_value::<StoredAnimation>(entry)
                .map_err(DefinitionError::from)
                .and_then(|anim| animation_from_raw(anim, Some(&key), cfg))
                .map(|anim| bundle.animations.push(anim))
        };
        if let Err(err) = parsed {
            bundle.skip(key, &err);
        }
    }

    for (key, entry) in raw.vfx {
        let parsed = serde_json::from_value::<VfxDefinition>(entry)
            .map_err(DefinitionError::from)
            .and_then(|mut vfx| {
                vfx.id = bundle_id(&key, Some(&vfx.id).filter(|id| !id.is_empty()).cloned())?;
                Ok(vfx)
            });
        match parsed {
            Ok(vfx) => bundle.vfx.push(vfx),
            Err(err) => bundle.skip(key, &err),
        }
    }

    Ok(bundle)
}

impl Bundle {
    fn skip(&mut self, key: String, err: &DefinitionError) {
        log::warn!("skipping bundle entry '{key}' ({}): {err}", err.category());
        self.skipped.push(key);
    }
}

/// Resolve an entry id against its bundle key.
fn bundle_id(key: &str, id: Option<String>) -> Result<String> {
    match id {
        Some(id) if id != key => Err(DefinitionError::IdMismatch {
            key: key.to_string(),
            id,
        }),
        _ => Ok(key.to_string()),
    }
}

fn animation_from_raw(
    raw: StoredAnimation,
    key: Option<&str>,
    cfg: &Config,
) -> Result<AnimationDefinition> {
    let id = match key {
        Some(key) => bundle_id(key, raw.id)?,
        None => raw.id.unwrap_or_default(),
    };

    let mut keyframes = Vec::with_capacity(raw.keyframes.len());
    for (i, kf) in raw.keyframes.into_iter().enumerate() {
        keyframes.push(keyframe_from_raw(kf, i, cfg)?);
    }

    let def = AnimationDefinition {
        name: raw.name.unwrap_or_else(|| id.clone()),
        id,
        target: raw.target,
        priority: raw.priority.unwrap_or(0),
        nominal_ms: raw.duration,
        return_to_base: raw.return_to_base.unwrap_or(false),
        keyframes,
    };
    def.validate()?;
    Ok(def)
}

fn keyframe_from_raw(raw: StoredKeyframe, index: usize, cfg: &Config) -> Result<Keyframe> {
    let duration_ms = raw.duration.unwrap_or(if index == 0 {
        0.0
    } else {
        cfg.default_keyframe_ms
    });
    let ease = match raw.ease.as_deref() {
        Some(name) => Ease::parse(name)?,
        None => cfg.default_ease,
    };

    let dash = match raw.dash_to_target {
        Some(RawDashTarget::Flag(false)) | None => None,
        Some(RawDashTarget::Flag(true)) => Some(DashTarget::Opponent),
        Some(RawDashTarget::Role(role)) => Some(match role.as_str() {
            "enemy" | "target" => DashTarget::Opponent,
            _ => DashTarget::Role(role),
        }),
    }
    .map(|target| -> Result<DashSpec> {
        Ok(DashSpec {
            target,
            padding: raw.dash_padding,
            offset: raw.dash_offset,
            ease: raw.dash_ease.as_deref().map(Ease::parse).transpose()?,
        })
    })
    .transpose()?;

    let mut triggers = Vec::new();
    if let Some(id) = raw.vfx {
        let target = match raw.vfx_target.as_deref() {
            Some("target") => VfxTarget::Target,
            _ => VfxTarget::SelfActor,
        };
        triggers.push(Trigger::Vfx(VfxTrigger { id, target }));
    }
    if let Some(ms) = raw.hitstop.filter(|ms| *ms > 0.0) {
        triggers.push(Trigger::Hitstop { ms });
    }
    if let Some(magnitude) = raw.shake.map(RawShake::magnitude).filter(|m| *m > 0.0) {
        triggers.push(Trigger::Shake { magnitude });
    }
    match raw.shatter {
        Some(RawShatter::Flag(true)) => triggers.push(Trigger::Shatter(ShatterSpec::default())),
        Some(RawShatter::Spec(spec)) => triggers.push(Trigger::Shatter(spec.try_into()?)),
        Some(RawShatter::Flag(false)) | None => {}
    }
    if let Some(cam) = raw.camera {
        triggers.push(Trigger::Camera(CameraSpec {
            zoom: cam.zoom,
            focus: cam.focus,
            duration_ms: cam.duration,
        }));
    }
    if let Some(name) = raw.color {
        let grade = ColorGrade::parse(&name)
            .ok_or(DefinitionError::UnknownColorGrade { name })?;
        triggers.push(Trigger::Color(ColorTrigger {
            grade,
            duration_ms: raw.color_duration,
        }));
    }
    if let Some(slowmo) = raw.slowmo {
        triggers.push(Trigger::Slowmo(slowmo_from_raw(slowmo, raw.slowmo_duration)?));
    }
    if raw.afterimage == Some(true) {
        triggers.push(Trigger::Afterimage);
    }
    if let Some(tint) = raw.tint {
        let spec = match tint {
            RawTint::Color(color) => TintSpec {
                color: color.to_rgb()?,
                duration_ms: None,
            },
            RawTint::Spec { color, duration } => TintSpec {
                color: color.to_rgb()?,
                duration_ms: duration,
            },
        };
        triggers.push(Trigger::Tint(spec));
    }
    let effects = effects_from_raw(raw.damage, raw.target, raw.buff, raw.debuff, raw.event);
    triggers.extend(effects.into_iter().map(Trigger::Effect));

    Ok(Keyframe {
        pose: PoseTarget {
            x: raw.x,
            y: raw.y,
            scale_x: raw.scale_x,
            scale_y: raw.scale_y,
            rotation: raw.rotation,
            alpha: raw.alpha,
        },
        duration_ms,
        ease,
        dash,
        triggers,
    })
}

fn slowmo_from_raw(raw: RawSlowmo, duration: Option<f32>) -> Result<SlowmoSpec> {
    Ok(match raw {
        RawSlowmo::Token(token) => match token.as_str() {
            "impact" => SlowmoSpec::Impact,
            "reset" => SlowmoSpec::Reset,
            _ => return Err(DefinitionError::UnknownSlowmo { token }),
        },
        RawSlowmo::Scale(scale) if scale == 1.0 => SlowmoSpec::Reset,
        RawSlowmo::Scale(scale) => SlowmoSpec::Scale {
            scale,
            duration_ms: duration,
        },
        RawSlowmo::Window { scale, duration } => SlowmoSpec::Window {
            scale,
            duration_ms: duration,
        },
    })
}

/// Payload fields shared by keyframes and steps, in delivery order.
fn effects_from_raw(
    damage: Option<f32>,
    damage_target: Option<String>,
    buff: Option<RawStatus>,
    debuff: Option<RawStatus>,
    event: Option<RawEvent>,
) -> Vec<GameplayEffect> {
    let mut effects = Vec::new();
    if let Some(amount) = damage {
        effects.push(GameplayEffect::Damage {
            amount,
            target: damage_target,
        });
    }
    if let Some(buff) = buff {
        effects.push(GameplayEffect::Buff(buff.into()));
    }
    if let Some(debuff) = debuff {
        effects.push(GameplayEffect::Debuff(debuff.into()));
    }
    if let Some(event) = event {
        effects.push(GameplayEffect::Event(event.into()));
    }
    effects
}

fn sequence_from_raw(raw: StoredSequence, key: Option<&str>) -> Result<SequenceDefinition> {
    let id = match key {
        Some(key) => bundle_id(key, raw.id)?,
        None => raw.id.unwrap_or_default(),
    };

    let mut steps = Vec::with_capacity(raw.steps.len());
    for (index, step) in raw.steps.into_iter().enumerate() {
        steps.push(step_from_raw(step, &id, index)?);
    }

    Ok(SequenceDefinition {
        name: raw.name.unwrap_or_else(|| id.clone()),
        id,
        actor: raw.target.unwrap_or_else(|| "player".to_string()),
        return_to_base: raw.return_to_base.unwrap_or(true),
        steps,
    })
}

fn step_from_raw(raw: StoredStep, sequence: &str, index: usize) -> Result<Step> {
    let invalid = |reason: &str| DefinitionError::InvalidStep {
        sequence: sequence.to_string(),
        index,
        reason: reason.to_string(),
    };

    let delay_ms = raw.delay.unwrap_or(0.0);
    if !delay_ms.is_finite() || delay_ms < 0.0 {
        return Err(DefinitionError::InvalidDuration {
            context: format!("{sequence} step {index}"),
            value: delay_ms,
        });
    }
    let wait = raw.wait.unwrap_or(false);

    match (raw.anim, raw.projectile) {
        (Some(_), Some(_)) => Err(invalid("a step cannot play an animation and a projectile")),
        (Some(anim), None) => {
            let anim = match anim {
                RawAnimRef::One(id) => AnimRef::One(id),
                RawAnimRef::Many(ids) if ids.is_empty() => {
                    return Err(invalid("empty animation list"))
                }
                RawAnimRef::Many(ids) => AnimRef::OneOf(ids),
            };
            Ok(Step::Anim(AnimStep {
                anim,
                wait,
                delay_ms,
                effects: effects_from_raw(raw.damage, raw.target, raw.buff, raw.debuff, raw.event),
            }))
        }
        (None, Some(mut spec)) => {
            if spec.damage.is_none() {
                spec.damage = raw.damage;
            }
            Ok(Step::Projectile(ProjectileStep {
                spec,
                wait,
                delay_ms,
            }))
        }
        (None, None) => {
            let effects =
                effects_from_raw(raw.damage, raw.target, raw.buff, raw.debuff, raw.event);
            if !effects.is_empty() {
                Ok(Step::Event(EventStep { delay_ms, effects }))
            } else if raw.delay.is_some() {
                Ok(Step::Delay(DelayStep { ms: delay_ms }))
            } else {
                Err(invalid("step has no anim, projectile, delay or event"))
            }
        }
    }
}

// ---------- JSON schema (serde) ----------

#[derive(Debug, Deserialize)]
struct StoredBundle {
    #[serde(default)]
    animations: Map<String, JsonValue>,
    #[serde(default)]
    vfx: Map<String, JsonValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredAnimation {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    target: Option<String>,
    #[serde(default)]
    priority: Option<i32>,
    #[serde(default)]
    duration: Option<f32>,
    #[serde(default)]
    return_to_base: Option<bool>,
    keyframes: Vec<StoredKeyframe>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredKeyframe {
    x: Option<f32>,
    y: Option<f32>,
    scale_x: Option<f32>,
    scale_y: Option<f32>,
    rotation: Option<f32>,
    alpha: Option<f32>,
    duration: Option<f32>,
    ease: Option<String>,

    vfx: Option<String>,
    vfx_target: Option<String>,
    shake: Option<RawShake>,
    hitstop: Option<f32>,
    slowmo: Option<RawSlowmo>,
    slowmo_duration: Option<f32>,
    shatter: Option<RawShatter>,
    tint: Option<RawTint>,
    afterimage: Option<bool>,
    color: Option<String>,
    color_duration: Option<f32>,
    camera: Option<RawCamera>,

    dash_to_target: Option<RawDashTarget>,
    dash_padding: Option<f32>,
    dash_offset: Option<f32>,
    dash_ease: Option<String>,

    damage: Option<f32>,
    target: Option<String>,
    buff: Option<RawStatus>,
    debuff: Option<RawStatus>,
    event: Option<RawEvent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredSequence {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    target: Option<String>,
    #[serde(default)]
    return_to_base: Option<bool>,
    steps: Vec<StoredStep>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredStep {
    #[serde(default)]
    anim: Option<RawAnimRef>,
    #[serde(default)]
    wait: Option<bool>,
    #[serde(default)]
    delay: Option<f32>,
    #[serde(default)]
    projectile: Option<ProjectileSpec>,
    #[serde(default)]
    damage: Option<f32>,
    #[serde(default)]
    target: Option<String>,
    #[serde(default)]
    buff: Option<RawStatus>,
    #[serde(default)]
    debuff: Option<RawStatus>,
    #[serde(default)]
    event: Option<RawEvent>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawAnimRef {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawSlowmo {
    Token(String),
    Scale(f32),
    Window {
        scale: f32,
        #[serde(default)]
        duration: Option<f32>,
    },
}

/// `8` or `{ "intensity": 8, "duration": 100 }`. The duration is left to the
/// camera.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawShake {
    Magnitude(f32),
    Spec {
        #[serde(alias = "magnitude")]
        intensity: f32,
        #[serde(default)]
        #[allow(dead_code)]
        duration: Option<f32>,
    },
}

impl RawShake {
    fn magnitude(self) -> f32 {
        match self {
            RawShake::Magnitude(m) | RawShake::Spec { intensity: m, .. } => m,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawShatter {
    Flag(bool),
    Spec(RawShatterSpec),
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawShatterSpec {
    grid: Option<u32>,
    force: Option<f32>,
    gravity: Option<f32>,
    life: Option<f32>,
    hide: Option<bool>,
    hide_time: Option<f32>,
    target: Option<String>,
    color: Option<RawColor>,
}

impl TryFrom<RawShatterSpec> for ShatterSpec {
    type Error = DefinitionError;

    fn try_from(raw: RawShatterSpec) -> Result<Self> {
        Ok(ShatterSpec {
            grid: raw.grid,
            force: raw.force,
            gravity: raw.gravity,
            life: raw.life,
            hide: raw.hide,
            hide_time: raw.hide_time,
            target: raw.target,
            color: raw.color.map(|c| c.to_rgb()).transpose()?,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawTint {
    Color(RawColor),
    Spec {
        color: RawColor,
        #[serde(default)]
        duration: Option<f32>,
    },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawColor {
    Int(u32),
    Text(String),
}

impl RawColor {
    fn to_rgb(&self) -> Result<u32> {
        match self {
            RawColor::Int(v) => Ok(*v),
            RawColor::Text(s) => {
                let hex = s
                    .trim()
                    .trim_start_matches('#')
                    .trim_start_matches("0x");
                u32::from_str_radix(hex, 16).map_err(|_| DefinitionError::InvalidColor {
                    value: s.clone(),
                })
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawCamera {
    #[serde(default)]
    zoom: Option<f32>,
    #[serde(default)]
    focus: Option<String>,
    #[serde(default)]
    duration: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawDashTarget {
    Flag(bool),
    Role(String),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawStatus {
    Name(String),
    Spec {
        name: String,
        #[serde(default)]
        value: Option<f32>,
        #[serde(default)]
        target: Option<String>,
    },
}

impl From<RawStatus> for StatusEffect {
    fn from(raw: RawStatus) -> Self {
        match raw {
            RawStatus::Name(name) => StatusEffect {
                name,
                value: 1.0,
                target: None,
            },
            RawStatus::Spec {
                name,
                value,
                target,
            } => StatusEffect {
                name,
                value: value.unwrap_or(1.0),
                target,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawEvent {
    Name(String),
    Spec {
        #[serde(rename = "type")]
        kind: String,
        #[serde(default)]
        value: Option<f32>,
    },
}

impl From<RawEvent> for GameEvent {
    fn from(raw: RawEvent) -> Self {
        match raw {
            RawEvent::Name(kind) => GameEvent { kind, value: 1.0 },
            RawEvent::Spec { kind, value } => GameEvent {
                kind,
                value: value.unwrap_or(1.0),
            },
        }
    }
}
