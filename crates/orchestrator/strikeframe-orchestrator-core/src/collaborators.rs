//! Outward calls the engine makes. Hosts implement the parts they care about;
//! every method defaults to a no-op.

use serde::{Deserialize, Serialize};

use strikeframe_animation_core::{ColorGrade, Point, Pose, VfxDefinition};

pub trait VfxSpawner {
    fn spawn(&mut self, _vfx: &VfxDefinition, _position: Point, _facing: f32) {}

    /// A projectile pseudo-actor appeared on the board under `role`.
    fn projectile(&mut self, _kind: &str, _role: &str) {}
}

pub trait Camera {
    fn shake(&mut self, _magnitude: f32) {}

    /// Non-blocking zoom and/or pan.
    fn focus(&mut self, _zoom: Option<f32>, _focus: Option<Point>, _duration_ms: f32) {}

    fn hitstop(&mut self, _ms: f32) {}

    fn reset(&mut self) {}
}

pub trait TimeDilationSink {
    /// The global playback rate changed; `duration_ms` is 0 for a reset.
    fn set_time_scale(&mut self, _scale: f32, _duration_ms: f32) {}
}

/// Resolved sprite break-apart parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShatterParams {
    pub grid: u32,
    pub force: f32,
    pub gravity: f32,
    pub life_ms: f32,
    pub hide: bool,
    pub hide_time_ms: f32,
    pub color: Option<u32>,
}

pub trait SpriteEffects {
    fn tint(&mut self, _role: &str, _color: u32, _duration_ms: f32) {}

    fn shatter(&mut self, _role: &str, _params: &ShatterParams, _position: Point) {}

    fn afterimage(&mut self, _role: &str, _pose: &Pose, _position: Point, _color: u32) {}

    fn color_grade(&mut self, _grade: ColorGrade, _duration_ms: f32) {}
}

/// Gameplay side of the fight.
pub trait CombatSink {
    fn apply_damage(&mut self, _amount: f32, _target: &str) {}

    fn apply_buff(&mut self, _name: &str, _value: f32, _target: &str) {}

    fn apply_debuff(&mut self, _name: &str, _value: f32, _target: &str) {}

    fn emit_event(&mut self, _kind: &str, _value: f32) {}
}

/// Everything the orchestrator talks to during a tick.
pub trait Collaborators: VfxSpawner + Camera + TimeDilationSink + SpriteEffects + CombatSink {}

impl<T> Collaborators for T where T: VfxSpawner + Camera + TimeDilationSink + SpriteEffects + CombatSink {}

/// Discards every call.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopCollaborators;

impl VfxSpawner for NoopCollaborators {}
impl Camera for NoopCollaborators {}
impl TimeDilationSink for NoopCollaborators {}
impl SpriteEffects for NoopCollaborators {}
impl CombatSink for NoopCollaborators {}
