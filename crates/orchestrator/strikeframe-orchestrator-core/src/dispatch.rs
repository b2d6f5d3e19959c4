//! Trigger Dispatcher: maps each fired trigger onto exactly one kind of
//! outward call, honouring the feature toggles in `EngineConfig`.

use strikeframe_animation_core::{
    CameraSpec, ColorGrade, ColorTrigger, GameplayEffect, InstId, Point, SeqId, ShatterSpec,
    SlowmoSpec, Trigger, VfxTarget,
};

use crate::actors::Side;
use crate::collaborators::{
    Camera, CombatSink, ShatterParams, SpriteEffects, TimeDilationSink, VfxSpawner,
};
use crate::context::TickEnv;
use crate::events::EngineEvent;

/// Where a trigger fires from.
#[derive(Clone, Copy, Debug)]
pub(crate) struct TriggerSite<'a> {
    pub inst: InstId,
    pub keyframe: usize,
    pub actor: &'a str,
    /// The opposing actor for this playback.
    pub target: Option<&'a str>,
    pub facing: f32,
    pub owner: Option<SeqId>,
}

impl TriggerSite<'_> {
    /// `"self"`, `"target"` or a literal role; `None` picks `fallback`.
    fn role(&self, name: Option<&str>, fallback_self: bool) -> Option<String> {
        match name {
            Some("self") => Some(self.actor),
            Some("target") => self.target,
            Some(role) => Some(role),
            None if fallback_self => Some(self.actor),
            None => self.target,
        }
        .map(str::to_string)
    }
}

pub(crate) fn fire(trigger: &Trigger, site: &TriggerSite<'_>, env: &mut TickEnv<'_>) {
    log::trace!(
        "{} kf{} on {}: {}",
        site.inst,
        site.keyframe,
        site.actor,
        trigger.name()
    );
    env.events.push(EngineEvent::TriggerFired {
        inst: site.inst,
        actor: site.actor.to_string(),
        keyframe: site.keyframe,
        kind: trigger.name().to_string(),
    });

    match trigger {
        Trigger::Vfx(vfx) => {
            let (at, with_offset) = match vfx.target {
                VfxTarget::SelfActor => (Some(site.actor), false),
                VfxTarget::Target => (site.target, true),
            };
            spawn_vfx(&vfx.id, at, site.facing, with_offset, env);
        }
        Trigger::Hitstop { ms } => hitstop(*ms, env),
        Trigger::Shake { magnitude } => shake(*magnitude, env),
        Trigger::Shatter(spec) => shatter(spec, site, env),
        Trigger::Camera(cam) => camera(cam, site, env),
        Trigger::Color(color) => color_grade(color, site.owner, env),
        Trigger::Slowmo(spec) => slowmo(*spec, site.owner, env),
        Trigger::Afterimage => afterimage(site.actor, env),
        Trigger::Tint(tint) => {
            let duration = tint.duration_ms.unwrap_or(env.cfg.tint_ms);
            env.collab.tint(site.actor, tint.color, duration);
        }
        Trigger::Effect(effect) => {
            apply_effect(effect, site.actor, site.target, site.owner, None, env);
        }
        other => log::debug!("{}: no dispatcher for {}", site.inst, other.name()),
    }
}

/// Spawn a VFX at `at_role`, plus its own shake and hit-stop. The
/// definition's offset, mirrored by `facing`, applies only to spawns on a
/// target; self spawns sit on the actor.
pub(crate) fn spawn_vfx(
    id: &str,
    at_role: Option<&str>,
    facing: f32,
    with_offset: bool,
    env: &mut TickEnv<'_>,
) {
    if !env.cfg.enable_vfx {
        return;
    }
    let Some(def) = env.registry.vfx(id) else {
        log::warn!("unknown vfx '{id}'; skipped");
        return;
    };
    let Some(base) = at_role.and_then(|role| env.ctx.actors.get(role)).map(|e| e.world()) else {
        log::warn!("vfx '{id}' has no placement ({at_role:?}); skipped");
        return;
    };
    let position = if with_offset {
        base + Point::new(def.offset.x * facing, def.offset.y)
    } else {
        base
    };
    env.collab.spawn(&def, position, facing);
    if let Some(magnitude) = def.shake {
        shake(magnitude, env);
    }
    if let Some(ms) = def.hitstop {
        hitstop(ms, env);
    }
}

pub(crate) fn shake(magnitude: f32, env: &mut TickEnv<'_>) {
    if env.cfg.enable_shake && magnitude > 0.0 {
        env.collab.shake(magnitude);
    }
}

fn hitstop(ms: f32, env: &mut TickEnv<'_>) {
    if env.cfg.enable_hitstop && ms > 0.0 {
        env.ctx.time.freeze(ms);
        env.collab.hitstop(ms);
    }
}

fn slowmo(spec: SlowmoSpec, owner: Option<SeqId>, env: &mut TickEnv<'_>) {
    if !env.cfg.enable_slowmo {
        return;
    }
    let limits = &env.cfg.slowmo;
    let (scale, duration) = match spec {
        SlowmoSpec::Scale { scale, duration_ms } => {
            (scale, duration_ms.unwrap_or(limits.scale_ms))
        }
        SlowmoSpec::Window { scale, duration_ms } => {
            (scale, duration_ms.unwrap_or(limits.window_ms))
        }
        SlowmoSpec::Impact => (limits.impact_scale, limits.impact_ms),
        SlowmoSpec::Reset => {
            env.ctx.time.reset();
            env.collab.set_time_scale(1.0, 0.0);
            env.events.push(EngineEvent::TimeScaleChanged { scale: 1.0 });
            log::debug!("slow motion reset");
            return;
        }
    };
    let scale = limits.clamp(scale);
    env.ctx.time.slow(scale, duration, owner);
    env.collab.set_time_scale(scale, duration);
    env.events.push(EngineEvent::TimeScaleChanged { scale });
    log::debug!("slow motion x{scale} for {duration} ms");
}

fn camera(cam: &CameraSpec, site: &TriggerSite<'_>, env: &mut TickEnv<'_>) {
    if !env.cfg.enable_camera {
        return;
    }
    let limits = &env.cfg.camera;
    let zoom = cam.zoom.map(|z| z.clamp(limits.min_zoom, limits.max_zoom));
    let focus = cam
        .focus
        .as_deref()
        .and_then(|name| site.role(Some(name), true))
        .and_then(|role| env.ctx.actors.get(&role).map(|e| e.world()));
    if zoom.is_none() && focus.is_none() {
        return;
    }
    let duration = cam.duration_ms.unwrap_or(if zoom.is_some() {
        limits.zoom_ms
    } else {
        limits.focus_ms
    });
    env.collab.focus(zoom, focus, duration);
    env.ctx.camera_owner = site.owner;
}

fn color_grade(color: &ColorTrigger, owner: Option<SeqId>, env: &mut TickEnv<'_>) {
    if !env.cfg.enable_color_grade {
        return;
    }
    let duration = color.duration_ms.unwrap_or(env.cfg.color_grade_ms);
    env.collab.color_grade(color.grade, duration);
    env.ctx.grade_owner = if color.grade == ColorGrade::Reset {
        None
    } else {
        owner
    };
}

fn shatter(spec: &ShatterSpec, site: &TriggerSite<'_>, env: &mut TickEnv<'_>) {
    let Some(role) = site.role(spec.target.as_deref(), false) else {
        log::warn!("{}: shatter without a target; skipped", site.inst);
        return;
    };
    let Some(position) = env.ctx.actors.get(&role).map(|e| e.world()) else {
        log::warn!("{}: shatter target '{role}' is not on the board", site.inst);
        return;
    };
    let d = &env.cfg.shatter;
    let params = ShatterParams {
        grid: spec.grid.unwrap_or(d.grid),
        force: spec.force.unwrap_or(d.force),
        gravity: spec.gravity.unwrap_or(d.gravity),
        life_ms: spec.life.unwrap_or(d.life_ms),
        hide: spec.hide.unwrap_or(d.hide),
        hide_time_ms: spec.hide_time.unwrap_or(d.hide_time_ms),
        color: spec.color,
    };
    env.collab.shatter(&role, &params, position);
}

fn afterimage(actor: &str, env: &mut TickEnv<'_>) {
    if !env.cfg.enable_afterimage {
        return;
    }
    let Some(entry) = env.ctx.actors.get(actor) else {
        return;
    };
    let color = match entry.side {
        Side::Ally => env.cfg.ally_afterimage_color,
        Side::Opponent | Side::Neutral => env.cfg.opponent_afterimage_color,
    };
    let (pose, position) = (entry.pose, entry.world());
    env.collab.afterimage(actor, &pose, position, color);
}

/// Deliver one gameplay effect. Damage and debuffs default to `opponent`,
/// buffs to `actor`.
pub(crate) fn apply_effect(
    effect: &GameplayEffect,
    actor: &str,
    opponent: Option<&str>,
    owner: Option<SeqId>,
    at_ms: Option<f32>,
    env: &mut TickEnv<'_>,
) {
    let resolve = |name: Option<&str>, fallback_self: bool| -> Option<String> {
        match name {
            Some("self") => Some(actor),
            Some("target") => opponent,
            Some(role) => Some(role),
            None if fallback_self => Some(actor),
            None => opponent,
        }
        .map(str::to_string)
    };

    let target = match effect {
        GameplayEffect::Damage { amount, target } => {
            let Some(role) = resolve(target.as_deref(), false) else {
                log::warn!("damage {amount} has no target; dropped");
                return;
            };
            env.collab.apply_damage(*amount, &role);
            Some(role)
        }
        GameplayEffect::Buff(status) => {
            let Some(role) = resolve(status.target.as_deref(), true) else {
                return;
            };
            env.collab.apply_buff(&status.name, status.value, &role);
            Some(role)
        }
        GameplayEffect::Debuff(status) => {
            let Some(role) = resolve(status.target.as_deref(), false) else {
                log::warn!("debuff '{}' has no target; dropped", status.name);
                return;
            };
            env.collab.apply_debuff(&status.name, status.value, &role);
            Some(role)
        }
        GameplayEffect::Event(event) => {
            env.collab.emit_event(&event.kind, event.value);
            None
        }
    };
    log::debug!("{} applied to {target:?}", effect.name());
    env.events.push(EngineEvent::EffectApplied {
        sequence: owner,
        effect: effect.clone(),
        target,
        at_ms,
    });
}

/// Undo camera, color grade and slow motion left behind by `owner`.
pub(crate) fn release(owner: SeqId, env: &mut TickEnv<'_>) {
    if env.ctx.camera_owner == Some(owner) {
        env.collab.reset();
        env.ctx.camera_owner = None;
    }
    if env.ctx.grade_owner == Some(owner) {
        env.collab
            .color_grade(ColorGrade::Reset, env.cfg.color_grade_ms);
        env.ctx.grade_owner = None;
    }
    if env.ctx.time.reset_if_owner(owner) {
        env.collab.set_time_scale(1.0, 0.0);
        env.events.push(EngineEvent::TimeScaleChanged { scale: 1.0 });
    }
}
