//! Keyframe interpolator: the running state of one animation playback.
//!
//! A `PlaybackInstance` walks its definition's keyframes in order. Each
//! keyframe opens one segment that blends from the resolved pose accumulator
//! to the keyframe's target; entering the segment reports the keyframe's
//! triggers once. Time only moves forward, so nothing can fire twice.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::dash::{resolve_dash_segment, ActorFrame, DashSegment, PoseProvider};
use crate::data::{AnimationDefinition, DashSpec, DashTarget, Keyframe};
use crate::ids::InstId;
use crate::interp::functions::segment_progress;
use crate::interp::Ease;
use crate::pose::{Point, Pose};
use crate::triggers::Trigger;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackPhase {
    Playing,
    /// Trailing interpolation back to the rest pose.
    Returning,
    Done,
}

/// Per-instance placement supplied when playback starts.
#[derive(Clone, Debug, PartialEq)]
pub struct InstanceCfg {
    pub actor: String,
    /// Actor a dash or "target" effect aims at.
    pub target: Option<String>,
    pub facing: f32,
    /// Pose the actor holds when playback starts.
    pub start_pose: Pose,
    /// Offset keyframe `x`/`y` are relative to.
    pub anchor: Point,
    /// Overrides the definition's `returnToBase` when set.
    pub return_to_base: Option<bool>,
}

impl InstanceCfg {
    pub fn new(actor: impl Into<String>) -> Self {
        Self {
            actor: actor.into(),
            target: None,
            facing: 1.0,
            start_pose: Pose::IDENTITY,
            anchor: Point::ZERO,
            return_to_base: None,
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_facing(mut self, facing: f32) -> Self {
        self.facing = if facing < 0.0 { -1.0 } else { 1.0 };
        self
    }

    pub fn with_start_pose(mut self, pose: Pose) -> Self {
        self.start_pose = pose;
        self
    }

    pub fn with_anchor(mut self, anchor: Point) -> Self {
        self.anchor = anchor;
        self
    }

    pub fn with_return_to_base(mut self, enabled: bool) -> Self {
        self.return_to_base = Some(enabled);
        self
    }
}

/// A trigger reported on the tick its keyframe was entered.
#[derive(Clone, Debug, PartialEq)]
pub struct FiredTrigger {
    pub keyframe: usize,
    pub trigger: Trigger,
}

/// Result of one `advance` call.
#[derive(Clone, Debug, Default)]
pub struct Advance {
    pub pose: Pose,
    pub fired: Vec<FiredTrigger>,
    /// Dash segments resolved during this call.
    pub dashes: Vec<DashSegment>,
    /// Set on the call that reaches the end (and on every call after).
    pub finished: bool,
    /// Part of this call's delta that fell after the end of playback.
    pub overshoot_ms: f32,
}

#[derive(Clone, Copy, Debug)]
struct Segment {
    from: Pose,
    to: Pose,
    start_ms: f32,
    duration_ms: f32,
    ease: Ease,
    position_ease: Ease,
}

#[derive(Debug)]
pub struct PlaybackInstance {
    id: InstId,
    def: Arc<AnimationDefinition>,
    actor: String,
    target: Option<String>,
    facing: f32,

    elapsed_ms: f32,
    /// End of the last closed segment.
    cursor_ms: f32,
    next_keyframe: usize,
    segment: Option<Segment>,
    /// Pose at the end of the last closed segment.
    resolved: Pose,
    pose: Pose,
    anchor: Point,

    return_to_base: bool,
    return_ms: f32,
    return_ease: Ease,
    min_dash_ms: f32,
    phase: PlaybackPhase,
    interrupted: bool,
}

impl PlaybackInstance {
    pub fn new(id: InstId, def: Arc<AnimationDefinition>, cfg: InstanceCfg, core: &Config) -> Self {
        let return_to_base = cfg.return_to_base.unwrap_or(def.return_to_base);
        Self {
            id,
            def,
            actor: cfg.actor,
            target: cfg.target,
            facing: cfg.facing,
            elapsed_ms: 0.0,
            cursor_ms: 0.0,
            next_keyframe: 0,
            segment: None,
            resolved: cfg.start_pose,
            pose: cfg.start_pose,
            anchor: cfg.anchor,
            return_to_base,
            return_ms: core.return_ms,
            return_ease: core.return_ease,
            min_dash_ms: core.min_dash_ms.max(0.0),
            phase: PlaybackPhase::Playing,
            interrupted: false,
        }
    }

    /// Advance by `dt_ms` of (already dilated) time.
    ///
    /// Crosses as many segment boundaries as the delta covers, reporting the
    /// triggers of every keyframe entered on the way.
    pub fn advance(&mut self, dt_ms: f32, poses: &dyn PoseProvider, cfg: &Config) -> Advance {
        let mut out = Advance {
            pose: self.pose,
            ..Advance::default()
        };
        if self.phase == PlaybackPhase::Done {
            out.finished = true;
            return out;
        }
        if dt_ms.is_finite() && dt_ms > 0.0 {
            self.elapsed_ms += dt_ms;
        }

        loop {
            if self.segment.is_none() && !self.open_next(poses, cfg, &mut out) {
                self.phase = PlaybackPhase::Done;
                self.pose = self.resolved;
                out.finished = true;
                out.overshoot_ms = (self.elapsed_ms - self.cursor_ms).max(0.0);
                break;
            }
            let Some(seg) = self.segment else {
                break;
            };
            let end = seg.start_ms + seg.duration_ms;
            if self.elapsed_ms >= end {
                self.resolved = seg.to;
                self.pose = seg.to;
                self.cursor_ms = end;
                self.segment = None;
                continue;
            }
            let t = segment_progress(self.elapsed_ms, seg.start_ms, seg.duration_ms);
            self.pose = seg
                .from
                .blend(&seg.to, seg.position_ease.apply(t), seg.ease.apply(t));
            break;
        }

        out.pose = self.pose;
        out
    }

    /// Open the segment for the next keyframe, or the return segment.
    /// Returns false when nothing is left to play.
    fn open_next(&mut self, poses: &dyn PoseProvider, cfg: &Config, out: &mut Advance) -> bool {
        let def = Arc::clone(&self.def);
        if let Some(kf) = def.keyframes.get(self.next_keyframe) {
            let index = self.next_keyframe;
            self.next_keyframe += 1;

            let mut to = kf.pose.resolve(&self.resolved, self.anchor, self.facing);
            let mut position_ease = kf.ease;
            let duration_ms = self.keyframe_ms(kf);
            if let Some(dash) = &kf.dash {
                let seg = self.resolve_dash(dash, poses, cfg);
                to = to.with_offset(seg.to_offset);
                if seg.resolved {
                    self.anchor = seg.to_offset;
                }
                position_ease = dash.ease.unwrap_or(cfg.default_dash_ease);
                out.dashes.push(seg);
            }

            self.segment = Some(Segment {
                from: self.resolved,
                to,
                start_ms: self.cursor_ms,
                duration_ms,
                ease: kf.ease,
                position_ease,
            });
            out.fired.extend(kf.triggers.iter().map(|trigger| FiredTrigger {
                keyframe: index,
                trigger: trigger.clone(),
            }));
            return true;
        }

        if self.return_to_base && self.phase == PlaybackPhase::Playing {
            self.phase = PlaybackPhase::Returning;
            self.anchor = Point::ZERO;
            self.segment = Some(Segment {
                from: self.resolved,
                to: Pose::IDENTITY,
                start_ms: self.cursor_ms,
                duration_ms: self.return_ms,
                ease: self.return_ease,
                position_ease: self.return_ease,
            });
            return true;
        }

        false
    }

    fn resolve_dash(&self, dash: &DashSpec, poses: &dyn PoseProvider, cfg: &Config) -> DashSegment {
        let mut actor = poses
            .actor_frame(&self.actor)
            .unwrap_or_else(|| ActorFrame::at_rest(Point::ZERO, self.facing));
        actor.offset = self.resolved.offset();

        let role = match &dash.target {
            DashTarget::Opponent => self.target.as_deref(),
            DashTarget::Role(role) => Some(role.as_str()),
        };
        let target = role.and_then(|r| poses.actor_frame(r));
        if target.is_none() {
            log::warn!(
                "{}: dash target {:?} has no live position; holding in place",
                self.def.id,
                role
            );
        }
        resolve_dash_segment(dash, &actor, target.as_ref(), cfg)
    }

    /// Stop immediately without reporting any remaining trigger.
    pub fn interrupt(&mut self) {
        if self.phase != PlaybackPhase::Done {
            self.phase = PlaybackPhase::Done;
            self.segment = None;
            self.interrupted = true;
        }
    }

    pub fn id(&self) -> InstId {
        self.id
    }

    pub fn definition(&self) -> &Arc<AnimationDefinition> {
        &self.def
    }

    pub fn actor(&self) -> &str {
        &self.actor
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    pub fn facing(&self) -> f32 {
        self.facing
    }

    pub fn priority(&self) -> i32 {
        self.def.priority
    }

    pub fn elapsed_ms(&self) -> f32 {
        self.elapsed_ms
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    /// Current dash anchor; reset to zero by a return-to-base.
    pub fn anchor(&self) -> Point {
        self.anchor
    }

    pub fn phase(&self) -> PlaybackPhase {
        self.phase
    }

    pub fn is_done(&self) -> bool {
        self.phase == PlaybackPhase::Done
    }

    pub fn is_interrupted(&self) -> bool {
        self.interrupted
    }

    /// Played length of a keyframe; dashes never run shorter than the
    /// configured minimum.
    fn keyframe_ms(&self, kf: &Keyframe) -> f32 {
        if kf.dash.is_some() {
            kf.duration_ms.max(self.min_dash_ms)
        } else {
            kf.duration_ms
        }
    }

    /// Keyframe sum, dashes stretched to their minimum, plus the trailing
    /// return, if any.
    pub fn playback_duration_ms(&self) -> f32 {
        let total: f32 = self.def.keyframes.iter().map(|kf| self.keyframe_ms(kf)).sum();
        if self.return_to_base {
            total + self.return_ms
        } else {
            total
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DashSpec;
    use crate::interp::EaseDir;
    use crate::pose::PoseTarget;
    use crate::triggers::Trigger;
    use std::collections::HashMap;

    #[derive(Default)]
    struct Stage(HashMap<String, ActorFrame>);

    impl PoseProvider for Stage {
        fn actor_frame(&self, role: &str) -> Option<ActorFrame> {
            self.0.get(role).copied()
        }
    }

    fn approx(a: f32, b: f32, eps: f32) {
        assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
    }

    fn kf(pose: PoseTarget, duration_ms: f32) -> Keyframe {
        Keyframe::new(pose, duration_ms, Ease::Linear)
    }

    fn def(keyframes: Vec<Keyframe>) -> Arc<AnimationDefinition> {
        Arc::new(AnimationDefinition {
            id: "test".into(),
            name: "test".into(),
            target: None,
            priority: 0,
            nominal_ms: None,
            return_to_base: false,
            keyframes,
        })
    }

    fn instance(def: Arc<AnimationDefinition>) -> PlaybackInstance {
        PlaybackInstance::new(InstId(0), def, InstanceCfg::new("player"), &Config::default())
    }

    #[test]
    fn finishes_exactly_at_keyframe_sum() {
        let d = def(vec![
            kf(PoseTarget::default(), 0.0),
            kf(PoseTarget { x: Some(10.0), ..Default::default() }, 80.0),
            kf(PoseTarget { x: Some(20.0), ..Default::default() }, 45.0),
            kf(PoseTarget::default(), 0.0),
            kf(PoseTarget { x: Some(0.0), ..Default::default() }, 30.0),
        ]);
        let mut inst = instance(d.clone());
        let stage = Stage::default();
        let cfg = Config::default();
        assert_eq!(inst.playback_duration_ms(), d.total_duration_ms());

        for dt in [10.0, 20.0, 50.0, 25.0] {
            assert!(!inst.advance(dt, &stage, &cfg).finished);
        }
        let last = inst.advance(50.0, &stage, &cfg);
        assert!(last.finished);
        assert_eq!(last.overshoot_ms, 0.0);
        assert_eq!(inst.elapsed_ms(), 155.0);
    }

    #[test]
    fn absent_fields_hold_previous_value() {
        let d = def(vec![
            kf(PoseTarget::default(), 0.0),
            kf(
                PoseTarget {
                    x: Some(40.0),
                    scale_x: Some(1.5),
                    ..Default::default()
                },
                100.0,
            ),
            kf(PoseTarget { y: Some(-20.0), ..Default::default() }, 100.0),
        ]);
        let mut inst = instance(d);
        let stage = Stage::default();
        let cfg = Config::default();
        inst.advance(150.0, &stage, &cfg);
        let pose = inst.pose();
        assert_eq!(pose.x, 40.0);
        assert_eq!(pose.scale_x, 1.5);
        approx(pose.y, -10.0, 1e-4);
    }

    #[test]
    fn triggers_fire_once_on_entry() {
        let mut shaking = kf(PoseTarget { x: Some(5.0), ..Default::default() }, 50.0);
        shaking.triggers.push(Trigger::Shake { magnitude: 4.0 });
        let mut opening = kf(PoseTarget::default(), 0.0);
        opening.triggers.push(Trigger::Afterimage);
        let d = def(vec![opening, kf(PoseTarget::default(), 20.0), shaking]);
        let mut inst = instance(d);
        let stage = Stage::default();
        let cfg = Config::default();

        let first = inst.advance(0.0, &stage, &cfg);
        assert_eq!(first.fired.len(), 1);
        assert_eq!(first.fired[0].trigger, Trigger::Afterimage);

        let mut shakes = 0;
        for _ in 0..20 {
            let adv = inst.advance(5.0, &stage, &cfg);
            shakes += adv
                .fired
                .iter()
                .filter(|f| matches!(f.trigger, Trigger::Shake { .. }))
                .count();
        }
        assert_eq!(shakes, 1);
        assert!(inst.is_done());
    }

    #[test]
    fn return_to_base_appends_trailing_segment() {
        let d = def(vec![
            kf(PoseTarget::default(), 0.0),
            kf(
                PoseTarget {
                    x: Some(30.0),
                    alpha: Some(0.5),
                    ..Default::default()
                },
                60.0,
            ),
        ]);
        let cfg = Config::default();
        let mut inst = PlaybackInstance::new(
            InstId(1),
            d,
            InstanceCfg::new("player").with_return_to_base(true),
            &cfg,
        );
        let stage = Stage::default();
        assert_eq!(inst.playback_duration_ms(), 60.0 + cfg.return_ms);

        assert!(!inst.advance(60.0, &stage, &cfg).finished);
        assert_eq!(inst.phase(), PlaybackPhase::Returning);
        let end = inst.advance(cfg.return_ms + 5.0, &stage, &cfg);
        assert!(end.finished);
        assert_eq!(end.overshoot_ms, 5.0);
        assert_eq!(end.pose, Pose::IDENTITY);
    }

    #[test]
    fn dash_reads_target_when_segment_starts() {
        let mut dash_kf = kf(PoseTarget::default(), 100.0);
        dash_kf.dash = Some(DashSpec {
            target: DashTarget::Opponent,
            padding: None,
            offset: Some(0.0),
            ease: Some(Ease::power(2, EaseDir::InOut)),
        });
        let d = def(vec![kf(PoseTarget::default(), 50.0), dash_kf]);
        let cfg = Config::default();
        let mut stage = Stage::default();
        stage
            .0
            .insert("player".into(), ActorFrame::at_rest(Point::new(0.0, 0.0), 1.0));
        stage
            .0
            .insert("enemy".into(), ActorFrame::at_rest(Point::new(300.0, 0.0), -1.0));

        let mut inst = PlaybackInstance::new(
            InstId(2),
            d,
            InstanceCfg::new("player").with_target("enemy"),
            &cfg,
        );
        inst.advance(25.0, &stage, &cfg);
        // knocked back before the dash segment opens
        stage.0.get_mut("enemy").unwrap().offset = Point::new(80.0, 0.0);
        let adv = inst.advance(25.0, &stage, &cfg);
        assert_eq!(adv.dashes.len(), 1);
        assert_eq!(adv.dashes[0].to_offset, Point::new(380.0, 0.0));

        // later movement does not retarget; the 100 ms dash plays for 150
        stage.0.get_mut("enemy").unwrap().offset = Point::ZERO;
        assert!(!inst.advance(100.0, &stage, &cfg).finished);
        let end = inst.advance(50.0, &stage, &cfg);
        assert!(end.finished);
        assert_eq!(end.pose.x, 380.0);
        assert_eq!(inst.anchor(), Point::new(380.0, 0.0));
    }

    #[test]
    fn keyframes_after_dash_are_relative_to_anchor() {
        let mut dash_kf = kf(PoseTarget::default(), 0.0);
        dash_kf.dash = Some(DashSpec {
            target: DashTarget::Role("enemy".into()),
            padding: None,
            offset: Some(100.0),
            ease: None,
        });
        let d = def(vec![
            dash_kf,
            kf(PoseTarget { x: Some(20.0), ..Default::default() }, 10.0),
        ]);
        let cfg = Config::default();
        let mut stage = Stage::default();
        stage
            .0
            .insert("enemy".into(), ActorFrame::at_rest(Point::new(500.0, 0.0), -1.0));
        let mut inst = instance(d);
        let end = inst.advance(cfg.min_dash_ms + 10.0, &stage, &cfg);
        assert!(end.finished);
        assert_eq!(end.pose.x, 420.0);
    }

    #[test]
    fn short_dashes_are_stretched_to_the_minimum() {
        let mut dash_kf = kf(PoseTarget::default(), 60.0);
        dash_kf.dash = Some(DashSpec {
            target: DashTarget::Role("enemy".into()),
            padding: None,
            offset: Some(0.0),
            ease: Some(Ease::Linear),
        });
        let d = def(vec![dash_kf, kf(PoseTarget::default(), 20.0)]);
        let mut stage = Stage::default();
        stage
            .0
            .insert("enemy".into(), ActorFrame::at_rest(Point::new(300.0, 0.0), -1.0));

        let cfg = Config::default();
        let mut inst = instance(d.clone());
        assert_eq!(inst.playback_duration_ms(), 170.0);
        // halfway through the stretched segment
        let mid = inst.advance(75.0, &stage, &cfg);
        approx(mid.pose.x, 150.0, 1e-3);
        assert!(!inst.advance(94.0, &stage, &cfg).finished);
        assert!(inst.advance(1.0, &stage, &cfg).finished);

        let loose = Config {
            min_dash_ms: 0.0,
            ..Config::default()
        };
        let mut inst = PlaybackInstance::new(InstId(3), d, InstanceCfg::new("player"), &loose);
        assert_eq!(inst.playback_duration_ms(), 80.0);
        assert!(inst.advance(80.0, &stage, &loose).finished);
    }

    #[test]
    fn interrupt_suppresses_remaining_triggers() {
        let mut late = kf(PoseTarget::default(), 10.0);
        late.triggers.push(Trigger::Shake { magnitude: 9.0 });
        let d = def(vec![kf(PoseTarget::default(), 40.0), late]);
        let mut inst = instance(d);
        let stage = Stage::default();
        let cfg = Config::default();
        inst.advance(20.0, &stage, &cfg);
        inst.interrupt();
        let adv = inst.advance(100.0, &stage, &cfg);
        assert!(adv.finished);
        assert!(adv.fired.is_empty());
        assert!(inst.is_interrupted());
    }
}
