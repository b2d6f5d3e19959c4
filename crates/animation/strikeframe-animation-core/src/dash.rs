//! Dash resolution: turn a dash keyframe into a concrete offset, using where
//! the target stands at the moment the segment starts.

use crate::config::Config;
use crate::data::DashSpec;
use crate::pose::Point;

/// Live placement of one actor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ActorFrame {
    /// Resting position in world space.
    pub rest: Point,
    /// Current offset from `rest`.
    pub offset: Point,
    /// Half of the body width; the configured default applies when `None`.
    pub half_width: Option<f32>,
    /// +1 when facing right, -1 when facing left.
    pub facing: f32,
}

impl ActorFrame {
    pub fn at_rest(rest: Point, facing: f32) -> Self {
        Self {
            rest,
            offset: Point::ZERO,
            half_width: None,
            facing,
        }
    }

    #[inline]
    pub fn world(&self) -> Point {
        self.rest + self.offset
    }
}

/// Read access to actor placement.
pub trait PoseProvider {
    /// `None` when the role is unknown or no longer on the field.
    fn actor_frame(&self, role: &str) -> Option<ActorFrame>;

    fn position(&self, role: &str) -> Option<Point> {
        self.actor_frame(role).map(|frame| frame.world())
    }
}

/// Offsets (relative to the actor's rest position) a dash segment blends between.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DashSegment {
    pub from_offset: Point,
    pub to_offset: Point,
    /// False when the target could not be found and the dash holds in place.
    pub resolved: bool,
}

/// Resolve a dash against the target's current placement.
///
/// The approach is horizontal: the actor ends on the target's row, `dash.offset`
/// short of it when given, otherwise both half-widths plus `dash.padding`
/// short of it. A missing target yields a zero-length hold.
pub fn resolve_dash_segment(
    dash: &DashSpec,
    actor: &ActorFrame,
    target: Option<&ActorFrame>,
    cfg: &Config,
) -> DashSegment {
    let from_offset = actor.offset;
    let Some(target) = target else {
        return DashSegment {
            from_offset,
            to_offset: from_offset,
            resolved: false,
        };
    };

    let here = actor.world();
    let there = target.world();
    let dx = there.x - here.x;
    let dir = if dx.abs() > f32::EPSILON {
        dx.signum()
    } else {
        actor.facing
    };

    let stop = dash.offset.unwrap_or_else(|| {
        actor.half_width.unwrap_or(cfg.body_half_width)
            + target.half_width.unwrap_or(cfg.body_half_width)
            + dash.padding.unwrap_or(cfg.dash_padding)
    });
    let stop_world = Point::new(there.x - dir * stop, there.y);

    DashSegment {
        from_offset,
        to_offset: stop_world - actor.rest,
        resolved: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DashTarget;

    fn dash(padding: Option<f32>, offset: Option<f32>) -> DashSpec {
        DashSpec {
            target: DashTarget::Opponent,
            padding,
            offset,
            ease: None,
        }
    }

    #[test]
    fn stops_short_by_body_widths_and_padding() {
        let cfg = Config::default();
        let actor = ActorFrame::at_rest(Point::new(100.0, 300.0), 1.0);
        let target = ActorFrame::at_rest(Point::new(500.0, 300.0), -1.0);
        let seg = resolve_dash_segment(&dash(None, None), &actor, Some(&target), &cfg);
        assert!(seg.resolved);
        assert_eq!(seg.from_offset, Point::ZERO);
        // 500 - (50 + 50 + 10) - 100
        assert_eq!(seg.to_offset, Point::new(290.0, 0.0));

        let seg = resolve_dash_segment(&dash(Some(30.0), None), &actor, Some(&target), &cfg);
        assert_eq!(seg.to_offset, Point::new(270.0, 0.0));
    }

    #[test]
    fn explicit_offset_replaces_spacing() {
        let cfg = Config::default();
        let actor = ActorFrame::at_rest(Point::new(100.0, 0.0), 1.0);
        let target = ActorFrame::at_rest(Point::new(500.0, 0.0), -1.0);
        let seg = resolve_dash_segment(&dash(Some(99.0), Some(40.0)), &actor, Some(&target), &cfg);
        assert_eq!(seg.to_offset, Point::new(360.0, 0.0));
        let seg = resolve_dash_segment(&dash(None, Some(-20.0)), &actor, Some(&target), &cfg);
        assert_eq!(seg.to_offset, Point::new(420.0, 0.0));
    }

    #[test]
    fn follows_a_displaced_target() {
        let cfg = Config::default();
        let actor = ActorFrame::at_rest(Point::new(0.0, 0.0), 1.0);
        let mut target = ActorFrame::at_rest(Point::new(400.0, 0.0), -1.0);
        target.offset = Point::new(60.0, 0.0);
        let seg = resolve_dash_segment(&dash(None, Some(0.0)), &actor, Some(&target), &cfg);
        assert_eq!(seg.to_offset, Point::new(460.0, 0.0));
    }

    #[test]
    fn starts_from_current_offset() {
        let cfg = Config::default();
        let mut actor = ActorFrame::at_rest(Point::new(0.0, 0.0), 1.0);
        actor.offset = Point::new(100.0, 0.0);
        let target = ActorFrame::at_rest(Point::new(400.0, 0.0), -1.0);
        let seg = resolve_dash_segment(&dash(None, Some(50.0)), &actor, Some(&target), &cfg);
        assert_eq!(seg.from_offset, Point::new(100.0, 0.0));
        assert_eq!(seg.to_offset, Point::new(350.0, 0.0));
    }

    #[test]
    fn lands_on_the_target_row() {
        let cfg = Config::default();
        let actor = ActorFrame::at_rest(Point::new(100.0, 300.0), 1.0);
        let target = ActorFrame::at_rest(Point::new(500.0, 280.0), -1.0);
        let seg = resolve_dash_segment(&dash(None, Some(50.0)), &actor, Some(&target), &cfg);
        assert_eq!(seg.to_offset, Point::new(350.0, -20.0));
    }

    #[test]
    fn approaches_from_the_right() {
        let cfg = Config::default();
        let actor = ActorFrame::at_rest(Point::new(500.0, 0.0), -1.0);
        let target = ActorFrame::at_rest(Point::new(100.0, 0.0), 1.0);
        let seg = resolve_dash_segment(&dash(None, None), &actor, Some(&target), &cfg);
        assert_eq!(seg.to_offset, Point::new(-290.0, 0.0));
    }

    #[test]
    fn missing_target_holds() {
        let cfg = Config::default();
        let mut actor = ActorFrame::at_rest(Point::new(0.0, 0.0), 1.0);
        actor.offset = Point::new(12.0, -3.0);
        let seg = resolve_dash_segment(&dash(None, None), &actor, None, &cfg);
        assert!(!seg.resolved);
        assert_eq!(seg.to_offset, seg.from_offset);
    }
}
