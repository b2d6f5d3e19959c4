//! Definitions built at runtime rather than loaded: the end-of-sequence
//! return to rest and projectile flight legs.

use crate::config::Config;
use crate::data::{AnimationDefinition, Keyframe};
use crate::interp::{Ease, EaseDir};
use crate::pose::{Point, Pose, PoseTarget};
use crate::triggers::Trigger;

pub const RETURN_ID: &str = "__return";
pub const HOP_RETURN_ID: &str = "__return.hop";
pub const FLIGHT_ID: &str = "__flight";

/// Priority of synthetic returns; nothing authored can refuse them.
pub const RETURN_PRIORITY: i32 = i32::MAX;

fn synthetic(id: &str, priority: i32, keyframes: Vec<Keyframe>) -> AnimationDefinition {
    AnimationDefinition {
        id: id.to_string(),
        name: id.to_string(),
        target: None,
        priority,
        nominal_ms: None,
        return_to_base: false,
        keyframes,
    }
}

fn hold() -> Keyframe {
    Keyframe::new(PoseTarget::default(), 0.0, Ease::Linear)
}

fn rest_target() -> PoseTarget {
    PoseTarget {
        x: Some(0.0),
        y: Some(0.0),
        scale_x: Some(1.0),
        scale_y: Some(1.0),
        rotation: Some(0.0),
        alpha: Some(1.0),
    }
}

/// Bring an actor from `from` back to its rest pose.
///
/// Short distances interpolate directly over `return_ms`. Longer ones hop:
/// crouch, rise towards the rest column, drop onto it, squash, settle.
pub fn return_to_rest(from: &Pose, cfg: &Config) -> AnimationDefinition {
    let distance = from.offset().length();
    if distance <= cfg.hop.threshold {
        return synthetic(
            RETURN_ID,
            RETURN_PRIORITY,
            vec![hold(), Keyframe::new(rest_target(), cfg.return_ms, cfg.return_ease)],
        );
    }

    let hop = &cfg.hop;
    let d = (cfg.return_ms * hop.duration_factor).min(hop.max_ms);
    let height = hop.height_for(distance);

    let mut crouch = Keyframe::new(
        PoseTarget {
            scale_x: Some(1.1),
            scale_y: Some(0.85),
            ..PoseTarget::default()
        },
        30.0,
        Ease::power(2, EaseDir::In),
    );
    crouch.triggers.push(Trigger::Afterimage);

    let rise = Keyframe::new(
        PoseTarget {
            x: Some(0.0),
            y: Some(-height),
            scale_x: Some(0.9),
            scale_y: Some(1.1),
            rotation: Some(0.0),
            alpha: Some(1.0),
        },
        d * 0.45,
        Ease::power(2, EaseDir::Out),
    );
    let land = Keyframe::new(
        PoseTarget {
            y: Some(0.0),
            ..PoseTarget::default()
        },
        d * 0.35,
        Ease::power(3, EaseDir::In),
    );
    let squash = Keyframe::new(
        PoseTarget {
            scale_x: Some(1.1),
            scale_y: Some(0.9),
            ..PoseTarget::default()
        },
        30.0,
        Ease::power(4, EaseDir::Out),
    );
    let settle = Keyframe::new(rest_target(), 80.0, Ease::power(2, EaseDir::Out));

    synthetic(
        HOP_RETURN_ID,
        RETURN_PRIORITY,
        vec![hold(), crouch, rise, land, squash, settle],
    )
}

/// Straight, linear flight between two points in the coordinates of the
/// actor playing it (projectiles use a rest position of zero).
pub fn flight_leg(from: Point, to: Point, duration_ms: f32) -> AnimationDefinition {
    let at = |p: Point| PoseTarget {
        x: Some(p.x),
        y: Some(p.y),
        ..PoseTarget::default()
    };
    synthetic(
        FLIGHT_ID,
        0,
        vec![
            Keyframe::new(at(from), 0.0, Ease::Linear),
            Keyframe::new(at(to), duration_ms.max(0.0), Ease::Linear),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_return_is_plain() {
        let cfg = Config::default();
        let from = Pose::IDENTITY.with_offset(Point::new(60.0, 0.0));
        let def = return_to_rest(&from, &cfg);
        assert_eq!(def.id, RETURN_ID);
        assert_eq!(def.total_duration_ms(), cfg.return_ms);
        assert!(def.validate().is_ok());
    }

    #[test]
    fn long_return_hops() {
        let cfg = Config::default();
        let from = Pose::IDENTITY.with_offset(Point::new(300.0, 0.0));
        let def = return_to_rest(&from, &cfg);
        assert_eq!(def.id, HOP_RETURN_ID);
        assert_eq!(def.priority, RETURN_PRIORITY);
        // 40 + 300 * 0.1
        assert_eq!(def.keyframes[2].pose.y, Some(-70.0));
        let d = (cfg.return_ms * 1.2).min(250.0);
        let expected = 30.0 + d * 0.45 + d * 0.35 + 30.0 + 80.0;
        assert!((def.total_duration_ms() - expected).abs() < 1e-3);
        assert!(matches!(def.keyframes[1].triggers[0], Trigger::Afterimage));
    }

    #[test]
    fn hop_height_is_capped() {
        let cfg = Config::default();
        let from = Pose::IDENTITY.with_offset(Point::new(900.0, 0.0));
        let def = return_to_rest(&from, &cfg);
        assert_eq!(def.keyframes[2].pose.y, Some(-80.0));
    }

    #[test]
    fn flight_leg_jumps_to_start_then_travels() {
        let def = flight_leg(Point::new(10.0, 5.0), Point::new(210.0, 5.0), 133.0);
        assert_eq!(def.keyframes.len(), 2);
        assert_eq!(def.keyframes[0].duration_ms, 0.0);
        assert_eq!(def.keyframes[1].pose.x, Some(210.0));
        assert_eq!(def.total_duration_ms(), 133.0);
    }
}
