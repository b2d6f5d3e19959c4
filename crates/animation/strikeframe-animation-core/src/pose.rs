//! Actor transforms: world points, resolved poses and sparse keyframe targets.

use std::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};

use crate::interp::functions::lerp_f32;

/// A 2D point or offset in screen pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    #[inline]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    #[inline]
    pub fn distance(self, other: Point) -> f32 {
        (other - self).length()
    }
}

impl Add for Point {
    type Output = Point;
    #[inline]
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;
    #[inline]
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Point {
    type Output = Point;
    #[inline]
    fn mul(self, rhs: f32) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

/// Resolved transform of one actor.
///
/// `x`/`y` are offsets from the actor's rest position; scale, rotation
/// (degrees) and alpha are absolute.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pose {
    pub x: f32,
    pub y: f32,
    pub scale_x: f32,
    pub scale_y: f32,
    pub rotation: f32,
    pub alpha: f32,
}

impl Pose {
    /// Rest pose: no offset, unit scale, upright, opaque.
    pub const IDENTITY: Pose = Pose {
        x: 0.0,
        y: 0.0,
        scale_x: 1.0,
        scale_y: 1.0,
        rotation: 0.0,
        alpha: 1.0,
    };

    #[inline]
    pub fn offset(&self) -> Point {
        Point::new(self.x, self.y)
    }

    #[inline]
    pub fn with_offset(mut self, offset: Point) -> Self {
        self.x = offset.x;
        self.y = offset.y;
        self
    }

    /// Blend towards `to`, with a separate progress for the position channels
    /// so a dash can move on its own curve while scale/rotation/alpha follow
    /// the keyframe ease.
    pub fn blend(&self, to: &Pose, t_position: f32, t_rest: f32) -> Pose {
        Pose {
            x: lerp_f32(self.x, to.x, t_position),
            y: lerp_f32(self.y, to.y, t_position),
            scale_x: lerp_f32(self.scale_x, to.scale_x, t_rest),
            scale_y: lerp_f32(self.scale_y, to.scale_y, t_rest),
            rotation: lerp_f32(self.rotation, to.rotation, t_rest),
            alpha: lerp_f32(self.alpha, to.alpha, t_rest),
        }
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Sparse pose authored on a keyframe. Absent fields hold the previous value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoseTarget {
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub scale_x: Option<f32>,
    pub scale_y: Option<f32>,
    pub rotation: Option<f32>,
    pub alpha: Option<f32>,
}

impl PoseTarget {
    pub fn is_empty(&self) -> bool {
        self.x.is_none()
            && self.y.is_none()
            && self.scale_x.is_none()
            && self.scale_y.is_none()
            && self.rotation.is_none()
            && self.alpha.is_none()
    }

    /// Overlay the present fields onto `held`.
    ///
    /// Offsets are relative to `anchor`; `x` and `rotation` are mirrored by
    /// `facing` so the same data plays for either side of the field.
    pub fn resolve(&self, held: &Pose, anchor: Point, facing: f32) -> Pose {
        Pose {
            x: self.x.map_or(held.x, |x| anchor.x + x * facing),
            y: self.y.map_or(held.y, |y| anchor.y + y),
            scale_x: self.scale_x.unwrap_or(held.scale_x),
            scale_y: self.scale_y.unwrap_or(held.scale_y),
            rotation: self.rotation.map_or(held.rotation, |r| r * facing),
            alpha: self.alpha.unwrap_or(held.alpha),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_holds_absent_fields() {
        let held = Pose {
            x: 12.0,
            scale_x: 1.3,
            ..Pose::IDENTITY
        };
        let target = PoseTarget {
            y: Some(-5.0),
            ..PoseTarget::default()
        };
        let out = target.resolve(&held, Point::ZERO, 1.0);
        assert_eq!(out.x, 12.0);
        assert_eq!(out.y, -5.0);
        assert_eq!(out.scale_x, 1.3);
    }

    #[test]
    fn resolve_mirrors_by_facing() {
        let target = PoseTarget {
            x: Some(40.0),
            rotation: Some(15.0),
            ..PoseTarget::default()
        };
        let out = target.resolve(&Pose::IDENTITY, Point::new(100.0, 0.0), -1.0);
        assert_eq!(out.x, 60.0);
        assert_eq!(out.rotation, -15.0);
    }

    #[test]
    fn blend_uses_separate_position_progress() {
        let to = Pose {
            x: 100.0,
            alpha: 0.0,
            ..Pose::IDENTITY
        };
        let mid = Pose::IDENTITY.blend(&to, 0.25, 0.5);
        assert_eq!(mid.x, 25.0);
        assert_eq!(mid.alpha, 0.5);
    }
}
