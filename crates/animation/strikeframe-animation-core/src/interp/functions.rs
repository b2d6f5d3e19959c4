//! Interpolation helpers:
//! - lerp_f32 / lerp_point (component-wise linear blend)
//! - segment_progress (normalized time within a segment, zero-length safe)

use crate::pose::Point;

/// Linear interpolation of scalars.
#[inline]
pub fn lerp_f32(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[inline]
pub fn lerp_point(a: Point, b: Point, t: f32) -> Point {
    Point::new(lerp_f32(a.x, b.x, t), lerp_f32(a.y, b.y, t))
}

#[inline]
pub fn clamp01(t: f32) -> f32 {
    t.clamp(0.0, 1.0)
}

/// Normalized progress of `elapsed` within `[start, start + duration]`.
/// A zero-length segment is always complete.
#[inline]
pub fn segment_progress(elapsed: f32, start: f32, duration: f32) -> f32 {
    if duration <= 0.0 {
        return 1.0;
    }
    clamp01((elapsed - start) / duration)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lerp_endpoints() {
        assert_eq!(lerp_f32(2.0, 6.0, 0.0), 2.0);
        assert_eq!(lerp_f32(2.0, 6.0, 1.0), 6.0);
        assert_eq!(lerp_f32(2.0, 6.0, 0.5), 4.0);
        let p = lerp_point(Point::new(0.0, 10.0), Point::new(10.0, 0.0), 0.5);
        assert_eq!(p, Point::new(5.0, 5.0));
    }

    #[test]
    fn zero_length_segment_is_complete() {
        assert_eq!(segment_progress(5.0, 5.0, 0.0), 1.0);
        assert_eq!(segment_progress(5.0, 0.0, 10.0), 0.5);
        assert_eq!(segment_progress(50.0, 0.0, 10.0), 1.0);
    }
}
