//! Process-wide time dilation: hit-stop freezes and slow-motion windows.
//!
//! Both run on real (undilated) time and expire on their own. Every call to
//! `advance` counts them down, so a window whose owner disappears still ends
//! on schedule.

use serde::{Deserialize, Serialize};

use strikeframe_animation_core::SeqId;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SlowWindow {
    pub scale: f32,
    pub remaining_ms: f32,
    /// Sequence that installed the window, if any.
    pub owner: Option<SeqId>,
}

/// Outcome of one `advance`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Dilated {
    pub scaled_ms: f32,
    /// A slow-motion window ran out during this call.
    pub expired: bool,
}

#[derive(Clone, Debug, Default)]
pub struct TimeDilation {
    freeze_ms: f32,
    window: Option<SlowWindow>,
}

impl TimeDilation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert `real_ms` into engine time and count down both timers.
    ///
    /// Within the call the freeze covers `[0, freeze)`, the window
    /// `[0, window)`; time under the freeze counts zero, time only under the
    /// window counts `scale`, the rest counts one.
    pub fn advance(&mut self, real_ms: f32) -> Dilated {
        let dt = real_ms.max(0.0);
        let frozen = dt.min(self.freeze_ms);
        self.freeze_ms -= frozen;

        let mut scaled = 0.0;
        let mut covered = frozen;
        let mut expired = false;
        if let Some(window) = self.window.as_mut() {
            let slow = dt.min(window.remaining_ms);
            window.remaining_ms -= slow;
            scaled += (slow - frozen).max(0.0) * window.scale;
            covered = covered.max(slow);
            if window.remaining_ms <= 0.0 {
                self.window = None;
                expired = true;
            }
        }
        scaled += dt - covered;

        Dilated {
            scaled_ms: scaled,
            expired,
        }
    }

    /// Freeze engine time for `ms` of real time. Overlapping freezes keep the
    /// longer remainder.
    pub fn freeze(&mut self, ms: f32) {
        if ms.is_finite() && ms > 0.0 {
            self.freeze_ms = self.freeze_ms.max(ms);
        }
    }

    /// Install a window, replacing any active one.
    pub fn slow(&mut self, scale: f32, duration_ms: f32, owner: Option<SeqId>) {
        if !(duration_ms > 0.0) {
            self.window = None;
            return;
        }
        self.window = Some(SlowWindow {
            scale,
            remaining_ms: duration_ms,
            owner,
        });
    }

    /// Drop the active window. Returns whether one was active.
    pub fn reset(&mut self) -> bool {
        self.window.take().is_some()
    }

    /// Drop the active window only if `owner` installed it.
    pub fn reset_if_owner(&mut self, owner: SeqId) -> bool {
        if self.window.is_some_and(|w| w.owner == Some(owner)) {
            self.window = None;
            true
        } else {
            false
        }
    }

    pub fn clear(&mut self) {
        self.freeze_ms = 0.0;
        self.window = None;
    }

    /// Current multiplier: 0 while frozen.
    pub fn scale(&self) -> f32 {
        if self.freeze_ms > 0.0 {
            0.0
        } else {
            self.window.map_or(1.0, |w| w.scale)
        }
    }

    pub fn window(&self) -> Option<SlowWindow> {
        self.window
    }

    pub fn is_frozen(&self) -> bool {
        self.freeze_ms > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32, eps: f32) {
        assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
    }

    #[test]
    fn window_expires_on_real_time_without_reset() {
        let mut t = TimeDilation::new();
        t.slow(0.2, 100.0, Some(SeqId(1)));
        assert_eq!(t.scale(), 0.2);
        let first = t.advance(60.0);
        approx(first.scaled_ms, 12.0, 1e-4);
        assert!(!first.expired);
        let second = t.advance(40.0);
        assert!(second.expired);
        assert_eq!(t.scale(), 1.0);
        assert_eq!(t.advance(16.0).scaled_ms, 16.0);
    }

    #[test]
    fn window_ending_mid_tick_is_piecewise() {
        let mut t = TimeDilation::new();
        t.slow(0.5, 10.0, None);
        // 10 ms at half speed, then 6 ms at full speed
        let d = t.advance(16.0);
        approx(d.scaled_ms, 11.0, 1e-4);
        assert!(d.expired);
    }

    #[test]
    fn freeze_counts_zero_and_overlaps_window() {
        let mut t = TimeDilation::new();
        t.freeze(30.0);
        assert_eq!(t.scale(), 0.0);
        assert_eq!(t.advance(20.0).scaled_ms, 0.0);
        // 10 ms frozen, 6 ms free
        assert_eq!(t.advance(16.0).scaled_ms, 6.0);

        t.freeze(10.0);
        t.slow(0.5, 30.0, None);
        // [0,10) frozen, [10,30) at 0.5, [30,40) at 1
        approx(t.advance(40.0).scaled_ms, 20.0, 1e-4);
    }

    #[test]
    fn latest_window_wins_and_reset_is_owner_aware() {
        let mut t = TimeDilation::new();
        t.slow(0.2, 500.0, Some(SeqId(1)));
        t.slow(0.6, 500.0, Some(SeqId(2)));
        assert_eq!(t.scale(), 0.6);
        assert!(!t.reset_if_owner(SeqId(1)));
        assert!(t.reset_if_owner(SeqId(2)));
        assert_eq!(t.scale(), 1.0);
        assert!(!t.reset());
    }
}
