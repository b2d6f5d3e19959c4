//! Interpolation: scalar blending helpers and the typed easing descriptor.

pub mod ease;
pub mod functions;

pub use ease::{Ease, EaseDir};
