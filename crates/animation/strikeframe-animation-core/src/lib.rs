//! Strikeframe Animation Core (engine-agnostic)
//!
//! Data model and per-instance playback for combat presentation: keyframe
//! definitions parsed from stored JSON, typed easing descriptors, the dash
//! resolver and the keyframe interpolator that turns elapsed time into a pose
//! plus the triggers entered on this tick. Nothing here talks to a renderer or
//! to gameplay; the orchestrator crate dispatches what this crate reports.

pub mod config;
pub mod dash;
pub mod data;
pub mod error;
pub mod ids;
pub mod interp;
pub mod playback;
pub mod pose;
pub mod registry;
pub mod stored;
pub mod synthetic;
pub mod triggers;

// Re-exports for consumers (orchestrator, hosts)
pub use config::{Config, HopReturn};
pub use dash::{resolve_dash_segment, ActorFrame, DashSegment, PoseProvider};
pub use data::{
    AnimRef, AnimStep, AnimationDefinition, DashSpec, DashTarget, DelayStep, EventStep, Keyframe,
    ProjectileSpec, ProjectileStep, SequenceDefinition, Step, VfxDefinition,
};
pub use error::{DefinitionError, Result};
pub use ids::{IdAllocator, InstId, SeqId};
pub use interp::{Ease, EaseDir};
pub use playback::{Advance, FiredTrigger, InstanceCfg, PlaybackInstance, PlaybackPhase};
pub use pose::{Point, Pose, PoseTarget};
pub use registry::{DefinitionRef, DefinitionRegistry};
pub use stored::{parse_animation_json, parse_bundle_json, parse_sequence_json, Bundle};
pub use triggers::{
    CameraSpec, ColorGrade, ColorTrigger, GameEvent, GameplayEffect, ShatterSpec, SlowmoSpec,
    StatusEffect, TintSpec, Trigger, VfxTarget, VfxTrigger,
};
