use serde::{Deserialize, Serialize};

use strikeframe_animation_core::{GameplayEffect, InstId, Point, SeqId};

/// Runtime notifications collected into each `OrchestratorFrame`.
///
/// `at_ms` fields are measured on the owning sequence's clock, in dilated
/// engine time since the sequence started.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[non_exhaustive]
pub enum EngineEvent {
    SequenceStarted {
        sequence: SeqId,
        id: String,
        initiator: String,
        target: Option<String>,
    },
    StepEntered {
        sequence: SeqId,
        index: usize,
        kind: String,
        at_ms: f32,
    },
    StepCompleted {
        sequence: SeqId,
        index: usize,
        at_ms: f32,
    },
    InstanceStarted {
        inst: InstId,
        animation: String,
        actor: String,
        sequence: Option<SeqId>,
    },
    /// A start was refused because a higher-priority instance holds the actor.
    InstanceRefused {
        animation: String,
        actor: String,
        sequence: Option<SeqId>,
    },
    InstanceFinished {
        inst: InstId,
        animation: String,
        actor: String,
        interrupted: bool,
    },
    TriggerFired {
        inst: InstId,
        actor: String,
        keyframe: usize,
        kind: String,
    },
    EffectApplied {
        sequence: Option<SeqId>,
        effect: GameplayEffect,
        target: Option<String>,
        at_ms: Option<f32>,
    },
    ProjectileImpact {
        sequence: SeqId,
        target: String,
        hit_index: usize,
        damage: Option<f32>,
        position: Point,
    },
    TimeScaleChanged {
        scale: f32,
    },
    SequenceCompleted {
        sequence: SeqId,
        id: String,
        at_ms: f32,
    },
    SequenceAborted {
        sequence: SeqId,
        id: String,
    },
}

impl EngineEvent {
    pub fn sequence(&self) -> Option<SeqId> {
        match self {
            EngineEvent::SequenceStarted { sequence, .. }
            | EngineEvent::StepEntered { sequence, .. }
            | EngineEvent::StepCompleted { sequence, .. }
            | EngineEvent::ProjectileImpact { sequence, .. }
            | EngineEvent::SequenceCompleted { sequence, .. }
            | EngineEvent::SequenceAborted { sequence, .. } => Some(*sequence),
            EngineEvent::InstanceStarted { sequence, .. }
            | EngineEvent::InstanceRefused { sequence, .. }
            | EngineEvent::EffectApplied { sequence, .. } => *sequence,
            _ => None,
        }
    }
}
