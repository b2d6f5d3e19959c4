//! strikeframe-orchestrator
//!
//! Runtime side of combat presentation. An `Orchestrator` owns the actor
//! board, the timeline of running playback instances and any number of
//! concurrent card sequences. Hosts call `step(dt_ms, collaborators)` once
//! per rendered frame; every outward effect (VFX, camera, time dilation,
//! sprite effects, damage) goes through the `Collaborators` passed in, and
//! the returned `OrchestratorFrame` reports poses, events and write
//! conflicts for that tick.

pub mod actors;
pub mod collaborators;
pub mod config;
pub mod context;
pub mod controllers;
pub mod diagnostics;
pub(crate) mod dispatch;
pub mod error;
pub mod events;
pub mod scheduler;
pub mod time;
pub mod timeline;

use std::sync::Arc;

use anyhow::Result;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use strikeframe_animation_core::{DefinitionRegistry, InstId, SeqId};

pub use crate::actors::{ActorBoard, ActorEntry, ActorSnapshot, ActorSpec, ConflictLog, Side};
pub use crate::collaborators::{
    Camera, Collaborators, CombatSink, NoopCollaborators, ShatterParams, SpriteEffects,
    TimeDilationSink, VfxSpawner,
};
pub use crate::config::EngineConfig;
pub use crate::context::CombatContext;
pub use crate::diagnostics::{CallRecorder, OutboundCall};
pub use crate::error::OrchestratorError;
pub use crate::events::EngineEvent;
pub use crate::time::TimeDilation;
pub use crate::timeline::Timeline;

use crate::context::TickEnv;
use crate::controllers::sequence::SequenceRun;
use crate::timeline::{Launch, StartOutcome};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorFrame {
    pub epoch: u64,
    /// Real time passed to `step`.
    pub dt: f32,
    /// Engine time after hit-stop, slow motion and the speed multiplier.
    pub scaled_dt: f32,
    pub time_scale: f32,
    pub poses: Vec<ActorSnapshot>,
    /// Events in the order they happened, including those raised between
    /// ticks by `play_*` and `abort`.
    pub events: Vec<EngineEvent>,
    pub conflicts: Vec<ConflictLog>,
}

#[derive(Debug)]
pub struct Orchestrator {
    pub(crate) registry: Arc<DefinitionRegistry>,
    pub(crate) cfg: EngineConfig,
    pub(crate) ctx: CombatContext,
    pub(crate) timeline: Timeline,
    /// Running sequences in start order.
    pub(crate) sequences: Vec<SequenceRun>,
    pub(crate) rng: StdRng,
    pub(crate) epoch: u64,
    /// Events raised outside `step`, flushed into the next frame.
    pub(crate) backlog: Vec<EngineEvent>,
}

impl Orchestrator {
    pub fn new(registry: Arc<DefinitionRegistry>, cfg: EngineConfig) -> Self {
        let rng = cfg.rng();
        Self {
            registry,
            cfg,
            ctx: CombatContext::new(),
            timeline: Timeline::new(),
            sequences: Vec::new(),
            rng,
            epoch: 0,
            backlog: Vec::new(),
        }
    }

    /// Register an actor.
    pub fn with_actor(mut self, role: impl Into<String>, spec: ActorSpec) -> Self {
        self.set_actor(role, spec);
        self
    }

    /// Register or replace an actor; a replaced actor starts at rest.
    pub fn set_actor(&mut self, role: impl Into<String>, spec: ActorSpec) {
        self.ctx.actors.insert(role, spec);
    }

    /// Mark an actor defeated (or revived). Defeated actors keep their slot
    /// but stop being dash and projectile targets.
    pub fn set_alive(&mut self, role: &str, alive: bool) -> Result<(), OrchestratorError> {
        if self.ctx.actors.set_alive(role, alive) {
            Ok(())
        } else {
            Err(OrchestratorError::UnknownActor(role.to_string()))
        }
    }

    /// Queue a sequence; it starts on the next `step`.
    pub fn play_sequence(
        &mut self,
        id: &str,
        initiator: &str,
        target: Option<&str>,
    ) -> Result<SeqId, OrchestratorError> {
        let def = self
            .registry
            .sequence(id)
            .ok_or_else(|| OrchestratorError::UnknownSequence(id.to_string()))?;
        for role in std::iter::once(initiator).chain(target) {
            if !self.ctx.actors.contains(role) {
                return Err(OrchestratorError::UnknownActor(role.to_string()));
            }
        }
        let seq = self.ctx.ids.alloc_seq();
        log::info!("{seq}: '{id}' by '{initiator}' on {target:?}");
        self.backlog.push(EngineEvent::SequenceStarted {
            sequence: seq,
            id: id.to_string(),
            initiator: initiator.to_string(),
            target: target.map(str::to_string),
        });
        self.sequences.push(SequenceRun::new(
            seq,
            def,
            initiator.to_string(),
            target.map(str::to_string),
        ));
        Ok(seq)
    }

    /// Start a standalone animation. `Ok(None)` when a higher-priority
    /// instance holds the actor.
    pub fn play_animation(
        &mut self,
        id: &str,
        actor: &str,
        target: Option<&str>,
    ) -> Result<Option<InstId>, OrchestratorError> {
        let def = self
            .registry
            .animation(id)
            .ok_or_else(|| OrchestratorError::UnknownAnimation(id.to_string()))?;
        if !self.ctx.actors.contains(actor) {
            return Err(OrchestratorError::UnknownActor(actor.to_string()));
        }
        let launch = Launch {
            def,
            actor: actor.to_string(),
            target: target.map(str::to_string),
            owner: None,
            from_rest: false,
        };
        match self
            .timeline
            .start(launch, &mut self.ctx, &self.cfg, &mut self.backlog)
        {
            StartOutcome::Started(inst) => Ok(Some(inst)),
            StartOutcome::Refused => Ok(None),
        }
    }

    /// Abort one sequence: its instances stop without firing further
    /// triggers and any camera, grade or slow motion it left is reset.
    pub fn abort(&mut self, seq: SeqId, collab: &mut dyn Collaborators) -> bool {
        let Some(pos) = self.sequences.iter().position(|run| run.id() == seq) else {
            return false;
        };
        let mut run = self.sequences.remove(pos);
        let mut env = TickEnv {
            ctx: &mut self.ctx,
            registry: &self.registry,
            cfg: &self.cfg,
            collab,
            events: &mut self.backlog,
            rng: &mut self.rng,
            epoch: self.epoch,
        };
        run.abort(&mut self.timeline, &mut env);
        true
    }

    /// Abort every sequence, stop standalone instances and restore normal
    /// time.
    pub fn abort_all(&mut self, collab: &mut dyn Collaborators) {
        let mut env = TickEnv {
            ctx: &mut self.ctx,
            registry: &self.registry,
            cfg: &self.cfg,
            collab,
            events: &mut self.backlog,
            rng: &mut self.rng,
            epoch: self.epoch,
        };
        for mut run in self.sequences.drain(..) {
            run.abort(&mut self.timeline, &mut env);
        }
        self.timeline.clear(env.events);
        if env.ctx.time.window().is_some() || env.ctx.time.is_frozen() {
            env.ctx.time.clear();
            env.collab.set_time_scale(1.0, 0.0);
            env.events.push(EngineEvent::TimeScaleChanged { scale: 1.0 });
        }
    }

    /// Advance by `dt_ms` of real time.
    pub fn step(
        &mut self,
        dt_ms: f32,
        collab: &mut dyn Collaborators,
    ) -> Result<OrchestratorFrame> {
        if !dt_ms.is_finite() || dt_ms < 0.0 {
            return Err(OrchestratorError::InvalidDelta(dt_ms).into());
        }
        self.epoch = self.epoch.wrapping_add(1);
        scheduler::run_tick(self, dt_ms, collab)
    }

    /// Nothing running and no sequence waiting.
    pub fn is_idle(&self) -> bool {
        self.timeline.is_empty() && self.sequences.is_empty()
    }

    pub fn is_running(&self, seq: SeqId) -> bool {
        self.sequences.iter().any(|run| run.id() == seq)
    }

    pub fn time_scale(&self) -> f32 {
        self.ctx.time.scale()
    }

    pub fn actor(&self, role: &str) -> Option<&ActorEntry> {
        self.ctx.actors.get(role)
    }

    pub fn actors(&self) -> &ActorBoard {
        &self.ctx.actors
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn registry(&self) -> &Arc<DefinitionRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &EngineConfig {
        &self.cfg
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}
