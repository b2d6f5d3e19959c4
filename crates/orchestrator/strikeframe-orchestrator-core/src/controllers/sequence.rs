//! Sequence Orchestrator: walks a card's steps in order on its own clock.
//!
//! Each step moves through enter, pre-delay, start and (for blocking steps)
//! wait. Time left over when something finishes mid-tick is carried into the
//! next step, so boundaries land exactly in scaled sequence time.

use std::sync::Arc;

use rand::Rng;

use strikeframe_animation_core::synthetic::return_to_rest;
use strikeframe_animation_core::{
    AnimStep, AnimationDefinition, GameplayEffect, InstId, ProjectileStep, SeqId,
    SequenceDefinition, Step,
};

use crate::context::TickEnv;
use crate::controllers::projectile::ProjectileRun;
use crate::dispatch;
use crate::events::EngineEvent;
use crate::timeline::{Launch, StartOutcome, Timeline};

#[derive(Debug)]
enum Waiter {
    Instance {
        inst: InstId,
        effects: Vec<GameplayEffect>,
    },
    /// Index into `SequenceRun::projectiles`.
    Projectile(usize),
}

#[derive(Debug)]
enum StepState {
    Enter,
    Delay { remaining_ms: f32 },
    Wait(Waiter),
}

/// Detached instance whose payload is delivered when it finishes.
#[derive(Debug)]
struct Pending {
    inst: InstId,
    effects: Vec<GameplayEffect>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Phase {
    Steps,
    Returning(InstId),
    /// Steps are done; waiting on detached work.
    Settling,
    Done,
}

#[derive(Debug)]
pub(crate) struct SequenceRun {
    id: SeqId,
    def: Arc<SequenceDefinition>,
    initiator: String,
    target: Option<String>,
    clock_ms: f32,
    cursor: usize,
    state: StepState,
    pending: Vec<Pending>,
    projectiles: Vec<ProjectileRun>,
    phase: Phase,
}

impl SequenceRun {
    pub(crate) fn new(
        id: SeqId,
        def: Arc<SequenceDefinition>,
        initiator: String,
        target: Option<String>,
    ) -> Self {
        Self {
            id,
            def,
            initiator,
            target,
            clock_ms: 0.0,
            cursor: 0,
            state: StepState::Enter,
            pending: Vec::new(),
            projectiles: Vec::new(),
            phase: Phase::Steps,
        }
    }

    pub(crate) fn id(&self) -> SeqId {
        self.id
    }

    pub(crate) fn is_done(&self) -> bool {
        self.phase == Phase::Done
    }

    /// Advance by `dt_ms` of scaled time. Returns true once the sequence is
    /// complete.
    pub(crate) fn update(
        &mut self,
        dt_ms: f32,
        timeline: &mut Timeline,
        env: &mut TickEnv<'_>,
    ) -> bool {
        if self.phase == Phase::Done {
            return true;
        }
        let dt = dt_ms.max(0.0);
        let tick_start = self.clock_ms;
        self.clock_ms += dt;
        let mut budget = dt;

        for run in self.projectiles.iter_mut().filter(|run| !run.is_finished()) {
            run.poll(timeline, env);
        }
        self.collect_pending(tick_start, dt, timeline, env);

        loop {
            let at_ms = tick_start + (dt - budget);
            match self.phase {
                Phase::Done => return true,
                Phase::Steps => {
                    if !self.run_step(&mut budget, tick_start, dt, timeline, env) {
                        break;
                    }
                }
                Phase::Returning(inst) => {
                    let Some(done) = timeline.take_completion(inst) else {
                        break;
                    };
                    budget = done.overshoot_ms.min(dt);
                    self.phase = Phase::Settling;
                }
                Phase::Settling => {
                    self.collect_pending(tick_start, dt, timeline, env);
                    if self.pending.is_empty()
                        && self.projectiles.iter().all(ProjectileRun::is_finished)
                    {
                        self.complete(at_ms, env);
                        return true;
                    }
                    break;
                }
            }
        }
        false
    }

    /// One state transition of the current step. Returns false when the step
    /// cannot progress further this tick.
    fn run_step(
        &mut self,
        budget: &mut f32,
        tick_start: f32,
        dt: f32,
        timeline: &mut Timeline,
        env: &mut TickEnv<'_>,
    ) -> bool {
        let at_ms = tick_start + (dt - *budget);
        match &mut self.state {
            StepState::Enter => {
                let Some(step) = self.def.steps.get(self.cursor) else {
                    self.end_steps(*budget, timeline, env);
                    return true;
                };
                log::trace!("{}: step {} ({}) at {at_ms:.1}", self.id, self.cursor, step.kind());
                env.events.push(EngineEvent::StepEntered {
                    sequence: self.id,
                    index: self.cursor,
                    kind: step.kind().to_string(),
                    at_ms,
                });
                self.state = StepState::Delay {
                    remaining_ms: step.pre_delay_ms().max(0.0),
                };
                true
            }
            StepState::Delay { remaining_ms } => {
                if *remaining_ms > *budget {
                    *remaining_ms -= *budget;
                    *budget = 0.0;
                    return false;
                }
                *budget -= *remaining_ms;
                self.begin(tick_start + (dt - *budget), *budget, timeline, env);
                true
            }
            StepState::Wait(waiter) => {
                let overshoot = match waiter {
                    Waiter::Instance { inst, .. } => match timeline.take_completion(*inst) {
                        Some(done) => done.overshoot_ms,
                        None => return false,
                    },
                    Waiter::Projectile(index) => match self.projectiles.get_mut(*index) {
                        Some(run) => {
                            run.poll(timeline, env);
                            if !run.is_finished() {
                                return false;
                            }
                            run.overshoot_ms()
                        }
                        None => 0.0,
                    },
                };
                *budget = overshoot.min(dt);
                let at_ms = tick_start + (dt - *budget);
                if let StepState::Wait(Waiter::Instance { effects, .. }) =
                    std::mem::replace(&mut self.state, StepState::Enter)
                {
                    self.deliver(&effects, at_ms, env);
                }
                self.complete_step(at_ms, env);
                true
            }
        }
    }

    /// Start the current step after its pre-delay.
    fn begin(&mut self, at_ms: f32, budget: f32, timeline: &mut Timeline, env: &mut TickEnv<'_>) {
        let def = Arc::clone(&self.def);
        let Some(step) = def.steps.get(self.cursor) else {
            return;
        };
        match step {
            Step::Delay(_) => self.complete_step(at_ms, env),
            Step::Event(event) => {
                self.deliver(&event.effects, at_ms, env);
                self.complete_step(at_ms, env);
            }
            Step::Anim(anim) => self.begin_anim(anim, at_ms, budget, timeline, env),
            Step::Projectile(projectile) => {
                self.begin_projectile(projectile, at_ms, budget, timeline, env)
            }
        }
    }

    fn begin_anim(
        &mut self,
        step: &AnimStep,
        at_ms: f32,
        budget: f32,
        timeline: &mut Timeline,
        env: &mut TickEnv<'_>,
    ) {
        let picked = step
            .anim
            .choose(|n| env.rng.gen_range(0..n))
            .map(str::to_string);
        let Some(def) = picked.as_deref().and_then(|id| env.registry.animation(id)) else {
            log::warn!(
                "{} ('{}'): step {} animation {:?} not found; skipped",
                self.id,
                self.def.id,
                self.cursor,
                picked
            );
            self.deliver(&step.effects, at_ms, env);
            self.complete_step(at_ms, env);
            return;
        };

        let actor = self.role_for(&def);
        let launch = Launch {
            target: self.opponent_of(&actor),
            def,
            actor,
            owner: Some(self.id),
            from_rest: false,
        };
        match timeline.start(launch, env.ctx, env.cfg, env.events) {
            StartOutcome::Refused => {
                self.deliver(&step.effects, at_ms, env);
                self.complete_step(at_ms, env);
            }
            StartOutcome::Started(inst) => {
                timeline.advance_one(inst, budget, env);
                if step.wait {
                    self.state = StepState::Wait(Waiter::Instance {
                        inst,
                        effects: step.effects.clone(),
                    });
                } else {
                    self.pending.push(Pending {
                        inst,
                        effects: step.effects.clone(),
                    });
                    self.complete_step(at_ms, env);
                }
            }
        }
    }

    fn begin_projectile(
        &mut self,
        step: &ProjectileStep,
        at_ms: f32,
        budget: f32,
        timeline: &mut Timeline,
        env: &mut TickEnv<'_>,
    ) {
        let serial = self.projectiles.len();
        let launched = ProjectileRun::launch(
            self.id,
            serial,
            &step.spec,
            &self.initiator,
            self.target.as_deref(),
            budget,
            timeline,
            env,
        );
        match launched {
            Some(run) => {
                self.projectiles.push(run);
                if step.wait {
                    self.state = StepState::Wait(Waiter::Projectile(serial));
                } else {
                    self.complete_step(at_ms, env);
                }
            }
            None => self.complete_step(at_ms, env),
        }
    }

    /// After the last step: play the return to rest, then settle.
    fn end_steps(&mut self, budget: f32, timeline: &mut Timeline, env: &mut TickEnv<'_>) {
        self.phase = Phase::Settling;
        if !self.def.return_to_base {
            return;
        }
        let Some(pose) = env.ctx.actors.get(&self.initiator).map(|e| e.pose) else {
            return;
        };
        let launch = Launch {
            def: Arc::new(return_to_rest(&pose, &env.cfg.animation)),
            actor: self.initiator.clone(),
            target: None,
            owner: Some(self.id),
            from_rest: true,
        };
        if let StartOutcome::Started(inst) = timeline.start(launch, env.ctx, env.cfg, env.events) {
            timeline.advance_one(inst, budget, env);
            self.phase = Phase::Returning(inst);
        }
    }

    fn complete_step(&mut self, at_ms: f32, env: &mut TickEnv<'_>) {
        env.events.push(EngineEvent::StepCompleted {
            sequence: self.id,
            index: self.cursor,
            at_ms,
        });
        self.cursor += 1;
        self.state = StepState::Enter;
    }

    /// Deliver payloads of detached instances that have finished.
    fn collect_pending(
        &mut self,
        tick_start: f32,
        dt: f32,
        timeline: &mut Timeline,
        env: &mut TickEnv<'_>,
    ) {
        if self.pending.is_empty() {
            return;
        }
        let mut waiting = Vec::with_capacity(self.pending.len());
        for pending in std::mem::take(&mut self.pending) {
            match timeline.take_completion(pending.inst) {
                Some(done) => {
                    let at_ms = tick_start + (dt - done.overshoot_ms.min(dt));
                    self.deliver(&pending.effects, at_ms, env);
                }
                None => waiting.push(pending),
            }
        }
        self.pending = waiting;
    }

    fn deliver(&self, effects: &[GameplayEffect], at_ms: f32, env: &mut TickEnv<'_>) {
        for effect in effects {
            dispatch::apply_effect(
                effect,
                &self.initiator,
                self.target.as_deref(),
                Some(self.id),
                Some(at_ms),
                env,
            );
        }
    }

    /// Animations authored for the sequence's actor tag play on the
    /// initiator; anything else plays on the target.
    fn role_for(&self, def: &AnimationDefinition) -> String {
        match def.target.as_deref() {
            None => self.initiator.clone(),
            Some(tag) if tag == self.def.actor || tag == self.initiator => self.initiator.clone(),
            Some(tag) => self.target.clone().unwrap_or_else(|| tag.to_string()),
        }
    }

    fn opponent_of(&self, actor: &str) -> Option<String> {
        if actor == self.initiator {
            self.target.clone()
        } else {
            Some(self.initiator.clone())
        }
    }

    fn complete(&mut self, at_ms: f32, env: &mut TickEnv<'_>) {
        dispatch::release(self.id, env);
        log::info!("{} ('{}') completed at {at_ms:.1} ms", self.id, self.def.id);
        env.events.push(EngineEvent::SequenceCompleted {
            sequence: self.id,
            id: self.def.id.clone(),
            at_ms,
        });
        self.phase = Phase::Done;
    }

    /// Tear down everything this sequence started. Remaining triggers and
    /// undelivered payloads are dropped.
    pub(crate) fn abort(&mut self, timeline: &mut Timeline, env: &mut TickEnv<'_>) {
        if self.phase == Phase::Done {
            return;
        }
        timeline.remove_owned(self.id, env.events);
        for run in &mut self.projectiles {
            run.discard(env);
        }
        self.pending.clear();
        dispatch::release(self.id, env);
        log::info!("{} ('{}') aborted at {:.1} ms", self.id, self.def.id, self.clock_ms);
        env.events.push(EngineEvent::SequenceAborted {
            sequence: self.id,
            id: self.def.id.clone(),
        });
        self.phase = Phase::Done;
    }
}
