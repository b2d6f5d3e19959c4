//! Timeline Scheduler: owns every running playback instance, enforces one
//! instance per actor by priority, writes poses to the board and hands fired
//! triggers to the dispatcher.

use std::sync::Arc;

use hashbrown::HashMap;
use indexmap::IndexMap;

use strikeframe_animation_core::{
    AnimationDefinition, InstId, InstanceCfg, PlaybackInstance, Point, SeqId,
};

use crate::config::EngineConfig;
use crate::context::{CombatContext, TickEnv};
use crate::dispatch::{self, TriggerSite};
use crate::events::EngineEvent;

/// Request to start an animation on an actor.
#[derive(Clone, Debug)]
pub(crate) struct Launch {
    pub def: Arc<AnimationDefinition>,
    pub actor: String,
    pub target: Option<String>,
    pub owner: Option<SeqId>,
    /// Start with a zero anchor, so offsets are relative to the rest position.
    pub from_rest: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum StartOutcome {
    Started(InstId),
    Refused,
}

/// How an instance left the timeline.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Completion {
    /// Part of the finishing tick left over after the end of playback.
    pub overshoot_ms: f32,
    pub interrupted: bool,
    pub owner: Option<SeqId>,
}

#[derive(Debug)]
struct Slot {
    inst: PlaybackInstance,
    owner: Option<SeqId>,
}

#[derive(Debug, Default)]
pub struct Timeline {
    slots: IndexMap<InstId, Slot>,
    /// Finished instances waiting to be collected by their owner.
    completions: HashMap<InstId, Completion>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn instance(&self, id: InstId) -> Option<&PlaybackInstance> {
        self.slots.get(&id).map(|slot| &slot.inst)
    }

    /// The instance currently driving `actor`, if any.
    pub fn playing_on(&self, actor: &str) -> Option<&PlaybackInstance> {
        self.slots
            .values()
            .map(|slot| &slot.inst)
            .find(|inst| inst.actor() == actor)
    }

    /// Start `launch.def` on `launch.actor`.
    ///
    /// An instance already driving the actor is interrupted when the new
    /// priority is at least as high; otherwise the new start is refused.
    pub(crate) fn start(
        &mut self,
        launch: Launch,
        ctx: &mut CombatContext,
        cfg: &EngineConfig,
        events: &mut Vec<EngineEvent>,
    ) -> StartOutcome {
        let Some(entry) = ctx.actors.get(&launch.actor) else {
            log::warn!(
                "cannot start '{}': actor '{}' is not on the board",
                launch.def.id,
                launch.actor
            );
            return StartOutcome::Refused;
        };
        let (facing, pose) = (entry.facing, entry.pose);
        let anchor = if launch.from_rest {
            Point::ZERO
        } else {
            entry.anchor
        };

        let priority = launch.def.priority;
        if let Some(blocker) = self
            .slots
            .values()
            .map(|slot| &slot.inst)
            .find(|inst| inst.actor() == launch.actor && inst.priority() > priority)
        {
            log::warn!(
                "'{}' (priority {priority}) refused on '{}': '{}' holds it at priority {}",
                launch.def.id,
                launch.actor,
                blocker.definition().id,
                blocker.priority()
            );
            events.push(EngineEvent::InstanceRefused {
                animation: launch.def.id.clone(),
                actor: launch.actor,
                sequence: launch.owner,
            });
            return StartOutcome::Refused;
        }

        let displaced: Vec<InstId> = self
            .slots
            .iter()
            .filter(|(_, slot)| slot.inst.actor() == launch.actor)
            .map(|(id, _)| *id)
            .collect();
        for id in displaced {
            self.interrupt(id, events);
        }

        let id = ctx.ids.alloc_inst();
        let mut inst_cfg = InstanceCfg::new(launch.actor.clone())
            .with_facing(facing)
            .with_start_pose(pose)
            .with_anchor(anchor);
        if let Some(target) = &launch.target {
            inst_cfg = inst_cfg.with_target(target.clone());
        }
        let inst = PlaybackInstance::new(id, Arc::clone(&launch.def), inst_cfg, &cfg.animation);
        log::debug!("{id}: '{}' on '{}'", launch.def.id, launch.actor);
        events.push(EngineEvent::InstanceStarted {
            inst: id,
            animation: launch.def.id.clone(),
            actor: launch.actor,
            sequence: launch.owner,
        });
        self.slots.insert(
            id,
            Slot {
                inst,
                owner: launch.owner,
            },
        );
        StartOutcome::Started(id)
    }

    /// Advance every running instance by `dt_ms` in start order.
    pub(crate) fn advance_all(&mut self, dt_ms: f32, env: &mut TickEnv<'_>) {
        let ids: Vec<InstId> = self.slots.keys().copied().collect();
        for id in ids {
            self.advance_one(id, dt_ms, env);
        }
    }

    /// Advance one instance, write its pose and dispatch its triggers.
    /// Returns the completion when the instance finished on this call; it is
    /// also kept for `take_completion`.
    pub(crate) fn advance_one(
        &mut self,
        id: InstId,
        dt_ms: f32,
        env: &mut TickEnv<'_>,
    ) -> Option<Completion> {
        let slot = self.slots.get_mut(&id)?;
        let step = slot
            .inst
            .advance(dt_ms, &env.ctx.actors, &env.cfg.animation);
        let actor = slot.inst.actor().to_string();
        let target = slot.inst.target().map(str::to_string);
        let facing = slot.inst.facing();
        let owner = slot.owner;

        if let Some(conflict) =
            env.ctx
                .actors
                .write_pose(&actor, step.pose, slot.inst.anchor(), id, env.epoch)
        {
            log::debug!(
                "'{actor}' written by {:?} and {id} in epoch {}",
                conflict.previous_source,
                conflict.epoch
            );
        }

        for fired in &step.fired {
            let site = TriggerSite {
                inst: id,
                keyframe: fired.keyframe,
                actor: &actor,
                target: target.as_deref(),
                facing,
                owner,
            };
            dispatch::fire(&fired.trigger, &site, env);
        }

        if !step.finished {
            return None;
        }
        let slot = self.slots.shift_remove(&id)?;
        env.ctx.actors.release(&actor, id);
        let done = Completion {
            overshoot_ms: step.overshoot_ms,
            interrupted: false,
            owner: slot.owner,
        };
        env.events.push(EngineEvent::InstanceFinished {
            inst: id,
            animation: slot.inst.definition().id.clone(),
            actor,
            interrupted: false,
        });
        self.completions.insert(id, done);
        Some(done)
    }

    /// Stop an instance without firing its remaining triggers.
    pub(crate) fn interrupt(&mut self, id: InstId, events: &mut Vec<EngineEvent>) -> bool {
        let Some(mut slot) = self.slots.shift_remove(&id) else {
            return false;
        };
        slot.inst.interrupt();
        log::debug!("{id}: '{}' interrupted", slot.inst.definition().id);
        events.push(EngineEvent::InstanceFinished {
            inst: id,
            animation: slot.inst.definition().id.clone(),
            actor: slot.inst.actor().to_string(),
            interrupted: true,
        });
        self.completions.insert(
            id,
            Completion {
                overshoot_ms: 0.0,
                interrupted: true,
                owner: slot.owner,
            },
        );
        true
    }

    pub(crate) fn take_completion(&mut self, id: InstId) -> Option<Completion> {
        self.completions.remove(&id)
    }

    /// Drop everything `owner` started, running or finished.
    pub(crate) fn remove_owned(&mut self, owner: SeqId, events: &mut Vec<EngineEvent>) {
        let owned: Vec<InstId> = self
            .slots
            .iter()
            .filter(|(_, slot)| slot.owner == Some(owner))
            .map(|(id, _)| *id)
            .collect();
        for id in owned {
            self.interrupt(id, events);
        }
        self.completions.retain(|_, done| done.owner != Some(owner));
    }

    /// Forget completions nobody can collect any more.
    pub(crate) fn retain_completions(&mut self, live: &[SeqId]) {
        self.completions
            .retain(|_, done| done.owner.is_some_and(|owner| live.contains(&owner)));
    }

    pub(crate) fn clear(&mut self, events: &mut Vec<EngineEvent>) {
        let ids: Vec<InstId> = self.slots.keys().copied().collect();
        for id in ids {
            self.interrupt(id, events);
        }
        self.completions.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actors::ActorSpec;
    use strikeframe_animation_core::synthetic::flight_leg;

    fn ctx() -> CombatContext {
        let mut ctx = CombatContext::new();
        ctx.actors
            .insert("player", ActorSpec::ally(Point::new(100.0, 300.0)));
        ctx
    }

    fn launch(priority: i32) -> Launch {
        let mut def = flight_leg(Point::ZERO, Point::new(10.0, 0.0), 100.0);
        def.id = format!("p{priority}");
        def.priority = priority;
        Launch {
            def: Arc::new(def),
            actor: "player".into(),
            target: None,
            owner: Some(SeqId(1)),
            from_rest: false,
        }
    }

    #[test]
    fn higher_priority_holds_the_actor() {
        let (mut ctx, cfg) = (ctx(), EngineConfig::default());
        let mut events = Vec::new();
        let mut tl = Timeline::new();

        let StartOutcome::Started(first) = tl.start(launch(10), &mut ctx, &cfg, &mut events) else {
            panic!("first start refused");
        };
        assert_eq!(tl.start(launch(5), &mut ctx, &cfg, &mut events), StartOutcome::Refused);
        assert!(matches!(events.last(), Some(EngineEvent::InstanceRefused { .. })));
        assert_eq!(tl.len(), 1);

        // equal priority replaces
        let StartOutcome::Started(second) = tl.start(launch(10), &mut ctx, &cfg, &mut events) else {
            panic!("equal priority refused");
        };
        assert_eq!(tl.len(), 1);
        assert_eq!(tl.playing_on("player").map(|i| i.id()), Some(second));
        let done = tl.take_completion(first).expect("interrupted completion");
        assert!(done.interrupted);
    }

    #[test]
    fn unknown_actor_is_refused() {
        let (mut ctx, cfg) = (ctx(), EngineConfig::default());
        let mut events = Vec::new();
        let mut l = launch(0);
        l.actor = "ghost".into();
        assert_eq!(
            Timeline::new().start(l, &mut ctx, &cfg, &mut events),
            StartOutcome::Refused
        );
    }

    #[test]
    fn owned_work_is_dropped_with_its_owner() {
        let (mut ctx, cfg) = (ctx(), EngineConfig::default());
        ctx.actors
            .insert("enemy", ActorSpec::opponent(Point::new(500.0, 300.0)));
        let mut events = Vec::new();
        let mut tl = Timeline::new();
        tl.start(launch(0), &mut ctx, &cfg, &mut events);
        let mut other = launch(0);
        other.actor = "enemy".into();
        other.owner = Some(SeqId(2));
        tl.start(other, &mut ctx, &cfg, &mut events);

        tl.remove_owned(SeqId(1), &mut events);
        assert_eq!(tl.len(), 1);
        assert!(tl.playing_on("enemy").is_some());
        tl.retain_completions(&[SeqId(2)]);
        assert!(tl.completions.is_empty());
    }
}
