use std::sync::Arc;

use anyhow::Result;

use strikeframe_animation_core::SeqId;

use crate::collaborators::{Collaborators, TimeDilationSink};
use crate::context::TickEnv;
use crate::events::EngineEvent;

/// Run one tick:
///   dilate time -> instances -> sequences (in start order) -> frame
pub fn run_tick(
    orchestrator: &mut crate::Orchestrator,
    dt_ms: f32,
    collab: &mut dyn Collaborators,
) -> Result<crate::OrchestratorFrame> {
    let o = orchestrator;
    let mut events: Vec<EngineEvent> = std::mem::take(&mut o.backlog);

    let dilated = o.ctx.time.advance(dt_ms);
    let scaled_dt = dilated.scaled_ms * o.cfg.speed.max(0.0);
    if dilated.expired {
        log::debug!("slow motion expired");
        collab.set_time_scale(1.0, 0.0);
        events.push(EngineEvent::TimeScaleChanged { scale: 1.0 });
    }

    let registry = Arc::clone(&o.registry);
    let mut env = TickEnv {
        ctx: &mut o.ctx,
        registry: &registry,
        cfg: &o.cfg,
        collab,
        events: &mut events,
        rng: &mut o.rng,
        epoch: o.epoch,
    };

    o.timeline.advance_all(scaled_dt, &mut env);
    for run in o.sequences.iter_mut() {
        run.update(scaled_dt, &mut o.timeline, &mut env);
    }
    o.sequences.retain(|run| !run.is_done());
    let live: Vec<SeqId> = o.sequences.iter().map(|run| run.id()).collect();
    o.timeline.retain_completions(&live);

    let frame = crate::OrchestratorFrame {
        epoch: o.epoch,
        dt: dt_ms,
        scaled_dt,
        time_scale: o.ctx.time.scale(),
        poses: o.ctx.actors.snapshot(),
        events,
        conflicts: o.ctx.actors.take_conflicts(),
    };
    log::trace!(
        "epoch {}: dt {dt_ms:.2} -> {scaled_dt:.2}, {} events",
        frame.epoch,
        frame.events.len()
    );
    Ok(frame)
}
