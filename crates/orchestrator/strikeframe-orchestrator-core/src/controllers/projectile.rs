//! Projectile Controller: plans multi-target flights and plays each leg as a
//! synthetic animation on a pseudo-actor, so motion goes through the same
//! interpolator as everything else.

use std::sync::Arc;

use strikeframe_animation_core::synthetic::flight_leg;
use strikeframe_animation_core::{GameplayEffect, InstId, Point, ProjectileSpec, SeqId};

use crate::actors::{ActorSpec, Side};
use crate::collaborators::VfxSpawner;
use crate::config::ProjectileDefaults;
use crate::context::TickEnv;
use crate::dispatch;
use crate::events::EngineEvent;
use crate::timeline::{Launch, StartOutcome, Timeline};

/// Projectile spec with every default filled in.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedProjectile {
    pub kind: String,
    pub piercing: bool,
    pub target_all: bool,
    pub reverse: bool,
    pub speed: f32,
    pub on_hit_each: bool,
    pub damage: f32,
    pub shake: f32,
    pub hit_vfx: Option<String>,
    pub exit_ms: f32,
}

impl ResolvedProjectile {
    pub fn resolve(spec: &ProjectileSpec, defaults: &ProjectileDefaults) -> Self {
        Self {
            kind: spec.kind.clone().unwrap_or_else(|| defaults.kind.clone()),
            piercing: spec.piercing.unwrap_or(defaults.piercing),
            target_all: spec.target_all.unwrap_or(defaults.target_all),
            reverse: spec.reverse.unwrap_or(defaults.reverse),
            speed: spec.speed.unwrap_or(defaults.speed),
            on_hit_each: spec.on_hit_each.unwrap_or(defaults.on_hit_each),
            damage: spec.damage.unwrap_or(defaults.damage),
            shake: spec.shake.unwrap_or(defaults.shake),
            hit_vfx: spec.hit_vfx.clone(),
            exit_ms: defaults.exit_ms.max(0.0),
        }
    }

    /// Pixels per ms; speed is pixels per 60 Hz frame.
    pub fn px_per_ms(&self) -> f32 {
        0.06 * self.speed.max(0.01)
    }

    /// Travel time in ms.
    pub fn travel_ms(&self, distance: f32) -> f32 {
        distance / self.px_per_ms()
    }
}

/// Damage dealt when a leg arrives.
#[derive(Clone, Debug, PartialEq)]
pub struct Impact {
    pub target: String,
    pub damage: Option<f32>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Leg {
    pub from: Point,
    pub to: Point,
    pub duration_ms: f32,
    pub impact: Option<Impact>,
}

/// One projectile's path, played leg after leg.
#[derive(Clone, Debug, PartialEq)]
pub struct FlightPlan {
    pub legs: Vec<Leg>,
}

impl FlightPlan {
    pub fn duration_ms(&self) -> f32 {
        self.legs.iter().map(|leg| leg.duration_ms).sum()
    }

    pub fn impacts(&self) -> impl Iterator<Item = &Impact> {
        self.legs.iter().filter_map(|leg| leg.impact.as_ref())
    }
}

/// Plan the flights from `origin` against `candidates`.
///
/// Targets are visited nearest first. A piercing flight threads every target
/// on one path; `targetAll` without piercing fans one flight out from the
/// origin to each target. `primary` is the single target of a cast that does
/// not hit everyone, and the one damaged when impacts are not per target.
/// Empty when there is nothing to hit.
pub fn plan_flights(
    p: &ResolvedProjectile,
    origin: Point,
    candidates: &[(String, Point)],
    primary: Option<&str>,
) -> Vec<FlightPlan> {
    let mut targets: Vec<&(String, Point)> = candidates.iter().collect();
    targets.sort_by(|a, b| origin.distance(a.1).total_cmp(&origin.distance(b.1)));

    if !p.target_all {
        let chosen = primary
            .and_then(|role| targets.iter().copied().find(|(r, _)| r == role))
            .or_else(|| targets.first().copied());
        targets = chosen.into_iter().collect();
    }
    let Some((last_role, _)) = targets.last().copied() else {
        return Vec::new();
    };
    let struck = primary
        .filter(|role| targets.iter().any(|(r, _)| r == role))
        .unwrap_or(last_role)
        .to_string();

    if p.piercing || targets.len() == 1 {
        return vec![path(p, origin, &targets, &struck)];
    }
    targets
        .into_iter()
        .map(|target| path(p, origin, &[target], &struck))
        .collect()
}

fn path(
    p: &ResolvedProjectile,
    origin: Point,
    targets: &[&(String, Point)],
    struck: &str,
) -> FlightPlan {
    let mut legs = Vec::with_capacity(targets.len() + 1);
    let mut from = origin;
    let count = targets.len();
    let carries_struck = targets.iter().any(|(r, _)| r == struck);
    for (i, (role, at)) in targets.iter().copied().enumerate() {
        let hit = if p.on_hit_each {
            Some(role.as_str())
        } else if i + 1 == count && carries_struck {
            Some(struck)
        } else {
            None
        };
        let impact = hit.map(|target| Impact {
            target: target.to_string(),
            damage: Some(p.damage),
        });
        legs.push(Leg {
            from,
            to: *at,
            duration_ms: p.travel_ms(from.distance(*at)),
            impact,
        });
        from = *at;
    }
    let last = from;

    if p.reverse {
        legs.push(Leg {
            from: last,
            to: origin,
            duration_ms: p.travel_ms(last.distance(origin)),
            impact: None,
        });
    } else if p.exit_ms > 0.0 {
        let span = last - origin;
        let len = span.length();
        let dir = if len > f32::EPSILON {
            span * (1.0 / len)
        } else {
            Point::new(1.0, 0.0)
        };
        legs.push(Leg {
            from: last,
            to: last + dir * (p.px_per_ms() * p.exit_ms),
            duration_ms: p.exit_ms,
            impact: None,
        });
    }
    FlightPlan { legs }
}

/// One projectile in the air, on its own pseudo-actor.
#[derive(Debug)]
struct Flight {
    role: String,
    plan: FlightPlan,
    next_leg: usize,
    current: Option<InstId>,
    finished: bool,
}

/// A cast in progress: one flight, or a fan of them.
#[derive(Debug)]
pub(crate) struct ProjectileRun {
    sequence: SeqId,
    shooter: String,
    facing: f32,
    shake: f32,
    hit_vfx: Option<String>,
    flights: Vec<Flight>,
    hits: usize,
    finished: bool,
    overshoot_ms: f32,
}

impl ProjectileRun {
    /// Put a pseudo-actor per flight on the board and start each first leg,
    /// advanced by `budget_ms`. `None` when the shooter is gone or nothing
    /// can be hit.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn launch(
        sequence: SeqId,
        serial: usize,
        spec: &ProjectileSpec,
        shooter: &str,
        primary: Option<&str>,
        budget_ms: f32,
        timeline: &mut Timeline,
        env: &mut TickEnv<'_>,
    ) -> Option<Self> {
        let p = ResolvedProjectile::resolve(spec, &env.cfg.projectile);
        let Some((origin, facing)) = env.ctx.actors.get(shooter).map(|e| (e.world(), e.facing))
        else {
            log::warn!("{sequence}: projectile shooter '{shooter}' is not on the board");
            return None;
        };
        let candidates = env.ctx.actors.opponents_of(shooter);
        let plans = plan_flights(&p, origin, &candidates, primary);
        if plans.is_empty() {
            log::warn!("{sequence}: '{}' has no live target; skipped", p.kind);
            return None;
        }

        let fan = plans.len() > 1;
        let mut flights = Vec::with_capacity(plans.len());
        for (i, plan) in plans.into_iter().enumerate() {
            let role = if fan {
                format!("projectile:{}:{serial}.{i}", sequence.0)
            } else {
                format!("projectile:{}:{serial}", sequence.0)
            };
            env.ctx.actors.insert(
                role.clone(),
                ActorSpec {
                    rest: Point::ZERO,
                    facing: 1.0,
                    side: Side::Neutral,
                    half_width: None,
                },
            );
            env.collab.projectile(&p.kind, &role);
            log::debug!(
                "{sequence}: '{}' as {role}, {} legs over {:.0} ms",
                p.kind,
                plan.legs.len(),
                plan.duration_ms()
            );
            flights.push(Flight {
                role,
                plan,
                next_leg: 0,
                current: None,
                finished: false,
            });
        }

        let mut run = Self {
            sequence,
            shooter: shooter.to_string(),
            facing,
            shake: p.shake,
            hit_vfx: p.hit_vfx,
            flights,
            hits: 0,
            finished: false,
            overshoot_ms: 0.0,
        };
        let mut leftover = f32::INFINITY;
        for i in 0..run.flights.len() {
            if let Some(spare) = run.start_leg(i, budget_ms, timeline, env) {
                leftover = leftover.min(spare);
            }
        }
        run.settle(leftover);
        run.poll(timeline, env);
        Some(run)
    }

    /// Start the next leg of flight `i`. Returns the unused time when the
    /// flight has nothing left to play.
    fn start_leg(
        &mut self,
        i: usize,
        budget_ms: f32,
        timeline: &mut Timeline,
        env: &mut TickEnv<'_>,
    ) -> Option<f32> {
        let flight = &self.flights[i];
        let Some(leg) = flight.plan.legs.get(flight.next_leg) else {
            self.end_flight(i, env);
            return Some(budget_ms);
        };
        let launch = Launch {
            def: Arc::new(flight_leg(leg.from, leg.to, leg.duration_ms)),
            actor: flight.role.clone(),
            target: None,
            owner: Some(self.sequence),
            from_rest: true,
        };
        match timeline.start(launch, env.ctx, env.cfg, env.events) {
            StartOutcome::Started(inst) => {
                self.flights[i].current = Some(inst);
                timeline.advance_one(inst, budget_ms, env);
                None
            }
            StartOutcome::Refused => {
                self.end_flight(i, env);
                Some(budget_ms)
            }
        }
    }

    /// Collect finished legs, land their impacts and chain the next leg with
    /// the leftover time.
    pub(crate) fn poll(&mut self, timeline: &mut Timeline, env: &mut TickEnv<'_>) {
        if self.finished {
            return;
        }
        let mut leftover = f32::INFINITY;
        for i in 0..self.flights.len() {
            while let Some(inst) = self.flights[i].current {
                let Some(done) = timeline.take_completion(inst) else {
                    break;
                };
                let flight = &mut self.flights[i];
                flight.current = None;
                let arrival = flight
                    .plan
                    .legs
                    .get(flight.next_leg)
                    .and_then(|leg| leg.impact.clone().map(|impact| (impact, leg.to)));
                flight.next_leg += 1;
                if let Some((impact, at)) = arrival {
                    self.land(impact, at, env);
                }
                if let Some(spare) = self.start_leg(i, done.overshoot_ms, timeline, env) {
                    leftover = leftover.min(spare);
                }
            }
        }
        self.settle(leftover);
    }

    fn land(&mut self, impact: Impact, at: Point, env: &mut TickEnv<'_>) {
        let hit_index = self.hits;
        self.hits += 1;
        if let Some(amount) = impact.damage {
            let effect = GameplayEffect::Damage {
                amount,
                target: Some(impact.target.clone()),
            };
            dispatch::apply_effect(
                &effect,
                &self.shooter,
                Some(&impact.target),
                Some(self.sequence),
                None,
                env,
            );
        }
        dispatch::shake(self.shake, env);
        if let Some(vfx) = &self.hit_vfx {
            dispatch::spawn_vfx(vfx, Some(&impact.target), self.facing, true, env);
        }
        log::debug!("{}: hit {} on '{}'", self.sequence, hit_index + 1, impact.target);
        env.events.push(EngineEvent::ProjectileImpact {
            sequence: self.sequence,
            target: impact.target,
            hit_index,
            damage: impact.damage,
            position: at,
        });
    }

    fn end_flight(&mut self, i: usize, env: &mut TickEnv<'_>) {
        let flight = &mut self.flights[i];
        flight.finished = true;
        flight.current = None;
        env.ctx.actors.remove(&flight.role);
    }

    /// The cast is over once its last flight is; the latest flight to end
    /// leaves the least time over.
    fn settle(&mut self, leftover_ms: f32) {
        if self.finished || !self.flights.iter().all(|f| f.finished) {
            return;
        }
        self.finished = true;
        self.overshoot_ms = if leftover_ms.is_finite() {
            leftover_ms
        } else {
            0.0
        };
        log::trace!("{}: projectile cast done, {} hits", self.sequence, self.hits);
    }

    /// Remove the pseudo-actors without landing anything further.
    pub(crate) fn discard(&mut self, env: &mut TickEnv<'_>) {
        for i in 0..self.flights.len() {
            if !self.flights[i].finished {
                self.end_flight(i, env);
            }
        }
        self.finished = true;
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.finished
    }

    pub(crate) fn overshoot_ms(&self) -> f32 {
        self.overshoot_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(json: &str) -> ResolvedProjectile {
        let spec: ProjectileSpec = serde_json::from_str(json).unwrap();
        ResolvedProjectile::resolve(&spec, &ProjectileDefaults::default())
    }

    fn field() -> Vec<(String, Point)> {
        vec![
            ("far".to_string(), Point::new(700.0, 300.0)),
            ("near".to_string(), Point::new(400.0, 300.0)),
            ("mid".to_string(), Point::new(550.0, 300.0)),
        ]
    }

    const ORIGIN: Point = Point::new(100.0, 300.0);

    #[test]
    fn defaults_fill_unset_fields() {
        let p = spec(r#"{ "type": "dagger", "speed": 50 }"#);
        assert_eq!(p.kind, "dagger");
        assert!(p.piercing && p.target_all && p.on_hit_each && !p.reverse);
        assert_eq!(p.damage, 4.0);
        // 300 px at 3 px/ms
        assert!((p.travel_ms(300.0) - 100.0).abs() < 1e-3);
    }

    fn single(mut plans: Vec<FlightPlan>) -> FlightPlan {
        assert_eq!(plans.len(), 1);
        plans.remove(0)
    }

    #[test]
    fn piercing_visits_targets_nearest_first_then_exits() {
        let p = spec("{}");
        let plan = single(plan_flights(&p, ORIGIN, &field(), Some("mid")));
        let order: Vec<&str> = plan.impacts().map(|i| i.target.as_str()).collect();
        assert_eq!(order, vec!["near", "mid", "far"]);
        // 300 px at 25 * 0.06 px/ms
        assert!((plan.legs[0].duration_ms - 200.0).abs() < 1e-3);
        // flies on for 200 ms past the furthest target
        let exit = plan.legs.last().unwrap();
        assert!(exit.impact.is_none());
        assert_eq!(exit.duration_ms, 200.0);
        assert!((exit.to.x - 1000.0).abs() < 1e-3);
    }

    #[test]
    fn exit_lasts_the_same_whatever_the_speed() {
        let fast = spec(r#"{ "speed": 50 }"#);
        let plan = single(plan_flights(&fast, ORIGIN, &field(), None));
        let exit = plan.legs.last().unwrap();
        assert_eq!(exit.duration_ms, 200.0);
        assert!((exit.to.x - 1300.0).abs() < 1e-3);

        let defaults = ProjectileDefaults {
            exit_ms: 0.0,
            ..ProjectileDefaults::default()
        };
        let none = ResolvedProjectile::resolve(&ProjectileSpec::default(), &defaults);
        let plan = single(plan_flights(&none, ORIGIN, &field(), None));
        assert_eq!(plan.legs.len(), 3);
    }

    #[test]
    fn target_all_without_piercing_fans_out_from_the_origin() {
        let p = spec(r#"{ "piercing": false, "targetAll": true }"#);
        let plans = plan_flights(&p, ORIGIN, &field(), None);
        assert_eq!(plans.len(), 3);
        let hit: Vec<&str> = plans
            .iter()
            .flat_map(|plan| plan.impacts().map(|i| i.target.as_str()))
            .collect();
        assert_eq!(hit, vec!["near", "mid", "far"]);
        for plan in &plans {
            assert_eq!(plan.legs[0].from, ORIGIN);
            assert_eq!(plan.impacts().next().unwrap().damage, Some(4.0));
        }
        assert_eq!(plans[2].legs[0].to, Point::new(700.0, 300.0));
    }

    #[test]
    fn fan_with_one_impact_damages_the_primary_only() {
        let p = spec(r#"{ "piercing": false, "onHitEach": false }"#);
        let plans = plan_flights(&p, ORIGIN, &field(), Some("mid"));
        assert_eq!(plans.len(), 3);
        let hit: Vec<&str> = plans
            .iter()
            .flat_map(|plan| plan.impacts().map(|i| i.target.as_str()))
            .collect();
        assert_eq!(hit, vec!["mid"]);
    }

    #[test]
    fn single_target_non_piercing_is_one_flight() {
        let p = spec(r#"{ "piercing": false, "targetAll": false }"#);
        let plan = single(plan_flights(&p, ORIGIN, &field(), None));
        assert_eq!(plan.impacts().count(), 1);
        assert_eq!(plan.legs[0].to, Point::new(400.0, 300.0));
    }

    #[test]
    fn single_target_prefers_primary_and_reverse_comes_back() {
        let p = spec(r#"{ "targetAll": false, "reverse": true }"#);
        let plan = single(plan_flights(&p, ORIGIN, &field(), Some("far")));
        assert_eq!(plan.legs.len(), 2);
        assert_eq!(plan.legs[0].impact.as_ref().unwrap().target, "far");
        assert_eq!(plan.legs[1].to, ORIGIN);
    }

    #[test]
    fn one_impact_when_not_per_target() {
        let p = spec(r#"{ "onHitEach": false, "damage": 9 }"#);
        let plan = single(plan_flights(&p, ORIGIN, &field(), Some("near")));
        let impacts: Vec<&Impact> = plan.impacts().collect();
        assert_eq!(impacts.len(), 1);
        assert_eq!(impacts[0].target, "near");
        assert_eq!(impacts[0].damage, Some(9.0));
        // the single impact lands when the flight reaches the furthest target
        assert!(plan.legs[2].impact.is_some());
    }

    #[test]
    fn nothing_to_hit() {
        assert!(plan_flights(&spec("{}"), ORIGIN, &[], None).is_empty());
    }
}
