use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use strikeframe_animation_core::{ActorFrame, InstId, Point, Pose, PoseProvider};

/// Which team an actor fights for. Projectile pseudo-actors are neutral.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Ally,
    Opponent,
    Neutral,
}

impl Side {
    pub fn opposes(self, other: Side) -> bool {
        matches!(
            (self, other),
            (Side::Ally, Side::Opponent) | (Side::Opponent, Side::Ally)
        )
    }
}

/// Placement used to register an actor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActorSpec {
    pub rest: Point,
    pub facing: f32,
    pub side: Side,
    #[serde(default)]
    pub half_width: Option<f32>,
}

impl ActorSpec {
    /// Left-side actor facing right.
    pub fn ally(rest: Point) -> Self {
        Self {
            rest,
            facing: 1.0,
            side: Side::Ally,
            half_width: None,
        }
    }

    /// Right-side actor facing left.
    pub fn opponent(rest: Point) -> Self {
        Self {
            rest,
            facing: -1.0,
            side: Side::Opponent,
            half_width: None,
        }
    }

    pub fn with_half_width(mut self, half_width: f32) -> Self {
        self.half_width = Some(half_width);
        self
    }
}

/// Single actor entry with provenance of its last pose write.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ActorEntry {
    pub rest: Point,
    /// Pose relative to `rest`.
    pub pose: Pose,
    /// Where a dash left the actor; keyframe offsets are relative to it.
    pub anchor: Point,
    pub facing: f32,
    pub half_width: Option<f32>,
    pub side: Side,
    pub alive: bool,
    pub epoch: u64,
    pub source: Option<InstId>,
}

impl ActorEntry {
    pub fn new(spec: ActorSpec) -> Self {
        Self {
            rest: spec.rest,
            pose: Pose::IDENTITY,
            anchor: Point::ZERO,
            facing: spec.facing,
            half_width: spec.half_width,
            side: spec.side,
            alive: true,
            epoch: 0,
            source: None,
        }
    }

    pub fn world(&self) -> Point {
        self.rest + self.pose.offset()
    }

    pub fn frame(&self) -> ActorFrame {
        ActorFrame {
            rest: self.rest,
            offset: self.pose.offset(),
            half_width: self.half_width,
            facing: self.facing,
        }
    }
}

/// Recorded when two instances write the same actor within one epoch.
/// The later write wins.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConflictLog {
    pub role: String,
    pub epoch: u64,
    pub previous_source: Option<InstId>,
    pub previous_pose: Pose,
    pub new_source: InstId,
    pub new_pose: Pose,
}

/// Per-actor pose as reported in a frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActorSnapshot {
    pub role: String,
    pub pose: Pose,
    pub world: Point,
    pub side: Side,
    pub alive: bool,
}

/// Shared actor placement, keyed by role in registration order.
#[derive(Debug, Default)]
pub struct ActorBoard {
    inner: IndexMap<String, ActorEntry>,
    conflicts: Vec<ConflictLog>,
}

impl ActorBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace an actor; a replaced actor starts at rest.
    pub fn insert(&mut self, role: impl Into<String>, spec: ActorSpec) -> Option<ActorEntry> {
        self.inner.insert(role.into(), ActorEntry::new(spec))
    }

    pub fn get(&self, role: &str) -> Option<&ActorEntry> {
        self.inner.get(role)
    }

    pub fn contains(&self, role: &str) -> bool {
        self.inner.contains_key(role)
    }

    pub fn remove(&mut self, role: &str) -> Option<ActorEntry> {
        self.inner.shift_remove(role)
    }

    /// Defeated actors stay on the board but stop being dash or projectile
    /// targets.
    pub fn set_alive(&mut self, role: &str, alive: bool) -> bool {
        match self.inner.get_mut(role) {
            Some(entry) => {
                entry.alive = alive;
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ActorEntry)> {
        self.inner.iter()
    }

    /// Apply one instance's pose with last-writer-wins semantics.
    pub fn write_pose(
        &mut self,
        role: &str,
        pose: Pose,
        anchor: Point,
        source: InstId,
        epoch: u64,
    ) -> Option<ConflictLog> {
        let entry = self.inner.get_mut(role)?;
        let conflict = (entry.epoch == epoch && entry.source.is_some_and(|s| s != source)).then(|| {
            ConflictLog {
                role: role.to_string(),
                epoch,
                previous_source: entry.source,
                previous_pose: entry.pose,
                new_source: source,
                new_pose: pose,
            }
        });
        entry.pose = pose;
        entry.anchor = anchor;
        entry.epoch = epoch;
        entry.source = Some(source);
        if let Some(log) = &conflict {
            self.conflicts.push(log.clone());
        }
        conflict
    }

    /// Forget `source` as the last writer once it finished normally, so the
    /// next instance on the actor does not count as a conflicting write.
    pub fn release(&mut self, role: &str, source: InstId) {
        if let Some(entry) = self.inner.get_mut(role) {
            if entry.source == Some(source) {
                entry.source = None;
            }
        }
    }

    pub fn take_conflicts(&mut self) -> Vec<ConflictLog> {
        std::mem::take(&mut self.conflicts)
    }

    /// Live actors opposing `role`, with their world positions.
    pub fn opponents_of(&self, role: &str) -> Vec<(String, Point)> {
        let Some(side) = self.inner.get(role).map(|e| e.side) else {
            return Vec::new();
        };
        self.inner
            .iter()
            .filter(|(_, e)| e.alive && side.opposes(e.side))
            .map(|(r, e)| (r.clone(), e.world()))
            .collect()
    }

    pub fn snapshot(&self) -> Vec<ActorSnapshot> {
        self.inner
            .iter()
            .map(|(role, e)| ActorSnapshot {
                role: role.clone(),
                pose: e.pose,
                world: e.world(),
                side: e.side,
                alive: e.alive,
            })
            .collect()
    }
}

impl PoseProvider for ActorBoard {
    fn actor_frame(&self, role: &str) -> Option<ActorFrame> {
        self.inner
            .get(role)
            .filter(|e| e.alive)
            .map(ActorEntry::frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board() -> ActorBoard {
        let mut b = ActorBoard::new();
        b.insert("player", ActorSpec::ally(Point::new(100.0, 300.0)));
        b.insert("enemy", ActorSpec::opponent(Point::new(500.0, 300.0)));
        b.insert("enemy2", ActorSpec::opponent(Point::new(650.0, 300.0)));
        b
    }

    #[test]
    fn frame_reflects_current_offset() {
        let mut b = board();
        let pose = Pose::IDENTITY.with_offset(Point::new(40.0, -5.0));
        b.write_pose("player", pose, Point::ZERO, InstId(1), 1);
        assert_eq!(b.position("player"), Some(Point::new(140.0, 295.0)));
        assert_eq!(b.actor_frame("enemy").map(|f| f.facing), Some(-1.0));
    }

    #[test]
    fn same_epoch_writes_from_two_instances_conflict() {
        let mut b = board();
        assert!(b.write_pose("enemy", Pose::IDENTITY, Point::ZERO, InstId(1), 4).is_none());
        // same source again is not a conflict
        assert!(b.write_pose("enemy", Pose::IDENTITY, Point::ZERO, InstId(1), 4).is_none());
        let log = b
            .write_pose("enemy", Pose::IDENTITY, Point::ZERO, InstId(2), 4)
            .expect("conflict");
        assert_eq!(log.previous_source, Some(InstId(1)));
        assert_eq!(b.take_conflicts().len(), 1);
        assert!(b.write_pose("enemy", Pose::IDENTITY, Point::ZERO, InstId(3), 5).is_none());
        assert!(b.take_conflicts().is_empty());

        // a released writer hands over cleanly within the same epoch
        b.release("enemy", InstId(3));
        assert!(b.write_pose("enemy", Pose::IDENTITY, Point::ZERO, InstId(4), 5).is_none());
    }

    #[test]
    fn defeated_actors_are_not_targets() {
        let mut b = board();
        assert_eq!(b.opponents_of("player").len(), 2);
        b.set_alive("enemy", false);
        let live = b.opponents_of("player");
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].0, "enemy2");
        assert!(b.actor_frame("enemy").is_none());
        assert_eq!(b.opponents_of("enemy2")[0].0, "player");
    }
}
