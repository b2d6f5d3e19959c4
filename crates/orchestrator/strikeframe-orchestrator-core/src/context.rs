use rand::rngs::StdRng;

use strikeframe_animation_core::{DefinitionRegistry, IdAllocator, SeqId};

use crate::actors::ActorBoard;
use crate::collaborators::Collaborators;
use crate::config::EngineConfig;
use crate::events::EngineEvent;
use crate::time::TimeDilation;

/// Mutable state shared by everything running in one combat session.
#[derive(Debug, Default)]
pub struct CombatContext {
    pub actors: ActorBoard,
    pub time: TimeDilation,
    pub ids: IdAllocator,
    /// Last sequence that moved the camera or changed the color grade.
    pub(crate) camera_owner: Option<SeqId>,
    pub(crate) grade_owner: Option<SeqId>,
}

impl CombatContext {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Borrowed view handed down through one tick.
pub(crate) struct TickEnv<'a> {
    pub ctx: &'a mut CombatContext,
    pub registry: &'a DefinitionRegistry,
    pub cfg: &'a EngineConfig,
    pub collab: &'a mut dyn Collaborators,
    pub events: &'a mut Vec<EngineEvent>,
    pub rng: &'a mut StdRng,
    pub epoch: u64,
}
