//! Definition Registry: id -> definition tables populated at startup.
//!
//! Definitions are stored behind `Arc` so playback instances can hold the
//! definition they were started from while the registry stays shared.

use std::sync::Arc;

use hashbrown::HashMap;

use crate::config::Config;
use crate::data::{AnimationDefinition, SequenceDefinition, VfxDefinition};
use crate::error::Result;
use crate::stored::{parse_bundle_json, Bundle};

/// Result of an untyped lookup.
#[derive(Clone, Debug)]
pub enum DefinitionRef {
    Animation(Arc<AnimationDefinition>),
    Sequence(Arc<SequenceDefinition>),
    Vfx(Arc<VfxDefinition>),
}

impl DefinitionRef {
    pub fn kind(&self) -> &'static str {
        match self {
            DefinitionRef::Animation(_) => "animation",
            DefinitionRef::Sequence(_) => "sequence",
            DefinitionRef::Vfx(_) => "vfx",
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct DefinitionRegistry {
    animations: HashMap<String, Arc<AnimationDefinition>>,
    sequences: HashMap<String, Arc<SequenceDefinition>>,
    vfx: HashMap<String, Arc<VfxDefinition>>,
}

impl DefinitionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_bundle(bundle: Bundle) -> Self {
        let mut registry = Self::new();
        registry.insert_bundle(bundle);
        registry
    }

    pub fn from_bundle_json(json: &str, cfg: &Config) -> Result<Self> {
        Ok(Self::from_bundle(parse_bundle_json(json, cfg)?))
    }

    /// Parse a bundle and merge it in; later entries replace earlier ones
    /// with the same id. Returns how many definitions were added.
    pub fn load_bundle_json(&mut self, json: &str, cfg: &Config) -> Result<usize> {
        let bundle = parse_bundle_json(json, cfg)?;
        let count = bundle.animations.len() + bundle.sequences.len() + bundle.vfx.len();
        self.insert_bundle(bundle);
        Ok(count)
    }

    pub fn insert_bundle(&mut self, bundle: Bundle) {
        for def in bundle.animations {
            self.insert_animation(def);
        }
        for def in bundle.sequences {
            self.insert_sequence(def);
        }
        for def in bundle.vfx {
            self.insert_vfx(def);
        }
    }

    pub fn insert_animation(&mut self, def: AnimationDefinition) -> Option<Arc<AnimationDefinition>> {
        if self.animations.contains_key(&def.id) {
            log::debug!("animation {} replaced", def.id);
        }
        self.animations.insert(def.id.clone(), Arc::new(def))
    }

    pub fn insert_sequence(&mut self, def: SequenceDefinition) -> Option<Arc<SequenceDefinition>> {
        self.sequences.insert(def.id.clone(), Arc::new(def))
    }

    pub fn insert_vfx(&mut self, def: VfxDefinition) -> Option<Arc<VfxDefinition>> {
        self.vfx.insert(def.id.clone(), Arc::new(def))
    }

    pub fn animation(&self, id: &str) -> Option<Arc<AnimationDefinition>> {
        self.animations.get(id).cloned()
    }

    pub fn sequence(&self, id: &str) -> Option<Arc<SequenceDefinition>> {
        self.sequences.get(id).cloned()
    }

    pub fn vfx(&self, id: &str) -> Option<Arc<VfxDefinition>> {
        self.vfx.get(id).cloned()
    }

    /// Untyped lookup. Sequences shadow animations, which shadow VFX, when
    /// ids collide across tables.
    pub fn get(&self, id: &str) -> Option<DefinitionRef> {
        self.sequence(id)
            .map(DefinitionRef::Sequence)
            .or_else(|| self.animation(id).map(DefinitionRef::Animation))
            .or_else(|| self.vfx(id).map(DefinitionRef::Vfx))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.animations.contains_key(id) || self.sequences.contains_key(id) || self.vfx.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.animations.len() + self.sequences.len() + self.vfx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn animation_ids(&self) -> impl Iterator<Item = &str> {
        self.animations.keys().map(String::as_str)
    }

    pub fn sequence_ids(&self) -> impl Iterator<Item = &str> {
        self.sequences.keys().map(String::as_str)
    }
}
