//! The effect schema registry.
//!
//! The registry holds the catalog of effect definitions plus the creature,
//! item, trigger and zone lookup tables. It is explicit state: callers create
//! one, `populate` it when the backing data arrives, `clear` it when the
//! editing session ends, and pass it by reference to the compiler and the
//! validator. Every `populate` installs a fresh snapshot and rebuilds the
//! id/tag index, so repeated loads never accumulate stale entries.

use crate::error::RegistryError;
use crate::schema::EFFECT_PREFIX;
use ahash::AHashMap;
use std::sync::Arc;
use tracing::info;

pub mod definition;
pub mod source;

pub use definition::*;
pub use source::*;

/// Effect id reported for placeholder entries while the registry is empty.
pub const PLACEHOLDER_EFFECT_ID: u32 = 0;
/// Type tag of the single palette entry offered while the registry is empty.
pub const PLACEHOLDER_EFFECT_TAG: &str = "effect_not_loaded";

/// Outcome of resolving an effect block's type tag against the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectResolution {
    Found(u32),
    /// The registry has no data yet; the tag may become resolvable later.
    NotLoaded,
    Unknown,
}

/// A palette entry for the editor's effect dropdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectOption {
    pub id: u32,
    pub label: String,
    pub type_tag: String,
}

/// Two-way lookup between effect ids and block type tags.
#[derive(Debug, Default)]
struct TagIndex {
    tag_by_id: AHashMap<u32, String>,
    id_by_tag: AHashMap<String, u32>,
    position_by_id: AHashMap<u32, usize>,
}

impl TagIndex {
    fn build(effects: &[EffectDefinition]) -> Self {
        let mut index = TagIndex::default();
        for (position, effect) in effects.iter().enumerate() {
            let tag = effect.type_tag();
            index.id_by_tag.insert(tag.clone(), effect.id);
            index.tag_by_id.insert(effect.id, tag);
            index.position_by_id.insert(effect.id, position);
        }
        index
    }
}

#[derive(Debug)]
struct Loaded {
    snapshot: RegistrySnapshot,
    index: TagIndex,
}

#[derive(Debug, Clone)]
pub struct Registry {
    loaded: Option<Arc<Loaded>>,
    placeholder_label: String,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Creates an empty, not-yet-ready registry.
    pub fn new() -> Self {
        Self {
            loaded: None,
            placeholder_label: crate::config::CompilerConfig::default().placeholder_label,
        }
    }

    pub fn with_placeholder_label(mut self, label: &str) -> Self {
        self.placeholder_label = label.to_string();
        self
    }

    /// Installs a snapshot, replacing whatever was there before.
    pub fn populate(&mut self, snapshot: RegistrySnapshot) -> Result<(), RegistryError> {
        snapshot.validate()?;
        let index = TagIndex::build(&snapshot.effects);
        info!(
            effects = snapshot.effects.len(),
            zones = snapshot.zones.len(),
            "registry snapshot installed"
        );
        self.loaded = Some(Arc::new(Loaded { snapshot, index }));
        Ok(())
    }

    /// Reads every table from `source` and installs the result as one snapshot.
    pub fn populate_from(&mut self, source: &dyn RegistrySource) -> Result<(), RegistryError> {
        let snapshot = RegistrySnapshot {
            effects: source.list_effect_definitions()?,
            creatures: source.list_referenceable_entities(EntityKind::Creature)?,
            items: source.list_referenceable_entities(EntityKind::Item)?,
            triggers: source.list_referenceable_entities(EntityKind::Trigger)?,
            zones: source.list_zones()?,
        };
        self.populate(snapshot)
    }

    pub fn clear(&mut self) {
        if self.loaded.take().is_some() {
            info!("registry snapshot cleared");
        }
    }

    /// True once a snapshot with at least one effect definition is installed.
    pub fn is_ready(&self) -> bool {
        self.loaded
            .as_ref()
            .is_some_and(|l| !l.snapshot.effects.is_empty())
    }

    pub fn snapshot(&self) -> Option<&RegistrySnapshot> {
        self.loaded.as_ref().map(|l| &l.snapshot)
    }

    pub fn definitions(&self) -> &[EffectDefinition] {
        self.snapshot().map(|s| s.effects.as_slice()).unwrap_or(&[])
    }

    pub fn definition(&self, effect_id: u32) -> Option<&EffectDefinition> {
        let loaded = self.loaded.as_ref()?;
        let position = loaded.index.position_by_id.get(&effect_id)?;
        loaded.snapshot.effects.get(*position)
    }

    /// Case-insensitive lookup by effect name.
    pub fn definition_by_name(&self, name: &str) -> Option<&EffectDefinition> {
        let tag = format!("{}{}", EFFECT_PREFIX, name.to_lowercase());
        let id = self.loaded.as_ref()?.index.id_by_tag.get(&tag)?;
        self.definition(*id)
    }

    /// Maps an effect block type tag to its effect id.
    pub fn effect_resolution(&self, type_tag: &str) -> EffectResolution {
        if !self.is_ready() {
            return EffectResolution::NotLoaded;
        }
        match self
            .loaded
            .as_ref()
            .and_then(|l| l.index.id_by_tag.get(type_tag))
        {
            Some(id) => EffectResolution::Found(*id),
            None => EffectResolution::Unknown,
        }
    }

    /// Maps an effect id back to its block type tag.
    pub fn effect_tag(&self, effect_id: u32) -> Option<&str> {
        self.loaded
            .as_ref()?
            .index
            .tag_by_id
            .get(&effect_id)
            .map(String::as_str)
    }

    /// The display name of an effect, or the placeholder label while not loaded.
    pub fn display_label(&self, effect_id: u32) -> String {
        if !self.is_ready() {
            return self.placeholder_label.clone();
        }
        self.definition(effect_id)
            .map(|d| d.name.clone())
            .unwrap_or_else(|| format!("Unknown effect #{}", effect_id))
    }

    /// Palette entries for the effect dropdown.
    pub fn effect_options(&self) -> Vec<EffectOption> {
        if !self.is_ready() {
            return vec![EffectOption {
                id: PLACEHOLDER_EFFECT_ID,
                label: self.placeholder_label.clone(),
                type_tag: PLACEHOLDER_EFFECT_TAG.to_string(),
            }];
        }
        self.definitions()
            .iter()
            .map(|d| EffectOption {
                id: d.id,
                label: d.name.clone(),
                type_tag: d.type_tag(),
            })
            .collect()
    }

    pub fn reference(&self, kind: EntityKind, zone_id: i64, id: i64) -> Option<&ReferenceEntity> {
        self.snapshot()?
            .entities(kind)
            .iter()
            .find(|e| e.zone_id == zone_id && e.id == id)
    }

    /// Dropdown entries for a reference field as `(value, label)`, where
    /// `value` is the combined `zone:id` form.
    pub fn reference_options(&self, kind: EntityKind) -> Vec<(String, String)> {
        let Some(snapshot) = self.snapshot() else {
            return Vec::new();
        };
        snapshot
            .entities(kind)
            .iter()
            .map(|e| {
                let value = format!("{}:{}", e.zone_id, e.id);
                let label = format!("{} {}", value, e.name);
                (value, label)
            })
            .collect()
    }

    pub fn zone(&self, zone_id: i64) -> Option<&Zone> {
        self.snapshot()?.zones.iter().find(|z| z.id == zone_id)
    }
}
