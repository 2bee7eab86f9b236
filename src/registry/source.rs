use super::definition::{EffectDefinition, EntityKind, ReferenceEntity, RegistrySnapshot, Zone};
use crate::error::RegistryError;

/// The external data source the registry is populated from.
///
/// Implementations typically wrap a network client; the crate ships a
/// file-backed implementation for tooling and tests.
pub trait RegistrySource {
    fn list_effect_definitions(&self) -> Result<Vec<EffectDefinition>, RegistryError>;
    fn list_referenceable_entities(
        &self,
        kind: EntityKind,
    ) -> Result<Vec<ReferenceEntity>, RegistryError>;
    fn list_zones(&self) -> Result<Vec<Zone>, RegistryError>;
}

/// A `RegistrySource` backed by a snapshot JSON document.
#[derive(Debug, Clone, Default)]
pub struct JsonRegistrySource {
    data: RegistrySnapshot,
}

impl JsonRegistrySource {
    pub fn new(data: RegistrySnapshot) -> Self {
        Self { data }
    }

    pub fn from_json(json: &str) -> Result<Self, RegistryError> {
        RegistrySnapshot::from_json(json).map(Self::new)
    }

    pub fn from_file(path: &str) -> Result<Self, RegistryError> {
        RegistrySnapshot::from_file(path).map(Self::new)
    }
}

impl RegistrySource for JsonRegistrySource {
    fn list_effect_definitions(&self) -> Result<Vec<EffectDefinition>, RegistryError> {
        Ok(self.data.effects.clone())
    }

    fn list_referenceable_entities(
        &self,
        kind: EntityKind,
    ) -> Result<Vec<ReferenceEntity>, RegistryError> {
        Ok(self.data.entities(kind).to_vec())
    }

    fn list_zones(&self) -> Result<Vec<Zone>, RegistryError> {
        Ok(self.data.zones.clone())
    }
}
