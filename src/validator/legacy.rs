//! The legacy validation schema table.
//!
//! This table predates the registry and numbers effects independently of it.
//! It is kept as its own component: it never feeds field resolution, its
//! findings are warnings tagged as legacy, and [`LegacySchemaTable::audit`]
//! lists every place where it has drifted from the live registry.

use super::report::{CheckSource, Finding, Severity};
use crate::pipeline::WireNode;
use crate::registry::Registry;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegacySchema {
    pub id: u32,
    pub name: &'static str,
    pub required: &'static [&'static str],
}

const LEGACY_SCHEMAS: &[LegacySchema] = &[
    LegacySchema {
        id: 101,
        name: "damage",
        required: &["amount", "damageType"],
    },
    LegacySchema {
        id: 102,
        name: "heal",
        required: &["amount", "resource"],
    },
    LegacySchema {
        id: 103,
        name: "apply_status",
        required: &["status"],
    },
    LegacySchema {
        id: 104,
        name: "teleport",
        required: &["targetRoom"],
    },
    LegacySchema {
        id: 105,
        name: "summon",
        required: &["creatureZoneId", "creatureId"],
    },
];

/// Where the legacy table and the registry disagree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LegacyDiscrepancy {
    IdMismatch {
        name: String,
        legacy_id: u32,
        registry_id: u32,
    },
    MissingFromRegistry {
        name: String,
        legacy_id: u32,
    },
    MissingFromLegacy {
        name: String,
        registry_id: u32,
    },
}

impl fmt::Display for LegacyDiscrepancy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LegacyDiscrepancy::IdMismatch {
                name,
                legacy_id,
                registry_id,
            } => write!(
                f,
                "'{}' is #{} in the legacy table but #{} in the registry",
                name, legacy_id, registry_id
            ),
            LegacyDiscrepancy::MissingFromRegistry { name, legacy_id } => {
                write!(f, "legacy #{} '{}' has no registry definition", legacy_id, name)
            }
            LegacyDiscrepancy::MissingFromLegacy { name, registry_id } => {
                write!(f, "registry #{} '{}' has no legacy schema", registry_id, name)
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LegacySchemaTable {
    entries: &'static [LegacySchema],
}

impl Default for LegacySchemaTable {
    fn default() -> Self {
        Self {
            entries: LEGACY_SCHEMAS,
        }
    }
}

impl LegacySchemaTable {
    pub fn entries(&self) -> &'static [LegacySchema] {
        self.entries
    }

    pub fn by_id(&self, id: u32) -> Option<&'static LegacySchema> {
        self.entries.iter().find(|s| s.id == id)
    }

    /// Checks a node against the legacy entry with the same numeric id.
    pub(crate) fn check(&self, node: &WireNode, path: &str, out: &mut Vec<Finding>) {
        let Some(schema) = node
            .effect_id
            .and_then(|id| u32::try_from(id).ok())
            .and_then(|id| self.by_id(id))
        else {
            return;
        };
        for param in schema.required {
            if !node.override_params.contains_key(*param) {
                out.push(Finding {
                    severity: Severity::Warning,
                    source: CheckSource::Legacy,
                    path: path.to_string(),
                    field: Some(param.to_string()),
                    message: format!(
                        "legacy schema #{} '{}' requires this parameter",
                        schema.id, schema.name
                    ),
                });
            }
        }
    }

    /// Compares the table with the registry by effect name.
    ///
    /// Returns nothing while the registry is not ready.
    pub fn audit(&self, registry: &Registry) -> Vec<LegacyDiscrepancy> {
        if !registry.is_ready() {
            return Vec::new();
        }
        let mut found = Vec::new();
        for schema in self.entries {
            match registry.definition_by_name(schema.name) {
                Some(def) if def.id != schema.id => found.push(LegacyDiscrepancy::IdMismatch {
                    name: schema.name.to_string(),
                    legacy_id: schema.id,
                    registry_id: def.id,
                }),
                Some(_) => {}
                None => found.push(LegacyDiscrepancy::MissingFromRegistry {
                    name: schema.name.to_string(),
                    legacy_id: schema.id,
                }),
            }
        }
        for def in registry.definitions() {
            let name = def.name.to_lowercase();
            if !self.entries.iter().any(|s| s.name == name) {
                found.push(LegacyDiscrepancy::MissingFromLegacy {
                    name,
                    registry_id: def.id,
                });
            }
        }
        found
    }
}
