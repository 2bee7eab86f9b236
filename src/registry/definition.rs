use crate::error::RegistryError;
use crate::schema::EFFECT_PREFIX;
use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;

/// A catalog entry describing one effect the combat engine understands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectDefinition {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub parameter_schema: BTreeMap<String, ParamSpec>,
}

impl EffectDefinition {
    /// The block type tag the editor uses for this effect, e.g. `effect_heal`.
    pub fn type_tag(&self) -> String {
        format!("{}{}", EFFECT_PREFIX, self.name.to_lowercase())
    }
}

/// The declared shape of a single effect parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    #[default]
    Any,
    String,
    Integer,
    Number,
    Boolean,
    Dice,
    Enum,
    Object,
    Array,
    Reference,
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParamKind::Any => "any",
            ParamKind::String => "string",
            ParamKind::Integer => "integer",
            ParamKind::Number => "number",
            ParamKind::Boolean => "boolean",
            ParamKind::Dice => "dice",
            ParamKind::Enum => "enum",
            ParamKind::Object => "object",
            ParamKind::Array => "array",
            ParamKind::Reference => "reference",
        };
        write!(f, "{}", name)
    }
}

/// Schema for one named parameter, possibly with nested fields.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParamSpec {
    #[serde(rename = "type")]
    pub kind: ParamKind,
    pub required: bool,
    pub default: Option<Value>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub options: Vec<String>,
    pub fields: BTreeMap<String, ParamSpec>,
    pub reference: Option<EntityKind>,
}

impl ParamSpec {
    /// Runs the declared type and range validator against a value.
    ///
    /// Returns a human-readable reason on failure.
    pub fn check(&self, value: &Value) -> Result<(), String> {
        let type_ok = match self.kind {
            ParamKind::Any => true,
            ParamKind::String | ParamKind::Enum => value.is_string(),
            ParamKind::Integer | ParamKind::Reference => is_integral(value),
            ParamKind::Number => value.is_number(),
            ParamKind::Boolean => value.is_boolean(),
            ParamKind::Dice => match value {
                Value::String(s) => is_dice_expression(s),
                other => is_integral(other),
            },
            ParamKind::Object => value.is_object(),
            ParamKind::Array => value.is_array(),
        };
        if !type_ok {
            return Err(format!("expected {}, found {}", self.kind, value));
        }

        if let Some(n) = value.as_f64() {
            if let Some(min) = self.min {
                if n < min {
                    return Err(format!("value {} is below the minimum {}", value, min));
                }
            }
            if let Some(max) = self.max {
                if n > max {
                    return Err(format!("value {} is above the maximum {}", value, max));
                }
            }
        }

        if !self.options.is_empty() {
            if let Some(s) = value.as_str() {
                if !self.options.iter().any(|o| o == s) {
                    return Err(format!(
                        "'{}' is not one of [{}]",
                        s,
                        self.options.join(", ")
                    ));
                }
            }
        }

        if let (ParamKind::Object, Some(map)) = (self.kind, value.as_object()) {
            for (name, spec) in &self.fields {
                match map.get(name) {
                    Some(inner) => spec.check(inner).map_err(|e| format!("{}: {}", name, e))?,
                    None if spec.required => {
                        return Err(format!("missing required field '{}'", name));
                    }
                    None => {}
                }
            }
        }

        Ok(())
    }
}

fn is_integral(value: &Value) -> bool {
    value.is_i64() || value.is_u64() || value.as_f64().is_some_and(|n| n.fract() == 0.0)
}

/// Accepts `NdM`, `NdM+K`, `NdM-K`, `dM` and plain integers.
pub fn is_dice_expression(expr: &str) -> bool {
    let expr = expr.trim();
    if expr.parse::<i64>().is_ok() {
        return true;
    }

    let Some((count, rest)) = expr.split_once(['d', 'D']) else {
        return false;
    };
    if !count.is_empty() && count.parse::<u32>().is_err() {
        return false;
    }

    let (sides, modifier) = match rest.find(['+', '-']) {
        Some(pos) => (&rest[..pos], Some(&rest[pos + 1..])),
        None => (rest, None),
    };
    let sides_ok = sides.parse::<u32>().is_ok_and(|s| s > 0);
    let modifier_ok = modifier.is_none_or(|m| m.parse::<u32>().is_ok());
    sides_ok && modifier_ok
}

/// Categories of cross-referenceable game entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Creature,
    Item,
    Trigger,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Creature => write!(f, "creature"),
            EntityKind::Item => write!(f, "item"),
            EntityKind::Trigger => write!(f, "trigger"),
        }
    }
}

/// A creature, item or trigger addressed by `zone:id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceEntity {
    pub zone_id: i64,
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    pub id: i64,
    pub name: String,
}

/// A complete, immutable copy of the registry's backing data.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrySnapshot {
    pub effects: Vec<EffectDefinition>,
    pub creatures: Vec<ReferenceEntity>,
    pub items: Vec<ReferenceEntity>,
    pub triggers: Vec<ReferenceEntity>,
    pub zones: Vec<Zone>,
}

impl RegistrySnapshot {
    pub fn from_json(json: &str) -> Result<Self, RegistryError> {
        serde_json::from_str(json).map_err(|e| RegistryError::LoadError(e.to_string()))
    }

    /// Load a snapshot from a JSON file.
    pub fn from_file(path: &str) -> Result<Self, RegistryError> {
        let content = fs::read_to_string(path)
            .map_err(|e| RegistryError::LoadError(format!("'{}': {}", path, e)))?;
        Self::from_json(&content)
    }

    pub fn entities(&self, kind: EntityKind) -> &[ReferenceEntity] {
        match kind {
            EntityKind::Creature => &self.creatures,
            EntityKind::Item => &self.items,
            EntityKind::Trigger => &self.triggers,
        }
    }

    /// Rejects snapshots whose effect ids or names would make tag lookups ambiguous.
    pub fn validate(&self) -> Result<(), RegistryError> {
        let mut ids = AHashSet::new();
        let mut names = AHashSet::new();
        for effect in &self.effects {
            if effect.id == 0 {
                return Err(RegistryError::InvalidEffectId {
                    name: effect.name.clone(),
                    id: effect.id,
                });
            }
            if !ids.insert(effect.id) {
                return Err(RegistryError::DuplicateEffectId(effect.id));
            }
            if !names.insert(effect.name.to_lowercase()) {
                return Err(RegistryError::DuplicateEffectName(effect.name.clone()));
            }
        }
        Ok(())
    }
}
