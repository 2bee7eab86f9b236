//! Field schema resolution.
//!
//! Answers "which named fields does a block of this type carry", combining
//! the registry's parameter schemas (effect blocks), a fixed table (gate
//! blocks) and the UI-only fields that composite rules fold into parameters.

use crate::registry::Registry;
use itertools::Itertools;

pub mod composite;
pub mod extras;
pub mod gates;

pub use composite::{CompositeRule, CompositeTable, FieldValues, JsonText, NestPair, SplitReference};
pub use extras::{is_empty_sentinel, is_optional, ui_extra_fields};
pub use gates::GateType;

pub const EFFECT_PREFIX: &str = "effect_";
pub const GATE_PREFIX: &str = "gate_";

/// Reserved parameter keys carrying gate branches on the wire.
pub const ON_PASS: &str = "onPass";
pub const ON_FAIL: &str = "onFail";

/// Dedicated block fields copied to and from node metadata.
pub const TRIGGER_FIELD: &str = "trigger";
pub const CHANCE_FIELD: &str = "chancePct";

/// Names that never travel through `overrideParams` as ordinary parameters.
pub fn is_reserved(name: &str) -> bool {
    matches!(name, ON_PASS | ON_FAIL | TRIGGER_FIELD | CHANCE_FIELD)
}

pub struct FieldResolver<'a> {
    registry: &'a Registry,
    rules: &'a CompositeTable,
}

impl<'a> FieldResolver<'a> {
    pub fn new(registry: &'a Registry, rules: &'a CompositeTable) -> Self {
        Self { registry, rules }
    }

    /// The ordered, de-duplicated field names for a block type.
    ///
    /// Unknown effect types resolve to their UI-only fields alone, which is
    /// usually nothing.
    pub fn field_names(&self, type_tag: &str) -> Vec<String> {
        let base: Vec<String> = match GateType::from_block_tag(type_tag) {
            Some(gate) => gate.fields().iter().map(|f| f.to_string()).collect(),
            None => {
                let name = type_tag
                    .strip_prefix(EFFECT_PREFIX)
                    .unwrap_or(type_tag)
                    .to_lowercase();
                self.registry
                    .definition_by_name(&name)
                    .map(|d| d.parameter_schema.keys().cloned().collect())
                    .unwrap_or_default()
            }
        };

        base.into_iter()
            .chain(ui_extra_fields(type_tag).iter().map(|f| f.to_string()))
            .chain(self.rules.ui_fields(type_tag).into_iter().map(str::to_string))
            .unique()
            .collect()
    }
}
