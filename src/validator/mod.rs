//! Structural and schema validation of pipeline documents.
//!
//! Validation works on the loose wire form so that documents the typed tree
//! cannot represent (both kinds set, `chancePct` of 150, negative orders) are
//! still reported on rather than rejected outright.

use crate::config::CompilerConfig;
use crate::pipeline::{GATE_CHANCE_PCT, PipelineDocument, Trigger, WireNode};
use crate::registry::{EffectDefinition, EntityKind, PLACEHOLDER_EFFECT_ID, Registry};
use crate::schema::{CHANCE_FIELD, GateType, ON_FAIL, ON_PASS, TRIGGER_FIELD};
use ahash::AHashMap;
use serde_json::Value;

pub mod legacy;
pub mod report;

pub use legacy::{LegacyDiscrepancy, LegacySchema, LegacySchemaTable};
pub use report::{CheckSource, Finding, Severity, ValidationReport};

/// Checks documents against the structural rules and the registry schemas.
pub struct Validator<'r> {
    registry: &'r Registry,
    config: CompilerConfig,
    legacy: LegacySchemaTable,
}

impl<'r> Validator<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self {
            registry,
            config: CompilerConfig::default(),
            legacy: LegacySchemaTable::default(),
        }
    }

    pub fn with_config(mut self, config: CompilerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn legacy_table(&self) -> &LegacySchemaTable {
        &self.legacy
    }

    pub fn validate(&self, document: &PipelineDocument) -> ValidationReport {
        let mut pass = Pass {
            validator: self,
            findings: Vec::new(),
            seen_orders: AHashMap::new(),
        };

        if !self.registry.is_ready() {
            pass.push(
                Severity::Warning,
                CheckSource::Schema,
                "Document",
                None,
                "effect registry not loaded; parameter checks skipped".to_string(),
            );
        }

        for (i, node) in document.nodes.iter().enumerate() {
            pass.node(node, &format!("Effect[{}]", i));
        }

        ValidationReport::from_findings(pass.findings)
    }
}

/// State for one validation run.
struct Pass<'v, 'r> {
    validator: &'v Validator<'r>,
    findings: Vec<Finding>,
    seen_orders: AHashMap<i64, String>,
}

impl Pass<'_, '_> {
    fn push(
        &mut self,
        severity: Severity,
        source: CheckSource,
        path: &str,
        field: Option<&str>,
        message: String,
    ) {
        self.findings.push(Finding {
            severity,
            source,
            path: path.to_string(),
            field: field.map(str::to_string),
            message,
        });
    }

    fn error(&mut self, path: &str, field: Option<&str>, message: String) {
        self.push(Severity::Error, CheckSource::Structure, path, field, message);
    }

    fn warning(&mut self, path: &str, field: Option<&str>, message: String) {
        self.push(Severity::Warning, CheckSource::Structure, path, field, message);
    }

    fn node(&mut self, node: &WireNode, path: &str) {
        self.kind(node, path);
        self.common_fields(node, path);

        if node.gate_type.is_some() {
            self.gate(node, path);
        } else {
            self.effect(node, path);
        }

        if self.validator.config.legacy_checks {
            self.validator.legacy.check(node, path, &mut self.findings);
        }
    }

    fn kind(&mut self, node: &WireNode, path: &str) {
        match (node.effect_id, &node.gate_type) {
            (Some(_), Some(_)) => {
                self.error(path, None, "node sets both effectId and gateType".to_string())
            }
            (None, None) => {
                self.error(path, None, "node sets neither effectId nor gateType".to_string())
            }
            (Some(id), None) if id == i64::from(PLACEHOLDER_EFFECT_ID) => self.error(
                path,
                Some("effectId"),
                "effect was written while the registry was not loaded".to_string(),
            ),
            (Some(id), None) if id <= 0 => self.error(
                path,
                Some("effectId"),
                format!("effectId must be positive, found {}", id),
            ),
            (None, Some(gate)) if GateType::from_wire(gate).is_none() => self.error(
                path,
                Some("gateType"),
                format!("unknown gate type '{}'", gate),
            ),
            _ => {}
        }
    }

    fn common_fields(&mut self, node: &WireNode, path: &str) {
        if !(0..=100).contains(&node.chance_pct) {
            self.error(
                path,
                Some(CHANCE_FIELD),
                format!("chancePct must be between 0 and 100, found {}", node.chance_pct),
            );
        }

        if node.order < 0 {
            self.error(
                path,
                Some("order"),
                format!("order must be non-negative, found {}", node.order),
            );
        } else if let Some(first) = self.seen_orders.get(&node.order).cloned() {
            self.error(
                path,
                Some("order"),
                format!("order {} is already used by {}", node.order, first),
            );
        } else {
            self.seen_orders.insert(node.order, path.to_string());
        }
    }

    fn gate(&mut self, node: &WireNode, path: &str) {
        if node.trigger.is_some() {
            self.warning(
                path,
                Some(TRIGGER_FIELD),
                "trigger is ignored on gates".to_string(),
            );
        }
        if (0..=100).contains(&node.chance_pct) && node.chance_pct != GATE_CHANCE_PCT as i64 {
            self.warning(
                path,
                Some(CHANCE_FIELD),
                format!("gates always run; chancePct {} is ignored", node.chance_pct),
            );
        }

        for key in [ON_PASS, ON_FAIL] {
            let entries = match node.branch(key) {
                Ok(entries) => entries,
                Err(e) => {
                    self.error(path, Some(key), e.to_string());
                    continue;
                }
            };
            for (j, entry) in entries.into_iter().enumerate() {
                let child_path = format!("{}.{}[{}]", path, key, j);
                match entry {
                    Ok(child) => self.node(&child, &child_path),
                    Err(e) => self.error(&child_path, None, e.to_string()),
                }
            }
        }
    }

    fn effect(&mut self, node: &WireNode, path: &str) {
        if let Some(name) = &node.trigger {
            if Trigger::from_wire(name).is_none() {
                self.error(path, Some(TRIGGER_FIELD), format!("unknown trigger '{}'", name));
            }
        }
        for key in [ON_PASS, ON_FAIL] {
            if node.override_params.contains_key(key) {
                self.warning(
                    path,
                    Some(key),
                    "branches are ignored on effect nodes".to_string(),
                );
            }
        }

        let registry = self.validator.registry;
        if !registry.is_ready() {
            return;
        }
        let Some(id) = node
            .effect_id
            .and_then(|id| u32::try_from(id).ok())
            .filter(|id| *id > 0)
        else {
            return;
        };
        match registry.definition(id) {
            Some(definition) => self.parameters(node, path, definition),
            None => self.push(
                Severity::Warning,
                CheckSource::Schema,
                path,
                Some("effectId"),
                format!("effect id {} is not in the registry", id),
            ),
        }
    }

    fn parameters(&mut self, node: &WireNode, path: &str, definition: &EffectDefinition) {
        for (name, spec) in &definition.parameter_schema {
            match node.override_params.get(name) {
                None if spec.required => self.push(
                    Severity::Warning,
                    CheckSource::Schema,
                    path,
                    Some(name.as_str()),
                    format!(
                        "required parameter of '{}' is missing; the editor default applies",
                        definition.name
                    ),
                ),
                None => {}
                Some(value) => {
                    if let Err(reason) = spec.check(value) {
                        self.push(Severity::Error, CheckSource::Schema, path, Some(name.as_str()), reason);
                        continue;
                    }
                    if let Some(kind) = spec.reference {
                        self.reference(node, path, name, kind, value);
                    }
                }
            }
        }
    }

    /// Looks up `<stem>Id` together with its sibling `<stem>ZoneId`.
    fn reference(&mut self, node: &WireNode, path: &str, name: &str, kind: EntityKind, value: &Value) {
        let Some(stem) = name.strip_suffix("Id") else {
            return;
        };
        let zone = node
            .override_params
            .get(&format!("{}ZoneId", stem))
            .and_then(Value::as_i64);
        let (Some(zone), Some(id)) = (zone, value.as_i64()) else {
            return;
        };
        if self.validator.registry.reference(kind, zone, id).is_none() {
            self.push(
                Severity::Warning,
                CheckSource::Schema,
                path,
                Some(name),
                format!("{} {}:{} not found in the registry", kind, zone, id),
            );
        }
    }
}
