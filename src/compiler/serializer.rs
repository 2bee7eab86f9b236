use super::{Serialization, SkipReason, SkippedBlock};
use crate::pipeline::{
    DEFAULT_CHANCE_PCT, EffectInvocation, Gate, Params, PipelineDocument, PipelineNode, Trigger,
};
use crate::program::{BlockId, BlockSurface};
use crate::registry::{EffectResolution, PLACEHOLDER_EFFECT_ID, Registry};
use crate::schema::{
    CHANCE_FIELD, CompositeTable, EFFECT_PREFIX, FieldResolver, FieldValues, GateType, ON_FAIL,
    ON_PASS, TRIGGER_FIELD, is_empty_sentinel, is_optional, is_reserved,
};
use ahash::AHashSet;
use serde_json::Value;
use tracing::{debug, warn};

enum BlockKind {
    Effect(u32),
    Gate(GateType),
}

/// Walks a visual program and produces the typed node tree.
///
/// One `order` counter is shared by the whole walk, branches included, so
/// orders are unique across the document and contiguous in depth-first order.
pub(super) struct Serializer<'a, S: BlockSurface> {
    surface: &'a S,
    registry: &'a Registry,
    rules: &'a CompositeTable,
    resolver: FieldResolver<'a>,
    counter: u32,
    /// Gates whose branches are currently being walked.
    expanding: AHashSet<BlockId>,
    skipped: Vec<SkippedBlock>,
    placeholders: Vec<BlockId>,
}

impl<'a, S: BlockSurface> Serializer<'a, S> {
    pub(super) fn new(surface: &'a S, registry: &'a Registry, rules: &'a CompositeTable) -> Self {
        Self {
            surface,
            registry,
            rules,
            resolver: FieldResolver::new(registry, rules),
            counter: 0,
            expanding: AHashSet::new(),
            skipped: Vec::new(),
            placeholders: Vec::new(),
        }
    }

    pub(super) fn run(mut self) -> Serialization {
        let mut nodes = Vec::new();
        for head in self.surface.top_level_chains() {
            nodes.extend(self.serialize_chain(head));
        }
        Serialization {
            document: PipelineDocument::from_nodes(&nodes),
            nodes,
            skipped: self.skipped,
            placeholders: self.placeholders,
        }
    }

    fn serialize_chain(&mut self, head: BlockId) -> Vec<PipelineNode> {
        let surface = self.surface;
        surface
            .walk_chain(head)
            .filter_map(|block| self.serialize_block(block))
            .collect()
    }

    fn serialize_block(&mut self, block: BlockId) -> Option<PipelineNode> {
        let surface = self.surface;
        let Some(tag) = surface.type_tag(block) else {
            self.skip(block, None, SkipReason::MissingBlock);
            return None;
        };
        let kind = self.resolve_kind(block, tag)?;
        let params = self.extract_params(block, tag);

        match kind {
            BlockKind::Effect(effect_id) => Some(PipelineNode::Effect(EffectInvocation {
                effect_id,
                params,
                order: self.next_order(),
                trigger: self.read_trigger(block),
                chance_pct: self.read_chance(block),
            })),
            BlockKind::Gate(gate_type) => {
                if !self.expanding.insert(block) {
                    let reason = SkipReason::Cycle;
                    warn!(block = %block, type_tag = tag, %reason, "block skipped");
                    self.skip(block, Some(tag), reason);
                    return None;
                }
                // The gate is numbered before anything inside its branches.
                let order = self.next_order();
                let on_pass = self.serialize_slot(block, ON_PASS);
                let on_fail = self.serialize_slot(block, ON_FAIL);
                self.expanding.remove(&block);
                Some(PipelineNode::Gate(Gate {
                    gate_type,
                    params,
                    order,
                    on_pass,
                    on_fail,
                }))
            }
        }
    }

    fn resolve_kind(&mut self, block: BlockId, tag: &str) -> Option<BlockKind> {
        let resolution = self.registry.effect_resolution(tag);
        if let EffectResolution::Found(id) = resolution {
            return Some(BlockKind::Effect(id));
        }
        if let Some(gate) = GateType::from_block_tag(tag) {
            return Some(BlockKind::Gate(gate));
        }
        if resolution == EffectResolution::NotLoaded && tag.starts_with(EFFECT_PREFIX) {
            debug!(block = %block, type_tag = tag, "registry not loaded, writing placeholder id");
            self.placeholders.push(block);
            return Some(BlockKind::Effect(PLACEHOLDER_EFFECT_ID));
        }

        let reason = SkipReason::UnknownType;
        warn!(block = %block, type_tag = tag, %reason, "block skipped");
        self.skip(block, Some(tag), reason);
        None
    }

    /// Reads the block's fields, drops empty optional ones and applies the
    /// composite folds for its type.
    fn extract_params(&self, block: BlockId, tag: &str) -> Params {
        let rules = self.rules.rules_for(tag);
        let rule_fields: AHashSet<&str> = rules.iter().flat_map(|r| r.ui_fields()).collect();

        let mut values = FieldValues::new();
        for name in self.resolver.field_names(tag) {
            if is_reserved(&name) {
                continue;
            }
            let Some(value) = self.surface.field_value(block, &name) else {
                continue;
            };
            if is_optional(tag, &name) && is_empty_sentinel(value) {
                continue;
            }
            values.insert(name, value.clone());
        }

        let mut params: Params = values
            .iter()
            .filter(|(name, _)| !rule_fields.contains(name.as_str()))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        for rule in rules {
            rule.fold(&values, &mut params);
        }
        params
    }

    fn serialize_slot(&mut self, block: BlockId, slot: &str) -> Vec<PipelineNode> {
        match self.surface.nested_chain_slot(block, slot) {
            Some(head) => self.serialize_chain(head),
            None => Vec::new(),
        }
    }

    fn read_trigger(&self, block: BlockId) -> Option<Trigger> {
        let name = self.surface.field_value(block, TRIGGER_FIELD)?.as_str()?;
        if name.is_empty() {
            return None;
        }
        let trigger = Trigger::from_wire(name);
        if trigger.is_none() {
            warn!(block = %block, trigger = name, "unknown trigger ignored");
        }
        trigger
    }

    fn read_chance(&self, block: BlockId) -> u8 {
        let value = self.surface.field_value(block, CHANCE_FIELD);
        let chance = match value {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        chance
            .map(|c| c.round().clamp(0.0, 100.0) as u8)
            .unwrap_or(DEFAULT_CHANCE_PCT)
    }

    fn next_order(&mut self) -> u32 {
        let order = self.counter;
        self.counter += 1;
        order
    }

    fn skip(&mut self, block: BlockId, type_tag: Option<&str>, reason: SkipReason) {
        self.skipped.push(SkippedBlock {
            block,
            type_tag: type_tag.map(str::to_string),
            reason,
        });
    }
}
