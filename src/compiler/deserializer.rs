use crate::pipeline::{Params, PipelineNode, WireNode};
use crate::program::{BlockId, BlockSurface};
use crate::registry::Registry;
use crate::schema::{
    CHANCE_FIELD, CompositeTable, FieldResolver, FieldValues, ON_FAIL, ON_PASS, TRIGGER_FIELD,
    is_reserved,
};
use ahash::AHashSet;
use itertools::Itertools;
use serde_json::Value;
use tracing::{debug, warn};

/// Rebuilds blocks on a surface from document nodes.
pub(super) struct Deserializer<'a, S: BlockSurface> {
    surface: &'a mut S,
    registry: &'a Registry,
    rules: &'a CompositeTable,
    resolver: FieldResolver<'a>,
}

impl<'a, S: BlockSurface> Deserializer<'a, S> {
    pub(super) fn new(
        surface: &'a mut S,
        registry: &'a Registry,
        rules: &'a CompositeTable,
    ) -> Self {
        Self {
            surface,
            registry,
            rules,
            resolver: FieldResolver::new(registry, rules),
        }
    }

    /// Builds every resolvable top-level node, links them into one chain and
    /// returns its head.
    pub(super) fn run(mut self, nodes: &[WireNode]) -> Option<BlockId> {
        let typed: Vec<PipelineNode> = nodes
            .iter()
            .filter_map(|wire| match PipelineNode::from_wire(wire) {
                Ok(node) => Some(node),
                Err(e) => {
                    warn!(order = wire.order, error = %e, "document node skipped");
                    None
                }
            })
            .collect();
        let blocks = self.build_sequence(&typed);
        self.surface.link_chain(&blocks)
    }

    /// Builds one sequence in ascending `order`; ties keep document order.
    fn build_sequence(&mut self, nodes: &[PipelineNode]) -> Vec<BlockId> {
        nodes
            .iter()
            .sorted_by_key(|node| node.order())
            .filter_map(|node| self.build_block(node))
            .collect()
    }

    fn build_block(&mut self, node: &PipelineNode) -> Option<BlockId> {
        let tag = match node {
            PipelineNode::Effect(effect) => match self.registry.effect_tag(effect.effect_id) {
                Some(tag) => tag.to_string(),
                None => {
                    warn!(
                        effect_id = effect.effect_id,
                        order = effect.order,
                        ready = self.registry.is_ready(),
                        "effect id not in registry, node skipped"
                    );
                    return None;
                }
            },
            PipelineNode::Gate(gate) => gate.gate_type.block_tag(),
        };

        let block = self.surface.new_chain_node(&tag);
        self.apply_params(block, &tag, node.params());

        match node {
            PipelineNode::Effect(effect) => {
                if let Some(trigger) = effect.trigger {
                    self.surface.set_field_value(
                        block,
                        TRIGGER_FIELD,
                        Value::String(trigger.as_str().to_string()),
                    );
                }
                self.surface
                    .set_field_value(block, CHANCE_FIELD, Value::from(effect.chance_pct));
            }
            PipelineNode::Gate(gate) => {
                for (slot, branch) in [(ON_PASS, &gate.on_pass), (ON_FAIL, &gate.on_fail)] {
                    let children = self.build_sequence(branch);
                    if let Some(head) = self.surface.link_chain(&children) {
                        self.surface.set_nested_chain_slot(block, slot, head);
                    }
                }
            }
        }
        Some(block)
    }

    /// Unfolds composite parameters and writes every listed field onto the block.
    fn apply_params(&mut self, block: BlockId, tag: &str, params: &Params) {
        let listed: AHashSet<String> = self.resolver.field_names(tag).into_iter().collect();

        let mut fields = FieldValues::new();
        let mut consumed = AHashSet::new();
        for rule in self.rules.rules_for(tag) {
            consumed.extend(rule.unfold(params, &mut fields));
        }

        for (key, value) in params {
            if consumed.contains(key) || is_reserved(key) {
                continue;
            }
            if listed.contains(key) {
                fields.insert(key.clone(), value.clone());
            } else {
                debug!(type_tag = tag, param = key.as_str(), "parameter not in field list, dropped");
            }
        }

        for (name, value) in fields {
            self.surface.set_field_value(block, &name, value);
        }
    }
}
