use super::node::{
    DEFAULT_CHANCE_PCT, EffectInvocation, GATE_CHANCE_PCT, Gate, Params, PipelineNode, Trigger,
};
use crate::error::DocumentError;
use crate::schema::{GateType, ON_FAIL, ON_PASS};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

fn default_chance_pct() -> i64 {
    DEFAULT_CHANCE_PCT as i64
}

/// One node exactly as it appears in the persisted document.
///
/// Fields are kept loose (signed integers, free strings) so that malformed
/// documents can still be read and reported on by the validator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effect_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gate_type: Option<String>,
    #[serde(default)]
    pub override_params: Map<String, Value>,
    pub order: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger: Option<String>,
    #[serde(default = "default_chance_pct")]
    pub chance_pct: i64,
}

impl WireNode {
    /// Reads the nodes stored under a branch key.
    ///
    /// The outer error means the key does not hold an array; the inner results
    /// report each array element separately.
    pub fn branch(&self, key: &str) -> Result<Vec<Result<WireNode, DocumentError>>, DocumentError> {
        match self.override_params.get(key) {
            None => Ok(Vec::new()),
            Some(Value::Array(items)) => Ok(items
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    serde_json::from_value::<WireNode>(item.clone()).map_err(|e| {
                        DocumentError::MalformedBranch {
                            key: format!("{}[{}]", key, i),
                            message: e.to_string(),
                        }
                    })
                })
                .collect()),
            Some(other) => Err(DocumentError::MalformedBranch {
                key: key.to_string(),
                message: format!("expected an array of nodes, found {}", other),
            }),
        }
    }
}

impl PipelineNode {
    /// Lowers a typed node into its wire form, moving branches into the
    /// reserved parameter keys. Empty branches are omitted.
    pub fn to_wire(&self) -> WireNode {
        match self {
            PipelineNode::Effect(effect) => WireNode {
                effect_id: Some(effect.effect_id as i64),
                gate_type: None,
                override_params: effect.params.clone().into_iter().collect(),
                order: effect.order as i64,
                trigger: effect.trigger.map(|t| t.as_str().to_string()),
                chance_pct: effect.chance_pct as i64,
            },
            PipelineNode::Gate(gate) => {
                let mut params: Map<String, Value> = gate.params.clone().into_iter().collect();
                for (key, branch) in [(ON_PASS, &gate.on_pass), (ON_FAIL, &gate.on_fail)] {
                    if !branch.is_empty() {
                        let nodes = branch
                            .iter()
                            .filter_map(|n| match serde_json::to_value(n.to_wire()) {
                                Ok(value) => Some(value),
                                Err(e) => {
                                    warn!(order = gate.order, branch = key, error = %e, "branch node not written");
                                    None
                                }
                            })
                            .collect();
                        params.insert(key.to_string(), Value::Array(nodes));
                    }
                }
                WireNode {
                    effect_id: None,
                    gate_type: Some(gate.gate_type.as_str().to_string()),
                    override_params: params,
                    order: gate.order as i64,
                    trigger: None,
                    chance_pct: GATE_CHANCE_PCT as i64,
                }
            }
        }
    }

    /// Lifts a wire node into the typed tree.
    ///
    /// Fails only when the node itself cannot be typed. Malformed branch
    /// entries, unknown triggers and out-of-range chances are logged and
    /// dropped or clamped so the rest of the node survives.
    pub fn from_wire(wire: &WireNode) -> Result<PipelineNode, DocumentError> {
        let order = u32::try_from(wire.order).map_err(|_| DocumentError::OrderOutOfRange(wire.order))?;

        match (wire.effect_id, &wire.gate_type) {
            (Some(effect_id), Some(gate_type)) => Err(DocumentError::AmbiguousKind {
                order: wire.order,
                effect_id,
                gate_type: gate_type.clone(),
            }),
            (None, None) => Err(DocumentError::MissingKind { order: wire.order }),
            (Some(effect_id), None) => {
                let effect_id = u32::try_from(effect_id)
                    .ok()
                    .filter(|id| *id > 0)
                    .ok_or(DocumentError::InvalidEffectId(effect_id))?;
                let trigger = wire.trigger.as_deref().and_then(|name| {
                    let trigger = Trigger::from_wire(name);
                    if trigger.is_none() {
                        warn!(trigger = name, order, "unknown trigger dropped");
                    }
                    trigger
                });
                Ok(PipelineNode::Effect(EffectInvocation {
                    effect_id,
                    params: plain_params(wire),
                    order,
                    trigger,
                    chance_pct: wire.chance_pct.clamp(0, 100) as u8,
                }))
            }
            (None, Some(gate_name)) => {
                let gate_type = GateType::from_wire(gate_name)
                    .ok_or_else(|| DocumentError::UnknownGateType(gate_name.clone()))?;
                Ok(PipelineNode::Gate(Gate {
                    gate_type,
                    params: plain_params(wire),
                    order,
                    on_pass: lift_branch(wire, ON_PASS),
                    on_fail: lift_branch(wire, ON_FAIL),
                }))
            }
        }
    }
}

/// The node's parameters without the reserved branch keys.
fn plain_params(wire: &WireNode) -> Params {
    wire.override_params
        .iter()
        .filter(|(k, _)| k.as_str() != ON_PASS && k.as_str() != ON_FAIL)
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

fn lift_branch(wire: &WireNode, key: &str) -> Vec<PipelineNode> {
    let entries = match wire.branch(key) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(order = wire.order, error = %e, "branch ignored");
            return Vec::new();
        }
    };
    entries
        .into_iter()
        .filter_map(|entry| match entry.and_then(|w| PipelineNode::from_wire(&w)) {
            Ok(node) => Some(node),
            Err(e) => {
                warn!(order = wire.order, branch = key, error = %e, "branch node skipped");
                None
            }
        })
        .collect()
}

/// The persisted, order-preserving array form of an ability's pipeline.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PipelineDocument {
    pub nodes: Vec<WireNode>,
}

impl PipelineDocument {
    pub fn new(nodes: Vec<WireNode>) -> Self {
        Self { nodes }
    }

    pub fn from_nodes(nodes: &[PipelineNode]) -> Self {
        Self::new(nodes.iter().map(PipelineNode::to_wire).collect())
    }

    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        serde_json::from_str(json).map_err(|e| DocumentError::JsonParseError(e.to_string()))
    }

    pub fn from_value(value: Value) -> Result<Self, DocumentError> {
        serde_json::from_value(value).map_err(|e| DocumentError::JsonParseError(e.to_string()))
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|e| {
            warn!(error = %e, "document could not be converted to JSON");
            Value::Array(Vec::new())
        })
    }

    /// Pretty-printed JSON text of the document.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|e| {
            warn!(error = %e, "document could not be written as JSON");
            String::new()
        })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Every `order` value in depth-first order (top-level node, its `onPass`
    /// nodes, then its `onFail` nodes). Malformed branch entries are skipped.
    pub fn depth_first_orders(&self) -> Vec<i64> {
        fn visit(node: &WireNode, out: &mut Vec<i64>) {
            out.push(node.order);
            for key in [ON_PASS, ON_FAIL] {
                for child in node.branch(key).unwrap_or_default().into_iter().flatten() {
                    visit(&child, out);
                }
            }
        }
        let mut out = Vec::new();
        for node in &self.nodes {
            visit(node, &mut out);
        }
        out
    }
}
