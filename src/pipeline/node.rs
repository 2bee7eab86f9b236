use crate::schema::GateType;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Free-form node configuration, keyed by parameter name.
pub type Params = BTreeMap<String, Value>;

/// Gates always report a 100% chance; their own semantics decide branching.
pub const GATE_CHANCE_PCT: u8 = 100;
pub const DEFAULT_CHANCE_PCT: u8 = 100;

/// Combat events an effect can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    OnCast,
    OnHit,
    OnMiss,
    OnCrit,
    OnKill,
    OnTakeDamage,
    OnTick,
}

impl Trigger {
    pub const ALL: [Trigger; 7] = [
        Trigger::OnCast,
        Trigger::OnHit,
        Trigger::OnMiss,
        Trigger::OnCrit,
        Trigger::OnKill,
        Trigger::OnTakeDamage,
        Trigger::OnTick,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Trigger::OnCast => "on_cast",
            Trigger::OnHit => "on_hit",
            Trigger::OnMiss => "on_miss",
            Trigger::OnCrit => "on_crit",
            Trigger::OnKill => "on_kill",
            Trigger::OnTakeDamage => "on_take_damage",
            Trigger::OnTick => "on_tick",
        }
    }

    pub fn from_wire(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == name)
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Invocation of a registry effect with per-use parameter overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectInvocation {
    pub effect_id: u32,
    pub params: Params,
    pub order: u32,
    pub trigger: Option<Trigger>,
    pub chance_pct: u8,
}

/// A conditional node with explicit pass and fail sub-sequences.
#[derive(Debug, Clone, PartialEq)]
pub struct Gate {
    pub gate_type: GateType,
    pub params: Params,
    pub order: u32,
    pub on_pass: Vec<PipelineNode>,
    pub on_fail: Vec<PipelineNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PipelineNode {
    Effect(EffectInvocation),
    Gate(Gate),
}

impl PipelineNode {
    pub fn order(&self) -> u32 {
        match self {
            PipelineNode::Effect(e) => e.order,
            PipelineNode::Gate(g) => g.order,
        }
    }

    pub fn params(&self) -> &Params {
        match self {
            PipelineNode::Effect(e) => &e.params,
            PipelineNode::Gate(g) => &g.params,
        }
    }

    /// Number of nodes in this subtree, the node itself included.
    pub fn subtree_len(&self) -> usize {
        match self {
            PipelineNode::Effect(_) => 1,
            PipelineNode::Gate(g) => {
                1 + g
                    .on_pass
                    .iter()
                    .chain(&g.on_fail)
                    .map(PipelineNode::subtree_len)
                    .sum::<usize>()
            }
        }
    }

    /// Collects orders in depth-first order: the node, then `on_pass`, then `on_fail`.
    pub fn collect_orders(&self, out: &mut Vec<u32>) {
        out.push(self.order());
        if let PipelineNode::Gate(g) = self {
            for child in g.on_pass.iter().chain(&g.on_fail) {
                child.collect_orders(out);
            }
        }
    }
}
