use super::GATE_PREFIX;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The conditional branch kinds the combat engine evaluates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateType {
    Check,
    Chance,
    SavingThrow,
    AttackRoll,
    Contest,
}

impl GateType {
    pub const ALL: [GateType; 5] = [
        GateType::Check,
        GateType::Chance,
        GateType::SavingThrow,
        GateType::AttackRoll,
        GateType::Contest,
    ];

    /// The wire name, as stored in a document's `gateType`.
    pub fn as_str(&self) -> &'static str {
        match self {
            GateType::Check => "check",
            GateType::Chance => "chance",
            GateType::SavingThrow => "saving_throw",
            GateType::AttackRoll => "attack_roll",
            GateType::Contest => "contest",
        }
    }

    pub fn from_wire(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|g| g.as_str() == name)
    }

    pub fn block_tag(&self) -> String {
        format!("{}{}", GATE_PREFIX, self.as_str())
    }

    pub fn from_block_tag(tag: &str) -> Option<Self> {
        tag.strip_prefix(GATE_PREFIX).and_then(Self::from_wire)
    }

    /// The fixed configuration fields a gate block of this kind carries.
    pub fn fields(&self) -> &'static [&'static str] {
        match self {
            GateType::Check => &["attribute", "comparison", "value"],
            GateType::Chance => &["percentage"],
            GateType::SavingThrow => &["saveType", "dc"],
            GateType::AttackRoll => &["attackBonus", "versus"],
            GateType::Contest => &["attackerStat", "defenderStat"],
        }
    }
}

impl fmt::Display for GateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
