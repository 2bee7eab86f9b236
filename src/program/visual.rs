use super::{BlockId, BlockSurface};
use crate::error::ProgramError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A block instance: a type tag, its field values and its chain links.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    #[serde(rename = "type")]
    pub type_tag: String,
    #[serde(default)]
    pub fields: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub slots: BTreeMap<String, BlockId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<BlockId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<[f64; 2]>,
}

impl Block {
    fn new(type_tag: &str) -> Self {
        Self {
            type_tag: type_tag.to_string(),
            fields: BTreeMap::new(),
            slots: BTreeMap::new(),
            next: None,
            position: None,
        }
    }
}

/// An arena of blocks plus the heads of its top-level chains.
///
/// A `BlockId` is the block's index in `blocks`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VisualProgram {
    #[serde(default)]
    pub blocks: Vec<Block>,
    #[serde(default)]
    pub chains: Vec<BlockId>,
}

impl VisualProgram {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses the JSON form and rejects links to blocks that do not exist
    /// as well as links that loop.
    pub fn from_json(json: &str) -> Result<Self, ProgramError> {
        let program: VisualProgram =
            serde_json::from_str(json).map_err(|e| ProgramError::JsonParseError(e.to_string()))?;
        program.check_handles()?;
        program.check_cycles()?;
        Ok(program)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    pub fn block(&self, id: BlockId) -> Option<&Block> {
        self.blocks.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Type tags along the chain starting at `head`.
    pub fn chain_tags(&self, head: BlockId) -> Vec<&str> {
        self.walk_chain(head)
            .filter_map(|id| self.type_tag(id))
            .collect()
    }

    fn check_handles(&self) -> Result<(), ProgramError> {
        let exists = |id: BlockId| id.0 < self.blocks.len();
        for (i, head) in self.chains.iter().enumerate() {
            if !exists(*head) {
                return Err(ProgramError::DanglingHandle {
                    handle: head.0,
                    referenced_from: format!("chains[{}]", i),
                });
            }
        }
        for (i, block) in self.blocks.iter().enumerate() {
            let links = block
                .next
                .iter()
                .map(|n| (*n, "next".to_string()))
                .chain(block.slots.iter().map(|(slot, id)| (*id, slot.clone())));
            for (target, via) in links {
                if !exists(target) {
                    return Err(ProgramError::DanglingHandle {
                        handle: target.0,
                        referenced_from: format!("block #{} {}", i, via),
                    });
                }
            }
        }
        Ok(())
    }

    fn links(&self, index: usize) -> Vec<usize> {
        let block = &self.blocks[index];
        block
            .next
            .iter()
            .chain(block.slots.values())
            .map(|id| id.0)
            .collect()
    }

    /// Depth-first search over `next` and slot links. Expects every handle to
    /// exist.
    fn check_cycles(&self) -> Result<(), ProgramError> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            New,
            Open,
            Done,
        }

        let mut marks = vec![Mark::New; self.blocks.len()];
        for start in 0..self.blocks.len() {
            if marks[start] != Mark::New {
                continue;
            }
            marks[start] = Mark::Open;
            let mut stack = vec![(start, self.links(start))];
            while let Some((current, pending)) = stack.last_mut() {
                let current = *current;
                match pending.pop() {
                    Some(target) => match marks[target] {
                        Mark::New => {
                            marks[target] = Mark::Open;
                            stack.push((target, self.links(target)));
                        }
                        Mark::Open => return Err(ProgramError::LinkCycle { handle: target }),
                        Mark::Done => {}
                    },
                    None => {
                        marks[current] = Mark::Done;
                        stack.pop();
                    }
                }
            }
        }
        Ok(())
    }
}

impl BlockSurface for VisualProgram {
    fn new_chain_node(&mut self, type_tag: &str) -> BlockId {
        self.blocks.push(Block::new(type_tag));
        BlockId(self.blocks.len() - 1)
    }

    fn type_tag(&self, block: BlockId) -> Option<&str> {
        self.block(block).map(|b| b.type_tag.as_str())
    }

    fn field_value(&self, block: BlockId, name: &str) -> Option<&Value> {
        self.block(block)?.fields.get(name)
    }

    fn set_field_value(&mut self, block: BlockId, name: &str, value: Value) {
        if let Some(b) = self.blocks.get_mut(block.0) {
            b.fields.insert(name.to_string(), value);
        }
    }

    fn nested_chain_slot(&self, block: BlockId, slot: &str) -> Option<BlockId> {
        self.block(block)?.slots.get(slot).copied()
    }

    fn set_nested_chain_slot(&mut self, block: BlockId, slot: &str, head: BlockId) {
        if let Some(b) = self.blocks.get_mut(block.0) {
            b.slots.insert(slot.to_string(), head);
        }
    }

    fn connect_next(&mut self, from: BlockId, to: BlockId) {
        if let Some(b) = self.blocks.get_mut(from.0) {
            b.next = Some(to);
        }
    }

    fn next_block(&self, block: BlockId) -> Option<BlockId> {
        self.block(block)?.next
    }

    fn top_level_chains(&self) -> Vec<BlockId> {
        self.chains.clone()
    }

    fn add_top_level_chain(&mut self, head: BlockId, position: [f64; 2]) {
        if let Some(b) = self.blocks.get_mut(head.0) {
            b.position = Some(position);
        }
        self.chains.push(head);
    }
}
