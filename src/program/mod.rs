//! The visual-program interface.
//!
//! The editing surface owns block instances; the compiler only talks to it
//! through [`BlockSurface`] handles. [`VisualProgram`] is the in-memory
//! implementation used by tooling and tests.

use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use tracing::warn;

pub mod visual;

pub use visual::{Block, VisualProgram};

/// Opaque handle to a block instance on the editing surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(pub usize);

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

pub trait BlockSurface {
    fn new_chain_node(&mut self, type_tag: &str) -> BlockId;
    fn type_tag(&self, block: BlockId) -> Option<&str>;
    fn field_value(&self, block: BlockId, name: &str) -> Option<&Value>;
    fn set_field_value(&mut self, block: BlockId, name: &str, value: Value);
    fn nested_chain_slot(&self, block: BlockId, slot: &str) -> Option<BlockId>;
    fn set_nested_chain_slot(&mut self, block: BlockId, slot: &str, head: BlockId);
    fn connect_next(&mut self, from: BlockId, to: BlockId);
    fn next_block(&self, block: BlockId) -> Option<BlockId>;
    /// Heads of the independent top-level chains, in canvas order.
    fn top_level_chains(&self) -> Vec<BlockId>;
    fn add_top_level_chain(&mut self, head: BlockId, position: [f64; 2]);

    /// Lazily follows `next` links from `start`. Each call starts a fresh walk.
    fn walk_chain(&self, start: BlockId) -> ChainWalk<'_, Self>
    where
        Self: Sized,
    {
        ChainWalk::new(self, start)
    }

    /// Connects `blocks` in sequence and returns the head.
    fn link_chain(&mut self, blocks: &[BlockId]) -> Option<BlockId> {
        for pair in blocks.windows(2) {
            self.connect_next(pair[0], pair[1]);
        }
        blocks.first().copied()
    }
}

/// Iterator over one chain of blocks.
///
/// Stops early if a `next` link leads back to a block already visited.
pub struct ChainWalk<'a, S: BlockSurface> {
    surface: &'a S,
    next: Option<BlockId>,
    seen: AHashSet<BlockId>,
}

impl<'a, S: BlockSurface> ChainWalk<'a, S> {
    pub fn new(surface: &'a S, start: BlockId) -> Self {
        Self {
            surface,
            next: Some(start),
            seen: AHashSet::new(),
        }
    }
}

impl<S: BlockSurface> Iterator for ChainWalk<'_, S> {
    type Item = BlockId;

    fn next(&mut self) -> Option<BlockId> {
        let current = self.next.take()?;
        if !self.seen.insert(current) {
            warn!(block = %current, "chain loops back on itself, walk stopped");
            return None;
        }
        self.next = self.surface.next_block(current);
        Some(current)
    }
}
