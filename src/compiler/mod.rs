use crate::config::CompilerConfig;
use crate::pipeline::{PipelineDocument, PipelineNode};
use crate::program::{BlockId, BlockSurface, VisualProgram};
use crate::registry::Registry;
use crate::schema::{CompositeRule, CompositeTable, FieldResolver};
use std::fmt;

mod deserializer;
mod serializer;

use deserializer::Deserializer;
use serializer::Serializer;

/// Why a block was left out of a serialized document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Neither the registry nor the gate table knows the type tag.
    UnknownType,
    /// The handle does not point at a block.
    MissingBlock,
    /// A gate branch leads back into a gate that is still being expanded.
    Cycle,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::UnknownType => write!(f, "unknown block type"),
            SkipReason::MissingBlock => write!(f, "missing block"),
            SkipReason::Cycle => write!(f, "branch loops back to an enclosing gate"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedBlock {
    pub block: BlockId,
    pub type_tag: Option<String>,
    pub reason: SkipReason,
}

/// A serialized document together with the typed tree and skip diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct Serialization {
    pub document: PipelineDocument,
    pub nodes: Vec<PipelineNode>,
    pub skipped: Vec<SkippedBlock>,
    /// Effect blocks written with the placeholder id because the registry
    /// was not loaded.
    pub placeholders: Vec<BlockId>,
}

impl Serialization {
    /// Nodes written to the document, branch nodes included.
    pub fn node_count(&self) -> usize {
        self.nodes.iter().map(PipelineNode::subtree_len).sum()
    }
}

/// Translates between visual programs and pipeline documents.
///
/// The compiler borrows the registry for its lifetime; it never mutates
/// either the registry or its inputs.
pub struct PipelineCompiler<'r> {
    registry: &'r Registry,
    rules: CompositeTable,
    config: CompilerConfig,
}

pub struct PipelineCompilerBuilder<'r> {
    registry: &'r Registry,
    rules: CompositeTable,
    config: CompilerConfig,
}

impl<'r> PipelineCompilerBuilder<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self {
            registry,
            rules: CompositeTable::new(),
            config: CompilerConfig::default(),
        }
    }

    pub fn with_config(mut self, config: CompilerConfig) -> Self {
        self.config = config;
        self
    }

    /// Adds a fold/unfold rule for blocks of `type_tag`, after the built-in ones.
    pub fn with_composite_rule(mut self, type_tag: &str, rule: Box<dyn CompositeRule>) -> Self {
        self.rules.insert(type_tag, rule);
        self
    }

    pub fn build(self) -> PipelineCompiler<'r> {
        PipelineCompiler {
            registry: self.registry,
            rules: self.rules,
            config: self.config,
        }
    }
}

impl<'r> PipelineCompiler<'r> {
    pub fn builder(registry: &'r Registry) -> PipelineCompilerBuilder<'r> {
        PipelineCompilerBuilder::new(registry)
    }

    /// A compiler with the built-in rules and the default config.
    pub fn new(registry: &'r Registry) -> Self {
        Self::builder(registry).build()
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    pub fn field_resolver(&self) -> FieldResolver<'_> {
        FieldResolver::new(self.registry, &self.rules)
    }

    /// Serializes every top-level chain of `program` into one document.
    pub fn serialize<S: BlockSurface>(&self, program: &S) -> PipelineDocument {
        self.serialize_detailed(program).document
    }

    /// Like [`serialize`](Self::serialize), also returning the typed tree and
    /// the blocks that were skipped or written as placeholders.
    pub fn serialize_detailed<S: BlockSurface>(&self, program: &S) -> Serialization {
        Serializer::new(program, self.registry, &self.rules).run()
    }

    /// Rebuilds a single-chain visual program from a document.
    pub fn deserialize(&self, document: &PipelineDocument) -> VisualProgram {
        let mut program = VisualProgram::new();
        self.deserialize_into(document, &mut program);
        program
    }

    /// Builds the document's blocks on an existing surface and returns the
    /// head of the new top-level chain, if any node could be resolved.
    pub fn deserialize_into<S: BlockSurface>(
        &self,
        document: &PipelineDocument,
        surface: &mut S,
    ) -> Option<BlockId> {
        let head = Deserializer::new(surface, self.registry, &self.rules).run(&document.nodes)?;
        surface.add_top_level_chain(head, self.config.layout_origin);
        Some(head)
    }
}
