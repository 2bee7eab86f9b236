//! # Ability Pipeline - Visual Ability Compiler
//!
//! **ability-pipeline** translates between the block programs that designers
//! build in a visual ability editor and the flat, ordered pipeline documents
//! the combat engine executes. A pipeline is a sequence of effect invocations
//! and gates; gates branch into `onPass` and `onFail` sub-sequences.
//!
//! ## Core Workflow
//!
//! 1.  **Populate the Registry**: Load the effect catalog and the creature, item and trigger lookups into a [`Registry`](registry::Registry), either from a [`RegistrySnapshot`](registry::RegistrySnapshot) or any [`RegistrySource`](registry::RegistrySource).
//! 2.  **Serialize**: Hand a visual program (anything implementing [`BlockSurface`](program::BlockSurface)) to a [`PipelineCompiler`](compiler::PipelineCompiler) to get a [`PipelineDocument`](pipeline::PipelineDocument).
//! 3.  **Validate**: Run the [`Validator`](validator::Validator) over a document before saving it. Errors block the save; warnings do not.
//! 4.  **Deserialize**: Rebuild a visual program from a stored document for editing.
//!
//! None of these steps fail on unknown block types or effect ids. Such nodes
//! are logged through `tracing` and skipped, because the registry can lag
//! behind live edits.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ability_pipeline::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let mut registry = Registry::new();
//!     registry.populate(RegistrySnapshot::from_file("data/registry.json")?)?;
//!
//!     let text = std::fs::read_to_string("data/fireball.json")?;
//!     let document = PipelineDocument::from_json(&text)?;
//!
//!     let report = Validator::new(&registry).validate(&document);
//!     println!("{}", ReportFormatter::format(&report));
//!
//!     let compiler = PipelineCompiler::new(&registry);
//!     let program = compiler.deserialize(&document);
//!     let again = compiler.serialize(&program);
//!     assert_eq!(again, document);
//!     Ok(())
//! }
//! ```

pub mod compiler;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod prelude;
pub mod program;
pub mod registry;
pub mod report;
pub mod schema;
pub mod session;
pub mod validator;
