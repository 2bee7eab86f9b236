//! Prelude module for convenient imports
//!
//! This module re-exports the most commonly used types and traits from the
//! ability-pipeline crate.
//!
//! # Example
//!
//! ```rust,no_run
//! use ability_pipeline::prelude::*;
//!
//! # fn run_example() -> Result<()> {
//! let mut registry = Registry::new();
//! registry.populate(RegistrySnapshot::from_file("path/to/registry.json")?)?;
//!
//! let program = VisualProgram::from_json(&std::fs::read_to_string("path/to/program.json")?)?;
//! let mut session = EditSession::new(&registry);
//! session.apply_program(&program);
//!
//! if !session.can_save() {
//!     println!("{}", ReportFormatter::format(&session.check_save()));
//! }
//! # Ok(())
//! # }
//! ```

// Compilation
pub use crate::compiler::{PipelineCompiler, Serialization, SkipReason, SkippedBlock};
pub use crate::config::CompilerConfig;

// Documents and programs
pub use crate::pipeline::{
    EffectInvocation, Gate, PipelineDocument, PipelineNode, Trigger, WireNode,
};
pub use crate::program::{BlockId, BlockSurface, VisualProgram};

// Registry
pub use crate::registry::{
    EffectDefinition, EntityKind, ParamSpec, Registry, RegistrySnapshot, RegistrySource,
};
pub use crate::schema::GateType;

// Validation
pub use crate::report::ReportFormatter;
pub use crate::session::EditSession;
pub use crate::validator::{Finding, Severity, ValidationReport, Validator};

// Error types
pub use crate::error::{ConfigError, DocumentError, ProgramError, RegistryError};

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
