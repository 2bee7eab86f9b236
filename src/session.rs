//! The editing loop around one ability's pipeline.
//!
//! A session keeps the current document and its text form in step. Program
//! edits always re-serialize; manual text edits only replace the document
//! when they parse, so a half-typed edit never loses the last good state.

use crate::compiler::PipelineCompiler;
use crate::config::CompilerConfig;
use crate::error::DocumentError;
use crate::pipeline::PipelineDocument;
use crate::program::{BlockSurface, VisualProgram};
use crate::registry::Registry;
use crate::validator::{ValidationReport, Validator};
use tracing::warn;

pub struct EditSession<'r> {
    compiler: PipelineCompiler<'r>,
    validator: Validator<'r>,
    document: PipelineDocument,
    text: String,
}

impl<'r> EditSession<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self::with_config(registry, CompilerConfig::default())
    }

    pub fn with_config(registry: &'r Registry, config: CompilerConfig) -> Self {
        let document = PipelineDocument::default();
        Self {
            compiler: PipelineCompiler::builder(registry)
                .with_config(config.clone())
                .build(),
            validator: Validator::new(registry).with_config(config),
            text: document.to_json(),
            document,
        }
    }

    /// Starts a session from a stored document.
    pub fn open(registry: &'r Registry, document: PipelineDocument) -> Self {
        let mut session = Self::new(registry);
        session.text = document.to_json();
        session.document = document;
        session
    }

    pub fn document(&self) -> &PipelineDocument {
        &self.document
    }

    /// The text of the last document that was accepted.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn compiler(&self) -> &PipelineCompiler<'r> {
        &self.compiler
    }

    /// Replaces the document with the serialization of an edited program.
    ///
    /// Before the registry loads, effect blocks carry the placeholder id and
    /// [`can_save`](Self::can_save) stays false until the program is applied
    /// again.
    pub fn apply_program<S: BlockSurface>(&mut self, program: &S) -> &PipelineDocument {
        self.document = self.compiler.serialize(program);
        self.text = self.document.to_json();
        &self.document
    }

    /// Accepts a manual edit of the document text.
    ///
    /// On a parse failure the error is returned and the previous document and
    /// text stay in place.
    pub fn apply_text(&mut self, text: &str) -> Result<&PipelineDocument, DocumentError> {
        match PipelineDocument::from_json(text) {
            Ok(document) => {
                self.document = document;
                self.text = text.to_string();
                Ok(&self.document)
            }
            Err(e) => {
                warn!(error = %e, "document edit rejected, keeping last good document");
                Err(e)
            }
        }
    }

    /// Rebuilds a visual program from the current document.
    pub fn load_program(&self) -> VisualProgram {
        self.compiler.deserialize(&self.document)
    }

    pub fn check_save(&self) -> ValidationReport {
        self.validator.validate(&self.document)
    }

    /// Saving is blocked by errors only.
    pub fn can_save(&self) -> bool {
        self.check_save().valid
    }
}
