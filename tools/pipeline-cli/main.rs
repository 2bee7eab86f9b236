use ability_pipeline::prelude::*;
use ability_pipeline::validator::LegacySchemaTable;
use clap::{Parser, Subcommand};
use std::fs;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Compiles, decompiles and validates ability pipelines
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the registry snapshot JSON file
    #[arg(short, long, global = true)]
    registry: Option<String>,

    /// Path to a compiler config JSON file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serialize a visual program into a pipeline document
    Compile {
        /// Path to the visual program JSON file
        program_path: String,
        /// Write the document here instead of stdout
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Rebuild a visual program from a pipeline document
    Decompile {
        /// Path to the pipeline document JSON file
        document_path: String,
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Validate a pipeline document
    Validate {
        /// Path to the pipeline document JSON file
        document_path: String,
        /// Also run the legacy schema table
        #[arg(long)]
        legacy: bool,
    },
    /// Compare the legacy schema table with the registry
    AuditLegacy,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => CompilerConfig::from_file(path).unwrap_or_else(|e| {
            exit_with_error(&format!("Failed to load config '{}': {}", path, e))
        }),
        None => CompilerConfig::default(),
    };
    let registry = load_registry(cli.registry.as_deref(), &config);

    match cli.command {
        Command::Compile {
            program_path,
            output,
        } => {
            let program = VisualProgram::from_json(&read_file(&program_path))
                .unwrap_or_else(|e| exit_with_error(&format!("Failed to parse program: {}", e)));
            let compiler = PipelineCompiler::builder(&registry)
                .with_config(config)
                .build();

            let start = Instant::now();
            let result = compiler.serialize_detailed(&program);
            eprintln!(
                "Serialized {} node(s), {} top-level, in {:?}",
                result.node_count(),
                result.document.len(),
                start.elapsed()
            );
            if !result.placeholders.is_empty() {
                eprintln!(
                    "  {} effect block(s) written with placeholder ids; load a registry",
                    result.placeholders.len()
                );
            }
            for skipped in &result.skipped {
                eprintln!(
                    "  skipped {} ({}): {}",
                    skipped.block,
                    skipped.type_tag.as_deref().unwrap_or("?"),
                    skipped.reason
                );
            }
            write_output(output.as_deref(), &result.document.to_json());
        }
        Command::Decompile {
            document_path,
            output,
        } => {
            let document = PipelineDocument::from_json(&read_file(&document_path))
                .unwrap_or_else(|e| exit_with_error(&format!("Failed to parse document: {}", e)));
            let compiler = PipelineCompiler::builder(&registry)
                .with_config(config)
                .build();
            let program = compiler.deserialize(&document);
            eprintln!("Rebuilt {} block(s)", program.len());
            write_output(output.as_deref(), &program.to_json());
        }
        Command::Validate {
            document_path,
            legacy,
        } => {
            let document = PipelineDocument::from_json(&read_file(&document_path))
                .unwrap_or_else(|e| exit_with_error(&format!("Failed to parse document: {}", e)));
            config.legacy_checks |= legacy;
            let report = Validator::new(&registry).with_config(config).validate(&document);
            println!("{}", ReportFormatter::format(&report));
            if !report.valid {
                std::process::exit(1);
            }
        }
        Command::AuditLegacy => {
            if !registry.is_ready() {
                exit_with_error("audit-legacy needs a populated registry (--registry)");
            }
            let found = LegacySchemaTable::default().audit(&registry);
            println!("{}", ReportFormatter::format_discrepancies(&found));
        }
    }
}

fn load_registry(path: Option<&str>, config: &CompilerConfig) -> Registry {
    let mut registry = Registry::new().with_placeholder_label(&config.placeholder_label);
    let Some(path) = path else {
        eprintln!("No registry provided. Effects will resolve as not loaded.");
        return registry;
    };
    let snapshot = RegistrySnapshot::from_file(path)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to load registry: {}", e)));
    registry
        .populate(snapshot)
        .unwrap_or_else(|e| exit_with_error(&format!("Invalid registry '{}': {}", path, e)));
    registry
}

fn read_file(path: &str) -> String {
    fs::read_to_string(path)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to read '{}': {}", path, e)))
}

fn write_output(path: Option<&str>, content: &str) {
    match path {
        Some(path) => fs::write(path, content)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to write '{}': {}", path, e))),
        None => println!("{}", content),
    }
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
