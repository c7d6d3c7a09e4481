use blockport::prelude::*;
use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::fs;
use std::sync::Arc;
use std::time::Instant;

/// Export CMS block content for translation and merge translations back
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Optional path to an engine configuration JSON file
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Log engine decisions (repeat for more detail)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a block content file and print its tree as JSON
    Parse {
        /// Path to the raw content file
        content_path: String,
    },
    /// List the lockable block paths of an entity fields JSON file
    Paths {
        /// Path to the entity fields JSON file
        fields_path: String,
    },
    /// Render an entity into an exchange XML document
    Export {
        /// Path to the source entity fields JSON file
        fields_path: String,
        #[arg(long, default_value = "en")]
        source_locale: String,
        #[arg(long, default_value = "de")]
        target_locale: String,
        /// Write the XML here instead of stdout
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Merge a translated exchange XML document onto a target entity
    Import {
        /// Path to the translated exchange XML file
        xml_path: String,
        /// Path to the source entity fields JSON file
        #[arg(long)]
        source: String,
        /// Path to the current target entity fields JSON file
        #[arg(long)]
        target: Option<String>,
        /// Locked path, e.g. `entity/post_content/blocks/1` or `meta/subtitle`
        #[arg(long = "lock")]
        locks: Vec<String>,
        /// Remove target metadata keys the translation does not carry
        #[arg(long)]
        clean_metadata: bool,
        /// JSON file of identifier mappings: `{"attachment": {"17": "42"}}`
        #[arg(long)]
        mappings: Option<String>,
        #[arg(long, default_value = "en")]
        source_locale: String,
        #[arg(long, default_value = "de")]
        target_locale: String,
        /// Write the merged fields JSON here instead of stdout
        #[arg(short, long)]
        output: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match &cli.config {
        Some(path) => EngineConfig::from_file(path)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to load configuration: {}", e))),
        None => EngineConfig::default(),
    };

    match cli.command {
        Command::Parse { content_path } => run_parse(config, &content_path),
        Command::Paths { fields_path } => run_paths(config, &fields_path),
        Command::Export {
            fields_path,
            source_locale,
            target_locale,
            output,
        } => {
            let ctx = SubmissionContext::new(&source_locale, &target_locale);
            run_export(config, &fields_path, &ctx, output)
        }
        Command::Import {
            xml_path,
            source,
            target,
            locks,
            clean_metadata,
            mappings,
            source_locale,
            target_locale,
            output,
        } => {
            let ctx = SubmissionContext::new(&source_locale, &target_locale)
                .with_locked_paths(locks)
                .with_clean_metadata(clean_metadata);
            run_import(config, &xml_path, &source, target, mappings, &ctx, output)
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn build_engine(config: EngineConfig, resolver: Option<MapResolver>) -> TranslationEngine {
    let builder = TranslationEngine::builder(config);
    let builder = match resolver {
        Some(resolver) => builder.with_resolver(Arc::new(resolver)),
        None => builder,
    };
    builder
        .build()
        .unwrap_or_else(|e| exit_with_error(&format!("Invalid engine configuration: {}", e)))
}

fn run_parse(config: EngineConfig, content_path: &str) {
    let raw = fs::read(content_path).unwrap_or_else(|e| {
        exit_with_error(&format!("Failed to read content file '{}': {}", content_path, e))
    });
    let parser = BlockParser::new().with_max_depth(config.max_depth);
    let mut diagnostics = Diagnostics::new();
    let blocks = parser
        .parse_bytes(&raw, &mut diagnostics)
        .unwrap_or_else(|e| exit_with_error(&format!("Parse failed: {}", e)));

    let json = serde_json::to_string_pretty(&blocks)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to render block tree: {}", e)));
    println!("{}", json);
    eprintln!("{} top-level blocks, recoveries: {}", blocks.len(), diagnostics);
}

fn run_paths(config: EngineConfig, fields_path: &str) {
    let fields = load_fields(fields_path);
    let engine = build_engine(config, None);
    let paths = engine
        .lockable_paths(&fields)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to list paths: {}", e)));
    for (path, name) in paths {
        println!("{}\t{}", path, name);
    }
}

fn run_export(config: EngineConfig, fields_path: &str, ctx: &SubmissionContext, output: Option<String>) {
    let start = Instant::now();
    let source = load_fields(fields_path);
    let engine = build_engine(config, None);

    let export = engine
        .export(&source, ctx)
        .unwrap_or_else(|e| exit_with_error(&format!("Export failed: {}", e)));
    let xml = export
        .document
        .to_xml()
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to write XML: {}", e)));
    write_output(output, &xml);

    eprintln!(
        "Exported {} fields in {:?}, recoveries: {}",
        export.document.fields.len(),
        start.elapsed(),
        export.diagnostics
    );
}

fn run_import(
    config: EngineConfig,
    xml_path: &str,
    source_path: &str,
    target_path: Option<String>,
    mappings_path: Option<String>,
    ctx: &SubmissionContext,
    output: Option<String>,
) {
    let start = Instant::now();
    let xml = fs::read_to_string(xml_path).unwrap_or_else(|e| {
        exit_with_error(&format!("Failed to read exchange file '{}': {}", xml_path, e))
    });
    let source = load_fields(source_path);
    let target = target_path
        .map(|path| load_fields(&path))
        .unwrap_or_default();
    let resolver = mappings_path.map(|path| load_mappings(&path));
    let engine = build_engine(config, resolver);

    let outcome = engine
        .import(&xml, &source, &target, ctx)
        .unwrap_or_else(|e| exit_with_error(&format!("Import failed: {}", e)));
    let json = serde_json::to_string_pretty(&outcome.fields)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to render fields: {}", e)));
    write_output(output, &json);

    if !outcome.removed_meta.is_empty() {
        eprintln!("Removed metadata keys: {}", outcome.removed_meta.join(", "));
    }
    eprintln!("Imported in {:?}, recoveries: {}", start.elapsed(), outcome.diagnostics);
}

fn load_fields(path: &str) -> EntityFields {
    EntityFields::from_file(path)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to load entity fields from '{}': {}", path, e)))
}

fn load_mappings(path: &str) -> MapResolver {
    let json = fs::read_to_string(path)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to read mappings file '{}': {}", path, e)));
    let table: BTreeMap<String, BTreeMap<String, String>> = serde_json::from_str(&json)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to parse mappings JSON: {}", e)));

    let mut resolver = MapResolver::new();
    for (entity_type, ids) in &table {
        for (source_id, target_id) in ids {
            resolver.insert(entity_type, source_id, target_id);
        }
    }
    resolver
}

fn write_output(output: Option<String>, content: &str) {
    match output {
        Some(path) => fs::write(&path, content)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to write '{}': {}", path, e))),
        None => println!("{}", content),
    }
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
