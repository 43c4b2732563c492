//! Command-line interface for NTD
//! Runs the editor assistance engine against a file on disk, for scripting and debugging.
//!
//! Usage:
//!   ntd complete `<path>` --at `<line:col>` [--trigger `<char>`]   - Completion candidates as JSON
//!   ntd hover `<path>` --at `<line:col>`                          - Hover documentation as JSON
//!   ntd normalize `<path>`                                      - Text as the classifier sees it
//!   ntd schema [--format json|yaml|text]                        - Dump the grammar tables
//!
//! Positions are 1-based, as editors display them.

use clap::{Arg, ArgMatches, Command};
use ntd_analysis::grammar::{FamilySpec, SectionSpec, GRAMMAR_VERSION};
use ntd_analysis::{normalize, Engine, Position, Registry, TriggerKind, TRIGGER_CHARACTERS};
use ntd_config::{Loader, NtdConfig};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Error)]
enum CliError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid position `{0}`: expected <line>:<column>, both starting at 1")]
    InvalidPosition(String),
    #[error("invalid trigger `{0}`: expected one of = , (")]
    InvalidTrigger(String),
    #[error("configuration error: {0}")]
    Config(#[from] ntd_config::ConfigError),
    #[error(transparent)]
    Engine(#[from] ntd_analysis::EngineError),
    #[error("cannot serialize output: {0}")]
    Json(#[from] serde_json::Error),
    #[error("cannot serialize output: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("unsupported schema format `{0}`: expected json, yaml or text")]
    Format(String),
}

fn main() {
    let matches = build_cli().get_matches();
    if let Err(err) = run(&matches) {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn build_cli() -> Command {
    let path = Arg::new("path")
        .help("Path to the NTD description")
        .required(true)
        .index(1);
    let at = Arg::new("at")
        .long("at")
        .short('a')
        .help("Cursor position as <line>:<column> (1-based)")
        .required(true);

    Command::new("ntd")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Completion and hover assistance for NTD network topology descriptions")
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .help("Configuration file layered over the built-in defaults"),
        )
        .subcommand(
            Command::new("complete")
                .about("Print completion candidates at a position")
                .arg(path.clone())
                .arg(at.clone())
                .arg(
                    Arg::new("trigger")
                        .long("trigger")
                        .short('t')
                        .help("Trigger character that started the request (=, , or ()"),
                ),
        )
        .subcommand(
            Command::new("hover")
                .about("Print hover documentation at a position")
                .arg(path.clone())
                .arg(at),
        )
        .subcommand(
            Command::new("normalize")
                .about("Print the description with comments and whitespace removed")
                .arg(path),
        )
        .subcommand(
            Command::new("schema")
                .about("Dump the grammar tables")
                .arg(
                    Arg::new("format")
                        .long("format")
                        .short('f')
                        .help("Output format: json, yaml or text")
                        .default_value("text"),
                ),
        )
}

fn run(matches: &ArgMatches) -> Result<(), CliError> {
    let config = load_config(matches.get_one::<String>("config"))?;
    init_logging(&config);

    match matches.subcommand() {
        Some(("complete", sub)) => handle_complete(&config, sub),
        Some(("hover", sub)) => handle_hover(&config, sub),
        Some(("normalize", sub)) => {
            let text = read_source(required(sub, "path"))?;
            println!("{}", normalize(&text));
            Ok(())
        }
        Some(("schema", sub)) => handle_schema(required(sub, "format")),
        _ => Ok(()),
    }
}

fn required<'m>(matches: &'m ArgMatches, id: &str) -> &'m str {
    matches
        .get_one::<String>(id)
        .map(String::as_str)
        .unwrap_or_default()
}

fn load_config(path: Option<&String>) -> Result<NtdConfig, CliError> {
    let mut loader = Loader::new();
    if let Some(path) = path {
        loader = loader.with_file(path);
    }
    Ok(loader.build()?)
}

fn init_logging(config: &NtdConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn engine(config: &NtdConfig) -> Result<Engine, CliError> {
    Ok(Engine::new(
        Arc::new(Registry::standard()),
        config.engine_options(),
    )?)
}

fn read_source(path: &str) -> Result<String, CliError> {
    std::fs::read_to_string(Path::new(path)).map_err(|source| CliError::Io {
        path: PathBuf::from(path),
        source,
    })
}

/// Parse a 1-based `line:column` pair.
fn parse_position(raw: &str) -> Result<Position, CliError> {
    let invalid = || CliError::InvalidPosition(raw.to_string());
    let (line, column) = raw.split_once(':').ok_or_else(invalid)?;
    let line: usize = line.trim().parse().map_err(|_| invalid())?;
    let column: usize = column.trim().parse().map_err(|_| invalid())?;
    if line == 0 || column == 0 {
        return Err(invalid());
    }
    Ok(Position::from_one_based(line, column))
}

fn parse_trigger(raw: Option<&String>) -> Result<TriggerKind, CliError> {
    let Some(raw) = raw else {
        return Ok(TriggerKind::Invoked);
    };
    let mut chars = raw.chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) if TRIGGER_CHARACTERS.contains(&ch) => Ok(TriggerKind::Character(ch)),
        _ => Err(CliError::InvalidTrigger(raw.clone())),
    }
}

fn handle_complete(config: &NtdConfig, matches: &ArgMatches) -> Result<(), CliError> {
    let position = parse_position(required(matches, "at"))?;
    let trigger = parse_trigger(matches.get_one::<String>("trigger"))?;
    let text = read_source(required(matches, "path"))?;
    let items = engine(config)?.complete(&text, position, trigger);
    tracing::debug!(count = items.len(), %position, "completion finished");
    println!("{}", serde_json::to_string_pretty(&items)?);
    Ok(())
}

fn handle_hover(config: &NtdConfig, matches: &ArgMatches) -> Result<(), CliError> {
    let position = parse_position(required(matches, "at"))?;
    let text = read_source(required(matches, "path"))?;
    let result = engine(config)?.hover(&text, position);
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

#[derive(Serialize)]
struct SchemaDump<'a> {
    version: &'a str,
    sections: &'a [SectionSpec],
    functions: &'a [FamilySpec],
}

fn handle_schema(format: &str) -> Result<(), CliError> {
    let registry = Registry::standard();
    let dump = SchemaDump {
        version: GRAMMAR_VERSION,
        sections: registry.sections(),
        functions: registry.families(),
    };
    let rendered = match format {
        "json" => serde_json::to_string_pretty(&dump)?,
        "yaml" => serde_yaml::to_string(&dump)?,
        "text" => render_schema_text(&dump),
        other => return Err(CliError::Format(other.to_string())),
    };
    print!("{rendered}");
    if !rendered.ends_with('\n') {
        println!();
    }
    Ok(())
}

fn render_schema_text(dump: &SchemaDump<'_>) -> String {
    let mut out = format!("NTD grammar {}\n", dump.version);
    let containers = dump
        .sections
        .iter()
        .map(|section| (section.code.as_str(), section.name, section.kinds))
        .chain(
            dump.functions
                .iter()
                .map(|family| (family.code.as_str(), family.name, family.kinds)),
        );
    for (code, name, kinds) in containers {
        out.push_str(&format!("\n{code}  {name}\n"));
        for kind in kinds {
            let selector = kind
                .discriminator
                .map(|d| format!(" [{}={}]", d.key, d.value))
                .unwrap_or_default();
            out.push_str(&format!("  {}{selector}\n", kind.name));
            for field in kind.fields {
                let default = field
                    .formatted_default()
                    .map(|value| format!(" = {value}"))
                    .unwrap_or_default();
                out.push_str(&format!("    {}  {}{default}\n", field.name, field.detail));
            }
            for slot in kind.function_slots {
                out.push_str(&format!("    {}  (function)\n", slot.as_str()));
            }
        }
    }
    out
}
