//! shsyntax CLI - Parse bash scripts and report syntax errors
//!
//! Usage:
//!   shsyntax script.sh                 # Print diagnostics, exit 1 if any
//!   shsyntax -c 'export a=(1 2'        # Parse a command string
//!   shsyntax --format tree script.sh   # Dump the syntax tree
//!   shsyntax --format json script.sh   # Diagnostics and stats as JSON

use anyhow::{Context, Result, anyhow};
use clap::{Parser, ValueEnum};
use serde::Serialize;
use shsyntax::{Diagnostic, Parse, ParseStats, ParserOptions};
use std::fmt::Write as _;
use std::path::PathBuf;

/// Native stack for the parse thread. Guarded recursion is bounded by
/// `--max-depth`, but each level still costs several frames.
const PARSE_STACK_SIZE: usize = 256 * 1024 * 1024;

/// shsyntax - Error-tolerant bash parser
#[derive(Parser, Debug)]
#[command(name = "shsyntax")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Parse the given command string
    #[arg(short = 'c')]
    command: Option<String>,

    /// Script file to parse
    #[arg()]
    script: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Errors)]
    format: Format,

    /// Maximum nesting depth before a region is skipped
    #[arg(long, default_value_t = shsyntax::DEFAULT_MAX_DEPTH)]
    max_depth: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    /// One line per diagnostic
    Errors,
    /// Indented node and token listing
    Tree,
    /// Diagnostics and parse statistics as JSON
    Json,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    source: &'a str,
    diagnostics: Vec<Diagnostic>,
    stats: ParseStats,
}

fn main() -> Result<()> {
    #[cfg(feature = "logging")]
    init_logging();

    let args = Args::parse();
    let (name, script) = read_input(&args)?;
    let options = ParserOptions::new().max_depth(args.max_depth);
    let parse = parse_on_large_stack(script, options)?;

    print!("{}", render(&parse, args.format, &name)?);
    if parse.has_errors() {
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(feature = "logging")]
fn init_logging() {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Source name for messages and the script text.
fn read_input(args: &Args) -> Result<(String, String)> {
    if let Some(cmd) = &args.command {
        return Ok(("-c".to_string(), cmd.clone()));
    }
    if let Some(path) = &args.script {
        let script = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read script: {}", path.display()))?;
        return Ok((path.display().to_string(), script));
    }
    Err(anyhow!(
        "no input; usage: shsyntax -c 'command' or shsyntax script.sh"
    ))
}

fn parse_on_large_stack(script: String, options: ParserOptions) -> Result<Parse> {
    let handle = std::thread::Builder::new()
        .name("shsyntax-parse".to_string())
        .stack_size(PARSE_STACK_SIZE)
        .spawn(move || shsyntax::Parser::with_options(&script, options).parse())
        .context("Failed to spawn parser thread")?;
    let parse = handle
        .join()
        .map_err(|_| anyhow!("parser thread panicked"))?
        .context("Failed to parse script")?;
    Ok(parse)
}

fn render(parse: &Parse, format: Format, name: &str) -> Result<String> {
    let mut out = String::new();
    match format {
        Format::Errors => {
            for diagnostic in parse.diagnostics() {
                let _ = writeln!(out, "{name}:{diagnostic}");
            }
        }
        Format::Tree => out.push_str(&parse.tree().debug_dump()),
        Format::Json => {
            let report = JsonReport {
                source: name,
                diagnostics: parse.diagnostics(),
                stats: parse.stats(),
            };
            out = serde_json::to_string_pretty(&report).context("Failed to encode report")?;
            out.push('\n');
        }
    }
    Ok(out)
}
