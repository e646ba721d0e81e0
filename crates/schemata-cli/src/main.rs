//! # schemata-cli
//!
//! Command-line front end for decoding and encoding JSON values against
//! schema documents.

mod config;

use anyhow::{Context, Result};
use clap::{Args, Parser, ValueEnum};
use schemata_ast::{ErrorsMode, OnExcessProperty, ParseOptions, SchemaLoader};
use schemata_parse::{ParseReporter, ReportFormat};
use schemata_value::Value;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "schemata")]
#[command(about = "Decode and encode JSON values against schema documents")]
#[command(version)]
struct Cli {
    /// Path to a parse options file (YAML or JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Parser)]
enum Commands {
    /// Decode an input value into its domain shape
    Decode(ParseArgs),

    /// Encode a domain value back into its input shape
    Encode(ParseArgs),
}

#[derive(Args)]
struct ParseArgs {
    /// Input JSON file, or `-` for stdin
    input: PathBuf,

    /// Schema document path
    #[arg(short, long)]
    schema: PathBuf,

    /// Definition to use instead of the document root
    #[arg(short, long)]
    root: Option<String>,

    /// Report every error instead of stopping at the first
    #[arg(long)]
    all_errors: bool,

    /// Policy for object members the schema does not declare
    #[arg(long, value_enum)]
    on_excess_property: Option<ExcessProperty>,

    /// Report absent required properties as missing
    #[arg(long)]
    exact: bool,

    /// Error output layout
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Tree)]
    format: OutputFormat,
}

#[derive(Clone, Copy, ValueEnum)]
enum ExcessProperty {
    Ignore,
    Error,
    Preserve,
}

impl From<ExcessProperty> for OnExcessProperty {
    fn from(value: ExcessProperty) -> Self {
        match value {
            ExcessProperty::Ignore => OnExcessProperty::Ignore,
            ExcessProperty::Error => OnExcessProperty::Error,
            ExcessProperty::Preserve => OnExcessProperty::Preserve,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Tree,
    Flat,
}

impl From<OutputFormat> for ReportFormat {
    fn from(value: OutputFormat) -> Self {
        match value {
            OutputFormat::Tree => ReportFormat::Tree,
            OutputFormat::Flat => ReportFormat::Flat,
        }
    }
}

#[derive(Clone, Copy)]
enum Mode {
    Decode,
    Encode,
}

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let (mode, args) = match cli.command {
        Commands::Decode(args) => (Mode::Decode, args),
        Commands::Encode(args) => (Mode::Encode, args),
    };

    match run(mode, &args, cli.config.as_deref()).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(2)
        }
    }
}

/// Returns whether parsing succeeded
async fn run(mode: Mode, args: &ParseArgs, config: Option<&Path>) -> Result<bool> {
    let options = resolve_options(args, config)?;

    let loader = SchemaLoader::default();
    let root = loader
        .load_from_file(&args.schema)
        .with_context(|| format!("Failed to load schema {}", args.schema.display()))?;
    let schema = match &args.root {
        Some(name) => loader
            .registry()
            .get(name)
            .with_context(|| format!("No definition named {name} in {}", args.schema.display()))?,
        None => root.with_context(|| {
            format!(
                "{} has no root; pick a definition with --root",
                args.schema.display()
            )
        })?,
    };

    let input = read_input(&args.input)?;

    let result = match mode {
        Mode::Decode => {
            tracing::info!("Decoding {} against {}", args.input.display(), args.schema.display());
            schemata_parse::decode_async(&schema, &input, options).await
        }
        Mode::Encode => {
            tracing::info!("Encoding {} against {}", args.input.display(), args.schema.display());
            schemata_parse::encode_async(&schema, &input, options).await
        }
    };

    match result {
        Ok(value) => {
            println!("{}", value.to_json_string_pretty()?);
            Ok(true)
        }
        Err(failure) => {
            let reporter = ParseReporter::new().with_format(args.format.into());
            eprintln!("{}", reporter.report(&failure));
            Ok(false)
        }
    }
}

/// Config file values, overridden by command-line flags
fn resolve_options(args: &ParseArgs, config: Option<&Path>) -> Result<ParseOptions> {
    let mut options = match config {
        Some(path) => config::load_options(path)?,
        None => ParseOptions::default(),
    };
    if args.all_errors {
        options = options.with_errors(ErrorsMode::All);
    }
    if let Some(policy) = args.on_excess_property {
        options = options.with_on_excess_property(policy.into());
    }
    if args.exact {
        options = options.with_exact(true);
    }
    Ok(options)
}

fn read_input(path: &Path) -> Result<Value> {
    let content = if path.as_os_str() == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read stdin")?;
        buffer
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read input {}", path.display()))?
    };
    let json: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("Input {} is not valid JSON", path.display()))?;
    Ok(Value::from(json))
}
