use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use treeform::{DecodeConfig, Decoder, ErrorCategory, Materializer, Selection, Strategy};

/// Files looked up in the working directory when no input is given
const DEFAULT_INPUTS: [&str; 4] = [
    "structure.json",
    "structure.yaml",
    "structure.yml",
    "structure.xml",
];

#[derive(Debug, Parser)]
#[command(
    name = "treeform",
    version,
    about = "Create a directory tree from a JSON/YAML/XML description"
)]
struct Args {
    /// Structure file (defaults to structure.{json,yaml,yml,xml})
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,
    /// Parse as this format instead of detecting it
    #[arg(short, long, value_enum)]
    format: Option<FormatArg>,
    /// Try JSON, XML, then YAML on the whole input instead of sniffing
    #[arg(long, conflicts_with = "format")]
    probe: bool,
    /// Build every top-level project, not only the first
    #[arg(short, long)]
    all: bool,
    /// Directory the projects are created in
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    output_dir: PathBuf,
    /// Suppress status output
    #[arg(short, long)]
    quiet: bool,
    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Debug, ValueEnum)]
enum FormatArg {
    Json,
    #[value(alias = "yml")]
    Yaml,
    Xml,
}

impl From<FormatArg> for treeform::Format {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Json => treeform::Format::Json,
            FormatArg::Yaml => treeform::Format::Yaml,
            FormatArg::Xml => treeform::Format::Xml,
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("no input given and none of {} found", DEFAULT_INPUTS.join(", "))]
struct MissingInput;

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(exit_code(&err))
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("TREEFORM_LOG").unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn run(args: &Args) -> Result<()> {
    let input = resolve_input(args.input.as_deref())?;
    let mut status = Status::new(args.quiet);

    let mut config = DecodeConfig::default();
    if let Some(format) = args.format.clone() {
        config = config.with_format(format.into());
    } else if args.probe {
        config = config.with_strategy(Strategy::Probe);
    }
    let decoded = Decoder::new(config)
        .decode_path(&input)
        .with_context(|| format!("failed to load structure from {}", input.display()))?;
    status.line(format_args!("Use: {}", input.display()))?;
    status.line(format_args!("Format: {}", decoded.format))?;

    let selection = if args.all {
        Selection::All
    } else {
        Selection::First
    };
    let reports = Materializer::default()
        .build_projects(&decoded.tree, &args.output_dir, selection)
        .context("failed to create structure")?;

    for report in reports {
        debug!(path = %report.path.display(), bytes = report.summary.bytes, "done");
        status.line(format_args!(
            "Structure '{}' created successfully!",
            report.name
        ))?;
    }
    Ok(())
}

fn resolve_input(input: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = input {
        return Ok(path.to_path_buf());
    }
    DEFAULT_INPUTS
        .iter()
        .map(PathBuf::from)
        .find(|candidate| candidate.is_file())
        .ok_or_else(|| MissingInput.into())
}

/// Status lines on stdout, silenced by `--quiet`
struct Status {
    quiet: bool,
    out: io::Stdout,
}

impl Status {
    fn new(quiet: bool) -> Self {
        Self {
            quiet,
            out: io::stdout(),
        }
    }

    fn line(&mut self, message: std::fmt::Arguments<'_>) -> Result<()> {
        if self.quiet {
            return Ok(());
        }
        writeln!(self.out, "{message}").context("failed to write stdout")
    }
}

fn exit_code(err: &anyhow::Error) -> u8 {
    for cause in err.chain() {
        if let Some(err) = cause.downcast_ref::<treeform::Error>() {
            return match err.category() {
                ErrorCategory::Input => 2,
                ErrorCategory::Format => 3,
                ErrorCategory::Syntax => 4,
                ErrorCategory::Shape => 5,
                ErrorCategory::Filesystem => 6,
            };
        }
        if cause.is::<MissingInput>() {
            return 2;
        }
    }
    1
}
