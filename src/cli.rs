use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "apisig")]
#[command(about = "Fingerprint the public API surface of a Python package")]
#[command(version)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Package to fingerprint when no subcommand is given (same as `print`)
    pub package: Option<String>,

    #[command(flatten)]
    pub source: SourceArgs,

    /// Increase log verbosity (-v for debug output)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Print one signature line per public symbol (default behavior)
    Print(PrintArgs),

    /// List what the package's export lists declare
    Scan(ScanArgs),

    /// Cross-check the attribute walk against the export lists
    Coverage(CoverageArgs),

    /// Save a fingerprint snapshot
    Snapshot(SnapshotArgs),

    /// Compare the current fingerprint against a saved snapshot
    Diff(DiffArgs),

    /// Generate a starter .apisig.toml configuration file
    Init(InitArgs),
}

/// Where the object graph comes from.
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// Directory containing the package, like a module search path entry
    #[arg(long, default_value = ".")]
    pub path: PathBuf,

    /// Read the object graph from a JSON manifest instead of source files
    #[arg(long)]
    pub manifest: Option<PathBuf>,

    /// Qualified names whose failures are not reported (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub skip: Vec<String>,
}

impl Default for SourceArgs {
    fn default() -> Self {
        Self {
            path: PathBuf::from("."),
            manifest: None,
            skip: Vec::new(),
        }
    }
}

#[derive(Parser, Debug, Clone)]
pub struct PrintArgs {
    /// Package to fingerprint
    pub package: String,

    #[command(flatten)]
    pub source: SourceArgs,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: PrintFormat,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Parser, Debug, Clone)]
pub struct ScanArgs {
    /// Package to scan
    pub package: String,

    #[command(flatten)]
    pub source: SourceArgs,

    /// Print the full index as JSON instead of canonical names
    #[arg(long)]
    pub json: bool,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Parser, Debug, Clone)]
pub struct CoverageArgs {
    /// Package to check
    pub package: String,

    #[command(flatten)]
    pub source: SourceArgs,

    /// Output format
    #[arg(short, long, default_value = "markdown")]
    pub format: OutputFormat,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Parser, Debug, Clone)]
pub struct SnapshotArgs {
    /// Package to fingerprint
    pub package: String,

    /// Save snapshot to this file
    #[arg(long)]
    pub save: PathBuf,

    #[command(flatten)]
    pub source: SourceArgs,
}

#[derive(Parser, Debug, Clone)]
pub struct DiffArgs {
    /// Baseline snapshot file to compare against
    pub baseline: PathBuf,

    /// Package to fingerprint
    pub package: String,

    #[command(flatten)]
    pub source: SourceArgs,

    /// Output format
    #[arg(short, long, default_value = "markdown")]
    pub format: OutputFormat,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Exit with error if symbols were removed since the baseline
    #[arg(long)]
    pub fail_on_removal: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct InitArgs {
    /// Path where to create .apisig.toml (defaults to current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum PrintFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Markdown,
    Json,
}
