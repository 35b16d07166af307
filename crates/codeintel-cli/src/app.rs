//! CLI argument definitions

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "codeintel")]
#[command(
    author,
    version,
    about = "Ingest repositories into AST-aware chunks and a static code graph"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "cli")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Ingest a local directory or git URL
    Ingest(IngestArgs),

    /// Show the chunks of one file
    Chunks(ChunksArgs),

    /// Show the graph triples of one file
    Graph(FileArgs),

    /// Classify files
    Classify(ClassifyArgs),

    /// List registered languages
    Languages,
}

#[derive(Args)]
pub struct IngestArgs {
    /// Directory path or repository URL
    pub source: String,

    /// Branch to clone or record
    #[arg(short, long)]
    pub branch: Option<String>,

    /// Database file
    #[arg(long, env = "CODEINTEL_DB")]
    pub db: Option<PathBuf>,

    /// Do not draw progress on stderr
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(Args)]
pub struct ChunksArgs {
    /// Source file
    pub file: PathBuf,

    /// Override the chunk token budget
    #[arg(long)]
    pub max_tokens: Option<usize>,

    /// Print chunk contents
    #[arg(long)]
    pub content: bool,
}

#[derive(Args)]
pub struct FileArgs {
    /// Source file
    pub file: PathBuf,
}

#[derive(Args)]
pub struct ClassifyArgs {
    /// Files to classify
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Cli,
    Json,
}
