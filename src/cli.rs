use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Verbosity levels for output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum VerbosityLevel {
    /// Only show failures
    Quiet,
    /// Show standard information
    #[default]
    Normal,
    /// Show skip reasons and timings
    Verbose,
    /// Show all available debugging information
    Debug,
}

/// What to print on stdout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Annotated pseudo-XML schema sketch
    #[default]
    Schema,
    /// Aggregate tree as JSON
    Json,
    /// Run summary only
    Summary,
}

/// Infer the structure of a corpus of XML documents
#[derive(Parser, Debug, Clone)]
#[command(name = "xml-shape")]
#[command(about = "Infer an approximate schema from a corpus of XML documents")]
#[command(version)]
pub struct Cli {
    /// Files or directories to scan
    #[arg(required = true, help = "XML files or directories to scan")]
    pub paths: Vec<PathBuf>,

    /// Number of parsing workers
    #[arg(short = 'w', long = "workers", help = "Number of parallel parsing workers")]
    pub workers: Option<usize>,

    /// Parsed documents buffered per worker
    #[arg(
        short = 'p',
        long = "pipe-size",
        help = "Parsed documents buffered per worker"
    )]
    pub pipe_size: Option<usize>,

    /// Logical document root
    #[arg(
        short = 'r',
        long = "root-tag",
        help = "Aggregate the first element with this name instead of the document root"
    )]
    pub root_tag: Option<String>,

    /// Output format
    #[arg(short = 'f', long = "format", value_enum)]
    pub format: Option<OutputFormat>,

    /// File extensions to process (comma-separated)
    #[arg(
        short = 'e',
        long = "extensions",
        help = "File extensions to process in directories (e.g., 'xml,cmdi')"
    )]
    pub extensions: Option<String>,

    /// Include file patterns (glob syntax)
    #[arg(long = "include", action = clap::ArgAction::Append)]
    pub include_patterns: Vec<String>,

    /// Exclude file patterns (glob syntax)
    #[arg(long = "exclude", action = clap::ArgAction::Append)]
    pub exclude_patterns: Vec<String>,

    /// Maximum directory depth
    #[arg(long = "max-depth")]
    pub max_depth: Option<usize>,

    /// Follow symbolic links while walking directories
    #[arg(long = "follow-symlinks")]
    pub follow_symlinks: bool,

    /// Stop at the first unreadable or malformed file
    #[arg(long = "fail-fast")]
    pub fail_fast: bool,

    /// Show progress on stderr
    #[arg(long = "progress")]
    pub progress: bool,

    /// Prefix log lines with timestamps
    #[arg(long = "timestamps")]
    pub timestamps: bool,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose", help = "Enable verbose output")]
    pub verbose: bool,

    /// Enable quiet mode (failures only)
    #[arg(
        short = 'q',
        long = "quiet",
        help = "Quiet mode",
        conflicts_with = "verbose"
    )]
    pub quiet: bool,

    /// Configuration file
    #[arg(short = 'c', long = "config", help = "Configuration file (TOML or JSON)")]
    pub config: Option<PathBuf>,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Extensions from `--extensions`, if given
    pub fn get_extensions(&self) -> Option<Vec<String>> {
        self.extensions.as_deref().map(split_list)
    }
}

/// Split a comma-separated list, dropping blanks
pub(crate) fn split_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
