//! # xml-shape Library
//!
//! Infers an approximate schema from a large corpus of XML documents: every file is
//! parsed into an element tree by a bounded worker pool, the trees are merged into
//! thread-safe per-path statistics, and the result is rendered as annotated pseudo-XML
//! with occurrence counts and an optionality guess.

pub mod attributes;
pub mod cli;
pub mod config;
pub mod dom;
pub mod elements;
pub mod error;
pub mod error_reporter;
pub mod file_discovery;
pub mod output;
pub mod parser;
pub mod pipeline;
pub mod printer;
pub mod scanner;

pub use attributes::Attributes;
pub use cli::{Cli, OutputFormat, VerbosityLevel};
pub use config::{Config, ConfigError, ConfigManager, EnvProvider, SystemEnvProvider};
pub use dom::{Document, Node};
pub use elements::{ElementSnapshot, ElementStat, Elements, ElementsSnapshot, is_optional};
pub use error::{ParseError, ShapeError};
pub use error_reporter::ErrorReporter;
pub use file_discovery::{Discovered, FileDiscovery};
pub use output::Output;
pub use parser::{parse_file, parse_reader, parse_str};
pub use pipeline::{
    EventCallback, FailurePolicy, FileOutcome, FileStatus, Pipeline, PipelineConfig,
    PipelineEvent, PipelineHandle, PipelineReport,
};
pub use printer::{print, render_json, render_schema, write_schema};
pub use scanner::{RunMetrics, ScanResults, ShapeScanner};
