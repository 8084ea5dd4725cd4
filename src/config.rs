use crate::cli::{Cli, OutputFormat, VerbosityLevel, split_list};
use crate::file_discovery::FileDiscovery;
use crate::pipeline::{DEFAULT_PIPE_SIZE, FailurePolicy, PipelineConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Upper bound on the worker pool
pub const MAX_WORKERS: usize = 1024;

const CONFIG_NAMES: [&str; 4] = [
    "xml-shape.toml",
    "xml-shape.json",
    ".xml-shape.toml",
    ".xml-shape.json",
];

/// Trait for abstracting environment variable access
pub trait EnvProvider {
    fn get(&self, key: &str) -> Option<String>;
}

/// System environment variable provider for production use
pub struct SystemEnvProvider;

impl EnvProvider for SystemEnvProvider {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParsing(#[from] toml::de::Error),

    #[error("JSON parsing error: {0}")]
    JsonParsing(#[from] serde_json::Error),

    #[error("Configuration validation error: {0}")]
    Validation(String),

    #[error("Environment variable error: {0}")]
    Environment(String),

    #[error("Unsupported configuration file format: {0}")]
    UnsupportedFormat(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub pipeline: PipelineSection,
    pub output: OutputSection,
    pub files: FileSection,
}

/// Worker pool and document selection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineSection {
    /// Parsing workers (None = CPU count)
    pub workers: Option<usize>,
    /// Parsed documents buffered per worker
    pub pipe_size: usize,
    /// Logical document root
    pub root_tag: Option<String>,
    /// Stop at the first failed file
    pub fail_fast: bool,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct OutputSection {
    pub format: OutputFormat,
    pub verbose: bool,
    /// Failures only
    pub quiet: bool,
    /// Include error chains in skip reports
    pub debug: bool,
    pub timestamps: bool,
    pub progress: bool,
}

/// File discovery configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FileSection {
    /// File extensions to process
    pub extensions: Vec<String>,
    /// Include patterns (glob syntax)
    pub include_patterns: Vec<String>,
    /// Exclude patterns (glob syntax)
    pub exclude_patterns: Vec<String>,
    pub max_depth: Option<usize>,
    pub follow_symlinks: bool,
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self {
            workers: None,
            pipe_size: DEFAULT_PIPE_SIZE,
            root_tag: None,
            fail_fast: false,
        }
    }
}

impl Default for FileSection {
    fn default() -> Self {
        Self {
            extensions: vec!["xml".to_string()],
            include_patterns: vec![],
            exclude_patterns: vec![],
            max_depth: None,
            follow_symlinks: false,
        }
    }
}

impl Config {
    /// Effective worker count
    pub fn worker_count(&self) -> usize {
        self.pipeline.workers.unwrap_or_else(num_cpus::get)
    }

    pub fn verbosity(&self) -> VerbosityLevel {
        if self.output.quiet {
            VerbosityLevel::Quiet
        } else if self.output.debug {
            VerbosityLevel::Debug
        } else if self.output.verbose {
            VerbosityLevel::Verbose
        } else {
            VerbosityLevel::Normal
        }
    }

    pub fn failure_policy(&self) -> FailurePolicy {
        if self.pipeline.fail_fast {
            FailurePolicy::FailFast
        } else {
            FailurePolicy::SkipAndContinue
        }
    }

    /// Pipeline settings; the output channel holds `workers * (pipe_size + 1)` roots
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig::with_pipe_size(self.worker_count(), self.pipeline.pipe_size)
            .with_root_tag(self.pipeline.root_tag.clone())
            .with_failure_policy(self.failure_policy())
    }

    /// Directory walker built from the file section
    pub fn file_discovery(&self) -> crate::error::Result<FileDiscovery> {
        FileDiscovery::new()
            .with_extensions(self.files.extensions.clone())
            .with_max_depth(self.files.max_depth)
            .with_follow_symlinks(self.files.follow_symlinks)
            .with_include_patterns(self.files.include_patterns.clone())?
            .with_exclude_patterns(self.files.exclude_patterns.clone())
    }
}

/// Configuration manager for loading and merging configurations
pub struct ConfigManager;

impl ConfigManager {
    /// Load configuration with precedence: defaults -> file -> environment -> CLI
    pub async fn load_config(cli: &Cli) -> Result<Config> {
        Self::load_config_with(cli, &SystemEnvProvider).await
    }

    /// [`ConfigManager::load_config`] with a custom environment provider
    pub async fn load_config_with(cli: &Cli, env: &impl EnvProvider) -> Result<Config> {
        // Sections default field by field, so a partial file is already merged.
        let config = match &cli.config {
            Some(path) => Self::load_from_file(path).await?,
            None => Self::find_config_file().await?.unwrap_or_default(),
        };

        let config = Self::apply_environment_overrides_with(env, config)?;
        let config = Self::merge_with_cli(config, cli);

        Self::validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from a file (TOML or JSON)
    pub async fn load_from_file(path: &Path) -> Result<Config> {
        let content = tokio::fs::read_to_string(path).await?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(toml::from_str(&content)?),
            Some("json") => Ok(serde_json::from_str(&content)?),
            Some(ext) => Err(ConfigError::UnsupportedFormat(ext.to_string())),
            None => match toml::from_str::<Config>(&content) {
                Ok(config) => Ok(config),
                Err(_) => Ok(serde_json::from_str(&content)?),
            },
        }
    }

    /// Look for a configuration file in the current directory, then the user config directory
    pub async fn find_config_file() -> Result<Option<Config>> {
        let mut candidates: Vec<PathBuf> = CONFIG_NAMES.iter().map(PathBuf::from).collect();
        if let Some(config_dir) = dirs::config_dir() {
            let app_dir = config_dir.join("xml-shape");
            candidates.extend(CONFIG_NAMES.iter().map(|name| app_dir.join(name)));
        }

        for path in candidates {
            if tokio::fs::try_exists(&path).await.unwrap_or(false) {
                return Ok(Some(Self::load_from_file(&path).await?));
            }
        }

        Ok(None)
    }

    /// Apply environment variable overrides using the system environment
    pub fn apply_environment_overrides(config: Config) -> Result<Config> {
        Self::apply_environment_overrides_with(&SystemEnvProvider, config)
    }

    /// Apply environment variable overrides with a custom environment provider
    pub fn apply_environment_overrides_with(
        env: &impl EnvProvider,
        mut config: Config,
    ) -> Result<Config> {
        if let Some(workers) = env.get("XML_SHAPE_WORKERS") {
            config.pipeline.workers = Some(parse_env("XML_SHAPE_WORKERS", &workers)?);
        }

        if let Some(pipe_size) = env.get("XML_SHAPE_PIPE_SIZE") {
            config.pipeline.pipe_size = parse_env("XML_SHAPE_PIPE_SIZE", &pipe_size)?;
        }

        if let Some(root_tag) = env.get("XML_SHAPE_ROOT_TAG") {
            config.pipeline.root_tag = Some(root_tag);
        }

        if let Some(fail_fast) = env.get("XML_SHAPE_FAIL_FAST") {
            config.pipeline.fail_fast = parse_env("XML_SHAPE_FAIL_FAST", &fail_fast)?;
        }

        if let Some(format) = env.get("XML_SHAPE_FORMAT") {
            config.output.format = match format.to_lowercase().as_str() {
                "schema" => OutputFormat::Schema,
                "json" => OutputFormat::Json,
                "summary" => OutputFormat::Summary,
                _ => {
                    return Err(ConfigError::Environment(format!(
                        "Invalid XML_SHAPE_FORMAT value: {}",
                        format
                    )));
                }
            };
        }

        if let Some(verbose) = env.get("XML_SHAPE_VERBOSE") {
            config.output.verbose = parse_env("XML_SHAPE_VERBOSE", &verbose)?;
        }

        if let Some(quiet) = env.get("XML_SHAPE_QUIET") {
            config.output.quiet = parse_env("XML_SHAPE_QUIET", &quiet)?;
        }

        if let Some(debug) = env.get("XML_SHAPE_DEBUG") {
            config.output.debug = parse_env("XML_SHAPE_DEBUG", &debug)?;
        }

        if let Some(extensions) = env.get("XML_SHAPE_EXTENSIONS") {
            config.files.extensions = split_list(&extensions);
        }

        Ok(config)
    }

    /// Merge CLI arguments with configuration (CLI takes precedence)
    pub fn merge_with_cli(mut config: Config, cli: &Cli) -> Config {
        if cli.workers.is_some() {
            config.pipeline.workers = cli.workers;
        }
        if let Some(pipe_size) = cli.pipe_size {
            config.pipeline.pipe_size = pipe_size;
        }
        if cli.root_tag.is_some() {
            config.pipeline.root_tag = cli.root_tag.clone();
        }
        config.pipeline.fail_fast |= cli.fail_fast;

        if let Some(format) = cli.format {
            config.output.format = format;
        }
        // The command line picks one of the two modes; it wins over either setting.
        if cli.verbose {
            config.output.verbose = true;
            config.output.quiet = false;
        }
        if cli.quiet {
            config.output.quiet = true;
            config.output.verbose = false;
        }
        config.output.timestamps |= cli.timestamps;
        config.output.progress |= cli.progress;

        if let Some(extensions) = cli.get_extensions() {
            config.files.extensions = extensions;
        }
        if !cli.include_patterns.is_empty() {
            config.files.include_patterns = cli.include_patterns.clone();
        }
        if !cli.exclude_patterns.is_empty() {
            config.files.exclude_patterns = cli.exclude_patterns.clone();
        }
        if cli.max_depth.is_some() {
            config.files.max_depth = cli.max_depth;
        }
        config.files.follow_symlinks |= cli.follow_symlinks;

        config
    }

    /// Validate configuration values
    pub fn validate_config(config: &Config) -> Result<()> {
        if let Some(workers) = config.pipeline.workers {
            if workers == 0 {
                return Err(ConfigError::Validation(
                    "Number of workers must be greater than 0".to_string(),
                ));
            }
            if workers > MAX_WORKERS {
                return Err(ConfigError::Validation(format!(
                    "Number of workers cannot exceed {}",
                    MAX_WORKERS
                )));
            }
        }

        if let Some(root_tag) = &config.pipeline.root_tag
            && root_tag.trim().is_empty()
        {
            return Err(ConfigError::Validation(
                "Root tag must not be empty".to_string(),
            ));
        }

        if config.output.verbose && config.output.quiet {
            return Err(ConfigError::Validation(
                "Cannot enable both verbose and quiet modes".to_string(),
            ));
        }

        if config.files.extensions.is_empty() {
            return Err(ConfigError::Validation(
                "At least one file extension must be specified".to_string(),
            ));
        }

        for ext in &config.files.extensions {
            if ext.contains('/') || ext.contains('\\') || ext.contains('.') {
                return Err(ConfigError::Validation(format!(
                    "Invalid file extension: {}",
                    ext
                )));
            }
        }

        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Environment(format!("Invalid {} value: {}", key, value)))
}
