use std::path::Path;

use crate::cli::VerbosityLevel;
use crate::config::ConfigError;
use crate::error::ShapeError;
use crate::pipeline::{FileOutcome, FileStatus};
use crate::scanner::ScanResults;

/// Logs skipped files, warnings and run summaries to stderr.
///
/// Stdout is reserved for the rendered output, so everything here goes through `eprintln!`.
pub struct ErrorReporter {
    verbosity: VerbosityLevel,
    show_timestamps: bool,
    show_colors: bool,
}

impl ErrorReporter {
    pub fn new(verbosity: VerbosityLevel) -> Self {
        Self {
            verbosity,
            show_timestamps: false,
            show_colors: atty::is(atty::Stream::Stderr),
        }
    }

    pub fn with_options(verbosity: VerbosityLevel, show_timestamps: bool, show_colors: bool) -> Self {
        Self {
            verbosity,
            show_timestamps,
            show_colors,
        }
    }

    pub fn verbosity(&self) -> VerbosityLevel {
        self.verbosity
    }

    /// Log one finished file, as it happens
    pub fn report_file_outcome(&self, outcome: &FileOutcome) {
        if let Some(line) = self.format_file_outcome(outcome) {
            eprintln!("{}", line);
        }
    }

    /// Log a non-fatal problem such as an unreadable directory entry
    pub fn report_warning(&self, warning: &ShapeError) {
        if self.verbosity == VerbosityLevel::Quiet {
            return;
        }
        let label = self.colorize("WARNING", "33");
        eprintln!("{}{}: {}", self.timestamp(), label, self.format_error(warning));
    }

    /// Log the error that ended the run
    pub fn report_error(&self, error: &ShapeError) {
        let label = self.colorize("ERROR", "31");
        eprintln!("{}{}: {}", self.timestamp(), label, self.format_error(error));
    }

    /// Report a configuration error
    pub fn report_config_error(&self, error: &ConfigError) {
        let formatted = match self.verbosity {
            VerbosityLevel::Quiet => format!("Config error: {}", error),
            VerbosityLevel::Normal | VerbosityLevel::Verbose => {
                format!("Configuration Error: {}\n{}", error, config_help(error))
            }
            VerbosityLevel::Debug => format!(
                "Configuration Error: {}\nDebug: {:?}\n{}",
                error,
                error,
                config_help(error)
            ),
        };
        eprintln!("{}", formatted);
    }

    /// Report progress for long-running scans
    pub fn report_progress(&self, completed: usize, total: usize, current_file: Option<&Path>) {
        if self.verbosity == VerbosityLevel::Quiet || total == 0 {
            return;
        }

        let percentage = (completed as f64 / total as f64 * 100.0) as u32;
        match (self.verbosity, current_file) {
            (VerbosityLevel::Verbose | VerbosityLevel::Debug, Some(file)) => eprint!(
                "\rProgress: {}/{} ({}%) - {}",
                completed,
                total,
                percentage,
                file.display()
            ),
            _ => eprint!("\rProgress: {}/{} ({}%)", completed, total, percentage),
        }

        if completed == total {
            eprintln!();
        }
    }

    /// Short end-of-run summary on stderr
    pub fn report_summary(&self, results: &ScanResults) {
        if let Some(summary) = self.format_summary(results) {
            eprintln!("{}", summary);
        }
    }

    fn format_file_outcome(&self, outcome: &FileOutcome) -> Option<String> {
        let path = outcome.path.display();
        let line = match (&outcome.status, self.verbosity) {
            (FileStatus::Parsed, VerbosityLevel::Debug) => {
                format!("Parsed {} ({:?})", path, outcome.duration)
            }
            (FileStatus::Parsed, _) => return None,
            (FileStatus::Failed { .. }, VerbosityLevel::Quiet) => {
                format!("{}: {}", self.colorize("FAILED", "31"), path)
            }
            (_, VerbosityLevel::Quiet) => return None,
            (FileStatus::Failed { message }, _) => {
                format!("{} {}: {}", self.colorize("Skipped", "31"), path, message)
            }
            (status, VerbosityLevel::Normal) => {
                format!("{} {}", self.colorize("Skipped", "36"), path)
                    + &status
                        .reason()
                        .map(|reason| format!(": {}", reason))
                        .unwrap_or_default()
            }
            (status, _) => format!(
                "{} {}: {} ({:?})",
                self.colorize("Skipped", "36"),
                path,
                status.reason().unwrap_or_default(),
                outcome.duration
            ),
        };
        Some(format!("{}{}", self.timestamp(), line))
    }

    fn format_summary(&self, results: &ScanResults) -> Option<String> {
        let report = &results.report;
        match self.verbosity {
            VerbosityLevel::Quiet => (report.failed_files > 0)
                .then(|| format!("Failed: {}", report.failed_files)),
            VerbosityLevel::Normal => Some(format!(
                "Scanned {} files: {} documents, {} skipped, {} failed",
                report.total_files,
                results.documents,
                report.skipped_files(),
                report.failed_files
            )),
            VerbosityLevel::Verbose | VerbosityLevel::Debug => {
                let mut lines = vec![
                    "Scan Summary:".to_string(),
                    format!("  Files: {}", report.total_files),
                    format!("  Documents merged: {}", results.documents),
                    format!("  Empty: {}", report.empty_files),
                    format!("  Unmatched: {}", report.unmatched_files),
                    format!("  Failed: {}", report.failed_files),
                    format!("  Duration: {:?}", results.metrics.total_duration),
                    format!(
                        "  Throughput: {:.1} files/sec",
                        results.metrics.throughput_files_per_second
                    ),
                ];
                if report.unprocessed_files > 0 {
                    lines.push(format!("  Not processed: {}", report.unprocessed_files));
                }
                if self.verbosity == VerbosityLevel::Debug {
                    lines.push(format!("  Workers: {}", results.metrics.workers));
                    lines.push(format!(
                        "  Discovery: {:?}",
                        results.metrics.discovery_duration
                    ));
                    lines.push(format!("  Parsing: {:?}", results.metrics.parse_duration));
                }
                Some(lines.join("\n"))
            }
        }
    }

    fn format_error(&self, error: &ShapeError) -> String {
        let mut output = error.to_string();
        if self.verbosity == VerbosityLevel::Debug {
            output.push_str(&format!("\nDebug Info: {:?}", error));
            let mut current: &dyn std::error::Error = error;
            let mut level = 0;
            while let Some(source) = current.source() {
                level += 1;
                output.push_str(&format!("\n  {}: {}", level, source));
                current = source;
            }
        }
        output
    }

    fn timestamp(&self) -> String {
        if self.show_timestamps {
            format!("[{}] ", chrono::Local::now().format("%H:%M:%S"))
        } else {
            String::new()
        }
    }

    fn colorize(&self, text: &str, color: &str) -> String {
        if self.show_colors {
            format!("\x1b[{}m{}\x1b[0m", color, text)
        } else {
            text.to_string()
        }
    }
}

fn config_help(error: &ConfigError) -> &'static str {
    match error {
        ConfigError::TomlParsing(_) | ConfigError::JsonParsing(_) => {
            "Check the configuration file syntax (TOML/JSON format expected)"
        }
        ConfigError::UnsupportedFormat(_) => "Use a .toml or .json configuration file",
        ConfigError::Environment(_) => "Fix or unset the XML_SHAPE_* environment variable",
        ConfigError::Validation(_) => "Adjust the option on the command line or in the config file",
        ConfigError::Io(_) => "Check that the configuration file exists and is readable",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::Elements;
    use crate::pipeline::PipelineReport;
    use crate::scanner::RunMetrics;
    use std::path::PathBuf;
    use std::sync::Arc;
    use std::time::Duration;

    fn reporter(verbosity: VerbosityLevel) -> ErrorReporter {
        ErrorReporter::with_options(verbosity, false, false)
    }

    fn outcome(status: FileStatus) -> FileOutcome {
        FileOutcome::new(PathBuf::from("corpus/a.xml"), status, Duration::from_millis(3))
    }

    fn results(failed: usize) -> ScanResults {
        let mut outcomes = vec![
            outcome(FileStatus::Parsed),
            outcome(FileStatus::Empty),
        ];
        for _ in 0..failed {
            outcomes.push(outcome(FileStatus::Failed {
                message: "bad".to_string(),
            }));
        }
        let total = outcomes.len();
        ScanResults {
            elements: Arc::new(Elements::new()),
            documents: 1,
            report: PipelineReport::aggregate(total, outcomes, Duration::from_millis(5), false),
            warnings: Vec::new(),
            metrics: RunMetrics::default(),
        }
    }

    #[test]
    fn test_parsed_files_silent_below_debug() {
        for verbosity in [VerbosityLevel::Quiet, VerbosityLevel::Normal, VerbosityLevel::Verbose] {
            assert!(reporter(verbosity).format_file_outcome(&outcome(FileStatus::Parsed)).is_none());
        }
        let line = reporter(VerbosityLevel::Debug)
            .format_file_outcome(&outcome(FileStatus::Parsed))
            .unwrap();
        assert!(line.starts_with("Parsed corpus/a.xml"));
    }

    #[test]
    fn test_quiet_reports_failures_only() {
        let quiet = reporter(VerbosityLevel::Quiet);
        assert!(quiet.format_file_outcome(&outcome(FileStatus::Empty)).is_none());

        let line = quiet
            .format_file_outcome(&outcome(FileStatus::Failed {
                message: "unexpected EOF".to_string(),
            }))
            .unwrap();
        assert_eq!(line, "FAILED: corpus/a.xml");
    }

    #[test]
    fn test_skip_lines() {
        let normal = reporter(VerbosityLevel::Normal);
        let line = normal
            .format_file_outcome(&outcome(FileStatus::Unmatched {
                root_tag: "record".to_string(),
            }))
            .unwrap();
        assert_eq!(line, "Skipped corpus/a.xml: no <record> element in document");

        let line = normal
            .format_file_outcome(&outcome(FileStatus::Failed {
                message: "XML error at byte 3".to_string(),
            }))
            .unwrap();
        assert_eq!(line, "Skipped corpus/a.xml: XML error at byte 3");

        let line = reporter(VerbosityLevel::Verbose)
            .format_file_outcome(&outcome(FileStatus::Empty))
            .unwrap();
        assert!(line.contains("no root element"));
        assert!(line.contains("3ms"));
    }

    #[test]
    fn test_summary_by_verbosity() {
        assert!(reporter(VerbosityLevel::Quiet).format_summary(&results(0)).is_none());
        assert_eq!(
            reporter(VerbosityLevel::Quiet).format_summary(&results(2)).unwrap(),
            "Failed: 2"
        );

        let normal = reporter(VerbosityLevel::Normal).format_summary(&results(1)).unwrap();
        assert_eq!(normal, "Scanned 3 files: 1 documents, 2 skipped, 1 failed");

        let debug = reporter(VerbosityLevel::Debug).format_summary(&results(1)).unwrap();
        assert!(debug.starts_with("Scan Summary:"));
        assert!(debug.contains("Workers:"));
    }

    #[test]
    fn test_debug_error_chain() {
        let error = ShapeError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "no such file",
        ));
        let normal = reporter(VerbosityLevel::Normal).format_error(&error);
        assert_eq!(normal, "IO error: no such file");

        let debug = reporter(VerbosityLevel::Debug).format_error(&error);
        assert!(debug.contains("Debug Info:"));
        assert!(debug.contains("1: no such file"));
    }

    #[test]
    fn test_timestamps_and_colors() {
        let stamped = ErrorReporter::with_options(VerbosityLevel::Normal, true, false);
        let line = stamped.format_file_outcome(&outcome(FileStatus::Empty)).unwrap();
        assert!(line.starts_with('['));

        let colored = ErrorReporter::with_options(VerbosityLevel::Normal, false, true);
        let line = colored.format_file_outcome(&outcome(FileStatus::Empty)).unwrap();
        assert!(line.contains("\x1b[36mSkipped\x1b[0m"));
    }
}
