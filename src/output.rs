//! Stdout rendering of scan results
//!
//! The schema sketch is streamed straight into the writer; JSON and the summary are
//! built in memory first.

use std::io::{self, Write};
use std::time::Duration;

use crate::cli::{OutputFormat, VerbosityLevel};
use crate::printer;
use crate::scanner::ScanResults;

/// Output formatter for the selected mode
pub struct Output {
    format: OutputFormat,
    verbosity: VerbosityLevel,
    show_colors: bool,
}

impl Output {
    pub fn new(format: OutputFormat, verbosity: VerbosityLevel) -> Self {
        Self {
            format,
            verbosity,
            show_colors: atty::is(atty::Stream::Stdout),
        }
    }

    pub fn with_colors(mut self, show_colors: bool) -> Self {
        self.show_colors = show_colors;
        self
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Write the results in the configured format
    pub fn write<W: Write>(&self, out: &mut W, results: &ScanResults) -> io::Result<()> {
        match self.format {
            OutputFormat::Schema => {
                printer::write_schema(out, &results.elements, results.documents)
            }
            OutputFormat::Json => {
                let json = printer::render_json(&results.elements, results.documents)
                    .map_err(io::Error::other)?;
                writeln!(out, "{}", json)
            }
            OutputFormat::Summary => write!(out, "{}", self.format_summary(results)),
        }
    }

    /// Multi-line run summary
    pub fn format_summary(&self, results: &ScanResults) -> String {
        let report = &results.report;
        let mut output = String::new();

        output.push_str("Scan Summary:\n");
        output.push_str(&format!("  Total files: {}\n", report.total_files));
        output.push_str(&format!(
            "  {} {}\n",
            self.colorize("Parsed:", "32"),
            report.parsed_files
        ));
        output.push_str(&format!("  Documents merged: {}\n", results.documents));
        output.push_str(&format!(
            "  Distinct root tags: {}\n",
            results.elements.len()
        ));

        if report.empty_files > 0 {
            output.push_str(&format!(
                "  {} {}\n",
                self.colorize("Empty:", "36"),
                report.empty_files
            ));
        }
        if report.unmatched_files > 0 {
            output.push_str(&format!(
                "  {} {}\n",
                self.colorize("Unmatched:", "36"),
                report.unmatched_files
            ));
        }
        if report.failed_files > 0 {
            output.push_str(&format!(
                "  {} {}\n",
                self.colorize("Failed:", "31"),
                report.failed_files
            ));
        }
        if report.aborted {
            output.push_str(&format!(
                "  {} {} files not processed\n",
                self.colorize("Aborted:", "31"),
                report.unprocessed_files
            ));
        }

        output.push_str(&format!(
            "  Duration: {}\n",
            format_duration(results.metrics.total_duration)
        ));

        if self.verbosity >= VerbosityLevel::Verbose {
            output.push_str(&format!(
                "  Throughput: {:.1} files/sec\n",
                results.metrics.throughput_files_per_second
            ));
            output.push_str(&format!("  Workers: {}\n", results.metrics.workers));
            for skipped in &report.skipped {
                output.push_str(&format!(
                    "    {}: {}\n",
                    skipped.path.display(),
                    skipped.status.reason().unwrap_or_default()
                ));
            }
        }

        output
    }

    fn colorize(&self, text: &str, color: &str) -> String {
        if self.show_colors {
            format!("\x1b[{}m{}\x1b[0m", color, text)
        } else {
            text.to_string()
        }
    }
}

fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs_f64();
    if total_secs < 1.0 {
        format!("{:.0}ms", duration.as_millis())
    } else if total_secs < 60.0 {
        format!("{:.2}s", total_secs)
    } else {
        let mins = (total_secs / 60.0) as u64;
        let secs = total_secs % 60.0;
        format!("{}m{:.1}s", mins, secs)
    }
}
