use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;

use xml_shape::{
    Cli, ConfigManager, ErrorReporter, EventCallback, Output, OutputFormat, PipelineEvent,
    ShapeScanner, VerbosityLevel,
};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse_args();

    let config = match ConfigManager::load_config(&cli).await {
        Ok(config) => config,
        Err(e) => {
            let verbosity = if cli.quiet {
                VerbosityLevel::Quiet
            } else {
                VerbosityLevel::Normal
            };
            ErrorReporter::new(verbosity).report_config_error(&e);
            return Ok(ExitCode::from(2));
        }
    };

    let reporter = Arc::new(ErrorReporter::with_options(
        config.verbosity(),
        config.output.timestamps,
        atty::is(atty::Stream::Stderr),
    ));
    let discovery = config.file_discovery()?;
    let scanner = ShapeScanner::new(config.pipeline_config());

    let show_progress = config.output.progress;
    let callback_reporter = Arc::clone(&reporter);
    let callback: EventCallback = Arc::new(move |event: &PipelineEvent| {
        callback_reporter.report_file_outcome(&event.outcome);
        if show_progress {
            callback_reporter.report_progress(
                event.completed,
                event.total,
                Some(event.outcome.path.as_path()),
            );
        }
    });

    let results = match scanner.scan_paths(&cli.paths, &discovery, Some(callback)).await {
        Ok(results) => results,
        Err(e) => {
            reporter.report_error(&e);
            return Ok(ExitCode::FAILURE);
        }
    };

    for warning in &results.warnings {
        reporter.report_warning(warning);
    }

    let output = Output::new(config.output.format, config.verbosity());
    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());
    output
        .write(&mut out, &results)
        .and_then(|()| out.flush())
        .context("Failed to write output")?;

    if output.format() != OutputFormat::Summary {
        reporter.report_summary(&results);
    }

    if let Err(e) = results.report.ensure_complete() {
        reporter.report_error(&e);
        return Ok(ExitCode::FAILURE);
    }

    Ok(ExitCode::SUCCESS)
}
