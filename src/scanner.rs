//! End-to-end corpus scan
//!
//! Expands the path arguments, runs the parsing [`Pipeline`] over the resulting files and
//! merges every emitted root into one shared [`Elements`] tree:
//!
//! - **Discovery**: async directory walk ([`FileDiscovery::discover_all`])
//! - **Parsing**: bounded worker pool, roots streamed over a fixed-capacity channel
//! - **Aggregation**: a single consumer drains the channel into [`Elements::add`]
//!
//! The consumer stops when the channel closes, then collects the pipeline report.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::elements::Elements;
use crate::error::{Result, ShapeError};
use crate::file_discovery::FileDiscovery;
use crate::pipeline::{EventCallback, Pipeline, PipelineConfig, PipelineReport};

/// Timing and throughput of a scan
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunMetrics {
    /// Wall-clock time for the whole scan
    pub total_duration: Duration,
    pub discovery_duration: Duration,
    /// Parse and merge time
    pub parse_duration: Duration,
    pub average_time_per_file: Duration,
    pub throughput_files_per_second: f64,
    pub workers: usize,
}

impl RunMetrics {
    fn finish(&mut self, files: usize) {
        self.average_time_per_file = if files > 0 {
            self.parse_duration / files as u32
        } else {
            Duration::ZERO
        };
        self.throughput_files_per_second = if self.parse_duration.as_secs_f64() > 0.0 {
            files as f64 / self.parse_duration.as_secs_f64()
        } else {
            0.0
        };
    }
}

/// Everything a scan produced
#[derive(Debug)]
pub struct ScanResults {
    /// Merged structure of every emitted root
    pub elements: Arc<Elements>,
    /// Roots merged into `elements`; the parent count of the top level
    pub documents: usize,
    pub report: PipelineReport,
    /// Directory entries that could not be read during discovery
    pub warnings: Vec<ShapeError>,
    pub metrics: RunMetrics,
}

impl ScanResults {
    /// True when at least one file failed to parse or the run was aborted
    pub fn has_failures(&self) -> bool {
        self.report.failed_files > 0 || self.report.aborted
    }
}

/// Discovers, parses and aggregates a corpus
pub struct ShapeScanner {
    config: PipelineConfig,
}

impl ShapeScanner {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Scan every file reachable from `paths`
    pub async fn scan_paths(
        &self,
        paths: &[PathBuf],
        discovery: &FileDiscovery,
        callback: Option<EventCallback>,
    ) -> Result<ScanResults> {
        let started = Instant::now();

        let discovered = discovery.discover_all(paths).await?;
        let discovery_duration = started.elapsed();

        let mut results = self.scan_files(discovered.files, callback).await?;
        results.warnings = discovered.warnings;
        results.metrics.discovery_duration = discovery_duration;
        results.metrics.total_duration = started.elapsed();
        Ok(results)
    }

    /// Scan an explicit list of files
    pub async fn scan_files(
        &self,
        files: Vec<PathBuf>,
        callback: Option<EventCallback>,
    ) -> Result<ScanResults> {
        let started = Instant::now();

        let mut pipeline = Pipeline::new(self.config.clone());
        if let Some(callback) = callback {
            pipeline = pipeline.with_callback(callback);
        }

        let elements = Arc::new(Elements::new());
        let mut documents = 0;
        let report = pipeline
            .run(files)
            .for_each(|root| {
                elements.add(&root);
                documents += 1;
            })
            .await?;

        let mut metrics = RunMetrics {
            total_duration: started.elapsed(),
            parse_duration: started.elapsed(),
            workers: self.config.workers,
            ..RunMetrics::default()
        };
        metrics.finish(report.total_files - report.unprocessed_files);

        Ok(ScanResults {
            elements,
            documents,
            report,
            warnings: Vec::new(),
            metrics,
        })
    }
}
