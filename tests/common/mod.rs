#![allow(dead_code)]

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use xml_shape::{FileDiscovery, PipelineConfig, ScanResults, ShapeScanner};

/// A throwaway directory of XML documents
pub struct Corpus {
    dir: TempDir,
    files: Vec<PathBuf>,
}

impl Corpus {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
            files: Vec::new(),
        }
    }

    /// Write `content` to `name` (parent directories created as needed)
    pub fn add(&mut self, name: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create corpus directory");
        }
        std::fs::write(&path, content).expect("Failed to write corpus file");
        self.files.push(path.clone());
        path
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Files in the order they were added
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }
}

/// A small record in the shape of a traffic-incident export
pub fn record_document(i: usize) -> String {
    let mut xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<export source="registry">
  <header generated="2020-01-01"/>
  <record id="{i}" kind="k{}">
    <location><city>City {i}</city></location>"#,
        i % 3
    );
    for v in 0..(i % 4) {
        xml.push_str(&format!(r#"<vehicle seq="{v}"><make>M</make></vehicle>"#));
    }
    if i % 5 == 0 {
        xml.push_str(r#"<note lang="pl">uwaga</note>"#);
    }
    xml.push_str("</record>\n</export>\n");
    xml
}

/// Scan an explicit file list with the given pool shape
pub async fn scan_files(files: Vec<PathBuf>, workers: usize, pipe_size: usize) -> ScanResults {
    ShapeScanner::new(PipelineConfig::with_pipe_size(workers, pipe_size))
        .scan_files(files, None)
        .await
        .expect("Scan failed")
}

/// Scan a directory with default discovery
pub async fn scan_dir(path: &Path, config: PipelineConfig) -> ScanResults {
    ShapeScanner::new(config)
        .scan_paths(&[path.to_path_buf()], &FileDiscovery::new(), None)
        .await
        .expect("Scan failed")
}
