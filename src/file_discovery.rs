use std::collections::HashSet;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use tokio::fs;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReadDirStream;

use crate::error::{Result, ShapeError};

/// Files found under a set of roots
#[derive(Debug, Default)]
pub struct Discovered {
    /// Files in argument order, directory entries sorted by path, without duplicates
    pub files: Vec<PathBuf>,
    /// Entries that could not be read; the walk continued past them
    pub warnings: Vec<ShapeError>,
}

/// Expands file and directory arguments into the list of documents to scan.
///
/// A path naming a file is taken as-is. Directories are walked asynchronously and
/// their files filtered by extension and glob patterns.
#[derive(Debug, Clone)]
pub struct FileDiscovery {
    /// Lower-cased extensions without the leading dot
    extensions: Vec<String>,
    include_set: Option<GlobSet>,
    exclude_set: Option<GlobSet>,
    /// Directory levels below a root to descend into (None = unlimited)
    max_depth: Option<usize>,
    follow_symlinks: bool,
}

impl FileDiscovery {
    pub fn new() -> Self {
        Self {
            extensions: vec!["xml".to_string()],
            include_set: None,
            exclude_set: None,
            max_depth: None,
            follow_symlinks: false,
        }
    }

    /// Set file extensions to discover
    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions
            .into_iter()
            .map(|ext| ext.trim_start_matches('.').to_lowercase())
            .collect();
        self
    }

    /// Only keep files matching at least one of these patterns
    pub fn with_include_patterns(mut self, patterns: Vec<String>) -> Result<Self> {
        self.include_set = build_glob_set(&patterns, "include")?;
        Ok(self)
    }

    /// Drop files matching any of these patterns
    pub fn with_exclude_patterns(mut self, patterns: Vec<String>) -> Result<Self> {
        self.exclude_set = build_glob_set(&patterns, "exclude")?;
        Ok(self)
    }

    pub fn with_max_depth(mut self, depth: Option<usize>) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    /// Discover files under a single file or directory
    pub async fn discover_files(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let mut state = Traversal::default();
        self.discover_into(path, &mut state).await?;
        Ok(state.found.files)
    }

    /// Discover files under every root, keeping argument order and dropping duplicates.
    ///
    /// Two paths are duplicates when they resolve to the same file, so a document
    /// reached through a symlink and through its real location is scanned once.
    pub async fn discover_all(&self, paths: &[PathBuf]) -> Result<Discovered> {
        let mut state = Traversal::default();
        for path in paths {
            self.discover_into(path, &mut state).await?;
        }

        let mut found = state.found;
        let mut seen = HashSet::new();
        let mut files = Vec::with_capacity(found.files.len());
        for path in found.files {
            let key = fs::canonicalize(&path).await.unwrap_or_else(|_| path.clone());
            if seen.insert(key) {
                files.push(path);
            }
        }
        found.files = files;
        Ok(found)
    }

    async fn discover_into(&self, path: &Path, state: &mut Traversal) -> Result<()> {
        let metadata = fs::metadata(path).await?;

        if metadata.is_dir() {
            self.walk(path, 0, state).await;
        } else {
            state.found.files.push(path.to_path_buf());
        }
        Ok(())
    }

    fn walk<'a>(
        &'a self,
        dir: &'a Path,
        depth: usize,
        state: &'a mut Traversal,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async move {
            let real_dir = match fs::canonicalize(dir).await {
                Ok(real_dir) => real_dir,
                Err(e) => {
                    state.found.warnings.push(traversal_error(dir, e));
                    return;
                }
            };

            if state.ancestors.contains(&real_dir) {
                state.found.warnings.push(ShapeError::FileSystemTraversal {
                    path: dir.to_path_buf(),
                    reason: format!("directory cycle back to {}", real_dir.display()),
                });
                return;
            }
            // Already walked through another path; its files are listed.
            if !state.visited.insert(real_dir.clone()) {
                return;
            }

            let entries = match read_sorted(dir).await {
                Ok(entries) => entries,
                Err(e) => {
                    state.found.warnings.push(traversal_error(dir, e));
                    return;
                }
            };

            state.ancestors.push(real_dir);
            for entry in entries {
                let mut metadata = match fs::symlink_metadata(&entry).await {
                    Ok(metadata) => metadata,
                    Err(e) => {
                        state.found.warnings.push(traversal_error(&entry, e));
                        continue;
                    }
                };

                if metadata.file_type().is_symlink() {
                    if !self.follow_symlinks {
                        continue;
                    }
                    metadata = match fs::metadata(&entry).await {
                        Ok(metadata) => metadata,
                        Err(e) => {
                            state.found.warnings.push(traversal_error(&entry, e));
                            continue;
                        }
                    };
                }

                if metadata.is_dir() {
                    if self.max_depth.is_some_and(|max| depth >= max) {
                        continue;
                    }
                    self.walk(&entry, depth + 1, state).await;
                } else if metadata.is_file() && self.should_process(&entry) {
                    state.found.files.push(entry);
                }
            }
            state.ancestors.pop();
        })
    }

    /// Check a directory entry against the extension list and glob patterns
    pub fn should_process(&self, path: &Path) -> bool {
        let Some(extension) = path.extension().and_then(|ext| ext.to_str()) else {
            return false;
        };
        if !self.extensions.contains(&extension.to_lowercase()) {
            return false;
        }

        if let Some(exclude_set) = &self.exclude_set
            && exclude_set.is_match(path)
        {
            return false;
        }

        match &self.include_set {
            Some(include_set) => include_set.is_match(path),
            None => true,
        }
    }
}

impl Default for FileDiscovery {
    fn default() -> Self {
        Self::new()
    }
}

/// Walk state shared across every root of one discovery run
#[derive(Default)]
struct Traversal {
    found: Discovered,
    /// Resolved directories already walked
    visited: HashSet<PathBuf>,
    /// Resolved directories on the current descent path
    ancestors: Vec<PathBuf>,
}

fn build_glob_set(patterns: &[String], kind: &str) -> Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }

    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .map_err(|e| ShapeError::Config(format!("Invalid glob pattern '{}': {}", pattern, e)))?;
        builder.add(glob);
    }

    builder
        .build()
        .map(Some)
        .map_err(|e| ShapeError::Config(format!("Failed to build {} glob set: {}", kind, e)))
}

async fn read_sorted(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut entries = ReadDirStream::new(fs::read_dir(dir).await?);
    let mut paths = Vec::new();
    while let Some(entry) = entries.next().await {
        paths.push(entry?.path());
    }
    paths.sort();
    Ok(paths)
}

fn traversal_error(path: &Path, error: std::io::Error) -> ShapeError {
    ShapeError::FileSystemTraversal {
        path: path.to_path_buf(),
        reason: error.to_string(),
    }
}
