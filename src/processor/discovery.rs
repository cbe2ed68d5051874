//! File discovery for FVS batch runs
//!
//! Finds the run directories under a batch root and the report files inside
//! a run directory.

use crate::error::{ExtractError, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Run directory discovery for a batch root
#[derive(Debug)]
pub struct PlotDiscovery {
    batch_root: PathBuf,
    plots_dir_name: String,
}

impl PlotDiscovery {
    pub fn new(batch_root: PathBuf, plots_dir_name: impl Into<String>) -> Self {
        Self {
            batch_root,
            plots_dir_name: plots_dir_name.into(),
        }
    }

    pub fn plots_path(&self) -> PathBuf {
        self.batch_root.join(&self.plots_dir_name)
    }

    /// Discover the immediate subdirectories of the plots directory
    ///
    /// ```text
    /// batch/
    ///   plots/
    ///     run1/
    ///       varWC_rx1_..._off0.out
    ///       varWC_rx1_..._off5.out
    ///     run2/
    ///       ...
    /// ```
    pub async fn discover_plot_directories(&self) -> Result<Vec<PathBuf>> {
        let plots_path = self.plots_path();

        if !plots_path.is_dir() {
            return Err(ExtractError::DirectoryNotFound { path: plots_path });
        }

        let mut directories = Vec::new();
        let mut dir = fs::read_dir(&plots_path).await?;
        while let Some(entry) = dir.next_entry().await? {
            if entry.file_type().await?.is_dir() {
                directories.push(entry.path());
            }
        }

        if directories.is_empty() {
            return Err(ExtractError::NoPlotDirectories { path: plots_path });
        }

        directories.sort();
        debug!(
            "Found {} run directories in {}",
            directories.len(),
            plots_path.display()
        );

        Ok(directories)
    }
}

/// Report files directly inside `dir` with the given extension, sorted
pub fn discover_report_files(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(ExtractError::DirectoryNotFound {
            path: dir.to_path_buf(),
        });
    }

    let escaped = glob::Pattern::escape(&dir.to_string_lossy());
    let pattern = format!("{}/*.{}", escaped, extension);
    debug!("Searching for report files with pattern: {}", pattern);

    let paths = glob::glob(&pattern).map_err(|e| ExtractError::ProcessingFailed {
        path: dir.to_path_buf(),
        reason: format!("Invalid file pattern: {}", e),
    })?;

    let mut files = Vec::new();
    for entry in paths {
        let path = entry.map_err(|e| ExtractError::ProcessingFailed {
            path: dir.to_path_buf(),
            reason: format!("Cannot read directory entry: {}", e),
        })?;
        if path.is_file() {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}
