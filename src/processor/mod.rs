//! Batch processing of FVS runs.
//!
//! Orchestrates the extraction workflow: discovering run directories,
//! extracting and merging their report files and writing one CSV per run
//! directory.

pub mod discovery;
pub mod extraction;
pub mod writer;

#[cfg(test)]
pub mod tests;

use self::{discovery::PlotDiscovery, extraction::DirectoryExtractor, writer::CsvExporter};

use crate::config::ExtractConfig;
use crate::constants::CSV_FILE_EXTENSION;
use crate::error::{ExtractError, Result};
use crate::models::ExtractionStats;

use colored::*;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::fs;
use tracing::{error, info};

/// Extract every report file in `input_dir` into a single CSV at `output_csv`
pub async fn extract_to_csv(
    input_dir: &Path,
    output_csv: &Path,
    config: ExtractConfig,
) -> Result<ExtractionStats> {
    config.validate()?;
    let start_time = Instant::now();

    let extractor = DirectoryExtractor::new(config);
    let (table, mut stats) = extractor.extract_directory(input_dir).await?;

    let exporter = CsvExporter::new(output_csv.to_path_buf());
    stats.total_rows = exporter.write(&table)?;
    stats.output_path = Some(output_csv.to_path_buf());
    stats.processing_time_ms = start_time.elapsed().as_millis();

    info!(
        "Wrote {} rows from {} files to {}",
        stats.total_rows,
        stats.files_processed,
        output_csv.display()
    );

    Ok(stats)
}

fn resolve_output_dir(
    batch_root: &Path,
    output_override: Option<&Path>,
    config: &ExtractConfig,
) -> PathBuf {
    output_override
        .map(Path::to_path_buf)
        .unwrap_or_else(|| batch_root.join(&config.output_dir_name))
}

/// Processor for a batch root laid out as `<batch>/plots/<run dir>/*.out`
#[derive(Debug)]
pub struct BatchProcessor {
    batch_root: PathBuf,
    output_override: Option<PathBuf>,
    output_dir: PathBuf,
    config: ExtractConfig,
    discovery: PlotDiscovery,
    extractor: DirectoryExtractor,
    directories_failed: usize,
}

impl BatchProcessor {
    /// Create a processor. Without an explicit output directory, CSVs go to
    /// `<batch>/<output_dir_name>` (`final` by default).
    pub fn new(batch_root: PathBuf, output_dir: Option<PathBuf>) -> Result<Self> {
        if !batch_root.is_dir() {
            return Err(ExtractError::DirectoryNotFound { path: batch_root });
        }

        let config = ExtractConfig::default();
        Ok(Self {
            discovery: PlotDiscovery::new(batch_root.clone(), config.plots_dir_name.clone()),
            extractor: DirectoryExtractor::new(config.clone()),
            output_dir: resolve_output_dir(&batch_root, output_dir.as_deref(), &config),
            output_override: output_dir,
            batch_root,
            config,
            directories_failed: 0,
        })
    }

    /// Configure the processor
    pub fn with_config(mut self, config: ExtractConfig) -> Self {
        self.discovery = PlotDiscovery::new(self.batch_root.clone(), config.plots_dir_name.clone());
        self.extractor = DirectoryExtractor::new(config.clone());
        self.output_dir =
            resolve_output_dir(&self.batch_root, self.output_override.as_deref(), &config);
        self.config = config;
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Run directories whose extraction or export failed in the last run
    pub fn directories_failed(&self) -> usize {
        self.directories_failed
    }

    /// CSV path for a run directory
    pub fn output_path_for(&self, plot_dir: &Path) -> PathBuf {
        let name = plot_dir
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        self.output_dir
            .join(format!("{}.{}", name, CSV_FILE_EXTENSION))
    }

    /// Main processing entry point
    pub async fn process(&mut self) -> Result<ExtractionStats> {
        self.config.validate()?;
        let start_time = Instant::now();
        self.directories_failed = 0;

        println!("{}", "Starting FVS batch extraction".bright_green().bold());
        println!(
            "  {} {}",
            "Batch:".bright_cyan(),
            self.batch_root.display()
        );
        println!(
            "  {} {}",
            "Output:".bright_cyan(),
            self.output_dir.display()
        );

        // Step 1: Discover run directories
        println!("\n{}", "Discovering run directories...".bright_yellow());
        let plot_dirs = self.discovery.discover_plot_directories().await?;
        println!(
            "  {} {} run directories",
            "Found".bright_green(),
            plot_dirs.len().to_string().bright_white().bold()
        );

        // Step 2: Create output directory
        fs::create_dir_all(&self.output_dir).await?;

        // Step 3: Extract each run directory into its own CSV
        let mut stats = ExtractionStats::default();
        for plot_dir in &plot_dirs {
            println!(
                "\n{} {}",
                "Extracting".bright_yellow(),
                plot_dir.display()
            );

            match self.process_directory(plot_dir).await {
                Ok(dir_stats) => stats.absorb(&dir_stats),
                Err(e) => {
                    error!("Failed to process {}: {:#}", plot_dir.display(), e);
                    self.directories_failed += 1;
                }
            }
        }

        stats.output_path = Some(self.output_dir.clone());
        stats.processing_time_ms = start_time.elapsed().as_millis();
        self.print_summary(&stats, plot_dirs.len());

        Ok(stats)
    }

    async fn process_directory(&self, plot_dir: &Path) -> Result<ExtractionStats> {
        let (table, mut stats) = self.extractor.extract_directory(plot_dir).await?;

        let exporter = CsvExporter::new(self.output_path_for(plot_dir));
        stats.total_rows = exporter.write(&table)?;
        stats.output_path = Some(exporter.output_path().to_path_buf());

        info!(
            "Wrote {} rows to {}",
            stats.total_rows,
            exporter.output_path().display()
        );
        Ok(stats)
    }

    fn print_summary(&self, stats: &ExtractionStats, directory_count: usize) {
        println!("\n{}", "Processing Summary".bright_green().bold());
        println!(
            "  {} {}ms",
            "Time elapsed:".bright_cyan(),
            stats.processing_time_ms.to_string().bright_white()
        );
        println!(
            "  {} {}",
            "Run directories:".bright_cyan(),
            directory_count.to_string().bright_white()
        );
        if self.directories_failed > 0 {
            println!(
                "  {} {}",
                "Directories failed:".bright_red(),
                self.directories_failed.to_string().bright_red().bold()
            );
        }
        println!(
            "  {} {}",
            "Files processed:".bright_cyan(),
            stats.files_processed.to_string().bright_white()
        );
        if stats.files_failed > 0 {
            println!(
                "  {} {}",
                "Files failed:".bright_red(),
                stats.files_failed.to_string().bright_red().bold()
            );
        }
        if stats.lines_skipped > 0 {
            println!(
                "  {} {}",
                "Lines skipped:".bright_yellow(),
                stats.lines_skipped.to_string().bright_yellow()
            );
        }
        println!(
            "  {} {}",
            "Total rows:".bright_cyan(),
            stats.total_rows.to_string().bright_white().bold()
        );
    }
}
