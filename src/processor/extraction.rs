//! Concurrent extraction of a directory of report files
//!
//! Each file is scanned on the blocking pool; the per-file row sets are
//! folded together and merged into one wide table once every file has
//! been read.

use crate::aggregate::{ReportRows, WideTable, merge_reports};
use crate::config::{DecodePolicy, ExtractConfig};
use crate::constants::PROGRESS_TEMPLATE;
use crate::error::{ExtractError, Result};
use crate::models::{ExtractionStats, RunKey};
use crate::processor::discovery::discover_report_files;
use crate::scanner::ReportScanner;

use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::task;
use tracing::{debug, error, warn};

/// Rows read from one report file
#[derive(Debug)]
pub struct FileExtraction {
    pub path: PathBuf,
    pub run: Arc<RunKey>,
    pub rows: ReportRows,
    /// Data lines dropped under [`DecodePolicy::SkipLine`]
    pub lines_skipped: usize,
}

/// Scan one report file into typed rows
///
/// A malformed filename or an I/O failure always fails the file. Decode
/// failures fail the file under [`DecodePolicy::FailFile`] and are logged
/// and counted under [`DecodePolicy::SkipLine`].
pub fn extract_file(path: &Path, policy: DecodePolicy) -> Result<FileExtraction> {
    let scanner = ReportScanner::open(path)?;
    let run = Arc::clone(scanner.run());

    let mut rows = ReportRows::new();
    let mut lines_skipped = 0;

    for item in scanner {
        match item {
            Ok(row) => rows.push(row),
            Err(e @ ExtractError::FieldDecode { .. }) if policy == DecodePolicy::SkipLine => {
                warn!("Skipping line in {}: {}", path.display(), e);
                lines_skipped += 1;
            }
            Err(e) => return Err(e),
        }
    }

    debug!(
        "Extracted {} rows from {} ({:?})",
        rows.len(),
        path.display(),
        rows.counts()
    );

    Ok(FileExtraction {
        path: path.to_path_buf(),
        run,
        rows,
        lines_skipped,
    })
}

/// Extracts and merges every report file of a run directory
#[derive(Debug, Clone)]
pub struct DirectoryExtractor {
    config: ExtractConfig,
}

impl DirectoryExtractor {
    pub fn new(config: ExtractConfig) -> Self {
        Self { config }
    }

    /// Discover the report files in `dir` and merge them into one table
    pub async fn extract_directory(&self, dir: &Path) -> Result<(WideTable, ExtractionStats)> {
        let files = discover_report_files(dir, self.config.extension())?;
        debug!("Found {} report files in {}", files.len(), dir.display());
        self.extract_files(&files).await
    }

    /// Extract the given files concurrently and merge their rows
    ///
    /// Files that fail are logged and counted; the rest still produce
    /// output.
    pub async fn extract_files(&self, files: &[PathBuf]) -> Result<(WideTable, ExtractionStats)> {
        let start_time = Instant::now();
        let mut stats = ExtractionStats::default();

        if files.is_empty() {
            return Ok((WideTable::default(), stats));
        }

        let pb = self.progress_bar(files.len());
        let concurrent_limit = self.config.max_concurrent_files.min(files.len()).max(1);
        let policy = self.config.decode_policy;

        let (rows, processed, failed, skipped) = stream::iter(files)
            .map(|file_path| {
                let pb = pb.clone();
                async move {
                    if let Some(file_name) = file_path.file_name() {
                        pb.set_message(format!("Extracting: {}", file_name.to_string_lossy()));
                    }

                    let result = task::spawn_blocking({
                        let file_path = file_path.clone();
                        move || extract_file(&file_path, policy)
                    })
                    .await
                    .map_err(|e| ExtractError::ProcessingFailed {
                        path: file_path.clone(),
                        reason: format!("Extraction task failed: {}", e),
                    })
                    .and_then(|result| result);
                    pb.inc(1);

                    if let Err(e) = &result {
                        error!("Failed to extract {}: {:#}", file_path.display(), e);
                    }
                    result
                }
            })
            .buffer_unordered(concurrent_limit)
            .fold(
                (ReportRows::new(), 0usize, 0usize, 0usize),
                |(mut rows, processed, failed, skipped), result| async move {
                    match result {
                        Ok(extraction) => {
                            let lines_skipped = extraction.lines_skipped;
                            rows.extend(extraction.rows);
                            (rows, processed + 1, failed, skipped + lines_skipped)
                        }
                        Err(_) => (rows, processed, failed + 1, skipped),
                    }
                },
            )
            .await;

        pb.finish_with_message("All report files extracted");

        stats.files_processed = processed;
        stats.files_failed = failed;
        stats.lines_skipped = skipped;
        stats.report_rows = rows.counts();

        let table = merge_reports(rows);
        stats.total_rows = table.len();
        stats.processing_time_ms = start_time.elapsed().as_millis();

        debug!(
            "Merged {} files into {} rows ({} failed)",
            processed,
            table.len(),
            failed
        );

        Ok((table, stats))
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.config.show_progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new(len as u64);
        let style = ProgressStyle::default_bar()
            .template(PROGRESS_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");
        pb.set_style(style);
        pb.set_message("Extracting reports");
        pb
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ReportKind;
    use std::fs;
    use tempfile::TempDir;

    const NAME: &str = "varWC_rx1_cond7_site2_climNoClimate_off0.out";

    fn carbon_report(rows: &[&str]) -> String {
        let mut text = String::from("FVS RUN\n  STAND CARBON REPORT\n");
        for i in 1..9 {
            text.push_str(&format!(" header {}\n", i));
        }
        for row in rows {
            text.push_str(row);
            text.push('\n');
        }
        text.push('\n');
        text
    }

    fn carbon_line(year: i64) -> String {
        format!(
            "{:4}{:>9.1}{:>9.1}{:>9.1}{:>9.1}{:>9.1}{:>9.1}{:>9.1}{:>9.1}{:>9.1}{:>9.1}{:>9.1}",
            year, 10.0, 0.0, 5.0, 0.0, 1.0, 0.0, 0.0, 0.0, 16.0, 0.0, 0.0
        )
    }

    #[test]
    fn test_extract_file_reads_rows() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(NAME);
        fs::write(&path, carbon_report(&[&carbon_line(2020), &carbon_line(2030)])).unwrap();

        let extraction = extract_file(&path, DecodePolicy::FailFile).unwrap();

        assert_eq!(extraction.rows.count(ReportKind::Carbon), 2);
        assert_eq!(extraction.run.condition, "7");
        assert_eq!(extraction.lines_skipped, 0);
    }

    #[test]
    fn test_decode_policy() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(NAME);
        fs::write(&path, carbon_report(&["garbage line", &carbon_line(2030)])).unwrap();

        let err = extract_file(&path, DecodePolicy::FailFile).unwrap_err();
        assert!(matches!(err, ExtractError::FieldDecode { .. }));

        let extraction = extract_file(&path, DecodePolicy::SkipLine).unwrap();
        assert_eq!(extraction.rows.count(ReportKind::Carbon), 1);
        assert_eq!(extraction.lines_skipped, 1);
    }

    #[test]
    fn test_malformed_filename_fails_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("notes.out");
        fs::write(&path, carbon_report(&[&carbon_line(2020)])).unwrap();

        assert!(matches!(
            extract_file(&path, DecodePolicy::SkipLine),
            Err(ExtractError::MalformedFilename { .. })
        ));
    }

    #[tokio::test]
    async fn test_failed_files_are_counted() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join(NAME),
            carbon_report(&[&carbon_line(2020)]),
        )
        .unwrap();
        fs::write(temp_dir.path().join("broken.out"), "").unwrap();

        let extractor = DirectoryExtractor::new(ExtractConfig::default().without_progress());
        let (table, stats) = extractor.extract_directory(temp_dir.path()).await.unwrap();

        assert_eq!(stats.files_processed, 1);
        assert_eq!(stats.files_failed, 1);
        assert_eq!(table.len(), 1);
        assert_eq!(stats.total_rows, 1);
        assert_eq!(stats.report_rows.get(&ReportKind::Carbon), Some(&1));
    }

    #[tokio::test]
    async fn test_empty_directory_gives_empty_table() {
        let temp_dir = TempDir::new().unwrap();

        let extractor = DirectoryExtractor::new(ExtractConfig::default().without_progress());
        let (table, stats) = extractor.extract_directory(temp_dir.path()).await.unwrap();

        assert!(table.is_empty());
        assert_eq!(stats.files_processed, 0);
    }
}
