//! Error handling for FVS report extraction.
//!
//! Provides error types with context for filename tagging, fixed-column
//! decoding, directory discovery and CSV export failures.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("Filename does not encode a run key: {path}")]
    MalformedFilename { path: PathBuf },

    #[error(
        "Cannot decode field '{field}' from '{raw}' in {report} report (line {line_number})"
    )]
    FieldDecode {
        report: &'static str,
        field: &'static str,
        raw: String,
        line_number: usize,
    },

    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("Plots directory contains no run directories: {path}")]
    NoPlotDirectories { path: PathBuf },

    #[error("Processing failed for: {path} - {reason}")]
    ProcessingFailed { path: PathBuf, reason: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

pub type Result<T> = std::result::Result<T, ExtractError>;
