//! FVS Report Extraction Library
//!
//! Reads the main output files written by the Forest Vegetation Simulator
//! and turns four of their fixed-width reports into one tidy table per
//! batch of runs.
//!
//! This library provides tools for:
//! - Tagging each report file with the run key encoded in its filename
//! - Decoding fixed-column data lines against declarative schemas
//! - Scanning a file once for the carbon, harvested carbon, summary
//!   statistics and activity summary reports
//! - Outer-merging the four reports on run key and year
//! - Writing the merged table to CSV and describing it as SQL DDL

pub mod aggregate;
pub mod cli;
pub mod config;
pub mod constants;
pub mod decoder;
pub mod error;
pub mod filename;
pub mod models;
pub mod processor;
pub mod scanner;
pub mod schema;

pub use aggregate::{ReportRows, WideRow, WideTable, merge_reports};
pub use config::{DecodePolicy, ExtractConfig};
pub use error::{ExtractError, Result};
pub use models::{ExtractionStats, ReportRow, RunKey};
pub use processor::{BatchProcessor, extract_to_csv};
pub use scanner::ReportScanner;
pub use schema::{ReportKind, output_columns, table_definition};
