//! Application constants for the FVS extractor
//!
//! File naming, directory conventions and defaults used by the batch
//! driver. Report markers and column layouts live with their schemas in
//! [`crate::schema`].

// =============================================================================
// File and Directory Conventions
// =============================================================================

/// Extension of FVS main output files
pub const REPORT_FILE_EXTENSION: &str = "out";

/// Directory under the batch root holding one subdirectory per run
pub const PLOTS_DIR_NAME: &str = "plots";

/// Directory under the batch root receiving one CSV per run directory
pub const OUTPUT_DIR_NAME: &str = "final";

/// Extension of exported wide tables
pub const CSV_FILE_EXTENSION: &str = "csv";

// =============================================================================
// Relational Export
// =============================================================================

/// Table name used by the generated `CREATE TABLE` statement
pub const DEFAULT_TABLE_NAME: &str = "trees_fvsaggregate";


// =============================================================================
// Processing Defaults
// =============================================================================

/// Lower bound on concurrent file extractions
pub const MIN_CONCURRENT_FILES: usize = 1;

/// Progress bar template for per-file extraction
pub const PROGRESS_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}";
