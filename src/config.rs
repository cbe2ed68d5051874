//! Configuration management and validation.
//!
//! Processing parameters for the extraction driver: concurrency, the
//! policy applied to undecodable data lines and the directory conventions
//! of a batch run.

use crate::constants::{
    MIN_CONCURRENT_FILES, OUTPUT_DIR_NAME, PLOTS_DIR_NAME, REPORT_FILE_EXTENSION,
};
use crate::error::{ExtractError, Result};
use serde::{Deserialize, Serialize};

/// What to do with a data line that does not match its report schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DecodePolicy {
    /// Fail the whole file so malformed reports are noticed
    #[default]
    FailFile,
    /// Log the line and keep scanning
    SkipLine,
}

/// Global configuration for FVS extraction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractConfig {
    /// Maximum report files extracted at once
    pub max_concurrent_files: usize,

    /// Handling of undecodable data lines
    pub decode_policy: DecodePolicy,

    /// Show progress bars
    pub show_progress: bool,

    /// Extension of report files to pick up
    pub file_extension: String,

    /// Subdirectory of a batch root holding the run directories
    pub plots_dir_name: String,

    /// Subdirectory of a batch root receiving the CSV files
    pub output_dir_name: String,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            max_concurrent_files: num_cpus::get().max(MIN_CONCURRENT_FILES),
            decode_policy: DecodePolicy::default(),
            show_progress: true,
            file_extension: REPORT_FILE_EXTENSION.to_string(),
            plots_dir_name: PLOTS_DIR_NAME.to_string(),
            output_dir_name: OUTPUT_DIR_NAME.to_string(),
        }
    }
}

impl ExtractConfig {
    pub fn with_max_concurrent_files(mut self, max_files: usize) -> Self {
        self.max_concurrent_files = max_files;
        self
    }

    pub fn with_decode_policy(mut self, policy: DecodePolicy) -> Self {
        self.decode_policy = policy;
        self
    }

    pub fn without_progress(mut self) -> Self {
        self.show_progress = false;
        self
    }

    pub fn with_file_extension(mut self, extension: impl Into<String>) -> Self {
        self.file_extension = extension.into();
        self
    }

    pub fn with_output_dir_name(mut self, name: impl Into<String>) -> Self {
        self.output_dir_name = name.into();
        self
    }

    /// Reject settings the driver cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrent_files < MIN_CONCURRENT_FILES {
            return Err(ExtractError::Configuration {
                message: format!(
                    "max_concurrent_files must be at least {}",
                    MIN_CONCURRENT_FILES
                ),
            });
        }

        let extension = self.file_extension.trim_start_matches('.');
        if extension.is_empty() || extension.contains(['/', '*', '?']) {
            return Err(ExtractError::Configuration {
                message: format!("invalid report file extension '{}'", self.file_extension),
            });
        }

        if self.plots_dir_name.is_empty() || self.output_dir_name.is_empty() {
            return Err(ExtractError::Configuration {
                message: "directory names must not be empty".to_string(),
            });
        }

        Ok(())
    }

    /// Extension without a leading dot
    pub fn extension(&self) -> &str {
        self.file_extension.trim_start_matches('.')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ExtractConfig::default();
        assert!(config.max_concurrent_files >= 1);
        assert_eq!(config.decode_policy, DecodePolicy::FailFile);
        assert_eq!(config.extension(), "out");
        assert_eq!(config.plots_dir_name, "plots");
        assert_eq!(config.output_dir_name, "final");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builders() {
        let config = ExtractConfig::default()
            .with_max_concurrent_files(2)
            .with_decode_policy(DecodePolicy::SkipLine)
            .with_file_extension(".OUT")
            .with_output_dir_name("csv")
            .without_progress();

        assert_eq!(config.max_concurrent_files, 2);
        assert_eq!(config.decode_policy, DecodePolicy::SkipLine);
        assert_eq!(config.extension(), "OUT");
        assert_eq!(config.output_dir_name, "csv");
        assert!(!config.show_progress);
    }

    #[test]
    fn test_validation_failures() {
        let zero = ExtractConfig::default().with_max_concurrent_files(0);
        assert!(matches!(
            zero.validate(),
            Err(ExtractError::Configuration { .. })
        ));

        let glob = ExtractConfig::default().with_file_extension("*");
        assert!(glob.validate().is_err());

        let empty = ExtractConfig::default().with_file_extension(".");
        assert!(empty.validate().is_err());
    }
}
