//! Command-line interface components.

pub mod commands;

use crate::config::{DecodePolicy, ExtractConfig};
use crate::constants::DEFAULT_TABLE_NAME;
use crate::error::{ExtractError, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Extract FVS report tables into tidy CSV files
#[derive(Parser, Debug, Clone)]
#[command(name = "fvs_extract")]
#[command(
    about = "Extract carbon, harvest, summary and activity tables from FVS output files into CSV"
)]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Maximum report files extracted at once (defaults to the CPU count)
    #[arg(short = 'j', long = "workers", value_name = "N", global = true)]
    pub workers: Option<usize>,

    /// Skip data lines that do not decode instead of failing the file
    #[arg(long = "skip-bad-lines", global = true)]
    pub skip_bad_lines: bool,

    /// Disable progress bars
    #[arg(long = "no-progress", global = true)]
    pub no_progress: bool,

    /// Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        global = true
    )]
    pub verbose: u8,

    /// Suppress output except errors
    #[arg(short = 'q', long = "quiet", conflicts_with = "verbose", global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Merge every report file in one directory into a single CSV
    Extract {
        /// Directory holding the `.out` report files
        #[arg(value_name = "INDIR")]
        input_dir: PathBuf,

        /// CSV file to write
        #[arg(value_name = "OUTCSV")]
        output_csv: PathBuf,
    },

    /// Extract each run directory under `<BATCHDIR>/plots` into its own CSV
    Batch {
        /// Batch root containing a `plots` directory
        #[arg(value_name = "BATCHDIR", default_value = ".")]
        batch_dir: PathBuf,

        /// Output directory (defaults to `<BATCHDIR>/final`)
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,
    },

    /// Print the CREATE TABLE statement for the exported columns
    Ddl {
        /// Table name
        #[arg(long, default_value = DEFAULT_TABLE_NAME)]
        table: String,
    },
}

impl Args {
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        }
    }

    /// Progress bars are hidden in quiet mode
    pub fn show_progress(&self) -> bool {
        !self.quiet && !self.no_progress
    }

    /// Build the extraction config from the command-line flags
    pub fn to_config(&self) -> Result<ExtractConfig> {
        let mut config = ExtractConfig::default();

        if let Some(workers) = self.workers {
            config = config.with_max_concurrent_files(workers);
        }
        if self.skip_bad_lines {
            config = config.with_decode_policy(DecodePolicy::SkipLine);
        }
        if !self.show_progress() {
            config = config.without_progress();
        }

        config.validate().map_err(|e| match e {
            ExtractError::Configuration { message } => ExtractError::Configuration {
                message: format!("invalid command-line options: {}", message),
            },
            other => other,
        })?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_extract() {
        let args =
            Args::try_parse_from(["fvs_extract", "extract", "runs/plot1", "out.csv", "-j", "4"])
                .unwrap();

        match &args.command {
            Commands::Extract {
                input_dir,
                output_csv,
            } => {
                assert_eq!(input_dir, &PathBuf::from("runs/plot1"));
                assert_eq!(output_csv, &PathBuf::from("out.csv"));
            }
            other => panic!("Expected extract command, got {:?}", other),
        }
        assert_eq!(args.to_config().unwrap().max_concurrent_files, 4);
    }

    #[test]
    fn test_parse_batch_defaults() {
        let args = Args::try_parse_from(["fvs_extract", "batch"]).unwrap();

        match args.command {
            Commands::Batch { batch_dir, output } => {
                assert_eq!(batch_dir, PathBuf::from("."));
                assert!(output.is_none());
            }
            other => panic!("Expected batch command, got {:?}", other),
        }
    }

    #[test]
    fn test_log_levels() {
        let args = Args::try_parse_from(["fvs_extract", "-vv", "ddl"]).unwrap();
        assert_eq!(args.get_log_level(), "debug");

        let args = Args::try_parse_from(["fvs_extract", "ddl", "-q"]).unwrap();
        assert_eq!(args.get_log_level(), "error");
        assert!(!args.show_progress());

        assert!(Args::try_parse_from(["fvs_extract", "ddl", "-q", "-v"]).is_err());
    }

    #[test]
    fn test_config_from_flags() {
        let args =
            Args::try_parse_from(["fvs_extract", "batch", "--skip-bad-lines", "--no-progress"])
                .unwrap();
        let config = args.to_config().unwrap();
        assert_eq!(config.decode_policy, DecodePolicy::SkipLine);
        assert!(!config.show_progress);

        let args = Args::try_parse_from(["fvs_extract", "batch", "-j", "0"]).unwrap();
        assert!(matches!(
            args.to_config(),
            Err(ExtractError::Configuration { .. })
        ));
    }

    #[test]
    fn test_ddl_table_default() {
        let args = Args::try_parse_from(["fvs_extract", "ddl"]).unwrap();
        match args.command {
            Commands::Ddl { table } => assert_eq!(table, "trees_fvsaggregate"),
            other => panic!("Expected ddl command, got {:?}", other),
        }
    }
}
