//! Command implementations for the FVS extractor CLI
//!
//! Sets up logging, builds the extraction config from the arguments and
//! dispatches to the extract, batch and ddl commands.

use crate::cli::{Args, Commands};
use crate::error::Result;
use crate::models::ExtractionStats;
use crate::processor::{BatchProcessor, extract_to_csv};
use crate::schema::table_definition;
use colored::*;
use std::path::Path;
use tracing::{debug, info};

/// Main command runner
pub async fn run(args: Args) -> Result<()> {
    setup_logging(&args);
    debug!("Command line arguments: {:?}", args);

    match &args.command {
        Commands::Extract {
            input_dir,
            output_csv,
        } => {
            let stats = run_extract(&args, input_dir, output_csv).await?;
            report_extract(&stats);
        }
        Commands::Batch { batch_dir, output } => {
            let config = args.to_config()?;
            let mut processor =
                BatchProcessor::new(batch_dir.clone(), output.clone())?.with_config(config);
            processor.process().await?;
        }
        Commands::Ddl { table } => {
            println!("{}", table_definition(table));
        }
    }

    Ok(())
}

async fn run_extract(args: &Args, input_dir: &Path, output_csv: &Path) -> Result<ExtractionStats> {
    let config = args.to_config()?;
    info!(
        "Extracting {} into {}",
        input_dir.display(),
        output_csv.display()
    );
    extract_to_csv(input_dir, output_csv, config).await
}

fn report_extract(stats: &ExtractionStats) {
    println!(
        "{} {} rows from {} files",
        "Extracted".bright_green().bold(),
        stats.total_rows.to_string().bright_white().bold(),
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
    if let Some(path) = &stats.output_path {
        println!("  {} {}", "Output:".bright_cyan(), path.display());
    }
}

/// Initialize tracing on stderr
fn setup_logging(args: &Args) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.get_log_level();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("fvs_extract={}", log_level)));

    // a subscriber may already be installed
    if args.quiet {
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .try_init();
    } else {
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .try_init();
    }

    debug!("Logging initialized at level: {}", log_level);
}
