//! CSV export of the merged wide table
//!
//! Builds a polars [`DataFrame`] with one column per [`output_columns`]
//! entry and writes it with a header row. Absent report values are
//! written as empty fields.

use crate::aggregate::{WideRow, WideTable};
use crate::error::{ExtractError, Result};
use crate::models::{ActivityVariable, RunKey};
use crate::schema::{ColumnSource, OutputColumn, ReportKind, output_columns};

use polars::prelude::{Column, CsvWriter, DataFrame, NamedFrom, SerWriter};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Writes wide tables to a CSV file
#[derive(Debug, Clone)]
pub struct CsvExporter {
    output_path: PathBuf,
}

impl CsvExporter {
    pub fn new(output_path: PathBuf) -> Self {
        Self { output_path }
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Write `table`, creating parent directories as needed. Returns the
    /// number of data rows written.
    pub fn write(&self, table: &WideTable) -> Result<usize> {
        let mut df = to_dataframe(table)?;

        if let Some(parent) = self.output_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut file = File::create(&self.output_path)?;
        CsvWriter::new(&mut file)
            .include_header(true)
            .finish(&mut df)
            .map_err(|e| ExtractError::ProcessingFailed {
                path: self.output_path.clone(),
                reason: format!("Failed to write CSV: {}", e),
            })?;

        debug!(
            "Wrote {} rows x {} columns to {}",
            df.height(),
            df.width(),
            self.output_path.display()
        );

        Ok(df.height())
    }
}

/// Convert the wide table into a frame in export column order
pub fn to_dataframe(table: &WideTable) -> Result<DataFrame> {
    let columns = output_columns()
        .iter()
        .map(|column| build_column(column, table.rows()))
        .collect::<Vec<_>>();

    Ok(DataFrame::new(columns)?)
}

fn build_column(column: &OutputColumn, rows: &[WideRow]) -> Column {
    let name = column.name.as_str();

    match column.source {
        ColumnSource::RunKey => {
            let values: Vec<&str> = rows
                .iter()
                .map(|row| run_key_value(&row.key.run, name))
                .collect();
            Column::new(name.into(), values)
        }
        ColumnSource::Year => {
            let values: Vec<i64> = rows.iter().map(|row| row.key.year).collect();
            Column::new(name.into(), values)
        }
        ColumnSource::Report(ReportKind::Summary) => {
            let values: Vec<Option<i64>> = rows
                .iter()
                .map(|row| row.summary.as_ref().and_then(|s| s.column(name)))
                .collect();
            Column::new(name.into(), values)
        }
        ColumnSource::Report(ReportKind::Activity) => {
            let variable = ActivityVariable::ALL
                .iter()
                .copied()
                .find(|variable| variable.column_name() == name);
            let values: Vec<Option<f64>> = rows
                .iter()
                .map(|row| {
                    let values = row.activity.as_ref()?;
                    values.get(variable?)
                })
                .collect();
            Column::new(name.into(), values)
        }
        ColumnSource::Report(kind) => {
            let values: Vec<Option<f64>> = rows
                .iter()
                .map(|row| report_value(row, kind, name))
                .collect();
            Column::new(name.into(), values)
        }
    }
}

fn run_key_value<'a>(run: &'a RunKey, name: &str) -> &'a str {
    match name {
        "var" => &run.variable,
        "rx" => &run.prescription,
        "cond" => &run.condition,
        "site" => &run.site,
        "climate" => &run.climate,
        "offset" => &run.offset,
        _ => "",
    }
}

fn report_value(row: &WideRow, kind: ReportKind, name: &str) -> Option<f64> {
    match kind {
        ReportKind::Carbon => {
            let carbon = row.carbon.as_ref()?;
            match name {
                "agl" => Some(carbon.agl),
                "bgl" => Some(carbon.bgl),
                "dead" => Some(carbon.dead),
                "total_stand_carbon" => Some(carbon.total_stand_carbon),
                "calc_carbon" => Some(carbon.calc_carbon),
                _ => None,
            }
        }
        ReportKind::HarvestedCarbon => {
            let harvested = row.harvested_carbon.as_ref()?;
            match name {
                "merch_carbon_stored" => Some(harvested.merch_carbon_stored),
                "merch_carbon_removed" => Some(harvested.merch_carbon_removed),
                _ => None,
            }
        }
        ReportKind::Summary | ReportKind::Activity => None,
    }
}
