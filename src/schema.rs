//! Report layouts and the wide-table column catalog.
//!
//! Every report FVS prints has a title marker, a fixed number of header
//! lines and a fixed-column data layout. These are kept together per
//! [`ReportKind`] so that a change in the report format is a single edit.
//! The column catalog fixes the order and storage type of the exported
//! wide table.

use crate::decoder::{FieldSpec, ValueType};
use crate::models::ActivityVariable;
use std::fmt;

/// Report blocks extracted from an FVS main output file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ReportKind {
    Carbon,
    HarvestedCarbon,
    Summary,
    Activity,
}

impl ReportKind {
    /// All kinds in join order
    pub const ALL: [ReportKind; 4] = [
        ReportKind::Carbon,
        ReportKind::HarvestedCarbon,
        ReportKind::Activity,
        ReportKind::Summary,
    ];

    pub fn layout(&self) -> &'static ReportLayout {
        match self {
            ReportKind::Carbon => &CARBON_LAYOUT,
            ReportKind::HarvestedCarbon => &HARVESTED_CARBON_LAYOUT,
            ReportKind::Summary => &SUMMARY_LAYOUT,
            ReportKind::Activity => &ACTIVITY_LAYOUT,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ReportKind::Carbon => "stand carbon",
            ReportKind::HarvestedCarbon => "harvested carbon",
            ReportKind::Summary => "summary statistics",
            ReportKind::Activity => "activity summary",
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where a report starts and how its data lines are laid out
#[derive(Debug)]
pub struct ReportLayout {
    /// Substring identifying the report title line
    pub marker: &'static str,
    /// Title lines starting with this prefix belong to a different report
    pub excluded_prefix: Option<&'static str>,
    /// Distance from the marker line to the first data line. The marker
    /// line itself counts as the first skipped line.
    pub header_skip: usize,
    /// Fixed-column schema of a data line; empty for the activity report,
    /// whose lines are read through [`ActivityColumns`]
    pub fields: &'static [FieldSpec],
}

impl ReportLayout {
    /// Whether `line` is the title line of this report
    pub fn matches_marker(&self, line: &str) -> bool {
        line.contains(self.marker)
            && !self
                .excluded_prefix
                .is_some_and(|prefix| line.starts_with(prefix))
    }
}

pub static CARBON_LAYOUT: ReportLayout = ReportLayout {
    marker: "STAND CARBON REPORT",
    excluded_prefix: None,
    header_skip: 9,
    fields: &[
        FieldSpec::new("year", 1, 4, ValueType::Int),
        FieldSpec::new("agl", 5, 13, ValueType::Float),
        FieldSpec::new("bgl", 23, 31, ValueType::Float),
        FieldSpec::new("dead", 41, 49, ValueType::Float),
        FieldSpec::new("total_stand_carbon", 77, 85, ValueType::Float),
    ],
};

pub static HARVESTED_CARBON_LAYOUT: ReportLayout = ReportLayout {
    marker: "HARVESTED PRODUCTS REPORT",
    // The CARBCUT keyword echo repeats the title
    excluded_prefix: Some("CARBCUT"),
    header_skip: 9,
    fields: &[
        FieldSpec::new("year", 1, 4, ValueType::Int),
        FieldSpec::new("merch_carbon_stored", 41, 49, ValueType::Float),
        FieldSpec::new("merch_carbon_removed", 50, 58, ValueType::Float),
    ],
};

pub static SUMMARY_LAYOUT: ReportLayout = ReportLayout {
    marker: "SUMMARY STATISTICS (PER ACRE OR STAND BASED ON TOTAL STAND AREA)",
    excluded_prefix: None,
    header_skip: 7,
    fields: &[
        FieldSpec::new("year", 1, 4, ValueType::Int),
        FieldSpec::new("age", 5, 8, ValueType::Int),
        FieldSpec::new("start_tpa", 9, 14, ValueType::Int),
        FieldSpec::new("start_ba", 15, 18, ValueType::Int),
        FieldSpec::new("start_total_ft3", 37, 42, ValueType::Int),
        FieldSpec::new("start_merch_ft3", 43, 48, ValueType::Int),
        FieldSpec::new("start_merch_bdft", 49, 54, ValueType::Int),
        FieldSpec::new("removed_tpa", 56, 60, ValueType::Int),
        FieldSpec::new("removed_total_ft3", 61, 66, ValueType::Int),
        FieldSpec::new("removed_merch_ft3", 67, 72, ValueType::Int),
        FieldSpec::new("removed_merch_bdft", 73, 78, ValueType::Int),
        FieldSpec::new("after_ba", 79, 82, ValueType::Int),
    ],
};

pub static ACTIVITY_LAYOUT: ReportLayout = ReportLayout {
    marker: "ACTIVITY SUMMARY",
    excluded_prefix: None,
    header_skip: 9,
    fields: &[],
};

/// Column layout of the activity summary's time-period sub-blocks
#[derive(Debug)]
pub struct ActivityColumns {
    /// Year on the line opening a time period
    pub year: FieldSpec,
    /// Compute variable name
    pub variable: FieldSpec,
    /// Activity status, e.g. `DONE IN 2025` or `NOT DONE`
    pub status: FieldSpec,
    pub value: FieldSpec,
    /// Statuses starting with this prefix carry a value
    pub done_prefix: &'static str,
    /// Lines starting with this prefix end the whole report
    pub terminator_prefix: &'static str,
}

pub static ACTIVITY_COLUMNS: ActivityColumns = ActivityColumns {
    year: FieldSpec::new("year", 8, 11, ValueType::Int),
    variable: FieldSpec::new("variable", 25, 34, ValueType::Text),
    status: FieldSpec::new("status", 41, 59, ValueType::Text),
    value: FieldSpec::new("value", 62, 72, ValueType::Float),
    done_prefix: "DONE IN",
    terminator_prefix: "-----",
};

/// Storage type of an exported column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Float,
    Integer,
    Text { max_len: usize },
}

impl ColumnType {
    pub fn sql_type(&self) -> String {
        match self {
            ColumnType::Float => "double precision".to_string(),
            ColumnType::Integer => "integer".to_string(),
            ColumnType::Text { max_len } => format!("character varying({})", max_len),
        }
    }
}

/// Which part of a wide row a column is read from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnSource {
    RunKey,
    Year,
    Report(ReportKind),
}

/// One column of the exported wide table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputColumn {
    pub name: String,
    pub column_type: ColumnType,
    pub source: ColumnSource,
    pub not_null: bool,
}

impl OutputColumn {
    fn new(name: &str, column_type: ColumnType, source: ColumnSource) -> Self {
        Self {
            name: name.to_string(),
            column_type,
            source,
            not_null: false,
        }
    }

    fn required(mut self) -> Self {
        self.not_null = true;
        self
    }
}

/// The wide table's columns in export order.
///
/// Carbon report columns (with the run key and year) come first, then the
/// harvested carbon columns, the activity vocabulary and the summary
/// statistics, each group ordered by name.
///
/// `rx`, `cond` and `site` are typed `integer` to match the existing
/// relational table. The filename tagger also accepts alphanumeric codes for
/// them, and runs named that way export to CSV fine but will not bulk load.
pub fn output_columns() -> Vec<OutputColumn> {
    use ColumnSource::{Report, RunKey, Year};
    use ColumnType::{Float, Integer, Text};

    let carbon = Report(ReportKind::Carbon);
    let harvested = Report(ReportKind::HarvestedCarbon);
    let summary = Report(ReportKind::Summary);

    let mut columns = vec![
        OutputColumn::new("agl", Float, carbon),
        OutputColumn::new("bgl", Float, carbon),
        OutputColumn::new("calc_carbon", Float, carbon),
        OutputColumn::new("climate", Text { max_len: 20 }, RunKey),
        OutputColumn::new("cond", Integer, RunKey).required(),
        OutputColumn::new("dead", Float, carbon),
        OutputColumn::new("offset", Integer, RunKey).required(),
        OutputColumn::new("rx", Integer, RunKey).required(),
        OutputColumn::new("site", Integer, RunKey).required(),
        OutputColumn::new("total_stand_carbon", Float, carbon),
        OutputColumn::new("var", Text { max_len: 2 }, RunKey).required(),
        OutputColumn::new("year", Integer, Year).required(),
        OutputColumn::new("merch_carbon_removed", Float, harvested),
        OutputColumn::new("merch_carbon_stored", Float, harvested),
    ];

    let mut activity: Vec<OutputColumn> = ActivityVariable::ALL
        .iter()
        .map(|variable| {
            OutputColumn::new(
                &variable.column_name(),
                Float,
                Report(ReportKind::Activity),
            )
        })
        .collect();
    activity.sort_by(|a, b| a.name.cmp(&b.name));
    columns.extend(activity);

    columns.extend(
        [
            "after_ba",
            "after_merch_bdft",
            "after_merch_ft3",
            "after_total_ft3",
            "after_tpa",
            "age",
            "removed_merch_bdft",
            "removed_merch_ft3",
            "removed_total_ft3",
            "removed_tpa",
            "start_ba",
            "start_merch_bdft",
            "start_merch_ft3",
            "start_total_ft3",
            "start_tpa",
        ]
        .into_iter()
        .map(|name| OutputColumn::new(name, Integer, summary)),
    );

    columns
}

/// `CREATE TABLE` statement mapping the wide table onto relational types
pub fn table_definition(table_name: &str) -> String {
    let body = output_columns()
        .iter()
        .map(|column| {
            let name = if column.name == "offset" {
                // reserved word in SQL
                "\"offset\"".to_string()
            } else {
                column.name.clone()
            };
            let constraint = if column.not_null { " NOT NULL" } else { "" };
            format!("    {} {}{}", name, column.column_type.sql_type(), constraint)
        })
        .collect::<Vec<_>>()
        .join(",\n");

    format!("CREATE TABLE {} (\n{}\n);", table_name, body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_marker_matching() {
        assert!(CARBON_LAYOUT.matches_marker("       STAND CARBON REPORT (BASED ON STOCKABLE AREA)"));
        assert!(!CARBON_LAYOUT.matches_marker("STAND COMPOSITION"));

        assert!(HARVESTED_CARBON_LAYOUT.matches_marker("    HARVESTED PRODUCTS REPORT"));
        assert!(
            !HARVESTED_CARBON_LAYOUT.matches_marker("CARBCUT   HARVESTED PRODUCTS REPORT"),
            "keyword echo must not open the report"
        );
    }

    #[test]
    fn test_header_skips_are_fixed() {
        assert_eq!(ReportKind::Carbon.layout().header_skip, 9);
        assert_eq!(ReportKind::HarvestedCarbon.layout().header_skip, 9);
        assert_eq!(ReportKind::Summary.layout().header_skip, 7);
        assert_eq!(ReportKind::Activity.layout().header_skip, 9);
    }

    #[test]
    fn test_schemas_start_with_year() {
        for kind in [
            ReportKind::Carbon,
            ReportKind::HarvestedCarbon,
            ReportKind::Summary,
        ] {
            let first = kind.layout().fields[0];
            assert_eq!(first.name, "year");
            assert_eq!((first.start, first.end), (1, 4));
        }
    }

    #[test]
    fn test_output_column_catalog() {
        let columns = output_columns();
        assert_eq!(columns.len(), 66);

        let names: HashSet<_> = columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names.len(), columns.len(), "column names must be unique");

        assert_eq!(columns[0].name, "agl");
        assert_eq!(columns[11].name, "year");
        assert_eq!(columns[14].name, "cedr_bf");
        assert_eq!(columns.last().unwrap().name, "start_tpa");
    }

    #[test]
    fn test_join_key_columns_come_from_run_and_year() {
        let columns = output_columns();
        let mut keyed: Vec<&str> = columns
            .iter()
            .filter(|c| matches!(c.source, ColumnSource::RunKey | ColumnSource::Year))
            .map(|c| c.name.as_str())
            .collect();
        keyed.sort_unstable();
        assert_eq!(
            keyed,
            vec!["climate", "cond", "offset", "rx", "site", "var", "year"]
        );
    }

    #[test]
    fn test_run_identifiers_load_as_integers() {
        let ddl = table_definition("stands");
        for name in ["rx", "cond", "site"] {
            assert!(ddl.contains(&format!("    {} integer NOT NULL,\n", name)));
        }
    }

    #[test]
    fn test_table_definition() {
        let ddl = table_definition("trees_fvsaggregate");

        assert!(ddl.starts_with("CREATE TABLE trees_fvsaggregate (\n"));
        assert!(ddl.contains("    agl double precision,\n"));
        assert!(ddl.contains("    climate character varying(20),\n"));
        assert!(ddl.contains("    \"offset\" integer NOT NULL,\n"));
        assert!(ddl.contains("    var character varying(2) NOT NULL,\n"));
        assert!(ddl.ends_with("    start_tpa integer\n);"));
    }
}
