//! Core data structures for FVS report extraction.
//!
//! Defines the run key shared by every row of a file, one typed row per
//! report kind, the fixed activity vocabulary and processing statistics.

use crate::decoder::{DecodedLine, FieldDecodeError};
use crate::schema::ReportKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Identifies one simulation run; derived from the report file name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RunKey {
    /// FVS variant code (`var`)
    pub variable: String,
    /// Prescription (`rx`)
    pub prescription: String,
    /// Condition (`cond`)
    pub condition: String,
    pub site: String,
    /// Climate scenario (`clim`)
    pub climate: String,
    /// Plot offset in years (`off`)
    pub offset: String,
}

impl RunKey {
    /// Rebuild the file name prefix this key was parsed from
    pub fn file_prefix(&self) -> String {
        format!(
            "var{}_rx{}_cond{}_site{}_clim{}_off{}",
            self.variable, self.prescription, self.condition, self.site, self.climate, self.offset
        )
    }
}

impl fmt::Display for RunKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.file_prefix())
    }
}

/// Join key of a report row: the run and the simulation year
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JoinKey {
    pub run: Arc<RunKey>,
    pub year: i64,
}

impl JoinKey {
    /// Sort order of the wide table: var, rx, cond, site, offset, climate,
    /// then year. Run components compare as text.
    fn sort_tuple(&self) -> (&str, &str, &str, &str, &str, &str, i64) {
        (
            &self.run.variable,
            &self.run.prescription,
            &self.run.condition,
            &self.run.site,
            &self.run.offset,
            &self.run.climate,
            self.year,
        )
    }

    pub fn join_order(&self, other: &Self) -> std::cmp::Ordering {
        self.sort_tuple().cmp(&other.sort_tuple())
    }
}

/// Rows that take part in the outer join
pub trait Keyed {
    fn run(&self) -> &Arc<RunKey>;
    fn year(&self) -> i64;

    fn join_key(&self) -> JoinKey {
        JoinKey {
            run: Arc::clone(self.run()),
            year: self.year(),
        }
    }
}

/// One data line of the stand carbon report
#[derive(Debug, Clone, PartialEq)]
pub struct CarbonRow {
    pub run: Arc<RunKey>,
    pub year: i64,
    /// Aboveground live carbon
    pub agl: f64,
    /// Belowground live carbon
    pub bgl: f64,
    pub dead: f64,
    /// Total as printed by FVS
    pub total_stand_carbon: f64,
    /// `agl + bgl + dead`, a cross-check against the printed total
    pub calc_carbon: f64,
}

impl CarbonRow {
    pub fn from_decoded(run: Arc<RunKey>, line: &DecodedLine) -> Result<Self, FieldDecodeError> {
        let agl = line.require_float("agl")?;
        let bgl = line.require_float("bgl")?;
        let dead = line.require_float("dead")?;
        Ok(Self {
            run,
            year: line.require_int("year")?,
            agl,
            bgl,
            dead,
            total_stand_carbon: line.require_float("total_stand_carbon")?,
            calc_carbon: agl + bgl + dead,
        })
    }
}

/// One data line of the harvested products carbon report
#[derive(Debug, Clone, PartialEq)]
pub struct HarvestedCarbonRow {
    pub run: Arc<RunKey>,
    pub year: i64,
    pub merch_carbon_stored: f64,
    pub merch_carbon_removed: f64,
}

impl HarvestedCarbonRow {
    pub fn from_decoded(run: Arc<RunKey>, line: &DecodedLine) -> Result<Self, FieldDecodeError> {
        Ok(Self {
            run,
            year: line.require_int("year")?,
            merch_carbon_stored: line.require_float("merch_carbon_stored")?,
            merch_carbon_removed: line.require_float("merch_carbon_removed")?,
        })
    }
}

/// One cycle of the summary statistics report, with post-removal values
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRow {
    pub run: Arc<RunKey>,
    pub year: i64,
    pub age: i64,
    pub start_tpa: i64,
    pub start_ba: i64,
    pub start_total_ft3: i64,
    pub start_merch_ft3: i64,
    pub start_merch_bdft: i64,
    pub removed_tpa: i64,
    pub removed_total_ft3: i64,
    pub removed_merch_ft3: i64,
    pub removed_merch_bdft: i64,
    pub after_ba: i64,
    pub after_tpa: i64,
    pub after_total_ft3: i64,
    pub after_merch_ft3: i64,
    pub after_merch_bdft: i64,
}

impl SummaryRow {
    pub fn from_decoded(run: Arc<RunKey>, line: &DecodedLine) -> Result<Self, FieldDecodeError> {
        let start_tpa = line.require_int("start_tpa")?;
        let start_total_ft3 = line.require_int("start_total_ft3")?;
        let start_merch_ft3 = line.require_int("start_merch_ft3")?;
        let start_merch_bdft = line.require_int("start_merch_bdft")?;
        let removed_tpa = line.require_int("removed_tpa")?;
        let removed_total_ft3 = line.require_int("removed_total_ft3")?;
        let removed_merch_ft3 = line.require_int("removed_merch_ft3")?;
        let removed_merch_bdft = line.require_int("removed_merch_bdft")?;

        Ok(Self {
            run,
            year: line.require_int("year")?,
            age: line.require_int("age")?,
            start_tpa,
            start_ba: line.require_int("start_ba")?,
            start_total_ft3,
            start_merch_ft3,
            start_merch_bdft,
            removed_tpa,
            removed_total_ft3,
            removed_merch_ft3,
            removed_merch_bdft,
            after_ba: line.require_int("after_ba")?,
            after_tpa: start_tpa - removed_tpa,
            after_total_ft3: start_total_ft3 - removed_total_ft3,
            after_merch_ft3: start_merch_ft3 - removed_merch_ft3,
            after_merch_bdft: start_merch_bdft - removed_merch_bdft,
        })
    }

    /// Integer value by exported column name
    pub fn column(&self, name: &str) -> Option<i64> {
        let value = match name {
            "age" => self.age,
            "start_tpa" => self.start_tpa,
            "start_ba" => self.start_ba,
            "start_total_ft3" => self.start_total_ft3,
            "start_merch_ft3" => self.start_merch_ft3,
            "start_merch_bdft" => self.start_merch_bdft,
            "removed_tpa" => self.removed_tpa,
            "removed_total_ft3" => self.removed_total_ft3,
            "removed_merch_ft3" => self.removed_merch_ft3,
            "removed_merch_bdft" => self.removed_merch_bdft,
            "after_ba" => self.after_ba,
            "after_tpa" => self.after_tpa,
            "after_total_ft3" => self.after_total_ft3,
            "after_merch_ft3" => self.after_merch_ft3,
            "after_merch_bdft" => self.after_merch_bdft,
            _ => return None,
        };
        Some(value)
    }
}

macro_rules! activity_vocabulary {
    ($($variant:ident => $code:literal),+ $(,)?) => {
        /// Compute variables recorded from the activity summary
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum ActivityVariable {
            $($variant),+
        }

        impl ActivityVariable {
            pub const ALL: &'static [ActivityVariable] = &[$(ActivityVariable::$variant),+];

            /// Name as printed in the report
            pub fn code(&self) -> &'static str {
                match self {
                    $(ActivityVariable::$variant => $code),+
                }
            }

            pub fn from_code(code: &str) -> Option<Self> {
                match code {
                    $($code => Some(ActivityVariable::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

activity_vocabulary! {
    PineHrv => "PINE_HRV",
    SprcHrv => "SPRC_HRV",
    PineBf => "PINE_BF",
    SprcBf => "SPRC_BF",
    CedrHrv => "CEDR_HRV",
    DfHrv => "DF_HRV",
    HwHrv => "HW_HRV",
    MnconHrv => "MNCONHRV",
    MnhwHrv => "MNHW_HRV",
    WjHrv => "WJ_HRV",
    WwHrv => "WW_HRV",
    CedrBf => "CEDR_BF",
    DfBf => "DF_BF",
    HwBf => "HW_BF",
    MnconBf => "MNCONBF",
    MnhwBf => "MNHW_BF",
    WjBf => "WJ_BF",
    WwBf => "WW_BF",
    CutType => "CUT_TYPE",
    SmCf => "SM_CF",
    SmHw => "SM_HW",
    SmTpa => "SM_TPA",
    LgCf => "LG_CF",
    LgHw => "LG_HW",
    LgTpa => "LG_TPA",
    ChCf => "CH_CF",
    ChHw => "CH_HW",
    ChTpa => "CH_TPA",
    NsoNest => "NSONEST",
    NsoFrg => "NSOFRG",
    NsoDis => "NSODIS",
    PpBtl => "PP_BTL",
    LpBtl => "LP_BTL",
    EsBtl => "ES_BTL",
    FireHzd => "FIREHZD",
    SppRich => "SPPRICH",
    SppSimp => "SPPSIMP",
}

impl ActivityVariable {
    /// Column name in the exported table
    pub fn column_name(&self) -> String {
        self.code().to_lowercase()
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for ActivityVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Values of every vocabulary variable for one time period; unset
/// variables stay explicit nulls
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityValues {
    values: Vec<Option<f64>>,
}

impl Default for ActivityValues {
    fn default() -> Self {
        Self {
            values: vec![None; ActivityVariable::ALL.len()],
        }
    }
}

impl ActivityValues {
    pub fn get(&self, variable: ActivityVariable) -> Option<f64> {
        self.values[variable.index()]
    }

    pub fn set(&mut self, variable: ActivityVariable, value: f64) {
        self.values[variable.index()] = Some(value);
    }

    pub fn iter(&self) -> impl Iterator<Item = (ActivityVariable, Option<f64>)> + '_ {
        ActivityVariable::ALL
            .iter()
            .map(|variable| (*variable, self.get(*variable)))
    }

    /// Number of variables holding a value
    pub fn recorded(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }
}

/// One time period of the activity summary
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityRow {
    pub run: Arc<RunKey>,
    pub year: i64,
    pub values: ActivityValues,
}

impl ActivityRow {
    pub fn new(run: Arc<RunKey>, year: i64) -> Self {
        Self {
            run,
            year,
            values: ActivityValues::default(),
        }
    }
}

macro_rules! impl_keyed {
    ($($row:ty),+) => {
        $(impl Keyed for $row {
            fn run(&self) -> &Arc<RunKey> {
                &self.run
            }

            fn year(&self) -> i64 {
                self.year
            }
        })+
    };
}

impl_keyed!(CarbonRow, HarvestedCarbonRow, SummaryRow, ActivityRow);

/// A row produced by the report scanner
#[derive(Debug, Clone, PartialEq)]
pub enum ReportRow {
    Carbon(CarbonRow),
    HarvestedCarbon(HarvestedCarbonRow),
    Summary(SummaryRow),
    Activity(ActivityRow),
}

impl ReportRow {
    pub fn kind(&self) -> ReportKind {
        match self {
            ReportRow::Carbon(_) => ReportKind::Carbon,
            ReportRow::HarvestedCarbon(_) => ReportKind::HarvestedCarbon,
            ReportRow::Summary(_) => ReportKind::Summary,
            ReportRow::Activity(_) => ReportKind::Activity,
        }
    }

    pub fn year(&self) -> i64 {
        match self {
            ReportRow::Carbon(row) => row.year,
            ReportRow::HarvestedCarbon(row) => row.year,
            ReportRow::Summary(row) => row.year,
            ReportRow::Activity(row) => row.year,
        }
    }
}

/// Processing statistics
#[derive(Debug, Default, Clone)]
pub struct ExtractionStats {
    pub files_processed: usize,
    pub files_failed: usize,
    /// Rows produced per report kind, before merging
    pub report_rows: BTreeMap<ReportKind, usize>,
    /// Rows in the merged wide table
    pub total_rows: usize,
    /// Data lines skipped under the skip-line decode policy
    pub lines_skipped: usize,
    pub output_path: Option<PathBuf>,
    pub processing_time_ms: u128,
}

impl ExtractionStats {
    /// Fold another run's counts into this one
    pub fn absorb(&mut self, other: &ExtractionStats) {
        self.files_processed += other.files_processed;
        self.files_failed += other.files_failed;
        self.total_rows += other.total_rows;
        self.lines_skipped += other.lines_skipped;
        for (kind, count) in &other.report_rows {
            *self.report_rows.entry(*kind).or_default() += count;
        }
    }
}
