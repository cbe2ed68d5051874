//! Row aggregation and the outer merge into one wide table.
//!
//! The four reports of a run are independent tables keyed on the run and
//! year. They are outer-joined in a fixed order (carbon, harvested carbon,
//! activity, summary) so every key seen in any report gets a row, with
//! absent report columns left null.

use crate::models::{
    ActivityRow, ActivityValues, CarbonRow, HarvestedCarbonRow, JoinKey, Keyed, ReportRow,
    SummaryRow,
};
use crate::schema::ReportKind;
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

/// Rows collected from one or more files, grouped by report kind
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportRows {
    pub carbon: Vec<CarbonRow>,
    pub harvested_carbon: Vec<HarvestedCarbonRow>,
    pub summary: Vec<SummaryRow>,
    pub activity: Vec<ActivityRow>,
}

impl ReportRows {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, row: ReportRow) {
        match row {
            ReportRow::Carbon(row) => self.carbon.push(row),
            ReportRow::HarvestedCarbon(row) => self.harvested_carbon.push(row),
            ReportRow::Summary(row) => self.summary.push(row),
            ReportRow::Activity(row) => self.activity.push(row),
        }
    }

    /// Append another collection, e.g. the rows of the next file
    pub fn extend(&mut self, other: ReportRows) {
        self.carbon.extend(other.carbon);
        self.harvested_carbon.extend(other.harvested_carbon);
        self.summary.extend(other.summary);
        self.activity.extend(other.activity);
    }

    pub fn count(&self, kind: ReportKind) -> usize {
        match kind {
            ReportKind::Carbon => self.carbon.len(),
            ReportKind::HarvestedCarbon => self.harvested_carbon.len(),
            ReportKind::Summary => self.summary.len(),
            ReportKind::Activity => self.activity.len(),
        }
    }

    pub fn counts(&self) -> BTreeMap<ReportKind, usize> {
        ReportKind::ALL
            .iter()
            .map(|kind| (*kind, self.count(*kind)))
            .collect()
    }

    pub fn len(&self) -> usize {
        ReportKind::ALL.iter().map(|kind| self.count(*kind)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FromIterator<ReportRow> for ReportRows {
    fn from_iter<I: IntoIterator<Item = ReportRow>>(iter: I) -> Self {
        let mut rows = ReportRows::new();
        for row in iter {
            rows.push(row);
        }
        rows
    }
}

/// One (run, year) observation across all reports
#[derive(Debug, Clone, PartialEq)]
pub struct WideRow {
    pub key: JoinKey,
    pub carbon: Option<CarbonRow>,
    pub harvested_carbon: Option<HarvestedCarbonRow>,
    pub activity: Option<ActivityValues>,
    pub summary: Option<SummaryRow>,
}

impl WideRow {
    pub fn new(key: JoinKey) -> Self {
        Self {
            key,
            carbon: None,
            harvested_carbon: None,
            activity: None,
            summary: None,
        }
    }

    /// Whether the row carries columns from `kind`
    pub fn has(&self, kind: ReportKind) -> bool {
        match kind {
            ReportKind::Carbon => self.carbon.is_some(),
            ReportKind::HarvestedCarbon => self.harvested_carbon.is_some(),
            ReportKind::Summary => self.summary.is_some(),
            ReportKind::Activity => self.activity.is_some(),
        }
    }
}

/// The merged table, sorted by join key
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WideTable {
    rows: Vec<WideRow>,
}

impl WideTable {
    pub fn rows(&self) -> &[WideRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &WideRow> {
        self.rows.iter()
    }
}

/// Outer join `right` onto `left` by join key.
///
/// A left row matching several right rows is repeated once per match; no
/// duplicate keys are removed.
pub fn outer_join<R, F>(left: Vec<WideRow>, right: Vec<R>, attach: F) -> Vec<WideRow>
where
    R: Keyed + Clone,
    F: Fn(&mut WideRow, R),
{
    let mut by_key: BTreeMap<JoinKey, Vec<R>> = BTreeMap::new();
    for row in right {
        by_key.entry(row.join_key()).or_default().push(row);
    }

    let mut matched: HashSet<JoinKey> = HashSet::new();
    let mut joined = Vec::with_capacity(left.len().max(by_key.len()));

    for row in left {
        match by_key.get(&row.key) {
            Some(candidates) => {
                matched.insert(row.key.clone());
                for candidate in candidates {
                    let mut merged = row.clone();
                    attach(&mut merged, candidate.clone());
                    joined.push(merged);
                }
            }
            None => joined.push(row),
        }
    }

    for (key, rows) in by_key {
        if matched.contains(&key) {
            continue;
        }
        for row in rows {
            let mut merged = WideRow::new(key.clone());
            attach(&mut merged, row);
            joined.push(merged);
        }
    }

    joined.sort_by(|a, b| a.key.join_order(&b.key));
    joined
}

/// Merge the four report tables into one wide table
pub fn merge_reports(rows: ReportRows) -> WideTable {
    let ReportRows {
        carbon,
        harvested_carbon,
        summary,
        activity,
    } = rows;

    debug!(
        "Merging {} carbon, {} harvested carbon, {} activity and {} summary rows",
        carbon.len(),
        harvested_carbon.len(),
        activity.len(),
        summary.len()
    );

    let merged = outer_join(Vec::new(), carbon, |wide, row| wide.carbon = Some(row));
    let merged = outer_join(merged, harvested_carbon, |wide, row| {
        wide.harvested_carbon = Some(row)
    });
    let merged = outer_join(merged, activity, |wide, row| {
        wide.activity = Some(row.values)
    });
    let merged = outer_join(merged, summary, |wide, row| wide.summary = Some(row));

    WideTable { rows: merged }
}
