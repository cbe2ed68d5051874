//! Header tracking and tabular report blocks.

use crate::decoder::{FieldDecodeError, decode_line};
use crate::error::{ExtractError, Result};
use crate::models::{CarbonRow, HarvestedCarbonRow, ReportRow, RunKey, SummaryRow};
use crate::schema::{ReportKind, ReportLayout};
use std::sync::Arc;
use tracing::debug;

/// Position of a report block scanner within its file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    /// Looking for the report title
    Seeking,
    /// Inside the report header; `remaining` lines left before data
    SkippingHeader { remaining: usize },
    ReadingData,
    /// The block has ended; later lines are ignored
    Done,
}

/// What a line means to one report block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineRole {
    Outside,
    Header,
    Data,
}

/// Marker detection and header skipping shared by every report kind
#[derive(Debug)]
pub struct BlockCursor {
    layout: &'static ReportLayout,
    state: ScanState,
}

impl BlockCursor {
    pub fn new(layout: &'static ReportLayout) -> Self {
        Self {
            layout,
            state: ScanState::Seeking,
        }
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    /// Classify `line` and move the state machine past it.
    ///
    /// A title line restarts the header skip from any state but `Done`; the
    /// title counts as the first header line.
    pub fn advance(&mut self, line: &str) -> LineRole {
        if self.state != ScanState::Done && self.layout.matches_marker(line) {
            self.state = ScanState::SkippingHeader {
                remaining: self.layout.header_skip,
            };
        }

        match self.state {
            ScanState::Seeking | ScanState::Done => LineRole::Outside,
            ScanState::SkippingHeader { remaining } => {
                let remaining = remaining.saturating_sub(1);
                self.state = if remaining == 0 {
                    ScanState::ReadingData
                } else {
                    ScanState::SkippingHeader { remaining }
                };
                LineRole::Header
            }
            ScanState::ReadingData => LineRole::Data,
        }
    }

    pub fn finish(&mut self) {
        self.state = ScanState::Done;
    }
}

/// Attach report and line context to a decoder failure
pub(crate) fn decode_error(
    kind: ReportKind,
    err: FieldDecodeError,
    line_number: usize,
) -> ExtractError {
    ExtractError::FieldDecode {
        report: kind.name(),
        field: err.field,
        raw: err.raw,
        line_number,
    }
}

/// Scanner for the single-block reports: one decoded row per data line
/// until the first blank line
#[derive(Debug)]
pub struct TabularScanner {
    kind: ReportKind,
    cursor: BlockCursor,
}

impl TabularScanner {
    pub fn new(kind: ReportKind) -> Self {
        Self {
            kind,
            cursor: BlockCursor::new(kind.layout()),
        }
    }

    pub fn is_done(&self) -> bool {
        self.cursor.state() == ScanState::Done
    }

    pub fn feed(
        &mut self,
        line: &str,
        line_number: usize,
        run: &Arc<RunKey>,
    ) -> Result<Option<ReportRow>> {
        if self.cursor.advance(line) != LineRole::Data {
            return Ok(None);
        }

        let data = line.trim();
        if data.is_empty() {
            debug!("{} report ends at line {}", self.kind, line_number);
            self.cursor.finish();
            return Ok(None);
        }

        let fields = self.kind.layout().fields;
        let decoded =
            decode_line(data, fields).map_err(|e| decode_error(self.kind, e, line_number))?;
        let run = Arc::clone(run);

        let row = match self.kind {
            ReportKind::Carbon => CarbonRow::from_decoded(run, &decoded).map(ReportRow::Carbon),
            ReportKind::HarvestedCarbon => {
                HarvestedCarbonRow::from_decoded(run, &decoded).map(ReportRow::HarvestedCarbon)
            }
            ReportKind::Summary => SummaryRow::from_decoded(run, &decoded).map(ReportRow::Summary),
            ReportKind::Activity => unreachable!("activity report has its own scanner"),
        }
        .map_err(|e| decode_error(self.kind, e, line_number))?;

        Ok(Some(row))
    }
}
