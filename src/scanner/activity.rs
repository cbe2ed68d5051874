//! Activity summary scanning.
//!
//! The activity summary lists scheduled keyword activities grouped by
//! time period. Each period opens with a line carrying its year, lists one
//! activity per line and ends with a blank line; a line of dashes closes
//! the whole report.

use super::section::{BlockCursor, LineRole, ScanState, decode_error};
use crate::decoder::decode_line;
use crate::error::Result;
use crate::models::{ActivityRow, ActivityVariable, ReportRow, RunKey};
use crate::schema::{ACTIVITY_COLUMNS, ReportKind};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug)]
pub struct ActivityScanner {
    cursor: BlockCursor,
    /// Time period being accumulated
    current: Option<ActivityRow>,
}

impl Default for ActivityScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl ActivityScanner {
    pub fn new() -> Self {
        Self {
            cursor: BlockCursor::new(ReportKind::Activity.layout()),
            current: None,
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

        let columns = &ACTIVITY_COLUMNS;

        if line.trim().is_empty() {
            return Ok(self.flush());
        }

        if line.starts_with(columns.terminator_prefix) {
            debug!("activity summary ends at line {}", line_number);
            let row = self.flush();
            self.cursor.finish();
            return Ok(row);
        }

        let to_error = |e| decode_error(ReportKind::Activity, e, line_number);

        match self.current.as_mut() {
            None => {
                let year = decode_line(line, std::slice::from_ref(&columns.year))
                    .and_then(|decoded| decoded.require_int(columns.year.name))
                    .map_err(to_error)?;
                self.current = Some(ActivityRow::new(Arc::clone(run), year));
            }
            Some(row) => {
                let decoded =
                    decode_line(line, &[columns.variable, columns.status]).map_err(to_error)?;
                let name = decoded.text(columns.variable.name).unwrap_or_default();
                let status = decoded.text(columns.status.name).unwrap_or_default();

                if !status.starts_with(columns.done_prefix) {
                    return Ok(None);
                }
                if let Some(variable) = ActivityVariable::from_code(name) {
                    let value = decode_line(line, std::slice::from_ref(&columns.value))
                        .and_then(|decoded| decoded.require_float(columns.value.name))
                        .map_err(to_error)?;
                    row.values.set(variable, value);
                }
            }
        }

        Ok(None)
    }

    /// Close the current time period, if one was opened
    fn flush(&mut self) -> Option<ReportRow> {
        self.current.take().map(ReportRow::Activity)
    }

    /// Called at end of input. A period without its closing blank line is
    /// dropped.
    pub fn finish(&mut self) {
        if let Some(row) = self.current.take() {
            warn!(
                "Dropping unterminated activity period {} for {}",
                row.year, row.run
            );
        }
        self.cursor.finish();
    }
}
