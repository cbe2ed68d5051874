//! Single-pass report extraction.
//!
//! [`ReportScanner`] reads an FVS output file once and advances one
//! sub-scanner per report kind on every line. Rows come out as a lazy,
//! finite sequence in the order their data lines end in the file.
//!
//! Decode failures are yielded as `Err` items and scanning continues, so
//! the caller decides whether a bad line aborts the file or is skipped.

pub mod activity;
pub mod section;

pub use activity::ActivityScanner;
pub use section::{BlockCursor, LineRole, ScanState, TabularScanner};

use crate::error::Result;
use crate::models::{ReportRow, RunKey};
use crate::schema::ReportKind;
use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Scanner state for one report kind
#[derive(Debug)]
pub enum SectionScanner {
    Tabular(TabularScanner),
    Activity(ActivityScanner),
}

impl SectionScanner {
    pub fn for_kind(kind: ReportKind) -> Self {
        match kind {
            ReportKind::Activity => SectionScanner::Activity(ActivityScanner::new()),
            _ => SectionScanner::Tabular(TabularScanner::new(kind)),
        }
    }

    pub fn feed(
        &mut self,
        line: &str,
        line_number: usize,
        run: &Arc<RunKey>,
    ) -> Result<Option<ReportRow>> {
        match self {
            SectionScanner::Tabular(scanner) => scanner.feed(line, line_number, run),
            SectionScanner::Activity(scanner) => scanner.feed(line, line_number, run),
        }
    }

    pub fn is_done(&self) -> bool {
        match self {
            SectionScanner::Tabular(scanner) => scanner.is_done(),
            SectionScanner::Activity(scanner) => scanner.is_done(),
        }
    }

    fn finish(&mut self) {
        if let SectionScanner::Activity(scanner) = self {
            scanner.finish();
        }
    }
}

/// Iterator over the typed rows of every report in one file
pub struct ReportScanner<R> {
    reader: R,
    buffer: Vec<u8>,
    run: Arc<RunKey>,
    sections: Vec<SectionScanner>,
    pending: VecDeque<Result<ReportRow>>,
    line_number: usize,
    finished: bool,
}

impl ReportScanner<BufReader<File>> {
    /// Open a report file, tagging its rows with the run key in its name
    pub fn open(path: &Path) -> Result<Self> {
        let run = Arc::new(RunKey::from_path(path)?);
        let file = File::open(path)?;
        debug!("Scanning {} as {}", path.display(), run);
        Ok(Self::new(BufReader::new(file), run))
    }
}

impl<R: BufRead> ReportScanner<R> {
    pub fn new(reader: R, run: Arc<RunKey>) -> Self {
        Self {
            reader,
            buffer: Vec::new(),
            run,
            sections: ReportKind::ALL
                .iter()
                .map(|kind| SectionScanner::for_kind(*kind))
                .collect(),
            pending: VecDeque::new(),
            line_number: 0,
            finished: false,
        }
    }

    pub fn run(&self) -> &Arc<RunKey> {
        &self.run
    }

    /// Lines consumed so far
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    fn scan_line(&mut self, line: &str) {
        self.line_number += 1;
        for section in &mut self.sections {
            match section.feed(line, self.line_number, &self.run) {
                Ok(Some(row)) => self.pending.push_back(Ok(row)),
                Ok(None) => {}
                Err(e) => self.pending.push_back(Err(e)),
            }
        }

        if self.sections.iter().all(SectionScanner::is_done) {
            debug!(
                "All reports complete at line {} for {}",
                self.line_number, self.run
            );
            self.finished = true;
        }
    }

    /// Read one raw line. Bytes that are not UTF-8 are replaced, never fatal.
    fn read_line(&mut self) -> std::io::Result<Option<String>> {
        self.buffer.clear();
        if self.reader.read_until(b'\n', &mut self.buffer)? == 0 {
            return Ok(None);
        }
        if self.buffer.last() == Some(&b'\n') {
            self.buffer.pop();
            if self.buffer.last() == Some(&b'\r') {
                self.buffer.pop();
            }
        }
        Ok(Some(String::from_utf8_lossy(&self.buffer).into_owned()))
    }

    fn finish(&mut self) {
        self.finished = true;
        for section in &mut self.sections {
            section.finish();
        }
    }
}

impl<R: BufRead> Iterator for ReportScanner<R> {
    type Item = Result<ReportRow>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.pending.pop_front() {
                return Some(item);
            }
            if self.finished {
                return None;
            }

            match self.read_line() {
                Ok(Some(line)) => self.scan_line(&line),
                Ok(None) => self.finish(),
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e.into()));
                }
            }
        }
    }
}
