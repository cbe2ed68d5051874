//! Run key extraction from report file names.
//!
//! Batch runs name every keyword file, and therefore every report, after
//! the run it belongs to:
//! `var<variant>_rx<prescription>_cond<condition>_site<site>_clim<climate>_off<offset>`.

use crate::error::{ExtractError, Result};
use crate::models::RunKey;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

static RUN_KEY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^var([a-zA-Z]+)_rx([0-9a-zA-Z]+)_cond([0-9a-zA-Z]+)_site([0-9a-zA-Z]+)_clim([0-9a-zA-Z-]+)_off([0-9]+)",
    )
    .expect("run key pattern is valid")
});

impl RunKey {
    /// Parse the run key from a report path.
    ///
    /// Only the final extension is dropped before matching, and the match is
    /// anchored at the start of the name only.
    pub fn from_path(path: &Path) -> Result<Self> {
        let stem = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or_else(|| ExtractError::MalformedFilename {
                path: path.to_path_buf(),
            })?;

        parse_run_key(stem).ok_or_else(|| ExtractError::MalformedFilename {
            path: path.to_path_buf(),
        })
    }
}

/// Parse a run key from a bare file stem
pub fn parse_run_key(stem: &str) -> Option<RunKey> {
    let captures = RUN_KEY_PATTERN.captures(stem)?;
    let part = |index: usize| captures[index].to_string();

    Some(RunKey {
        variable: part(1),
        prescription: part(2),
        condition: part(3),
        site: part(4),
        climate: part(5),
        offset: part(6),
    })
}
