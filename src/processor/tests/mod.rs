//! Integration tests for the processor module
//!
//! Tests the complete extraction pipeline using generated FVS report files
//! laid out the way a batch run writes them.


use std::fs;
use std::path::{Path, PathBuf};

/// Which reports a generated file contains
#[derive(Debug, Clone, Copy)]
pub struct ReportSet {
    pub carbon: bool,
    pub harvested: bool,
    pub summary: bool,
    pub activity: bool,
}

impl ReportSet {
    pub const ALL: ReportSet = ReportSet {
        carbon: true,
        harvested: true,
        summary: true,
        activity: true,
    };
}

pub fn run_file_name(rx: &str, offset: u32) -> String {
    format!("varWC_rx{}_cond31566_site3_climNoClimate_off{}.out", rx, offset)
}

pub fn carbon_line(year: i64, agl: f64, bgl: f64, dead: f64) -> String {
    format!(
        " {:4}{:>9.1}{:>9.1}{:>9.1}{:>9.1}{:>9.1}{:>9.1}{:>9.1}{:>9.1}{:>9.1}{:>9.1}{:>9.1}",
        year,
        agl,
        0.0,
        bgl,
        0.0,
        dead,
        0.0,
        0.0,
        0.0,
        agl + bgl + dead,
        0.0,
        0.0
    )
}

pub fn harvested_line(year: i64, stored: f64, removed: f64) -> String {
    format!(" {:4}{:36}{:>9.1}{:>9.1}", year, "", stored, removed)
}

/// Summary line with `removed_tpa` trees cut from a 500 tpa stand
pub fn summary_line(year: i64, age: i64, removed_tpa: i64) -> String {
    format!(
        " {:4}{:>4}{:>6}{:>4}{:18}{:>6}{:>6}{:>6} {:>5}{:>6}{:>6}{:>6}{:>4}",
        year, age, 500, 120, "", 4000, 3500, 20000, removed_tpa, 0, 0, 0, 110
    )
}

pub fn activity_line(variable: &str, status: &str, value: &str) -> String {
    format!("{:24}{:<10}{:6}{:<19}{:2}{:>11}", "", variable, "", status, "", value)
}

fn header(text: &mut Vec<String>, title: &str, skip: usize) {
    text.push(format!("                  {}", title));
    text.extend((1..skip).map(|i| format!(" ---- header {} ----", i)));
}

/// A main output file with the requested reports for `years`.
///
/// The first year gets an activity period with `PINE_HRV` done and
/// `SPRC_HRV` not done.
pub fn report_text(years: &[i64], reports: ReportSet) -> String {
    let mut text = vec![
        "1  FOREST VEGETATION SIMULATOR     VERSION FS2023.1".to_string(),
        String::new(),
        "CARBCUT            HARVESTED PRODUCTS REPORT keyword echo".to_string(),
        String::new(),
    ];

    if reports.summary {
        header(
            &mut text,
            "SUMMARY STATISTICS (PER ACRE OR STAND BASED ON TOTAL STAND AREA)",
            7,
        );
        for (i, year) in years.iter().enumerate() {
            let removed = if i == 0 { 100 } else { 0 };
            text.push(summary_line(*year, 30 + 10 * i as i64, removed));
        }
        text.push(String::new());
    }

    if reports.activity {
        header(&mut text, "ACTIVITY SUMMARY", 9);
        if let Some(year) = years.first() {
            text.push(format!("{:7}{:4}  TIME PERIOD", "", year));
            text.push(activity_line("PINE_HRV", &format!("DONE IN {}", year), "12.5"));
            text.push(activity_line("SPRC_HRV", "NOT DONE", "4.0"));
            text.push(String::new());
        }
        text.push("-".repeat(72));
    }

    if reports.carbon {
        header(&mut text, "STAND CARBON REPORT", 9);
        for (i, year) in years.iter().enumerate() {
            text.push(carbon_line(*year, 100.0 + i as f64, 20.0, 5.0));
        }
        text.push(String::new());
    }

    if reports.harvested {
        header(&mut text, "HARVESTED PRODUCTS REPORT", 9);
        for year in years {
            text.push(harvested_line(*year, 5.0, 2.0));
        }
        text.push(String::new());
    }

    text.push("END OF RUN".to_string());
    text.join("\n") + "\n"
}

/// Create `<root>/plots/<plot>/` and write the given files into it
pub fn write_plot_dir(root: &Path, plot: &str, files: &[(String, String)]) -> PathBuf {
    let dir = root.join("plots").join(plot);
    fs::create_dir_all(&dir).unwrap();
    for (name, text) in files {
        fs::write(dir.join(name), text).unwrap();
    }
    dir
}
