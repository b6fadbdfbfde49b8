//! Regenerates the HTML report from a results CSV.

use anyhow::{bail, Result};
use chrono::Local;
use colored::*;
use std::path::Path;

use crate::{
    infra::{
        fs::{ensure_dir, timestamped_report_path},
        t,
    },
    reporting::{csv::load_results, html::generate_html_report},
};

/// Loads `csv_path` and writes `test_results_{timestamp}.html` into `output_dir`.
///
/// # Errors
/// Returns an error when the CSV file is missing, unreadable or holds no rows,
/// or when the report cannot be written.
pub fn execute(csv_path: &Path, output_dir: &Path) -> Result<()> {
    if !csv_path.exists() {
        bail!("{}", t!("report.csv_not_found", path = csv_path.display()));
    }

    println!("{}", t!("report.generating", path = csv_path.display()));
    let rows = load_results(csv_path)?;
    println!("{}", t!("report.loaded", count = rows.len(), path = csv_path.display()));

    if rows.is_empty() {
        bail!("{}", t!("report.no_results"));
    }

    ensure_dir(output_dir)?;
    let html_path = timestamped_report_path(output_dir, &Local::now(), "html");
    generate_html_report(&rows, &html_path, &t!("html_report.default_title"))?;

    println!("{}", t!("report.success").green());
    println!("{}", t!("report.open_in_browser", path = html_path.display()));
    Ok(())
}
