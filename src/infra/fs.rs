//! # File System Operations Module / 文件系统操作模块
//!
//! This module provides path helpers for the runner: expanding user-supplied
//! paths, preparing the output directory, and naming timestamped report files.
//!
//! 此模块为运行器提供路径辅助功能：展开用户提供的路径、准备输出目录，
//! 以及为带时间戳的报告文件命名。

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::fs;
use std::path::{Path, PathBuf};

use crate::infra::t;

/// File name prefix shared by the CSV and HTML reports of a run.
pub const REPORT_FILE_PREFIX: &str = "test_results";

/// Expands `~` and environment variables in a user-supplied path.
///
/// Unknown variables leave the path untouched.
///
/// ```
/// use api_matrix_runner::infra::fs::expand_path;
/// assert_eq!(expand_path("reports/out.csv"), std::path::PathBuf::from("reports/out.csv"));
/// ```
pub fn expand_path(raw: &str) -> PathBuf {
    match shellexpand::full(raw) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(_) => PathBuf::from(raw),
    }
}

/// Creates the directory and its parents if it does not exist yet.
pub fn ensure_dir(dir: &Path) -> Result<()> {
    if dir.as_os_str().is_empty() || dir.is_dir() {
        return Ok(());
    }
    fs::create_dir_all(dir)
        .with_context(|| t!("fs.create_dir_failed", path = dir.display()).to_string())
}

/// `{dir}/test_results_{YYYYmmdd_HHMMSS}.{extension}` for the given start time.
pub fn timestamped_report_path(dir: &Path, started_at: &DateTime<Local>, extension: &str) -> PathBuf {
    dir.join(format!(
        "{}_{}.{}",
        REPORT_FILE_PREFIX,
        started_at.format("%Y%m%d_%H%M%S"),
        extension
    ))
}
