//! # Console Reporting Module / 控制台报告模块
//!
//! This module prints the live progress of a run and the final summary to the
//! console, with colored, localized output.
//!
//! 此模块将运行的实时进度和最终摘要打印到控制台，输出带有颜色并支持国际化。

use colored::*;
use std::time::Duration;

use crate::core::models::{percentage, CallOutcome, Combination, TestRecord};
use crate::infra::t;

const RULE_WIDTH: usize = 60;

/// Prints the banner shown before each test.
/// 打印每个测试前显示的横幅。
pub fn print_test_header(test_number: usize, total: usize, combination: &Combination) {
    println!(
        "\n{}",
        t!(
            "console.test_header",
            number = test_number,
            total = total,
            id = &combination.test_id
        )
        .bold()
    );
    println!(
        "   {}",
        t!(
            "console.images",
            name = &combination.image_list_name,
            count = combination.image_count()
        )
    );
    println!("   {}", t!("console.location", name = &combination.location_prompt_name));
    println!("   {}", t!("console.person", name = &combination.person_prompt_name));
    println!(
        "   {}",
        t!(
            "console.pipeline",
            name = &combination.pipeline_config_name,
            file = &combination.pipeline_config_filename
        )
    );
}

/// Prints the result line of a finished test.
pub fn print_test_outcome(outcome: &CallOutcome) {
    let seconds = format!("{:.1}", outcome.duration.as_secs_f64());
    if outcome.success {
        println!("   {}", t!("console.test_succeeded", seconds = &seconds).green());
        if let Some(images) = outcome.response.get("processed_images").and_then(|v| v.as_array()) {
            println!("   {}", t!("console.processed_images", count = images.len()));
        }
    } else {
        println!(
            "   {}",
            t!(
                "console.test_failed",
                seconds = &seconds,
                error = outcome.error.as_deref().unwrap_or_default()
            )
            .red()
        );
    }
}

pub fn print_progress(done: usize, total: usize) {
    let percent = percentage(done, total);
    println!(
        "{}",
        t!("console.progress", percent = format!("{percent:.1}"), done = done, total = total).cyan()
    );
}

/// Figures for the end-of-run summary.
/// 运行结束摘要的数据。
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub elapsed: Duration,
    pub completed: usize,
    pub planned: usize,
    pub successful: usize,
    pub failed: usize,
    /// Mean recorded duration in seconds; `None` when nothing completed.
    pub average_duration: Option<f64>,
}

impl RunSummary {
    pub fn from_records(records: &[TestRecord], planned: usize, elapsed: Duration) -> Self {
        let completed = records.len();
        let successful = records.iter().filter(|r| r.success).count();
        let average_duration = (completed > 0).then(|| {
            records.iter().map(|r| r.duration_seconds).sum::<f64>() / completed as f64
        });

        Self {
            elapsed,
            completed,
            planned,
            successful,
            failed: completed - successful,
            average_duration,
        }
    }

    pub fn success_rate(&self) -> f64 {
        percentage(self.successful, self.completed)
    }
}

/// Prints the end-of-run summary block.
/// 打印运行结束的摘要块。
pub fn print_summary(summary: &RunSummary) {
    let rule = "=".repeat(RULE_WIDTH);
    let seconds = summary.elapsed.as_secs_f64();

    println!("\n{}", rule);
    println!("{}", t!("summary.banner").bold());
    println!("{}", rule);
    println!(
        "{}",
        t!(
            "summary.total_duration",
            seconds = format!("{seconds:.1}"),
            minutes = format!("{:.1}", seconds / 60.0)
        )
    );
    println!(
        "{}",
        t!("summary.total_tests", completed = summary.completed, total = summary.planned)
    );
    println!("{}", t!("summary.successful", count = summary.successful).green());
    println!("{}", t!("summary.failed", count = summary.failed).red());
    println!(
        "{}",
        t!("summary.success_rate", rate = format!("{:.1}", summary.success_rate()))
    );
    match summary.average_duration {
        Some(average) => println!(
            "{}",
            t!("summary.average_duration", seconds = format!("{average:.1}"))
        ),
        None => println!("{}", t!("summary.none_completed").yellow()),
    }
    println!("{}", rule);
}
