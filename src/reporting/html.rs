//! # HTML Reporting Module / HTML 报告模块
//!
//! This module renders test results as a self-contained HTML page: a summary
//! header, summary cards, and a results table with image thumbnails. Markup is
//! produced with `maud`, so every interpolated value is HTML-escaped.
//!
//! 此模块将测试结果渲染为独立的 HTML 页面：摘要头部、摘要卡片以及带有图片缩略图的结果表格。
//! 标记由 `maud` 生成，因此所有插入的值都会经过 HTML 转义。

use anyhow::{Context, Result};
use maud::{html, Markup, PreEscaped, DOCTYPE};
use std::fs;
use std::path::Path;

use crate::core::models::{percentage, CellValue, ReportRow};
use crate::infra::t;

/// Embedded CSS styles for HTML reports / HTML 报告的嵌入式 CSS 样式
const HTML_STYLE: &str = include_str!("assets/report.css");

/// Embedded JavaScript for HTML report interactivity / HTML 报告交互性的嵌入式 JavaScript
const HTML_SCRIPT: &str = include_str!("assets/report.js");

const UNKNOWN_TIME: &str = "Unknown";

/// Aggregate figures shown at the top of the report.
/// 报告顶部显示的汇总数据。
#[derive(Debug, Clone, PartialEq)]
pub struct ReportSummary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    /// Percentage, `0.0` when there are no rows.
    pub success_rate: f64,
    /// Earliest non-empty timestamp, or `Unknown`.
    pub start_time: String,
    /// Latest non-empty timestamp, or `Unknown`.
    pub end_time: String,
}

impl ReportSummary {
    pub fn from_rows(rows: &[ReportRow]) -> Self {
        let total = rows.len();
        let successful = rows.iter().filter(|row| row.success).count();
        let timestamps = || {
            rows.iter()
                .map(|row| row.timestamp.as_str())
                .filter(|ts| !ts.is_empty())
        };

        Self {
            total,
            successful,
            failed: total - successful,
            success_rate: percentage(successful, total),
            start_time: timestamps().min().unwrap_or(UNKNOWN_TIME).to_string(),
            end_time: timestamps().max().unwrap_or(UNKNOWN_TIME).to_string(),
        }
    }
}

/// Renders the full report page.
///
/// 渲染完整的报告页面。
pub fn render_report(rows: &[ReportRow], title: &str) -> String {
    let summary = ReportSummary::from_rows(rows);
    let rate = format!("{:.1}%", summary.success_rate);

    let markup = html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                style { (PreEscaped(HTML_STYLE)) }
            }
            body {
                div.header {
                    h1 { (title) }
                    p {
                        (t!(
                            "html_report.totals",
                            total = summary.total,
                            successful = summary.successful,
                            failed = summary.failed
                        ).to_string())
                    }
                    p { (t!("html_report.success_rate", rate = &rate).to_string()) }
                    p {
                        (t!(
                            "html_report.test_period",
                            start = &summary.start_time,
                            end = &summary.end_time
                        ).to_string())
                    }
                }
                div.summary {
                    (summary_card(&t!("html_report.summary.total"), &summary.total.to_string(), ""))
                    (summary_card(&t!("html_report.summary.successful"), &summary.successful.to_string(), "success"))
                    (summary_card(&t!("html_report.summary.failed"), &summary.failed.to_string(), "failure"))
                    (summary_card(&t!("html_report.summary.success_rate"), &rate, ""))
                }
                div."table-container" {
                    table {
                        thead {
                            tr {
                                th { (t!("html_report.table.test").to_string()) }
                                th { (t!("html_report.table.status").to_string()) }
                                th { (t!("html_report.table.configuration").to_string()) }
                                th { (t!("html_report.table.input_images").to_string()) }
                                th { (t!("html_report.table.processed_images").to_string()) }
                                th { (t!("html_report.table.duration").to_string()) }
                                th { (t!("html_report.table.details").to_string()) }
                            }
                        }
                        tbody {
                            @for row in rows {
                                (result_row(row))
                            }
                        }
                    }
                }
                script { (PreEscaped(HTML_SCRIPT)) }
            }
        }
    };

    markup.into_string()
}

/// Renders the report and writes it to `output_path`.
///
/// # Errors
/// Returns an error if the file cannot be written.
pub fn generate_html_report(rows: &[ReportRow], output_path: &Path, title: &str) -> Result<()> {
    fs::write(output_path, render_report(rows, title))
        .with_context(|| t!("html_report.write_failed", path = output_path.display()).to_string())
}

fn summary_card(label: &str, value: &str, modifier: &str) -> Markup {
    let classes = if modifier.is_empty() {
        "number".to_string()
    } else {
        format!("number {modifier}")
    };
    html! {
        div."summary-card" {
            h3 { (label) }
            div class=(classes) { (value) }
        }
    }
}

fn result_row(row: &ReportRow) -> Markup {
    let (status_class, status_text) = if row.success {
        ("status-badge status-success", t!("html_report.status.success").to_string())
    } else {
        ("status-badge status-failure", t!("html_report.status.failed").to_string())
    };

    html! {
        tr {
            td {
                div."test-id" { (or_na(&row.test_id)) }
                div."test-details" { "#" (row.test_number.to_string()) }
            }
            td {
                span class=(status_class) { (status_text) }
            }
            td {
                div."test-details" {
                    strong { (t!("html_report.label.pipeline").to_string()) } " " (or_na(&row.pipeline_config_name))
                    br;
                    strong { (t!("html_report.label.location").to_string()) } " " (or_na(&row.location_prompt_name))
                    br;
                    strong { (t!("html_report.label.person").to_string()) } " " (or_na(&row.person_prompt_name))
                }
            }
            td { (image_gallery(&row.image_urls, "Input")) }
            td { (image_gallery(&row.processed_image_urls, "Output")) }
            td { span.duration { (format_duration(&row.duration_seconds)) } }
            td {
                div."test-details" {
                    strong { (t!("html_report.label.images").to_string()) }
                    " " (row.image_count.to_string()) " → " (row.processed_images_count.to_string())
                    br;
                    strong { (t!("html_report.label.timestamp").to_string()) }
                    " " (display_timestamp(&row.timestamp))
                }
                @if !row.success && !row.error_message.is_empty() {
                    div."error-message" {
                        (t!("html_report.error", message = &row.error_message).to_string())
                    }
                }
            }
        }
    }
}

fn image_gallery(urls: &[String], kind: &str) -> Markup {
    html! {
        @if urls.is_empty() {
            div."no-images" { (t!("html_report.no_images").to_string()) }
        } @else {
            div."image-gallery" {
                @for url in urls {
                    img."image-thumbnail"
                        src=(url)
                        alt=(format!("{kind} Image"))
                        title=(t!("html_report.open_full_size").to_string())
                        loading="lazy";
                }
            }
        }
    }
}

fn format_duration(duration: &CellValue<f64>) -> String {
    match duration {
        CellValue::Parsed(seconds) => format!("{seconds:.1}s"),
        CellValue::Text(text) => text.clone(),
    }
}

/// First 19 characters (`YYYY-mm-ddTHH:MM:SS`) with the `T` replaced by a space.
fn display_timestamp(timestamp: &str) -> String {
    if timestamp.is_empty() {
        return "N/A".to_string();
    }
    timestamp.chars().take(19).collect::<String>().replace('T', " ")
}

fn or_na(value: &str) -> &str {
    if value.is_empty() { "N/A" } else { value }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(test_id: &str, success: bool, timestamp: &str) -> ReportRow {
        ReportRow {
            timestamp: timestamp.to_string(),
            test_id: test_id.to_string(),
            test_number: CellValue::Parsed(1),
            image_list_name: "Images".to_string(),
            image_urls: vec!["http://img/a.png".to_string()],
            image_count: CellValue::Parsed(1),
            location_prompt_name: "Beach".to_string(),
            person_prompt_name: "Child".to_string(),
            pipeline_config_name: "Fast".to_string(),
            success,
            duration_seconds: CellValue::Parsed(2.345),
            error_message: if success { String::new() } else { "HTTP 500: boom".to_string() },
            response_status: String::new(),
            images_requested: CellValue::Parsed(1),
            processed_images_count: CellValue::Parsed(0),
            processed_image_urls: Vec::new(),
        }
    }

    #[test]
    fn summary_computes_rate_and_period() {
        let rows = vec![
            row("a", true, "2024-01-01T10:00:05.1"),
            row("b", false, "2024-01-01T10:00:01.1"),
            row("c", true, ""),
        ];
        let summary = ReportSummary::from_rows(&rows);

        assert_eq!(summary.total, 3);
        assert_eq!(summary.successful, 2);
        assert_eq!(summary.failed, 1);
        assert!((summary.success_rate - 200.0 / 3.0).abs() < 1e-9);
        assert_eq!(summary.start_time, "2024-01-01T10:00:01.1");
        assert_eq!(summary.end_time, "2024-01-01T10:00:05.1");
    }

    #[test]
    fn empty_result_set_renders_without_division_by_zero() {
        let summary = ReportSummary::from_rows(&[]);
        assert_eq!(summary.success_rate, 0.0);
        assert_eq!(summary.start_time, "Unknown");

        let page = render_report(&[], "Empty");
        assert!(page.contains("0.0%"));
        assert!(!page.contains("NaN"));
        assert!(page.contains("<tbody></tbody>"));
    }

    #[test]
    fn user_controlled_text_is_escaped() {
        let mut hostile = row("<script>alert(1)</script>", false, "2024-01-01T10:00:00");
        hostile.error_message = "bad <b>tag</b> & \"quote\"".to_string();
        hostile.image_urls = vec!["http://img/x.png\" onerror=\"alert(1)".to_string()];
        hostile.location_prompt_name = "<i>loc</i>".to_string();

        let page = render_report(&[hostile], "<Suite & Co>");

        assert!(!page.contains("<script>alert(1)</script>"));
        assert!(page.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(page.contains("&lt;b&gt;tag&lt;/b&gt; &amp;"));
        assert!(!page.contains("\" onerror=\""));
        assert!(!page.contains("<i>loc</i>"));
        assert!(page.contains("&lt;Suite &amp; Co&gt;"));
    }

    #[test]
    fn rows_show_trimmed_timestamp_and_placeholders() {
        let page = render_report(&[row("a_b_c_d", true, "2024-01-01T10:00:05.123456")], "Suite");

        let (header, table) = page.split_once("<tbody>").unwrap();
        assert!(header.contains("2024-01-01T10:00:05.123456"));
        assert!(table.contains("2024-01-01 10:00:05"));
        assert!(!table.contains("10:00:05.123456"));
        assert!(page.contains("2.3s"));
        assert!(page.contains("loading=\"lazy\""));
        assert!(page.contains("no-images"));
    }

    #[test]
    fn unparsed_duration_is_shown_verbatim() {
        assert_eq!(format_duration(&CellValue::Text("slow".to_string())), "slow");
        assert_eq!(display_timestamp(""), "N/A");
    }
}
