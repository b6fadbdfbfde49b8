//! # Reporting Module / 报告模块
//!
//! This module handles the generation and display of test reports in multiple formats.
//! It writes CSV result files, renders styled HTML reports and prints colorful,
//! formatted progress and summaries to the console with internationalization support.
//!
//! 此模块处理多种格式的测试报告生成和显示。
//! 它写入 CSV 结果文件，渲染样式化的 HTML 报告，并在控制台打印彩色格式化的进度和摘要，支持国际化。

pub mod console;
pub mod csv;
pub mod html;

// Re-export common reporting functions
pub use self::console::{print_summary, RunSummary};
pub use self::csv::{load_results, write_results};
pub use self::html::generate_html_report;
