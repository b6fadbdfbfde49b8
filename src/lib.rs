//! # API Matrix Runner Library / API Matrix Runner 库
//!
//! This library provides the core functionality for the API Matrix Runner tool,
//! a configuration-driven test runner that cross-products parameter axes into
//! test cases and exercises an HTTP endpoint once per case.
//!
//! 此库为 API Matrix Runner 工具提供核心功能，
//! 这是一个配置驱动的测试运行器，它将参数轴组合成测试用例，并针对每个用例调用一次 HTTP 接口。
//!
//! ## Modules / 模块
//!
//! - `core` - Configuration, data models, combination planning and the HTTP caller
//! - `infra` - Infrastructure services like HTTP clients, logging and file naming
//! - `reporting` - CSV, HTML and console reporting
//! - `cli` - Command-line interface and commands
//!
//! - `core` - 配置、数据模型、组合规划和 HTTP 调用器
//! - `infra` - 基础设施服务，如 HTTP 客户端、日志和文件命名
//! - `reporting` - CSV、HTML 和控制台报告
//! - `cli` - 命令行接口和命令

pub mod cli;
pub mod core;
pub mod infra;
pub mod reporting;

// Re-export commonly used items
pub use crate::core::{config, execution, models};

/// Sets the application's locale, matching the requested language against the
/// bundled translations.
///
/// It attempts to match the full locale (e.g., "zh-CN"), then just the language
/// code (e.g., "en" from "en-US"), and finally falls back to "en". Returns the
/// locale that was applied.
pub fn init_locale(requested: &str) -> String {
    let available_locales = rust_i18n::available_locales!();

    let is_available = |candidate: &str| available_locales.iter().any(|l| *l == candidate);

    let lang = if is_available(requested) {
        requested
    } else {
        requested
            .split(['-', '_'])
            .next()
            .filter(|lang_code| is_available(lang_code))
            .unwrap_or("en")
    };

    rust_i18n::set_locale(lang);
    lang.to_string()
}

/// Initializes the locale from the system settings.
pub fn init() -> String {
    let locale = sys_locale::get_locale().unwrap_or_else(|| "en".to_string());
    init_locale(&locale)
}

// Initialize i18n
rust_i18n::i18n!("locales", fallback = "en");
