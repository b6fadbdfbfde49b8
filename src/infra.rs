//! # Infrastructure Module / 基础设施模块
//!
//! This module provides infrastructure services for API Matrix Runner,
//! including HTTP client construction, logging setup, report file naming
//! and i18n support.
//!
//! 此模块为 API Matrix Runner 提供基础设施服务，
//! 包括 HTTP 客户端构建、日志设置、报告文件命名和国际化支持。

pub mod fs;
pub mod http;
pub mod logging;

// Re-export i18n functions for easier access
pub use rust_i18n::t;
