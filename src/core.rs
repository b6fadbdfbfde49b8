//! # Core Module / 核心模块
//!
//! This module contains the core functionality of API Matrix Runner,
//! including configuration, data models, combination planning and the
//! HTTP caller.
//!
//! 此模块包含 API Matrix Runner 的核心功能，
//! 包括配置、数据模型、组合规划和 HTTP 调用器。

pub mod config;
pub mod execution;
pub mod models;
pub mod planner;

// Re-exports
pub use config::SuiteConfig;
pub use execution::ApiCaller;
pub use models::TestRecord;
