//! # Data Models Module / 数据模型模块
//!
//! This module defines the core data structures used throughout the runner:
//! the generated test combinations, the outcome of an API call, the flat
//! result record written to CSV, and the report row the HTML renderer reads.
//!
//! 此模块定义了整个运行器中使用的核心数据结构：
//! 生成的测试组合、API 调用结果、写入 CSV 的扁平结果记录，以及 HTML 渲染器读取的报告行。

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Separator used when a list of URLs is flattened into one CSV cell.
/// 将 URL 列表扁平化到单个 CSV 单元格时使用的分隔符。
pub const URL_SEPARATOR: &str = "; ";

/// One test case assembled from the four configured axes.
/// 由四个配置轴组合而成的一个测试用例。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Combination {
    /// `{image}_{location}_{person}_{pipeline}` axis keys / 四个轴键拼接而成
    pub test_id: String,
    pub image_list_key: String,
    pub image_list_name: String,
    pub image_list_description: String,
    pub image_urls: Vec<String>,
    pub location_prompt_key: String,
    pub location_prompt_name: String,
    pub location_prompt_value: String,
    pub person_prompt_key: String,
    pub person_prompt_name: String,
    pub person_prompt_value: String,
    pub pipeline_config_key: String,
    pub pipeline_config_name: String,
    pub pipeline_config_filename: String,
}

impl Combination {
    pub fn image_count(&self) -> usize {
        self.image_urls.len()
    }
}

/// Enumerates why an API call failed.
/// All kinds are retried the same way; they only change the reported message.
///
/// 枚举 API 调用失败的原因。
/// 所有类型的重试方式相同，只影响报告的消息。
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum FailureKind {
    /// The service answered with a status other than 200.
    /// 服务返回了 200 以外的状态码。
    HttpStatus,
    /// The request did not complete within the configured timeout.
    /// 请求未在配置的超时时间内完成。
    Timeout,
    /// The service could not be reached.
    /// 无法连接到服务。
    Connection,
    /// Anything else, including a 200 whose body is not JSON.
    /// 其他任何错误，包括响应体不是 JSON 的 200 响应。
    Unexpected,
}

/// The final result of calling the API for one combination, after retries.
/// 对一个组合调用 API（包括重试）后的最终结果。
#[derive(Debug, Clone, PartialEq)]
pub struct CallOutcome {
    pub success: bool,
    /// Parsed response body; an empty object when the call failed.
    pub response: Value,
    /// Duration of the last attempt.
    pub duration: Duration,
    pub error: Option<String>,
    pub failure: Option<FailureKind>,
    /// Number of attempts made, including the first.
    pub attempts: u32,
}

impl CallOutcome {
    pub fn succeeded(response: Value, duration: Duration, attempts: u32) -> Self {
        Self {
            success: true,
            response,
            duration,
            error: None,
            failure: None,
            attempts,
        }
    }

    pub fn failed(kind: FailureKind, error: String, duration: Duration, attempts: u32) -> Self {
        Self {
            success: false,
            response: Value::Object(serde_json::Map::new()),
            duration,
            error: Some(error),
            failure: Some(kind),
            attempts,
        }
    }
}

/// One executed test as a flat record. Field order is the CSV column order.
///
/// 以扁平记录表示的一个已执行测试。字段顺序即 CSV 列顺序。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestRecord {
    pub timestamp: String,
    pub test_id: String,
    pub test_number: usize,
    pub image_list_key: String,
    pub image_list_name: String,
    pub image_list_description: String,
    pub image_urls: String,
    pub image_count: usize,
    pub location_prompt_key: String,
    pub location_prompt_name: String,
    pub location_prompt_value: String,
    pub person_prompt_key: String,
    pub person_prompt_name: String,
    pub person_prompt_value: String,
    pub pipeline_config_key: String,
    pub pipeline_config_name: String,
    pub pipeline_config_filename: String,
    pub success: bool,
    pub duration_seconds: f64,
    pub error_message: String,
    pub response_status: String,
    /// Echoed from the response; non-numeric values are kept as text.
    pub images_requested: String,
    pub processed_images_count: usize,
    pub processed_image_urls: String,
    pub saved_state_blob: String,
}

impl TestRecord {
    /// Flattens a combination and its call outcome into a record, timestamped now.
    ///
    /// Response fields are only read from successful calls; failed calls get
    /// empty strings and zero counts.
    pub fn from_outcome(combination: &Combination, test_number: usize, outcome: &CallOutcome) -> Self {
        let timestamp = chrono::Local::now()
            .format("%Y-%m-%dT%H:%M:%S%.6f")
            .to_string();
        Self::with_timestamp(combination, test_number, outcome, timestamp)
    }

    /// Same as [`TestRecord::from_outcome`] with an explicit timestamp.
    pub fn with_timestamp(
        combination: &Combination,
        test_number: usize,
        outcome: &CallOutcome,
        timestamp: String,
    ) -> Self {
        let response = if outcome.success {
            ResponseFields::extract(&outcome.response)
        } else {
            ResponseFields::empty()
        };

        Self {
            timestamp,
            test_id: combination.test_id.clone(),
            test_number,
            image_list_key: combination.image_list_key.clone(),
            image_list_name: combination.image_list_name.clone(),
            image_list_description: combination.image_list_description.clone(),
            image_urls: combination.image_urls.join(URL_SEPARATOR),
            image_count: combination.image_count(),
            location_prompt_key: combination.location_prompt_key.clone(),
            location_prompt_name: combination.location_prompt_name.clone(),
            location_prompt_value: combination.location_prompt_value.clone(),
            person_prompt_key: combination.person_prompt_key.clone(),
            person_prompt_name: combination.person_prompt_name.clone(),
            person_prompt_value: combination.person_prompt_value.clone(),
            pipeline_config_key: combination.pipeline_config_key.clone(),
            pipeline_config_name: combination.pipeline_config_name.clone(),
            pipeline_config_filename: combination.pipeline_config_filename.clone(),
            success: outcome.success,
            duration_seconds: round_to_hundredths(outcome.duration.as_secs_f64()),
            error_message: outcome.error.clone().unwrap_or_default(),
            response_status: response.status,
            images_requested: response.images_requested,
            processed_images_count: response.processed_images.len(),
            processed_image_urls: response.processed_images.join(URL_SEPARATOR),
            saved_state_blob: response.saved_state_blob,
        }
    }
}

/// The response fields a record keeps, with their defaults.
#[derive(Debug)]
struct ResponseFields {
    status: String,
    images_requested: String,
    processed_images: Vec<String>,
    saved_state_blob: String,
}

impl ResponseFields {
    fn empty() -> Self {
        Self {
            status: String::new(),
            images_requested: "0".to_string(),
            processed_images: Vec::new(),
            saved_state_blob: String::new(),
        }
    }

    fn extract(response: &Value) -> Self {
        let processed_images = response
            .get("processed_images")
            .and_then(Value::as_array)
            .map(|items| items.iter().map(value_to_text).collect())
            .unwrap_or_default();

        Self {
            status: response.get("status").map(value_to_text).unwrap_or_default(),
            images_requested: response
                .get("images_requested")
                .map_or_else(|| "0".to_string(), value_to_text),
            processed_images,
            saved_state_blob: response
                .get("saved_state_blob")
                .map(value_to_text)
                .unwrap_or_default(),
        }
    }
}

/// Strings are taken as-is, `null` becomes empty, anything else compact JSON.
fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `part` as a percentage of `total`; `0.0` for an empty set.
/// `part` 占 `total` 的百分比；空集合时为 `0.0`。
pub fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

/// A cell reloaded from CSV: the parsed value when the text converts,
/// otherwise the original text.
///
/// 从 CSV 重新加载的单元格：文本可转换时为解析后的值，否则为原始文本。
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue<T> {
    Parsed(T),
    Text(String),
}

impl<T: FromStr> CellValue<T> {
    /// Best-effort conversion; never fails.
    pub fn parse(raw: &str) -> Self {
        raw.trim()
            .parse()
            .map_or_else(|_| Self::Text(raw.to_string()), Self::Parsed)
    }
}

impl<T: Copy> CellValue<T> {
    pub fn value(&self) -> Option<T> {
        match self {
            Self::Parsed(value) => Some(*value),
            Self::Text(_) => None,
        }
    }
}

impl<T: fmt::Display> fmt::Display for CellValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parsed(value) => value.fmt(f),
            Self::Text(text) => f.write_str(text),
        }
    }
}

/// The view of a test result the HTML report is rendered from.
/// Built from a live record or from a row of a previously written CSV file.
///
/// HTML 报告渲染所依据的测试结果视图。
/// 由实时记录或先前写入的 CSV 文件中的一行构建。
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub timestamp: String,
    pub test_id: String,
    pub test_number: CellValue<u64>,
    pub image_list_name: String,
    pub image_urls: Vec<String>,
    pub image_count: CellValue<u64>,
    pub location_prompt_name: String,
    pub person_prompt_name: String,
    pub pipeline_config_name: String,
    pub success: bool,
    pub duration_seconds: CellValue<f64>,
    pub error_message: String,
    pub response_status: String,
    pub images_requested: CellValue<u64>,
    pub processed_images_count: CellValue<u64>,
    pub processed_image_urls: Vec<String>,
}

impl ReportRow {
    /// Builds a row from raw CSV cells. `field` returns the cell for a column
    /// name, or an empty string when the column is missing.
    pub fn from_fields<'a>(field: impl Fn(&str) -> &'a str) -> Self {
        Self {
            timestamp: field("timestamp").to_string(),
            test_id: field("test_id").to_string(),
            test_number: CellValue::parse(field("test_number")),
            image_list_name: field("image_list_name").to_string(),
            image_urls: split_urls(field("image_urls")),
            image_count: CellValue::parse(field("image_count")),
            location_prompt_name: field("location_prompt_name").to_string(),
            person_prompt_name: field("person_prompt_name").to_string(),
            pipeline_config_name: field("pipeline_config_name").to_string(),
            success: field("success").trim().eq_ignore_ascii_case("true"),
            duration_seconds: CellValue::parse(field("duration_seconds")),
            error_message: field("error_message").to_string(),
            response_status: field("response_status").to_string(),
            images_requested: CellValue::parse(field("images_requested")),
            processed_images_count: CellValue::parse(field("processed_images_count")),
            processed_image_urls: split_urls(field("processed_image_urls")),
        }
    }
}

impl From<&TestRecord> for ReportRow {
    fn from(record: &TestRecord) -> Self {
        Self {
            timestamp: record.timestamp.clone(),
            test_id: record.test_id.clone(),
            test_number: CellValue::Parsed(record.test_number as u64),
            image_list_name: record.image_list_name.clone(),
            image_urls: split_urls(&record.image_urls),
            image_count: CellValue::Parsed(record.image_count as u64),
            location_prompt_name: record.location_prompt_name.clone(),
            person_prompt_name: record.person_prompt_name.clone(),
            pipeline_config_name: record.pipeline_config_name.clone(),
            success: record.success,
            duration_seconds: CellValue::Parsed(record.duration_seconds),
            error_message: record.error_message.clone(),
            response_status: record.response_status.clone(),
            images_requested: CellValue::parse(&record.images_requested),
            processed_images_count: CellValue::Parsed(record.processed_images_count as u64),
            processed_image_urls: split_urls(&record.processed_image_urls),
        }
    }
}

/// Splits a flattened URL list, dropping blank entries.
pub fn split_urls(joined: &str) -> Vec<String> {
    joined
        .split(URL_SEPARATOR)
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(str::to_string)
        .collect()
}
