//! # Suite Configuration Module / 测试套件配置模块
//!
//! This module defines the configuration file format: the target service, the
//! request settings and the four parameter axes that are cross-producted into
//! test combinations. Configurations can be written as JSON or TOML.
//!
//! 此模块定义配置文件格式：目标服务、请求设置以及将被组合成测试用例的四个参数轴。
//! 配置可以使用 JSON 或 TOML 编写。

use anyhow::{bail, Context, Result};
use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::marker::PhantomData;
use std::path::Path;
use std::time::Duration;

use crate::infra::t;

/// Host used when the configuration does not name one.
/// 配置未指定主机时使用的默认主机。
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// An ordered set of named entries for one parameter axis.
///
/// Entries keep the order in which they appear in the configuration document,
/// which is the order combinations are generated in.
///
/// 一个参数轴的有序命名条目集合。
/// 条目保持它们在配置文档中出现的顺序，也就是组合生成的顺序。
#[derive(Debug, Clone, PartialEq)]
pub struct Axis<T> {
    entries: Vec<(String, T)>,
}

impl<T> Axis<T> {
    /// Creates an axis from `(key, entry)` pairs.
    pub fn new(entries: Vec<(String, T)>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(key, entry)` pairs in document order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.entries.iter().map(|(key, entry)| (key.as_str(), entry))
    }

    pub fn get(&self, key: &str) -> Option<&T> {
        self.entries
            .iter()
            .find(|(entry_key, _)| entry_key == key)
            .map(|(_, entry)| entry)
    }
}

impl<T> Default for Axis<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

struct AxisVisitor<T> {
    marker: PhantomData<T>,
}

impl<'de, T: Deserialize<'de>> Visitor<'de> for AxisVisitor<T> {
    type Value = Axis<T>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map of axis keys to entries")
    }

    fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
        let mut seen = HashSet::new();
        while let Some((key, entry)) = access.next_entry::<String, T>()? {
            if !seen.insert(key.clone()) {
                return Err(de::Error::custom(format!("duplicate axis key `{key}`")));
            }
            entries.push((key, entry));
        }
        Ok(Axis { entries })
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Axis<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(AxisVisitor {
            marker: PhantomData,
        })
    }
}

impl<T: Serialize> Serialize for Axis<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, entry) in &self.entries {
            map.serialize_entry(key, entry)?;
        }
        map.end()
    }
}

/// A list of input image URLs sent together in one request.
/// 在一个请求中一起发送的输入图片 URL 列表。
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ImageList {
    /// Display name used in console output and reports / 在控制台输出和报告中使用的显示名称
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// The image URLs / 图片 URL
    pub urls: Vec<String>,
}

/// A prompt option for the location or person axis.
/// An absent or `null` value means the prompt is left out of the request.
///
/// 地点或人物轴的提示词选项。
/// 值缺失或为 `null` 表示请求中不包含该提示词。
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PromptOption {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default)]
    pub value: Option<String>,
}

impl PromptOption {
    /// The prompt text, or an empty string when unset.
    pub fn value(&self) -> &str {
        self.value.as_deref().unwrap_or_default()
    }
}

/// A named reference to a server-side pipeline configuration file.
/// 对服务端管线配置文件的命名引用。
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PipelineConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// File name passed to the service as `pipeline_config_file`.
    pub filename: String,
}

/// Request and retry settings shared by every test case.
/// 所有测试用例共享的请求和重试设置。
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TestSettings {
    /// Sent verbatim as `animation_prompt` in every request.
    pub animation_prompt: String,
    /// Additional attempts after the first failed one.
    #[serde(default)]
    pub max_retries: u32,
    /// Fixed pause between attempts, in seconds.
    #[serde(default)]
    pub retry_delay_seconds: f64,
}

/// The entire suite configuration, loaded from a JSON or TOML file.
/// 从 JSON 或 TOML 文件加载的整个测试套件配置。
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SuiteConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    pub endpoint: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: f64,
    #[serde(default = "default_suite_name")]
    pub test_suite_name: String,
    pub test_settings: TestSettings,
    pub image_lists: Axis<ImageList>,
    pub location_prompts: Axis<PromptOption>,
    pub person_prompts: Axis<PromptOption>,
    pub pipeline_configs: Axis<PipelineConfig>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_seconds() -> f64 {
    60.0
}

fn default_suite_name() -> String {
    "API Test Suite".to_string()
}

impl SuiteConfig {
    /// The full URL every test case is posted to.
    pub fn target_url(&self) -> String {
        format!("{}{}", self.base_url, self.endpoint)
    }

    /// Replaces `base_url` with a host given on the command line.
    pub fn apply_host_override(&mut self, host: &str) {
        self.base_url = normalize_host(host);
    }

    /// Per-request timeout. Only meaningful on a validated config.
    pub fn timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.timeout_seconds).unwrap_or_default()
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.test_settings.retry_delay_seconds).unwrap_or_default()
    }

    /// Checks the values serde cannot check on its own.
    ///
    /// # Errors
    /// Returns an error if the base URL is blank, the timeout does not convert
    /// to a non-zero duration or the retry delay does not convert to a duration.
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            bail!("{}", t!("config.empty_base_url"));
        }
        match Duration::try_from_secs_f64(self.timeout_seconds) {
            Ok(timeout) if !timeout.is_zero() => {}
            _ => bail!("{}", t!("config.invalid_timeout", value = self.timeout_seconds)),
        }
        let delay = self.test_settings.retry_delay_seconds;
        if Duration::try_from_secs_f64(delay).is_err() {
            bail!("{}", t!("config.invalid_retry_delay", value = delay));
        }
        Ok(())
    }
}

/// Prepends `http://` to a host that carries no scheme.
///
/// # Examples
/// ```
/// use api_matrix_runner::config::normalize_host;
/// assert_eq!(normalize_host("staging.example.com"), "http://staging.example.com");
/// assert_eq!(normalize_host("https://api.example.com:3000"), "https://api.example.com:3000");
/// ```
pub fn normalize_host(host: &str) -> String {
    let host = host.trim();
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("http://{host}")
    }
}

/// Parses a configuration document. TOML is used when `format_hint` is
/// `toml`, JSON otherwise.
///
/// # Errors
/// Returns an error when the document is malformed, misses a required key or
/// fails validation.
pub fn parse_suite_config(content: &str, format_hint: Option<&str>) -> Result<SuiteConfig> {
    let config: SuiteConfig = match format_hint {
        Some(ext) if ext.eq_ignore_ascii_case("toml") => {
            toml::from_str(content)
                .with_context(|| t!("config.parse_failed", format = "TOML").to_string())?
        }
        _ => serde_json::from_str(content)
            .with_context(|| t!("config.parse_failed", format = "JSON").to_string())?,
    };
    config.validate()?;
    Ok(config)
}

/// Loads and validates the suite configuration at `path`.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
pub fn load_suite_config(path: &Path) -> Result<SuiteConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| t!("config.read_failed", path = path.display()).to_string())?;
    let format_hint = path.extension().and_then(|ext| ext.to_str());
    parse_suite_config(&content, format_hint)
        .with_context(|| t!("config.load_failed", path = path.display()).to_string())
}
