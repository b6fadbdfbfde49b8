//! # API Call Execution Module / API 调用执行模块
//!
//! This module provides the HTTP caller that runs a single test combination:
//! it builds the request body, posts it to the service, and retries failed
//! attempts a fixed number of times with a fixed delay.
//!
//! 此模块提供运行单个测试组合的 HTTP 调用器：
//! 它构建请求体，将其 POST 到服务，并以固定次数和固定间隔重试失败的尝试。

use anyhow::Result;
use colored::*;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::Value;
use std::time::{Duration, Instant};

use crate::{
    core::{
        config::SuiteConfig,
        models::{CallOutcome, Combination, FailureKind},
    },
    infra::{http, t},
};

/// JSON body posted for each combination.
///
/// `location_prompt` and `person_prompt` are only sent when non-empty.
///
/// 为每个组合发送的 JSON 请求体。
/// `location_prompt` 和 `person_prompt` 仅在非空时发送。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestBody {
    pub image_urls: Vec<String>,
    pub base64_images: Vec<String>,
    pub pipeline_config_file: String,
    pub animation_prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub person_prompt: Option<String>,
}

impl RequestBody {
    pub fn for_combination(combination: &Combination, animation_prompt: &str) -> Self {
        Self {
            image_urls: combination.image_urls.clone(),
            base64_images: Vec::new(),
            pipeline_config_file: combination.pipeline_config_filename.clone(),
            animation_prompt: animation_prompt.to_string(),
            location_prompt: non_empty(&combination.location_prompt_value),
            person_prompt: non_empty(&combination.person_prompt_value),
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

/// A single failed attempt, before the retry decision.
#[derive(Debug)]
struct AttemptFailure {
    kind: FailureKind,
    message: String,
    duration: Duration,
}

/// Posts test combinations to the service under test.
/// 将测试组合发送到被测服务。
#[derive(Debug, Clone)]
pub struct ApiCaller {
    client: Client,
    url: String,
    animation_prompt: String,
    max_retries: u32,
    retry_delay: Duration,
    timeout: Duration,
}

impl ApiCaller {
    /// Creates a caller for the suite's target URL and request settings.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &SuiteConfig) -> Result<Self> {
        let timeout = config.timeout();
        Ok(Self {
            client: http::build_client(timeout)?,
            url: config.target_url(),
            animation_prompt: config.test_settings.animation_prompt.clone(),
            max_retries: config.test_settings.max_retries,
            retry_delay: config.retry_delay(),
            timeout,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Runs one combination, making up to `max_retries + 1` attempts with a
    /// fixed pause between them. Never fails: the last attempt's failure is
    /// returned as a [`CallOutcome`] carrying the error message.
    ///
    /// 运行一个组合，最多尝试 `max_retries + 1` 次，每次之间固定暂停。
    /// 永不失败：最后一次尝试的失败作为携带错误消息的 [`CallOutcome`] 返回。
    pub async fn call(&self, combination: &Combination) -> CallOutcome {
        let body = RequestBody::for_combination(combination, &self.animation_prompt);
        let max_attempts = self.max_retries.saturating_add(1);
        let mut attempt = 1;

        loop {
            tracing::debug!(test_id = %combination.test_id, attempt, max_attempts, "sending request");

            let failure = match self.attempt(&body).await {
                Ok((response, duration)) => {
                    return CallOutcome::succeeded(response, duration, attempt);
                }
                Err(failure) => failure,
            };

            tracing::debug!(
                test_id = %combination.test_id,
                attempt,
                kind = ?failure.kind,
                error = %failure.message,
                "attempt failed"
            );

            if attempt >= max_attempts {
                return CallOutcome::failed(failure.kind, failure.message, failure.duration, attempt);
            }

            println!(
                "  {}",
                t!("run.attempt_failed", attempt = attempt, error = &failure.message).yellow()
            );
            println!(
                "     {}",
                t!("run.retrying_in", seconds = self.retry_delay.as_secs_f64())
            );
            tokio::time::sleep(self.retry_delay).await;
            attempt += 1;
        }
    }

    /// Makes one request. Only a 200 response with a JSON body counts as success.
    async fn attempt(&self, body: &RequestBody) -> Result<(Value, Duration), AttemptFailure> {
        let start_time = Instant::now();

        let response = self
            .client
            .post(&self.url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.classify(&e, start_time))?;

        let status = response.status();
        if status != StatusCode::OK {
            let text = response.text().await.unwrap_or_default();
            return Err(AttemptFailure {
                kind: FailureKind::HttpStatus,
                message: format!("HTTP {}: {}", status.as_u16(), text),
                duration: start_time.elapsed(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.classify(&e, start_time))?;
        let duration = start_time.elapsed();

        serde_json::from_slice(&bytes)
            .map(|value| (value, duration))
            .map_err(|e| AttemptFailure {
                kind: FailureKind::Unexpected,
                message: unexpected_message(&e),
                duration,
            })
    }

    /// Maps a transport error onto the failure taxonomy.
    /// Timeouts are checked first since a connect timeout is also a connect error.
    fn classify(&self, error: &reqwest::Error, start_time: Instant) -> AttemptFailure {
        if error.is_timeout() {
            AttemptFailure {
                kind: FailureKind::Timeout,
                message: format!(
                    "Request timeout after {} seconds",
                    self.timeout.as_secs_f64()
                ),
                duration: self.timeout,
            }
        } else if error.is_connect() {
            AttemptFailure {
                kind: FailureKind::Connection,
                message: "Connection error - is the API server running?".to_string(),
                duration: start_time.elapsed(),
            }
        } else {
            AttemptFailure {
                kind: FailureKind::Unexpected,
                message: unexpected_message(error),
                duration: start_time.elapsed(),
            }
        }
    }
}

fn unexpected_message(error: &dyn std::error::Error) -> String {
    format!("Unexpected error: {error}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn combination(location: &str, person: &str) -> Combination {
        Combination {
            test_id: "a_b_c_d".to_string(),
            image_list_key: "a".to_string(),
            image_list_name: "A".to_string(),
            image_list_description: String::new(),
            image_urls: vec!["http://img/1.png".to_string()],
            location_prompt_key: "b".to_string(),
            location_prompt_name: "B".to_string(),
            location_prompt_value: location.to_string(),
            person_prompt_key: "c".to_string(),
            person_prompt_name: "C".to_string(),
            person_prompt_value: person.to_string(),
            pipeline_config_key: "d".to_string(),
            pipeline_config_name: "D".to_string(),
            pipeline_config_filename: "d.json".to_string(),
        }
    }

    #[test]
    fn empty_prompts_are_omitted_from_body() {
        let body = RequestBody::for_combination(&combination("", ""), "wave");
        let json = serde_json::to_value(&body).unwrap();
        let object = json.as_object().unwrap();

        assert!(!object.contains_key("location_prompt"));
        assert!(!object.contains_key("person_prompt"));
        assert_eq!(object["pipeline_config_file"], "d.json");
        assert_eq!(object["animation_prompt"], "wave");
        assert_eq!(object["base64_images"], serde_json::json!([]));
        assert_eq!(object["image_urls"], serde_json::json!(["http://img/1.png"]));
    }

    #[test]
    fn non_empty_prompts_are_sent_verbatim() {
        let body = RequestBody::for_combination(&combination("  on a beach ", "a <child>"), "wave");
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["location_prompt"], "  on a beach ");
        assert_eq!(json["person_prompt"], "a <child>");
    }
}
