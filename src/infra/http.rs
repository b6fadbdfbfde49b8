//! HTTP client construction and the service health probe.

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use std::time::Duration;

use crate::infra::t;

/// Timeout for the `/health` probe.
pub const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Builds the client used for test requests, with the suite's request timeout.
///
/// # Errors
/// Returns an error if the TLS backend cannot be initialized.
pub fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .with_context(|| t!("http.client_build_failed").to_string())
}

/// Result of probing `{base_url}/health`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// The probe returned 200.
    Healthy,
    /// The service answered with another status.
    Unhealthy(u16),
    /// The service could not be reached at all.
    Unreachable(String),
    /// The probe failed for another reason.
    Unknown(String),
}

/// The health endpoint for a base URL.
pub fn health_url(base_url: &str) -> String {
    format!("{}/health", base_url.trim_end_matches('/'))
}

/// Sends a best-effort `GET {base_url}/health`. Never fails; problems are
/// reported through the returned status.
pub async fn check_health(base_url: &str) -> HealthStatus {
    let client = match build_client(HEALTH_CHECK_TIMEOUT) {
        Ok(client) => client,
        Err(e) => return HealthStatus::Unknown(format!("{e:#}")),
    };

    let url = health_url(base_url);
    tracing::debug!(%url, "probing service health");

    match client.get(&url).send().await {
        Ok(response) if response.status() == StatusCode::OK => HealthStatus::Healthy,
        Ok(response) => HealthStatus::Unhealthy(response.status().as_u16()),
        Err(e) if e.is_connect() => HealthStatus::Unreachable(e.to_string()),
        Err(e) => HealthStatus::Unknown(e.to_string()),
    }
}
