//! Motion service HTTP client.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{MotionError, MotionResult};

/// Configuration for the motion client.
#[derive(Debug, Clone)]
pub struct MotionClientConfig {
    /// Base URL of the generation service.
    pub base_url: String,
    /// Bearer token, if the deployment requires one.
    pub api_key: Option<String>,
    /// Publicly reachable URL of our inbound callback endpoint.
    pub callback_url: String,
    /// Request timeout for the synchronous submission call.
    pub timeout: Duration,
    /// Max retries for transient submission failures.
    pub max_retries: u32,
}

impl Default for MotionClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8100".to_string(),
            api_key: None,
            callback_url: "http://localhost:8000/api/callbacks/motion".to_string(),
            timeout: Duration::from_secs(30),
            max_retries: 2,
        }
    }
}

impl MotionClientConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: std::env::var("MOTION_SERVICE_URL").unwrap_or(defaults.base_url),
            api_key: std::env::var("MOTION_SERVICE_API_KEY").ok(),
            callback_url: std::env::var("MOTION_CALLBACK_URL").unwrap_or(defaults.callback_url),
            timeout: Duration::from_secs(
                std::env::var("MOTION_SERVICE_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            max_retries: std::env::var("MOTION_SERVICE_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_retries),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitRequest<'a> {
    avatar_url: &'a str,
    reference_url: &'a str,
    callback_url: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitResponse {
    code: Option<i64>,
    msg: Option<String>,
    data: Option<SubmitData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitData {
    task_id: Option<String>,
}

/// Client for the external motion generation service.
pub struct MotionClient {
    http: Client,
    config: MotionClientConfig,
}

impl MotionClient {
    /// Create a new motion client.
    pub fn new(config: MotionClientConfig) -> MotionResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(MotionError::Network)?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> MotionResult<Self> {
        Self::new(MotionClientConfig::from_env())
    }

    /// Submit a generation job; returns the external job id.
    ///
    /// Fail closed: any error here means no job was accepted and no local
    /// record should be persisted.
    pub async fn submit(&self, avatar_url: &str, reference_url: &str) -> MotionResult<String> {
        let url = format!("{}/generate", self.config.base_url.trim_end_matches('/'));
        let body = SubmitRequest {
            avatar_url,
            reference_url,
            callback_url: &self.config.callback_url,
        };

        debug!(url, "Submitting motion generation job");

        let response = self
            .with_retry(|| async {
                let mut request = self.http.post(&url).json(&body);
                if let Some(ref key) = self.config.api_key {
                    request = request.bearer_auth(key);
                }
                let response = request.send().await.map_err(MotionError::Network)?;

                if response.status().is_server_error() {
                    return Err(MotionError::ServiceUnavailable(format!(
                        "motion service returned {}",
                        response.status()
                    )));
                }
                Ok(response)
            })
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(MotionError::SubmitRejected(format!("{status}: {body}")));
        }

        let parsed: SubmitResponse = response.json().await?;
        if parsed.code != Some(200) {
            return Err(MotionError::SubmitRejected(
                parsed.msg.unwrap_or_else(|| "submission not accepted".to_string()),
            ));
        }

        parsed
            .data
            .and_then(|d| d.task_id)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                MotionError::InvalidResponse("response carried no task id".to_string())
            })
    }

    /// Execute with retry for transient failures.
    async fn with_retry<F, Fut, T>(&self, operation: F) -> MotionResult<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = MotionResult<T>>,
    {
        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    let delay = Duration::from_millis(500 * 2u64.pow(attempt));
                    warn!(
                        "Motion submission failed (attempt {}), retrying in {:?}: {}",
                        attempt + 1,
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error
            .unwrap_or_else(|| MotionError::InvalidResponse("unknown error".to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(base_url: String) -> MotionClientConfig {
        MotionClientConfig {
            base_url,
            api_key: None,
            callback_url: "http://localhost:8000/api/callbacks/motion".to_string(),
            timeout: Duration::from_secs(5),
            max_retries: 0,
        }
    }

    #[tokio::test]
    async fn test_submit_returns_external_job_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "code": 200,
                "data": { "taskId": "ext-42" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = MotionClient::new(test_config(server.uri())).unwrap();
        let task_id = client
            .submit("https://files/avatar.png", "https://files/ref.mp4")
            .await
            .unwrap();
        assert_eq!(task_id, "ext-42");
    }

    #[tokio::test]
    async fn test_submit_rejected_by_service_code() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "code": 400,
                "msg": "unsupported avatar format"
            })))
            .mount(&server)
            .await;

        let client = MotionClient::new(test_config(server.uri())).unwrap();
        let err = client
            .submit("https://files/avatar.png", "https://files/ref.mp4")
            .await
            .unwrap_err();
        assert!(matches!(err, MotionError::SubmitRejected(_)));
    }

    #[tokio::test]
    async fn test_submit_missing_task_id_is_invalid() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "code": 200,
                "data": {}
            })))
            .mount(&server)
            .await;

        let client = MotionClient::new(test_config(server.uri())).unwrap();
        let err = client
            .submit("https://files/avatar.png", "https://files/ref.mp4")
            .await
            .unwrap_err();
        assert!(matches!(err, MotionError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_submit_server_error_is_retryable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/generate"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = MotionClient::new(test_config(server.uri())).unwrap();
        let err = client
            .submit("https://files/avatar.png", "https://files/ref.mp4")
            .await
            .unwrap_err();
        assert!(err.is_retryable());
    }
}
