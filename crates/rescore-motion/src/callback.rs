//! Callback payload types.
//!
//! The payload shape is controlled by the external service, so every field
//! is optional and parsing is defensive: a malformed notification must
//! degrade to a no-op with a warning, never a crash.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Top-level callback envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackEnvelope {
    pub code: Option<i64>,
    pub data: Option<CallbackData>,
}

impl CallbackEnvelope {
    /// Whether the envelope reports a delivered outcome at all.
    pub fn is_delivered(&self) -> bool {
        self.code == Some(200)
    }
}

/// Per-job callback body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackData {
    /// Correlation key; a callback without one cannot be applied.
    pub task_id: Option<String>,

    /// `"success"` or a failure state.
    pub state: Option<String>,

    /// JSON-encoded string carrying `{"resultUrls": [..]}` on success.
    pub result_json: Option<String>,

    pub fail_msg: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResultPayload {
    #[serde(default)]
    result_urls: Vec<String>,
}

impl CallbackData {
    pub fn is_success(&self) -> bool {
        self.state.as_deref() == Some("success")
    }

    /// Extract the generated video URL from the nested `resultJson` blob.
    ///
    /// Returns `None` for anything short of a well-formed payload with at
    /// least one URL; the caller decides what a missing result means.
    pub fn result_url(&self) -> Option<String> {
        let raw = self.result_json.as_deref()?;
        match serde_json::from_str::<ResultPayload>(raw) {
            Ok(payload) => payload.result_urls.into_iter().next(),
            Err(e) => {
                warn!(error = %e, "Malformed resultJson in motion callback");
                None
            }
        }
    }

    pub fn failure_message(&self) -> String {
        self.fail_msg
            .clone()
            .unwrap_or_else(|| "generation failed with no message".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(json: serde_json::Value) -> CallbackEnvelope {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_success_payload_round_trip() {
        let env = envelope(serde_json::json!({
            "code": 200,
            "data": {
                "taskId": "ext-123",
                "state": "success",
                "resultJson": "{\"resultUrls\": [\"https://cdn.example.com/out.mp4\"]}"
            }
        }));
        assert!(env.is_delivered());
        let data = env.data.unwrap();
        assert!(data.is_success());
        assert_eq!(
            data.result_url().as_deref(),
            Some("https://cdn.example.com/out.mp4")
        );
    }

    #[test]
    fn test_failure_payload() {
        let env = envelope(serde_json::json!({
            "code": 200,
            "data": {
                "taskId": "ext-123",
                "state": "fail",
                "failMsg": "face not detected"
            }
        }));
        let data = env.data.unwrap();
        assert!(!data.is_success());
        assert_eq!(data.failure_message(), "face not detected");
    }

    #[test]
    fn test_malformed_result_json_yields_none() {
        let data = CallbackData {
            task_id: Some("ext-123".to_string()),
            state: Some("success".to_string()),
            result_json: Some("{not json".to_string()),
            fail_msg: None,
        };
        assert_eq!(data.result_url(), None);
    }

    #[test]
    fn test_empty_result_urls_yields_none() {
        let data = CallbackData {
            task_id: Some("ext-123".to_string()),
            state: Some("success".to_string()),
            result_json: Some("{\"resultUrls\": []}".to_string()),
            fail_msg: None,
        };
        assert_eq!(data.result_url(), None);
    }

    #[test]
    fn test_unexpected_shape_still_deserializes() {
        // Unknown fields and missing ones are tolerated wholesale.
        let env = envelope(serde_json::json!({
            "code": 200,
            "data": { "taskId": "ext-9", "surprise": true }
        }));
        let data = env.data.unwrap();
        assert!(!data.is_success());
        assert_eq!(data.result_url(), None);
    }
}
