//! Backend Query Dispatcher
//!
//! Client side of the glasses assistant backend. Natural-language queries go
//! to /query with the most recent camera frame attached opportunistically;
//! the backend routes them to a function (face recognition, OCR, scene
//! description, daily recap) or answers directly with text. The individual
//! function endpoints are also exposed for direct calls.

use std::time::Duration;

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::camera::Frame;
use crate::config::Config;
use crate::error::{GlassError, GlassResult};

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    query: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct ImageRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct SaveFaceRequest<'a> {
    identity: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct DailyRecapRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    date: Option<String>,
}

/// One face-recognition match
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct FaceMatch {
    pub identity: String,
    #[serde(default)]
    pub confidence: f32,
}

#[derive(Debug, Deserialize)]
struct MatchesResponse {
    #[serde(default)]
    matches: Vec<FaceMatch>,
}

/// Result payload of a routed function call
///
/// The backend's functions share a loose shape: a status, an optional
/// message, and whichever data field the function produces.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FunctionResult {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub matches: Vec<FaceMatch>,
    #[serde(default, alias = "text_lines")]
    pub text: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub filepath: Option<String>,
}

impl FunctionResult {
    fn is_error(&self) -> bool {
        self.status.as_deref() == Some("error")
    }

    /// Flatten this result into one utterance
    pub fn spoken_reply(&self) -> String {
        if self.is_error() {
            return self
                .message
                .clone()
                .unwrap_or_else(|| "Sorry, that didn't work.".to_string());
        }
        if let Some(description) = &self.description {
            return description.clone();
        }
        if let Some(best) = self.matches.first() {
            return format!("That looks like {}", best.identity);
        }
        if !self.text.is_empty() {
            return format!("The text reads: {}", self.text.join(". "));
        }
        if let Some(message) = &self.message {
            return message.clone();
        }
        "Done.".to_string()
    }
}

/// Decoded /query response
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum QueryResponse {
    /// The backend routed the query to a function
    Routed {
        function: String,
        result: FunctionResult,
    },
    /// A bare function result (daily recap comes back this way)
    Bare { result: FunctionResult },
    /// Direct text answer, no function involved
    Text { text: String },
}

impl QueryResponse {
    /// Flatten any response shape into one utterance for TTS
    pub fn spoken_reply(&self) -> String {
        match self {
            QueryResponse::Text { text } => text.clone(),
            QueryResponse::Routed { result, .. } | QueryResponse::Bare { result } => {
                result.spoken_reply()
            }
        }
    }
}

/// HTTP client for the assistant backend
pub struct BackendClient {
    base_url: String,
    request_timeout: Duration,
    client: reqwest::Client,
}

impl BackendClient {
    pub fn new(config: &Config) -> Self {
        Self {
            base_url: config.backend_url.trim_end_matches('/').to_string(),
            request_timeout: Duration::from_secs(config.backend_timeout_secs),
            client: reqwest::Client::new(),
        }
    }

    async fn post_json<B, R>(&self, path: &str, body: &B) -> GlassResult<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .json(body)
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|e| GlassError::Backend(format!("request to {} failed: {}", url, e)))?;

        let status = response.status();
        let body_text = response
            .text()
            .await
            .map_err(|e| GlassError::Backend(format!("reading {} response failed: {}", url, e)))?;

        if !status.is_success() {
            warn!("❌ Backend error ({}): {}", status, body_text);
            return Err(GlassError::Backend(format!(
                "{} returned {}: {}",
                url, status, body_text
            )));
        }

        serde_json::from_str(&body_text)
            .map_err(|e| GlassError::Backend(format!("unexpected response from {}: {}", url, e)))
    }

    /// Send a natural-language query, attaching `frame` when one is present.
    /// Absence of a frame is valid; the query proceeds without an image.
    pub async fn query(&self, text: &str, frame: Option<&Frame>) -> GlassResult<QueryResponse> {
        let request = QueryRequest {
            query: text,
            image: frame.map(Frame::base64_payload),
        };
        self.post_json("/query", &request).await
    }

    /// Look up the face in the current view against the stored database
    pub async fn recognize_face(&self, frame: Option<&Frame>) -> GlassResult<Vec<FaceMatch>> {
        let request = ImageRequest {
            image: frame.map(Frame::base64_payload),
        };
        let response: MatchesResponse = self.post_json("/recognize_face", &request).await?;
        Ok(response.matches)
    }

    /// Run OCR over the current view
    pub async fn extract_text(&self, frame: Option<&Frame>) -> GlassResult<Vec<String>> {
        let request = ImageRequest {
            image: frame.map(Frame::base64_payload),
        };
        let result: FunctionResult = self.post_json("/extract_text", &request).await?;
        Ok(result.text)
    }

    /// Store the current face under `identity`
    pub async fn save_face(&self, identity: &str, frame: Option<&Frame>) -> GlassResult<String> {
        let request = SaveFaceRequest {
            identity,
            image: frame.map(Frame::base64_payload),
        };
        let result: FunctionResult = self.post_json("/save_face", &request).await?;
        if result.is_error() {
            return Err(GlassError::Backend(
                result
                    .message
                    .unwrap_or_else(|| "failed to save face".to_string()),
            ));
        }
        Ok(result
            .message
            .unwrap_or_else(|| format!("Face saved as {}", identity)))
    }

    /// Capture the current scene to the backend's scene archive
    pub async fn save_screenshot(&self, frame: Option<&Frame>) -> GlassResult<FunctionResult> {
        let request = ImageRequest {
            image: frame.map(Frame::base64_payload),
        };
        let result: FunctionResult = self.post_json("/save_screenshot", &request).await?;
        if result.is_error() {
            return Err(GlassError::Backend(
                result
                    .message
                    .unwrap_or_else(|| "failed to save screenshot".to_string()),
            ));
        }
        Ok(result)
    }

    /// Describe the current scene
    pub async fn describe_scene(&self, frame: Option<&Frame>) -> GlassResult<String> {
        let request = ImageRequest {
            image: frame.map(Frame::base64_payload),
        };
        let result: FunctionResult = self.post_json("/describe_scene", &request).await?;
        match (result.is_error(), result.description) {
            (false, Some(description)) => Ok(description),
            _ => Err(GlassError::Backend(
                result
                    .message
                    .unwrap_or_else(|| "no scene description returned".to_string()),
            )),
        }
    }

    /// Summarize the scenes captured on `date` (today when `None`)
    pub async fn daily_recap(&self, date: Option<NaiveDate>) -> GlassResult<String> {
        let request = DailyRecapRequest {
            date: date.map(|d| d.format("%Y%m%d").to_string()),
        };
        let result: FunctionResult = self.post_json("/daily_recap", &request).await?;
        match (result.is_error(), result.description) {
            (false, Some(description)) => Ok(description),
            _ => Err(GlassError::Backend(
                result
                    .message
                    .unwrap_or_else(|| "no recap available".to_string()),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_body_omits_missing_image() {
        let request = QueryRequest {
            query: "who is this?",
            image: None,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value, serde_json::json!({"query": "who is this?"}));
    }

    #[test]
    fn test_query_body_includes_frame_payload() {
        let frame = Frame::from_bytes(vec![0xFF, 0xD8, 0xFF]).unwrap();
        let request = QueryRequest {
            query: "what do you see?",
            image: Some(frame.base64_payload()),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["image"], frame.base64_payload());
    }

    #[test]
    fn test_decode_routed_response() {
        let raw = r#"{
            "function": "recognize_face",
            "result": {
                "status": "success",
                "matches": [{"identity": "ada.jpg", "confidence": 87.5}],
                "message": "Found 1 potential matches"
            }
        }"#;
        let response: QueryResponse = serde_json::from_str(raw).unwrap();
        match &response {
            QueryResponse::Routed { function, result } => {
                assert_eq!(function, "recognize_face");
                assert_eq!(result.matches[0].identity, "ada.jpg");
            }
            other => panic!("expected routed response, got {:?}", other),
        }
        assert_eq!(response.spoken_reply(), "That looks like ada.jpg");
    }

    #[test]
    fn test_decode_bare_recap_response() {
        let raw = r#"{
            "result": {
                "status": "success",
                "description": "You spent the morning at the library."
            }
        }"#;
        let response: QueryResponse = serde_json::from_str(raw).unwrap();
        assert!(matches!(response, QueryResponse::Bare { .. }));
        assert_eq!(
            response.spoken_reply(),
            "You spent the morning at the library."
        );
    }

    #[test]
    fn test_decode_text_response() {
        let response: QueryResponse =
            serde_json::from_str(r#"{"text": "Hello there!"}"#).unwrap();
        assert!(matches!(response, QueryResponse::Text { .. }));
        assert_eq!(response.spoken_reply(), "Hello there!");
    }

    #[test]
    fn test_ocr_result_speaks_text_lines() {
        let result: FunctionResult = serde_json::from_str(
            r#"{"status": "success", "text": ["EXIT", "Platform 4"]}"#,
        )
        .unwrap();
        assert_eq!(result.spoken_reply(), "The text reads: EXIT. Platform 4");
    }

    #[test]
    fn test_error_result_speaks_message() {
        let result: FunctionResult = serde_json::from_str(
            r#"{"status": "error", "message": "No scenes found for the specified date"}"#,
        )
        .unwrap();
        assert_eq!(
            result.spoken_reply(),
            "No scenes found for the specified date"
        );
    }
}
