//! HTTP capture source
//!
//! Talks to the glasses camera firmware, which serves one complete JPEG per
//! GET of its /capture endpoint. Each request is raced against a fixed
//! timeout; a response that arrives after the deadline loses the race and is
//! dropped with the future.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CACHE_CONTROL};
use tracing::debug;

use crate::camera::frame::JPEG_MIME;
use crate::camera::CaptureSource;
use crate::config::Config;
use crate::error::{GlassError, GlassResult};

pub struct HttpCaptureSource {
    client: reqwest::Client,
    request_timeout: Duration,
}

impl HttpCaptureSource {
    pub fn new(config: &Config) -> GlassResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(JPEG_MIME));
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            request_timeout: Duration::from_millis(config.capture_timeout_ms),
        })
    }

    /// Capture URL for a camera base address
    fn capture_url(address: &str) -> String {
        format!("{}/capture", address.trim_end_matches('/'))
    }
}

#[async_trait]
impl CaptureSource for HttpCaptureSource {
    async fn capture(&self, address: &str) -> GlassResult<Vec<u8>> {
        let url = Self::capture_url(address);
        debug!("GET {}", url);

        let fetch = async {
            let response = self
                .client
                .get(&url)
                .send()
                .await
                .map_err(|e| GlassError::Transport(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                return Err(GlassError::HttpStatus(status.as_u16()));
            }

            let body = response
                .bytes()
                .await
                .map_err(|e| GlassError::Transport(e.to_string()))?;
            Ok(body.to_vec())
        };

        match tokio::time::timeout(self.request_timeout, fetch).await {
            Ok(outcome) => outcome,
            Err(_) => Err(GlassError::Transport(format!(
                "no response from {} within {:?}",
                url, self.request_timeout
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_url_joins_cleanly() {
        assert_eq!(
            HttpCaptureSource::capture_url("http://192.168.137.58"),
            "http://192.168.137.58/capture"
        );
        assert_eq!(
            HttpCaptureSource::capture_url("http://192.168.137.58/"),
            "http://192.168.137.58/capture"
        );
    }
}
