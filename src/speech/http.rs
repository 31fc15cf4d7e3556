//! Cloud transcription provider
//!
//! Posts one utterance of base64-encoded PCM to a transcription service and
//! reads back the recognized text. Audio is framed the same way it is
//! captured: 16 kHz, 16-bit, mono.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{GlassError, GlassResult};
use crate::speech::Transcriber;

const SAMPLE_RATE: u32 = 16_000;
const SAMPLE_WIDTH: u8 = 2;
const CHANNELS: u8 = 1;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct TranscriptResponse {
    text: String,
}

pub struct CloudTranscriber {
    name: String,
    url: String,
    client: reqwest::Client,
}

impl CloudTranscriber {
    pub fn new(name: &str, url: &str) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait::async_trait]
impl Transcriber for CloudTranscriber {
    async fn transcribe(&self, samples: &[i16]) -> GlassResult<String> {
        if samples.is_empty() {
            return Err(GlassError::Speech("empty recording".to_string()));
        }

        let audio = pcm_bytes(samples);
        debug!(
            "Sending {} bytes of audio to '{}' ({})",
            audio.len(),
            self.name,
            self.url
        );

        let response = self
            .client
            .post(&self.url)
            .json(&serde_json::json!({
                "audio": STANDARD.encode(&audio),
                "rate": SAMPLE_RATE,
                "width": SAMPLE_WIDTH,
                "channels": CHANNELS,
            }))
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| GlassError::Speech(format!("'{}' request failed: {}", self.name, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GlassError::Speech(format!(
                "'{}' returned {}",
                self.name, status
            )));
        }

        let transcript: TranscriptResponse = response
            .json()
            .await
            .map_err(|e| GlassError::Speech(format!("'{}' bad response: {}", self.name, e)))?;

        info!("📝 Transcript: '{}'", transcript.text);
        Ok(transcript.text.trim().to_string())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Little-endian byte view of PCM samples
fn pcm_bytes(samples: &[i16]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(samples.len() * 2);
    for sample in samples {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pcm_bytes_little_endian() {
        assert_eq!(pcm_bytes(&[0x0102, -2]), vec![0x02, 0x01, 0xFE, 0xFF]);
    }

    #[tokio::test]
    async fn test_empty_recording_rejected_without_request() {
        let transcriber = CloudTranscriber::new("primary", "http://localhost:1/transcribe");
        let err = transcriber.transcribe(&[]).await.unwrap_err();
        assert!(matches!(err, GlassError::Speech(_)));
    }
}
