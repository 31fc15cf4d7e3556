//! Cloud TTS backend
//!
//! Posts text to a synthesis service and plays the returned audio through
//! the playback engine. The service answers with base64 audio, either bare
//! or wrapped in a data URI.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::audio::Playback;
use crate::camera::frame::data_uri_payload;
use crate::config::Config;
use crate::error::{GlassError, GlassResult};
use crate::tts::TtsEngine;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct SynthesisResponse {
    audio: String,
}

pub struct CloudTts {
    url: String,
    voice: String,
    playback: Arc<Playback>,
    client: reqwest::Client,
}

impl std::fmt::Debug for CloudTts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudTts")
            .field("url", &self.url)
            .field("voice", &self.voice)
            .finish()
    }
}

impl CloudTts {
    pub fn new(config: &Config, playback: Arc<Playback>) -> Self {
        Self {
            url: config.tts_url.clone(),
            voice: config.tts_voice.clone(),
            playback,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait::async_trait]
impl TtsEngine for CloudTts {
    async fn speak(&self, text: &str) -> GlassResult<()> {
        info!("📢 Cloud TTS speaking: '{}'", text);

        let response = self
            .client
            .post(&self.url)
            .json(&serde_json::json!({
                "text": text,
                "voice": self.voice,
            }))
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| GlassError::Tts(format!("synthesis request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GlassError::Tts(format!("synthesis returned {}", status)));
        }

        let synthesis: SynthesisResponse = response
            .json()
            .await
            .map_err(|e| GlassError::Tts(format!("bad synthesis response: {}", e)))?;

        let audio = decode_audio(&synthesis.audio)?;
        debug!("Synthesized {} bytes of audio", audio.len());

        let playback = Arc::clone(&self.playback);
        tokio::task::spawn_blocking(move || playback.play_bytes_sync(audio))
            .await
            .map_err(|e| GlassError::Tts(format!("playback task failed: {}", e)))??;

        Ok(())
    }

    fn name(&self) -> &str {
        "cloud"
    }
}

/// Decode the audio payload of a synthesis response
fn decode_audio(payload: &str) -> GlassResult<Vec<u8>> {
    STANDARD
        .decode(data_uri_payload(payload).trim())
        .map_err(|e| GlassError::Tts(format!("invalid audio payload: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_bare_base64_audio() {
        let bytes = decode_audio("AQID").unwrap();
        assert_eq!(bytes, vec![1, 2, 3]);
    }

    #[test]
    fn test_decode_data_uri_audio() {
        let bytes = decode_audio("data:audio/mpeg;base64,AQID").unwrap();
        assert_eq!(bytes, vec![1, 2, 3]);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode_audio("***").is_err());
    }
}
