//! Assistant Orchestration
//!
//! One voice interaction end to end: record an utterance, transcribe it,
//! send the query to the backend with the most recent camera frame attached,
//! and speak the reply. A missing frame never blocks a query.

use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::backend::BackendClient;
use crate::camera::FrameStreamClient;
use crate::config::Config;
use crate::error::{GlassError, GlassResult};
use crate::speech::Transcriber;
use crate::tts::TtsEngine;

pub struct Assistant {
    camera: Arc<FrameStreamClient>,
    backend: BackendClient,
    transcriber: Arc<dyn Transcriber>,
    tts: Arc<dyn TtsEngine>,
    device_index: Option<usize>,
    max_record_secs: f32,
}

impl Assistant {
    pub fn new(
        camera: Arc<FrameStreamClient>,
        backend: BackendClient,
        transcriber: Arc<dyn Transcriber>,
        tts: Arc<dyn TtsEngine>,
        config: &Config,
    ) -> Self {
        Self {
            camera,
            backend,
            transcriber,
            tts,
            device_index: config.audio_device,
            max_record_secs: config.max_record_secs,
        }
    }

    /// Record one utterance, transcribe it and handle it as a query
    pub async fn handle_voice_query(&self) -> GlassResult<String> {
        let device_index = self.device_index;
        let max_record_secs = self.max_record_secs;
        let samples = tokio::task::spawn_blocking(move || {
            crate::audio::record_utterance(device_index, max_record_secs)
        })
        .await
        .map_err(|e| GlassError::Audio(format!("recording task failed: {}", e)))?
        .map_err(|e| GlassError::Audio(e.to_string()))?;

        let text = self.transcriber.transcribe(&samples).await?;
        if text.is_empty() {
            return Err(GlassError::Speech("nothing recognized".to_string()));
        }
        info!("📝 Heard: '{}'", text);

        self.handle_text_query(&text).await
    }

    /// Send a query to the backend, attaching the latest frame when the
    /// camera has produced one, and speak the reply
    pub async fn handle_text_query(&self, text: &str) -> GlassResult<String> {
        let frame = self.camera.latest_frame()?;
        match &frame {
            Some(frame) => debug!("Attaching latest frame ({} bytes)", frame.len()),
            None => debug!("No frame available yet, sending query without an image"),
        }

        let response = self.backend.query(text, frame.as_ref()).await?;
        let reply = response.spoken_reply();
        info!("💬 {}", reply);

        if let Err(e) = self.tts.speak(&reply).await {
            warn!("⚠️ Could not speak reply: {}", e);
        }
        Ok(reply)
    }

    /// Fetch and speak the recap of a day's scenes (today when `date` is None)
    pub async fn daily_recap(&self, date: Option<NaiveDate>) -> GlassResult<String> {
        let recap = self.backend.daily_recap(date).await?;
        info!("💬 {}", recap);
        if let Err(e) = self.tts.speak(&recap).await {
            warn!("⚠️ Could not speak recap: {}", e);
        }
        Ok(recap)
    }

    /// One-line status for the UI: streaming/offline indicator plus the most
    /// recent stream error
    pub fn status_line(&self) -> GlassResult<String> {
        let status = self.camera.status()?;
        let indicator = if status.streaming {
            "● streaming"
        } else {
            "○ offline"
        };
        Ok(match status.last_error {
            Some(error) => format!("{} [{}] — {}", indicator, status.source_address, error),
            None => format!("{} [{}]", indicator, status.source_address),
        })
    }
}
