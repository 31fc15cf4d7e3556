//! Speech Transcription Module
//!
//! Turns a recorded utterance into text via remote request/response
//! providers. A primary and an alternate provider are chained: try the
//! primary, on any failure try the alternate, and surface the alternate's
//! error. No retry loop, no backoff.

pub mod http;

use crate::config::Config;
use crate::error::GlassResult;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

// Re-export main types
pub use http::CloudTranscriber;

/// Trait for transcription providers
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe 16 kHz mono PCM samples into text
    async fn transcribe(&self, samples: &[i16]) -> GlassResult<String>;

    /// Get the provider name
    fn name(&self) -> &str;
}

/// Primary provider with a one-shot fallback to an alternate
pub struct FallbackTranscriber {
    primary: Arc<dyn Transcriber>,
    alternate: Arc<dyn Transcriber>,
}

impl FallbackTranscriber {
    pub fn new(primary: Arc<dyn Transcriber>, alternate: Arc<dyn Transcriber>) -> Self {
        Self { primary, alternate }
    }
}

#[async_trait]
impl Transcriber for FallbackTranscriber {
    async fn transcribe(&self, samples: &[i16]) -> GlassResult<String> {
        match self.primary.transcribe(samples).await {
            Ok(text) => Ok(text),
            Err(err) => {
                warn!(
                    "⚠️ Transcriber '{}' failed ({}), trying '{}'",
                    self.primary.name(),
                    err,
                    self.alternate.name()
                );
                self.alternate.transcribe(samples).await
            }
        }
    }

    fn name(&self) -> &str {
        "fallback"
    }
}

/// Factory to create the configured transcription chain
pub fn create_transcriber(config: &Config) -> Arc<dyn Transcriber> {
    let primary = Arc::new(CloudTranscriber::new("primary", &config.transcribe_url));
    let alternate = Arc::new(CloudTranscriber::new(
        "alternate",
        &config.transcribe_fallback_url,
    ));
    Arc::new(FallbackTranscriber::new(primary, alternate))
}
