//! TTS (Text-to-Speech) Module
//!
//! Provides a unified interface for multiple TTS backends. The default chain
//! synthesizes through the cloud voice and falls back to the local system
//! voice when the cloud provider fails: try primary, on any failure try the
//! alternate, surface the alternate's error.

pub mod cloud;
pub mod system;

use crate::audio::Playback;
use crate::config::Config;
use crate::error::GlassResult;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

// Re-export main types
pub use cloud::CloudTts;
pub use system::SystemEngine;

/// Trait for TTS engines
#[async_trait]
pub trait TtsEngine: Send + Sync + std::fmt::Debug {
    /// Speak the given text
    async fn speak(&self, text: &str) -> GlassResult<()>;

    /// Get the engine name
    fn name(&self) -> &str;
}

/// Primary engine with a one-shot fallback to an alternate
#[derive(Debug)]
pub struct FallbackSpeaker {
    primary: Arc<dyn TtsEngine>,
    alternate: Arc<dyn TtsEngine>,
}

impl FallbackSpeaker {
    pub fn new(primary: Arc<dyn TtsEngine>, alternate: Arc<dyn TtsEngine>) -> Self {
        Self { primary, alternate }
    }
}

#[async_trait]
impl TtsEngine for FallbackSpeaker {
    async fn speak(&self, text: &str) -> GlassResult<()> {
        match self.primary.speak(text).await {
            Ok(()) => Ok(()),
            Err(err) => {
                warn!(
                    "⚠️ TTS engine '{}' failed ({}), trying '{}'",
                    self.primary.name(),
                    err,
                    self.alternate.name()
                );
                self.alternate.speak(text).await
            }
        }
    }

    fn name(&self) -> &str {
        "fallback"
    }
}

/// Factory to create the configured TTS engine
pub fn create_engine(config: &Config, playback: Arc<Playback>) -> Arc<dyn TtsEngine> {
    info!("🛠️ Creating TTS engine: {}", config.tts_engine);
    let engine: Arc<dyn TtsEngine> = match config.tts_engine.as_str() {
        "cloud" => {
            info!("  - Using cloud TTS (voice: {})", config.tts_voice);
            Arc::new(FallbackSpeaker::new(
                Arc::new(CloudTts::new(config, playback)),
                Arc::new(SystemEngine::new()),
            ))
        }
        "system" => {
            info!("  - Using system TTS");
            Arc::new(SystemEngine::new())
        }
        _ => {
            warn!(
                "  - Unknown engine '{}', falling back to system",
                config.tts_engine
            );
            Arc::new(SystemEngine::new())
        }
    };
    info!("✅ TTS engine '{}' initialized", engine.name());
    engine
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GlassError;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug)]
    struct CountingEngine {
        name: &'static str,
        fail: bool,
        calls: AtomicU32,
    }

    impl CountingEngine {
        fn new(name: &'static str, fail: bool) -> Arc<Self> {
            Arc::new(Self {
                name,
                fail,
                calls: AtomicU32::new(0),
            })
        }
    }

    #[async_trait]
    impl TtsEngine for CountingEngine {
        async fn speak(&self, _text: &str) -> GlassResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(GlassError::Tts(format!("{} unavailable", self.name)))
            } else {
                Ok(())
            }
        }

        fn name(&self) -> &str {
            self.name
        }
    }

    #[tokio::test]
    async fn test_fallback_only_on_primary_failure() {
        let primary = CountingEngine::new("cloud", false);
        let alternate = CountingEngine::new("system", false);
        let speaker = FallbackSpeaker::new(
            Arc::clone(&primary) as Arc<dyn TtsEngine>,
            Arc::clone(&alternate) as Arc<dyn TtsEngine>,
        );

        speaker.speak("hello").await.unwrap();
        assert_eq!(primary.calls.load(Ordering::SeqCst), 1);
        assert_eq!(alternate.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_fallback_surfaces_alternate_error() {
        let speaker = FallbackSpeaker::new(
            CountingEngine::new("cloud", true),
            CountingEngine::new("system", true),
        );

        let err = speaker.speak("hello").await.unwrap_err();
        assert!(err.to_string().contains("system"));
    }
}
