//! System fallback TTS engine
//!
//! Shells out to whatever local speech synthesizer is installed. Used when
//! the cloud voice is unreachable so replies are never silently dropped.

use tokio::process::Command;
use tracing::debug;

use crate::error::{GlassError, GlassResult};
use crate::tts::TtsEngine;

#[derive(Debug, Default)]
pub struct SystemEngine;

impl SystemEngine {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl TtsEngine for SystemEngine {
    async fn speak(&self, text: &str) -> GlassResult<()> {
        debug!("System speaking: {}", text);

        for command in ["spd-say", "espeak-ng"] {
            match Command::new(command).arg(text).status().await {
                Ok(status) if status.success() => return Ok(()),
                Ok(status) => {
                    debug!("{} exited with {}", command, status);
                }
                Err(_) => {}
            }
        }

        Err(GlassError::Tts(
            "no system TTS command found (tried spd-say, espeak-ng)".to_string(),
        ))
    }

    fn name(&self) -> &str {
        "system"
    }
}
