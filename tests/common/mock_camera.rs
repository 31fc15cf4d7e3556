//! Scripted camera source for stream lifecycle tests

use async_trait::async_trait;
use glasslink::camera::CaptureSource;
use glasslink::error::{GlassError, GlassResult};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// One scripted poll outcome
pub enum PollScript {
    /// 200 with the given body
    Frame(Vec<u8>),
    /// Non-2xx status
    HttpError(u16),
    /// Transport-level failure (network error or timeout)
    Timeout,
    /// 200 with the given body, settling after a delay
    DelayedFrame(Duration, Vec<u8>),
}

/// Capture source that replays a script, then times out forever
pub struct MockCamera {
    script: Mutex<VecDeque<PollScript>>,
    calls: AtomicU32,
}

impl MockCamera {
    pub fn new(script: Vec<PollScript>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: AtomicU32::new(0),
        }
    }

    /// Number of capture attempts made so far
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CaptureSource for MockCamera {
    async fn capture(&self, address: &str) -> GlassResult<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let step = self.script.lock().unwrap().pop_front();
        match step {
            Some(PollScript::Frame(bytes)) => Ok(bytes),
            Some(PollScript::HttpError(status)) => Err(GlassError::HttpStatus(status)),
            Some(PollScript::DelayedFrame(delay, bytes)) => {
                tokio::time::sleep(delay).await;
                Ok(bytes)
            }
            Some(PollScript::Timeout) | None => Err(GlassError::Transport(format!(
                "no response from {}/capture within 10s",
                address
            ))),
        }
    }
}
