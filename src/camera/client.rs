//! Frame streaming client
//!
//! Owns the poll timer, the session state and the single most recent frame.
//! Each tick issues one capture attempt tagged with a fresh sequence number;
//! a settlement is applied only while the stream is live and only if nothing
//! newer has been applied already, so late responses never overwrite newer
//! frames. Failures are counted per session; once the threshold is reached
//! the stream stops itself and records a terminal error for the UI.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::camera::frame::Frame;
use crate::camera::CaptureSource;
use crate::config::Config;
use crate::error::{GlassError, GlassResult};

/// Mutable state for one streaming session
///
/// Lives behind a mutex shared between the timer task, in-flight capture
/// tasks and the owning client. Lock scopes never span an await.
#[derive(Debug)]
pub struct StreamSession {
    streaming: bool,
    source_address: String,
    last_error: Option<String>,
    consecutive_failures: u32,
    issued_seq: u64,
    applied_seq: u64,
    latest: Option<Frame>,
}

impl StreamSession {
    fn new(source_address: String) -> Self {
        Self {
            streaming: false,
            source_address,
            last_error: None,
            consecutive_failures: 0,
            issued_seq: 0,
            applied_seq: 0,
            latest: None,
        }
    }
}

/// Snapshot of stream state for display
#[derive(Debug, Clone)]
pub struct StreamStatus {
    pub streaming: bool,
    pub source_address: String,
    pub last_error: Option<String>,
    pub consecutive_failures: u32,
}

/// Polls the camera's capture endpoint on a timer and keeps the most recent
/// frame. "Most recent wins": no history, no buffering of missed frames.
pub struct FrameStreamClient {
    session: Arc<Mutex<StreamSession>>,
    source: Arc<dyn CaptureSource>,
    poll_interval: Duration,
    failure_threshold: u32,
    stop_signal: Arc<Notify>,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl FrameStreamClient {
    pub fn new(source: Arc<dyn CaptureSource>, config: &Config) -> Self {
        Self {
            session: Arc::new(Mutex::new(StreamSession::new(config.camera_address.clone()))),
            source,
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            failure_threshold: config.failure_threshold,
            stop_signal: Arc::new(Notify::new()),
            timer: Mutex::new(None),
        }
    }

    /// Begin polling. Idempotent: a second call while streaming is a no-op,
    /// guarded by the flag before any state is touched so rapid repeated
    /// calls cannot spawn a duplicate timer.
    pub fn start(&self) -> GlassResult<()> {
        {
            let mut session = self.session.lock()?;
            if session.streaming {
                debug!("Frame stream already running, ignoring start()");
                return Ok(());
            }
            session.streaming = true;
            session.last_error = None;
            session.consecutive_failures = 0;
        }

        let session = Arc::clone(&self.session);
        let source = Arc::clone(&self.source);
        let stop_signal = Arc::clone(&self.stop_signal);
        let threshold = self.failure_threshold;
        let poll_interval = self.poll_interval;

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = stop_signal.notified() => break,
                    _ = ticker.tick() => {}
                }

                // stop() raced with this tick: drop the timer, no side effects
                let (address, seq) = {
                    let mut session = match session.lock() {
                        Ok(session) => session,
                        Err(_) => break,
                    };
                    if !session.streaming {
                        break;
                    }
                    session.issued_seq += 1;
                    (session.source_address.clone(), session.issued_seq)
                };

                debug!("📷 Poll #{} -> {}", seq, address);

                // Each attempt runs as its own task so a slow response cannot
                // hold up later ticks; the sequence number decides which
                // settlement wins, not arrival order.
                let session = Arc::clone(&session);
                let source = Arc::clone(&source);
                let stop_signal = Arc::clone(&stop_signal);
                tokio::spawn(async move {
                    let outcome = source
                        .capture(&address)
                        .await
                        .and_then(Frame::from_bytes);
                    if apply_poll_result(&session, threshold, seq, outcome) {
                        stop_signal.notify_waiters();
                    }
                });
            }
        });

        *self.timer.lock()? = Some(handle);
        info!("📷 Frame stream started (every {:?})", self.poll_interval);
        Ok(())
    }

    /// Stop polling. Idempotent. An in-flight request cannot be cancelled;
    /// its settlement is discarded because the apply path re-checks the
    /// streaming flag.
    pub fn stop(&self) -> GlassResult<()> {
        {
            let mut session = self.session.lock()?;
            if !session.streaming {
                debug!("Frame stream already stopped");
            }
            session.streaming = false;
        }
        self.stop_signal.notify_waiters();
        if let Some(handle) = self.timer.lock()?.take() {
            handle.abort();
        }
        info!("📷 Frame stream stopped");
        Ok(())
    }

    /// Point subsequent polls at a new address. A poll already in flight
    /// keeps the address it was issued with.
    pub fn set_source_address(&self, address: &str) -> GlassResult<()> {
        let mut session = self.session.lock()?;
        session.source_address = address.to_string();
        Ok(())
    }

    /// The most recent frame, if any successful poll has happened
    pub fn latest_frame(&self) -> GlassResult<Option<Frame>> {
        Ok(self.session.lock()?.latest.clone())
    }

    /// The most recent frame, or `NoFrameAvailable` for callers that cannot
    /// proceed without one
    pub fn require_latest_frame(&self) -> GlassResult<Frame> {
        self.latest_frame()?.ok_or(GlassError::NoFrameAvailable)
    }

    pub fn is_streaming(&self) -> bool {
        self.session
            .lock()
            .map(|session| session.streaming)
            .unwrap_or(false)
    }

    /// Snapshot for the UI: streaming indicator plus the last error string
    pub fn status(&self) -> GlassResult<StreamStatus> {
        let session = self.session.lock()?;
        Ok(StreamStatus {
            streaming: session.streaming,
            source_address: session.source_address.clone(),
            last_error: session.last_error.clone(),
            consecutive_failures: session.consecutive_failures,
        })
    }
}

impl Drop for FrameStreamClient {
    fn drop(&mut self) {
        if let Ok(mut timer) = self.timer.lock() {
            if let Some(handle) = timer.take() {
                handle.abort();
            }
        }
    }
}

/// Apply one poll settlement to the session. Returns true when this
/// settlement crossed the failure threshold and stopped the stream.
///
/// The liveness flag is re-validated here rather than relying on the timer
/// having been cancelled: a response that lands after stop() must not touch
/// the frame slot. Settlements older than the newest applied one are
/// discarded outright.
fn apply_poll_result(
    session: &Mutex<StreamSession>,
    threshold: u32,
    seq: u64,
    outcome: GlassResult<Frame>,
) -> bool {
    let mut session = match session.lock() {
        Ok(session) => session,
        Err(_) => return false,
    };

    if !session.streaming {
        debug!("Discarding poll #{} settled after stop", seq);
        return false;
    }
    if seq <= session.applied_seq {
        debug!(
            "Discarding stale poll #{} (already applied #{})",
            seq, session.applied_seq
        );
        return false;
    }
    session.applied_seq = seq;

    match outcome {
        Ok(frame) => {
            debug!("📷 Poll #{} ok ({} bytes)", seq, frame.len());
            session.latest = Some(frame);
            // Error text and counter clear together; stale error text must
            // not outlive a healthy stream
            session.last_error = None;
            session.consecutive_failures = 0;
            false
        }
        Err(err) => {
            session.consecutive_failures += 1;
            session.last_error = Some(format!(
                "{} (attempt {} of {})",
                err, session.consecutive_failures, threshold
            ));
            warn!(
                "⚠️ Poll #{} failed ({}/{}): {}",
                seq, session.consecutive_failures, threshold, err
            );

            if session.consecutive_failures >= threshold {
                session.streaming = false;
                session.last_error = Some(format!(
                    "camera connection failed {} times in a row; streaming stopped",
                    threshold
                ));
                warn!(
                    "🛑 Camera unreachable after {} consecutive failures, stopping stream",
                    threshold
                );
                return true;
            }
            false
        }
    }
}
