//! Playback engine for synthesized speech
//!
//! Uses a channel-based architecture to handle rodio's non-Send stream: a
//! dedicated audio thread owns the output stream and sink, and playback
//! requests are sent to it as decoded audio byte buffers (MP3 or WAV).

use std::io::Cursor;
use std::sync::mpsc;
use std::thread;
use tracing::{debug, error, info, warn};

use crate::error::{GlassError, GlassResult};

/// Commands sent to the audio thread
enum PlaybackCommand {
    PlayBytes(Vec<u8>, mpsc::Sender<()>),
    Stop,
}

/// Thread-safe handle to the playback engine
#[derive(Clone)]
pub struct Playback {
    sender: mpsc::Sender<PlaybackCommand>,
}

impl std::fmt::Debug for Playback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Playback").finish()
    }
}

impl Playback {
    pub fn new() -> GlassResult<Self> {
        let (sender, receiver) = mpsc::channel::<PlaybackCommand>();

        // Spawn dedicated audio thread
        thread::spawn(move || {
            Self::audio_thread(receiver);
        });

        Ok(Self { sender })
    }

    fn audio_thread(receiver: mpsc::Receiver<PlaybackCommand>) {
        use rodio::OutputStream;

        let (stream, stream_handle) = match OutputStream::try_default() {
            Ok(s) => s,
            Err(e) => {
                warn!("🔇 Failed to initialize audio output: {}", e);
                return;
            }
        };

        // Keep stream alive
        let _stream = stream;
        let mut sink = match rodio::Sink::try_new(&stream_handle) {
            Ok(s) => s,
            Err(e) => {
                error!("❌ Failed to create audio sink: {}", e);
                return;
            }
        };

        info!("🔊 Playback thread started");

        while let Ok(command) = receiver.recv() {
            match command {
                PlaybackCommand::PlayBytes(bytes, done) => {
                    debug!("🔊 Playing {} bytes", bytes.len());
                    match rodio::Decoder::new(Cursor::new(bytes)) {
                        Ok(source) => {
                            sink.append(source);
                            sink.sleep_until_end();
                        }
                        Err(e) => {
                            error!("❌ Failed to decode audio: {}", e);
                        }
                    }
                    let _ = done.send(());
                }
                PlaybackCommand::Stop => {
                    info!("🛑 Stopping playback");
                    sink.stop();
                    // Re-create sink after stop as it becomes unusable if we
                    // want to play again
                    if let Ok(new_sink) = rodio::Sink::try_new(&stream_handle) {
                        sink = new_sink;
                    }
                }
            }
        }

        info!("🔇 Playback thread stopped");
    }

    /// Play a decoded audio buffer and wait for completion
    pub fn play_bytes_sync(&self, bytes: Vec<u8>) -> GlassResult<()> {
        let (tx, rx) = mpsc::channel();
        self.sender
            .send(PlaybackCommand::PlayBytes(bytes, tx))
            .map_err(|e| GlassError::Audio(format!("playback thread disconnected: {}", e)))?;

        let _ = rx.recv();
        Ok(())
    }

    /// Stop current playback and clear the queue
    pub fn stop(&self) -> GlassResult<()> {
        self.sender
            .send(PlaybackCommand::Stop)
            .map_err(|e| GlassError::Audio(format!("playback thread disconnected: {}", e)))
    }
}
