//! Audio Module
//!
//! Microphone capture for spoken queries and playback of synthesized
//! replies. Capture is blocking and meant to run on a dedicated thread
//! (cpal's stream is not Send); callers in async context wrap it in
//! `spawn_blocking`.

pub mod playback;

use anyhow::{Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

pub use playback::Playback;

pub const SAMPLE_RATE: u32 = 16_000;
const CHUNK_SIZE: usize = 1024;

/// Energy below this counts as silence
const SILENCE_THRESHOLD: f32 = 250.0;
/// Stop recording once speech has been followed by this much silence
const TRAILING_SILENCE: Duration = Duration::from_millis(1_200);

/// Record one utterance from the microphone: capture until the speaker goes
/// quiet, or until `max_secs` elapses. Returns 16 kHz mono samples.
pub fn record_utterance(device_index: Option<usize>, max_secs: f32) -> Result<Vec<i16>> {
    let host = cpal::default_host();

    // Select device
    let device = if let Some(idx) = device_index {
        host.input_devices()?
            .nth(idx)
            .context("Device index out of range")?
    } else {
        host.default_input_device()
            .context("No default input device")?
    };

    let device_name = device.name().unwrap_or_else(|_| "Unknown".to_string());
    info!("🎙️ Recording from: {}", device_name);

    // Configure stream
    let config = cpal::StreamConfig {
        channels: 1,
        sample_rate: cpal::SampleRate(SAMPLE_RATE),
        buffer_size: cpal::BufferSize::Fixed(CHUNK_SIZE as u32),
    };

    let (tx, rx): (Sender<Vec<i16>>, Receiver<Vec<i16>>) = mpsc::channel();

    let stream = device.build_input_stream(
        &config,
        move |data: &[i16], _: &cpal::InputCallbackInfo| {
            if tx.send(data.to_vec()).is_err() {
                debug!("Audio receiver dropped");
            }
        },
        |err| {
            warn!("Audio stream error: {}", err);
        },
        None,
    )?;

    stream.play()?;

    let started = Instant::now();
    let max_duration = Duration::from_secs_f32(max_secs);
    let mut samples: Vec<i16> = Vec::new();
    let mut speech_heard = false;
    let mut silent_for = Duration::ZERO;

    while started.elapsed() < max_duration {
        let chunk = match rx.recv_timeout(Duration::from_millis(500)) {
            Ok(chunk) => chunk,
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        };

        let chunk_duration =
            Duration::from_secs_f64(chunk.len() as f64 / SAMPLE_RATE as f64);
        let energy = calculate_energy(&chunk);
        samples.extend_from_slice(&chunk);

        if energy >= SILENCE_THRESHOLD {
            speech_heard = true;
            silent_for = Duration::ZERO;
        } else if speech_heard {
            silent_for += chunk_duration;
            if silent_for >= TRAILING_SILENCE {
                debug!("Trailing silence reached, stopping capture");
                break;
            }
        }
    }

    drop(stream);

    if !speech_heard {
        anyhow::bail!("No speech detected");
    }

    info!(
        "🎙️ Captured {:.1}s of audio",
        samples.len() as f32 / SAMPLE_RATE as f32
    );
    Ok(samples)
}

/// Calculate audio energy for VAD
pub fn calculate_energy(samples: &[i16]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum: i64 = samples.iter().map(|&s| (s as i64).pow(2)).sum();
    (sum as f32 / samples.len() as f32).sqrt()
}
