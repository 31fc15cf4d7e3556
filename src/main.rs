//! GlassLink - Smart Glasses Companion Client
//!
//! Streams frames from the glasses camera, records spoken queries, sends
//! them to the assistant backend and plays back the reply.

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tokio::io::AsyncBufReadExt;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use glasslink::assistant::Assistant;
use glasslink::audio::Playback;
use glasslink::backend::BackendClient;
use glasslink::camera::{FrameStreamClient, HttpCaptureSource};
use glasslink::config::Config;
use glasslink::{speech, tts};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Audio input device index
    #[arg(short, long)]
    device: Option<usize>,

    /// Camera base address (overrides config)
    #[arg(long)]
    camera: Option<String>,

    /// Run without the camera stream
    #[arg(long)]
    no_camera: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load()?;
    if let Some(camera) = args.camera {
        config.camera_address = camera;
    }
    if args.device.is_some() {
        config.audio_device = args.device;
    }

    // Setup logging
    let default_filter = if args.verbose {
        "debug".to_string()
    } else {
        config.log_level.to_lowercase()
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("👓 GlassLink v{} starting...", env!("CARGO_PKG_VERSION"));

    let source = Arc::new(HttpCaptureSource::new(&config)?);
    let camera = Arc::new(FrameStreamClient::new(source, &config));
    if args.no_camera {
        info!("📷 Camera stream disabled (--no-camera)");
    } else {
        camera.start()?;
    }

    let playback = Arc::new(Playback::new()?);
    let transcriber = speech::create_transcriber(&config);
    let tts_engine = tts::create_engine(&config, playback);
    let backend = BackendClient::new(&config);

    let assistant = Assistant::new(
        Arc::clone(&camera),
        backend,
        transcriber,
        tts_engine,
        &config,
    );

    info!("✅ GlassLink ready");
    info!("   Commands: talk | ask <text> | status | recap [YYYY-MM-DD] | camera start|stop|address <url> | quit");

    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (command, rest) = match line.split_once(' ') {
            Some((command, rest)) => (command, rest.trim()),
            None => (line, ""),
        };

        match command {
            "quit" | "exit" => break,
            "status" => println!("{}", assistant.status_line()?),
            "talk" => match assistant.handle_voice_query().await {
                Ok(reply) => println!("{}", reply),
                Err(e) => warn!("⚠️ Voice query failed: {}", e),
            },
            "ask" if !rest.is_empty() => match assistant.handle_text_query(rest).await {
                Ok(reply) => println!("{}", reply),
                Err(e) => warn!("⚠️ Query failed: {}", e),
            },
            "recap" => {
                let date = if rest.is_empty() {
                    None
                } else {
                    match chrono::NaiveDate::parse_from_str(rest, "%Y-%m-%d") {
                        Ok(date) => Some(date),
                        Err(e) => {
                            warn!("⚠️ Bad date '{}': {}", rest, e);
                            continue;
                        }
                    }
                };
                match assistant.daily_recap(date).await {
                    Ok(recap) => println!("{}", recap),
                    Err(e) => warn!("⚠️ Recap failed: {}", e),
                }
            }
            "camera" => match rest.split_once(' ').unwrap_or((rest, "")) {
                ("start", _) => camera.start()?,
                ("stop", _) => camera.stop()?,
                ("address", url) if !url.is_empty() => {
                    camera.set_source_address(url)?;
                    println!("camera address set to {}", url);
                }
                _ => println!("usage: camera start|stop|address <url>"),
            },
            _ => {
                println!("commands: talk | ask <text> | status | recap [YYYY-MM-DD] | camera start|stop|address <url> | quit");
            }
        }
    }

    camera.stop()?;
    info!("👋 GlassLink shutting down");
    Ok(())
}
