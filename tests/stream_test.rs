//! Stream lifecycle tests
//!
//! Drive the frame stream through its public API against a scripted camera,
//! on tokio's paused clock so five-second poll intervals cost nothing.

use std::sync::Arc;
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use glasslink::camera::{CaptureSource, FrameStreamClient};
use glasslink::config::Config;
use glasslink::error::GlassError;

mod common;
use common::mock_camera::{MockCamera, PollScript};

const STUB_JPEG: &[u8] = &[0xFF, 0xD8, 0xFF];

fn test_config() -> Config {
    Config {
        camera_address: "http://camera.test".to_string(),
        ..Config::default()
    }
}

fn client_with(script: Vec<PollScript>) -> (Arc<MockCamera>, FrameStreamClient) {
    let camera = Arc::new(MockCamera::new(script));
    let client = FrameStreamClient::new(
        Arc::clone(&camera) as Arc<dyn CaptureSource>,
        &test_config(),
    );
    (camera, client)
}

#[tokio::test(start_paused = true)]
async fn first_successful_poll_yields_decodable_frame() {
    let (_, client) = client_with(vec![PollScript::Frame(STUB_JPEG.to_vec())]);

    client.start().unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let frame = client.require_latest_frame().unwrap();
    assert_eq!(
        STANDARD.decode(frame.base64_payload()).unwrap(),
        STUB_JPEG,
        "base64 payload must decode back to the polled bytes"
    );

    let status = client.status().unwrap();
    assert!(status.streaming);
    assert_eq!(status.last_error, None);
    assert_eq!(status.consecutive_failures, 0);

    client.stop().unwrap();
}

#[tokio::test(start_paused = true)]
async fn five_timeouts_stop_the_stream_and_no_sixth_poll_fires() {
    let (camera, client) = client_with(vec![
        PollScript::Timeout,
        PollScript::Timeout,
        PollScript::Timeout,
        PollScript::Timeout,
        PollScript::Timeout,
    ]);

    client.start().unwrap();

    // Polls fire at t=0,5,10,15,20s; wait well past several more intervals
    tokio::time::sleep(Duration::from_secs(60)).await;

    assert!(!client.is_streaming());
    assert_eq!(camera.calls(), 5, "no further poll may fire after auto-stop");

    let status = client.status().unwrap();
    let error = status.last_error.expect("terminal error expected");
    assert!(error.contains('5'), "error must name the count: {}", error);
    assert!(
        error.contains("connection failed"),
        "error must mention the connection failure: {}",
        error
    );
}

#[tokio::test(start_paused = true)]
async fn success_resets_the_failure_count() {
    let (_, client) = client_with(vec![
        PollScript::HttpError(500),
        PollScript::HttpError(502),
        PollScript::Timeout,
        PollScript::Timeout,
        PollScript::Frame(STUB_JPEG.to_vec()),
        PollScript::Timeout,
    ]);

    client.start().unwrap();

    // Four failures (t=0..15s), then a success at t=20s
    tokio::time::sleep(Duration::from_secs(21)).await;
    let status = client.status().unwrap();
    assert!(status.streaming, "four failures must not stop the stream");
    assert_eq!(status.consecutive_failures, 0);
    assert_eq!(status.last_error, None, "error text clears on success");
    assert!(client.latest_frame().unwrap().is_some());

    // The next failure counts from one again
    tokio::time::sleep(Duration::from_secs(5)).await;
    let status = client.status().unwrap();
    assert!(status.streaming);
    assert_eq!(status.consecutive_failures, 1);

    client.stop().unwrap();
}

#[tokio::test(start_paused = true)]
async fn restart_after_auto_stop_polls_again() {
    let mut script: Vec<PollScript> = (0..5).map(|_| PollScript::Timeout).collect();
    script.push(PollScript::Frame(STUB_JPEG.to_vec()));
    let (camera, client) = client_with(script);

    client.start().unwrap();
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert!(!client.is_streaming());
    assert_eq!(camera.calls(), 5);

    // The session is fatal, the client is not: start() resets the counter
    client.start().unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let status = client.status().unwrap();
    assert!(status.streaming);
    assert_eq!(status.consecutive_failures, 0);
    assert_eq!(status.last_error, None);
    assert_eq!(camera.calls(), 6);
    assert!(client.latest_frame().unwrap().is_some());

    client.stop().unwrap();
}

#[tokio::test(start_paused = true)]
async fn streaming_flag_reflects_most_recent_call() {
    let (_, client) = client_with(vec![
        PollScript::Frame(STUB_JPEG.to_vec()),
        PollScript::Frame(STUB_JPEG.to_vec()),
    ]);

    assert!(!client.is_streaming());

    client.start().unwrap();
    client.start().unwrap();
    assert!(client.is_streaming());

    client.stop().unwrap();
    client.stop().unwrap();
    assert!(!client.is_streaming());

    client.start().unwrap();
    assert!(client.is_streaming());
    client.stop().unwrap();
}

#[tokio::test(start_paused = true)]
async fn stop_during_pending_request_discards_its_result() {
    let (camera, client) = client_with(vec![PollScript::DelayedFrame(
        Duration::from_secs(3),
        STUB_JPEG.to_vec(),
    )]);

    client.start().unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;
    client.stop().unwrap();

    // The request settles successfully at t=3s, after stop(): the frame slot
    // must stay empty
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(camera.calls(), 1);
    assert!(client.latest_frame().unwrap().is_none());
    assert!(matches!(
        client.require_latest_frame(),
        Err(GlassError::NoFrameAvailable)
    ));
}
