//! Camera Module
//!
//! Frame streaming from the glasses camera:
//! - `FrameStreamClient`: poll lifecycle, failure counting, most-recent frame
//! - `HttpCaptureSource`: GET /capture over the local network
//! - `Frame`: one still image plus its transmit/display encodings

pub mod client;
pub mod frame;
pub mod http;

use crate::error::GlassResult;
use async_trait::async_trait;

// Re-export main types
pub use client::{FrameStreamClient, StreamStatus};
pub use frame::Frame;
pub use http::HttpCaptureSource;

/// Trait for sources of single still captures
///
/// One call fetches one complete image; there are no partial-frame semantics.
/// The production implementation is `HttpCaptureSource`; tests script their
/// own sources.
#[async_trait]
pub trait CaptureSource: Send + Sync {
    /// Fetch one image from `address`, racing against the source's timeout
    async fn capture(&self, address: &str) -> GlassResult<Vec<u8>>;
}
