//! Camera frame representation
//!
//! A `Frame` is one captured still image and its two derived encodings: a
//! bare base64 payload for JSON request bodies and a data URI for direct
//! rendering in an image view. Both are derived from the same bytes, so they
//! never drift apart.

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::error::{GlassError, GlassResult};

/// MIME type the camera declares for still captures
pub const JPEG_MIME: &str = "image/jpeg";

/// One captured still image with its derived encodings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    bytes: Vec<u8>,
    base64_payload: String,
    display_uri: String,
}

impl Frame {
    /// Build a frame from raw JPEG bytes, deriving both encodings in one pass
    pub fn from_bytes(bytes: Vec<u8>) -> GlassResult<Self> {
        if bytes.is_empty() {
            return Err(GlassError::Decode("empty image payload".to_string()));
        }
        let base64_payload = STANDARD.encode(&bytes);
        let display_uri = format!("data:{};base64,{}", JPEG_MIME, base64_payload);
        Ok(Self {
            bytes,
            base64_payload,
            display_uri,
        })
    }

    /// Build a frame from a textual payload: either bare base64 or a full
    /// data URI. A data URI is split at the first comma to separate the
    /// metadata from the payload before re-deriving the base64 form.
    pub fn from_payload(payload: &str) -> GlassResult<Self> {
        let encoded = data_uri_payload(payload);
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| GlassError::Decode(format!("invalid base64 payload: {}", e)))?;
        Self::from_bytes(bytes)
    }

    /// Raw image bytes
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Base64 payload, no prefix, for embedding in a JSON request body
    pub fn base64_payload(&self) -> &str {
        &self.base64_payload
    }

    /// Self-contained `data:image/jpeg;base64,...` URI for an image view
    pub fn display_uri(&self) -> &str {
        &self.display_uri
    }

    /// Size of the raw image in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True if the frame holds no bytes (never constructed in practice)
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Extract the base64 payload from `input`: for a data URI this is the
/// substring after the first comma; anything else passes through unchanged.
pub fn data_uri_payload(input: &str) -> &str {
    if input.starts_with("data:") {
        match input.split_once(',') {
            Some((_, payload)) => payload,
            None => input,
        }
    } else {
        input
    }
}
