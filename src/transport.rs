//! Data-URL transport decoding.
//!
//! Uploads arrive as `data:<mime>;base64,<payload>`. Only the part after the
//! first comma is significant; the prefix is not interpreted.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::error::{ConversionError, Result};

/// Decode the base64 payload of a data URL into raw file bytes.
pub fn decode_data_url(content: &str) -> Result<Vec<u8>> {
    let (_, payload) = content
        .split_once(',')
        .ok_or(ConversionError::MalformedTransportEncoding)?;

    // Line-wrapped base64 is common in hand-built payloads
    let compact: String = payload
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();

    Ok(STANDARD.decode(compact)?)
}
