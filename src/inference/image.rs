use crate::{Error, Result};
use base64::{Engine as _, engine::general_purpose::STANDARD};

const DATA_URI_PREFIX: &str = "data:image/png;base64,";

/// Header facts of an image that decoded cleanly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    pub byte_len: usize,
}

/// Drops a `data:<mime>;base64,` prefix if there is one.
pub fn strip_data_uri(encoded: &str) -> &str {
    let trimmed = encoded.trim();
    if trimmed.starts_with("data:") {
        if let Some((_, payload)) = trimmed.split_once(',') {
            return payload;
        }
    }
    trimmed
}

/// Wraps raw base64 as a PNG data URI; existing data URIs pass through.
pub fn to_data_uri(encoded: &str) -> String {
    let trimmed = encoded.trim();
    if trimmed.starts_with("data:") {
        trimmed.to_string()
    } else {
        format!("{}{}", DATA_URI_PREFIX, trimmed)
    }
}

/// Decodes base64 text and then the image itself; truncated or corrupted
/// pixel data is rejected, not only a bad header.
pub fn inspect_base64_image(encoded: &str) -> Result<ImageInfo> {
    let bytes = STANDARD
        .decode(strip_data_uri(encoded))
        .map_err(|e| Error::invalid_image(format!("base64 decode failed: {}", e)))?;

    if bytes.is_empty() {
        return Err(Error::invalid_image("image payload is empty"));
    }

    let decoded = image::load_from_memory(&bytes)
        .map_err(|e| Error::invalid_image(format!("image did not decode: {}", e)))?;

    Ok(ImageInfo {
        width: decoded.width(),
        height: decoded.height(),
        byte_len: bytes.len(),
    })
}
