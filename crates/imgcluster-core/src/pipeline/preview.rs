//! Inline preview encoding.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;

use crate::images::RawImage;

/// Turns an already normalized image into a displayable inline string.
pub trait PreviewEncoder: Send + Sync + 'static {
    fn encode(&self, image: &RawImage) -> String;
}

/// Emits `data:<mime>;base64,<payload>` over the full image bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct DataUriEncoder;

impl PreviewEncoder for DataUriEncoder {
    fn encode(&self, image: &RawImage) -> String {
        data_uri(image.mime_type(), image.data())
    }
}

pub fn data_uri(mime_type: &str, data: &[u8]) -> String {
    format!("data:{mime_type};base64,{}", BASE64.encode(data))
}
