//! Image payloads plus the decode/resize/encode helpers that act on them.

pub mod codec;
pub mod mime;

use bytes::Bytes;

/// A selected file: name, MIME tag and immutable bytes.
///
/// Cloning shares the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawImage {
    name: String,
    mime_type: String,
    data: Bytes,
}

impl RawImage {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    /// File name; unique identifier within a batch.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Byte length of the payload.
    pub fn len(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Whether the MIME tag names an image type.
    pub fn is_image(&self) -> bool {
        mime::is_image_mime(&self.mime_type)
    }

    /// Returns a replacement with the same name and MIME tag but new bytes.
    #[must_use]
    pub fn with_data(&self, data: impl Into<Bytes>) -> Self {
        Self {
            name: self.name.clone(),
            mime_type: self.mime_type.clone(),
            data: data.into(),
        }
    }
}
