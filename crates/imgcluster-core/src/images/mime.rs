//! Path normalization + MIME helpers for image files.

use std::path::{Path, PathBuf};

/// MIME type used when neither content nor extension identifies a file.
pub const FALLBACK_MIME: &str = "application/octet-stream";

/// Normalizes user-provided file paths.
///
/// Handles common drag-and-drop shell escaping (`\ `, `\(`, `\)`) and
/// expands `~/` to the HOME directory when available.
#[must_use]
pub fn normalize_input_path(path: &str) -> PathBuf {
    let unescaped = path
        .replace("\\ ", " ")
        .replace("\\(", "(")
        .replace("\\)", ")");

    let path = Path::new(&unescaped);
    if let Some(rest) = path.to_str().and_then(|s| s.strip_prefix("~/"))
        && let Ok(home) = std::env::var("HOME")
    {
        return PathBuf::from(home).join(rest);
    }

    path.to_path_buf()
}

/// Returns MIME type inferred from file extension for common image formats.
#[must_use]
pub fn mime_type_for_extension(path: &Path) -> Option<&'static str> {
    let ext = path.extension().and_then(|e| e.to_str())?;

    match ext.to_ascii_lowercase().as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "bmp" => Some("image/bmp"),
        "tif" | "tiff" => Some("image/tiff"),
        "txt" => Some("text/plain"),
        "pdf" => Some("application/pdf"),
        _ => None,
    }
}

/// Detects MIME type from magic bytes.
#[must_use]
pub fn sniff_mime_type(bytes: &[u8]) -> Option<&'static str> {
    if bytes.is_empty() {
        return None;
    }
    infer::get(bytes).map(|kind| kind.mime_type())
}

/// Content first, then extension, then [`FALLBACK_MIME`].
#[must_use]
pub fn detect_mime_type(path: &Path, bytes: &[u8]) -> &'static str {
    sniff_mime_type(bytes)
        .or_else(|| mime_type_for_extension(path))
        .unwrap_or(FALLBACK_MIME)
}

#[must_use]
pub fn is_image_mime(mime_type: &str) -> bool {
    mime_type.starts_with("image/")
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D];
    const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46];

    #[test]
    fn test_sniff_prefers_content_over_extension() {
        // PNG bytes behind a .jpg name are reported as PNG
        assert_eq!(detect_mime_type(Path::new("photo.jpg"), PNG_MAGIC), "image/png");
        assert_eq!(detect_mime_type(Path::new("x.png"), JPEG_MAGIC), "image/jpeg");
    }

    #[test]
    fn test_extension_fallback_and_unknown() {
        assert_eq!(detect_mime_type(Path::new("a.JPEG"), b""), "image/jpeg");
        assert_eq!(detect_mime_type(Path::new("notes.txt"), b"hello"), "text/plain");
        assert_eq!(detect_mime_type(Path::new("blob"), b"hello"), FALLBACK_MIME);
    }

    #[test]
    fn test_is_image_mime() {
        assert!(is_image_mime("image/webp"));
        assert!(!is_image_mime("text/plain"));
        assert!(!is_image_mime(FALLBACK_MIME));
    }

    #[test]
    fn test_normalize_input_path_unescapes() {
        assert_eq!(
            normalize_input_path("My\\ Photos/a\\(1\\).png"),
            PathBuf::from("My Photos/a(1).png")
        );
    }
}
