//! Image normalizer: enforces the dimension and byte-size constraints.
//!
//! Re-encoding is attempted at most once per image. If the single pass is
//! still above `max_size`, the oversized result is kept.

use serde::Serialize;

use crate::config::IntakePolicy;
use crate::error::DecodeError;
use crate::images::RawImage;
use crate::images::codec::ImageCodec;

/// How a [`NormalizedImage`] was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NormalizeOutcome {
    /// Within every limit; bytes passed through untouched
    Unchanged,
    /// Re-encoded; `from` holds the source dimensions
    Resized { from: (u32, u32) },
    /// Re-encode failed; the original bytes were kept
    EncodeFallback,
}

/// An image that went through [`normalize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedImage {
    pub image: RawImage,
    pub width: u32,
    pub height: u32,
    pub outcome: NormalizeOutcome,
}

impl NormalizedImage {
    pub fn name(&self) -> &str {
        self.image.name()
    }
}

/// Computes the size an image of `width`x`height` is re-encoded at.
///
/// The longer axis is clamped to `max_dimension` and the shorter axis is scaled
/// by the same ratio, rounded to the nearest pixel. Images are never upscaled,
/// so an image within bounds keeps its size.
pub fn target_dimensions(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    let scale = |short: u32, long: u32| -> u32 {
        let scaled = (f64::from(short) * f64::from(max_dimension) / f64::from(long)).round();
        (scaled as u32).max(1)
    };

    if width >= height {
        if width > max_dimension {
            return (max_dimension, scale(height, width));
        }
    } else if height > max_dimension {
        return (scale(width, height), max_dimension);
    }
    (width, height)
}

/// Whether an image needs no work under `policy`.
pub fn within_limits(width: u32, height: u32, byte_len: u64, policy: &IntakePolicy) -> bool {
    width <= policy.max_dimension && height <= policy.max_dimension && byte_len <= policy.max_size
}

/// Normalizes one image.
///
/// Returns the input untouched when it is within every limit; otherwise
/// re-encodes it once at [`target_dimensions`]. A failed re-encode falls back
/// to the original bytes.
///
/// # Errors
/// Returns [`DecodeError`] when the payload cannot be decoded.
pub fn normalize<C: ImageCodec>(
    codec: &C,
    policy: &IntakePolicy,
    image: RawImage,
) -> Result<NormalizedImage, DecodeError> {
    let decoded = codec.decode(&image)?;
    let (width, height) = (decoded.width, decoded.height);

    if within_limits(width, height, image.len(), policy) {
        tracing::debug!(name = image.name(), width, height, "within limits");
        return Ok(NormalizedImage {
            image,
            width,
            height,
            outcome: NormalizeOutcome::Unchanged,
        });
    }

    let (target_w, target_h) = target_dimensions(width, height, policy.max_dimension);
    match codec.encode(
        &decoded.raster,
        image.mime_type(),
        target_w,
        target_h,
        policy.resize_quality,
    ) {
        Ok(bytes) if !bytes.is_empty() => {
            let resized = image.with_data(bytes);
            tracing::debug!(
                name = image.name(),
                from = ?(width, height),
                to = ?(target_w, target_h),
                bytes_before = image.len(),
                bytes_after = resized.len(),
                "resized"
            );
            if resized.len() > policy.max_size {
                tracing::debug!(
                    name = image.name(),
                    bytes = resized.len(),
                    max_size = policy.max_size,
                    "still above max_size after re-encode"
                );
            }
            Ok(NormalizedImage {
                image: resized,
                width: target_w,
                height: target_h,
                outcome: NormalizeOutcome::Resized {
                    from: (width, height),
                },
            })
        }
        Ok(_) => {
            tracing::warn!(name = image.name(), "encoder produced no output, keeping original");
            Ok(fallback(image, width, height))
        }
        Err(err) => {
            tracing::warn!(name = image.name(), error = %err, "re-encode failed, keeping original");
            Ok(fallback(image, width, height))
        }
    }
}

fn fallback(image: RawImage, width: u32, height: u32) -> NormalizedImage {
    NormalizedImage {
        image,
        width,
        height,
        outcome: NormalizeOutcome::EncodeFallback,
    }
}


#[cfg(test)]
mod tests {
    use super::fake::{FakeCodec, image};
    use super::*;
    use crate::images::codec::{RasterCodec, fixtures};

    fn policy(max_dimension: u32, max_size: u64) -> IntakePolicy {
        IntakePolicy {
            max_dimension,
            max_size,
            ..IntakePolicy::default()
        }
    }

    #[test]
    fn test_target_dimensions_landscape() {
        assert_eq!(target_dimensions(1200, 800, 600), (600, 400));
        assert_eq!(target_dimensions(1000, 333, 600), (600, 200));
    }

    #[test]
    fn test_target_dimensions_portrait() {
        assert_eq!(target_dimensions(800, 1200, 600), (400, 600));
        assert_eq!(target_dimensions(333, 1000, 600), (200, 600));
    }

    #[test]
    fn test_target_dimensions_square_clamps_both_axes() {
        assert_eq!(target_dimensions(900, 900, 600), (600, 600));
    }

    #[test]
    fn test_target_dimensions_never_upscales() {
        assert_eq!(target_dimensions(300, 200, 600), (300, 200));
        assert_eq!(target_dimensions(600, 600, 600), (600, 600));
    }

    #[test]
    fn test_target_dimensions_extreme_ratio_keeps_one_pixel() {
        assert_eq!(target_dimensions(10_000, 1, 600), (600, 1));
        assert_eq!(target_dimensions(1, 10_000, 600), (1, 600));
    }

    #[test]
    fn test_target_dimensions_preserves_aspect_ratio() {
        for (w, h) in [(1920, 1080), (1080, 1920), (4000, 3000), (601, 599), (3000, 7)] {
            let (tw, th) = target_dimensions(w, h, 600);
            assert!(tw <= 600 && th <= 600);
            let before = f64::from(w) / f64::from(h);
            let after = f64::from(tw) / f64::from(th);
            // One pixel of rounding on the shorter axis bounds the drift.
            let short = f64::from(tw.min(th));
            let tolerance = before.max(1.0 / before) / short + 1e-9;
            let drift = if w >= h {
                (after - before).abs() / before
            } else {
                (1.0 / after - 1.0 / before).abs() * before
            };
            assert!(drift <= tolerance, "{w}x{h} -> {tw}x{th}");
        }
    }

    #[test]
    fn test_below_threshold_is_same_payload() {
        let codec = FakeCodec::default();
        let input = image("a.jpg", 600, 400);
        let ptr = input.data().as_ptr();

        let out = normalize(&codec, &policy(600, 1024), input.clone()).unwrap();

        assert_eq!(out.outcome, NormalizeOutcome::Unchanged);
        assert_eq!(out.image, input);
        assert_eq!(out.image.data().as_ptr(), ptr);
        assert_eq!(codec.encode_count(), 0);
    }

    #[test]
    fn test_oversized_dimensions_are_resized() {
        let codec = FakeCodec::default();
        let out = normalize(&codec, &policy(600, 1024), image("big.jpg", 1200, 900)).unwrap();

        assert_eq!((out.width, out.height), (600, 450));
        assert_eq!(out.name(), "big.jpg");
        assert_eq!(out.image.mime_type(), "image/jpeg");
        assert_eq!(
            out.outcome,
            NormalizeOutcome::Resized { from: (1200, 900) }
        );
        assert_eq!(out.image.data().as_ref(), b"600x450@0.8");
    }

    #[test]
    fn test_oversized_bytes_reencode_at_same_size() {
        let codec = FakeCodec::default();
        // "300x200" is 7 bytes, above a 4-byte limit
        let out = normalize(&codec, &policy(600, 4), image("heavy.jpg", 300, 200)).unwrap();

        assert_eq!((out.width, out.height), (300, 200));
        assert_eq!(codec.encode_count(), 1);
        // Still above max_size after the single pass, accepted as-is.
        assert!(out.image.len() > 4);
    }

    #[test]
    fn test_encode_failure_keeps_original() {
        let codec = FakeCodec::failing();
        let input = image("big.jpg", 2000, 1000);

        let out = normalize(&codec, &policy(600, 1024), input.clone()).unwrap();

        assert_eq!(out.outcome, NormalizeOutcome::EncodeFallback);
        assert_eq!(out.image, input);
        assert_eq!((out.width, out.height), (2000, 1000));
        assert_eq!(codec.encode_count(), 1);
    }

    #[test]
    fn test_empty_encode_output_keeps_original() {
        let codec = FakeCodec {
            empty_encode: true,
            ..FakeCodec::default()
        };
        let input = image("big.jpg", 2000, 1000);

        let out = normalize(&codec, &policy(600, 1024), input.clone()).unwrap();

        assert_eq!(out.outcome, NormalizeOutcome::EncodeFallback);
        assert_eq!(out.image, input);
    }

    #[test]
    fn test_decode_failure_is_error() {
        let codec = FakeCodec::default();
        let input = RawImage::new("x.jpg", "image/jpeg", b"garbage".to_vec());

        let err = normalize(&codec, &IntakePolicy::default(), input).unwrap_err();
        assert_eq!(err.name, "x.jpg");
    }

    #[test]
    fn test_real_codec_downscales_jpeg() {
        let out = normalize(
            &RasterCodec,
            &IntakePolicy::default(),
            fixtures::jpeg("wide.jpg", 1200, 300),
        )
        .unwrap();

        assert_eq!((out.width, out.height), (600, 150));
        let redecoded = RasterCodec.decode(&out.image).unwrap();
        assert_eq!((redecoded.width, redecoded.height), (600, 150));
    }

    #[test]
    fn test_real_codec_gif_falls_back() {
        let input = fixtures::gif("anim.gif", 700, 100);
        let out = normalize(&RasterCodec, &IntakePolicy::default(), input.clone()).unwrap();

        assert_eq!(out.outcome, NormalizeOutcome::EncodeFallback);
        assert_eq!(out.image, input);
    }
}
