//! Decode/resize/encode collaborator used by the normalizer.

use std::io::Cursor;

use image::DynamicImage;

use super::RawImage;
use crate::error::{DecodeError, EncodeError};

/// A decoded raster together with its pixel dimensions.
#[derive(Debug, Clone)]
pub struct Decoded<R> {
    pub width: u32,
    pub height: u32,
    pub raster: R,
}

/// Decodes candidates and re-encodes them at a target size.
///
/// Implementations run on the blocking pool, so they may do CPU-heavy work
/// synchronously.
pub trait ImageCodec: Send + Sync + 'static {
    type Raster: Send;

    /// Decodes `image` far enough to know its dimensions.
    ///
    /// # Errors
    /// Returns [`DecodeError`] when the payload is not a readable raster.
    fn decode(&self, image: &RawImage) -> Result<Decoded<Self::Raster>, DecodeError>;

    /// Scales `raster` to `width`x`height` and encodes it as `mime_type`.
    ///
    /// `quality` is in `0.0..=1.0`; formats without a quality knob ignore it.
    /// WebP is always written lossless, so `quality` has no effect there and
    /// a downscaled WebP can come out larger than its lossy source.
    ///
    /// # Errors
    /// Returns [`EncodeError`] when no output could be produced.
    fn encode(
        &self,
        raster: &Self::Raster,
        mime_type: &str,
        width: u32,
        height: u32,
        quality: f64,
    ) -> Result<Vec<u8>, EncodeError>;
}

/// [`ImageCodec`] backed by `image` for codecs and `fast_image_resize` for scaling.
#[derive(Debug, Clone, Copy, Default)]
pub struct RasterCodec;

impl ImageCodec for RasterCodec {
    type Raster = DynamicImage;

    fn decode(&self, image: &RawImage) -> Result<Decoded<DynamicImage>, DecodeError> {
        let reader = image::ImageReader::new(Cursor::new(image.data().as_ref()))
            .with_guessed_format()
            .map_err(|e| DecodeError::new(image.name(), e.to_string()))?;

        let raster = reader
            .decode()
            .map_err(|e| DecodeError::new(image.name(), e.to_string()))?;

        Ok(Decoded {
            width: raster.width(),
            height: raster.height(),
            raster,
        })
    }

    fn encode(
        &self,
        raster: &DynamicImage,
        mime_type: &str,
        width: u32,
        height: u32,
        quality: f64,
    ) -> Result<Vec<u8>, EncodeError> {
        if !can_encode(mime_type) {
            return Err(EncodeError::unsupported(mime_type));
        }

        let resized = resize_image(raster, width, height)?;
        match mime_type {
            "image/jpeg" | "image/jpg" => encode_jpeg(&resized, quality),
            "image/png" => encode_png(&resized),
            "image/webp" => encode_webp(&resized),
            other => Err(EncodeError::unsupported(other)),
        }
    }
}

fn can_encode(mime_type: &str) -> bool {
    matches!(
        mime_type,
        "image/jpeg" | "image/jpg" | "image/png" | "image/webp"
    )
}

fn resize_image(src: &DynamicImage, dst_w: u32, dst_h: u32) -> Result<DynamicImage, EncodeError> {
    use fast_image_resize as fir;

    if src.width() == dst_w && src.height() == dst_h {
        return Ok(src.clone());
    }
    if dst_w == 0 || dst_h == 0 {
        return Err(EncodeError::new(format!("invalid target size {dst_w}x{dst_h}")));
    }

    let src_rgba = src.to_rgba8();
    let src_w = src_rgba.width();
    let src_h = src_rgba.height();
    let src_pixels = src_rgba.into_raw();

    let src_image = fir::images::Image::from_vec_u8(src_w, src_h, src_pixels, fir::PixelType::U8x4)
        .map_err(|e| EncodeError::new(format!("resize: {e}")))?;

    let mut dst_image = fir::images::Image::new(dst_w, dst_h, fir::PixelType::U8x4);
    let mut resizer = fir::Resizer::new();
    let options = fir::ResizeOptions::new()
        .resize_alg(fir::ResizeAlg::Convolution(fir::FilterType::Lanczos3));
    resizer
        .resize(&src_image, &mut dst_image, Some(&options))
        .map_err(|e| EncodeError::new(format!("resize: {e}")))?;

    let dst_pixels = dst_image.into_vec();
    let rgba = image::RgbaImage::from_raw(dst_w, dst_h, dst_pixels)
        .ok_or_else(|| EncodeError::new("resize: invalid output buffer"))?;
    Ok(DynamicImage::ImageRgba8(rgba))
}

fn encode_jpeg(img: &DynamicImage, quality: f64) -> Result<Vec<u8>, EncodeError> {
    use image::ImageEncoder as _;
    use image::codecs::jpeg::JpegEncoder;

    let rgb = img.to_rgb8();
    let (w, h) = rgb.dimensions();
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, jpeg_quality(quality))
        .write_image(rgb.as_raw(), w, h, image::ExtendedColorType::Rgb8)
        .map_err(|e| EncodeError::new(e.to_string()))?;
    Ok(buf)
}

/// Maps `0.0..=1.0` onto the 1..=100 scale JPEG encoders take.
pub fn jpeg_quality(quality: f64) -> u8 {
    ((quality * 100.0).round().clamp(1.0, 100.0)) as u8
}

fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, EncodeError> {
    use image::codecs::png::{CompressionType, FilterType, PngEncoder};

    let mut buf = Vec::new();
    let encoder =
        PngEncoder::new_with_quality(&mut buf, CompressionType::Default, FilterType::Adaptive);
    write_rgb_or_rgba(encoder, img)?;
    Ok(buf)
}

fn encode_webp(img: &DynamicImage) -> Result<Vec<u8>, EncodeError> {
    use image::codecs::webp::WebPEncoder;

    let mut buf = Vec::new();
    write_rgb_or_rgba(WebPEncoder::new_lossless(&mut buf), img)?;
    Ok(buf)
}

fn write_rgb_or_rgba(encoder: impl image::ImageEncoder, img: &DynamicImage) -> Result<(), EncodeError> {
    if img.color().has_alpha() {
        let rgba = img.to_rgba8();
        let (w, h) = rgba.dimensions();
        encoder
            .write_image(rgba.as_raw(), w, h, image::ExtendedColorType::Rgba8)
            .map_err(|e| EncodeError::new(e.to_string()))
    } else {
        let rgb = img.to_rgb8();
        let (w, h) = rgb.dimensions();
        encoder
            .write_image(rgb.as_raw(), w, h, image::ExtendedColorType::Rgb8)
            .map_err(|e| EncodeError::new(e.to_string()))
    }
}
