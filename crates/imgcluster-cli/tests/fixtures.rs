//! Image fixture helpers for integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use image::{Rgb, RgbImage};

/// Writes a gradient image; the format follows the file extension.
pub fn write_image(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x * y) % 256) as u8])
    });
    let path = dir.join(name);
    img.save(&path).expect("write fixture image");
    path
}

pub fn write_text(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, "not an image").expect("write fixture text");
    path
}

pub fn arg(path: &Path) -> &str {
    path.to_str().expect("utf-8 fixture path")
}
