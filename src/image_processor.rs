use crate::error::{EngraveError, Result};
use image::imageops::FilterType;
use image::{ImageFormat, RgbaImage};
use rgb::RGBA8;
use std::path::Path;

/// Longest side accepted from the decoder before the image is downsized.
pub const DEFAULT_MAX_DIMENSION: u32 = 2048;

#[derive(Debug, Clone, PartialEq)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<RGBA8>,
}

impl ImageData {
    /// Build an image from packed RGBA bytes (4 bytes per pixel, row-major).
    pub fn from_rgba_bytes(width: u32, height: u32, bytes: &[u8]) -> Result<Self> {
        let expected = width as usize * height as usize;
        if bytes.len() != expected * 4 {
            return Err(EngraveError::BufferSizeMismatch {
                width,
                height,
                expected,
                actual: bytes.len() / 4,
            });
        }
        let pixels = bytes
            .chunks_exact(4)
            .map(|c| RGBA8::new(c[0], c[1], c[2], c[3]))
            .collect();
        let image = Self {
            width,
            height,
            pixels,
        };
        image.validate()?;
        Ok(image)
    }

    pub fn to_rgba_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.pixels.len() * 4);
        for p in &self.pixels {
            bytes.extend_from_slice(&[p.r, p.g, p.b, p.a]);
        }
        bytes
    }

    /// Reject empty buffers and buffers whose length disagrees with the dimensions.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(EngraveError::EmptyImage {
                width: self.width,
                height: self.height,
            });
        }
        let expected = self.width as usize * self.height as usize;
        if self.pixels.len() != expected {
            return Err(EngraveError::BufferSizeMismatch {
                width: self.width,
                height: self.height,
                expected,
                actual: self.pixels.len(),
            });
        }
        Ok(())
    }

    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.pixels.len()
    }

    /// One byte per pixel of BT.709 luma, stored the same way the grayscale
    /// filter stores it.
    pub fn gray_plane(&self) -> Vec<u8> {
        self.pixels.iter().map(|p| store_clamped(luma_709(p))).collect()
    }

    fn to_rgba_image(&self) -> Result<RgbaImage> {
        RgbaImage::from_raw(self.width, self.height, self.to_rgba_bytes()).ok_or(
            EngraveError::BufferSizeMismatch {
                width: self.width,
                height: self.height,
                expected: self.width as usize * self.height as usize,
                actual: self.pixels.len(),
            },
        )
    }
}

impl From<RgbaImage> for ImageData {
    fn from(rgba: RgbaImage) -> Self {
        let pixels = rgba
            .pixels()
            .map(|p| RGBA8::new(p[0], p[1], p[2], p[3]))
            .collect();
        Self {
            width: rgba.width(),
            height: rgba.height(),
            pixels,
        }
    }
}

/// Decode an image file to RGBA and downsize it so the longer side fits
/// within `max_dimension`.
pub fn load_image(path: &Path, max_dimension: u32) -> Result<ImageData> {
    let img = image::open(path)?;
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let longest = width.max(height);
    let rgba = if max_dimension > 0 && longest > max_dimension {
        let scale = max_dimension as f64 / longest as f64;
        let new_width = ((width as f64 * scale).round() as u32).max(1);
        let new_height = ((height as f64 * scale).round() as u32).max(1);
        log::info!(
            "downscaling {} from {}x{} to {}x{}",
            path.display(),
            width,
            height,
            new_width,
            new_height
        );
        image::imageops::resize(&rgba, new_width, new_height, FilterType::Triangle)
    } else {
        rgba
    };

    let data = ImageData::from(rgba);
    data.validate()?;
    Ok(data)
}

/// Write an image as PNG.
pub fn save_image(image_data: &ImageData, path: &Path) -> Result<()> {
    let rgba = image_data.to_rgba_image()?;
    rgba.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}

/// Round half up and clamp to the 8-bit range.
#[inline]
pub fn truncate(value: f64) -> u8 {
    (value + 0.5).floor().clamp(0.0, 255.0) as u8
}

/// Round half to even and clamp, matching how intermediate buffers are stored.
#[inline]
pub fn store_clamped(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.clamp(0.0, 255.0).round_ties_even() as u8
}

/// Perceived brightness with BT.601 weights, rounded.
#[inline]
pub fn brightness(p: &RGBA8) -> u8 {
    truncate(0.299 * p.r as f64 + 0.587 * p.g as f64 + 0.114 * p.b as f64)
}

/// Luma with BT.709 weights, unrounded.
#[inline]
pub fn luma_709(p: &RGBA8) -> f64 {
    0.2126 * p.r as f64 + 0.7152 * p.g as f64 + 0.0722 * p.b as f64
}
