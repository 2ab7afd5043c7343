// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor — megapixel capping, rotation, brightness and contrast
// adjustment, JPEG encoding. Operates on in-memory page rasters
// using the `image` and `imageproc` crates.

use docset_core::error::DocsetError;
use image::imageops::FilterType;
use image::{DynamicImage, RgbImage, Rgba};
use imageproc::geometric_transformations::{Interpolation, rotate_about_center};
use tracing::{debug, instrument};

/// Transformation chain operating on a single in-memory page raster.
///
/// Each method consumes `self` and returns a new `ImageProcessor` wrapping
/// the transformed image, enabling method chaining:
///
/// ```ignore
/// let page = ImageProcessor::from_dynamic(decoded)
///     .limit_megapixels(3.0)
///     .adjust_contrast(1.4)
///     .into_rgb8();
/// ```
pub struct ImageProcessor {
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    /// Wrap an RGB page raster.
    pub fn from_rgb(image: RgbImage) -> Self {
        Self {
            image: DynamicImage::ImageRgb8(image),
        }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    /// Consume the processor and return a 3-channel 8-bit raster.
    pub fn into_rgb8(self) -> RgbImage {
        self.image.into_rgb8()
    }

    // -- Transformations (consume self, return new Self) -----------------------

    /// Downscale so that `width * height` does not exceed `cap` megapixels,
    /// preserving aspect ratio. Images already under the cap are untouched.
    /// Uses Lanczos3 filtering.
    #[instrument(skip(self), fields(width = self.image.width(), height = self.image.height()))]
    pub fn limit_megapixels(self, cap: f64) -> Self {
        let Some((new_w, new_h)) = megapixel_target(self.image.width(), self.image.height(), cap)
        else {
            return self;
        };
        let source_mp = self.image.width() as f64 * self.image.height() as f64 / 1_000_000.0;
        let resized = self.image.resize_exact(new_w, new_h, FilterType::Lanczos3);
        debug!(
            source_mp,
            new_w,
            new_h,
            cap,
            "Downscaled page to meet megapixel cap"
        );
        Self { image: resized }
    }

    /// Rotate clockwise by `degrees`.
    ///
    /// Quarter turns are lossless and swap the canvas dimensions. Any other
    /// angle rotates about the centre with bilinear sampling, keeps the
    /// canvas size, and fills the exposed corners with white.
    #[instrument(skip(self))]
    pub fn rotate(self, degrees: f32) -> Self {
        let turns = degrees.rem_euclid(360.0) / 90.0;
        if (turns - turns.round()).abs() * 90.0 < 0.01 {
            let image = match turns.round() as u32 % 4 {
                1 => self.image.rotate90(),
                2 => self.image.rotate180(),
                3 => self.image.rotate270(),
                _ => self.image,
            };
            return Self { image };
        }

        let rotated = rotate_about_center(
            &self.image.to_rgba8(),
            degrees.to_radians(),
            Interpolation::Bilinear,
            Rgba([255u8, 255, 255, 255]),
        );
        debug!(degrees, "Rotated about centre");
        Self {
            image: DynamicImage::ImageRgba8(rotated),
        }
    }

    /// Adjust brightness by `value`, clamped to -255..=255.
    pub fn adjust_brightness(self, value: i32) -> Self {
        let clamped = value.clamp(-255, 255);
        if clamped == 0 {
            return self;
        }
        let mut rgb = self.image.into_rgb8();
        for pixel in rgb.pixels_mut() {
            for channel in pixel.0.iter_mut() {
                *channel = (*channel as i32 + clamped).clamp(0, 255) as u8;
            }
        }
        Self {
            image: DynamicImage::ImageRgb8(rgb),
        }
    }

    /// Adjust contrast around mid-gray. Values > 1.0 increase contrast,
    /// values < 1.0 decrease it; 1.0 is a no-op.
    pub fn adjust_contrast(self, factor: f32) -> Self {
        if (factor - 1.0).abs() < f32::EPSILON {
            return self;
        }
        let mut rgb = self.image.into_rgb8();
        for pixel in rgb.pixels_mut() {
            for channel in pixel.0.iter_mut() {
                let val = factor * (*channel as f32 - 128.0) + 128.0;
                *channel = val.clamp(0.0, 255.0) as u8;
            }
        }
        Self {
            image: DynamicImage::ImageRgb8(rgb),
        }
    }
}

/// Encode an RGB raster as JPEG at `quality` (1-100).
pub fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Vec<u8>, DocsetError> {
    let mut buffer = Vec::new();
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality);
    image
        .write_with_encoder(encoder)
        .map_err(|err| DocsetError::ImageError(format!("JPEG encoding failed: {}", err)))?;
    Ok(buffer)
}

/// Target dimensions for a `width` x `height` image under a `cap` megapixel
/// budget, or `None` if the image already fits.
///
/// Both sides are scaled by `sqrt(cap_pixels / pixels)` and floored, so the
/// result never exceeds the budget and the aspect ratio is kept within one
/// pixel of rounding.
pub fn megapixel_target(width: u32, height: u32, cap: f64) -> Option<(u32, u32)> {
    let max_pixels = cap * 1_000_000.0;
    let pixels = width as f64 * height as f64;
    if pixels <= max_pixels || max_pixels <= 0.0 {
        return None;
    }

    let ratio = (max_pixels / pixels).sqrt();
    let mut new_w = ((width as f64 * ratio) as u32).max(1);
    let mut new_h = ((height as f64 * ratio) as u32).max(1);

    // Floating point can leave the product a hair over the budget.
    while new_w as f64 * new_h as f64 > max_pixels && (new_w > 1 || new_h > 1) {
        if new_w >= new_h {
            new_w -= 1;
        } else {
            new_h -= 1;
        }
    }
    Some((new_w, new_h))
}
