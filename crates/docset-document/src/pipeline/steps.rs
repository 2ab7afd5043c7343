// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Built-in processing steps.

use image::{DynamicImage, GrayImage, RgbImage};
use imageproc::filter::{gaussian_blur_f32, median_filter};

use super::PageStep;
use super::{deskew, threshold};
use crate::image::processor::ImageProcessor;

/// Apply `gray_op` to 8-bit luma pages and `rgb_op` to everything else,
/// so filters do not re-expand pages an earlier step made grayscale.
fn per_format(
    image: DynamicImage,
    gray_op: impl FnOnce(&GrayImage) -> GrayImage,
    rgb_op: impl FnOnce(&RgbImage) -> RgbImage,
) -> DynamicImage {
    match image {
        DynamicImage::ImageLuma8(gray) => DynamicImage::ImageLuma8(gray_op(&gray)),
        other => DynamicImage::ImageRgb8(rgb_op(&other.to_rgb8())),
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Grayscale;

impl PageStep for Grayscale {
    fn name(&self) -> &'static str {
        "grayscale"
    }

    fn apply(&self, image: DynamicImage) -> DynamicImage {
        DynamicImage::ImageLuma8(image.to_luma8())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Contrast {
    pub factor: f32,
}

impl PageStep for Contrast {
    fn name(&self) -> &'static str {
        "contrast"
    }

    fn apply(&self, image: DynamicImage) -> DynamicImage {
        ImageProcessor::from_dynamic(image)
            .adjust_contrast(self.factor)
            .into_dynamic()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Brightness {
    pub value: i32,
}

impl PageStep for Brightness {
    fn name(&self) -> &'static str {
        "brightness"
    }

    fn apply(&self, image: DynamicImage) -> DynamicImage {
        ImageProcessor::from_dynamic(image)
            .adjust_brightness(self.value)
            .into_dynamic()
    }
}

/// Adaptive local-mean binarization.
#[derive(Debug, Clone, Copy)]
pub struct Binarize {
    pub block_radius: u32,
    pub c: i32,
}

impl PageStep for Binarize {
    fn name(&self) -> &'static str {
        "binarize"
    }

    fn apply(&self, image: DynamicImage) -> DynamicImage {
        let gray = image.to_luma8();
        DynamicImage::ImageLuma8(threshold::adaptive_threshold(
            &gray,
            self.block_radius,
            self.c,
        ))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Otsu;

impl PageStep for Otsu {
    fn name(&self) -> &'static str {
        "otsu"
    }

    fn apply(&self, image: DynamicImage) -> DynamicImage {
        DynamicImage::ImageLuma8(threshold::otsu_threshold(&image.to_luma8()))
    }
}

/// Gaussian smoothing.
#[derive(Debug, Clone, Copy)]
pub struct Denoise {
    pub sigma: f32,
}

impl PageStep for Denoise {
    fn name(&self) -> &'static str {
        "denoise"
    }

    fn apply(&self, image: DynamicImage) -> DynamicImage {
        let sigma = self.sigma;
        per_format(
            image,
            |gray| gaussian_blur_f32(gray, sigma),
            |rgb| gaussian_blur_f32(rgb, sigma),
        )
    }
}

/// Median filter; removes salt-and-pepper speckle from scans.
#[derive(Debug, Clone, Copy)]
pub struct Median {
    pub radius: u32,
}

impl PageStep for Median {
    fn name(&self) -> &'static str {
        "median"
    }

    fn apply(&self, image: DynamicImage) -> DynamicImage {
        let r = self.radius;
        per_format(
            image,
            |gray| median_filter(gray, r, r),
            |rgb| median_filter(rgb, r, r),
        )
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Rotate {
    pub degrees: f32,
}

impl PageStep for Rotate {
    fn name(&self) -> &'static str {
        "rotate"
    }

    fn apply(&self, image: DynamicImage) -> DynamicImage {
        ImageProcessor::from_dynamic(image)
            .rotate(self.degrees)
            .into_dynamic()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Deskew {
    pub max_angle: f32,
}

impl PageStep for Deskew {
    fn name(&self) -> &'static str {
        "deskew"
    }

    fn apply(&self, image: DynamicImage) -> DynamicImage {
        deskew::deskew(image, self.max_angle)
    }
}
