// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Skew correction — estimates the dominant text-line angle with a Hough
// transform over Canny edges and rotates the page level.

use image::{DynamicImage, GrayImage};
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use imageproc::hough::{LineDetectionOptions, PolarLine, detect_lines};
use tracing::{debug, instrument};

use crate::image::processor::ImageProcessor;

/// Corrections smaller than this (in degrees) are not worth a resample.
const MIN_CORRECTION_DEG: f32 = 0.1;

/// Angle, in degrees, by which the page is rotated clockwise relative to
/// level, or `None` when no near-horizontal line was found.
///
/// A Hough line at 90 degrees is horizontal; lines further than `max_angle`
/// from horizontal are ignored and the median of the rest is taken.
pub fn estimate_skew(lines: &[PolarLine], max_angle: f32) -> Option<f32> {
    let mut offsets: Vec<f32> = lines
        .iter()
        .map(|line| line.angle_in_degrees as f32 - 90.0)
        .filter(|offset| offset.abs() <= max_angle)
        .collect();
    if offsets.is_empty() {
        return None;
    }
    offsets.sort_by(|a, b| a.total_cmp(b));
    let mid = offsets.len() / 2;
    Some(if offsets.len() % 2 == 0 {
        (offsets[mid - 1] + offsets[mid]) / 2.0
    } else {
        offsets[mid]
    })
}

/// Detect near-horizontal lines on `gray` and estimate the page skew.
pub fn detect_skew(gray: &GrayImage, max_angle: f32) -> Option<f32> {
    let blurred = gaussian_blur_f32(gray, 1.5);
    let edges = canny(&blurred, 50.0, 150.0);

    // Text baselines span a good part of the page width.
    let vote_threshold = ((gray.width() as f32 * 0.2) as u32).max(40);
    let lines = detect_lines(
        &edges,
        LineDetectionOptions {
            vote_threshold,
            suppression_radius: 8,
        },
    );
    debug!(line_count = lines.len(), vote_threshold, "Hough lines detected");
    estimate_skew(&lines, max_angle)
}

/// Rotate `image` so its dominant text lines become horizontal.
///
/// Pages without detectable lines, or already level, are returned unchanged.
#[instrument(skip(image), fields(width = image.width(), height = image.height()))]
pub fn deskew(image: DynamicImage, max_angle: f32) -> DynamicImage {
    let Some(skew) = detect_skew(&image.to_luma8(), max_angle) else {
        debug!("No text lines found; leaving page as is");
        return image;
    };
    if skew.abs() < MIN_CORRECTION_DEG {
        return image;
    }
    debug!(skew, "Correcting page skew");
    ImageProcessor::from_dynamic(image).rotate(-skew).into_dynamic()
}
