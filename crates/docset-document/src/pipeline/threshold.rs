// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Binarization — adaptive local-mean thresholding over a summed-area table,
// and global Otsu thresholding.

use image::{GrayImage, Luma};

/// Adaptive binarization: each pixel is compared with the mean of its
/// `(2 * block_radius + 1)^2` neighbourhood minus `c`. Darker pixels become
/// black, the rest white.
pub fn adaptive_threshold(gray: &GrayImage, block_radius: u32, c: i32) -> GrayImage {
    let table = SummedArea::new(gray);
    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        let local = table.mean_around(x, y, block_radius);
        let level = (local as i32 - c).clamp(0, 255);
        let value = gray.get_pixel(x, y).0[0] as i32;
        Luma([if value < level { 0 } else { 255 }])
    })
}

/// Global binarization at the Otsu level of `gray`.
pub fn otsu_threshold(gray: &GrayImage) -> GrayImage {
    let level = otsu_level(gray);
    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        Luma([if gray.get_pixel(x, y).0[0] < level { 0 } else { 255 }])
    })
}

/// Threshold maximising the between-class variance of the histogram.
pub fn otsu_level(gray: &GrayImage) -> u8 {
    let mut histogram = [0u64; 256];
    for pixel in gray.pixels() {
        histogram[pixel.0[0] as usize] += 1;
    }

    let total = gray.width() as u64 * gray.height() as u64;
    if total == 0 {
        return 128;
    }
    let weighted_total: f64 = histogram
        .iter()
        .enumerate()
        .map(|(level, &count)| level as f64 * count as f64)
        .sum();

    let mut below_weight = 0u64;
    let mut below_sum = 0.0f64;
    let mut best = (0.0f64, 0u8);

    for (level, &count) in histogram.iter().enumerate() {
        below_weight += count;
        if below_weight == 0 {
            continue;
        }
        let above_weight = total - below_weight;
        if above_weight == 0 {
            break;
        }
        below_sum += level as f64 * count as f64;
        let below_mean = below_sum / below_weight as f64;
        let above_mean = (weighted_total - below_sum) / above_weight as f64;
        let variance =
            below_weight as f64 * above_weight as f64 * (below_mean - above_mean).powi(2);
        if variance > best.0 {
            // Pixels strictly below the returned level are foreground.
            best = (variance, (level + 1).min(255) as u8);
        }
    }
    best.1
}

/// Zero-padded integral image with `(w + 1) * (h + 1)` entries.
struct SummedArea {
    sums: Vec<u64>,
    width: u32,
    height: u32,
}

impl SummedArea {
    fn new(gray: &GrayImage) -> Self {
        let (width, height) = gray.dimensions();
        let stride = width as usize + 1;
        let mut sums = vec![0u64; stride * (height as usize + 1)];
        for y in 0..height as usize {
            let mut row = 0u64;
            for x in 0..width as usize {
                row += gray.get_pixel(x as u32, y as u32).0[0] as u64;
                sums[(y + 1) * stride + x + 1] = sums[y * stride + x + 1] + row;
            }
        }
        Self {
            sums,
            width,
            height,
        }
    }

    /// Mean of the square window centred on `(cx, cy)`, clipped to the image.
    fn mean_around(&self, cx: u32, cy: u32, radius: u32) -> f64 {
        let stride = self.width as usize + 1;
        let x0 = cx.saturating_sub(radius) as usize;
        let y0 = cy.saturating_sub(radius) as usize;
        let x1 = (cx as usize + radius as usize + 1).min(self.width as usize);
        let y1 = (cy as usize + radius as usize + 1).min(self.height as usize);

        let area = ((x1 - x0) * (y1 - y0)) as f64;
        if area == 0.0 {
            return 128.0;
        }
        let sum = self.sums[y1 * stride + x1] + self.sums[y0 * stride + x0]
            - self.sums[y0 * stride + x1]
            - self.sums[y1 * stride + x0];
        sum as f64 / area
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_tone() -> GrayImage {
        GrayImage::from_fn(20, 10, |x, _| Luma([if x < 10 { 40 } else { 210 }]))
    }

    #[test]
    fn otsu_separates_two_tones() {
        let level = otsu_level(&two_tone());
        assert!(level > 40 && level <= 210, "level {level}");

        let out = otsu_threshold(&two_tone());
        assert_eq!(out.get_pixel(0, 0).0[0], 0);
        assert_eq!(out.get_pixel(19, 9).0[0], 255);
    }

    #[test]
    fn adaptive_output_is_binary() {
        let out = adaptive_threshold(&two_tone(), 3, 10);
        assert!(out.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255));
        // Deep inside the dark half the local mean equals the pixel value.
        assert_eq!(out.get_pixel(2, 5).0[0], 255);
        // Right next to the bright half a dark pixel falls below its mean.
        assert_eq!(out.get_pixel(9, 5).0[0], 0);
    }

    #[test]
    fn summed_area_mean_matches_direct_mean() {
        let img = GrayImage::from_fn(5, 5, |x, y| Luma([(x * 10 + y) as u8]));
        let table = SummedArea::new(&img);
        // Window of radius 1 around (2, 2) covers x,y in 1..=3.
        let direct: f64 = (1..=3)
            .flat_map(|y| (1..=3).map(move |x| (x * 10 + y) as f64))
            .sum::<f64>()
            / 9.0;
        assert!((table.mean_around(2, 2, 1) - direct).abs() < 1e-9);
    }

    #[test]
    fn uniform_image_is_all_white() {
        let img = GrayImage::from_pixel(4, 4, Luma([77]));
        let out = otsu_threshold(&img);
        assert!(out.pixels().all(|p| p.0[0] == 255));
    }
}
