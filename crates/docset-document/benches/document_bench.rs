// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the docset-document crate: megapixel capping of a
// large page and size-budgeted JPEG encoding.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{DynamicImage, Rgb, RgbImage};

use docset_document::{ImageProcessor, SizeBudget, encode_within_budget};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Scan-like page: white paper with dark horizontal "text" bands.
fn synthetic_page(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        let in_line = (y / 12) % 3 == 0 && x % 9 < 6;
        if in_line {
            Rgb([25, 25, 30])
        } else {
            Rgb([245, 244, 240])
        }
    })
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// Downscale a 12 MP page to the default 3 MP cap.
fn bench_limit_megapixels(c: &mut Criterion) {
    let page = DynamicImage::ImageRgb8(synthetic_page(4000, 3000));

    c.bench_function("limit_megapixels (4000x3000 -> 3 MP)", |b| {
        b.iter(|| {
            let out = ImageProcessor::from_dynamic(black_box(page.clone())).limit_megapixels(3.0);
            black_box(out.width());
        });
    });
}

/// Encode a page under a budget that forces one fallback step, and under a
/// budget that is met on the first attempt.
fn bench_budgeted_encoding(c: &mut Criterion) {
    let page = synthetic_page(2000, 1500);

    let mut group = c.benchmark_group("encode_within_budget (2000x1500)");
    group.sample_size(20);
    group.bench_function("fits at default quality", |b| {
        let budget = SizeBudget::from_megabytes(5.0);
        b.iter(|| black_box(encode_within_budget(black_box(&page), &budget).ok()));
    });
    group.bench_function("walks fallback qualities", |b| {
        let budget = SizeBudget::new(1024);
        b.iter(|| black_box(encode_within_budget(black_box(&page), &budget).ok()));
    });
    group.finish();
}

criterion_group!(benches, bench_limit_megapixels, bench_budgeted_encoding);
criterion_main!(benches);
