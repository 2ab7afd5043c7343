// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Size-budgeted JPEG encoding. A page is first encoded at the default quality;
// if the result exceeds the budget it is re-encoded at each fallback quality
// in turn, stopping at the first one that fits.

use docset_core::error::Result;
use image::RgbImage;
use tracing::debug;

use super::processor::encode_jpeg;

/// Quality used for the first encoding attempt.
pub const DEFAULT_JPEG_QUALITY: u8 = 95;

/// Qualities tried, in order, when the default encoding is over budget.
pub const FALLBACK_QUALITIES: [u8; 3] = [70, 60, 50];

/// Upper bound on the encoded size of one persisted page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeBudget {
    max_bytes: u64,
}

impl SizeBudget {
    pub fn new(max_bytes: u64) -> Self {
        Self { max_bytes }
    }

    /// Budget of `mb` mebibytes (`mb * 1024 * 1024` bytes).
    pub fn from_megabytes(mb: f64) -> Self {
        Self {
            max_bytes: (mb.max(0.0) * 1024.0 * 1024.0) as u64,
        }
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    pub fn fits(&self, len: usize) -> bool {
        len as u64 <= self.max_bytes
    }
}

/// Outcome of [`encode_within_budget`].
#[derive(Debug, Clone)]
pub struct EncodedJpeg {
    pub bytes: Vec<u8>,
    /// Quality of the encoding that was kept.
    pub quality: u8,
    /// False when even the lowest fallback quality exceeded the budget.
    pub within_budget: bool,
}

/// Encode `image` as JPEG, lowering quality until it fits `budget`.
///
/// When nothing fits, the lowest-quality encoding is returned with
/// `within_budget == false`; the caller decides whether that is worth a
/// warning.
pub fn encode_within_budget(image: &RgbImage, budget: &SizeBudget) -> Result<EncodedJpeg> {
    let bytes = encode_jpeg(image, DEFAULT_JPEG_QUALITY)?;
    if budget.fits(bytes.len()) {
        return Ok(EncodedJpeg {
            bytes,
            quality: DEFAULT_JPEG_QUALITY,
            within_budget: true,
        });
    }

    let mut last = EncodedJpeg {
        bytes,
        quality: DEFAULT_JPEG_QUALITY,
        within_budget: false,
    };
    for quality in FALLBACK_QUALITIES {
        let bytes = encode_jpeg(image, quality)?;
        debug!(quality, size = bytes.len(), max = budget.max_bytes(), "Re-encoded page");
        if budget.fits(bytes.len()) {
            return Ok(EncodedJpeg {
                bytes,
                quality,
                within_budget: true,
            });
        }
        last = EncodedJpeg {
            bytes,
            quality,
            within_budget: false,
        };
    }
    Ok(last)
}
