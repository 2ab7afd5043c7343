// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module — resolution normalization, basic adjustments, and
// size-budgeted JPEG encoding.

pub mod budget;
pub mod processor;

pub use budget::{EncodedJpeg, SizeBudget, encode_within_budget};
pub use processor::{ImageProcessor, megapixel_target};
