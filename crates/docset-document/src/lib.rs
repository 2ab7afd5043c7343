// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// docset-document — Page extraction for the Docset dataset builder.
//
// Opens flat images, multi-page PDFs, and multi-frame TIFFs behind one page
// iterator, caps page resolution, runs the configured processing steps, and
// persists pages as size-budgeted JPEGs.

pub mod extract;
pub mod image;
pub mod pdf;
pub mod persist;
pub mod pipeline;
pub mod tiff;

// Re-export the primary structs so callers can use `docset_document::PageExtractor` etc.
pub use crate::extract::{ExtractOptions, NormalizedPage, PageExtractor, PageIter};
pub use crate::image::budget::{EncodedJpeg, SizeBudget, encode_within_budget};
pub use crate::image::processor::ImageProcessor;
pub use crate::pdf::reader::PdfReader;
pub use crate::persist::{IMAGE_DIR, PagePersister, PersistedImage};
pub use crate::pipeline::{PageStep, ProcessingPipeline};
pub use crate::tiff::reader::TiffReader;
