// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Docset.

use std::time::Duration;

use thiserror::Error;

/// Top-level error type for all Docset operations.
#[derive(Debug, Error)]
pub enum DocsetError {
    // -- Discovery errors --
    #[error("file discovery failed: {0}")]
    Discovery(String),

    // -- Document errors --
    #[error("unsupported document type: {0}")]
    UnsupportedDocument(String),

    #[error("PDF operation failed: {0}")]
    PdfError(String),

    #[error("TIFF operation failed: {0}")]
    TiffError(String),

    #[error("image processing failed: {0}")]
    ImageError(String),

    #[error("page {page} could not be decoded: {reason}")]
    PageDecode { page: usize, reason: String },

    // -- Recognition errors --
    #[error("OCR failed: {0}")]
    OcrError(String),

    #[error("OCR timed out after {0:?}")]
    OcrTimeout(Duration),

    // -- Processing pipeline --
    #[error("unknown processing step: {0}")]
    UnknownStep(String),

    #[error("invalid parameter for step {step}: {reason}")]
    InvalidStepParam { step: String, reason: String },

    // -- Dataset assembly --
    #[error("worker pool error: {0}")]
    WorkerPool(String),

    #[error("manifest error: {0}")]
    Manifest(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DocsetError {
    /// Whether this error is confined to a single page, leaving the rest of
    /// the document usable.
    pub fn is_page_local(&self) -> bool {
        matches!(self, Self::PageDecode { .. })
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, DocsetError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_decode_is_page_local() {
        let err = DocsetError::PageDecode {
            page: 3,
            reason: "truncated strip".into(),
        };
        assert!(err.is_page_local());
        assert_eq!(err.to_string(), "page 3 could not be decoded: truncated strip");
    }

    #[test]
    fn container_errors_are_not_page_local() {
        assert!(!DocsetError::PdfError("bad xref".into()).is_page_local());
        assert!(!DocsetError::Io(std::io::Error::other("gone")).is_page_local());
    }
}
