// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// docset-ocr — Text recognition for the Docset dataset builder.
//
// Defines the `Recognizer` capability the dataset orchestrator depends on,
// plus the concrete backends: a mock (always available), Tesseract via
// `leptess` (feature `tesseract`), and the pure-Rust `ocrs` engine (feature
// `ocr`). Any backend can be wrapped in a per-call timeout.

pub mod factory;
pub mod mock;
pub mod recognizer;
pub mod timeout;
pub mod tsv;

#[cfg(feature = "ocr")]
pub mod ocrs_backend;

#[cfg(feature = "tesseract")]
pub mod tesseract;

pub use factory::build_recognizer;
pub use mock::MockRecognizer;
pub use recognizer::{BoundingBox, Recognizer, TextItem, join_confident};
pub use timeout::TimeoutRecognizer;

#[cfg(feature = "ocr")]
pub use ocrs_backend::{OcrsConfig, OcrsRecognizer};

#[cfg(feature = "tesseract")]
pub use tesseract::TesseractRecognizer;
