// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Tesseract backend via `leptess`. Only available with the `tesseract`
// feature; needs the system libtesseract and libleptonica plus trained data
// for the configured language.

use std::io::Cursor;
use std::path::PathBuf;

use docset_core::error::{DocsetError, Result};
use image::{ImageFormat, RgbImage};
use leptess::LepTess;
use tracing::{debug, instrument};

use crate::recognizer::{Recognizer, TextItem};
use crate::tsv;

/// Word-level Tesseract recognition with a confidence floor.
///
/// A fresh `LepTess` handle is created per call, so calls from several
/// worker threads never share engine state.
#[derive(Debug, Clone)]
pub struct TesseractRecognizer {
    data_path: Option<PathBuf>,
    lang: String,
    min_confidence: f32,
}

impl TesseractRecognizer {
    pub fn new(data_path: Option<PathBuf>, lang: &str) -> Self {
        Self {
            data_path,
            lang: lang.to_string(),
            min_confidence: 0.0,
        }
    }

    pub fn with_min_confidence(mut self, min_confidence: f32) -> Self {
        self.min_confidence = min_confidence;
        self
    }

    /// Fail early if the engine cannot be initialised for this language.
    pub fn check(&self) -> Result<()> {
        self.engine().map(|_| ())
    }

    fn engine(&self) -> Result<LepTess> {
        let data_path = self
            .data_path
            .as_ref()
            .map(|p| p.to_string_lossy().into_owned());
        LepTess::new(data_path.as_deref(), &self.lang).map_err(|err| {
            DocsetError::OcrError(format!(
                "cannot initialise Tesseract for '{}': {}",
                self.lang, err
            ))
        })
    }
}

impl Recognizer for TesseractRecognizer {
    fn name(&self) -> &str {
        "tesseract"
    }

    #[instrument(skip_all, fields(width = image.width(), height = image.height(), lang = %self.lang))]
    fn recognize_items(&self, image: &RgbImage) -> Result<Vec<TextItem>> {
        let mut png = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|err| DocsetError::OcrError(format!("cannot encode page for OCR: {}", err)))?;

        let mut engine = self.engine()?;
        engine
            .set_image_from_mem(&png)
            .map_err(|err| DocsetError::OcrError(format!("Tesseract rejected page: {}", err)))?;
        let tsv_text = engine
            .get_tsv_text(0)
            .map_err(|err| DocsetError::OcrError(format!("Tesseract output not UTF-8: {}", err)))?;

        let words = tsv::parse_words(&tsv_text);
        debug!(words = words.len(), "Tesseract recognition complete");
        Ok(words)
    }

    fn min_confidence(&self) -> f32 {
        self.min_confidence
    }
}
