// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pure-Rust OCR backend using the `ocrs` crate, with neural network models
// executed via `rten`.
//
// # Model Setup
//
// The engine requires two model files in one directory:
//
// - **Detection model** (`text-detection.rten`) — locates text regions.
// - **Recognition model** (`text-recognition.rten`) — decodes characters.
//
// Running the `ocrs` CLI once downloads both to `$XDG_CACHE_HOME/ocrs`
// (typically `~/.cache/ocrs`), which is the default model directory.

use std::path::{Path, PathBuf};

use docset_core::error::{DocsetError, Result};
use image::RgbImage;
use ocrs::{ImageSource, OcrEngine, OcrEngineParams};
use rten::Model;
use tracing::{debug, info, instrument};

use crate::recognizer::{Recognizer, TextItem};

const DETECTION_MODEL_FILENAME: &str = "text-detection.rten";
const RECOGNITION_MODEL_FILENAME: &str = "text-recognition.rten";

/// `$XDG_CACHE_HOME/ocrs`, falling back to `~/.cache/ocrs`.
fn default_model_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CACHE_HOME") {
        PathBuf::from(xdg).join("ocrs")
    } else if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".cache").join("ocrs")
    } else {
        PathBuf::from("ocrs-models")
    }
}

/// Locations of the two model files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcrsConfig {
    pub detection_model_path: PathBuf,
    pub recognition_model_path: PathBuf,
}

impl Default for OcrsConfig {
    fn default() -> Self {
        Self::from_dir(default_model_dir())
    }
}

impl OcrsConfig {
    /// Expects `dir` to contain `text-detection.rten` and `text-recognition.rten`.
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            detection_model_path: dir.join(DETECTION_MODEL_FILENAME),
            recognition_model_path: dir.join(RECOGNITION_MODEL_FILENAME),
        }
    }

    pub fn validate(&self) -> Result<()> {
        for (role, path) in [
            ("detection", &self.detection_model_path),
            ("recognition", &self.recognition_model_path),
        ] {
            if !path.exists() {
                return Err(DocsetError::OcrError(format!(
                    "{} model not found at {}; run the `ocrs` CLI once to download models",
                    role,
                    path.display()
                )));
            }
        }
        Ok(())
    }
}

/// Line-level recognition with `ocrs`. Items carry no confidence, so the
/// confidence floor never drops them.
pub struct OcrsRecognizer {
    engine: OcrEngine,
}

impl OcrsRecognizer {
    /// Load both models. This is the expensive step; build once per run.
    #[instrument(skip_all, fields(
        detection = %config.detection_model_path.display(),
        recognition = %config.recognition_model_path.display(),
    ))]
    pub fn new(config: &OcrsConfig) -> Result<Self> {
        config.validate()?;

        let load = |path: &Path| {
            Model::load_file(path).map_err(|err| {
                DocsetError::OcrError(format!("failed to load model {}: {}", path.display(), err))
            })
        };
        let detection_model = load(&config.detection_model_path)?;
        let recognition_model = load(&config.recognition_model_path)?;

        let engine = OcrEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            ..Default::default()
        })
        .map_err(|err| DocsetError::OcrError(format!("failed to initialise ocrs: {}", err)))?;

        info!("ocrs engine initialised");
        Ok(Self { engine })
    }
}

impl Recognizer for OcrsRecognizer {
    fn name(&self) -> &str {
        "ocrs"
    }

    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    fn recognize_items(&self, image: &RgbImage) -> Result<Vec<TextItem>> {
        let source = ImageSource::from_bytes(image.as_raw(), image.dimensions()).map_err(|err| {
            DocsetError::OcrError(format!(
                "failed to create image source ({}x{}): {}",
                image.width(),
                image.height(),
                err
            ))
        })?;
        let input = self
            .engine
            .prepare_input(source)
            .map_err(|err| DocsetError::OcrError(format!("OCR preprocessing failed: {}", err)))?;

        let words = self
            .engine
            .detect_words(&input)
            .map_err(|err| DocsetError::OcrError(format!("word detection failed: {}", err)))?;
        let lines = self.engine.find_text_lines(&input, &words);
        let texts = self
            .engine
            .recognize_text(&input, &lines)
            .map_err(|err| DocsetError::OcrError(format!("line recognition failed: {}", err)))?;

        let items: Vec<TextItem> = texts
            .iter()
            .flatten()
            .map(|line| TextItem::plain(line.to_string()))
            .filter(|item| !item.text.trim().is_empty())
            .collect();
        debug!(words = words.len(), lines = items.len(), "ocrs recognition complete");
        Ok(items)
    }
}
