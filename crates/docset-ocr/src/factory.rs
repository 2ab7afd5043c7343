// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Builds the configured recognizer for a run.

use std::sync::Arc;
use std::time::Duration;

use docset_core::error::Result;
use docset_core::{OcrEngineKind, RunConfig};
use tracing::info;

use crate::recognizer::Recognizer;
use crate::timeout::TimeoutRecognizer;

/// Construct the recognizer selected by `config`, wrapped in the per-call
/// timeout when one is configured. Returns `None` when OCR is disabled.
///
/// Selecting a backend whose feature was not compiled in is a configuration
/// error.
pub fn build_recognizer(config: &RunConfig) -> Result<Option<Arc<dyn Recognizer>>> {
    if !config.do_ocr {
        info!("OCR disabled; pages will carry empty text");
        return Ok(None);
    }

    let backend = build_backend(config)?;
    info!(
        engine = backend.name(),
        lang = %config.ocr_lang,
        timeout_secs = config.ocr_timeout_secs,
        "Recognizer ready"
    );

    if config.ocr_timeout_secs == 0 {
        return Ok(Some(backend));
    }
    Ok(Some(Arc::new(TimeoutRecognizer::new(
        backend,
        Duration::from_secs(config.ocr_timeout_secs),
    ))))
}

fn build_backend(config: &RunConfig) -> Result<Arc<dyn Recognizer>> {
    match config.ocr_engine {
        OcrEngineKind::Tesseract => tesseract_backend(config),
        OcrEngineKind::Ocrs => ocrs_backend(config),
    }
}

#[cfg(feature = "tesseract")]
fn tesseract_backend(config: &RunConfig) -> Result<Arc<dyn Recognizer>> {
    let recognizer =
        crate::tesseract::TesseractRecognizer::new(config.tessdata_path.clone(), &config.ocr_lang)
            .with_min_confidence(config.ocr_min_confidence);
    recognizer.check()?;
    Ok(Arc::new(recognizer))
}

#[cfg(not(feature = "tesseract"))]
fn tesseract_backend(_config: &RunConfig) -> Result<Arc<dyn Recognizer>> {
    Err(docset_core::DocsetError::Config(
        "Tesseract backend not available; build with the `tesseract` feature or pass --no-ocr"
            .into(),
    ))
}

#[cfg(feature = "ocr")]
fn ocrs_backend(config: &RunConfig) -> Result<Arc<dyn Recognizer>> {
    use crate::ocrs_backend::{OcrsConfig, OcrsRecognizer};

    let models = match &config.ocr_model_dir {
        Some(dir) => OcrsConfig::from_dir(dir),
        None => OcrsConfig::default(),
    };
    Ok(Arc::new(OcrsRecognizer::new(&models)?))
}

#[cfg(not(feature = "ocr"))]
fn ocrs_backend(_config: &RunConfig) -> Result<Arc<dyn Recognizer>> {
    Err(docset_core::DocsetError::Config(
        "ocrs backend not available; build with the `ocr` feature or pass --no-ocr".into(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use docset_core::DocsetError;

    #[test]
    fn disabled_ocr_builds_nothing() {
        let config = RunConfig {
            do_ocr: false,
            ..RunConfig::default()
        };
        assert!(build_recognizer(&config).unwrap().is_none());
    }

    #[cfg(not(feature = "ocr"))]
    #[test]
    fn missing_ocrs_feature_is_config_error() {
        let config = RunConfig {
            ocr_engine: OcrEngineKind::Ocrs,
            ..RunConfig::default()
        };
        assert!(matches!(
            build_recognizer(&config).err(),
            Some(DocsetError::Config(_))
        ));
    }

    #[cfg(not(feature = "tesseract"))]
    #[test]
    fn missing_tesseract_feature_is_config_error() {
        assert!(matches!(
            build_recognizer(&RunConfig::default()).err(),
            Some(DocsetError::Config(_))
        ));
    }
}
