// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Run configuration. The same JSON shape is written next to every manifest as
// `used_args.json`, so any run can be replayed from its own record.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DocsetError, Result};
use crate::types::PageSelection;

/// Which recognition backend to construct for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OcrEngineKind {
    /// Tesseract via `leptess` (requires the `tesseract` feature).
    #[default]
    Tesseract,
    /// Pure-Rust `ocrs` engine (requires the `ocr` feature).
    Ocrs,
}

impl fmt::Display for OcrEngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tesseract => f.write_str("tesseract"),
            Self::Ocrs => f.write_str("ocrs"),
        }
    }
}

impl FromStr for OcrEngineKind {
    type Err = DocsetError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "tesseract" => Ok(Self::Tesseract),
            "ocrs" => Ok(Self::Ocrs),
            other => Err(DocsetError::Config(format!("unknown OCR engine '{other}'"))),
        }
    }
}

/// One named step of the page processing pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepConfig {
    /// Registered step name, e.g. `deskew`.
    pub name: String,
    /// Step parameters; missing keys fall back to the step's defaults.
    #[serde(default)]
    pub params: serde_json::Map<String, serde_json::Value>,
}

impl StepConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: serde_json::Map::new(),
        }
    }

    pub fn with_param(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }
}

/// Every parameter of a dataset run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Root directory; each immediate subdirectory is one class.
    pub input_path: PathBuf,
    /// Where the manifest, run record, and page images are written.
    pub output_path: PathBuf,
    /// Manifest file name inside the output directory.
    pub csv_name: String,
    /// Size of the worker pool (1 = sequential).
    pub num_workers: usize,
    /// Rendering resolution for PDF pages.
    pub dpi: u32,
    /// Persist every normalized page as a JPEG under `image_data/`.
    pub save_processed_img: bool,
    /// Pages to extract from multi-page documents.
    pub target_pages: PageSelection,
    /// Recognition language (Tesseract language code).
    pub ocr_lang: String,
    pub ocr_engine: OcrEngineKind,
    /// Directory holding the `ocrs` detection/recognition models.
    pub ocr_model_dir: Option<PathBuf>,
    /// Tesseract `tessdata` directory.
    pub tessdata_path: Option<PathBuf>,
    /// Per-page recognition timeout in seconds (0 disables the timeout).
    pub ocr_timeout_secs: u64,
    /// Words below this confidence (0-100) are dropped from the text.
    pub ocr_min_confidence: f32,
    /// Files per batch handed to the worker pool.
    pub batch_size_per_worker: usize,
    /// Per-class document cap; `None` or 0 keeps every file.
    pub max_docs_per_class: Option<usize>,
    /// Run recognition at all.
    pub do_ocr: bool,
    /// Balance the per-class sample across nested subdirectories.
    pub smart_shuffle: bool,
    /// Pages above this many megapixels are downscaled.
    pub megapixel: f64,
    /// Persisted JPEGs above this size are re-encoded at lower quality.
    pub size_threshold_mb: f64,
    /// Seed for shuffling; `None` draws from the OS.
    pub seed: Option<u64>,
    /// Ordered processing steps applied to every page.
    pub pipeline: Vec<StepConfig>,
    pub log_level: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::new(),
            output_path: PathBuf::from("dataset"),
            csv_name: "data.csv".to_string(),
            num_workers: 1,
            dpi: 300,
            save_processed_img: false,
            target_pages: PageSelection::All,
            ocr_lang: "rus".to_string(),
            ocr_engine: OcrEngineKind::Tesseract,
            ocr_model_dir: None,
            tessdata_path: None,
            ocr_timeout_secs: 30,
            ocr_min_confidence: 0.0,
            batch_size_per_worker: 10,
            max_docs_per_class: None,
            do_ocr: true,
            smart_shuffle: false,
            megapixel: 3.0,
            size_threshold_mb: 5.0,
            seed: None,
            pipeline: Vec::new(),
            log_level: "info".to_string(),
        }
    }
}

impl RunConfig {
    /// Read a configuration (or a previous run's `used_args.json`) from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|err| {
            DocsetError::Config(format!("cannot open {}: {}", path.display(), err))
        })?;
        let config = serde_json::from_reader(std::io::BufReader::new(file))?;
        Ok(config)
    }

    /// The effective per-class cap: unset and zero both mean "no limit".
    pub fn class_limit(&self) -> Option<usize> {
        self.max_docs_per_class.filter(|&n| n > 0)
    }

    /// Check the parameters that would otherwise fail deep inside a run.
    pub fn validate(&self) -> Result<()> {
        if !self.input_path.is_dir() {
            return Err(DocsetError::Config(format!(
                "input path {} is not a directory",
                self.input_path.display()
            )));
        }
        if self.num_workers == 0 {
            return Err(DocsetError::Config("num_workers must be at least 1".into()));
        }
        if self.batch_size_per_worker == 0 {
            return Err(DocsetError::Config(
                "batch_size_per_worker must be at least 1".into(),
            ));
        }
        if self.dpi == 0 {
            return Err(DocsetError::Config("dpi must be positive".into()));
        }
        if !(self.megapixel > 0.0) {
            return Err(DocsetError::Config(format!(
                "megapixel cap must be positive, got {}",
                self.megapixel
            )));
        }
        if !(self.size_threshold_mb > 0.0) {
            return Err(DocsetError::Config(format!(
                "size threshold must be positive, got {} MB",
                self.size_threshold_mb
            )));
        }
        if self.csv_name.trim().is_empty() {
            return Err(DocsetError::Config("csv_name must not be empty".into()));
        }
        Ok(())
    }
}
