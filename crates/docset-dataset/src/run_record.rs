// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Run record — the parameters of a finished run, written beside its manifest.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use docset_core::RunConfig;
use docset_core::error::Result;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// File name of the run record inside the output directory.
pub const RUN_RECORD_FILE: &str = "used_args.json";

/// Everything needed to reproduce a run. The embedded `config` is flattened,
/// so the file also loads directly with [`RunConfig::load`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub output_dir: PathBuf,
    /// Recognizer used, or `none` when OCR was off.
    pub ocr_engine_used: String,
    pub rows: usize,
    #[serde(flatten)]
    pub config: RunConfig,
}

impl RunRecord {
    pub fn new(config: RunConfig, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            output_dir: output_dir.into(),
            ocr_engine_used: "none".to_string(),
            rows: 0,
            config,
        }
    }

    /// Write `<dir>/used_args.json` and return its path.
    pub fn write(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(RUN_RECORD_FILE);
        std::fs::write(&path, serde_json::to_string_pretty(self)?)?;
        Ok(path)
    }
}
