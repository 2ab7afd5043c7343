// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page persistence — writes normalized pages as size-budgeted JPEGs under
// `<output>/image_data/<class>/`.

use std::fs;
use std::path::{Path, PathBuf};

use docset_core::FileReference;
use docset_core::error::Result;
use image::RgbImage;
use tracing::{debug, warn};

use crate::image::budget::{SizeBudget, encode_within_budget};

/// Name of the page-image directory inside a run's output directory.
pub const IMAGE_DIR: &str = "image_data";

/// Where and how one page image ended up on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedImage {
    pub path: PathBuf,
    pub bytes: u64,
    pub quality: u8,
    pub within_budget: bool,
}

/// Writes page rasters into a per-class directory tree.
#[derive(Debug, Clone)]
pub struct PagePersister {
    root: PathBuf,
    budget: SizeBudget,
}

impl PagePersister {
    /// Persist under `<output_dir>/image_data`.
    pub fn new(output_dir: impl AsRef<Path>, budget: SizeBudget) -> Self {
        Self {
            root: output_dir.as_ref().join(IMAGE_DIR),
            budget,
        }
    }

    /// `<root>/<class>/<class>__<stem>[_page<N>].jpg`; single-page sources
    /// pass `None` and get no page suffix.
    pub fn output_path(&self, file: &FileReference, page: Option<usize>) -> PathBuf {
        let class = file.class_name();
        let name = match page {
            Some(index) => format!("{}__{}_page{}.jpg", class, file.stem(), index),
            None => format!("{}__{}.jpg", class, file.stem()),
        };
        self.root.join(class).join(name)
    }

    /// Encode and write one page. A page that cannot be brought under the
    /// size budget is still written, with a warning.
    pub fn persist(
        &self,
        image: &RgbImage,
        file: &FileReference,
        page: Option<usize>,
    ) -> Result<PersistedImage> {
        let path = self.output_path(file, page);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let encoded = encode_within_budget(image, &self.budget)?;
        if !encoded.within_budget {
            warn!(
                path = %path.display(),
                size = encoded.bytes.len(),
                max = self.budget.max_bytes(),
                "Page image exceeds size budget even at lowest quality"
            );
        }
        fs::write(&path, &encoded.bytes)?;
        debug!(path = %path.display(), quality = encoded.quality, "Page image saved");

        Ok(PersistedImage {
            path,
            bytes: encoded.bytes.len() as u64,
            quality: encoded.quality,
            within_budget: encoded.within_budget,
        })
    }
}
